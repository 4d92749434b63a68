//! Binary entrypoint that serves the conversation explorer.

use std::process::ExitCode;

use conversation_explorer::start_explorer;

fn main() -> ExitCode {
    start_explorer::run()
}
