//! Repartition archive exports into size-bounded chunks.
//! Run with: cargo run --bin explorer-split

use std::process::ExitCode;

use conversation_explorer::partition;

fn main() -> ExitCode {
    partition::run()
}
