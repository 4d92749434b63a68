//! Greedy size-bounded bin packing.

/// Pack items into consecutive chunks whose summed size stays within `max_bytes`.
///
/// Items keep their order. A chunk is closed only when it already holds
/// something and the next item would push it over the limit; that item then
/// opens the next chunk. An item larger than `max_bytes` therefore ends up
/// alone in its own chunk instead of being split.
pub fn pack_by_size<T>(items: impl IntoIterator<Item = (T, u64)>, max_bytes: u64) -> Vec<Vec<T>> {
    let mut chunks = Vec::new();
    let mut current = Vec::new();
    let mut current_size: u64 = 0;

    for (item, size) in items {
        if current_size.saturating_add(size) > max_bytes && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_size = 0;
        }
        current.push(item);
        current_size = current_size.saturating_add(size);
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: u64 = 1024 * 1024;

    #[test]
    fn test_overflow_opens_new_chunk() {
        let chunks = pack_by_size(
            vec![("a", 20 * MB), ("b", 20 * MB), ("c", 10 * MB)],
            45 * MB,
        );
        assert_eq!(chunks, vec![vec!["a", "b"], vec!["c"]]);
    }

    #[test]
    fn test_exact_fit_stays_in_chunk() {
        let chunks = pack_by_size(vec![(1, 5), (2, 5)], 10);
        assert_eq!(chunks, vec![vec![1, 2]]);
    }

    #[test]
    fn test_oversized_item_is_placed_alone() {
        let chunks = pack_by_size(vec![("big", 100), ("small", 1), ("huge", 200)], 10);
        assert_eq!(chunks, vec![vec!["big"], vec!["small"], vec!["huge"]]);
    }

    #[test]
    fn test_empty_input() {
        let chunks: Vec<Vec<u8>> = pack_by_size(Vec::new(), 10);
        assert!(chunks.is_empty());
    }
}
