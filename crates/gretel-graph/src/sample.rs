//! Bounded-size sampling of oversized result sets.

use rand::seq::SliceRandom;

/// Cap a collection at `max` elements.
///
/// Collections at or under the cap come back unchanged. Oversized collections
/// are shuffled with an unbiased Fisher–Yates shuffle and truncated to `max`,
/// so the survivors are a uniform random sample; the flag tells the caller to
/// record a truncation warning.
pub fn cap<T>(mut items: Vec<T>, max: usize) -> (Vec<T>, bool) {
    if items.len() <= max {
        return (items, false);
    }
    items.shuffle(&mut rand::thread_rng());
    items.truncate(max);
    (items, true)
}
