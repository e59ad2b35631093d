//! Shuffle target selection
//!
//! Shuffle never permutes queue storage; it selects the next index to
//! jump to. The draw is uniform over the whole queue with a deterministic
//! fallback offset when it lands on the current index, so the same track
//! is never picked twice in a row on queues with more than one entry.

use rand::Rng;

/// Resolve a raw draw against the current index
///
/// A draw that collides with the current index steps to the next slot,
/// wrapping at the end of the queue.
pub(crate) fn resolve_draw(len: usize, current: Option<usize>, draw: usize) -> usize {
    match current {
        Some(c) if draw == c => (c + 1) % len,
        _ => draw,
    }
}

/// Pick the next shuffle target
///
/// Returns `None` for an empty queue and index 0 for a one-track queue.
pub fn pick_next_index<R: Rng + ?Sized>(
    len: usize,
    current: Option<usize>,
    rng: &mut R,
) -> Option<usize> {
    match len {
        0 => None,
        1 => Some(0),
        _ => Some(resolve_draw(len, current, rng.gen_range(0..len))),
    }
}
