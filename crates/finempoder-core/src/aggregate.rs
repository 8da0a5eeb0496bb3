//! Module completion percentage.

use crate::snapshot::Completions;

/// Percentage (0..=100) of `lessons` that are completed in `done`.
///
/// Rounds half up, so 8 of 15 gives 53. An empty lesson list yields 0.
/// Completions for lessons outside the list do not count.
pub fn compute_progress<S: AsRef<str>>(lessons: &[S], done: &Completions) -> u8 {
    let total = lessons.len();
    if total == 0 {
        return 0;
    }
    let completed = lessons
        .iter()
        .filter(|l| done.is_completed(l.as_ref()))
        .count();

    // round(100 * completed / total) in integers.
    let pct = (200 * completed + total) / (2 * total);
    pct.min(100) as u8
}
