//! Lesson unlock rules.
//!
//! Navigation state is derived, never stored: a lesson opens once the
//! lesson numbered just before it is completed. The first lesson, and any
//! lesson whose code carries no usable number, is always open.

use serde::Serialize;

use crate::catalog::order_index;
use crate::snapshot::Completions;

/// Navigation state of a lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonState {
    Locked,
    Available,
    Completed,
}

impl LessonState {
    /// Whether the learner may open the lesson.
    pub fn is_navigable(&self) -> bool {
        !matches!(self, Self::Locked)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Available => "available",
            Self::Completed => "completed",
        }
    }
}

/// Whether `lesson_id` may be opened given the completion snapshot.
///
/// For index `i > 0` the lesson numbered `i - 1` must be in `ordered`
/// and completed. A gap in the numbering keeps the lesson locked.
pub fn is_unlocked<S: AsRef<str>>(lesson_id: &str, ordered: &[S], done: &Completions) -> bool {
    let Some(prev) = order_index(lesson_id).and_then(|idx| idx.checked_sub(1)) else {
        // First lesson or unparseable code.
        return true;
    };
    ordered
        .iter()
        .map(|s| s.as_ref())
        .find(|id| order_index(id) == Some(prev))
        .is_some_and(|id| done.is_completed(id))
}

/// State of one lesson.
pub fn lesson_state<S: AsRef<str>>(
    lesson_id: &str,
    ordered: &[S],
    done: &Completions,
) -> LessonState {
    if done.is_completed(lesson_id) {
        LessonState::Completed
    } else if is_unlocked(lesson_id, ordered, done) {
        LessonState::Available
    } else {
        LessonState::Locked
    }
}

/// States for every lesson in `ordered`, in list order.
pub fn module_states<S: AsRef<str>>(ordered: &[S], done: &Completions) -> Vec<(String, LessonState)> {
    ordered
        .iter()
        .map(|id| {
            let id = id.as_ref();
            (id.to_string(), lesson_state(id, ordered, done))
        })
        .collect()
}

/// First lesson that is open but not yet completed, if any.
pub fn next_available<S: AsRef<str>>(ordered: &[S], done: &Completions) -> Option<String> {
    module_states(ordered, done)
        .into_iter()
        .find(|(_, state)| *state == LessonState::Available)
        .map(|(id, _)| id)
}
