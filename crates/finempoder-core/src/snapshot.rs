//! Point-in-time view of which lessons in a module are completed.

use std::collections::HashSet;

use finempoder_store::LessonProgress;

/// Set of completed lesson codes for one module.
///
/// Built from persisted records (and, in the tracker, merged with the
/// in-memory believed state). Records with `completed = false` are
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completions {
    done: HashSet<String>,
}

impl Completions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a LessonProgress>) -> Self {
        records
            .into_iter()
            .filter(|r| r.completed)
            .map(|r| r.lesson_id.clone())
            .collect()
    }

    pub fn insert(&mut self, lesson_id: impl Into<String>) {
        self.done.insert(lesson_id.into());
    }

    pub fn is_completed(&self, lesson_id: &str) -> bool {
        self.done.contains(lesson_id)
    }

    pub fn len(&self) -> usize {
        self.done.len()
    }

    pub fn is_empty(&self) -> bool {
        self.done.is_empty()
    }
}

impl FromIterator<String> for Completions {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            done: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<&'a str> for Completions {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        iter.into_iter().map(str::to_string).collect()
    }
}
