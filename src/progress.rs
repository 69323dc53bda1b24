//! Completion tracking for the onboarding curriculum.

use std::sync::Arc;

use indexmap::IndexSet;
use tracing::warn;

use crate::constants::storage::COMPLETIONS_KEY;
use crate::errors::TransferError;
use crate::store::PersistenceStore;
use crate::types::LessonId;

/// A single curriculum lesson.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lesson {
    /// Stable id used in persisted completions.
    pub id: LessonId,
    /// Lesson title.
    pub title: String,
}

/// One day of the curriculum.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrainingDay {
    /// 1-based day number.
    pub day: u8,
    /// Day title.
    pub title: String,
    /// Lessons in teaching order.
    pub lessons: Vec<Lesson>,
}

/// Ordered list of training days.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Curriculum {
    /// Days in order.
    pub days: Vec<TrainingDay>,
}

impl Curriculum {
    /// The fixed 3-day onboarding curriculum.
    pub fn three_day() -> Self {
        fn day(day: u8, title: &str, lessons: &[(&str, &str)]) -> TrainingDay {
            TrainingDay {
                day,
                title: title.to_string(),
                lessons: lessons
                    .iter()
                    .map(|(id, title)| Lesson {
                        id: id.to_string(),
                        title: title.to_string(),
                    })
                    .collect(),
            }
        }
        Self {
            days: vec![
                day(
                    1,
                    "Foundation & Introduction",
                    &[
                        ("day1-intro", "Intro to the Company and Products"),
                        ("day1-leadership", "Meet and Greet with Leadership"),
                    ],
                ),
                day(
                    2,
                    "Products & Sales Tools",
                    &[
                        ("day2-products", "Products Cont."),
                        ("day2-systems", "Systems & Tools"),
                        ("day2-scripts", "Call Scripts, Profiles & Positioning"),
                        ("day2-emails", "Email Sequences"),
                    ],
                ),
                day(
                    3,
                    "Practice & Evaluation",
                    &[
                        ("day3-roleplay", "Role Play activity with System Navigation"),
                        ("day3-calls", "Mock Calls"),
                        ("day3-coaching", "Coaching Session & Evaluation"),
                    ],
                ),
            ],
        }
    }

    /// Lessons across all days.
    pub fn total_lessons(&self) -> usize {
        self.days.iter().map(|day| day.lessons.len()).sum()
    }

    /// True if `lesson_id` belongs to this curriculum.
    pub fn contains(&self, lesson_id: &str) -> bool {
        self.lessons().any(|lesson| lesson.id == lesson_id)
    }

    /// All lessons, day by day.
    pub fn lessons(&self) -> impl Iterator<Item = &Lesson> {
        self.days.iter().flat_map(|day| day.lessons.iter())
    }

    /// Look up a day by its 1-based number.
    pub fn day(&self, day: u8) -> Option<&TrainingDay> {
        self.days.iter().find(|entry| entry.day == day)
    }
}

impl Default for Curriculum {
    fn default() -> Self {
        Self::three_day()
    }
}

/// Persisted completion state for a curriculum.
///
/// Mutations update memory first and then persist; a persistence `Err`
/// leaves the in-memory change applied.
pub struct TrainingProgress {
    curriculum: Curriculum,
    completed: IndexSet<LessonId>,
    selected_lesson: Option<LessonId>,
    store: Arc<dyn PersistenceStore>,
}

impl TrainingProgress {
    /// Load stored completions; unreadable or unknown entries are dropped.
    pub fn load(store: Arc<dyn PersistenceStore>, curriculum: Curriculum) -> Self {
        let stored: Vec<LessonId> = match store.get(COMPLETIONS_KEY) {
            Ok(Some(text)) => serde_json::from_str(&text).unwrap_or_else(|err| {
                warn!("[salesdeck:progress] discarding unreadable completions: {err}");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!("[salesdeck:progress] completions unavailable: {err}");
                Vec::new()
            }
        };
        let completed = stored
            .into_iter()
            .filter(|id| curriculum.contains(id))
            .collect();
        Self {
            curriculum,
            completed,
            selected_lesson: None,
            store,
        }
    }

    /// Curriculum being tracked.
    pub fn curriculum(&self) -> &Curriculum {
        &self.curriculum
    }

    /// Most recently toggled lesson.
    pub fn selected_lesson(&self) -> Option<&str> {
        self.selected_lesson.as_deref()
    }

    /// True if `lesson_id` is marked complete.
    pub fn is_complete(&self, lesson_id: &str) -> bool {
        self.completed.contains(lesson_id)
    }

    /// Completed lesson ids in completion order.
    pub fn completed(&self) -> impl Iterator<Item = &str> {
        self.completed.iter().map(String::as_str)
    }

    /// Number of completed lessons.
    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    /// Lessons in the curriculum.
    pub fn total_lessons(&self) -> usize {
        self.curriculum.total_lessons()
    }

    /// Overall completion in percent (0.0 for an empty curriculum).
    pub fn completion_percentage(&self) -> f32 {
        let total = self.total_lessons();
        if total == 0 {
            return 0.0;
        }
        self.completed.len() as f32 / total as f32 * 100.0
    }

    /// `(completed, total)` lessons for `day`, if the day exists.
    pub fn day_progress(&self, day: u8) -> Option<(usize, usize)> {
        let entry = self.curriculum.day(day)?;
        let done = entry
            .lessons
            .iter()
            .filter(|lesson| self.completed.contains(&lesson.id))
            .count();
        Some((done, entry.lessons.len()))
    }

    /// Flip completion of `lesson_id` and make it the selected lesson.
    ///
    /// Returns the new completion state.
    pub fn toggle(&mut self, lesson_id: &str) -> Result<bool, TransferError> {
        if !self.curriculum.contains(lesson_id) {
            return Err(TransferError::Configuration(format!(
                "unknown lesson '{lesson_id}'"
            )));
        }
        self.selected_lesson = Some(lesson_id.to_string());
        let now_complete = if self.completed.shift_remove(lesson_id) {
            false
        } else {
            self.completed.insert(lesson_id.to_string());
            true
        };
        self.persist()?;
        Ok(now_complete)
    }

    /// Clear every completion and the selected lesson.
    pub fn reset(&mut self) -> Result<(), TransferError> {
        self.completed.clear();
        self.selected_lesson = None;
        self.store.remove(COMPLETIONS_KEY)
    }

    fn persist(&self) -> Result<(), TransferError> {
        let ids: Vec<&str> = self.completed().collect();
        let text = serde_json::to_string(&ids).map_err(|err| {
            TransferError::Storage(format!("failed to serialize completions: {err}"))
        })?;
        self.store.set(COMPLETIONS_KEY, &text)
    }
}
