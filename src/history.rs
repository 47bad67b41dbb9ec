//! Derivations over the append-only task state log.
//!
//! A task's current state is never stored. It is recomputed from the log:
//! the entry with the latest `created_at` wins, and equal timestamps are
//! resolved by the higher entry id (ids grow monotonically in the store).

use crate::types::{State, TaskMetrics, TaskRecord, TaskStateEntry};
use std::collections::HashMap;

pub const TODO_SLUG: &str = "to-do";
pub const DOING_SLUG: &str = "doing";
pub const DONE_SLUG: &str = "done";

/// The entry that defines the current state, if any.
pub fn latest_entry(history: &[TaskStateEntry]) -> Option<&TaskStateEntry> {
    history.iter().max_by_key(|entry| (entry.created_at, entry.id))
}

/// Slug of the current state; `to-do` for an empty log.
pub fn current_slug(history: &[TaskStateEntry]) -> &str {
    latest_entry(history)
        .map(|entry| entry.state.slug.as_str())
        .unwrap_or(TODO_SLUG)
}

/// Current state of a task, falling back to `todo` for an empty log.
pub fn current_state(history: &[TaskStateEntry], todo: &State) -> State {
    latest_entry(history)
        .map(|entry| entry.state.clone())
        .unwrap_or_else(|| todo.clone())
}

/// Log entries oldest-first under the same ordering `latest_entry` uses.
pub fn chronological(history: &[TaskStateEntry]) -> Vec<TaskStateEntry> {
    let mut sorted = history.to_vec();
    sorted.sort_by_key(|entry| (entry.created_at, entry.id));
    sorted
}

/// Count tasks per current-state slug.
pub fn aggregate_by_state<'a, I>(tasks: I) -> HashMap<String, usize>
where
    I: IntoIterator<Item = &'a TaskRecord>,
{
    let mut counts = HashMap::new();
    for record in tasks {
        *counts
            .entry(current_slug(&record.history).to_string())
            .or_insert(0) += 1;
    }
    counts
}

/// Fold slug counts into the three fixed buckets. Other slugs are ignored.
pub fn metrics_from_counts(counts: &HashMap<String, usize>) -> TaskMetrics {
    let get = |slug: &str| counts.get(slug).copied().unwrap_or(0);
    TaskMetrics {
        todo_count: get(TODO_SLUG),
        doing_count: get(DOING_SLUG),
        done_count: get(DONE_SLUG),
    }
}

/// Metrics over the non-archived tasks of a collection.
pub fn active_metrics(tasks: &[TaskRecord]) -> TaskMetrics {
    metrics_from_counts(&aggregate_by_state(
        tasks.iter().filter(|record| !record.task.is_archived),
    ))
}
