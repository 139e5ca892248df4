//! Configuration for the [`crate::service::PathfindingService`].
use std::time::Duration;

/// Tunables for graph maintenance and path searching.
/// Build with [`PathfindingSettingsBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathfindingSettings {
    /// Wall clock time a single search may run per tick.
    pub slice_budget: Duration,
    /// Move updates applied per tick under normal load, minus the high priority updates applied that tick.
    pub move_budget: usize,
    /// Queued moves beyond this are drained in addition to the normal budget.
    pub move_backlog_threshold: usize,
    /// The move backlog should never reach this after a drain.
    pub move_backlog_limit: usize,
    /// Bodies are only tracked if their layer overlaps this mask.
    pub tracked_collision_layers: u32,
    /// Only this many jobs, oldest first, are given a slice each tick. `None` runs them all.
    pub max_concurrent_jobs: Option<usize>,
    /// Searches fail once they've expanded this many nodes. `None` never gives up.
    pub max_search_iterations: Option<usize>,
    /// Keep open/closed sets and scores around for debug overlays.
    pub record_search_telemetry: bool,
}

impl Default for PathfindingSettings {
    fn default() -> Self {
        PathfindingSettings {
            slice_budget: Duration::from_millis(3),
            move_budget: 50,
            move_backlog_threshold: 100,
            move_backlog_limit: 1000,
            tracked_collision_layers: u32::MAX,
            max_concurrent_jobs: None,
            max_search_iterations: None,
            record_search_telemetry: false,
        }
    }
}

/// Builder for [`PathfindingSettings`].
///
/// # Example
/// ```
/// use std::time::Duration;
/// use bevy_tilenav::prelude::*;
///
/// let settings = PathfindingSettingsBuilder::new()
///     .slice_budget(Duration::from_millis(2))
///     .max_concurrent_jobs(16)
///     .build();
///
/// assert_eq!(settings.move_budget, 50);
/// assert_eq!(settings.max_concurrent_jobs, Some(16));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PathfindingSettingsBuilder {
    settings: PathfindingSettings,
}

impl PathfindingSettingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time each search may run per tick. A zero budget still expands one node per tick.
    pub fn slice_budget(mut self, budget: Duration) -> Self {
        self.settings.slice_budget = budget;
        self
    }

    /// Move updates applied per tick when the backlog is small.
    pub fn move_budget(mut self, budget: usize) -> Self {
        self.settings.move_budget = budget;
        self
    }

    /// Backlog size above which the move budget is widened.
    /// Must be below the backlog limit.
    pub fn move_backlog_threshold(mut self, threshold: usize) -> Self {
        if threshold >= self.settings.move_backlog_limit {
            panic!("Move backlog threshold must be below the backlog limit");
        }

        self.settings.move_backlog_threshold = threshold;
        self
    }

    /// Backlog size that indicates the drain isn't keeping up.
    /// Must be above the backlog threshold.
    pub fn move_backlog_limit(mut self, limit: usize) -> Self {
        if limit <= self.settings.move_backlog_threshold {
            panic!("Move backlog limit must be above the backlog threshold");
        }

        self.settings.move_backlog_limit = limit;
        self
    }

    /// Only bodies on these layers are tracked by the maintainer.
    pub fn tracked_collision_layers(mut self, layers: u32) -> Self {
        self.settings.tracked_collision_layers = layers;
        self
    }

    /// Cap on how many searches get a slice each tick. Must be at least 1.
    pub fn max_concurrent_jobs(mut self, jobs: usize) -> Self {
        if jobs < 1 {
            panic!("Max concurrent jobs must be at least 1");
        }

        self.settings.max_concurrent_jobs = Some(jobs);
        self
    }

    /// Cap on how many nodes a search expands before failing. Must be at least 1.
    pub fn max_search_iterations(mut self, iterations: usize) -> Self {
        if iterations < 1 {
            panic!("Max search iterations must be at least 1");
        }

        self.settings.max_search_iterations = Some(iterations);
        self
    }

    /// Record open/closed sets and scores for debugging.
    pub fn record_search_telemetry(mut self) -> Self {
        self.settings.record_search_telemetry = true;
        self
    }

    pub fn build(self) -> PathfindingSettings {
        self.settings
    }
}
