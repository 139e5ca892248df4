//! A path search that runs a little at a time.
use std::time::{Duration, Instant};

use bevy::{log, math::IVec2};
use rustc_hash::FxHashMap;
use strum::Display;

use crate::{
    astar::{AstarSearch, Step},
    error::PathError,
    graph::GraphRegistry,
    neighbor::neighborhood_for,
    path::Path,
    request::{CancellationToken, PathArgs, PathJobId},
    settings::PathfindingSettings,
    tile::TileMap,
    traverse::{enterable, nearest_enterable},
};

/// Lifecycle of a [`PathSearchJob`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum PathStatus {
    /// Queued, hasn't had a slice yet.
    Pending,
    /// Searching, will continue next tick.
    Running,
    Finished,
    Failed,
    Cancelled,
}

impl PathStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PathStatus::Finished | PathStatus::Failed | PathStatus::Cancelled
        )
    }
}

/// Work counters for a search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Nodes expanded.
    pub iterations: usize,
    /// Slices that did search work.
    pub slices: usize,
}

/// Snapshot of a search's internals, recorded when
/// [`PathfindingSettings::record_search_telemetry`] is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchTelemetry {
    pub goal: Option<IVec2>,
    pub open: Vec<IVec2>,
    pub closed: Vec<IVec2>,
    pub g_scores: FxHashMap<IVec2, u32>,
    /// Route to the last expanded node, or the final path once finished.
    pub route: Vec<IVec2>,
}

/// The final result of a job.
#[derive(Debug, Clone)]
pub struct PathOutcome {
    pub id: PathJobId,
    pub result: Result<Path, PathError>,
    pub stats: SearchStats,
    pub telemetry: Option<SearchTelemetry>,
}

impl PathOutcome {
    pub fn status(&self) -> PathStatus {
        match &self.result {
            Ok(_) => PathStatus::Finished,
            Err(e) => e.status(),
        }
    }
}

/// A single path request and all of its search state.
///
/// Each call to [`PathSearchJob::run_slice`] checks the cancellation token, checks the grid
/// still exists and then expands nodes until the slice budget is spent. A job is never reused
/// once it reaches a terminal status.
#[derive(Debug)]
pub struct PathSearchJob {
    id: PathJobId,
    args: PathArgs,
    token: CancellationToken,
    status: PathStatus,
    slice_budget: Duration,
    max_iterations: Option<usize>,
    search: Option<AstarSearch>,
    stats: SearchStats,
    telemetry: Option<SearchTelemetry>,
}

impl PathSearchJob {
    pub fn new(
        id: PathJobId,
        args: PathArgs,
        token: CancellationToken,
        settings: &PathfindingSettings,
    ) -> Self {
        PathSearchJob {
            id,
            args,
            token,
            status: PathStatus::Pending,
            slice_budget: settings.slice_budget,
            max_iterations: settings.max_search_iterations,
            search: None,
            stats: SearchStats::default(),
            telemetry: settings
                .record_search_telemetry
                .then(SearchTelemetry::default),
        }
    }

    pub fn id(&self) -> PathJobId {
        self.id
    }

    pub fn args(&self) -> &PathArgs {
        &self.args
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn status(&self) -> PathStatus {
        self.status
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    pub fn telemetry(&self) -> Option<&SearchTelemetry> {
        self.telemetry.as_ref()
    }

    /// Runs one slice of the search. Returns the outcome once the job reaches a terminal status.
    pub fn run_slice<M: TileMap + ?Sized>(
        &mut self,
        graphs: &mut GraphRegistry,
        map: &M,
    ) -> Option<PathOutcome> {
        if self.status.is_terminal() {
            return None;
        }

        if self.token.is_cancelled() {
            return Some(self.finish(Err(PathError::Cancelled)));
        }

        let grid = self.args.start.grid;
        if !map.grid_exists(grid) || !graphs.contains(grid) {
            log::warn!("Path job {:?} lost its grid {:?}", self.id, grid);
            return Some(self.finish(Err(PathError::GridRemoved(grid))));
        }
        let graph = graphs.graph_or_insert(grid);

        if self.status == PathStatus::Pending {
            if self.args.end.grid != grid {
                log::warn!("Path job {:?} spans two grids", self.id);
                return Some(self.finish(Err(PathError::Unreachable)));
            }

            let end = self.args.end.pos;
            let goal = if enterable(graph.node(end, map), &self.args) {
                Some(end)
            } else {
                nearest_enterable(graph, map, &self.args, end, self.args.proximity)
            };

            let Some(goal) = goal else {
                return Some(self.finish(Err(PathError::UnreachableGoal)));
            };

            let neighborhood = neighborhood_for(self.args.flags.allow_diagonals);
            self.search = Some(AstarSearch::new(
                neighborhood,
                self.args.flags.strategy,
                self.args.start.pos,
                goal,
            ));
            self.status = PathStatus::Running;
        }

        let Some(search) = self.search.as_mut() else {
            log::error!("Path job {:?} is running without a search", self.id);
            return Some(self.finish(Err(PathError::Unreachable)));
        };

        self.stats.slices += 1;
        let started = Instant::now();

        let result = loop {
            if let Some(max) = self.max_iterations {
                if self.stats.iterations >= max {
                    break Some(Err(PathError::SearchLimit(self.stats.iterations)));
                }
            }

            match search.step(graph, map, &self.args) {
                Step::Exhausted => break Some(Err(PathError::Unreachable)),
                Step::Found(path) => {
                    self.stats.iterations += 1;
                    break Some(Ok(path));
                }
                Step::Expanded => self.stats.iterations += 1,
            }

            if started.elapsed() >= self.slice_budget {
                break None;
            }
        };

        self.record_telemetry();

        result.map(|result| self.finish(result))
    }

    fn record_telemetry(&mut self) {
        let (Some(telemetry), Some(search)) = (self.telemetry.as_mut(), self.search.as_ref())
        else {
            return;
        };

        telemetry.goal = Some(search.goal());
        telemetry.open = search.open();
        telemetry.closed = search.closed();
        telemetry.g_scores = search.g_scores();
        telemetry.route = search.current_route();
    }

    fn finish(&mut self, result: Result<Path, PathError>) -> PathOutcome {
        self.status = match &result {
            Ok(_) => PathStatus::Finished,
            Err(e) => e.status(),
        };

        if let (Some(telemetry), Ok(path)) = (self.telemetry.as_mut(), &result) {
            telemetry.route = path.path().to_vec();
        }

        // The search state is never needed again.
        self.search = None;

        log::debug!(
            "Path job {:?} {} after {} iterations over {} slices",
            self.id,
            self.status,
            self.stats.iterations,
            self.stats.slices
        );

        PathOutcome {
            id: self.id,
            result,
            stats: self.stats,
            telemetry: self.telemetry.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        occupant::CollisionBody,
        request::SearchStrategy,
        settings::PathfindingSettingsBuilder,
        tile::{GridId, SparseTileMap, Tile, TileCoords},
    };
    use bevy::prelude::Entity;

    const GRID: GridId = GridId(0);

    fn setup() -> (SparseTileMap, GraphRegistry) {
        let mut map = SparseTileMap::default();
        map.fill(GRID, IVec2::ZERO, IVec2::splat(9), Tile::new(1));
        let mut graphs = GraphRegistry::new();
        graphs.graph_or_insert(GRID);
        (map, graphs)
    }

    fn job(args: PathArgs, settings: &PathfindingSettings) -> PathSearchJob {
        PathSearchJob::new(PathJobId(1), args, CancellationToken::new(), settings)
    }

    fn run(job: &mut PathSearchJob, graphs: &mut GraphRegistry, map: &SparseTileMap) -> PathOutcome {
        loop {
            if let Some(outcome) = job.run_slice(graphs, map) {
                return outcome;
            }
        }
    }

    fn args(end: IVec2) -> PathArgs {
        PathArgs::new(
            TileCoords::new(GRID, 0, 0),
            TileCoords::from_ivec2(GRID, end),
        )
        .with_collision_mask(1)
    }

    #[test]
    fn test_job_finishes() {
        let (map, mut graphs) = setup();
        let mut job = job(args(IVec2::new(9, 9)), &PathfindingSettings::default());

        assert_eq!(job.status(), PathStatus::Pending);
        let outcome = run(&mut job, &mut graphs, &map);

        assert_eq!(outcome.status(), PathStatus::Finished);
        assert_eq!(job.status(), PathStatus::Finished);
        assert_eq!(outcome.result.unwrap().len(), 10);
        assert!(outcome.stats.iterations >= 10);

        // Finished jobs don't run again.
        assert!(job.run_slice(&mut graphs, &map).is_none());
    }

    #[test]
    fn test_jump_point_job() {
        let (map, mut graphs) = setup();
        let args = args(IVec2::new(9, 9)).with_strategy(SearchStrategy::JumpPoint);
        let mut job = job(args, &PathfindingSettings::default());

        let outcome = run(&mut job, &mut graphs, &map);

        // The start jumps straight to the goal along the diagonal.
        assert_eq!(outcome.stats.iterations, 2);
        let path = outcome.result.unwrap();
        assert_eq!(path.len(), 10);
        assert_eq!(path.cost(), 126);
    }

    #[test]
    fn test_zero_budget_expands_once_per_slice() {
        let (map, mut graphs) = setup();
        let settings = PathfindingSettingsBuilder::new()
            .slice_budget(Duration::ZERO)
            .build();
        let mut job = job(args(IVec2::new(3, 0)), &settings);

        assert!(job.run_slice(&mut graphs, &map).is_none());
        assert_eq!(job.status(), PathStatus::Running);
        assert_eq!(job.stats(), SearchStats { iterations: 1, slices: 1 });

        assert!(job.run_slice(&mut graphs, &map).is_none());
        assert_eq!(job.stats(), SearchStats { iterations: 2, slices: 2 });
    }

    #[test]
    fn test_cancel_between_slices() {
        let (map, mut graphs) = setup();
        let settings = PathfindingSettingsBuilder::new()
            .slice_budget(Duration::ZERO)
            .build();
        let mut job = job(args(IVec2::new(9, 9)), &settings);

        assert!(job.run_slice(&mut graphs, &map).is_none());
        job.token().cancel();

        let outcome = job.run_slice(&mut graphs, &map).unwrap();
        assert_eq!(outcome.status(), PathStatus::Cancelled);
        assert_eq!(outcome.result.unwrap_err(), PathError::Cancelled);
        assert_eq!(outcome.stats.iterations, 1);

        assert!(job.run_slice(&mut graphs, &map).is_none());
        assert_eq!(job.stats().iterations, 1);
    }

    #[test]
    fn test_solid_goal_without_proximity_fails_immediately() {
        let (map, mut graphs) = setup();
        graphs.graph_or_insert(GRID).modify_node(
            IVec2::new(9, 9),
            &map,
            Duration::ZERO,
            |node| node.add_body(Entity::from_raw(1), CollisionBody::wall(1)),
        );

        let mut job = job(args(IVec2::new(9, 9)), &PathfindingSettings::default());
        let outcome = job.run_slice(&mut graphs, &map).unwrap();

        assert_eq!(outcome.status(), PathStatus::Failed);
        assert_eq!(outcome.result.unwrap_err(), PathError::UnreachableGoal);
        assert_eq!(outcome.stats.iterations, 0);
    }

    #[test]
    fn test_grid_removed_mid_search() {
        let (mut map, mut graphs) = setup();
        let settings = PathfindingSettingsBuilder::new()
            .slice_budget(Duration::ZERO)
            .build();
        let mut job = job(args(IVec2::new(9, 9)), &settings);

        assert!(job.run_slice(&mut graphs, &map).is_none());
        map.remove_grid(GRID);

        let outcome = job.run_slice(&mut graphs, &map).unwrap();
        assert_eq!(outcome.result.unwrap_err(), PathError::GridRemoved(GRID));
    }

    #[test]
    fn test_search_limit() {
        let (map, mut graphs) = setup();
        let settings = PathfindingSettingsBuilder::new()
            .max_search_iterations(3)
            .build();
        let mut job = job(args(IVec2::new(9, 9)), &settings);

        let outcome = run(&mut job, &mut graphs, &map);

        assert_eq!(outcome.result.unwrap_err(), PathError::SearchLimit(3));
        assert_eq!(outcome.stats.iterations, 3);
    }

    #[test]
    fn test_unreachable() {
        let (mut map, mut graphs) = setup();
        // An island that can't be reached from the main floor.
        map.fill(GRID, IVec2::new(20, 20), IVec2::new(21, 21), Tile::new(1));

        let mut job = job(args(IVec2::new(21, 21)), &PathfindingSettings::default());
        let outcome = run(&mut job, &mut graphs, &map);

        assert_eq!(outcome.result.unwrap_err(), PathError::Unreachable);
        assert_eq!(outcome.stats.iterations, 100);
    }

    #[test]
    fn test_telemetry() {
        let (map, mut graphs) = setup();
        let settings = PathfindingSettingsBuilder::new()
            .slice_budget(Duration::ZERO)
            .record_search_telemetry()
            .build();
        let mut job = job(args(IVec2::new(4, 0)), &settings);

        job.run_slice(&mut graphs, &map);
        let telemetry = job.telemetry().unwrap();
        assert_eq!(telemetry.goal, Some(IVec2::new(4, 0)));
        assert_eq!(telemetry.closed, vec![IVec2::ZERO]);
        assert!(!telemetry.open.is_empty());
        assert_eq!(telemetry.g_scores.get(&IVec2::new(1, 0)), Some(&10));

        let outcome = run(&mut job, &mut graphs, &map);
        let path = outcome.result.unwrap();
        assert_eq!(outcome.telemetry.unwrap().route, path.path().to_vec());
    }
}
