//! The public entry point for graph queries and path requests.
use std::time::Duration;

use bevy::{log, math::IVec2, prelude::Resource};
use rustc_hash::FxHashMap;

use crate::{
    components::Agent,
    debug::GraphSnapshot,
    graph::{ChunkChanged, GraphRegistry, GridGraph},
    job::{PathOutcome, PathSearchJob, PathStatus},
    maintainer::{GraphMaintainer, GraphUpdate, MaintenanceReport},
    node::TileNode,
    queue::PathJobQueue,
    region::RegionMap,
    request::{CancellationToken, PathArgs, PathJobId},
    settings::PathfindingSettings,
    tile::{GridId, TileCoords, TileMap},
    traverse::{enterable, nearest_enterable},
    FxIndexMap,
};

/// What a single [`PathfindingService::tick`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub maintenance: MaintenanceReport,
    /// Jobs that reached a terminal status this tick.
    pub completed: usize,
    /// Jobs still queued after the tick.
    pub queued: usize,
}

/// Owns every tile graph, the maintainer that keeps them current and the queue of
/// running path searches.
///
/// Drive it by calling [`PathfindingService::tick`] once per simulation tick. Graph updates
/// queued with [`PathfindingService::enqueue_update`] are applied at the start of the tick,
/// before any search runs.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use bevy::math::IVec2;
/// use bevy_tilenav::prelude::*;
///
/// let mut map = SparseTileMap::default();
/// map.fill(GridId(0), IVec2::ZERO, IVec2::new(9, 9), Tile::new(1));
///
/// let mut service = PathfindingService::new(PathfindingSettings::default());
/// let args = PathArgs::new(TileCoords::new(GridId(0), 0, 0), TileCoords::new(GridId(0), 9, 9));
/// let id = service.request_path(&map, args, CancellationToken::new());
///
/// while service.status(id) != Some(PathStatus::Finished) {
///     service.tick(&map, Duration::ZERO);
/// }
///
/// let path = service.take_result(id).unwrap().result.unwrap();
/// assert_eq!(path.len(), 10);
/// ```
#[derive(Resource, Debug)]
pub struct PathfindingService {
    settings: PathfindingSettings,
    graphs: GraphRegistry,
    maintainer: GraphMaintainer,
    queue: PathJobQueue,
    results: FxIndexMap<PathJobId, PathOutcome>,
    regions: FxHashMap<GridId, RegionMap>,
    next_id: u64,
}

impl Default for PathfindingService {
    fn default() -> Self {
        Self::new(PathfindingSettings::default())
    }
}

impl PathfindingService {
    pub fn new(settings: PathfindingSettings) -> Self {
        PathfindingService {
            graphs: GraphRegistry::new(),
            maintainer: GraphMaintainer::new(&settings),
            queue: PathJobQueue::new(settings.max_concurrent_jobs),
            results: FxIndexMap::default(),
            regions: FxHashMap::default(),
            next_id: 0,
            settings,
        }
    }

    pub fn settings(&self) -> &PathfindingSettings {
        &self.settings
    }

    /// Queues a path search. The search starts on the next [`PathfindingService::tick`].
    ///
    /// Cancel the search through `token`; it's observed at the start of the job's next slice.
    pub fn request_path<M: TileMap + ?Sized>(
        &mut self,
        map: &M,
        args: PathArgs,
        token: CancellationToken,
    ) -> PathJobId {
        let id = PathJobId(self.next_id);
        self.next_id += 1;

        if map.grid_exists(args.start.grid) {
            self.graphs.node(args.start, map);
            if args.end.grid == args.start.grid {
                self.graphs.node(args.end, map);
            }
        }

        log::debug!(
            "Path job {:?} requested from {:?} to {:?}",
            id,
            args.start,
            args.end
        );

        self.queue
            .enqueue(PathSearchJob::new(id, args, token, &self.settings));
        id
    }

    /// Can the agent stand on this tile right now?
    pub fn can_traverse<M: TileMap + ?Sized>(
        &mut self,
        map: &M,
        agent: &Agent,
        coords: TileCoords,
    ) -> bool {
        if !map.grid_exists(coords.grid) {
            return false;
        }

        self.graphs
            .node(coords, map)
            .is_traversable(agent.collision_mask, &agent.access)
    }

    /// Could a search with these arguments ever succeed?
    ///
    /// Answers from cached floor regions instead of searching. The end falls back to the nearest
    /// enterable tile within `args.proximity` like a search does. Only floor without static
    /// bodies is considered, so `no_clip` and `allow_space` don't widen the answer.
    pub fn can_reach<M: TileMap + ?Sized>(&mut self, map: &M, args: &PathArgs) -> bool {
        let grid = args.start.grid;
        if args.end.grid != grid || !map.grid_exists(grid) {
            return false;
        }

        let graph = self.graphs.graph_or_insert(grid);
        let end = args.end.pos;
        let target = if enterable(graph.node(end, map), args) {
            Some(end)
        } else {
            nearest_enterable(graph, map, args, end, args.proximity)
        };

        let Some(target) = target else {
            return false;
        };

        self.regions.entry(grid).or_insert_with(RegionMap::new).can_reach(
            graph,
            map,
            &args.access,
            args.start.pos,
            target,
        )
    }

    /// Returns the node for a tile, creating its chunk if needed.
    pub fn get_node<M: TileMap + ?Sized>(&mut self, map: &M, coords: TileCoords) -> &TileNode {
        self.graphs.node(coords, map)
    }

    pub fn enqueue_update(&mut self, update: GraphUpdate) {
        self.maintainer.enqueue(update);
    }

    /// Applies queued graph updates, then gives every queued search a slice.
    pub fn tick<M: TileMap + ?Sized>(&mut self, map: &M, now: Duration) -> TickReport {
        let maintenance = crate::timed!("Graph maintenance", {
            self.maintainer.drain(&mut self.graphs, map, now)
        });

        let outcomes = crate::timed!("Path jobs", {
            self.queue.process(&mut self.graphs, map)
        });

        let completed = outcomes.len();
        for outcome in outcomes {
            self.results.insert(outcome.id, outcome);
        }

        TickReport {
            maintenance,
            completed,
            queued: self.queue.len(),
        }
    }

    /// Status of a job, whether it's still queued or its result is waiting to be taken.
    pub fn status(&self, id: PathJobId) -> Option<PathStatus> {
        self.results
            .get(&id)
            .map(PathOutcome::status)
            .or_else(|| self.queue.status(id))
    }

    /// Takes the outcome of a finished job.
    pub fn take_result(&mut self, id: PathJobId) -> Option<PathOutcome> {
        self.results.shift_remove(&id)
    }

    /// Takes every finished outcome in completion order.
    pub fn drain_results(&mut self) -> Vec<PathOutcome> {
        self.results.drain(..).map(|(_, outcome)| outcome).collect()
    }

    /// Searches still queued, oldest first.
    pub fn jobs(&self) -> impl Iterator<Item = &PathSearchJob> {
        self.queue.jobs()
    }

    pub fn queued_jobs(&self) -> usize {
        self.queue.len()
    }

    pub fn pending_updates(&self) -> usize {
        self.maintainer.pending()
    }

    pub fn maintainer(&self) -> &GraphMaintainer {
        &self.maintainer
    }

    pub fn graph(&self, grid: GridId) -> Option<&GridGraph> {
        self.graphs.graph(grid)
    }

    pub fn graphs(&self) -> &GraphRegistry {
        &self.graphs
    }

    /// Builds every chunk overlapping the inclusive tile rectangle `min..=max` up front.
    pub fn prewarm<M: TileMap + Sync + ?Sized>(
        &mut self,
        map: &M,
        grid: GridId,
        min: IVec2,
        max: IVec2,
    ) -> usize {
        crate::timed!("Prewarm", {
            self.graphs.graph_or_insert(grid).prewarm(min, max, map)
        })
    }

    /// Forgets a grid that's been removed from the world.
    /// Queued updates for it are dropped and searches on it fail.
    pub fn remove_grid(&mut self, grid: GridId) {
        self.graphs.remove(grid);
        self.regions.remove(&grid);
        self.maintainer.remove_grid(grid);

        for outcome in self.queue.remove_grid(grid) {
            self.results.insert(outcome.id, outcome);
        }

        log::info!("Removed grid {:?}", grid);
    }

    /// Clears everything for a round restart. Queued searches are cancelled.
    pub fn reset(&mut self) {
        let cancelled = self.queue.cancel_all();

        self.graphs.clear();
        self.regions.clear();
        self.maintainer.clear();
        self.results.clear();

        for outcome in cancelled {
            self.results.insert(outcome.id, outcome);
        }

        log::info!("Pathfinding reset");
    }

    /// Node positions of every built chunk on a grid, for visualization.
    pub fn snapshot(&self, grid: GridId, tile_size: f32) -> Option<GraphSnapshot> {
        self.graphs
            .graph(grid)
            .map(|graph| GraphSnapshot::capture(graph, tile_size))
    }

    /// Chunk change notifications since the last call.
    pub fn take_chunk_changes(&mut self) -> Vec<ChunkChanged> {
        self.graphs.take_changed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::PathError,
        neighbor::octile_distance,
        occupant::{AccessReader, AccessTag, CollisionBody},
        path::Path,
        request::{PathFlags, SearchStrategy},
        settings::PathfindingSettingsBuilder,
        tile::{SparseTileMap, Tile},
    };
    use bevy::prelude::Entity;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use rustc_hash::FxHashMap;
    use std::collections::BinaryHeap;

    const GRID: GridId = GridId(0);
    const WALL: u32 = 0b1;

    fn floor() -> SparseTileMap {
        let mut map = SparseTileMap::default();
        map.fill(GRID, IVec2::ZERO, IVec2::splat(9), Tile::new(1));
        map
    }

    fn at(x: i32, y: i32) -> TileCoords {
        TileCoords::new(GRID, x, y)
    }

    fn args(start: TileCoords, end: TileCoords) -> PathArgs {
        PathArgs::new(start, end).with_collision_mask(WALL)
    }

    fn wall(service: &mut PathfindingService, id: u32, pos: TileCoords) {
        service.enqueue_update(GraphUpdate::CollisionChanged {
            entity: Entity::from_raw(id),
            position: pos,
            body: CollisionBody::wall(WALL),
            can_collide: true,
        });
    }

    fn run_until_done(
        service: &mut PathfindingService,
        map: &SparseTileMap,
        id: PathJobId,
    ) -> PathOutcome {
        for tick in 0..10_000 {
            service.tick(map, Duration::from_millis(tick));
            if let Some(outcome) = service.take_result(id) {
                return outcome;
            }
        }
        panic!("Path job {:?} never finished", id);
    }

    fn find(service: &mut PathfindingService, map: &SparseTileMap, args: PathArgs) -> PathOutcome {
        let id = service.request_path(map, args, CancellationToken::new());
        run_until_done(service, map, id)
    }

    #[test]
    fn test_open_grid_diagonal() {
        let map = floor();
        let mut service = PathfindingService::default();

        let path = find(&mut service, &map, args(at(0, 0), at(9, 9)))
            .result
            .unwrap();

        assert_eq!(path.len(), 10);
        assert_eq!(path.start(), Some(IVec2::ZERO));
        assert_eq!(path.goal(), Some(IVec2::splat(9)));

        let goal = IVec2::splat(9);
        let remaining: Vec<u32> = path
            .path()
            .iter()
            .map(|&pos| octile_distance(pos, goal))
            .collect();
        assert!(remaining.windows(2).all(|pair| pair[1] < pair[0]));
    }

    #[test]
    fn test_wall_detour() {
        let map = floor();
        let mut service = PathfindingService::default();
        for y in 0..=8 {
            wall(&mut service, y as u32, at(5, y));
        }

        let path = find(&mut service, &map, args(at(0, 0), at(9, 9)))
            .result
            .unwrap();

        assert!(path.is_position_in_path(IVec2::new(5, 9)));
        for y in 0..=8 {
            assert!(!path.is_position_in_path(IVec2::new(5, y)));
        }
        assert_eq!(path.goal(), Some(IVec2::splat(9)));
    }

    #[test]
    fn test_solid_goal_with_proximity() {
        let map = floor();
        let mut service = PathfindingService::default();
        wall(&mut service, 1, at(6, 6));

        let path = find(
            &mut service,
            &map,
            args(at(0, 0), at(6, 6)).with_proximity(2.0),
        )
        .result
        .unwrap();

        let goal = path.goal().unwrap();
        assert_ne!(goal, IVec2::splat(6));
        assert!((goal - IVec2::splat(6)).as_vec2().length() <= 2.0);
        assert_eq!((goal - IVec2::splat(6)).length_squared(), 1);
    }

    #[test]
    fn test_solid_goal_without_proximity() {
        let map = floor();
        let mut service = PathfindingService::default();
        wall(&mut service, 1, at(6, 6));

        let outcome = find(&mut service, &map, args(at(0, 0), at(6, 6)));

        assert_eq!(outcome.status(), PathStatus::Failed);
        assert_eq!(outcome.result.unwrap_err(), PathError::UnreachableGoal);
        assert_eq!(outcome.stats.iterations, 0);
    }

    #[test]
    fn test_cancellation_between_slices() {
        let map = floor();
        let settings = PathfindingSettingsBuilder::new()
            .slice_budget(Duration::ZERO)
            .build();
        let mut service = PathfindingService::new(settings);
        let token = CancellationToken::new();

        let id = service.request_path(&map, args(at(0, 0), at(9, 9)), token.clone());
        assert_eq!(service.status(id), Some(PathStatus::Pending));

        service.tick(&map, Duration::ZERO);
        assert_eq!(service.status(id), Some(PathStatus::Running));

        token.cancel();
        service.tick(&map, Duration::from_millis(16));

        assert_eq!(service.status(id), Some(PathStatus::Cancelled));
        let outcome = service.take_result(id).unwrap();
        assert_eq!(outcome.stats.iterations, 1);

        service.tick(&map, Duration::from_millis(32));
        assert_eq!(service.status(id), None);
        assert_eq!(service.queued_jobs(), 0);
    }

    #[test]
    fn test_access_restricted_door() {
        let map = floor();
        let mut service = PathfindingService::default();
        for y in 0..=9 {
            if y == 4 {
                service.enqueue_update(GraphUpdate::AccessChanged {
                    entity: Entity::from_raw(100),
                    position: at(5, y),
                    reader: AccessReader::new([AccessTag(7)]),
                    enabled: true,
                });
            } else {
                wall(&mut service, y as u32, at(5, y));
            }
        }

        let locked = find(&mut service, &map, args(at(0, 4), at(9, 4)));
        assert_eq!(locked.result.unwrap_err(), PathError::Unreachable);

        let keyed = find(
            &mut service,
            &map,
            args(at(0, 4), at(9, 4)).with_access([AccessTag(7)]),
        );
        assert!(keyed.result.unwrap().is_position_in_path(IVec2::new(5, 4)));

        let agent = Agent::new(WALL, []);
        assert!(!service.can_traverse(&map, &agent, at(5, 4)));
        assert!(!service.can_traverse(&map, &agent, at(5, 5)));
        assert!(service.can_traverse(&map, &Agent::new(WALL, [AccessTag(7)]), at(5, 4)));
        assert!(service.can_traverse(&map, &agent, at(4, 4)));
    }

    #[test]
    fn test_can_reach_through_door() {
        let map = floor();
        let mut service = PathfindingService::default();
        for y in 0..=9 {
            if y == 4 {
                service.enqueue_update(GraphUpdate::AccessChanged {
                    entity: Entity::from_raw(100),
                    position: at(5, y),
                    reader: AccessReader::new([AccessTag(7)]),
                    enabled: true,
                });
            } else {
                wall(&mut service, y as u32, at(5, y));
            }
        }
        service.tick(&map, Duration::ZERO);

        assert!(service.can_reach(&map, &args(at(0, 0), at(4, 9))));
        assert!(!service.can_reach(&map, &args(at(0, 0), at(9, 9))));
        assert!(service.can_reach(
            &map,
            &args(at(0, 0), at(9, 9)).with_access([AccessTag(7)])
        ));
        assert!(!service.can_reach(&map, &args(at(0, 0), TileCoords::new(GridId(2), 1, 1))));
    }

    #[test]
    fn test_can_reach_follows_graph_updates() {
        let map = floor();
        let mut service = PathfindingService::default();
        for y in 0..=9 {
            wall(&mut service, y as u32, at(5, y));
        }
        service.tick(&map, Duration::ZERO);
        let query = args(at(0, 0), at(9, 9));

        assert!(!service.can_reach(&map, &query));
        // The walled goal settles for the open tile east of it.
        assert!(service.can_reach(&map, &args(at(9, 0), at(5, 5)).with_proximity(1.0)));
        assert!(!service.can_reach(&map, &args(at(0, 0), at(5, 5)).with_proximity(1.0)));

        service.enqueue_update(GraphUpdate::CollisionChanged {
            entity: Entity::from_raw(3),
            position: at(5, 3),
            body: CollisionBody::wall(WALL),
            can_collide: false,
        });
        service.tick(&map, Duration::from_millis(16));

        assert!(service.can_reach(&map, &query));

        // A reset forgets every body.
        service.reset();
        assert!(service.can_reach(&map, &args(at(0, 0), at(5, 5))));
    }

    #[test]
    fn test_end_on_another_grid_builds_nothing() {
        let map = floor();
        let mut service = PathfindingService::default();

        let outcome = find(
            &mut service,
            &map,
            args(at(0, 0), TileCoords::new(GridId(3), 1, 1)),
        );

        assert_eq!(outcome.result.unwrap_err(), PathError::Unreachable);
        assert!(service.graph(GridId(3)).is_none());
        assert_eq!(service.graphs().len(), 1);
    }

    #[test]
    fn test_maintenance_runs_before_search() {
        let map = floor();
        let mut service = PathfindingService::default();

        // The wall lands in the same tick the search starts.
        let id = service.request_path(&map, args(at(0, 0), at(2, 0)), CancellationToken::new());
        wall(&mut service, 1, at(1, 0));
        let outcome = run_until_done(&mut service, &map, id);

        assert!(!outcome.result.unwrap().is_position_in_path(IVec2::new(1, 0)));
    }

    #[test]
    fn test_grid_removed_mid_flight() {
        let mut map = floor();
        let settings = PathfindingSettingsBuilder::new()
            .slice_budget(Duration::ZERO)
            .build();
        let mut service = PathfindingService::new(settings);

        let id = service.request_path(&map, args(at(0, 0), at(9, 9)), CancellationToken::new());
        service.tick(&map, Duration::ZERO);

        map.remove_grid(GRID);
        service.remove_grid(GRID);

        assert!(service.graph(GRID).is_none());
        assert_eq!(
            service.take_result(id).unwrap().result.unwrap_err(),
            PathError::GridRemoved(GRID)
        );
    }

    #[test]
    fn test_missing_grid_fails_job() {
        let map = floor();
        let mut service = PathfindingService::default();

        let outcome = find(
            &mut service,
            &map,
            args(TileCoords::new(GridId(4), 0, 0), TileCoords::new(GridId(4), 1, 1)),
        );

        assert_eq!(outcome.result.unwrap_err(), PathError::GridRemoved(GridId(4)));
        assert!(service.graph(GridId(4)).is_none());
    }

    #[test]
    fn test_reset_cancels_jobs() {
        let map = floor();
        let settings = PathfindingSettingsBuilder::new()
            .slice_budget(Duration::ZERO)
            .build();
        let mut service = PathfindingService::new(settings);
        let token = CancellationToken::new();

        let id = service.request_path(&map, args(at(0, 0), at(9, 9)), token.clone());
        wall(&mut service, 1, at(3, 3));
        service.tick(&map, Duration::ZERO);
        wall(&mut service, 2, at(4, 4));

        service.reset();

        assert!(token.is_cancelled());
        assert_eq!(service.status(id), Some(PathStatus::Cancelled));
        assert_eq!(service.pending_updates(), 0);
        assert!(service.graph(GRID).is_none());
        assert_eq!(service.maintainer().tracked_count(), 0);
    }

    #[test]
    fn test_chunk_changes_and_snapshot() {
        let map = floor();
        let mut service = PathfindingService::default();
        wall(&mut service, 1, at(9, 1));
        service.tick(&map, Duration::from_secs(2));

        let changes = service.take_chunk_changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].origin, IVec2::new(8, 0));
        assert_eq!(changes[0].at, Duration::from_secs(2));

        let snapshot = service.snapshot(GRID, 16.0).unwrap();
        assert_eq!(snapshot.chunks.len(), 1);
        assert_eq!(snapshot.chunks[0].nodes.len(), 64);
    }

    #[test]
    fn test_unread_chunk_changes_stay_bounded() {
        let map = floor();
        let mut service = PathfindingService::default();

        // A door-like wall toggling every tick with nobody reading the changes.
        for tick in 0..1000 {
            service.enqueue_update(GraphUpdate::CollisionChanged {
                entity: Entity::from_raw(1),
                position: at(2, 2),
                body: CollisionBody::wall(WALL),
                can_collide: tick % 2 == 0,
            });
            service.tick(&map, Duration::from_millis(tick));
        }

        let changes = service.take_chunk_changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].origin, IVec2::ZERO);
        assert_eq!(changes[0].at, Duration::from_millis(999));
    }

    #[test]
    fn test_drain_results_in_completion_order() {
        let map = floor();
        let mut service = PathfindingService::default();

        let far = service.request_path(&map, args(at(0, 0), at(9, 9)), CancellationToken::new());
        let near = service.request_path(&map, args(at(0, 0), at(0, 0)), CancellationToken::new());
        while service.queued_jobs() > 0 {
            service.tick(&map, Duration::ZERO);
        }

        let ids: Vec<PathJobId> = service.drain_results().iter().map(|o| o.id).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&far) && ids.contains(&near));
        assert!(service.drain_results().is_empty());
    }

    // Plain Dijkstra over the same movement rules, used as ground truth.
    fn dijkstra_cost(map: &SparseTileMap, blocked: &[IVec2], start: IVec2, goal: IVec2) -> Option<u32> {
        let mut best: FxHashMap<IVec2, u32> = FxHashMap::default();
        let mut heap = BinaryHeap::new();
        best.insert(start, 0);
        heap.push(std::cmp::Reverse((0u32, start.x, start.y)));

        let open = |pos: IVec2| !map.tile(GRID, pos).is_empty() && !blocked.contains(&pos);

        while let Some(std::cmp::Reverse((cost, x, y))) = heap.pop() {
            let pos = IVec2::new(x, y);
            if pos == goal {
                return Some(cost);
            }
            if best.get(&pos).is_some_and(|&b| cost > b) {
                continue;
            }

            for dir in crate::dir::Dir::all() {
                let next = pos + dir.vector();
                if !open(next) {
                    continue;
                }
                let step = match dir.components() {
                    None => 10,
                    Some((a, b)) => {
                        if !open(pos + a.vector()) || !open(pos + b.vector()) {
                            continue;
                        }
                        14
                    }
                };

                let next_cost = cost + step;
                if best.get(&next).is_none_or(|&b| next_cost < b) {
                    best.insert(next, next_cost);
                    heap.push(std::cmp::Reverse((next_cost, next.x, next.y)));
                }
            }
        }

        None
    }

    #[test]
    fn test_random_grids_admissible_and_optimal() {
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..20 {
            let map = floor();
            let mut service = PathfindingService::default();
            let mut blocked = Vec::new();

            for id in 0..25 {
                let pos = IVec2::new(rng.random_range(0..10), rng.random_range(0..10));
                if pos == IVec2::ZERO || pos == IVec2::splat(9) || blocked.contains(&pos) {
                    continue;
                }
                blocked.push(pos);
                wall(&mut service, id, TileCoords::from_ivec2(GRID, pos));
            }

            let expected = dijkstra_cost(&map, &blocked, IVec2::ZERO, IVec2::splat(9));
            let outcome = find(&mut service, &map, args(at(0, 0), at(9, 9)));
            let jumped = find(
                &mut service,
                &map,
                args(at(0, 0), at(9, 9)).with_strategy(SearchStrategy::JumpPoint),
            );

            assert_eq!(
                service.can_reach(&map, &args(at(0, 0), at(9, 9))),
                expected.is_some()
            );
            assert_eq!(jumped.result.as_ref().ok().map(Path::cost), expected);

            match expected {
                Some(cost) => {
                    let path: Path = outcome.result.unwrap();
                    assert!(octile_distance(IVec2::ZERO, IVec2::splat(9)) <= cost);
                    assert_eq!(path.cost(), cost);
                    assert!(path.path().iter().all(|pos| !blocked.contains(pos)));
                }
                None => assert_eq!(outcome.result.unwrap_err(), PathError::Unreachable),
            }
        }
    }

    #[test]
    fn test_cardinal_flags() {
        let map = floor();
        let mut service = PathfindingService::default();

        let path = find(
            &mut service,
            &map,
            args(at(0, 0), at(3, 3)).with_flags(PathFlags {
                allow_diagonals: false,
                ..Default::default()
            }),
        )
        .result
        .unwrap();

        assert_eq!(path.len(), 7);
        assert_eq!(path.cost(), 60);
    }
}
