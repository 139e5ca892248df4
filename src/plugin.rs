//! Bevy wiring for the [`PathfindingService`].
use std::marker::PhantomData;

use bevy::{log, prelude::*};
use rustc_hash::FxHashMap;

use crate::{
    components::{Agent, PathFailed, PathRequest, PendingPath},
    graph::ChunkChanged,
    maintainer::GraphUpdate,
    path::Path,
    request::{CancellationToken, PathArgs, PathJobId},
    service::PathfindingService,
    settings::PathfindingSettings,
    tile::{GridId, TileMap},
};

/// Adds a [`PathfindingService`] resource driven by the `M` tile map resource.
///
/// Send [`GraphUpdate`] events as the world changes and insert [`PathRequest`] on entities
/// with an [`Agent`]. Results arrive as a [`Path`] or [`PathFailed`] component.
pub struct TileNavPlugin<M: TileMap + Resource> {
    pub settings: PathfindingSettings,
    _map: PhantomData<fn() -> M>,
}

impl<M: TileMap + Resource> Default for TileNavPlugin<M> {
    fn default() -> Self {
        Self::new(PathfindingSettings::default())
    }
}

impl<M: TileMap + Resource> TileNavPlugin<M> {
    pub fn new(settings: PathfindingSettings) -> Self {
        TileNavPlugin {
            settings,
            _map: PhantomData,
        }
    }
}

impl<M: TileMap + Resource> Plugin for TileNavPlugin<M> {
    fn build(&self, app: &mut App) {
        app.insert_resource(PathfindingService::new(self.settings.clone()))
            .init_resource::<PathJobEntities>()
            .add_event::<GraphUpdate>()
            .add_event::<GridRemoved>()
            .add_event::<RoundReset>()
            .add_event::<ChunkChanged>()
            .add_systems(
                Update,
                (
                    forward_graph_events,
                    cancel_dropped_requests,
                    start_path_requests::<M>,
                    tick_pathfinding::<M>,
                    apply_path_results,
                )
                    .chain()
                    .in_set(TileNavSet),
            );
    }
}

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileNavSet;

/// A grid was removed from the world. Searches on it fail and its graph is dropped.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridRemoved(pub GridId);

/// The round restarted. Every graph, queued update and search is cleared.
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct RoundReset;

/// Which entity asked for each running search.
#[derive(Resource, Debug, Default)]
pub struct PathJobEntities(FxHashMap<PathJobId, (Entity, CancellationToken)>);

impl PathJobEntities {
    pub fn entity(&self, id: PathJobId) -> Option<Entity> {
        self.0.get(&id).map(|(entity, _)| *entity)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn forward_graph_events(
    mut service: ResMut<PathfindingService>,
    mut updates: EventReader<GraphUpdate>,
    mut removed: EventReader<GridRemoved>,
    mut resets: EventReader<RoundReset>,
) {
    // Anything sent alongside a reset belongs to the round being thrown away.
    if resets.read().count() > 0 {
        service.reset();

        let dropped = updates.read().count();
        removed.clear();
        if dropped > 0 {
            log::debug!("Dropped {} graph updates sent with a round reset", dropped);
        }
        return;
    }

    for GridRemoved(grid) in removed.read() {
        service.remove_grid(*grid);
    }

    for update in updates.read() {
        service.enqueue_update(update.clone());
    }
}

// An entity that dropped its PendingPath gave up on the search.
fn cancel_dropped_requests(
    mut dropped: RemovedComponents<PendingPath>,
    pending: Query<(), With<PendingPath>>,
    jobs: Res<PathJobEntities>,
) {
    for entity in dropped.read() {
        if pending.contains(entity) {
            continue;
        }

        for (job_entity, token) in jobs.0.values() {
            if *job_entity == entity {
                token.cancel();
            }
        }
    }
}

fn start_path_requests<M: TileMap + Resource>(
    mut commands: Commands,
    mut service: ResMut<PathfindingService>,
    mut jobs: ResMut<PathJobEntities>,
    map: Res<M>,
    query: Query<(Entity, &Agent, &PathRequest, Option<&PendingPath>)>,
) {
    for (entity, agent, request, pending) in &query {
        // A new request replaces the search already running.
        if let Some(pending) = pending {
            pending.token.cancel();
        }

        let args = PathArgs::for_agent(agent, request.start, request.goal)
            .with_flags(request.flags)
            .with_proximity(request.proximity);

        let token = CancellationToken::new();
        let id = service.request_path(&*map, args, token.clone());
        jobs.0.insert(id, (entity, token.clone()));

        log::debug!("Entity {:?} requested path job {:?}", entity, id);

        commands
            .entity(entity)
            .remove::<(PathRequest, Path, PathFailed)>()
            .insert(PendingPath { id, token });
    }
}

fn tick_pathfinding<M: TileMap + Resource>(
    mut service: ResMut<PathfindingService>,
    map: Res<M>,
    time: Res<Time>,
    mut changed: EventWriter<ChunkChanged>,
) {
    let report = service.tick(&*map, time.elapsed());

    if report.maintenance.move_backlog > 0 {
        log::trace!("{} moves deferred to the next tick", report.maintenance.move_backlog);
    }

    for change in service.take_chunk_changes() {
        changed.write(change);
    }
}

fn apply_path_results(
    mut commands: Commands,
    mut service: ResMut<PathfindingService>,
    mut jobs: ResMut<PathJobEntities>,
    pending: Query<&PendingPath>,
) {
    for outcome in service.drain_results() {
        let Some((entity, _)) = jobs.0.remove(&outcome.id) else {
            continue;
        };

        // Skip entities that gave up, were despawned or have moved on to a newer request.
        let Ok(current) = pending.get(entity) else {
            continue;
        };
        if current.id != outcome.id {
            continue;
        }

        let mut entity_commands = commands.entity(entity);
        entity_commands.remove::<PendingPath>();

        match outcome.result {
            Ok(path) => {
                entity_commands.try_insert(path);
            }
            Err(error) => {
                log::debug!("Path job {:?} for {:?} failed: {}", outcome.id, entity, error);
                entity_commands.try_insert(PathFailed(error));
            }
        }
    }
}
