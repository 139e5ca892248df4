//! Keeps tile graphs in step with the world by applying queued [`GraphUpdate`]s.
use std::{collections::VecDeque, time::Duration};

use bevy::{log, prelude::*};
use rustc_hash::FxHashMap;

use crate::{
    graph::GraphRegistry,
    node::TileNode,
    occupant::{AccessReader, CollisionBody},
    settings::PathfindingSettings,
    tile::{GridId, TileCoords, TileMap, TileRef},
};

/// A change in the world that may affect traversability.
#[derive(Event, Debug, Clone, PartialEq)]
pub enum GraphUpdate {
    /// A tile was placed, replaced or removed.
    TileChanged(TileRef),
    /// An access reader (a door, an airlock) was added or removed on a tile.
    AccessChanged {
        entity: Entity,
        position: TileCoords,
        reader: AccessReader,
        enabled: bool,
    },
    /// A body started or stopped colliding, or changed between static and dynamic.
    CollisionChanged {
        entity: Entity,
        position: TileCoords,
        body: CollisionBody,
        can_collide: bool,
    },
    /// A tracked entity moved to a new tile, or was deleted.
    EntityMoved {
        entity: Entity,
        position: TileCoords,
        deleted: bool,
    },
}

impl GraphUpdate {
    /// The grid this update refers to.
    pub fn grid(&self) -> GridId {
        match self {
            GraphUpdate::TileChanged(tile) => tile.coords.grid,
            GraphUpdate::AccessChanged { position, .. }
            | GraphUpdate::CollisionChanged { position, .. }
            | GraphUpdate::EntityMoved { position, .. } => position.grid,
        }
    }
}

/// What a single [`GraphMaintainer::drain`] call applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub collision_updates: usize,
    pub access_updates: usize,
    pub tile_updates: usize,
    pub moves_applied: usize,
    /// Moves still queued after the drain.
    pub move_backlog: usize,
    /// Node changes that dirtied a chunk.
    pub nodes_changed: usize,
}

impl MaintenanceReport {
    pub fn high_priority(&self) -> usize {
        self.collision_updates + self.access_updates + self.tile_updates
    }
}

// What a tracked entity last contributed to the graph.
#[derive(Debug, Clone, Default)]
struct Tracked {
    position: TileCoords,
    body: Option<CollisionBody>,
    reader: Option<AccessReader>,
}

impl Tracked {
    fn is_empty(&self) -> bool {
        self.body.is_none() && self.reader.is_none()
    }
}

/// Applies world changes to a [`GraphRegistry`].
///
/// Collision, access and tile updates are always applied in full. Moves are
/// amortized: each drain applies at most `move_budget` minus the high priority updates
/// applied that drain, widened so the backlog never stays above `move_backlog_threshold`.
#[derive(Debug)]
pub struct GraphMaintainer {
    settings: PathfindingSettings,
    collision_updates: VecDeque<GraphUpdate>,
    access_updates: VecDeque<GraphUpdate>,
    tile_updates: VecDeque<TileRef>,
    moves: VecDeque<GraphUpdate>,
    tracked: FxHashMap<Entity, Tracked>,
}

impl GraphMaintainer {
    pub fn new(settings: &PathfindingSettings) -> Self {
        GraphMaintainer {
            settings: settings.clone(),
            collision_updates: VecDeque::new(),
            access_updates: VecDeque::new(),
            tile_updates: VecDeque::new(),
            moves: VecDeque::new(),
            tracked: FxHashMap::default(),
        }
    }

    /// Queues an update for the next drain.
    pub fn enqueue(&mut self, update: GraphUpdate) {
        match update {
            GraphUpdate::TileChanged(tile) => self.tile_updates.push_back(tile),
            GraphUpdate::AccessChanged { .. } => self.access_updates.push_back(update),
            GraphUpdate::CollisionChanged { .. } => self.collision_updates.push_back(update),
            GraphUpdate::EntityMoved { .. } => self.moves.push_back(update),
        }
    }

    /// Queued updates across all categories.
    pub fn pending(&self) -> usize {
        self.collision_updates.len()
            + self.access_updates.len()
            + self.tile_updates.len()
            + self.moves.len()
    }

    pub fn move_backlog(&self) -> usize {
        self.moves.len()
    }

    /// The position the maintainer last recorded for an entity, if it's tracked.
    pub fn tracked_position(&self, entity: Entity) -> Option<TileCoords> {
        self.tracked.get(&entity).map(|tracked| tracked.position)
    }

    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    /// How many moves to apply given the high priority updates already applied and the
    /// current backlog.
    pub fn move_budget(&self, high_priority: usize) -> usize {
        let backlog = self.moves.len();
        let mut budget = self.settings.move_budget.saturating_sub(high_priority);

        if backlog > self.settings.move_backlog_threshold {
            budget += backlog - self.settings.move_backlog_threshold;
        }

        budget.min(backlog)
    }

    /// Applies every queued high priority update and a budgeted number of moves.
    pub fn drain<M: TileMap + ?Sized>(
        &mut self,
        graphs: &mut GraphRegistry,
        map: &M,
        now: Duration,
    ) -> MaintenanceReport {
        let mut report = MaintenanceReport::default();

        while let Some(update) = self.collision_updates.pop_front() {
            report.collision_updates += 1;
            report.nodes_changed += self.apply(update, graphs, map, now);
        }

        while let Some(update) = self.access_updates.pop_front() {
            report.access_updates += 1;
            report.nodes_changed += self.apply(update, graphs, map, now);
        }

        while let Some(tile) = self.tile_updates.pop_front() {
            report.tile_updates += 1;
            report.nodes_changed += self.apply(GraphUpdate::TileChanged(tile), graphs, map, now);
        }

        let budget = self.move_budget(report.high_priority());
        for update in self.moves.drain(..budget).collect::<Vec<_>>() {
            report.moves_applied += 1;
            report.nodes_changed += self.apply(update, graphs, map, now);
        }

        report.move_backlog = self.moves.len();

        if report.move_backlog >= self.settings.move_backlog_limit {
            log::error!(
                "Move backlog of {} is over the limit of {}",
                report.move_backlog,
                self.settings.move_backlog_limit
            );
        }
        debug_assert!(
            report.move_backlog < self.settings.move_backlog_limit,
            "move backlog drain isn't keeping up"
        );

        report
    }

    // Returns the number of nodes whose blocking state, tile or readers changed.
    fn apply<M: TileMap + ?Sized>(
        &mut self,
        update: GraphUpdate,
        graphs: &mut GraphRegistry,
        map: &M,
        now: Duration,
    ) -> usize {
        if !map.grid_exists(update.grid()) {
            log::debug!("Dropping update for missing grid {:?}", update.grid());
            return 0;
        }

        match update {
            GraphUpdate::TileChanged(tile) => {
                modify(graphs, map, now, tile.coords, |node| node.update_tile(tile.tile)) as usize
            }
            GraphUpdate::CollisionChanged {
                entity,
                position,
                body,
                can_collide,
            } => self.collision_changed(graphs, map, now, entity, position, body, can_collide),
            GraphUpdate::AccessChanged {
                entity,
                position,
                reader,
                enabled,
            } => self.access_changed(graphs, map, now, entity, position, reader, enabled),
            GraphUpdate::EntityMoved {
                entity,
                position,
                deleted,
            } => self.entity_moved(graphs, map, now, entity, position, deleted),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn collision_changed<M: TileMap + ?Sized>(
        &mut self,
        graphs: &mut GraphRegistry,
        map: &M,
        now: Duration,
        entity: Entity,
        position: TileCoords,
        body: CollisionBody,
        can_collide: bool,
    ) -> usize {
        if body.layer & self.settings.tracked_collision_layers == 0 {
            return 0;
        }

        let mut changed = 0;
        let tracked = self.tracked.entry(entity).or_insert_with(|| Tracked {
            position,
            ..Default::default()
        });

        if tracked.body.is_some() {
            changed += modify_existing(graphs, map, now, tracked.position, |node| {
                node.remove_body(entity)
            }) as usize;
        }

        if can_collide {
            // Anything else the entity contributes follows it to the reported tile.
            if let (Some(reader), true) = (tracked.reader.clone(), tracked.position != position) {
                changed += modify_existing(graphs, map, now, tracked.position, |node| {
                    node.remove_access_reader(entity)
                }) as usize;
                changed += modify(graphs, map, now, position, |node| {
                    node.add_access_reader(entity, reader)
                }) as usize;
            }

            changed += modify(graphs, map, now, position, |node| node.add_body(entity, body)) as usize;
            tracked.body = Some(body);
            tracked.position = position;
        } else {
            tracked.body = None;
        }

        if tracked.is_empty() {
            self.tracked.remove(&entity);
        }

        changed
    }

    #[allow(clippy::too_many_arguments)]
    fn access_changed<M: TileMap + ?Sized>(
        &mut self,
        graphs: &mut GraphRegistry,
        map: &M,
        now: Duration,
        entity: Entity,
        position: TileCoords,
        reader: AccessReader,
        enabled: bool,
    ) -> usize {
        let mut changed = 0;
        let tracked = self.tracked.entry(entity).or_insert_with(|| Tracked {
            position,
            ..Default::default()
        });

        if tracked.reader.is_some() {
            changed += modify_existing(graphs, map, now, tracked.position, |node| {
                node.remove_access_reader(entity)
            }) as usize;
        }

        if enabled {
            if let (Some(body), true) = (tracked.body, tracked.position != position) {
                changed += modify_existing(graphs, map, now, tracked.position, |node| {
                    node.remove_body(entity)
                }) as usize;
                changed += modify(graphs, map, now, position, |node| node.add_body(entity, body)) as usize;
            }

            changed += modify(graphs, map, now, position, |node| {
                node.add_access_reader(entity, reader.clone())
            }) as usize;
            tracked.reader = Some(reader);
            tracked.position = position;
        } else {
            tracked.reader = None;
        }

        if tracked.is_empty() {
            self.tracked.remove(&entity);
        }

        changed
    }

    fn entity_moved<M: TileMap + ?Sized>(
        &mut self,
        graphs: &mut GraphRegistry,
        map: &M,
        now: Duration,
        entity: Entity,
        position: TileCoords,
        deleted: bool,
    ) -> usize {
        let Some(tracked) = self.tracked.get(&entity) else {
            return 0;
        };

        if !deleted && tracked.position == position {
            return 0;
        }

        let Tracked {
            position: old,
            body,
            reader,
        } = tracked.clone();

        let mut changed = modify_existing(graphs, map, now, old, |node| {
            let body_changed = node.remove_body(entity);
            node.remove_access_reader(entity) | body_changed
        }) as usize;

        if deleted {
            self.tracked.remove(&entity);
            return changed;
        }

        changed += modify(graphs, map, now, position, |node| {
            let body_changed = body.is_some_and(|body| node.add_body(entity, body));
            let reader_changed = reader.is_some_and(|reader| node.add_access_reader(entity, reader));
            body_changed | reader_changed
        }) as usize;

        if let Some(tracked) = self.tracked.get_mut(&entity) {
            tracked.position = position;
        }

        changed
    }

    /// Drops queued updates and tracked entities on a grid that's gone.
    pub fn remove_grid(&mut self, grid: GridId) {
        self.collision_updates.retain(|update| update.grid() != grid);
        self.access_updates.retain(|update| update.grid() != grid);
        self.tile_updates.retain(|tile| tile.coords.grid != grid);
        self.moves.retain(|update| update.grid() != grid);
        self.tracked.retain(|_, tracked| tracked.position.grid != grid);
    }

    /// Forgets every queued update and tracked entity.
    pub fn clear(&mut self) {
        self.collision_updates.clear();
        self.access_updates.clear();
        self.tile_updates.clear();
        self.moves.clear();
        self.tracked.clear();
    }
}

// Changes a node, creating its graph and chunk if needed.
fn modify<M, F>(graphs: &mut GraphRegistry, map: &M, now: Duration, coords: TileCoords, f: F) -> bool
where
    M: TileMap + ?Sized,
    F: FnOnce(&mut TileNode) -> bool,
{
    graphs
        .graph_or_insert(coords.grid)
        .modify_node(coords.pos, map, now, f)
}

// Changes a node only if its graph still exists.
fn modify_existing<M, F>(
    graphs: &mut GraphRegistry,
    map: &M,
    now: Duration,
    coords: TileCoords,
    f: F,
) -> bool
where
    M: TileMap + ?Sized,
    F: FnOnce(&mut TileNode) -> bool,
{
    graphs
        .graph_mut(coords.grid)
        .is_some_and(|graph| graph.modify_node(coords.pos, map, now, f))
}
