//! This module defines the `TileNode` struct, the per-tile traversability record.
use bevy::{math::IVec2, prelude::Entity};
use rustc_hash::{FxHashMap, FxHashSet};
use std::hash::{Hash, Hasher};

use crate::{
    occupant::{AccessReader, AccessTag, CollisionBody},
    tile::{GridId, Tile, TileCoords, TileRef},
};

/// Traversability data for a single tile.
///
/// Nodes are owned by their [`crate::chunk::GridChunk`] and are only mutated through the
/// [`crate::maintainer::GraphMaintainer`].
#[derive(Debug, Clone)]
pub struct TileNode {
    pub(crate) grid: GridId,
    pub(crate) pos: IVec2,
    pub(crate) tile: Tile,
    /// OR of the layers of every static body on this tile.
    pub(crate) blocked_collision_mask: u32,
    pub(crate) static_occupants: FxHashMap<Entity, u32>,
    pub(crate) dynamic_occupants: FxHashMap<Entity, u32>,
    pub(crate) access_readers: FxHashMap<Entity, AccessReader>,
}

impl TileNode {
    pub(crate) fn new(grid: GridId, pos: IVec2, tile: Tile) -> Self {
        TileNode {
            grid,
            pos,
            tile,
            blocked_collision_mask: 0,
            static_occupants: FxHashMap::default(),
            dynamic_occupants: FxHashMap::default(),
            access_readers: FxHashMap::default(),
        }
    }

    pub fn grid(&self) -> GridId {
        self.grid
    }

    pub fn pos(&self) -> IVec2 {
        self.pos
    }

    pub fn coords(&self) -> TileCoords {
        TileCoords::from_ivec2(self.grid, self.pos)
    }

    pub fn tile(&self) -> Tile {
        self.tile
    }

    pub fn tile_ref(&self) -> TileRef {
        TileRef::new(self.coords(), self.tile)
    }

    pub fn blocked_collision_mask(&self) -> u32 {
        self.blocked_collision_mask
    }

    /// Non-static bodies on this tile and their layers.
    pub fn dynamic_occupants(&self) -> &FxHashMap<Entity, u32> {
        &self.dynamic_occupants
    }

    pub fn access_readers(&self) -> impl Iterator<Item = &AccessReader> {
        self.access_readers.values()
    }

    /// Can something with this collision mask and these access tags stand here?
    pub fn is_traversable(&self, collision_mask: u32, access: &FxHashSet<AccessTag>) -> bool {
        (collision_mask & self.blocked_collision_mask) == 0
            && self
                .access_readers
                .values()
                .all(|reader| reader.is_allowed(access))
    }

    /// Replaces the tile identity. Returns true if it changed.
    pub(crate) fn update_tile(&mut self, tile: Tile) -> bool {
        if self.tile == tile {
            return false;
        }

        self.tile = tile;
        true
    }

    /// Adds a body to this tile. Returns true if the blocking mask changed.
    pub(crate) fn add_body(&mut self, entity: Entity, body: CollisionBody) -> bool {
        if body.is_static() {
            self.dynamic_occupants.remove(&entity);
            self.static_occupants.insert(entity, body.layer);
            self.recompute_mask()
        } else {
            self.dynamic_occupants.insert(entity, body.layer);
            // A body that was anchored and is now free no longer blocks.
            self.static_occupants.remove(&entity).is_some() && self.recompute_mask()
        }
    }

    /// Removes a body from this tile. Returns true if the blocking mask changed.
    pub(crate) fn remove_body(&mut self, entity: Entity) -> bool {
        self.dynamic_occupants.remove(&entity);

        if self.static_occupants.remove(&entity).is_some() {
            self.recompute_mask()
        } else {
            false
        }
    }

    /// Returns true if the reader set changed.
    pub(crate) fn add_access_reader(&mut self, entity: Entity, reader: AccessReader) -> bool {
        self.access_readers.insert(entity, reader.clone()) != Some(reader)
    }

    /// Returns true if the reader set changed.
    pub(crate) fn remove_access_reader(&mut self, entity: Entity) -> bool {
        self.access_readers.remove(&entity).is_some()
    }

    // Occupants can share layers so removing one can't just clear its bits.
    fn recompute_mask(&mut self) -> bool {
        let mask = self
            .static_occupants
            .values()
            .fold(0, |mask, layer| mask | layer);

        let changed = mask != self.blocked_collision_mask;
        self.blocked_collision_mask = mask;
        changed
    }
}

impl PartialEq for TileNode {
    fn eq(&self, other: &Self) -> bool {
        self.grid == other.grid && self.pos == other.pos
    }
}

impl Eq for TileNode {}

impl Hash for TileNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.grid.hash(state);
        self.pos.hash(state);
    }
}
