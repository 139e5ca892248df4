//! This module defines the `GridChunk` struct, a fixed square block of tile nodes.
use std::time::Duration;

use bevy::math::IVec2;
use ndarray::Array2;

use crate::{
    node::TileNode,
    tile::{GridId, TileMap},
};

/// Width and height of a chunk in tiles.
pub const CHUNK_SIZE: i32 = 8;

/// A chunk is an 8x8 block of [`TileNode`]s on one grid.
/// It's the unit of lazy allocation and of change notification.
#[derive(Debug, Clone)]
pub struct GridChunk {
    grid: GridId,
    /// The minimum tile coordinates of the chunk.
    origin: IVec2,
    nodes: Array2<TileNode>,
    last_dirty: Option<Duration>,
    revision: u64,
}

impl PartialEq for GridChunk {
    fn eq(&self, other: &Self) -> bool {
        self.grid == other.grid && self.origin == other.origin
    }
}

impl Eq for GridChunk {}

impl GridChunk {
    /// Builds every node in the chunk by sampling the map.
    /// `origin` must be chunk aligned, see [`GridChunk::origin_for`].
    pub(crate) fn new<M: TileMap + ?Sized>(grid: GridId, origin: IVec2, map: &M) -> Self {
        debug_assert_eq!(origin, GridChunk::origin_for(origin));

        let size = CHUNK_SIZE as usize;
        let nodes = Array2::from_shape_fn((size, size), |(x, y)| {
            let pos = origin + IVec2::new(x as i32, y as i32);
            TileNode::new(grid, pos, map.tile(grid, pos))
        });

        GridChunk {
            grid,
            origin,
            nodes,
            last_dirty: None,
            revision: 0,
        }
    }

    /// Returns the origin of the chunk containing `pos`.
    pub fn origin_for(pos: IVec2) -> IVec2 {
        IVec2::new(
            pos.x.div_euclid(CHUNK_SIZE) * CHUNK_SIZE,
            pos.y.div_euclid(CHUNK_SIZE) * CHUNK_SIZE,
        )
    }

    pub fn grid(&self) -> GridId {
        self.grid
    }

    pub fn origin(&self) -> IVec2 {
        self.origin
    }

    /// One past the maximum tile coordinates of the chunk.
    pub fn max(&self) -> IVec2 {
        self.origin + IVec2::splat(CHUNK_SIZE)
    }

    /// When the chunk last had a structural change, if ever.
    pub fn last_dirty(&self) -> Option<Duration> {
        self.last_dirty
    }

    /// Counts structural changes. Anything derived from the chunk is stale once this moves.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn contains(&self, pos: IVec2) -> bool {
        pos.cmpge(self.origin).all() && pos.cmplt(self.max()).all()
    }

    /// True if all eight neighbors of `pos` are inside this chunk.
    pub fn is_interior(&self, pos: IVec2) -> bool {
        pos.cmpgt(self.origin).all() && pos.cmplt(self.max() - IVec2::ONE).all()
    }

    // Adjusts a position to the local coordinates of the chunk.
    pub(crate) fn to_local(&self, pos: IVec2) -> [usize; 2] {
        let local = pos - self.origin;
        [local.x as usize, local.y as usize]
    }

    /// Returns the node at a world tile position inside this chunk.
    pub fn node(&self, pos: IVec2) -> Option<&TileNode> {
        if !self.contains(pos) {
            return None;
        }

        Some(&self.nodes[self.to_local(pos)])
    }

    // Callers must have resolved this chunk from `pos`.
    pub(crate) fn node_at(&self, pos: IVec2) -> &TileNode {
        &self.nodes[self.to_local(pos)]
    }

    pub(crate) fn node_mut(&mut self, pos: IVec2) -> Option<&mut TileNode> {
        if !self.contains(pos) {
            return None;
        }

        let local = self.to_local(pos);
        Some(&mut self.nodes[local])
    }

    pub fn nodes(&self) -> impl Iterator<Item = &TileNode> {
        self.nodes.iter()
    }

    pub(crate) fn dirty(&mut self, now: Duration) {
        self.last_dirty = Some(now);
        self.revision += 1;
    }
}
