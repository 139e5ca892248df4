//! Sparse per-grid graphs of lazily created chunks.
use std::time::Duration;

use bevy::{log::debug, math::IVec2, prelude::Event};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{
    chunk::{GridChunk, CHUNK_SIZE},
    dir::Dir,
    node::TileNode,
    tile::{GridId, TileCoords, TileMap},
    FxIndexMap,
};

/// Emitted whenever a chunk's blocking state, tile identity or access readers change.
/// Intended for debug overlays and anything caching region data.
///
/// Changes to the same chunk between two reads are folded into one notification carrying the
/// latest time.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkChanged {
    pub grid: GridId,
    pub origin: IVec2,
    pub at: Duration,
}

/// The traversability graph of a single grid.
///
/// Chunks live in an arena keyed by their origin; nodes reference their chunk by
/// (grid, origin) only.
#[derive(Debug)]
pub struct GridGraph {
    grid: GridId,
    chunks: slab::Slab<GridChunk>,
    chunk_ids: FxHashMap<IVec2, usize>,
    /// At most one pending notification per chunk, keyed by origin.
    changed: FxIndexMap<IVec2, ChunkChanged>,
}

impl GridGraph {
    pub fn new(grid: GridId) -> Self {
        GridGraph {
            grid,
            chunks: slab::Slab::new(),
            chunk_ids: FxHashMap::default(),
            changed: FxIndexMap::default(),
        }
    }

    pub fn grid(&self) -> GridId {
        self.grid
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn chunks(&self) -> impl Iterator<Item = &GridChunk> {
        self.chunks.iter().map(|(_, chunk)| chunk)
    }

    /// Returns the chunk with the given origin if it has been created.
    pub fn chunk(&self, origin: IVec2) -> Option<&GridChunk> {
        self.chunk_ids
            .get(&origin)
            .and_then(|&id| self.chunks.get(id))
    }

    /// Returns the chunk containing `pos` if it has been created.
    pub fn chunk_at_position(&self, pos: IVec2) -> Option<&GridChunk> {
        self.chunk(GridChunk::origin_for(pos))
    }

    // Returns the arena id of the chunk containing `pos`, building it if needed.
    fn chunk_id<M: TileMap + ?Sized>(&mut self, pos: IVec2, map: &M) -> usize {
        let origin = GridChunk::origin_for(pos);

        if let Some(&id) = self.chunk_ids.get(&origin) {
            return id;
        }

        let id = self.chunks.insert(GridChunk::new(self.grid, origin, map));
        self.chunk_ids.insert(origin, id);
        id
    }

    /// Returns the chunk containing `pos`, building it if needed.
    pub(crate) fn chunk_or_insert<M: TileMap + ?Sized>(
        &mut self,
        pos: IVec2,
        map: &M,
    ) -> &GridChunk {
        let id = self.chunk_id(pos, map);
        &self.chunks[id]
    }

    /// Returns the node at `pos`, creating its chunk first if it doesn't exist yet.
    pub fn node<M: TileMap + ?Sized>(&mut self, pos: IVec2, map: &M) -> &TileNode {
        let id = self.chunk_id(pos, map);
        self.chunks[id].node_at(pos)
    }

    /// Returns the node at `pos` without creating anything.
    pub fn get(&self, pos: IVec2) -> Option<&TileNode> {
        self.chunk_at_position(pos).and_then(|chunk| chunk.node(pos))
    }

    /// Applies `f` to the node at `pos`. If `f` reports a change the owning chunk is dirtied.
    pub(crate) fn modify_node<M, F>(&mut self, pos: IVec2, map: &M, now: Duration, f: F) -> bool
    where
        M: TileMap + ?Sized,
        F: FnOnce(&mut TileNode) -> bool,
    {
        let id = self.chunk_id(pos, map);
        let chunk = &mut self.chunks[id];

        let changed = chunk.node_mut(pos).map(f).unwrap_or(false);

        if changed {
            chunk.dirty(now);
            let origin = chunk.origin();
            self.changed.insert(
                origin,
                ChunkChanged {
                    grid: self.grid,
                    origin,
                    at: now,
                },
            );
        }

        changed
    }

    /// Returns the nodes around `pos` in each of `directions`, paired with the direction.
    ///
    /// Interior tiles are read straight from the chunk of `pos`. Tiles on a chunk border
    /// create the neighboring chunks they reach into.
    pub fn neighbors<M: TileMap + ?Sized>(
        &mut self,
        pos: IVec2,
        directions: &[Dir],
        map: &M,
    ) -> SmallVec<[(Dir, &TileNode); 8]> {
        let id = self.chunk_id(pos, map);
        if !self.chunks[id].is_interior(pos) {
            for &dir in directions {
                self.chunk_id(pos + dir.vector(), map);
            }
        }

        let graph: &Self = self;
        let chunk = &graph.chunks[id];
        directions
            .iter()
            .filter_map(|&dir| {
                let neighbor = pos + dir.vector();
                let node = if chunk.contains(neighbor) {
                    Some(chunk.node_at(neighbor))
                } else {
                    graph.get(neighbor)
                };
                node.map(|node| (dir, node))
            })
            .collect()
    }

    /// Builds every missing chunk overlapping the inclusive tile rectangle `min..=max`.
    /// Returns how many chunks were created.
    pub fn prewarm<M: TileMap + Sync + ?Sized>(&mut self, min: IVec2, max: IVec2, map: &M) -> usize {
        let lo = GridChunk::origin_for(min.min(max));
        let hi = GridChunk::origin_for(min.max(max));

        let mut missing = Vec::new();
        let mut x = lo.x;
        while x <= hi.x {
            let mut y = lo.y;
            while y <= hi.y {
                let origin = IVec2::new(x, y);
                if !self.chunk_ids.contains_key(&origin) {
                    missing.push(origin);
                }
                y += CHUNK_SIZE;
            }
            x += CHUNK_SIZE;
        }

        let grid = self.grid;

        #[cfg(feature = "parallel")]
        let built: Vec<GridChunk> = missing
            .par_iter()
            .map(|&origin| GridChunk::new(grid, origin, map))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let built: Vec<GridChunk> = missing
            .iter()
            .map(|&origin| GridChunk::new(grid, origin, map))
            .collect();

        let count = built.len();
        for chunk in built {
            let origin = chunk.origin();
            let id = self.chunks.insert(chunk);
            self.chunk_ids.insert(origin, id);
        }

        debug!("Prewarmed {} chunks on {:?}", count, self.grid);
        count
    }

    /// Takes the change notifications queued since the last call, in order of first change.
    pub fn take_changed(&mut self) -> Vec<ChunkChanged> {
        std::mem::take(&mut self.changed).into_values().collect()
    }
}

/// Every [`GridGraph`] known to the pathfinding service, keyed by grid.
#[derive(Debug, Default)]
pub struct GraphRegistry {
    graphs: FxHashMap<GridId, GridGraph>,
}

impl GraphRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn graph(&self, grid: GridId) -> Option<&GridGraph> {
        self.graphs.get(&grid)
    }

    pub fn graph_mut(&mut self, grid: GridId) -> Option<&mut GridGraph> {
        self.graphs.get_mut(&grid)
    }

    /// Returns the graph for `grid`, registering a new empty one if needed.
    pub fn graph_or_insert(&mut self, grid: GridId) -> &mut GridGraph {
        self.graphs
            .entry(grid)
            .or_insert_with(|| GridGraph::new(grid))
    }

    pub fn graphs(&self) -> impl Iterator<Item = &GridGraph> {
        self.graphs.values()
    }

    /// Returns the node for a tile, creating the graph and chunk if needed.
    pub fn node<M: TileMap + ?Sized>(&mut self, coords: TileCoords, map: &M) -> &TileNode {
        self.graph_or_insert(coords.grid).node(coords.pos, map)
    }

    pub fn contains(&self, grid: GridId) -> bool {
        self.graphs.contains_key(&grid)
    }

    pub fn remove(&mut self, grid: GridId) -> Option<GridGraph> {
        self.graphs.remove(&grid)
    }

    pub fn clear(&mut self) {
        self.graphs.clear();
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    pub fn take_changed(&mut self) -> Vec<ChunkChanged> {
        self.graphs
            .values_mut()
            .flat_map(|graph| graph.take_changed())
            .collect()
    }
}
