//! Connected floor regions, for answering "can this agent ever get there" without a search.
//!
//! Every chunk is split into regions of 4-connected open floor. A tile with an access reader
//! is a region of its own so doors can be crossed or not depending on who's asking. Tiles with
//! any static body or no floor aren't part of a region.
//!
//! Reachability is a breadth-first walk over neighboring regions, cached per access set and
//! target region until one of the chunks it looked at changes.
use std::collections::VecDeque;

use bevy::{log, math::IVec2};
use ndarray::Array2;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    chunk::{GridChunk, CHUNK_SIZE},
    dir::Dir,
    graph::GridGraph,
    node::TileNode,
    occupant::AccessTag,
    tile::TileMap,
};

/// A region, named by the chunk it lives in and its index within the chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionId {
    pub origin: IVec2,
    pub index: u16,
}

#[derive(Debug, Clone)]
struct Region {
    /// The first tile found in the region.
    anchor: IVec2,
    door: bool,
}

#[derive(Debug, Clone)]
struct ChunkRegions {
    revision: u64,
    labels: Array2<Option<u16>>,
    regions: Vec<Region>,
}

impl ChunkRegions {
    fn build(chunk: &GridChunk) -> Self {
        let size = CHUNK_SIZE as usize;
        let mut labels: Array2<Option<u16>> = Array2::from_elem((size, size), None);
        let mut regions = Vec::new();

        for node in chunk.nodes() {
            let pos = node.pos();
            if labels[chunk.to_local(pos)].is_some() || !is_open(node) {
                continue;
            }

            let index = regions.len() as u16;
            let door = is_door(node);
            labels[chunk.to_local(pos)] = Some(index);
            regions.push(Region { anchor: pos, door });

            if door {
                continue;
            }

            let mut frontier = VecDeque::from([pos]);
            while let Some(current) = frontier.pop_front() {
                for dir in Dir::cardinal() {
                    let next = current + dir.vector();
                    let Some(next_node) = chunk.node(next) else {
                        continue;
                    };

                    let local = chunk.to_local(next);
                    if labels[local].is_none() && is_open(next_node) && !is_door(next_node) {
                        labels[local] = Some(index);
                        frontier.push_back(next);
                    }
                }
            }
        }

        ChunkRegions {
            revision: chunk.revision(),
            labels,
            regions,
        }
    }

    fn tiles(&self, origin: IVec2, index: u16) -> Vec<IVec2> {
        self.labels
            .indexed_iter()
            .filter(|(_, label)| **label == Some(index))
            .map(|((x, y), _)| origin + IVec2::new(x as i32, y as i32))
            .collect()
    }
}

fn is_open(node: &TileNode) -> bool {
    node.blocked_collision_mask() == 0 && !node.tile().is_empty()
}

fn is_door(node: &TileNode) -> bool {
    node.access_readers().next().is_some()
}

#[derive(Debug, Clone)]
struct Reach {
    regions: FxHashSet<RegionId>,
    /// Revision of every chunk looked at while walking.
    revisions: FxHashMap<IVec2, u64>,
}

impl Reach {
    fn is_current(&self, graph: &GridGraph) -> bool {
        self.revisions.iter().all(|(origin, revision)| {
            graph
                .chunk(*origin)
                .is_some_and(|chunk| chunk.revision() == *revision)
        })
    }
}

/// Region data for a single grid.
#[derive(Debug, Default)]
pub struct RegionMap {
    chunks: FxHashMap<IVec2, ChunkRegions>,
    reach: FxHashMap<(Vec<AccessTag>, RegionId), Reach>,
}

impl RegionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the region `pos` belongs to, rebuilding its chunk's regions if they're stale.
    pub fn region_at<M: TileMap + ?Sized>(
        &mut self,
        graph: &mut GridGraph,
        map: &M,
        pos: IVec2,
    ) -> Option<RegionId> {
        let chunk = graph.chunk_or_insert(pos, map);
        let origin = chunk.origin();

        let stale = self
            .chunks
            .get(&origin)
            .is_none_or(|regions| regions.revision != chunk.revision());
        if stale {
            self.chunks.insert(origin, ChunkRegions::build(chunk));
            self.reach
                .retain(|_, reach| !reach.revisions.contains_key(&origin));
        }

        let index = self.chunks.get(&origin)?.labels[chunk.to_local(pos)]?;
        Some(RegionId { origin, index })
    }

    /// Can something holding `access` walk from `from` to `to` without cutting corners?
    ///
    /// Only tiles free of static bodies count, so this can say no where a search that
    /// ignores some body layers would still find a way.
    pub fn can_reach<M: TileMap + ?Sized>(
        &mut self,
        graph: &mut GridGraph,
        map: &M,
        access: &FxHashSet<AccessTag>,
        from: IVec2,
        to: IVec2,
    ) -> bool {
        let (Some(target), Some(start)) = (
            self.region_at(graph, map, to),
            self.region_at(graph, map, from),
        ) else {
            return false;
        };

        if start == target {
            return true;
        }

        let mut tags: Vec<AccessTag> = access.iter().copied().collect();
        tags.sort_unstable();
        let key = (tags, target);

        let fresh = self
            .reach
            .get(&key)
            .is_some_and(|reach| reach.is_current(graph));
        if !fresh {
            let reach = self.walk(graph, map, access, target);
            self.reach.insert(key.clone(), reach);
        }

        self.reach
            .get(&key)
            .is_some_and(|reach| reach.regions.contains(&start))
    }

    // Every region connected to `root` through regions `access` may enter.
    fn walk<M: TileMap + ?Sized>(
        &mut self,
        graph: &mut GridGraph,
        map: &M,
        access: &FxHashSet<AccessTag>,
        root: RegionId,
    ) -> Reach {
        let mut regions = FxHashSet::from_iter([root]);
        let mut touched = FxHashSet::from_iter([root.origin]);
        let mut frontier = VecDeque::from([root]);

        while let Some(region) = frontier.pop_front() {
            let Some(tiles) = self
                .chunks
                .get(&region.origin)
                .map(|chunk| chunk.tiles(region.origin, region.index))
            else {
                log::error!("Region {:?} has no chunk data", region);
                continue;
            };

            for tile in tiles {
                for dir in Dir::cardinal() {
                    let next = tile + dir.vector();
                    touched.insert(GridChunk::origin_for(next));

                    let Some(neighbor) = self.region_at(graph, map, next) else {
                        continue;
                    };
                    if regions.contains(&neighbor) || !self.passable(graph, neighbor, access) {
                        continue;
                    }

                    regions.insert(neighbor);
                    frontier.push_back(neighbor);
                }
            }
        }

        let revisions = touched
            .into_iter()
            .filter_map(|origin| graph.chunk(origin).map(|chunk| (origin, chunk.revision())))
            .collect();

        Reach { regions, revisions }
    }

    fn passable(&self, graph: &GridGraph, id: RegionId, access: &FxHashSet<AccessTag>) -> bool {
        let Some(region) = self
            .chunks
            .get(&id.origin)
            .and_then(|chunk| chunk.regions.get(id.index as usize))
        else {
            return false;
        };

        !region.door
            || graph
                .get(region.anchor)
                .is_some_and(|node| node.is_traversable(0, access))
    }
}
