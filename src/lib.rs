use std::cmp::Ordering;
use std::hash::BuildHasherDefault;

use indexmap::IndexMap;
use rustc_hash::FxHasher;

mod astar;
pub mod chunk;
pub mod components;
pub mod debug;
pub mod dir;
pub mod error;
pub mod graph;
pub mod job;
mod jps;
mod macros;
pub mod maintainer;
pub mod neighbor;
pub mod node;
pub mod occupant;
pub mod path;
pub mod plugin;
pub mod queue;
pub mod region;
pub mod request;
pub mod service;
pub mod settings;
pub mod tile;
pub mod traverse;

pub mod prelude {
    pub use crate::chunk::{GridChunk, CHUNK_SIZE};
    pub use crate::components::{Agent, PathFailed, PathRequest, PendingPath};
    pub use crate::debug::{GraphSnapshot, TileNavDebugConfig, TileNavDebugPlugin};
    pub use crate::dir::Dir;
    pub use crate::error::PathError;
    pub use crate::graph::{ChunkChanged, GraphRegistry, GridGraph};
    pub use crate::job::{PathOutcome, PathSearchJob, PathStatus, SearchStats, SearchTelemetry};
    pub use crate::maintainer::{GraphMaintainer, GraphUpdate, MaintenanceReport};
    pub use crate::neighbor::*;
    pub use crate::node::TileNode;
    pub use crate::occupant::{AccessReader, AccessTag, BodyType, CollisionBody};
    pub use crate::path::Path;
    pub use crate::plugin::{GridRemoved, RoundReset, TileNavPlugin, TileNavSet};
    pub use crate::queue::PathJobQueue;
    pub use crate::region::{RegionId, RegionMap};
    pub use crate::request::{CancellationToken, PathArgs, PathFlags, PathJobId, SearchStrategy};
    pub use crate::service::{PathfindingService, TickReport};
    pub use crate::settings::{PathfindingSettings, PathfindingSettingsBuilder};
    pub use crate::tile::{GridId, SparseTileMap, Tile, TileCoords, TileMap, TileRef};
}

type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;

/// Open set entry: ordered by lowest estimated cost, then highest cost so far,
/// then lowest index.
#[derive(Debug)]
pub(crate) struct SmallestCostHolder<Id> {
    estimated_cost: Id,
    cost: Id,
    index: usize,
}

impl<Id: PartialEq> PartialEq for SmallestCostHolder<Id> {
    fn eq(&self, other: &Self) -> bool {
        self.estimated_cost.eq(&other.estimated_cost)
            && self.cost.eq(&other.cost)
            && self.index == other.index
    }
}

impl<Id: Eq> Eq for SmallestCostHolder<Id> {}

impl<Id: Ord> PartialOrd for SmallestCostHolder<Id> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<Id: Ord> Ord for SmallestCostHolder<Id> {
    fn cmp(&self, other: &Self) -> Ordering {
        match other.estimated_cost.cmp(&self.estimated_cost) {
            Ordering::Equal => match self.cost.cmp(&other.cost) {
                Ordering::Equal => other.index.cmp(&self.index),
                s => s,
            },
            s => s,
        }
    }
}
