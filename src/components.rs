//! Components used by [`crate::plugin::TileNavPlugin`].
use bevy::prelude::*;
use rustc_hash::FxHashSet;

use crate::{
    error::PathError,
    occupant::AccessTag,
    request::{CancellationToken, PathFlags, PathJobId},
    tile::TileCoords,
};

/// Movement capabilities of an entity that paths.
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct Agent {
    /// Layers that block this agent.
    pub collision_mask: u32,
    pub access: FxHashSet<AccessTag>,
}

impl Agent {
    pub fn new(collision_mask: u32, access: impl IntoIterator<Item = AccessTag>) -> Self {
        Agent {
            collision_mask,
            access: access.into_iter().collect(),
        }
    }
}

/// Insert on an entity with an [`Agent`] to request a path.
/// Replaced by [`PendingPath`] once the search is queued.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct PathRequest {
    pub start: TileCoords,
    pub goal: TileCoords,
    pub flags: PathFlags,
    pub proximity: f32,
}

impl PathRequest {
    pub fn new(start: TileCoords, goal: TileCoords) -> Self {
        PathRequest {
            start,
            goal,
            flags: PathFlags::default(),
            proximity: 0.0,
        }
    }

    pub fn with_flags(mut self, flags: PathFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_proximity(mut self, proximity: f32) -> Self {
        self.proximity = proximity;
        self
    }
}

/// A search is running for this entity.
/// Remove the component, or cancel its token, to give up on the search.
#[derive(Component, Debug, Clone)]
pub struct PendingPath {
    pub id: PathJobId,
    pub token: CancellationToken,
}

/// The last path request for this entity failed.
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct PathFailed(pub PathError);
