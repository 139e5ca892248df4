//! Inputs for a path request.
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use rustc_hash::FxHashSet;

use crate::{components::Agent, occupant::AccessTag, tile::TileCoords};

/// Identifies a submitted path search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathJobId(pub u64);

/// How the open set is expanded.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchStrategy {
    /// Expand every neighbor of every node.
    #[default]
    Astar,
    /// Jump along straight runs and only queue the tiles where the route can turn.
    /// Needs diagonal movement; requests without it search with [`SearchStrategy::Astar`].
    JumpPoint,
}

/// Movement options for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathFlags {
    /// Allow 8-way movement.
    pub allow_diagonals: bool,
    /// Allow walking over tiles with no floor.
    pub allow_space: bool,
    /// Ignore blocking bodies and access readers altogether.
    pub no_clip: bool,
    pub strategy: SearchStrategy,
}

impl Default for PathFlags {
    fn default() -> Self {
        PathFlags {
            allow_diagonals: true,
            allow_space: false,
            no_clip: false,
            strategy: SearchStrategy::Astar,
        }
    }
}

/// Everything a search needs to know about the mover and the route.
#[derive(Debug, Clone, PartialEq)]
pub struct PathArgs {
    pub start: TileCoords,
    pub end: TileCoords,
    /// Layers that block this mover.
    pub collision_mask: u32,
    /// Access tags the mover holds.
    pub access: FxHashSet<AccessTag>,
    pub flags: PathFlags,
    /// If the end tile can't be entered, settle for the nearest open tile within this radius.
    /// Zero disables the fallback.
    pub proximity: f32,
}

impl PathArgs {
    /// Arguments for a mover with no collision and no access.
    pub fn new(start: TileCoords, end: TileCoords) -> Self {
        PathArgs {
            start,
            end,
            collision_mask: 0,
            access: FxHashSet::default(),
            flags: PathFlags::default(),
            proximity: 0.0,
        }
    }

    /// Arguments using an [`Agent`]'s collision mask and access.
    pub fn for_agent(agent: &Agent, start: TileCoords, end: TileCoords) -> Self {
        PathArgs {
            collision_mask: agent.collision_mask,
            access: agent.access.clone(),
            ..PathArgs::new(start, end)
        }
    }

    pub fn with_collision_mask(mut self, collision_mask: u32) -> Self {
        self.collision_mask = collision_mask;
        self
    }

    pub fn with_access(mut self, access: impl IntoIterator<Item = AccessTag>) -> Self {
        self.access = access.into_iter().collect();
        self
    }

    pub fn with_flags(mut self, flags: PathFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_strategy(mut self, strategy: SearchStrategy) -> Self {
        self.flags.strategy = strategy;
        self
    }

    pub fn with_proximity(mut self, proximity: f32) -> Self {
        self.proximity = proximity;
        self
    }
}

/// Cooperative cancellation for a path request.
/// Clones share the same flag; the search checks it at the start of every slice.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::GridId;

    #[test]
    fn test_token_clones_share_state() {
        let token = CancellationToken::new();
        let clone = token.clone();

        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_args_for_agent() {
        let agent = Agent::new(0b101, [AccessTag(3)]);
        let args = PathArgs::for_agent(
            &agent,
            TileCoords::new(GridId(0), 0, 0),
            TileCoords::new(GridId(0), 4, 4),
        )
        .with_proximity(1.5);

        assert_eq!(args.collision_mask, 0b101);
        assert!(args.access.contains(&AccessTag(3)));
        assert!(args.flags.allow_diagonals);
        assert_eq!(args.flags.strategy, SearchStrategy::Astar);
        assert_eq!(args.proximity, 1.5);
    }
}
