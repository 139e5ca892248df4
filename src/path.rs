//! This module defines the `Path` component.
use bevy::math::IVec2;
use bevy::prelude::Component;
use std::collections::VecDeque;

use crate::tile::{GridId, TileCoords};

/// The result of a successful path search.
///
/// Holds every tile from the start to the goal, both inclusive.
/// If using [`crate::plugin::TileNavPlugin`] this is inserted as a component on the requesting
/// entity once its search finishes.
#[derive(Debug, Clone, Component)]
pub struct Path {
    grid: GridId,
    pub(crate) path: VecDeque<IVec2>,
    cost: u32,
}

impl Path {
    /// Create a new path from a vector of tile positions.
    /// # Arguments
    /// * `grid` - The grid the positions are on
    /// * `path` - The positions, start first
    /// * `cost` - The total movement cost of the path
    ///
    pub fn new(grid: GridId, path: Vec<IVec2>, cost: u32) -> Self {
        Path {
            grid,
            path: path.into_iter().collect(),
            cost,
        }
    }

    pub fn grid(&self) -> GridId {
        self.grid
    }

    /// Returns true if the path contains the given position
    pub fn is_position_in_path(&self, pos: IVec2) -> bool {
        self.path.contains(&pos)
    }

    /// Returns the path as a slice of positions.
    ///
    /// # Example
    ///
    /// ```rust
    /// use bevy::math::IVec2;
    /// use bevy_tilenav::prelude::*;
    ///
    /// let path = Path::new(GridId(0), vec![IVec2::new(1, 2), IVec2::new(2, 3)], 14);
    /// assert_eq!(path.path(), &[IVec2::new(1, 2), IVec2::new(2, 3)]);
    /// ```
    pub fn path(&self) -> &[IVec2] {
        self.path.as_slices().0
    }

    /// Returns the positions as [`TileCoords`].
    pub fn coords(&self) -> impl Iterator<Item = TileCoords> + '_ {
        self.path
            .iter()
            .map(|&pos| TileCoords::from_ivec2(self.grid, pos))
    }

    /// Returns the movement cost of the path
    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    pub fn start(&self) -> Option<IVec2> {
        self.path.front().copied()
    }

    pub fn goal(&self) -> Option<IVec2> {
        self.path.back().copied()
    }

    /// Pops the first position of the path.
    pub fn pop(&mut self) -> Option<IVec2> {
        self.path.pop_front()
    }

    /// Returns the next position in the path without removing it.
    pub fn next(&self) -> Option<IVec2> {
        self.path.front().copied()
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.grid == other.grid && self.path == other.path
    }
}

impl Eq for Path {}

impl IntoIterator for Path {
    type Item = IVec2;
    type IntoIter = std::collections::vec_deque::IntoIter<IVec2>;

    fn into_iter(self) -> Self::IntoIter {
        self.path.into_iter()
    }
}
