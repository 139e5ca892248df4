//! Tile identities and the [`TileMap`] trait the host map storage implements.
use bevy::math::IVec2;
use rustc_hash::{FxHashMap, FxHashSet};

/// Identifies a grid (a station, a shuttle, a planet surface...) in the host world.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridId(pub u32);

/// The tile type placed at a position.
///
/// Type id `0` is reserved for empty space.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tile {
    pub type_id: u16,
}

impl Tile {
    /// Empty space, no floor.
    pub const EMPTY: Tile = Tile { type_id: 0 };

    pub const fn new(type_id: u16) -> Self {
        Tile { type_id }
    }

    /// Returns true if there is no floor on this tile.
    pub fn is_empty(&self) -> bool {
        self.type_id == 0
    }
}

/// A grid-qualified tile position.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoords {
    pub grid: GridId,
    pub pos: IVec2,
}

impl TileCoords {
    pub fn new(grid: GridId, x: i32, y: i32) -> Self {
        TileCoords {
            grid,
            pos: IVec2::new(x, y),
        }
    }

    pub fn from_ivec2(grid: GridId, pos: IVec2) -> Self {
        TileCoords { grid, pos }
    }
}

/// A tile together with the position it was sampled from.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileRef {
    pub coords: TileCoords,
    pub tile: Tile,
}

impl TileRef {
    pub fn new(coords: TileCoords, tile: Tile) -> Self {
        TileRef { coords, tile }
    }
}

/// Read access to the host's tile storage.
///
/// Chunks sample this when they are first built and searches use
/// [`TileMap::grid_exists`] to notice grids removed while they were running.
pub trait TileMap {
    /// Returns true if the grid is still present in the world.
    fn grid_exists(&self, grid: GridId) -> bool;

    /// Returns the tile at a position. Positions without a tile are [`Tile::EMPTY`].
    fn tile(&self, grid: GridId, pos: IVec2) -> Tile;
}

/// Hash backed [`TileMap`] for tools, tests and maps that aren't owned by another crate.
///
/// # Example
/// ```
/// use bevy::math::IVec2;
/// use bevy_tilenav::prelude::*;
///
/// let mut map = SparseTileMap::default();
/// map.fill(GridId(0), IVec2::ZERO, IVec2::new(9, 9), Tile::new(1));
///
/// assert!(map.grid_exists(GridId(0)));
/// assert!(map.tile(GridId(0), IVec2::new(10, 0)).is_empty());
/// ```
#[derive(Debug, Default, Clone)]
pub struct SparseTileMap {
    grids: FxHashSet<GridId>,
    tiles: FxHashMap<(GridId, IVec2), Tile>,
}

impl SparseTileMap {
    /// Registers an empty grid.
    pub fn add_grid(&mut self, grid: GridId) {
        self.grids.insert(grid);
    }

    /// Removes a grid and all of its tiles.
    pub fn remove_grid(&mut self, grid: GridId) {
        self.grids.remove(&grid);
        self.tiles.retain(|(g, _), _| *g != grid);
    }

    /// Sets a single tile, registering the grid if needed.
    /// Returns the [`TileRef`] to forward to the pathfinding service.
    pub fn set_tile(&mut self, grid: GridId, pos: IVec2, tile: Tile) -> TileRef {
        self.grids.insert(grid);

        if tile.is_empty() {
            self.tiles.remove(&(grid, pos));
        } else {
            self.tiles.insert((grid, pos), tile);
        }

        TileRef::new(TileCoords::from_ivec2(grid, pos), tile)
    }

    /// Fills the inclusive rectangle `min..=max` with a tile.
    pub fn fill(&mut self, grid: GridId, min: IVec2, max: IVec2, tile: Tile) {
        for x in min.x..=max.x {
            for y in min.y..=max.y {
                self.set_tile(grid, IVec2::new(x, y), tile);
            }
        }
    }
}

impl TileMap for SparseTileMap {
    fn grid_exists(&self, grid: GridId) -> bool {
        self.grids.contains(&grid)
    }

    fn tile(&self, grid: GridId, pos: IVec2) -> Tile {
        self.tiles.get(&(grid, pos)).copied().unwrap_or(Tile::EMPTY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_map_fill_and_remove() {
        let mut map = SparseTileMap::default();
        map.fill(GridId(3), IVec2::new(-2, -2), IVec2::new(1, 1), Tile::new(4));

        assert!(map.grid_exists(GridId(3)));
        assert_eq!(map.tile(GridId(3), IVec2::new(-2, 1)), Tile::new(4));
        assert!(map.tile(GridId(3), IVec2::new(2, 0)).is_empty());

        map.remove_grid(GridId(3));

        assert!(!map.grid_exists(GridId(3)));
        assert!(map.tile(GridId(3), IVec2::new(0, 0)).is_empty());
    }

    #[test]
    fn test_setting_empty_clears_tile() {
        let mut map = SparseTileMap::default();
        map.set_tile(GridId(0), IVec2::ZERO, Tile::new(1));
        let tile_ref = map.set_tile(GridId(0), IVec2::ZERO, Tile::EMPTY);

        assert!(tile_ref.tile.is_empty());
        assert!(map.tile(GridId(0), IVec2::ZERO).is_empty());
        assert!(map.grid_exists(GridId(0)));
    }
}
