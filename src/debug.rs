//! This module contains some tools to help you debug your application.
//!
use std::time::Duration;

use bevy::{color::palettes::css, prelude::*};

use crate::{
    chunk::{GridChunk, CHUNK_SIZE},
    graph::GridGraph,
    path::Path,
    service::PathfindingService,
    tile::{GridId, Tile},
};

/// A copy of one node's state with its world position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeSnapshot {
    pub pos: IVec2,
    /// Center of the tile in world space.
    pub world: Vec2,
    pub tile: Tile,
    pub blocked_collision_mask: u32,
    pub restricted: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChunkSnapshot {
    pub origin: IVec2,
    pub last_dirty: Option<Duration>,
    pub nodes: Vec<NodeSnapshot>,
}

/// Every built chunk of a grid, for visualization.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphSnapshot {
    pub grid: GridId,
    pub tile_size: f32,
    pub chunks: Vec<ChunkSnapshot>,
}

impl GraphSnapshot {
    pub fn capture(graph: &GridGraph, tile_size: f32) -> Self {
        let mut chunks: Vec<ChunkSnapshot> = graph
            .chunks()
            .map(|chunk| ChunkSnapshot::capture(chunk, tile_size))
            .collect();
        chunks.sort_by_key(|chunk| (chunk.origin.x, chunk.origin.y));

        GraphSnapshot {
            grid: graph.grid(),
            tile_size,
            chunks,
        }
    }
}

impl ChunkSnapshot {
    fn capture(chunk: &GridChunk, tile_size: f32) -> Self {
        ChunkSnapshot {
            origin: chunk.origin(),
            last_dirty: chunk.last_dirty(),
            nodes: chunk
                .nodes()
                .map(|node| NodeSnapshot {
                    pos: node.pos(),
                    world: tile_center(node.pos(), tile_size),
                    tile: node.tile(),
                    blocked_collision_mask: node.blocked_collision_mask(),
                    restricted: node.access_readers().next().is_some(),
                })
                .collect(),
        }
    }
}

fn tile_center(pos: IVec2, tile_size: f32) -> Vec2 {
    (pos.as_vec2() + Vec2::splat(0.5)) * tile_size
}

/// Debug [Gizmos] configuration
#[derive(Resource, Clone, Debug)]
pub struct TileNavDebugConfig {
    /// Grid to draw.
    pub grid: GridId,
    pub tile_size: f32,
    pub draw_chunks: bool,
    pub draw_blocked: bool,
    pub draw_paths: bool,
    /// Draws the open and closed sets of running searches. Needs
    /// [`crate::settings::PathfindingSettings::record_search_telemetry`].
    pub draw_searches: bool,
    pub color: Color,
}

impl Default for TileNavDebugConfig {
    fn default() -> Self {
        TileNavDebugConfig {
            grid: GridId::default(),
            tile_size: 16.0,
            draw_chunks: true,
            draw_blocked: true,
            draw_paths: true,
            draw_searches: false,
            color: Color::Srgba(css::RED),
        }
    }
}

/// Draws the pathfinding graph and paths with [Gizmos].
#[derive(Clone, Default)]
pub struct TileNavDebugPlugin {
    /// Debug gizmos configuration
    pub config: TileNavDebugConfig,
}

impl Plugin for TileNavDebugPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.config.clone()).add_systems(
            Update,
            (draw_debug_chunks, draw_debug_paths, draw_debug_searches),
        );
    }
}

fn draw_debug_chunks(
    config: Res<TileNavDebugConfig>,
    service: Res<PathfindingService>,
    mut gizmos: Gizmos,
) {
    let Some(graph) = service.graph(config.grid) else {
        return;
    };

    let size = config.tile_size;
    let chunk_size = CHUNK_SIZE as f32 * size;

    for chunk in graph.chunks() {
        if config.draw_chunks {
            let min = chunk.origin().as_vec2() * size;
            let corners = [
                min,
                min + Vec2::new(chunk_size, 0.0),
                min + Vec2::splat(chunk_size),
                min + Vec2::new(0.0, chunk_size),
            ];
            for i in 0..4 {
                gizmos.line_2d(corners[i], corners[(i + 1) % 4], css::GREY);
            }
        }

        if config.draw_blocked {
            for node in chunk.nodes().filter(|node| node.blocked_collision_mask() != 0) {
                let center = tile_center(node.pos(), size);
                let half = size * 0.35;
                gizmos.line_2d(center - Vec2::splat(half), center + Vec2::splat(half), config.color);
                gizmos.line_2d(
                    center + Vec2::new(-half, half),
                    center + Vec2::new(half, -half),
                    config.color,
                );
            }
        }
    }
}

fn draw_debug_paths(query: Query<&Path>, config: Res<TileNavDebugConfig>, mut gizmos: Gizmos) {
    if !config.draw_paths {
        return;
    }

    let path_colors = [
        css::RED,
        css::PURPLE,
        css::YELLOW,
        css::PINK,
        css::DARK_CYAN,
        css::MAGENTA,
        css::GREEN,
        css::ORANGE,
    ];

    for (color_index, path) in query
        .iter()
        .filter(|path| path.grid() == config.grid)
        .enumerate()
    {
        let color = path_colors[color_index % path_colors.len()];

        for pair in path.path().windows(2) {
            gizmos.line_2d(
                tile_center(pair[0], config.tile_size),
                tile_center(pair[1], config.tile_size),
                color,
            );
        }
    }
}

fn draw_debug_searches(
    config: Res<TileNavDebugConfig>,
    service: Res<PathfindingService>,
    mut gizmos: Gizmos,
) {
    if !config.draw_searches {
        return;
    }

    let half = config.tile_size * 0.2;
    let mut mark = |pos: IVec2, color: Srgba| {
        let center = tile_center(pos, config.tile_size);
        gizmos.line_2d(center - Vec2::new(half, 0.0), center + Vec2::new(half, 0.0), color);
        gizmos.line_2d(center - Vec2::new(0.0, half), center + Vec2::new(0.0, half), color);
    };

    for job in service.jobs() {
        if job.args().start.grid != config.grid {
            continue;
        }

        let Some(telemetry) = job.telemetry() else {
            continue;
        };

        for &pos in &telemetry.closed {
            mark(pos, css::SILVER);
        }
        for &pos in &telemetry.open {
            mark(pos, css::LIME);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        maintainer::GraphUpdate,
        occupant::CollisionBody,
        tile::{SparseTileMap, TileCoords},
    };

    #[test]
    fn test_snapshot() {
        let mut map = SparseTileMap::default();
        map.fill(GridId(0), IVec2::ZERO, IVec2::splat(9), Tile::new(1));

        let mut service = PathfindingService::default();
        service.enqueue_update(GraphUpdate::CollisionChanged {
            entity: Entity::from_raw(1),
            position: TileCoords::new(GridId(0), 2, 3),
            body: CollisionBody::wall(1),
            can_collide: true,
        });
        service.tick(&map, Duration::from_secs(1));
        service.get_node(&map, TileCoords::new(GridId(0), -1, 0));

        let snapshot = service.snapshot(GridId(0), 10.0).unwrap();

        assert_eq!(snapshot.chunks.len(), 2);
        assert_eq!(snapshot.chunks[0].origin, IVec2::new(-8, 0));
        assert_eq!(snapshot.chunks[1].last_dirty, Some(Duration::from_secs(1)));

        let wall = snapshot.chunks[1]
            .nodes
            .iter()
            .find(|node| node.pos == IVec2::new(2, 3))
            .unwrap();
        assert_eq!(wall.world, Vec2::new(25.0, 35.0));
        assert_eq!(wall.blocked_collision_mask, 1);
        assert!(service.snapshot(GridId(5), 10.0).is_none());
    }
}
