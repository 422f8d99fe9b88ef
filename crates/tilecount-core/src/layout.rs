//! Tile sources: where placed tile shapes come from.
//!
//! The estimator does not lay tiles itself. It asks a [`TileSource`] for the
//! net tileable region of a surface and for the tiles a pattern puts on it.
//! [`PatternLayout`] is a reference source for convex surfaces and
//! rectangular tiles; [`FixedLayout`] replays shapes produced elsewhere.

use crate::geometry::{bounding_box, clip_convex, is_convex, polygon_area, Point};
use crate::types::{PatternKind, PlacedTile, Surface, TileSettings, TileShape};
use std::collections::HashMap;

/// Clipped pieces below this share of a tile are dropped as touch points.
const EMPTY_PIECE_FRACTION: f64 = 1e-9;
/// Clipped pieces above `1 - FULL_TILE_SLACK` of a tile count as uncut.
const FULL_TILE_SLACK: f64 = 1e-6;
/// Upper bound on lattice positions clipped for one surface.
pub const MAX_LATTICE_POSITIONS: f64 = 1_000_000.0;

/// Net tileable region of a surface.
#[derive(Debug, Clone, PartialEq)]
pub struct TileableRegion {
    pub boundary: Vec<Point>,
    pub exclusions: Vec<Vec<Point>>,
    /// True area after exclusions; this is the installed area
    pub net_area: f64,
}

/// Everything a tile source needs to lay one surface.
#[derive(Debug, Clone, Copy)]
pub struct LayoutRequest<'a> {
    pub surface_id: &'a str,
    pub region: &'a TileableRegion,
    pub tile: &'a TileSettings,
    pub pattern: PatternKind,
    pub origin: Point,
}

pub trait TileSource {
    /// Returns `None` when nothing of the surface is left to tile.
    fn tileable_region(&self, surface: &Surface) -> Option<TileableRegion>;

    /// Lays tiles on the region in placement order.
    fn placed_tiles(&self, request: &LayoutRequest<'_>) -> Result<Vec<PlacedTile>, String>;
}

impl<T: TileSource + ?Sized> TileSource for &T {
    fn tileable_region(&self, surface: &Surface) -> Option<TileableRegion> {
        (**self).tileable_region(surface)
    }

    fn placed_tiles(&self, request: &LayoutRequest<'_>) -> Result<Vec<PlacedTile>, String> {
        (**self).placed_tiles(request)
    }
}

/// Reference tile source for convex surfaces.
///
/// Exclusions reduce the net area and remove tiles lying entirely inside
/// them. A tile only partly covered by an exclusion keeps its
/// boundary-clipped shape, so material is overestimated there rather than
/// missed.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternLayout;

impl PatternLayout {
    pub fn new() -> Self {
        Self
    }

    /// Outline of the tile at lattice position (`col`, `row`).
    fn tile_polygon(request: &LayoutRequest<'_>, col: i64, row: i64) -> Vec<Point> {
        let tile = request.tile;
        let step_x = tile.width + tile.grout;
        let step_y = tile.height + tile.grout;
        let shift = match request.pattern {
            PatternKind::RunningBond if row.rem_euclid(2) == 1 => 0.5,
            _ => 0.0,
        };
        let local_x = (col as f64 + shift) * step_x;
        let local_y = row as f64 * step_y;

        [
            (local_x, local_y),
            (local_x + tile.width, local_y),
            (local_x + tile.width, local_y + tile.height),
            (local_x, local_y + tile.height),
        ]
        .into_iter()
        .map(|p| to_surface(request, p))
        .collect()
    }

    /// Lattice index ranges that cover the whole region, with one tile of margin.
    ///
    /// Fails when the tiles are so small against the region that more than
    /// [`MAX_LATTICE_POSITIONS`] positions would have to be clipped.
    fn lattice_bounds(
        request: &LayoutRequest<'_>,
    ) -> Result<Option<((i64, i64), (i64, i64))>, String> {
        let Some(bbox) = bounding_box(&request.region.boundary) else {
            return Ok(None);
        };
        let corners = [
            (bbox.min_x, bbox.min_y),
            (bbox.max_x, bbox.min_y),
            (bbox.max_x, bbox.max_y),
            (bbox.min_x, bbox.max_y),
        ];
        let local: Vec<Point> = corners.iter().map(|&p| to_lattice(request, p)).collect();
        let Some(local_box) = bounding_box(&local) else {
            return Ok(None);
        };

        let step_x = request.tile.width + request.tile.grout;
        let step_y = request.tile.height + request.tile.grout;
        let (col_min, col_max) = (
            (local_box.min_x / step_x).floor() - 1.0,
            (local_box.max_x / step_x).ceil() + 1.0,
        );
        let (row_min, row_max) = (
            (local_box.min_y / step_y).floor() - 1.0,
            (local_box.max_y / step_y).ceil() + 1.0,
        );

        let positions = (col_max - col_min + 1.0) * (row_max - row_min + 1.0);
        if !positions.is_finite() || positions > MAX_LATTICE_POSITIONS {
            return Err(format!(
                "surface '{}' needs {:.0} tile positions, more than the limit of {:.0}",
                request.surface_id, positions, MAX_LATTICE_POSITIONS
            ));
        }

        Ok(Some((
            (col_min as i64, col_max as i64),
            (row_min as i64, row_max as i64),
        )))
    }
}

fn pattern_angle(pattern: PatternKind) -> f64 {
    match pattern {
        PatternKind::Grid | PatternKind::RunningBond => 0.0,
        PatternKind::Diagonal => std::f64::consts::FRAC_PI_4,
    }
}

fn to_surface(request: &LayoutRequest<'_>, (x, y): Point) -> Point {
    let (sin, cos) = pattern_angle(request.pattern).sin_cos();
    (
        request.origin.0 + x * cos - y * sin,
        request.origin.1 + x * sin + y * cos,
    )
}

fn to_lattice(request: &LayoutRequest<'_>, (x, y): Point) -> Point {
    let (sin, cos) = pattern_angle(request.pattern).sin_cos();
    let dx = x - request.origin.0;
    let dy = y - request.origin.1;
    (dx * cos + dy * sin, -dx * sin + dy * cos)
}

impl TileSource for PatternLayout {
    fn tileable_region(&self, surface: &Surface) -> Option<TileableRegion> {
        let gross = polygon_area(&surface.boundary);
        if gross <= 0.0 {
            return None;
        }

        let excluded: f64 = if is_convex(&surface.boundary) {
            surface
                .exclusions
                .iter()
                .map(|exclusion| polygon_area(&clip_convex(exclusion, &surface.boundary)))
                .sum()
        } else {
            surface.exclusions.iter().map(|e| polygon_area(e)).sum()
        };

        let net_area = gross - excluded;
        if net_area <= 0.0 {
            return None;
        }

        Some(TileableRegion {
            boundary: surface.boundary.clone(),
            exclusions: surface.exclusions.clone(),
            net_area,
        })
    }

    fn placed_tiles(&self, request: &LayoutRequest<'_>) -> Result<Vec<PlacedTile>, String> {
        if !matches!(request.tile.shape, TileShape::Rectangle | TileShape::Square) {
            return Err(format!(
                "pattern layout supports rectangular tiles only, got {:?}",
                request.tile.shape
            ));
        }
        if !is_convex(&request.region.boundary) {
            return Err(format!(
                "surface '{}' is not convex; use a clipping backend for this boundary",
                request.surface_id
            ));
        }

        let tile_area = request.tile.width * request.tile.height;
        let Some(((col_min, col_max), (row_min, row_max))) = Self::lattice_bounds(request)? else {
            return Ok(Vec::new());
        };

        let mut tiles = Vec::new();
        for row in row_min..=row_max {
            for col in col_min..=col_max {
                let outline = Self::tile_polygon(request, col, row);
                let piece = clip_convex(&outline, &request.region.boundary);
                let area = polygon_area(&piece);
                if area <= tile_area * EMPTY_PIECE_FRACTION {
                    continue;
                }

                let excluded = request.region.exclusions.iter().any(|exclusion| {
                    polygon_area(&clip_convex(exclusion, &piece)) >= area * (1.0 - FULL_TILE_SLACK)
                });
                if excluded {
                    continue;
                }

                if area >= tile_area * (1.0 - FULL_TILE_SLACK) {
                    tiles.push(PlacedTile::Full);
                } else {
                    tiles.push(PlacedTile::Cut { boundary: piece });
                }
            }
        }

        Ok(tiles)
    }
}

/// Precomputed tiles and net areas, keyed by surface id.
///
/// For callers that rasterize surfaces with their own geometry engine.
#[derive(Debug, Clone, Default)]
pub struct FixedLayout {
    surfaces: HashMap<String, (f64, Vec<PlacedTile>)>,
}

impl FixedLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_surface(
        mut self,
        surface_id: impl Into<String>,
        net_area: f64,
        tiles: Vec<PlacedTile>,
    ) -> Self {
        self.insert(surface_id, net_area, tiles);
        self
    }

    pub fn insert(&mut self, surface_id: impl Into<String>, net_area: f64, tiles: Vec<PlacedTile>) {
        self.surfaces.insert(surface_id.into(), (net_area, tiles));
    }
}

impl TileSource for FixedLayout {
    fn tileable_region(&self, surface: &Surface) -> Option<TileableRegion> {
        let (net_area, _) = self.surfaces.get(&surface.id)?;
        if *net_area <= 0.0 {
            return None;
        }
        Some(TileableRegion {
            boundary: surface.boundary.clone(),
            exclusions: surface.exclusions.clone(),
            net_area: *net_area,
        })
    }

    fn placed_tiles(&self, request: &LayoutRequest<'_>) -> Result<Vec<PlacedTile>, String> {
        self.surfaces
            .get(request.surface_id)
            .map(|(_, tiles)| tiles.clone())
            .ok_or_else(|| format!("no precomputed tiles for surface '{}'", request.surface_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn room(width: f64, height: f64) -> Surface {
        Surface {
            id: "room".into(),
            boundary: vec![(0.0, 0.0), (width, 0.0), (width, height), (0.0, height)],
            exclusions: vec![],
        }
    }

    fn tile(width: f64, height: f64, grout: f64) -> TileSettings {
        TileSettings {
            width,
            height,
            shape: TileShape::Rectangle,
            grout,
        }
    }

    fn lay(surface: &Surface, tile: &TileSettings, pattern: PatternKind) -> Vec<PlacedTile> {
        let layout = PatternLayout::new();
        let region = layout.tileable_region(surface).unwrap();
        let request = LayoutRequest {
            surface_id: &surface.id,
            region: &region,
            tile,
            pattern,
            origin: (0.0, 0.0),
        };
        layout.placed_tiles(&request).unwrap()
    }

    fn count_full(tiles: &[PlacedTile]) -> usize {
        tiles.iter().filter(|t| **t == PlacedTile::Full).count()
    }

    #[test]
    fn test_exact_grid_has_only_full_tiles() {
        let tiles = lay(&room(100.0, 100.0), &tile(50.0, 50.0, 0.0), PatternKind::Grid);
        assert_eq!(tiles.len(), 4);
        assert_eq!(count_full(&tiles), 4);
    }

    #[test]
    fn test_grid_with_remainder_produces_cuts() {
        let tiles = lay(&room(110.0, 100.0), &tile(50.0, 50.0, 0.0), PatternKind::Grid);
        assert_eq!(count_full(&tiles), 4);
        assert_eq!(tiles.len(), 6);
    }

    #[test]
    fn test_running_bond_cuts_every_other_row() {
        let tiles = lay(&room(100.0, 100.0), &tile(50.0, 50.0, 0.0), PatternKind::RunningBond);
        // Row 0: two full tiles. Row 1: one full tile and two halves.
        assert_eq!(count_full(&tiles), 3);
        assert_eq!(tiles.len(), 5);
    }

    #[test]
    fn test_diagonal_edges_are_half_tiles() {
        let side = 30.0;
        let length = 2.0 * side * 2.0_f64.sqrt();
        let tiles = lay(&room(length, length), &tile(side, side, 0.0), PatternKind::Diagonal);

        let cut_area: f64 = tiles
            .iter()
            .filter_map(|t| match t {
                PlacedTile::Cut { boundary } => Some(polygon_area(boundary)),
                PlacedTile::Full => None,
            })
            .sum();
        // n = 2: 2n^2 - 2n full tiles and 4n half tiles.
        assert_eq!(count_full(&tiles), 4);
        assert_eq!(tiles.len() - count_full(&tiles), 8);
        assert_relative_eq!(cut_area, 4.0 * side * side, epsilon = 1e-6);
    }

    #[test]
    fn test_exclusions_reduce_net_area_and_drop_covered_tiles() {
        let mut surface = room(100.0, 100.0);
        surface.exclusions = vec![vec![(0.0, 0.0), (50.0, 0.0), (50.0, 50.0), (0.0, 50.0)]];
        let region = PatternLayout.tileable_region(&surface).unwrap();
        assert_relative_eq!(region.net_area, 7500.0);

        let tiles = lay(&surface, &tile(50.0, 50.0, 0.0), PatternKind::Grid);
        assert_eq!(tiles.len(), 3);
    }

    #[test]
    fn test_fully_excluded_surface_has_no_region() {
        let mut surface = room(10.0, 10.0);
        surface.exclusions = vec![surface.boundary.clone()];
        assert!(PatternLayout.tileable_region(&surface).is_none());
    }

    #[test]
    fn test_non_rectangular_tiles_are_rejected() {
        let surface = room(100.0, 100.0);
        let region = PatternLayout.tileable_region(&surface).unwrap();
        let mut hex = tile(20.0, 20.0, 0.0);
        hex.shape = TileShape::Hexagon;
        let request = LayoutRequest {
            surface_id: "room",
            region: &region,
            tile: &hex,
            pattern: PatternKind::Grid,
            origin: (0.0, 0.0),
        };
        assert!(PatternLayout.placed_tiles(&request).is_err());
    }

    #[test]
    fn test_tiny_tiles_exceed_position_limit() {
        let surface = room(100.0, 100.0);
        let region = PatternLayout.tileable_region(&surface).unwrap();
        let tiny = tile(1e-6, 1e-6, 0.0);
        let request = LayoutRequest {
            surface_id: "room",
            region: &region,
            tile: &tiny,
            pattern: PatternKind::Grid,
            origin: (0.0, 0.0),
        };
        let err = PatternLayout.placed_tiles(&request).unwrap_err();
        assert!(err.contains("tile positions"), "{err}");

        // 1000 x 1000 room with 1 x 1 tiles: 1003^2 positions, just over the limit.
        let hall = room(1000.0, 1000.0);
        let region = PatternLayout.tileable_region(&hall).unwrap();
        let request = LayoutRequest {
            surface_id: "hall",
            region: &region,
            tile: &tile(1.0, 1.0, 0.0),
            pattern: PatternKind::Grid,
            origin: (0.0, 0.0),
        };
        assert!(PatternLayout.placed_tiles(&request).is_err());
    }

    #[test]
    fn test_fixed_layout_replays_tiles() {
        let layout = FixedLayout::new().with_surface("room", 2500.0, vec![PlacedTile::Full]);
        let surface = room(50.0, 50.0);
        let region = layout.tileable_region(&surface).unwrap();
        let request = LayoutRequest {
            surface_id: "room",
            region: &region,
            tile: &tile(50.0, 50.0, 0.0),
            pattern: PatternKind::Grid,
            origin: (0.0, 0.0),
        };
        assert_eq!(layout.placed_tiles(&request).unwrap(), vec![PlacedTile::Full]);

        let other = Surface {
            id: "hall".into(),
            ..room(10.0, 10.0)
        };
        assert!(layout.tileable_region(&other).is_none());
    }
}
