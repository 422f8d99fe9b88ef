use crate::geometry::{bounding_box, Point};
use crate::inventory::OffcutInventory;
use crate::layout::{LayoutRequest, TileSource};
use crate::types::*;
use tracing::debug;

mod cache;
mod consumption;
mod floor;
mod summary;

pub use cache::EstimateCache;
pub use summary::{summarize, TileCounts};

use cache::{snapshot_key, CachedLayout};
use consumption::consume_tiles;

/// Estimates tile purchases for surfaces laid by a [`TileSource`].
///
/// Single-surface results are memoized per surface id; see
/// [`Estimator::invalidate`].
pub struct Estimator<S> {
    source: S,
    cache: EstimateCache,
}

/// Tiles and net area of a surface, ready for the consumption pass.
struct PreparedSurface {
    net_area: f64,
    tiles: Vec<PlacedTile>,
}

impl<S: TileSource> Estimator<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: EstimateCache::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn cache(&self) -> &EstimateCache {
        &self.cache
    }

    /// Estimates one surface with a fresh offcut inventory.
    ///
    /// A repeated call with unchanged layout inputs is served from the cache
    /// without asking the tile source again.
    pub fn compute_for_surface(&mut self, config: &SurfaceConfig) -> Result<EstimateResult> {
        self.compute_cached(config, None)
    }

    /// Forgets the cached layout of one surface, or of all surfaces.
    ///
    /// Must be called whenever an input that affects a surface changes or
    /// is undone outside the values passed to `compute_for_surface`.
    /// Returns the number of dropped entries.
    pub fn invalidate(&mut self, surface_id: Option<&str>) -> usize {
        let removed = self.cache.invalidate(surface_id);
        debug!(surface = ?surface_id, removed, "estimate cache invalidated");
        removed
    }

    fn compute_cached(
        &mut self,
        config: &SurfaceConfig,
        inherited_origin: Option<Point>,
    ) -> Result<EstimateResult> {
        let surface = validate(config)?;
        let origin = effective_origin(config, surface, inherited_origin);
        let key = snapshot_key(config, surface, origin)?;

        if let Some(cached) = self.cache.get(&surface.id, &key) {
            debug!(surface = %surface.id, "estimate served from cache");
            return Ok(assemble(surface, config, cached));
        }

        let prepared = self.prepare(config, surface, origin)?;
        let mut inventory = OffcutInventory::new();
        let consumption = consume_tiles(
            &prepared.tiles,
            &config.tile.nominal(),
            &config.cutting,
            &config.heuristics,
            &mut inventory,
        );

        let cached = CachedLayout {
            net_area: prepared.net_area,
            consumption,
            remaining: inventory.pieces().to_vec(),
        };
        let result = assemble(surface, config, &cached);
        self.cache.insert(surface.id.clone(), key, cached);

        debug!(
            surface = %result.surface_id,
            purchased = result.summary.purchased_with_reserve,
            reused = result.summary.reused_cuts,
            waste_pct = result.summary.waste_percentage,
            "surface estimated"
        );
        Ok(result)
    }

    /// Asks the tile source for the net region and the placed tiles.
    fn prepare(
        &self,
        config: &SurfaceConfig,
        surface: &Surface,
        origin: Point,
    ) -> Result<PreparedSurface> {
        let region = self
            .source
            .tileable_region(surface)
            .ok_or_else(|| EstimateError::NoTileableArea(surface.id.clone()))?;

        let request = LayoutRequest {
            surface_id: &surface.id,
            region: &region,
            tile: &config.tile,
            pattern: config.pattern.kind,
            origin,
        };
        let tiles = self
            .source
            .placed_tiles(&request)
            .map_err(EstimateError::TileGenerationFailed)?;

        Ok(PreparedSurface {
            net_area: region.net_area,
            tiles,
        })
    }
}

/// Checks every knob and returns the selected surface.
fn validate(config: &SurfaceConfig) -> Result<&Surface> {
    let surface = config
        .surface
        .as_ref()
        .ok_or(EstimateError::NoSurfaceSelected)?;

    let tile = &config.tile;
    let positive = |v: f64| v.is_finite() && v > 0.0;
    let non_negative = |v: f64| v.is_finite() && v >= 0.0;

    if !positive(tile.width) || !positive(tile.height) {
        return Err(EstimateError::InvalidTileDimensions {
            width: tile.width,
            height: tile.height,
        });
    }

    if !non_negative(tile.grout) {
        return Err(EstimateError::InvalidGrout(tile.grout));
    }

    if !non_negative(config.cutting.kerf) {
        return Err(EstimateError::InvalidInput(format!(
            "kerf must be non-negative, got {}",
            config.cutting.kerf
        )));
    }

    let pricing = &config.pricing;
    for (name, value) in [
        ("reserve_tiles", pricing.reserve_tiles),
        ("price_per_unit_area", pricing.price_per_unit_area),
        ("pack_area", pricing.pack_area),
    ] {
        if !non_negative(value) {
            return Err(EstimateError::InvalidInput(format!(
                "{name} must be non-negative, got {value}"
            )));
        }
    }

    let h = &config.heuristics;
    if !(non_negative(h.triangular_ratio_min) && h.triangular_ratio_min <= h.triangular_ratio_max)
    {
        return Err(EstimateError::InvalidInput(
            "triangular ratio band is empty or negative".to_string(),
        ));
    }
    if !(non_negative(h.pair_area_min) && h.pair_area_min <= h.pair_area_max) {
        return Err(EstimateError::InvalidInput(
            "pair area band is empty or negative".to_string(),
        ));
    }
    if !non_negative(h.pair_tolerance)
        || !non_negative(h.degenerate_area_fraction)
        || !non_negative(h.shrink_ratio_threshold)
    {
        return Err(EstimateError::InvalidInput(
            "heuristic thresholds must be non-negative".to_string(),
        ));
    }

    if surface.boundary.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
        return Err(EstimateError::InvalidInput(format!(
            "surface '{}' has a non-finite vertex",
            surface.id
        )));
    }

    Ok(surface)
}

/// Surface origin, then the inherited floor origin, then the lower-left
/// corner of the boundary.
fn effective_origin(config: &SurfaceConfig, surface: &Surface, inherited: Option<Point>) -> Point {
    config
        .pattern
        .origin
        .or(inherited)
        .or_else(|| bounding_box(&surface.boundary).map(|bbox| (bbox.min_x, bbox.min_y)))
        .unwrap_or((0.0, 0.0))
}

fn assemble(surface: &Surface, config: &SurfaceConfig, layout: &CachedLayout) -> EstimateResult {
    EstimateResult {
        surface_id: surface.id.clone(),
        summary: summarize(
            &layout.consumption.counts,
            config.tile.nominal().area(),
            layout.net_area,
            &config.pricing,
        ),
        usage: layout.consumption.usage.clone(),
        remaining_offcuts: layout.remaining.clone(),
    }
}
