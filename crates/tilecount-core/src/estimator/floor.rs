use super::summary::floor_totals;
use super::*;
use tracing::warn;

impl<S: TileSource> Estimator<S> {
    /// Estimates every surface of a floor in list order.
    ///
    /// With `share_offcuts`, one inventory is carried from surface to surface:
    /// offcuts of surface k can serve surfaces after k, never before it, so
    /// reordering the list can change the result. Shared passes bypass the
    /// cache. A failing surface is reported and skipped; it does not stop
    /// the floor and leaves the shared inventory untouched.
    pub fn compute_for_floor(&mut self, floor: &FloorConfig) -> Result<FloorResult> {
        if floor.surfaces.is_empty() {
            return Err(EstimateError::InvalidInput(
                "A floor needs at least one surface".to_string(),
            ));
        }

        let mut shared = floor.share_offcuts.then(OffcutInventory::new);
        let mut surfaces = Vec::with_capacity(floor.surfaces.len());

        for config in &floor.surfaces {
            let computed = match shared.as_mut() {
                Some(inventory) => self.compute_shared(config, floor.pattern_origin, inventory),
                None => self.compute_cached(config, floor.pattern_origin),
            };

            surfaces.push(match computed {
                Ok(result) => SurfaceOutcome::Computed(result),
                Err(err) => {
                    let surface_id = config.surface.as_ref().map(|s| s.id.clone());
                    warn!(surface = ?surface_id, error = %err, "surface skipped");
                    SurfaceOutcome::Failed {
                        surface_id,
                        error: err.to_string(),
                    }
                }
            });
        }

        let totals = floor_totals(&surfaces);
        debug!(
            floor = ?floor.id,
            computed = totals.surfaces_computed,
            failed = totals.surfaces_failed,
            purchased = totals.purchased_with_reserve,
            "floor estimated"
        );

        Ok(FloorResult {
            floor_id: floor.id.clone(),
            shared_offcuts: floor.share_offcuts,
            surfaces,
            totals,
        })
    }

    fn compute_shared(
        &self,
        config: &SurfaceConfig,
        inherited_origin: Option<Point>,
        inventory: &mut OffcutInventory,
    ) -> Result<EstimateResult> {
        let surface = validate(config)?;
        let origin = effective_origin(config, surface, inherited_origin);
        let prepared = self.prepare(config, surface, origin)?;

        // Every fallible step is behind us; only now touch the shared pool.
        let consumption = consume_tiles(
            &prepared.tiles,
            &config.tile.nominal(),
            &config.cutting,
            &config.heuristics,
            inventory,
        );

        Ok(assemble(
            surface,
            config,
            &CachedLayout {
                net_area: prepared.net_area,
                consumption,
                remaining: inventory.pieces().to_vec(),
            },
        ))
    }
}
