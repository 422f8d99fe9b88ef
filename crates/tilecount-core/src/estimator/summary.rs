use super::*;
use serde::{Deserialize, Serialize};

/// Tile counts of one consumption pass, the input of [`summarize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TileCounts {
    pub full_tiles: u32,
    /// Non-degenerate cut tiles
    pub cut_tiles: u32,
    /// Cut tiles served from an offcut instead of a new tile
    pub reused_cuts: u32,
    pub degenerate_cuts: u32,
}

impl TileCounts {
    /// Tiles that have to come out of the box.
    pub fn purchased_tiles(&self) -> u32 {
        self.full_tiles + self.cut_tiles.saturating_sub(self.reused_cuts)
    }
}

/// Turns tile counts into purchase, waste, and price figures.
///
/// `installed_area` is the net tileable area of the surface, not the sum of
/// placed tile areas.
pub fn summarize(
    counts: &TileCounts,
    tile_area: f64,
    installed_area: f64,
    pricing: &PricingOptions,
) -> Summary {
    let purchased_tiles = counts.purchased_tiles();
    let reserve_tiles = pricing.reserve_tiles.max(0.0).floor() as u32;
    let purchased_with_reserve = purchased_tiles + reserve_tiles;

    let purchased_area = purchased_with_reserve as f64 * tile_area;
    let waste_area = (purchased_area - installed_area).max(0.0);
    let waste_percentage = if purchased_area > 0.0 {
        (waste_area / purchased_area) * 100.0
    } else {
        0.0
    };

    let packs = if pricing.pack_area > 0.0 {
        Some((installed_area / pricing.pack_area).ceil() as u32)
    } else {
        None
    };
    let price = installed_area * pricing.price_per_unit_area;
    let purchase_cost = match packs {
        Some(packs) => packs as f64 * pricing.pack_area * pricing.price_per_unit_area,
        None => price,
    };

    Summary {
        full_tiles: counts.full_tiles,
        cut_tiles: counts.cut_tiles,
        reused_cuts: counts.reused_cuts,
        degenerate_cuts: counts.degenerate_cuts,
        purchased_tiles,
        reserve_tiles,
        purchased_with_reserve,
        tile_area,
        installed_area,
        purchased_area,
        waste_area,
        waste_percentage,
        packs,
        price,
        purchase_cost,
    }
}

/// Sums every computed surface of a floor.
pub(super) fn floor_totals(outcomes: &[SurfaceOutcome]) -> FloorTotals {
    let mut totals = FloorTotals::default();

    for outcome in outcomes {
        let summary = match outcome {
            SurfaceOutcome::Computed(result) => &result.summary,
            SurfaceOutcome::Failed { .. } => {
                totals.surfaces_failed += 1;
                continue;
            }
        };

        totals.surfaces_computed += 1;
        totals.full_tiles += summary.full_tiles;
        totals.cut_tiles += summary.cut_tiles;
        totals.reused_cuts += summary.reused_cuts;
        totals.purchased_tiles += summary.purchased_tiles;
        totals.purchased_with_reserve += summary.purchased_with_reserve;
        totals.installed_area += summary.installed_area;
        totals.purchased_area += summary.purchased_area;
        totals.waste_area += summary.waste_area;
        totals.price += summary.price;
        totals.purchase_cost += summary.purchase_cost;
    }

    totals.waste_percentage = if totals.purchased_area > 0.0 {
        (totals.waste_area / totals.purchased_area) * 100.0
    } else {
        0.0
    };

    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn counts(full_tiles: u32, cut_tiles: u32, reused_cuts: u32) -> TileCounts {
        TileCounts {
            full_tiles,
            cut_tiles,
            reused_cuts,
            degenerate_cuts: 0,
        }
    }

    #[test]
    fn test_purchase_and_waste() {
        let summary = summarize(&counts(10, 4, 1), 900.0, 11_000.0, &PricingOptions::default());

        assert_eq!(summary.purchased_tiles, 13);
        assert_eq!(summary.purchased_with_reserve, 13);
        assert_relative_eq!(summary.purchased_area, 11_700.0);
        assert_relative_eq!(summary.waste_area, 700.0);
        assert_relative_eq!(summary.waste_percentage, 700.0 / 11_700.0 * 100.0);
        assert_eq!(summary.packs, None);
    }

    #[test]
    fn test_reserve_is_floored() {
        let pricing = PricingOptions {
            reserve_tiles: 2.9,
            ..PricingOptions::default()
        };
        let summary = summarize(&counts(4, 0, 0), 2500.0, 10_000.0, &pricing);
        assert_eq!(summary.reserve_tiles, 2);
        assert_eq!(summary.purchased_with_reserve, 6);
    }

    #[test]
    fn test_waste_never_negative() {
        let summary = summarize(&counts(1, 0, 0), 100.0, 150.0, &PricingOptions::default());
        assert_eq!(summary.waste_area, 0.0);
        assert_eq!(summary.waste_percentage, 0.0);
    }

    #[test]
    fn test_no_tiles_means_no_waste_percentage() {
        let summary = summarize(&counts(0, 0, 0), 100.0, 0.0, &PricingOptions::default());
        assert_eq!(summary.purchased_area, 0.0);
        assert_eq!(summary.waste_percentage, 0.0);
    }

    #[test]
    fn test_pack_pricing_rounds_up() {
        let pricing = PricingOptions {
            reserve_tiles: 0.0,
            price_per_unit_area: 0.05,
            pack_area: 1_440.0,
        };
        let summary = summarize(&counts(4, 0, 0), 2500.0, 10_000.0, &pricing);

        assert_eq!(summary.packs, Some(7));
        assert_relative_eq!(summary.price, 500.0);
        assert_relative_eq!(summary.purchase_cost, 7.0 * 1_440.0 * 0.05);
    }

    #[test]
    fn test_price_without_packs() {
        let pricing = PricingOptions {
            reserve_tiles: 0.0,
            price_per_unit_area: 0.05,
            pack_area: 0.0,
        };
        let summary = summarize(&counts(4, 0, 0), 2500.0, 10_000.0, &pricing);
        assert_eq!(summary.packs, None);
        assert_relative_eq!(summary.purchase_cost, summary.price);
    }
}
