use super::*;
use crate::analysis::{analyze_cut, CutAnalysis};
use crate::geometry::{Size, LENGTH_EPSILON};
use crate::inventory::guillotine_split;
use crate::pairing::{match_complementary_pairs, PairMap};
use std::collections::HashMap;
use tracing::trace;

/// Outcome of walking every placed tile of one surface.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Consumption {
    pub counts: TileCounts,
    pub usage: Vec<UsageRecord>,
}

/// Visit order: each pair partner directly after its first member, everything
/// else in placement order.
pub(crate) fn processing_order(len: usize, pairs: &PairMap) -> Vec<usize> {
    let mut order = Vec::with_capacity(len);
    let mut queued = vec![false; len];

    for index in 0..len {
        if queued[index] {
            continue;
        }
        queued[index] = true;
        order.push(index);

        if let Some(partner) = pairs.partner_of(index) {
            if !queued[partner] {
                queued[partner] = true;
                order.push(partner);
            }
        }
    }

    order
}

/// Walks placed tiles and decides for each cut whether it comes from a
/// reserved partner half, from the offcut pool, or from a new tile.
pub(crate) fn consume_tiles(
    tiles: &[PlacedTile],
    tile: &NominalTile,
    cutting: &CuttingOptions,
    heuristics: &HeuristicOptions,
    inventory: &mut OffcutInventory,
) -> Consumption {
    let nominal_area = tile.area();
    let analyses: Vec<Option<CutAnalysis>> = tiles
        .iter()
        .map(|placed| match placed {
            PlacedTile::Full => None,
            PlacedTile::Cut { boundary } => Some(analyze_cut(boundary, nominal_area, heuristics)),
        })
        .collect();
    let pairs = match_complementary_pairs(&analyses, nominal_area, heuristics);

    let mut walk = ConsumptionWalk {
        tile,
        cutting,
        heuristics,
        inventory,
        pairs: &pairs,
        processed: vec![false; tiles.len()],
        reserved: HashMap::new(),
        counts: TileCounts::default(),
    };

    let mut usage = Vec::with_capacity(tiles.len());
    for index in processing_order(tiles.len(), &pairs) {
        usage.push(walk.visit(index, analyses[index].as_ref()));
    }

    Consumption {
        counts: walk.counts,
        usage,
    }
}

struct ConsumptionWalk<'a> {
    tile: &'a NominalTile,
    cutting: &'a CuttingOptions,
    heuristics: &'a HeuristicOptions,
    inventory: &'a mut OffcutInventory,
    pairs: &'a PairMap,
    processed: Vec<bool>,
    /// Partner halves waiting to be claimed, keyed by the claiming index
    reserved: HashMap<usize, Offcut>,
    counts: TileCounts,
}

impl ConsumptionWalk<'_> {
    fn visit(&mut self, index: usize, analysis: Option<&CutAnalysis>) -> UsageRecord {
        self.processed[index] = true;

        let Some(analysis) = analysis else {
            self.counts.full_tiles += 1;
            return UsageRecord {
                index,
                requested: None,
                outcome: TileOutcome::Full,
            };
        };

        if analysis.degenerate {
            self.counts.degenerate_cuts += 1;
            trace!(index, area = analysis.true_area, "skipping degenerate cut");
            return UsageRecord {
                index,
                requested: None,
                outcome: TileOutcome::Degenerate,
            };
        }

        self.counts.cut_tiles += 1;
        let request = analysis.effective_request(self.heuristics);

        let outcome = if let Some(consumed) = self.reserved.remove(&index) {
            self.counts.reused_cuts += 1;
            TileOutcome::PairedOffcut { consumed }
        } else if let Some(taken) = self.inventory.take(request, self.cutting) {
            self.counts.reused_cuts += 1;
            TileOutcome::PoolOffcut {
                consumed: taken.consumed,
                produced: taken.remainders,
            }
        } else {
            self.open_new_tile(index, analysis, request)
        };

        trace!(
            index,
            width = request.width,
            height = request.height,
            outcome = ?outcome,
            "cut tile"
        );

        UsageRecord {
            index,
            requested: Some(request),
            outcome,
        }
    }

    /// Cuts the piece from a fresh tile and decides what is left behind.
    fn open_new_tile(
        &mut self,
        index: usize,
        analysis: &CutAnalysis,
        request: Size,
    ) -> TileOutcome {
        let waiting_partner = self
            .pairs
            .partner_of(index)
            .filter(|&partner| !self.processed[partner]);

        if let Some(partner) = waiting_partner {
            let reserved = self
                .inventory
                .issue(analysis.bbox_size(), OffcutOrigin::WholeTile, true);
            if let Some(offcut) = &reserved {
                self.reserved.insert(partner, offcut.clone());
            }
            return TileOutcome::New {
                produced: Vec::new(),
                reserved_for_partner: reserved,
            };
        }

        let produced: Vec<Offcut> = if analysis.triangular {
            self.inventory
                .add_offcut(analysis.bbox_size(), OffcutOrigin::WholeTile, true)
                .into_iter()
                .collect()
        } else if self.cutting.optimize_cuts {
            let used = self.orient_in_tile(request);
            guillotine_split(self.tile.size(), used, self.cutting.kerf)
                .into_iter()
                .filter_map(|size| {
                    self.inventory
                        .add_offcut(size, OffcutOrigin::WholeTile, false)
                })
                .collect()
        } else {
            self.coarse_remainder(analysis.true_area)
                .and_then(|size| {
                    self.inventory
                        .add_offcut(size, OffcutOrigin::WholeTile, false)
                })
                .into_iter()
                .collect()
        };

        TileOutcome::New {
            produced,
            reserved_for_partner: None,
        }
    }

    /// Turns the request when only the turned version fits the tile.
    fn orient_in_tile(&self, request: Size) -> Size {
        let tile = self.tile.size();
        let fits = |s: Size| {
            s.width <= tile.width + LENGTH_EPSILON && s.height <= tile.height + LENGTH_EPSILON
        };
        if !fits(request) && self.cutting.allow_rotate && fits(request.rotated()) {
            request.rotated()
        } else {
            request
        }
    }

    /// Single rectangle with the area the cut left over, for when guillotine
    /// remainders are not tracked.
    fn coarse_remainder(&self, true_area: f64) -> Option<Size> {
        let remaining = self.tile.area() - true_area;
        if remaining <= 0.0 {
            return None;
        }
        let side = remaining.sqrt().min(self.tile.longer_side());
        Some(Size::new(side, remaining / side))
    }
}
