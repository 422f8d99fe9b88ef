//! Complementary pair matching.
//!
//! Two cut pieces with the same bounding box whose areas add up to about
//! one tile are treated as the two halves of a single physical tile, the
//! typical result of a diagonal pattern running into a wall. Matching is
//! greedy in list order: the first acceptable partner wins and earlier
//! decisions are never revisited.

use crate::analysis::CutAnalysis;
use crate::types::HeuristicOptions;

/// Symmetric partner lookup indexed by placed tile position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairMap {
    partners: Vec<Option<usize>>,
}

impl PairMap {
    pub fn new(len: usize) -> Self {
        Self {
            partners: vec![None; len],
        }
    }

    pub fn partner_of(&self, index: usize) -> Option<usize> {
        self.partners.get(index).copied().flatten()
    }

    pub fn is_paired(&self, index: usize) -> bool {
        self.partner_of(index).is_some()
    }

    /// Number of pairs, not of paired shapes.
    pub fn pair_count(&self) -> usize {
        self.partners.iter().flatten().count() / 2
    }

    fn link(&mut self, a: usize, b: usize) {
        self.partners[a] = Some(b);
        self.partners[b] = Some(a);
    }
}

fn are_complementary(
    a: &CutAnalysis,
    b: &CutAnalysis,
    nominal_area: f64,
    heuristics: &HeuristicOptions,
) -> bool {
    let same_box = (a.bbox.width() - b.bbox.width()).abs() <= heuristics.pair_tolerance
        && (a.bbox.height() - b.bbox.height()).abs() <= heuristics.pair_tolerance;
    if !same_box {
        return false;
    }

    let combined = a.true_area + b.true_area;
    combined >= heuristics.pair_area_min * nominal_area
        && combined <= heuristics.pair_area_max * nominal_area
}

/// Pairs up complementary cuts.
///
/// `analyses` holds one entry per placed tile: `None` for full tiles. Degenerate
/// cuts are never paired.
pub fn match_complementary_pairs(
    analyses: &[Option<CutAnalysis>],
    nominal_area: f64,
    heuristics: &HeuristicOptions,
) -> PairMap {
    let mut pairs = PairMap::new(analyses.len());
    let candidates: Vec<(usize, &CutAnalysis)> = analyses
        .iter()
        .enumerate()
        .filter_map(|(idx, analysis)| analysis.as_ref().map(|a| (idx, a)))
        .filter(|(_, analysis)| !analysis.degenerate)
        .collect();

    for (pos, &(i, first)) in candidates.iter().enumerate() {
        if pairs.is_paired(i) {
            continue;
        }
        let partner = candidates[pos + 1..].iter().find(|&&(j, second)| {
            !pairs.is_paired(j) && are_complementary(first, second, nominal_area, heuristics)
        });
        if let Some(&(j, _)) = partner {
            pairs.link(i, j);
        }
    }

    pairs
}
