use super::consumption::Consumption;
use super::*;
use serde::Serialize;
use std::collections::HashMap;

/// Layout-dependent part of an estimate. Pricing and reserve are applied on
/// top of it on every call, so they are not part of the key.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CachedLayout {
    pub net_area: f64,
    pub consumption: Consumption,
    pub remaining: Vec<Offcut>,
}

/// Snapshot of every input the tile source and the consumption pass read.
#[derive(Serialize)]
struct SnapshotKey<'a> {
    tile: &'a TileSettings,
    pattern: PatternKind,
    origin: Point,
    boundary: &'a [Point],
    exclusions: &'a [Vec<Point>],
    cutting: &'a CuttingOptions,
    heuristics: &'a HeuristicOptions,
}

pub(crate) fn snapshot_key(
    config: &SurfaceConfig,
    surface: &Surface,
    origin: Point,
) -> Result<String> {
    let key = SnapshotKey {
        tile: &config.tile,
        pattern: config.pattern.kind,
        origin,
        boundary: &surface.boundary,
        exclusions: &surface.exclusions,
        cutting: &config.cutting,
        heuristics: &config.heuristics,
    };
    serde_json::to_string(&key)
        .map_err(|err| EstimateError::InvalidInput(format!("cannot snapshot surface: {err}")))
}

/// Per-surface memo of layout results.
///
/// An entry is only served when the snapshot key matches. Callers still have
/// to invalidate a surface when something outside the key changes, such as
/// the behaviour of the tile source; otherwise they get the old result.
#[derive(Debug, Default)]
pub struct EstimateCache {
    entries: HashMap<String, (String, CachedLayout)>,
}

impl EstimateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, surface_id: &str, key: &str) -> Option<&CachedLayout> {
        self.entries
            .get(surface_id)
            .filter(|(stored_key, _)| stored_key == key)
            .map(|(_, layout)| layout)
    }

    pub(crate) fn insert(&mut self, surface_id: String, key: String, layout: CachedLayout) {
        self.entries.insert(surface_id, (key, layout));
    }

    /// Drops the entry of one surface, or every entry. Returns how many were removed.
    pub fn invalidate(&mut self, surface_id: Option<&str>) -> usize {
        match surface_id {
            Some(id) => usize::from(self.entries.remove(id).is_some()),
            None => {
                let removed = self.entries.len();
                self.entries.clear();
                removed
            }
        }
    }

    pub fn contains(&self, surface_id: &str) -> bool {
        self.entries.contains_key(surface_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
