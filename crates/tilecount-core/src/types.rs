use crate::geometry::{Point, Size};
use serde::{Deserialize, Serialize};

/// Outline of a nominal tile. Determines how its area is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileShape {
    #[default]
    Rectangle,
    Square,
    /// `width` is the across-flats distance.
    Hexagon,
    /// `width` and `height` are the two diagonals.
    Rhombus,
}

/// A physical tile as sold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NominalTile {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub shape: TileShape,
}

impl NominalTile {
    pub fn area(&self) -> f64 {
        match self.shape {
            TileShape::Rectangle | TileShape::Square => self.width * self.height,
            TileShape::Hexagon => {
                let circumradius = self.width / 3.0_f64.sqrt();
                1.5 * 3.0_f64.sqrt() * circumradius * circumradius
            }
            TileShape::Rhombus => self.width * self.height / 2.0,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn longer_side(&self) -> f64 {
        self.width.max(self.height)
    }
}

/// Tile settings for one surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSettings {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub shape: TileShape,
    /// Joint width between neighbouring tiles
    #[serde(default)]
    pub grout: f64,
}

impl TileSettings {
    pub fn nominal(&self) -> NominalTile {
        NominalTile {
            width: self.width,
            height: self.height,
            shape: self.shape,
        }
    }
}

/// How tiles are laid out on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    #[default]
    Grid,
    /// Every other row shifted by half a tile
    RunningBond,
    /// Grid rotated by 45 degrees
    Diagonal,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PatternSettings {
    #[serde(default)]
    pub kind: PatternKind,
    /// Anchor of the first tile. Falls back to the floor origin, then to the
    /// lower-left corner of the surface boundary.
    #[serde(default)]
    pub origin: Option<Point>,
}

/// Saw and reuse policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CuttingOptions {
    /// Offcuts may be turned 90 degrees to satisfy a request
    pub allow_rotate: bool,
    /// Best-fit offcut selection with guillotine remainder tracking.
    /// When off, the first fitting offcut is taken and remainders are lost.
    pub optimize_cuts: bool,
    /// Material removed by one saw cut
    pub kerf: f64,
}

impl Default for CuttingOptions {
    fn default() -> Self {
        Self {
            allow_rotate: true,
            optimize_cuts: true,
            kerf: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingOptions {
    /// Extra tiles kept in stock. Fractions are floored.
    pub reserve_tiles: f64,
    pub price_per_unit_area: f64,
    /// Area covered by one pack. Zero means tiles are not sold in packs.
    pub pack_area: f64,
}

/// Thresholds of the cut classification and pair matching heuristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicOptions {
    /// Lower bound of the true/bbox area ratio for a triangular cut
    pub triangular_ratio_min: f64,
    /// Upper bound of the true/bbox area ratio for a triangular cut
    pub triangular_ratio_max: f64,
    /// Cuts smaller than this share of the nominal tile area are clipping artifacts
    pub degenerate_area_fraction: f64,
    /// Non-triangular cuts below this ratio get their request shrunk by sqrt(ratio)
    pub shrink_ratio_threshold: f64,
    /// Max bounding box difference per axis for complementary pieces
    pub pair_tolerance: f64,
    /// Min combined area of a pair, as a share of the nominal tile area
    pub pair_area_min: f64,
    /// Max combined area of a pair, as a share of the nominal tile area
    pub pair_area_max: f64,
}

impl HeuristicOptions {
    pub const DEFAULT_TRIANGULAR_RATIO_MIN: f64 = 0.45;
    pub const DEFAULT_TRIANGULAR_RATIO_MAX: f64 = 0.60;
    pub const DEFAULT_DEGENERATE_AREA_FRACTION: f64 = 0.001;
    pub const DEFAULT_SHRINK_RATIO_THRESHOLD: f64 = 0.75;
    pub const DEFAULT_PAIR_TOLERANCE: f64 = 1.0;
    pub const DEFAULT_PAIR_AREA_MIN: f64 = 0.9;
    pub const DEFAULT_PAIR_AREA_MAX: f64 = 1.1;
}

impl Default for HeuristicOptions {
    fn default() -> Self {
        Self {
            triangular_ratio_min: Self::DEFAULT_TRIANGULAR_RATIO_MIN,
            triangular_ratio_max: Self::DEFAULT_TRIANGULAR_RATIO_MAX,
            degenerate_area_fraction: Self::DEFAULT_DEGENERATE_AREA_FRACTION,
            shrink_ratio_threshold: Self::DEFAULT_SHRINK_RATIO_THRESHOLD,
            pair_tolerance: Self::DEFAULT_PAIR_TOLERANCE,
            pair_area_min: Self::DEFAULT_PAIR_AREA_MIN,
            pair_area_max: Self::DEFAULT_PAIR_AREA_MAX,
        }
    }
}

/// A surface to be tiled (a room floor, a wall).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub id: String,
    pub boundary: Vec<Point>,
    /// Areas that are not tiled (columns, bathtubs, ...)
    #[serde(default)]
    pub exclusions: Vec<Vec<Point>>,
}

/// Input: everything needed to estimate one surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceConfig {
    pub surface: Option<Surface>,
    pub tile: TileSettings,
    #[serde(default)]
    pub pattern: PatternSettings,
    #[serde(default)]
    pub cutting: CuttingOptions,
    #[serde(default)]
    pub pricing: PricingOptions,
    #[serde(default)]
    pub heuristics: HeuristicOptions,
}

/// Input: several surfaces estimated in list order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorConfig {
    #[serde(default)]
    pub id: Option<String>,
    /// Processing order. With `share_offcuts`, later surfaces can reuse
    /// offcuts of earlier ones, never the other way around.
    pub surfaces: Vec<SurfaceConfig>,
    #[serde(default)]
    pub share_offcuts: bool,
    /// Pattern origin inherited by surfaces that do not set their own
    #[serde(default)]
    pub pattern_origin: Option<Point>,
}

/// One tile as laid by the tile source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlacedTile {
    Full,
    Cut { boundary: Vec<Point> },
}

/// Where an offcut came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffcutOrigin {
    WholeTile,
    SplitRemainder,
}

/// A reusable rectangular remnant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offcut {
    pub id: u64,
    pub width: f64,
    pub height: f64,
    pub origin: OffcutOrigin,
    /// Left over from a triangular half-tile cut
    pub half_tile: bool,
}

impl Offcut {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// How a placed tile was satisfied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum TileOutcome {
    /// Uncut tile straight from the box
    Full,
    /// Cut from a newly opened tile
    New {
        produced: Vec<Offcut>,
        /// Other half kept aside for the complementary partner
        #[serde(skip_serializing_if = "Option::is_none")]
        reserved_for_partner: Option<Offcut>,
    },
    /// Cut from an offcut of the shared pool
    PoolOffcut {
        consumed: Offcut,
        produced: Vec<Offcut>,
    },
    /// Other half of a tile opened for the complementary partner
    PairedOffcut { consumed: Offcut },
    /// Clipping sliver without material demand
    Degenerate,
}

/// Audit entry for one placed tile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Position in the placed tile list
    pub index: usize,
    /// Rectangle requested from stock (cut tiles only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested: Option<Size>,
    #[serde(flatten)]
    pub outcome: TileOutcome,
}

impl UsageRecord {
    /// Cut that needed material; degenerate slivers do not count.
    pub fn is_cut(&self) -> bool {
        !matches!(self.outcome, TileOutcome::Full | TileOutcome::Degenerate)
    }

    pub fn is_reused(&self) -> bool {
        matches!(
            self.outcome,
            TileOutcome::PoolOffcut { .. } | TileOutcome::PairedOffcut { .. }
        )
    }

    pub fn source(&self) -> &'static str {
        match self.outcome {
            TileOutcome::Full | TileOutcome::New { .. } => "new",
            TileOutcome::PoolOffcut { .. } => "pool_offcut",
            TileOutcome::PairedOffcut { .. } => "paired_offcut",
            TileOutcome::Degenerate => "degenerate",
        }
    }
}

/// Summary statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub full_tiles: u32,
    pub cut_tiles: u32,
    pub reused_cuts: u32,
    pub degenerate_cuts: u32,
    pub purchased_tiles: u32,
    pub reserve_tiles: u32,
    pub purchased_with_reserve: u32,
    pub tile_area: f64,
    /// Net tileable area after exclusions
    pub installed_area: f64,
    pub purchased_area: f64,
    pub waste_area: f64,
    pub waste_percentage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packs: Option<u32>,
    pub price: f64,
    pub purchase_cost: f64,
}

/// Output: estimate for one surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateResult {
    pub surface_id: String,
    pub summary: Summary,
    /// One entry per placed tile, in processing order
    pub usage: Vec<UsageRecord>,
    /// Offcuts still in the inventory after the pass
    pub remaining_offcuts: Vec<Offcut>,
}

/// Per-surface outcome of a floor estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SurfaceOutcome {
    Computed(EstimateResult),
    Failed {
        surface_id: Option<String>,
        error: String,
    },
}

/// Aggregate over every computed surface of a floor
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FloorTotals {
    pub surfaces_computed: u32,
    pub surfaces_failed: u32,
    pub full_tiles: u32,
    pub cut_tiles: u32,
    pub reused_cuts: u32,
    pub purchased_tiles: u32,
    pub purchased_with_reserve: u32,
    pub installed_area: f64,
    pub purchased_area: f64,
    pub waste_area: f64,
    pub waste_percentage: f64,
    pub price: f64,
    pub purchase_cost: f64,
}

/// Output: estimate for a whole floor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor_id: Option<String>,
    pub shared_offcuts: bool,
    pub surfaces: Vec<SurfaceOutcome>,
    pub totals: FloorTotals,
}

/// Error type for estimation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EstimateError {
    #[error("No surface selected")]
    NoSurfaceSelected,

    #[error("Invalid tile dimensions: {width} x {height}")]
    InvalidTileDimensions { width: f64, height: f64 },

    #[error("Invalid grout width: {0}")]
    InvalidGrout(f64),

    #[error("Surface '{0}' has no tileable area")]
    NoTileableArea(String),

    #[error("Tile generation failed: {0}")]
    TileGenerationFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, EstimateError>;
