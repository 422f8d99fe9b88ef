//! Tile purchase estimation with offcut reuse.
//!
//! Given the tiles a pattern places on a surface, the [`Estimator`] works out
//! how many physical tiles have to be bought. Cut tiles are served from
//! offcuts of earlier cuts where possible, and complementary pieces such as
//! the two triangles of a diagonally split tile share one physical tile.
//! Matching is greedy; the result is a good estimate, not a proven optimum.

pub mod analysis;
pub mod estimator;
pub mod geometry;
pub mod inventory;
pub mod layout;
pub mod pairing;
pub mod types;

pub use estimator::{summarize, EstimateCache, Estimator, TileCounts};
pub use layout::{FixedLayout, LayoutRequest, PatternLayout, TileSource, TileableRegion};
pub use types::*;
