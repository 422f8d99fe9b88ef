use crate::geometry::{bounding_box, polygon_area, BoundingBox, Point, Size};
use crate::types::HeuristicOptions;
use serde::{Deserialize, Serialize};

/// Geometric facts about one cut tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutAnalysis {
    pub bbox: BoundingBox,
    pub bbox_area: f64,
    pub true_area: f64,
    /// `true_area / bbox_area`, zero for an empty box
    pub area_ratio: f64,
    pub triangular: bool,
    /// Sliver left by clipping, not a real cut
    pub degenerate: bool,
}

impl CutAnalysis {
    pub fn bbox_size(&self) -> Size {
        Size::new(self.bbox.width(), self.bbox.height())
    }

    /// Rectangle to request from stock for this cut.
    ///
    /// Odd non-triangular pieces that fill little of their box are shrunk
    /// towards their true footprint. Triangular pieces keep the full box;
    /// pairing and offcut reuse take care of them.
    pub fn effective_request(&self, heuristics: &HeuristicOptions) -> Size {
        let bbox = self.bbox_size();
        if self.area_ratio < heuristics.shrink_ratio_threshold && !self.triangular {
            let scale = self.area_ratio.sqrt();
            Size::new(bbox.width * scale, bbox.height * scale)
        } else {
            bbox
        }
    }
}

/// Measures and classifies the boundary of a cut tile.
pub fn analyze_cut(
    boundary: &[Point],
    nominal_area: f64,
    heuristics: &HeuristicOptions,
) -> CutAnalysis {
    let bbox = bounding_box(boundary).unwrap_or(BoundingBox {
        min_x: 0.0,
        min_y: 0.0,
        max_x: 0.0,
        max_y: 0.0,
    });
    let bbox_area = bbox.area();
    let true_area = polygon_area(boundary);
    let area_ratio = if bbox_area > 0.0 {
        true_area / bbox_area
    } else {
        0.0
    };

    CutAnalysis {
        bbox,
        bbox_area,
        true_area,
        area_ratio,
        triangular: area_ratio >= heuristics.triangular_ratio_min
            && area_ratio <= heuristics.triangular_ratio_max,
        degenerate: true_area < heuristics.degenerate_area_fraction * nominal_area,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rectangular_cut_keeps_its_box() {
        let heuristics = HeuristicOptions::default();
        let cut = vec![(0.0, 0.0), (30.0, 0.0), (30.0, 12.0), (0.0, 12.0)];
        let analysis = analyze_cut(&cut, 900.0, &heuristics);

        assert_relative_eq!(analysis.true_area, 360.0);
        assert_relative_eq!(analysis.area_ratio, 1.0);
        assert!(!analysis.triangular);
        assert!(!analysis.degenerate);
        assert_eq!(analysis.effective_request(&heuristics), Size::new(30.0, 12.0));
    }

    #[test]
    fn test_half_square_is_triangular_and_not_shrunk() {
        let heuristics = HeuristicOptions::default();
        let cut = vec![(0.0, 0.0), (30.0, 0.0), (0.0, 30.0)];
        let analysis = analyze_cut(&cut, 900.0, &heuristics);

        assert_relative_eq!(analysis.area_ratio, 0.5);
        assert!(analysis.triangular);
        assert_eq!(analysis.effective_request(&heuristics), Size::new(30.0, 30.0));
    }

    #[test]
    fn test_sparse_cut_request_is_shrunk() {
        let heuristics = HeuristicOptions::default();
        // 20 x 20 square with a 16 x 16 corner sawn off.
        let cut = vec![
            (0.0, 0.0),
            (20.0, 0.0),
            (20.0, 4.0),
            (4.0, 20.0),
            (0.0, 20.0),
        ];
        let analysis = analyze_cut(&cut, 900.0, &heuristics);
        assert_relative_eq!(analysis.area_ratio, 0.68);
        assert!(!analysis.triangular);

        let request = analysis.effective_request(&heuristics);
        let scale = 0.68_f64.sqrt();
        assert_relative_eq!(request.width, 20.0 * scale, epsilon = 1e-9);
        assert_relative_eq!(request.height, 20.0 * scale, epsilon = 1e-9);
    }

    #[test]
    fn test_sliver_is_degenerate() {
        let heuristics = HeuristicOptions::default();
        let sliver = vec![(0.0, 0.0), (30.0, 0.0), (30.0, 0.02), (0.0, 0.02)];
        let analysis = analyze_cut(&sliver, 900.0, &heuristics);
        assert!(analysis.degenerate);
    }

    #[test]
    fn test_empty_boundary_is_degenerate() {
        let analysis = analyze_cut(&[], 900.0, &HeuristicOptions::default());
        assert_eq!(analysis.area_ratio, 0.0);
        assert!(analysis.degenerate);
    }
}
