use image::GrayImage;
use imageproc::{
    contours::{find_contours, BorderType, Contour},
    edges::canny,
};
use tracing::instrument;

use crate::{config::Thresholds, ellipse::fit_ellipse};

/// Outcome of inspecting one patch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShapeReport {
    pub is_rounded: bool,
    pub contours_inspected: usize,
    pub rejected_fits: usize,
}

/// Looks for rounded, near-circular strokes in a token patch.
///
/// Edges are extracted with Canny, the outermost contours of the edge map are
/// fitted with ellipses and the patch counts as rounded as soon as one fitted
/// ellipse has its minor axis inside the configured angle band.
#[derive(Debug, Clone, Copy)]
pub struct ShapeAnalyzer {
    canny_low: f32,
    canny_high: f32,
    min_contour_points: usize,
    angle_band: (f32, f32),
}

impl ShapeAnalyzer {
    pub fn new(thresholds: &Thresholds) -> Self {
        Self {
            canny_low: thresholds.canny_low,
            canny_high: thresholds.canny_high,
            // A conic needs five points; never go below that.
            min_contour_points: thresholds.min_contour_points.max(5),
            angle_band: thresholds.rounded_angle,
        }
    }

    pub fn is_rounded(&self, patch: &GrayImage) -> bool {
        self.analyze(patch).is_rounded
    }

    #[instrument(level = "trace", skip(self, patch), fields(w = patch.width(), h = patch.height()))]
    pub fn analyze(&self, patch: &GrayImage) -> ShapeReport {
        let mut report = ShapeReport::default();
        if patch.width() < 3 || patch.height() < 3 {
            return report;
        }

        let edges = self.edge_map(patch);
        for contour in external_contours(&edges) {
            if contour.points.len() < self.min_contour_points {
                continue;
            }
            report.contours_inspected += 1;
            let Some(ellipse) = fit_ellipse(&contour.points) else {
                report.rejected_fits += 1;
                continue;
            };
            let angle = ellipse.angle as f32;
            log::trace!("Contour of {} points fitted at {angle:.1}°", contour.points.len());
            if angle >= self.angle_band.0 && angle <= self.angle_band.1 {
                report.is_rounded = true;
                break;
            }
        }
        report
    }

    pub fn edge_map(&self, patch: &GrayImage) -> GrayImage {
        canny(patch, self.canny_low, self.canny_high)
    }
}

impl Default for ShapeAnalyzer {
    fn default() -> Self {
        Self::new(&Thresholds::default())
    }
}

fn external_contours(edges: &GrayImage) -> impl Iterator<Item = Contour<i32>> {
    find_contours::<i32>(edges)
        .into_iter()
        .filter(|contour| contour.border_type == BorderType::Outer && contour.parent.is_none())
}
