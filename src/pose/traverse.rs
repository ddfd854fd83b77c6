//! Displacement-guided traversal along one skeleton edge.

use crate::tensor::TensorView;

/// Offset refinements applied after the displacement jump. Fixed, not
/// convergence-based.
const OFFSET_REFINE_STEPS: usize = 2;

/// Point in input-image pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Point {
    pub y: f32,
    pub x: f32,
}

/// Heatmap geometry shared by every lookup of one decode call.
#[derive(Clone, Copy)]
pub(crate) struct Heatmap<'a> {
    pub probs: TensorView<'a, f32>,
    pub offsets: TensorView<'a, f32>,
    pub output_stride: f32,
}

impl Heatmap<'_> {
    fn num_parts(&self) -> usize {
        self.probs.channels()
    }

    /// Heatmap cell nearest to `point`, clamped to the tensor bounds.
    pub fn nearest_cell(&self, point: Point) -> (usize, usize) {
        (
            clamp_cell(point.y / self.output_stride, self.probs.height()),
            clamp_cell(point.x / self.output_stride, self.probs.width()),
        )
    }

    /// Image position of `part` in cell `(y, x)`: cell origin plus its offset.
    pub fn image_coords(&self, y: usize, x: usize, part: usize) -> Point {
        Point {
            y: y as f32 * self.output_stride + self.offsets.at(y, x, part),
            x: x as f32 * self.output_stride + self.offsets.at(y, x, part + self.num_parts()),
        }
    }

    /// Follows `edge` from `source` to `target_part` through `displacements`.
    ///
    /// Returns the refined target position and its heatmap probability.
    pub fn traverse(
        &self,
        edge: usize,
        source: Point,
        target_part: usize,
        displacements: &TensorView<'_, f32>,
    ) -> (Point, f32) {
        let num_edges = displacements.channels() / 2;
        let (sy, sx) = self.nearest_cell(source);
        let mut target = Point {
            y: source.y + displacements.at(sy, sx, edge),
            x: source.x + displacements.at(sy, sx, edge + num_edges),
        };

        for _ in 0..OFFSET_REFINE_STEPS {
            let (ty, tx) = self.nearest_cell(target);
            target = self.image_coords(ty, tx, target_part);
        }

        let (fy, fx) = self.nearest_cell(target);
        (target, self.probs.at(fy, fx, target_part))
    }
}

/// Rounds half up and clamps into `0..len`.
fn clamp_cell(scaled: f32, len: usize) -> usize {
    let rounded = (scaled + 0.5).floor();
    if !(rounded > 0.0) {
        return 0;
    }
    (rounded as usize).min(len - 1)
}

#[cfg(test)]
mod tests {
    use super::{clamp_cell, Heatmap, Point};
    use crate::tensor::TensorView;

    #[test]
    fn clamp_cell_rounds_half_up_and_clamps() {
        assert_eq!(clamp_cell(1.49, 4), 1);
        assert_eq!(clamp_cell(1.5, 4), 2);
        assert_eq!(clamp_cell(-3.0, 4), 0);
        assert_eq!(clamp_cell(9.0, 4), 3);
        assert_eq!(clamp_cell(f32::NAN, 4), 0);
    }

    #[test]
    fn traverse_jumps_then_refines_with_offsets() {
        // 1 part, 1 edge, 2x2 heatmap, stride 10.
        let probs = [0.1f32, 0.2, 0.3, 0.4];
        // offsets: (y, x) per cell for the single part.
        let offsets = [0.0f32, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 2.0];
        // displacement at cell (0, 0) jumps by (+9, +11).
        let disp = [9.0f32, 11.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let heatmap = Heatmap {
            probs: TensorView::new(&probs, 2, 2, 1).unwrap(),
            offsets: TensorView::new(&offsets, 2, 2, 2).unwrap(),
            output_stride: 10.0,
        };
        let disp_view = TensorView::new(&disp, 2, 2, 2).unwrap();

        let (target, score) = heatmap.traverse(0, Point { y: 1.0, x: 2.0 }, 0, &disp_view);
        // Jump lands at (10, 13) -> cell (1, 1) -> (11, 12) -> cell (1, 1) again.
        assert_eq!(target, Point { y: 11.0, x: 12.0 });
        assert_eq!(score, 0.4);
    }
}
