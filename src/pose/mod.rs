//! Multi-person pose decoding from heatmap, offset and displacement heads.
//!
//! Decoding runs in two phases:
//!
//! 1. Every part score (sigmoid of the heatmap logit) at or above the
//!    threshold that is a maximum of its local window becomes a candidate in
//!    a score-keyed priority queue.
//! 2. Candidates are popped greedily as pose roots. A root within
//!    `nms_radius` of the same part in an accepted pose is dropped for good.
//!    Otherwise the skeleton is walked outward from the root: first toward
//!    the tree root over edges in reverse order using the backward
//!    displacements, then away from it over edges in declaration order using
//!    the forward displacements. Each step jumps along the displacement
//!    vector and refines the landing point twice with the part's offsets.
//!
//! The pose score is the keypoint score sum divided by [`BodyPart::COUNT`],
//! so parts that were never reached still count in the denominator.

mod candidates;
pub mod skeleton;
mod traverse;

pub use skeleton::{BodyPart, Edge, Skeleton, POSENET_EDGES};

use crate::candidate::nms::within_squared_radius;
use crate::tensor::TensorView;
use crate::trace::{trace_event, trace_span};
use crate::util::{NetDecodeError, NetDecodeResult};
use candidates::{build_part_queue, heatmap_probabilities};
use traverse::{Heatmap, Point};

/// Configuration for [`PoseDecoder`].
#[derive(Clone, Copy, Debug)]
pub struct PoseConfig {
    /// Half-size of the peak window, in heatmap cells.
    pub local_maximum_radius: usize,
    /// Input pixels per heatmap cell.
    pub output_stride: usize,
    /// Minimum separation, in input pixels, between same-part roots.
    pub nms_radius: f32,
    /// Minimum part score for a root candidate.
    pub threshold: f32,
    /// Maximum number of poses returned.
    pub num_results: usize,
    /// Side of the square model input, used to normalize coordinates.
    pub input_size: usize,
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            local_maximum_radius: 1,
            output_stride: 16,
            nms_radius: 20.0,
            threshold: 0.5,
            num_results: 5,
            input_size: 257,
        }
    }
}

/// One body part location.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keypoint {
    pub part: BodyPart,
    /// Normalized horizontal position in `[0, 1]`.
    pub x: f32,
    /// Normalized vertical position in `[0, 1]`.
    pub y: f32,
    pub score: f32,
}

/// A decoded person: keypoints by part plus an aggregate score.
#[derive(Clone, Debug, PartialEq)]
pub struct Pose {
    keypoints: [Option<Keypoint>; BodyPart::COUNT],
    score: f32,
}

impl Pose {
    /// Builds a pose from keypoints; a later keypoint for the same part wins.
    ///
    /// The score is the sum of keypoint scores over [`BodyPart::COUNT`].
    pub fn from_keypoints<I>(keypoints: I) -> Self
    where
        I: IntoIterator<Item = Keypoint>,
    {
        let mut slots = [None; BodyPart::COUNT];
        for keypoint in keypoints {
            slots[keypoint.part.index()] = Some(keypoint);
        }
        let total: f32 = slots.iter().flatten().map(|kp| kp.score).sum();
        Self {
            keypoints: slots,
            score: total / BodyPart::COUNT as f32,
        }
    }

    /// Aggregate pose score.
    pub fn score(&self) -> f32 {
        self.score
    }

    /// Keypoint for `part`, if it was placed.
    pub fn get(&self, part: BodyPart) -> Option<&Keypoint> {
        self.keypoints[part.index()].as_ref()
    }

    /// Placed keypoints in part order.
    pub fn keypoints(&self) -> impl Iterator<Item = &Keypoint> {
        self.keypoints.iter().flatten()
    }

    /// Number of placed keypoints.
    pub fn len(&self) -> usize {
        self.keypoints.iter().flatten().count()
    }

    /// True when no keypoint was placed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The four output heads of a pose model, all sharing one heatmap grid.
#[derive(Clone, Copy, Debug)]
pub struct PoseTensors<'a> {
    /// `[H][W][K]` part heatmap logits.
    pub scores: TensorView<'a, f32>,
    /// `[H][W][2K]` offsets, y channels then x channels.
    pub offsets: TensorView<'a, f32>,
    /// `[H][W][2E]` parent-to-child displacements, y channels then x channels.
    pub displacements_fwd: TensorView<'a, f32>,
    /// `[H][W][2E]` child-to-parent displacements, y channels then x channels.
    pub displacements_bwd: TensorView<'a, f32>,
}

impl<'a> PoseTensors<'a> {
    /// Groups the heads after checking that they share height and width.
    pub fn new(
        scores: TensorView<'a, f32>,
        offsets: TensorView<'a, f32>,
        displacements_fwd: TensorView<'a, f32>,
        displacements_bwd: TensorView<'a, f32>,
    ) -> NetDecodeResult<Self> {
        let tensors = Self {
            scores,
            offsets,
            displacements_fwd,
            displacements_bwd,
        };
        tensors.check_shared_grid()?;
        Ok(tensors)
    }

    /// Fails with `InvalidDimensions` for the first head whose height or
    /// width differs from the heatmap's.
    fn check_shared_grid(&self) -> NetDecodeResult<()> {
        for other in [&self.offsets, &self.displacements_fwd, &self.displacements_bwd] {
            if other.height() != self.scores.height() || other.width() != self.scores.width() {
                return Err(NetDecodeError::InvalidDimensions {
                    height: other.height(),
                    width: other.width(),
                    channels: other.channels(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy)]
struct Placed {
    point: Point,
    score: f32,
}

type PlacedParts = [Option<Placed>; BodyPart::COUNT];

/// Greedy multi-pose decoder over a fixed skeleton.
pub struct PoseDecoder<'s> {
    skeleton: &'s Skeleton,
    cfg: PoseConfig,
}

impl<'s> PoseDecoder<'s> {
    /// Creates a decoder after validating the scalar configuration.
    pub fn new(skeleton: &'s Skeleton, cfg: PoseConfig) -> NetDecodeResult<Self> {
        if cfg.output_stride == 0 {
            return Err(NetDecodeError::InvalidConfig {
                reason: "output_stride must be positive",
            });
        }
        if cfg.input_size == 0 {
            return Err(NetDecodeError::InvalidConfig {
                reason: "input_size must be positive",
            });
        }
        if !cfg.nms_radius.is_finite() || cfg.nms_radius < 0.0 {
            return Err(NetDecodeError::InvalidConfig {
                reason: "nms_radius must be finite and non-negative",
            });
        }
        Ok(Self { skeleton, cfg })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &PoseConfig {
        &self.cfg
    }

    /// Decodes up to `num_results` poses, best root first.
    pub fn decode(&self, tensors: &PoseTensors<'_>) -> NetDecodeResult<Vec<Pose>> {
        let num_edges = self.skeleton.num_edges();
        // The fields are public, so a struct literal may bypass `PoseTensors::new`.
        tensors.check_shared_grid()?;
        tensors
            .scores
            .expect_channels(BodyPart::COUNT, "pose heatmap")?;
        tensors
            .offsets
            .expect_channels(2 * BodyPart::COUNT, "pose offsets")?;
        tensors
            .displacements_fwd
            .expect_channels(2 * num_edges, "forward displacements")?;
        tensors
            .displacements_bwd
            .expect_channels(2 * num_edges, "backward displacements")?;

        let height = tensors.scores.height();
        let width = tensors.scores.width();
        let _span = trace_span!(
            "decode_poses",
            height = height,
            width = width,
            num_results = self.cfg.num_results
        )
        .entered();

        let probs = heatmap_probabilities(tensors.scores);
        let heatmap = Heatmap {
            probs: TensorView::new(&probs, height, width, BodyPart::COUNT)?,
            offsets: tensors.offsets,
            output_stride: self.cfg.output_stride as f32,
        };

        let mut queue = build_part_queue(
            &heatmap.probs,
            self.cfg.threshold,
            self.cfg.local_maximum_radius,
        );
        trace_event!("pose_candidates", count = queue.len());

        let squared_nms_radius = self.cfg.nms_radius * self.cfg.nms_radius;
        let mut accepted: Vec<PlacedParts> = Vec::new();
        while accepted.len() < self.cfg.num_results {
            let Some((score, root)) = queue.pop() else {
                break;
            };
            let root_point = heatmap.image_coords(root.y, root.x, root.part);
            let same_part = accepted
                .iter()
                .filter_map(|parts| parts[root.part])
                .map(|placed| (placed.point.y, placed.point.x));
            if within_squared_radius(root_point.y, root_point.x, squared_nms_radius, same_part) {
                continue;
            }

            let mut parts: PlacedParts = [None; BodyPart::COUNT];
            parts[root.part] = Some(Placed {
                point: root_point,
                score,
            });
            self.walk_edges(&heatmap, tensors, &mut parts);
            accepted.push(parts);
        }

        let input_size = self.cfg.input_size as f32;
        let poses: Vec<Pose> = accepted
            .iter()
            .map(|parts| to_pose(parts, input_size))
            .collect();
        trace_event!("pose_results", count = poses.len());
        Ok(poses)
    }

    fn walk_edges(&self, heatmap: &Heatmap<'_>, tensors: &PoseTensors<'_>, parts: &mut PlacedParts) {
        let edges = self.skeleton.edges();

        for (edge_id, edge) in edges.iter().enumerate().rev() {
            let (source, target) = (edge.child.index(), edge.parent.index());
            if let (Some(from), None) = (parts[source], parts[target]) {
                let (point, score) =
                    heatmap.traverse(edge_id, from.point, target, &tensors.displacements_bwd);
                parts[target] = Some(Placed { point, score });
            }
        }

        for (edge_id, edge) in edges.iter().enumerate() {
            let (source, target) = (edge.parent.index(), edge.child.index());
            if let (Some(from), None) = (parts[source], parts[target]) {
                let (point, score) =
                    heatmap.traverse(edge_id, from.point, target, &tensors.displacements_fwd);
                parts[target] = Some(Placed { point, score });
            }
        }
    }
}

fn to_pose(parts: &PlacedParts, input_size: f32) -> Pose {
    let keypoints = parts.iter().enumerate().filter_map(|(idx, placed)| {
        let placed = placed.as_ref()?;
        Some(Keypoint {
            part: BodyPart::ALL[idx],
            x: (placed.point.x / input_size).clamp(0.0, 1.0),
            y: (placed.point.y / input_size).clamp(0.0, 1.0),
            score: placed.score,
        })
    });
    Pose::from_keypoints(keypoints)
}
