//! Body parts and the kinematic tree connecting them.

use crate::util::{NetDecodeError, NetDecodeResult};
use std::fmt;

/// The closed set of keypoints a pose model predicts, in heatmap channel order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BodyPart {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl BodyPart {
    /// Number of parts, and the heatmap channel count of a pose model.
    pub const COUNT: usize = 17;

    /// All parts in channel order.
    pub const ALL: [BodyPart; BodyPart::COUNT] = [
        BodyPart::Nose,
        BodyPart::LeftEye,
        BodyPart::RightEye,
        BodyPart::LeftEar,
        BodyPart::RightEar,
        BodyPart::LeftShoulder,
        BodyPart::RightShoulder,
        BodyPart::LeftElbow,
        BodyPart::RightElbow,
        BodyPart::LeftWrist,
        BodyPart::RightWrist,
        BodyPart::LeftHip,
        BodyPart::RightHip,
        BodyPart::LeftKnee,
        BodyPart::RightKnee,
        BodyPart::LeftAnkle,
        BodyPart::RightAnkle,
    ];

    /// Heatmap channel of this part.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Part for a heatmap channel.
    pub fn from_index(index: usize) -> Option<BodyPart> {
        Self::ALL.get(index).copied()
    }

    /// Conventional camelCase part name.
    pub fn name(self) -> &'static str {
        match self {
            BodyPart::Nose => "nose",
            BodyPart::LeftEye => "leftEye",
            BodyPart::RightEye => "rightEye",
            BodyPart::LeftEar => "leftEar",
            BodyPart::RightEar => "rightEar",
            BodyPart::LeftShoulder => "leftShoulder",
            BodyPart::RightShoulder => "rightShoulder",
            BodyPart::LeftElbow => "leftElbow",
            BodyPart::RightElbow => "rightElbow",
            BodyPart::LeftWrist => "leftWrist",
            BodyPart::RightWrist => "rightWrist",
            BodyPart::LeftHip => "leftHip",
            BodyPart::RightHip => "rightHip",
            BodyPart::LeftKnee => "leftKnee",
            BodyPart::RightKnee => "rightKnee",
            BodyPart::LeftAnkle => "leftAnkle",
            BodyPart::RightAnkle => "rightAnkle",
        }
    }
}

impl fmt::Display for BodyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Directed parent-to-child connection between two parts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
    pub parent: BodyPart,
    pub child: BodyPart,
}

impl Edge {
    pub const fn new(parent: BodyPart, child: BodyPart) -> Self {
        Self { parent, child }
    }
}

/// PoseNet's tree rooted at the nose. Displacement channels follow this order.
pub const POSENET_EDGES: [Edge; 16] = [
    Edge::new(BodyPart::Nose, BodyPart::LeftEye),
    Edge::new(BodyPart::LeftEye, BodyPart::LeftEar),
    Edge::new(BodyPart::Nose, BodyPart::RightEye),
    Edge::new(BodyPart::RightEye, BodyPart::RightEar),
    Edge::new(BodyPart::Nose, BodyPart::LeftShoulder),
    Edge::new(BodyPart::LeftShoulder, BodyPart::LeftElbow),
    Edge::new(BodyPart::LeftElbow, BodyPart::LeftWrist),
    Edge::new(BodyPart::LeftShoulder, BodyPart::LeftHip),
    Edge::new(BodyPart::LeftHip, BodyPart::LeftKnee),
    Edge::new(BodyPart::LeftKnee, BodyPart::LeftAnkle),
    Edge::new(BodyPart::Nose, BodyPart::RightShoulder),
    Edge::new(BodyPart::RightShoulder, BodyPart::RightElbow),
    Edge::new(BodyPart::RightElbow, BodyPart::RightWrist),
    Edge::new(BodyPart::RightShoulder, BodyPart::RightHip),
    Edge::new(BodyPart::RightHip, BodyPart::RightKnee),
    Edge::new(BodyPart::RightKnee, BodyPart::RightAnkle),
];

/// Immutable kinematic tree used by the pose decoder.
///
/// Edge order is significant: edge `e` reads displacement channels `e` (y)
/// and `e + num_edges` (x).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Skeleton {
    edges: Box<[Edge]>,
}

impl Skeleton {
    /// The standard 17-part PoseNet skeleton.
    pub fn posenet() -> Self {
        Self {
            edges: POSENET_EDGES.into(),
        }
    }

    /// Builds a skeleton from an explicit edge list.
    ///
    /// The edges must form a single non-empty rooted tree: no self-loops, at
    /// most one parent per part, no cycles, and exactly one root among the
    /// parts they touch.
    pub fn new(edges: Vec<Edge>) -> NetDecodeResult<Self> {
        if edges.is_empty() {
            return Err(NetDecodeError::InvalidSkeleton {
                reason: "edge list is empty",
            });
        }
        let mut parent: [Option<BodyPart>; BodyPart::COUNT] = [None; BodyPart::COUNT];
        let mut touched = [false; BodyPart::COUNT];
        for edge in &edges {
            if edge.parent == edge.child {
                return Err(NetDecodeError::InvalidSkeleton {
                    reason: "edge connects a part to itself",
                });
            }
            let slot = &mut parent[edge.child.index()];
            if slot.is_some() {
                return Err(NetDecodeError::InvalidSkeleton {
                    reason: "part has more than one parent",
                });
            }
            *slot = Some(edge.parent);
            touched[edge.parent.index()] = true;
            touched[edge.child.index()] = true;
        }

        for start in BodyPart::ALL {
            let mut current = start;
            let mut steps = 0usize;
            while let Some(next) = parent[current.index()] {
                steps += 1;
                if steps > BodyPart::COUNT {
                    return Err(NetDecodeError::InvalidSkeleton {
                        reason: "edges contain a cycle",
                    });
                }
                current = next;
            }
        }

        let roots = BodyPart::ALL
            .iter()
            .filter(|part| touched[part.index()] && parent[part.index()].is_none())
            .count();
        if roots > 1 {
            return Err(NetDecodeError::InvalidSkeleton {
                reason: "edges form more than one tree",
            });
        }

        Ok(Self {
            edges: edges.into_boxed_slice(),
        })
    }

    /// Edges in declaration order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Number of edges.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }
}

impl Default for Skeleton {
    fn default() -> Self {
        Self::posenet()
    }
}
