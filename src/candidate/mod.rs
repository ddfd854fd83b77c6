//! Candidate ranking and pruning utilities.
//!
//! Includes the score-keyed priority queue shared by every greedy selector and
//! the squared-radius suppression test used by the pose decoder.

pub(crate) mod nms;
pub(crate) mod ranked;
