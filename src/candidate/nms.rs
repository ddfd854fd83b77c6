//! Radius-based suppression for keypoint candidates.

/// Returns true when `(y, x)` lies within `squared_radius` of any point yielded
/// by `kept`.
///
/// Distances are Euclidean and compared squared; a point exactly on the radius
/// counts as suppressed.
pub fn within_squared_radius<I>(y: f32, x: f32, squared_radius: f32, kept: I) -> bool
where
    I: IntoIterator<Item = (f32, f32)>,
{
    kept.into_iter().any(|(ky, kx)| {
        let dy = ky - y;
        let dx = kx - x;
        dy * dy + dx * dx <= squared_radius
    })
}
