//! Small numeric helpers shared by the agent, world and fitter

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

pub fn dot3(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Saturating scale used for resources: 0 at 0, 0.5 at 1000, approaching 1
pub fn resource_norm(resource: f64) -> f64 {
    resource / (resource + 1000.0)
}

/// Map a signed disposition in [-1, 1] to a targeting weight in [0, 1]
///
/// -1 (rivalry) -> 1.0, 0 (neutral) -> 0.5, +1 (alignment) -> 0.0
pub fn signed_to_weight01(signed: f64) -> f64 {
    ((1.0 - signed) / 2.0).clamp(0.0, 1.0)
}
