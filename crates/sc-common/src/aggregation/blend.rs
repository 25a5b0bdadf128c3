/// Weight given to the incoming observation when folding it into a running total.
pub const BLEND_WEIGHT: f64 = 0.5;

/// Exponential decay toward the most recent observation.
///
/// After results `s1..sn` the total is `s1 / 2^(n-1) + sum_{k=2..n} s_k / 2^(n-k+1)`.
pub fn blend(previous: f64, incoming: f64) -> f64 {
    previous * (1.0 - BLEND_WEIGHT) + incoming * BLEND_WEIGHT
}
