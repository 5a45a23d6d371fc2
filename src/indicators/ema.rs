// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// Formula:
//   multiplier = 2 / (period + 1)
//   EMA_0      = close_0
//   EMA_t      = close_t * multiplier + EMA_{t-1} * (1 - multiplier)
//
// The series is seeded with the first close rather than an SMA, so it is
// defined from bar 0 and aligned 1:1 with the input. Values near the start
// carry little history and should be read as low-confidence; they are not
// masked.
// =============================================================================

/// Look-back used for the dashboard trend line.
pub const DEFAULT_EMA_PERIOD: usize = 20;

/// Compute the EMA series for `values` with look-back `period`.
///
/// # Edge cases
/// - `period == 0` => empty vec
/// - empty input => empty vec
/// - A non-finite input propagates into every later value; callers that need
///   an explicit absence map non-finite outputs to `None`.
pub fn calculate_ema(values: &[f64], period: usize) -> Vec<f64> {
    let Some((&first, rest)) = values.split_first() else {
        return Vec::new();
    };
    if period == 0 {
        return Vec::new();
    }

    let multiplier = 2.0 / (period as f64 + 1.0);

    let mut result = Vec::with_capacity(values.len());
    result.push(first);

    let mut prev_ema = first;
    for &value in rest {
        prev_ema = value * multiplier + prev_ema * (1.0 - multiplier);
        result.push(prev_ema);
    }

    result
}
