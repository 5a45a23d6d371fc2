// =============================================================================
// Relative Strength Index (RSI) — Simple Moving Average smoothing
// =============================================================================
//
// RSI measures the balance of recent up-moves against down-moves.
//
// Step 1 — Deltas of consecutive closes. The first bar has no predecessor and
//          counts as zero movement.
// Step 2 — gain = max(delta, 0), loss = max(-delta, 0).
// Step 3 — avg_gain / avg_loss = simple mean over the trailing `window` bars.
// Step 4 — RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// The output is aligned 1:1 with the input closes. Index `i` carries a value
// iff `i >= window - 1`; earlier indices are `None`.
// =============================================================================

/// Look-back window used by the dashboard.
pub const DEFAULT_RSI_WINDOW: usize = 14;

/// Compute the RSI series for `closes`, aligned by index.
///
/// # Edge cases
/// - `window == 0` => every element is `None`
/// - Average loss of zero with positive average gain => 100.0
/// - No movement at all inside the window => 50.0
/// - A non-finite close inside the window => `None` for that index
pub fn calculate_rsi(closes: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; closes.len()];
    if window == 0 || closes.len() < window {
        return result;
    }

    // --- Gains and losses, aligned with closes -------------------------------
    let (gains, losses): (Vec<f64>, Vec<f64>) = std::iter::once((0.0, 0.0))
        .chain(closes.windows(2).map(|w| {
            let delta = w[1] - w[0];
            if delta.is_finite() {
                (delta.max(0.0), (-delta).max(0.0))
            } else {
                (f64::NAN, f64::NAN)
            }
        }))
        .unzip();

    let window_f = window as f64;
    for i in (window - 1)..closes.len() {
        let start = i + 1 - window;
        let avg_gain = gains[start..=i].iter().sum::<f64>() / window_f;
        let avg_loss = losses[start..=i].iter().sum::<f64>() / window_f;
        result[i] = rsi_from_averages(avg_gain, avg_loss);
    }

    result
}

/// Most recent RSI value, `None` while the warm-up window has not elapsed.
pub fn latest_rsi(closes: &[f64], window: usize) -> Option<f64> {
    calculate_rsi(closes, window).last().copied().flatten()
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Convert average gain / average loss into an RSI value in [0, 100].
///
/// - If both averages are zero, RSI is 50.0 (no movement).
/// - If average loss is zero (only gains), RSI is 100.0.
/// - Returns `None` when either average is non-finite.
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if !avg_gain.is_finite() || !avg_loss.is_finite() {
        return None;
    }

    let rsi = if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    };

    rsi.is_finite().then_some(rsi)
}
