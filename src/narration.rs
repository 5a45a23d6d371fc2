// =============================================================================
// Narration Formatter — speech-ready analysis summary
// =============================================================================
//
// Produces three plain sentences (price, RSI, signal) for an external
// text-to-speech collaborator. The output never contains quote characters or
// backslashes so it can be embedded literally in a script string.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::indicators::IndicatorReading;
use crate::signals::Classification;

/// Narration settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NarrationConfig {
    /// Spoken currency word appended to the price, e.g. "rupees".
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Narrator {
    config: NarrationConfig,
}

impl Narrator {
    pub fn new(config: NarrationConfig) -> Self {
        Self { config }
    }

    /// Render the summary for `symbol` at `current_price`.
    pub fn format(
        &self,
        symbol: &str,
        current_price: f64,
        reading: &IndicatorReading,
        classification: &Classification,
    ) -> String {
        let symbol = speakable(symbol);

        let price_sentence = match self.config.currency.as_deref().map(speakable) {
            Some(currency) if !currency.is_empty() => {
                format!("The price of {symbol} is {current_price:.1} {currency}.")
            }
            _ => format!("The price of {symbol} is {current_price:.1}."),
        };

        let rsi_sentence = match reading.rsi {
            Some(rsi) => format!("The R.S.I value is {rsi:.1}."),
            None => "The R.S.I value is still collecting data.".to_string(),
        };

        let signal_sentence = match classification {
            Classification::Signal(signal) => signal.rationale(&symbol),
            Classification::InsufficientData => {
                format!("{symbol} is still collecting data. No signal is available yet.")
            }
        };

        format!("{price_sentence} {rsi_sentence} {signal_sentence}")
    }
}

/// Strip characters that would break a downstream script-embedded string.
fn speakable(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '"' | '\'' | '`' | '\\') && !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}
