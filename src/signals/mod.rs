// =============================================================================
// Signals Module
// =============================================================================
//
// Threshold policies and the classifier that turns the latest indicator
// reading into Buy / Sell / Hold (or InsufficientData).

pub mod classifier;
pub mod policy;

pub use classifier::{classify, classify_latest, Classification, Signal};
pub use policy::SignalPolicy;
