use thiserror::Error;

/// Hard failures that abort an analysis run before fan-out begins.
/// Everything downstream of fan-out degrades in-band instead of erroring:
/// broken sources become degraded signals, a missing synthesizer becomes a
/// fallback recommendation, and a failed canonicalization becomes a
/// timestamp hash.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("missing or invalid configuration: {0}")]
    Configuration(String),
}
