use thiserror::Error;

#[derive(Error, Debug)]
pub enum SynthError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("empty completion in response")]
    EmptyCompletion,
}

pub type SynthResult<T> = Result<T, SynthError>;
