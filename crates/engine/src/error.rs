use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("step `{name}` failed to initialize: {source:#}")]
    StepInit { name: String, source: anyhow::Error },

    #[error("{0} consecutive steps skipped without yielding a runnable step")]
    SkipLimitExceeded(usize),
}
