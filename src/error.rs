pub type ScenesmithResult<T> = Result<T, ScenesmithError>;

#[derive(thiserror::Error, Debug)]
pub enum ScenesmithError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("consistency error: {0}")]
    Consistency(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScenesmithError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// A broken scene invariant (e.g. an accepted instance with no visible
    /// pixels). Never recovered from: silently continuing would emit corrupt
    /// training labels.
    pub fn consistency(msg: impl Into<String>) -> Self {
        Self::Consistency(msg.into())
    }
}
