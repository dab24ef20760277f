/// Why a fetch produced nothing to render.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Backend not ready")]
    NotReady,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Malformed payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// `ok:false` and missing snapshots are the normal state before the
    /// backend has data, not failures worth a warning.
    pub fn is_not_ready(&self) -> bool {
        matches!(self, FetchError::NotReady)
    }
}
