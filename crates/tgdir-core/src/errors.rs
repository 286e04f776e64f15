/// Core error type.
///
/// Adapter crates map their specific errors into this type so the handlers can
/// tell a missing entity apart from a failed call or a broken store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Persistence failure in the directory store. Always fatal to the operation.
    #[error("store error: {0}")]
    Store(String),

    #[error("chat not found: {0}")]
    ChatNotFound(String),

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::ChatNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
