use serde_json::Value;

pub type IpcResult<T> = Result<T, IpcError>;

/// What mpv answers when a property exists but has no value right now, like the
/// language of a track that has none.
const PROPERTY_UNAVAILABLE: &str = "property unavailable";

#[derive(thiserror::Error, Debug)]
pub enum IpcError {
    #[error("mpv ipc socket: {0}")]
    Io(#[from] std::io::Error),
    #[error("bad ipc message: {0}")]
    Json(#[from] serde_json::Error),
    #[error("mpv error: {0}")]
    Mpv(String),
    #[error("unexpected value of '{property}': {value}")]
    Malformed { property: String, value: Value },
    #[error("IpcError::Exited: the connection to mpv is closed")]
    Exited,
}

impl IpcError {
    pub fn malformed(property: impl Into<String>, value: Value) -> Self {
        Self::Malformed {
            property: property.into(),
            value,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Mpv(msg) if msg == PROPERTY_UNAVAILABLE)
    }
}
