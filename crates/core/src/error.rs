use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid owner spec '{0}': expected user or user:group")]
    InvalidOwner(String),

    #[error("Invalid value for {key}: {message}")]
    InvalidConfig { key: &'static str, message: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
