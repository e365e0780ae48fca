// Error taxonomy shared by the loader, the palette and the renderers.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    /// The trip source could not be fetched, read or parsed. Fatal: no
    /// partial report is produced.
    #[error("data unavailable from {source_name}: {reason}")]
    DataUnavailable { source_name: String, reason: String },

    /// A user type with no display mapping reached a strict palette.
    #[error("unexpected user type {0:?}: no colour mapping defined (known: casual, member)")]
    UnexpectedCategory(String),

    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

impl ReportError {
    pub fn unavailable(source_name: &str, reason: impl std::fmt::Display) -> Self {
        ReportError::DataUnavailable {
            source_name: source_name.to_string(),
            reason: reason.to_string(),
        }
    }
}
