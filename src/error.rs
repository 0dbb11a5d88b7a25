use std::path::PathBuf;
use thiserror::Error;

/// Failures while reading the score table or the feature file.
///
/// Structural problems abort the run; data-level gaps (unscored genes,
/// genes without a `Name`, unknown highlight names) never reach this type.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{line}: {reason}", path.display())]
    MalformedRow {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("no genes found on any plotted chromosome")]
    NoGenes,
}

impl ParseError {
    pub fn malformed(path: &std::path::Path, line: usize, reason: impl Into<String>) -> Self {
        ParseError::MalformedRow {
            path: path.to_path_buf(),
            line,
            reason: reason.into(),
        }
    }

    pub fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        ParseError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
