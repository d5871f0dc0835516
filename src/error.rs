use std::fmt;

/// Failure type a pending producer may return.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur when realizing pending elements

#[derive(Debug)]
pub enum ElementSourceError {
    /// The producer of the pending entry at `index` failed.
    ///
    /// The entry counts as realized and will not be invoked again. Entries
    /// realized before it stay realized, entries after it stay pending.
    RealizationFailed { index: usize, source: BoxError },
}

impl ElementSourceError {
    /// Insertion index of the entry the failure is attributed to.
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            ElementSourceError::RealizationFailed { index, .. } => *index,
        }
    }
}

impl fmt::Display for ElementSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementSourceError::RealizationFailed { index, source } => {
                write!(f, "Failed to realize pending entry {index}: {source}")
            }
        }
    }
}

impl std::error::Error for ElementSourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ElementSourceError::RealizationFailed { source, .. } => Some(&**source),
        }
    }
}

pub type Result<T> = std::result::Result<T, ElementSourceError>;
