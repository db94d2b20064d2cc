//! Error types shared by the loader, filter and pipeline.

use thiserror::Error;

/// Failures that abort an operation.
///
/// Per-record problems (a trip pointing at an unknown station, a row with an
/// unparseable timestamp) are not errors: they are counted and logged by the
/// stage that encounters them.
#[derive(Error, Debug)]
pub enum Error {
    /// A dataset could not be fetched or could not be parsed as a whole.
    #[error("failed to load dataset from {source_id}: {cause}")]
    DataLoad {
        source_id: String,
        #[source]
        cause: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// A slider value outside `-1..=1439`.
    #[error("cutoff {0} is not a minute of the day (expected -1 or 0..=1439)")]
    InvalidCutoff(i32),
}

impl Error {
    pub(crate) fn data_load(
        source_id: &str,
        cause: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    ) -> Self {
        Error::DataLoad {
            source_id: source_id.to_string(),
            cause: cause.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_load_message_names_source() {
        let err = Error::data_load("stations.json", anyhow::anyhow!("connection refused"));
        let msg = err.to_string();
        assert!(msg.contains("stations.json"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_data_load_exposes_cause() {
        use std::error::Error as _;

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = Error::data_load("trips.csv", io);
        assert!(err.source().is_some());
    }
}
