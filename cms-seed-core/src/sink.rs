use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::entity::EntityKind;
use crate::record::{CreatedRecord, LocaleView};

/// Destination of transformed records.
///
/// Implementors perform the network calls; the loader only decides what to
/// send and in which order.
pub trait RecordSink {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Create a record in the default locale and return its new ids.
    fn create(
        &self,
        kind: EntityKind,
        view: &LocaleView,
    ) -> impl Future<Output = Result<CreatedRecord, Self::Error>> + Send;

    /// Write the `locale` variant of an existing record addressed by `key`.
    fn update(
        &self,
        kind: EntityKind,
        key: &str,
        locale: &str,
        view: &LocaleView,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// What to do when the sink rejects a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Log the failure and continue with the next record.
    #[default]
    Skip,
    /// Stop the run at the first failure.
    Abort,
}

impl std::str::FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "skip" | "continue" => Ok(Self::Skip),
            "abort" | "halt" | "exit" => Ok(Self::Abort),
            other => Err(format!("unknown error policy '{}' (expected skip or abort)", other)),
        }
    }
}

impl std::fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Skip => write!(f, "skip"),
            Self::Abort => write!(f, "abort"),
        }
    }
}
