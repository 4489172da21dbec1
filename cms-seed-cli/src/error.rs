use thiserror::Error;

/// Errors that can occur during CLI command execution.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    /// I/O error
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// CMS, SeaTable or Mapbox request failed
    #[error("{0}")]
    Remote(#[from] cms_seed_remote::CmsError),

    /// Dataset could not be read
    #[error("{0}")]
    Source(#[from] cms_seed_import::SourceError),

    /// Load stopped by the error policy
    #[error("{0}")]
    Load(#[from] cms_seed_import::LoadError),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Runtime creation or async error
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl CliError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub(crate) fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }
}
