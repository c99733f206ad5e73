//! Error types for the dummy plugin.

/// Error type for plugin operations.
///
/// End of stream is not an error: it is reported through
/// [`BatchStatus::Exhausted`](crate::BatchStatus::Exhausted).
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// Plugin configuration was present but could not be parsed
    #[error("config {config} could not be parsed: {source}")]
    InvalidConfig {
        config: String,
        #[source]
        source: serde_json::Error,
    },

    /// A required open parameter was absent
    #[error("params {params} did not contain {key} property")]
    MissingParameter { key: &'static str, params: String },

    /// Open parameters could not be parsed
    #[error("params {params} could not be parsed: {source}")]
    InvalidParams {
        params: String,
        #[source]
        source: serde_json::Error,
    },

    /// Event payload is not a readable decimal sample
    #[error("malformed event payload: {0}")]
    MalformedPayload(String),

    /// Field argument could not be used
    #[error("argument to {field} {arg:?} could not be converted to a non-zero number")]
    InvalidArgument { field: &'static str, arg: String },

    /// Field id or name is not part of the schema
    #[error("no known field: {0}")]
    UnknownField(String),

    /// Writing an event payload failed
    #[error("failed to write event payload: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PluginError>;
