use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required parameter '{key}' for '{element}'")]
    MissingParameter { element: String, key: String },

    #[error("Parameter '{key}' for '{element}' has the wrong type (expected {expected})")]
    WrongType {
        element: String,
        key: String,
        expected: &'static str,
    },

    #[error("Invalid value for parameter '{key}' of '{element}': {reason}")]
    InvalidValue {
        element: String,
        key: String,
        reason: String,
    },

    #[error("Element '{element}' has unknown type '{type_name}'")]
    UnknownElementType { element: String, type_name: String },

    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },

    #[error("JSON parsing error for '{path}': {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
}

impl ConfigError {
    pub fn invalid(element: &str, key: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            element: element.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
