use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("No TLD found on {0:?}")]
    InvalidDomain(String),

    #[error("Missing required configuration value '{0}'")]
    MissingConfig(&'static str),

    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidConfig { key: &'static str, reason: String },

    #[error("Invalid stack name {name:?}\n{reason}")]
    InvalidStackName { name: String, reason: &'static str },

    #[error("Failed to read {path:?}\n{source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path:?}\n{source}")]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("No hosted zone found for {0:?}")]
    ZoneNotFound(String),

    #[error("Certificate {arn} failed validation: {reason}")]
    CertificateValidation { arn: String, reason: String },

    #[error("Validation failed on resource '{logical_id}'\n{reason}")]
    InvalidResource { logical_id: String, reason: String },

    #[error("Resource '{from}' references unknown resource '{to}'")]
    UnknownResource { from: String, to: String },

    #[error("Duplicate logical id '{0}'")]
    DuplicateResource(String),

    #[error("Dependency cycle between resources: {0:?}")]
    DependencyCycle(Vec<String>),

    #[error("Reference ${{{logical_id}.{attribute}}} has not been resolved")]
    UnresolvedReference {
        logical_id: String,
        attribute: String,
    },

    #[error("No provider configured for binding '{0}'")]
    MissingProvider(String),

    #[error("{operation} failed\n{message}")]
    Provider {
        operation: &'static str,
        message: String,
    },

    #[error("Failed to provision '{logical_id}'\n{source}")]
    Provision {
        logical_id: String,
        #[source]
        source: Box<Error>,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn provider(operation: &'static str, err: impl std::fmt::Debug) -> Self {
        Error::Provider {
            operation,
            message: format!("{:#?}", err),
        }
    }
}
