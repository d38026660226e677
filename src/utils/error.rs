use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("TSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Input file {path}: {message}")]
    InputError { path: String, message: String },

    #[error("Input file {path}, line {line}: {message}")]
    InputLineError {
        path: String,
        line: usize,
        message: String,
    },

    #[error("Could not authenticate with {service}: {message}")]
    AuthenticationError { service: String, message: String },

    #[error("{service} responded with {status}: {body}")]
    RemoteError {
        service: String,
        status: u16,
        body: String,
    },

    #[error("Unexpected response from {service}: {message}")]
    UnexpectedResponse { service: String, message: String },

    #[error("Could not create DMP '{title}': {source}")]
    DmpCreationError {
        title: String,
        #[source]
        source: Box<ImportError>,
    },

    #[error("Platform user {uuid} exists but could not be activated: {source}")]
    UserActivationError {
        uuid: String,
        #[source]
        source: Box<ImportError>,
    },

    #[error("Email error: {message}")]
    EmailError { message: String },
}

pub type Result<T> = std::result::Result<T, ImportError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Network,
    Remote,
    Email,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ImportError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ImportError::ConfigError { .. }
            | ImportError::ConfigValidationError { .. }
            | ImportError::InvalidConfigValueError { .. }
            | ImportError::MissingConfigError { .. } => ErrorCategory::Configuration,
            ImportError::InputError { .. }
            | ImportError::InputLineError { .. }
            | ImportError::CsvError(_) => ErrorCategory::Input,
            ImportError::ApiError(_) => ErrorCategory::Network,
            ImportError::AuthenticationError { .. }
            | ImportError::RemoteError { .. }
            | ImportError::UnexpectedResponse { .. }
            | ImportError::UserActivationError { .. }
            | ImportError::DmpCreationError { .. } => ErrorCategory::Remote,
            ImportError::EmailError { .. } => ErrorCategory::Email,
            ImportError::IoError(_) => ErrorCategory::Internal,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ImportError::AuthenticationError { .. } | ImportError::DmpCreationError { .. } => {
                ErrorSeverity::Critical
            }
            ImportError::ConfigError { .. }
            | ImportError::ConfigValidationError { .. }
            | ImportError::InvalidConfigValueError { .. }
            | ImportError::MissingConfigError { .. }
            | ImportError::InputError { .. }
            | ImportError::InputLineError { .. }
            | ImportError::IoError(_) => ErrorSeverity::High,
            ImportError::ApiError(_)
            | ImportError::RemoteError { .. }
            | ImportError::UnexpectedResponse { .. }
            | ImportError::UserActivationError { .. }
            | ImportError::EmailError { .. }
            | ImportError::CsvError(_) => ErrorSeverity::Medium,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ImportError::InputError { path, message } => {
                format!("The input file {} could not be used: {}", path, message)
            }
            ImportError::InputLineError {
                path,
                line,
                message,
            } => format!("The input file {} is malformed at line {}: {}", path, line, message),
            ImportError::AuthenticationError { service, .. } => {
                format!("Login to {} was rejected", service)
            }
            ImportError::DmpCreationError { title, .. } => {
                format!("The DMP platform refused to create '{}'", title)
            }
            ImportError::MissingConfigError { field } => {
                format!("The configuration is missing '{}'", field)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the configuration file and the .env variables it references"
            }
            ErrorCategory::Input => {
                "Make sure the file is UTF-8, tab separated, has at least 3 columns and Unix line endings"
            }
            ErrorCategory::Network => "Check network access to the remote service and run again",
            ErrorCategory::Remote => {
                "Check the credentials and the service status; rows already logged are done"
            }
            ErrorCategory::Email => "Check the [smtp] settings and the email templates",
            ErrorCategory::Internal => "Run again with --verbose and inspect the run log",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_errors_are_fatal() {
        let err = ImportError::InputLineError {
            path: "grants.txt".to_string(),
            line: 3,
            message: "expected at least 3 columns, found 2".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert_eq!(err.category(), ErrorCategory::Input);
        assert!(err.user_friendly_message().contains("line 3"));
    }

    #[test]
    fn test_remote_errors_are_row_level() {
        let err = ImportError::RemoteError {
            service: "SweCRIS".to_string(),
            status: 500,
            body: "Internal server error".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert_eq!(err.category(), ErrorCategory::Remote);
    }

    #[test]
    fn test_dmp_creation_is_critical() {
        let err = ImportError::DmpCreationError {
            title: "Quantum dots".to_string(),
            source: Box::new(ImportError::RemoteError {
                service: "DSW".to_string(),
                status: 400,
                body: "bad request".to_string(),
            }),
        };
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.to_string().contains("Quantum dots"));
    }
}
