use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to load range document from {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Failed to read stored ranges for {key}: {message}")]
    RepositoryRead { key: String, message: String },

    #[error("Failed to write stored ranges for {key}: {message}")]
    RepositoryWrite { key: String, message: String },

    #[error("Sender '{channel}' failed: {message}")]
    Sender { channel: String, message: String },

    #[error("Notification failed for {key} on {} channel(s): {}", .failures.len(), .failures.join("; "))]
    Notification { key: String, failures: Vec<String> },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for {field} ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Source,
    Storage,
    Notification,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl WatchError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            WatchError::ConfigError { .. }
            | WatchError::MissingConfigError { .. }
            | WatchError::InvalidConfigValueError { .. }
            | WatchError::TomlError(_) => ErrorCategory::Configuration,
            WatchError::Fetch { .. } | WatchError::ApiError(_) => ErrorCategory::Source,
            WatchError::RepositoryRead { .. }
            | WatchError::RepositoryWrite { .. }
            | WatchError::IoError(_) => ErrorCategory::Storage,
            WatchError::Sender { .. } | WatchError::Notification { .. } => {
                ErrorCategory::Notification
            }
            WatchError::SerializationError(_) => ErrorCategory::Data,
        }
    }

    /// Severity drives the CLI exit code. Anything the scheduler can fix by
    /// re-running is `Medium`; things a human has to fix are `High` or worse.
    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration => ErrorSeverity::Critical,
            ErrorCategory::Source | ErrorCategory::Notification => ErrorSeverity::Medium,
            ErrorCategory::Storage => ErrorSeverity::High,
            ErrorCategory::Data => ErrorSeverity::High,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            WatchError::Fetch { url, .. } => {
                format!("Could not download the IP range document from {}", url)
            }
            WatchError::RepositoryRead { key, .. } | WatchError::RepositoryWrite { key, .. } => {
                format!("Could not access the stored IP ranges for {}", key)
            }
            WatchError::Sender { channel, .. } => {
                format!("The {} notification could not be delivered", channel)
            }
            WatchError::Notification { key, failures } => format!(
                "{} notification(s) for {} could not be delivered",
                failures.len(),
                key
            ),
            WatchError::MissingConfigError { field } => {
                format!("Configuration value '{}' is required", field)
            }
            WatchError::InvalidConfigValueError { field, reason, .. } => {
                format!("Configuration value '{}' is invalid: {}", field, reason)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the environment variables or config file and try again"
            }
            ErrorCategory::Source => "Check network access to the range document URL; the next run will retry",
            ErrorCategory::Storage => "Check the state table or file permissions; stored ranges were left untouched",
            ErrorCategory::Notification => {
                "Check the webhook URL or topic; the change will be re-detected on the next run"
            }
            ErrorCategory::Data => "The range document or stored state is malformed",
        }
    }
}

pub type Result<T> = std::result::Result<T, WatchError>;
