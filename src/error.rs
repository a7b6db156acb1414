#[derive(thiserror::Error, Debug)]
pub enum OmError {
    #[error("Command \"{command}\" exited with status {status}. Output: \n{output}")]
    CommandFailed {
        command: String,
        status: i32,
        output: String,
    },

    #[error("Failed to spawn command: {0}")]
    CommandSpawn(String),

    #[error("Node {0} was not found in the cluster status")]
    NodeNotFound(u32),

    #[error("Unknown script name: {0}")]
    UnknownScript(String),

    #[error("Environment variable {0} is not set")]
    MissingEnvVar(String),

    #[error("Failed to parse cluster status at line {line}: {message}")]
    StatusParse { line: usize, message: String },

    #[error("Failed to reach host {node} after {attempts} attempts. Command: \"{command}\". Error: \n{output}")]
    HostUnreachable {
        node: String,
        command: String,
        output: String,
        attempts: u32,
    },

    #[error("Hostname of {node} does not match its node name. Command: \"{command}\". Error: \n{output}")]
    HostnameMismatch {
        node: String,
        command: String,
        output: String,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Task failed: {0}")]
    TaskFailed(String),
}

impl From<std::io::Error> for OmError {
    fn from(err: std::io::Error) -> Self {
        OmError::IoError(err.to_string())
    }
}

impl From<serde_yaml::Error> for OmError {
    fn from(err: serde_yaml::Error) -> Self {
        OmError::ConfigError(format!("YAML error: {}", err))
    }
}

impl From<tokio::task::JoinError> for OmError {
    fn from(err: tokio::task::JoinError) -> Self {
        OmError::TaskFailed(err.to_string())
    }
}

impl OmError {
    /// Short machine-friendly category, used as a structured logging field.
    pub fn kind(&self) -> &'static str {
        match self {
            OmError::CommandFailed { .. } | OmError::CommandSpawn(_) => "external_command",
            OmError::NodeNotFound(_) => "missing_node",
            OmError::UnknownScript(_) => "unknown_script",
            OmError::MissingEnvVar(_) | OmError::ConfigError(_) => "environment",
            OmError::StatusParse { .. } => "status_parse",
            OmError::HostUnreachable { .. } | OmError::HostnameMismatch { .. } => "hostname",
            OmError::IoError(_) => "io",
            OmError::TaskFailed(_) => "task",
        }
    }
}

pub type Result<T> = std::result::Result<T, OmError>;
