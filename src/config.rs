use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{OmError, Result};
use crate::runner::shell_quote;

/// Placeholder in the status query template replaced by the dump path.
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// Top-level tool configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OmConfig {
    pub install: InstallConfig,
    pub status: StatusQueryConfig,
    pub hostname: HostnameCheckConfig,
    pub sql: SqlConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    /// Tool home for unprivileged callers, usually taken from `GPHOME`.
    pub gphome: Option<PathBuf>,
    /// Script root of the privileged installation.
    pub package_root: PathBuf,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            gphome: None,
            package_root: PathBuf::from("/opt/gauss/om/script"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusQueryConfig {
    /// Command line writing the status dump; must contain `{output}`.
    pub command_template: String,
    /// Directory holding temporary status dumps.
    pub temp_dir: PathBuf,
    pub file_prefix: String,
}

impl Default for StatusQueryConfig {
    fn default() -> Self {
        Self {
            command_template: format!("gs_om -t status --all -o {}", OUTPUT_PLACEHOLDER),
            temp_dir: std::env::temp_dir(),
            file_prefix: "gauss_check_status".to_string(),
        }
    }
}

impl StatusQueryConfig {
    /// The query command line with the dump path quoted as one shell word.
    pub fn render_command(&self, output: &Path) -> String {
        self.command_template.replace(
            OUTPUT_PLACEHOLDER,
            &shell_quote(&output.display().to_string()),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostnameCheckConfig {
    /// Remote shell prefix; the node name is appended.
    pub remote_shell: String,
    pub hostname_file: String,
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    /// Worker pool size. `None` uses the CPU count.
    pub parallelism: Option<usize>,
}

impl Default for HostnameCheckConfig {
    fn default() -> Self {
        Self {
            remote_shell: "pssh -s -H".to_string(),
            hostname_file: "/etc/hostname".to_string(),
            max_attempts: 3,
            retry_delay_ms: 1000,
            parallelism: None,
        }
    }
}

impl HostnameCheckConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn worker_count(&self) -> usize {
        self.parallelism.unwrap_or_else(num_cpus::get).max(1)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SqlConfig {
    pub client: String,
    pub database: String,
    pub port: u16,
    /// Cluster owner, excluded from the sysadmin role check.
    pub user: String,
    /// Environment file sourced before the client runs.
    pub env_file: Option<PathBuf>,
}

impl Default for SqlConfig {
    fn default() -> Self {
        Self {
            client: "gsql".to_string(),
            database: "postgres".to_string(),
            port: 5432,
            user: "omm".to_string(),
            env_file: None,
        }
    }
}

impl OmConfig {
    /// Defaults, then the optional file, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;

        info!("Configuration loaded");
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            OmError::ConfigError(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        debug!(path = %path.display(), "Parsing config file");
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| OmError::ConfigError(format!("Invalid JSON config: {}", e))),
            _ => Err(OmError::ConfigError(
                "Config file must be .yaml, .yml, or .json".to_string(),
            )),
        }
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from any variable source. `HOME` and `USER` replace
    /// the built-in temp directory and cluster owner.
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        let non_empty = |key: &str| var(key).filter(|value| !value.is_empty());

        if let Some(gphome) = non_empty("GPHOME") {
            self.install.gphome = Some(PathBuf::from(gphome));
        }
        if let Some(home) = non_empty("HOME") {
            self.status.temp_dir = PathBuf::from(home);
        }
        if let Some(user) = non_empty("USER") {
            self.sql.user = user;
        }
        if let Some(shell) = var("CLUSTER_OM_PSSH") {
            self.hostname.remote_shell = shell;
        }
        if let Some(port) = var("PGPORT") {
            self.sql.port = port
                .parse()
                .map_err(|e| OmError::ConfigError(format!("Invalid PGPORT: {}", e)))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !self.status.command_template.contains(OUTPUT_PLACEHOLDER) {
            return Err(OmError::ConfigError(format!(
                "status.command_template must contain {}",
                OUTPUT_PLACEHOLDER
            )));
        }
        if self.status.file_prefix.is_empty() {
            return Err(OmError::ConfigError(
                "status.file_prefix must not be empty".to_string(),
            ));
        }
        if self.hostname.max_attempts == 0 {
            return Err(OmError::ConfigError(
                "hostname.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.hostname.parallelism == Some(0) {
            return Err(OmError::ConfigError(
                "hostname.parallelism must be at least 1".to_string(),
            ));
        }
        if self.hostname.remote_shell.trim().is_empty() {
            return Err(OmError::ConfigError(
                "hostname.remote_shell must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
