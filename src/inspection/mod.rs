//! SQL based inspection items
//!
//! Each item runs one fixed query through the SQL client and turns the
//! answer into an OK/NG verdict.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::config::SqlConfig;
use crate::error::Result;
use crate::runner::CommandRunner;

pub mod return_type;
pub mod sysadmin_user;

pub use return_type::ReturnTypeCheck;
pub use sysadmin_user::SysadminUserCheck;

#[async_trait]
pub trait SqlRunner: Send + Sync {
    /// Runs one statement and returns its unaligned, tuples-only output.
    async fn query(&self, sql: &str) -> Result<String>;
}

/// Runs statements through the `gsql` command line client.
pub struct GsqlRunner {
    runner: Arc<dyn CommandRunner>,
    config: SqlConfig,
}

impl GsqlRunner {
    pub fn new(runner: Arc<dyn CommandRunner>, config: SqlConfig) -> Self {
        Self { runner, config }
    }

    pub fn build_command(&self, sql: &str) -> String {
        let client = format!(
            "{} -d {} -p {} -t -A -X -c \"{}\"",
            self.config.client,
            self.config.database,
            self.config.port,
            escape_double_quoted(sql)
        );
        match &self.config.env_file {
            Some(env_file) => format!("source '{}' && {}", env_file.display(), client),
            None => client,
        }
    }
}

#[async_trait]
impl SqlRunner for GsqlRunner {
    async fn query(&self, sql: &str) -> Result<String> {
        let command = self.build_command(sql);
        debug!(database = %self.config.database, port = self.config.port, "Running inspection query");
        let output = self.runner.run(&command).await?.into_result(&command)?;
        Ok(output.trim().to_string())
    }
}

fn escape_double_quoted(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResultStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "NG")]
    Ng,
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultStatus::Ok => write!(f, "OK"),
            ResultStatus::Ng => write!(f, "NG"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub item: String,
    pub status: ResultStatus,
    /// The statement that was run.
    pub raw: String,
    pub value: String,
    pub checked_at: DateTime<Utc>,
}

impl CheckResult {
    pub fn new(item: &str, status: ResultStatus, raw: String, value: String) -> Self {
        Self {
            item: item.to_string(),
            status,
            raw,
            value,
            checked_at: Utc::now(),
        }
    }

    pub fn passed(&self) -> bool {
        self.status == ResultStatus::Ok
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[{}] {}", self.status, self.item)?;
        writeln!(f, "{}", self.value)
    }
}

#[async_trait]
pub trait InspectionItem: Send + Sync {
    fn name(&self) -> &'static str;
    async fn check(&self, sql: &dyn SqlRunner) -> Result<CheckResult>;
}
