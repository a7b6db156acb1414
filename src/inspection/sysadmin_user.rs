use async_trait::async_trait;

use super::{CheckResult, InspectionItem, ResultStatus, SqlRunner};
use crate::error::Result;

/// Flags system administrator roles other than the cluster owner.
#[derive(Debug, Clone)]
pub struct SysadminUserCheck {
    user: String,
}

impl SysadminUserCheck {
    pub fn new(user: impl Into<String>) -> Self {
        Self { user: user.into() }
    }

    pub fn statement(&self) -> String {
        format!(
            "select rolname from pg_roles where rolsystemadmin=True and rolname !='{}';",
            self.user.replace('\'', "''")
        )
    }
}

#[async_trait]
impl InspectionItem for SysadminUserCheck {
    fn name(&self) -> &'static str {
        "CheckSysadminUser"
    }

    async fn check(&self, sql: &dyn SqlRunner) -> Result<CheckResult> {
        let statement = self.statement();
        let output = sql.query(&statement).await?;
        let (status, value) = if output.is_empty() {
            (
                ResultStatus::Ok,
                format!("Sysadmin user does not exist except {}.", self.user),
            )
        } else {
            (
                ResultStatus::Ng,
                format!("There are sysadmin users except {}:\n{}", self.user, output),
            )
        };
        Ok(CheckResult::new(self.name(), status, statement, value))
    }
}
