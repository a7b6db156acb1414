use async_trait::async_trait;

use super::{CheckResult, InspectionItem, ResultStatus, SqlRunner};
use crate::error::Result;

const ILLEGAL_RETURN_TYPE_SQL: &str = "select proname from pg_proc, pg_type \
     where pg_proc.prorettype=pg_type.oid \
     and pg_type.typisdefined=false;";

/// Flags functions whose return type was never defined.
#[derive(Debug, Clone, Default)]
pub struct ReturnTypeCheck;

#[async_trait]
impl InspectionItem for ReturnTypeCheck {
    fn name(&self) -> &'static str {
        "CheckReturnType"
    }

    async fn check(&self, sql: &dyn SqlRunner) -> Result<CheckResult> {
        let output = sql.query(ILLEGAL_RETURN_TYPE_SQL).await?;
        let (status, value) = if output.is_empty() {
            (
                ResultStatus::Ok,
                "User-defined functions do not contain illegal return types.".to_string(),
            )
        } else {
            (
                ResultStatus::Ng,
                "User-defined function contains illegal return type.".to_string(),
            )
        };
        Ok(CheckResult::new(
            self.name(),
            status,
            ILLEGAL_RETURN_TYPE_SQL.to_string(),
            value,
        ))
    }
}
