use async_trait::async_trait;

use super::{NewReport, Report, ReportHistoryEntry};
use crate::errors::Result;

#[async_trait]
pub trait ReportRepositoryTrait: Send + Sync {
    async fn create(&self, new_report: NewReport) -> Result<Report>;
    /// Latest `REPORT_HISTORY_LIMIT` reports for a restaurant, newest first.
    fn history(&self, restaurant_id: i32) -> Result<Vec<ReportHistoryEntry>>;
    fn get(&self, report_id: i32) -> Result<Option<Report>>;
}
