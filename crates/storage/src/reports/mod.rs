mod model;
mod repository;

pub use model::{NewReportDB, ReportDB};
pub use repository::ReportRepository;
