use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use bistro_core::errors::Result;
use bistro_core::reports::{
    NewReport, Report, ReportHistoryEntry, ReportRepositoryTrait, REPORT_HISTORY_LIMIT,
};

use super::model::{NewReportDB, ReportDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::reports;

pub struct ReportRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl ReportRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        ReportRepository { pool, writer }
    }
}

#[async_trait]
impl ReportRepositoryTrait for ReportRepository {
    async fn create(&self, new_report: NewReport) -> Result<Report> {
        let new_db = NewReportDB {
            restaurant_id: new_report.restaurant_id,
            analysis: new_report.analysis,
            created_at: Utc::now().to_rfc3339(),
        };
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Report> {
                let created = diesel::insert_into(reports::table)
                    .values(&new_db)
                    .returning(ReportDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(Report::from(created))
            })
            .await
    }

    fn history(&self, restaurant_id: i32) -> Result<Vec<ReportHistoryEntry>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = reports::table
            .filter(reports::restaurant_id.eq(restaurant_id))
            .order((reports::created_at.desc(), reports::id.desc()))
            .limit(REPORT_HISTORY_LIMIT)
            .select((reports::id, reports::created_at))
            .load::<(i32, String)>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows
            .into_iter()
            .map(|(id, date)| ReportHistoryEntry { id, date })
            .collect())
    }

    fn get(&self, report_id: i32) -> Result<Option<Report>> {
        let mut conn = get_connection(&self.pool)?;
        let found = reports::table
            .find(report_id)
            .select(ReportDB::as_select())
            .first::<ReportDB>(&mut conn)
            .optional()
            .into_core()?;
        Ok(found.map(Report::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::restaurants::RestaurantRepository;
    use crate::test_support::setup_db;
    use bistro_core::restaurants::{NewRestaurant, RestaurantRepositoryTrait};

    #[tokio::test]
    async fn history_keeps_the_latest_ten() {
        let (_dir, pool, writer) = setup_db();
        let restaurants = RestaurantRepository::new(Arc::clone(&pool), writer.clone());
        let repo = ReportRepository::new(pool, writer);
        let restaurant = restaurants
            .register(NewRestaurant {
                name: "Cantina".to_string(),
                tax_id: "1".to_string(),
                address: None,
                phone: None,
                email: "owner@cantina.test".to_string(),
                password_hash: "h".to_string(),
                tags: "a,b,c,d,e".to_string(),
            })
            .await
            .expect("restaurant");

        let mut last = None;
        for n in 0..12 {
            let report = repo
                .create(NewReport {
                    restaurant_id: restaurant.id,
                    analysis: format!("analysis {}", n),
                })
                .await
                .expect("create");
            last = Some(report);
        }
        let last = last.expect("created");

        let history = repo.history(restaurant.id).expect("history");
        assert_eq!(history.len(), 10);
        assert_eq!(history[0].id, last.id);
        assert_eq!(history[0].date, last.created_at);

        let fetched = repo.get(last.id).expect("get").expect("found");
        assert_eq!(fetched.analysis, "analysis 11");
        assert!(repo.get(last.id + 1).expect("get").is_none());
    }
}
