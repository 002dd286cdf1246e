use diesel::prelude::*;

use bistro_core::reports::Report;

#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::schema::reports)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite, diesel::pg::Pg))]
pub struct ReportDB {
    pub id: i32,
    pub restaurant_id: i32,
    pub analysis: String,
    pub created_at: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::reports)]
pub struct NewReportDB {
    pub restaurant_id: i32,
    pub analysis: String,
    pub created_at: String,
}

impl From<ReportDB> for Report {
    fn from(db: ReportDB) -> Self {
        Self {
            id: db.id,
            restaurant_id: db.restaurant_id,
            analysis: db.analysis,
            created_at: db.created_at,
        }
    }
}

impl From<Report> for ReportDB {
    fn from(domain: Report) -> Self {
        Self {
            id: domain.id,
            restaurant_id: domain.restaurant_id,
            analysis: domain.analysis,
            created_at: domain.created_at,
        }
    }
}
