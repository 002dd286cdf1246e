//! Restaurant listings with review aggregates.

use diesel::prelude::*;
use diesel::sql_types::{BigInt, Double, Integer, Nullable, Text};
use diesel::sqlite::{Sqlite, SqliteConnection};

use bistro_core::restaurants::{round_rating, RestaurantSummary};
use bistro_core::Result;

use crate::errors::StorageError;

const SUMMARY_SELECT: &str = "SELECT r.id AS id, TRIM(r.name) AS name, r.address AS address, \
     r.phone AS phone, r.tags AS tags, \
     CAST(COALESCE(AVG(v.rating), 0) AS REAL) AS average_rating, \
     COUNT(v.id) AS review_count \
     FROM restaurants r LEFT JOIN reviews v ON v.restaurant_id = r.id";

#[derive(QueryableByName)]
struct RestaurantSummaryRow {
    #[diesel(sql_type = Integer)]
    id: i32,
    #[diesel(sql_type = Text)]
    name: String,
    #[diesel(sql_type = Nullable<Text>)]
    address: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    phone: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    tags: Option<String>,
    #[diesel(sql_type = Double)]
    average_rating: f64,
    #[diesel(sql_type = BigInt)]
    review_count: i64,
}

impl From<RestaurantSummaryRow> for RestaurantSummary {
    fn from(row: RestaurantSummaryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            address: row.address,
            phone: row.phone,
            tags: row.tags,
            average_rating: round_rating(row.average_rating),
            review_count: row.review_count,
        }
    }
}

pub(crate) enum SummaryFilter<'a> {
    All,
    Id(i32),
    NameContains(&'a str),
    FavoritesOf(i32),
}

pub(crate) enum SummaryOrder {
    Id,
    Random,
}

fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

pub(crate) fn load_summaries(
    conn: &mut SqliteConnection,
    filter: SummaryFilter<'_>,
    order: SummaryOrder,
    limit: Option<i64>,
) -> Result<Vec<RestaurantSummary>> {
    let query = diesel::sql_query(SUMMARY_SELECT).into_boxed::<Sqlite>();
    let query = match filter {
        SummaryFilter::All => query,
        SummaryFilter::Id(restaurant_id) => query
            .sql(" WHERE r.id = ?")
            .bind::<Integer, _>(restaurant_id),
        // LIKE is case-insensitive for ASCII in SQLite.
        SummaryFilter::NameContains(term) => query
            .sql(" WHERE r.name LIKE ? ESCAPE '\\'")
            .bind::<Text, _>(like_pattern(term)),
        SummaryFilter::FavoritesOf(client_id) => query
            .sql(" WHERE r.id IN (SELECT f.restaurant_id FROM favorites f WHERE f.client_id = ?)")
            .bind::<Integer, _>(client_id),
    };
    let query = query.sql(" GROUP BY r.id");
    let query = match order {
        SummaryOrder::Id => query.sql(" ORDER BY r.id"),
        SummaryOrder::Random => query.sql(" ORDER BY RANDOM()"),
    };
    let query = match limit {
        Some(limit) => query.sql(" LIMIT ?").bind::<BigInt, _>(limit),
        None => query,
    };

    let rows = query
        .load::<RestaurantSummaryRow>(conn)
        .map_err(StorageError::from)?;
    Ok(rows.into_iter().map(RestaurantSummary::from).collect())
}
