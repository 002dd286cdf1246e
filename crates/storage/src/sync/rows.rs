/// Loads every row of a replicated table, ordered by id, as `SyncRow`s.
///
/// Expands against whichever Diesel connection it is given, so the local and
/// remote stores share one definition. Evaluates to `QueryResult<Vec<SyncRow>>`.
macro_rules! load_sync_rows {
    ($conn:expr, $table:expr) => {{
        use bistro_core::sync::{SyncRow, SyncTable};
        use diesel::prelude::*;
        use $crate::clients::ClientDB;
        use $crate::favorites::FavoriteDB;
        use $crate::reports::ReportDB;
        use $crate::restaurants::RestaurantDB;
        use $crate::reviews::ReviewDB;
        use $crate::schema::{clients, favorites, reports, restaurants, reviews};

        match $table {
            SyncTable::Restaurants => restaurants::table
                .select(RestaurantDB::as_select())
                .order(restaurants::id.asc())
                .load::<RestaurantDB>($conn)
                .map(|rows| rows.into_iter().map(|r| SyncRow::Restaurant(r.into())).collect::<Vec<_>>()),
            SyncTable::Clients => clients::table
                .select(ClientDB::as_select())
                .order(clients::id.asc())
                .load::<ClientDB>($conn)
                .map(|rows| rows.into_iter().map(|r| SyncRow::Client(r.into())).collect::<Vec<_>>()),
            SyncTable::Favorites => favorites::table
                .select(FavoriteDB::as_select())
                .order(favorites::id.asc())
                .load::<FavoriteDB>($conn)
                .map(|rows| rows.into_iter().map(|r| SyncRow::Favorite(r.into())).collect::<Vec<_>>()),
            SyncTable::Reviews => reviews::table
                .select(ReviewDB::as_select())
                .order(reviews::id.asc())
                .load::<ReviewDB>($conn)
                .map(|rows| rows.into_iter().map(|r| SyncRow::Review(r.into())).collect::<Vec<_>>()),
            SyncTable::Reports => reports::table
                .select(ReportDB::as_select())
                .order(reports::id.asc())
                .load::<ReportDB>($conn)
                .map(|rows| rows.into_iter().map(|r| SyncRow::Report(r.into())).collect::<Vec<_>>()),
        }
    }};
}

pub(crate) use load_sync_rows;
