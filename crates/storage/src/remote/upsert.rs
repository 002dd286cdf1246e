//! Natural-key upserts against the remote store.
//!
//! Each statement inserts the full row and, when the table's natural key
//! already exists, overwrites every other column with the incoming values.

use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::query_builder::QueryFragment;
use diesel::query_dsl::methods::ExecuteDsl;
use diesel::upsert::excluded;

use bistro_core::sync::SyncRow;

use crate::clients::ClientDB;
use crate::favorites::FavoriteDB;
use crate::reports::ReportDB;
use crate::restaurants::RestaurantDB;
use crate::reviews::ReviewDB;
use crate::schema::{clients, favorites, reports, restaurants, reviews};

fn restaurant_upsert(row: RestaurantDB) -> impl ExecuteDsl<PgConnection> + QueryFragment<Pg> {
    diesel::insert_into(restaurants::table)
        .values(row)
        .on_conflict(restaurants::email)
        .do_update()
        .set((
            restaurants::id.eq(excluded(restaurants::id)),
            restaurants::name.eq(excluded(restaurants::name)),
            restaurants::tax_id.eq(excluded(restaurants::tax_id)),
            restaurants::password_hash.eq(excluded(restaurants::password_hash)),
            restaurants::tags.eq(excluded(restaurants::tags)),
            restaurants::created_at.eq(excluded(restaurants::created_at)),
            restaurants::address.eq(excluded(restaurants::address)),
            restaurants::phone.eq(excluded(restaurants::phone)),
        ))
}

fn client_upsert(row: ClientDB) -> impl ExecuteDsl<PgConnection> + QueryFragment<Pg> {
    diesel::insert_into(clients::table)
        .values(row)
        .on_conflict(clients::national_id)
        .do_update()
        .set((
            clients::id.eq(excluded(clients::id)),
            clients::first_name.eq(excluded(clients::first_name)),
            clients::last_name.eq(excluded(clients::last_name)),
            clients::phone.eq(excluded(clients::phone)),
            clients::email.eq(excluded(clients::email)),
            clients::password_hash.eq(excluded(clients::password_hash)),
            clients::tags.eq(excluded(clients::tags)),
            clients::created_at.eq(excluded(clients::created_at)),
        ))
}

fn favorite_upsert(row: FavoriteDB) -> impl ExecuteDsl<PgConnection> + QueryFragment<Pg> {
    diesel::insert_into(favorites::table)
        .values(row)
        .on_conflict((favorites::client_id, favorites::restaurant_id))
        .do_update()
        .set((
            favorites::id.eq(excluded(favorites::id)),
            favorites::created_at.eq(excluded(favorites::created_at)),
        ))
}

// TODO: key reviews and reports on an external identifier once clients send one;
// `id` only matches rows that were first created through this local store.
fn review_upsert(row: ReviewDB) -> impl ExecuteDsl<PgConnection> + QueryFragment<Pg> {
    diesel::insert_into(reviews::table)
        .values(row)
        .on_conflict(reviews::id)
        .do_update()
        .set((
            reviews::restaurant_id.eq(excluded(reviews::restaurant_id)),
            reviews::reviewer_name.eq(excluded(reviews::reviewer_name)),
            reviews::rating.eq(excluded(reviews::rating)),
            reviews::review_text.eq(excluded(reviews::review_text)),
            reviews::created_at.eq(excluded(reviews::created_at)),
        ))
}

fn report_upsert(row: ReportDB) -> impl ExecuteDsl<PgConnection> + QueryFragment<Pg> {
    diesel::insert_into(reports::table)
        .values(row)
        .on_conflict(reports::id)
        .do_update()
        .set((
            reports::restaurant_id.eq(excluded(reports::restaurant_id)),
            reports::analysis.eq(excluded(reports::analysis)),
            reports::created_at.eq(excluded(reports::created_at)),
        ))
}

pub(crate) fn upsert_row(conn: &mut PgConnection, row: SyncRow) -> QueryResult<usize> {
    match row {
        SyncRow::Restaurant(r) => ExecuteDsl::execute(restaurant_upsert(r.into()), conn),
        SyncRow::Client(c) => ExecuteDsl::execute(client_upsert(c.into()), conn),
        SyncRow::Favorite(f) => ExecuteDsl::execute(favorite_upsert(f.into()), conn),
        SyncRow::Review(r) => ExecuteDsl::execute(review_upsert(r.into()), conn),
        SyncRow::Report(r) => ExecuteDsl::execute(report_upsert(r.into()), conn),
    }
}
