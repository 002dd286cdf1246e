use diesel::prelude::*;

use bistro_core::favorites::Favorite;

#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::schema::favorites)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite, diesel::pg::Pg))]
pub struct FavoriteDB {
    pub id: i32,
    pub client_id: i32,
    pub restaurant_id: i32,
    pub created_at: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::favorites)]
pub struct NewFavoriteDB {
    pub client_id: i32,
    pub restaurant_id: i32,
    pub created_at: String,
}

impl From<FavoriteDB> for Favorite {
    fn from(db: FavoriteDB) -> Self {
        Self {
            id: db.id,
            client_id: db.client_id,
            restaurant_id: db.restaurant_id,
            created_at: db.created_at,
        }
    }
}

impl From<Favorite> for FavoriteDB {
    fn from(domain: Favorite) -> Self {
        Self {
            id: domain.id,
            client_id: domain.client_id,
            restaurant_id: domain.restaurant_id,
            created_at: domain.created_at,
        }
    }
}
