use diesel::prelude::*;

use bistro_core::restaurants::Restaurant;

#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::schema::restaurants)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite, diesel::pg::Pg))]
pub struct RestaurantDB {
    pub id: i32,
    pub name: String,
    pub tax_id: String,
    pub email: String,
    pub password_hash: String,
    pub tags: Option<String>,
    pub created_at: String,
    pub address: Option<String>,
    pub phone: Option<String>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::restaurants)]
pub struct NewRestaurantDB {
    pub name: String,
    pub tax_id: String,
    pub email: String,
    pub password_hash: String,
    pub tags: Option<String>,
    pub created_at: String,
    pub address: Option<String>,
    pub phone: Option<String>,
}

impl From<RestaurantDB> for Restaurant {
    fn from(db: RestaurantDB) -> Self {
        Self {
            id: db.id,
            name: db.name,
            tax_id: db.tax_id,
            address: db.address,
            phone: db.phone,
            email: db.email,
            password_hash: db.password_hash,
            tags: db.tags,
            created_at: db.created_at,
        }
    }
}

impl From<Restaurant> for RestaurantDB {
    fn from(domain: Restaurant) -> Self {
        Self {
            id: domain.id,
            name: domain.name,
            tax_id: domain.tax_id,
            email: domain.email,
            password_hash: domain.password_hash,
            tags: domain.tags,
            created_at: domain.created_at,
            address: domain.address,
            phone: domain.phone,
        }
    }
}
