use diesel::prelude::*;

use bistro_core::clients::Client;

#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::schema::clients)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite, diesel::pg::Pg))]
pub struct ClientDB {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub national_id: String,
    pub phone: String,
    pub email: String,
    pub password_hash: String,
    pub tags: Option<String>,
    pub created_at: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::clients)]
pub struct NewClientDB {
    pub first_name: String,
    pub last_name: String,
    pub national_id: String,
    pub phone: String,
    pub email: String,
    pub password_hash: String,
    pub tags: Option<String>,
    pub created_at: String,
}

impl From<ClientDB> for Client {
    fn from(db: ClientDB) -> Self {
        Self {
            id: db.id,
            first_name: db.first_name,
            last_name: db.last_name,
            national_id: db.national_id,
            phone: db.phone,
            email: db.email,
            password_hash: db.password_hash,
            tags: db.tags,
            created_at: db.created_at,
        }
    }
}

impl From<Client> for ClientDB {
    fn from(domain: Client) -> Self {
        Self {
            id: domain.id,
            first_name: domain.first_name,
            last_name: domain.last_name,
            national_id: domain.national_id,
            phone: domain.phone,
            email: domain.email,
            password_hash: domain.password_hash,
            tags: domain.tags,
            created_at: domain.created_at,
        }
    }
}
