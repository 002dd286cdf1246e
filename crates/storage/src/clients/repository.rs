use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use bistro_core::clients::{Client, ClientRepositoryTrait, NewClient};
use bistro_core::errors::{Result, ValidationError};
use bistro_core::tags::normalize_tags;

use super::model::{ClientDB, NewClientDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::clients;
use crate::schema::clients::dsl::*;

pub struct ClientRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl ClientRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        ClientRepository { pool, writer }
    }
}

#[async_trait]
impl ClientRepositoryTrait for ClientRepository {
    async fn register(&self, new_client: NewClient) -> Result<Client> {
        new_client.validate()?;
        let new_db = NewClientDB {
            first_name: new_client.first_name.trim().to_string(),
            last_name: new_client.last_name.trim().to_string(),
            national_id: new_client.national_id.trim().to_string(),
            phone: new_client.phone.trim().to_string(),
            email: new_client.email.trim().to_string(),
            password_hash: new_client.password_hash,
            tags: Some(normalize_tags(&new_client.tags)),
            created_at: Utc::now().to_rfc3339(),
        };

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Client> {
                let email_taken = clients
                    .filter(email.eq(&new_db.email))
                    .select(id)
                    .first::<i32>(conn)
                    .optional()
                    .map_err(StorageError::from)?
                    .is_some();
                if email_taken {
                    return Err(ValidationError::AlreadyRegistered("email").into());
                }
                let national_id_taken = clients
                    .filter(national_id.eq(&new_db.national_id))
                    .select(id)
                    .first::<i32>(conn)
                    .optional()
                    .map_err(StorageError::from)?
                    .is_some();
                if national_id_taken {
                    return Err(ValidationError::AlreadyRegistered("national_id").into());
                }

                let created = diesel::insert_into(clients::table)
                    .values(&new_db)
                    .returning(ClientDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(Client::from(created))
            })
            .await
    }

    fn get_by_id(&self, client_id: i32) -> Result<Option<Client>> {
        let mut conn = get_connection(&self.pool)?;
        let found = clients
            .find(client_id)
            .select(ClientDB::as_select())
            .first::<ClientDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(found.map(Client::from))
    }

    fn get_by_email(&self, client_email: &str) -> Result<Option<Client>> {
        let mut conn = get_connection(&self.pool)?;
        let found = clients
            .filter(email.eq(client_email.trim()))
            .select(ClientDB::as_select())
            .first::<ClientDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(found.map(Client::from))
    }

    async fn delete(&self, client_id: i32) -> Result<usize> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                diesel::delete(clients.find(client_id))
                    .execute(conn)
                    .map_err(|e| StorageError::from(e).into())
            })
            .await
    }
}
