use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use log::debug;

use bistro_core::errors::{Error, Result, ValidationError};
use bistro_core::restaurants::{
    NewRestaurant, Restaurant, RestaurantQuery, RestaurantRepositoryTrait, RestaurantSummary,
};
use bistro_core::tags::{normalize_tags, parse_tags};

use super::model::{NewRestaurantDB, RestaurantDB};
use super::summary::{load_summaries, SummaryFilter, SummaryOrder};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::restaurants;
use crate::schema::restaurants::dsl::*;

pub struct RestaurantRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl RestaurantRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        RestaurantRepository { pool, writer }
    }
}

#[async_trait]
impl RestaurantRepositoryTrait for RestaurantRepository {
    async fn register(&self, new_restaurant: NewRestaurant) -> Result<Restaurant> {
        new_restaurant.validate()?;
        let new_db = NewRestaurantDB {
            name: new_restaurant.name.trim().to_string(),
            tax_id: new_restaurant.tax_id.trim().to_string(),
            email: new_restaurant.email.trim().to_string(),
            password_hash: new_restaurant.password_hash,
            tags: Some(normalize_tags(&new_restaurant.tags)),
            created_at: Utc::now().to_rfc3339(),
            address: new_restaurant.address,
            phone: new_restaurant.phone,
        };

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Restaurant> {
                let existing = restaurants
                    .filter(email.eq(&new_db.email))
                    .select(id)
                    .first::<i32>(conn)
                    .optional()
                    .map_err(StorageError::from)?;
                if existing.is_some() {
                    return Err(ValidationError::AlreadyRegistered("email").into());
                }

                let created = diesel::insert_into(restaurants::table)
                    .values(&new_db)
                    .returning(RestaurantDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                debug!("Registered restaurant {}", created.id);
                Ok(Restaurant::from(created))
            })
            .await
    }

    fn get_by_id(&self, restaurant_id: i32) -> Result<Option<Restaurant>> {
        let mut conn = get_connection(&self.pool)?;
        let found = restaurants
            .find(restaurant_id)
            .select(RestaurantDB::as_select())
            .first::<RestaurantDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(found.map(Restaurant::from))
    }

    fn get_by_email(&self, restaurant_email: &str) -> Result<Option<Restaurant>> {
        let mut conn = get_connection(&self.pool)?;
        let found = restaurants
            .filter(email.eq(restaurant_email.trim()))
            .select(RestaurantDB::as_select())
            .first::<RestaurantDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(found.map(Restaurant::from))
    }

    fn search(&self, query: &RestaurantQuery) -> Result<Vec<RestaurantSummary>> {
        let mut conn = get_connection(&self.pool)?;
        let search_term = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty());

        let (filter, order) = match (query.id, search_term) {
            (Some(restaurant_id), _) => (SummaryFilter::Id(restaurant_id), SummaryOrder::Id),
            (None, Some(term)) => (SummaryFilter::NameContains(term), SummaryOrder::Id),
            (None, None) if query.random => (SummaryFilter::All, SummaryOrder::Random),
            (None, None) => (SummaryFilter::All, SummaryOrder::Id),
        };
        load_summaries(&mut conn, filter, order, query.limit)
    }

    fn get_tags(&self, restaurant_id: i32) -> Result<Vec<String>> {
        let mut conn = get_connection(&self.pool)?;
        let stored = restaurants
            .find(restaurant_id)
            .select(tags)
            .first::<Option<String>>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .ok_or_else(|| Error::not_found(format!("Restaurant {} not found", restaurant_id)))?;
        Ok(stored.as_deref().map(parse_tags).unwrap_or_default())
    }

    async fn delete(&self, restaurant_id: i32) -> Result<usize> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                diesel::delete(restaurants.find(restaurant_id))
                    .execute(conn)
                    .map_err(|e| StorageError::from(e).into())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reviews::ReviewRepository;
    use crate::test_support::setup_db;
    use bistro_core::errors::DatabaseError;
    use bistro_core::reviews::{NewReview, ReviewRepositoryTrait};

    fn new_restaurant(name_value: &str, email_value: &str) -> NewRestaurant {
        NewRestaurant {
            name: name_value.to_string(),
            tax_id: "12.345.678/0001-90".to_string(),
            address: Some("Rua Augusta, 100".to_string()),
            phone: None,
            email: email_value.to_string(),
            password_hash: "$argon2id$hash".to_string(),
            tags: "pizza, italian, pasta, wine, family".to_string(),
        }
    }

    #[tokio::test]
    async fn register_normalizes_and_rejects_duplicate_emails() {
        let (_dir, pool, writer) = setup_db();
        let repo = RestaurantRepository::new(pool, writer);

        let created = repo
            .register(new_restaurant(" Cantina ", "owner@cantina.test"))
            .await
            .expect("register");
        assert_eq!(created.name, "Cantina");
        assert_eq!(
            created.tags.as_deref(),
            Some("pizza,italian,pasta,wine,family")
        );

        let duplicate = repo
            .register(new_restaurant("Other", "owner@cantina.test"))
            .await;
        assert!(matches!(
            duplicate,
            Err(Error::Validation(ValidationError::AlreadyRegistered("email")))
        ));

        let by_email = repo
            .get_by_email("owner@cantina.test")
            .expect("query")
            .expect("found");
        assert_eq!(by_email.id, created.id);
        assert!(repo.get_by_id(created.id + 100).expect("query").is_none());
    }

    #[tokio::test]
    async fn register_requires_five_tags() {
        let (_dir, pool, writer) = setup_db();
        let repo = RestaurantRepository::new(pool, writer);
        let mut restaurant = new_restaurant("Cantina", "owner@cantina.test");
        restaurant.tags = "pizza,pasta".to_string();

        let result = repo.register(restaurant).await;

        assert!(matches!(
            result,
            Err(Error::Validation(ValidationError::NotEnoughTags { actual: 2, .. }))
        ));
    }

    #[tokio::test]
    async fn search_aggregates_reviews_and_filters_by_name() {
        let (_dir, pool, writer) = setup_db();
        let repo = RestaurantRepository::new(Arc::clone(&pool), writer.clone());
        let reviews = ReviewRepository::new(pool, writer);

        let cantina = repo
            .register(new_restaurant("Cantina", "a@x.test"))
            .await
            .expect("register");
        repo.register(new_restaurant("Sushi Bar", "b@x.test"))
            .await
            .expect("register");
        for rating in [4, 5, 4] {
            reviews
                .submit(NewReview {
                    restaurant_id: cantina.id,
                    reviewer_name: "Ana".to_string(),
                    rating,
                    review_text: None,
                })
                .await
                .expect("review");
        }

        let all = repo.search(&RestaurantQuery::default()).expect("search");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, cantina.id);
        assert_eq!(all[0].average_rating, 4.3);
        assert_eq!(all[0].review_count, 3);
        assert_eq!(all[1].average_rating, 0.0);
        assert_eq!(all[1].review_count, 0);

        let found = repo
            .search(&RestaurantQuery {
                search: Some("sushi".to_string()),
                ..Default::default()
            })
            .expect("search");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Sushi Bar");

        let limited = repo
            .search(&RestaurantQuery {
                random: true,
                limit: Some(1),
                ..Default::default()
            })
            .expect("search");
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn get_tags_reports_missing_restaurants() {
        let (_dir, pool, writer) = setup_db();
        let repo = RestaurantRepository::new(pool, writer);
        let created = repo
            .register(new_restaurant("Cantina", "a@x.test"))
            .await
            .expect("register");

        assert_eq!(repo.get_tags(created.id).expect("tags").len(), 5);
        assert!(matches!(
            repo.get_tags(created.id + 1),
            Err(Error::Database(DatabaseError::NotFound(_)))
        ));
    }
}
