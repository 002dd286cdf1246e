use diesel::prelude::*;

use bistro_core::reviews::Review;

#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::schema::reviews)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite, diesel::pg::Pg))]
pub struct ReviewDB {
    pub id: i32,
    pub restaurant_id: i32,
    pub reviewer_name: String,
    pub rating: i32,
    pub review_text: Option<String>,
    pub created_at: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::reviews)]
pub struct NewReviewDB {
    pub restaurant_id: i32,
    pub reviewer_name: String,
    pub rating: i32,
    pub review_text: Option<String>,
    pub created_at: String,
}

impl From<ReviewDB> for Review {
    fn from(db: ReviewDB) -> Self {
        Self {
            id: db.id,
            restaurant_id: db.restaurant_id,
            reviewer_name: db.reviewer_name,
            rating: db.rating,
            review_text: db.review_text,
            created_at: db.created_at,
        }
    }
}

impl From<Review> for ReviewDB {
    fn from(domain: Review) -> Self {
        Self {
            id: domain.id,
            restaurant_id: domain.restaurant_id,
            reviewer_name: domain.reviewer_name,
            rating: domain.rating,
            review_text: domain.review_text,
            created_at: domain.created_at,
        }
    }
}
