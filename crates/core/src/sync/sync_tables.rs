//! Static registry of replicated tables and their natural keys.

use serde::{Deserialize, Serialize};

use crate::clients::Client;
use crate::favorites::Favorite;
use crate::reports::Report;
use crate::restaurants::Restaurant;
use crate::reviews::Review;

/// Tables replicated between the local and the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncTable {
    Restaurants,
    Clients,
    Favorites,
    Reviews,
    Reports,
}

impl SyncTable {
    /// Replication order. Parents come before the tables referencing them.
    pub const ORDER: [SyncTable; 5] = [
        SyncTable::Restaurants,
        SyncTable::Clients,
        SyncTable::Favorites,
        SyncTable::Reviews,
        SyncTable::Reports,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Restaurants => "restaurants",
            Self::Clients => "clients",
            Self::Favorites => "favorites",
            Self::Reviews => "reviews",
            Self::Reports => "reports",
        }
    }

    /// Columns used as the upsert conflict target on export.
    pub fn natural_key(&self) -> &'static [&'static str] {
        match self {
            Self::Restaurants => &["email"],
            Self::Clients => &["national_id"],
            Self::Favorites => &["client_id", "restaurant_id"],
            Self::Reviews | Self::Reports => &["id"],
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Self::Restaurants => &[
                "id",
                "name",
                "tax_id",
                "email",
                "password_hash",
                "tags",
                "created_at",
                "address",
                "phone",
            ],
            Self::Clients => &[
                "id",
                "first_name",
                "last_name",
                "national_id",
                "phone",
                "email",
                "password_hash",
                "tags",
                "created_at",
            ],
            Self::Favorites => &["id", "client_id", "restaurant_id", "created_at"],
            Self::Reviews => &[
                "id",
                "restaurant_id",
                "reviewer_name",
                "rating",
                "review_text",
                "created_at",
            ],
            Self::Reports => &["id", "restaurant_id", "analysis", "created_at"],
        }
    }

    /// Columns overwritten when an upsert hits the natural key.
    pub fn update_columns(&self) -> Vec<&'static str> {
        let key = self.natural_key();
        self.columns()
            .iter()
            .copied()
            .filter(|column| !key.contains(column))
            .collect()
    }
}

impl std::fmt::Display for SyncTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Value identifying "the same logical row" across stores.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NaturalKey {
    Email(String),
    NationalId(String),
    Pair { client_id: i32, restaurant_id: i32 },
    Id(i32),
}

/// One replicated row, carrying every column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncRow {
    Restaurant(Restaurant),
    Client(Client),
    Favorite(Favorite),
    Review(Review),
    Report(Report),
}

impl SyncRow {
    pub fn table(&self) -> SyncTable {
        match self {
            Self::Restaurant(_) => SyncTable::Restaurants,
            Self::Client(_) => SyncTable::Clients,
            Self::Favorite(_) => SyncTable::Favorites,
            Self::Review(_) => SyncTable::Reviews,
            Self::Report(_) => SyncTable::Reports,
        }
    }

    pub fn id(&self) -> i32 {
        match self {
            Self::Restaurant(row) => row.id,
            Self::Client(row) => row.id,
            Self::Favorite(row) => row.id,
            Self::Review(row) => row.id,
            Self::Report(row) => row.id,
        }
    }

    pub fn natural_key(&self) -> NaturalKey {
        match self {
            Self::Restaurant(row) => NaturalKey::Email(row.email.clone()),
            Self::Client(row) => NaturalKey::NationalId(row.national_id.clone()),
            Self::Favorite(row) => NaturalKey::Pair {
                client_id: row.client_id,
                restaurant_id: row.restaurant_id,
            },
            Self::Review(row) => NaturalKey::Id(row.id),
            Self::Report(row) => NaturalKey::Id(row.id),
        }
    }

    /// Short label for log lines, never containing secrets.
    pub fn describe(&self) -> String {
        format!("{}#{} ({:?})", self.table(), self.id(), self.natural_key())
    }
}
