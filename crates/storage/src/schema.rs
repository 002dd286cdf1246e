// Diesel table definitions shared by the local SQLite and remote PostgreSQL stores.

diesel::table! {
    restaurants (id) {
        id -> Integer,
        name -> Text,
        tax_id -> Text,
        email -> Text,
        password_hash -> Text,
        tags -> Nullable<Text>,
        created_at -> Text,
        address -> Nullable<Text>,
        phone -> Nullable<Text>,
    }
}

diesel::table! {
    clients (id) {
        id -> Integer,
        first_name -> Text,
        last_name -> Text,
        national_id -> Text,
        phone -> Text,
        email -> Text,
        password_hash -> Text,
        tags -> Nullable<Text>,
        created_at -> Text,
    }
}

diesel::table! {
    favorites (id) {
        id -> Integer,
        client_id -> Integer,
        restaurant_id -> Integer,
        created_at -> Text,
    }
}

diesel::table! {
    reviews (id) {
        id -> Integer,
        restaurant_id -> Integer,
        reviewer_name -> Text,
        rating -> Integer,
        review_text -> Nullable<Text>,
        created_at -> Text,
    }
}

diesel::table! {
    reports (id) {
        id -> Integer,
        restaurant_id -> Integer,
        analysis -> Text,
        created_at -> Text,
    }
}

diesel::joinable!(favorites -> clients (client_id));
diesel::joinable!(favorites -> restaurants (restaurant_id));
diesel::joinable!(reviews -> restaurants (restaurant_id));
diesel::joinable!(reports -> restaurants (restaurant_id));

diesel::allow_tables_to_appear_in_same_query!(clients, favorites, reports, restaurants, reviews,);
