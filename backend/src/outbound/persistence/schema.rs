//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. When migrations
//! change, regenerate with `diesel print-schema` or update by hand.

diesel::table! {
    /// Accounts for students, technical staff and administrators.
    users (id) {
        id -> Uuid,
        name -> Varchar,
        /// Lowercased login identifier; unique.
        email -> Varchar,
        password_digest -> Text,
        role -> Varchar,
        /// Set for technical users only.
        department -> Nullable<Varchar>,
        /// Only ever changed by `points = points + delta`.
        points -> Int4,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    complaints (id) {
        id -> Uuid,
        title -> Varchar,
        description -> Text,
        category -> Varchar,
        location -> Nullable<Varchar>,
        difficulty -> Varchar,
        emergency -> Bool,
        status -> Varchar,
        raised_by -> Uuid,
        volunteer_id -> Nullable<Uuid>,
        volunteer_name -> Nullable<Varchar>,
        fix_till_date -> Date,
        created_at -> Timestamptz,
        resolved_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    notifications (id) {
        id -> Uuid,
        user_id -> Uuid,
        kind -> Varchar,
        message -> Varchar,
        complaint_id -> Nullable<Uuid>,
        read -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    messages (id) {
        id -> Uuid,
        sender_id -> Uuid,
        receiver_id -> Uuid,
        complaint_id -> Nullable<Uuid>,
        content -> Text,
        read -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    technical_team (user_id) {
        user_id -> Uuid,
        available -> Bool,
    }
}

diesel::joinable!(technical_team -> users (user_id));
diesel::joinable!(notifications -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    complaints,
    notifications,
    messages,
    technical_team,
);
