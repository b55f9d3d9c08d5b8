//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversion into domain types happens in the
//! repository modules, through the validating domain constructors.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{complaints, messages, notifications, technical_team, users};

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub department: Option<String>,
    pub points: i32,
}

/// A user row together with its password digest, for login lookups.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CredentialRow {
    #[diesel(embed)]
    pub user: UserRow,
    pub password_digest: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub email: &'a str,
    pub password_digest: &'a str,
    pub role: &'a str,
    pub department: Option<&'a str>,
    pub points: i32,
}

/// Profile fields a user may change. Points are deliberately absent.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct UserProfileUpdate<'a> {
    pub name: &'a str,
    pub department: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// Complaints
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = complaints)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ComplaintRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: Option<String>,
    pub difficulty: String,
    pub emergency: bool,
    pub status: String,
    pub raised_by: Uuid,
    pub volunteer_id: Option<Uuid>,
    pub volunteer_name: Option<String>,
    pub fix_till_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = complaints)]
pub(crate) struct NewComplaintRow<'a> {
    pub id: Uuid,
    pub title: &'a str,
    pub description: &'a str,
    pub category: &'a str,
    pub location: Option<&'a str>,
    pub difficulty: &'a str,
    pub emergency: bool,
    pub status: &'a str,
    pub raised_by: Uuid,
    pub volunteer_id: Option<Uuid>,
    pub volunteer_name: Option<&'a str>,
    pub fix_till_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Lifecycle columns written by a committed transition.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = complaints)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ComplaintLifecycleUpdate<'a> {
    pub status: &'a str,
    pub volunteer_id: Option<Uuid>,
    pub volunteer_name: Option<&'a str>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Descriptive columns a raiser may edit.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = complaints)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ComplaintDetailsUpdate<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub location: Option<&'a str>,
    pub emergency: bool,
    pub fix_till_date: NaiveDate,
}

// ---------------------------------------------------------------------------
// Notifications and messages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct NotificationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub message: String,
    pub complaint_id: Option<Uuid>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MessageRow {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub complaint_id: Option<Uuid>,
    pub content: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Technical team
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = technical_team)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TechnicalTeamRow {
    pub user_id: Uuid,
    pub available: bool,
}
