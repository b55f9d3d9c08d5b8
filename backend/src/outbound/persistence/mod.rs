//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain repository ports backed by
//! PostgreSQL through `diesel-async` and `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: repositories translate between Diesel rows and domain
//!   types. Stored rows are rebuilt through the validating domain
//!   constructors, so a corrupt row surfaces as a query error.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Atomic lifecycle commits**: complaint transitions, point awards and
//!   their notifications share one transaction guarded by the expected
//!   status and volunteer.
//!
//! # Example
//!
//! ```ignore
//! use helpdesk::outbound::persistence::{DbPool, DieselComplaintRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/helpdesk")).await?;
//! let complaints = DieselComplaintRepository::new(pool);
//! ```

mod diesel_basic_error_mapping;
mod diesel_complaint_repository;
mod diesel_message_repository;
mod diesel_notification_repository;
mod diesel_technical_team_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_complaint_repository::DieselComplaintRepository;
pub use diesel_message_repository::DieselMessageRepository;
pub use diesel_notification_repository::DieselNotificationRepository;
pub use diesel_technical_team_repository::DieselTechnicalTeamRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
