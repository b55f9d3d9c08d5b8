//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`) describe what the domain needs from storage;
//! each exposes a typed error enum declared with `define_port_error!`.
//! Driving ports (commands, queries, inboxes) are what inbound adapters call.

mod macros;
pub(crate) use macros::define_port_error;

mod complaint_command;
mod complaint_repository;
mod login_service;
mod message_repository;
mod messaging;
mod notification_inbox;
mod notification_repository;
mod technical_team_admin;
mod technical_team_repository;
mod user_accounts;
mod user_repository;

#[cfg(test)]
pub use complaint_command::{MockComplaintCommand, MockComplaintQuery};
pub use complaint_command::{ComplaintCommand, ComplaintQuery};
#[cfg(test)]
pub use complaint_repository::MockComplaintRepository;
pub use complaint_repository::{ComplaintRepository, ComplaintRepositoryError};
#[cfg(test)]
pub use login_service::MockLoginService;
pub use login_service::LoginService;
#[cfg(test)]
pub use message_repository::MockMessageRepository;
pub use message_repository::{MessageRepository, MessageRepositoryError};
#[cfg(test)]
pub use messaging::MockMessaging;
pub use messaging::{Messaging, SendMessageRequest};
#[cfg(test)]
pub use notification_inbox::MockNotificationInbox;
pub use notification_inbox::NotificationInbox;
#[cfg(test)]
pub use notification_repository::MockNotificationRepository;
pub use notification_repository::{NotificationRepository, NotificationRepositoryError};
#[cfg(test)]
pub use technical_team_admin::MockTechnicalTeamAdmin;
pub use technical_team_admin::{NewTechnicalMember, TechnicalTeamAdmin};
#[cfg(test)]
pub use technical_team_repository::MockTechnicalTeamRepository;
pub use technical_team_repository::{TechnicalTeamRepository, TechnicalTeamRepositoryError};
#[cfg(test)]
pub use user_accounts::MockUserAccounts;
pub use user_accounts::{Registration, UserAccounts};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{StoredCredentials, UserPersistenceError, UserRepository};
