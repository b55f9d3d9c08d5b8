//! HTTP inbound adapter exposing the REST endpoints under `/api/v1`.

pub mod complaints;
pub mod dto;
pub mod error;
pub mod health;
pub mod messages;
pub mod notifications;
pub mod session;
pub mod session_config;
pub mod state;
pub mod technical_team;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;

pub use error::ApiResult;
