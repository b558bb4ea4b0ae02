//! Domain layer - Account records and value objects.
//!
//! This crate contains the in-memory shapes of the records the user store
//! persists. It has no storage dependencies; the stored-document decoration
//! (kind discriminator, reference lists) lives with the repository.

pub mod address;
pub mod card;
pub mod constants;
pub mod error;
pub mod id;
pub mod password;
pub mod user;

pub use address::Address;
pub use card::Card;
pub use constants::*;
pub use error::{DomainError, DomainResult};
pub use id::RecordId;
pub use password::Password;
pub use user::User;
