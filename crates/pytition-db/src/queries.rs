//! Database query functions organized by domain.

pub mod organizations;
pub mod ownership;
pub mod permissions;
pub mod petitions;
pub mod signatures;
pub mod templates;
pub mod users;
