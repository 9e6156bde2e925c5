//! WireGuard Peer Provisioning Module
//!
//! Clean Architecture structure:
//! - `domain/` - Site/Peer entities, address allocator, repository traits
//! - `application/` - Peer create/delete/list use cases
//! - `infra/` - Postgres repository, `wg` control-surface adapter
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Model
//! Peer rows in the datastore are the desired state; the live WireGuard
//! interface is a derived projection of them. Creation commits the row
//! first, then applies it live, compensating with a delete if the live
//! apply fails. Deletion removes live state best-effort and always
//! forgets the row, accepting a possible stale live entry over desired
//! state that can never be cleaned.

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


// Re-exports for convenience
pub use application::config::WgConfig;
pub use error::{WgError, WgResult};
pub use infra::control::WgControl;
pub use infra::postgres::PgWgRepository;
pub use presentation::router::wg_router;
