//! Application Layer
//!
//! Use cases orchestrating peer provisioning against the datastore and
//! the live control surface.

pub mod config;
pub mod create_peer;
pub mod delete_peer;
pub mod list_peers;

pub use create_peer::{CreatePeerInput, CreatePeerUseCase};
pub use delete_peer::DeletePeerUseCase;
pub use list_peers::{ListPeersUseCase, PeerStatusView};
