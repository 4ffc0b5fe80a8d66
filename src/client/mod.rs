//! Embeddable admin client
//!
//! A Rust counterpart of the browser session layer an admin frontend would
//! carry: an observable session store backed by pluggable token storage,
//! an HTTP client that enforces the 401 force-logout contract, and a route
//! guard for capability-gated navigation.

pub mod guard;
pub mod http;
pub mod session;

pub use guard::{check_route, Access};
pub use http::{ApiClient, ClientError};
pub use session::{decode_claims, MemoryTokenStorage, Session, SessionStore, TokenStorage};
