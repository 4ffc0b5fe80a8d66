//! Route capability guard
//!
//! Decides whether a navigation may proceed based on the current session
//! and the capability the route declares. Mirrors the server's capability
//! model but only for UI gating; the server remains the authority.

use crate::client::session::SessionStore;

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// Proceed to the route.
    Granted,
    /// Authenticated but lacking the capability; send to the landing page.
    Denied,
    /// Not authenticated; send to login with the original path attached.
    Login {
        /// URL-encoded path to return to after login
        return_url: String,
    },
}

/// Check whether the current session may enter a route.
///
/// `required` is the capability the route declares, if any. A route with
/// no declared capability only needs a session.
pub fn check_route(store: &SessionStore, required: Option<&str>, path: &str) -> Access {
    let session = match store.current() {
        Some(session) => session,
        None => {
            return Access::Login {
                return_url: urlencoding::encode(path).into_owned(),
            }
        }
    };

    match required {
        None => Access::Granted,
        Some(capability) if session.has_capability(capability) => Access::Granted,
        Some(_) => Access::Denied,
    }
}
