//! Business logic services
//!
//! Services sit between the HTTP layer and the repositories. Each service
//! owns its error enum; the API layer maps those onto the JSON error
//! envelope.

pub mod auth;
pub mod content;
pub mod password;
pub mod term;
pub mod token;
pub mod users;

pub use auth::{AuthOutcome, AuthService, AuthServiceError, RegisterInput};
pub use content::{ContentService, ContentServiceError, CreateContentInput, UpdateContentInput};
pub use term::{CreateTermInput, TermService, TermServiceError, UpdateTermInput};
pub use token::{Claims, TokenService};
pub use users::{CreateUserInput, UpdateUserInput, UserAdminError, UserAdminService};
