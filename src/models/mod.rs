//! Data models for the Ironpress system.

pub mod content;
pub mod term;
pub mod user;

pub use content::{slug_from_title, Content, ContentStatus, ContentType};
pub use term::{Taxonomy, Term};
pub use user::{nicename_from, User, UserView};
