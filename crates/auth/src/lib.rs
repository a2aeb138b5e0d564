//! Identity: users, roles, password hashing, and session tokens.
//!
//! The session model is deliberately explicit: login issues an opaque token
//! that is stored server-side and passed back as a `Bearer` header. There is
//! no ambient, framework-managed session state.

pub mod password;
pub mod role;
pub mod session;
pub mod user;

pub use role::Role;
pub use session::{Session, SessionStore, SessionToken};
pub use user::{NewUser, User};
