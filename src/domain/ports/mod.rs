//! Port traits implemented outside this crate.

pub mod auth;

pub use auth::AuthScopeChecker;
