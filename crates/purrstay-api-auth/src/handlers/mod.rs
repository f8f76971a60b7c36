//! HTTP handlers.

pub mod login;
pub mod twofa;
