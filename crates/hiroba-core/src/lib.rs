//! Core types and trait definitions for the Hiroba community forum.
//!
//! Holds the post lifecycle rules, origin anonymisation, input validation,
//! and the store traits. No HTTP or database dependencies live here.

// Store impls use `async fn`; the traits spell out the `Send` bounds.
#![allow(async_fn_in_trait)]

pub mod clock;
pub mod comment;
pub mod error;
pub mod lifecycle;
pub mod notification;
pub mod origin;
pub mod post;
pub mod store;
pub mod user;

pub use error::{DomainError, Error, Result, ValidationError};
