//! Edraak Core - partner enrollment checks and University ID rules
//!
//! The platform's web layer hands requests to this crate and renders whatever
//! comes back. Storage, routing and templates stay with the host; course and
//! account lookups are injected through the traits in [`catalog`].
//!
//! # Architecture
//!
//! ```text
//! ForUs fields → signing (HMAC-SHA256) → validator (field rules) → CleanFields
//!                                              ↓
//!                                  FieldErrors → error redirect
//!
//! University IDs → conflicts (sort + mark) → MarkedUniversityId
//! ```
//!
//! # Guarantees
//!
//! - **Deterministic**: same input and clock always produce the same result
//! - **Pure**: no I/O beyond read-only collaborator lookups
//! - **Complete**: field errors are accumulated, never short-circuited

pub mod catalog;
pub mod choices;
pub mod config;
pub mod error;
pub mod forus;
pub mod university;

pub use catalog::{
    Account, AccountDirectory, CourseCatalog, CourseInfo, CourseKey, InMemoryCatalog,
    InMemoryDirectory,
};
pub use choices::Choices;
pub use config::{Features, Settings};
pub use error::{Error, FieldErrors, Result};
pub use forus::{CleanFields, ForUsValidator, SignedRequest};
pub use university::{MarkedUniversityId, UniversityId, UniversityIdForm};
