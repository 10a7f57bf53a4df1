//! `catalog-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! the shared error model, entity/value-object markers and offset pagination.

pub mod entity;
pub mod error;
pub mod pagination;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use pagination::{Page, PageMeta, PageRequest};
pub use value_object::ValueObject;
