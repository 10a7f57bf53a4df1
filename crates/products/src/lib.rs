//! Products domain module.
//!
//! This crate contains the product catalog's business rules (validated value
//! objects, the availability lifecycle, patch semantics), implemented purely
//! as deterministic domain logic (no IO, no HTTP, no storage).

pub mod product;

pub use product::{Availability, NewProduct, Price, Product, ProductId, ProductName, ProductPatch};
