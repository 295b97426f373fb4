//! Shipping schema DSL Intermediate Representation (IR)
//!
//! The validated, JSON-shaped structure that sits between the DSL compiler
//! and the code emitters:
//! - parser   (DSL text → IR)
//! - validator (IR consistency checks)
//! - emitters (IR → ORM models, CRUD routes, view templates)
//!
//! Layers:
//! 1. Types: field type tags, relationship cardinality
//! 2. Model: fields, relationships, indices of one table
//! 3. Menus: routing metadata handed to the route/template layer
//! 4. Schema: all models in declaration order

pub mod keyed;
pub mod menu;
pub mod model;
pub mod schema;
pub mod types;

pub use menu::*;
pub use model::*;
pub use schema::*;
pub use types::*;
