//! Shipping schema DSL parser.
//!
//! Compiles DSL source text into the intermediate schema:
//! 1. Syntax pre-check (fatal, single error)
//! 2. Model map: declared name → canonical id, one scan
//! 3. Field pass: every table's fields, types and constraints
//! 4. Relationship pass: explicit associations + foreign keys, both sides
//! 5. Index deriver + menus
//!
//! The result is not validated; run `shipdsl_validate` on it before
//! emitting anything.

pub mod error;
pub mod field;
pub mod index;
pub mod lexer;
pub mod menu;
pub mod model_map;
pub mod relation;
pub mod syntax;
pub mod table;

pub use error::ParseError;
pub use model_map::ModelMap;

use shipdsl_ir::{ModelMenus, Schema};
use tracing::info;

/// Compile DSL source into an (unvalidated) schema.
pub fn compile(source: &str) -> Result<Schema, ParseError> {
    syntax::check(source)?;

    let map = ModelMap::build(source);
    let blocks = table::scan(source);

    // Full barrier: every table's fields are parsed before any
    // relationship is resolved.
    let mut tables: Vec<_> = map
        .entries()
        .iter()
        .zip(&blocks)
        .map(|(entry, block)| field::resolve_table(entry, block, &map))
        .collect();

    relation::resolve(&mut tables, &map);

    let mut models = Vec::with_capacity(tables.len());
    for table in tables {
        let mut model = table.model;
        model.menus = ModelMenus {
            context: table.links,
            statistics: Vec::new(),
        };
        models.push(model);
    }

    index::derive(&mut models);

    let schema = Schema {
        menus: menu::build(&models),
        models,
        ..Schema::default()
    };
    info!(
        models = schema.models.len(),
        relationships = schema.models.iter().map(|m| m.relationships.len()).sum::<usize>(),
        "schema compiled"
    );
    Ok(schema)
}
