//! Codegen Library - shared code generation logic
//!
//! Emitters turning a validated schema into Flask application source:
//! SQLAlchemy models, CRUD blueprints (plus relationship helpers for
//! relational models) and Jinja view templates. Every emitter is a pure
//! function of the schema, so they may run in parallel.

pub mod crud_route;
pub mod naming;
pub mod orm_model;
pub mod relation_helpers;
pub mod view_template;

use anyhow::{anyhow, Result};
use shipdsl_ir::{Cardinality, Field, FieldType, Model, Schema};

pub use crud_route::CrudRouteGenerator;
pub use naming::{TableFormat, TableNaming};
pub use orm_model::OrmModelGenerator;
pub use relation_helpers::RelationHelperGenerator;
pub use view_template::ViewTemplateGenerator;

/// Python package the ORM models are imported from.
pub const MODELS_PACKAGE: &str = "app.models";

/// Codegen trait - implement this for each target
pub trait Codegen {
    fn generate(&self, schema: &Schema) -> Result<GeneratedCode>;
    fn language(&self) -> &str;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedCode {
    pub files: Vec<GeneratedFile>,
}

impl GeneratedCode {
    pub fn file(&self, path: &str) -> Option<&GeneratedFile> {
        self.files.iter().find(|f| f.path == path)
    }
}

/// One output file; `path` is relative to the emitter's output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
}

/// A foreign-key column rendered as a selection input.
pub(crate) struct RelatedInput<'a> {
    pub field: &'a Field,
    pub target: &'a Model,
    /// Many-to-one attribute traversing `field`.
    pub relationship: String,
    /// Target column shown to the user.
    pub display: &'a Field,
}

impl RelatedInput<'_> {
    /// Template variable holding the selectable rows.
    pub fn choices(&self) -> String {
        format!("{}_choices", self.relationship)
    }
}

/// The foreign-key fields of `model` with everything the route, helper and
/// template emitters need to render them.
pub(crate) fn related_inputs<'a>(schema: &'a Schema, model: &'a Model) -> Result<Vec<RelatedInput<'a>>> {
    model
        .foreign_key_fields()
        .map(|field| {
            let (target, _) = schema.resolve_foreign_key(field).ok_or_else(|| {
                anyhow!(
                    "{}.{}: foreign key {:?} does not resolve",
                    model.id,
                    field.name,
                    field.foreign_key
                )
            })?;
            let relationship = model
                .relationships
                .iter()
                .filter(|r| r.kind == Cardinality::ManyToOne && r.target_model == target.id)
                .find(|r| match &r.foreign_keys {
                    Some(keys) => keys.iter().any(|k| k == &field.name),
                    None => true,
                })
                .map(|r| r.field_name.clone())
                .unwrap_or_else(|| field.name.trim_end_matches("_id").to_string());
            Ok(RelatedInput {
                field,
                target,
                relationship,
                display: display_field(target)?,
            })
        })
        .collect()
}

/// First non-key string column, else the primary key.
fn display_field(model: &Model) -> Result<&Field> {
    model
        .fields
        .iter()
        .find(|f| !f.primary_key && f.ty == FieldType::String)
        .or_else(|| model.primary_key())
        .ok_or_else(|| anyhow!("{} has no primary key", model.id))
}

/// Columns a form edits directly: everything but the key and foreign keys.
pub(crate) fn plain_fields(model: &Model) -> impl Iterator<Item = &Field> {
    model
        .fields
        .iter()
        .filter(|f| !f.primary_key && !f.is_foreign_key())
}

/// Flask URL converter and view argument for a model's primary key.
pub(crate) fn key_param(model: &Model) -> (&'static str, &str) {
    match model.primary_key() {
        Some(pk) if pk.ty == FieldType::Integer => ("int", pk.name.as_str()),
        Some(pk) => ("string", pk.name.as_str()),
        None => ("int", "id"),
    }
}

/// `port_of_loading_id` → `Port Of Loading Id`.
pub(crate) fn label(name: &str) -> String {
    name.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Python string literal in single quotes.
pub(crate) fn py_str(text: &str) -> String {
    format!("'{}'", text.replace('\\', "\\\\").replace('\'', "\\'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels() {
        assert_eq!(label("port_of_loading_id"), "Port Of Loading Id");
        assert_eq!(label("eta"), "Eta");
    }

    #[test]
    fn key_params() {
        let mut code = Field::new("code", FieldType::String);
        code.primary_key = true;
        let mut country = Model::new("S001_Country", "Country");
        country.fields = vec![code, Field::new("name", FieldType::String)];
        assert_eq!(key_param(&country), ("string", "code"));

        let mut id = Field::new("id", FieldType::Integer);
        id.primary_key = true;
        country.fields = vec![id];
        assert_eq!(key_param(&country), ("int", "id"));
    }

    #[test]
    fn python_strings() {
        assert_eq!(py_str("s001_manifest"), "'s001_manifest'");
        assert_eq!(py_str("it's"), "'it\\'s'");
    }
}
