//! Shipping schema validator
//!
//! Semantic checks over a compiled schema:
//! - Table and field names are declared once
//! - Every model has exactly one primary key
//! - Foreign keys resolve, have compatible types and target a key column
//! - Indices reference existing columns and are named uniquely schema-wide
//! - Every foreign key is covered by an index
//! - Relationships target known models, never collide with columns or each
//!   other, and pair up with their inverse
//!
//! Checks never short-circuit: the report carries every violation found.

use std::collections::{HashMap, HashSet};
use std::fmt;

use shipdsl_ir::*;
use tracing::debug;

/// Category of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A foreign key or relationship names something that does not exist.
    UnresolvedReference,
    /// Keys, indices, duplicate declarations.
    Structural,
    /// A foreign key's type differs from the column it references.
    TypeMismatch,
    /// Relationship names that collide.
    Naming,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::UnresolvedReference => "reference",
            ErrorKind::Structural => "structure",
            ErrorKind::TypeMismatch => "type",
            ErrorKind::Naming => "naming",
        }
    }
}

/// A validation error with a descriptive message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub kind: ErrorKind,
    /// `Model` or `Model.field`, by canonical id.
    pub context: String,
    pub message: String,
}

impl ValidationError {
    fn new(kind: ErrorKind, context: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            context: context.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}] {}", self.kind.as_str(), self.context, self.message)
    }
}

/// Ordered findings of one validation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate an entire schema.
/// Returns all errors found (does not stop at first error).
pub fn validate_schema(schema: &Schema) -> ValidationReport {
    let mut errors = Vec::new();

    // 1. Table names.
    errors.extend(validate_table_names(schema));

    // 2-3. Per-model structure.
    for model in &schema.models {
        errors.extend(validate_field_names(model));
        errors.extend(validate_primary_key(model));
    }

    // 4-5. Foreign keys.
    for model in &schema.models {
        errors.extend(validate_foreign_keys(schema, model));
    }

    // 6-8. Indices.
    for model in &schema.models {
        errors.extend(validate_index_columns(model));
    }
    errors.extend(validate_index_names(schema));
    for model in &schema.models {
        errors.extend(validate_index_coverage(model));
    }

    // 9-12. Relationships.
    for model in &schema.models {
        errors.extend(validate_relationship_targets(schema, model));
        errors.extend(validate_relationship_names(model));
        errors.extend(validate_back_populates(model));
        errors.extend(validate_relationship_pairs(schema, model));
    }

    debug!(
        models = schema.models.len(),
        errors = errors.len(),
        "schema validated"
    );
    ValidationReport { errors }
}

fn validate_table_names(schema: &Schema) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen: HashMap<&str, &str> = HashMap::new();
    for model in &schema.models {
        if let Some(first) = seen.get(model.name.as_str()) {
            errors.push(ValidationError::new(
                ErrorKind::Structural,
                &model.id,
                format!(
                    "Table '{}' is declared more than once (first as {})",
                    model.name, first
                ),
            ));
        } else {
            seen.insert(&model.name, &model.id);
        }
    }
    errors
}

fn validate_field_names(model: &Model) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    for field in &model.fields {
        if !seen.insert(field.name.as_str()) {
            errors.push(ValidationError::new(
                ErrorKind::Structural,
                format!("{}.{}", model.id, field.name),
                format!("Model {} declares field '{}' more than once", model.id, field.name),
            ));
        }
    }
    errors
}

fn validate_primary_key(model: &Model) -> Option<ValidationError> {
    let pks = model.primary_keys();
    let message = match pks.len() {
        1 => return None,
        0 => format!("Model {} has no primary key defined", model.id),
        _ => format!(
            "Model {} has multiple primary keys defined ({})",
            model.id,
            pks.iter().map(|f| f.name.as_str()).collect::<Vec<_>>().join(", ")
        ),
    };
    Some(ValidationError::new(ErrorKind::Structural, &model.id, message))
}

fn validate_foreign_keys(schema: &Schema, model: &Model) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for field in model.foreign_key_fields() {
        let context = format!("{}.{}", model.id, field.name);
        let Some((table, column)) = field.foreign_key_parts() else {
            errors.push(ValidationError::new(
                ErrorKind::UnresolvedReference,
                &context,
                format!(
                    "Invalid foreign key in {}: '{}' is not of the form table.column",
                    context,
                    field.foreign_key.as_deref().unwrap_or_default()
                ),
            ));
            continue;
        };

        let Some(target) = schema.model_by_table(table) else {
            errors.push(ValidationError::new(
                ErrorKind::UnresolvedReference,
                &context,
                format!(
                    "Invalid foreign key in {}: Referenced table '{}' does not exist",
                    context, table
                ),
            ));
            continue;
        };

        let Some((_, target_field)) = schema.resolve_foreign_key(field) else {
            errors.push(ValidationError::new(
                ErrorKind::UnresolvedReference,
                &context,
                format!(
                    "Invalid foreign key in {}: Referenced column '{}.{}' does not exist",
                    context, target.id, column
                ),
            ));
            continue;
        };

        if !field.ty.is_compatible_with(&target_field.ty) {
            errors.push(ValidationError::new(
                ErrorKind::TypeMismatch,
                &context,
                format!(
                    "Type mismatch in foreign key {}: {} references {} column {}.{}",
                    context, field.ty, target_field.ty, target.id, target_field.name
                ),
            ));
        }

        if !target_field.primary_key && !target_field.unique {
            errors.push(ValidationError::new(
                ErrorKind::Structural,
                &context,
                format!(
                    "Foreign key {} references {}.{}, which is neither a primary key nor unique",
                    context, target.id, target_field.name
                ),
            ));
        }
    }

    errors
}

fn validate_index_columns(model: &Model) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for index in &model.indices {
        if index.columns.is_empty() {
            errors.push(ValidationError::new(
                ErrorKind::Structural,
                &model.id,
                format!("Index '{}' in {} has no columns", index.name, model.id),
            ));
        }
        for column in &index.columns {
            if model.field(column).is_none() {
                errors.push(ValidationError::new(
                    ErrorKind::Structural,
                    &model.id,
                    format!(
                        "Invalid index '{}' in {}: Referenced column '{}' does not exist",
                        index.name, model.id, column
                    ),
                ));
            }
        }
    }
    errors
}

fn validate_index_names(schema: &Schema) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen: HashMap<&str, &str> = HashMap::new();
    for model in &schema.models {
        for index in &model.indices {
            if let Some(owner) = seen.get(index.name.as_str()) {
                errors.push(ValidationError::new(
                    ErrorKind::Structural,
                    &model.id,
                    format!(
                        "Index name '{}' in {} is already used by {}",
                        index.name, model.id, owner
                    ),
                ));
            } else {
                seen.insert(&index.name, &model.id);
            }
        }
    }
    errors
}

fn validate_index_coverage(model: &Model) -> Vec<ValidationError> {
    model
        .foreign_key_fields()
        .filter(|field| !model.indices.iter().any(|ix| ix.covers(&field.name)))
        .map(|field| {
            let context = format!("{}.{}", model.id, field.name);
            let message = format!("Foreign key {} is not covered by any index", context);
            ValidationError::new(ErrorKind::Structural, context, message)
        })
        .collect()
}

fn validate_relationship_targets(schema: &Schema, model: &Model) -> Vec<ValidationError> {
    model
        .relationships
        .iter()
        .filter(|rel| schema.model(&rel.target_model).is_none())
        .map(|rel| {
            let context = format!("{}.{}", model.id, rel.field_name);
            let message = format!(
                "Relationship {} targets unknown model '{}'",
                context, rel.target_model
            );
            ValidationError::new(ErrorKind::UnresolvedReference, context, message)
        })
        .collect()
}

fn validate_relationship_names(model: &Model) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    for rel in &model.relationships {
        let context = format!("{}.{}", model.id, rel.field_name);
        if !seen.insert(rel.field_name.as_str()) {
            errors.push(ValidationError::new(
                ErrorKind::Naming,
                &context,
                format!(
                    "Relationship name '{}' is used more than once in {}",
                    rel.field_name, model.id
                ),
            ));
        }
        if model.field(&rel.field_name).is_some() {
            errors.push(ValidationError::new(
                ErrorKind::Naming,
                &context,
                format!(
                    "Relationship '{}' in {} collides with a column of the same name",
                    rel.field_name, model.id
                ),
            ));
        }
    }
    errors
}

fn validate_back_populates(model: &Model) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen: HashMap<(&str, &str), &str> = HashMap::new();
    for rel in model.relationships.iter().filter(|r| !r.back_populates.is_empty()) {
        let key = (rel.target_model.as_str(), rel.back_populates.as_str());
        match seen.get(&key) {
            Some(first) => errors.push(ValidationError::new(
                ErrorKind::Naming,
                format!("{}.{}", model.id, rel.field_name),
                format!(
                    "Relationships '{}' and '{}' in {} both back-populate {}.{}",
                    first, rel.field_name, model.id, rel.target_model, rel.back_populates
                ),
            )),
            None => {
                seen.insert(key, &rel.field_name);
            }
        }
    }
    errors
}

fn validate_relationship_pairs(schema: &Schema, model: &Model) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for rel in &model.relationships {
        // Unknown targets are reported by validate_relationship_targets.
        let Some(target) = schema.model(&rel.target_model) else {
            continue;
        };
        let context = format!("{}.{}", model.id, rel.field_name);
        if rel.back_populates.is_empty() {
            errors.push(ValidationError::new(
                ErrorKind::UnresolvedReference,
                &context,
                format!(
                    "Relationship {} has no foreign key in {} referencing {}",
                    context, target.id, model.id
                ),
            ));
            continue;
        }
        match target.relationship(&rel.back_populates) {
            None => errors.push(ValidationError::new(
                ErrorKind::UnresolvedReference,
                &context,
                format!(
                    "Relationship {} back-populates {}.{}, which does not exist",
                    context, target.id, rel.back_populates
                ),
            )),
            Some(inverse)
                if inverse.target_model != model.id || inverse.back_populates != rel.field_name =>
            {
                errors.push(ValidationError::new(
                    ErrorKind::Structural,
                    &context,
                    format!(
                        "Relationship {} and its inverse {}.{} do not point at each other",
                        context, target.id, inverse.field_name
                    ),
                ))
            }
            Some(_) => {}
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pk(name: &str) -> Field {
        let mut f = Field::new(name, FieldType::Integer);
        f.primary_key = true;
        f.nullable = false;
        f
    }

    fn fk(name: &str, target: &str) -> Field {
        let mut f = Field::new(name, FieldType::Integer);
        f.foreign_key = Some(target.into());
        f
    }

    fn rel(field: &str, target: &str, kind: Cardinality, back: &str) -> Relationship {
        Relationship {
            field_name: field.into(),
            target_model: target.into(),
            kind,
            back_populates: back.into(),
            foreign_keys: None,
            origin: RelationshipOrigin::ForeignKey,
        }
    }

    /// Country ← Port, fully consistent.
    fn minimal_schema() -> Schema {
        let mut country = Model::new("S001_Country", "Country");
        country.fields = vec![pk("id"), Field::new("name", FieldType::String)];
        country.relationships = vec![rel(
            "s002_port_country",
            "S002_Port",
            Cardinality::OneToMany,
            "country",
        )];

        let mut port = Model::new("S002_Port", "Port");
        port.fields = vec![pk("id"), fk("country_id", "s001_country.id")];
        port.relationships = vec![rel(
            "country",
            "S001_Country",
            Cardinality::ManyToOne,
            "s002_port_country",
        )];
        port.indices = vec![Index::new("ix_s002_port_country_id", vec!["country_id".into()])];

        Schema {
            models: vec![country, port],
            ..Schema::default()
        }
    }

    fn messages(schema: &Schema) -> Vec<String> {
        validate_schema(schema)
            .errors
            .iter()
            .map(|e| e.message.clone())
            .collect()
    }

    #[test]
    fn valid_schema_no_errors() {
        let report = validate_schema(&minimal_schema());
        assert!(report.is_valid(), "{:?}", report.errors);
    }

    #[test]
    fn multiple_primary_keys_is_one_error() {
        let mut schema = minimal_schema();
        schema.models[0].fields.push(pk("code"));
        let report = validate_schema(&schema);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].context, "S001_Country");
        assert_eq!(
            report.errors[0].message,
            "Model S001_Country has multiple primary keys defined (id, code)"
        );
    }

    #[test]
    fn missing_primary_key() {
        let mut schema = minimal_schema();
        schema.models[0].fields[0].primary_key = false;
        // The foreign key now references a column that is not a key.
        assert_eq!(
            messages(&schema),
            vec![
                "Model S001_Country has no primary key defined",
                "Foreign key S002_Port.country_id references S001_Country.id, which is neither a primary key nor unique",
            ]
        );
    }

    #[test]
    fn unresolved_foreign_keys() {
        let mut schema = minimal_schema();
        schema.models[1].fields.push(fk("vessel_id", "vessel.id"));
        schema.models[1].fields.push(fk("alt_id", "s001_country.code"));
        let errors = validate_schema(&schema).errors;
        assert!(errors.iter().any(|e| e.kind == ErrorKind::UnresolvedReference
            && e.message
                == "Invalid foreign key in S002_Port.vessel_id: Referenced table 'vessel' does not exist"));
        assert!(errors.iter().any(|e| e.message
            == "Invalid foreign key in S002_Port.alt_id: Referenced column 'S001_Country.code' does not exist"));
    }

    #[test]
    fn foreign_key_type_mismatch() {
        let mut schema = minimal_schema();
        schema.models[1].fields[1].ty = FieldType::String;
        let errors = validate_schema(&schema).errors;
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::TypeMismatch);
        assert_eq!(
            errors[0].to_string(),
            "[type:S002_Port.country_id] Type mismatch in foreign key S002_Port.country_id: String references Integer column S001_Country.id"
        );
    }

    #[test]
    fn index_problems() {
        let mut schema = minimal_schema();
        schema.models[1].indices = vec![Index::new("ix_shared", vec!["ghost".into()])];
        schema.models[0].indices = vec![Index::new("ix_shared", vec!["name".into()])];
        assert_eq!(
            messages(&schema),
            vec![
                "Invalid index 'ix_shared' in S002_Port: Referenced column 'ghost' does not exist",
                "Index name 'ix_shared' in S002_Port is already used by S001_Country",
                "Foreign key S002_Port.country_id is not covered by any index",
            ]
        );
    }

    #[test]
    fn relationship_problems() {
        let mut schema = minimal_schema();
        schema.models[1].relationships.push(rel(
            "vessel",
            "S009_Vessel",
            Cardinality::ManyToOne,
            "ports",
        ));
        schema.models[1].relationships.push(rel(
            "id",
            "S001_Country",
            Cardinality::ManyToOne,
            "s002_port_country",
        ));
        let errors = validate_schema(&schema).errors;
        let kinds: Vec<_> = errors.iter().map(|e| (e.kind, e.context.as_str())).collect();
        assert_eq!(
            kinds,
            vec![
                (ErrorKind::UnresolvedReference, "S002_Port.vessel"),
                (ErrorKind::Naming, "S002_Port.id"),
                (ErrorKind::Naming, "S002_Port.id"),
                (ErrorKind::Structural, "S002_Port.id"),
            ]
        );
    }

    #[test]
    fn inconsistent_pair() {
        let mut schema = minimal_schema();
        schema.models[0].relationships[0].back_populates = "nation".into();
        let errors = validate_schema(&schema).errors;
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].context, "S001_Country.s002_port_country");
        assert_eq!(errors[1].context, "S002_Port.country");
    }

    #[test]
    fn unpaired_one_to_many() {
        let mut schema = minimal_schema();
        let mut legs = rel("legs", "S002_Port", Cardinality::OneToMany, "");
        legs.origin = RelationshipOrigin::Explicit;
        schema.models[0].relationships.push(legs.clone());
        schema.models[0].relationships.push(Relationship {
            field_name: "more_legs".into(),
            ..legs
        });
        // Two unnamed back references are not a naming clash.
        assert_eq!(
            messages(&schema),
            vec![
                "Relationship S001_Country.legs has no foreign key in S002_Port referencing S001_Country",
                "Relationship S001_Country.more_legs has no foreign key in S002_Port referencing S001_Country",
            ]
        );
    }

    #[test]
    fn duplicates() {
        let mut schema = minimal_schema();
        schema.models[0].fields.push(Field::new("name", FieldType::String));
        let mut again = Model::new("S003_Country", "Country");
        again.fields = vec![pk("id")];
        schema.models.push(again);
        assert_eq!(
            messages(&schema),
            vec![
                "Table 'Country' is declared more than once (first as S001_Country)",
                "Model S001_Country declares field 'name' more than once",
            ]
        );
    }

    #[test]
    fn collects_every_defect() {
        let mut schema = minimal_schema();
        schema.models[0].fields[0].primary_key = false; // no primary key
        schema.models[1].fields.push(fk("a_id", "missing.id")); // unresolved
        schema.models[1].fields.push(fk("b_id", "gone.id")); // unresolved
        let report = validate_schema(&schema);
        assert!(!report.is_valid());
        assert!(report.errors.len() >= 3);
    }
}
