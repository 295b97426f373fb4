//! Shared types used across all IR layers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical column type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Integer,
    String,
    Text,
    DateTime,
    Date,
    Time,
    Float,
    Decimal,
    Boolean,
}

impl FieldType {
    pub const ALL: [FieldType; 9] = [
        FieldType::Integer,
        FieldType::String,
        FieldType::Text,
        FieldType::DateTime,
        FieldType::Date,
        FieldType::Time,
        FieldType::Float,
        FieldType::Decimal,
        FieldType::Boolean,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Integer => "Integer",
            FieldType::String => "String",
            FieldType::Text => "Text",
            FieldType::DateTime => "DateTime",
            FieldType::Date => "Date",
            FieldType::Time => "Time",
            FieldType::Float => "Float",
            FieldType::Decimal => "Decimal",
            FieldType::Boolean => "Boolean",
        }
    }

    /// Whether a foreign key of this type may reference a key of `other`.
    ///
    /// Tags must match exactly; `String(40)` referencing `String(64)` is fine
    /// because length is a parameter, not part of the tag.
    pub fn is_compatible_with(&self, other: &FieldType) -> bool {
        self == other
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship cardinality. The DSL has no many-to-many form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cardinality {
    OneToMany,
    ManyToOne,
}

impl Cardinality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cardinality::OneToMany => "one-to-many",
            Cardinality::ManyToOne => "many-to-one",
        }
    }
}

/// Where a relationship came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipOrigin {
    /// Declared with a `Target[]` association field.
    #[default]
    Explicit,
    /// Synthesized from a scalar field carrying `ref: >`.
    ForeignKey,
    /// Synthesized on the referenced model when no explicit inverse exists.
    Inverse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_type_serializes_as_tag() {
        let json = serde_json::to_string(&FieldType::DateTime).unwrap();
        assert_eq!(json, "\"DateTime\"");
        for ty in FieldType::ALL {
            assert_eq!(serde_json::to_string(&ty).unwrap(), format!("\"{}\"", ty));
        }
    }

    #[test]
    fn cardinality_is_kebab_case() {
        assert_eq!(
            serde_json::to_string(&Cardinality::OneToMany).unwrap(),
            "\"one-to-many\""
        );
        let back: Cardinality = serde_json::from_str("\"many-to-one\"").unwrap();
        assert_eq!(back, Cardinality::ManyToOne);
    }

    #[test]
    fn compatibility_is_tag_equality() {
        assert!(FieldType::Integer.is_compatible_with(&FieldType::Integer));
        assert!(!FieldType::Integer.is_compatible_with(&FieldType::String));
    }
}
