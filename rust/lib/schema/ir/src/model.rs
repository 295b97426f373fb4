//! Model IR: one declared table: fields, relationships, indices.

use serde::{Deserialize, Serialize};

use crate::keyed::Keyed;
use crate::menu::ModelMenus;
use crate::types::{Cardinality, FieldType, RelationshipOrigin};

/// A column on a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Column name, unique within its model. Carried as the JSON key.
    #[serde(skip)]
    pub name: String,

    #[serde(rename = "type")]
    pub ty: FieldType,

    /// Maximum length for `String` columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub primary_key: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub auto_increment: bool,

    #[serde(default = "default_nullable")]
    pub nullable: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub unique: bool,

    /// Fully qualified, lower-cased reference: `s012_port.id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<String>,

    /// Default value literal as written in the DSL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

fn default_nullable() -> bool {
    true
}

impl Field {
    /// A plain nullable column with no constraints.
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            length: None,
            precision: None,
            scale: None,
            primary_key: false,
            auto_increment: false,
            nullable: true,
            unique: false,
            foreign_key: None,
            default: None,
        }
    }

    pub fn is_foreign_key(&self) -> bool {
        self.foreign_key.is_some()
    }

    /// Split `foreign_key` into `(table, column)`.
    pub fn foreign_key_parts(&self) -> Option<(&str, &str)> {
        self.foreign_key.as_deref().and_then(|fk| fk.split_once('.'))
    }
}

impl Keyed for Field {
    fn key(&self) -> &str {
        &self.name
    }

    fn set_key(&mut self, key: String) {
        self.name = key;
    }
}

/// A directed association from the owning model to `target_model`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// Attribute on the owning model holding the related object/collection.
    pub field_name: String,

    /// Canonical id of the related model (raw declared name if unresolved).
    pub target_model: String,

    #[serde(rename = "type")]
    pub kind: Cardinality,

    /// Attribute on the target model exposing the inverse side.
    pub back_populates: String,

    /// Physical FK column(s) this relationship traverses. Always names
    /// columns of the model that holds the foreign key, which is the target
    /// for one-to-many relationships.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_keys: Option<Vec<String>>,

    #[serde(default)]
    pub origin: RelationshipOrigin,
}

/// A named, ordered column list on one model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Index {
    #[serde(skip)]
    pub name: String,

    pub columns: Vec<String>,
}

impl Index {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    pub fn covers(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

impl Keyed for Index {
    fn key(&self) -> &str {
        &self.name
    }

    fn set_key(&mut self, key: String) {
        self.name = key;
    }
}

/// A declared table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    /// Canonical identifier, `S{seq:03}_{Name}`. Carried as the JSON key.
    #[serde(skip)]
    pub id: String,

    /// Name as written after `table` in the DSL.
    #[serde(skip)]
    pub name: String,

    #[serde(rename = "Fields", with = "crate::keyed")]
    pub fields: Vec<Field>,

    #[serde(rename = "Relationships", default)]
    pub relationships: Vec<Relationship>,

    #[serde(rename = "Indices", default, with = "crate::keyed")]
    pub indices: Vec<Index>,

    #[serde(rename = "Menus", default)]
    pub menus: ModelMenus,
}

impl Model {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            fields: Vec::new(),
            relationships: Vec::new(),
            indices: Vec::new(),
            menus: ModelMenus::default(),
        }
    }

    /// Storage name derived from the canonical id (`s012_port`).
    pub fn table_name(&self) -> String {
        self.id.to_lowercase()
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn relationship(&self, field_name: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.field_name == field_name)
    }

    pub fn primary_keys(&self) -> Vec<&Field> {
        self.fields.iter().filter(|f| f.primary_key).collect()
    }

    /// The single primary key, if exactly one is declared.
    pub fn primary_key(&self) -> Option<&Field> {
        let mut pks = self.fields.iter().filter(|f| f.primary_key);
        match (pks.next(), pks.next()) {
            (Some(pk), None) => Some(pk),
            _ => None,
        }
    }

    pub fn foreign_key_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_foreign_key())
    }

    /// A model is relational when its create/update form touches a foreign key.
    pub fn is_relational(&self) -> bool {
        self.fields.iter().any(Field::is_foreign_key)
    }
}

impl Keyed for Model {
    fn key(&self) -> &str {
        &self.id
    }

    fn set_key(&mut self, key: String) {
        self.name = declared_name(&key).to_string();
        self.id = key;
    }
}

/// Build the canonical identifier for the `seq`-th declared table.
pub fn canonical_id(seq: usize, name: &str) -> String {
    format!("S{:03}_{}", seq, name)
}

/// Recover the declared name from a canonical identifier.
pub fn declared_name(id: &str) -> &str {
    match id.split_once('_') {
        Some((prefix, rest))
            if prefix.len() > 1
                && prefix.starts_with('S')
                && prefix[1..].chars().all(|c| c.is_ascii_digit()) =>
        {
            rest
        }
        _ => id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port() -> Model {
        let mut model = Model::new("S012_Port", "Port");
        let mut id = Field::new("id", FieldType::Integer);
        id.primary_key = true;
        id.auto_increment = true;
        id.nullable = false;
        let mut country = Field::new("country_id", FieldType::Integer);
        country.foreign_key = Some("s014_country.id".into());
        model.fields = vec![id, country, Field::new("name", FieldType::String)];
        model
    }

    #[test]
    fn canonical_id_is_zero_padded() {
        assert_eq!(canonical_id(1, "Manifest"), "S001_Manifest");
        assert_eq!(canonical_id(17, "Rate"), "S017_Rate");
        assert_eq!(canonical_id(1234, "Big"), "S1234_Big");
    }

    #[test]
    fn declared_name_strips_sequence_prefix() {
        assert_eq!(declared_name("S013_PortPair"), "PortPair");
        assert_eq!(declared_name("S001_Container_History"), "Container_History");
        assert_eq!(declared_name("Port"), "Port");
        assert_eq!(declared_name("Sx_Port"), "Sx_Port");
    }

    #[test]
    fn model_lookups() {
        let model = port();
        assert_eq!(model.table_name(), "s012_port");
        assert_eq!(model.primary_key().map(|f| f.name.as_str()), Some("id"));
        assert!(model.is_relational());
        let fks: Vec<_> = model.foreign_key_fields().map(|f| f.name.as_str()).collect();
        assert_eq!(fks, vec!["country_id"]);
        assert_eq!(
            model.field("country_id").and_then(Field::foreign_key_parts),
            Some(("s014_country", "id"))
        );
    }

    #[test]
    fn field_json_omits_unset_flags() {
        let field = Field::new("name", FieldType::String);
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json, serde_json::json!({"type": "String", "nullable": true}));
    }

    #[test]
    fn index_serializes_as_column_list() {
        let index = Index::new("ix_s012_port_country_id", vec!["country_id".into()]);
        assert_eq!(serde_json::to_string(&index).unwrap(), "[\"country_id\"]");
        assert!(index.covers("country_id"));
        assert!(!index.covers("name"));
    }
}
