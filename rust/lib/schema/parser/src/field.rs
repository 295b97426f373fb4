//! Field & type resolver.
//!
//! Turns the raw declarations of one table block into IR fields, the
//! association fields awaiting relationship resolution, and the model's
//! context-menu links.

use shipdsl_ir::{ContextLink, Field, FieldType, Index, Model};
use tracing::{debug, warn};

use crate::lexer::{split_top_level, unquote};
use crate::model_map::{MapEntry, ModelMap};
use crate::table::{FieldLine, TableBlock};

/// An array-typed field (`items LineItem[] [...]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    pub field_name: String,
    /// Declared name of the related table, as written.
    pub target: String,
    /// Carried a `relationship:` or `back_populates:` annotation.
    pub annotated: bool,
    pub back_populates: Option<String>,
}

/// Relationship naming overrides carried on a foreign-key field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FkNaming {
    pub field: String,
    /// `as: "name"`: the many-to-one attribute on this model.
    pub relationship: Option<String>,
    /// `back_populates: "name"`: the inverse attribute on the target.
    pub back_populates: Option<String>,
}

/// Output of the field pass for one table.
#[derive(Debug, Clone)]
pub struct ResolvedTable {
    pub model: Model,
    pub associations: Vec<Association>,
    pub naming: Vec<FkNaming>,
    pub links: Vec<ContextLink>,
}

/// A type token split into its primitive and parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSpec {
    Scalar {
        ty: FieldType,
        length: Option<u32>,
        precision: Option<u32>,
        scale: Option<u32>,
    },
    /// `Target[]`
    Array(String),
}

pub fn resolve_table(entry: &MapEntry, block: &TableBlock<'_>, map: &ModelMap) -> ResolvedTable {
    let mut table = ResolvedTable {
        model: Model::new(entry.id.clone(), entry.name.clone()),
        associations: Vec::new(),
        naming: Vec::new(),
        links: Vec::new(),
    };
    let table_lower = entry.id.to_lowercase();

    for line in &block.fields {
        match parse_type(line.ty) {
            TypeSpec::Array(target) => {
                let assoc = parse_association(line, target);
                table
                    .links
                    .push(ContextLink::drill_down(&assoc.target, &assoc.field_name));
                table.associations.push(assoc);
            }
            TypeSpec::Scalar {
                ty,
                length,
                precision,
                scale,
            } => {
                let mut field = Field::new(line.name, ty);
                field.length = length;
                field.precision = precision;
                field.scale = scale;

                let attrs = apply_attributes(&mut field, line, map);
                if attrs.index {
                    table.model.indices.push(Index::new(
                        format!("ix_{}_{}", table_lower, field.name),
                        vec![field.name.clone()],
                    ));
                }
                if let Some((target, _)) = field.foreign_key_parts() {
                    let target = map.by_table(target).unwrap_or(target);
                    table
                        .links
                        .push(ContextLink::related_table(target, &field.name));
                    table.naming.push(FkNaming {
                        field: field.name.clone(),
                        relationship: attrs.relationship,
                        back_populates: attrs.back_populates,
                    });
                }
                debug!(model = %entry.id, field = %field.name, ty = %field.ty, "field resolved");
                table.model.fields.push(field);
            }
        }
    }

    for index in &block.indices {
        table.model.indices.push(Index::new(
            index.name,
            index.columns.iter().map(|c| c.to_string()).collect(),
        ));
    }

    table
}

/// Map a primitive type token to its tag, case-insensitively.
pub fn primitive(token: &str) -> Option<FieldType> {
    let ty = match token.to_ascii_lowercase().as_str() {
        "int" | "integer" | "bigint" | "smallint" => FieldType::Integer,
        "string" | "varchar" | "char" => FieldType::String,
        "text" => FieldType::Text,
        "datetime" | "timestamp" => FieldType::DateTime,
        "date" => FieldType::Date,
        "time" => FieldType::Time,
        "float" | "double" | "real" => FieldType::Float,
        "decimal" | "numeric" => FieldType::Decimal,
        "bool" | "boolean" => FieldType::Boolean,
        _ => return None,
    };
    Some(ty)
}

/// Split a type token: `String(64)`, `Decimal[precision: 10, scale: 2]`,
/// `LineItem[]`. Unknown primitives fall back to `String`.
pub fn parse_type(token: &str) -> TypeSpec {
    if let Some(target) = token.strip_suffix("[]") {
        return TypeSpec::Array(target.to_string());
    }

    let (base, params) = match token.find(['(', '[']) {
        Some(pos) => {
            let inner = token[pos + 1..].trim_end_matches([')', ']']);
            (&token[..pos], Some(inner))
        }
        None => (token, None),
    };

    let ty = primitive(base).unwrap_or_else(|| {
        warn!(token = base, "unknown type, falling back to String");
        FieldType::String
    });

    let mut field = Field::new("", ty);
    if let Some(params) = params {
        let mut positional = 0;
        for param in split_top_level(params, ',') {
            match param.split_once(':') {
                Some((key, value)) => apply_parameter(&mut field, key.trim(), value),
                None => {
                    let key = match (ty, positional) {
                        (FieldType::Decimal, 0) => "precision",
                        (FieldType::Decimal, 1) => "scale",
                        (_, 0) => "length",
                        _ => {
                            debug!(token, param, "extra type parameter ignored");
                            continue;
                        }
                    };
                    apply_parameter(&mut field, key, param);
                    positional += 1;
                }
            }
        }
    }

    TypeSpec::Scalar {
        ty,
        length: field.length,
        precision: field.precision,
        scale: field.scale,
    }
}

/// Non-column results of an attribute block.
#[derive(Debug, Default)]
struct Attributes {
    index: bool,
    relationship: Option<String>,
    back_populates: Option<String>,
}

fn apply_attributes(field: &mut Field, line: &FieldLine<'_>, map: &ModelMap) -> Attributes {
    let mut out = Attributes::default();
    let mut not_null = false;

    for attr in line.attrs.map(|a| split_top_level(a, ',')).unwrap_or_default() {
        if let Some((key, value)) = attr.split_once(':') {
            match key.trim().to_ascii_lowercase().as_str() {
                "ref" => field.foreign_key = parse_ref(value, map, line.line),
                "default" => field.default = Some(value.trim().to_string()),
                "as" => out.relationship = Some(unquote(value).to_string()),
                "back_populates" => out.back_populates = Some(unquote(value).to_string()),
                "note" => {}
                key @ ("length" | "precision" | "scale") => apply_parameter(field, key, value),
                other => debug!(line = line.line, attr = other, "unknown attribute ignored"),
            }
            continue;
        }

        match attr.to_ascii_lowercase().as_str() {
            "pk" | "primary key" | "primary_key" => field.primary_key = true,
            "increment" | "autoincrement" => field.auto_increment = true,
            "unique" => field.unique = true,
            "nullable" | "null" => {}
            "not null" => not_null = true,
            "index" => out.index = true,
            other => debug!(line = line.line, attr = other, "unknown flag ignored"),
        }
    }

    field.nullable = !(field.primary_key || not_null);

    if field.foreign_key.is_none() && (out.relationship.is_some() || out.back_populates.is_some()) {
        debug!(line = line.line, field = %field.name, "relationship naming on a non-key field ignored");
    }
    out
}

fn apply_parameter(field: &mut Field, key: &str, value: &str) {
    let Ok(n) = unquote(value).parse::<u32>() else {
        warn!(field = %field.name, key, value, "non-numeric type parameter ignored");
        return;
    };
    match key.to_ascii_lowercase().as_str() {
        "length" => field.length = Some(n),
        "precision" => field.precision = Some(n),
        "scale" => field.scale = Some(n),
        _ => {}
    }
}

/// `> Table.field` → `"<canonical lower>.<field lower>"`. Unknown tables are
/// kept by name so the validator can report them.
fn parse_ref(value: &str, map: &ModelMap, line: usize) -> Option<String> {
    let value = value.trim();
    let Some(target) = value.strip_prefix('>') else {
        warn!(line, value, "only many-to-one (`>`) references are supported");
        return None;
    };
    let Some((table, column)) = target.trim().split_once('.') else {
        warn!(line, value, "reference must be written as Table.field");
        return None;
    };
    let table = map.resolve(table).unwrap_or(table);
    Some(format!("{}.{}", table.to_lowercase(), column.to_lowercase()))
}

fn parse_association(line: &FieldLine<'_>, target: String) -> Association {
    let mut back_populates = None;
    let mut annotated = false;
    for attr in line.attrs.map(|a| split_top_level(a, ',')).unwrap_or_default() {
        match attr.split_once(':') {
            Some((key, value)) if key.trim() == "back_populates" => {
                annotated = true;
                back_populates = Some(unquote(value).to_string());
            }
            Some((key, value)) if key.trim() == "relationship" => {
                annotated = true;
                if unquote(value) != "one-to-many" {
                    warn!(line = line.line, kind = unquote(value), "array fields are always one-to-many");
                }
            }
            _ => debug!(line = line.line, attr, "association attribute ignored"),
        }
    }
    if !annotated {
        warn!(
            line = line.line,
            field = line.name,
            "association without relationship annotations only produces a menu link"
        );
    }
    Association {
        field_name: line.name.to_string(),
        target,
        annotated,
        back_populates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table;

    fn resolve(src: &str) -> Vec<ResolvedTable> {
        let map = ModelMap::build(src);
        let blocks = table::scan(src);
        map.entries()
            .iter()
            .zip(&blocks)
            .map(|(entry, block)| resolve_table(entry, block, &map))
            .collect()
    }

    #[test]
    fn type_tokens() {
        assert_eq!(
            parse_type("String(64)"),
            TypeSpec::Scalar {
                ty: FieldType::String,
                length: Some(64),
                precision: None,
                scale: None
            }
        );
        assert_eq!(
            parse_type("Decimal[precision: 10, scale: 2]"),
            TypeSpec::Scalar {
                ty: FieldType::Decimal,
                length: None,
                precision: Some(10),
                scale: Some(2)
            }
        );
        assert_eq!(
            parse_type("numeric(12, 3)"),
            TypeSpec::Scalar {
                ty: FieldType::Decimal,
                length: None,
                precision: Some(12),
                scale: Some(3)
            }
        );
        assert_eq!(parse_type("LineItem[]"), TypeSpec::Array("LineItem".into()));
    }

    #[test]
    fn unknown_type_falls_back_to_string() {
        assert!(matches!(
            parse_type("Geometry"),
            TypeSpec::Scalar {
                ty: FieldType::String,
                ..
            }
        ));
        assert_eq!(primitive("TIMESTAMP"), Some(FieldType::DateTime));
        assert_eq!(primitive("uuid"), None);
    }

    #[test]
    fn constraint_defaults() {
        let tables = resolve(
            "table Country {\n  id Int [pk, increment]\n  name String [not null, unique]\n  note Text\n  code String [default: 'XX', length: 3]\n}\n",
        );
        let model = &tables[0].model;
        let id = model.field("id").unwrap();
        assert!(id.primary_key && id.auto_increment && !id.nullable);

        let name = model.field("name").unwrap();
        assert!(name.unique && !name.nullable);

        let note = model.field("note").unwrap();
        assert!(note.nullable);
        assert_eq!(note.default, None);

        let code = model.field("code").unwrap();
        assert_eq!(code.default.as_deref(), Some("'XX'"));
        assert_eq!(code.length, Some(3));
    }

    #[test]
    fn foreign_key_is_canonical_and_nullable() {
        let tables = resolve(
            "table Country {\n  id Int [pk]\n}\ntable Port {\n  id Int [pk]\n  country_id Int [ref: > Country.ID]\n  region_id Int [ref: > Region.id]\n}\n",
        );
        let port = &tables[1];
        let fk = port.model.field("country_id").unwrap();
        assert_eq!(fk.foreign_key.as_deref(), Some("s001_country.id"));
        assert!(fk.nullable);
        assert_eq!(
            port.model.field("region_id").unwrap().foreign_key.as_deref(),
            Some("region.id")
        );
        assert_eq!(
            port.links[0],
            ContextLink::related_table("S001_Country", "country_id")
        );
        assert_eq!(port.naming.len(), 2);
    }

    #[test]
    fn relationship_naming_overrides() {
        let tables = resolve(
            "table Port {\n  id Int [pk]\n}\ntable PortPair {\n  id Int [pk]\n  pol_id Int [ref: > Port.id, as: \"port_of_loading\", back_populates: \"pairs_loading\"]\n}\n",
        );
        assert_eq!(
            tables[1].naming,
            vec![FkNaming {
                field: "pol_id".into(),
                relationship: Some("port_of_loading".into()),
                back_populates: Some("pairs_loading".into()),
            }]
        );
    }

    #[test]
    fn association_fields() {
        let tables = resolve(
            "table Manifest {\n  id Int [pk]\n  line_items LineItem[] [relationship: \"one-to-many\", back_populates: \"manifest\"]\n  notes Note[]\n}\n",
        );
        let manifest = &tables[0];
        assert!(manifest.model.field("line_items").is_none());
        assert_eq!(
            manifest.associations[0],
            Association {
                field_name: "line_items".into(),
                target: "LineItem".into(),
                annotated: true,
                back_populates: Some("manifest".into()),
            }
        );
        assert!(!manifest.associations[1].annotated);
        assert_eq!(manifest.associations[1].back_populates, None);
        assert_eq!(
            manifest.links,
            vec![
                ContextLink::drill_down("LineItem", "line_items"),
                ContextLink::drill_down("Note", "notes"),
            ]
        );
    }

    #[test]
    fn explicit_indices() {
        let tables = resolve(
            "table Leg {\n  id Int [pk]\n  leg_number Int [index]\n  index ix_s001_leg_order [id, leg_number]\n}\n",
        );
        let names: Vec<_> = tables[0].model.indices.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["ix_s001_leg_leg_number", "ix_s001_leg_order"]);
    }
}
