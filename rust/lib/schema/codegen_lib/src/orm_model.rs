//! SQLAlchemy model generator

use anyhow::{Context, Result};
use shipdsl_ir::*;
use tracing::debug;

use crate::{py_str, Codegen, GeneratedCode, GeneratedFile, TableNaming, MODELS_PACKAGE};

/// One `db.Model` class per model, in `<table>.py`, plus an `__init__.py`
/// importing every class so string relationship targets resolve.
#[derive(Debug, Clone, Default)]
pub struct OrmModelGenerator {
    pub naming: TableNaming,
}

impl Codegen for OrmModelGenerator {
    fn generate(&self, schema: &Schema) -> Result<GeneratedCode> {
        let mut files = Vec::new();

        for model in &schema.models {
            let table = self.naming.table_name(model);
            let content = generate_model(schema, model, &self.naming)
                .with_context(|| format!("generating model {}", model.id))?;
            debug!(model = %model.id, table = %table, "model class generated");
            files.push(GeneratedFile {
                path: format!("{}.py", table),
                content,
            });
        }

        files.push(GeneratedFile {
            path: "__init__.py".to_string(),
            content: generate_init(schema, &self.naming),
        });

        Ok(GeneratedCode { files })
    }

    fn language(&self) -> &str {
        "sqlalchemy"
    }
}

fn generate_model(schema: &Schema, model: &Model, naming: &TableNaming) -> Result<String> {
    let mut output = String::new();
    let table = naming.table_name(model);

    output.push_str("# Auto-generated from the shipping schema. Do not edit.\n");
    output.push_str("from app import db\n");
    if !model.indices.is_empty() {
        output.push_str("from sqlalchemy import Index\n");
    }
    output.push_str("\n\n");

    output.push_str(&format!("class {}(db.Model):\n", model.id));
    output.push_str(&format!("    __tablename__ = {}\n", py_str(&table)));

    if !model.indices.is_empty() {
        output.push_str("    __table_args__ = (\n");
        for index in &model.indices {
            let columns: Vec<String> = index.columns.iter().map(|c| py_str(c)).collect();
            output.push_str(&format!(
                "        Index({}, {}),\n",
                py_str(&index_name(model, &table, &index.name)),
                columns.join(", ")
            ));
        }
        output.push_str("    )\n");
    }
    output.push('\n');

    for field in &model.fields {
        output.push_str(&format!(
            "    {} = db.Column({})\n",
            field.name,
            column_args(schema, field, naming)?
        ));
    }

    if !model.relationships.is_empty() {
        output.push('\n');
    }
    for rel in &model.relationships {
        output.push_str(&format!(
            "    {} = db.relationship({})\n",
            rel.field_name,
            relationship_args(model, rel)?
        ));
    }

    output.push('\n');
    output.push_str("    def __repr__(self):\n");
    let pk = model
        .primary_key()
        .map(|f| f.name.as_str())
        .unwrap_or("id");
    output.push_str(&format!(
        "        return f'<{} {{self.{}}}>'\n",
        model.name, pk
    ));

    Ok(output)
}

/// Index names follow the emitted table name. Names scoped to the
/// canonical table (`ix_s011_leg_*`) are re-scoped to `table`; other names
/// are prefixed unless they already mention it.
pub fn index_name(model: &Model, table: &str, name: &str) -> String {
    let canonical = format!("ix_{}_", model.table_name());
    let lower = name.to_lowercase();
    if lower.starts_with(&canonical) {
        if let Some(rest) = name.get(canonical.len()..) {
            return format!("ix_{}_{}", table, rest);
        }
    }
    if lower.contains(&table.to_lowercase()) {
        name.to_string()
    } else {
        format!("ix_{}_{}", table, name)
    }
}

fn column_type(field: &Field) -> String {
    match field.ty {
        FieldType::Integer => "db.Integer".to_string(),
        FieldType::String => format!("db.String({})", field.length.unwrap_or(255)),
        FieldType::Text => "db.Text".to_string(),
        FieldType::DateTime => "db.DateTime".to_string(),
        FieldType::Date => "db.Date".to_string(),
        FieldType::Time => "db.Time".to_string(),
        FieldType::Float => "db.Float".to_string(),
        FieldType::Decimal => match (field.precision, field.scale) {
            (None, None) => "db.Numeric".to_string(),
            (Some(p), None) => format!("db.Numeric(precision={})", p),
            (p, s) => format!(
                "db.Numeric(precision={}, scale={})",
                p.unwrap_or(10),
                s.unwrap_or(0)
            ),
        },
        FieldType::Boolean => "db.Boolean".to_string(),
    }
}

fn column_args(schema: &Schema, field: &Field, naming: &TableNaming) -> Result<String> {
    let mut args = vec![column_type(field)];

    if field.is_foreign_key() {
        let (target, column) = schema.resolve_foreign_key(field).with_context(|| {
            format!(
                "foreign key {} on {} does not resolve",
                field.foreign_key.as_deref().unwrap_or_default(),
                field.name
            )
        })?;
        args.push(format!(
            "db.ForeignKey({})",
            py_str(&format!("{}.{}", naming.table_name(target), column.name))
        ));
    }
    if field.primary_key {
        args.push("primary_key=True".to_string());
    }
    if field.auto_increment {
        args.push("autoincrement=True".to_string());
    }
    // Primary keys are implicitly not null.
    if !field.nullable && !field.primary_key {
        args.push("nullable=False".to_string());
    }
    if field.unique {
        args.push("unique=True".to_string());
    }
    if let Some(default) = &field.default {
        args.push(format!("default={}", python_default(field.ty, default)));
    }

    Ok(args.join(", "))
}

/// Translate a DSL default literal into Python.
fn python_default(ty: FieldType, literal: &str) -> String {
    let literal = literal.trim();
    for q in ['"', '\''] {
        if let Some(inner) = literal.strip_prefix(q).and_then(|l| l.strip_suffix(q)) {
            return py_str(inner);
        }
    }
    match literal.to_ascii_lowercase().as_str() {
        "true" => return "True".to_string(),
        "false" => return "False".to_string(),
        "null" | "none" => return "None".to_string(),
        "now" | "now()" if matches!(ty, FieldType::DateTime | FieldType::Date | FieldType::Time) => {
            return "db.func.now()".to_string()
        }
        _ => {}
    }
    if literal.parse::<f64>().is_ok() {
        literal.to_string()
    } else {
        py_str(literal)
    }
}

fn relationship_args(model: &Model, rel: &Relationship) -> Result<String> {
    let mut args = vec![
        py_str(&rel.target_model),
        format!("back_populates={}", py_str(&rel.back_populates)),
    ];

    // Key columns always live on the many-to-one side.
    let holder = match rel.kind {
        Cardinality::ManyToOne => model.id.as_str(),
        Cardinality::OneToMany => rel.target_model.as_str(),
    };
    if let Some(keys) = &rel.foreign_keys {
        let keys: Vec<String> = keys.iter().map(|k| format!("{}.{}", holder, k)).collect();
        args.push(format!("foreign_keys={}", py_str(&format!("[{}]", keys.join(", ")))));
    }

    match rel.kind {
        Cardinality::OneToMany => args.push("lazy='dynamic'".to_string()),
        Cardinality::ManyToOne if rel.target_model == model.id => {
            let pk = model
                .primary_key()
                .with_context(|| format!("self reference {} needs a primary key", rel.field_name))?;
            args.push(format!(
                "remote_side={}",
                py_str(&format!("[{}.{}]", model.id, pk.name))
            ));
        }
        Cardinality::ManyToOne => {}
    }

    Ok(args.join(", "))
}

fn generate_init(schema: &Schema, naming: &TableNaming) -> String {
    let mut output = String::new();
    output.push_str("# Auto-generated from the shipping schema. Do not edit.\n");
    for model in &schema.models {
        output.push_str(&format!(
            "from {}.{} import {}\n",
            MODELS_PACKAGE,
            naming.table_name(model),
            model.id
        ));
    }
    output.push_str("\n__all__ = [\n");
    for model in &schema.models {
        output.push_str(&format!("    {},\n", py_str(&model.id)));
    }
    output.push_str("]\n");
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_types() {
        let mut name = Field::new("name", FieldType::String);
        assert_eq!(column_type(&name), "db.String(255)");
        name.length = Some(64);
        assert_eq!(column_type(&name), "db.String(64)");

        let mut rate = Field::new("rate", FieldType::Decimal);
        rate.precision = Some(10);
        rate.scale = Some(2);
        assert_eq!(column_type(&rate), "db.Numeric(precision=10, scale=2)");
    }

    #[test]
    fn defaults() {
        assert_eq!(python_default(FieldType::Boolean, "true"), "True");
        assert_eq!(python_default(FieldType::String, "\"XX\""), "'XX'");
        assert_eq!(python_default(FieldType::Integer, "0"), "0");
        assert_eq!(python_default(FieldType::DateTime, "now()"), "db.func.now()");
        assert_eq!(python_default(FieldType::String, "pending"), "'pending'");
    }

    #[test]
    fn index_names_are_table_scoped() {
        let model = Model::new("S011_Leg", "Leg");
        assert_eq!(index_name(&model, "s011_leg", "ix_s011_leg_voyage_id"), "ix_s011_leg_voyage_id");
        assert_eq!(index_name(&model, "s011_leg", "by_route"), "ix_s011_leg_by_route");
    }

    #[test]
    fn index_names_follow_table_naming() {
        let model = Model::new("S011_Leg", "Leg");
        assert_eq!(
            index_name(&model, "tbl_S011_LEG", "ix_s011_leg_voyage_id"),
            "ix_tbl_S011_LEG_voyage_id"
        );
        assert_eq!(index_name(&model, "tbl_S011_LEG", "by_route"), "ix_tbl_S011_LEG_by_route");
        assert_eq!(
            index_name(&model, "tbl_S011_LEG", "tbl_s011_leg_order"),
            "tbl_s011_leg_order"
        );
    }
}
