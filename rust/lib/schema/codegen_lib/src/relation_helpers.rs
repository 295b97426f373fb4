//! Relationship helper generator
//!
//! Relational models (any foreign-key column) get a helper module the CRUD
//! blueprint calls instead of assigning form fields itself:
//! `get_related_data`, `create_with_relations`, `update_with_relations` and
//! `delete_with_relations`.

use anyhow::{Context, Result};
use shipdsl_ir::*;
use tracing::debug;

use crate::{
    plain_fields, py_str, related_inputs, Codegen, GeneratedCode, GeneratedFile, TableNaming,
    MODELS_PACKAGE,
};

#[derive(Debug, Clone, Default)]
pub struct RelationHelperGenerator {
    pub naming: TableNaming,
}

impl Codegen for RelationHelperGenerator {
    fn generate(&self, schema: &Schema) -> Result<GeneratedCode> {
        let mut files = Vec::new();
        let mut modules = Vec::new();

        for model in schema.models.iter().filter(|m| m.is_relational()) {
            let table = self.naming.table_name(model);
            let content = generate_helpers(schema, model)
                .with_context(|| format!("generating relationship helpers for {}", model.id))?;
            debug!(model = %model.id, "relationship helpers generated");
            files.push(GeneratedFile {
                path: format!("relationships/{}_helpers.py", table),
                content,
            });
            modules.push(format!("{}_helpers", table));
        }

        let mut init = String::from("# Auto-generated from the shipping schema. Do not edit.\n");
        for module in &modules {
            init.push_str(&format!("from . import {}\n", module));
        }
        files.push(GeneratedFile {
            path: "relationships/__init__.py".to_string(),
            content: init,
        });

        Ok(GeneratedCode { files })
    }

    fn language(&self) -> &str {
        "flask-relationships"
    }
}

fn generate_helpers(schema: &Schema, model: &Model) -> Result<String> {
    let inputs = related_inputs(schema, model)?;
    let mut output = String::new();

    // Import each class once, owner first.
    let mut classes: Vec<&str> = vec![model.id.as_str()];
    for input in &inputs {
        if !classes.contains(&input.target.id.as_str()) {
            classes.push(&input.target.id);
        }
    }

    output.push_str("# Auto-generated from the shipping schema. Do not edit.\n");
    output.push_str("from app import db\n");
    output.push_str(&format!(
        "from {} import {}\n\n",
        MODELS_PACKAGE,
        classes.join(", ")
    ));

    output.push_str("RELATION_FIELDS = [\n");
    for input in &inputs {
        output.push_str(&format!("    {},\n", py_str(&input.field.name)));
    }
    output.push_str("]\n\n");

    output.push_str("EDITABLE_FIELDS = [\n");
    for field in plain_fields(model) {
        output.push_str(&format!("    {},\n", py_str(&field.name)));
    }
    output.push_str("]\n");

    output.push_str("\n\ndef get_related_data():\n");
    output.push_str(&format!(
        "    \"\"\"Rows offered by the {} form's select inputs.\"\"\"\n",
        model.name
    ));
    output.push_str("    return {\n");
    for input in &inputs {
        output.push_str(&format!(
            "        {}: {}.query.all(),\n",
            py_str(&input.choices()),
            input.target.id
        ));
    }
    output.push_str("    }\n");

    output.push_str("\n\ndef _apply_form(item, form_data):\n");
    output.push_str("    for name in RELATION_FIELDS:\n");
    output.push_str("        if name in form_data:\n");
    output.push_str("            setattr(item, name, form_data[name] or None)\n");
    output.push_str("    for name in EDITABLE_FIELDS:\n");
    output.push_str("        if name in form_data:\n");
    output.push_str("            setattr(item, name, form_data[name])\n");

    output.push_str("\n\ndef _commit():\n");
    output.push_str("    try:\n");
    output.push_str("        db.session.commit()\n");
    output.push_str("    except Exception:\n");
    output.push_str("        db.session.rollback()\n");
    output.push_str("        raise\n");

    output.push_str("\n\ndef create_with_relations(form_data):\n");
    output.push_str(&format!("    item = {}()\n", model.id));
    output.push_str("    _apply_form(item, form_data)\n");
    output.push_str("    db.session.add(item)\n");
    output.push_str("    _commit()\n");
    output.push_str("    return item\n");

    output.push_str("\n\ndef update_with_relations(item, form_data):\n");
    output.push_str("    _apply_form(item, form_data)\n");
    output.push_str("    _commit()\n");
    output.push_str("    return item\n");

    output.push_str("\n\ndef delete_with_relations(item):\n");
    output.push_str("    db.session.delete(item)\n");
    output.push_str("    _commit()\n");

    Ok(output)
}
