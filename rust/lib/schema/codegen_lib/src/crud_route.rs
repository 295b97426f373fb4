//! Flask CRUD blueprint generator

use anyhow::{Context, Result};
use shipdsl_ir::*;
use tracing::debug;

use crate::{
    key_param, plain_fields, py_str, related_inputs, Codegen, GeneratedCode, GeneratedFile, TableNaming,
    MODELS_PACKAGE,
};

/// One blueprint module per model plus an `__init__.py` registering them
/// all on a parent `crud` blueprint.
///
/// Simple models assign form fields directly. Relational models delegate
/// to the helpers emitted by `RelationHelperGenerator` and pass the related
/// rows to their form.
#[derive(Debug, Clone, Default)]
pub struct CrudRouteGenerator {
    pub naming: TableNaming,
}

impl Codegen for CrudRouteGenerator {
    fn generate(&self, schema: &Schema) -> Result<GeneratedCode> {
        let mut files = Vec::new();

        for model in &schema.models {
            let table = self.naming.table_name(model);
            let content = generate_routes(schema, model, &table)
                .with_context(|| format!("generating routes for {}", model.id))?;
            debug!(model = %model.id, relational = model.is_relational(), "blueprint generated");
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
        "flask-routes"
    }
}

fn generate_routes(schema: &Schema, model: &Model, table: &str) -> Result<String> {
    let relational = model.is_relational();
    let class = &model.id;
    let (converter, key) = key_param(model);
    let mut output = String::new();

    output.push_str("# Auto-generated from the shipping schema. Do not edit.\n");
    output.push_str("from flask import Blueprint, flash, redirect, render_template, request, url_for\n\n");
    output.push_str("from app import db\n");
    output.push_str(&format!("from {} import {}\n", MODELS_PACKAGE, class));
    if relational {
        // Fails early if a key does not resolve.
        related_inputs(schema, model)?;
        output.push_str(&format!(
            "from .relationships.{}_helpers import (\n    get_related_data,\n    create_with_relations,\n    update_with_relations,\n    delete_with_relations,\n)\n",
            table
        ));
    }
    output.push('\n');
    output.push_str(&format!("bp = Blueprint({}, __name__)\n", py_str(table)));

    let form_extra = if relational { ", **get_related_data()" } else { "" };

    // List
    output.push_str(&format!("\n\n@bp.route('/{}')\n", table));
    output.push_str(&format!("def list_{}():\n", table));
    output.push_str(&format!("    items = {}.query.all()\n", class));
    output.push_str(&format!(
        "    return render_template('{}/list.html', items=items)\n",
        table
    ));

    // Create
    output.push_str(&format!(
        "\n\n@bp.route('/{}/create', methods=['GET', 'POST'])\n",
        table
    ));
    output.push_str(&format!("def create_{}():\n", table));
    output.push_str("    if request.method == 'POST':\n");
    output.push_str("        try:\n");
    if relational {
        output.push_str("            create_with_relations(request.form)\n");
    } else {
        output.push_str(&format!("            item = {}()\n", class));
        push_assignments(&mut output, model);
        output.push_str("            db.session.add(item)\n");
        output.push_str("            db.session.commit()\n");
    }
    output.push_str("            flash('Created successfully', 'success')\n");
    output.push_str(&format!(
        "            return redirect(url_for('{0}.list_{0}'))\n",
        table
    ));
    push_error_handler(&mut output, relational);
    output.push_str(&format!(
        "    return render_template('{0}/form.html', edit=False, form_action=url_for('{0}.create_{0}'){1})\n",
        table, form_extra
    ));

    // Edit
    output.push_str(&format!(
        "\n\n@bp.route('/{}/<{}:{}>/edit', methods=['GET', 'POST'])\n",
        table, converter, key
    ));
    output.push_str(&format!("def edit_{}({}):\n", table, key));
    output.push_str(&format!("    item = {}.query.get_or_404({})\n", class, key));
    output.push_str("    if request.method == 'POST':\n");
    output.push_str("        try:\n");
    if relational {
        output.push_str("            update_with_relations(item, request.form)\n");
    } else {
        push_assignments(&mut output, model);
        output.push_str("            db.session.commit()\n");
    }
    output.push_str("            flash('Updated successfully', 'success')\n");
    output.push_str(&format!(
        "            return redirect(url_for('{0}.list_{0}'))\n",
        table
    ));
    push_error_handler(&mut output, relational);
    output.push_str(&format!(
        "    return render_template('{0}/form.html', edit=True, item=item, form_action=url_for('{0}.edit_{0}', {2}={2}){1})\n",
        table, form_extra, key
    ));

    // Delete
    output.push_str(&format!(
        "\n\n@bp.route('/{}/<{}:{}>/delete', methods=['POST', 'DELETE'])\n",
        table, converter, key
    ));
    output.push_str(&format!("def delete_{}({}):\n", table, key));
    output.push_str(&format!("    item = {}.query.get_or_404({})\n", class, key));
    output.push_str("    try:\n");
    if relational {
        output.push_str("        delete_with_relations(item)\n");
    } else {
        output.push_str("        db.session.delete(item)\n");
        output.push_str("        db.session.commit()\n");
    }
    output.push_str("    except Exception as e:\n");
    if !relational {
        output.push_str("        db.session.rollback()\n");
    }
    output.push_str("        return str(e), 500\n");
    output.push_str("    return '', 204\n");

    Ok(output)
}

fn push_assignments(output: &mut String, model: &Model) {
    for field in plain_fields(model) {
        output.push_str(&format!("            if '{}' in request.form:\n", field.name));
        output.push_str(&format!(
            "                item.{0} = request.form['{0}']\n",
            field.name
        ));
    }
}

fn push_error_handler(output: &mut String, relational: bool) {
    output.push_str("        except Exception as e:\n");
    // Relationship helpers roll back themselves.
    if !relational {
        output.push_str("            db.session.rollback()\n");
    }
    output.push_str("            flash(f'Error: {e}', 'error')\n");
}

fn generate_init(schema: &Schema, naming: &TableNaming) -> String {
    let mut output = String::new();
    output.push_str("# Auto-generated from the shipping schema. Do not edit.\n");
    output.push_str("from flask import Blueprint\n\n");
    for model in &schema.models {
        output.push_str(&format!("from . import {}\n", naming.table_name(model)));
    }
    output.push_str("\nbp = Blueprint('crud', __name__)\n");
    for model in &schema.models {
        output.push_str(&format!(
            "bp.register_blueprint({}.bp)\n",
            naming.table_name(model)
        ));
    }
    output
}
