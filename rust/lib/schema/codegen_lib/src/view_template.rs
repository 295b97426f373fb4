//! Jinja view template generator

use anyhow::{Context, Result};
use shipdsl_ir::*;
use tracing::debug;

use crate::{key_param, label, related_inputs, Codegen, GeneratedCode, GeneratedFile, RelatedInput, TableNaming};

/// `<table>/list.html`, `<table>/_row.html` and `<table>/form.html` for
/// every model. Foreign-key columns render as `<select>` inputs fed by the
/// blueprint's related rows.
#[derive(Debug, Clone, Default)]
pub struct ViewTemplateGenerator {
    pub naming: TableNaming,
}

impl Codegen for ViewTemplateGenerator {
    fn generate(&self, schema: &Schema) -> Result<GeneratedCode> {
        let mut files = Vec::new();

        for model in &schema.models {
            let table = self.naming.table_name(model);
            let inputs = related_inputs(schema, model)
                .with_context(|| format!("generating templates for {}", model.id))?;

            files.push(GeneratedFile {
                path: format!("{}/list.html", table),
                content: generate_list(model, &table),
            });
            files.push(GeneratedFile {
                path: format!("{}/_row.html", table),
                content: generate_row(model, &table, &inputs),
            });
            files.push(GeneratedFile {
                path: format!("{}/form.html", table),
                content: generate_form(model, &table, &inputs),
            });
            debug!(model = %model.id, "templates generated");
        }

        Ok(GeneratedCode { files })
    }

    fn language(&self) -> &str {
        "jinja"
    }
}

const TH_CLASS: &str =
    "px-6 py-3 border-b-2 border-gray-200 text-left text-xs font-semibold text-gray-600 uppercase tracking-wider";
const TD_CLASS: &str = "px-6 py-4 whitespace-nowrap border-b border-gray-200";
const INPUT_CLASS: &str =
    "shadow appearance-none border rounded w-full py-2 px-3 text-gray-700 leading-tight focus:outline-none focus:shadow-outline";

fn generate_list(model: &Model, table: &str) -> String {
    let mut output = String::new();

    output.push_str("{% extends \"base.html\" %}\n\n");
    output.push_str("{% block content %}\n");
    output.push_str("<div class=\"container mx-auto px-4 py-8\">\n");
    output.push_str("    <div class=\"flex justify-between items-center mb-6\">\n");
    output.push_str(&format!(
        "        <h1 class=\"text-2xl font-bold\">{} List</h1>\n",
        model.name
    ));
    output.push_str(&format!(
        "        <a href=\"{{{{ url_for('{0}.create_{0}') }}}}\" class=\"bg-blue-500 hover:bg-blue-700 text-white font-bold py-2 px-4 rounded\">Add New</a>\n",
        table
    ));
    output.push_str("    </div>\n\n");
    output.push_str("    <div class=\"overflow-x-auto\">\n");
    output.push_str("        <table class=\"min-w-full bg-white\">\n");
    output.push_str("            <thead>\n");
    output.push_str("                <tr class=\"bg-gray-100\">\n");
    for field in &model.fields {
        output.push_str(&format!(
            "                    <th class=\"{}\">{}</th>\n",
            TH_CLASS,
            label(&field.name)
        ));
    }
    output.push_str(&format!(
        "                    <th class=\"{}\">Actions</th>\n",
        TH_CLASS
    ));
    output.push_str("                </tr>\n");
    output.push_str("            </thead>\n");
    output.push_str("            <tbody hx-target=\"closest tr\" hx-swap=\"outerHTML\">\n");
    output.push_str("                {% for item in items %}\n");
    output.push_str(&format!(
        "                {{% include '{}/_row.html' %}}\n",
        table
    ));
    output.push_str("                {% endfor %}\n");
    output.push_str("            </tbody>\n");
    output.push_str("        </table>\n");
    output.push_str("    </div>\n");
    output.push_str("</div>\n");
    output.push_str("{% endblock %}\n");

    output
}

fn generate_row(model: &Model, table: &str, inputs: &[RelatedInput<'_>]) -> String {
    let mut output = String::new();
    let (_, pk) = key_param(model);

    output.push_str("<tr class=\"hover:bg-gray-50\">\n");
    for field in &model.fields {
        let value = match inputs.iter().find(|i| i.field.name == field.name) {
            Some(input) => format!(
                "{{{{ item.{0}.{1} if item.{0} else '' }}}}",
                input.relationship, input.display.name
            ),
            None => format!("{{{{ item.{} }}}}", field.name),
        };
        output.push_str(&format!("    <td class=\"{}\">{}</td>\n", TD_CLASS, value));
    }
    output.push_str(&format!("    <td class=\"{}\">\n", TD_CLASS));
    output.push_str(&format!(
        "        <a href=\"{{{{ url_for('{0}.edit_{0}', {1}=item.{1}) }}}}\" class=\"text-blue-600 hover:text-blue-900 mr-2\">Edit</a>\n",
        table, pk
    ));
    output.push_str(&format!(
        "        <button hx-delete=\"{{{{ url_for('{0}.delete_{0}', {1}=item.{1}) }}}}\" hx-confirm=\"Are you sure?\" class=\"text-red-600 hover:text-red-900\">Delete</button>\n",
        table, pk
    ));
    output.push_str("    </td>\n");
    output.push_str("</tr>\n");

    output
}

fn generate_form(model: &Model, table: &str, inputs: &[RelatedInput<'_>]) -> String {
    let mut output = String::new();

    output.push_str("{% extends \"base.html\" %}\n\n");
    output.push_str("{% block content %}\n");
    output.push_str("<div class=\"container mx-auto px-4 py-8\">\n");
    output.push_str(&format!(
        "    <h1 class=\"text-2xl font-bold mb-6\">{{{{ 'Edit' if edit else 'Add New' }}}} {}</h1>\n\n",
        model.name
    ));
    output.push_str("    <form method=\"post\" action=\"{{ form_action }}\" class=\"max-w-lg\">\n");

    for field in model.fields.iter().filter(|f| !f.primary_key) {
        output.push_str("        <div class=\"mb-4\">\n");
        output.push_str(&format!(
            "            <label for=\"{}\" class=\"block text-gray-700 text-sm font-bold mb-2\">{}</label>\n",
            field.name,
            label(&field.name)
        ));
        match inputs.iter().find(|i| i.field.name == field.name) {
            Some(input) => push_select(&mut output, field, input),
            None => push_input(&mut output, field),
        }
        output.push_str("        </div>\n");
    }

    output.push_str("        <div class=\"flex items-center justify-between mt-6\">\n");
    output.push_str("            <button type=\"submit\" class=\"bg-blue-500 hover:bg-blue-700 text-white font-bold py-2 px-4 rounded\">Save</button>\n");
    output.push_str(&format!(
        "            <a href=\"{{{{ url_for('{0}.list_{0}') }}}}\" class=\"text-gray-600 hover:text-gray-900\">Cancel</a>\n",
        table
    ));
    output.push_str("        </div>\n");
    output.push_str("    </form>\n");
    output.push_str("</div>\n");
    output.push_str("{% endblock %}\n");

    output
}

fn push_select(output: &mut String, field: &Field, input: &RelatedInput<'_>) {
    let target_pk = input
        .target
        .primary_key()
        .map(|f| f.name.as_str())
        .unwrap_or("id");
    output.push_str(&format!(
        "            <select id=\"{0}\" name=\"{0}\" class=\"{1}\"{2}>\n",
        field.name,
        INPUT_CLASS,
        if field.nullable { "" } else { " required" }
    ));
    output.push_str("                <option value=\"\">Select...</option>\n");
    output.push_str(&format!(
        "                {{% for related in {} %}}\n",
        input.choices()
    ));
    output.push_str(&format!(
        "                <option value=\"{{{{ related.{0} }}}}\" {{{{ 'selected' if edit and item.{1} == related.{0} else '' }}}}>{{{{ related.{2} }}}}</option>\n",
        target_pk, field.name, input.display.name
    ));
    output.push_str("                {% endfor %}\n");
    output.push_str("            </select>\n");
}

fn push_input(output: &mut String, field: &Field) {
    let required = if field.nullable { "" } else { " required" };
    let value = format!("{{{{ item.{} if edit and item.{} is not none else '' }}}}", field.name, field.name);

    match field.ty {
        FieldType::Text => {
            output.push_str(&format!(
                "            <textarea id=\"{0}\" name=\"{0}\" class=\"{1}\"{2}>{3}</textarea>\n",
                field.name, INPUT_CLASS, required, value
            ));
        }
        FieldType::Boolean => {
            output.push_str(&format!(
                "            <input type=\"checkbox\" id=\"{0}\" name=\"{0}\" value=\"1\" {{{{ 'checked' if edit and item.{0} else '' }}}}>\n",
                field.name
            ));
        }
        ty => {
            let (kind, extra) = match ty {
                FieldType::Integer => ("number", ""),
                FieldType::Float | FieldType::Decimal => ("number", " step=\"any\""),
                FieldType::Date => ("date", ""),
                FieldType::DateTime => ("datetime-local", ""),
                FieldType::Time => ("time", ""),
                _ => ("text", ""),
            };
            let maxlength = match field.length {
                Some(n) if ty == FieldType::String => format!(" maxlength=\"{}\"", n),
                _ => String::new(),
            };
            output.push_str(&format!(
                "            <input type=\"{1}\" id=\"{0}\" name=\"{0}\" value=\"{2}\" class=\"{3}\"{4}{5}{6}>\n",
                field.name, kind, value, INPUT_CLASS, extra, maxlength, required
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_input_types() {
        let mut out = String::new();
        let mut eta = Field::new("eta", FieldType::DateTime);
        eta.nullable = false;
        push_input(&mut out, &eta);
        assert!(out.contains("type=\"datetime-local\""));
        assert!(out.contains(" required>"));

        let mut out = String::new();
        let mut code = Field::new("code", FieldType::String);
        code.length = Some(5);
        push_input(&mut out, &code);
        assert!(out.contains("type=\"text\""));
        assert!(out.contains("maxlength=\"5\""));

        let mut out = String::new();
        push_input(&mut out, &Field::new("clauses", FieldType::Text));
        assert!(out.starts_with("            <textarea id=\"clauses\""));
    }

    #[test]
    fn row_links_use_the_primary_key() {
        let mut code = Field::new("code", FieldType::String);
        code.primary_key = true;
        let mut model = Model::new("S014_Country", "Country");
        model.fields = vec![code, Field::new("name", FieldType::String)];
        let html = generate_row(&model, "s014_country", &[]);
        assert!(html.contains("{{ url_for('s014_country.edit_s014_country', code=item.code) }}"));
        assert!(html.contains("{{ url_for('s014_country.delete_s014_country', code=item.code) }}"));
    }

    #[test]
    fn list_template() {
        let mut model = Model::new("S014_Country", "Country");
        model.fields = vec![Field::new("name", FieldType::String)];
        let html = generate_list(&model, "s014_country");
        assert!(html.contains("<h1 class=\"text-2xl font-bold\">Country List</h1>"));
        assert!(html.contains("{% include 's014_country/_row.html' %}"));
        assert!(html.contains("{{ url_for('s014_country.create_s014_country') }}"));
    }
}
