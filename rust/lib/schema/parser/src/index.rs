//! Index deriver: one index per foreign-key field.

use shipdsl_ir::{Index, Model};

/// `ix_<canonical lower>_<field>`; embeds the table, so it is unique
/// schema-wide.
pub fn derived_name(model: &Model, field: &str) -> String {
    format!("ix_{}_{}", model.table_name(), field)
}

pub fn derive(models: &mut [Model]) {
    for model in models.iter_mut() {
        let derived: Vec<Index> = model
            .foreign_key_fields()
            .map(|f| Index::new(derived_name(model, &f.name), vec![f.name.clone()]))
            .filter(|ix| !model.indices.iter().any(|existing| existing.name == ix.name))
            .collect();
        model.indices.extend(derived);
    }
}
