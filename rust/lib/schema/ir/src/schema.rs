//! Schema IR: aggregates every model for one compilation run.

use serde::{Deserialize, Serialize};

use crate::menu::Menus;
use crate::model::{Field, Model};

/// Version tag written at the top of every IR document.
pub const IR_VERSION: &str = "1.0";

/// The complete intermediate schema.
///
/// Once validated it is treated as immutable; emitters only read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub version: String,

    /// All models, in DSL declaration order.
    #[serde(rename = "Models", with = "crate::keyed")]
    pub models: Vec<Model>,

    #[serde(rename = "Menus", default)]
    pub menus: Menus,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            version: IR_VERSION.to_string(),
            models: Vec::new(),
            menus: Menus::default(),
        }
    }
}

impl Schema {
    /// Find a model by canonical id (`S012_Port`).
    pub fn model(&self, id: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.id == id)
    }

    /// Find a model by storage name, case-insensitively (`s012_port`).
    pub fn model_by_table(&self, table: &str) -> Option<&Model> {
        self.models
            .iter()
            .find(|m| m.id.eq_ignore_ascii_case(table))
    }

    /// Follow a field's `foreign_key` to the referenced model and column.
    pub fn resolve_foreign_key(&self, field: &Field) -> Option<(&Model, &Field)> {
        let (table, column) = field.foreign_key_parts()?;
        let target = self.model_by_table(table)?;
        let target_field = target
            .fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(column))?;
        Some((target, target_field))
    }

    /// Pretty JSON with a trailing newline; byte-identical for identical IR.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
