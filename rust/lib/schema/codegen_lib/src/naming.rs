//! Table naming policy shared by every emitter.

use serde::{Deserialize, Serialize};
use shipdsl_ir::Model;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    #[default]
    Lower,
    Upper,
}

/// How a model's canonical id becomes a storage/module name:
/// `prefix + format(id) + suffix`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableNaming {
    pub format: TableFormat,
    pub prefix: String,
    pub suffix: String,
}

impl TableNaming {
    pub fn table_for_id(&self, id: &str) -> String {
        let base = match self.format {
            TableFormat::Lower => id.to_lowercase(),
            TableFormat::Upper => id.to_uppercase(),
        };
        format!("{}{}{}", self.prefix, base, self.suffix)
    }

    pub fn table_name(&self, model: &Model) -> String {
        self.table_for_id(&model.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_lowercase_canonical_id() {
        let naming = TableNaming::default();
        assert_eq!(naming.table_for_id("S013_PortPair"), "s013_portpair");
    }

    #[test]
    fn format_prefix_suffix() {
        let upper = TableNaming {
            format: TableFormat::Upper,
            ..TableNaming::default()
        };
        assert_eq!(upper.table_for_id("S001_TestModel"), "S001_TESTMODEL");

        let affixed = TableNaming {
            format: TableFormat::Lower,
            prefix: "pre_".into(),
            suffix: "_sfx".into(),
        };
        assert_eq!(affixed.table_for_id("S001_TestModel"), "pre_s001_testmodel_sfx");
    }

    #[test]
    fn deserializes_partial_tables() {
        let naming: TableNaming = serde_json::from_str(r#"{"format": "upper"}"#).unwrap();
        assert_eq!(naming.format, TableFormat::Upper);
        assert_eq!(naming.prefix, "");
    }
}
