//! Menu IR: routing metadata for the admin route/template layer.
//!
//! The compiler only records it; nothing in this workspace interprets it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Schema-wide menus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Menus {
    /// One entry per declared table, in declaration order.
    #[serde(rename = "Main", default)]
    pub main: Vec<MainEntry>,

    #[serde(rename = "Context", default)]
    pub context: BTreeMap<String, Vec<ContextLink>>,

    #[serde(rename = "Statistics", default)]
    pub statistics: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MainEntry {
    pub table: String,
    pub route: String,
}

impl MainEntry {
    pub fn for_table(table: &str) -> Self {
        Self {
            table: table.to_string(),
            route: format!("/view/{}", table),
        }
    }
}

/// Per-model menus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelMenus {
    #[serde(rename = "Context", default)]
    pub context: Vec<ContextLink>,

    #[serde(rename = "Statistics", default)]
    pub statistics: Vec<String>,
}

/// A contextual navigation link from one model's view to another's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextLink {
    /// From an association field (`items LineItem[]`) to the child rows.
    DrillDown { drill_down: String, route: String },
    /// From a foreign-key field to the referenced table.
    RelatedTable { related_table: String, route: String },
}

impl ContextLink {
    pub fn drill_down(table: &str, filter: &str) -> Self {
        ContextLink::DrillDown {
            drill_down: table.to_string(),
            route: format!("/view/{}?filter={}", table, filter),
        }
    }

    pub fn related_table(table: &str, filter: &str) -> Self {
        ContextLink::RelatedTable {
            related_table: table.to_string(),
            route: format!("/view/{}?filter={}", table, filter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_links_are_untagged() {
        let link = ContextLink::related_table("S012_Port", "port_id");
        let json = serde_json::to_value(&link).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"related_table": "S012_Port", "route": "/view/S012_Port?filter=port_id"})
        );
        let back: ContextLink = serde_json::from_value(json).unwrap();
        assert_eq!(back, link);

        let drill: ContextLink =
            serde_json::from_str(r#"{"drill_down": "LineItem", "route": "/view/LineItem?filter=items"}"#)
                .unwrap();
        assert_eq!(drill, ContextLink::drill_down("LineItem", "items"));
    }

    #[test]
    fn empty_menus_shape() {
        let json = serde_json::to_value(Menus::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"Main": [], "Context": {}, "Statistics": {}})
        );
    }
}
