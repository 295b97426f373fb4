//! Routing metadata handed to the admin view layer.

use shipdsl_ir::{MainEntry, Menus, Model};

/// Schema-wide menus: one main entry per table, in declaration order.
pub fn build(models: &[Model]) -> Menus {
    Menus {
        main: models.iter().map(|m| MainEntry::for_table(&m.name)).collect(),
        ..Menus::default()
    }
}
