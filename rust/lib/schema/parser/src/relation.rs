//! Foreign-key & relationship resolver.
//!
//! Runs once every table has finished its field pass. Explicit
//! associations are collected first; every foreign key then claims a
//! matching explicit relationship on its target or synthesizes an inverse
//! one, so both sides of every edge exist in the IR.

use std::collections::HashSet;

use shipdsl_ir::{Cardinality, Model, Relationship, RelationshipOrigin};
use tracing::{debug, warn};

use crate::field::ResolvedTable;
use crate::model_map::ModelMap;

pub fn resolve(tables: &mut [ResolvedTable], map: &ModelMap) {
    collect_explicit(tables, map);

    // (model index, relationship index) of explicit relationships already
    // paired with a foreign key.
    let mut claimed: HashSet<(usize, usize)> = HashSet::new();

    for owner in 0..tables.len() {
        for edge in foreign_key_edges(&tables[owner], tables) {
            resolve_edge(tables, owner, &edge, &mut claimed);
        }
    }

    for table in tables.iter() {
        for rel in table.model.relationships.iter().filter(|r| r.back_populates.is_empty()) {
            warn!(
                model = %table.model.id,
                field = %rel.field_name,
                target = %rel.target_model,
                "no foreign key pairs with this one-to-many"
            );
        }
    }
}

fn collect_explicit(tables: &mut [ResolvedTable], map: &ModelMap) {
    for table in tables.iter_mut() {
        for assoc in table.associations.iter().filter(|a| a.annotated) {
            // Left empty until a foreign key claims it.
            let back_populates = assoc.back_populates.clone().unwrap_or_default();
            let target_model = map
                .resolve(&assoc.target)
                .unwrap_or(&assoc.target)
                .to_string();
            debug!(
                model = %table.model.id,
                field = %assoc.field_name,
                target = %target_model,
                "explicit one-to-many collected"
            );
            table.model.relationships.push(Relationship {
                field_name: assoc.field_name.clone(),
                target_model,
                kind: Cardinality::OneToMany,
                back_populates,
                foreign_keys: None,
                origin: RelationshipOrigin::Explicit,
            });
        }
    }
}

/// One foreign-key field and everything needed to name its relationship.
#[derive(Debug)]
struct Edge {
    field: String,
    target: usize,
    name: String,
    /// `name` came from an `as:` override.
    named: bool,
    back_override: Option<String>,
    /// The owner holds more than one foreign key to `target`.
    shared_target: bool,
}

fn foreign_key_edges(table: &ResolvedTable, tables: &[ResolvedTable]) -> Vec<Edge> {
    let targets: Vec<(String, usize)> = table
        .model
        .foreign_key_fields()
        .filter_map(|field| {
            let (target_table, _) = field.foreign_key_parts()?;
            let target = tables
                .iter()
                .position(|t| t.model.id.eq_ignore_ascii_case(target_table));
            if target.is_none() {
                debug!(
                    model = %table.model.id,
                    field = %field.name,
                    "foreign key to unknown table left to the validator"
                );
            }
            Some((field.name.clone(), target?))
        })
        .collect();

    targets
        .iter()
        .map(|(field, target)| {
            let naming = table.naming.iter().find(|n| &n.field == field);
            Edge {
                field: field.clone(),
                target: *target,
                name: naming
                    .and_then(|n| n.relationship.clone())
                    .unwrap_or_else(|| default_relationship_name(field)),
                named: naming.is_some_and(|n| n.relationship.is_some()),
                back_override: naming.and_then(|n| n.back_populates.clone()),
                shared_target: targets.iter().filter(|(_, t)| t == target).count() > 1,
            }
        })
        .collect()
}

/// `country_id` → `country`; a field without the suffix gets `<field>_rel`
/// so it never shadows its own column.
pub fn default_relationship_name(field: &str) -> String {
    match field.strip_suffix("_id") {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => format!("{}_rel", field),
    }
}

fn resolve_edge(
    tables: &mut [ResolvedTable],
    owner: usize,
    edge: &Edge,
    claimed: &mut HashSet<(usize, usize)>,
) {
    let owner_id = tables[owner].model.id.clone();
    let target_id = tables[edge.target].model.id.clone();
    let foreign_keys = edge.shared_target.then(|| vec![edge.field.clone()]);

    let candidate = find_counterpart(&tables[edge.target].model, &owner_id, edge, claimed);
    let mut name = edge.name.clone();

    let back_populates = match candidate {
        Some(idx) => {
            claimed.insert((edge.target, idx));
            let rel = &mut tables[edge.target].model.relationships[idx];
            if rel.back_populates.is_empty() {
                rel.back_populates = name.clone();
            } else if rel.back_populates != name {
                if edge.named {
                    warn!(
                        model = %target_id,
                        field = %rel.field_name,
                        from = %rel.back_populates,
                        to = %name,
                        "explicit back_populates replaced by the key's `as:` name"
                    );
                    rel.back_populates = name.clone();
                } else {
                    debug!(
                        model = %owner_id,
                        field = %edge.field,
                        name = %rel.back_populates,
                        "many-to-one named after explicit back_populates"
                    );
                    name = rel.back_populates.clone();
                }
            }
            rel.foreign_keys = foreign_keys.clone();
            if let Some(back) = &edge.back_override {
                if back != &rel.field_name {
                    warn!(
                        model = %owner_id,
                        field = %edge.field,
                        "back_populates override ignored; an explicit relationship already pairs with this key"
                    );
                }
            }
            rel.field_name.clone()
        }
        None => {
            let inverse = edge
                .back_override
                .clone()
                .unwrap_or_else(|| format!("{}_{}", owner_id.to_lowercase(), name));
            tables[edge.target].model.relationships.push(Relationship {
                field_name: inverse.clone(),
                target_model: owner_id.clone(),
                kind: Cardinality::OneToMany,
                back_populates: name.clone(),
                foreign_keys: foreign_keys.clone(),
                origin: RelationshipOrigin::Inverse,
            });
            inverse
        }
    };

    debug!(
        model = %owner_id,
        relationship = %name,
        target = %target_id,
        back_populates = %back_populates,
        "many-to-one resolved"
    );
    tables[owner].model.relationships.push(Relationship {
        field_name: name,
        target_model: target_id,
        kind: Cardinality::ManyToOne,
        back_populates,
        foreign_keys,
        origin: RelationshipOrigin::ForeignKey,
    });
}

/// Pick the explicit one-to-many on `target` that this edge pairs with.
///
/// Owners are compared by canonical id, which keeps self references
/// working. An exact `back_populates` match always wins; when the owner has
/// a single key to the target, the first unclaimed candidate is taken and
/// its declared `back_populates` names the many-to-one side.
fn find_counterpart(
    target: &Model,
    owner_id: &str,
    edge: &Edge,
    claimed: &HashSet<(usize, usize)>,
) -> Option<usize> {
    let mut candidates = target
        .relationships
        .iter()
        .enumerate()
        .filter(|(idx, rel)| {
            rel.origin == RelationshipOrigin::Explicit
                && rel.target_model == owner_id
                && !claimed.contains(&(edge.target, *idx))
        })
        .peekable();

    let first = candidates.peek().map(|(idx, _)| *idx);
    let exact = candidates
        .find(|(_, rel)| rel.back_populates == edge.name)
        .map(|(idx, _)| idx);

    match exact {
        Some(idx) => Some(idx),
        None if !edge.shared_target => first,
        None => None,
    }
}
