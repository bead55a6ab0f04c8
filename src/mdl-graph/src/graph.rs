// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, warn};

use crate::common::Ident;
use crate::variable::{Role, VariableRecord};

/// A parent edge whose target is not a variable of the model.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DanglingReference {
    pub from: Ident,
    pub to: Ident,
}

/// Records keyed by name.  Parent and child edges are stored as name sets
/// on each record, so stock/flow cycles need no special handling.
///
/// `children` is kept the exact inverse of `parents` over the records that
/// exist.  Parents naming a missing variable stay on the record and are
/// listed in `dangling`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    variables: BTreeMap<Ident, VariableRecord>,
    dangling: BTreeSet<DanglingReference>,
}

/// Collects records, refusing duplicate names, then links them.
#[derive(Debug, Default)]
pub struct DependencyGraphBuilder {
    variables: BTreeMap<Ident, VariableRecord>,
}

impl DependencyGraphBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds a record.  A record whose name is already taken is handed back.
    pub fn add(&mut self, record: VariableRecord) -> Result<(), VariableRecord> {
        if self.variables.contains_key(&record.name) {
            return Err(record);
        }
        self.variables.insert(record.name.clone(), record);
        Ok(())
    }

    pub fn build(self) -> DependencyGraph {
        let mut graph = DependencyGraph {
            variables: self.variables,
            dangling: BTreeSet::new(),
        };
        graph.link();
        debug!(
            variables = graph.variables.len(),
            dangling = graph.dangling.len(),
            "built dependency graph"
        );
        graph
    }
}

impl DependencyGraph {
    /// Recomputes every child set and the dangling list from the parents.
    fn link(&mut self) {
        for var in self.variables.values_mut() {
            var.children.clear();
        }
        self.dangling.clear();

        let edges: Vec<(Ident, Ident)> = self
            .variables
            .values()
            .flat_map(|var| var.parents.iter().map(move |p| (var.name.clone(), p.clone())))
            .collect();

        for (from, to) in edges {
            self.add_edge(from, to);
        }
    }

    fn add_edge(&mut self, from: Ident, to: Ident) {
        match self.variables.get_mut(&to) {
            Some(parent) => {
                parent.children.insert(from);
            }
            None => {
                warn!(from = %from, to = %to, "reference to an undefined variable");
                self.dangling.insert(DanglingReference { from, to });
            }
        }
    }

    fn remove_edge(&mut self, from: &str, to: &str) {
        match self.variables.get_mut(to) {
            Some(parent) => {
                parent.children.remove(from);
            }
            None => {
                self.dangling.remove(&DanglingReference {
                    from: from.to_owned(),
                    to: to.to_owned(),
                });
            }
        }
    }

    /// Swaps in a new definition for an existing record, updating only the
    /// edges that record owns.  Roles are left for the caller to
    /// reclassify.  Hands `record` back if no variable has its name.
    pub(crate) fn replace(&mut self, mut record: VariableRecord) -> Result<(), VariableRecord> {
        let name = record.name.clone();
        let new_parents = record.parents.clone();
        let Some(slot) = self.variables.get_mut(&name) else {
            return Err(record);
        };
        // nobody else's parents changed, so the children carry over
        record.children = std::mem::take(&mut slot.children);
        record.role = slot.role;
        let old = std::mem::replace(slot, record);

        for parent in &old.parents {
            self.remove_edge(&name, parent);
        }
        for parent in new_parents {
            self.add_edge(name.clone(), parent);
        }

        Ok(())
    }

    pub(crate) fn set_roles(&mut self, roles: &BTreeMap<Ident, Role>) {
        for (name, var) in self.variables.iter_mut() {
            var.role = roles.get(name).copied().unwrap_or(Role::Unclassified);
        }
    }

    pub fn get(&self, name: &str) -> Option<&VariableRecord> {
        self.variables.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Every record, ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = &VariableRecord> {
        self.variables.values()
    }

    pub fn parents(&self, name: &str) -> Option<&BTreeSet<Ident>> {
        self.variables.get(name).map(|var| &var.parents)
    }

    pub fn children(&self, name: &str) -> Option<&BTreeSet<Ident>> {
        self.variables.get(name).map(|var| &var.children)
    }

    pub fn dangling(&self) -> &BTreeSet<DanglingReference> {
        &self.dangling
    }
}
