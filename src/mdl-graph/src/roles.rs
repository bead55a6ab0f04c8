// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Assigning each variable its dynamical role.
//!
//! Classification runs in a fixed order: stocks first, then flows (every
//! non-stock named in some stock's flow argument), then auxiliaries (any
//! remaining variable with parents), then constants.  It reads only the
//! authored equations and parents, never the previous roles, so running it
//! again on the same graph always gives the same answer.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::args::function_argument;
use crate::common::Ident;
use crate::graph::DependencyGraph;
use crate::options::Syntax;
use crate::references::extract_references;
use crate::variable::Role;

pub fn classify(graph: &DependencyGraph, syntax: &Syntax) -> BTreeMap<Ident, Role> {
    let stocks: BTreeSet<&Ident> = graph
        .iter()
        .filter(|var| syntax.is_stock_equation(&var.equation))
        .map(|var| &var.name)
        .collect();

    let mut flows: BTreeSet<Ident> = BTreeSet::new();
    for &stock in &stocks {
        let Some(var) = graph.get(stock) else {
            continue;
        };
        let flow = match function_argument(&var.equation, syntax.stock_function(), 0) {
            Ok(flow) => flow,
            Err(err) => {
                warn!(stock = %stock, error = %err, "cannot find the flow argument of a stock");
                continue;
            }
        };
        for name in extract_references(flow, syntax) {
            if graph.contains(&name) && !stocks.contains(&name) {
                flows.insert(name);
            }
        }
    }

    let roles: BTreeMap<Ident, Role> = graph
        .iter()
        .map(|var| {
            let role = if stocks.contains(&var.name) {
                Role::Stock
            } else if flows.contains(&var.name) {
                Role::Flow
            } else if !var.parents.is_empty() {
                Role::Auxiliary
            } else {
                Role::Constant
            };
            (var.name.clone(), role)
        })
        .collect();

    debug!(stocks = stocks.len(), flows = flows.len(), total = roles.len(), "classified variables");

    roles
}
