// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Vensim builtin names.
//!
//! Vensim matches function names without regard to case, and treats runs of
//! spaces and underscores inside them as a single separator.  Variable names
//! are NOT canonicalized this way; they are compared exactly as written.

/// The engine's built-in time variables.  They are never user variables and
/// never appear as edges in a dependency graph.
pub const DEFAULT_RESERVED: &[&str] = &["FINAL TIME", "TIME STEP", "INITIAL TIME", "SAVEPER", "Time"];

/// The function whose first argument is a stock's net flow and whose second
/// argument is its initial value.
pub const DEFAULT_STOCK_FUNCTION: &str = "INTEG";

/// The "no equation given, depends on (list)" placeholder.
pub const DEFAULT_PLACEHOLDER_FUNCTION: &str = "A FUNCTION OF";

/// Function names recognized out of the box.  Callers can replace this
/// table through `ParseOptions::functions`.
pub const DEFAULT_FUNCTIONS: &[&str] = &[
    // math
    "ABS",
    "EXP",
    "SQRT",
    "LN",
    "LOG",
    "SIN",
    "COS",
    "TAN",
    "ARCSIN",
    "ARCCOS",
    "ARCTAN",
    "INTEGER",
    "MODULO",
    "QUANTUM",
    "POWER",
    "MAX",
    "MIN",
    "VMAX",
    "VMIN",
    // conditionals and safe division
    "IF THEN ELSE",
    "ZIDZ",
    "XIDZ",
    // time input
    "PULSE",
    "PULSE TRAIN",
    "STEP",
    "RAMP",
    // delays and smoothing
    "SMOOTH",
    "SMOOTHI",
    "SMOOTH3",
    "SMOOTH3I",
    "SMOOTH N",
    "DELAY1",
    "DELAY1I",
    "DELAY3",
    "DELAY3I",
    "DELAY FIXED",
    "DELAY N",
    "DELAY CONVEYOR",
    "TREND",
    "FORECAST",
    // integration and state
    "INTEG",
    "ACTIVE INITIAL",
    "INITIAL",
    "REINITIAL",
    "SAMPLE IF TRUE",
    // lookups
    "WITH LOOKUP",
    "LOOKUP INVERT",
    "LOOKUP AREA",
    "LOOKUP EXTRAPOLATE",
    "LOOKUP FORWARD",
    "LOOKUP BACKWARD",
    "TABXL",
    "GET DATA AT TIME",
    "GET DATA LAST TIME",
    // arrays
    "SUM",
    "PROD",
    "ELMCOUNT",
    "VECTOR SELECT",
    "VECTOR ELM MAP",
    "VECTOR SORT ORDER",
    "VECTOR REORDER",
    "VECTOR LOOKUP",
    // random
    "RANDOM 0 1",
    "RANDOM UNIFORM",
    "RANDOM NORMAL",
    "RANDOM PINK NOISE",
    "RANDOM POISSON",
    // external data
    "GET XLS DATA",
    "GET XLS CONSTANTS",
    "GET XLS LOOKUPS",
    "GET DIRECT DATA",
    "GET DIRECT CONSTANTS",
    "GET DIRECT LOOKUPS",
    "GET DATA MEAN",
    // everything else
    "A FUNCTION OF",
    "GAME",
    "TIME BASE",
    "NPV",
    "ALLOCATE BY PRIORITY",
    "TABBED ARRAY",
];

fn is_separator(c: char) -> bool {
    c == ' ' || c == '_' || c == '\t' || c == '\n' || c == '\r'
}

/// Canonical spelling used to compare function names: uppercase, with
/// leading/trailing separators dropped and inner runs of separators
/// collapsed to one space.
pub fn canonical_function_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut pending_space = false;

    for c in name.chars() {
        if is_separator(c) {
            pending_space = !result.is_empty();
            continue;
        }
        if pending_space {
            result.push(' ');
            pending_space = false;
        }
        if c.is_ascii() {
            result.push(c.to_ascii_uppercase());
        } else {
            result.extend(c.to_uppercase());
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_function_name_case() {
        assert_eq!(canonical_function_name("integ"), "INTEG");
        assert_eq!(canonical_function_name("Integ"), "INTEG");
        assert_eq!(canonical_function_name("SMOOTH3"), "SMOOTH3");
    }

    #[test]
    fn test_canonical_function_name_separators() {
        assert_eq!(canonical_function_name("IF_THEN_ELSE"), "IF THEN ELSE");
        assert_eq!(canonical_function_name("if  then\telse"), "IF THEN ELSE");
        assert_eq!(canonical_function_name("  A FUNCTION OF "), "A FUNCTION OF");
        assert_eq!(canonical_function_name("__"), "");
    }

    #[test]
    fn test_defaults_are_canonical() {
        for name in DEFAULT_FUNCTIONS {
            assert_eq!(&canonical_function_name(name), name);
        }
        assert!(DEFAULT_FUNCTIONS.contains(&DEFAULT_STOCK_FUNCTION));
        assert!(DEFAULT_FUNCTIONS.contains(&DEFAULT_PLACEHOLDER_FUNCTION));
    }
}
