// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Reads Vensim MDL models into a variable dependency graph, classifies
//! every variable as a stock, flow, auxiliary or constant, and writes the
//! model back out, byte for byte where nothing was edited.

#![forbid(unsafe_code)]

pub mod common;

mod args;
mod builtins;
pub mod document;
pub mod engine;
pub mod graph;
mod lines;
mod model;
pub mod options;
mod references;
mod roles;
mod token;
pub mod variable;
mod writer;

pub use self::args::{function_argument, function_arguments};
pub use self::builtins::{
    DEFAULT_FUNCTIONS, DEFAULT_PLACEHOLDER_FUNCTION, DEFAULT_RESERVED, DEFAULT_STOCK_FUNCTION,
    canonical_function_name,
};
pub use self::common::{
    EquationError, Error, ErrorCode, ErrorKind, Ident, LineRange, LoadError, Result, VariableError,
};
pub use self::document::{Document, LineEnding};
pub use self::graph::{DanglingReference, DependencyGraph, DependencyGraphBuilder};
pub use self::lines::{join_lines, wrap_lines};
pub use self::model::{GraphExport, Model, VariableEdit};
pub use self::options::{ParseOptions, Syntax};
pub use self::references::{extract_references, subscripted_key};
pub use self::roles::classify;
pub use self::variable::{Operator, Role, VariableRecord, parse_variable};
pub use self::writer::serialize_variable;
