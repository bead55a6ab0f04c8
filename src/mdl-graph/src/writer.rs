// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Turning variable records back into block text.

use crate::document::LineEnding;
use crate::lines::wrap_lines;
use crate::options::Syntax;
use crate::variable::VariableRecord;

const EQUATION_PREFIX: &str = "\t";
const DELIMITER_PREFIX: &str = "\t~\t";
const CONTINUATION_PREFIX: &str = "\t\t";
const TERMINATOR: &str = "\t|";

/// The equation as it should be written: the placeholder form when the
/// record only declares its dependencies.
fn written_equation(var: &VariableRecord, syntax: &Syntax) -> String {
    if var.equation.is_empty() && !var.parents.is_empty() {
        let parents: Vec<&str> = var.parents.iter().map(String::as_str).collect();
        format!("{}({})", syntax.placeholder_function(), parents.join(", "))
    } else {
        var.equation.clone()
    }
}

/// Writes one variable block, each line carrying `ending`.  The blank line
/// separating blocks is not part of the block.
pub fn serialize_variable(var: &VariableRecord, syntax: &Syntax, ending: LineEnding) -> Vec<String> {
    let width = syntax.max_line_width();
    let mut lines = vec![format!("{}{}", var.name, var.operator.as_str())];

    let equation = written_equation(var, syntax);
    // an empty equation line would read as the end of the block
    if !equation.is_empty() {
        lines.extend(wrap_lines(&equation, width, EQUATION_PREFIX, CONTINUATION_PREFIX));
    }
    lines.extend(wrap_lines(&var.units, width, DELIMITER_PREFIX, CONTINUATION_PREFIX));
    lines.extend(wrap_lines(&var.comment, width, DELIMITER_PREFIX, CONTINUATION_PREFIX));
    lines.push(TERMINATOR.to_owned());

    let ending = ending.as_str();
    lines.into_iter().map(|line| line + ending).collect()
}
