// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Variable records, and parsing one variable block into a record.
//!
//! A block looks like
//!
//! ```text
//! Stock= INTEG (
//!     Inflow-Outflow,
//!         0)
//!     ~   people
//!     ~   The number of people.
//!     |
//! ```
//!
//! The declaration line holds the name, the definition operator and the
//! start of the equation.  The first line starting with `~` begins the
//! units, the next one begins the comment, and the comment runs to the end
//! of the block.

use std::collections::BTreeSet;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::args::function_arguments;
use crate::common::{EquationResult, ErrorCode, Ident, LineRange, VariableError};
use crate::document::strip_terminator;
use crate::eqn_err;
use crate::lines::join_lines;
use crate::options::Syntax;
use crate::references::{extract_references, token_key};
use crate::token::Lexer;

lazy_static! {
    static ref DELIMITER_HEAD: Regex = Regex::new(r"^\s*~?").unwrap();
    static ref TERMINATOR_TAIL: Regex = Regex::new(r"\s*\|\s*$").unwrap();
}

/// What follows the name on a declaration line.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// `name = equation`
    Equals,
    /// `name := data equation`
    Data,
    /// `range: element, element`
    SubscriptRange,
    /// Nothing: a lookup written `name(` with the table following.
    None,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equals => "=",
            Operator::Data => ":=",
            Operator::SubscriptRange => ":",
            Operator::None => "",
        }
    }

    /// Splits the operator off the text following a name.
    fn split(rest: &str) -> (Operator, &str) {
        let trimmed = rest.trim_start();
        if let Some(rest) = trimmed.strip_prefix(":=") {
            (Operator::Data, rest)
        } else if let Some(rest) = trimmed.strip_prefix('=') {
            (Operator::Equals, rest)
        } else if let Some(rest) = trimmed.strip_prefix(':') {
            (Operator::SubscriptRange, rest)
        } else {
            (Operator::None, trimmed)
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Stock,
    Flow,
    Auxiliary,
    Constant,
    Unclassified,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Stock => "stock",
            Role::Flow => "flow",
            Role::Auxiliary => "auxiliary",
            Role::Constant => "constant",
            Role::Unclassified => "unclassified",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VariableRecord {
    pub name: Ident,
    pub operator: Operator,
    /// The joined right hand side.  Empty when the block only declares its
    /// dependencies through the placeholder function.
    pub equation: String,
    pub units: String,
    pub comment: String,
    pub parents: BTreeSet<Ident>,
    /// Derived from every other record's parents.
    pub children: BTreeSet<Ident>,
    /// Derived from the whole graph.
    pub role: Role,
}

impl VariableRecord {
    pub fn new(name: &str, operator: Operator, equation: &str, units: &str, comment: &str) -> Self {
        VariableRecord {
            name: name.to_owned(),
            operator,
            equation: equation.to_owned(),
            units: units.to_owned(),
            comment: comment.to_owned(),
            parents: BTreeSet::new(),
            children: BTreeSet::new(),
            role: Role::Unclassified,
        }
    }

    /// True if both records were authored the same way, ignoring the
    /// derived children and role.
    pub fn same_definition(&self, other: &VariableRecord) -> bool {
        self.name == other.name
            && self.operator == other.operator
            && self.equation == other.equation
            && self.units == other.units
            && self.comment == other.comment
            && self.parents == other.parents
    }
}

/// Normalizes a right hand side and finds what it depends on.
///
/// The placeholder form is replaced by an empty equation, its arguments
/// still naming the parents.  Stock equations must split into exactly a
/// flow and an initial value.  Subscript ranges list elements, not
/// variables, so they have no parents.
pub(crate) fn equation_dependencies(
    operator: Operator,
    equation: &str,
    syntax: &Syntax,
) -> EquationResult<(String, BTreeSet<Ident>)> {
    if operator == Operator::SubscriptRange {
        return Ok((equation.to_owned(), BTreeSet::new()));
    }

    if syntax.is_placeholder(equation) {
        let args = function_arguments(equation, syntax.placeholder_function())?;
        let parents = args
            .iter()
            .flat_map(|arg| extract_references(arg, syntax))
            .collect();
        return Ok((String::new(), parents));
    }

    if syntax.is_stock_equation(equation) {
        let args = function_arguments(equation, syntax.stock_function())?;
        if args.len() != 2 {
            return eqn_err!(MalformedArgument, 0, equation.len());
        }
    }

    let parents = extract_references(equation, syntax).into_iter().collect();
    Ok((equation.to_owned(), parents))
}

fn is_delimiter_line(line: &str) -> bool {
    line.trim_start().starts_with('~')
}

/// Parses the lines of one block, found at `range` in the document, into a
/// record with its parents filled in.
pub fn parse_variable<S: AsRef<str>>(
    lines: &[S],
    range: LineRange,
    syntax: &Syntax,
) -> Result<VariableRecord, VariableError> {
    let malformed = |ident: Option<&Ident>, code: ErrorCode, details: String| {
        VariableError::new(ident.cloned(), range, code, Some(details))
    };

    let Some(first) = lines.first() else {
        return Err(malformed(None, ErrorCode::MalformedVariableBlock, "empty block".to_owned()));
    };
    let first = strip_terminator(first.as_ref());

    let declared = Lexer::new(first)
        .next()
        .and_then(|(_, tok, end)| token_key(&tok).map(|name| (name, end)));
    let Some((name, name_end)) = declared else {
        return Err(malformed(
            None,
            ErrorCode::MalformedVariableBlock,
            format!("no variable name in '{first}'"),
        ));
    };

    let (operator, rest) = Operator::split(&first[name_end..]);

    let Some(units_at) = (1..lines.len()).find(|&i| is_delimiter_line(lines[i].as_ref())) else {
        return Err(malformed(
            Some(&name),
            ErrorCode::MalformedVariableBlock,
            "no units line starting with '~'".to_owned(),
        ));
    };
    let Some(comment_at) =
        (units_at + 1..lines.len()).find(|&i| is_delimiter_line(lines[i].as_ref()))
    else {
        return Err(malformed(
            Some(&name),
            ErrorCode::MalformedVariableBlock,
            "no comment line starting with '~'".to_owned(),
        ));
    };

    let mut equation_lines: Vec<&str> = Vec::with_capacity(units_at);
    equation_lines.push(rest);
    equation_lines.extend(lines[1..units_at].iter().map(AsRef::as_ref));
    let equation = join_lines(&equation_lines, None, None);

    let units = join_lines(&lines[units_at..comment_at], Some(&*DELIMITER_HEAD), None);
    let comment = join_lines(
        &lines[comment_at..],
        Some(&*DELIMITER_HEAD),
        Some(&*TERMINATOR_TAIL),
    );

    let (equation, parents) = equation_dependencies(operator, &equation, syntax).map_err(|err| {
        malformed(
            Some(&name),
            err.code,
            format!("cannot split the arguments of '{equation}'"),
        )
    })?;

    Ok(VariableRecord {
        name,
        operator,
        equation,
        units,
        comment,
        parents,
        children: BTreeSet::new(),
        role: Role::Unclassified,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::split_lines;

    fn parse(text: &str) -> Result<VariableRecord, VariableError> {
        let lines = split_lines(text);
        let range = LineRange::new(0, lines.len());
        parse_variable(&lines, range, &Syntax::default())
    }

    fn names(names: &[&str]) -> BTreeSet<Ident> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_stock() {
        let var = parse("Stock= INTEG (\n\tInflow-Outflow 1,\n\t\t0)\n\t~\tpeople\n\t~\tHow many.\n\t|\n")
            .unwrap();
        assert_eq!("Stock", var.name);
        assert_eq!(Operator::Equals, var.operator);
        assert_eq!("INTEG ( Inflow-Outflow 1, 0)", var.equation);
        assert_eq!("people", var.units);
        assert_eq!("How many.", var.comment);
        assert_eq!(names(&["Inflow", "Outflow 1"]), var.parents);
        assert!(var.children.is_empty());
        assert_eq!(Role::Unclassified, var.role);
    }

    #[test]
    fn test_parse_empty_units_and_comment() {
        let var = parse("Inflow=\n\tIF THEN ELSE(Time = INITIAL TIME , 10 , 3 )\n\t~\n\t~\t\t|\n").unwrap();
        assert_eq!("IF THEN ELSE(Time = INITIAL TIME , 10 , 3 )", var.equation);
        assert_eq!("", var.units);
        assert_eq!("", var.comment);
        assert!(var.parents.is_empty());
    }

    #[test]
    fn test_parse_crlf_and_multiline_comment() {
        let var = parse("a = b * 2\r\n\t~\tm/s\r\n\t~\tfirst part\r\n\t\tsecond part\r\n\t|\r\n").unwrap();
        assert_eq!("b * 2", var.equation);
        assert_eq!("m/s", var.units);
        assert_eq!("first part second part", var.comment);
        assert_eq!(names(&["b"]), var.parents);
    }

    #[test]
    fn test_parse_placeholder() {
        let var = parse("x=\n\tA FUNCTION OF( X,Y)\n\t~\t\n\t~\t\t|\n").unwrap();
        assert_eq!("", var.equation);
        assert_eq!(names(&["X", "Y"]), var.parents);
    }

    #[test]
    fn test_parse_operators() {
        let var = parse("region: north, south\n\t~\t\n\t~\t\t|\n").unwrap();
        assert_eq!(Operator::SubscriptRange, var.operator);
        assert_eq!("north, south", var.equation);
        assert!(var.parents.is_empty());

        let var = parse("d := GET XLS DATA('f.xls', 'sheet', 'A', 'B2')\n\t~\t\n\t~\t\t|\n").unwrap();
        assert_eq!(Operator::Data, var.operator);
        assert!(var.parents.is_empty());

        let var = parse("effect lookup(\n\t[(0,0)-(2,2)],(0,0),(2,2))\n\t~\t\n\t~\t\t|\n").unwrap();
        assert_eq!("effect lookup", var.name);
        assert_eq!(Operator::None, var.operator);
        assert_eq!("( [(0,0)-(2,2)],(0,0),(2,2))", var.equation);
        assert!(var.parents.is_empty());
    }

    #[test]
    fn test_parse_quoted_and_subscripted_names() {
        let var = parse("\"net flow\"=\n\tin - out\n\t~\t\n\t~\t\t|\n").unwrap();
        assert_eq!("\"net flow\"", var.name);

        let var = parse("pop[ north ] = births[north]\n\t~\t\n\t~\t\t|\n").unwrap();
        assert_eq!("pop[north]", var.name);
        assert_eq!(names(&["births[north]"]), var.parents);
    }

    #[test]
    fn test_parse_missing_delimiters() {
        let err = parse("a = 1\n\t|\n").unwrap_err();
        assert_eq!(ErrorCode::MalformedVariableBlock, err.code);
        assert_eq!(Some("a".to_owned()), err.ident);

        let err = parse("a = 1\n\t~\tunits\n\t|\n").unwrap_err();
        assert_eq!(ErrorCode::MalformedVariableBlock, err.code);
        assert_eq!(LineRange::new(0, 3), err.lines);

        let err = parse("123 = 1\n\t~\n\t~\t|\n").unwrap_err();
        assert_eq!(ErrorCode::MalformedVariableBlock, err.code);
        assert_eq!(None, err.ident);
    }

    #[test]
    fn test_parse_bad_stock() {
        let err = parse("s = INTEG(a + b)\n\t~\n\t~\t|\n").unwrap_err();
        assert_eq!(ErrorCode::MalformedArgument, err.code);
        assert_eq!(Some("s".to_owned()), err.ident);

        let err = parse("s = INTEG(a, (b)\n\t~\n\t~\t|\n").unwrap_err();
        assert_eq!(ErrorCode::MalformedArgument, err.code);
    }

    #[test]
    fn test_same_definition_ignores_derived_fields() {
        let a = parse("a = b\n\t~\n\t~\t|\n").unwrap();
        let mut b = a.clone();
        b.role = Role::Auxiliary;
        b.children.insert("c".to_owned());
        assert!(a.same_definition(&b));
        b.units = "m".to_owned();
        assert!(!a.same_definition(&b));
    }
}
