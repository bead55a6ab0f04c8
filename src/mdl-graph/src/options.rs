// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Dialect configuration.
//!
//! `ParseOptions` is the user-facing, serializable description of the text
//! format: which names are reserved, which identifiers are functions, and
//! the few designated markers.  `Syntax` is the compiled, immutable form
//! that the parser, classifier and serializer share.

use std::collections::HashSet;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::builtins::{
    DEFAULT_FUNCTIONS, DEFAULT_PLACEHOLDER_FUNCTION, DEFAULT_RESERVED, DEFAULT_STOCK_FUNCTION,
    canonical_function_name,
};
use crate::common::Result;
use crate::import_err;

const MIN_LINE_WIDTH: usize = 16;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    pub reserved: Vec<String>,
    pub functions: Vec<String>,
    pub stock_function: String,
    pub placeholder_function: String,
    pub boundary_char: char,
    pub max_line_width: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            reserved: DEFAULT_RESERVED.iter().map(|s| s.to_string()).collect(),
            functions: DEFAULT_FUNCTIONS.iter().map(|s| s.to_string()).collect(),
            stock_function: DEFAULT_STOCK_FUNCTION.to_owned(),
            placeholder_function: DEFAULT_PLACEHOLDER_FUNCTION.to_owned(),
            boundary_char: '*',
            max_line_width: 80,
        }
    }
}

impl ParseOptions {
    pub fn with_reserved<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_functions<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.functions = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_line_width(mut self, width: usize) -> Self {
        self.max_line_width = width;
        self
    }

    pub fn compile(&self) -> Result<Syntax> {
        Syntax::new(self)
    }
}

/// Builds `(?i)^\s*WORD[\s_]+WORD\s*\(` for a (possibly multi-word)
/// function name.
fn call_prefix_regex(canonical: &str) -> Result<Regex> {
    let words: Vec<String> = canonical.split(' ').map(regex::escape).collect();
    let pattern = format!(r"(?i)^\s*{}\s*\(", words.join(r"[\s_]+"));
    Regex::new(&pattern).or_else(|err| import_err!(BadOptions, err.to_string()))
}

#[derive(Clone, Debug)]
pub struct Syntax {
    reserved: HashSet<String>,
    functions: HashSet<String>,
    stock_function: String,
    placeholder_function: String,
    stock_re: Regex,
    placeholder_re: Regex,
    boundary_char: char,
    max_line_width: usize,
}

impl Syntax {
    pub fn new(options: &ParseOptions) -> Result<Self> {
        let stock_function = canonical_function_name(&options.stock_function);
        let placeholder_function = canonical_function_name(&options.placeholder_function);
        if stock_function.is_empty() || placeholder_function.is_empty() {
            return import_err!(
                BadOptions,
                "stock and placeholder function names must not be empty".to_owned()
            );
        }

        let boundary_char = options.boundary_char;
        if boundary_char.is_whitespace() || boundary_char.is_alphanumeric() || boundary_char == '"'
        {
            return import_err!(
                BadOptions,
                format!("'{boundary_char}' cannot mark the end of the variable section")
            );
        }

        if options.max_line_width < MIN_LINE_WIDTH {
            return import_err!(
                BadOptions,
                format!(
                    "max_line_width must be at least {MIN_LINE_WIDTH}, got {}",
                    options.max_line_width
                )
            );
        }

        let mut functions: HashSet<String> = options
            .functions
            .iter()
            .map(|f| canonical_function_name(f))
            .filter(|f| !f.is_empty())
            .collect();
        // both markers are function calls whatever the table says
        functions.insert(stock_function.clone());
        functions.insert(placeholder_function.clone());

        Ok(Syntax {
            reserved: options.reserved.iter().cloned().collect(),
            functions,
            stock_re: call_prefix_regex(&stock_function)?,
            placeholder_re: call_prefix_regex(&placeholder_function)?,
            stock_function,
            placeholder_function,
            boundary_char,
            max_line_width: options.max_line_width,
        })
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved.contains(name)
    }

    pub fn is_function(&self, name: &str) -> bool {
        self.functions.contains(&canonical_function_name(name))
    }

    pub fn stock_function(&self) -> &str {
        &self.stock_function
    }

    pub fn placeholder_function(&self) -> &str {
        &self.placeholder_function
    }

    /// True when the equation is a call to the stock function.
    pub fn is_stock_equation(&self, equation: &str) -> bool {
        self.stock_re.is_match(equation)
    }

    /// True when the equation is the "no equation given" placeholder.
    pub fn is_placeholder(&self, equation: &str) -> bool {
        self.placeholder_re.is_match(equation)
    }

    /// True for a line made up solely of the boundary character.  `line`
    /// must not include its terminator.
    pub fn is_boundary(&self, line: &str) -> bool {
        !line.is_empty() && line.chars().all(|c| c == self.boundary_char)
    }

    pub fn max_line_width(&self) -> usize {
        self.max_line_width
    }
}

impl Default for Syntax {
    fn default() -> Self {
        // the default options are known to compile
        ParseOptions::default()
            .compile()
            .unwrap_or_else(|err| unreachable!("default syntax failed to compile: {err}"))
    }
}
