// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Finding the variables an equation refers to.

use std::collections::HashSet;

use crate::common::Ident;
use crate::options::Syntax;
use crate::token::{Lexer, Token};

/// The key a subscripted reference is stored under: the name as written,
/// directly followed by its bracketed subscript list with the whitespace
/// around each element removed.
pub fn subscripted_key(name: &str, subscript: &str) -> Ident {
    let elements: Vec<&str> = subscript.split(',').map(str::trim).collect();
    format!("{}[{}]", name, elements.join(","))
}

/// The reference a single name token stands for, if it is one.
pub(crate) fn token_key(tok: &Token<'_>) -> Option<Ident> {
    match *tok {
        Token::Ident(name) => Some(name.to_owned()),
        Token::Subscripted(name, subscript) => Some(subscripted_key(name, subscript)),
        _ => None,
    }
}

/// Returns the names of the variables `equation` references, in order of
/// first appearance and without duplicates.  Reserved names are never
/// returned, and neither are function names directly followed by `(`.  A
/// variable may share its name with a function when it isn't called.
pub fn extract_references(equation: &str, syntax: &Syntax) -> Vec<Ident> {
    let mut seen: HashSet<Ident> = HashSet::new();
    let mut refs: Vec<Ident> = Vec::new();
    let mut lexer = Lexer::new(equation).peekable();

    while let Some((_, tok, _)) = lexer.next() {
        if let Token::Ident(name) = tok
            && syntax.is_function(name)
            && let Some((_, Token::LParen, _)) = lexer.peek()
        {
            continue;
        }
        let Some(key) = token_key(&tok) else {
            continue;
        };
        if syntax.is_reserved(&key) {
            continue;
        }
        if seen.insert(key.clone()) {
            refs.push(key);
        }
    }

    refs
}
