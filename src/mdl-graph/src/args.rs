// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Splitting the arguments of a function call out of raw equation text.

use crate::builtins::canonical_function_name;
use crate::common::EquationResult;
use crate::eqn_err;
use crate::token::{Lexer, Token};

/// Returns the top-level, comma-separated arguments of the first call to
/// `function` in `equation`, each trimmed of surrounding whitespace.
///
/// Commas nested inside parentheses, brackets, quoted names, literals and
/// `{...}` comments do not split arguments.
pub fn function_arguments<'a>(equation: &'a str, function: &str) -> EquationResult<Vec<&'a str>> {
    let target = canonical_function_name(function);
    let mut lexer = Lexer::new(equation).peekable();

    // find `function (`
    let open = loop {
        let Some((start, tok, _)) = lexer.next() else {
            return eqn_err!(MalformedArgument, 0, equation.len());
        };
        if let Token::Ident(name) = tok
            && canonical_function_name(name) == target
            && let Some(&(_, Token::LParen, open_end)) = lexer.peek()
        {
            lexer.next();
            break (start, open_end);
        }
    };
    let (call_start, mut arg_start) = open;

    let mut args: Vec<&'a str> = Vec::new();
    let mut depth = 1usize;
    for (start, tok, end) in lexer {
        match tok {
            Token::LParen | Token::LBracket => depth += 1,
            Token::RParen | Token::RBracket => {
                depth -= 1;
                if depth == 0 {
                    let last = equation[arg_start..start].trim();
                    // `f()` has no arguments, `f(a,)` has an empty second one
                    if !(args.is_empty() && last.is_empty()) {
                        args.push(last);
                    }
                    return Ok(args);
                }
            }
            Token::Comma if depth == 1 => {
                args.push(equation[arg_start..start].trim());
                arg_start = end;
            }
            _ => {}
        }
    }

    eqn_err!(MalformedArgument, call_start, equation.len())
}

/// Returns argument `index` (0-based) of the first call to `function` in
/// `equation`.
pub fn function_argument<'a>(
    equation: &'a str,
    function: &str,
    index: usize,
) -> EquationResult<&'a str> {
    let args = function_arguments(equation, function)?;
    match args.get(index) {
        Some(arg) => Ok(*arg),
        None => eqn_err!(MalformedArgument, 0, equation.len()),
    }
}
