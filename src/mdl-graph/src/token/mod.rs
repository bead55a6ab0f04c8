// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

// derived from Simlin's MDL equation tokenizer, trimmed down to the
// handful of token classes needed to find variable references

use unicode_xid::UnicodeXID;

use self::Token::*;


#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token<'input> {
    /// A bare name (possibly with inner spaces) or a quoted name, quotes
    /// included.
    Ident(&'input str),
    /// A name followed by a `[...]` suffix: the name and the text between
    /// the brackets.
    Subscripted(&'input str, &'input str),
    Num(&'input str),
    /// Contents of a single-quoted `'literal'`.
    Literal(&'input str),
    /// Contents of a colon keyword such as `:AND:`.
    Keyword(&'input str),

    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,

    /// Any other operator or punctuation, one or two characters long.
    Op(&'input str),
}

pub type Spanned<T> = (usize, T, usize);

fn is_ident_start(c: char) -> bool {
    UnicodeXID::is_xid_start(c) || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    UnicodeXID::is_xid_continue(c) || matches!(c, '_' | '$' | '\'' | '&' | '%')
}

fn is_inline_space(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Tokenizer for a single, already joined equation.
///
/// Tokenization is lenient: an unclosed quote, literal or comment runs to the
/// end of the input instead of failing, since the only consumer is
/// reference extraction and every byte of the input is still accounted for.
pub struct Lexer<'input> {
    text: &'input str,
    pos: usize,
}

impl<'input> Lexer<'input> {
    pub fn new(input: &'input str) -> Self {
        Lexer {
            text: input,
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn peek_at(&self, idx: usize) -> Option<char> {
        self.text.get(idx..).and_then(|s| s.chars().next())
    }

    /// Advance past a run of characters matching `pred`, returning the
    /// offset just after the run.
    fn take_while<F>(&mut self, mut pred: F) -> usize
    where
        F: FnMut(char) -> bool,
    {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        self.pos
    }

    /// Position just after the closing `delim` that ends a run started at
    /// `from`, honoring backslash escapes, or the end of the text.
    fn closing(&self, from: usize, delim: char) -> usize {
        let mut escaped = false;
        for (i, c) in self.text[from..].char_indices() {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == delim {
                return from + i + c.len_utf8();
            }
        }
        self.text.len()
    }

    /// Consume an optional `[...]` suffix after a name ending at `end`.
    fn subscript(&mut self, idx0: usize, end: usize) -> Spanned<Token<'input>> {
        let name = &self.text[idx0..end];
        let mut i = end;
        while let Some(c) = self.peek_at(i) {
            if !is_inline_space(c) {
                break;
            }
            i += c.len_utf8();
        }
        if self.peek_at(i) == Some('[')
            && let Some(close) = self.text[i..].find(']')
        {
            let close = i + close;
            self.pos = close + 1;
            return (idx0, Subscripted(name, &self.text[i + 1..close]), close + 1);
        }
        self.pos = end;
        (idx0, Ident(name), end)
    }

    fn bare_identifier(&mut self, idx0: usize) -> Spanned<Token<'input>> {
        // names can have internal spaces, but never trailing ones
        let mut end = idx0;
        let mut i = idx0;
        while let Some(c) = self.peek_at(i) {
            if is_ident_continue(c) {
                i += c.len_utf8();
                end = i;
            } else if is_inline_space(c) {
                i += c.len_utf8();
            } else {
                break;
            }
        }
        self.subscript(idx0, end)
    }

    fn quoted_identifier(&mut self, idx0: usize) -> Spanned<Token<'input>> {
        let end = self.closing(idx0 + 1, '"');
        self.subscript(idx0, end)
    }

    fn number(&mut self, idx0: usize) -> Spanned<Token<'input>> {
        self.take_while(|c| c.is_ascii_digit());
        if self.peek() == Some('.') {
            self.pos += 1;
            self.take_while(|c| c.is_ascii_digit());
        }
        if let Some('e' | 'E') = self.peek() {
            let mut i = self.pos + 1;
            if let Some('+' | '-') = self.peek_at(i) {
                i += 1;
            }
            if self.peek_at(i).is_some_and(|c| c.is_ascii_digit()) {
                self.pos = i;
                self.take_while(|c| c.is_ascii_digit());
            }
        }
        (idx0, Num(&self.text[idx0..self.pos]), self.pos)
    }

    fn literal(&mut self, idx0: usize) -> Spanned<Token<'input>> {
        let end = self.closing(idx0 + 1, '\'');
        self.pos = end;
        let inner_end = if end > idx0 + 1 && self.text[..end].ends_with('\'') {
            end - 1
        } else {
            end
        };
        (idx0, Literal(&self.text[idx0 + 1..inner_end]), end)
    }

    /// `:KEYWORD:` if the colon starts one, otherwise a bare colon.
    fn colon(&mut self, idx0: usize) -> Spanned<Token<'input>> {
        let rest = &self.text[idx0 + 1..];
        let len = rest
            .find(|c: char| !(c.is_ascii_alphabetic() || c == ' '))
            .unwrap_or(rest.len());
        if len > 0 && rest[len..].starts_with(':') {
            self.pos = idx0 + 1 + len + 1;
            return (idx0, Keyword(&rest[..len]), self.pos);
        }
        if rest.starts_with('=') {
            self.pos = idx0 + 2;
            return (idx0, Op(":="), self.pos);
        }
        self.pos = idx0 + 1;
        (idx0, Op(":"), self.pos)
    }

    fn operator(&mut self, idx0: usize, c: char) -> Spanned<Token<'input>> {
        let next = self.peek_at(idx0 + c.len_utf8());
        let len = match (c, next) {
            ('<', Some('=' | '>')) | ('>', Some('=')) => 2,
            _ => c.len_utf8(),
        };
        self.pos = idx0 + len;
        (idx0, Op(&self.text[idx0..self.pos]), self.pos)
    }
}

impl<'input> Iterator for Lexer<'input> {
    type Item = Spanned<Token<'input>>;

    fn next(&mut self) -> Option<Spanned<Token<'input>>> {
        loop {
            let idx0 = self.pos;
            let c = self.peek()?;
            let single = |lexer: &mut Self, tok| {
                lexer.pos = idx0 + 1;
                Some((idx0, tok, idx0 + 1))
            };
            return match c {
                '{' => {
                    self.pos = self.closing(idx0 + 1, '}');
                    continue;
                }
                '(' => single(self, LParen),
                ')' => single(self, RParen),
                '[' => single(self, LBracket),
                ']' => single(self, RBracket),
                ',' => single(self, Comma),
                '"' => Some(self.quoted_identifier(idx0)),
                '\'' => Some(self.literal(idx0)),
                ':' => Some(self.colon(idx0)),
                c if c.is_whitespace() => {
                    self.take_while(char::is_whitespace);
                    continue;
                }
                c if c.is_ascii_digit() => Some(self.number(idx0)),
                '.' if self.peek_at(idx0 + 1).is_some_and(|c| c.is_ascii_digit()) => {
                    Some(self.number(idx0))
                }
                c if is_ident_start(c) => Some(self.bare_identifier(idx0)),
                c => Some(self.operator(idx0, c)),
            };
        }
    }
}
