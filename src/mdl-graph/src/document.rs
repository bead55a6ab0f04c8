// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! The raw, line-oriented view of a model file.
//!
//! A document is a header line, a variable section made of variable blocks
//! and whatever sits between them, and a trailing section that starts at
//! the first boundary line (a line made only of the boundary character).
//! Every line is kept with its terminator so unedited text can be written
//! back byte for byte.

use crate::common::{Ident, LineRange, Result};
use crate::import_err;
use crate::options::Syntax;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }

    /// The ending used by the first line of `text`, defaulting to `\n`.
    pub fn detect(text: &str) -> Self {
        match text.find('\n') {
            Some(i) if text[..i].ends_with('\r') => LineEnding::CrLf,
            _ => LineEnding::Lf,
        }
    }
}

/// Splits `text` into lines, each keeping its terminator.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split_inclusive('\n').collect()
}

pub(crate) fn strip_terminator(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// A variable declaration starts with a word character or a quote.
fn is_declaration_start(line: &str) -> bool {
    match line.chars().next() {
        Some(c) => c.is_alphanumeric() || c == '_' || c == '"',
        None => false,
    }
}

fn starts_with_keyword(line: &str, keyword: &str) -> bool {
    let line = line.trim_start();
    line.len() >= keyword.len()
        && line.is_char_boundary(keyword.len())
        && line[..keyword.len()].eq_ignore_ascii_case(keyword)
}

/// Where the three regions of a document are.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Sections {
    pub header: LineRange,
    pub variables: LineRange,
    pub trailing: LineRange,
}

/// Finds the header, variable section and trailing section of `lines`.
pub fn segment(lines: &[&str], syntax: &Syntax) -> Result<Sections> {
    if lines.is_empty() {
        return import_err!(MalformedDocument, "the document is empty".to_owned());
    }

    let boundary = lines
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, line)| syntax.is_boundary(strip_terminator(line)))
        .map(|(i, _)| i);

    match boundary {
        Some(boundary) => Ok(Sections {
            header: LineRange::new(0, 1),
            variables: LineRange::new(1, boundary),
            trailing: LineRange::new(boundary, lines.len()),
        }),
        None => import_err!(
            MalformedDocument,
            "no section boundary line ends the variable definitions".to_owned()
        ),
    }
}

/// A piece of the variable section, in document order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Part {
    /// Lines outside any variable block: blank separators, macro markers,
    /// group headings.  Kept verbatim.
    Verbatim(LineRange),
    /// The lines of one variable block, its blank terminator excluded.
    Block(LineRange),
}

/// Splits the variable section into blocks and the lines between them.
///
/// A block starts at a declaration line and ends just before the next blank
/// line.  A declaration with no blank line after it inside the section is an
/// `UnterminatedBlock` error.  Macro definitions, from `:MACRO:` through
/// `:END OF MACRO:`, declare no model variables and are kept verbatim.
pub fn extract_blocks(lines: &[&str], section: LineRange) -> Result<Vec<Part>> {
    let mut parts = Vec::new();
    let mut verbatim_start = section.start;
    let mut i = section.start;

    while i < section.end {
        if starts_with_keyword(lines[i], ":MACRO:") {
            i = (i + 1..section.end)
                .find(|&j| starts_with_keyword(lines[j], ":END OF MACRO:"))
                .map_or(section.end, |j| j + 1);
            continue;
        }
        if !is_declaration_start(lines[i]) {
            i += 1;
            continue;
        }

        let Some(end) = (i + 1..section.end).find(|&j| is_blank(lines[j])) else {
            return import_err!(
                UnterminatedBlock,
                format!(
                    "{}: no blank line ends the block starting '{}'",
                    LineRange::new(i, i + 1),
                    strip_terminator(lines[i])
                )
            );
        };

        if verbatim_start < i {
            parts.push(Part::Verbatim(LineRange::new(verbatim_start, i)));
        }
        parts.push(Part::Block(LineRange::new(i, end)));
        verbatim_start = end;
        i = end;
    }

    if verbatim_start < section.end {
        parts.push(Part::Verbatim(LineRange::new(verbatim_start, section.end)));
    }

    Ok(parts)
}

/// One part of a loaded variable section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Verbatim(LineRange),
    Block { ident: Ident, lines: LineRange },
}

/// The immutable text of a loaded model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    lines: Vec<String>,
    sections: Sections,
    segments: Vec<Segment>,
    line_ending: LineEnding,
}

impl Document {
    pub(crate) fn new(
        lines: Vec<String>,
        sections: Sections,
        segments: Vec<Segment>,
        line_ending: LineEnding,
    ) -> Self {
        Document {
            lines,
            sections,
            segments,
            line_ending,
        }
    }

    pub fn header(&self) -> &str {
        &self.lines[self.sections.header.start]
    }

    pub fn trailing(&self) -> &[String] {
        self.lines(self.sections.trailing)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Variable names in the order their blocks appear.
    pub fn block_idents(&self) -> impl Iterator<Item = &Ident> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Block { ident, .. } => Some(ident),
            Segment::Verbatim(_) => None,
        })
    }

    pub fn block_lines(&self, ident: &str) -> Option<LineRange> {
        self.segments.iter().find_map(|segment| match segment {
            Segment::Block { ident: i, lines } if i == ident => Some(*lines),
            _ => None,
        })
    }

    pub fn lines(&self, range: LineRange) -> &[String] {
        &self.lines[range.start..range.end]
    }

    pub fn sections(&self) -> Sections {
        self.sections
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }
}
