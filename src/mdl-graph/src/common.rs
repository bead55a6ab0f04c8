// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fmt;
use std::{error, result};

/// A variable name exactly as it is written in the model text.
///
/// Names are compared with exact string equality: quotes, case and
/// subscript suffixes are all significant.
pub type Ident = String;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    DoesNotExist,
    MalformedDocument,
    UnterminatedBlock,
    MalformedVariableBlock,
    MalformedArgument,
    DanglingReference,
    DuplicateName,
    RoundTripMismatch,
    BadOptions,
    Engine,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ErrorCode::*;
        let name = match self {
            DoesNotExist => "does_not_exist",
            MalformedDocument => "malformed_document",
            UnterminatedBlock => "unterminated_block",
            MalformedVariableBlock => "malformed_variable_block",
            MalformedArgument => "malformed_argument",
            DanglingReference => "dangling_reference",
            DuplicateName => "duplicate_name",
            RoundTripMismatch => "round_trip_mismatch",
            BadOptions => "bad_options",
            Engine => "engine",
        };

        write!(f, "{name}")
    }
}

/// An error located by byte offsets inside a single equation string.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EquationError {
    pub start: usize,
    pub end: usize,
    pub code: ErrorCode,
}

impl fmt::Display for EquationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}:{}", self.start, self.end, self.code)
    }
}

impl error::Error for EquationError {}

/// A half-open range of 0-based line indices into the source document.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn new(start: usize, end: usize) -> Self {
        LineRange { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for LineRange {
    // humans count lines from 1
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.len() <= 1 {
            write!(f, "line {}", self.start + 1)
        } else {
            write!(f, "lines {}-{}", self.start + 1, self.end)
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Import,
    Model,
    Engine,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
    pub code: ErrorCode,
    pub details: Option<String>,
}

impl Error {
    pub fn new(kind: ErrorKind, code: ErrorCode, details: Option<String>) -> Self {
        Error {
            kind,
            code,
            details,
        }
    }

    pub fn get_details(&self) -> Option<String> {
        self.details.clone()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = match self.kind {
            ErrorKind::Import => "ImportError",
            ErrorKind::Model => "ModelError",
            ErrorKind::Engine => "EngineError",
        };
        match self.details {
            Some(ref details) => write!(f, "{}{{{}: {}}}", kind, self.code, details),
            None => write!(f, "{}{{{}}}", kind, self.code),
        }
    }
}

impl error::Error for Error {}

/// A problem with one variable block, located by its line range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableError {
    pub ident: Option<Ident>,
    pub lines: LineRange,
    pub code: ErrorCode,
    pub details: Option<String>,
}

impl VariableError {
    pub fn new(
        ident: Option<Ident>,
        lines: LineRange,
        code: ErrorCode,
        details: Option<String>,
    ) -> Self {
        VariableError {
            ident,
            lines,
            code,
            details,
        }
    }
}

impl fmt::Display for VariableError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.lines, self.code)?;
        if let Some(ref ident) = self.ident {
            write!(f, " in '{ident}'")?;
        }
        if let Some(ref details) = self.details {
            write!(f, " -- {details}")?;
        }
        Ok(())
    }
}

impl error::Error for VariableError {}

/// Why a document could not be loaded.
///
/// Structural problems abort the load immediately; problems inside
/// individual variable blocks are all collected before giving up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    Document(Error),
    Variables(Vec<VariableError>),
}

impl LoadError {
    /// Every error code reported by this failure, in document order.
    pub fn codes(&self) -> Vec<ErrorCode> {
        match self {
            LoadError::Document(err) => vec![err.code],
            LoadError::Variables(errors) => errors.iter().map(|e| e.code).collect(),
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LoadError::Document(err) => write!(f, "{err}"),
            LoadError::Variables(errors) => {
                write!(f, "{} variable(s) have errors", errors.len())?;
                for err in errors {
                    write!(f, "\n  {err}")?;
                }
                Ok(())
            }
        }
    }
}

impl error::Error for LoadError {}

impl From<Error> for LoadError {
    fn from(err: Error) -> Self {
        LoadError::Document(err)
    }
}

pub type Result<T> = result::Result<T, Error>;
pub type EquationResult<T> = result::Result<T, EquationError>;

#[macro_export]
macro_rules! eqn_err(
    ($code:tt, $start:expr, $end:expr) => {{
        use $crate::common::{EquationError, ErrorCode};
        Err(EquationError{ start: $start, end: $end, code: ErrorCode::$code})
    }}
);

#[macro_export]
macro_rules! model_err(
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(
            ErrorKind::Model,
            ErrorCode::$code,
            Some($str),
        ))
    }}
);

#[macro_export]
macro_rules! import_err(
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(
            ErrorKind::Import,
            ErrorCode::$code,
            Some($str),
        ))
    }}
);

#[test]
fn test_line_range_display() {
    assert_eq!("line 3", LineRange::new(2, 3).to_string());
    assert_eq!("lines 3-7", LineRange::new(2, 7).to_string());
}

#[test]
fn test_error_display() {
    let err = Error::new(
        ErrorKind::Import,
        ErrorCode::MalformedDocument,
        Some("no boundary".to_owned()),
    );
    assert_eq!("ImportError{malformed_document: no boundary}", err.to_string());

    let err = VariableError::new(
        Some("stock".to_owned()),
        LineRange::new(4, 9),
        ErrorCode::MalformedVariableBlock,
        None,
    );
    assert_eq!("lines 5-9: malformed_variable_block in 'stock'", err.to_string());
}
