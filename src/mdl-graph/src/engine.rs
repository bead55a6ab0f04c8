// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! The boundary to an external simulation engine.
//!
//! Nothing here talks to a real engine.  `SimulationEngine` is the shape a
//! binding has to provide; the helpers decode what such engines hand back
//! (numeric status codes and NUL-separated string buffers) and derive
//! variable roles from engine-reported variable types.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use tracing::debug;

use crate::common::{Error, ErrorCode, ErrorKind, Ident};
use crate::options::Syntax;
use crate::references::subscripted_key;
use crate::variable::Role;

/// A non-success status reported by an engine call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineError {
    pub code: i32,
    pub details: Option<String>,
}

impl EngineError {
    pub fn new(code: i32, details: Option<String>) -> Self {
        EngineError { code, details }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.details {
            Some(ref details) => write!(f, "engine status {}: {}", self.code, details),
            None => write!(f, "engine status {}", self.code),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<EngineError> for Error {
    fn from(err: EngineError) -> Self {
        Error::new(ErrorKind::Engine, ErrorCode::Engine, Some(err.to_string()))
    }
}

/// How an engine call signals failure.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StatusConvention {
    /// Anything other than this value is a failure.
    SuccessIs(i32),
    /// Only this value is a failure; other values (often sizes) are data.
    FailureIs(i32),
}

impl Default for StatusConvention {
    fn default() -> Self {
        StatusConvention::SuccessIs(1)
    }
}

/// Turns a raw status into the status itself or an `EngineError`.  Callers
/// never retry.
pub fn check_status(status: i32, convention: StatusConvention, what: &str) -> Result<i32, EngineError> {
    let failed = match convention {
        StatusConvention::SuccessIs(ok) => status != ok,
        StatusConvention::FailureIs(bad) => status == bad,
    };
    if failed {
        Err(EngineError::new(status, Some(what.to_owned())))
    } else {
        Ok(status)
    }
}

/// The per-variable attributes an engine can be asked for, by their wire
/// codes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum VariableAttribute {
    Units = 1,
    Comment = 2,
    Equation = 3,
    Causes = 4,
    Uses = 5,
    InitialCauses = 6,
    ActiveCauses = 7,
    Subscripts = 8,
    SubscriptCombinations = 9,
    GraphSubscripts = 10,
    Min = 11,
    Max = 12,
    Range = 13,
    Type = 14,
}

impl VariableAttribute {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        use VariableAttribute::*;
        let attr = match code {
            1 => Units,
            2 => Comment,
            3 => Equation,
            4 => Causes,
            5 => Uses,
            6 => InitialCauses,
            7 => ActiveCauses,
            8 => Subscripts,
            9 => SubscriptCombinations,
            10 => GraphSubscripts,
            11 => Min,
            12 => Max,
            13 => Range,
            14 => Type,
            _ => return None,
        };
        Some(attr)
    }

    /// List attributes come back as several NUL-separated strings.
    pub fn is_list(self) -> bool {
        (4..=10).contains(&self.code())
    }
}

impl fmt::Display for VariableAttribute {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use VariableAttribute::*;
        let name = match self {
            Units => "units",
            Comment => "comment",
            Equation => "equation",
            Causes => "causes",
            Uses => "uses",
            InitialCauses => "initial causes",
            ActiveCauses => "active causes",
            Subscripts => "subscripts",
            SubscriptCombinations => "subscript combinations",
            GraphSubscripts => "graph subscripts",
            Min => "minimum",
            Max => "maximum",
            Range => "range",
            Type => "type",
        };
        write!(f, "{name}")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttributeValue {
    Text(String),
    List(Vec<String>),
}

impl AttributeValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(text) => Some(text),
            AttributeValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            AttributeValue::List(items) => Some(items),
            AttributeValue::Text(_) => None,
        }
    }
}

/// Decodes a raw attribute buffer.  List attributes are split on NUL with
/// empty entries dropped; scalar attributes end at the first NUL.
pub fn decode_attribute_buffer(attribute: VariableAttribute, buf: &[u8]) -> AttributeValue {
    if attribute.is_list() {
        let items = buf
            .split(|&b| b == 0)
            .filter(|item| !item.is_empty())
            .map(|item| String::from_utf8_lossy(item).into_owned())
            .collect();
        AttributeValue::List(items)
    } else {
        let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
        AttributeValue::Text(String::from_utf8_lossy(&buf[..end]).into_owned())
    }
}

/// One scalar name per subscript element, or the bare name when the
/// variable has no subscripts.  Only one subscript dimension is expanded.
pub fn subscripted_names(name: &str, elements: &[String]) -> Vec<Ident> {
    if elements.is_empty() {
        return vec![name.to_owned()];
    }
    elements
        .iter()
        .map(|element| subscripted_key(name, element))
        .collect()
}

/// An engine that can load a model and step it.
pub trait SimulationEngine {
    type Session;

    fn load(&mut self, path: &Path) -> Result<Self::Session, EngineError>;

    fn set_value(&mut self, session: &mut Self::Session, name: &str, value: f64) -> Result<(), EngineError>;

    fn get_attribute(
        &self,
        session: &Self::Session,
        name: &str,
        attribute: VariableAttribute,
    ) -> Result<AttributeValue, EngineError>;

    fn advance(&mut self, session: &mut Self::Session, steps: u32) -> Result<(), EngineError>;

    fn close(&mut self, session: Self::Session) -> Result<(), EngineError>;
}

fn attribute_text<E: SimulationEngine>(
    engine: &E,
    session: &E::Session,
    name: &str,
    attribute: VariableAttribute,
) -> Result<String, EngineError> {
    match engine.get_attribute(session, name, attribute)? {
        AttributeValue::Text(text) => Ok(text),
        AttributeValue::List(items) => Ok(items.join(", ")),
    }
}

fn attribute_list<E: SimulationEngine>(
    engine: &E,
    session: &E::Session,
    name: &str,
    attribute: VariableAttribute,
) -> Result<Vec<String>, EngineError> {
    match engine.get_attribute(session, name, attribute)? {
        AttributeValue::List(items) => Ok(items),
        AttributeValue::Text(text) if text.is_empty() => Ok(vec![]),
        AttributeValue::Text(text) => Ok(vec![text]),
    }
}

/// Roles as the engine sees them.
///
/// Reserved names and `Constraint` variables are skipped.  `Level` is a
/// stock, and an `Auxiliary` that some level uses is promoted to a flow.
/// Types with no counterpart stay `Unclassified`.
pub fn engine_roles<E: SimulationEngine>(
    engine: &E,
    session: &E::Session,
    names: &[Ident],
    syntax: &Syntax,
) -> Result<BTreeMap<Ident, Role>, EngineError> {
    let mut roles = BTreeMap::new();
    for name in names.iter().filter(|name| !syntax.is_reserved(name)) {
        let role = match attribute_text(engine, session, name, VariableAttribute::Type)?.as_str() {
            "Constraint" => continue,
            "Level" => Role::Stock,
            "Auxiliary" => Role::Auxiliary,
            "Constant" => Role::Constant,
            _ => Role::Unclassified,
        };
        roles.insert(name.clone(), role);
    }

    let stocks: BTreeSet<Ident> = roles
        .iter()
        .filter(|(_, role)| **role == Role::Stock)
        .map(|(name, _)| name.clone())
        .collect();
    let auxiliaries: Vec<Ident> = roles
        .iter()
        .filter(|(_, role)| **role == Role::Auxiliary)
        .map(|(name, _)| name.clone())
        .collect();

    for name in auxiliaries {
        let uses = attribute_list(engine, session, &name, VariableAttribute::Uses)?;
        if uses.iter().any(|used| stocks.contains(used)) {
            roles.insert(name, Role::Flow);
        }
    }

    debug!(variables = roles.len(), stocks = stocks.len(), "read roles from engine");

    Ok(roles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    #[test]
    fn test_check_status() {
        assert_eq!(Ok(1), check_status(1, StatusConvention::default(), "load"));
        let err = check_status(0, StatusConvention::default(), "load").unwrap_err();
        assert_eq!(0, err.code);
        assert_eq!("engine status 0: load", err.to_string());

        // size queries return data on success
        assert_eq!(Ok(42), check_status(42, StatusConvention::FailureIs(-1), "size"));
        assert!(check_status(-1, StatusConvention::FailureIs(-1), "size").is_err());
    }

    #[test]
    fn test_engine_error_into_error() {
        let err: Error = EngineError::new(-1, None).into();
        assert_eq!(ErrorKind::Engine, err.kind);
        assert_eq!(ErrorCode::Engine, err.code);
    }

    #[test]
    fn test_attribute_codes() {
        for code in 1..=14 {
            let attr = VariableAttribute::from_code(code).unwrap();
            assert_eq!(code, attr.code());
            assert_eq!((4..=10).contains(&code), attr.is_list());
        }
        assert_eq!(None, VariableAttribute::from_code(0));
        assert_eq!(None, VariableAttribute::from_code(15));
        assert_eq!("initial causes", VariableAttribute::InitialCauses.to_string());
    }

    #[test]
    fn test_decode_attribute_buffer() {
        assert_eq!(
            AttributeValue::List(vec!["a".to_owned(), "b c".to_owned()]),
            decode_attribute_buffer(VariableAttribute::Causes, b"a\0b c\0\0\0")
        );
        assert_eq!(
            AttributeValue::List(vec![]),
            decode_attribute_buffer(VariableAttribute::Subscripts, b"\0\0")
        );
        assert_eq!(
            AttributeValue::Text("Level".to_owned()),
            decode_attribute_buffer(VariableAttribute::Type, b"Level\0junk")
        );
        assert_eq!(
            AttributeValue::Text("people".to_owned()),
            decode_attribute_buffer(VariableAttribute::Units, b"people")
        );
    }

    #[test]
    fn test_subscripted_names() {
        assert_eq!(vec!["pop"], subscripted_names("pop", &[]));
        let elements = vec!["north".to_owned(), "south".to_owned()];
        assert_eq!(vec!["pop[north]", "pop[south]"], subscripted_names("pop", &elements));
    }

    #[derive(Default)]
    struct MockEngine {
        types: HashMap<String, String>,
        uses: HashMap<String, Vec<String>>,
        values: HashMap<String, f64>,
        steps: u32,
    }

    #[derive(Debug)]
    struct MockSession {
        path: PathBuf,
    }

    impl SimulationEngine for MockEngine {
        type Session = MockSession;

        fn load(&mut self, path: &Path) -> Result<MockSession, EngineError> {
            check_status(if path.exists() { 1 } else { 0 }, StatusConvention::default(), "load")?;
            Ok(MockSession {
                path: path.to_owned(),
            })
        }

        fn set_value(&mut self, _session: &mut MockSession, name: &str, value: f64) -> Result<(), EngineError> {
            self.values.insert(name.to_owned(), value);
            Ok(())
        }

        fn get_attribute(
            &self,
            _session: &MockSession,
            name: &str,
            attribute: VariableAttribute,
        ) -> Result<AttributeValue, EngineError> {
            let mut buf: Vec<u8> = Vec::new();
            match attribute {
                VariableAttribute::Type => match self.types.get(name) {
                    Some(t) => buf.extend_from_slice(t.as_bytes()),
                    None => return Err(EngineError::new(-1, Some(name.to_owned()))),
                },
                VariableAttribute::Uses => {
                    for used in self.uses.get(name).into_iter().flatten() {
                        buf.extend_from_slice(used.as_bytes());
                        buf.push(0);
                    }
                }
                _ => {}
            }
            Ok(decode_attribute_buffer(attribute, &buf))
        }

        fn advance(&mut self, _session: &mut MockSession, steps: u32) -> Result<(), EngineError> {
            self.steps += steps;
            Ok(())
        }

        fn close(&mut self, _session: MockSession) -> Result<(), EngineError> {
            Ok(())
        }
    }

    fn mock() -> MockEngine {
        let mut engine = MockEngine::default();
        for (name, ty) in [
            ("Stock", "Level"),
            ("Inflow", "Auxiliary"),
            ("helper", "Auxiliary"),
            ("k", "Constant"),
            ("check", "Constraint"),
            ("table", "Lookup"),
            ("Time", "Auxiliary"),
        ] {
            engine.types.insert(name.to_owned(), ty.to_owned());
        }
        engine.uses.insert("Inflow".to_owned(), vec!["Stock".to_owned()]);
        engine.uses.insert("helper".to_owned(), vec!["Inflow".to_owned()]);
        engine
    }

    #[test]
    fn test_engine_roles() {
        let mut engine = mock();
        let session = engine.load(Path::new(env!("CARGO_MANIFEST_DIR"))).unwrap();
        let names: Vec<Ident> = ["Stock", "Inflow", "helper", "k", "check", "table", "Time"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let roles = engine_roles(&engine, &session, &names, &Syntax::default()).unwrap();

        assert_eq!(5, roles.len());
        assert_eq!(Role::Stock, roles["Stock"]);
        assert_eq!(Role::Flow, roles["Inflow"]);
        assert_eq!(Role::Auxiliary, roles["helper"]);
        assert_eq!(Role::Constant, roles["k"]);
        assert_eq!(Role::Unclassified, roles["table"]);
        assert!(!roles.contains_key("check"));
        assert!(!roles.contains_key("Time"));
        engine.close(session).unwrap();
    }

    #[test]
    fn test_engine_errors_propagate() {
        let mut engine = mock();
        assert_eq!(0, engine.load(Path::new("/does/not/exist.mdl")).unwrap_err().code);

        let mut session = engine.load(Path::new(env!("CARGO_MANIFEST_DIR"))).unwrap();
        assert_eq!(PathBuf::from(env!("CARGO_MANIFEST_DIR")), session.path);
        engine.set_value(&mut session, "k", 2.0).unwrap();
        engine.advance(&mut session, 3).unwrap();
        assert_eq!(Some(&2.0), engine.values.get("k"));
        assert_eq!(3, engine.steps);

        let names = vec!["unknown".to_owned()];
        let err = engine_roles(&engine, &session, &names, &Syntax::default()).unwrap_err();
        assert_eq!(-1, err.code);
    }
}
