// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::common::{ErrorCode, Ident, LineRange, LoadError, Result, VariableError};
use crate::document::{Document, LineEnding, Part, Segment, extract_blocks, segment, split_lines};
use crate::graph::{DanglingReference, DependencyGraph, DependencyGraphBuilder};
use crate::lines::join_lines;
use crate::model_err;
use crate::options::Syntax;
use crate::roles::classify;
use crate::variable::{Role, VariableRecord, equation_dependencies, parse_variable};
use crate::writer::serialize_variable;

/// New authored values for one variable.  Fields left `None` keep their
/// current value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VariableEdit {
    pub equation: Option<String>,
    pub units: Option<String>,
    pub comment: Option<String>,
}

impl VariableEdit {
    pub fn equation(mut self, equation: impl Into<String>) -> Self {
        self.equation = Some(equation.into());
        self
    }

    pub fn units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// What `Model::export` serializes.
#[derive(Debug, Serialize)]
pub struct GraphExport<'a> {
    pub variables: Vec<&'a VariableRecord>,
    pub dangling: Vec<&'a DanglingReference>,
}

/// A loaded document together with its dependency graph.
///
/// A model is never changed in place: `edit` returns a new model and
/// leaves the original untouched, so a model can be read from many threads
/// at once.
#[derive(Clone, Debug)]
pub struct Model {
    syntax: Syntax,
    document: Arc<Document>,
    graph: DependencyGraph,
    // blocks whose text has to be regenerated
    edited: BTreeSet<Ident>,
}

/// Flattens user supplied text to one logical line.
fn normalize(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    join_lines(&lines, None, None)
}

impl Model {
    pub fn load(text: &str, syntax: &Syntax) -> std::result::Result<Model, LoadError> {
        let lines = split_lines(text);
        let sections = segment(&lines, syntax)?;
        let parts = extract_blocks(&lines, sections.variables)?;

        let mut errors: Vec<VariableError> = Vec::new();
        let mut builder = DependencyGraphBuilder::new();
        let mut first_seen: HashMap<Ident, LineRange> = HashMap::new();
        let mut segments: Vec<Segment> = Vec::with_capacity(parts.len());

        for part in parts {
            let range = match part {
                Part::Verbatim(range) => {
                    segments.push(Segment::Verbatim(range));
                    continue;
                }
                Part::Block(range) => range,
            };
            let var = match parse_variable(&lines[range.start..range.end], range, syntax) {
                Ok(var) => var,
                Err(err) => {
                    errors.push(err);
                    continue;
                }
            };
            let ident = var.name.clone();
            if let Err(dup) = builder.add(var) {
                let first = first_seen.get(&dup.name).copied().unwrap_or_default();
                errors.push(VariableError::new(
                    Some(dup.name),
                    range,
                    ErrorCode::DuplicateName,
                    Some(format!("already defined at {first}")),
                ));
                continue;
            }
            first_seen.insert(ident.clone(), range);
            segments.push(Segment::Block {
                ident,
                lines: range,
            });
        }

        if !errors.is_empty() {
            return Err(LoadError::Variables(errors));
        }

        let mut graph = builder.build();
        let roles = classify(&graph, syntax);
        graph.set_roles(&roles);

        debug!(
            lines = lines.len(),
            variables = graph.len(),
            dangling = graph.dangling().len(),
            "loaded model"
        );

        let document = Document::new(
            lines.iter().map(|line| line.to_string()).collect(),
            sections,
            segments,
            LineEnding::detect(text),
        );

        Ok(Model {
            syntax: syntax.clone(),
            document: Arc::new(document),
            graph,
            edited: BTreeSet::new(),
        })
    }

    /// Returns a model with `name` redefined.  Only that record's parents
    /// are re-extracted; children and every role are brought up to date
    /// across the whole graph.
    pub fn edit(&self, name: &str, edit: VariableEdit) -> Result<Model> {
        let Some(current) = self.graph.get(name) else {
            return model_err!(DoesNotExist, format!("no variable named '{name}'"));
        };

        let mut record = current.clone();
        if let Some(units) = edit.units {
            record.units = normalize(&units);
        }
        if let Some(comment) = edit.comment {
            record.comment = normalize(&comment);
        }
        if let Some(equation) = edit.equation {
            let equation = normalize(&equation);
            let (equation, parents) =
                match equation_dependencies(record.operator, &equation, &self.syntax) {
                    Ok(deps) => deps,
                    Err(err) => {
                        return model_err!(
                            MalformedArgument,
                            format!("'{name}': cannot split the arguments of '{equation}' ({err})")
                        );
                    }
                };
            record.equation = equation;
            record.parents = parents;
        }

        if record.same_definition(current) {
            return Ok(self.clone());
        }

        let mut graph = self.graph.clone();
        if graph.replace(record).is_err() {
            return model_err!(DoesNotExist, format!("no variable named '{name}'"));
        }
        let roles = classify(&graph, &self.syntax);
        graph.set_roles(&roles);

        let mut edited = self.edited.clone();
        edited.insert(name.to_owned());

        debug!(variable = name, dangling = graph.dangling().len(), "edited variable");

        Ok(Model {
            syntax: self.syntax.clone(),
            document: Arc::clone(&self.document),
            graph,
            edited,
        })
    }

    /// The model as text.  Unedited blocks and everything outside the
    /// variable blocks are written exactly as loaded.
    pub fn to_mdl(&self) -> String {
        let doc = &self.document;
        let ending = doc.line_ending();
        let mut out = String::new();

        out.push_str(doc.header());
        for segment in doc.segments() {
            match segment {
                Segment::Verbatim(range) => {
                    for line in doc.lines(*range) {
                        out.push_str(line);
                    }
                }
                Segment::Block { ident, lines } => match self.graph.get(ident) {
                    Some(var) if self.edited.contains(ident) => {
                        for line in serialize_variable(var, &self.syntax, ending) {
                            out.push_str(&line);
                        }
                    }
                    _ => {
                        for line in doc.lines(*lines) {
                            out.push_str(line);
                        }
                    }
                },
            }
        }
        for line in doc.trailing() {
            out.push_str(line);
        }

        out
    }

    /// Checks that writing the model gives back `source` exactly.
    pub fn check_round_trip(&self, source: &str) -> Result<()> {
        let written = self.to_mdl();
        if written == source {
            return Ok(());
        }

        let ours = split_lines(&written);
        let theirs = split_lines(source);
        let line = ours
            .iter()
            .zip(theirs.iter())
            .position(|(a, b)| a != b)
            .unwrap_or_else(|| ours.len().min(theirs.len()));

        model_err!(
            RoundTripMismatch,
            format!(
                "{} differs: expected {:?}, wrote {:?}",
                LineRange::new(line, line + 1),
                theirs.get(line).copied().unwrap_or(""),
                ours.get(line).copied().unwrap_or("")
            )
        )
    }

    /// Fails with `DanglingReference` when any equation names a variable
    /// the model doesn't define.
    pub fn check_references(&self) -> Result<()> {
        let dangling = self.dangling();
        if dangling.is_empty() {
            return Ok(());
        }
        let edges: Vec<String> = dangling
            .iter()
            .map(|d| format!("'{}' -> '{}'", d.from, d.to))
            .collect();
        model_err!(
            DanglingReference,
            format!("{} undefined: {}", dangling.len(), edges.join(", "))
        )
    }

    /// Variables in the order their blocks appear in the document.
    pub fn variables(&self) -> impl Iterator<Item = &VariableRecord> {
        self.document
            .block_idents()
            .filter_map(|ident| self.graph.get(ident))
    }

    pub fn get(&self, name: &str) -> Option<&VariableRecord> {
        self.graph.get(name)
    }

    pub fn by_role(&self, role: Role) -> Vec<&VariableRecord> {
        self.variables().filter(|var| var.role == role).collect()
    }

    pub fn parents(&self, name: &str) -> Option<&BTreeSet<Ident>> {
        self.graph.parents(name)
    }

    pub fn children(&self, name: &str) -> Option<&BTreeSet<Ident>> {
        self.graph.children(name)
    }

    pub fn dangling(&self) -> &BTreeSet<DanglingReference> {
        self.graph.dangling()
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn syntax(&self) -> &Syntax {
        &self.syntax
    }

    pub fn export(&self) -> GraphExport<'_> {
        GraphExport {
            variables: self.variables().collect(),
            dangling: self.dangling().iter().collect(),
        }
    }
}
