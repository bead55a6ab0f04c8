// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fs;

use mdl_graph::{LineEnding, Model, Syntax};

static TEST_MODELS: &[&str] = &[
    "test/models/teacup.mdl",
    "test/models/population.mdl",
    "test/models/subscripts.mdl",
    "test/models/crlf.mdl",
];

fn read(path: &str) -> String {
    let file_path = format!("../../{path}");
    fs::read_to_string(&file_path).unwrap_or_else(|err| panic!("{file_path}: {err}"))
}

#[test]
fn roundtrips_models() {
    let syntax = Syntax::default();
    for &path in TEST_MODELS {
        eprintln!("model: {path}");
        let source = read(path);
        let model = Model::load(&source, &syntax).unwrap();
        assert!(!model.graph().is_empty());
        assert_eq!(source, model.to_mdl());
        model.check_round_trip(&source).unwrap();
    }
}

#[test]
fn keeps_header_and_trailing_verbatim() {
    let source = read("test/models/teacup.mdl");
    let model = Model::load(&source, &Syntax::default()).unwrap();
    let doc = model.document();
    assert_eq!("{UTF-8}\n", doc.header());
    assert!(doc.trailing()[0].trim_end().chars().all(|c| c == '*'));
    assert_eq!("26:30\n", doc.trailing().last().unwrap());
    // control variables live after the boundary and are not part of the graph
    assert!(model.get("FINAL TIME").is_none());
}

#[test]
fn detects_line_endings() {
    let source = read("test/models/crlf.mdl");
    let model = Model::load(&source, &Syntax::default()).unwrap();
    assert_eq!(LineEnding::CrLf, model.document().line_ending());
    assert_eq!(
        "A stock written with CRLF line endings.",
        model.get("stock").unwrap().comment
    );
}

#[test]
fn continuation_backslashes_are_joined() {
    let source = read("test/models/teacup.mdl");
    let model = Model::load(&source, &Syntax::default()).unwrap();
    assert_eq!(
        "This is the rate at which heat flows from the cup into the room. We can ignore it at this point.",
        model.get("Heat Loss to Room").unwrap().comment
    );
    assert_eq!("Degrees [32,212]", model.get("Teacup Temperature").unwrap().units);
}
