// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::error::Error as StdError;
use std::fs;
use std::path::{Path, PathBuf};
use std::result::Result as StdResult;

use clap::{ArgAction, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use mdl_graph::{Model, ParseOptions, Syntax, VariableEdit};

const EXIT_FAILURE: i32 = 1;

type CliResult<T> = StdResult<T, Box<dyn StdError>>;

macro_rules! die(
    ($($arg:tt)*) => { {
        eprintln!($($arg)*);
        std::process::exit(EXIT_FAILURE)
    } }
);

#[derive(Parser, Debug)]
#[command(name = "mdlgraph", version)]
#[command(about = "Inspect and edit the variable dependency graph of Vensim models", long_about = None)]
struct Cli {
    /// JSON file overriding the default parse options
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log more detail (repeat for more)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print every variable with its role
    Roles {
        /// Path to the .mdl file
        path: PathBuf,
    },
    /// Print the parents and children of one variable
    Deps {
        /// Path to the .mdl file
        path: PathBuf,
        /// Variable name, exactly as written in the model
        name: String,
    },
    /// Report dangling references and verify the model writes back unchanged
    Check {
        /// Path to the .mdl file
        path: PathBuf,
    },
    /// Dump the dependency graph as JSON
    Export {
        /// Path to the .mdl file
        path: PathBuf,
        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Change a variable's equation, units or comment
    Edit {
        /// Path to the .mdl file
        path: PathBuf,
        /// Variable name, exactly as written in the model
        name: String,
        #[arg(long)]
        equation: Option<String>,
        #[arg(long)]
        units: Option<String>,
        #[arg(long)]
        comment: Option<String>,
        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_syntax(config: Option<&Path>) -> CliResult<Syntax> {
    let options = match config {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .map_err(|err| format!("config '{}': {}", path.display(), err))?;
            serde_json::from_str::<ParseOptions>(&contents)
                .map_err(|err| format!("config '{}': {}", path.display(), err))?
        }
        None => ParseOptions::default(),
    };
    Ok(options.compile()?)
}

fn load_model(path: &Path, syntax: &Syntax) -> CliResult<(String, Model)> {
    let source = fs::read_to_string(path)
        .map_err(|err| format!("model '{}': {}", path.display(), err))?;
    let model = Model::load(&source, syntax)
        .map_err(|err| format!("model '{}': {}", path.display(), err))?;
    info!(path = %path.display(), variables = model.graph().len(), "loaded");
    Ok((source, model))
}

fn write_output(output: Option<&Path>, contents: String) -> CliResult<String> {
    match output {
        Some(path) => {
            fs::write(path, contents).map_err(|err| format!("output '{}': {}", path.display(), err))?;
            Ok(String::new())
        }
        None => Ok(contents),
    }
}

fn names(set: Option<&std::collections::BTreeSet<String>>) -> String {
    set.map(|s| s.iter().cloned().collect::<Vec<_>>().join(", "))
        .unwrap_or_default()
}

/// Runs one command, returning what should go to stdout.
fn run(cli: &Cli) -> CliResult<String> {
    let syntax = load_syntax(cli.config.as_deref())?;

    match &cli.command {
        Commands::Roles { path } => {
            let (_, model) = load_model(path, &syntax)?;
            let mut out = String::new();
            for var in model.variables() {
                out.push_str(&format!("{:<10} {}\n", var.role.as_str(), var.name));
            }
            Ok(out)
        }
        Commands::Deps { path, name } => {
            let (_, model) = load_model(path, &syntax)?;
            if model.get(name).is_none() {
                return Err(format!("no variable named '{name}'").into());
            }
            Ok(format!(
                "parents: {}\nchildren: {}\n",
                names(model.parents(name)),
                names(model.children(name))
            ))
        }
        Commands::Check { path } => {
            let (source, model) = load_model(path, &syntax)?;
            model.check_round_trip(&source)?;
            model.check_references()?;
            Ok(format!("ok: {} variables\n", model.graph().len()))
        }
        Commands::Export { path, output } => {
            let (_, model) = load_model(path, &syntax)?;
            let json = serde_json::to_string_pretty(&model.export())? + "\n";
            write_output(output.as_deref(), json)
        }
        Commands::Edit {
            path,
            name,
            equation,
            units,
            comment,
            output,
        } => {
            let (_, model) = load_model(path, &syntax)?;
            let edit = VariableEdit {
                equation: equation.clone(),
                units: units.clone(),
                comment: comment.clone(),
            };
            let edited = model.edit(name, edit)?;
            write_output(output.as_deref(), edited.to_mdl())
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(out) => print!("{out}"),
        Err(err) => die!("error: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MODEL: &str = "{UTF-8}
Stock= INTEG (
\tInflow,
\t\t10)
\t~\tcups
\t~\t\t|

Inflow=
\tStock * rate
\t~\tcups/Minute
\t~\t\t|

rate=
\t0.1
\t~\t1/Minute
\t~\t\t|

********************************************************
\t.Control
";

    fn model_file(text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".mdl").tempfile().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    fn run_args(args: &[&str]) -> CliResult<String> {
        let cli = Cli::try_parse_from(std::iter::once("mdlgraph").chain(args.iter().copied()))?;
        run(&cli)
    }

    #[test]
    fn test_roles() {
        let file = model_file(MODEL);
        let path = file.path().to_str().unwrap();
        let out = run_args(&["roles", path]).unwrap();
        assert_eq!("stock      Stock\nflow       Inflow\nconstant   rate\n", out);
    }

    #[test]
    fn test_deps() {
        let file = model_file(MODEL);
        let path = file.path().to_str().unwrap();
        let out = run_args(&["deps", path, "Inflow"]).unwrap();
        assert_eq!("parents: Stock, rate\nchildren: Stock\n", out);
        assert!(run_args(&["deps", path, "missing"]).is_err());
    }

    #[test]
    fn test_check() {
        let file = model_file(MODEL);
        let path = file.path().to_str().unwrap();
        assert_eq!("ok: 3 variables\n", run_args(&["check", path]).unwrap());

        let dangling = model_file(&MODEL.replace("Stock * rate", "Stock * missing"));
        let err = run_args(&["check", dangling.path().to_str().unwrap()]).unwrap_err();
        assert!(err.to_string().contains("dangling_reference"));
        assert!(err.to_string().contains("'Inflow' -> 'missing'"));
    }

    #[test]
    fn test_export_and_edit_to_file() {
        let file = model_file(MODEL);
        let path = file.path().to_str().unwrap();
        let json = run_args(&["export", path]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(3, value["variables"].as_array().unwrap().len());

        let dir = tempfile::tempdir().unwrap();
        let out_path = dir.path().join("edited.mdl");
        let out = run_args(&[
            "edit",
            path,
            "rate",
            "--equation",
            "0.2",
            "--output",
            out_path.to_str().unwrap(),
        ])
        .unwrap();
        assert!(out.is_empty());
        let written = fs::read_to_string(&out_path).unwrap();
        assert!(written.contains("rate=\n\t0.2\n\t~\t1/Minute\n"));
    }

    #[test]
    fn test_bad_config() {
        let file = model_file(MODEL);
        let mut config = tempfile::NamedTempFile::new().unwrap();
        config.write_all(br#"{"max_line_width": 2}"#).unwrap();
        let err = run_args(&[
            "--config",
            config.path().to_str().unwrap(),
            "roles",
            file.path().to_str().unwrap(),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("bad_options"));
    }
}
