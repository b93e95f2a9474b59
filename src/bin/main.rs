use cesta_core::{CategoryEngine, MatchStage, Vocabulary};
use cesta_core::fuzzy::{suggest, BigramDice};
use crossterm::style::{style, Stylize};
use std::fs;
use std::io::{stdin, stdout, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

const DICTIONARY_PATH: &str = "data/dicionario.json";
const SNAPSHOT_PATH: &str = "target/cesta_categorias.bin";

// Usage: cesta_engine [dictionary.json] [vocabulary.json]
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let dictionary_path = PathBuf::from(args.next().unwrap_or_else(|| DICTIONARY_PATH.to_string()));
    let vocabulary_path = args.next().map(PathBuf::from);
    let vocabulary = match &vocabulary_path {
        Some(path) => match Vocabulary::from_path(path) {
            Ok(v) => v,
            Err(e) => {
                error!("Invalid vocabulary '{}': {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => Vocabulary::builtin().clone(),
    };

    let raw = CategoryEngine::read_raw_dictionary(&dictionary_path).unwrap_or_else(|e| {
        warn!("Could not read '{}': {}", dictionary_path.display(), e);
        serde_json::Value::Null
    });
    let snapshot = Path::new(SNAPSHOT_PATH);
    let inputs: Vec<&Path> = std::iter::once(dictionary_path.as_path())
        .chain(vocabulary_path.as_deref())
        .collect();
    if is_stale(snapshot, &inputs) {
        if let Err(e) = fs::remove_file(snapshot) {
            warn!("Could not remove stale snapshot '{}': {}", snapshot.display(), e);
        }
    }
    let engine = CategoryEngine::from_snapshot_or_build(snapshot, vocabulary, &raw);

    println!("Cesta category engine. Type a product description, '?text' for suggestions, 'exit' to quit.");
    println!("---------------------------------------------------------------");

    loop {
        print!("\n> ");
        if stdout().flush().is_err() {
            break;
        }
        let mut input = String::new();
        match stdin().read_line(&mut input) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let cmd = input.trim();

        match cmd {
            "exit" => break,
            "" => continue,
            s if s.starts_with('?') => print_suggestions(&engine, &s[1..]),
            s => print_classification(&engine, s),
        }
    }
    ExitCode::SUCCESS
}

/// A snapshot older than any of its inputs must be rebuilt.
fn is_stale(snapshot: &Path, inputs: &[&Path]) -> bool {
    let modified = |p: &Path| fs::metadata(p).and_then(|m| m.modified()).ok();
    let Some(built_at) = modified(snapshot) else {
        return false;
    };
    inputs
        .iter()
        .filter_map(|p| modified(*p))
        .any(|changed_at| changed_at > built_at)
}

fn print_classification(engine: &CategoryEngine, description: &str) {
    let result = engine.explain(description);
    let category = result.category.to_string();
    let styled = match result.stage {
        MatchStage::Default => style(category).dark_grey(),
        MatchStage::ExactOverride => style(category).magenta().bold(),
        _ => style(category).green().bold(),
    };
    println!("Normalized -> [{}]", result.normalized);
    match result.matched {
        Some(evidence) => println!("Category: {} (via {} '{}')", styled, result.stage, evidence),
        None => println!("Category: {} ({})", styled, result.stage),
    }
}

fn print_suggestions(engine: &CategoryEngine, query: &str) {
    let suggestions = suggest(engine, query, 5, &BigramDice);
    if suggestions.is_empty() {
        println!("No suggestions found.");
        return;
    }
    for (i, s) in suggestions.iter().enumerate() {
        println!(
            "  {}: {} [{}] (score: {:.2})",
            i + 1,
            s.description,
            style(s.category.as_str()).cyan(),
            s.score
        );
    }
}
