// Line protocol for the receipt importer. One command per stdin line:
//   CLASSIFY <description>  -> CATEGORY <category>
//   EXPLAIN <description>   -> CATEGORY <category> <stage> [<evidence>]
//   SUGGEST <query>         -> SUGGESTION <category> <score> <description> ... END
//   EXIT
use cesta_core::fuzzy::{suggest, BigramDice};
use cesta_core::{runtime, CategoryEngine};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const DICTIONARY_PATH: &str = "data/dicionario.json";
const SUGGESTION_COUNT: usize = 5;

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let dictionary_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DICTIONARY_PATH));

    match CategoryEngine::read_raw_dictionary(&dictionary_path) {
        Ok(raw) => {
            runtime::initialize(&raw);
        }
        Err(e) => warn!("Could not load '{}': {}", dictionary_path.display(), e),
    }
    info!("Category store built: {}", runtime::is_initialized());

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();

    for line in stdin.lock().lines() {
        let input = line?;
        debug!("<- {:?}", input);
        let (command, argument) = match input.split_once(' ') {
            Some((command, rest)) => (command, rest),
            None => (input.as_str(), ""),
        };

        match command {
            "CLASSIFY" => {
                writeln!(stdout, "CATEGORY {}", runtime::classify(argument))?;
            }
            "EXPLAIN" => {
                let result = runtime::explain(argument);
                match result.matched {
                    Some(evidence) => {
                        writeln!(stdout, "CATEGORY {} {} {}", result.category, result.stage, evidence)?
                    }
                    None => writeln!(stdout, "CATEGORY {} {}", result.category, result.stage)?,
                }
            }
            "SUGGEST" => {
                if let Some(engine) = runtime::engine() {
                    for s in suggest(engine, argument, SUGGESTION_COUNT, &BigramDice) {
                        writeln!(stdout, "SUGGESTION {} {:.3} {}", s.category, s.score, s.description)?;
                    }
                }
                writeln!(stdout, "END")?;
            }
            "EXIT" => break,
            "" => continue,
            other => {
                warn!("Unknown command '{}'", other);
                writeln!(stdout, "ERROR unknown command")?;
            }
        }
        stdout.flush()?;
    }
    info!("Shutting down.");
    Ok(())
}
