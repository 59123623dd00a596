//! The `pox` CLI: a thin driver over the `pox` library. Reads a file or starts the REPL,
//! renders diagnostics to stderr, and picks an exit code reflecting how the run failed, if
//! at all.

mod cli;

use std::cell::RefCell;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use anyhow::Context as _;
use clap::Parser as _;
use pox::{new_interpreter, run, RunOutcome};

use cli::repl::run_repl;
use cli::report::report;

/// `pox [SCRIPT]` — run `SCRIPT` once, or start the REPL if omitted.
///
/// `trailing` only exists to detect "more than one argument" so we can print a usage message
/// and exit 2, matching the original tool's argument-count check rather than clap's own
/// multi-positional validation.
#[derive(clap::Parser)]
#[command(name = "pox", about = "A tree-walking interpreter for the Pox scripting language")]
struct Args {
	script: Option<PathBuf>,
	#[arg(trailing_var_arg = true, hide = true)]
	trailing: Vec<String>,
}

fn main() -> ExitCode {
	let args = Args::parse();

	if !args.trailing.is_empty() {
		eprintln!("Usage: pox [script]");
		return ExitCode::from(2);
	}

	match args.script {
		Some(path) => run_file(&path),
		None => {
			run_repl();
			ExitCode::SUCCESS
		}
	}
}

fn run_file(path: &std::path::Path) -> ExitCode {
	let source = match std::fs::read_to_string(path).with_context(|| format!("could not read {}", path.display())) {
		Ok(source) => source,
		Err(error) => {
			eprintln!("{error:#}");
			return ExitCode::from(1);
		}
	};

	let output: Rc<RefCell<dyn io::Write>> = Rc::new(RefCell::new(io::stdout()));
	let mut interpreter = new_interpreter(output);

	match run(&mut interpreter, &source) {
		RunOutcome::Ok => ExitCode::SUCCESS,
		RunOutcome::StaticError(diagnostics) => {
			diagnostics.iter().for_each(report);
			ExitCode::from(1)
		}
		RunOutcome::RuntimeError(diagnostic) => {
			report(&diagnostic);
			ExitCode::from(70)
		}
	}
}
