//! The interactive REPL: one persistent interpreter, one line of source at a time.

use std::cell::RefCell;
use std::io::{self, Write as _};
use std::rc::Rc;

use pox::{new_interpreter, run, RunOutcome};

use super::report::report;

const PROMPT: &str = "Pox: >> ";

/// Runs the REPL loop until the user types `exit` or closes stdin. Per-line scan/parse/resolve
/// and runtime errors are reported and the loop continues; nothing in the REPL exits the
/// process on its own.
pub fn run_repl() {
	let output: Rc<RefCell<dyn io::Write>> = Rc::new(RefCell::new(io::stdout()));
	let mut interpreter = new_interpreter(output);

	let stdin = io::stdin();
	loop {
		print!("{PROMPT}");
		let _ = io::stdout().flush();

		let mut line = String::new();
		if stdin.read_line(&mut line).unwrap_or(0) == 0 {
			break;
		}

		let line = line.trim_end_matches(['\n', '\r']);
		if line == "exit" {
			break;
		}

		match run(&mut interpreter, line) {
			RunOutcome::Ok => {}
			RunOutcome::StaticError(diagnostics) => diagnostics.iter().for_each(report),
			RunOutcome::RuntimeError(diagnostic) => report(&diagnostic),
		}
	}
}
