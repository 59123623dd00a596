//! Pox: a small tree-walking interpreter for the Pox scripting language.
//!
//! The core pipeline — [`lexer`], [`parser`], [`resolver`], [`interpreter`] — never prints and
//! never exits the process. It only ever produces [`diagnostics::Diagnostic`] values and,
//! through the interpreter's injectable output sink, `print` output. Turning that into a
//! running CLI (reading files, rendering diagnostics, choosing exit codes) is the `pox` binary's
//! job, not the library's.

pub mod ast;
pub mod diagnostics;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod resolver;
pub mod token;

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use diagnostics::Diagnostic;
use interpreter::Interpreter;
use lexer::Scanner;
use parser::Parser;
use resolver::Resolver;

/// The outcome of running one chunk of source through the whole pipeline.
pub enum RunOutcome {
	/// Scanning, parsing, and resolving all succeeded and the program ran to completion.
	Ok,
	/// A lex, parse, or resolve error was found; the interpreter was never invoked.
	StaticError(Vec<Diagnostic>),
	/// The program parsed and resolved cleanly but raised a runtime error while executing.
	RuntimeError(Diagnostic),
}

/// Runs one chunk of Pox source against a persistent interpreter (so a REPL session's globals
/// survive across calls), writing `print` output to `output`.
///
/// Static errors (scan/parse/resolve) gate evaluation entirely: if any of them occurred, the
/// interpreter is never invoked for that chunk.
pub fn run(interpreter: &mut Interpreter, source: &str) -> RunOutcome {
	let (tokens, lex_diagnostics) = Scanner::new(source).scan_tokens();
	let (statements, parse_diagnostics) = Parser::new(&tokens).parse();

	let mut static_diagnostics = lex_diagnostics;
	static_diagnostics.extend(parse_diagnostics);

	if !static_diagnostics.is_empty() {
		return RunOutcome::StaticError(static_diagnostics);
	}

	let resolve_diagnostics = Resolver::new().resolve(&statements);
	if !resolve_diagnostics.is_empty() {
		return RunOutcome::StaticError(resolve_diagnostics);
	}

	match interpreter.interpret(&statements) {
		Ok(()) => RunOutcome::Ok,
		Err(error) => RunOutcome::RuntimeError(error.into_diagnostic()),
	}
}

/// Builds an interpreter that writes `print` output to the given sink. Exposed so callers (the
/// CLI, or tests) can supply an in-memory sink instead of stdout.
#[must_use]
pub fn new_interpreter(output: Rc<RefCell<dyn Write>>) -> Interpreter {
	Interpreter::new(output)
}
