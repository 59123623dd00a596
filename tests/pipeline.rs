//! End-to-end tests driving the public `pox::run` entry point directly, without going through
//! the CLI binary or a subprocess.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use pox::{new_interpreter, run, RunOutcome};

fn run_source(source: &str) -> (RunOutcome, String) {
	let output: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
	let mut interpreter = new_interpreter(Rc::clone(&output) as Rc<RefCell<dyn Write>>);
	let outcome = run(&mut interpreter, source);
	let printed = String::from_utf8(output.borrow().clone()).expect("print output is always valid utf-8");
	(outcome, printed)
}

#[test]
fn static_errors_prevent_the_interpreter_from_ever_running() {
	// `@` is lexically invalid, so this should never reach the evaluator even though the rest
	// of the line would otherwise print something.
	let (outcome, printed) = run_source("print 1; @ print 2;");
	assert!(matches!(outcome, RunOutcome::StaticError(_)));
	assert!(printed.is_empty(), "interpreter ran despite a static error: {printed:?}");
}

#[test]
fn self_referential_initializer_is_only_a_resolve_error_inside_a_block() {
	let (outcome, _) = run_source("{ let x = x; }");
	match outcome {
		RunOutcome::StaticError(diagnostics) => {
			assert_eq!(diagnostics.len(), 1);
			assert!(diagnostics[0].to_string().contains("its own initializer"));
		}
		_ => panic!("expected a static error"),
	}
}

#[test]
fn top_level_self_referential_declaration_is_a_runtime_error_not_a_resolve_error() {
	let (outcome, _) = run_source("let x = x;");
	assert!(matches!(outcome, RunOutcome::RuntimeError(_)), "top-level `let x = x;` should fail at runtime, looking up an undefined global");
}

#[test]
fn division_by_zero_reports_a_runtime_diagnostic_with_the_offending_line() {
	let (outcome, _) = run_source("print 1;\nprint 1 / 0;");
	match outcome {
		RunOutcome::RuntimeError(diagnostic) => {
			assert!(diagnostic.to_string().contains("Division by zero"));
			assert_eq!(diagnostic.line(), 2);
		}
		_ => panic!("expected a runtime error"),
	}
}

#[test]
fn a_persistent_interpreter_keeps_globals_across_repl_style_calls() {
	let output: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
	let mut interpreter = new_interpreter(Rc::clone(&output) as Rc<RefCell<dyn Write>>);

	assert!(matches!(run(&mut interpreter, "let counter = 0;"), RunOutcome::Ok));
	assert!(matches!(run(&mut interpreter, "counter = counter + 1; print counter;"), RunOutcome::Ok));
	assert!(matches!(run(&mut interpreter, "counter = counter + 1; print counter;"), RunOutcome::Ok));

	let printed = String::from_utf8(output.borrow().clone()).unwrap();
	assert_eq!(printed, "1\n2\n");
}

#[test]
fn diagnostic_display_matches_the_documented_formats() {
	let (outcome, _) = run_source("let = 1;");
	match outcome {
		RunOutcome::StaticError(diagnostics) => {
			let rendered = diagnostics[0].to_string();
			assert!(rendered.starts_with("[Line: 1] Error"));
		}
		_ => panic!("expected a static error"),
	}

	let (outcome, _) = run_source("print 1 / 0;");
	match outcome {
		RunOutcome::RuntimeError(diagnostic) => {
			assert_eq!(diagnostic.to_string(), "[Line 1]: Runtime Error: Division by zero");
		}
		_ => panic!("expected a runtime error"),
	}
}
