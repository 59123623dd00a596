//! Renders [`Diagnostic`] values to the terminal. Color lives entirely here: the core library's
//! `Display` impls stay plain so they remain a stable, testable contract.

use colored::Colorize as _;
use pox::diagnostics::Diagnostic;

/// Prints one diagnostic to stderr, bolding and coloring the `Error:`/`Runtime Error:` label.
pub fn report(diagnostic: &Diagnostic) {
	let rendered = diagnostic.to_string();
	let (prefix, rest) = match rendered.split_once("Error") {
		Some((prefix, rest)) => (prefix, rest),
		None => {
			eprintln!("{rendered}");
			return;
		}
	};
	eprintln!("{prefix}{}{rest}", "Error".bold().red());
}
