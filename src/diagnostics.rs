//! Structured diagnostics shared by the scanner, parser, resolver, and evaluator.
//!
//! The core library never prints; it only ever produces these values. Rendering them to a
//! terminal (with color, or not) is entirely the CLI driver's job, so the `Display` impls here
//! are a tested contract in their own right and must stay stable text.

use std::fmt;

/// Where in the token stream a parse/resolve error was detected, used to render the `<where>`
/// portion of `[Line: <n>] Error <where>: <message>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorSite {
	/// No specific token is implicated (used by lex errors, which have no token to point at).
	Empty,
	/// The error was detected once the token stream was exhausted.
	AtEnd,
	/// The error was detected at a specific token, identified by its lexeme.
	AtLexeme(String),
}

impl fmt::Display for ErrorSite {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Empty => Ok(()),
			Self::AtEnd => write!(f, " at end"),
			Self::AtLexeme(lexeme) => write!(f, " at \"{lexeme}\""),
		}
	}
}

/// A single diagnostic produced while scanning, parsing, resolving, or evaluating a program.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
	Lex { line: usize, message: String },
	Parse { line: usize, site: ErrorSite, message: String },
	Resolve { line: usize, site: ErrorSite, message: String },
	Runtime { line: usize, message: String },
}

impl Diagnostic {
	#[must_use]
	pub fn lex(line: usize, message: impl Into<String>) -> Self {
		Self::Lex { line, message: message.into() }
	}

	#[must_use]
	pub fn parse(line: usize, site: ErrorSite, message: impl Into<String>) -> Self {
		Self::Parse { line, site, message: message.into() }
	}

	#[must_use]
	pub fn resolve(line: usize, site: ErrorSite, message: impl Into<String>) -> Self {
		Self::Resolve { line, site, message: message.into() }
	}

	#[must_use]
	pub const fn line(&self) -> usize {
		match self {
			Self::Lex { line, .. } | Self::Parse { line, .. } | Self::Resolve { line, .. } | Self::Runtime { line, .. } => *line,
		}
	}

	/// Whether this diagnostic belongs to the static analysis phases (scan/parse/resolve),
	/// all three of which gate whether the interpreter is ever invoked: a program with any of
	/// these never reaches evaluation.
	#[must_use]
	pub const fn is_static(&self) -> bool {
		!matches!(self, Self::Runtime { .. })
	}
}

impl fmt::Display for Diagnostic {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Lex { line, message } => write!(f, "[Line: {line}] Error {}: {message}", ErrorSite::Empty),
			Self::Parse { line, site, message } | Self::Resolve { line, site, message } => write!(f, "[Line: {line}] Error {site}: {message}"),
			Self::Runtime { line, message } => write!(f, "[Line {line}]: Runtime Error: {message}"),
		}
	}
}

impl std::error::Error for Diagnostic {}

/// A runtime error raised by the evaluator, carrying the line of the nearest authoritative
/// token (the operator or opening paren for binary/call nodes).
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
	pub line: usize,
	pub message: String,
}

impl RuntimeError {
	#[must_use]
	pub fn new(line: usize, message: impl Into<String>) -> Self {
		Self { line, message: message.into() }
	}

	#[must_use]
	pub fn into_diagnostic(self) -> Diagnostic {
		Diagnostic::Runtime { line: self.line, message: self.message }
	}
}

impl fmt::Display for RuntimeError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "[Line {}]: Runtime Error: {}", self.line, self.message)
	}
}

impl std::error::Error for RuntimeError {}
