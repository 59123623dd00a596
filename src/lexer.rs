//! The scanner: turns raw source text into a flat token stream.
//!
//! Scanning never aborts on the first bad character. Each error is recorded as a
//! [`Diagnostic`] and scanning resumes at the next character, so a single run can surface
//! every lexical mistake in a source file at once.

use crate::diagnostics::Diagnostic;
use crate::token::{Token, TokenKind, TokenLiteral};

/// Scans a single source string into tokens, maintaining a `[start, current)` window over
/// the character stream.
pub struct Scanner {
	source: Vec<char>,
	tokens: Vec<Token>,
	diagnostics: Vec<Diagnostic>,
	start: usize,
	current: usize,
	line: usize,
}

impl Scanner {
	#[must_use]
	pub fn new(source: &str) -> Self {
		Self {
			source: source.chars().collect(),
			tokens: Vec::new(),
			diagnostics: Vec::new(),
			start: 0,
			current: 0,
			line: 1,
		}
	}

	/// Scans the whole source, returning every token (always ending in exactly one `Eof`)
	/// alongside whatever lexical diagnostics were collected along the way.
	#[must_use]
	pub fn scan_tokens(mut self) -> (Vec<Token>, Vec<Diagnostic>) {
		while !self.is_at_end() {
			self.start = self.current;
			self.scan_token();
		}

		self.tokens.push(Token::new(TokenKind::Eof, "", None, self.line));
		(self.tokens, self.diagnostics)
	}

	fn scan_token(&mut self) {
		let c = self.advance();
		match c {
			'(' => self.add_token(TokenKind::LeftParen),
			')' => self.add_token(TokenKind::RightParen),
			'{' => self.add_token(TokenKind::LeftBrace),
			'}' => self.add_token(TokenKind::RightBrace),
			',' => self.add_token(TokenKind::Comma),
			'.' => self.add_token(TokenKind::Dot),
			'-' => self.add_token(TokenKind::Minus),
			'+' => self.add_token(TokenKind::Plus),
			';' => self.add_token(TokenKind::Semicolon),
			'*' => self.add_token(TokenKind::Star),
			'!' => {
				let kind = if self.matches('=') { TokenKind::BangEqual } else { TokenKind::Bang };
				self.add_token(kind);
			}
			'=' => {
				let kind = if self.matches('=') { TokenKind::EqualEqual } else { TokenKind::Equal };
				self.add_token(kind);
			}
			'<' => {
				let kind = if self.matches('=') { TokenKind::LessEqual } else { TokenKind::Less };
				self.add_token(kind);
			}
			'>' => {
				let kind = if self.matches('=') { TokenKind::GreaterEqual } else { TokenKind::Greater };
				self.add_token(kind);
			}
			'#' => self.line_comment(),
			'/' => {
				if self.matches('*') {
					self.block_comment();
				} else {
					self.add_token(TokenKind::Slash);
				}
			}
			' ' | '\r' | '\t' => {}
			'\n' => self.line += 1,
			'\'' => self.string(),
			_ if c.is_ascii_digit() => self.number(),
			_ if is_identifier_start(c) => self.identifier(),
			_ => self.diagnostics.push(Diagnostic::lex(self.line, format!("Unexpected character \"{c}\""))),
		}
	}

	fn line_comment(&mut self) {
		while self.peek() != '\n' && !self.is_at_end() {
			self.advance();
		}
	}

	fn block_comment(&mut self) {
		loop {
			if self.is_at_end() {
				self.diagnostics.push(Diagnostic::lex(self.line, "Unterminated block comment"));
				return;
			}
			if self.peek() == '*' && self.peek_next() == Some('/') {
				self.advance();
				self.advance();
				return;
			}
			if self.advance() == '\n' {
				self.line += 1;
			}
		}
	}

	fn string(&mut self) {
		while self.peek() != '\'' && !self.is_at_end() {
			if self.advance() == '\n' {
				self.line += 1;
			}
		}

		if self.is_at_end() {
			self.diagnostics.push(Diagnostic::lex(self.line, "Unterminated string"));
			return;
		}

		// Consume the closing quote.
		self.advance();

		let contents: String = self.source[self.start + 1..self.current - 1].iter().collect();
		self.add_token_with_literal(TokenKind::String, Some(TokenLiteral::String(contents)));
	}

	fn number(&mut self) {
		while self.peek().is_ascii_digit() {
			self.advance();
		}

		if self.peek() == '.' && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
			self.advance();
			while self.peek().is_ascii_digit() {
				self.advance();
			}
		}

		let text: String = self.source[self.start..self.current].iter().collect();
		// The lexeme only ever contains digits and at most one `.`, so this cannot fail.
		let value: f64 = text.parse().unwrap_or_default();
		self.add_token_with_literal(TokenKind::Number, Some(TokenLiteral::Number(value)));
	}

	fn identifier(&mut self) {
		while is_identifier_part(self.peek()) {
			self.advance();
		}

		let text: String = self.source[self.start..self.current].iter().collect();
		let kind = TokenKind::keyword(&text).unwrap_or(TokenKind::Identifier);
		self.add_token(kind);
	}

	fn add_token(&mut self, kind: TokenKind) {
		self.add_token_with_literal(kind, None);
	}

	fn add_token_with_literal(&mut self, kind: TokenKind, literal: Option<TokenLiteral>) {
		let lexeme: String = self.source[self.start..self.current].iter().collect();
		self.tokens.push(Token::new(kind, lexeme, literal, self.line));
	}

	fn is_at_end(&self) -> bool {
		self.current >= self.source.len()
	}

	fn advance(&mut self) -> char {
		let c = self.source[self.current];
		self.current += 1;
		c
	}

	fn matches(&mut self, expected: char) -> bool {
		if self.is_at_end() || self.source[self.current] != expected {
			return false;
		}
		self.current += 1;
		true
	}

	fn peek(&self) -> char {
		self.source.get(self.current).copied().unwrap_or('\0')
	}

	fn peek_next(&self) -> Option<char> {
		self.source.get(self.current + 1).copied()
	}
}

fn is_identifier_start(c: char) -> bool {
	c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_part(c: char) -> bool {
	c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
	use super::Scanner;
	use crate::token::TokenKind;

	fn kinds(source: &str) -> Vec<TokenKind> {
		let (tokens, diagnostics) = Scanner::new(source).scan_tokens();
		assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");
		tokens.into_iter().map(|t| t.kind).collect()
	}

	#[test]
	fn scans_single_and_double_char_operators() {
		assert_eq!(
			kinds("!= == <= >= < > ! ="),
			vec![
				TokenKind::BangEqual,
				TokenKind::EqualEqual,
				TokenKind::LessEqual,
				TokenKind::GreaterEqual,
				TokenKind::Less,
				TokenKind::Greater,
				TokenKind::Bang,
				TokenKind::Equal,
				TokenKind::Eof,
			]
		);
	}

	#[test]
	fn skips_line_and_block_comments() {
		let (tokens, diagnostics) = Scanner::new("1 # trailing comment\n/* block\ncomment */ 2").scan_tokens();
		assert!(diagnostics.is_empty());
		assert_eq!(tokens.iter().map(|t| t.kind).collect::<Vec<_>>(), vec![TokenKind::Number, TokenKind::Number, TokenKind::Eof]);
		// The block comment spans a newline, so the trailing `2` should be on line 3.
		assert_eq!(tokens[1].line, 3);
	}

	#[test]
	fn reports_unterminated_string_and_block_comment() {
		let (_, diagnostics) = Scanner::new("'unterminated").scan_tokens();
		assert_eq!(diagnostics.len(), 1);
		assert!(diagnostics[0].to_string().contains("Unterminated string"));

		let (_, diagnostics) = Scanner::new("/* unterminated").scan_tokens();
		assert_eq!(diagnostics.len(), 1);
		assert!(diagnostics[0].to_string().contains("Unterminated block comment"));
	}

	#[test]
	fn keywords_are_case_sensitive() {
		assert_eq!(kinds("True False Nil true"), vec![TokenKind::True, TokenKind::False, TokenKind::Nil, TokenKind::Identifier, TokenKind::Eof]);
	}

	#[test]
	fn continues_after_an_unexpected_character() {
		let (tokens, diagnostics) = Scanner::new("1 @ 2").scan_tokens();
		assert_eq!(diagnostics.len(), 1);
		assert_eq!(tokens.iter().map(|t| t.kind).collect::<Vec<_>>(), vec![TokenKind::Number, TokenKind::Number, TokenKind::Eof]);
	}
}
