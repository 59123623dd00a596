//! Recursive-descent parser: turns a token slice into a statement list.
//!
//! Parse errors never abort the whole parse. Each one is recorded and the parser
//! [`Parser::synchronize`]s to the next statement boundary, so a single run can surface more
//! than one syntax error.

use std::rc::Rc;

use crate::ast::expr::{Expr, Literal};
use crate::ast::stmt::{FunctionDecl, Stmt};
use crate::diagnostics::{Diagnostic, ErrorSite};
use crate::token::{Token, TokenKind};

const MAX_ARGS: usize = 255;

pub struct Parser<'a> {
	tokens: &'a [Token],
	current: usize,
	diagnostics: Vec<Diagnostic>,
}

/// Signals that a parse rule failed; the error has already been recorded in `self.diagnostics`
/// by the time this is returned, so callers only need to decide whether to synchronize.
struct ParseError;

impl<'a> Parser<'a> {
	#[must_use]
	pub fn new(tokens: &'a [Token]) -> Self {
		Self { tokens, current: 0, diagnostics: Vec::new() }
	}

	/// Parses the whole token stream into a statement list and whatever parse diagnostics were
	/// collected. The returned statement list never contains partially-parsed entries: a
	/// declaration that fails to parse is dropped, and the error is recorded instead.
	#[must_use]
	pub fn parse(mut self) -> (Vec<Stmt>, Vec<Diagnostic>) {
		let mut statements = Vec::new();
		while !self.is_at_end() {
			match self.declaration() {
				Ok(stmt) => statements.push(stmt),
				Err(ParseError) => self.synchronize(),
			}
		}
		(statements, self.diagnostics)
	}

	// --- declarations ---

	fn declaration(&mut self) -> Result<Stmt, ParseError> {
		if self.matches(&[TokenKind::Fn]) {
			return self.function_declaration();
		}
		if self.matches(&[TokenKind::Let]) {
			return self.var_declaration();
		}
		self.statement()
	}

	fn function_declaration(&mut self) -> Result<Stmt, ParseError> {
		let name = self.consume(TokenKind::Identifier, "Expect function name")?;
		self.consume(TokenKind::LeftParen, "Expect '(' after function name")?;

		let mut params = Vec::new();
		if !self.check(TokenKind::RightParen) {
			loop {
				if params.len() >= MAX_ARGS {
					self.error_at_current(&format!("Can't have more than {MAX_ARGS} parameters"));
				}
				params.push(self.consume(TokenKind::Identifier, "Expect parameter name")?);
				if !self.matches(&[TokenKind::Comma]) {
					break;
				}
			}
		}
		self.consume(TokenKind::RightParen, "Expect ')' after parameters")?;

		self.consume(TokenKind::LeftBrace, "Expect '{' before function body")?;
		let body = self.block()?;

		Ok(Stmt::Function(Rc::new(FunctionDecl { name, params, body })))
	}

	fn var_declaration(&mut self) -> Result<Stmt, ParseError> {
		let name = self.consume(TokenKind::Identifier, "Expect variable name")?;
		let initializer = if self.matches(&[TokenKind::Equal]) { Some(self.expression()?) } else { None };
		self.consume(TokenKind::Semicolon, "Expect ';' after variable declaration")?;
		Ok(Stmt::Var { name, initializer })
	}

	// --- statements ---

	fn statement(&mut self) -> Result<Stmt, ParseError> {
		if self.matches(&[TokenKind::Print]) {
			return self.print_statement();
		}
		if self.matches(&[TokenKind::Return]) {
			return self.return_statement();
		}
		if self.matches(&[TokenKind::If]) {
			return self.if_statement();
		}
		if self.matches(&[TokenKind::While]) {
			return self.while_statement();
		}
		if self.matches(&[TokenKind::For]) {
			return self.for_statement();
		}
		if self.matches(&[TokenKind::LeftBrace]) {
			return Ok(Stmt::Block(self.block()?));
		}
		self.expression_statement()
	}

	fn print_statement(&mut self) -> Result<Stmt, ParseError> {
		let value = self.expression()?;
		self.consume(TokenKind::Semicolon, "Expect ';' after value")?;
		Ok(Stmt::Print(value))
	}

	fn return_statement(&mut self) -> Result<Stmt, ParseError> {
		let keyword = self.previous().clone();
		let value = if self.check(TokenKind::Semicolon) { None } else { Some(self.expression()?) };
		self.consume(TokenKind::Semicolon, "Expect ';' after return value")?;
		Ok(Stmt::Return { keyword, value })
	}

	fn if_statement(&mut self) -> Result<Stmt, ParseError> {
		self.consume(TokenKind::LeftParen, "Expect '(' after 'if'")?;
		let condition = self.expression()?;
		self.consume(TokenKind::RightParen, "Expect ')' after if condition")?;

		let then_branch = Box::new(self.statement()?);
		let else_branch = if self.matches(&[TokenKind::Else]) { Some(Box::new(self.statement()?)) } else { None };

		Ok(Stmt::If { condition, then_branch, else_branch })
	}

	fn while_statement(&mut self) -> Result<Stmt, ParseError> {
		self.consume(TokenKind::LeftParen, "Expect '(' after 'while'")?;
		let condition = self.expression()?;
		self.consume(TokenKind::RightParen, "Expect ')' after while condition")?;
		let body = Box::new(self.statement()?);
		Ok(Stmt::While { condition, body })
	}

	/// Desugars `for (init; cond; incr) body` into
	/// `{ init; while (cond) { body; incr; } }` at parse time; there is no `For` node in the AST.
	fn for_statement(&mut self) -> Result<Stmt, ParseError> {
		self.consume(TokenKind::LeftParen, "Expect '(' after 'for'")?;

		let initializer = if self.matches(&[TokenKind::Semicolon]) {
			None
		} else if self.matches(&[TokenKind::Let]) {
			Some(self.var_declaration()?)
		} else {
			Some(self.expression_statement()?)
		};

		let condition = if self.check(TokenKind::Semicolon) { None } else { Some(self.expression()?) };
		self.consume(TokenKind::Semicolon, "Expect ';' after loop condition")?;

		let increment = if self.check(TokenKind::RightParen) { None } else { Some(self.expression()?) };
		self.consume(TokenKind::RightParen, "Expect ')' after for clauses")?;

		let mut body = self.statement()?;

		if let Some(increment) = increment {
			body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
		}

		let condition = condition.unwrap_or(Expr::Literal(Literal::Bool(true)));
		body = Stmt::While { condition, body: Box::new(body) };

		if let Some(initializer) = initializer {
			body = Stmt::Block(vec![initializer, body]);
		}

		Ok(body)
	}

	fn block(&mut self) -> Result<Vec<Stmt>, ParseError> {
		let mut statements = Vec::new();
		while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
			statements.push(self.declaration()?);
		}
		self.consume(TokenKind::RightBrace, "Expect '}' after block")?;
		Ok(statements)
	}

	fn expression_statement(&mut self) -> Result<Stmt, ParseError> {
		let expr = self.expression()?;
		self.consume(TokenKind::Semicolon, "Expect ';' after expression")?;
		Ok(Stmt::Expression(expr))
	}

	// --- expressions, precedence low to high ---

	fn expression(&mut self) -> Result<Expr, ParseError> {
		self.assignment()
	}

	fn assignment(&mut self) -> Result<Expr, ParseError> {
		let expr = self.or()?;

		if self.matches(&[TokenKind::Equal]) {
			let equals = self.previous().clone();
			let value = self.assignment()?;

			if let Expr::Variable { name, .. } = expr {
				return Ok(Expr::assign(name, value));
			}

			// Report and keep the parsed left-hand side rather than entering panic mode: an
			// invalid assignment target isn't a token-stream desync, so there's nothing to
			// synchronize past.
			self.error_at(&equals, "Invalid assignment target");
			return Ok(expr);
		}

		Ok(expr)
	}

	fn or(&mut self) -> Result<Expr, ParseError> {
		let mut expr = self.and()?;
		while self.matches(&[TokenKind::Or]) {
			let operator = self.previous().clone();
			let right = self.and()?;
			expr = Expr::Logical { left: Box::new(expr), operator, right: Box::new(right) };
		}
		Ok(expr)
	}

	fn and(&mut self) -> Result<Expr, ParseError> {
		let mut expr = self.equality()?;
		while self.matches(&[TokenKind::And]) {
			let operator = self.previous().clone();
			let right = self.equality()?;
			expr = Expr::Logical { left: Box::new(expr), operator, right: Box::new(right) };
		}
		Ok(expr)
	}

	fn equality(&mut self) -> Result<Expr, ParseError> {
		self.binary(Self::comparison, &[TokenKind::BangEqual, TokenKind::EqualEqual])
	}

	fn comparison(&mut self) -> Result<Expr, ParseError> {
		self.binary(Self::term, &[TokenKind::Greater, TokenKind::GreaterEqual, TokenKind::Less, TokenKind::LessEqual])
	}

	fn term(&mut self) -> Result<Expr, ParseError> {
		self.binary(Self::factor, &[TokenKind::Minus, TokenKind::Plus])
	}

	fn factor(&mut self) -> Result<Expr, ParseError> {
		self.binary(Self::unary, &[TokenKind::Star, TokenKind::Slash])
	}

	/// Shared left-associative binary operator ladder: parses one `operand` at `next`
	/// precedence, then folds in `(operator operand)*` at the current precedence.
	fn binary(&mut self, next: fn(&mut Self) -> Result<Expr, ParseError>, kinds: &[TokenKind]) -> Result<Expr, ParseError> {
		let mut expr = next(self)?;
		while self.matches(kinds) {
			let operator = self.previous().clone();
			let right = next(self)?;
			expr = Expr::Binary { left: Box::new(expr), operator, right: Box::new(right) };
		}
		Ok(expr)
	}

	fn unary(&mut self) -> Result<Expr, ParseError> {
		if self.matches(&[TokenKind::Bang, TokenKind::Minus]) {
			let operator = self.previous().clone();
			let right = self.unary()?;
			return Ok(Expr::Unary { operator, right: Box::new(right) });
		}
		self.call()
	}

	fn call(&mut self) -> Result<Expr, ParseError> {
		let mut expr = self.primary()?;
		loop {
			if self.matches(&[TokenKind::LeftParen]) {
				expr = self.finish_call(expr)?;
			} else {
				break;
			}
		}
		Ok(expr)
	}

	fn finish_call(&mut self, callee: Expr) -> Result<Expr, ParseError> {
		let mut arguments = Vec::new();
		if !self.check(TokenKind::RightParen) {
			loop {
				if arguments.len() >= MAX_ARGS {
					self.error_at_current(&format!("Can't have more than {MAX_ARGS} arguments"));
				}
				arguments.push(self.expression()?);
				if !self.matches(&[TokenKind::Comma]) {
					break;
				}
			}
		}
		let paren = self.consume(TokenKind::RightParen, "Expect ')' after arguments")?;
		Ok(Expr::Call { callee: Box::new(callee), paren, arguments })
	}

	fn primary(&mut self) -> Result<Expr, ParseError> {
		if self.matches(&[TokenKind::False]) {
			return Ok(Expr::Literal(Literal::Bool(false)));
		}
		if self.matches(&[TokenKind::True]) {
			return Ok(Expr::Literal(Literal::Bool(true)));
		}
		if self.matches(&[TokenKind::Nil]) {
			return Ok(Expr::Literal(Literal::Nil));
		}
		if self.matches(&[TokenKind::Number, TokenKind::String]) {
			return Ok(Expr::Literal(Literal::from(self.previous().literal.as_ref().expect("number/string token always carries a literal"))));
		}
		if self.matches(&[TokenKind::Identifier]) {
			return Ok(Expr::variable(self.previous().clone()));
		}
		if self.matches(&[TokenKind::LeftParen]) {
			let expr = self.expression()?;
			self.consume(TokenKind::RightParen, "Expect ')' after expression")?;
			return Ok(Expr::Grouping(Box::new(expr)));
		}

		self.error_at_current("Expect expression");
		Err(ParseError)
	}

	// --- token cursor helpers ---

	fn matches(&mut self, kinds: &[TokenKind]) -> bool {
		for kind in kinds {
			if self.check(*kind) {
				self.advance();
				return true;
			}
		}
		false
	}

	fn check(&self, kind: TokenKind) -> bool {
		!self.is_at_end() && self.peek().kind == kind
	}

	fn advance(&mut self) -> &Token {
		if !self.is_at_end() {
			self.current += 1;
		}
		self.previous()
	}

	fn is_at_end(&self) -> bool {
		self.peek().kind == TokenKind::Eof
	}

	fn peek(&self) -> &Token {
		&self.tokens[self.current]
	}

	fn previous(&self) -> &Token {
		&self.tokens[self.current - 1]
	}

	fn consume(&mut self, kind: TokenKind, message: &str) -> Result<Token, ParseError> {
		if self.check(kind) {
			return Ok(self.advance().clone());
		}
		self.error_at_current(message);
		Err(ParseError)
	}

	fn error_at_current(&mut self, message: &str) {
		let token = self.peek().clone();
		self.error_at(&token, message);
	}

	fn error_at(&mut self, token: &Token, message: &str) {
		let site = if token.kind == TokenKind::Eof { ErrorSite::AtEnd } else { ErrorSite::AtLexeme(token.lexeme.clone()) };
		self.diagnostics.push(Diagnostic::parse(token.line, site, message));
	}

	/// Advances past the current mess of tokens until we're likely at the start of the next
	/// statement, so one syntax error doesn't cascade into a pile of bogus follow-on errors.
	fn synchronize(&mut self) {
		self.advance();
		while !self.is_at_end() {
			if self.previous().kind == TokenKind::Semicolon {
				return;
			}
			if matches!(
				self.peek().kind,
				TokenKind::Class | TokenKind::Fn | TokenKind::Let | TokenKind::For | TokenKind::If | TokenKind::While | TokenKind::Print | TokenKind::Return
			) {
				return;
			}
			self.advance();
		}
	}
}

#[cfg(test)]
mod tests {
	use super::Parser;
	use crate::ast::stmt::Stmt;
	use crate::lexer::Scanner;

	fn parse(source: &str) -> (Vec<Stmt>, Vec<crate::diagnostics::Diagnostic>) {
		let (tokens, diagnostics) = Scanner::new(source).scan_tokens();
		assert!(diagnostics.is_empty(), "unexpected lex diagnostics: {diagnostics:?}");
		Parser::new(&tokens).parse()
	}

	#[test]
	fn invalid_assignment_target_is_reported_without_entering_panic_mode() {
		let (statements, diagnostics) = parse("1 = 2; print 3;");

		assert_eq!(diagnostics.len(), 1);
		assert!(diagnostics[0].to_string().contains("Invalid assignment target"));

		// The bad statement keeps its parsed left-hand side instead of being dropped, and the
		// next statement parses normally rather than being eaten by error recovery.
		assert_eq!(statements.len(), 2);
		assert!(matches!(statements[0], Stmt::Expression(_)));
		assert!(matches!(statements[1], Stmt::Print(_)));
	}
}
