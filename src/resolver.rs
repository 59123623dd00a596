//! Static resolver: a single pre-pass over the AST that computes lexical scope distances for
//! variable reads and assignments, writing them directly into the AST's `Cell<Option<usize>>`
//! depth fields rather than a separate side table.

use std::collections::HashMap;

use crate::ast::expr::Expr;
use crate::ast::stmt::Stmt;
use crate::diagnostics::{Diagnostic, ErrorSite};
use crate::token::Token;

pub struct Resolver {
	/// One entry per open lexical scope, innermost last. The value is `false` while a name has
	/// been declared but its initializer hasn't finished resolving, and `true` once defined.
	scopes: Vec<HashMap<String, bool>>,
	diagnostics: Vec<Diagnostic>,
}

impl Resolver {
	#[must_use]
	pub fn new() -> Self {
		Self { scopes: Vec::new(), diagnostics: Vec::new() }
	}

	/// Resolves an entire program, returning whatever diagnostics were raised. Depths are
	/// written as a side effect into the statements' and expressions' own `depth` cells.
	#[must_use]
	pub fn resolve(mut self, statements: &[Stmt]) -> Vec<Diagnostic> {
		self.resolve_statements(statements);
		self.diagnostics
	}

	fn resolve_statements(&mut self, statements: &[Stmt]) {
		for statement in statements {
			self.resolve_statement(statement);
		}
	}

	fn resolve_statement(&mut self, statement: &Stmt) {
		match statement {
			Stmt::Expression(expr) | Stmt::Print(expr) => self.resolve_expr(expr),
			Stmt::Var { name, initializer } => {
				self.declare(name);
				if let Some(initializer) = initializer {
					self.resolve_expr(initializer);
				}
				self.define(name);
			}
			Stmt::Block(statements) => {
				self.begin_scope();
				self.resolve_statements(statements);
				self.end_scope();
			}
			Stmt::If { condition, then_branch, else_branch } => {
				self.resolve_expr(condition);
				self.resolve_statement(then_branch);
				if let Some(else_branch) = else_branch {
					self.resolve_statement(else_branch);
				}
			}
			Stmt::While { condition, body } => {
				self.resolve_expr(condition);
				self.resolve_statement(body);
			}
			Stmt::Function(decl) => {
				self.declare(&decl.name);
				self.define(&decl.name);
				self.begin_scope();
				for param in &decl.params {
					self.declare(param);
					self.define(param);
				}
				self.resolve_statements(&decl.body);
				self.end_scope();
			}
			Stmt::Return { value, .. } => {
				if let Some(value) = value {
					self.resolve_expr(value);
				}
			}
		}
	}

	fn resolve_expr(&mut self, expr: &Expr) {
		match expr {
			Expr::Literal(_) => {}
			Expr::Grouping(inner) => self.resolve_expr(inner),
			Expr::Unary { right, .. } => self.resolve_expr(right),
			Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
				self.resolve_expr(left);
				self.resolve_expr(right);
			}
			Expr::Call { callee, arguments, .. } => {
				self.resolve_expr(callee);
				for argument in arguments {
					self.resolve_expr(argument);
				}
			}
			Expr::Variable { name, depth } => {
				if let Some(scope) = self.scopes.last() {
					if scope.get(&name.lexeme) == Some(&false) {
						self.diagnostics.push(Diagnostic::resolve(
							name.line,
							ErrorSite::AtLexeme(name.lexeme.clone()),
							"Can't read local variable in its own initializer",
						));
					}
				}
				depth.set(self.resolve_local(name));
			}
			Expr::Assign { name, value, depth } => {
				self.resolve_expr(value);
				depth.set(self.resolve_local(name));
			}
		}
	}

	/// Walks scopes innermost-outward looking for `name`, returning the distance at the first
	/// hit. `None` means the name wasn't found in any open scope, i.e. it's a global.
	fn resolve_local(&self, name: &Token) -> Option<usize> {
		for (depth, scope) in self.scopes.iter().rev().enumerate() {
			if scope.contains_key(&name.lexeme) {
				return Some(depth);
			}
		}
		None
	}

	fn begin_scope(&mut self) {
		self.scopes.push(HashMap::new());
	}

	fn end_scope(&mut self) {
		self.scopes.pop();
	}

	fn declare(&mut self, name: &Token) {
		if let Some(scope) = self.scopes.last_mut() {
			scope.insert(name.lexeme.clone(), false);
		}
	}

	fn define(&mut self, name: &Token) {
		if let Some(scope) = self.scopes.last_mut() {
			scope.insert(name.lexeme.clone(), true);
		}
	}
}

impl Default for Resolver {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::Resolver;
	use crate::lexer::Scanner;
	use crate::parser::Parser;

	fn resolve_source(source: &str) -> Vec<crate::diagnostics::Diagnostic> {
		let (tokens, _) = Scanner::new(source).scan_tokens();
		let (statements, _) = Parser::new(&tokens).parse();
		Resolver::new().resolve(&statements)
	}

	#[test]
	fn flags_self_referential_local_initializer() {
		let diagnostics = resolve_source("{ let x = x; }");
		assert_eq!(diagnostics.len(), 1);
		assert!(diagnostics[0].to_string().contains("its own initializer"));
	}

	#[test]
	fn top_level_self_reference_is_not_flagged() {
		let diagnostics = resolve_source("let x = x;");
		assert!(diagnostics.is_empty());
	}

	#[test]
	fn records_depth_for_nested_function_reads_of_enclosing_locals() {
		let (tokens, _) = Scanner::new("{ let outer = 1; fn inner() { print outer; } }").scan_tokens();
		let (statements, _) = Parser::new(&tokens).parse();
		let diagnostics = Resolver::new().resolve(&statements);
		assert!(diagnostics.is_empty());
	}
}
