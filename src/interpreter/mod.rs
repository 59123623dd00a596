//! The tree-walking evaluator: executes statements against a chain of [`Environment`]s.

pub mod environment;
pub mod value;

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use crate::ast::expr::{Expr, Literal};
use crate::ast::stmt::Stmt;
use crate::diagnostics::RuntimeError;
use crate::token::{Token, TokenKind};
use environment::Environment;
use value::{Callable, NativeFunction, PoxFunction, Value};

/// A non-local exit raised by a `return` statement. This is a control-flow signal, not an
/// error: it's caught exactly at the function-call boundary that started the body currently
/// running, and never surfaces as a [`RuntimeError`].
enum Signal {
	Return(Value),
}

type ExecResult = Result<Option<Signal>, RuntimeError>;

pub struct Interpreter {
	globals: Rc<Environment>,
	environment: Rc<Environment>,
	output: Rc<RefCell<dyn Write>>,
}

impl Interpreter {
	#[must_use]
	pub fn new(output: Rc<RefCell<dyn Write>>) -> Self {
		let globals = Rc::new(Environment::new(None));
		globals.define("clock", Value::Callable(Rc::new(NativeFunction)));
		Self { environment: Rc::clone(&globals), globals, output }
	}

	/// Executes a whole program. Stops at the first runtime error; it doesn't merely skip the
	/// failing statement and keep going.
	pub fn interpret(&mut self, statements: &[Stmt]) -> Result<(), RuntimeError> {
		for statement in statements {
			self.execute(statement)?;
		}
		Ok(())
	}

	fn execute(&mut self, statement: &Stmt) -> ExecResult {
		match statement {
			Stmt::Expression(expr) => {
				self.evaluate(expr)?;
				Ok(None)
			}
			Stmt::Print(expr) => {
				let value = self.evaluate(expr)?;
				let mut output = self.output.borrow_mut();
				// The output sink is in-process (a `Vec<u8>` in tests, stdout in the CLI), so a
				// write failure here means the sink itself is broken, not the program.
				let _ = writeln!(output, "{value}");
				Ok(None)
			}
			Stmt::Var { name, initializer } => {
				let value = match initializer {
					Some(expr) => self.evaluate(expr)?,
					None => Value::Nil,
				};
				self.environment.define(name.lexeme.clone(), value);
				Ok(None)
			}
			Stmt::Block(statements) => {
				let enclosing = Rc::new(Environment::new(Some(Rc::clone(&self.environment))));
				self.execute_block(statements, enclosing)
			}
			Stmt::If { condition, then_branch, else_branch } => {
				if self.evaluate(condition)?.is_truthy() {
					self.execute(then_branch)
				} else if let Some(else_branch) = else_branch {
					self.execute(else_branch)
				} else {
					Ok(None)
				}
			}
			Stmt::While { condition, body } => {
				while self.evaluate(condition)?.is_truthy() {
					if let Some(signal) = self.execute(body)? {
						return Ok(Some(signal));
					}
				}
				Ok(None)
			}
			Stmt::Function(decl) => {
				let function = PoxFunction::new(Rc::clone(decl), Rc::clone(&self.environment));
				self.environment.define(decl.name.lexeme.clone(), Value::Callable(Rc::new(function)));
				Ok(None)
			}
			Stmt::Return { value, .. } => {
				let value = match value {
					Some(expr) => self.evaluate(expr)?,
					None => Value::Nil,
				};
				Ok(Some(Signal::Return(value)))
			}
		}
	}

	/// Runs `statements` in a fresh scope enclosing `environment`'s parent, restoring the
	/// previous environment on every exit path (normal completion, a `return` escape, or a
	/// propagated error) since this is also the call-frame mechanism functions use.
	///
	/// A `return` escaping through a nested block must keep propagating as a [`Signal`] rather
	/// than being resolved here: only the function-call boundary that started the body knows
	/// what to do with it. `PoxFunction::call` is the one place that turns it into a value.
	fn execute_block(&mut self, statements: &[Stmt], environment: Rc<Environment>) -> ExecResult {
		let previous = Rc::clone(&self.environment);
		self.environment = environment;

		let mut result = Ok(None);
		for statement in statements {
			match self.execute(statement) {
				Ok(Some(signal)) => {
					result = Ok(Some(signal));
					break;
				}
				Ok(None) => {}
				Err(error) => {
					result = Err(error);
					break;
				}
			}
		}

		self.environment = previous;
		result
	}

	fn evaluate(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
		match expr {
			Expr::Literal(literal) => Ok(literal_value(literal)),
			Expr::Grouping(inner) => self.evaluate(inner),
			Expr::Unary { operator, right } => self.evaluate_unary(operator, right),
			Expr::Binary { left, operator, right } => self.evaluate_binary(left, operator, right),
			Expr::Logical { left, operator, right } => self.evaluate_logical(left, operator, right),
			Expr::Variable { name, depth } => self.lookup_variable(name, depth.get()),
			Expr::Assign { name, value, depth } => {
				let value = self.evaluate(value)?;
				match depth.get() {
					Some(distance) => self.environment.assign_at(distance, &name.lexeme, value.clone()),
					None => self.globals.assign(name, value.clone())?,
				}
				Ok(value)
			}
			Expr::Call { callee, paren, arguments } => self.evaluate_call(callee, paren, arguments),
		}
	}

	fn lookup_variable(&self, name: &Token, depth: Option<usize>) -> Result<Value, RuntimeError> {
		match depth {
			Some(distance) => Ok(self.environment.get_at(distance, &name.lexeme)),
			None => self.globals.get(name),
		}
	}

	fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value, RuntimeError> {
		let right = self.evaluate(right)?;
		match operator.kind {
			TokenKind::Minus => Ok(Value::Number(-number_operand(operator, &right)?)),
			TokenKind::Bang => Ok(Value::Bool(!right.is_truthy())),
			_ => unreachable!("unary operator token kinds are limited to `!` and `-` by the parser"),
		}
	}

	fn evaluate_logical(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value, RuntimeError> {
		let left = self.evaluate(left)?;
		match operator.kind {
			TokenKind::Or if left.is_truthy() => Ok(left),
			TokenKind::Or => self.evaluate(right),
			TokenKind::And if !left.is_truthy() => Ok(left),
			TokenKind::And => self.evaluate(right),
			_ => unreachable!("logical operator token kinds are limited to `and` and `or` by the parser"),
		}
	}

	fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value, RuntimeError> {
		let left = self.evaluate(left)?;
		let right = self.evaluate(right)?;

		match operator.kind {
			TokenKind::Plus => match (&left, &right) {
				(Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
				(Value::String(_), _) | (_, Value::String(_)) => Ok(Value::String(Rc::new(format!("{left}{right}")))),
				_ => Err(RuntimeError::new(operator.line, "Operands must be two numbers or two strings")),
			},
			TokenKind::Minus => Ok(Value::Number(number_operand(operator, &left)? - number_operand(operator, &right)?)),
			TokenKind::Star => Ok(Value::Number(number_operand(operator, &left)? * number_operand(operator, &right)?)),
			TokenKind::Slash => {
				let (a, b) = (number_operand(operator, &left)?, number_operand(operator, &right)?);
				if a == 0.0 || b == 0.0 {
					return Err(RuntimeError::new(operator.line, "Division by zero"));
				}
				Ok(Value::Number(a / b))
			}
			TokenKind::Greater => Ok(Value::Bool(number_operand(operator, &left)? > number_operand(operator, &right)?)),
			TokenKind::GreaterEqual => Ok(Value::Bool(number_operand(operator, &left)? >= number_operand(operator, &right)?)),
			TokenKind::Less => Ok(Value::Bool(number_operand(operator, &left)? < number_operand(operator, &right)?)),
			TokenKind::LessEqual => Ok(Value::Bool(number_operand(operator, &left)? <= number_operand(operator, &right)?)),
			TokenKind::EqualEqual => Ok(Value::Bool(left.is_equal(&right))),
			TokenKind::BangEqual => Ok(Value::Bool(!left.is_equal(&right))),
			_ => unreachable!("binary operator token kinds are limited to the arithmetic/comparison set by the parser"),
		}
	}

	fn evaluate_call(&mut self, callee: &Expr, paren: &Token, arguments: &[Expr]) -> Result<Value, RuntimeError> {
		let callee = self.evaluate(callee)?;

		let mut argument_values = Vec::with_capacity(arguments.len());
		for argument in arguments {
			argument_values.push(self.evaluate(argument)?);
		}

		let Value::Callable(callable) = callee else {
			return Err(RuntimeError::new(paren.line, "Can only call functions"));
		};

		if argument_values.len() != callable.arity() {
			return Err(RuntimeError::new(paren.line, format!("Expected {} arguments but got {}", callable.arity(), argument_values.len())));
		}

		callable.call(self, argument_values)
	}
}

fn literal_value(literal: &Literal) -> Value {
	match literal {
		Literal::Number(n) => Value::Number(*n),
		Literal::String(s) => Value::String(Rc::clone(s)),
		Literal::Bool(b) => Value::Bool(*b),
		Literal::Nil => Value::Nil,
	}
}

fn number_operand(operator: &Token, value: &Value) -> Result<f64, RuntimeError> {
	match value {
		Value::Number(n) => Ok(*n),
		_ => Err(RuntimeError::new(operator.line, "Operand must be a number")),
	}
}

#[cfg(test)]
mod tests {
	use super::Interpreter;
	use crate::lexer::Scanner;
	use crate::parser::Parser;
	use crate::resolver::Resolver;
	use std::cell::RefCell;
	use std::rc::Rc;

	fn run(source: &str) -> Result<String, String> {
		let (tokens, lex_diagnostics) = Scanner::new(source).scan_tokens();
		assert!(lex_diagnostics.is_empty(), "{lex_diagnostics:?}");
		let (statements, parse_diagnostics) = Parser::new(&tokens).parse();
		assert!(parse_diagnostics.is_empty(), "{parse_diagnostics:?}");
		let resolve_diagnostics = Resolver::new().resolve(&statements);
		assert!(resolve_diagnostics.is_empty(), "{resolve_diagnostics:?}");

		let output: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
		let mut interpreter = Interpreter::new(Rc::clone(&output) as Rc<RefCell<dyn std::io::Write>>);
		interpreter.interpret(&statements).map_err(|error| error.to_string())?;
		Ok(String::from_utf8(output.borrow().clone()).expect("print output is always valid utf-8"))
	}

	#[test]
	fn operator_precedence() {
		assert_eq!(run("print 1 + 2 * 3;").unwrap(), "7\n");
	}

	#[test]
	fn string_and_number_concatenation_stringifies_the_number() {
		assert_eq!(run("let a = 'hi'; let b = 1; print a + b;").unwrap(), "hi1\n");
	}

	#[test]
	fn block_scoping_shadows_then_restores_outer_binding() {
		assert_eq!(run("let a = 'outer'; { let a = 'inner'; print a; } print a;").unwrap(), "inner\nouter\n");
	}

	#[test]
	fn recursive_fibonacci() {
		let source = "fn fib(n) { if (n < 2) return n; return fib(n-1) + fib(n-2); } print fib(10);";
		assert_eq!(run(source).unwrap(), "55\n");
	}

	#[test]
	fn division_by_zero_is_a_runtime_error() {
		let error = run("print 1 / 0;").unwrap_err();
		assert!(error.contains("Division by zero"), "{error}");
	}

	#[test]
	fn short_circuit_or_never_evaluates_the_right_operand() {
		let source = "fn side_effect() { print 'called'; return True; } print True or side_effect();";
		assert_eq!(run(source).unwrap(), "True\n");
	}

	#[test]
	fn short_circuit_and_never_evaluates_the_right_operand() {
		let source = "fn side_effect() { print 'called'; return True; } print False and side_effect();";
		assert_eq!(run(source).unwrap(), "False\n");
	}

	#[test]
	fn closures_over_the_same_scope_share_mutable_state() {
		let source = "fn makeCounter() { let i = 0; fn inc() { i = i + 1; print i; } return inc; } let counter = makeCounter(); counter(); counter();";
		assert_eq!(run(source).unwrap(), "1\n2\n");
	}

	#[test]
	fn numbers_drop_trailing_zero_fraction() {
		assert_eq!(run("print 2.0;").unwrap(), "2\n");
		assert_eq!(run("print 2.5;").unwrap(), "2.5\n");
	}

	#[test]
	fn nil_equals_only_nil() {
		assert_eq!(run("print Nil == Nil;").unwrap(), "True\n");
		assert_eq!(run("print Nil == False;").unwrap(), "False\n");
	}

	#[test]
	fn return_escapes_through_a_nested_block() {
		let source = "fn f() { if (True) { return 1; } print 2; } print f();";
		assert_eq!(run(source).unwrap(), "1\n");
	}

	#[test]
	fn return_escapes_through_a_while_bodys_block() {
		let source = "fn f() { while (True) { return 9; } } print f();";
		assert_eq!(run(source).unwrap(), "9\n");
	}
}
