//! Runtime values and the callable trait shared by user-defined and native functions.

use std::fmt;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::ast::stmt::FunctionDecl;
use crate::diagnostics::RuntimeError;
use crate::interpreter::environment::Environment;
use crate::interpreter::{Interpreter, Signal};

#[derive(Clone)]
pub enum Value {
	Nil,
	Bool(bool),
	Number(f64),
	String(Rc<String>),
	Callable(Rc<dyn Callable>),
}

impl fmt::Debug for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Nil => write!(f, "Nil"),
			Self::Bool(b) => write!(f, "Bool({b})"),
			Self::Number(n) => write!(f, "Number({n})"),
			Self::String(s) => write!(f, "String({s:?})"),
			Self::Callable(callable) => write!(f, "Callable({callable})"),
		}
	}
}

/// Structural equality in the `Value::is_equal` sense, so tests can use `assert_eq!` directly.
/// Not used by the evaluator itself, which calls `is_equal` explicitly to keep the `==`/`!=`
/// semantics visible at the call site.
impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		self.is_equal(other)
	}
}

impl Value {
	/// `Nil` and `False` are falsy; every other value, including `0` and the empty string, is
	/// truthy.
	#[must_use]
	pub fn is_truthy(&self) -> bool {
		!matches!(self, Self::Nil | Self::Bool(false))
	}

	/// Structural equality. `Nil` equals only `Nil`; callables are never equal to anything,
	/// including themselves, since Pox has no use for function identity comparison.
	#[must_use]
	pub fn is_equal(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Nil, Self::Nil) => true,
			(Self::Bool(a), Self::Bool(b)) => a == b,
			(Self::Number(a), Self::Number(b)) => a == b,
			(Self::String(a), Self::String(b)) => a == b,
			_ => false,
		}
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Nil => write!(f, "Nil"),
			Self::Bool(true) => write!(f, "True"),
			Self::Bool(false) => write!(f, "False"),
			Self::Number(n) => {
				// Doubles that represent an integer print without the trailing `.0`.
				if n.fract() == 0.0 && n.is_finite() {
					write!(f, "{n:.0}")
				} else {
					write!(f, "{n}")
				}
			}
			Self::String(s) => write!(f, "{s}"),
			Self::Callable(callable) => write!(f, "{callable}"),
		}
	}
}

/// Anything that can be invoked with `(...)`: user-defined `fn` values and native builtins.
pub trait Callable: fmt::Display {
	fn arity(&self) -> usize;
	fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value, RuntimeError>;
}

/// A user-defined function value: the declaration it was built from, plus the environment it
/// closed over at definition time.
pub struct PoxFunction {
	declaration: Rc<FunctionDecl>,
	closure: Rc<Environment>,
}

impl PoxFunction {
	#[must_use]
	pub fn new(declaration: Rc<FunctionDecl>, closure: Rc<Environment>) -> Self {
		Self { declaration, closure }
	}
}

impl Callable for PoxFunction {
	fn arity(&self) -> usize {
		self.declaration.params.len()
	}

	fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value, RuntimeError> {
		// The new call frame encloses the *closure*, not the caller's environment: this is what
		// gives Pox functions lexical rather than dynamic scoping.
		let environment = Rc::new(Environment::new(Some(Rc::clone(&self.closure))));
		for (param, argument) in self.declaration.params.iter().zip(arguments) {
			environment.define(param.lexeme.clone(), argument);
		}

		// This is the only place a `Signal::Return` is consumed: a block nested arbitrarily
		// deep inside the body keeps propagating it outward until it lands here.
		match interpreter.execute_block(&self.declaration.body, environment)? {
			Some(Signal::Return(value)) => Ok(value),
			None => Ok(Value::Nil),
		}
	}
}

impl fmt::Display for PoxFunction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "<fn {}>", self.declaration.name.lexeme)
	}
}

/// The single built-in global: `clock`, returning seconds since the Unix epoch.
pub struct NativeFunction;

impl Callable for NativeFunction {
	fn arity(&self) -> usize {
		0
	}

	fn call(&self, _interpreter: &mut Interpreter, _arguments: Vec<Value>) -> Result<Value, RuntimeError> {
		let seconds = SystemTime::now().duration_since(UNIX_EPOCH).map_or(0.0, |duration| duration.as_secs_f64());
		Ok(Value::Number(seconds))
	}
}

impl fmt::Display for NativeFunction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "<native fn>")
	}
}
