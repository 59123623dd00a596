//! Lexical environments: a chain of scopes, each a name→value map pointing upward at its
//! enclosing scope.
//!
//! Environments are reference-counted rather than owned, since a closure and its defining
//! scope (and any sibling closures created in that same scope) all need to share the same
//! mutable map. The chain only ever points upward (`enclosing`), and callables only ever point
//! downward (at the environment they captured), so there are no cycles and no need for `Weak`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::diagnostics::RuntimeError;
use crate::interpreter::value::Value;
use crate::token::Token;

pub struct Environment {
	values: RefCell<HashMap<String, Value>>,
	enclosing: Option<Rc<Environment>>,
}

impl Environment {
	#[must_use]
	pub fn new(enclosing: Option<Rc<Environment>>) -> Self {
		Self { values: RefCell::new(HashMap::new()), enclosing }
	}

	/// Binds `name` in this scope, overwriting any existing binding of the same name. Used both
	/// for `let` declarations and for binding call parameters.
	pub fn define(&self, name: impl Into<String>, value: Value) {
		self.values.borrow_mut().insert(name.into(), value);
	}

	/// Reads a variable, walking the enclosing chain if it isn't defined directly here.
	pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
		if let Some(value) = self.values.borrow().get(&name.lexeme) {
			return Ok(value.clone());
		}
		if let Some(enclosing) = &self.enclosing {
			return enclosing.get(name);
		}
		Err(RuntimeError::new(name.line, format!("Undefined variable '{}'", name.lexeme)))
	}

	/// Assigns to an existing variable, walking the enclosing chain. Unlike `define`, this
	/// fails if `name` isn't already bound anywhere in the chain: assignment can't implicitly
	/// declare a new variable.
	pub fn assign(&self, name: &Token, value: Value) -> Result<(), RuntimeError> {
		if self.values.borrow().contains_key(&name.lexeme) {
			self.values.borrow_mut().insert(name.lexeme.clone(), value);
			return Ok(());
		}
		if let Some(enclosing) = &self.enclosing {
			return enclosing.assign(name, value);
		}
		Err(RuntimeError::new(name.line, format!("Undefined variable '{}'", name.lexeme)))
	}

	/// Walks `enclosing` exactly `distance` times from `self`.
	fn ancestor(self: &Rc<Self>, distance: usize) -> Rc<Self> {
		let mut environment = Rc::clone(self);
		for _ in 0..distance {
			environment = Rc::clone(environment.enclosing.as_ref().expect("resolver-computed depth must stay within the environment chain"));
		}
		environment
	}

	/// Reads a variable known (by the resolver) to live exactly `distance` scopes up, without
	/// walking further. An unbound name here is a resolver bug, not a user error.
	pub fn get_at(self: &Rc<Self>, distance: usize, name: &str) -> Value {
		self.ancestor(distance)
			.values
			.borrow()
			.get(name)
			.cloned()
			.unwrap_or_else(|| panic!("resolver recorded depth {distance} for '{name}' but it isn't bound there"))
	}

	/// Assigns a variable known (by the resolver) to live exactly `distance` scopes up.
	pub fn assign_at(self: &Rc<Self>, distance: usize, name: &str, value: Value) {
		self.ancestor(distance).values.borrow_mut().insert(name.to_owned(), value);
	}
}

#[cfg(test)]
mod tests {
	use super::Environment;
	use crate::interpreter::value::Value;
	use std::rc::Rc;

	#[test]
	fn ancestor_lookup_skips_intermediate_scopes() {
		let global = Rc::new(Environment::new(None));
		global.define("x", Value::Number(1.0));
		let middle = Rc::new(Environment::new(Some(Rc::clone(&global))));
		let inner = Rc::new(Environment::new(Some(Rc::clone(&middle))));

		assert_eq!(inner.get_at(2, "x"), Value::Number(1.0));
	}

	#[test]
	fn sibling_closures_over_the_same_scope_observe_each_others_writes() {
		let scope = Rc::new(Environment::new(None));
		scope.define("count", Value::Number(0.0));

		scope.assign_at(0, "count", Value::Number(1.0));
		assert_eq!(scope.get_at(0, "count"), Value::Number(1.0));
	}
}
