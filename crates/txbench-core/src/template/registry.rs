//! Function registry for template expressions.
//!
//! The registry maps a function name to a callable taking the ordered argument
//! list and returning one [`Value`]. [`FunctionRegistry::with_builtins`] seeds
//! it with `random_string` and `random_number`; callers may register more
//! functions or override a built-in (later registration wins).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::BenchResult;

use super::Value;

/// Callable stored in a [`FunctionRegistry`].
pub type TemplateFunction = Arc<dyn Fn(&[Value]) -> BenchResult<Value> + Send + Sync>;

/// Name to function mapping consulted by the evaluator.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, TemplateFunction>,
}

impl FunctionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in generators.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("random_string", builtins::random_string);
        registry.register("random_number", builtins::random_number);
        registry
    }

    /// Register `function` under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: impl Into<String>, function: F) -> &mut Self
    where
        F: Fn(&[Value]) -> BenchResult<Value> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(function));
        self
    }

    /// Merge `overrides` into this registry; entries from `overrides` win.
    pub fn extend(&mut self, overrides: &FunctionRegistry) -> &mut Self {
        for (name, function) in &overrides.functions {
            self.functions.insert(name.clone(), Arc::clone(function));
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&TemplateFunction> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.names())
            .finish()
    }
}

/// Built-in generator functions.
///
/// Both draw from [`rand::thread_rng`]: one generator per thread, seeded from
/// OS entropy on first use. Workers never share a generator, so no locking is
/// involved when several threads render concurrently.
pub mod builtins {
    use rand::distributions::Alphanumeric;
    use rand::Rng;

    use crate::error::{BenchError, BenchResult};
    use crate::template::Value;

    /// `random_string(length)`: `length` characters from `[a-zA-Z0-9]`.
    pub fn random_string(args: &[Value]) -> BenchResult<Value> {
        let [length] = args else {
            return Err(BenchError::invalid_arguments(
                "random_string",
                format!("expected 1 argument, got {}", args.len()),
            ));
        };
        let length = integer_arg("random_string", length)?;
        let length = usize::try_from(length).map_err(|_| {
            BenchError::invalid_arguments("random_string", format!("negative length {length}"))
        })?;

        let text: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(length)
            .map(char::from)
            .collect();
        Ok(Value::Text(text))
    }

    /// `random_number()`, `random_number(max)`, `random_number(min, max)`.
    ///
    /// Uniform over the inclusive range; a missing `min` is `i64::MIN` and a
    /// missing `max` is `i64::MAX`.
    pub fn random_number(args: &[Value]) -> BenchResult<Value> {
        let (min, max) = match args {
            [] => (i64::MIN, i64::MAX),
            [max] => (i64::MIN, integer_arg("random_number", max)?),
            [min, max] => (
                integer_arg("random_number", min)?,
                integer_arg("random_number", max)?,
            ),
            _ => {
                return Err(BenchError::invalid_arguments(
                    "random_number",
                    format!("expected 0 to 2 arguments, got {}", args.len()),
                ))
            }
        };
        if min > max {
            return Err(BenchError::invalid_arguments(
                "random_number",
                format!("empty range [{min}, {max}]"),
            ));
        }
        Ok(Value::Integer(rand::thread_rng().gen_range(min..=max)))
    }

    fn integer_arg(function: &str, value: &Value) -> BenchResult<i64> {
        value.as_integer().ok_or_else(|| {
            BenchError::invalid_arguments(function, format!("expected integer, got `{value}`"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BenchError;

    #[test]
    fn test_builtins_registered() {
        let registry = FunctionRegistry::with_builtins();
        assert_eq!(registry.names(), vec!["random_number", "random_string"]);
        assert!(registry.contains("random_string"));
        assert!(!registry.contains("now"));
    }

    #[test]
    fn test_random_string_length_and_alphabet() {
        let value = builtins::random_string(&[Value::Integer(32)]).unwrap();
        let text = value.as_text().unwrap();
        assert_eq!(text.len(), 32);
        assert!(text.chars().all(|c| c.is_ascii_alphanumeric()));

        let empty = builtins::random_string(&[Value::Integer(0)]).unwrap();
        assert_eq!(empty.as_text(), Some(""));
    }

    #[test]
    fn test_random_string_rejects_bad_arguments() {
        assert!(matches!(
            builtins::random_string(&[Value::Integer(-1)]),
            Err(BenchError::InvalidArguments { .. })
        ));
        assert!(builtins::random_string(&[Value::from("ten")]).is_err());
        assert!(builtins::random_string(&[]).is_err());
    }

    #[test]
    fn test_random_number_ranges() {
        for _ in 0..200 {
            let n = builtins::random_number(&[Value::Integer(-3), Value::Integer(3)])
                .unwrap()
                .as_integer()
                .unwrap();
            assert!((-3..=3).contains(&n));

            let n = builtins::random_number(&[Value::Integer(i64::MIN + 5)])
                .unwrap()
                .as_integer()
                .unwrap();
            assert!(n <= i64::MIN + 5);
        }

        assert!(builtins::random_number(&[]).unwrap().as_integer().is_some());
        assert_eq!(
            builtins::random_number(&[Value::Integer(9), Value::Integer(9)]).unwrap(),
            Value::Integer(9)
        );
    }

    #[test]
    fn test_random_number_rejects_bad_arguments() {
        assert!(builtins::random_number(&[Value::Integer(5), Value::Integer(1)]).is_err());
        assert!(builtins::random_number(&[Value::from("x")]).is_err());
        assert!(builtins::random_number(&[
            Value::Integer(1),
            Value::Integer(2),
            Value::Integer(3)
        ])
        .is_err());
    }

    #[test]
    fn test_override_wins() {
        let mut overrides = FunctionRegistry::new();
        overrides.register("random_number", |_| Ok(Value::Integer(4)));

        let mut registry = FunctionRegistry::with_builtins();
        registry.extend(&overrides);

        let function = registry.get("random_number").unwrap();
        assert_eq!(function(&[] as &[Value]).unwrap(), Value::Integer(4));
    }
}
