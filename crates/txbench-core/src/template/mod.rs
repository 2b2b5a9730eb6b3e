//! Query template engine.
//!
//! Query strings may embed expressions between `{{` and `}}`:
//!
//! ```text
//! INSERT INTO users VALUES ({{ random_number(1, 1000) }}, '{{ random_string(16) }}')
//! ```
//!
//! A template is parsed once into a sequence of [`Fragment`]s and can then be
//! rendered any number of times against a [`FunctionRegistry`]. Every render
//! calls the functions again, so randomized generators yield fresh values on
//! each call.
//!
//! Parsing never fails: input that does not match the grammar becomes a
//! single raw-text fragment equal to the source.

mod evaluator;
mod parser;
mod registry;

use std::fmt;

use crate::error::BenchResult;

pub use evaluator::Evaluator;
pub use registry::{builtins, FunctionRegistry, TemplateFunction};

/// Literal value produced by the parser or returned by a template function.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Integer(i64),
    Text(String),
}

impl Value {
    /// Returns the integer payload, if any.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            Self::Text(_) => None,
        }
    }

    /// Returns the text payload, if any.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Integer(_) => None,
            Self::Text(value) => Some(value),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

/// Expression found between `{{` and `}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    /// Function call with literal or identifier arguments.
    Call { name: String, args: Vec<Value> },
    /// Bare literal, or identifier carried as its text token.
    Literal(Value),
}

/// One unit of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Raw(String),
    Expression(Expression),
}

/// Parsed query template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    fragments: Vec<Fragment>,
}

impl Template {
    /// Parse a template string, falling back to raw text on any parse failure.
    pub fn parse(source: impl Into<String>) -> Self {
        let source = source.into();
        let fragments = match parser::parse(&source) {
            Some(fragments) => fragments,
            None => vec![Fragment::Raw(source.clone())],
        };
        Self { source, fragments }
    }

    /// Template text as given.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parsed fragments in source order.
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Whether the template contains at least one expression.
    pub fn has_expressions(&self) -> bool {
        self.fragments
            .iter()
            .any(|fragment| matches!(fragment, Fragment::Expression(_)))
    }

    /// Names of all functions called by this template.
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.fragments.iter().filter_map(|fragment| match fragment {
            Fragment::Expression(Expression::Call { name, .. }) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Render the template, evaluating every expression against `registry`.
    pub fn render(&self, registry: &FunctionRegistry) -> BenchResult<String> {
        Evaluator::new(registry).render(self)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Parse and render `source` in one step using the built-in functions.
pub fn render_str(source: &str) -> BenchResult<String> {
    Template::parse(source).render(&FunctionRegistry::with_builtins())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Integer(-42).to_string(), "-42");
        assert_eq!(Value::from("abc").to_string(), "abc");
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::Integer(7).as_integer(), Some(7));
        assert_eq!(Value::Integer(7).as_text(), None);
        assert_eq!(Value::from("x").as_text(), Some("x"));
    }

    #[test]
    fn test_function_names() {
        let template = Template::parse("{{ random_number(1, 2) }}-{{ name }}-{{ random_string(3) }}");
        let names: Vec<_> = template.function_names().collect();
        assert_eq!(names, vec!["random_number", "random_string"]);
        assert!(template.has_expressions());
    }

    #[test]
    fn test_render_str_plain() {
        assert_eq!(render_str("SELECT 1").unwrap(), "SELECT 1");
    }
}
