use crate::error::{BenchError, BenchResult};

use super::{Expression, Fragment, FunctionRegistry, Template, Value};

/// Renders templates against a function registry.
pub struct Evaluator<'a> {
    registry: &'a FunctionRegistry,
}

impl<'a> Evaluator<'a> {
    pub fn new(registry: &'a FunctionRegistry) -> Self {
        Self { registry }
    }

    /// Render every fragment in order and concatenate the results.
    ///
    /// Fails with [`BenchError::UnknownFunction`] when a call names a function
    /// missing from the registry; no partial output is returned.
    pub fn render(&self, template: &Template) -> BenchResult<String> {
        let mut output = String::with_capacity(template.source().len());
        for fragment in template.fragments() {
            match fragment {
                Fragment::Raw(text) => output.push_str(text),
                Fragment::Expression(expression) => {
                    output.push_str(&self.evaluate(expression)?.to_string());
                }
            }
        }
        Ok(output)
    }

    /// Evaluate a single expression to its value.
    ///
    /// Identifier arguments are forwarded as their text token; they are never
    /// resolved further.
    pub fn evaluate(&self, expression: &Expression) -> BenchResult<Value> {
        match expression {
            Expression::Literal(value) => Ok(value.clone()),
            Expression::Call { name, args } => {
                let function = self
                    .registry
                    .get(name)
                    .ok_or_else(|| BenchError::unknown_function(name))?;
                function(args.as_slice())
            }
        }
    }
}
