//! Recursive-descent parser for the template grammar.
//!
//! ```text
//! statement  := (expression | raw_char)+
//! expression := "{{" space* (function | identifier | literal) space* "}}"
//! function   := identifier space* "(" space* arguments? space* ")"
//! arguments  := valuable (space* "," space* valuable)*
//! valuable   := literal | identifier
//! identifier := alpha (alnum | "_")*
//! literal    := signed_integer | '"' printable* '"'
//! ```
//!
//! Alternatives backtrack: a `{{` that does not open a well-formed expression
//! is consumed as ordinary raw text. The statement itself fails only on empty
//! input or on a control character other than tab, CR or LF; the caller then
//! falls back to a single raw fragment for the whole input.

use super::{Expression, Fragment, Value};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Parse `source` into fragments, or `None` if the statement rule fails.
pub(super) fn parse(source: &str) -> Option<Vec<Fragment>> {
    if source.is_empty() {
        return None;
    }

    let mut cursor = Cursor::new(source);
    let mut fragments = Vec::new();
    let mut raw = String::new();

    while !cursor.is_eof() {
        if cursor.starts_with(OPEN) {
            let checkpoint = cursor.pos;
            if let Some(expression) = expression(&mut cursor) {
                if !raw.is_empty() {
                    fragments.push(Fragment::Raw(std::mem::take(&mut raw)));
                }
                fragments.push(Fragment::Expression(expression));
                continue;
            }
            cursor.pos = checkpoint;
        }

        let c = cursor.bump()?;
        if !is_raw_char(c) {
            return None;
        }
        raw.push(c);
    }

    if !raw.is_empty() {
        fragments.push(Fragment::Raw(raw));
    }
    Some(fragments)
}

fn is_raw_char(c: char) -> bool {
    !c.is_control() || matches!(c, '\t' | '\n' | '\r')
}

fn expression(cursor: &mut Cursor<'_>) -> Option<Expression> {
    cursor.eat(OPEN)?;
    cursor.skip_space();

    let start = cursor.pos;
    let expression = match function(cursor) {
        Some(call) => call,
        None => {
            cursor.pos = start;
            match identifier(cursor) {
                Some(ident) => Expression::Literal(Value::Text(ident)),
                None => {
                    cursor.pos = start;
                    Expression::Literal(literal(cursor)?)
                }
            }
        }
    };

    cursor.skip_space();
    cursor.eat(CLOSE)?;
    Some(expression)
}

fn function(cursor: &mut Cursor<'_>) -> Option<Expression> {
    let name = identifier(cursor)?;
    cursor.skip_space();
    cursor.eat("(")?;
    cursor.skip_space();

    let mut args = Vec::new();
    if let Some(first) = valuable(cursor) {
        args.push(first);
        loop {
            let checkpoint = cursor.pos;
            cursor.skip_space();
            if cursor.eat(",").is_none() {
                cursor.pos = checkpoint;
                break;
            }
            cursor.skip_space();
            args.push(valuable(cursor)?);
        }
    }

    cursor.skip_space();
    cursor.eat(")")?;
    Some(Expression::Call { name, args })
}

fn valuable(cursor: &mut Cursor<'_>) -> Option<Value> {
    let start = cursor.pos;
    if let Some(value) = literal(cursor) {
        return Some(value);
    }
    cursor.pos = start;
    identifier(cursor).map(Value::Text)
}

fn identifier(cursor: &mut Cursor<'_>) -> Option<String> {
    let start = cursor.pos;
    if !cursor.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    cursor.bump();
    while cursor
        .peek()
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        cursor.bump();
    }
    Some(cursor.slice_from(start).to_owned())
}

fn literal(cursor: &mut Cursor<'_>) -> Option<Value> {
    match cursor.peek()? {
        '"' => quoted_string(cursor).map(Value::Text),
        _ => signed_integer(cursor).map(Value::Integer),
    }
}

fn signed_integer(cursor: &mut Cursor<'_>) -> Option<i64> {
    let start = cursor.pos;
    if matches!(cursor.peek(), Some('+' | '-')) {
        cursor.bump();
    }
    let digits = cursor.pos;
    while cursor.peek().is_some_and(|c| c.is_ascii_digit()) {
        cursor.bump();
    }
    if cursor.pos == digits {
        return None;
    }
    // Overflow makes the literal alternative fail rather than wrap.
    cursor.slice_from(start).parse().ok()
}

fn quoted_string(cursor: &mut Cursor<'_>) -> Option<String> {
    cursor.eat("\"")?;
    let start = cursor.pos;
    loop {
        match cursor.peek()? {
            '"' => break,
            c if c.is_control() => return None,
            _ => {
                cursor.bump();
            }
        }
    }
    let text = cursor.slice_from(start).to_owned();
    cursor.bump();
    Some(text)
}

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn starts_with(&self, token: &str) -> bool {
        self.rest().starts_with(token)
    }

    fn eat(&mut self, token: &str) -> Option<()> {
        if self.starts_with(token) {
            self.pos += token.len();
            Some(())
        } else {
            None
        }
    }

    fn skip_space(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn slice_from(&self, start: usize) -> &'a str {
        &self.input[start..self.pos]
    }
}
