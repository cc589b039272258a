//! Restricted literal grammar backing the `obj` value kind.
//!
//! Accepts plain data only: `None`, `True`, `False`, integers, floats, quoted
//! strings, lists, tuples, dicts and sets (including `set()`). Names, calls,
//! operators and every other expression form are rejected, so decoding a
//! config value can never execute anything.
//!
//! [`Literal`]'s `Display` renders the same grammar back, so a rendered literal
//! always parses to an equal value.

use std::fmt;
use std::str::FromStr;

/// A decoded `obj` value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Literal>),
    Tuple(Vec<Literal>),
    Set(Vec<Literal>),
    Dict(Vec<(Literal, Literal)>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralError {
    pub offset: usize,
    pub message: String,
}

impl fmt::Display for LiteralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.message, self.offset)
    }
}

impl std::error::Error for LiteralError {}

/// Parse a complete literal. Surrounding whitespace is allowed, anything else
/// after the value is an error.
pub fn parse(input: &str) -> Result<Literal, LiteralError> {
    let mut parser = Parser { src: input, pos: 0 };
    let value = parser.value()?;
    parser.skip_ws();
    if parser.pos < input.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(value)
}

impl FromStr for Literal {
    type Err = LiteralError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

impl Literal {
    /// Convert to JSON. Returns `None` for non-finite floats and for dict keys
    /// that have no JSON string form (containers).
    pub fn to_json(&self) -> Option<serde_json::Value> {
        use serde_json::Value as Json;
        Some(match self {
            Literal::None => Json::Null,
            Literal::Bool(b) => Json::Bool(*b),
            Literal::Int(i) => Json::from(*i),
            Literal::Float(f) => Json::Number(serde_json::Number::from_f64(*f)?),
            Literal::Str(s) => Json::String(s.clone()),
            Literal::List(items) | Literal::Tuple(items) | Literal::Set(items) => Json::Array(
                items
                    .iter()
                    .map(Literal::to_json)
                    .collect::<Option<Vec<_>>>()?,
            ),
            Literal::Dict(pairs) => {
                let mut map = serde_json::Map::new();
                for (key, value) in pairs {
                    let key = match key {
                        Literal::Str(s) => s.clone(),
                        Literal::Int(i) => i.to_string(),
                        Literal::Float(f) => format_float(*f),
                        Literal::Bool(b) => b.to_string(),
                        Literal::None => "null".to_string(),
                        _ => return None,
                    };
                    map.insert(key, value.to_json()?);
                }
                Json::Object(map)
            }
        })
    }

    pub fn from_json(value: &serde_json::Value) -> Literal {
        use serde_json::Value as Json;
        match value {
            Json::Null => Literal::None,
            Json::Bool(b) => Literal::Bool(*b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Literal::Int(i),
                None => Literal::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Literal::Str(s.clone()),
            Json::Array(items) => Literal::List(items.iter().map(Literal::from_json).collect()),
            Json::Object(map) => Literal::Dict(
                map.iter()
                    .map(|(k, v)| (Literal::Str(k.clone()), Literal::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::None => f.write_str("None"),
            Literal::Bool(true) => f.write_str("True"),
            Literal::Bool(false) => f.write_str("False"),
            Literal::Int(i) => write!(f, "{i}"),
            Literal::Float(v) => f.write_str(&format_float(*v)),
            Literal::Str(s) => f.write_str(&quote(s)),
            Literal::List(items) => {
                f.write_str("[")?;
                write_items(f, items)?;
                f.write_str("]")
            }
            Literal::Tuple(items) => {
                f.write_str("(")?;
                write_items(f, items)?;
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            Literal::Set(items) if items.is_empty() => f.write_str("set()"),
            Literal::Set(items) => {
                f.write_str("{")?;
                write_items(f, items)?;
                f.write_str("}")
            }
            Literal::Dict(pairs) => {
                f.write_str("{")?;
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Literal]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// Shortest text that parses back to the same `f64`. Finite values always
/// carry a `.` or an exponent so they never read back as integers.
pub(crate) fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    format!("{value:?}")
}

/// Quote a string: single quotes unless the text contains `'` but no `"`.
fn quote(s: &str) -> String {
    let delim = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(delim);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == delim => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(delim);
    out
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn error(&self, message: impl Into<String>) -> LiteralError {
        LiteralError {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn value(&mut self) -> Result<Literal, LiteralError> {
        self.skip_ws();
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some('[') => {
                self.bump();
                Ok(Literal::List(self.sequence(']')?))
            }
            Some('(') => self.paren(),
            Some('{') => self.brace(),
            Some('\'' | '"') => self.strings(),
            Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => self.number(),
            Some(c) if c.is_alphabetic() || c == '_' => self.name(),
            Some(c) => Err(self.error(format!("unexpected character {c:?}"))),
        }
    }

    /// Comma-separated values up to `close`; the opening delimiter is consumed.
    fn sequence(&mut self, close: char) -> Result<Vec<Literal>, LiteralError> {
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.eat(close) {
                return Ok(items);
            }
            items.push(self.value()?);
            self.skip_ws();
            if self.eat(',') {
                continue;
            }
            if self.eat(close) {
                return Ok(items);
            }
            return Err(self.error(format!("expected ',' or '{close}'")));
        }
    }

    fn paren(&mut self) -> Result<Literal, LiteralError> {
        self.bump();
        self.skip_ws();
        if self.eat(')') {
            return Ok(Literal::Tuple(Vec::new()));
        }
        let first = self.value()?;
        self.skip_ws();
        if self.eat(')') {
            // Plain grouping, not a tuple.
            return Ok(first);
        }
        if !self.eat(',') {
            return Err(self.error("expected ',' or ')'"));
        }
        let mut items = vec![first];
        items.extend(self.sequence(')')?);
        Ok(Literal::Tuple(items))
    }

    fn brace(&mut self) -> Result<Literal, LiteralError> {
        self.bump();
        self.skip_ws();
        if self.eat('}') {
            return Ok(Literal::Dict(Vec::new()));
        }
        let first = self.value()?;
        self.skip_ws();
        if !self.eat(':') {
            let mut items = vec![first];
            if self.eat(',') {
                items.extend(self.sequence('}')?);
            } else if !self.eat('}') {
                return Err(self.error("expected ',' or '}'"));
            }
            return Ok(Literal::Set(items));
        }

        let mut pairs = vec![(first, self.value()?)];
        loop {
            self.skip_ws();
            if self.eat('}') {
                return Ok(Literal::Dict(pairs));
            }
            if !self.eat(',') {
                return Err(self.error("expected ',' or '}'"));
            }
            self.skip_ws();
            if self.eat('}') {
                return Ok(Literal::Dict(pairs));
            }
            let key = self.value()?;
            self.skip_ws();
            if !self.eat(':') {
                return Err(self.error("expected ':'"));
            }
            pairs.push((key, self.value()?));
        }
    }

    fn name(&mut self) -> Result<Literal, LiteralError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.bump();
        }
        match &self.src[start..self.pos] {
            "None" => Ok(Literal::None),
            "True" => Ok(Literal::Bool(true)),
            "False" => Ok(Literal::Bool(false)),
            "inf" => Ok(Literal::Float(f64::INFINITY)),
            "nan" => Ok(Literal::Float(f64::NAN)),
            "set" => {
                self.skip_ws();
                if self.eat('(') {
                    self.skip_ws();
                    if self.eat(')') {
                        return Ok(Literal::Set(Vec::new()));
                    }
                }
                Err(self.error("only the empty call set() is allowed"))
            }
            other => Err(LiteralError {
                offset: start,
                message: format!("name '{other}' is not a literal"),
            }),
        }
    }

    fn number(&mut self) -> Result<Literal, LiteralError> {
        let start = self.pos;
        let negative = match self.peek() {
            Some('-') => {
                self.bump();
                true
            }
            Some('+') => {
                self.bump();
                false
            }
            _ => false,
        };
        let body_start = self.pos;
        let radix_prefixed = {
            let rest = self.src[body_start..].to_ascii_lowercase();
            rest.starts_with("0x") || rest.starts_with("0o") || rest.starts_with("0b")
        };
        let mut prev = '\0';
        while let Some(c) = self.peek() {
            let exponent_sign =
                matches!(c, '+' | '-') && matches!(prev, 'e' | 'E') && !radix_prefixed;
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' || exponent_sign {
                prev = c;
                self.bump();
            } else {
                break;
            }
        }

        let body: String = self.src[body_start..self.pos]
            .chars()
            .filter(|c| *c != '_')
            .collect();
        let bad = |message: String| LiteralError {
            offset: start,
            message,
        };
        if body.is_empty() {
            return Err(bad("expected a number".to_string()));
        }
        let sign = if negative { "-" } else { "" };

        // Non-finite floats, as written by `format_float`.
        match body.as_str() {
            "inf" if negative => return Ok(Literal::Float(f64::NEG_INFINITY)),
            "inf" => return Ok(Literal::Float(f64::INFINITY)),
            "nan" => return Ok(Literal::Float(f64::NAN)),
            _ => {}
        }

        if radix_prefixed {
            let radix = match body.as_bytes()[1].to_ascii_lowercase() {
                b'x' => 16,
                b'o' => 8,
                _ => 2,
            };
            return i64::from_str_radix(&format!("{sign}{}", &body[2..]), radix)
                .map(Literal::Int)
                .map_err(|e| bad(format!("invalid integer {body:?}: {e}")));
        }

        if body.contains(['.', 'e', 'E']) {
            return format!("{sign}{body}")
                .parse::<f64>()
                .map(Literal::Float)
                .map_err(|e| bad(format!("invalid float {body:?}: {e}")));
        }

        if body.len() > 1 && body.starts_with('0') && body.bytes().any(|b| b != b'0') {
            return Err(bad(format!("leading zeros in integer {body:?}")));
        }
        format!("{sign}{body}")
            .parse::<i64>()
            .map(Literal::Int)
            .map_err(|e| bad(format!("invalid integer {body:?}: {e}")))
    }

    /// One or more adjacent quoted strings, concatenated.
    fn strings(&mut self) -> Result<Literal, LiteralError> {
        let mut out = self.string()?;
        loop {
            let save = self.pos;
            self.skip_ws();
            if matches!(self.peek(), Some('\'' | '"')) {
                out.push_str(&self.string()?);
            } else {
                self.pos = save;
                return Ok(Literal::Str(out));
            }
        }
    }

    fn string(&mut self) -> Result<String, LiteralError> {
        let start = self.pos;
        let Some(delim) = self.bump() else {
            return Err(self.error("expected a string"));
        };
        let mut out = String::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(LiteralError {
                    offset: start,
                    message: "unterminated string".to_string(),
                });
            };
            if c == delim {
                return Ok(out);
            }
            if c != '\\' {
                out.push(c);
                continue;
            }
            match self.bump() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('0') => out.push('\0'),
                Some('\\') => out.push('\\'),
                Some('\'') => out.push('\''),
                Some('"') => out.push('"'),
                Some('\n') => {}
                Some('x') => out.push(self.hex_escape(2)?),
                Some('u') => out.push(self.hex_escape(4)?),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => return Err(self.error("unterminated escape")),
            }
        }
    }

    fn hex_escape(&mut self, digits: usize) -> Result<char, LiteralError> {
        let start = self.pos;
        for _ in 0..digits {
            if !self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                return Err(self.error("truncated escape sequence"));
            }
            self.bump();
        }
        u32::from_str_radix(&self.src[start..self.pos], 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.error("invalid escape sequence"))
    }
}
