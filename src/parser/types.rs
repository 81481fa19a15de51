//! Type expressions in `@param`, `@return` and `@field` annotations.
//!
//! Only the shapes the renderer distinguishes are parsed structurally
//! (`any`, `string`, `boolean`, `function`, `fun(...)`); every other
//! expression is kept verbatim as a named type.

use crate::model::LuaType;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct TypeSyntaxError(pub String);

/// Split the leading type expression off an annotation operand.
///
/// `"fun(a: number): boolean the callback"` → `("fun(a: number): boolean", "the callback")`.
/// Returns an empty type when `text` does not start with one.
pub fn split_type(text: &str) -> Result<(&str, &str), TypeSyntaxError> {
    let text = text.trim_start();
    let mut scanner = Scanner::new(text);
    scanner.union()?;
    let end = scanner.pos;
    Ok((&text[..end], text[end..].trim()))
}

/// Strip a trailing `?` optional marker.
pub fn strip_optional(text: &str) -> (&str, bool) {
    match text.strip_suffix('?') {
        Some(inner) if !inner.is_empty() => (inner, true),
        _ => (text, false),
    }
}

/// Parse a complete type expression.
pub fn parse_type(text: &str) -> Result<LuaType, TypeSyntaxError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(TypeSyntaxError("empty type".to_string()));
    }

    let mut scanner = Scanner::new(text);
    scanner.union()?;
    if scanner.pos != text.len() {
        return Err(TypeSyntaxError(format!(
            "unexpected `{}`",
            &text[scanner.pos..]
        )));
    }

    if is_callable(text) {
        return parse_callable(text);
    }

    Ok(match text {
        "any" => LuaType::Any,
        "string" => LuaType::String,
        "boolean" | "bool" => LuaType::Boolean,
        "function" => LuaType::Function {
            id: text.to_string(),
        },
        _ => LuaType::custom(text),
    })
}

/// True when the whole expression is a single `fun(...)` (not a union or array of one).
fn is_callable(text: &str) -> bool {
    if !text.starts_with("fun(") && !text.starts_with("fun (") {
        return false;
    }
    let mut scanner = Scanner::new(text);
    scanner.primary().is_ok() && scanner.pos == text.len()
}

fn parse_callable(text: &str) -> Result<LuaType, TypeSyntaxError> {
    let open = text
        .find('(')
        .ok_or_else(|| TypeSyntaxError("expected `(`".to_string()))?;
    let close = matching_close(text, open)?;

    let mut arg_types = Vec::new();
    for arg in split_top_level(&text[open + 1..close], b',') {
        let arg = arg.trim();
        if arg.is_empty() {
            continue;
        }
        arg_types.push(parse_type(arg_type(arg))?);
    }

    let rest = text[close + 1..].trim_start();
    let mut return_types = Vec::new();
    if let Some(ret) = rest.strip_prefix(':') {
        let ret = ret.trim();
        let list = if ret.starts_with('(') && matching_close(ret, 0)? == ret.len() - 1 {
            &ret[1..ret.len() - 1]
        } else {
            ret
        };
        for r in split_top_level(list, b',') {
            let r = r.trim();
            if !r.is_empty() {
                return_types.push(parse_type(r)?);
            }
        }
    }

    Ok(LuaType::Callable {
        arg_types,
        return_types,
    })
}

/// The type part of a callable argument: `name: T` → `T`, `T` → `T`.
fn arg_type(arg: &str) -> &str {
    if let Some(colon) = find_top_level(arg, b':') {
        let name = arg[..colon].trim();
        if name == "..." || is_identifier(name) {
            return arg[colon + 1..].trim();
        }
    }
    arg
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn matching_close(text: &str, open: usize) -> Result<usize, TypeSyntaxError> {
    let mut depth = 0usize;
    for (i, b) in text.bytes().enumerate().skip(open) {
        match b {
            b'(' | b'<' | b'{' | b'[' => depth += 1,
            b')' | b'>' | b'}' | b']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Ok(i);
                }
            }
            _ => {}
        }
    }
    Err(TypeSyntaxError("unbalanced brackets".to_string()))
}

fn find_top_level(text: &str, needle: u8) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in text.bytes().enumerate() {
        match b {
            b'(' | b'<' | b'{' | b'[' => depth += 1,
            b')' | b'>' | b'}' | b']' => depth = depth.saturating_sub(1),
            _ if b == needle && depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

fn split_top_level(text: &str, sep: u8) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = text;
    while let Some(i) = find_top_level(rest, sep) {
        parts.push(&rest[..i]);
        rest = &rest[i + 1..];
    }
    parts.push(rest);
    parts
}

// -- Scanner -----------------------------------------------------------------

/// Finds where a type expression ends inside free text.
struct Scanner<'t> {
    text: &'t str,
    pos: usize,
}

impl<'t> Scanner<'t> {
    fn new(text: &'t str) -> Self {
        Self { text, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn skip_blank(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t')) {
            self.pos += 1;
        }
    }

    /// `postfix ( '|' postfix )*`, blanks allowed around `|`.
    fn union(&mut self) -> Result<(), TypeSyntaxError> {
        if self.peek().is_none() {
            return Ok(());
        }
        self.postfix()?;
        loop {
            let save = self.pos;
            self.skip_blank();
            if self.peek() != Some(b'|') {
                self.pos = save;
                return Ok(());
            }
            self.pos += 1;
            self.skip_blank();
            self.postfix()?;
        }
    }

    /// A primary followed by any number of `[]` / `?`.
    fn postfix(&mut self) -> Result<(), TypeSyntaxError> {
        self.primary()?;
        loop {
            if self.text[self.pos..].starts_with("[]") {
                self.pos += 2;
            } else if self.peek() == Some(b'?') {
                self.pos += 1;
            } else {
                return Ok(());
            }
        }
    }

    fn primary(&mut self) -> Result<(), TypeSyntaxError> {
        let rest = &self.text[self.pos..];
        if rest.starts_with("fun(") || rest.starts_with("fun (") {
            self.pos += 3;
            self.skip_blank();
            self.group()?;
            let save = self.pos;
            self.skip_blank();
            if self.peek() == Some(b':') {
                self.pos += 1;
                self.skip_blank();
                if self.peek() == Some(b'(') {
                    self.group()?;
                } else {
                    self.postfix()?;
                }
            } else {
                self.pos = save;
            }
            return Ok(());
        }

        match self.peek() {
            Some(b'(' | b'{') => self.group(),
            Some(b'"' | b'\'') => self.literal(),
            Some(b) if is_name_byte(b) => {
                while matches!(self.peek(), Some(b) if is_name_byte(b)) {
                    self.pos += 1;
                }
                if self.peek() == Some(b'<') {
                    self.group()?;
                }
                Ok(())
            }
            Some(b) => Err(TypeSyntaxError(format!(
                "unexpected `{}`",
                b as char
            ))),
            None => Err(TypeSyntaxError("expected a type".to_string())),
        }
    }

    /// A bracketed group, balanced across all bracket kinds.
    fn group(&mut self) -> Result<(), TypeSyntaxError> {
        let close = matching_close(self.text, self.pos)?;
        self.pos = close + 1;
        Ok(())
    }

    fn literal(&mut self) -> Result<(), TypeSyntaxError> {
        let quote = self.text.as_bytes()[self.pos];
        match self.text[self.pos + 1..].bytes().position(|b| b == quote) {
            Some(len) => {
                self.pos += len + 2;
                Ok(())
            }
            None => Err(TypeSyntaxError("unterminated string literal".to_string())),
        }
    }
}

/// Identifier bytes, dots for qualified names; non-ASCII bytes are kept whole.
fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || b >= 0x80
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_simple_type() {
        assert_eq!(split_type("number The width").unwrap(), ("number", "The width"));
        assert_eq!(split_type("ui.Widget").unwrap(), ("ui.Widget", ""));
    }

    #[test]
    fn split_union_and_array() {
        assert_eq!(
            split_type("string|nil maybe a name").unwrap(),
            ("string|nil", "maybe a name")
        );
        assert_eq!(
            split_type("string | number either").unwrap(),
            ("string | number", "either")
        );
        assert_eq!(split_type("Widget[] all widgets").unwrap(), ("Widget[]", "all widgets"));
        assert_eq!(
            split_type("table<string, number> counts").unwrap(),
            ("table<string, number>", "counts")
        );
    }

    #[test]
    fn split_callable() {
        assert_eq!(
            split_type("fun(a: number, b: string): boolean called on change").unwrap(),
            ("fun(a: number, b: string): boolean", "called on change")
        );
        assert_eq!(
            split_type("fun(): (number, string) pair").unwrap(),
            ("fun(): (number, string)", "pair")
        );
        assert_eq!(split_type("fun() done").unwrap(), ("fun()", "done"));
    }

    #[test]
    fn split_empty_operand() {
        assert_eq!(split_type("").unwrap(), ("", ""));
    }

    #[test]
    fn unbalanced_is_an_error() {
        assert!(split_type("fun(a: number").is_err());
    }

    #[test]
    fn builtin_types() {
        assert_eq!(parse_type("any").unwrap(), LuaType::Any);
        assert_eq!(parse_type("string").unwrap(), LuaType::String);
        assert_eq!(parse_type("boolean").unwrap(), LuaType::Boolean);
        assert_eq!(
            parse_type("function").unwrap(),
            LuaType::Function {
                id: "function".to_string()
            }
        );
        assert_eq!(parse_type("number").unwrap(), LuaType::custom("number"));
        assert_eq!(parse_type("string|nil").unwrap(), LuaType::custom("string|nil"));
    }

    #[test]
    fn callable_types() {
        assert_eq!(
            parse_type("fun(a: number, string): boolean").unwrap(),
            LuaType::Callable {
                arg_types: vec![LuaType::custom("number"), LuaType::String],
                return_types: vec![LuaType::Boolean],
            }
        );
        assert_eq!(
            parse_type("fun(cb: fun(x: any)): (number, any)").unwrap(),
            LuaType::Callable {
                arg_types: vec![LuaType::Callable {
                    arg_types: vec![LuaType::Any],
                    return_types: Vec::new(),
                }],
                return_types: vec![LuaType::custom("number"), LuaType::Any],
            }
        );
    }

    #[test]
    fn callable_unions_stay_named() {
        assert_eq!(
            parse_type("fun()|nil").unwrap(),
            LuaType::custom("fun()|nil")
        );
        assert_eq!(parse_type("fun()[]").unwrap(), LuaType::custom("fun()[]"));
        assert_eq!(
            parse_type("fun(): number[]").unwrap(),
            LuaType::Callable {
                arg_types: Vec::new(),
                return_types: vec![LuaType::custom("number[]")],
            }
        );
    }

    #[test]
    fn trailing_garbage_is_rejected() {
        assert!(parse_type("number )").is_err());
    }

    #[test]
    fn optional_marker() {
        assert_eq!(strip_optional("number?"), ("number", true));
        assert_eq!(strip_optional("number"), ("number", false));
        assert_eq!(strip_optional("?"), ("?", false));
    }
}
