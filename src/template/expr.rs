//! Restricted expression evaluation for placeholders.
//!
//! The grammar is a closed instruction set, deliberately narrower than any
//! general evaluator: identifiers resolve against the call's bindings,
//! literals cover integers, strings, and lists, indexing selects a list
//! element, and the only callable surface is the allow-list of pure plural
//! rules reached through `self`. There are no statements, no imports, no
//! arithmetic, and no calls on plain values, so a catalogue author can shape
//! text but never execute code. Nesting depth is capped so a pathological
//! expression fails instead of recursing without bound.
//!
//! Grammar:
//!
//! ```text
//! expression := primary { '[' expression ']' | '.' ident [ '(' arguments ')' ] }
//! primary    := ident | integer | string | list | '(' expression ')'
//! list       := '[' [ expression { ',' expression } ] ']'
//! arguments  := [ expression { ',' expression } ]
//! ```

use std::iter::Peekable;
use std::str::Chars;

use unic_langid::LanguageIdentifier;

use super::{RenderContext, syntax};
use crate::error::{PhrasebookError, PhrasebookResult};
use crate::plural::PluralRule;
use crate::value::Value;

const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Int(i64),
    Str(String),
    LBracket,
    RBracket,
    LParen,
    RParen,
    Dot,
    Comma,
}

/// Evaluates one placeholder expression against the context.
pub(super) fn evaluate(source: &str, ctx: &RenderContext<'_>) -> PhrasebookResult<Value> {
    let tokens = lex(source)?;
    let mut parser = Parser {
        tokens,
        position: 0,
        ctx,
    };
    let operand = parser.expression(0)?;
    if parser.position < parser.tokens.len() {
        return Err(syntax(format!("unexpected trailing tokens in '{source}'")));
    }
    operand.into_value()
}

fn lex(source: &str) -> PhrasebookResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    while let Some(&current) = chars.peek() {
        match current {
            c if c.is_whitespace() => {
                chars.next();
            }
            '[' => {
                chars.next();
                tokens.push(Token::LBracket);
            }
            ']' => {
                chars.next();
                tokens.push(Token::RBracket);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '.' => {
                chars.next();
                tokens.push(Token::Dot);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '\'' | '"' => {
                chars.next();
                tokens.push(Token::Str(lex_string(&mut chars, current)?));
            }
            '-' => {
                chars.next();
                if chars.peek().is_some_and(char::is_ascii_digit) {
                    tokens.push(Token::Int(lex_integer(&mut chars, true)?));
                } else {
                    return Err(syntax("'-' may only introduce an integer literal"));
                }
            }
            c if c.is_ascii_digit() => {
                tokens.push(Token::Int(lex_integer(&mut chars, false)?));
            }
            c if c.is_alphabetic() || c == '_' => {
                tokens.push(Token::Ident(lex_ident(&mut chars)));
            }
            other => {
                return Err(syntax(format!(
                    "unexpected character '{other}' in expression"
                )));
            }
        }
    }
    Ok(tokens)
}

fn lex_string(chars: &mut Peekable<Chars<'_>>, quote: char) -> PhrasebookResult<String> {
    let mut text = String::new();
    while let Some(current) = chars.next() {
        match current {
            c if c == quote => return Ok(text),
            '\\' => match chars.next() {
                Some('n') => text.push('\n'),
                Some('t') => text.push('\t'),
                Some(escaped @ ('\\' | '\'' | '"')) => text.push(escaped),
                Some(other) => {
                    return Err(syntax(format!(
                        "unknown escape '\\{other}' in string literal"
                    )));
                }
                None => break,
            },
            other => text.push(other),
        }
    }
    Err(syntax("unterminated string literal"))
}

fn lex_integer(chars: &mut Peekable<Chars<'_>>, negative: bool) -> PhrasebookResult<i64> {
    let mut value: i64 = 0;
    while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
        chars.next();
        value = value
            .checked_mul(10)
            .and_then(|shifted| shifted.checked_add(i64::from(digit)))
            .ok_or_else(|| syntax("integer literal overflows"))?;
    }
    Ok(if negative { -value } else { value })
}

fn lex_ident(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut name = String::new();
    while let Some(&current) = chars.peek() {
        if current.is_alphanumeric() || current == '_' {
            name.push(current);
            chars.next();
        } else {
            break;
        }
    }
    name
}

/// A value or the special `self` reference, which is not itself a value but
/// grants access to the allow-listed helpers and attributes.
enum Operand {
    Value(Value),
    SelfRef,
}

impl Operand {
    fn into_value(self) -> PhrasebookResult<Value> {
        match self {
            Self::Value(value) => Ok(value),
            Self::SelfRef => Err(syntax("'self' cannot be used as a value")),
        }
    }
}

struct Parser<'a, 'b> {
    tokens: Vec<Token>,
    position: usize,
    ctx: &'a RenderContext<'b>,
}

impl Parser<'_, '_> {
    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.tokens.get(self.position) == Some(token) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, what: &str) -> PhrasebookResult<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(syntax(format!("expected {what}")))
        }
    }

    fn expression(&mut self, depth: usize) -> PhrasebookResult<Operand> {
        if depth > MAX_DEPTH {
            return Err(syntax("expression nests too deeply"));
        }
        let mut operand = self.primary(depth)?;
        loop {
            if self.eat(&Token::Dot) {
                operand = self.member(operand, depth)?;
            } else if self.eat(&Token::LBracket) {
                operand = self.index(operand, depth)?;
            } else {
                break;
            }
        }
        Ok(operand)
    }

    fn primary(&mut self, depth: usize) -> PhrasebookResult<Operand> {
        match self.next() {
            Some(Token::Ident(name)) if name == "self" => Ok(Operand::SelfRef),
            Some(Token::Ident(name)) => self
                .ctx
                .bindings
                .get(&name)
                .cloned()
                .map(Operand::Value)
                .ok_or(PhrasebookError::UndefinedVariable { name }),
            Some(Token::Int(number)) => Ok(Operand::Value(Value::Int(number))),
            Some(Token::Str(text)) => Ok(Operand::Value(Value::Str(text))),
            Some(Token::LBracket) => self.list_literal(depth),
            Some(Token::LParen) => {
                let inner = self.expression(depth + 1)?;
                self.expect(&Token::RParen, "')' closing the group")?;
                Ok(inner)
            }
            Some(other) => Err(syntax(format!("unexpected token {other:?}"))),
            None => Err(syntax("expected an expression")),
        }
    }

    fn list_literal(&mut self, depth: usize) -> PhrasebookResult<Operand> {
        let mut items = Vec::new();
        if self.eat(&Token::RBracket) {
            return Ok(Operand::Value(Value::List(items)));
        }
        loop {
            items.push(self.expression(depth + 1)?.into_value()?);
            if self.eat(&Token::Comma) {
                continue;
            }
            self.expect(&Token::RBracket, "']' closing the list literal")?;
            break;
        }
        Ok(Operand::Value(Value::List(items)))
    }

    fn member(&mut self, operand: Operand, depth: usize) -> PhrasebookResult<Operand> {
        let Some(Token::Ident(name)) = self.next() else {
            return Err(syntax("expected a name after '.'"));
        };
        match operand {
            Operand::SelfRef => {
                if self.eat(&Token::LParen) {
                    let arguments = self.arguments(depth)?;
                    self.call_helper(&name, &arguments).map(Operand::Value)
                } else if name == "language" {
                    Ok(Operand::Value(Value::Str(self.ctx.language.to_string())))
                } else {
                    Err(PhrasebookError::UndefinedVariable {
                        name: format!("self.{name}"),
                    })
                }
            }
            Operand::Value(_) => Err(syntax("attribute access is only supported on 'self'")),
        }
    }

    fn arguments(&mut self, depth: usize) -> PhrasebookResult<Vec<Value>> {
        let mut arguments = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(arguments);
        }
        loop {
            arguments.push(self.expression(depth + 1)?.into_value()?);
            if self.eat(&Token::Comma) {
                continue;
            }
            self.expect(&Token::RParen, "')' closing the call")?;
            break;
        }
        Ok(arguments)
    }

    fn index(&mut self, operand: Operand, depth: usize) -> PhrasebookResult<Operand> {
        let index = self.expression(depth + 1)?.into_value()?;
        self.expect(&Token::RBracket, "']' closing the index")?;
        let Operand::Value(Value::List(items)) = operand else {
            return Err(syntax("only lists can be indexed"));
        };
        let Value::Int(signed) = index else {
            return Err(syntax("list indexes must be integers"));
        };
        let position =
            usize::try_from(signed).map_err(|_| syntax("list indexes must be nonnegative"))?;
        items
            .get(position)
            .cloned()
            .map(Operand::Value)
            .ok_or_else(|| {
                syntax(format!(
                    "index {position} is out of bounds for a list of {}",
                    items.len()
                ))
            })
    }

    /// Dispatches `self.<name>(…)` into the allow-listed plural rules.
    ///
    /// `self.plural(n)` applies the rule for the bound language;
    /// `self.<tag>_plural(n)` (for example `ru_plural`) applies the rule
    /// registered for `<tag>`.
    fn call_helper(&self, name: &str, arguments: &[Value]) -> PhrasebookResult<Value> {
        let rule = self
            .plural_rule_named(name)
            .ok_or_else(|| PhrasebookError::UndefinedVariable {
                name: format!("self.{name}"),
            })?;
        let [Value::Int(signed)] = arguments else {
            return Err(syntax(format!("self.{name} expects one integer argument")));
        };
        let magnitude = u64::try_from(*signed)
            .map_err(|_| syntax(format!("self.{name} requires a nonnegative quantity")))?;
        let category = i64::try_from(rule(magnitude))
            .map_err(|_| syntax("plural category does not fit an index"))?;
        Ok(Value::Int(category))
    }

    fn plural_rule_named(&self, name: &str) -> Option<PluralRule> {
        if name == "plural" {
            return self.ctx.store.plural_rule(self.ctx.language);
        }
        let tag = name.strip_suffix("_plural")?;
        let language: LanguageIdentifier = tag.parse().ok()?;
        self.ctx.store.plural_rule(&language)
    }
}
