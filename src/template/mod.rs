//! Template rendering: placeholder scanning and substitution.
//!
//! A template is literal text interleaved with `{expression}` placeholders.
//! Literal text passes through untouched (including newlines and other
//! formatting decoded from the catalogue source); `{{` and `}}` escape to
//! literal braces, matching the f-string convention the catalogue files were
//! written for. Each expression is evaluated by the restricted evaluator in
//! [`expr`] and its display form is substituted in place.

mod expr;

use unic_langid::LanguageIdentifier;

use crate::catalog::CatalogStore;
use crate::error::{PhrasebookError, PhrasebookResult};
use crate::value::Bindings;

/// Everything an expression may read: the call's bindings, the bound
/// language, and the store (for plural-rule dispatch through `self`).
pub(crate) struct RenderContext<'a> {
    pub(crate) bindings: &'a Bindings,
    pub(crate) language: &'a LanguageIdentifier,
    pub(crate) store: &'a CatalogStore,
}

fn syntax(detail: impl Into<String>) -> PhrasebookError {
    PhrasebookError::TemplateSyntax {
        detail: detail.into(),
    }
}

/// Renders `template` against the context.
///
/// # Errors
///
/// Returns [`PhrasebookError::TemplateSyntax`] for unbalanced braces or a
/// malformed expression, and [`PhrasebookError::UndefinedVariable`] when an
/// expression references a name that is not bound.
pub(crate) fn render(template: &str, ctx: &RenderContext<'_>) -> PhrasebookResult<String> {
    let chars: Vec<char> = template.chars().collect();
    let mut out = String::with_capacity(template.len());
    let mut position = 0;
    while let Some(&current) = chars.get(position) {
        match current {
            '{' if chars.get(position + 1) == Some(&'{') => {
                out.push('{');
                position += 2;
            }
            '}' if chars.get(position + 1) == Some(&'}') => {
                out.push('}');
                position += 2;
            }
            '{' => {
                let (source, after) = placeholder_span(&chars, position + 1)?;
                let value = expr::evaluate(&source, ctx)?;
                out.push_str(&value.to_string());
                position = after;
            }
            '}' => return Err(syntax("'}' without a matching '{'")),
            other => {
                out.push(other);
                position += 1;
            }
        }
    }
    Ok(out)
}

/// Collects the expression text between a `{` and its closing `}`, starting
/// at `start` (the character after the opening brace). String literals are
/// honoured while scanning so a quoted `}` does not terminate the span.
/// Returns the expression source and the index just past the closing brace.
fn placeholder_span(chars: &[char], start: usize) -> PhrasebookResult<(String, usize)> {
    let mut source = String::new();
    let mut position = start;
    let mut quote: Option<char> = None;
    while let Some(&current) = chars.get(position) {
        match quote {
            Some(open) => {
                source.push(current);
                position += 1;
                if current == '\\' {
                    if let Some(&escaped) = chars.get(position) {
                        source.push(escaped);
                        position += 1;
                    }
                } else if current == open {
                    quote = None;
                }
            }
            None => match current {
                '}' => return Ok((source, position + 1)),
                '{' => return Err(syntax("nested '{' inside a placeholder")),
                '\'' | '"' => {
                    quote = Some(current);
                    source.push(current);
                    position += 1;
                }
                other => {
                    source.push(other);
                    position += 1;
                }
            },
        }
    }
    Err(syntax("unclosed '{' placeholder"))
}
