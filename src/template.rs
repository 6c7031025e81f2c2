//! # Configuration templates.
//!
//! Config-phase callbacks usually read a configuration file whose secrets
//! come from the environment. This module expands `{{ env "NAME" }}` actions
//! in such a file:
//! ```text
//! dsn = "{{ env "PG_USER" }}:{{ env "PG_PASSWORD" }}"   ──►   dsn = "foo:bar"
//! ```
//!
//! Supported syntax:
//! - `{{ env "NAME" }}` or ``{{ env `NAME` }}``; an unset variable renders empty
//! - trim markers `{{- ` and ` -}}` remove the whitespace next to the action
//! - comments `{{/* ... */}}` render nothing
//!
//! Anything else inside `{{ }}` is an error.

use std::path::Path;

use thiserror::Error;

/// # Errors produced while rendering a template.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TemplateError {
    /// An action was opened with `{{` and never closed.
    #[error("unclosed action starting at byte {offset}")]
    Unclosed {
        /// Byte offset of the opening `{{`.
        offset: usize,
    },

    /// `{{ }}` with nothing inside.
    #[error("empty action at byte {offset}")]
    Empty {
        /// Byte offset of the opening `{{`.
        offset: usize,
    },

    /// The action calls something other than `env`.
    #[error("function {name:?} not defined (action at byte {offset})")]
    UnknownFunction {
        /// Name found in the action.
        name: String,
        /// Byte offset of the opening `{{`.
        offset: usize,
    },

    /// The `env` argument is missing or malformed.
    #[error("bad argument to env at byte {offset}: {reason}")]
    BadArgument {
        /// Byte offset of the opening `{{`.
        offset: usize,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// The template file could not be read.
    #[error("cannot read template: {0}")]
    Io(#[from] std::io::Error),
}

impl TemplateError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TemplateError::Unclosed { .. } => "template_unclosed",
            TemplateError::Empty { .. } => "template_empty_action",
            TemplateError::UnknownFunction { .. } => "template_unknown_function",
            TemplateError::BadArgument { .. } => "template_bad_argument",
            TemplateError::Io(_) => "template_io",
        }
    }
}

const SPACE: [char; 4] = [' ', '\t', '\r', '\n'];

/// Renders `input`, resolving `env` actions through `lookup`.
///
/// # Example
/// ```
/// use bootvisor::template::render;
///
/// let out = render(r#"user={{ env "USER" }}"#, |name| (name == "USER").then(|| "thomas".to_string()))
///     .unwrap();
/// assert_eq!(out, "user=thomas");
/// ```
pub fn render<F>(input: &str, lookup: F) -> Result<String, TemplateError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("{{") {
        let offset = input.len() - rest.len() + start;
        let (text, after) = rest.split_at(start);
        let mut body = &after[2..];

        let trim_left = body.starts_with('-') && body[1..].starts_with(SPACE);
        if trim_left {
            out.push_str(text.trim_end_matches(SPACE));
            body = &body[1..];
        } else {
            out.push_str(text);
        }

        let end = body.find("}}").ok_or(TemplateError::Unclosed { offset })?;
        let mut action = &body[..end];
        let trim_right = action.ends_with('-') && action[..action.len() - 1].ends_with(SPACE);
        if trim_right {
            action = &action[..action.len() - 1];
        }

        if let Some(value) = eval(action, offset, &lookup)? {
            out.push_str(&value);
        }

        rest = &body[end + 2..];
        if trim_right {
            rest = rest.trim_start_matches(SPACE);
        }
    }

    out.push_str(rest);
    Ok(out)
}

/// Renders `input` against the process environment.
pub fn render_env(input: &str) -> Result<String, TemplateError> {
    render(input, |name| std::env::var(name).ok())
}

/// Reads the file at `path` and renders it against the process environment.
pub fn render_file(path: impl AsRef<Path>) -> Result<String, TemplateError> {
    let data = std::fs::read_to_string(path)?;
    render_env(&data)
}

/// Evaluates one action body; `None` for comments.
fn eval<F>(action: &str, offset: usize, lookup: &F) -> Result<Option<String>, TemplateError>
where
    F: Fn(&str) -> Option<String>,
{
    let action = action.trim_matches(SPACE);
    if action.starts_with("/*") && action.ends_with("*/") && action.len() >= 4 {
        return Ok(None);
    }
    if action.is_empty() {
        return Err(TemplateError::Empty { offset });
    }

    let name_len = action
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(action.len());
    let (name, arg) = action.split_at(name_len);
    if name != "env" {
        let name = if name.is_empty() { action } else { name };
        return Err(TemplateError::UnknownFunction {
            name: name.to_string(),
            offset,
        });
    }

    let arg = arg.trim_start_matches(SPACE);
    if arg.is_empty() {
        return Err(TemplateError::BadArgument {
            offset,
            reason: "missing variable name",
        });
    }
    let var = parse_string(arg).map_err(|reason| TemplateError::BadArgument { offset, reason })?;
    Ok(Some(lookup(&var).unwrap_or_default()))
}

/// Parses a complete quoted (`"..."`) or raw (`` `...` ``) string literal.
fn parse_string(src: &str) -> Result<String, &'static str> {
    let mut chars = src.chars();
    let quote = chars.next().ok_or("missing variable name")?;
    let mut value = String::new();

    match quote {
        '`' => {
            let body = chars.as_str();
            let end = body.find('`').ok_or("unterminated raw string")?;
            value.push_str(&body[..end]);
            if !body[end + 1..].is_empty() {
                return Err("unexpected input after argument");
            }
        }
        '"' => {
            loop {
                match chars.next() {
                    None => return Err("unterminated string"),
                    Some('"') => break,
                    Some('\\') => match chars.next() {
                        Some('n') => value.push('\n'),
                        Some('t') => value.push('\t'),
                        Some('\\') => value.push('\\'),
                        Some('"') => value.push('"'),
                        _ => return Err("unsupported escape sequence"),
                    },
                    Some(c) => value.push(c),
                }
            }
            if !chars.as_str().is_empty() {
                return Err("unexpected input after argument");
            }
        }
        _ => return Err("argument must be a quoted string"),
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(name: &str) -> Option<String> {
        match name {
            "PG_USER" => Some("foo".into()),
            "PG_PASSWORD" => Some("bar".into()),
            _ => None,
        }
    }

    #[test]
    fn raw_and_escaped_strings() {
        assert_eq!(render("{{ env `PG_USER` }}", vars).unwrap(), "foo");
        assert_eq!(parse_string(r#""a\"b""#).unwrap(), "a\"b");
        assert_eq!(parse_string(r#""a" b"#), Err("unexpected input after argument"));
        assert_eq!(parse_string("PG_USER"), Err("argument must be a quoted string"));
    }

    #[test]
    fn trim_markers_eat_adjacent_whitespace() {
        let out = render("a  \n{{- env \"PG_USER\" -}}\n  b", vars).unwrap();
        assert_eq!(out, "afoob");
    }

    #[test]
    fn dash_without_space_is_not_a_trim_marker() {
        let err = render("x {{-3}}", vars).unwrap_err();
        assert!(matches!(err, TemplateError::UnknownFunction { offset: 2, .. }), "{err:?}");
    }

    #[test]
    fn comments_render_nothing() {
        assert_eq!(render("a{{/* note */}}b", vars).unwrap(), "ab");
    }

    #[test]
    fn empty_action_is_rejected() {
        assert!(matches!(render("{{  }}", vars), Err(TemplateError::Empty { offset: 0 })));
    }
}
