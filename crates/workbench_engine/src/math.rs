//! Inline and display math in statement markup.
//!
//! Formulas are written between equal-length runs of one to three `$`. The
//! typesetter is only loaded once some markup actually contains a `$`.

use std::sync::OnceLock;

use workbench_core::contains_math;
use workbench_logging::{workbench_debug, workbench_info};

use crate::markup::{escape_attr, escape_text, rewrite_text_nodes};

/// Text under these elements is never scanned for math.
const SKIP_TAGS: &[&str] = &["code", "pre", "script", "style", "kbd", "textarea", "math"];
/// Output of an earlier pass.
const SKIP_CLASSES: &[&str] = &["math", "math-fallback"];
/// A formula standing alone in its text node is shown as a block once it is
/// longer than this many characters.
const BLOCK_MIN_CHARS: usize = 48;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypesetError {
    #[error("malformed formula: {0}")]
    Malformed(String),
    #[error("typesetter unavailable: {0}")]
    Unavailable(String),
}

pub trait Typesetter: Send + Sync {
    fn typeset(&self, formula: &str, display: bool) -> Result<String, TypesetError>;
}

type Loader = Box<dyn Fn() -> Result<Box<dyn Typesetter>, TypesetError> + Send + Sync>;

/// Loads the real typesetter on first use and keeps it, or the load error,
/// for every later formula.
pub struct LazyTypesetter {
    loader: Loader,
    loaded: OnceLock<Result<Box<dyn Typesetter>, TypesetError>>,
}

impl LazyTypesetter {
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> Result<Box<dyn Typesetter>, TypesetError> + Send + Sync + 'static,
    {
        Self {
            loader: Box::new(loader),
            loaded: OnceLock::new(),
        }
    }

    pub fn markup() -> Self {
        Self::new(|| Ok(Box::new(MarkupTypesetter) as Box<dyn Typesetter>))
    }
}

impl Typesetter for LazyTypesetter {
    fn typeset(&self, formula: &str, display: bool) -> Result<String, TypesetError> {
        let loaded = self.loaded.get_or_init(|| {
            workbench_info!("Loading math typesetter");
            (self.loader)()
        });
        match loaded {
            Ok(engine) => engine.typeset(formula, display),
            Err(err) => Err(err.clone()),
        }
    }
}

/// Rewrites common TeX into Unicode and HTML sub/superscripts.
///
/// Unknown commands are kept as written. Unbalanced braces are rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupTypesetter;

const SYMBOLS: &[(&str, &str)] = &[
    ("le", "≤"),
    ("leq", "≤"),
    ("ge", "≥"),
    ("geq", "≥"),
    ("ne", "≠"),
    ("neq", "≠"),
    ("lt", "<"),
    ("gt", ">"),
    ("cdot", "⋅"),
    ("times", "×"),
    ("div", "÷"),
    ("pm", "±"),
    ("dots", "…"),
    ("ldots", "…"),
    ("cdots", "⋯"),
    ("infty", "∞"),
    ("in", "∈"),
    ("notin", "∉"),
    ("sum", "∑"),
    ("prod", "∏"),
    ("to", "→"),
    ("rightarrow", "→"),
    ("leftarrow", "←"),
    ("oplus", "⊕"),
    ("mid", "∣"),
    ("lfloor", "⌊"),
    ("rfloor", "⌋"),
    ("lceil", "⌈"),
    ("rceil", "⌉"),
    ("sqrt", "√"),
    ("forall", "∀"),
    ("exists", "∃"),
    ("cup", "∪"),
    ("cap", "∩"),
    ("subseteq", "⊆"),
    ("alpha", "α"),
    ("beta", "β"),
    ("gamma", "γ"),
    ("delta", "δ"),
    ("epsilon", "ε"),
    ("lambda", "λ"),
    ("pi", "π"),
    ("sigma", "σ"),
    ("log", "log"),
    ("min", "min"),
    ("max", "max"),
    ("gcd", "gcd"),
    ("bmod", "mod"),
    ("operatorname", ""),
    ("mathrm", ""),
    ("text", ""),
    ("left", ""),
    ("right", ""),
    (",", " "),
    (";", " "),
    ("quad", "  "),
    ("{", "{"),
    ("}", "}"),
    ("%", "%"),
    ("$", "$"),
];

impl Typesetter for MarkupTypesetter {
    fn typeset(&self, formula: &str, display: bool) -> Result<String, TypesetError> {
        check_braces(formula)?;
        let body = tex_to_html(formula);
        let (tag, class) = if display {
            ("div", "math math-display")
        } else {
            ("span", "math math-inline")
        };
        Ok(format!(
            "<{tag} class=\"{class}\" data-tex=\"{}\">{body}</{tag}>",
            escape_attr(formula)
        ))
    }
}

fn check_braces(formula: &str) -> Result<(), TypesetError> {
    let mut depth = 0usize;
    let mut chars = formula.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                chars.next();
            }
            '{' => depth += 1,
            '}' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| TypesetError::Malformed("unexpected '}'".to_string()))?;
            }
            _ => {}
        }
    }
    if depth == 0 {
        Ok(())
    } else {
        Err(TypesetError::Malformed("missing '}'".to_string()))
    }
}

fn tex_to_html(formula: &str) -> String {
    let mut out = String::new();
    let mut rest = formula.trim();
    while let Some(ch) = rest.chars().next() {
        match ch {
            '\\' => {
                let (command, tail) = split_command(&rest[1..]);
                match SYMBOLS.iter().find(|(name, _)| *name == command) {
                    Some((_, symbol)) => out.push_str(&escape_text(symbol)),
                    None => {
                        out.push('\\');
                        out.push_str(&escape_text(command));
                    }
                }
                rest = tail;
            }
            '^' | '_' => {
                let (group, tail) = split_group(&rest[1..]);
                let tag = if ch == '^' { "sup" } else { "sub" };
                out.push_str(&format!("<{tag}>{}</{tag}>", tex_to_html(group)));
                rest = tail;
            }
            '{' | '}' => rest = &rest[1..],
            _ => {
                out.push_str(&escape_text(&rest[..ch.len_utf8()]));
                rest = &rest[ch.len_utf8()..];
            }
        }
    }
    out
}

/// `\name` (letters) or a single symbol after the backslash.
fn split_command(after_slash: &str) -> (&str, &str) {
    let letters = after_slash
        .char_indices()
        .find(|(_, c)| !c.is_ascii_alphabetic())
        .map_or(after_slash.len(), |(i, _)| i);
    if letters > 0 {
        return after_slash.split_at(letters);
    }
    match after_slash.chars().next() {
        Some(c) => after_slash.split_at(c.len_utf8()),
        None => ("", ""),
    }
}

/// Argument of `^`/`_`: a braced group, a command, or one character.
fn split_group(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    let Some(first) = input.chars().next() else {
        return ("", "");
    };
    match first {
        '{' => {
            let mut depth = 0usize;
            for (i, c) in input.char_indices() {
                match c {
                    '{' => depth += 1,
                    '}' => {
                        depth = depth.saturating_sub(1);
                        if depth == 0 {
                            return (&input[1..i], &input[i + 1..]);
                        }
                    }
                    _ => {}
                }
            }
            (&input[1..], "")
        }
        '\\' => {
            let (command, tail) = split_command(&input[1..]);
            (&input[..1 + command.len()], tail)
        }
        c => input.split_at(c.len_utf8()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment<'a> {
    Text(&'a str),
    Math {
        raw: &'a str,
        formula: &'a str,
        display: bool,
    },
}

fn dollar_run(bytes: &[u8], at: usize) -> usize {
    bytes[at..].iter().take_while(|b| **b == b'$').count()
}

/// Start of the first run of exactly `len` dollars at or after `from`.
fn find_closing(bytes: &[u8], from: usize, len: usize) -> Option<usize> {
    let mut at = from;
    while at < bytes.len() {
        if bytes[at] == b'$' {
            let run = dollar_run(bytes, at);
            if run == len {
                return Some(at);
            }
            at += run;
        } else {
            at += 1;
        }
    }
    None
}

fn split_math(text: &str) -> Vec<Segment<'_>> {
    let bytes = text.as_bytes();
    let mut segments = Vec::new();
    let mut plain_start = 0;
    let mut at = 0;

    while at < bytes.len() {
        if bytes[at] != b'$' {
            at += 1;
            continue;
        }
        let run = dollar_run(bytes, at);
        let body_start = at + run;
        if run > 3 {
            at = body_start;
            continue;
        }
        match find_closing(bytes, body_start, run) {
            Some(close) if !text[body_start..close].trim().is_empty() => {
                if plain_start < at {
                    segments.push(Segment::Text(&text[plain_start..at]));
                }
                let end = close + run;
                let formula = &text[body_start..close];
                let alone = text[..at].trim().is_empty() && text[end..].trim().is_empty();
                let display = formula.contains('\n')
                    || (alone && formula.chars().count() > BLOCK_MIN_CHARS);
                segments.push(Segment::Math {
                    raw: &text[at..end],
                    formula,
                    display,
                });
                at = end;
                plain_start = end;
            }
            _ => at = body_start,
        }
    }
    if plain_start < text.len() {
        segments.push(Segment::Text(&text[plain_start..]));
    }
    segments
}

fn typeset_text(text: &str, typesetter: &dyn Typesetter) -> String {
    let mut out = String::with_capacity(text.len());
    for segment in split_math(text) {
        match segment {
            Segment::Text(plain) => out.push_str(&escape_text(plain)),
            Segment::Math {
                raw,
                formula,
                display,
            } => match typesetter.typeset(formula.trim(), display) {
                Ok(markup) => out.push_str(&markup),
                Err(err) => {
                    workbench_debug!("Formula left as text: {}", err);
                    out.push_str(&format!(
                        "<code class=\"math-fallback\" title=\"{}\">{}</code>",
                        escape_attr(&err.to_string()),
                        escape_text(raw)
                    ));
                }
            },
        }
    }
    out
}

/// Typeset every formula in `html` outside code-like elements.
///
/// Markup without any `$` is returned untouched and never reaches the
/// typesetter. A formula the typesetter rejects is shown as raw text.
pub fn rewrite_math(html: &str, typesetter: &dyn Typesetter) -> String {
    if !contains_math(html) {
        return html.to_string();
    }
    rewrite_text_nodes(html, |text, scope| {
        if !text.contains('$') || scope.within_tag(SKIP_TAGS) || scope.within_class(SKIP_CLASSES) {
            return None;
        }
        Some(typeset_text(text, typesetter))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn formulas(text: &str) -> Vec<(&str, bool)> {
        split_math(text)
            .into_iter()
            .filter_map(|segment| match segment {
                Segment::Math {
                    formula, display, ..
                } => Some((formula, display)),
                Segment::Text(_) => None,
            })
            .collect()
    }

    #[test]
    fn delimiters_must_have_equal_length() {
        assert_eq!(formulas("let $a$ and $$$b$$$"), vec![("a", false), ("b", false)]);
        assert_eq!(formulas("cost $$x$ here"), Vec::<(&str, bool)>::new());
        assert_eq!(formulas("$$$$x$$$$"), Vec::<(&str, bool)>::new());
    }

    #[test]
    fn matching_is_non_greedy() {
        assert_eq!(formulas("$a$ + $b$"), vec![("a", false), ("b", false)]);
    }

    #[test]
    fn block_needs_newline_or_long_standalone_formula() {
        assert_eq!(formulas("$$a\n+b$$"), vec![("a\n+b", true)]);

        let long = "x".repeat(BLOCK_MIN_CHARS + 1);
        let standalone = format!("  $${long}$$ ");
        assert_eq!(formulas(&standalone), vec![(long.as_str(), true)]);

        let inline = format!("see $${long}$$");
        assert_eq!(formulas(&inline), vec![(long.as_str(), false)]);

        let short = "x".repeat(BLOCK_MIN_CHARS);
        assert_eq!(formulas(&format!("$${short}$$")), vec![(short.as_str(), false)]);
    }

    #[test]
    fn tex_commands_and_scripts_become_html() {
        assert_eq!(tex_to_html(r"1 \le a_i \le 10^{9}"), "1 ≤ a<sub>i</sub> ≤ 10<sup>9</sup>");
        assert_eq!(tex_to_html(r"\unknown"), r"\unknown");
        assert_eq!(tex_to_html("a<b"), "a&lt;b");
    }

    #[test]
    fn unbalanced_braces_are_rejected() {
        assert!(MarkupTypesetter.typeset("x^{2", false).is_err());
        assert!(MarkupTypesetter.typeset("x}", false).is_err());
        assert!(MarkupTypesetter.typeset(r"\{x", false).is_ok());
    }
}
