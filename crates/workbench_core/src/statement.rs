use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProblemSummary;

/// Language a statement is displayed in. English is what the problem source serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StatementLang {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "zh")]
    Chinese,
}

impl StatementLang {
    pub const PRIMARY: StatementLang = StatementLang::English;

    pub fn code(self) -> &'static str {
        match self {
            StatementLang::English => "en",
            StatementLang::Chinese => "zh",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" => Some(StatementLang::English),
            "zh" | "zh-cn" => Some(StatementLang::Chinese),
            _ => None,
        }
    }

    pub fn is_primary(self) -> bool {
        self == Self::PRIMARY
    }
}

impl fmt::Display for StatementLang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Markup chosen for display, before any typesetting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementSource {
    Translated { lang: StatementLang, html: String },
    Html(String),
    /// Nothing fetched yet; plain text or markdown.
    Text(String),
}

impl StatementSource {
    pub fn markup(&self) -> &str {
        match self {
            StatementSource::Translated { html, .. } | StatementSource::Html(html) => html,
            StatementSource::Text(text) => text,
        }
    }

    pub fn is_html(&self) -> bool {
        !matches!(self, StatementSource::Text(_))
    }
}

/// Attached translation for `lang`, then the base statement, then a text fallback.
pub fn resolve_statement_source(problem: &ProblemSummary, lang: StatementLang) -> StatementSource {
    if !lang.is_primary() {
        if let Some(html) = problem.translation(lang.code()) {
            return StatementSource::Translated {
                lang,
                html: html.to_string(),
            };
        }
    }
    if let Some(html) = &problem.statement_html {
        return StatementSource::Html(html.clone());
    }
    let text = match (&problem.statement_md, &problem.url) {
        (Some(md), _) => md.clone(),
        (None, Some(url)) => format!("{}\n\n{}", problem.title, url),
        (None, None) => problem.title.clone(),
    };
    StatementSource::Text(text)
}

/// Cheap pre-filter run before the typesetting engine is loaded.
pub fn contains_math(markup: &str) -> bool {
    markup.contains('$')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn problem() -> ProblemSummary {
        let mut p = ProblemSummary::new("CF-4-A", "Watermelon", "Codeforces");
        p.url = Some("https://codeforces.com/problemset/problem/4/A".to_string());
        p
    }

    #[test]
    fn falls_back_to_text_without_statement() {
        let source = resolve_statement_source(&problem(), StatementLang::Chinese);
        assert_eq!(
            source,
            StatementSource::Text(
                "Watermelon\n\nhttps://codeforces.com/problemset/problem/4/A".to_string()
            )
        );
        assert!(!source.is_html());
    }

    #[test]
    fn prefers_translation_for_secondary_language_only() {
        let mut p = problem();
        p.statement_html = Some("<p>en</p>".to_string());
        p.attach_translation("zh", "<p>zh</p>".to_string());

        assert_eq!(
            resolve_statement_source(&p, StatementLang::English),
            StatementSource::Html("<p>en</p>".to_string())
        );
        assert_eq!(
            resolve_statement_source(&p, StatementLang::Chinese).markup(),
            "<p>zh</p>"
        );
    }

    #[test]
    fn math_prefilter_looks_for_dollar() {
        assert!(contains_math("let $n$ be"));
        assert!(!contains_math("no formulas here"));
    }
}
