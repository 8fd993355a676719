use std::sync::Arc;

use scraper::Html;
use workbench_core::StatementSource;

use crate::labels::localize_section_labels;
use crate::markup::escape_text;
use crate::math::{rewrite_math, LazyTypesetter, Typesetter};
use crate::parse::collect_lines;

/// Turns the resolved statement source into display markup.
#[derive(Clone)]
pub struct StatementRenderer {
    typesetter: Arc<dyn Typesetter>,
}

impl Default for StatementRenderer {
    fn default() -> Self {
        Self::new(Arc::new(LazyTypesetter::markup()))
    }
}

impl StatementRenderer {
    pub fn new(typesetter: Arc<dyn Typesetter>) -> Self {
        Self { typesetter }
    }

    pub fn render(&self, source: &StatementSource) -> String {
        let markup = match source {
            StatementSource::Translated { lang, html } => localize_section_labels(html, *lang),
            StatementSource::Html(html) => html.clone(),
            StatementSource::Text(text) => text_to_html(text),
        };
        rewrite_math(&markup, self.typesetter.as_ref())
    }
}

/// One `<p>` per blank-line separated paragraph.
fn text_to_html(text: &str) -> String {
    text.split("\n\n")
        .map(str::trim)
        .filter(|paragraph| !paragraph.is_empty())
        .map(|paragraph| format!("<p>{}</p>", escape_text(paragraph)))
        .collect()
}

/// Readable text of rendered markup, for terminal output.
pub fn plain_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut text = String::new();
    collect_lines(*fragment.root_element(), &mut text);

    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.replace('\u{a0}', " ").lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}
