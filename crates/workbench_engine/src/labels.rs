use workbench_core::StatementLang;

use crate::markup::{escape_text, rewrite_text_nodes};

/// Elements holding section headings in problem markup.
const LABEL_CLASSES: &[&str] = &["section-title", "title"];

struct Label {
    en: &'static str,
    zh: &'static str,
    /// Spellings seen in source or machine-translated markup, lowercase.
    aliases: &'static [&'static str],
}

const LABELS: &[Label] = &[
    Label {
        en: "Input",
        zh: "输入",
        aliases: &["input", "输入", "输入格式", "投入"],
    },
    Label {
        en: "Output",
        zh: "输出",
        aliases: &["output", "输出", "输出格式", "产出"],
    },
    Label {
        en: "Examples",
        zh: "样例",
        aliases: &["example", "examples", "sample", "samples", "样例", "示例", "例子", "例"],
    },
    Label {
        en: "Note",
        zh: "说明",
        aliases: &["note", "notes", "说明", "注意", "注释", "提示", "备注"],
    },
];

fn canonical(text: &str, lang: StatementLang) -> Option<&'static str> {
    let key = text.trim().trim_end_matches([':', '：']).to_lowercase();
    LABELS
        .iter()
        .find(|label| label.aliases.contains(&key.as_str()))
        .map(|label| match lang {
            StatementLang::English => label.en,
            StatementLang::Chinese => label.zh,
        })
}

/// Rewrite section headings to the canonical labels of `lang`, keeping
/// surrounding whitespace. Body text is never touched.
pub fn localize_section_labels(html: &str, lang: StatementLang) -> String {
    rewrite_text_nodes(html, |text, scope| {
        if !scope.parent_has_class(LABEL_CLASSES) {
            return None;
        }
        let label = canonical(text, lang)?;
        let leading = &text[..text.len() - text.trim_start().len()];
        let trailing = &text[text.trim_end().len()..];
        Some(format!(
            "{}{}{}",
            escape_text(leading),
            escape_text(label),
            escape_text(trailing)
        ))
    })
}
