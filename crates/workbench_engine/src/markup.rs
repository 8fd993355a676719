use ego_tree::NodeRef;
use scraper::node::{Element, Node};
use scraper::Html;

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];
const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

/// Open elements around a text node, outermost first.
pub(crate) struct TextScope<'s, 'a> {
    ancestors: &'s [&'a Element],
}

impl TextScope<'_, '_> {
    pub(crate) fn within_tag(&self, names: &[&str]) -> bool {
        self.ancestors
            .iter()
            .any(|element| names.iter().any(|name| element.name().eq_ignore_ascii_case(name)))
    }

    pub(crate) fn within_class(&self, classes: &[&str]) -> bool {
        self.ancestors
            .iter()
            .any(|element| element.classes().any(|class| classes.contains(&class)))
    }

    pub(crate) fn parent_has_class(&self, classes: &[&str]) -> bool {
        self.ancestors
            .last()
            .is_some_and(|element| element.classes().any(|class| classes.contains(&class)))
    }
}

/// Re-serialize an HTML fragment, letting `rewrite` replace text nodes.
///
/// `rewrite` returns ready markup, or `None` to keep the text (escaped).
pub(crate) fn rewrite_text_nodes<F>(html: &str, mut rewrite: F) -> String
where
    F: FnMut(&str, &TextScope<'_, '_>) -> Option<String>,
{
    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len());
    let mut stack = Vec::new();
    for child in fragment.root_element().children() {
        write_node(child, &mut stack, &mut out, &mut rewrite);
    }
    out
}

fn write_node<'a, F>(
    node: NodeRef<'a, Node>,
    stack: &mut Vec<&'a Element>,
    out: &mut String,
    rewrite: &mut F,
) where
    F: FnMut(&str, &TextScope<'_, '_>) -> Option<String>,
{
    match node.value() {
        Node::Text(text) => {
            let raw = stack
                .last()
                .is_some_and(|parent| RAW_TEXT_TAGS.contains(&parent.name()));
            if raw {
                out.push_str(text);
                return;
            }
            let scope = TextScope {
                ancestors: stack.as_slice(),
            };
            match rewrite(&**text, &scope) {
                Some(markup) => out.push_str(&markup),
                None => escape_text_into(text, out),
            }
        }
        Node::Element(element) => {
            let name = element.name();
            out.push('<');
            out.push_str(name);
            for (attr, value) in element.attrs() {
                out.push(' ');
                out.push_str(attr);
                out.push_str("=\"");
                escape_attr_into(value, out);
                out.push('"');
            }
            out.push('>');
            if VOID_TAGS.contains(&name) {
                return;
            }
            stack.push(element);
            for child in node.children() {
                write_node(child, stack, out, rewrite);
            }
            stack.pop();
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        Node::Comment(comment) => {
            out.push_str("<!--");
            out.push_str(comment);
            out.push_str("-->");
        }
        _ => {
            for child in node.children() {
                write_node(child, stack, out, rewrite);
            }
        }
    }
}

pub(crate) fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_text_into(text, &mut out);
    out
}

pub(crate) fn escape_attr(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_attr_into(text, &mut out);
    out
}

fn escape_text_into(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attr_into(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_markup_round_trips() {
        let html = r#"<div class="a"><p>x &lt; y<br>z</p><!-- c --><img src="i.png"></div>"#;
        assert_eq!(rewrite_text_nodes(html, |_, _| None), html);
    }

    #[test]
    fn scope_reports_enclosing_tags_and_classes() {
        let html = r#"<div class="section-title"><b>Input</b></div><pre>Input</pre>"#;
        let mut seen = Vec::new();
        rewrite_text_nodes(html, |text, scope| {
            seen.push((
                text.to_string(),
                scope.within_class(&["section-title"]),
                scope.within_tag(&["pre"]),
            ));
            None
        });
        assert_eq!(
            seen,
            vec![
                ("Input".to_string(), true, false),
                ("Input".to_string(), false, true)
            ]
        );
    }
}
