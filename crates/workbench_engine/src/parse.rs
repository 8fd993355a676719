use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use workbench_core::{ProblemSummary, Sample, StatementData};

use crate::types::{FailureKind, FetchError};

pub const SOURCE_NAME: &str = "Codeforces";

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    status: String,
    #[serde(default)]
    comment: Option<String>,
    #[serde(default)]
    result: Option<ApiProblemset>,
}

#[derive(Debug, Deserialize)]
struct ApiProblemset {
    problems: Vec<ApiProblem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiProblem {
    #[serde(default)]
    contest_id: Option<u32>,
    #[serde(default)]
    index: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    rating: Option<u32>,
    #[serde(default)]
    tags: Vec<String>,
}

pub fn problem_url(base_url: &str, contest_id: u32, index: &str) -> String {
    format!(
        "{}/problemset/problem/{contest_id}/{index}",
        base_url.trim_end_matches('/')
    )
}

/// Parse a `problemset.problems` API response into summaries.
pub fn parse_problem_list(body: &[u8], base_url: &str) -> Result<Vec<ProblemSummary>, FetchError> {
    let envelope: ApiEnvelope = serde_json::from_slice(body)
        .map_err(|err| FetchError::new(FailureKind::UnexpectedPayload, err.to_string()))?;
    if envelope.status != "OK" {
        let comment = envelope.comment.unwrap_or_default();
        return Err(FetchError::new(
            FailureKind::UnexpectedPayload,
            format!("api status {} {comment}", envelope.status).trim_end().to_string(),
        ));
    }
    let problemset = envelope.result.ok_or_else(|| {
        FetchError::new(FailureKind::UnexpectedPayload, "response has no result")
    })?;

    Ok(problemset
        .problems
        .into_iter()
        .map(|problem| summary_from_api(problem, base_url))
        .collect())
}

fn summary_from_api(problem: ApiProblem, base_url: &str) -> ProblemSummary {
    let id = match problem.contest_id {
        Some(contest_id) => format!("CF-{contest_id}-{}", problem.index),
        None => format!("CF-{}", problem.index),
    };
    let url = problem
        .contest_id
        .map(|contest_id| problem_url(base_url, contest_id, &problem.index));

    let mut summary = ProblemSummary::new(
        id,
        problem.name.unwrap_or_else(|| "Unknown Problem".to_string()),
        SOURCE_NAME,
    );
    summary.statement_md = url
        .as_ref()
        .map(|url| format!("Statement not loaded yet, open: {url}"));
    summary.url = url;
    summary.contest_id = problem.contest_id;
    summary.index = Some(problem.index);
    summary.rating = problem.rating;
    summary.tags = problem.tags;
    summary
}

fn selector(css: &str) -> Result<Selector, FetchError> {
    Selector::parse(css).map_err(|err| FetchError::new(FailureKind::UnexpectedPayload, err.to_string()))
}

/// Pull the statement block and the sample pairs out of a problem page.
pub fn parse_statement_page(
    html: &str,
    contest_id: u32,
    index: &str,
    url: &str,
) -> Result<StatementData, FetchError> {
    let doc = Html::parse_document(html);
    let statement_sel = selector(".problem-statement")?;
    let sample_sel = selector(".sample-test")?;
    let input_sel = selector(".input pre")?;
    let output_sel = selector(".output pre")?;

    let statement = doc
        .select(&statement_sel)
        .next()
        .ok_or_else(|| FetchError::new(FailureKind::StatementNotFound, url))?;

    let mut samples = Vec::new();
    if let Some(block) = doc.select(&sample_sel).next() {
        let inputs = block.select(&input_sel).map(sample_text);
        let outputs = block.select(&output_sel).map(sample_text);
        samples.extend(inputs.zip(outputs).map(|(input, output)| Sample::new(input, output)));
    }

    Ok(StatementData {
        contest_id,
        index: index.to_string(),
        url: url.to_string(),
        statement_html: statement.html(),
        samples,
    })
}

/// Text of a `<pre>` sample block. Line breaks come either from `<br>` or
/// from one `<div>` per line, depending on the page generation.
fn sample_text(pre: ElementRef<'_>) -> String {
    let mut text = String::new();
    collect_lines(*pre, &mut text);
    text.replace('\u{a0}', " ").trim_end_matches('\n').to_string()
}

pub(crate) fn collect_lines(node: NodeRef<'_, Node>, out: &mut String) {
    match node.value() {
        Node::Text(text) => out.push_str(text),
        Node::Element(element) if element.name() == "br" => {
            if !out.ends_with('\n') {
                out.push('\n');
            }
            return;
        }
        _ => {}
    }

    for child in node.children() {
        collect_lines(child, out);
        let line_break = child
            .value()
            .as_element()
            .is_some_and(|element| matches!(element.name(), "div" | "p" | "li"));
        if line_break && !out.ends_with('\n') {
            out.push('\n');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn list_entries_get_stable_ids_and_urls() {
        let body = br#"{"status":"OK","result":{"problems":[
            {"contestId":4,"index":"A","name":"Watermelon","rating":800,"tags":["math"]},
            {"index":"Z","name":"Orphan"}
        ],"problemStatistics":[]}}"#;
        let list = parse_problem_list(body, "https://codeforces.com/").unwrap();

        assert_eq!(list[0].id, "CF-4-A");
        assert_eq!(
            list[0].url.as_deref(),
            Some("https://codeforces.com/problemset/problem/4/A")
        );
        assert_eq!(list[0].rating, Some(800));
        assert_eq!(list[0].fetch_identity(), Some((4, "A")));
        assert_eq!(list[1].id, "CF-Z");
        assert_eq!(list[1].fetch_identity(), None);
        assert_eq!(list[1].url, None);
    }

    #[test]
    fn failed_api_status_is_an_error() {
        let err = parse_problem_list(br#"{"status":"FAILED","comment":"limit"}"#, "x").unwrap_err();
        assert_eq!(err.kind, FailureKind::UnexpectedPayload);
        assert!(err.message.contains("limit"));
    }

    #[test]
    fn samples_split_on_divs_and_breaks() {
        let page = r#"<html><body>
            <div class="problem-statement"><p>Let $n$ be given.</p></div>
            <div class="sample-test">
              <div class="input"><pre><div class="test-example-line">1 2</div><div class="test-example-line">3&nbsp;4</div></pre></div>
              <div class="output"><pre>YES<br>NO<br></pre></div>
            </div></body></html>"#;
        let data = parse_statement_page(page, 4, "A", "u").unwrap();

        assert!(data.statement_html.starts_with("<div class=\"problem-statement\">"));
        assert_eq!(data.samples, vec![Sample::new("1 2\n3 4", "YES\nNO")]);
    }

    #[test]
    fn page_without_statement_is_rejected() {
        let err = parse_statement_page("<html></html>", 4, "A", "u").unwrap_err();
        assert_eq!(err.kind, FailureKind::StatementNotFound);
    }
}
