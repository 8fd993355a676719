use std::time::Duration;

use pretty_assertions::assert_eq;
use workbench_core::Sample;
use workbench_engine::{CodeforcesSource, FailureKind, FetchSettings, ProblemSource};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LIST_BODY: &str = r#"{"status":"OK","result":{"problems":[
    {"contestId":4,"index":"A","name":"Watermelon","type":"PROGRAMMING","rating":800,"tags":["brute force","math"]},
    {"contestId":1,"index":"B","name":"Spreadsheet","type":"PROGRAMMING","tags":[]}
],"problemStatistics":[]}}"#;

const PAGE: &str = r#"<!DOCTYPE html><html><body><div class="problemindexholder">
<div class="problem-statement">
  <div class="header"><div class="title">A. Watermelon</div></div>
  <div><p>Given $w$ ($1 \le w \le 100$).</p></div>
  <div class="sample-tests"><div class="sample-test">
    <div class="input"><div class="title">Input</div><pre>8
</pre></div>
    <div class="output"><div class="title">Output</div><pre>YES
</pre></div>
  </div></div>
</div></div></body></html>"#;

fn source_for(server: &MockServer) -> CodeforcesSource {
    source_with_fallback(server, Vec::new())
}

fn source_with_fallback(server: &MockServer, fallback_command: Vec<String>) -> CodeforcesSource {
    CodeforcesSource::new(FetchSettings {
        base_url: server.uri(),
        retry_backoff: Duration::from_millis(1),
        fallback_command,
        ..FetchSettings::default()
    })
    .expect("client")
}

/// Stand-in for curl: the curl flags land in "$0" and "$@" and are ignored.
#[cfg(unix)]
fn shell(script: &str) -> Vec<String> {
    vec!["sh".to_string(), "-c".to_string(), script.to_string()]
}

#[tokio::test]
async fn problem_list_is_parsed_into_summaries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/problemset.problems"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(LIST_BODY, "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let problems = source_for(&server).fetch_problem_list().await.expect("list");

    let ids: Vec<&str> = problems.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["CF-4-A", "CF-1-B"]);
    assert_eq!(problems[0].title, "Watermelon");
    assert_eq!(problems[0].tags, vec!["brute force", "math"]);
    assert_eq!(problems[1].rating, None);
    assert_eq!(
        problems[0].url.as_deref(),
        Some(format!("{}/problemset/problem/4/A", server.uri()).as_str())
    );
}

#[tokio::test]
async fn transient_failure_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/problemset.problems"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/problemset.problems"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(LIST_BODY, "application/json"))
        .mount(&server)
        .await;

    let problems = source_for(&server).fetch_problem_list().await.expect("list");
    assert_eq!(problems.len(), 2);
}

#[tokio::test]
async fn persistent_failure_gives_up_after_three_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/problemset/problem/4/A"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let err = source_for(&server)
        .fetch_statement(4, "A")
        .await
        .expect_err("should fail");
    assert_eq!(err.kind, FailureKind::HttpStatus(503));
    assert!(err.to_string().starts_with("http status 503"));
}

#[tokio::test]
async fn api_status_failure_counts_as_failed_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/problemset.problems"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"status":"FAILED","comment":"Call limit exceeded"}"#, "application/json"),
        )
        .expect(3)
        .mount(&server)
        .await;

    let err = source_for(&server)
        .fetch_problem_list()
        .await
        .expect_err("should fail");
    assert_eq!(err.kind, FailureKind::UnexpectedPayload);
    assert!(err.message.contains("Call limit exceeded"));
}

#[tokio::test]
async fn statement_page_yields_markup_and_samples() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/problemset/problem/4/A"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(PAGE, "text/html; charset=utf-8"))
        .mount(&server)
        .await;

    let statement = source_for(&server)
        .fetch_statement(4, "A")
        .await
        .expect("statement");

    assert_eq!(statement.contest_id, 4);
    assert_eq!(statement.index, "A");
    assert_eq!(
        statement.url,
        format!("{}/problemset/problem/4/A", server.uri())
    );
    assert!(statement.statement_html.contains("$1 \\le w \\le 100$"));
    assert_eq!(statement.samples, vec![Sample::new("8", "YES")]);
}

#[cfg(unix)]
#[tokio::test]
async fn fallback_command_answers_after_retries_are_exhausted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/problemset.problems"))
        .respond_with(ResponseTemplate::new(403))
        .expect(3)
        .mount(&server)
        .await;

    let script = format!("printf '%s' '{LIST_BODY}'");
    let problems = source_with_fallback(&server, shell(&script))
        .fetch_problem_list()
        .await
        .expect("list from fallback");
    assert_eq!(problems.len(), 2);
    assert_eq!(problems[0].id, "CF-4-A");
}

#[cfg(unix)]
#[tokio::test]
async fn failed_fallback_keeps_the_http_failure_kind() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/problemset/problem/4/A"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let err = source_with_fallback(&server, shell("echo 'could not resolve host' >&2; exit 6"))
        .fetch_statement(4, "A")
        .await
        .expect_err("should fail");
    assert_eq!(err.kind, FailureKind::HttpStatus(503));
    assert!(err.message.contains("after 3 attempts"), "{}", err.message);
    assert!(err.message.contains("could not resolve host"), "{}", err.message);
}
