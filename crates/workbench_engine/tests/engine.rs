use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use workbench_core::{
    LanguageKey, ProblemSummary, RequestScope, Sample, StatementData, StatementLang,
    TranslationInstallState, TranslationSupportStatus,
};
use workbench_engine::{
    CacheTtls, CodeExecutor, DraftStore, EngineEvent, EngineHandle, EngineServices, ExecError,
    FetchError, LocalCacheStore, ManualClock, ProblemSource, TranslationBackend, TranslationError,
    WorkbenchCaches,
};

const WAIT: Duration = Duration::from_secs(5);

#[derive(Default)]
struct CountingSource {
    list_calls: AtomicUsize,
    statement_calls: AtomicUsize,
}

fn statement(contest_id: u32, index: &str) -> StatementData {
    StatementData {
        contest_id,
        index: index.to_string(),
        url: format!("https://codeforces.com/problemset/problem/{contest_id}/{index}"),
        statement_html: "<p>fresh</p>".to_string(),
        samples: vec![Sample::new("1", "2")],
    }
}

#[async_trait::async_trait]
impl ProblemSource for CountingSource {
    async fn fetch_problem_list(&self) -> Result<Vec<ProblemSummary>, FetchError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![ProblemSummary::new("CF-4-A", "Watermelon", "Codeforces")])
    }

    async fn fetch_statement(&self, contest_id: u32, index: &str) -> Result<StatementData, FetchError> {
        self.statement_calls.fetch_add(1, Ordering::SeqCst);
        Ok(statement(contest_id, index))
    }
}

struct EchoExecutor;

#[async_trait::async_trait]
impl CodeExecutor for EchoExecutor {
    async fn execute(&self, _lang: LanguageKey, _code: &str, stdin: &str) -> Result<String, ExecError> {
        Ok(stdin.to_string())
    }
}

struct UpperTranslator;

#[async_trait::async_trait]
impl TranslationBackend for UpperTranslator {
    async fn support_status(&self, _: &str, _: &str) -> Result<TranslationSupportStatus, TranslationError> {
        Ok(TranslationSupportStatus {
            ready: true,
            message: "ready".to_string(),
        })
    }

    async fn install(&self, _: &str, _: &str) -> Result<TranslationInstallState, TranslationError> {
        Ok(TranslationInstallState::requested())
    }

    async fn install_state(&self) -> Result<TranslationInstallState, TranslationError> {
        Ok(TranslationInstallState::idle())
    }

    async fn translate_html(&self, html: &str, _: &str, to: &str) -> Result<String, TranslationError> {
        Ok(format!("[{to}]{html}"))
    }
}

fn engine() -> (EngineHandle, Arc<CountingSource>, WorkbenchCaches) {
    workbench_logging::initialize_for_tests();
    let store = LocalCacheStore::in_memory();
    let caches = WorkbenchCaches::new(
        store.clone(),
        Arc::new(ManualClock::at(1_700_000_000_000)),
        CacheTtls::default(),
    );
    let source = Arc::new(CountingSource::default());
    let handle = EngineHandle::with_services(EngineServices {
        source: source.clone(),
        executor: Arc::new(EchoExecutor),
        translator: Arc::new(UpperTranslator),
        caches: caches.clone(),
        drafts: DraftStore::new(store),
        install_poll_interval: Duration::from_millis(10),
    })
    .unwrap();
    (handle, source, caches)
}

fn scope(id: &str) -> RequestScope {
    RequestScope {
        problem_id: id.to_string(),
        epoch: 1,
    }
}

#[test]
fn problem_list_prefers_the_cache() {
    let (handle, source, _) = engine();

    handle.load_problem_list();
    match handle.recv_timeout(WAIT) {
        Some(EngineEvent::ProblemListLoaded { problems, from_cache }) => {
            assert!(!from_cache);
            handle.cache_problem_list(&problems);
        }
        other => panic!("unexpected event: {other:?}"),
    }

    handle.load_problem_list();
    match handle.recv_timeout(WAIT) {
        Some(EngineEvent::ProblemListLoaded { problems, from_cache }) => {
            assert!(from_cache);
            assert_eq!(problems.len(), 1);
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert_eq!(source.list_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn cached_statement_skips_the_source() {
    let (handle, source, _) = engine();
    handle.cache_statement("CF-4-A", &statement(4, "A"));

    handle.load_statement(scope("CF-4-A"), 4, "A");
    match handle.recv_timeout(WAIT) {
        Some(EngineEvent::StatementLoaded {
            scope: got,
            from_cache,
            ..
        }) => {
            assert_eq!(got, scope("CF-4-A"));
            assert!(from_cache);
        }
        other => panic!("unexpected event: {other:?}"),
    }

    handle.load_statement(scope("CF-1-B"), 1, "B");
    match handle.recv_timeout(WAIT) {
        Some(EngineEvent::StatementLoaded { from_cache, .. }) => assert!(!from_cache),
        other => panic!("unexpected event: {other:?}"),
    }
    assert_eq!(source.statement_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn translation_results_come_back_scoped() {
    let (handle, _, caches) = engine();

    handle.load_translation(scope("CF-4-A"), StatementLang::Chinese, "<p>x</p>".to_string());
    match handle.recv_timeout(WAIT) {
        Some(EngineEvent::TranslationLoaded {
            lang,
            html,
            from_cache,
            ..
        }) => {
            assert_eq!(lang, StatementLang::Chinese);
            assert_eq!(html, "[zh]<p>x</p>");
            assert!(!from_cache);
        }
        other => panic!("unexpected event: {other:?}"),
    }
    // Caching is the controller's job.
    assert_eq!(caches.translation("CF-4-A", StatementLang::Chinese), None);
}

#[test]
fn run_and_support_check_report_events() {
    let (handle, _, _) = engine();

    handle.execute(scope("CF-4-A"), LanguageKey::Python, "code".to_string(), "42\n".to_string());
    match handle.recv_timeout(WAIT) {
        Some(EngineEvent::RunFinished { output, .. }) => assert_eq!(output, Ok("42\n".to_string())),
        other => panic!("unexpected event: {other:?}"),
    }

    handle.check_translation_support(StatementLang::Chinese);
    match handle.recv_timeout(WAIT) {
        Some(EngineEvent::TranslationSupportChecked(Ok(status))) => assert!(status.ready),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[test]
fn polling_reports_idle_state_once() {
    let (handle, _, _) = engine();

    handle.start_install_polling();
    match handle.recv_timeout(WAIT) {
        Some(EngineEvent::InstallPolled(Ok(state))) => assert!(!state.active),
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(handle.recv_timeout(Duration::from_millis(100)).is_none());
}
