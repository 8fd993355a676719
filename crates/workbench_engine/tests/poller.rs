use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio::runtime::Handle;
use workbench_core::{TranslationInstallState, TranslationSupportStatus};
use workbench_engine::{InstallPoller, PollResult, TranslationBackend, TranslationError};

/// Installer whose state advances one scripted step per read.
struct SteppingInstaller {
    states: Mutex<VecDeque<TranslationInstallState>>,
    reads: AtomicUsize,
}

impl SteppingInstaller {
    fn new(states: Vec<TranslationInstallState>) -> Self {
        Self {
            states: Mutex::new(states.into()),
            reads: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl TranslationBackend for SteppingInstaller {
    async fn support_status(&self, _: &str, _: &str) -> Result<TranslationSupportStatus, TranslationError> {
        Ok(TranslationSupportStatus::default())
    }

    async fn install(&self, _: &str, _: &str) -> Result<TranslationInstallState, TranslationError> {
        self.install_state().await
    }

    async fn install_state(&self) -> Result<TranslationInstallState, TranslationError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let mut states = self.states.lock().unwrap();
        let state = if states.len() > 1 {
            states.pop_front()
        } else {
            states.front().cloned()
        };
        state.ok_or_else(|| TranslationError::CommandFailed {
            subcommand: "status",
            message: "no state".to_string(),
        })
    }

    async fn translate_html(&self, html: &str, _: &str, _: &str) -> Result<String, TranslationError> {
        Ok(html.to_string())
    }
}

fn step(step: u8) -> TranslationInstallState {
    TranslationInstallState {
        active: true,
        step,
        total_steps: 3,
        phase: format!("Step {step}"),
        ..TranslationInstallState::idle()
    }
}

fn ready() -> TranslationInstallState {
    TranslationInstallState {
        active: false,
        finished: true,
        ready: true,
        step: 3,
        total_steps: 3,
        phase: "Ready".to_string(),
        ..TranslationInstallState::idle()
    }
}

fn collecting_sink() -> (Arc<Mutex<Vec<PollResult>>>, impl Fn(PollResult) + Send + 'static) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink_seen = Arc::clone(&seen);
    (seen, move |result| sink_seen.lock().unwrap().push(result))
}

#[tokio::test]
async fn polling_stops_after_first_inactive_state() {
    let installer = Arc::new(SteppingInstaller::new(vec![step(1), step(2), step(3), ready()]));
    let (seen, sink) = collecting_sink();

    let poller = InstallPoller::spawn(
        &Handle::current(),
        installer.clone(),
        Duration::from_millis(5),
        sink,
    );
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(poller.is_finished());
    assert_eq!(installer.reads.load(Ordering::SeqCst), 4);
    let seen = seen.lock().unwrap();
    let steps: Vec<u8> = seen.iter().map(|r| r.as_ref().unwrap().step).collect();
    assert_eq!(steps, vec![1, 2, 3, 3]);
    assert!(seen.last().unwrap().as_ref().unwrap().ready);
}

#[tokio::test]
async fn stopped_poller_delivers_nothing_more() {
    let installer = Arc::new(SteppingInstaller::new(vec![step(1)]));
    let (seen, sink) = collecting_sink();

    let poller = InstallPoller::spawn(
        &Handle::current(),
        installer.clone(),
        Duration::from_millis(20),
        sink,
    );
    poller.stop();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(poller.is_finished());
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn dropping_the_poller_cancels_it() {
    let installer = Arc::new(SteppingInstaller::new(vec![step(1)]));
    let (seen, sink) = collecting_sink();

    drop(InstallPoller::spawn(
        &Handle::current(),
        installer.clone(),
        Duration::from_millis(20),
        sink,
    ));
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(installer.reads.load(Ordering::SeqCst), 0);
}
