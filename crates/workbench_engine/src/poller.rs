use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use workbench_core::TranslationInstallState;
use workbench_logging::workbench_debug;

use crate::translate::TranslationBackend;

pub type PollResult = Result<TranslationInstallState, String>;

/// Periodically reads the install state and hands each result to `sink`.
///
/// The task ends on its own after delivering a state that is no longer
/// active or a failed read. Stopping (explicitly or by drop) guarantees no
/// further delivery.
pub struct InstallPoller {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl InstallPoller {
    pub fn spawn<F>(
        runtime: &Handle,
        backend: Arc<dyn TranslationBackend>,
        interval: Duration,
        sink: F,
    ) -> Self
    where
        F: Fn(PollResult) + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let task = runtime.spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
                let result = backend
                    .install_state()
                    .await
                    .map_err(|err| err.to_string());
                if token.is_cancelled() {
                    break;
                }
                let keep_going = matches!(&result, Ok(state) if state.active);
                sink(result);
                if !keep_going {
                    workbench_debug!("Install polling finished");
                    break;
                }
            }
        });
        Self { cancel, task }
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for InstallPoller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
