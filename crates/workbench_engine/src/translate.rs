use std::io;
use std::process::{Output, Stdio};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::Command;
use workbench_core::{TranslationInstallState, TranslationSupportStatus};
use workbench_logging::{workbench_debug, workbench_info, workbench_warn};

const INSTALL_STEPS: u8 = 3;
const NOT_INSTALLED: &str = "Translation support is not installed yet.";

#[derive(Debug, thiserror::Error)]
pub enum TranslationError {
    #[error("translator command not available: {0}")]
    Unavailable(#[source] io::Error),
    #[error("translator {subcommand} failed: {message}")]
    CommandFailed {
        subcommand: &'static str,
        message: String,
    },
    #[error("translator returned invalid status json: {0}")]
    InvalidStatus(#[from] serde_json::Error),
    #[error("translator {subcommand} timed out after {secs}s")]
    TimedOut { subcommand: &'static str, secs: u64 },
    #[error("translator returned non-utf8 html")]
    NonUtf8,
    #[error("translator io error: {0}")]
    Io(#[from] io::Error),
}

/// Local statement translation plus its optional install step.
#[async_trait::async_trait]
pub trait TranslationBackend: Send + Sync {
    async fn support_status(&self, from: &str, to: &str) -> Result<TranslationSupportStatus, TranslationError>;

    /// Start installing if no install is running, then report the current
    /// state. Never blocks on the install itself.
    async fn install(&self, from: &str, to: &str) -> Result<TranslationInstallState, TranslationError>;

    async fn install_state(&self) -> Result<TranslationInstallState, TranslationError>;

    async fn translate_html(&self, html: &str, from: &str, to: &str) -> Result<String, TranslationError>;
}

#[derive(Debug, Clone)]
pub struct TranslatorSettings {
    /// Program plus leading arguments; the subcommand is appended.
    pub command: Vec<String>,
    /// Limit for one `status` or `translate` call. Installs are not limited.
    pub timeout: Duration,
}

impl Default for TranslatorSettings {
    fn default() -> Self {
        Self {
            command: vec!["python3".to_string(), "translation_support.py".to_string()],
            timeout: Duration::from_secs(120),
        }
    }
}

/// Drives an external translator speaking the `status` / `install` /
/// `translate` subcommand protocol with `--from-lang` and `--to-lang`.
#[derive(Debug, Clone)]
pub struct CommandTranslationBackend {
    settings: Arc<TranslatorSettings>,
    state: Arc<Mutex<TranslationInstallState>>,
}

impl CommandTranslationBackend {
    pub fn new(settings: TranslatorSettings) -> Self {
        Self {
            settings: Arc::new(settings),
            state: Arc::new(Mutex::new(TranslationInstallState::idle())),
        }
    }

    fn state(&self) -> MutexGuard<'_, TranslationInstallState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut TranslationInstallState) -> R) -> R {
        f(&mut self.state())
    }

    fn command(&self, subcommand: &str, from: &str, to: &str) -> Result<Command, TranslationError> {
        let (program, leading) = self.settings.command.split_first().ok_or_else(|| {
            TranslationError::Unavailable(io::Error::new(
                io::ErrorKind::NotFound,
                "empty translator command",
            ))
        })?;
        let mut command = Command::new(program);
        command
            .args(leading)
            .arg(subcommand)
            .arg("--from-lang")
            .arg(from)
            .arg("--to-lang")
            .arg(to)
            .kill_on_drop(true);
        Ok(command)
    }

    async fn run(
        &self,
        subcommand: &'static str,
        from: &str,
        to: &str,
        input: Option<&str>,
    ) -> Result<Output, TranslationError> {
        let mut command = self.command(subcommand, from, to)?;
        command
            .stdin(if input.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let mut child = command.spawn().map_err(TranslationError::Unavailable)?;

        // Feed stdin while the output is drained, so neither pipe can fill up
        // and stall the other.
        let stdin = child.stdin.take();
        let feed = async move {
            let (Some(text), Some(mut stdin)) = (input, stdin) else {
                return Ok(());
            };
            match stdin.write_all(text.as_bytes()).await {
                // The translator exited without reading all of its input.
                Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
                other => other,
            }
        };
        let run = async move {
            let (fed, output) = tokio::join!(feed, child.wait_with_output());
            fed?;
            output
        };

        let limit = self.settings.timeout;
        let output = match tokio::time::timeout(limit, run).await {
            Ok(output) => output?,
            // Dropping the run future drops the child, which kills it.
            Err(_) => {
                workbench_warn!("Translator {} exceeded {:?}", subcommand, limit);
                return Err(TranslationError::TimedOut {
                    subcommand,
                    secs: limit.as_secs().max(1),
                });
            }
        };
        if !output.status.success() {
            return Err(command_failed(subcommand, &output));
        }
        Ok(output)
    }

    async fn read_status(&self, from: &str, to: &str) -> Result<TranslationSupportStatus, TranslationError> {
        let output = self.run("status", from, to, None).await?;
        Ok(serde_json::from_slice(&output.stdout)?)
    }

    /// Run `install`, streaming every output line into the install log.
    async fn run_logged_install(&self, from: &str, to: &str) -> Result<(), TranslationError> {
        let mut command = self.command("install", from, to)?;
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let mut child = command.spawn().map_err(TranslationError::Unavailable)?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (_, _, status) = tokio::join!(
            self.pump_lines(stdout),
            self.pump_lines(stderr),
            child.wait()
        );
        let status = status?;
        if !status.success() {
            return Err(TranslationError::CommandFailed {
                subcommand: "install",
                message: format!("exited with {status}"),
            });
        }
        Ok(())
    }

    async fn pump_lines(&self, stream: Option<impl AsyncRead + Unpin>) {
        let Some(stream) = stream else {
            return;
        };
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim();
            if !line.is_empty() {
                self.with_state(|state| state.push_log(line));
            }
        }
    }

    async fn run_install(&self, from: &str, to: &str) -> Result<(), TranslationError> {
        self.with_state(|state| {
            state.enter_step(1, INSTALL_STEPS, "Checking translator");
            state.push_log("Checking the local translator...");
        });
        let status = self.read_status(from, to).await?;
        if status.ready {
            self.with_state(|state| state.push_log("Language package already installed."));
            return Ok(());
        }

        self.with_state(|state| {
            state.enter_step(2, INSTALL_STEPS, "Downloading translation package");
            state.push_log(format!("Downloading {from} -> {to} language package..."));
        });
        self.run_logged_install(from, to).await?;

        self.with_state(|state| {
            state.enter_step(3, INSTALL_STEPS, "Verifying installation");
            state.push_log("Verifying the language package...");
        });
        let status = self.read_status(from, to).await?;
        if !status.ready {
            return Err(TranslationError::CommandFailed {
                subcommand: "status",
                message: if status.message.is_empty() {
                    "language package still not ready".to_string()
                } else {
                    status.message
                },
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl TranslationBackend for CommandTranslationBackend {
    async fn support_status(&self, from: &str, to: &str) -> Result<TranslationSupportStatus, TranslationError> {
        match self.read_status(from, to).await {
            Err(TranslationError::Unavailable(err)) => {
                workbench_debug!("Translator unavailable: {}", err);
                Ok(TranslationSupportStatus {
                    ready: false,
                    message: NOT_INSTALLED.to_string(),
                })
            }
            other => other,
        }
    }

    async fn install(&self, from: &str, to: &str) -> Result<TranslationInstallState, TranslationError> {
        {
            let mut state = self.state();
            if state.active {
                return Ok(state.clone());
            }
            *state = TranslationInstallState {
                total_steps: INSTALL_STEPS,
                logs: vec!["Starting translation support setup...".to_string()],
                ..TranslationInstallState::requested()
            };
        }

        let this = self.clone();
        let (from, to) = (from.to_string(), to.to_string());
        tokio::spawn(async move {
            match this.run_install(&from, &to).await {
                Ok(()) => {
                    workbench_info!("Translation support {} -> {} ready", from, to);
                    this.with_state(|state| state.succeed("Translation support is ready."));
                }
                Err(err) => {
                    workbench_warn!("Translation install failed: {}", err);
                    this.with_state(|state| state.fail(err.to_string()));
                }
            }
        });

        self.install_state().await
    }

    async fn install_state(&self) -> Result<TranslationInstallState, TranslationError> {
        Ok(self.state().clone())
    }

    async fn translate_html(&self, html: &str, from: &str, to: &str) -> Result<String, TranslationError> {
        let output = self.run("translate", from, to, Some(html)).await?;
        String::from_utf8(output.stdout).map_err(|_| TranslationError::NonUtf8)
    }
}

fn command_failed(subcommand: &'static str, output: &Output) -> TranslationError {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let message = match stderr.trim() {
        "" => format!("exited with {}", output.status),
        text => text.to_string(),
    };
    TranslationError::CommandFailed { subcommand, message }
}
