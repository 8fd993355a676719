use std::io;
use std::path::Path;
use std::process::{Output, Stdio};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::Semaphore;
use workbench_core::LanguageKey;
use workbench_logging::{workbench_debug, workbench_trace};

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("spawn {program} failed: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("Time limit exceeded ({secs}s)")]
    TimeLimit { secs: u64 },
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: io::Error,
    },
    /// Failure reported by an executor that does not spawn processes.
    #[error("{0}")]
    Failed(String),
}

/// Runs a program against one stdin and returns its combined output.
///
/// Compile errors are output, not errors: they come back as `Ok` text so the
/// caller shows them like any other program output.
#[async_trait::async_trait]
pub trait CodeExecutor: Send + Sync {
    async fn execute(&self, lang: LanguageKey, code: &str, stdin: &str) -> Result<String, ExecError>;
}

#[derive(Debug, Clone)]
pub struct ExecSettings {
    pub time_limit: Duration,
    pub python: String,
    pub node: String,
    pub cxx: String,
    pub cxx_flags: Vec<String>,
}

impl Default for ExecSettings {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(2),
            python: "python3".to_string(),
            node: "node".to_string(),
            cxx: "g++".to_string(),
            cxx_flags: vec!["-std=c++17".into(), "-O2".into(), "-pipe".into()],
        }
    }
}

/// Executes with the locally installed toolchains.
#[derive(Debug, Clone, Default)]
pub struct LocalProcessExecutor {
    settings: ExecSettings,
}

impl LocalProcessExecutor {
    pub fn new(settings: ExecSettings) -> Self {
        Self { settings }
    }

    async fn run_python(&self, code: &str, stdin: &str) -> Result<String, ExecError> {
        let mut command = Command::new(&self.settings.python);
        command.arg("-c").arg(code);
        self.run_with_input(command, stdin, &self.settings.python).await
    }

    async fn run_js(&self, code: &str, stdin: &str) -> Result<String, ExecError> {
        let dir = scratch_dir()?;
        let script = dir.path().join("main.js");
        write_source(&script, code).await?;

        let mut command = Command::new(&self.settings.node);
        command.arg(&script);
        self.run_with_input(command, stdin, &self.settings.node).await
    }

    async fn run_cpp(&self, code: &str, stdin: &str) -> Result<String, ExecError> {
        let dir = scratch_dir()?;
        let source = dir.path().join("main.cpp");
        let binary = dir.path().join("main");
        write_source(&source, code).await?;

        let compile = Command::new(&self.settings.cxx)
            .args(&self.settings.cxx_flags)
            .arg(&source)
            .arg("-o")
            .arg(&binary)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| ExecError::Spawn {
                program: self.settings.cxx.clone(),
                source,
            })?;

        if !compile.status.success() {
            workbench_debug!("Compilation failed with {}", compile.status);
            let message = render_output(&compile);
            return Ok(if message.trim().is_empty() {
                "Compilation failed.\n".to_string()
            } else {
                message
            });
        }

        self.run_with_input(Command::new(&binary), stdin, "compiled binary")
            .await
    }

    async fn run_with_input(
        &self,
        mut command: Command,
        stdin: &str,
        label: &str,
    ) -> Result<String, ExecError> {
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        let mut child = command.spawn().map_err(|source| ExecError::Spawn {
            program: label.to_string(),
            source,
        })?;

        let input = child.stdin.take();
        let feed = async move {
            let Some(mut input) = input else {
                return Ok(());
            };
            match input.write_all(stdin.as_bytes()).await {
                // The program exited without reading all of its input.
                Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
                other => other,
            }
        };
        // Output is drained while stdin is fed so a chatty program cannot
        // block on a full stdout pipe.
        let run = async move {
            let (fed, output) = tokio::join!(feed, child.wait_with_output());
            fed.map_err(|source| ExecError::Io {
                context: "write stdin failed",
                source,
            })?;
            output.map_err(|source| ExecError::Io {
                context: "read output failed",
                source,
            })
        };

        let limit = self.settings.time_limit;
        match tokio::time::timeout(limit, run).await {
            Ok(output) => {
                let output = output?;
                workbench_trace!("{} exited with {}", label, output.status);
                let text = render_output(&output);
                Ok(if !text.trim().is_empty() {
                    text
                } else if output.status.success() {
                    "OK\n".to_string()
                } else {
                    "Error\n".to_string()
                })
            }
            // Dropping the run future drops the child, which kills it.
            Err(_) => Err(ExecError::TimeLimit {
                secs: limit.as_secs().max(1),
            }),
        }
    }
}

#[async_trait::async_trait]
impl CodeExecutor for LocalProcessExecutor {
    async fn execute(&self, lang: LanguageKey, code: &str, stdin: &str) -> Result<String, ExecError> {
        match lang {
            LanguageKey::Python => self.run_python(code, stdin).await,
            LanguageKey::JavaScript => self.run_js(code, stdin).await,
            LanguageKey::Cpp => self.run_cpp(code, stdin).await,
        }
    }
}

/// Wraps an executor so at most one program runs at a time.
pub struct SingleSlotExecutor {
    inner: Arc<dyn CodeExecutor>,
    slot: Semaphore,
}

impl SingleSlotExecutor {
    pub fn new(inner: Arc<dyn CodeExecutor>) -> Self {
        Self {
            inner,
            slot: Semaphore::new(1),
        }
    }
}

#[async_trait::async_trait]
impl CodeExecutor for SingleSlotExecutor {
    async fn execute(&self, lang: LanguageKey, code: &str, stdin: &str) -> Result<String, ExecError> {
        let _permit = self
            .slot
            .acquire()
            .await
            .map_err(|err| ExecError::Failed(err.to_string()))?;
        self.inner.execute(lang, code, stdin).await
    }
}

/// stdout, then stderr on its own line when both are present.
fn render_output(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    if !output.stderr.is_empty() {
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(&String::from_utf8_lossy(&output.stderr));
    }
    text
}

fn scratch_dir() -> Result<tempfile::TempDir, ExecError> {
    tempfile::Builder::new()
        .prefix("workbench-")
        .tempdir()
        .map_err(|source| ExecError::Io {
            context: "create temp dir failed",
            source,
        })
}

async fn write_source(path: &Path, code: &str) -> Result<(), ExecError> {
    tokio::fs::write(path, code)
        .await
        .map_err(|source| ExecError::Io {
            context: "write source file failed",
            source,
        })
}
