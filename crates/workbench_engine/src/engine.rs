use std::collections::BTreeMap;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use workbench_core::{
    DraftBook, LanguageKey, ProblemDraft, ProblemId, ProblemSummary, RequestScope, Sample,
    StatementData, StatementLang,
};
use workbench_logging::{workbench_debug, workbench_info, workbench_warn};

use crate::caches::{DraftStore, WorkbenchCaches};
use crate::config::EngineConfig;
use crate::exec::{CodeExecutor, LocalProcessExecutor, SingleSlotExecutor};
use crate::fetch::{CodeforcesSource, ProblemSource};
use crate::poller::InstallPoller;
use crate::runner::{run_once, run_samples};
use crate::store::{FileStore, LocalCacheStore};
use crate::translate::{CommandTranslationBackend, TranslationBackend};
use crate::types::{EngineEvent, FetchError};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to build http client: {0}")]
    Client(#[from] FetchError),
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

enum EngineCommand {
    LoadProblemList,
    LoadStatement {
        scope: RequestScope,
        contest_id: u32,
        index: String,
    },
    LoadTranslation {
        scope: RequestScope,
        lang: StatementLang,
        html: String,
    },
    Execute {
        scope: RequestScope,
        lang: LanguageKey,
        code: String,
        stdin: String,
    },
    RunSamples {
        scope: RequestScope,
        lang: LanguageKey,
        code: String,
        samples: Vec<Sample>,
    },
    CheckTranslationSupport {
        lang: StatementLang,
    },
    StartInstall {
        lang: StatementLang,
    },
    StartInstallPolling,
    StopInstallPolling,
}

/// Collaborators behind the engine; swapped for fakes in tests.
pub struct EngineServices {
    pub source: Arc<dyn ProblemSource>,
    pub executor: Arc<dyn CodeExecutor>,
    pub translator: Arc<dyn TranslationBackend>,
    pub caches: WorkbenchCaches,
    pub drafts: DraftStore,
    pub install_poll_interval: Duration,
}

impl EngineServices {
    pub fn from_config(config: &EngineConfig) -> Result<Self, EngineError> {
        let store = LocalCacheStore::new(Arc::new(FileStore::new(config.data_dir.clone())));
        Ok(Self {
            source: Arc::new(CodeforcesSource::new(config.fetch.clone())?),
            executor: Arc::new(LocalProcessExecutor::new(config.exec.clone())),
            translator: Arc::new(CommandTranslationBackend::new(config.translator.clone())),
            caches: WorkbenchCaches::new(store.clone(), Arc::clone(&config.clock), config.ttls),
            drafts: DraftStore::new(store),
            install_poll_interval: config.install_poll_interval,
        })
    }
}

/// Runs effects on a background runtime and reports results as events.
///
/// Cache and draft writes happen synchronously on the caller's thread, so
/// they land in the order the controller issued them.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
    caches: WorkbenchCaches,
    drafts: DraftStore,
}

impl EngineHandle {
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        Self::with_services(EngineServices::from_config(config)?)
    }

    pub fn with_services(services: EngineServices) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        let worker = Worker {
            source: services.source,
            executor: Arc::new(SingleSlotExecutor::new(services.executor)),
            translator: services.translator,
            caches: services.caches.clone(),
            poll_interval: services.install_poll_interval,
            event_tx,
        };
        thread::spawn(move || worker.run(runtime, cmd_rx));

        Ok(Self {
            cmd_tx,
            event_rx,
            caches: services.caches,
            drafts: services.drafts,
        })
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            workbench_warn!("Engine worker is gone; command dropped");
        }
    }

    pub fn load_problem_list(&self) {
        self.send(EngineCommand::LoadProblemList);
    }

    pub fn load_statement(&self, scope: RequestScope, contest_id: u32, index: impl Into<String>) {
        self.send(EngineCommand::LoadStatement {
            scope,
            contest_id,
            index: index.into(),
        });
    }

    pub fn load_translation(&self, scope: RequestScope, lang: StatementLang, html: String) {
        self.send(EngineCommand::LoadTranslation { scope, lang, html });
    }

    pub fn execute(&self, scope: RequestScope, lang: LanguageKey, code: String, stdin: String) {
        self.send(EngineCommand::Execute {
            scope,
            lang,
            code,
            stdin,
        });
    }

    pub fn run_samples(&self, scope: RequestScope, lang: LanguageKey, code: String, samples: Vec<Sample>) {
        self.send(EngineCommand::RunSamples {
            scope,
            lang,
            code,
            samples,
        });
    }

    pub fn check_translation_support(&self, lang: StatementLang) {
        self.send(EngineCommand::CheckTranslationSupport { lang });
    }

    pub fn start_install(&self, lang: StatementLang) {
        self.send(EngineCommand::StartInstall { lang });
    }

    pub fn start_install_polling(&self) {
        self.send(EngineCommand::StartInstallPolling);
    }

    pub fn stop_install_polling(&self) {
        self.send(EngineCommand::StopInstallPolling);
    }

    pub fn cache_problem_list(&self, problems: &[ProblemSummary]) {
        self.caches.store_problem_list(problems);
    }

    pub fn cache_statement(&self, problem_id: &str, statement: &StatementData) {
        self.caches.store_statement(problem_id, statement);
    }

    pub fn cache_translation(&self, problem_id: &str, lang: StatementLang, html: &str) {
        self.caches.store_translation(problem_id, lang, html);
    }

    pub fn load_drafts(&self) -> DraftBook {
        self.drafts.load()
    }

    pub fn persist_drafts(&self, drafts: &BTreeMap<ProblemId, ProblemDraft>) {
        self.drafts.save(drafts);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

#[derive(Clone)]
struct Worker {
    source: Arc<dyn ProblemSource>,
    executor: Arc<dyn CodeExecutor>,
    translator: Arc<dyn TranslationBackend>,
    caches: WorkbenchCaches,
    poll_interval: Duration,
    event_tx: mpsc::Sender<EngineEvent>,
}

impl Worker {
    fn run(self, runtime: tokio::runtime::Runtime, cmd_rx: mpsc::Receiver<EngineCommand>) {
        let mut poller: Option<InstallPoller> = None;
        while let Ok(command) = cmd_rx.recv() {
            match command {
                EngineCommand::StartInstallPolling => {
                    if poller.as_ref().is_some_and(|running| !running.is_finished()) {
                        continue;
                    }
                    let event_tx = self.event_tx.clone();
                    poller = Some(InstallPoller::spawn(
                        runtime.handle(),
                        Arc::clone(&self.translator),
                        self.poll_interval,
                        move |result| {
                            let _ = event_tx.send(EngineEvent::InstallPolled(result));
                        },
                    ));
                }
                EngineCommand::StopInstallPolling => {
                    if let Some(running) = poller.take() {
                        running.stop();
                    }
                }
                command => {
                    let worker = self.clone();
                    runtime.spawn(async move { worker.handle(command).await });
                }
            }
        }
        workbench_debug!("Engine command channel closed");
    }

    fn emit(&self, event: EngineEvent) {
        let _ = self.event_tx.send(event);
    }

    async fn handle(&self, command: EngineCommand) {
        match command {
            EngineCommand::LoadProblemList => self.load_problem_list().await,
            EngineCommand::LoadStatement {
                scope,
                contest_id,
                index,
            } => self.load_statement(scope, contest_id, &index).await,
            EngineCommand::LoadTranslation { scope, lang, html } => {
                self.load_translation(scope, lang, &html).await
            }
            EngineCommand::Execute {
                scope,
                lang,
                code,
                stdin,
            } => {
                let output = run_once(self.executor.as_ref(), lang, &code, &stdin).await;
                self.emit(EngineEvent::RunFinished { scope, output });
            }
            EngineCommand::RunSamples {
                scope,
                lang,
                code,
                samples,
            } => {
                let outcome = run_samples(self.executor.as_ref(), lang, &code, &samples).await;
                self.emit(EngineEvent::SamplesFinished { scope, outcome });
            }
            EngineCommand::CheckTranslationSupport { lang } => {
                let status = self
                    .translator
                    .support_status(StatementLang::PRIMARY.code(), lang.code())
                    .await
                    .map_err(|err| err.to_string());
                self.emit(EngineEvent::TranslationSupportChecked(status));
            }
            EngineCommand::StartInstall { lang } => {
                let state = self
                    .translator
                    .install(StatementLang::PRIMARY.code(), lang.code())
                    .await
                    .map_err(|err| err.to_string());
                self.emit(EngineEvent::InstallAcknowledged(state));
            }
            EngineCommand::StartInstallPolling | EngineCommand::StopInstallPolling => {}
        }
    }

    async fn load_problem_list(&self) {
        if let Some(problems) = self.caches.problem_list() {
            workbench_debug!("Problem list served from cache");
            self.emit(EngineEvent::ProblemListLoaded {
                problems,
                from_cache: true,
            });
            return;
        }
        match self.source.fetch_problem_list().await {
            Ok(problems) => {
                workbench_info!("Loaded {} problems", problems.len());
                self.emit(EngineEvent::ProblemListLoaded {
                    problems,
                    from_cache: false,
                });
            }
            Err(err) => {
                workbench_warn!("Problem list failed: {}", err);
                self.emit(EngineEvent::ProblemListFailed(err.to_string()));
            }
        }
    }

    async fn load_statement(&self, scope: RequestScope, contest_id: u32, index: &str) {
        if let Some(statement) = self.caches.statement(&scope.problem_id, contest_id, index) {
            self.emit(EngineEvent::StatementLoaded {
                scope,
                statement,
                from_cache: true,
            });
            return;
        }
        let event = match self.source.fetch_statement(contest_id, index).await {
            Ok(statement) => EngineEvent::StatementLoaded {
                scope,
                statement,
                from_cache: false,
            },
            Err(err) => {
                workbench_warn!("Statement {} failed: {}", scope.problem_id, err);
                EngineEvent::StatementFailed {
                    scope,
                    message: err.to_string(),
                }
            }
        };
        self.emit(event);
    }

    async fn load_translation(&self, scope: RequestScope, lang: StatementLang, html: &str) {
        if let Some(html) = self.caches.translation(&scope.problem_id, lang) {
            self.emit(EngineEvent::TranslationLoaded {
                scope,
                lang,
                html,
                from_cache: true,
            });
            return;
        }
        let event = match self
            .translator
            .translate_html(html, StatementLang::PRIMARY.code(), lang.code())
            .await
        {
            Ok(html) => EngineEvent::TranslationLoaded {
                scope,
                lang,
                html,
                from_cache: false,
            },
            Err(err) => EngineEvent::TranslationFailed {
                scope,
                message: err.to_string(),
            },
        };
        self.emit(event);
    }
}
