use std::time::Duration;

use workbench_core::{Effect, Msg};
use workbench_engine::{EngineEvent, EngineHandle};
use workbench_logging::{workbench_debug, workbench_info, workbench_warn};

/// Hands effects to the engine and turns its events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
    /// Requests whose result has not come back yet.
    in_flight: usize,
    polling: bool,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self {
            engine,
            in_flight: 0,
            polling: false,
        }
    }

    pub fn restore_drafts(&self) -> Msg {
        Msg::RestoreDrafts(self.engine.load_drafts())
    }

    pub fn enqueue(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            self.run(effect);
        }
    }

    fn run(&mut self, effect: Effect) {
        match effect {
            Effect::LoadProblemList => {
                self.in_flight += 1;
                self.engine.load_problem_list();
            }
            Effect::CacheProblemList(problems) => {
                workbench_debug!("Caching {} problems", problems.len());
                self.engine.cache_problem_list(&problems);
            }
            Effect::LoadStatement {
                scope,
                contest_id,
                index,
            } => {
                workbench_info!("LoadStatement {} ({}{})", scope.problem_id, contest_id, index);
                self.in_flight += 1;
                self.engine.load_statement(scope, contest_id, index);
            }
            Effect::CacheStatement {
                problem_id,
                statement,
            } => self.engine.cache_statement(&problem_id, &statement),
            Effect::LoadTranslation { scope, lang, html } => {
                self.in_flight += 1;
                self.engine.load_translation(scope, lang, html);
            }
            Effect::CacheTranslation {
                problem_id,
                lang,
                html,
            } => self.engine.cache_translation(&problem_id, lang, &html),
            Effect::PersistDrafts(drafts) => self.engine.persist_drafts(&drafts),
            Effect::Execute {
                scope,
                lang,
                code,
                stdin,
            } => {
                self.in_flight += 1;
                self.engine.execute(scope, lang, code, stdin);
            }
            Effect::RunSamples {
                scope,
                lang,
                code,
                samples,
            } => {
                workbench_info!("RunSamples {} samples={}", scope.problem_id, samples.len());
                self.in_flight += 1;
                self.engine.run_samples(scope, lang, code, samples);
            }
            Effect::CheckTranslationSupport { lang } => {
                self.in_flight += 1;
                self.engine.check_translation_support(lang);
            }
            Effect::StartInstall { lang } => {
                self.in_flight += 1;
                self.engine.start_install(lang);
            }
            Effect::StartInstallPolling => {
                self.polling = true;
                self.engine.start_install_polling();
            }
            Effect::StopInstallPolling => {
                self.polling = false;
                self.engine.stop_install_polling();
            }
        }
    }

    /// Nothing requested is still outstanding and no poll is running.
    pub fn is_idle(&self) -> bool {
        self.in_flight == 0 && !self.polling
    }

    /// Waits up to `timeout` for the next engine result.
    pub fn next_msg(&mut self, timeout: Duration) -> Option<Msg> {
        let event = self.engine.recv_timeout(timeout)?;
        if !matches!(event, EngineEvent::InstallPolled(_)) {
            self.in_flight = self.in_flight.saturating_sub(1);
        }
        Some(to_msg(event))
    }
}

pub fn to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::ProblemListLoaded {
            problems,
            from_cache,
        } => Msg::ProblemListLoaded {
            problems,
            from_cache,
        },
        EngineEvent::ProblemListFailed(message) => {
            workbench_warn!("Problem list failed: {}", message);
            Msg::ProblemListFailed(message)
        }
        EngineEvent::StatementLoaded {
            scope,
            statement,
            from_cache,
        } => Msg::StatementLoaded {
            scope,
            statement,
            from_cache,
        },
        EngineEvent::StatementFailed { scope, message } => Msg::StatementFailed { scope, message },
        EngineEvent::TranslationLoaded {
            scope,
            lang,
            html,
            from_cache,
        } => Msg::TranslationLoaded {
            scope,
            lang,
            html,
            from_cache,
        },
        EngineEvent::TranslationFailed { scope, message } => {
            workbench_warn!("Translation of {} failed: {}", scope.problem_id, message);
            Msg::TranslationFailed { scope, message }
        }
        EngineEvent::RunFinished { scope, output } => Msg::RunFinished { scope, output },
        EngineEvent::SamplesFinished { scope, outcome } => Msg::SamplesFinished { scope, outcome },
        EngineEvent::TranslationSupportChecked(result) => Msg::TranslationSupportChecked(result),
        EngineEvent::InstallAcknowledged(result) => Msg::InstallAcknowledged(result),
        EngineEvent::InstallPolled(result) => Msg::InstallPolled(result),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use workbench_core::{RequestScope, StatementLang, TranslationInstallState};

    #[test]
    fn scoped_events_keep_their_scope() {
        let scope = RequestScope {
            problem_id: "CF-4-A".to_string(),
            epoch: 3,
        };
        let msg = to_msg(EngineEvent::TranslationLoaded {
            scope: scope.clone(),
            lang: StatementLang::Chinese,
            html: "<p>x</p>".to_string(),
            from_cache: true,
        });
        assert_eq!(
            msg,
            Msg::TranslationLoaded {
                scope,
                lang: StatementLang::Chinese,
                html: "<p>x</p>".to_string(),
                from_cache: true,
            }
        );
    }

    #[test]
    fn poll_results_pass_through() {
        let state = TranslationInstallState::requested();
        assert_eq!(
            to_msg(EngineEvent::InstallPolled(Ok(state.clone()))),
            Msg::InstallPolled(Ok(state))
        );
    }
}
