use workbench_logging::{workbench_debug, workbench_info, workbench_warn};

use crate::{
    AppState, Effect, LoadStatus, Msg, ProblemDraft, RequestScope, SampleRunOutcome,
    TranslationInstallState,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::RestoreDrafts(book) => {
            workbench_info!("Restored {} drafts", book.len());
            *state.drafts_mut() = book;
            state.mark_dirty();
            Vec::new()
        }
        Msg::ProblemListRequested => {
            state.set_list_status(LoadStatus::Loading);
            vec![Effect::LoadProblemList]
        }
        Msg::ProblemListLoaded {
            problems,
            from_cache,
        } => {
            let to_cache = (!from_cache).then(|| problems.clone());
            let dropped = state.problems_mut().replace_all(problems);
            if dropped > 0 {
                workbench_warn!("Dropped {} problems with duplicate ids", dropped);
            }
            state.set_list_status(LoadStatus::Ready);
            to_cache.map(Effect::CacheProblemList).into_iter().collect()
        }
        Msg::ProblemListFailed(message) => {
            state.set_list_status(LoadStatus::Failed(message));
            Vec::new()
        }
        Msg::ProblemSelected(problem_id) => select_problem(&mut state, problem_id),
        Msg::StatementLoaded {
            scope,
            statement,
            from_cache,
        } => {
            if !state.is_current(&scope) {
                workbench_debug!("Discarding stale statement for {}", scope.problem_id);
                return (state, Vec::new());
            }
            match state
                .problems_mut()
                .merge_statement(&scope.problem_id, &statement)
            {
                Ok(()) => {
                    state.set_statement_status(LoadStatus::Ready);
                    let mut effects = Vec::new();
                    if !from_cache {
                        effects.push(Effect::CacheStatement {
                            problem_id: scope.problem_id.clone(),
                            statement: statement.clone(),
                        });
                    }
                    if state
                        .drafts_mut()
                        .seed_stdin_from_samples(&scope.problem_id, &statement.samples)
                    {
                        effects.push(persist_drafts(&state));
                    }
                    effects.extend(request_translation_if_needed(&mut state));
                    effects
                }
                Err(err) => {
                    workbench_warn!("Rejected statement for {}: {}", scope.problem_id, err);
                    state.set_statement_status(LoadStatus::Failed(err.to_string()));
                    Vec::new()
                }
            }
        }
        Msg::StatementFailed { scope, message } => {
            if state.is_current(&scope) {
                state.set_statement_status(LoadStatus::Failed(message));
            }
            Vec::new()
        }
        Msg::LanguageChanged(lang) => edit_draft(&mut state, |mut draft| {
            draft.set_lang(lang);
            draft
        }),
        Msg::CodeEdited(code) => edit_draft(&mut state, |mut draft| {
            draft.set_code(code);
            draft
        }),
        Msg::StdinEdited(stdin) => edit_draft(&mut state, |mut draft| {
            draft.edit_stdin(stdin);
            draft
        }),
        Msg::RunClicked => {
            let (Some(scope), Some(draft)) = (state.current_scope(), state.current_draft()) else {
                return (state, Vec::new());
            };
            if state.is_running() {
                return (state, Vec::new());
            }
            state.start_run();
            vec![Effect::Execute {
                scope,
                lang: draft.lang,
                code: draft.code().to_string(),
                stdin: draft.stdin,
            }]
        }
        Msg::RunFinished { scope, output } => {
            if state.is_current(&scope) {
                // Failures are shown verbatim in place of the output.
                state.finish_run(output.unwrap_or_else(|err| err));
            }
            Vec::new()
        }
        Msg::RunSamplesClicked => {
            let (Some(scope), Some(draft)) = (state.current_scope(), state.current_draft()) else {
                return (state, Vec::new());
            };
            if state.samples_running() {
                return (state, Vec::new());
            }
            let samples = state
                .selected_problem()
                .map(|p| p.samples.clone())
                .unwrap_or_default();
            if samples.is_empty() {
                state.finish_samples(SampleRunOutcome::NoSamples);
                return (state, Vec::new());
            }
            state.start_samples();
            vec![Effect::RunSamples {
                scope,
                lang: draft.lang,
                code: draft.code().to_string(),
                samples,
            }]
        }
        Msg::SamplesFinished { scope, outcome } => {
            if state.is_current(&scope) {
                state.finish_samples(outcome);
            }
            Vec::new()
        }
        Msg::SampleSelected(index) => {
            state.select_sample(index);
            Vec::new()
        }
        Msg::StatementLanguageChanged(lang) => {
            if state.statement_lang() == lang {
                return (state, Vec::new());
            }
            state.set_statement_lang(lang);
            if lang.is_primary() {
                return (state, Vec::new());
            }
            if state.translation_support().is_none() {
                return (state, vec![Effect::CheckTranslationSupport { lang }]);
            }
            request_translation_if_needed(&mut state)
        }
        Msg::TranslationLoaded {
            scope,
            lang,
            html,
            from_cache,
        } => {
            if !state.is_current(&scope) {
                workbench_debug!("Discarding stale translation for {}", scope.problem_id);
                return (state, Vec::new());
            }
            match state
                .problems_mut()
                .merge_translation(&scope.problem_id, lang.code(), html.clone())
            {
                Ok(()) => {
                    state.set_translation_status(LoadStatus::Ready);
                    if from_cache {
                        Vec::new()
                    } else {
                        vec![Effect::CacheTranslation {
                            problem_id: scope.problem_id,
                            lang,
                            html,
                        }]
                    }
                }
                Err(err) => {
                    state.set_translation_status(LoadStatus::Failed(err.to_string()));
                    Vec::new()
                }
            }
        }
        Msg::TranslationFailed { scope, message } => {
            if state.is_current(&scope) {
                state.set_translation_status(LoadStatus::Failed(message));
            }
            Vec::new()
        }
        Msg::TranslationSupportChecked(result) => {
            let status = result.unwrap_or_else(|message| crate::TranslationSupportStatus {
                ready: false,
                message,
            });
            state.set_translation_support(status);
            request_translation_if_needed(&mut state)
        }
        Msg::InstallRequested => {
            if state.install_state().active {
                return (state, Vec::new());
            }
            *state.install_mut() = TranslationInstallState::requested();
            vec![Effect::StartInstall {
                lang: translation_target(&state),
            }]
        }
        Msg::InstallAcknowledged(_) if !state.install_state().active => {
            // The request was dropped by a problem switch before the ack came back.
            workbench_debug!("Ignoring install acknowledgement without a pending request");
            Vec::new()
        }
        Msg::InstallAcknowledged(result) => match result {
            Ok(ack) => {
                *state.install_mut() = ack;
                install_follow_up(&state)
            }
            Err(message) => {
                state.install_mut().fail(message);
                Vec::new()
            }
        },
        Msg::InstallPolled(result) => {
            if !state.install_state().active {
                // Poll result that raced a stop or a problem switch.
                return (state, Vec::new());
            }
            match result {
                Ok(polled) => {
                    *state.install_mut() = polled;
                    let mut effects = Vec::new();
                    if !state.install_state().active {
                        effects.push(Effect::StopInstallPolling);
                    }
                    if state.install_state().finished {
                        effects.push(Effect::CheckTranslationSupport {
                            lang: translation_target(&state),
                        });
                    }
                    effects
                }
                Err(message) => {
                    state.install_mut().fail(message);
                    vec![Effect::StopInstallPolling]
                }
            }
        }
    };

    (state, effects)
}

/// "Problem selected": reset transients, resolve the draft, fetch what is missing.
fn select_problem(state: &mut AppState, problem_id: String) -> Vec<Effect> {
    let Some(problem) = state.problems().get(&problem_id).cloned() else {
        workbench_warn!("Ignoring selection of unknown problem {}", problem_id);
        return Vec::new();
    };

    let mut effects = Vec::new();
    if state.select(problem_id.clone()) {
        effects.push(Effect::StopInstallPolling);
    }

    let hint = problem.first_sample_input();
    let created = state
        .drafts_mut()
        .update_draft(&problem_id, hint, std::convert::identity);
    let seeded = state
        .drafts_mut()
        .seed_stdin_from_samples(&problem_id, &problem.samples);
    if created || seeded {
        effects.push(persist_drafts(state));
    }

    if problem.needs_statement() {
        if let (Some(scope), Some((contest_id, index))) =
            (state.current_scope(), problem.fetch_identity())
        {
            state.set_statement_status(LoadStatus::Loading);
            effects.push(Effect::LoadStatement {
                scope,
                contest_id,
                index: index.to_string(),
            });
        }
    } else if problem.statement_html.is_some() {
        state.set_statement_status(LoadStatus::Ready);
    }

    effects
}

fn edit_draft(state: &mut AppState, updater: impl FnOnce(ProblemDraft) -> ProblemDraft) -> Vec<Effect> {
    let Some(problem) = state.selected_problem().cloned() else {
        return Vec::new();
    };
    let changed = state
        .drafts_mut()
        .update_draft(&problem.id, problem.first_sample_input(), updater);
    if !changed {
        return Vec::new();
    }
    state.mark_dirty();
    vec![persist_drafts(state)]
}

fn persist_drafts(state: &AppState) -> Effect {
    Effect::PersistDrafts(state.drafts().as_map().clone())
}

fn translation_target(state: &AppState) -> crate::StatementLang {
    let lang = state.statement_lang();
    if lang.is_primary() {
        crate::StatementLang::Chinese
    } else {
        lang
    }
}

fn install_follow_up(state: &AppState) -> Vec<Effect> {
    let install = state.install_state();
    if install.active {
        vec![Effect::StartInstallPolling]
    } else if install.finished {
        vec![Effect::CheckTranslationSupport {
            lang: translation_target(state),
        }]
    } else {
        Vec::new()
    }
}

/// Asks for a translation of the selected statement once everything it needs
/// is in place and nothing is already attached or in flight.
fn request_translation_if_needed(state: &mut AppState) -> Vec<Effect> {
    let lang = state.statement_lang();
    if lang.is_primary() || state.translation_status().is_loading() {
        return Vec::new();
    }
    if !state.translation_support().is_some_and(|s| s.ready) {
        return Vec::new();
    }
    let Some(scope): Option<RequestScope> = state.current_scope() else {
        return Vec::new();
    };
    let Some(problem) = state.selected_problem() else {
        return Vec::new();
    };
    if problem.translation(lang.code()).is_some() {
        return Vec::new();
    }
    let Some(html) = problem.statement_html.clone() else {
        return Vec::new();
    };
    if state.statement_status().is_loading() {
        return Vec::new();
    }
    state.set_translation_status(LoadStatus::Loading);
    vec![Effect::LoadTranslation { scope, lang, html }]
}
