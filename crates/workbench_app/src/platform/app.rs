use std::time::Duration;

use anyhow::{bail, Result};
use workbench_core::{update, AppState, AppViewModel, Msg};
use workbench_engine::EngineHandle;
use workbench_logging::workbench_debug;

use super::effects::EffectRunner;

/// Owns the state and feeds it messages until the engine has nothing left
/// to report.
pub struct Controller {
    state: AppState,
    runner: EffectRunner,
    wait: Duration,
}

impl Controller {
    pub fn new(engine: EngineHandle, wait: Duration) -> Self {
        Self {
            state: AppState::new(),
            runner: EffectRunner::new(engine),
            wait,
        }
    }

    /// Restores drafts and loads the problem list.
    pub fn start(&mut self) -> Result<()> {
        let restore = self.runner.restore_drafts();
        self.dispatch(restore);
        self.send(Msg::ProblemListRequested)
    }

    pub fn send(&mut self, msg: Msg) -> Result<()> {
        self.send_observed(msg, |_| {})
    }

    /// Like [`Controller::send`], calling `on_change` after every message
    /// that changed the state.
    pub fn send_observed(&mut self, msg: Msg, mut on_change: impl FnMut(&AppViewModel)) -> Result<()> {
        self.dispatch(msg);
        self.notify(&mut on_change);
        while !self.runner.is_idle() {
            let Some(msg) = self.runner.next_msg(self.wait) else {
                bail!("no result from the engine within {:?}", self.wait);
            };
            self.dispatch(msg);
            self.notify(&mut on_change);
        }
        Ok(())
    }

    fn dispatch(&mut self, msg: Msg) {
        workbench_debug!("Dispatching {}", msg_name(&msg));
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.runner.enqueue(effects);
    }

    fn notify(&mut self, on_change: &mut impl FnMut(&AppViewModel)) {
        if self.state.consume_dirty() {
            on_change(&self.state.view());
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn view(&self) -> AppViewModel {
        self.state.view()
    }
}

fn msg_name(msg: &Msg) -> &'static str {
    match msg {
        Msg::RestoreDrafts(_) => "RestoreDrafts",
        Msg::ProblemListRequested => "ProblemListRequested",
        Msg::ProblemListLoaded { .. } => "ProblemListLoaded",
        Msg::ProblemListFailed(_) => "ProblemListFailed",
        Msg::ProblemSelected(_) => "ProblemSelected",
        Msg::StatementLoaded { .. } => "StatementLoaded",
        Msg::StatementFailed { .. } => "StatementFailed",
        Msg::LanguageChanged(_) => "LanguageChanged",
        Msg::CodeEdited(_) => "CodeEdited",
        Msg::StdinEdited(_) => "StdinEdited",
        Msg::RunClicked => "RunClicked",
        Msg::RunFinished { .. } => "RunFinished",
        Msg::RunSamplesClicked => "RunSamplesClicked",
        Msg::SamplesFinished { .. } => "SamplesFinished",
        Msg::SampleSelected(_) => "SampleSelected",
        Msg::StatementLanguageChanged(_) => "StatementLanguageChanged",
        Msg::TranslationLoaded { .. } => "TranslationLoaded",
        Msg::TranslationFailed { .. } => "TranslationFailed",
        Msg::TranslationSupportChecked(_) => "TranslationSupportChecked",
        Msg::InstallRequested => "InstallRequested",
        Msg::InstallAcknowledged(_) => "InstallAcknowledged",
        Msg::InstallPolled(_) => "InstallPolled",
    }
}
