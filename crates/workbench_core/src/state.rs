use crate::view_model::{AppViewModel, SampleRowView};
use crate::{
    resolve_statement_source, DraftBook, LanguageKey, ProblemDraft, ProblemId, ProblemList,
    ProblemSummary, SampleRunOutcome, StatementLang, TranslationInstallState,
    TranslationSupportStatus,
};

/// Identifies the selection an asynchronous request was issued for. A result
/// is only applied while its scope is still the current one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestScope {
    pub problem_id: ProblemId,
    pub epoch: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(String),
}

impl LoadStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadStatus::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LoadStatus::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// The whole application state, owned by the controller and only changed
/// through `update`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    problems: ProblemList,
    list_status: LoadStatus,
    selected: Option<ProblemId>,
    epoch: u64,
    statement_status: LoadStatus,
    statement_lang: StatementLang,
    translation_status: LoadStatus,
    translation_support: Option<TranslationSupportStatus>,
    install: TranslationInstallState,
    drafts: DraftBook,
    running: bool,
    run_output: Option<String>,
    samples_running: bool,
    sample_run: Option<SampleRunOutcome>,
    selected_sample: usize,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        let problem = self.selected_problem();
        let sample_rows = match &self.sample_run {
            Some(SampleRunOutcome::Completed(run)) => run
                .results
                .iter()
                .map(|r| SampleRowView {
                    index: r.index,
                    ok: r.ok,
                    error: (!r.error.is_empty()).then(|| r.error.clone()),
                })
                .collect(),
            _ => Vec::new(),
        };
        let (passed_count, total_count) = match &self.sample_run {
            Some(SampleRunOutcome::Completed(run)) => (run.passed_count, run.total()),
            _ => (0, 0),
        };
        AppViewModel {
            problem_count: self.problems.len(),
            list_loading: self.list_status.is_loading(),
            list_error: self.list_status.error().map(str::to_string),
            selected_problem: self.selected.clone(),
            problem_title: problem.map(|p| p.title.clone()),
            statement_loading: self.statement_status.is_loading(),
            statement_error: self.statement_status.error().map(str::to_string),
            statement_lang: self.statement_lang,
            statement: problem.map(|p| resolve_statement_source(p, self.statement_lang)),
            translation_loading: self.translation_status.is_loading(),
            translation_error: self.translation_status.error().map(str::to_string),
            translation_ready: self.translation_support.as_ref().map(|s| s.ready),
            install: self.install.clone(),
            draft: self.current_draft(),
            running: self.running,
            run_output: self.run_output.clone(),
            samples_running: self.samples_running,
            no_samples: matches!(self.sample_run, Some(SampleRunOutcome::NoSamples)),
            sample_rows,
            passed_count,
            total_count,
            selected_sample: self.selected_sample,
            selected_diff: self.selected_sample_result().and_then(|r| r.diff()),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn problems(&self) -> &ProblemList {
        &self.problems
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_problem(&self) -> Option<&ProblemSummary> {
        self.selected.as_deref().and_then(|id| self.problems.get(id))
    }

    pub fn drafts(&self) -> &DraftBook {
        &self.drafts
    }

    /// Draft of the selected problem as the editor would show it.
    pub fn current_draft(&self) -> Option<ProblemDraft> {
        let problem = self.selected_problem()?;
        Some(
            self.drafts
                .get_draft(&problem.id, problem.first_sample_input()),
        )
    }

    pub fn active_language(&self) -> Option<LanguageKey> {
        self.current_draft().map(|d| d.lang)
    }

    pub fn statement_lang(&self) -> StatementLang {
        self.statement_lang
    }

    pub fn install_state(&self) -> &TranslationInstallState {
        &self.install
    }

    pub fn translation_support(&self) -> Option<&TranslationSupportStatus> {
        self.translation_support.as_ref()
    }

    pub fn sample_run(&self) -> Option<&SampleRunOutcome> {
        self.sample_run.as_ref()
    }

    pub fn selected_sample_result(&self) -> Option<&crate::SampleResult> {
        match &self.sample_run {
            Some(SampleRunOutcome::Completed(run)) => run.results.get(self.selected_sample),
            _ => None,
        }
    }

    pub fn run_output(&self) -> Option<&str> {
        self.run_output.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.running
            || self.samples_running
            || self.list_status.is_loading()
            || self.statement_status.is_loading()
            || self.translation_status.is_loading()
            || self.install.active
    }

    /// Scope for a request issued now for the selected problem.
    pub fn current_scope(&self) -> Option<RequestScope> {
        self.selected.as_ref().map(|id| RequestScope {
            problem_id: id.clone(),
            epoch: self.epoch,
        })
    }

    pub(crate) fn is_current(&self, scope: &RequestScope) -> bool {
        scope.epoch == self.epoch && self.selected.as_deref() == Some(scope.problem_id.as_str())
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn problems_mut(&mut self) -> &mut ProblemList {
        &mut self.problems
    }

    pub(crate) fn drafts_mut(&mut self) -> &mut DraftBook {
        &mut self.drafts
    }

    pub(crate) fn set_list_status(&mut self, status: LoadStatus) {
        self.list_status = status;
        self.mark_dirty();
    }

    /// Switches the selection and drops every per-problem transient: pending
    /// results become stale, statement language returns to the primary one and
    /// the install state goes back to idle. Returns whether an install poll was
    /// running.
    pub(crate) fn select(&mut self, problem_id: ProblemId) -> bool {
        self.epoch += 1;
        self.selected = Some(problem_id);
        self.statement_status = LoadStatus::Idle;
        self.statement_lang = StatementLang::PRIMARY;
        self.translation_status = LoadStatus::Idle;
        self.running = false;
        self.run_output = None;
        self.samples_running = false;
        self.sample_run = None;
        self.selected_sample = 0;
        let was_polling = self.install.active;
        self.install = TranslationInstallState::idle();
        self.mark_dirty();
        was_polling
    }

    pub(crate) fn statement_status(&self) -> &LoadStatus {
        &self.statement_status
    }

    pub(crate) fn set_statement_status(&mut self, status: LoadStatus) {
        self.statement_status = status;
        self.mark_dirty();
    }

    pub(crate) fn set_statement_lang(&mut self, lang: StatementLang) {
        self.statement_lang = lang;
        self.mark_dirty();
    }

    pub(crate) fn translation_status(&self) -> &LoadStatus {
        &self.translation_status
    }

    pub(crate) fn set_translation_status(&mut self, status: LoadStatus) {
        self.translation_status = status;
        self.mark_dirty();
    }

    pub(crate) fn set_translation_support(&mut self, status: TranslationSupportStatus) {
        self.translation_support = Some(status);
        self.mark_dirty();
    }

    pub(crate) fn install_mut(&mut self) -> &mut TranslationInstallState {
        self.mark_dirty();
        &mut self.install
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running
    }

    pub(crate) fn start_run(&mut self) {
        self.running = true;
        self.run_output = None;
        self.mark_dirty();
    }

    pub(crate) fn finish_run(&mut self, output: String) {
        self.running = false;
        self.run_output = Some(output);
        self.mark_dirty();
    }

    pub(crate) fn samples_running(&self) -> bool {
        self.samples_running
    }

    pub(crate) fn start_samples(&mut self) {
        self.samples_running = true;
        self.mark_dirty();
    }

    /// A new outcome fully replaces the previous one.
    pub(crate) fn finish_samples(&mut self, outcome: SampleRunOutcome) {
        self.samples_running = false;
        self.selected_sample = match &outcome {
            SampleRunOutcome::Completed(run) => run.selected,
            SampleRunOutcome::NoSamples => 0,
        };
        self.sample_run = Some(outcome);
        self.mark_dirty();
    }

    pub(crate) fn select_sample(&mut self, index: usize) -> bool {
        let in_range = match &self.sample_run {
            Some(SampleRunOutcome::Completed(run)) => index < run.results.len(),
            _ => false,
        };
        if in_range && index != self.selected_sample {
            self.selected_sample = index;
            self.mark_dirty();
        }
        in_range
    }
}
