use crate::{LineDiff, ProblemDraft, ProblemId, StatementLang, StatementSource, TranslationInstallState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleRowView {
    pub index: usize,
    pub ok: bool,
    pub error: Option<String>,
}

/// Snapshot handed to whatever renders the workbench.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub problem_count: usize,
    pub list_loading: bool,
    pub list_error: Option<String>,
    pub selected_problem: Option<ProblemId>,
    pub problem_title: Option<String>,
    pub statement_loading: bool,
    pub statement_error: Option<String>,
    pub statement_lang: StatementLang,
    /// Pre-typeset markup; typesetting happens at display time.
    pub statement: Option<StatementSource>,
    pub translation_loading: bool,
    pub translation_error: Option<String>,
    pub translation_ready: Option<bool>,
    pub install: TranslationInstallState,
    pub draft: Option<ProblemDraft>,
    pub running: bool,
    pub run_output: Option<String>,
    pub samples_running: bool,
    pub no_samples: bool,
    pub sample_rows: Vec<SampleRowView>,
    pub passed_count: usize,
    pub total_count: usize,
    pub selected_sample: usize,
    pub selected_diff: Option<LineDiff>,
    pub dirty: bool,
}
