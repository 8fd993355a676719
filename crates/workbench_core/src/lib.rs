//! Workbench core: pure state machine, domain rules and view-model helpers.
mod diff;
mod draft;
mod effect;
mod evaluate;
mod install;
mod language;
mod msg;
mod problem;
mod state;
mod statement;
mod update;
mod view_model;

pub use diff::{diff, DiffRow, LineDiff};
pub use draft::{DraftBook, ProblemDraft, RawDraft};
pub use effect::Effect;
pub use evaluate::{normalize_output, outputs_match, SampleResult, SampleRun, SampleRunOutcome};
pub use install::{InstallPhase, TranslationInstallState, TranslationSupportStatus, MAX_INSTALL_LOGS};
pub use language::LanguageKey;
pub use msg::Msg;
pub use problem::{MergeError, ProblemId, ProblemList, ProblemSummary, Sample, StatementData};
pub use state::{AppState, LoadStatus, RequestScope};
pub use statement::{contains_math, resolve_statement_source, StatementLang, StatementSource};
pub use update::update;
pub use view_model::{AppViewModel, SampleRowView};
