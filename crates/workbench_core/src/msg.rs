use crate::{
    DraftBook, LanguageKey, ProblemId, ProblemSummary, RequestScope, SampleRunOutcome,
    StatementData, StatementLang, TranslationInstallState, TranslationSupportStatus,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Drafts loaded from the local store at startup.
    RestoreDrafts(DraftBook),
    /// User asked for the problem list (startup or manual refresh).
    ProblemListRequested,
    ProblemListLoaded {
        problems: Vec<ProblemSummary>,
        from_cache: bool,
    },
    ProblemListFailed(String),
    /// User picked a problem.
    ProblemSelected(ProblemId),
    StatementLoaded {
        scope: RequestScope,
        statement: StatementData,
        from_cache: bool,
    },
    StatementFailed {
        scope: RequestScope,
        message: String,
    },
    /// User switched the editor language.
    LanguageChanged(LanguageKey),
    /// Editor content for the active language.
    CodeEdited(String),
    /// User typed into the stdin box.
    StdinEdited(String),
    /// Run the current code once against the stdin box.
    RunClicked,
    RunFinished {
        scope: RequestScope,
        output: Result<String, String>,
    },
    /// Run the current code against every sample.
    RunSamplesClicked,
    SamplesFinished {
        scope: RequestScope,
        outcome: SampleRunOutcome,
    },
    /// User picked a sample result to inspect.
    SampleSelected(usize),
    /// User toggled the statement language.
    StatementLanguageChanged(StatementLang),
    TranslationLoaded {
        scope: RequestScope,
        lang: StatementLang,
        html: String,
        from_cache: bool,
    },
    TranslationFailed {
        scope: RequestScope,
        message: String,
    },
    TranslationSupportChecked(Result<TranslationSupportStatus, String>),
    /// User clicked "install translation support".
    InstallRequested,
    InstallAcknowledged(Result<TranslationInstallState, String>),
    /// One poll tick of the install task.
    InstallPolled(Result<TranslationInstallState, String>),
}
