use std::collections::BTreeMap;

use crate::{
    LanguageKey, ProblemDraft, ProblemId, ProblemSummary, RequestScope, Sample, StatementData,
    StatementLang,
};

/// Work the controller asks the engine to perform. Results come back as `Msg`s.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Cache first, then the problem source.
    LoadProblemList,
    CacheProblemList(Vec<ProblemSummary>),
    /// Cache first, then the problem source.
    LoadStatement {
        scope: RequestScope,
        contest_id: u32,
        index: String,
    },
    CacheStatement {
        problem_id: ProblemId,
        statement: StatementData,
    },
    /// Cache first, then the translation backend.
    LoadTranslation {
        scope: RequestScope,
        lang: StatementLang,
        html: String,
    },
    CacheTranslation {
        problem_id: ProblemId,
        lang: StatementLang,
        html: String,
    },
    /// Full draft map; written on every draft mutation.
    PersistDrafts(BTreeMap<ProblemId, ProblemDraft>),
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
