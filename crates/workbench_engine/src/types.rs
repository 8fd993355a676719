use std::fmt;

use workbench_core::{
    ProblemSummary, RequestScope, SampleRunOutcome, StatementData, StatementLang,
    TranslationInstallState, TranslationSupportStatus,
};

/// Results delivered back to the controller, one per finished engine command.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    ProblemListLoaded {
        problems: Vec<ProblemSummary>,
        from_cache: bool,
    },
    ProblemListFailed(String),
    StatementLoaded {
        scope: RequestScope,
        statement: StatementData,
        from_cache: bool,
    },
    StatementFailed {
        scope: RequestScope,
        message: String,
    },
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
    RunFinished {
        scope: RequestScope,
        output: Result<String, String>,
    },
    SamplesFinished {
        scope: RequestScope,
        outcome: SampleRunOutcome,
    },
    TranslationSupportChecked(Result<TranslationSupportStatus, String>),
    InstallAcknowledged(Result<TranslationInstallState, String>),
    InstallPolled(Result<TranslationInstallState, String>),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    HttpStatus(u16),
    Timeout,
    Network,
    /// The source answered but the payload was not what we expected.
    UnexpectedPayload,
    StatementNotFound,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::UnexpectedPayload => write!(f, "unexpected payload"),
            FailureKind::StatementNotFound => write!(f, "problem statement not found"),
        }
    }
}
