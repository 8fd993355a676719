use serde::{Deserialize, Serialize};

/// Most recent install log lines kept in the state.
pub const MAX_INSTALL_LOGS: usize = 200;

/// Progress of the optional local translation install, as reported by the
/// installer. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationInstallState {
    pub active: bool,
    pub finished: bool,
    pub ready: bool,
    pub step: u8,
    pub total_steps: u8,
    pub phase: String,
    pub error: String,
    pub logs: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallPhase {
    Idle,
    Installing,
    Ready,
    Failed,
}

/// Answer of the readiness check for a language pair.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationSupportStatus {
    pub ready: bool,
    pub message: String,
}

impl Default for TranslationInstallState {
    fn default() -> Self {
        Self::idle()
    }
}

impl TranslationInstallState {
    pub fn idle() -> Self {
        Self {
            active: false,
            finished: false,
            ready: false,
            step: 0,
            total_steps: 0,
            phase: "Idle".to_string(),
            error: String::new(),
            logs: Vec::new(),
        }
    }

    /// Local placeholder between the install request and the installer's
    /// acknowledgement.
    pub fn requested() -> Self {
        Self {
            active: true,
            phase: "Preparing install".to_string(),
            ..Self::idle()
        }
    }

    pub fn phase_kind(&self) -> InstallPhase {
        if self.active {
            InstallPhase::Installing
        } else if self.finished && self.ready {
            InstallPhase::Ready
        } else if self.finished {
            InstallPhase::Failed
        } else {
            InstallPhase::Idle
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.phase_kind(), InstallPhase::Ready | InstallPhase::Failed)
    }

    /// The poll request itself failed; the install is over from our side.
    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.active = false;
        self.finished = true;
        self.ready = false;
        self.phase = "Install failed".to_string();
        self.push_log(format!("Error: {message}"));
        self.error = message;
    }

    pub fn enter_step(&mut self, step: u8, total_steps: u8, phase: impl Into<String>) {
        self.active = true;
        self.finished = false;
        self.step = step;
        self.total_steps = total_steps;
        self.phase = phase.into();
        self.error.clear();
    }

    pub fn succeed(&mut self, message: impl Into<String>) {
        self.active = false;
        self.finished = true;
        self.ready = true;
        self.step = self.total_steps;
        self.phase = "Ready".to_string();
        self.error.clear();
        self.push_log(message);
    }

    pub fn push_log(&mut self, line: impl Into<String>) {
        self.logs.push(line.into());
        if self.logs.len() > MAX_INSTALL_LOGS {
            let drop_count = self.logs.len() - MAX_INSTALL_LOGS;
            self.logs.drain(0..drop_count);
        }
    }

    pub fn progress_label(&self) -> String {
        if self.total_steps == 0 {
            self.phase.clone()
        } else {
            format!("{} ({}/{})", self.phase, self.step, self.total_steps)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_kind_follows_flags() {
        let mut state = TranslationInstallState::idle();
        assert_eq!(state.phase_kind(), InstallPhase::Idle);

        state = TranslationInstallState::requested();
        assert_eq!(state.phase_kind(), InstallPhase::Installing);

        state.fail("pip exited with 1");
        assert_eq!(state.phase_kind(), InstallPhase::Failed);
        assert!(state.finished);
        assert!(!state.active);
        assert_eq!(state.error, "pip exited with 1");
        assert_eq!(state.logs.last().map(String::as_str), Some("Error: pip exited with 1"));
    }

    #[test]
    fn logs_are_capped() {
        let mut state = TranslationInstallState::idle();
        for i in 0..(MAX_INSTALL_LOGS + 5) {
            state.push_log(format!("line {i}"));
        }
        assert_eq!(state.logs.len(), MAX_INSTALL_LOGS);
        assert_eq!(state.logs[0], "line 5");
    }

    #[test]
    fn partial_poll_payload_deserializes_with_defaults() {
        let state: TranslationInstallState =
            serde_json::from_str(r#"{"active":true,"step":2,"total_steps":3}"#).unwrap();
        assert!(state.active);
        assert_eq!(state.step, 2);
        assert_eq!(state.phase, "Idle");
        assert!(state.logs.is_empty());
    }
}
