use crate::diff::{diff, LineDiff};
use crate::Sample;

/// `\r\n` to `\n`, then trailing whitespace removed. Leading and internal
/// whitespace is significant.
pub fn normalize_output(text: &str) -> String {
    text.replace("\r\n", "\n").trim_end().to_string()
}

/// Pass criterion for a sample.
pub fn outputs_match(expected: &str, got: &str) -> bool {
    normalize_output(expected) == normalize_output(got)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleResult {
    pub index: usize,
    pub input: String,
    pub expected: String,
    pub got: String,
    pub ok: bool,
    pub error: String,
}

impl SampleResult {
    /// Builds the result for one executed sample. An executor failure is recorded
    /// as a failed sample with empty output.
    pub fn evaluate(index: usize, sample: &Sample, outcome: Result<String, String>) -> Self {
        match outcome {
            Ok(got) => Self {
                index,
                input: sample.input.clone(),
                expected: sample.output.clone(),
                ok: outputs_match(&sample.output, &got),
                got,
                error: String::new(),
            },
            Err(error) => Self {
                index,
                input: sample.input.clone(),
                expected: sample.output.clone(),
                got: String::new(),
                ok: false,
                error,
            },
        }
    }

    pub fn is_error(&self) -> bool {
        !self.error.is_empty()
    }

    /// Line diff, only for a failing result that actually produced output.
    pub fn diff(&self) -> Option<LineDiff> {
        if self.ok || self.is_error() {
            return None;
        }
        Some(diff(&self.expected, &self.got))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleRun {
    pub results: Vec<SampleResult>,
    pub passed_count: usize,
    /// Cursor: first failing sample, else the first sample.
    pub selected: usize,
}

impl SampleRun {
    pub fn from_results(results: Vec<SampleResult>) -> Self {
        let passed_count = results.iter().filter(|r| r.ok).count();
        let selected = results.iter().position(|r| !r.ok).unwrap_or(0);
        Self {
            results,
            passed_count,
            selected,
        }
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn all_passed(&self) -> bool {
        self.passed_count == self.results.len()
    }

    pub fn selected_result(&self) -> Option<&SampleResult> {
        self.results.get(self.selected)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleRunOutcome {
    /// The problem has no samples; nothing was executed.
    NoSamples,
    Completed(SampleRun),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparison_ignores_trailing_whitespace_and_crlf_only() {
        assert!(outputs_match("3\n", "3"));
        assert!(outputs_match("3 \n", "3\n"));
        assert!(outputs_match("1\r\n2\r\n", "1\n2"));
        assert!(!outputs_match("3  4", "3 4"));
        assert!(!outputs_match(" 3", "3"));
    }

    #[test]
    fn executor_failure_is_recorded_as_error() {
        let sample = Sample::new("1\n", "2\n");
        let result = SampleResult::evaluate(0, &sample, Err("Time limit exceeded (2s)".into()));
        assert!(!result.ok);
        assert_eq!(result.got, "");
        assert_eq!(result.error, "Time limit exceeded (2s)");
        assert_eq!(result.diff(), None);
    }

    #[test]
    fn cursor_moves_to_first_failure() {
        let sample = Sample::new("", "x");
        let run = SampleRun::from_results(vec![
            SampleResult::evaluate(0, &sample, Ok("x".into())),
            SampleResult::evaluate(1, &sample, Ok("y".into())),
            SampleResult::evaluate(2, &sample, Ok("z".into())),
        ]);
        assert_eq!(run.passed_count, 1);
        assert_eq!(run.selected, 1);
        assert!(!run.all_passed());
    }
}
