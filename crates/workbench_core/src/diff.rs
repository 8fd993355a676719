use crate::evaluate::normalize_output;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffRow {
    /// 1-based.
    pub line_number: usize,
    pub expected: String,
    pub got: String,
    pub matches: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineDiff {
    pub rows: Vec<DiffRow>,
    pub first_mismatch_line: Option<usize>,
}

impl LineDiff {
    pub fn has_mismatch(&self) -> bool {
        self.first_mismatch_line.is_some()
    }
}

/// Line-by-line comparison of expected and produced output.
///
/// Both sides are line-ending normalised and trailing-trimmed first; a side that
/// trims to nothing has zero lines. Missing lines compare as empty strings.
pub fn diff(expected: &str, got: &str) -> LineDiff {
    let expected_lines = split_lines(expected);
    let got_lines = split_lines(got);
    let row_count = expected_lines.len().max(got_lines.len());

    let mut rows = Vec::with_capacity(row_count);
    let mut first_mismatch_line = None;
    for i in 0..row_count {
        let expected = expected_lines.get(i).map(String::as_str).unwrap_or_default();
        let got = got_lines.get(i).map(String::as_str).unwrap_or_default();
        let matches = expected == got;
        if !matches && first_mismatch_line.is_none() {
            first_mismatch_line = Some(i + 1);
        }
        rows.push(DiffRow {
            line_number: i + 1,
            expected: expected.to_string(),
            got: got.to_string(),
            matches,
        });
    }

    LineDiff {
        rows,
        first_mismatch_line,
    }
}

fn split_lines(text: &str) -> Vec<String> {
    let normalized = normalize_output(text);
    if normalized.is_empty() {
        Vec::new()
    } else {
        normalized.split('\n').map(str::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::diff;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_and_whitespace_sides_have_no_rows() {
        let d = diff("  \n\n", "");
        assert!(d.rows.is_empty());
        assert_eq!(d.first_mismatch_line, None);
    }

    #[test]
    fn reports_first_mismatching_line() {
        let d = diff("1\n2\n3", "1\n9\n3");
        assert_eq!(d.rows.len(), 3);
        let matches: Vec<bool> = d.rows.iter().map(|r| r.matches).collect();
        assert_eq!(matches, vec![true, false, true]);
        assert_eq!(d.first_mismatch_line, Some(2));
        assert_eq!(d.rows[1].expected, "2");
        assert_eq!(d.rows[1].got, "9");
    }

    #[test]
    fn missing_lines_compare_as_empty() {
        let d = diff("1\n2\n", "1\r\n");
        assert_eq!(d.rows.len(), 2);
        assert_eq!(d.rows[1].expected, "2");
        assert_eq!(d.rows[1].got, "");
        assert_eq!(d.first_mismatch_line, Some(2));
    }

    #[test]
    fn empty_output_against_expected_mismatches_on_first_line() {
        let d = diff("YES\n", "");
        assert_eq!(d.rows.len(), 1);
        assert_eq!(d.first_mismatch_line, Some(1));
    }
}
