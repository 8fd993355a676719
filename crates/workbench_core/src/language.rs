use std::fmt;

use serde::{Deserialize, Serialize};

const CPP_TEMPLATE: &str = "#include <bits/stdc++.h>
using namespace std;

int main() {
    ios::sync_with_stdio(false);
    cin.tie(nullptr);

    return 0;
}
";

const PYTHON_TEMPLATE: &str = "import sys


def main():
    data = sys.stdin.read().split()


if __name__ == \"__main__\":
    main()
";

const JAVASCRIPT_TEMPLATE: &str = "const data = require(\"fs\").readFileSync(0, \"utf8\").trim().split(/\\s+/);
";

/// Languages the workbench can hold drafts for and execute.
///
/// Declaration order is the configured order; the first entry is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LanguageKey {
    #[serde(rename = "cpp")]
    Cpp,
    #[serde(rename = "py")]
    Python,
    #[serde(rename = "js")]
    JavaScript,
}

impl LanguageKey {
    pub const ALL: [LanguageKey; 3] = [LanguageKey::Cpp, LanguageKey::Python, LanguageKey::JavaScript];

    pub fn first() -> Self {
        Self::ALL[0]
    }

    /// Short key used in persisted drafts and executor requests.
    pub fn key(self) -> &'static str {
        match self {
            LanguageKey::Cpp => "cpp",
            LanguageKey::Python => "py",
            LanguageKey::JavaScript => "js",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|lang| lang.key().eq_ignore_ascii_case(key.trim()))
    }

    pub fn template(self) -> &'static str {
        match self {
            LanguageKey::Cpp => CPP_TEMPLATE,
            LanguageKey::Python => PYTHON_TEMPLATE,
            LanguageKey::JavaScript => JAVASCRIPT_TEMPLATE,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            LanguageKey::Cpp => "C++17",
            LanguageKey::Python => "Python 3",
            LanguageKey::JavaScript => "JavaScript (Node)",
        }
    }
}

impl fmt::Display for LanguageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
