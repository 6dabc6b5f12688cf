//! Keyword-based question classification.
//!
//! Each outgoing question is classified into a response category that
//! selects the generation parameters for that turn. Classification is a
//! fixed rule table: case-insensitive substring matching against disjoint
//! keyword sets, tested in priority order. A question matching no set
//! resolves to the default category, which is not an error.

use std::fmt;

/// Keywords that mark a mathematics question.
const MATH_KEYWORDS: &[&str] = &["math", "derive", "solve", "equation"];

/// Keywords that mark a programming question.
const CODE_KEYWORDS: &[&str] = &["code", "program", "debug", "algorithm"];

/// Keywords that mark a request for explanation.
const DETAILED_KEYWORDS: &[&str] = &["explain", "why", "how", "mechanism"];

/// The response category assigned to a question.
///
/// Categories are tested in declaration order and the first match wins,
/// so a question containing both a math and a code keyword classifies as
/// math. This tie-break is deliberate policy, not an accident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryLabel {
    /// Mathematics: low temperature, short working.
    Math,
    /// Programming: lowest temperature, room for code.
    Code,
    /// Explanation requested: warmer, longest cap.
    Detailed,
    /// Everything else.
    Default,
}

/// Generation parameters selected for a classified question.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenParams {
    /// Sampling temperature in [0, 1].
    pub temperature: f32,
    /// Cap on generated tokens.
    pub max_tokens: u32,
}

impl QueryLabel {
    /// Returns the fixed parameter tuple for this label.
    pub fn params(self) -> GenParams {
        match self {
            QueryLabel::Math => GenParams {
                temperature: 0.2,
                max_tokens: 300,
            },
            QueryLabel::Code => GenParams {
                temperature: 0.1,
                max_tokens: 400,
            },
            QueryLabel::Detailed => GenParams {
                temperature: 0.4,
                max_tokens: 500,
            },
            QueryLabel::Default => GenParams {
                temperature: 0.3,
                max_tokens: 200,
            },
        }
    }

    /// Returns the keyword set for this label, empty for the default.
    fn keywords(self) -> &'static [&'static str] {
        match self {
            QueryLabel::Math => MATH_KEYWORDS,
            QueryLabel::Code => CODE_KEYWORDS,
            QueryLabel::Detailed => DETAILED_KEYWORDS,
            QueryLabel::Default => &[],
        }
    }
}

impl fmt::Display for QueryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryLabel::Math => write!(f, "math"),
            QueryLabel::Code => write!(f, "code"),
            QueryLabel::Detailed => write!(f, "detailed"),
            QueryLabel::Default => write!(f, "default"),
        }
    }
}

/// Classifies a question and returns its label and generation parameters.
///
/// Pure and deterministic. The caller guarantees a non-empty question;
/// empty input simply classifies as default here and is rejected upstream.
pub fn classify(question: &str) -> (QueryLabel, GenParams) {
    let lowered = question.to_lowercase();
    for label in [QueryLabel::Math, QueryLabel::Code, QueryLabel::Detailed] {
        if label.keywords().iter().any(|kw| lowered.contains(kw)) {
            return (label, label.params());
        }
    }
    (QueryLabel::Default, QueryLabel::Default.params())
}
