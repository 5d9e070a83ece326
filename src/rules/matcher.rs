//! Wildcard rule matching.
//!
//! # Responsibilities
//! - Match a string against a shell-glob pattern (`*` = any run of characters)
//! - Match a set of needles against an ordered rule list
//!
//! # Design Decisions
//! - Matching is case-sensitive; callers lower-case both sides if they need otherwise
//! - `*` crosses `/` boundaries, so `/blog/*` covers nested paths
//! - No regex to guarantee O(n·m) matching without compilation

/// A single compiled wildcard pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    raw: String,
}

impl Pattern {
    /// Create a new pattern.
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// Returns true if the whole of `value` matches this pattern.
    pub fn matches(&self, value: &str) -> bool {
        if self.raw == value {
            return true;
        }
        wildcard_match(self.raw.as_bytes(), value.as_bytes())
    }
}

/// An ordered list of patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleList {
    patterns: Vec<Pattern>,
}

impl RuleList {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Pattern::new).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Returns true if any needle matches any pattern.
    ///
    /// An empty list matches nothing; callers that treat an empty list as
    /// "no restriction" must check [`RuleList::is_empty`] first.
    pub fn is_listed<S: AsRef<str>>(&self, needles: &[S]) -> bool {
        self.patterns
            .iter()
            .any(|pattern| needles.iter().any(|needle| pattern.matches(needle.as_ref())))
    }
}

/// Iterative glob match with single-star backtracking.
fn wildcard_match(pattern: &[u8], value: &[u8]) -> bool {
    let (mut p, mut v) = (0, 0);
    // Position of the last `*` seen and the value index it is currently absorbing up to.
    let mut star: Option<(usize, usize)> = None;

    while v < value.len() {
        if p < pattern.len() && pattern[p] == b'*' {
            star = Some((p, v));
            p += 1;
        } else if p < pattern.len() && pattern[p] == value[v] {
            p += 1;
            v += 1;
        } else if let Some((star_p, star_v)) = star {
            p = star_p + 1;
            v = star_v + 1;
            star = Some((star_p, star_v + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|&b| b == b'*')
}
