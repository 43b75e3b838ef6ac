//! Placeholder substitution engine
//!
//! Rewrites a text file by replacing literal `REPLACE_ME_<NAME>` tokens with
//! discovered values. Bindings are applied in order and each one only scans
//! text that came from the source file: a value inserted by an earlier binding
//! is never searched for later tokens.
//!
//! ```rust
//! use webgen::template::{apply, Binding};
//!
//! let bindings = [
//!     Binding::found("REPLACE_ME_REGION", "us-east-1"),
//!     Binding::missing("REPLACE_ME_USER_POOL_ID"),
//! ];
//! let out = apply(&bindings, "url=REPLACE_ME_REGION;id=REPLACE_ME_USER_POOL_ID");
//! assert_eq!(out.text, "url=us-east-1;id=NOT_FOUND");
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::{Result, WebgenError};

/// Written in place of a token whose value could not be discovered
pub const SENTINEL: &str = "NOT_FOUND";

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^REPLACE_ME_[A-Za-z0-9_]+$").expect("placeholder regex is valid")
});

/// An ordered (token, value-or-absent) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub token: String,
    pub value: Option<String>,
}

impl Binding {
    pub fn new(token: impl Into<String>, value: impl Into<Option<String>>) -> Self {
        Self {
            token: token.into(),
            value: value.into(),
        }
    }

    pub fn found(token: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(token, Some(value.into()))
    }

    pub fn missing(token: impl Into<String>) -> Self {
        Self::new(token, None)
    }

    /// Text that replaces the token: the value, or [`SENTINEL`] when absent
    pub fn replacement(&self) -> &str {
        self.value.as_deref().unwrap_or(SENTINEL)
    }

    /// Parse a `TOKEN=VALUE` command-line binding
    pub fn parse_assignment(raw: &str) -> Result<Self> {
        let (token, value) = raw.split_once('=').ok_or_else(|| WebgenError::InvalidBinding {
            raw: raw.to_string(),
        })?;
        validate_token(token)?;
        Ok(Self::found(token, value))
    }
}

/// Check that a token has the `REPLACE_ME_<NAME>` shape
pub fn validate_token(token: &str) -> Result<()> {
    if PLACEHOLDER_RE.is_match(token) {
        Ok(())
    } else {
        Err(WebgenError::InvalidPlaceholder {
            token: token.to_string(),
        })
    }
}

/// Occurrences replaced for one binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenCount {
    pub token: String,
    pub count: usize,
    /// The sentinel was written instead of a value
    pub sentinel: bool,
}

/// Result of applying bindings to an in-memory text
#[derive(Debug, Clone)]
pub struct Substituted {
    pub text: String,
    pub counts: Vec<TokenCount>,
}

/// Result of rewriting one file
#[derive(Debug, Clone)]
pub struct SubstitutionReport {
    pub target: PathBuf,
    pub counts: Vec<TokenCount>,
}

impl SubstitutionReport {
    pub fn total(&self) -> usize {
        self.counts.iter().map(|c| c.count).sum()
    }
}

enum Segment {
    Original(String),
    Inserted(String),
}

/// Apply bindings in order to `text`
///
/// Empty tokens are skipped.
pub fn apply(bindings: &[Binding], text: &str) -> Substituted {
    let mut segments = vec![Segment::Original(text.to_string())];
    let mut counts = Vec::with_capacity(bindings.len());

    for binding in bindings {
        let token = binding.token.as_str();
        let mut count = 0;

        if !token.is_empty() {
            let replacement = binding.replacement();
            let mut next = Vec::with_capacity(segments.len());

            for segment in segments {
                let original = match segment {
                    Segment::Original(s) => s,
                    inserted @ Segment::Inserted(_) => {
                        next.push(inserted);
                        continue;
                    }
                };

                let mut rest = original.as_str();
                while let Some(idx) = rest.find(token) {
                    if idx > 0 {
                        next.push(Segment::Original(rest[..idx].to_string()));
                    }
                    next.push(Segment::Inserted(replacement.to_string()));
                    count += 1;
                    rest = &rest[idx + token.len()..];
                }
                if !rest.is_empty() {
                    next.push(Segment::Original(rest.to_string()));
                }
            }

            segments = next;
        }

        counts.push(TokenCount {
            token: binding.token.clone(),
            count,
            sentinel: binding.value.is_none(),
        });
    }

    let text = segments
        .into_iter()
        .map(|s| match s {
            Segment::Original(s) | Segment::Inserted(s) => s,
        })
        .collect();

    Substituted { text, counts }
}

/// Read `source`, apply `bindings`, write the result to `dest`
///
/// `dest` is overwritten. Tokens that do not occur are not an error.
/// A failed write may leave `dest` truncated.
pub fn substitute(bindings: &[Binding], source: &Path, dest: &Path) -> Result<SubstitutionReport> {
    let text = fs::read_to_string(source).map_err(|source_err| WebgenError::FileRead {
        path: source.to_path_buf(),
        source: source_err,
    })?;

    let substituted = apply(bindings, &text);

    fs::write(dest, substituted.text).map_err(|source_err| WebgenError::FileWrite {
        path: dest.to_path_buf(),
        source: source_err,
    })?;

    for c in &substituted.counts {
        debug!(
            token = %c.token,
            count = c.count,
            sentinel = c.sentinel,
            file = %dest.display(),
            "substituted placeholder"
        );
    }

    Ok(SubstitutionReport {
        target: dest.to_path_buf(),
        counts: substituted.counts,
    })
}
