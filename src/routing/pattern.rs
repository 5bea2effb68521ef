//! Route pattern compilation and matching.
//!
//! # Responsibilities
//! - Compile a path template into typed segments
//! - Extract named parameters from a concrete path
//!
//! # Design Decisions
//! - All placeholder families (`<name>`, `<int:name>`, `<str:name>`) are
//!   recognized in one compilation pass, so patterns mixing families
//!   convert fully
//! - Matching is anchored: the whole path must match, segment for segment
//! - No regex; segment comparison guarantees O(n) matching

use crate::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};

/// The named parameters extracted from a matched path.
pub type PathParams = BTreeMap<String, String>;

/// The kind of value a placeholder accepts.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum ParamKind {
    /// `<name>`: any non-empty run without a path separator.
    Any,
    /// `<int:name>`: a non-empty digit run.
    Int,
    /// `<str:name>`: explicit alias of the untyped form.
    Str,
}

/// One compiled element of a route pattern.
#[derive(Debug, Clone, Eq, PartialEq)]
enum Segment {
    Literal(String),
    Param { name: String, kind: ParamKind },
}

/// A compiled route template.
///
/// A compiled pattern is a pure function from a path to an optional
/// parameter map: matching never mutates the pattern and identical inputs
/// yield identical outputs. Parameter names within one pattern are unique;
/// duplicates are rejected at compile time.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PathPattern {
    pattern: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile a path template.
    ///
    /// Placeholders must span a whole path segment. A single scan
    /// recognizes all three placeholder syntaxes, so `/a/<int:x>/<y>`
    /// compiles with both parameters typed correctly.
    pub fn compile(pattern: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut seen_names = BTreeSet::new();
        for raw in pattern.split('/') {
            let segment = compile_segment(pattern, raw)?;
            if let Segment::Param { name, .. } = &segment {
                if !seen_names.insert(name.clone()) {
                    return Err(Error::DuplicateParam {
                        pattern: pattern.to_string(),
                        name: name.clone(),
                    });
                }
            }
            segments.push(segment);
        }
        Ok(Self {
            pattern: pattern.to_string(),
            segments,
        })
    }

    /// The original template this pattern was compiled from.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Match a concrete path, extracting named parameters.
    ///
    /// The whole path must match; parameters never span a `/`. Returns
    /// `None` on any mismatch.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let mut params = PathParams::new();
        let mut actual_segments = path.split('/');
        for segment in &self.segments {
            let actual = actual_segments.next()?;
            match segment {
                Segment::Literal(literal) => {
                    if literal != actual {
                        return None;
                    }
                }
                Segment::Param { name, kind } => {
                    if actual.is_empty() {
                        return None;
                    }
                    if *kind == ParamKind::Int && !actual.bytes().all(|b| b.is_ascii_digit()) {
                        return None;
                    }
                    params.insert(name.clone(), actual.to_string());
                }
            }
        }
        // Anchored: trailing path segments are a mismatch.
        if actual_segments.next().is_some() {
            return None;
        }
        Some(params)
    }
}

fn compile_segment(pattern: &str, raw: &str) -> Result<Segment> {
    if let Some(inner) = raw.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
        // One scan distinguishes the typed families from the untyped form.
        let (kind, name) = if let Some(name) = inner.strip_prefix("int:") {
            (ParamKind::Int, name)
        } else if let Some(name) = inner.strip_prefix("str:") {
            (ParamKind::Str, name)
        } else {
            (ParamKind::Any, inner)
        };
        if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
            return Err(Error::InvalidPattern {
                pattern: pattern.to_string(),
                reason: format!("invalid parameter name {name:?}"),
            });
        }
        Ok(Segment::Param {
            name: name.to_string(),
            kind,
        })
    } else if raw.contains('<') || raw.contains('>') {
        Err(Error::InvalidPattern {
            pattern: pattern.to_string(),
            reason: format!("segment {raw:?} mixes literal text and placeholder brackets"),
        })
    } else {
        Ok(Segment::Literal(raw.to_string()))
    }
}
