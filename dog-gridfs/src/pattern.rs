//! Ant-style resource patterns.
//!
//! A resource location is either a literal filename or a glob using the
//! path grammar below, with `/` as segment separator:
//!
//! | Syntax | Matches |
//! |--------|---------|
//! | `?`    | exactly one character other than `/` |
//! | `*`    | any run of characters within one segment |
//! | `**`   | any run of characters across segments |
//! | `a/**/b` | `a/b`, `a/x/b`, `a/x/y/b` |
//!
//! Brace alternation (`{a,b}`) is not part of the grammar and is rejected.
//! Patterns compile to an anchored regular expression that a GridFS-style
//! engine can evaluate server side.

use regex::Regex;

use crate::{GridFsError, GridFsResult};

/// Outcome of classifying a resource location
#[derive(Debug, Clone)]
pub enum ResourcePattern {
    /// No wildcard: resolved by exact filename lookup
    Literal(String),
    /// Wildcard pattern compiled once
    Pattern(GlobPattern),
}

impl ResourcePattern {
    /// Classify a location, compiling it when it carries wildcard syntax
    pub fn classify(location: &str) -> GridFsResult<Self> {
        if location.trim().is_empty() {
            return Err(GridFsError::invalid_pattern(location, "pattern must not be blank"));
        }

        if is_pattern(location) {
            GlobPattern::compile(location).map(Self::Pattern)
        } else {
            Ok(Self::Literal(location.to_string()))
        }
    }

    pub fn is_pattern(&self) -> bool {
        matches!(self, Self::Pattern(_))
    }
}

/// True if the location contains `*` or `?`
pub fn is_pattern(location: &str) -> bool {
    location.contains(['*', '?'])
}

/// A compiled glob and the engine-native expression it produced
#[derive(Debug, Clone)]
pub struct GlobPattern {
    source: String,
    regex: Regex,
}

impl GlobPattern {
    /// Compile an Ant-style pattern into an anchored regular expression
    pub fn compile(pattern: &str) -> GridFsResult<Self> {
        if let Some(brace) = pattern.find(['{', '}']) {
            return Err(GridFsError::invalid_pattern(
                pattern,
                format!("brace expressions are not supported (at offset {})", brace),
            ));
        }

        let expression = to_expression(pattern);
        let regex = Regex::new(&expression)
            .map_err(|e| GridFsError::invalid_pattern(pattern, e.to_string()))?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// The pattern as written by the caller
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Regular expression handed to the storage engine
    pub fn expression(&self) -> &str {
        self.regex.as_str()
    }

    /// Match a filename locally with the same semantics the engine applies
    pub fn is_match(&self, filename: &str) -> bool {
        self.regex.is_match(filename)
    }
}

impl std::fmt::Display for GlobPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

fn to_expression(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::from("^");
    let mut literal = String::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' if chars.get(i + 1) == Some(&'*') => {
                let start = i;
                while i < chars.len() && chars[i] == '*' {
                    i += 1;
                }
                let segment_start = start == 0 || chars[start - 1] == '/';
                let segment_end = i == chars.len() || chars[i] == '/';

                if segment_start && segment_end && i < chars.len() {
                    // `**/` may stand for zero directories
                    flush(&mut out, &mut literal);
                    out.push_str("(?:.*/)?");
                    i += 1;
                } else if segment_start && segment_end && start > 0 {
                    // trailing `/**` also matches the bare directory
                    literal.pop();
                    flush(&mut out, &mut literal);
                    out.push_str("(?:/.*)?");
                } else {
                    flush(&mut out, &mut literal);
                    out.push_str(".*");
                }
            }
            '*' => {
                flush(&mut out, &mut literal);
                out.push_str("[^/]*");
                i += 1;
            }
            '?' => {
                flush(&mut out, &mut literal);
                out.push_str("[^/]");
                i += 1;
            }
            c => {
                literal.push(c);
                i += 1;
            }
        }
    }

    flush(&mut out, &mut literal);
    out.push('$');
    out
}

fn flush(out: &mut String, literal: &mut String) {
    if !literal.is_empty() {
        out.push_str(&regex::escape(literal));
        literal.clear();
    }
}
