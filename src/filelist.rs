//! File-selection filter compiled from a user-supplied list file
//!
//! Each non-empty line of the list file becomes exactly one filter entry:
//! the line is first tried as a case-insensitive regular expression, and on
//! any compilation failure it is kept as a literal path to be matched
//! verbatim. A path passes the filter when ANY entry matches it; entry
//! order does not affect the outcome.

use crate::error::Result;
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::debug;

/// One compiled filter rule
///
/// Classification is best-effort, not validation: a literal path that
/// happens to be a valid regular expression (e.g. one containing `.` or
/// `+`) is classified as a pattern and matched as such.
#[derive(Debug, Clone)]
pub enum FilterEntry {
    /// Verbatim path match
    Literal(String),
    /// Case-insensitive compiled regular expression
    Pattern(Regex),
}

impl FilterEntry {
    /// Classify one line of the filter source
    pub fn classify(line: &str) -> FilterEntry {
        // Size limit guards against ReDoS via large compiled DFAs
        match regex::RegexBuilder::new(line)
            .case_insensitive(true)
            .size_limit(1024 * 1024)
            .build()
        {
            Ok(re) => FilterEntry::Pattern(re),
            Err(e) => {
                debug!("filter line '{}' kept as literal: {}", line, e);
                FilterEntry::Literal(line.to_string())
            }
        }
    }
}

/// Compiled file-selection filter
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    /// Lines that did not compile as regular expressions, matched verbatim
    literals: HashSet<String>,
    /// Lines that compiled, matched as case-insensitive patterns
    patterns: Vec<Regex>,
}

impl FileFilter {
    /// Compile the filter file at `path`
    ///
    /// The whole file is read and split on CR/LF; empty lines are dropped.
    /// An unreadable file is an error the caller is expected to downgrade
    /// to a warning, proceeding without a filter.
    pub fn compile(path: impl AsRef<Path>) -> Result<FileFilter> {
        let data = fs::read_to_string(path)?;
        Ok(Self::from_source(&data))
    }

    /// Compile filter entries from in-memory source text
    pub fn from_source(source: &str) -> FileFilter {
        let mut filter = FileFilter::default();
        for line in source.split(['\r', '\n']).filter(|l| !l.is_empty()) {
            match FilterEntry::classify(line) {
                FilterEntry::Literal(lit) => {
                    filter.literals.insert(lit);
                }
                FilterEntry::Pattern(re) => filter.patterns.push(re),
            }
        }
        filter
    }

    /// True if `path` matches any entry of the filter
    pub fn matches(&self, path: &str) -> bool {
        self.literals.contains(path) || self.patterns.iter().any(|re| re.is_match(path))
    }

    /// Number of compiled entries (literals plus patterns)
    pub fn len(&self) -> usize {
        self.literals.len() + self.patterns.len()
    }

    /// True if the filter has no entries
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty() && self.patterns.is_empty()
    }
}
