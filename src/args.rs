//! Argument table over the raw command-line tokens
//!
//! Flags are located by a linear case-insensitive scan for an exact token
//! match; the flag's value, if any, is the following token. Lookups never
//! fail: a missing flag, a flag with no following token, or a value that
//! does not parse all yield the caller's default. Mandatory flags are
//! checked explicitly during configuration assembly, not here.

use std::str::FromStr;

/// Immutable view over the raw token list with positional flag lookup
#[derive(Debug, Clone)]
pub struct ArgList {
    tokens: Vec<String>,
}

impl ArgList {
    /// Wrap a token list (typically `std::env::args().skip(1)`)
    pub fn new(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    /// Number of tokens in the list
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// True if the token list is empty
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Position of `flag` in the token list, or `None` if absent
    ///
    /// Comparison is case-insensitive on the whole token.
    pub fn index_of(&self, flag: &str) -> Option<usize> {
        self.tokens.iter().position(|t| t.eq_ignore_ascii_case(flag))
    }

    /// True if `flag` appears anywhere in the token list
    pub fn has(&self, flag: &str) -> bool {
        self.index_of(flag).is_some()
    }

    /// Value of `flag` parsed as `T`, or `default` if the flag is absent,
    /// is the last token, or its value fails to parse
    pub fn get<T: FromStr>(&self, flag: &str, default: T) -> T {
        self.get_opt(flag).unwrap_or(default)
    }

    /// Value of `flag` parsed as `T`, or `None` under the same conditions
    /// that make [`ArgList::get`] fall back to its default
    pub fn get_opt<T: FromStr>(&self, flag: &str) -> Option<T> {
        let index = self.index_of(flag)?;
        let value = self.tokens.get(index + 1)?;
        value.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(tokens: &[&str]) -> ArgList {
        ArgList::new(tokens.iter().map(|t| t.to_string()).collect())
    }

    #[test]
    fn test_has_is_case_insensitive() {
        let a = args(&["-app", "440", "-MANIFEST-ONLY"]);
        assert!(a.has("-app"));
        assert!(a.has("-APP"));
        assert!(a.has("-manifest-only"));
        assert!(!a.has("-depot"));
    }

    #[test]
    fn test_has_matches_whole_token_only() {
        let a = args(&["-application"]);
        assert!(!a.has("-app"));
    }

    #[test]
    fn test_get_parses_following_token() {
        let a = args(&["-app", "440", "-manifest", "12345678901234567890"]);
        assert_eq!(a.get::<u32>("-app", 0), 440);
        assert_eq!(a.get::<u64>("-manifest", 0), 12345678901234567890);
    }

    #[test]
    fn test_get_returns_default_when_flag_absent() {
        let a = args(&["-app", "440"]);
        assert_eq!(a.get::<i32>("-cellid", -1), -1);
    }

    #[test]
    fn test_get_returns_default_when_flag_is_last_token() {
        let a = args(&["-app", "440", "-depot"]);
        assert_eq!(a.get::<u32>("-depot", 7), 7);
    }

    #[test]
    fn test_get_returns_default_on_conversion_failure() {
        let a = args(&["-app", "not-a-number"]);
        assert_eq!(a.get::<u32>("-app", 99), 99);
    }

    #[test]
    fn test_get_opt_none_cases() {
        let a = args(&["-depot", "abc", "-dir"]);
        assert_eq!(a.get_opt::<u32>("-app"), None);
        assert_eq!(a.get_opt::<u32>("-depot"), None);
        assert_eq!(a.get_opt::<String>("-dir"), None);
    }

    #[test]
    fn test_get_opt_string_value() {
        let a = args(&["-branch", "beta-ssc"]);
        assert_eq!(a.get_opt::<String>("-branch").as_deref(), Some("beta-ssc"));
    }

    #[test]
    fn test_lookup_does_not_mutate() {
        let a = args(&["-app", "440"]);
        let before = a.tokens.clone();
        let _ = a.has("-app");
        let _ = a.get::<u32>("-app", 0);
        assert_eq!(a.tokens, before);
    }
}
