//! Ordered-choice token scanner.
//!
//! One scanner drives one decode call. It matches anchored token patterns
//! at the cursor (after skipping separator whitespace), requires a blank
//! or end-of-text after every token, and tracks the expected-token set at
//! the furthest offset reached for the `err_msg` diagnostic. Backtracking
//! is explicit: productions save the cursor with `mark` and restore it
//! with `reset` when an alternative does not pan out.

use iwxxm_common::Span;

use crate::tokens::TokenDef;

/// One successful token match.
#[derive(Debug, Clone)]
pub(crate) struct Token {
    pub text: String,
    pub span: Span,
    pub start: usize,
    pub end: usize,
}

pub(crate) struct Scanner<'a> {
    input: &'a str,
    pos: usize,
    max_pos: usize,
    expected: Vec<&'static str>,
    /// Byte ranges of tokens that produced a record entry; consumed by
    /// the FMH-1 white-out post-pass.
    recorded: Vec<(usize, usize)>,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Scanner {
            input,
            pos: 0,
            max_pos: 0,
            expected: Vec::new(),
            recorded: Vec::new(),
        }
    }

    pub fn input(&self) -> &'a str {
        self.input
    }

    fn skip_separators(&mut self) {
        while self.pos < self.input.len()
            && self.input.as_bytes()[self.pos].is_ascii_whitespace()
        {
            self.pos += 1;
        }
    }

    pub fn at_end(&mut self) -> bool {
        self.skip_separators();
        self.pos >= self.input.len()
    }

    pub fn mark(&self) -> usize {
        self.pos
    }

    pub fn reset(&mut self, mark: usize) {
        self.pos = mark;
    }

    /// Try one token at the cursor. On success the cursor advances past
    /// the match and the expected set is cleared; on failure the token's
    /// description joins the expected set and the cursor stays put.
    pub fn accept(&mut self, token: &TokenDef) -> Option<Token> {
        self.skip_separators();
        let start = self.pos;
        if start > self.max_pos {
            self.max_pos = start;
        }

        let rest = &self.input[start..];
        let Some(m) = token.re.find(rest) else {
            self.miss(token.name);
            return None;
        };
        let end = start + m.end();
        if token.boundary && !self.boundary_ok(end) {
            self.miss(token.name);
            return None;
        }

        self.pos = end;
        self.expected.clear();
        if end > self.max_pos {
            self.max_pos = end;
        }
        Some(Token {
            text: m.as_str().to_string(),
            span: Span::from_offsets(self.input, start, end),
            start,
            end,
        })
    }

    fn boundary_ok(&self, end: usize) -> bool {
        match self.input.as_bytes().get(end) {
            None => true,
            Some(b) => b.is_ascii_whitespace(),
        }
    }

    fn miss(&mut self, name: &'static str) {
        if !self.expected.contains(&name) {
            self.expected.push(name);
        }
    }

    /// Note that a token's text produced a record entry. Unrecorded
    /// matches survive the white-out pass and surface as unparsed or
    /// observer-added text.
    pub fn record(&mut self, token: &Token) {
        self.recorded.push((token.start, token.end));
    }

    pub fn recorded_ranges(&self) -> &[(usize, usize)] {
        &self.recorded
    }

    /// Remove a token description from the expected set; used when a
    /// repeatable production has already been satisfied.
    pub fn forget_expected(&mut self, name: &str) {
        self.expected.retain(|n| *n != name);
    }

    /// Diagnostic for a decode that stopped early.
    pub fn err_msg(&self) -> String {
        if self.expected.is_empty() {
            format!("Unidentified group after position column {}.", self.max_pos)
        } else {
            format!(
                "Expecting {} group(s) after position column {}.",
                self.expected.join(" or "),
                self.max_pos
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::TokenDef;

    fn def(name: &'static str, pattern: &str) -> TokenDef {
        TokenDef::new(name, pattern)
    }

    #[test]
    fn test_accept_advances_over_separators() {
        let ident = def("ICAO Identifier", r"[A-Z][A-Z0-9]{3}");
        let mut sc = Scanner::new("  KORD 123456Z");
        let tok = sc.accept(&ident).unwrap();
        assert_eq!(tok.text, "KORD");
        assert_eq!(tok.span.begin.column, 2);
    }

    #[test]
    fn test_boundary_rejects_partial_word() {
        let vis = def("visibility in metres", r"[PM]?[/\d]{4}");
        let mut sc = Scanner::new("123456Z");
        assert!(sc.accept(&vis).is_none());
        assert_eq!(sc.mark(), 0);
    }

    #[test]
    fn test_expected_set_and_reset() {
        let a = def("wind", r"\d{5}KT");
        let b = def("CAVOK", r"CAVOK");
        let mut sc = Scanner::new("XXXX");
        assert!(sc.accept(&a).is_none());
        assert!(sc.accept(&b).is_none());
        assert_eq!(
            sc.err_msg(),
            "Expecting wind or CAVOK group(s) after position column 0."
        );
    }
}
