//! Import specifier scanner.
//!
//! Scans JavaScript/TypeScript source code for import/require specifiers
//! without full parsing. Only string-literal specifiers are reported; a
//! template literal with `${` interpolation is a computed import and is skipped.
//!
//! Strings, template literals, regex literals and comments are skipped so
//! their contents never produce or hide imports. Code inside `${ ... }`
//! interpolations is scanned like any other code.

use std::collections::HashSet;

/// Import kind constants.
pub mod kinds {
    pub const ESM_IMPORT: &str = "esm_import";
    pub const ESM_EXPORT: &str = "esm_export";
    pub const DYNAMIC_IMPORT: &str = "dynamic_import";
    pub const CJS_REQUIRE: &str = "cjs_require";
}

/// Import specifier found in source code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    /// Specifier exactly as found.
    pub raw: String,
    /// Kind of import (one of the [`kinds`] constants).
    pub kind: &'static str,
    /// Line number (1-indexed, best-effort).
    pub line: u32,
}

/// Scan source code for import/require specifiers.
///
/// Returns discovered imports in first-appearance order, deduplicated by `raw`.
#[must_use]
pub fn scan_imports(source: &str) -> Vec<ImportSpec> {
    let mut scanner = Scanner::new(source);
    let mut results = Vec::new();
    let mut seen = HashSet::new();

    while let Some((raw, kind, line)) = scanner.next_specifier() {
        if !raw.is_empty() && seen.insert(raw.clone()) {
            results.push(ImportSpec { raw, kind, line });
        }
    }

    results
}

/// Maximum distance to look ahead for a `from` clause.
const STATEMENT_LOOKAHEAD: usize = 1000;

/// Punctuators after which a `/` starts a regex literal rather than a division.
const REGEX_PRECEDERS: &[char] = &[
    '(', ',', '=', ':', '[', '!', '&', '|', '?', '{', '}', ';', '+', '-', '*', '%', '<', '>',
    '~', '^',
];

/// Keywords after which a `/` starts a regex literal.
const REGEX_KEYWORDS: &[&str] = &[
    "return",
    "typeof",
    "instanceof",
    "in",
    "of",
    "new",
    "delete",
    "void",
    "throw",
    "case",
    "do",
    "else",
    "yield",
    "await",
];

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

struct Scanner {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    /// Current `{` nesting depth in code.
    depth: usize,
    /// Depths at which open `${` interpolations return to their template literal.
    templates: Vec<usize>,
}

impl Scanner {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            depth: 0,
            templates: Vec::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) {
        if self.peek() == Some('\n') {
            self.line += 1;
        }
        self.pos += 1;
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    /// Advance to the next reportable specifier.
    fn next_specifier(&mut self) -> Option<(String, &'static str, u32)> {
        while let Some(c) = self.peek() {
            match c {
                '/' if self.peek_at(1) == Some('/') => self.skip_line_comment(),
                '/' if self.peek_at(1) == Some('*') => self.skip_block_comment(),
                '/' if self.regex_allowed() => self.skip_regex(),
                '"' | '\'' => {
                    // Skip over ordinary strings so keywords inside them are ignored
                    let _ = self.read_string();
                }
                '`' => {
                    self.pos += 1;
                    self.skip_template();
                }
                '{' => {
                    self.depth += 1;
                    self.pos += 1;
                }
                '}' => {
                    self.pos += 1;
                    self.depth = self.depth.saturating_sub(1);
                    if self.templates.last() == Some(&self.depth) {
                        self.templates.pop();
                        self.skip_template();
                    }
                }
                _ if self.at_keyword("import") => {
                    let start = self.pos;
                    self.pos += "import".len();
                    if let Some(found) = self.scan_import() {
                        return Some(found);
                    }
                    self.pos = start + 1;
                }
                _ if self.at_keyword("export") => {
                    let start = self.pos;
                    self.pos += "export".len();
                    if let Some(found) = self.scan_export_from() {
                        return Some(found);
                    }
                    self.pos = start + 1;
                }
                _ if self.at_keyword("require") => {
                    let start = self.pos;
                    self.pos += "require".len();
                    if let Some(found) = self.scan_require() {
                        return Some(found);
                    }
                    self.pos = start + 1;
                }
                _ => self.bump(),
            }
        }
        None
    }

    fn skip_line_comment(&mut self) {
        while self.peek().is_some_and(|c| c != '\n') {
            self.pos += 1;
        }
    }

    fn skip_block_comment(&mut self) {
        self.pos += 2;
        while let Some(c) = self.peek() {
            if c == '*' && self.peek_at(1) == Some('/') {
                self.pos += 2;
                return;
            }
            self.bump();
        }
    }

    /// Skip template literal text up to the closing backtick or the next `${`.
    ///
    /// The cursor starts just inside the literal (after the opening backtick
    /// or after the `}` closing an interpolation). On `${` the interpolation
    /// depth is recorded and scanning returns to code.
    fn skip_template(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                '\\' => {
                    self.pos += 1;
                    if self.peek().is_some() {
                        self.bump();
                    }
                }
                '`' => {
                    self.pos += 1;
                    return;
                }
                '$' if self.peek_at(1) == Some('{') => {
                    self.pos += 2;
                    self.templates.push(self.depth);
                    self.depth += 1;
                    return;
                }
                _ => self.bump(),
            }
        }
    }

    /// Whether a `/` at the cursor begins a regex literal, judged by the preceding token.
    fn regex_allowed(&self) -> bool {
        let mut i = self.pos;
        while i > 0 && self.chars[i - 1].is_whitespace() {
            i -= 1;
        }
        if i == 0 {
            return true;
        }

        let prev = self.chars[i - 1];
        if REGEX_PRECEDERS.contains(&prev) {
            return true;
        }
        if !is_ident_char(prev) {
            return false;
        }

        let end = i;
        while i > 0 && is_ident_char(self.chars[i - 1]) {
            i -= 1;
        }
        let word: String = self.chars[i..end].iter().collect();
        REGEX_KEYWORDS.contains(&word.as_str())
    }

    /// Skip `/pattern/flags`, honoring escapes and `[...]` classes.
    fn skip_regex(&mut self) {
        self.pos += 1;
        let mut in_class = false;
        while let Some(c) = self.peek() {
            match c {
                // Unterminated; resume scanning on the next line
                '\n' => return,
                '\\' => {
                    self.pos += 1;
                    if self.peek().is_some_and(|c| c != '\n') {
                        self.pos += 1;
                    }
                }
                '[' => {
                    in_class = true;
                    self.pos += 1;
                }
                ']' => {
                    in_class = false;
                    self.pos += 1;
                }
                '/' if !in_class => {
                    self.pos += 1;
                    while self.peek().is_some_and(is_ident_char) {
                        self.pos += 1;
                    }
                    return;
                }
                _ => self.pos += 1,
            }
        }
    }

    /// Check for `keyword` at the cursor with identifier boundaries on both sides.
    fn at_keyword(&self, keyword: &str) -> bool {
        if self.pos > 0 {
            let prev = self.chars[self.pos - 1];
            // `foo.require(...)` and `obj.import` are member accesses
            if is_ident_char(prev) || prev == '.' {
                return false;
            }
        }

        let mut len = 0;
        for (j, k) in keyword.chars().enumerate() {
            if self.peek_at(j) != Some(k) {
                return false;
            }
            len += 1;
        }

        !self.peek_at(len).is_some_and(is_ident_char)
    }

    /// Read a quoted literal at the cursor.
    ///
    /// Returns `None` for a template literal containing `${`, or when the
    /// cursor is not at a quote.
    fn read_string(&mut self) -> Option<String> {
        let quote = self.peek()?;
        if !matches!(quote, '"' | '\'' | '`') {
            return None;
        }
        self.pos += 1;

        let mut value = String::new();
        let mut interpolated = false;
        while let Some(c) = self.peek() {
            if c == quote {
                self.pos += 1;
                return (!interpolated).then_some(value);
            }
            if c == '\\' {
                self.pos += 1;
                if let Some(escaped) = self.peek() {
                    value.push(escaped);
                    self.bump();
                }
                continue;
            }
            if c == '\n' && quote != '`' {
                // Unterminated string literal
                return None;
            }
            if quote == '`' && c == '$' && self.peek_at(1) == Some('{') {
                interpolated = true;
            }
            value.push(c);
            self.bump();
        }
        None
    }

    /// After `import`: dynamic `import("x")`, side-effect `import "x"`, or `import ... from "x"`.
    fn scan_import(&mut self) -> Option<(String, &'static str, u32)> {
        self.skip_whitespace();

        match self.peek()? {
            '(' => {
                self.pos += 1;
                self.skip_whitespace();
                let line = self.line;
                let spec = self.read_string()?;
                self.skip_whitespace();
                // `import(a + "b")` is computed
                if self.peek() != Some(')') && self.peek() != Some(',') {
                    return None;
                }
                Some((spec, kinds::DYNAMIC_IMPORT, line))
            }
            '"' | '\'' => {
                let line = self.line;
                let spec = self.read_string()?;
                Some((spec, kinds::ESM_IMPORT, line))
            }
            // `import.meta`
            '.' => None,
            _ => self.scan_from_clause(kinds::ESM_IMPORT),
        }
    }

    /// After `export`: only re-exports (`export ... from "x"`) carry a specifier.
    fn scan_export_from(&mut self) -> Option<(String, &'static str, u32)> {
        self.skip_whitespace();
        match self.peek()? {
            '*' | '{' => self.scan_from_clause(kinds::ESM_EXPORT),
            // `export type { T } from "x"`
            't' if self.at_keyword("type") => self.scan_from_clause(kinds::ESM_EXPORT),
            _ => None,
        }
    }

    /// Scan forward to `from "<specifier>"`, stopping at the end of the statement.
    fn scan_from_clause(&mut self, kind: &'static str) -> Option<(String, &'static str, u32)> {
        let limit = self.pos + STATEMENT_LOOKAHEAD;

        while self.pos < limit {
            let c = self.peek()?;
            if c == ';' {
                return None;
            }
            if self.at_keyword("from") {
                self.pos += "from".len();
                self.skip_whitespace();
                let line = self.line;
                let spec = self.read_string()?;
                return Some((spec, kind, line));
            }
            self.bump();
        }
        None
    }

    /// After `require`: expect `("<specifier>")`.
    fn scan_require(&mut self) -> Option<(String, &'static str, u32)> {
        self.skip_whitespace();
        if self.peek()? != '(' {
            return None;
        }
        self.pos += 1;
        self.skip_whitespace();

        let line = self.line;
        let spec = self.read_string()?;
        self.skip_whitespace();
        // `require("a" + b)` is computed
        if self.peek() != Some(')') {
            return None;
        }
        self.pos += 1;
        Some((spec, kinds::CJS_REQUIRE, line))
    }
}
