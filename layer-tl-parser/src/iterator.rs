//! Line scanner behind [`crate::parse_tl_file`].

use crate::errors::{ParseError, ParseErrorKind};
use crate::tl::{Category, Definition};
use crate::ParseOptions;

/// Constructors the wire format treats as primitives. Schemas declare them
/// (`boolTrue#997275b5 = Bool;`, `vector#1cb5c415 {t:Type} # [ t ] = Vector t;`)
/// but they never become entries of their own.
const BUILTIN_CONSTRUCTORS: &[&str] = &[
    "int", "long", "double", "string", "bytes", "int128", "int256",
    "vector", "boolFalse", "boolTrue", "true", "null",
];

pub(crate) struct TlIterator<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    options: ParseOptions,
    /// Switched by separator lines.
    category: Category,
    /// `//` comment lines collected since the last blank line or definition.
    comment: Vec<&'a str>,
    /// Highest `// LAYER N` marker seen so far.
    layer: Option<i32>,
}

impl<'a> TlIterator<'a> {
    pub(crate) fn new(src: &'a str, options: ParseOptions) -> Self {
        Self {
            lines: src.lines().enumerate(),
            options,
            category: Category::Types,
            comment: Vec::new(),
            layer: None,
        }
    }

    pub(crate) fn layer(&self) -> Option<i32> {
        self.layer
    }

    fn handle_comment(&mut self, text: &'a str) {
        let text = text.trim();
        if let Some(n) = text.strip_prefix("LAYER ").and_then(|n| n.trim().parse::<i32>().ok()) {
            self.layer = Some(self.layer.map_or(n, |l| l.max(n)));
            return;
        }
        if !text.is_empty() {
            self.comment.push(text);
        }
    }

    fn take_comment(&mut self) -> Option<String> {
        if self.comment.is_empty() {
            return None;
        }
        let joined = self.comment.join(" ");
        self.comment.clear();
        Some(joined)
    }
}

fn is_builtin(line: &str) -> bool {
    let head = line
        .split(|c: char| c.is_whitespace() || c == '#')
        .next()
        .unwrap_or_default();
    BUILTIN_CONSTRUCTORS.contains(&head)
}

impl<'a> Iterator for TlIterator<'a> {
    type Item = Result<Definition, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (idx, line) = self.lines.next()?;
            let trimmed = line.trim();

            if trimmed.is_empty() {
                self.comment.clear();
                continue;
            }

            if let Some(text) = trimmed.strip_prefix("//") {
                self.handle_comment(text);
                continue;
            }

            if let Some(category) = Category::from_separator(trimmed) {
                self.category = category;
                self.comment.clear();
                continue;
            }

            if is_builtin(trimmed) {
                log::debug!("[tl-parser] line {}: skipping built-in `{trimmed}`", idx + 1);
                self.comment.clear();
                continue;
            }

            let comment = self.take_comment();
            let error = |kind: ParseErrorKind| ParseError {
                line: idx + 1,
                raw: trimmed.to_owned(),
                kind,
            };

            if !trimmed.ends_with(';') {
                return Some(Err(error(ParseErrorKind::MissingSemicolon)));
            }

            let result = Definition::parse(trimmed, &self.options)
                .map(|mut d| {
                    d.category = self.category;
                    d.comment = comment;
                    d
                })
                .map_err(error);

            return Some(result);
        }
    }
}
