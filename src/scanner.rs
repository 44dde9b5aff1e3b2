//! Pattern-based scanning of WLS source text
//!
//! The scanner does not parse WLS. It finds the handful of lexical constructs
//! the migration engine and validators care about and reports where they are,
//! as byte spans and 1-based line/column positions.

use regex::Regex;
use serde::Serialize;
use std::ops::Range;

/// A 1-based line and column. Columns count characters, not bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// Maps byte offsets within a source text to line/column positions
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(source.match_indices('\n').map(|(idx, _)| idx + 1));
        LineIndex { starts }
    }

    /// The 1-based line containing `offset`
    pub fn line_of(&self, offset: usize) -> usize {
        match self.starts.binary_search(&offset) {
            Ok(idx) => idx + 1,
            Err(idx) => idx,
        }
    }

    /// The position of `offset` within `source`. `offset` must lie on a char
    /// boundary of the text this index was built from
    pub fn position(&self, source: &str, offset: usize) -> Position {
        let line = self.line_of(offset);
        let start = self.starts[line - 1];
        let column = source[start..offset].chars().count() + 1;
        Position { line, column }
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }
}

/// The constructs the scanner knows how to find
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructKind {
    /// `@version: X.Y` at the start of a line
    VersionDirective,
    /// `$name`
    VariableReference,
    /// `-> Passage ->`
    TunnelCall,
    /// a line holding nothing but `<-`
    TunnelReturn,
    /// `LIST name = ...` at the start of a line
    ListDeclaration,
    /// `@delay(...)` or `@delay: ...`
    DelayDirective,
    /// `asset://id`
    AssetReference,
}

impl ConstructKind {
    pub fn pattern(self) -> &'static Regex {
        match self {
            ConstructKind::VersionDirective => {
                crate::regex!(r"(?m)^[ \t]*@version:[ \t]*([0-9]+(?:\.[0-9]+)*)")
            }
            ConstructKind::VariableReference => crate::regex!(r"\$([A-Za-z_][A-Za-z0-9_]*)"),
            ConstructKind::TunnelCall => {
                crate::regex!(r"->[ \t]*([A-Za-z_][A-Za-z0-9_]*)[ \t]*->")
            }
            ConstructKind::TunnelReturn => crate::regex!(r"(?m)^[ \t]*<-[ \t]*\r?$"),
            ConstructKind::ListDeclaration => {
                crate::regex!(r"(?m)^[ \t]*LIST[ \t]+([A-Za-z_][A-Za-z0-9_]*)[ \t]*=")
            }
            ConstructKind::DelayDirective => crate::regex!(r"@delay[ \t]*[(:]"),
            ConstructKind::AssetReference => crate::regex!(r"asset://([A-Za-z0-9_-]+)"),
        }
    }
}

/// One occurrence of a construct
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Construct {
    pub kind: ConstructKind,
    /// Byte range of the whole match
    pub span: Range<usize>,
    /// The matched text
    pub text: String,
    /// The construct's name, where it has one (variable, passage, list, asset
    /// id or version number)
    pub name: Option<String>,
    pub position: Position,
}

/// Finds constructs in one source text
pub struct Scanner<'a> {
    source: &'a str,
    lines: LineIndex,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Scanner {
            source,
            lines: LineIndex::new(source),
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn position(&self, offset: usize) -> Position {
        self.lines.position(self.source, offset)
    }

    pub fn line_of(&self, offset: usize) -> usize {
        self.lines.line_of(offset)
    }

    /// Every occurrence of `kind`, in source order
    pub fn constructs(&self, kind: ConstructKind) -> Vec<Construct> {
        kind.pattern()
            .captures_iter(self.source)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                // Line-anchored patterns may swallow leading indentation
                let trimmed = whole.as_str().trim_start();
                let start = whole.end() - trimmed.len();
                Some(Construct {
                    kind,
                    span: start..whole.end(),
                    text: trimmed.trim_end().to_string(),
                    name: caps.get(1).map(|m| m.as_str().to_string()),
                    position: self.position(start),
                })
            })
            .collect()
    }

    pub fn first(&self, kind: ConstructKind) -> Option<Construct> {
        self.constructs(kind).into_iter().next()
    }
}

/// The version number of the first version directive in `source`, if any
pub fn detect_version(source: &str) -> Option<String> {
    ConstructKind::VersionDirective
        .pattern()
        .captures(source)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Names of every `$variable` referenced in `text`, in order, repeats included
pub fn variable_names(text: &str) -> impl Iterator<Item = &str> {
    ConstructKind::VariableReference
        .pattern()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Asset ids of every `asset://id` reference in `text`, in order
pub fn asset_references(text: &str) -> impl Iterator<Item = &str> {
    ConstructKind::AssetReference
        .pattern()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
}
