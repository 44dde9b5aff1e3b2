//! Rewrites WLS source written for an older language version so it runs
//! under the target version.
//!
//! The engine works on lexical matches, not a syntax tree. Everything it
//! rewrites is recorded as a [`MigrationChange`]; everything it recognises but
//! will not touch is reported as a [`MigrationWarning`]. Running it on its own
//! output produces no further directive or reserved-word changes.
//!
//! [`MigrationChange`]: struct.MigrationChange.html
//! [`MigrationWarning`]: struct.MigrationWarning.html

use crate::reserved;
use crate::scanner::{ConstructKind, Scanner};

use color_eyre::Result;
use eyre::{eyre, WrapErr};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::fmt::Write;
use std::ops::Range;
use tracing::debug;

/// What sort of edit a change made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    ReservedWord,
    Syntax,
    Directive,
    Operator,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChangeKind::ReservedWord => "reserved_word",
            ChangeKind::Syntax => "syntax",
            ChangeKind::Directive => "directive",
            ChangeKind::Operator => "operator",
        })
    }
}

/// Why a construct was flagged instead of rewritten
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    ManualReview,
    PotentialConflict,
    Deprecated,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WarningKind::ManualReview => "manual_review",
            WarningKind::PotentialConflict => "potential_conflict",
            WarningKind::Deprecated => "deprecated",
        })
    }
}

/// One edit applied to the source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationChange {
    pub kind: ChangeKind,
    /// 1-based line in the original source
    pub line: usize,
    /// 1-based column in the original source
    pub column: usize,
    /// The replaced text. Empty for insertions
    pub original: String,
    pub replacement: String,
    pub reason: String,
    /// Byte range of `original` in the original source
    #[serde(skip)]
    pub span: Range<usize>,
}

/// A construct that needs a human to look at it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationWarning {
    pub kind: WarningKind,
    pub line: usize,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip)]
    pub span: Range<usize>,
}

/// The output of one migration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationResult {
    pub content: String,
    pub version: String,
    pub changes: Vec<MigrationChange>,
    pub warnings: Vec<MigrationWarning>,
}

impl MigrationResult {
    /// False when the source already targeted this version and used no
    /// reserved names
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn count(&self, kind: ChangeKind) -> usize {
        self.changes.iter().filter(|c| c.kind == kind).count()
    }

    /// e.g. "3 changes, 1 warning"
    pub fn summary(&self) -> String {
        format!(
            "{} {}, {} {}",
            self.changes.len(),
            plural(self.changes.len(), "change", "changes"),
            self.warnings.len(),
            plural(self.warnings.len(), "warning", "warnings"),
        )
    }
}

fn plural<'a>(n: usize, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 {
        one
    } else {
        many
    }
}

/// Migrates source to one target language version
#[derive(Debug, Clone)]
pub struct Migrator {
    version: &'static str,
    reserved_reference: Regex,
    reserved_assignment: Regex,
}

impl Default for Migrator {
    /// A migrator targeting the current language version
    fn default() -> Self {
        Migrator::for_version(reserved::TARGET_VERSION)
            .expect("target version must have a reserved-word table")
    }
}

impl Migrator {
    /// Builds a migrator for `version`, which must have a reserved-word table
    pub fn for_version(version: &str) -> Result<Self> {
        let tag = reserved::supported_versions()
            .find(|tag| *tag == version)
            .ok_or_else(|| eyre!("No reserved-word table for WLS version {}", version))?;
        let words = reserved::reserved_words(tag).unwrap_or_default();

        let alternation = words
            .iter()
            .map(|w| regex::escape(w))
            .collect::<Vec<_>>()
            .join("|");
        let reserved_reference = Regex::new(&format!(r"\$(?i:({}))\b", alternation))
            .wrap_err_with(|| format!("Invalid reserved-word pattern for WLS {}", tag))?;
        let reserved_assignment =
            Regex::new(&format!(r"\$(?i:({}))\b[ \t]*=(?:[^=]|$)", alternation))
                .wrap_err_with(|| format!("Invalid reserved-word pattern for WLS {}", tag))?;

        Ok(Migrator {
            version: tag,
            reserved_reference,
            reserved_assignment,
        })
    }

    /// The version every migration produces
    pub fn version(&self) -> &'static str {
        self.version
    }

    fn directive(&self) -> String {
        format!("@version: {}", self.version)
    }

    /// Migrates `source` to this migrator's version
    pub fn migrate(&self, source: &str) -> MigrationResult {
        let scanner = Scanner::new(source);
        let mut changes = Vec::new();
        let mut edits: Vec<(Range<usize>, String)> = Vec::new();

        let stamp = match scanner.first(ConstructKind::VersionDirective) {
            None => {
                changes.push(MigrationChange {
                    kind: ChangeKind::Directive,
                    line: 1,
                    column: 1,
                    original: String::new(),
                    replacement: self.directive(),
                    reason: format!("Added version directive for WLS {}", self.version),
                    span: 0..0,
                });
                true
            }
            Some(found) if found.name.as_deref() == Some(self.version) => false,
            Some(found) => {
                changes.push(MigrationChange {
                    kind: ChangeKind::Directive,
                    line: found.position.line,
                    column: found.position.column,
                    original: found.text.clone(),
                    replacement: self.directive(),
                    reason: format!(
                        "Updated version directive from {} to {}",
                        found.name.as_deref().unwrap_or("unknown"),
                        self.version
                    ),
                    span: found.span.clone(),
                });
                edits.push((found.span, self.directive()));
                false
            }
        };

        for caps in self.reserved_reference.captures_iter(source) {
            let (whole, word) = match (caps.get(0), caps.get(1)) {
                (Some(whole), Some(word)) => (whole, word.as_str()),
                _ => continue,
            };
            let position = scanner.position(whole.start());
            let replacement = format!("${}", reserved::migrated_name(word));
            changes.push(MigrationChange {
                kind: ChangeKind::ReservedWord,
                line: position.line,
                column: position.column,
                original: whole.as_str().to_string(),
                replacement: replacement.clone(),
                reason: format!(
                    "'{}' is a reserved word in WLS {}",
                    word.to_lowercase(),
                    self.version
                ),
                span: whole.range(),
            });
            edits.push((whole.range(), replacement));
        }

        let mut content = apply_edits(source, edits);
        if stamp {
            content = format!("{}\n{}", self.directive(), content);
            debug!(version = self.version, "stamped version directive");
        }

        let warnings = self.review(&scanner);

        debug!(
            version = self.version,
            changes = changes.len(),
            warnings = warnings.len(),
            "migrated source"
        );

        MigrationResult {
            content,
            version: self.version.to_string(),
            changes,
            warnings,
        }
    }

    /// Flags constructs whose behaviour may differ under the target version
    fn review(&self, scanner: &Scanner<'_>) -> Vec<MigrationWarning> {
        let mut warnings = Vec::new();

        for call in scanner.constructs(ConstructKind::TunnelCall) {
            warnings.push(MigrationWarning {
                kind: WarningKind::ManualReview,
                line: call.position.line,
                message: format!(
                    "Tunnel call to '{}' may behave differently in WLS {}",
                    call.name.as_deref().unwrap_or_default(),
                    self.version
                ),
                suggestion: Some("Check that every path through the tunnel returns".into()),
                span: call.span,
            });
        }

        for ret in scanner.constructs(ConstructKind::TunnelReturn) {
            warnings.push(MigrationWarning {
                kind: WarningKind::ManualReview,
                line: ret.position.line,
                message: format!("Tunnel return semantics changed in WLS {}", self.version),
                suggestion: None,
                span: ret.span,
            });
        }

        for delay in scanner.constructs(ConstructKind::DelayDirective) {
            warnings.push(MigrationWarning {
                kind: WarningKind::Deprecated,
                line: delay.position.line,
                message: format!("Delay directive syntax is deprecated in WLS {}", self.version),
                suggestion: Some("Use a timed content block instead".into()),
                span: delay.span,
            });
        }

        for caps in self.reserved_assignment.captures_iter(scanner.source()) {
            let (whole, word) = match (caps.get(0), caps.get(1)) {
                (Some(whole), Some(word)) => (whole, word.as_str()),
                _ => continue,
            };
            warnings.push(MigrationWarning {
                kind: WarningKind::PotentialConflict,
                line: scanner.line_of(whole.start()),
                message: format!("Assignment to reserved variable ${}", word),
                suggestion: Some(format!(
                    "It is now ${}; update saved games or external scripts that read ${}",
                    reserved::migrated_name(word),
                    word
                )),
                span: whole.start()..whole.start() + word.len() + 1,
            });
        }

        warnings.sort_by_key(|w| w.span.start);

        let lists = scanner.constructs(ConstructKind::ListDeclaration);
        if let Some(first) = lists.first() {
            warnings.push(MigrationWarning {
                kind: WarningKind::ManualReview,
                line: first.position.line,
                message: format!(
                    "Found {} LIST {}; state-transition operators changed in WLS {}",
                    lists.len(),
                    plural(lists.len(), "declaration", "declarations"),
                    self.version
                ),
                suggestion: Some("Review uses of +=, -= and ? on LIST values".into()),
                span: first.span.clone(),
            });
        }

        warnings
    }
}

fn apply_edits(source: &str, mut edits: Vec<(Range<usize>, String)>) -> String {
    edits.sort_by_key(|(range, _)| range.start);
    let mut out = String::with_capacity(source.len());
    let mut last = 0;
    for (range, text) in edits {
        out.push_str(&source[last..range.start]);
        out.push_str(&text);
        last = range.end;
    }
    out.push_str(&source[last..]);
    out
}

/// Renders a migration result as plain text
pub fn format_report(result: &MigrationResult) -> String {
    let mut out = String::new();
    if let Err(e) = write_report(result, &mut out) {
        debug!(error = %e, "migration report is incomplete");
    }
    out
}

fn write_report(result: &MigrationResult, out: &mut String) -> fmt::Result {
    writeln!(out, "WLS migration report (target {})", result.version)?;
    writeln!(out, "Changes: {}", result.changes.len())?;
    writeln!(out, "Warnings: {}", result.warnings.len())?;

    writeln!(out, "\nChanges:")?;
    for change in &result.changes {
        writeln!(
            out,
            "  {}:{} [{}] \"{}\" -> \"{}\" ({})",
            change.line,
            change.column,
            change.kind,
            change.original,
            change.replacement,
            change.reason
        )?;
    }

    writeln!(out, "\nWarnings:")?;
    for warning in &result.warnings {
        writeln!(
            out,
            "  line {} [{}] {}",
            warning.line, warning.kind, warning.message
        )?;
        if let Some(suggestion) = &warning.suggestion {
            writeln!(out, "      suggestion: {}", suggestion)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn migrator() -> Migrator {
        Migrator::for_version("2.0").unwrap()
    }

    #[test]
    fn unknown_version_is_an_error() {
        assert!(Migrator::for_version("7.3").is_err());
    }

    #[test]
    fn default_targets_current_version() {
        assert_eq!(Migrator::default().version(), reserved::TARGET_VERSION);
    }

    #[test]
    fn stamps_missing_directive() {
        let res = migrator().migrate(":: Start\nHello");
        assert_eq!(res.content, "@version: 2.0\n:: Start\nHello");
        assert_eq!(res.changes.len(), 1);
        assert_eq!(res.changes[0].kind, ChangeKind::Directive);
        assert_eq!(res.changes[0].original, "");
        assert_eq!(res.changes[0].replacement, "@version: 2.0");
    }

    #[test]
    fn keeps_current_directive() {
        let src = "@version: 2.0\n:: Start\nHello";
        let res = migrator().migrate(src);
        assert_eq!(res.content, src);
        assert!(res.changes.is_empty());
    }

    #[test]
    fn updates_older_directive_in_place() {
        let res = migrator().migrate("@version: 1.0\n:: Start");
        assert_eq!(res.content, "@version: 2.0\n:: Start");
        assert_eq!(res.count(ChangeKind::Directive), 1);
        assert_eq!(res.changes[0].original, "@version: 1.0");
        assert_eq!((res.changes[0].line, res.changes[0].column), (1, 1));
    }

    #[test]
    fn renames_reserved_variables_with_original_positions() {
        let res = migrator().migrate(":: Start\n  {do $thread = 1}");
        assert_eq!(res.content, "@version: 2.0\n:: Start\n  {do $_migrated_thread = 1}");
        let change = &res.changes[1];
        assert_eq!(change.kind, ChangeKind::ReservedWord);
        assert_eq!((change.line, change.column), (2, 7));
        assert_eq!(change.original, "$thread");
        assert_eq!(change.replacement, "$_migrated_thread");
        assert!(change.reason.contains("thread"));
        assert_eq!(change.span, 15..22);
    }

    #[test]
    fn leaves_prose_and_longer_names_alone() {
        let src = "@version: 2.0\nThe thread snapped. $threads $thread_count $mythread";
        let res = migrator().migrate(src);
        assert_eq!(res.content, src);
        assert!(res.changes.is_empty());
    }

    #[test]
    fn review_patterns() {
        let src = "@version: 2.0\n-> Shop ->\n<-\n@delay(2s)\n{do $Await = 3}";
        let res = migrator().migrate(src);
        let kinds: Vec<_> = res.warnings.iter().map(|w| (w.kind, w.line)).collect();
        assert_eq!(
            kinds,
            vec![
                (WarningKind::ManualReview, 2),
                (WarningKind::ManualReview, 3),
                (WarningKind::Deprecated, 4),
                (WarningKind::PotentialConflict, 5),
            ]
        );
        assert!(res.warnings[3].message.contains("$Await"));
    }

    #[test]
    fn comparison_is_not_assignment() {
        let res = migrator().migrate("@version: 2.0\n{if $sync == 1}");
        assert!(res
            .warnings
            .iter()
            .all(|w| w.kind != WarningKind::PotentialConflict));
    }

    #[test]
    fn one_list_advisory_at_first_declaration() {
        let src = "@version: 2.0\n:: Start\nLIST a = x, y\nLIST b = z";
        let res = migrator().migrate(src);
        assert_eq!(res.warnings.len(), 1);
        assert_eq!(res.warnings[0].kind, WarningKind::ManualReview);
        assert_eq!(res.warnings[0].line, 3);
        assert!(res.warnings[0].message.contains("2 LIST declarations"));
    }

    #[test]
    fn report_with_nothing_to_say() {
        let res = migrator().migrate("@version: 2.0\nplain");
        let report = format_report(&res);
        assert!(report.contains("Changes: 0"));
        assert!(report.contains("Warnings: 0"));
        assert_eq!(res.summary(), "0 changes, 0 warnings");
    }

    #[test]
    fn report_lists_changes_and_suggestions() {
        let res = migrator().migrate("{do $spawn = 1}\n@delay: 1");
        let report = format_report(&res);
        assert!(report.contains("Changes: 2"));
        assert!(report.contains("\"$spawn\" -> \"$_migrated_spawn\""));
        assert!(report.contains("suggestion: Use a timed content block instead"));
        assert_eq!(res.summary(), "2 changes, 2 warnings");
    }
}
