//! Handles validating stories based on the given [`Config`]
//!
//! [`Config`]: ../struct.Config.html

use crate::issue::Severity;
use crate::report::Reporter;
use crate::story::Story;
use crate::twee;
use crate::validators::{StoryValidator, ValidationResult};
use crate::Config;

use color_eyre::Result;
use eyre::{eyre, WrapErr};
use std::io::Write;
use std::path::{Path, PathBuf};
use termcolor::{Color, ColorSpec, StandardStream, WriteColor};
use tracing::info;

/// Loads a story by file extension: `.twee`/`.tw` are parsed as Twee 3,
/// everything else as story JSON
pub fn load_story(path: &Path) -> Result<Story> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("twee") | Some("tw") => twee::load(path),
        _ => Story::load(path),
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some("json")
}

/// Drops allowed issues and promotes denied ones to errors.
///
/// `all` matches every code. Allow wins over deny, and errors are never
/// dropped
pub fn filter_issues(
    result: ValidationResult,
    allowed: &[String],
    denied: &[String],
) -> ValidationResult {
    let matches = |list: &[String], code: &str| list.iter().any(|c| c == "all" || c == code);

    let issues = result
        .issues
        .into_iter()
        .filter(|issue| issue.is_error() || !matches(allowed, issue.code))
        .map(|mut issue| {
            if matches(denied, issue.code) {
                issue.severity = Severity::Error;
            }
            issue
        })
        .collect();
    ValidationResult::new(issues)
}

/// Validates one story file. With `config.fix`, fixes are applied first and
/// JSON stories are saved back in place
pub fn lint_file(
    path: &Path,
    validator: &StoryValidator,
    config: &Config,
) -> Result<ValidationResult> {
    let mut story = load_story(path)?;
    info!(file = %path.display(), passages = story.passages.len(), "loaded story");

    if config.fix {
        let outcomes = validator.apply_fixes(&mut story);
        info!(file = %path.display(), fixes = outcomes.len(), "applied fixes");
        if !outcomes.is_empty() {
            if is_json(path) {
                story.save(path)?;
            } else {
                info!(file = %path.display(), "fixes are only saved for JSON stories");
            }
        }
    }

    let result = validator.validate(&story);
    Ok(filter_issues(result, &config.allowed, &config.denied))
}

fn report_path(config: &Config, input: &Path, reporter: &dyn Reporter) -> Option<PathBuf> {
    let default_name = || {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "wls-report".to_string());
        PathBuf::from(format!("{}.{}", stem, reporter.extension()))
    };
    match &config.output_file {
        Some(out) if config.inputs.len() > 1 => Some(Path::new(out).join(default_name())),
        Some(out) => Some(PathBuf::from(out)),
        None if config.should_open => Some(default_name()),
        None => None,
    }
}

/// Validates every input and prints or writes a report for each.
///
/// Fails if any story has errors after allow/deny filtering
pub fn lint(config: &Config, stdout: &mut StandardStream) -> Result<()> {
    let validator = StoryValidator::with_large_asset_threshold(config.large_asset_threshold);
    let reporter = config.report_format.reporter(config.color_enabled());
    let mut is_err = false;

    for input in &config.inputs {
        let path = Path::new(input);
        let result = lint_file(path, &validator, config)
            .wrap_err_with(|| format!("Failed to validate {}", input))?;
        is_err |= !result.valid;
        let rendered = reporter.render(&result);

        match report_path(config, path, reporter.as_ref()) {
            Some(report) => {
                if let Some(parent) = report.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&report, rendered)
                    .wrap_err_with(|| format!("Failed to write report {}", report.display()))?;
                info!(report = %report.display(), "wrote report");
                if config.should_open {
                    if let Err(e) = opener::open(&report) {
                        writeln!(stdout, "Couldn't open report {}: {}", report.display(), e)?;
                    }
                }
            }
            None => {
                if config.inputs.len() > 1 {
                    stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true))?;
                    writeln!(stdout, "==> {}", input)?;
                    stdout.reset()?;
                }
                write!(stdout, "{}", rendered)?;
            }
        }
    }

    // Force reset of color
    stdout.flush()?;

    if is_err {
        Err(eyre!("Failed due to previous errors"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::{Category, Issue};

    fn result() -> ValidationResult {
        ValidationResult::new(vec![
            Issue::new("invalid_ifid", Severity::Error, Category::Metadata, "e"),
            Issue::new("missing_ifid", Severity::Warning, Category::Metadata, "w"),
            Issue::new("empty_passage", Severity::Info, Category::Content, "i").scoped("a"),
        ])
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn allow_drops_but_never_errors() {
        let filtered = filter_issues(result(), &strings(&["all"]), &[]);
        let codes: Vec<_> = filtered.issues.iter().map(|i| i.code).collect();
        assert_eq!(codes, vec!["invalid_ifid"]);
        assert!(!filtered.valid);
    }

    #[test]
    fn deny_promotes() {
        let mut res = result();
        res.issues.remove(0);
        let res = ValidationResult::new(res.issues);
        assert!(res.valid);

        let filtered = filter_issues(res, &[], &strings(&["missing_ifid"]));
        assert!(!filtered.valid);
        assert_eq!(filtered.issues[0].severity, Severity::Error);
        assert_eq!(filtered.issues[1].severity, Severity::Info);
    }

    #[test]
    fn allow_wins_over_deny() {
        let filtered = filter_issues(
            result(),
            &strings(&["empty_passage"]),
            &strings(&["empty_passage"]),
        );
        assert_eq!(filtered.issues.len(), 2);
    }
}
