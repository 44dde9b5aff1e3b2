//! Renders a [`ValidationResult`] for people and for CI
//!
//! [`ValidationResult`]: ../validators/struct.ValidationResult.html

use crate::issue::{Issue, Severity};
use crate::validators::ValidationResult;

use color_eyre::Result;
use eyre::eyre;
use horrorshow::helper::doctype;
use horrorshow::html;
use std::io::Write;
use std::str::FromStr;
use termcolor::{Buffer, Color, ColorSpec, WriteColor};
use tracing::debug;

const SEVERITIES: [Severity; 3] = [Severity::Error, Severity::Warning, Severity::Info];

/// Renders validation results in one output format
pub trait Reporter {
    /// File extension a report of this kind should be saved with
    fn extension(&self) -> &'static str;
    fn render(&self, result: &ValidationResult) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Console,
    Json,
    Junit,
    Html,
}

impl FromStr for ReportFormat {
    type Err = color_eyre::Report;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "console" | "text" | "txt" => Ok(ReportFormat::Console),
            "json" => Ok(ReportFormat::Json),
            "junit" | "xml" => Ok(ReportFormat::Junit),
            "html" => Ok(ReportFormat::Html),
            other => Err(eyre!(
                "Unknown report format '{}' (expected console, json, junit or html)",
                other
            )),
        }
    }
}

impl ReportFormat {
    /// A reporter for this format. `color` only affects console output
    pub fn reporter(self, color: bool) -> Box<dyn Reporter> {
        match self {
            ReportFormat::Console => Box::new(ConsoleReporter { color }),
            ReportFormat::Json => Box::new(JsonReporter),
            ReportFormat::Junit => Box::new(JunitReporter),
            ReportFormat::Html => Box::new(HtmlReporter),
        }
    }
}

/// Human-readable text grouped by severity, optionally with ANSI colors
pub struct ConsoleReporter {
    pub color: bool,
}

impl ConsoleReporter {
    fn write_to(&self, result: &ValidationResult, out: &mut Buffer) -> Result<()> {
        for severity in SEVERITIES.iter().copied() {
            let issues: Vec<&Issue> = result.with_severity(severity).collect();
            if issues.is_empty() {
                continue;
            }
            let color = match severity {
                Severity::Error => Color::Red,
                Severity::Warning => Color::Yellow,
                Severity::Info => Color::Cyan,
            };
            out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
            writeln!(out, "{} ({})", heading(severity), issues.len())?;
            out.reset()?;
            for issue in issues {
                write!(out, "  [{}] ", issue.id)?;
                writeln!(out, "{}", issue.message)?;
                if !issue.description.is_empty() {
                    writeln!(out, "      {}", issue.description)?;
                }
                if let Some(fix) = &issue.fix {
                    out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
                    writeln!(out, "      fix: {}", fix.description)?;
                    out.reset()?;
                }
            }
        }

        let (status, color) = if result.valid {
            ("PASSED", Color::Green)
        } else {
            ("FAILED", Color::Red)
        };
        out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
        write!(out, "{}", status)?;
        out.reset()?;
        writeln!(
            out,
            ": {} errors, {} warnings, {} info",
            result.count(Severity::Error),
            result.count(Severity::Warning),
            result.count(Severity::Info)
        )?;
        Ok(())
    }
}

fn heading(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "Errors",
        Severity::Warning => "Warnings",
        Severity::Info => "Info",
    }
}

impl Reporter for ConsoleReporter {
    fn extension(&self) -> &'static str {
        "txt"
    }

    fn render(&self, result: &ValidationResult) -> String {
        let mut buffer = if self.color {
            Buffer::ansi()
        } else {
            Buffer::no_color()
        };
        if let Err(e) = self.write_to(result, &mut buffer) {
            debug!(error = %e, "console report is incomplete");
        }
        String::from_utf8_lossy(buffer.as_slice()).into_owned()
    }
}

/// The result as a JSON document: `{ valid, summary, issues }`
pub struct JsonReporter;

impl Reporter for JsonReporter {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn render(&self, result: &ValidationResult) -> String {
        let doc = serde_json::json!({
            "valid": result.valid,
            "summary": {
                "errors": result.count(Severity::Error),
                "warnings": result.count(Severity::Warning),
                "info": result.count(Severity::Info),
            },
            "issues": result.issues,
        });
        serde_json::to_string_pretty(&doc).unwrap_or_default()
    }
}

/// JUnit XML: one test suite per category, one failing test case per error
/// or warning. Info issues are listed as passing cases
pub struct JunitReporter;

impl Reporter for JunitReporter {
    fn extension(&self) -> &'static str {
        "xml"
    }

    fn render(&self, result: &ValidationResult) -> String {
        let failures = result
            .issues
            .iter()
            .filter(|i| i.severity != Severity::Info)
            .count();
        let mut suites: Vec<(String, Vec<&Issue>)> = Vec::new();
        for issue in &result.issues {
            let category = issue.category.to_string();
            match suites.iter_mut().find(|(name, _)| *name == category) {
                Some((_, cases)) => cases.push(issue),
                None => suites.push((category, vec![issue])),
            }
        }

        let body = format!(
            "{}",
            html! {
                testsuites(name = "wls-validation",
                           tests = result.issues.len(),
                           failures = failures) {
                    @ for (category, cases) in &suites {
                        testsuite(name = category.as_str(), tests = cases.len()) {
                            @ for issue in cases {
                                testcase(name = issue.id.as_str(),
                                         classname = format!("wls.{}", category)) {
                                    @ if issue.severity != Severity::Info {
                                        failure(message = issue.message.as_str(),
                                                type = issue.severity.to_string()) {
                                            : issue.description.as_str()
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        );
        format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}\n", body)
    }
}

/// A standalone HTML page with counts and one card per issue
pub struct HtmlReporter;

const STYLE: &str = "body{font-family:sans-serif;max-width:60em;margin:2em auto}\
.counts span{margin-right:1.5em}\
.issue{border-left:4px solid #888;padding:.5em 1em;margin:.5em 0;background:#f7f7f7}\
.error{border-color:#c0392b}.warning{border-color:#e67e22}.info{border-color:#2980b9}\
.fix{color:#27ae60}.passed{color:#27ae60}.failed{color:#c0392b}";

impl Reporter for HtmlReporter {
    fn extension(&self) -> &'static str {
        "html"
    }

    fn render(&self, result: &ValidationResult) -> String {
        let status = if result.valid { "passed" } else { "failed" };
        format!(
            "{}",
            html! {
                : doctype::HTML;
                html {
                    head {
                        meta(charset = "utf-8");
                        title : "WLS validation report";
                        style : STYLE;
                    }
                    body {
                        h1 : "WLS validation report";
                        p(class = status) : status.to_uppercase();
                        div(class = "counts") {
                            span : format!("Errors: {}", result.count(Severity::Error));
                            span : format!("Warnings: {}", result.count(Severity::Warning));
                            span : format!("Info: {}", result.count(Severity::Info));
                        }
                        @ for issue in &result.issues {
                            div(class = format!("issue {}", issue.severity), id = issue.id.as_str()) {
                                h3 : issue.message.as_str();
                                p : format!("{} · {} · {}", issue.severity, issue.category, issue.id);
                                @ if !issue.description.is_empty() {
                                    p : issue.description.as_str();
                                }
                                @ for fix in issue.fix.iter() {
                                    p(class = "fix") : format!("Fix available: {}", fix.description);
                                }
                            }
                        }
                    }
                }
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::{Category, Fix, FixAction};

    fn result() -> ValidationResult {
        ValidationResult::new(vec![
            Issue::new(
                "missing_start_passage",
                Severity::Error,
                Category::Structure,
                "No start passage defined",
            ),
            Issue::new(
                "missing_ifid",
                Severity::Warning,
                Category::Metadata,
                "Story has no <IFID>",
            )
            .with_fix(Fix::new("Generate", FixAction::GenerateIfid { replacing: None })),
            Issue::new("unused_asset", Severity::Info, Category::Assets, "Asset 'x' unused")
                .scoped("x"),
        ])
    }

    #[test]
    fn formats_parse() {
        assert_eq!("JSON".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
        assert_eq!("xml".parse::<ReportFormat>().unwrap(), ReportFormat::Junit);
        assert!("pdf".parse::<ReportFormat>().is_err());
    }

    #[test]
    fn extensions() {
        let exts: Vec<_> = [
            ReportFormat::Console,
            ReportFormat::Json,
            ReportFormat::Junit,
            ReportFormat::Html,
        ]
        .iter()
        .map(|f| f.reporter(false).extension())
        .collect();
        assert_eq!(exts, vec!["txt", "json", "xml", "html"]);
    }

    #[test]
    fn console_groups_by_severity() {
        let text = ConsoleReporter { color: false }.render(&result());
        let errors = text.find("Errors (1)").unwrap();
        let warnings = text.find("Warnings (1)").unwrap();
        let info = text.find("Info (1)").unwrap();
        assert!(errors < warnings && warnings < info);
        assert!(text.contains("fix: Generate"));
        assert!(text.contains("FAILED: 1 errors, 1 warnings, 1 info"));
        assert!(!text.contains('\u{1b}'));
    }

    #[test]
    fn console_colors_when_asked() {
        let text = ConsoleReporter { color: true }.render(&result());
        assert!(text.contains('\u{1b}'));
    }

    #[test]
    fn json_document() {
        let json: serde_json::Value =
            serde_json::from_str(&JsonReporter.render(&result())).unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["summary"]["errors"], 1);
        assert_eq!(json["issues"][1]["id"], "missing_ifid");
        assert_eq!(json["issues"][1]["fixable"], true);
        assert_eq!(json["issues"][2]["id"], "unused_asset:x");
    }

    #[test]
    fn junit_xml() {
        let xml = JunitReporter.render(&result());
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<testsuites name=\"wls-validation\" tests=\"3\" failures=\"2\">"));
        assert!(xml.contains("<testsuite name=\"structure\" tests=\"1\">"));
        assert_eq!(xml.matches("<failure").count(), 2);
        assert!(xml.contains("&lt;IFID&gt;"));
    }

    #[test]
    fn html_page() {
        let page = HtmlReporter.render(&result());
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("Errors: 1"));
        assert!(page.contains("class=\"issue warning\""));
        assert!(page.contains("Fix available: Generate"));
        assert!(page.contains("&lt;IFID&gt;"));
    }
}
