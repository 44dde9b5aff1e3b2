use super::Validator;
use crate::issue::{Category, Fix, FixAction, Issue, Severity};
use crate::reserved;
use crate::scanner::variable_names;
use crate::story::Story;

use std::collections::HashSet;

/// Checks declared variables against their uses and against the reserved
/// words of a language version
pub struct VariableValidator {
    version: &'static str,
}

impl Default for VariableValidator {
    fn default() -> Self {
        VariableValidator {
            version: reserved::TARGET_VERSION,
        }
    }
}

impl VariableValidator {
    /// Checks names against `version`'s reserved words. Unknown versions
    /// reserve nothing
    pub fn for_version(version: &'static str) -> Self {
        VariableValidator { version }
    }
}

impl Validator for VariableValidator {
    fn name(&self) -> &'static str {
        "variables"
    }

    fn category(&self) -> Category {
        Category::Variables
    }

    fn validate(&self, story: &Story) -> Vec<Issue> {
        let mut issues = Vec::new();

        let declared: Vec<&str> = story
            .variables
            .iter()
            .map(|v| v.bare_name())
            .collect();

        let mut reported = HashSet::new();
        for name in declared.iter().copied() {
            if reserved::is_reserved(self.version, name) && reported.insert(name) {
                issues.push(
                    Issue::new(
                        "reserved_variable_name",
                        Severity::Error,
                        self.category(),
                        format!("Variable '${}' uses a reserved word", name),
                    )
                    .scoped(name)
                    .for_variable(name)
                    .describe(format!(
                        "WLS {} reserves '{}'. Run wls-migrate to rename it to ${}.",
                        self.version,
                        name.to_lowercase(),
                        reserved::migrated_name(name)
                    )),
                );
            }
        }

        // First passage each variable is referenced in, in story order
        let mut referenced: Vec<(&str, &str)> = Vec::new();
        let mut seen = HashSet::new();
        for passage in &story.passages {
            let choice_texts = passage
                .choices
                .iter()
                .flat_map(|c| c.condition.as_deref().into_iter().chain(c.action.as_deref()));
            for text in passage.texts().chain(choice_texts) {
                for name in variable_names(text) {
                    if seen.insert(name) {
                        referenced.push((name, passage.id.as_str()));
                    }
                }
            }
        }

        for (name, passage_id) in &referenced {
            if !declared.contains(name) {
                issues.push(
                    Issue::new(
                        "undefined_variable",
                        Severity::Warning,
                        self.category(),
                        format!("Variable '${}' is used but never declared", name),
                    )
                    .scoped(name)
                    .for_variable(name)
                    .in_passage(passage_id)
                    .describe("Undeclared variables start out unset, which may not be intended.")
                    .with_fix(Fix::new(
                        format!("Declare ${}", name),
                        FixAction::DeclareVariable {
                            name: name.to_string(),
                        },
                    )),
                );
            }
        }

        // Every declaration sharing a bare name is covered by one issue, and
        // its fix removes all of them
        let mut reported = HashSet::new();
        for name in declared.iter().copied() {
            if name.is_empty() || seen.contains(name) || !reported.insert(name) {
                continue;
            }
            issues.push(
                Issue::new(
                    "unused_variable",
                    Severity::Info,
                    self.category(),
                    format!("Variable '${}' is declared but never used", name),
                )
                .scoped(name)
                .for_variable(name)
                .with_fix(Fix::new(
                    format!("Remove the declaration of ${}", name),
                    FixAction::RemoveVariable {
                        name: name.to_string(),
                    },
                )),
            );
        }

        issues
    }
}
