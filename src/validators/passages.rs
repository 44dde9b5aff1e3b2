use super::Validator;
use crate::issue::{Category, Issue, Severity};
use crate::story::Story;

use std::collections::HashSet;

/// Passage ids must be present and unique. Empty passages are reported as info
pub struct PassageValidator;

impl Validator for PassageValidator {
    fn name(&self) -> &'static str {
        "passages"
    }

    fn category(&self) -> Category {
        Category::Content
    }

    fn validate(&self, story: &Story) -> Vec<Issue> {
        let mut issues = Vec::new();
        let mut seen = HashSet::new();
        let mut duplicates = HashSet::new();

        for (idx, passage) in story.passages.iter().enumerate() {
            let id = passage.id.as_str();
            if id.trim().is_empty() {
                issues.push(
                    Issue::new(
                        "passage_missing_id",
                        Severity::Error,
                        self.category(),
                        format!("Passage #{} has no id", idx + 1),
                    )
                    .scoped(&format!("#{}", idx + 1))
                    .describe("Choices and the start passage refer to passages by id."),
                );
                continue;
            }

            if !seen.insert(id) {
                if duplicates.insert(id) {
                    issues.push(
                        Issue::new(
                            "duplicate_passage_id",
                            Severity::Error,
                            Category::Structure,
                            format!("More than one passage has the id '{}'", id),
                        )
                        .scoped(id)
                        .in_passage(id)
                        .describe("Only the first passage with this id can be reached."),
                    );
                }
                continue;
            }

            if passage.content.trim().is_empty() && passage.choices.is_empty() {
                issues.push(
                    Issue::new(
                        "empty_passage",
                        Severity::Info,
                        self.category(),
                        format!("Passage '{}' is empty", id),
                    )
                    .scoped(id)
                    .in_passage(id)
                    .describe("It has no text and no choices, so play ends here."),
                );
            }
        }

        issues
    }
}
