use super::Validator;
use crate::issue::{Category, Fix, FixAction, Issue, Severity};
use crate::story::Story;

/// The story must name a start passage, and that passage must exist
pub struct StartPassageValidator;

impl Validator for StartPassageValidator {
    fn name(&self) -> &'static str {
        "start_passage"
    }

    fn category(&self) -> Category {
        Category::Structure
    }

    fn validate(&self, story: &Story) -> Vec<Issue> {
        // Both problems are fixed the same way when there is somewhere to start
        let fix = story
            .passages
            .iter()
            .find(|p| !p.id.trim().is_empty())
            .map(|p| {
                Fix::new(
                    format!("Use '{}' as the start passage", p.id),
                    FixAction::SetStartPassage {
                        passage_id: p.id.clone(),
                    },
                )
            });

        let start = story.start_passage.trim();
        let issue = if start.is_empty() {
            Issue::new(
                "missing_start_passage",
                Severity::Error,
                self.category(),
                "No start passage defined",
            )
            .describe("Play cannot begin until the story names the passage it starts at.")
        } else if !story.has_passage(&story.start_passage) {
            Issue::new(
                "start_passage_not_found",
                Severity::Error,
                self.category(),
                "Start passage does not exist",
            )
            .describe(format!(
                "The start passage '{}' is not a passage in this story.",
                story.start_passage
            ))
            .in_passage(&story.start_passage)
        } else {
            return Vec::new();
        };

        vec![match fix {
            Some(fix) => issue.with_fix(fix),
            None => issue,
        }]
    }
}
