use super::Validator;
use crate::issue::{Category, Fix, FixAction, Issue, Severity};
use crate::story::Story;
use crate::utils::did_you_mean;

/// Every choice must lead to a passage that exists
pub struct LinkValidator;

impl Validator for LinkValidator {
    fn name(&self) -> &'static str {
        "links"
    }

    fn category(&self) -> Category {
        Category::Links
    }

    fn validate(&self, story: &Story) -> Vec<Issue> {
        let mut issues = Vec::new();

        for passage in &story.passages {
            for choice in &passage.choices {
                let entity = format!("{}:{}", passage.id, choice.id);
                let target = choice.target.trim();

                if target.is_empty() {
                    issues.push(
                        Issue::new(
                            "empty_choice_target",
                            Severity::Error,
                            self.category(),
                            format!(
                                "Choice '{}' in passage '{}' has no target",
                                choice.text, passage.id
                            ),
                        )
                        .scoped(&entity)
                        .in_passage(&passage.id)
                        .on_choice(&choice.id),
                    );
                    continue;
                }

                if story.has_passage(target) {
                    continue;
                }

                let suggestion =
                    did_you_mean(target, story.passages.iter().map(|p| p.id.as_str())).pop();
                let mut issue = Issue::new(
                    "dead_link",
                    Severity::Error,
                    self.category(),
                    format!(
                        "Choice '{}' links to missing passage '{}'",
                        choice.text, target
                    ),
                )
                .scoped(&entity)
                .in_passage(&passage.id)
                .on_choice(&choice.id);

                issue = match suggestion {
                    Some(similar) => issue
                        .describe(format!("Found passage with similar name: \"{}\"", similar))
                        .with_fix(Fix::new(
                            format!("Point the choice at '{}'", similar),
                            FixAction::RetargetChoice {
                                passage_id: passage.id.clone(),
                                choice_id: choice.id.clone(),
                                target: similar,
                            },
                        )),
                    None => issue.describe("No passage in the story has this id."),
                };
                issues.push(issue);
            }
        }

        issues
    }
}
