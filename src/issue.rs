//! Validation issues and the fixes some of them carry

use crate::story::{bare_variable_name, Story, Variable};

use serde::{Serialize, Serializer};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Structure,
    Links,
    Content,
    Variables,
    Metadata,
    Assets,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::Structure => "structure",
            Category::Links => "links",
            Category::Content => "content",
            Category::Variables => "variables",
            Category::Metadata => "metadata",
            Category::Assets => "assets",
        })
    }
}

/// One rule violation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Unique within one validation run. Singleton issues use their code;
    /// per-entity issues append the entity, e.g. `unused_asset:bg`
    pub id: String,
    /// The rule code, shared by every issue of the same kind
    pub code: &'static str,
    pub severity: Severity,
    pub category: Category,
    pub message: String,
    pub description: String,
    #[serde(rename = "fixable", serialize_with = "serialize_fixable")]
    pub fix: Option<Fix>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passage_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choice_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable_name: Option<String>,
}

fn serialize_fixable<S: Serializer>(fix: &Option<Fix>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_bool(fix.is_some())
}

impl Issue {
    pub fn new(
        code: &'static str,
        severity: Severity,
        category: Category,
        message: impl Into<String>,
    ) -> Self {
        Issue {
            id: code.to_string(),
            code,
            severity,
            category,
            message: message.into(),
            description: String::new(),
            fix: None,
            passage_id: None,
            choice_id: None,
            variable_name: None,
        }
    }

    /// Scopes the id to an entity: `code:entity`
    pub fn scoped(mut self, entity: &str) -> Self {
        self.id = format!("{}:{}", self.id, entity);
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_fix(mut self, fix: Fix) -> Self {
        self.fix = Some(fix);
        self
    }

    pub fn in_passage(mut self, passage_id: &str) -> Self {
        self.passage_id = Some(passage_id.to_string());
        self
    }

    pub fn on_choice(mut self, choice_id: &str) -> Self {
        self.choice_id = Some(choice_id.to_string());
        self
    }

    pub fn for_variable(mut self, name: &str) -> Self {
        self.variable_name = Some(name.to_string());
        self
    }

    pub fn is_fixable(&self) -> bool {
        self.fix.is_some()
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// A self-contained repair for one issue
#[derive(Debug, Clone, PartialEq)]
pub struct Fix {
    pub description: String,
    pub action: FixAction,
}

/// The mutation a fix performs. Each action names exactly the entity it
/// touches, so it can be applied long after the issue was reported
#[derive(Debug, Clone, PartialEq)]
pub enum FixAction {
    SetStartPassage {
        passage_id: String,
    },
    /// Assigns a freshly generated IFID if the story's IFID is still
    /// `replacing` (`None` meaning unset)
    GenerateIfid {
        replacing: Option<String>,
    },
    RetargetChoice {
        passage_id: String,
        choice_id: String,
        target: String,
    },
    DeclareVariable {
        name: String,
    },
    RemoveVariable {
        name: String,
    },
    RemoveAsset {
        asset_id: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FixOutcome {
    Applied,
    /// The story is already in the state the fix produces; nothing changed
    AlreadyApplied,
}

impl Fix {
    pub fn new(description: impl Into<String>, action: FixAction) -> Self {
        Fix {
            description: description.into(),
            action,
        }
    }

    /// Applies the fix. Applying the same fix again is a no-op
    pub fn apply(&self, story: &mut Story) -> FixOutcome {
        let outcome = match &self.action {
            FixAction::SetStartPassage { passage_id } => {
                if story.start_passage == *passage_id {
                    FixOutcome::AlreadyApplied
                } else {
                    story.start_passage = passage_id.clone();
                    FixOutcome::Applied
                }
            }
            FixAction::GenerateIfid { replacing } => {
                if story.ifid() == replacing.as_deref().map(str::trim) {
                    story.metadata.ifid = Some(crate::validators::ifid::generate_ifid());
                    FixOutcome::Applied
                } else {
                    FixOutcome::AlreadyApplied
                }
            }
            FixAction::RetargetChoice {
                passage_id,
                choice_id,
                target,
            } => match story
                .passage_mut(passage_id)
                .and_then(|p| p.choice_mut(choice_id))
            {
                Some(choice) if choice.target != *target => {
                    choice.target = target.clone();
                    FixOutcome::Applied
                }
                _ => FixOutcome::AlreadyApplied,
            },
            FixAction::DeclareVariable { name } => {
                if story.variable(name).is_some() {
                    FixOutcome::AlreadyApplied
                } else {
                    story.variables.push(Variable {
                        name: name.clone(),
                        initial: serde_json::Value::Null,
                    });
                    FixOutcome::Applied
                }
            }
            FixAction::RemoveVariable { name } => {
                let name = bare_variable_name(name);
                let before = story.variables.len();
                story.variables.retain(|v| v.bare_name() != name);
                removal_outcome(before, story.variables.len())
            }
            FixAction::RemoveAsset { asset_id } => {
                let before = story.assets.len();
                story.assets.retain(|a| a.id != *asset_id);
                removal_outcome(before, story.assets.len())
            }
        };
        debug!(fix = %self.description, ?outcome, "applied fix");
        outcome
    }
}

fn removal_outcome(before: usize, after: usize) -> FixOutcome {
    if after < before {
        FixOutcome::Applied
    } else {
        FixOutcome::AlreadyApplied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::story::{Asset, Choice, Passage};

    #[test]
    fn scoped_ids() {
        let issue = Issue::new("unused_asset", Severity::Info, Category::Assets, "x").scoped("bg");
        assert_eq!(issue.id, "unused_asset:bg");
        assert_eq!(issue.code, "unused_asset");
        assert!(!issue.is_fixable());
    }

    #[test]
    fn serializes_fixable_flag() {
        let issue = Issue::new("missing_ifid", Severity::Warning, Category::Metadata, "m")
            .with_fix(Fix::new("gen", FixAction::GenerateIfid { replacing: None }));
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["fixable"], serde_json::Value::Bool(true));
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["category"], "metadata");
        assert!(json.get("passageId").is_none());
    }

    #[test]
    fn reapplying_is_a_no_op() {
        let mut story = Story::default();
        story.assets = vec![
            Asset {
                id: "a".into(),
                ..Asset::default()
            },
            Asset {
                id: "b".into(),
                ..Asset::default()
            },
        ];
        let fix = Fix::new(
            "remove",
            FixAction::RemoveAsset {
                asset_id: "a".into(),
            },
        );
        assert_eq!(fix.apply(&mut story), FixOutcome::Applied);
        assert_eq!(fix.apply(&mut story), FixOutcome::AlreadyApplied);
        assert_eq!(story.assets.len(), 1);
    }

    #[test]
    fn ifid_fix_only_replaces_the_reported_value() {
        let mut story = Story::default();
        story.metadata.ifid = Some("bad".into());
        let fix = Fix::new(
            "regen",
            FixAction::GenerateIfid {
                replacing: Some("bad".into()),
            },
        );
        assert_eq!(fix.apply(&mut story), FixOutcome::Applied);
        let first = story.metadata.ifid.clone();
        assert_ne!(first.as_deref(), Some("bad"));
        assert_eq!(fix.apply(&mut story), FixOutcome::AlreadyApplied);
        assert_eq!(story.metadata.ifid, first);
    }

    #[test]
    fn retarget_and_variables() {
        let mut story = Story::default();
        story.passages.push(Passage {
            id: "p".into(),
            choices: vec![Choice {
                id: "c".into(),
                target: "Shp".into(),
                ..Choice::default()
            }],
            ..Passage::default()
        });
        let retarget = Fix::new(
            "retarget",
            FixAction::RetargetChoice {
                passage_id: "p".into(),
                choice_id: "c".into(),
                target: "Shop".into(),
            },
        );
        assert_eq!(retarget.apply(&mut story), FixOutcome::Applied);
        assert_eq!(story.passages[0].choices[0].target, "Shop");
        assert_eq!(retarget.apply(&mut story), FixOutcome::AlreadyApplied);

        let declare = Fix::new("declare", FixAction::DeclareVariable { name: "gold".into() });
        assert_eq!(declare.apply(&mut story), FixOutcome::Applied);
        assert_eq!(declare.apply(&mut story), FixOutcome::AlreadyApplied);
        let remove = Fix::new("remove", FixAction::RemoveVariable { name: "gold".into() });
        assert_eq!(remove.apply(&mut story), FixOutcome::Applied);
        assert!(story.variables.is_empty());
    }

    #[test]
    fn removals_take_every_matching_entry() {
        let mut story = Story::default();
        for name in &["$gold", "gold", "keys"] {
            story.variables.push(Variable {
                name: name.to_string(),
                initial: serde_json::Value::Null,
            });
        }
        for id in &["bg", "bg", "music"] {
            story.assets.push(Asset {
                id: id.to_string(),
                ..Asset::default()
            });
        }

        let remove = Fix::new("remove", FixAction::RemoveVariable { name: "gold".into() });
        assert_eq!(remove.apply(&mut story), FixOutcome::Applied);
        let names: Vec<_> = story.variables.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["keys"]);

        let remove = Fix::new(
            "remove",
            FixAction::RemoveAsset {
                asset_id: "bg".into(),
            },
        );
        assert_eq!(remove.apply(&mut story), FixOutcome::Applied);
        assert_eq!(remove.apply(&mut story), FixOutcome::AlreadyApplied);
        let ids: Vec<_> = story.assets.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["music"]);
    }
}
