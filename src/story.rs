//! The story model the validators inspect
//!
//! Stories are stored as camelCase JSON, the same shape the editor saves.

use color_eyre::Result;
use eyre::WrapErr;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    #[serde(default)]
    pub metadata: StoryMetadata,

    /// Id of the passage play begins at. Empty if unset
    #[serde(default)]
    pub start_passage: String,

    #[serde(default)]
    pub passages: Vec<Passage>,

    #[serde(default)]
    pub variables: Vec<Variable>,

    #[serde(default)]
    pub assets: Vec<Asset>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryMetadata {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Interactive Fiction IDentifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ifid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Passage {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_enter_script: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_exit_script: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Passage {
    /// Body text and both scripts, skipping scripts that are unset
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.content.as_str())
            .chain(self.on_enter_script.as_deref())
            .chain(self.on_exit_script.as_deref())
    }

    pub fn choice_mut(&mut self, id: &str) -> Option<&mut Choice> {
        self.choices.iter_mut().find(|c| c.id == id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub text: String,
    /// Id of the passage this choice leads to
    #[serde(default)]
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub name: String,
    #[serde(default)]
    pub initial: serde_json::Value,
}

impl Variable {
    /// The declared name without surrounding whitespace or a leading `$`
    pub fn bare_name(&self) -> &str {
        bare_variable_name(&self.name)
    }
}

/// `name` without surrounding whitespace or a leading `$`
pub fn bare_variable_name(name: &str) -> &str {
    name.trim().trim_start_matches('$')
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub mime_type: String,
    /// Size in bytes, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl Story {
    pub fn from_json(json: &str) -> Result<Self> {
        let story = serde_json::from_str(json).wrap_err_with(|| "Failed to parse story JSON")?;
        Ok(story)
    }

    pub fn to_json(&self) -> Result<String> {
        let json = serde_json::to_string_pretty(self)?;
        Ok(json)
    }

    /// Loads a story from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read story file {}", path.display()))?;
        Story::from_json(&contents).wrap_err_with(|| format!("In story file {}", path.display()))
    }

    /// Saves a story as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)
            .wrap_err_with(|| format!("Failed to write story file {}", path.display()))
    }

    pub fn passage(&self, id: &str) -> Option<&Passage> {
        self.passages.iter().find(|p| p.id == id)
    }

    pub fn passage_mut(&mut self, id: &str) -> Option<&mut Passage> {
        self.passages.iter_mut().find(|p| p.id == id)
    }

    pub fn has_passage(&self, id: &str) -> bool {
        self.passage(id).is_some()
    }

    pub fn asset(&self, id: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == id)
    }

    /// Looks a variable up by name. `$gold` and `gold` name the same variable
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        let name = bare_variable_name(name);
        self.variables.iter().find(|v| v.bare_name() == name)
    }

    /// The IFID, unless it is unset or blank
    pub fn ifid(&self) -> Option<&str> {
        self.metadata
            .ifid
            .as_deref()
            .map(str::trim)
            .filter(|ifid| !ifid.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let story = Story::from_json(r#"{ "passages": [ { "id": "a" } ] }"#).unwrap();
        assert_eq!(story.start_passage, "");
        assert_eq!(story.metadata.title, "");
        assert_eq!(story.metadata.ifid, None);
        assert_eq!(story.passages.len(), 1);
        assert!(story.passages[0].choices.is_empty());
        assert!(story.assets.is_empty());
    }

    #[test]
    fn camel_case_fields() {
        let json = r#"{
            "startPassage": "start",
            "passages": [ {
                "id": "start",
                "content": "hi",
                "onEnterScript": "$seen = true",
                "choices": [ { "id": "c1", "text": "Go", "target": "end" } ]
            } ],
            "assets": [ { "id": "bg", "path": "bg.png", "mimeType": "image/png", "size": 12 } ]
        }"#;
        let story = Story::from_json(json).unwrap();
        assert_eq!(story.start_passage, "start");
        let passage = story.passage("start").unwrap();
        assert_eq!(passage.on_enter_script.as_deref(), Some("$seen = true"));
        assert_eq!(passage.choices[0].target, "end");
        assert_eq!(story.asset("bg").unwrap().mime_type, "image/png");
        assert_eq!(passage.texts().count(), 2);
    }

    #[test]
    fn blank_ifid_is_missing() {
        let mut story = Story::default();
        story.metadata.ifid = Some("  ".into());
        assert_eq!(story.ifid(), None);
        story.metadata.ifid = Some("abc".into());
        assert_eq!(story.ifid(), Some("abc"));
    }

    #[test]
    fn json_round_trip_keeps_shape() {
        let mut story = Story::default();
        story.start_passage = "a".into();
        let json = story.to_json().unwrap();
        assert!(json.contains("\"startPassage\": \"a\""));
        assert_eq!(Story::from_json(&json).unwrap(), story);
    }
}
