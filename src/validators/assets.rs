use super::Validator;
use crate::issue::{Category, Fix, FixAction, Issue, Severity};
use crate::scanner::asset_references;
use crate::story::Story;
use crate::utils::{did_you_mean, human_size};

use std::collections::HashSet;

/// Assets above this many bytes are reported as large
pub const LARGE_ASSET_THRESHOLD: u64 = 5 * 1024 * 1024;

/// Checks the asset registry and every `asset://` reference against it.
///
/// A broken reference is reported once per passage and asset id, however many
/// times the passage repeats it. Ids must be unique; repeated entries are
/// reported once as `duplicate_asset_id` and otherwise skipped
pub struct AssetValidator {
    threshold: u64,
}

impl Default for AssetValidator {
    fn default() -> Self {
        AssetValidator::with_threshold(LARGE_ASSET_THRESHOLD)
    }
}

impl AssetValidator {
    pub fn with_threshold(threshold: u64) -> Self {
        AssetValidator { threshold }
    }
}

impl Validator for AssetValidator {
    fn name(&self) -> &'static str {
        "assets"
    }

    fn category(&self) -> Category {
        Category::Assets
    }

    fn validate(&self, story: &Story) -> Vec<Issue> {
        let mut issues = Vec::new();
        let mut seen = HashSet::new();
        let mut duplicates = HashSet::new();

        for (idx, asset) in story.assets.iter().enumerate() {
            let label = if asset.id.trim().is_empty() {
                format!("#{}", idx + 1)
            } else {
                asset.id.clone()
            };

            // Later entries with a repeated id are only reported as duplicates
            if !asset.id.trim().is_empty() && !seen.insert(asset.id.as_str()) {
                if duplicates.insert(asset.id.as_str()) {
                    issues.push(
                        Issue::new(
                            "duplicate_asset_id",
                            Severity::Error,
                            self.category(),
                            format!("More than one asset has the id '{}'", asset.id),
                        )
                        .scoped(&asset.id)
                        .describe("asset:// references resolve to the first asset with this id."),
                    );
                }
                continue;
            }

            if asset.id.trim().is_empty() {
                issues.push(
                    Issue::new(
                        "asset_missing_id",
                        Severity::Error,
                        self.category(),
                        format!("Asset {} has no id", label),
                    )
                    .scoped(&label)
                    .describe("Passages refer to assets as asset://<id>."),
                );
            }
            if asset.path.trim().is_empty() {
                issues.push(
                    Issue::new(
                        "asset_missing_path",
                        Severity::Error,
                        self.category(),
                        format!("Asset '{}' has no path", label),
                    )
                    .scoped(&label),
                );
            }
            if asset.name.trim().is_empty() {
                issues.push(
                    Issue::new(
                        "asset_missing_name",
                        Severity::Warning,
                        self.category(),
                        format!("Asset '{}' has no name", label),
                    )
                    .scoped(&label),
                );
            }
            if asset.mime_type.trim().is_empty() {
                issues.push(
                    Issue::new(
                        "asset_missing_mime_type",
                        Severity::Warning,
                        self.category(),
                        format!("Asset '{}' has no MIME type", label),
                    )
                    .scoped(&label)
                    .describe("Exporters use the MIME type to decide how to embed the asset."),
                );
            }
            if let Some(size) = asset.size.filter(|size| *size > self.threshold) {
                issues.push(
                    Issue::new(
                        "large_asset",
                        Severity::Warning,
                        self.category(),
                        format!(
                            "Asset '{}' is {}, larger than {}",
                            label,
                            human_size(size),
                            human_size(self.threshold)
                        ),
                    )
                    .scoped(&label)
                    .describe("Large assets slow down loading, especially on the web."),
                );
            }
        }

        let mut referenced: HashSet<&str> = HashSet::new();
        let mut reported = HashSet::new();
        for passage in &story.passages {
            for text in passage.texts() {
                for id in asset_references(text) {
                    referenced.insert(id);
                    if story.asset(id).is_some() || !reported.insert((passage.id.as_str(), id)) {
                        continue;
                    }
                    let description =
                        match did_you_mean(id, story.assets.iter().map(|a| a.id.as_str())).pop() {
                            Some(similar) => {
                                format!("Found asset with similar id: \"{}\"", similar)
                            }
                            None => "No registered asset has this id.".to_string(),
                        };
                    issues.push(
                        Issue::new(
                            "broken_asset_reference",
                            Severity::Error,
                            self.category(),
                            format!("Broken asset reference: asset://{}", id),
                        )
                        .scoped(&format!("{}:{}", passage.id, id))
                        .in_passage(&passage.id)
                        .describe(description),
                    );
                }
            }
        }

        let mut unused = HashSet::new();
        for asset in &story.assets {
            let id = asset.id.as_str();
            if id.trim().is_empty() || referenced.contains(id) || !unused.insert(id) {
                continue;
            }
            // Removes every entry with this id, duplicates included
            issues.push(
                Issue::new(
                    "unused_asset",
                    Severity::Info,
                    self.category(),
                    format!("Asset '{}' is never referenced", id),
                )
                .scoped(id)
                .with_fix(Fix::new(
                    format!("Remove asset '{}' from the story", id),
                    FixAction::RemoveAsset {
                        asset_id: id.to_string(),
                    },
                )),
            );
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::story::{Asset, Passage};

    fn asset(id: &str) -> Asset {
        Asset {
            id: id.into(),
            name: id.into(),
            path: format!("{}.png", id),
            mime_type: "image/png".into(),
            size: Some(1024),
        }
    }

    fn passage(id: &str, content: &str) -> Passage {
        Passage {
            id: id.into(),
            content: content.into(),
            ..Passage::default()
        }
    }

    #[test]
    fn registry_entries() {
        let mut story = Story::default();
        let mut huge = asset("huge");
        huge.size = Some(LARGE_ASSET_THRESHOLD + 1);
        story.assets = vec![
            Asset {
                path: String::new(),
                ..Asset::default()
            },
            huge,
        ];
        story.passages = vec![passage("p", "asset://huge")];

        let codes: Vec<_> = AssetValidator::default()
            .validate(&story)
            .into_iter()
            .map(|i| (i.code, i.severity))
            .collect();
        assert_eq!(
            codes,
            vec![
                ("asset_missing_id", Severity::Error),
                ("asset_missing_path", Severity::Error),
                ("asset_missing_name", Severity::Warning),
                ("asset_missing_mime_type", Severity::Warning),
                ("large_asset", Severity::Warning),
            ]
        );
    }

    #[test]
    fn threshold_is_configurable() {
        let mut story = Story::default();
        story.assets = vec![asset("bg")];
        story.passages = vec![passage("p", "asset://bg")];
        assert!(AssetValidator::default().validate(&story).is_empty());
        let issues = AssetValidator::with_threshold(512).validate(&story);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].id, "large_asset:bg");
    }

    #[test]
    fn references_in_scripts_count() {
        let mut story = Story::default();
        story.assets = vec![asset("music"), asset("sfx")];
        let mut p = passage("p", "no assets here");
        p.on_enter_script = Some("play(\"asset://music\")".into());
        p.on_exit_script = Some("play(\"asset://sfx\")".into());
        story.passages = vec![p];
        assert!(AssetValidator::default().validate(&story).is_empty());
    }

    #[test]
    fn duplicate_ids_are_reported_once() {
        let mut story = Story::default();
        let mut second = asset("bg");
        second.path = String::new();
        story.assets = vec![asset("bg"), second, asset("bg")];
        story.passages = vec![passage("p", "asset://bg")];

        let issues = AssetValidator::default().validate(&story);
        let ids: Vec<_> = issues.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["duplicate_asset_id:bg"]);
        assert_eq!(issues[0].severity, Severity::Error);
    }

    #[test]
    fn unused_duplicate_is_removed_with_one_fix() {
        let mut story = Story::default();
        story.assets = vec![asset("bg"), asset("bg")];
        let validator = AssetValidator::default();

        let issues = validator.validate(&story);
        let unused: Vec<_> = issues.iter().filter(|i| i.code == "unused_asset").collect();
        assert_eq!(unused.len(), 1);
        unused[0].fix.as_ref().unwrap().apply(&mut story);

        assert!(story.assets.is_empty());
        assert!(validator.validate(&story).is_empty());
    }

    #[test]
    fn broken_references_are_reported_once_per_passage() {
        let mut story = Story::default();
        story.assets = vec![asset("hero")];
        story.passages = vec![
            passage("a", "asset://hero asset://heroo asset://heroo"),
            passage("b", "asset://heroo"),
        ];
        let issues = AssetValidator::default().validate(&story);
        let ids: Vec<_> = issues.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "broken_asset_reference:a:heroo",
                "broken_asset_reference:b:heroo"
            ]
        );
        assert!(issues[0].description.contains("\"hero\""));
    }
}
