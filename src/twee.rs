//! Imports Twee 3 source into the story model
//!
//! Passage links become choices so the link and reachability checks work on
//! Twee stories the same way they do on editor JSON.

use crate::story::{Choice, Passage, Story, StoryMetadata};

use color_eyre::Result;
use eyre::eyre;
use std::path::Path;
use tracing::warn;

/// Parses a `.twee`/`.tw` file into a story
pub fn load(path: &Path) -> Result<Story> {
    let (result, warnings) = tweep::Story::from_paths(&[path]).take();
    for warning in &warnings {
        warn!(file = %path.display(), "{}", warning);
    }

    let twee = result.map_err(|e| {
        let errors: Vec<String> = e.error_list.errors.iter().map(|e| e.to_string()).collect();
        eyre!("Failed to parse {}: {}", path.display(), errors.join("; "))
    })?;

    Ok(from_twee(&twee))
}

/// Converts a parsed Twee story. Passages are ordered by pid
pub fn from_twee(twee: &tweep::Story) -> Story {
    let mut passages: Vec<(usize, Passage)> = twee
        .passages
        .iter()
        .map(|(name, twine)| {
            let content = twine.content.content.clone();
            let choices = links(&content)
                .into_iter()
                .enumerate()
                .map(|(idx, (text, target))| Choice {
                    id: format!("{}#{}", name, idx + 1),
                    text,
                    target,
                    condition: None,
                    action: None,
                })
                .collect();
            let passage = Passage {
                id: name.clone(),
                title: name.clone(),
                content,
                choices,
                on_enter_script: None,
                on_exit_script: None,
                tags: twine.header.tags.clone(),
            };
            (twine.content.pid, passage)
        })
        .collect();
    passages.sort_by_key(|(pid, _)| *pid);

    let data = twee.data.as_ref();
    Story {
        metadata: StoryMetadata {
            title: twee.title.clone().unwrap_or_default(),
            author: None,
            ifid: data.map(|d| d.ifid.clone()),
            version: None,
            format: data.and_then(|d| d.format.clone()),
        },
        start_passage: twee
            .get_start_passage_name()
            .map(str::to_string)
            .unwrap_or_default(),
        passages: passages.into_iter().map(|(_, p)| p).collect(),
        variables: Vec::new(),
        assets: Vec::new(),
    }
}

/// `(text, target)` for every `[[link]]` in `content`
///
/// Handles `[[text|target]]`, `[[text->target]]`, `[[target<-text]]` and
/// `[[target]]`. Targets are trimmed.
pub fn links(content: &str) -> Vec<(String, String)> {
    crate::regex!(r"\[\[(.*?)\]\]")
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|m| {
            let inner = m.as_str();
            let (text, target) = if let Some(idx) = inner.find('|') {
                (&inner[..idx], &inner[idx + 1..])
            } else if let Some(idx) = inner.rfind("->") {
                (&inner[..idx], &inner[idx + 2..])
            } else if let Some(idx) = inner.find("<-") {
                (&inner[idx + 2..], &inner[..idx])
            } else {
                (inner, inner)
            };
            (text.trim().to_string(), target.trim().to_string())
        })
        .collect()
}
