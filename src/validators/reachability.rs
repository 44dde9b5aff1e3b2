use super::Validator;
use crate::issue::{Category, Issue, Severity};
use crate::scanner::{ConstructKind, Scanner};
use crate::story::Story;

use std::collections::{HashSet, VecDeque};

/// Every passage should be reachable from the start passage through choices
/// or tunnel calls. Says nothing while the start passage is unresolved
pub struct ReachabilityValidator;

impl Validator for ReachabilityValidator {
    fn name(&self) -> &'static str {
        "reachability"
    }

    fn category(&self) -> Category {
        Category::Structure
    }

    fn validate(&self, story: &Story) -> Vec<Issue> {
        let start = match story.passage(&story.start_passage) {
            Some(start) => start,
            None => return Vec::new(),
        };

        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(start.id.as_str());
        queue.push_back(start);

        while let Some(passage) = queue.pop_front() {
            let tunnels: Vec<String> = Scanner::new(&passage.content)
                .constructs(ConstructKind::TunnelCall)
                .into_iter()
                .filter_map(|call| call.name)
                .collect();
            let targets = passage
                .choices
                .iter()
                .map(|c| c.target.trim())
                .chain(tunnels.iter().map(String::as_str));
            for target in targets {
                if let Some(next) = story.passage(target) {
                    if visited.insert(next.id.as_str()) {
                        queue.push_back(next);
                    }
                }
            }
        }

        let mut reported = HashSet::new();
        story
            .passages
            .iter()
            .filter(|p| !p.id.trim().is_empty())
            .filter(|p| !visited.contains(p.id.as_str()))
            .filter(|p| reported.insert(p.id.as_str()))
            .map(|p| {
                Issue::new(
                    "unreachable_passage",
                    Severity::Warning,
                    self.category(),
                    format!("Passage '{}' cannot be reached from the start passage", p.id),
                )
                .scoped(&p.id)
                .in_passage(&p.id)
                .describe("No choice or tunnel call on any path from the start leads here.")
            })
            .collect()
    }
}
