//! Story validation
//!
//! Each [`Validator`] checks one invariant and returns issues as data. The
//! [`StoryValidator`] runs a fixed set of them in registration order.
//! Validators never mutate the story; only [`Fix::apply`] does.
//!
//! [`Validator`]: trait.Validator.html
//! [`StoryValidator`]: struct.StoryValidator.html
//! [`Fix::apply`]: ../issue/struct.Fix.html#method.apply

use crate::issue::{Category, FixOutcome, Issue, Severity};
use crate::story::Story;

use serde::Serialize;
use tracing::debug;

pub mod assets;
pub mod ifid;
pub mod links;
pub mod passages;
pub mod reachability;
pub mod start_passage;
pub mod variables;

pub use assets::AssetValidator;
pub use ifid::IfidValidator;
pub use links::LinkValidator;
pub use passages::PassageValidator;
pub use reachability::ReachabilityValidator;
pub use start_passage::StartPassageValidator;
pub use variables::VariableValidator;

/// One validation rule. Implementations must be pure functions of the story
pub trait Validator: Send + Sync {
    fn name(&self) -> &'static str;
    fn category(&self) -> Category;
    fn validate(&self, story: &Story) -> Vec<Issue>;
}

/// Aggregated output of a validation run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    /// True iff no issue has error severity
    pub valid: bool,
    pub issues: Vec<Issue>,
}

impl ValidationResult {
    pub fn new(issues: Vec<Issue>) -> Self {
        let valid = !issues.iter().any(Issue::is_error);
        ValidationResult { valid, issues }
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.severity == severity)
    }

    pub fn with_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a Issue> + 'a {
        self.issues.iter().filter(move |i| i.code == code)
    }

    pub fn get(&self, id: &str) -> Option<&Issue> {
        self.issues.iter().find(|i| i.id == id)
    }

    pub fn fixable(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.is_fixable())
    }
}

/// Runs every registered validator over a story
pub struct StoryValidator {
    validators: Vec<Box<dyn Validator>>,
}

impl Default for StoryValidator {
    fn default() -> Self {
        StoryValidator::with_large_asset_threshold(assets::LARGE_ASSET_THRESHOLD)
    }
}

impl StoryValidator {
    /// The standard rule set with a custom large-asset threshold, in bytes
    pub fn with_large_asset_threshold(threshold: u64) -> Self {
        StoryValidator::empty()
            .register(StartPassageValidator)
            .register(IfidValidator)
            .register(PassageValidator)
            .register(LinkValidator)
            .register(ReachabilityValidator)
            .register(VariableValidator::default())
            .register(AssetValidator::with_threshold(threshold))
    }

    pub fn empty() -> Self {
        StoryValidator {
            validators: Vec::new(),
        }
    }

    pub fn register<V: Validator + 'static>(mut self, validator: V) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.validators.iter().map(|v| v.name())
    }

    pub fn validate(&self, story: &Story) -> ValidationResult {
        let mut issues = Vec::new();
        for validator in &self.validators {
            let found = validator.validate(story);
            debug!(
                validator = validator.name(),
                category = %validator.category(),
                issues = found.len(),
                "ran validator"
            );
            issues.extend(found);
        }
        ValidationResult::new(issues)
    }

    /// Validates the story, then applies every available fix once.
    /// Returns the id and outcome of each fix attempted
    pub fn apply_fixes(&self, story: &mut Story) -> Vec<(String, FixOutcome)> {
        let result = self.validate(story);
        result
            .issues
            .iter()
            .filter_map(|issue| {
                issue
                    .fix
                    .as_ref()
                    .map(|fix| (issue.id.clone(), fix.apply(story)))
            })
            .collect()
    }
}
