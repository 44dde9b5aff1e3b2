use super::Validator;
use crate::issue::{Category, Fix, FixAction, Issue, Severity};
use crate::story::Story;

use uuid::Uuid;

/// True if `ifid` has the shape of a version-4 UUID. Hex digits may be either case
pub fn is_valid_ifid(ifid: &str) -> bool {
    crate::regex!(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$")
        .is_match(ifid)
}

/// A fresh random IFID, uppercase as Twine writes them
pub fn generate_ifid() -> String {
    Uuid::new_v4().to_string().to_uppercase()
}

/// The story should carry a well-formed IFID
pub struct IfidValidator;

impl Validator for IfidValidator {
    fn name(&self) -> &'static str {
        "ifid"
    }

    fn category(&self) -> Category {
        Category::Metadata
    }

    fn validate(&self, story: &Story) -> Vec<Issue> {
        match story.ifid() {
            None => vec![Issue::new(
                "missing_ifid",
                Severity::Warning,
                self.category(),
                "Story has no IFID",
            )
            .describe("An IFID identifies the story to archives and players across versions.")
            .with_fix(Fix::new(
                "Generate a new IFID",
                FixAction::GenerateIfid { replacing: None },
            ))],
            Some(ifid) if !is_valid_ifid(ifid) => vec![Issue::new(
                "invalid_ifid",
                Severity::Error,
                self.category(),
                format!("IFID '{}' is not a valid version 4 UUID", ifid),
            )
            .describe("IFIDs must look like XXXXXXXX-XXXX-4XXX-YXXX-XXXXXXXXXXXX.")
            .with_fix(Fix::new(
                "Replace it with a newly generated IFID",
                FixAction::GenerateIfid {
                    replacing: Some(ifid.to_string()),
                },
            ))],
            Some(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_check() {
        assert!(is_valid_ifid("d674c58c-defa-4f70-b7a2-27742230c0fc"));
        assert!(is_valid_ifid("D674C58C-DEFA-4F70-B7A2-27742230C0FC"));
        // version nibble must be 4
        assert!(!is_valid_ifid("D674C58C-DEFA-1F70-B7A2-27742230C0FC"));
        // variant nibble must be 8, 9, a or b
        assert!(!is_valid_ifid("D674C58C-DEFA-4F70-C7A2-27742230C0FC"));
        assert!(!is_valid_ifid("invalid-uuid"));
    }

    #[test]
    fn generated_ifids_are_valid() {
        for _ in 0..16 {
            assert!(is_valid_ifid(&generate_ifid()));
        }
    }

    #[test]
    fn missing_ifid_is_a_fixable_warning() {
        let mut story = Story::default();
        let issues = IfidValidator.validate(&story);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].id, "missing_ifid");
        assert_eq!(issues[0].severity, Severity::Warning);

        issues[0].fix.as_ref().unwrap().apply(&mut story);
        assert!(IfidValidator.validate(&story).is_empty());
    }

    #[test]
    fn invalid_ifid_is_a_fixable_error() {
        let mut story = Story::default();
        story.metadata.ifid = Some("invalid-uuid".into());
        let issues = IfidValidator.validate(&story);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].id, "invalid_ifid");
        assert_eq!(issues[0].severity, Severity::Error);

        issues[0].fix.as_ref().unwrap().apply(&mut story);
        assert!(is_valid_ifid(story.ifid().unwrap()));
        assert!(IfidValidator.validate(&story).is_empty());
    }
}
