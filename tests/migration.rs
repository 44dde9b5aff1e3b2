use wlsc::migration::{ChangeKind, WarningKind};
use wlsc::reserved::{reserved_words, TARGET_VERSION};
use wlsc::Migrator;

fn migrator() -> Migrator {
    Migrator::for_version(TARGET_VERSION).unwrap()
}

const SAMPLES: &[&str] = &[
    "",
    ":: Start\nHello",
    "@version: 1.0\n:: Start\n{do $thread = 1}",
    ":: Start\n{do $THREAD = 1}\n{if $Await}\n-> Shop ->\nLIST mood = happy, sad",
    "@version: 2.0\nThe spawn of $timer_count and $effect.",
    ":: A\n$yield $yield $yield\n<-\n@delay(3)",
];

#[test]
fn second_pass_changes_nothing() {
    let migrator = migrator();
    for source in SAMPLES {
        let once = migrator.migrate(source);
        let twice = migrator.migrate(&once.content);
        assert_eq!(twice.count(ChangeKind::Directive), 0, "{:?}", source);
        assert_eq!(twice.count(ChangeKind::ReservedWord), 0, "{:?}", source);
        assert_eq!(twice.content, once.content);
    }
}

#[test]
fn prose_is_never_rewritten() {
    let migrator = migrator();
    for word in reserved_words(TARGET_VERSION).unwrap() {
        let prose = format!("@version: 2.0\nShe will {} later.", word);
        let res = migrator.migrate(&prose);
        assert_eq!(res.content, prose);
        assert!(res.changes.is_empty(), "{}", word);

        let sigil = format!("@version: 2.0\n${} and ${} again", word, word);
        let res = migrator.migrate(&sigil);
        assert_eq!(res.count(ChangeKind::ReservedWord), 2, "{}", word);
    }
}

#[test]
fn case_variants_share_a_migrated_name() {
    let migrator = migrator();
    for variant in &["$Thread", "$THREAD", "$thread"] {
        let res = migrator.migrate(&format!("@version: 2.0\n{}", variant));
        assert_eq!(res.content, "@version: 2.0\n$_migrated_thread");
        assert_eq!(res.changes[0].original, *variant);
    }
}

#[test]
fn missing_directive_is_prepended() {
    let migrator = migrator();
    for source in &["", ":: Start\nHello", "plain text\n\n"] {
        let res = migrator.migrate(source);
        assert_eq!(res.content, format!("@version: 2.0\n{}", source));
    }
}

#[test]
fn reserved_variables_scenario() {
    let source = ":: Start\n{do $thread = 1}\n{do $await = true}\n{do $spawn = \"x\"}";
    let res = migrator().migrate(source);

    for name in &["$_migrated_thread", "$_migrated_await", "$_migrated_spawn"] {
        assert!(res.content.contains(name), "{}", name);
    }
    assert!(!res.content.contains("{do $thread ="));
    assert!(!res.content.contains("{do $await ="));
    assert_eq!(res.count(ChangeKind::ReservedWord), 3);
    assert_eq!(res.count(ChangeKind::Directive), 1);
    assert_eq!(res.changes.len(), 4);

    let lines: Vec<_> = res.changes.iter().map(|c| c.line).collect();
    assert_eq!(lines, vec![1, 2, 3, 4]);

    let conflicts = res
        .warnings
        .iter()
        .filter(|w| w.kind == WarningKind::PotentialConflict)
        .count();
    assert_eq!(conflicts, 3);
}

#[test]
fn unknown_constructs_pass_through() {
    let source = "@version: 2.0\n{{ weird }} <<macro>> %% $$ $";
    let res = migrator().migrate(source);
    assert_eq!(res.content, source);
    assert!(res.changes.is_empty());
    assert!(res.warnings.is_empty());
}
