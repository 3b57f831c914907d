use std::fs;

use crate::extractor::{
    Diagnostic, ExtractionRules, guess_rules, reduce, reduce_with_diagnostics, visible_text,
};

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("src/extractor/tests/fixtures/{name}"))
        .expect("Failed to read test fixture")
}

#[test]
fn test_configured_rules_keep_only_the_opportunity() {
    let html = fixture("opportunity.html");
    let text = reduce(&html, Some("#content"), Some("nav, footer, aside")).unwrap();

    assert!(text.starts_with("Riverbank Cleanup\nOrganised by Green Streets Volunteers"));
    assert!(text.contains("Every Saturday, 9am to 12pm"));
    assert!(text.contains("Gloves, grabbers and bags are provided."));
    assert!(text.contains("volunteer@greenstreets.example"));
    assert!(!text.contains("Share this on social media"));
    assert!(!text.contains("Donate"));
    assert!(!text.contains("Privacy"));
    assert!(!text.contains("analytics"));
    assert!(!text.lines().any(|line| line.trim().is_empty()));
}

#[test]
fn test_fallback_rules_drop_page_chrome() {
    let html = fixture("opportunity.html");
    let rules = ExtractionRules::fallback();
    let text = reduce(&html, rules.include(), rules.exclude()).unwrap();

    assert!(text.contains("Riverbank Cleanup"));
    assert!(!text.contains("About"));
    assert!(!text.contains("Green Streets\n"));
    assert!(!text.contains("enable JavaScript"));
}

#[test]
fn test_heuristic_rules_find_the_main_container() {
    let html = fixture("opportunity.html");
    let rules = guess_rules(&html);
    assert_eq!(rules.include, "#content");

    let text = reduce(&html, rules.include(), rules.exclude()).unwrap();
    assert!(text.contains("Meet at 120 River Road"));
}

#[test]
fn test_spa_shell_has_almost_no_visible_text() {
    let html = fixture("spa_shell.html");
    let text = visible_text(&html);

    assert_eq!(text, "Loading…");
    assert!(!text.contains("__INITIAL_STATE__"));
}

#[test]
fn test_stale_include_selector_still_yields_body_text() {
    let html = fixture("opportunity.html");
    let reduction = reduce_with_diagnostics(&html, Some(".old-layout"), Some("nav")).unwrap();

    assert!(reduction.text.contains("Riverbank Cleanup"));
    assert!(!reduction.text.contains("Loading"));
    assert!(matches!(
        reduction.diagnostics.as_slice(),
        [Diagnostic::SelectorMatchEmpty { selector }] if selector == ".old-layout"
    ));
}

#[cfg(feature = "fuzz")]
mod fuzz {
    use super::*;
    use proptest::prelude::*;

    const INCLUDES: [&str; 5] = ["", "main", "div, p", ".c", "#x"];
    const EXCLUDES: [&str; 4] = ["", "nav", "footer, aside", "div"];

    proptest! {
        #[test]
        fn test_reduce_never_panics(html in ".*") {
            let _ = reduce(&html, None, None);
            let _ = visible_text(&html);
        }

        #[test]
        fn test_hidden_tags_never_leak(
            body in "[a-z ]{0,40}",
            secret in "[A-Z]{8}",
            include in 0usize..5,
            exclude in 0usize..4,
        ) {
            let html = format!(
                "<body><main><div class=\"c\" id=\"x\"><p>{body}</p><script>{secret}</script></div>\
                 <style>{secret}</style><noscript>{secret}</noscript></main></body>"
            );
            let text = reduce(&html, Some(INCLUDES[include]), Some(EXCLUDES[exclude])).unwrap();
            prop_assert!(!text.contains(&secret));
        }

        #[test]
        fn test_reduce_is_deterministic(html in ".*", include in 0usize..5) {
            let first = reduce(&html, Some(INCLUDES[include]), None);
            let second = reduce(&html, Some(INCLUDES[include]), None);
            prop_assert_eq!(first, second);
        }
    }
}
