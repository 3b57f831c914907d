use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::extractor::model::{
    Diagnostic, ExtractError, Reduction, join_lines, non_blank, parse_selector,
};

pub(crate) static NEVER_CONTENT: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("script, style, noscript").expect("Failed to parse built-in selector")
});

static BODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("Failed to parse built-in selector"));

/// Reduce raw HTML to cleaned text using optional include/exclude selector lists.
pub fn reduce(
    html: &str,
    include: Option<&str>,
    exclude: Option<&str>,
) -> Result<String, ExtractError> {
    reduce_with_diagnostics(html, include, exclude).map(|reduction| reduction.text)
}

pub fn reduce_with_diagnostics(
    html: &str,
    include: Option<&str>,
    exclude: Option<&str>,
) -> Result<Reduction, ExtractError> {
    let include = include.and_then(non_blank);
    let include_selector = parse_selector(include)?;
    let exclude_selector = parse_selector(exclude.and_then(non_blank))?;

    let mut document = Html::parse_document(html);
    detach_matching(&mut document, &NEVER_CONTENT);
    if let Some(selector) = &exclude_selector {
        detach_matching(&mut document, selector);
    }

    let mut diagnostics = Vec::new();
    let text = match (include, &include_selector) {
        (Some(raw), Some(selector)) => {
            let matched: Vec<ElementRef<'_>> = document.root_element().select(selector).collect();
            if matched.is_empty() {
                warn!(selector = raw, "include selector matched nothing, falling back to body");
                diagnostics.push(Diagnostic::SelectorMatchEmpty {
                    selector: raw.to_string(),
                });
                body_or_document_text(&document)
            } else {
                top_level(&matched)
                    .into_iter()
                    .map(element_text)
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
        _ => element_text(document.root_element()),
    };

    let text = join_lines(&text);
    debug!(chars = text.chars().count(), "reduced html to text");
    Ok(Reduction { text, diagnostics })
}

/// Whole-page text with only script/style/noscript removed.
pub fn visible_text(html: &str) -> String {
    let mut document = Html::parse_document(html);
    detach_matching(&mut document, &NEVER_CONTENT);
    join_lines(&element_text(document.root_element()))
}

/// Remove every element matched by `selector`, descendants included.
pub(crate) fn detach_matching(document: &mut Html, selector: &Selector) {
    let root_id = document.root_element().id();
    let matched: Vec<_> = document
        .root_element()
        .select(selector)
        .map(|element| element.id())
        .collect();

    for id in matched {
        if id == root_id {
            // The <html> node anchors the document; empty it instead.
            let children: Vec<_> = document
                .root_element()
                .children()
                .map(|child| child.id())
                .collect();
            for child in children {
                if let Some(mut node) = document.tree.get_mut(child) {
                    node.detach();
                }
            }
        } else if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// Drop matches nested inside another match so their text is not emitted twice.
fn top_level<'a>(matched: &[ElementRef<'a>]) -> Vec<ElementRef<'a>> {
    let ids: HashSet<_> = matched.iter().map(|element| element.id()).collect();
    matched
        .iter()
        .copied()
        .filter(|element| !element.ancestors().any(|ancestor| ids.contains(&ancestor.id())))
        .collect()
}

fn body_or_document_text(document: &Html) -> String {
    match document.root_element().select(&BODY).next() {
        Some(body) => element_text(body),
        None => element_text(document.root_element()),
    }
}

/// Every text run trimmed and placed on its own line.
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|run| !run.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclude_list_removes_each_selector() {
        let html = "<html><body><nav>A</nav><footer>B</footer><p>C</p></body></html>";
        assert_eq!(reduce(html, None, Some("nav, footer")).unwrap(), "C");
    }

    #[test]
    fn test_script_style_noscript_always_removed() {
        let html = r#"<body><main><p>Keep</p><script>var x = 1;</script>
            <style>p { color: red }</style><noscript>Enable JS</noscript></main></body>"#;
        for include in [None, Some("main"), Some("script"), Some("noscript")] {
            let text = reduce(html, include, None).unwrap();
            assert!(!text.contains("var x"), "{include:?}");
            assert!(!text.contains("color"), "{include:?}");
            assert!(!text.contains("Enable JS"), "{include:?}");
        }
    }

    #[test]
    fn test_nested_include_matches_are_emitted_once() {
        let html = r#"<body><div class="c">Outer<div class="c">Inner</div></div><p>Other</p></body>"#;
        assert_eq!(reduce(html, Some(".c"), None).unwrap(), "Outer\nInner");
    }

    #[test]
    fn test_include_matches_are_joined_in_document_order() {
        let html = "<body><h1>Title</h1><p>skip</p><article>Body</article></body>";
        assert_eq!(reduce(html, Some("article, h1"), None).unwrap(), "Title\nBody");
    }

    #[test]
    fn test_empty_include_match_falls_back_to_body() {
        let html = "<html><head><title>T</title></head><body><p>Hello</p><p>World</p></body></html>";
        let reduction = reduce_with_diagnostics(html, Some("#missing"), None).unwrap();
        assert_eq!(reduction.text, "Hello\nWorld");
        assert_eq!(
            reduction.diagnostics,
            vec![Diagnostic::SelectorMatchEmpty {
                selector: "#missing".to_string()
            }]
        );
    }

    #[test]
    fn test_no_include_takes_whole_document() {
        let html = "<html><head><title>Page</title></head><body><p>Text</p></body></html>";
        assert_eq!(reduce(html, None, None).unwrap(), "Page\nText");
    }

    #[test]
    fn test_text_runs_are_split_and_trimmed() {
        let html = "<body><p>  Hello <b>world</b>  </p>\n\n<div>\n  line one\n\n  line two </div></body>";
        assert_eq!(
            reduce(html, Some("body"), None).unwrap(),
            "Hello\nworld\nline one\nline two"
        );
    }

    #[test]
    fn test_excluding_the_root_leaves_nothing() {
        let html = "<html><body><p>gone</p></body></html>";
        assert_eq!(reduce(html, None, Some("html")).unwrap(), "");
    }

    #[test]
    fn test_reduce_is_idempotent() {
        let html = "<body><nav>menu</nav><main><h2>Beach cleanup</h2><p>Saturdays 9am</p></main></body>";
        let first = reduce(html, Some("main"), Some("nav")).unwrap();
        let second = reduce(html, Some("main"), Some("nav")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_selector_is_an_error() {
        assert!(matches!(
            reduce("<p>x</p>", Some("p[["), None),
            Err(ExtractError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn test_visible_text_ignores_rules() {
        let html = "<body><nav>Menu</nav><script>x()</script><p>Body</p></body>";
        assert_eq!(visible_text(html), "Menu\nBody");
    }
}
