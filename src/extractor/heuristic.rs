use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use tracing::debug;

use crate::extractor::cleaner::{NEVER_CONTENT, detach_matching};
use crate::extractor::model::{DEFAULT_EXCLUDE, ExtractionRules};

const CANDIDATE_TAGS: [&str; 4] = ["main", "article", "section", "div"];
const MAX_CLASSES: usize = 2;

/// Guess include/exclude rules without a model: the candidate container with
/// the most text wins.
pub fn guess_rules(html: &str) -> ExtractionRules {
    let mut document = Html::parse_document(html);
    detach_matching(&mut document, &NEVER_CONTENT);

    // Children come after their parent in document order, so walking it
    // backwards sums every subtree once.
    let nodes: Vec<_> = document.root_element().descendants().collect();
    let mut text_len: HashMap<_, usize> = HashMap::with_capacity(nodes.len());
    for node in nodes.iter().rev() {
        let own = node
            .value()
            .as_text()
            .map_or(0, |text| text.trim().chars().count());
        let children: usize = node
            .children()
            .map(|child| text_len.get(&child.id()).copied().unwrap_or(0))
            .sum();
        text_len.insert(node.id(), own + children);
    }

    let mut best = "body".to_string();
    let mut largest = 0usize;

    for tag in CANDIDATE_TAGS {
        let Ok(selector) = Selector::parse(tag) else {
            continue;
        };
        for element in document.root_element().select(&selector) {
            let len = text_len.get(&element.id()).copied().unwrap_or(0);
            if len > largest {
                largest = len;
                best = selector_for(element, tag);
            }
        }
    }

    debug!(include = %best, text_len = largest, "heuristic include selector");
    ExtractionRules::new(best, DEFAULT_EXCLUDE)
}

/// `#id`, then `.class.class`, then the bare tag, skipping anything that
/// would not parse back as a selector.
fn selector_for(element: ElementRef<'_>, tag: &str) -> String {
    if let Some(id) = element.value().id() {
        let candidate = format!("#{id}");
        if Selector::parse(&candidate).is_ok() {
            return candidate;
        }
    }

    let classes: Vec<&str> = element
        .value()
        .attr("class")
        .map(|raw| raw.split_whitespace().take(MAX_CLASSES).collect())
        .unwrap_or_default();
    if !classes.is_empty() {
        let candidate = format!(".{}", classes.join("."));
        if Selector::parse(&candidate).is_ok() {
            return candidate;
        }
    }

    tag.to_string()
}
