#![no_main]

use libfuzzer_sys::fuzz_target;

use volunteer_scraper::extractor::{guess_rules, reduce, visible_text};

fuzz_target!(|data: &[u8]| {
    let html = String::from_utf8_lossy(data);

    // None of these may panic, whatever the markup looks like.
    let _ = visible_text(&html);
    let rules = guess_rules(&html);
    let _ = reduce(&html, rules.include(), rules.exclude());
    let _ = reduce(&html, Some("main, article"), Some("nav, footer"));
});
