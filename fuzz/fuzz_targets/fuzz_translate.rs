#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use std::path::PathBuf;
use vortex_core::query::{translate_query, SearchMode, SearchQuery};

#[derive(Debug, Arbitrary)]
struct Input {
    keywords: String,
    mode: u8,
    scope: Option<Vec<String>>,
}

fuzz_target!(|input: Input| {
    let mode = match input.mode % 3 {
        0 => SearchMode::All,
        1 => SearchMode::FilesOnly,
        _ => SearchMode::FoldersOnly,
    };
    let unscoped = input.scope.is_none();
    let scope = input
        .scope
        .map(|paths| paths.into_iter().map(PathBuf::from).collect());
    let query = SearchQuery::new(input.keywords, mode, scope);

    let text = translate_query(&query);

    assert!(text.ends_with('"'));
    if unscoped {
        // Quotes inside the keyword are stripped, leaving only the wrapping pair
        assert_eq!(text.matches('"').count(), 2);
    }
});
