use std::fs;

use rfrender::{Engine, EngineConfig, RenderEngine};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Fixture {
    name: String,
    html: String,
    selector: String,
    property: String,
    expected: String,
}

#[test]
fn test_computed_style_golden() {
    let data =
        fs::read_to_string("tests/computed_style_golden.json").expect("Failed to read fixtures");
    let fixtures: Vec<Fixture> = serde_json::from_str(&data).expect("Invalid JSON");
    assert!(!fixtures.is_empty());

    for f in fixtures {
        let mut engine =
            RenderEngine::new(EngineConfig::default()).expect("Failed to create engine");
        engine.load_html(f.html.as_bytes()).expect("Failed to load HTML");

        let doc = engine.document().expect("document loaded");
        let node = doc
            .query_selector(&f.selector)
            .unwrap_or_else(|| panic!("{}: selector {} matched nothing", f.name, f.selector));
        let actual = doc.get_style(node, &f.property);
        assert_eq!(
            actual,
            Some(f.expected.as_str()),
            "{}: computed {} of {}",
            f.name,
            f.property,
            f.selector
        );
    }
}
