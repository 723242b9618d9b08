//! Style cascade through the engine pipeline

use rfrender::css::StyleEngine;
use rfrender::html::parse;
use rfrender::{Engine, EngineConfig, RenderEngine};

fn engine_with(html: &str) -> RenderEngine {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut engine = RenderEngine::new(EngineConfig::default()).expect("engine");
    engine.load_html(html.as_bytes()).expect("load");
    engine
}

fn style(engine: &RenderEngine, selector: &str, property: &str) -> Option<String> {
    let doc = engine.document()?;
    let node = doc.query_selector(selector)?;
    doc.get_style(node, property).map(str::to_string)
}

#[test]
fn inline_style_blocks_cascade_in_document_order() {
    let engine = engine_with(
        r#"<head><style>p { color: red; margin: 1px 2px 3px }</style></head>
        <body><style>p { color: green }</style><p>x</p></body>"#,
    );
    assert_eq!(style(&engine, "p", "color").as_deref(), Some("green"));
    assert_eq!(style(&engine, "p", "margin-top").as_deref(), Some("1px"));
    assert_eq!(style(&engine, "p", "margin-right").as_deref(), Some("2px"));
    assert_eq!(style(&engine, "p", "margin-bottom").as_deref(), Some("3px"));
    assert_eq!(style(&engine, "p", "margin-left").as_deref(), Some("2px"));
}

#[test]
fn id_beats_class_beats_type() {
    let engine = engine_with(
        r#"<style>
            #main { color: purple }
            .note { color: blue; width: 10px }
            div { color: red; width: 20px; height: 5px }
        </style><div id="main" class="note">x</div>"#,
    );
    assert_eq!(style(&engine, "div", "color").as_deref(), Some("purple"));
    assert_eq!(style(&engine, "div", "width").as_deref(), Some("10px"));
    assert_eq!(style(&engine, "div", "height").as_deref(), Some("5px"));
}

#[test]
fn many_classes_never_outrank_one_id() {
    let engine = engine_with(
        r#"<style>
            #x { color: red }
            .a.b.c.d.e.f.g.h.i.j.k { color: blue }
        </style><p id="x" class="a b c d e f g h i j k">t</p>"#,
    );
    assert_eq!(style(&engine, "p", "color").as_deref(), Some("red"));
}

#[test]
fn combinators_and_attribute_selectors() {
    let engine = engine_with(
        r#"<style>
            ul > li a { color: red }
            a[href^="https"] { text-decoration: none }
            input[type=text] { width: 120px }
            li:first-child { font-weight: bold }
            li:hover { color: pink }
            a::before { content: "x" }
        </style>
        <ul><li><a href="https://x">one</a></li><li>two</li></ul>
        <input type="text">"#,
    );
    assert_eq!(style(&engine, "a", "color").as_deref(), Some("red"));
    assert_eq!(style(&engine, "a", "text-decoration").as_deref(), Some("none"));
    assert_eq!(style(&engine, "a", "content"), None);
    assert_eq!(style(&engine, "input", "width").as_deref(), Some("120px"));
    assert_eq!(style(&engine, "li", "font-weight").as_deref(), Some("bold"));
    assert_eq!(style(&engine, "li", "color"), None);
}

#[test]
fn variables_defined_on_root_resolve_everywhere() {
    let engine = engine_with(
        r#"<style>
            :root { --accent: #ff0000; --gap: 4px }
            .card { --ignored: 1px; padding: var(--gap) var(--gap, 9px); color: var(--accent) }
            .other { border: var(--none, 1px solid black) }
        </style><div class="card">x</div><div class="other">y</div>"#,
    );
    assert_eq!(style(&engine, ".card", "color").as_deref(), Some("#ff0000"));
    assert_eq!(style(&engine, ".card", "padding-left").as_deref(), Some("4px"));
    assert_eq!(style(&engine, ".other", "border").as_deref(), Some("1px solid black"));
    let styles = engine.style_engine();
    assert_eq!(styles.variable("--gap"), Some("4px"));
    assert_eq!(styles.variable("--ignored"), None);
}

#[test]
fn narrow_media_queries_are_skipped() {
    let engine = engine_with(
        r#"<style>
            p { color: black }
            @media (max-width: 600px) { p { color: red } }
            @media screen and (min-width: 900px) { p { width: 50px } }
            @media print { p { color: gray } }
        </style><p>x</p>"#,
    );
    assert_eq!(style(&engine, "p", "color").as_deref(), Some("black"));
    assert_eq!(style(&engine, "p", "width").as_deref(), Some("50px"));
}

#[test]
fn restyle_after_class_change() {
    let mut engine = engine_with(r#"<style>.on { color: green }</style><p id="t">x</p>"#);
    let p = engine.query_selector("#t").unwrap();
    assert_eq!(style(&engine, "#t", "color"), None);

    let now_on = engine
        .document_mut()
        .unwrap()
        .toggle_class(p, "on")
        .unwrap();
    assert!(now_on);
    engine.restyle().unwrap();
    assert_eq!(style(&engine, "#t", "color").as_deref(), Some("green"));
}

#[test]
fn rules_are_rebuilt_per_apply() {
    let mut doc = parse(b"<p>x</p>");
    let mut styles = StyleEngine::default();
    styles.apply(&mut doc, &["p { color: red } p { width: 1px }"]);
    assert_eq!(styles.rules().len(), 2);
    styles.apply(&mut doc, &["p { color: red } p { width: 1px }"]);
    assert_eq!(styles.rules().len(), 2);
    styles.apply(&mut doc, &["p { color: blue }"]);
    assert_eq!(styles.rules().len(), 1);
    let p = doc.query_selector("p").unwrap();
    assert_eq!(doc.get_style(p, "color"), Some("blue"));
}
