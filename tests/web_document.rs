//! Browser tests for the web-sys backend.
//!
//! Run with: wasm-pack test --headless --firefox -- --features web

#![cfg(all(target_arch = "wasm32", feature = "web"))]

use spark_dom::{Document, WebDocument};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

// =============================================================================
// Form control values
// =============================================================================

#[wasm_bindgen_test]
fn test_textarea_value_is_a_live_property() {
    let mut doc = WebDocument::new().unwrap();
    let area = doc.create_element("textarea").unwrap();

    doc.set_value(area, "draft").unwrap();

    assert_eq!(doc.value(area).as_deref(), Some("draft"));
    assert_eq!(doc.attribute(area, "value"), None);
}

#[wasm_bindgen_test]
fn test_select_value_picks_option() {
    let mut doc = WebDocument::new().unwrap();
    let select = doc.create_element("select").unwrap();
    for choice in ["a", "b"] {
        let option = doc.create_element("option").unwrap();
        doc.set_attribute(option, "value", choice).unwrap();
        doc.append_child(select, option).unwrap();
    }

    doc.set_value(select, "b").unwrap();

    assert_eq!(doc.value(select).as_deref(), Some("b"));
    assert_eq!(doc.attribute(select, "value"), None);
}
