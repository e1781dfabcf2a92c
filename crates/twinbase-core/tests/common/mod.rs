use serde_json::json;
use twinbase_core::model::{DataType, Element, ModelType};
use twinbase_core::ElementContainer;

/// Empty container without owner
#[allow(dead_code)]
pub fn new_container() -> ElementContainer {
    ElementContainer::new(None)
}

/// Container holding `Measurements` with a `Temp` property of 21.5
#[allow(dead_code)]
pub fn measurements() -> ElementContainer {
    let mut container = new_container();
    container
        .create(Element::collection("Measurements"))
        .unwrap();
    container
        .create_at(
            "Measurements",
            Element::property("Temp", DataType::Double, json!(21.5)),
        )
        .unwrap();
    container
}

/// Container holding list `Readings` with `count` integer items 0..count
#[allow(dead_code)]
pub fn readings(count: usize) -> ElementContainer {
    let mut container = new_container();
    container
        .create(Element::list("Readings", ModelType::Property))
        .unwrap();
    for i in 0..count {
        container
            .create_at("Readings", reading(i as i64))
            .unwrap();
    }
    container
}

/// List item property
#[allow(dead_code)]
pub fn reading(value: i64) -> Element {
    Element::list_item(DataType::Int, json!(value))
}

/// Collects every (path, index) pair below the root in pre-order
#[allow(dead_code)]
pub fn all_paths(container: &ElementContainer) -> Vec<String> {
    let mut paths = Vec::new();
    container.traverse(|n| {
        if !n.is_root() {
            paths.push(n.path().to_string());
        }
    });
    paths
}
