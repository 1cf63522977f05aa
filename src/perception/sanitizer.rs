//! Reduces a `uiautomator dump` XML document to the elements worth acting on.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::perception::types::UIElement;

static NODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<node\b([^>]*?)/?>").unwrap());
static ATTR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"([\w:-]+)="([^"]*)""#).unwrap());
static BOUNDS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(-?\d+),(-?\d+)\]\[(-?\d+),(-?\d+)\]").unwrap());

/// Interactive or labelled nodes in document order.
///
/// A node is kept when it can be acted on (clickable, long-clickable,
/// checkable, scrollable, an editable field) or carries visible text or an
/// accessibility label, and its bounds have a non-zero area.
pub fn get_interactive_elements(xml: &str) -> Vec<UIElement> {
    NODE_RE
        .captures_iter(xml)
        .filter_map(|node| parse_node(&node[1]))
        .collect()
}

fn parse_node(attrs: &str) -> Option<UIElement> {
    let mut class = String::new();
    let mut text = String::new();
    let mut description = String::new();
    let mut resource_id = String::new();
    let mut bounds = None;
    let mut clickable = false;
    let mut long_clickable = false;
    let mut checkable = false;
    let mut checked = false;
    let mut scrollable = false;

    for attr in ATTR_RE.captures_iter(attrs) {
        let value = &attr[2];
        match &attr[1] {
            "class" => class = value.rsplit('.').next().unwrap_or(value).to_string(),
            "text" => text = decode_entities(value),
            "content-desc" => description = decode_entities(value),
            "resource-id" => resource_id = value.to_string(),
            "bounds" => bounds = parse_bounds(value),
            "clickable" => clickable = value == "true",
            "long-clickable" => long_clickable = value == "true",
            "checkable" => checkable = value == "true",
            "checked" => checked = value == "true",
            "scrollable" => scrollable = value == "true",
            _ => {}
        }
    }

    let bounds = bounds?;
    let editable = class.contains("EditText");
    let actionable = clickable || long_clickable || checkable || scrollable || editable;
    let labelled = !text.trim().is_empty() || !description.trim().is_empty();
    if !actionable && !labelled {
        return None;
    }

    let element = UIElement {
        class,
        text,
        description,
        resource_id,
        bounds,
        center: UIElement::center_of(bounds),
        clickable: clickable || long_clickable,
        editable,
        scrollable,
        checked: checkable.then_some(checked),
    };
    element.has_area().then_some(element)
}

fn parse_bounds(value: &str) -> Option<[i32; 4]> {
    let caps = BOUNDS_RE.captures(value)?;
    let n = |i: usize| caps[i].parse::<i32>().ok();
    Some([n(1)?, n(2)?, n(3)?, n(4)?])
}

fn decode_entities(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#10;", "\n")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = r#"<?xml version='1.0' encoding='UTF-8' standalone='yes' ?>
<hierarchy rotation="0">
  <node index="0" text="" resource-id="" class="android.widget.FrameLayout" content-desc="" clickable="false" scrollable="false" bounds="[0,0][1080,2400]">
    <node index="0" text="Settings" resource-id="com.android.launcher:id/icon" class="android.widget.TextView" content-desc="" clickable="true" bounds="[50,150][150,250]" />
    <node index="1" text="" resource-id="" class="android.widget.EditText" content-desc="Search &amp; find" clickable="false" bounds="[0,300][1080,400]" />
    <node index="2" text="Wi-Fi" class="android.widget.Switch" checkable="true" checked="true" clickable="true" bounds="[900,500][1000,560]" />
    <node index="3" text="" class="android.view.View" clickable="true" bounds="[10,10][10,10]" />
    <node index="4" text="" class="android.widget.ScrollView" scrollable="true" bounds="[0,600][1080,2000]"></node>
  </node>
</hierarchy>"#;

    #[test]
    fn keeps_interactive_and_labelled_nodes_in_order() {
        let elements = get_interactive_elements(DUMP);
        let classes: Vec<_> = elements.iter().map(|e| e.class.as_str()).collect();
        assert_eq!(classes, vec!["TextView", "EditText", "Switch", "ScrollView"]);
    }

    #[test]
    fn center_point_and_attributes() {
        let elements = get_interactive_elements(DUMP);
        let settings = &elements[0];
        assert_eq!(settings.text, "Settings");
        assert_eq!(settings.center, [100, 200]);
        assert!(settings.clickable);
        assert_eq!(settings.resource_id, "com.android.launcher:id/icon");

        let search = &elements[1];
        assert!(search.editable);
        assert_eq!(search.description, "Search & find");

        let wifi = &elements[2];
        assert_eq!(wifi.checked, Some(true));
        assert!(elements[3].scrollable);
    }

    #[test]
    fn zero_area_nodes_are_dropped() {
        let elements = get_interactive_elements(DUMP);
        assert!(elements.iter().all(|e| e.has_area()));
    }

    #[test]
    fn garbage_input_yields_nothing() {
        assert!(get_interactive_elements("ERROR: null root node returned by UiTestAutomationBridge.").is_empty());
        assert!(get_interactive_elements(r#"<node text="x" bounds="bad" />"#).is_empty());
    }

    #[test]
    fn serialized_form_omits_empty_fields() {
        let elements = get_interactive_elements(DUMP);
        let json = serde_json::to_value(&elements[0]).unwrap();
        assert_eq!(json["type"], "TextView");
        assert!(json.get("description").is_none());
        assert!(json.get("editable").is_none());
        assert_eq!(json["center"], serde_json::json!([100, 200]));
    }
}
