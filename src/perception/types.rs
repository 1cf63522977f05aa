use serde::{Deserialize, Serialize};

/// One interactive element of the current screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UIElement {
    /// Short widget class, e.g. `Button` for `android.widget.Button`.
    #[serde(rename = "type")]
    pub class: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    /// Accessibility label (`content-desc`).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_id: String,
    /// Pixel bounds `[left, top, right, bottom]`.
    pub bounds: [i32; 4],
    /// Tap target `[x, y]`.
    pub center: [i32; 2],
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub clickable: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub editable: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub scrollable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
}

impl UIElement {
    pub fn center_of(bounds: [i32; 4]) -> [i32; 2] {
        [(bounds[0] + bounds[2]) / 2, (bounds[1] + bounds[3]) / 2]
    }

    pub fn has_area(&self) -> bool {
        self.bounds[2] > self.bounds[0] && self.bounds[3] > self.bounds[1]
    }
}
