//! Graph construction options.

use std::fmt;
use std::sync::Arc;

use beluga::Algorithm;
use narwhal_render::ViewportOptions;
use narwhal_scene::GraphData;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::extension::EnableFn;
use crate::input::{InputEvent, Target};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GraphOptions {
    pub data: GraphData,
    pub layout: Algorithm,
    pub viewport: ViewportOptions,
    /// Evaluated in this order for every input event.
    pub behaviors: Vec<BehaviorSpec>,
    pub plugins: Vec<PluginSpec>,
    /// Fit the view to the scene once the first layout finishes.
    pub auto_fit: bool,
    pub fit_padding: f64,
    /// Re-run the layout when elements are added, removed or regrouped after the first render.
    pub relayout_on_change: bool,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            data: GraphData::default(),
            layout: Algorithm::default(),
            viewport: ViewportOptions::default(),
            behaviors: Vec::new(),
            plugins: Vec::new(),
            auto_fit: false,
            fit_padding: 20.0,
            relayout_on_change: true,
        }
    }
}

impl GraphOptions {
    pub fn with_data(mut self, data: GraphData) -> Self {
        self.data = data;
        self
    }

    pub fn with_layout(mut self, layout: Algorithm) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_behavior(mut self, spec: impl Into<BehaviorSpec>) -> Self {
        self.behaviors.push(spec.into());
        self
    }

    pub fn with_plugin(mut self, spec: impl Into<PluginSpec>) -> Self {
        self.plugins.push(spec.into());
        self
    }
}

pub type BehaviorSpec = ExtensionSpec;
pub type PluginSpec = ExtensionSpec;

/// `{type, ...options}` record naming a registered behavior or plugin.
///
/// Deserializes from either a bare key (`"drag-canvas"`) or an object with a `type` field.
#[derive(Clone, Serialize, Deserialize)]
#[serde(from = "RawSpec")]
pub struct ExtensionSpec {
    #[serde(rename = "type")]
    pub key: String,
    #[serde(flatten)]
    pub options: Map<String, Value>,
    /// Host predicate consulted before the extension sees an event.
    #[serde(skip)]
    pub enable: Option<EnableFn>,
}

impl ExtensionSpec {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            options: Map::new(),
            enable: None,
        }
    }

    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    pub fn with_enable<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&InputEvent, Option<&Target>) -> bool + Send + Sync + 'static,
    {
        self.enable = Some(Arc::new(predicate));
        self
    }

    /// `false` when the options carry `"enable": false`.
    pub(crate) fn enabled_by_options(&self) -> bool {
        self.options
            .get("enable")
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }
}

impl fmt::Debug for ExtensionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionSpec")
            .field("key", &self.key)
            .field("options", &self.options)
            .field("enable", &self.enable.as_ref().map(|_| "<predicate>"))
            .finish()
    }
}

impl From<&str> for ExtensionSpec {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for ExtensionSpec {
    fn from(key: String) -> Self {
        Self::new(key)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSpec {
    Key(String),
    Full {
        #[serde(rename = "type")]
        key: String,
        #[serde(flatten)]
        options: Map<String, Value>,
    },
}

impl From<RawSpec> for ExtensionSpec {
    fn from(raw: RawSpec) -> Self {
        match raw {
            RawSpec::Key(key) => Self::new(key),
            RawSpec::Full { key, options } => Self {
                key,
                options,
                enable: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn specs_accept_keys_and_records() {
        let options: GraphOptions = serde_json::from_value(serde_json::json!({
            "layout": {"type": "force", "seed": 1},
            "behaviors": ["drag-canvas", {"type": "zoom-canvas", "sensitivity": 2}],
            "plugins": [{"type": "minimap", "size": [240, 160]}]
        }))
        .unwrap();

        assert_eq!(options.layout.name(), "force");
        assert_eq!(options.behaviors[0].key, "drag-canvas");
        assert!(options.behaviors[0].options.is_empty());
        assert_eq!(options.behaviors[1].options["sensitivity"], 2);
        assert_eq!(options.plugins[0].key, "minimap");
        assert!(options.relayout_on_change);
    }

    #[test]
    fn enable_flag_in_options_disables() {
        let spec = ExtensionSpec::new("tooltip").with_option("enable", false);
        assert!(!spec.enabled_by_options());
        assert!(ExtensionSpec::new("tooltip").enabled_by_options());
    }
}
