//! Registry of shapes, behaviors and plugins, keyed by `(category, key)`.
//!
//! A registry is an ordinary value: build one, register extensions, then hand it to
//! [`Graph::new`](crate::Graph::new). Graphs copy what they resolve, so one registry can serve many
//! independent graphs.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use narwhal_render::{Shape, ShapeRegistry};
use narwhal_scene::ElementKind;
use rustc_hash::FxBuildHasher;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::behavior::{self, Behavior};
use crate::error::{Error, Result};
use crate::input::{InputEvent, Target};
use crate::options::ExtensionSpec;
use crate::plugin::{self, Plugin};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    NodeShape,
    EdgeShape,
    ComboShape,
    Behavior,
    Plugin,
}

impl Category {
    fn element_kind(self) -> Option<ElementKind> {
        match self {
            Category::NodeShape => Some(ElementKind::Node),
            Category::EdgeShape => Some(ElementKind::Edge),
            Category::ComboShape => Some(ElementKind::Combo),
            Category::Behavior | Category::Plugin => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::NodeShape => "node-shape",
            Category::EdgeShape => "edge-shape",
            Category::ComboShape => "combo-shape",
            Category::Behavior => "behavior",
            Category::Plugin => "plugin",
        })
    }
}

/// Per-instance predicate deciding whether an extension sees an event.
pub type EnableFn = Arc<dyn Fn(&InputEvent, Option<&Target>) -> bool + Send + Sync>;

pub type BehaviorFactory =
    Arc<dyn Fn(&Map<String, Value>) -> Result<Box<dyn Behavior>> + Send + Sync>;
pub type PluginFactory = Arc<dyn Fn(&Map<String, Value>) -> Result<Box<dyn Plugin>> + Send + Sync>;

/// An implementation registered under a key.
#[derive(Clone)]
pub enum Extension {
    Shape(Arc<dyn Shape>),
    Behavior(BehaviorFactory),
    Plugin(PluginFactory),
}

impl Extension {
    pub fn shape(shape: impl Shape + 'static) -> Self {
        Extension::Shape(Arc::new(shape))
    }

    pub fn behavior<F>(factory: F) -> Self
    where
        F: Fn(&Map<String, Value>) -> Result<Box<dyn Behavior>> + Send + Sync + 'static,
    {
        Extension::Behavior(Arc::new(factory))
    }

    pub fn plugin<F>(factory: F) -> Self
    where
        F: Fn(&Map<String, Value>) -> Result<Box<dyn Plugin>> + Send + Sync + 'static,
    {
        Extension::Plugin(Arc::new(factory))
    }

    fn fits(&self, category: Category) -> bool {
        matches!(
            (self, category),
            (
                Extension::Shape(_),
                Category::NodeShape | Category::EdgeShape | Category::ComboShape
            ) | (Extension::Behavior(_), Category::Behavior)
                | (Extension::Plugin(_), Category::Plugin)
        )
    }
}

impl fmt::Debug for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Extension::Shape(_) => "Extension::Shape",
            Extension::Behavior(_) => "Extension::Behavior",
            Extension::Plugin(_) => "Extension::Plugin",
        })
    }
}

/// Deserializes extension options, reporting failures against `key`.
pub fn parse_options<T: DeserializeOwned>(key: &str, options: &Map<String, Value>) -> Result<T> {
    serde_json::from_value(Value::Object(options.clone())).map_err(|e| Error::InvalidOptions {
        key: key.to_string(),
        message: e.to_string(),
    })
}

#[derive(Clone, Default)]
pub struct ExtensionRegistry {
    shapes: ShapeRegistry,
    behaviors: IndexMap<String, BehaviorFactory, FxBuildHasher>,
    plugins: IndexMap<String, PluginFactory, FxBuildHasher>,
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("shapes", &self.shapes)
            .field("behaviors", &self.behaviors.keys().collect::<Vec<_>>())
            .field("plugins", &self.plugins.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ExtensionRegistry {
    /// An empty registry. Most callers want [`ExtensionRegistry::with_builtins`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in shapes, the four built-in behaviors, and the minimap and tooltip plugins.
    pub fn with_builtins() -> Self {
        let mut registry = Self {
            shapes: ShapeRegistry::with_builtins(),
            ..Self::default()
        };
        behavior::register_builtins(&mut registry);
        plugin::register_builtins(&mut registry);
        registry
    }

    pub fn contains(&self, category: Category, key: &str) -> bool {
        match category.element_kind() {
            Some(kind) => self.shapes.contains(kind, key),
            None if category == Category::Behavior => self.behaviors.contains_key(key),
            None => self.plugins.contains_key(key),
        }
    }

    /// Registers a new implementation. Fails with [`Error::AlreadyRegistered`] if the key is
    /// taken within the category; use [`ExtensionRegistry::replace`] to overwrite.
    pub fn register(
        &mut self,
        category: Category,
        key: impl Into<String>,
        extension: Extension,
    ) -> Result<()> {
        let key = key.into();
        if self.contains(category, &key) {
            return Err(Error::AlreadyRegistered { category, key });
        }
        self.insert(category, key, extension)
    }

    /// Registers or overwrites an implementation.
    pub fn replace(
        &mut self,
        category: Category,
        key: impl Into<String>,
        extension: Extension,
    ) -> Result<()> {
        self.insert(category, key.into(), extension)
    }

    fn insert(&mut self, category: Category, key: String, extension: Extension) -> Result<()> {
        if !extension.fits(category) {
            return Err(Error::InvalidOptions {
                key,
                message: format!("{extension:?} cannot be registered as a {category}"),
            });
        }
        tracing::debug!(%category, key = %key, "register extension");
        match (extension, category.element_kind()) {
            (Extension::Shape(shape), Some(kind)) => {
                self.shapes.insert(kind, key, shape);
            }
            (Extension::Behavior(factory), _) => {
                self.behaviors.insert(key, factory);
            }
            (Extension::Plugin(factory), _) => {
                self.plugins.insert(key, factory);
            }
            (Extension::Shape(_), None) => {}
        }
        Ok(())
    }

    pub(crate) fn insert_behavior<F>(&mut self, key: &str, factory: F)
    where
        F: Fn(&Map<String, Value>) -> Result<Box<dyn Behavior>> + Send + Sync + 'static,
    {
        self.behaviors.insert(key.to_string(), Arc::new(factory));
    }

    pub(crate) fn insert_plugin<F>(&mut self, key: &str, factory: F)
    where
        F: Fn(&Map<String, Value>) -> Result<Box<dyn Plugin>> + Send + Sync + 'static,
    {
        self.plugins.insert(key.to_string(), Arc::new(factory));
    }

    pub fn shapes(&self) -> &ShapeRegistry {
        &self.shapes
    }

    pub(crate) fn create_behavior(&self, spec: &ExtensionSpec) -> Result<Box<dyn Behavior>> {
        let factory = self
            .behaviors
            .get(&spec.key)
            .ok_or_else(|| Error::UnknownBehavior {
                key: spec.key.clone(),
            })?;
        factory(&spec.options)
    }

    pub(crate) fn create_plugin(&self, spec: &ExtensionSpec) -> Result<Box<dyn Plugin>> {
        let factory = self
            .plugins
            .get(&spec.key)
            .ok_or_else(|| Error::UnknownPlugin {
                key: spec.key.clone(),
            })?;
        factory(&spec.options)
    }

    pub fn keys(&self, category: Category) -> Vec<&str> {
        match category.element_kind() {
            Some(kind) => self.shapes.keys(kind).collect(),
            None if category == Category::Behavior => {
                self.behaviors.keys().map(String::as_str).collect()
            }
            None => self.plugins.keys().map(String::as_str).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use narwhal_render::CircleShape;

    #[test]
    fn builtins_cover_every_category() {
        let registry = ExtensionRegistry::with_builtins();
        assert!(registry.contains(Category::NodeShape, "circle"));
        assert!(registry.contains(Category::EdgeShape, "line"));
        assert!(registry.contains(Category::ComboShape, "rect"));
        assert_eq!(
            registry.keys(Category::Behavior),
            vec!["drag-canvas", "drag-element", "zoom-canvas", "click-select"]
        );
        assert_eq!(registry.keys(Category::Plugin), vec!["minimap", "tooltip"]);
    }

    #[test]
    fn mismatched_category_is_rejected() {
        let mut registry = ExtensionRegistry::new();
        let err = registry
            .register(Category::Plugin, "ring", Extension::shape(CircleShape))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidOptions { .. }));
        assert!(!registry.contains(Category::Plugin, "ring"));
    }

    #[test]
    fn same_key_in_different_categories_is_allowed() {
        let mut registry = ExtensionRegistry::with_builtins();
        registry
            .register(Category::EdgeShape, "rect", Extension::shape(CircleShape))
            .unwrap();
        assert!(registry.contains(Category::EdgeShape, "rect"));
    }
}
