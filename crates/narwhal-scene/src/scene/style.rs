//! Resolved visual attributes shared by every element kind.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Visual attributes of an element.
///
/// Every field is optional so the same type doubles as a patch: [`Style::merge`] overwrites only
/// the fields that are set on the patch. Unknown attributes land in `extra` and are carried
/// through to shape implementations untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Style {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }

    pub fn with_shape(mut self, shape: impl Into<String>) -> Self {
        self.shape = Some(shape.into());
        self
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.size = Some([width, height]);
        self
    }

    pub fn with_fill(mut self, fill: impl Into<String>) -> Self {
        self.fill = Some(fill.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Returns the position when both coordinates are set.
    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.x?, self.y?))
    }

    /// Overwrites every field that is set on `patch`. `extra` keys are merged one by one.
    pub fn merge(&mut self, patch: Style) {
        let Style {
            x,
            y,
            size,
            shape,
            fill,
            stroke,
            line_width,
            label,
            opacity,
            extra,
        } = patch;

        if x.is_some() {
            self.x = x;
        }
        if y.is_some() {
            self.y = y;
        }
        if size.is_some() {
            self.size = size;
        }
        if shape.is_some() {
            self.shape = shape;
        }
        if fill.is_some() {
            self.fill = fill;
        }
        if stroke.is_some() {
            self.stroke = stroke;
        }
        if line_width.is_some() {
            self.line_width = line_width;
        }
        if label.is_some() {
            self.label = label;
        }
        if opacity.is_some() {
            self.opacity = opacity;
        }
        for (k, v) in extra {
            self.extra.insert(k, v);
        }
    }

    /// Checks that every numeric attribute is finite (and sizes non-negative).
    pub fn validate(&self) -> std::result::Result<(), String> {
        let scalars = [
            ("x", self.x),
            ("y", self.y),
            ("lineWidth", self.line_width),
            ("opacity", self.opacity),
        ];
        for (name, value) in scalars {
            if let Some(v) = value.filter(|v| !v.is_finite()) {
                return Err(format!("{name} must be finite, got {v}"));
            }
        }
        if let Some([w, h]) = self.size {
            if !(w.is_finite() && h.is_finite() && w >= 0.0 && h >= 0.0) {
                return Err(format!("size must be finite and non-negative, got [{w}, {h}]"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_only_overwrites_set_fields() {
        let mut base = Style::at(1.0, 2.0).with_fill("#fff").with_label("a");
        base.extra.insert("halo".into(), Value::Bool(true));

        let mut patch = Style {
            fill: Some("#000".into()),
            ..Default::default()
        };
        patch.extra.insert("badge".into(), Value::from(3));
        base.merge(patch);

        assert_eq!(base.position(), Some((1.0, 2.0)));
        assert_eq!(base.fill.as_deref(), Some("#000"));
        assert_eq!(base.label.as_deref(), Some("a"));
        assert_eq!(base.extra.len(), 2);
    }

    #[test]
    fn validate_rejects_nan_coordinates() {
        let style = Style {
            x: Some(f64::NAN),
            ..Default::default()
        };
        assert!(style.validate().is_err());
        assert!(Style::at(0.0, 0.0).with_size(10.0, 5.0).validate().is_ok());
    }

    #[test]
    fn camel_case_records_deserialize() {
        let style: Style =
            serde_json::from_value(serde_json::json!({"x": 3, "lineWidth": 2, "icon": "db"}))
                .unwrap();
        assert_eq!(style.x, Some(3.0));
        assert_eq!(style.line_width, Some(2.0));
        assert_eq!(style.extra.get("icon"), Some(&Value::from("db")));
    }
}
