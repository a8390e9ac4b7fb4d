use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::model::{AxisId, ValueId};

/// One selectable value of an option axis (e.g. "Red" on "Color")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionValue {
    pub id: ValueId,
    pub label: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_hex: Option<String>,
    /// Values without an explicit position sort as 0 and keep insertion order
    #[serde(default)]
    pub position: i32,
}

impl OptionValue {
    pub fn new(id: ValueId, label: impl Into<String>, position: i32) -> Self {
        let label = label.into();
        let slug = crate::logic::slugify(&label);
        Self {
            id,
            label,
            slug,
            color_hex: None,
            position,
        }
    }

    pub fn with_color(mut self, color_hex: impl Into<String>) -> Self {
        self.color_hex = Some(color_hex.into());
        self
    }
}

/// Value creation request sent to the attribute service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOptionValue {
    pub label: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_hex: Option<String>,
}

impl NewOptionValue {
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        let slug = crate::logic::slugify(&label);
        Self {
            label,
            slug,
            color_hex: None,
        }
    }

    pub fn with_color(mut self, color_hex: impl Into<String>) -> Self {
        self.color_hex = Some(color_hex.into());
        self
    }
}

/// A configurable product option and its ordered values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionAxis {
    pub axis_id: AxisId,
    pub axis_name: String,
    #[serde(default)]
    pub position: i32,
    pub values: Vec<OptionValue>,
}

impl OptionAxis {
    pub fn new(axis_id: AxisId, axis_name: impl Into<String>, position: i32) -> Self {
        Self {
            axis_id,
            axis_name: axis_name.into(),
            position,
            values: Vec::new(),
        }
    }

    pub fn with_values(mut self, values: Vec<OptionValue>) -> Self {
        for value in values {
            self.push_value(value);
        }
        self
    }

    pub fn value(&self, id: ValueId) -> Option<&OptionValue> {
        self.values.iter().find(|v| v.id == id)
    }

    pub fn contains_value(&self, id: ValueId) -> bool {
        self.value(id).is_some()
    }

    /// Values ordered by position; ties keep insertion order
    pub fn sorted_values(&self) -> Vec<&OptionValue> {
        self.values.iter().sorted_by_key(|v| v.position).collect()
    }

    pub fn next_value_position(&self) -> i32 {
        self.values
            .iter()
            .map(|v| v.position)
            .max()
            .map_or(0, |max| max + 1)
    }

    /// Append a value unless one with the same id is already present.
    /// Returns whether the value was inserted.
    pub fn push_value(&mut self, value: OptionValue) -> bool {
        if self.contains_value(value.id) {
            return false;
        }
        self.values.push(value);
        true
    }

    /// Keep only values matching the predicate, returning the ids of removed values
    pub fn retain_values<F>(&mut self, mut keep: F) -> Vec<ValueId>
    where
        F: FnMut(&OptionValue) -> bool,
    {
        let mut removed = Vec::new();
        self.values.retain(|v| {
            let kept = keep(v);
            if !kept {
                removed.push(v.id);
            }
            kept
        });
        removed
    }

    pub fn has_label(&self, label: &str) -> bool {
        let needle = label.trim().to_lowercase();
        self.values
            .iter()
            .any(|v| v.label.trim().to_lowercase() == needle)
    }
}

/// Axes ordered by position; ties keep their relative input order
pub fn sort_axes(axes: &[OptionAxis]) -> Vec<&OptionAxis> {
    axes.iter().sorted_by_key(|a| a.position).collect()
}

/// Find the axis with the lowest position (first on ties)
pub fn first_axis(axes: &[OptionAxis]) -> Option<&OptionAxis> {
    sort_axes(axes).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_values_is_stable_on_ties() {
        let axis = OptionAxis::new(1, "Size", 0).with_values(vec![
            OptionValue::new(10, "M", 0),
            OptionValue::new(11, "S", 0),
            OptionValue::new(12, "XS", -1),
        ]);

        let labels: Vec<&str> = axis.sorted_values().iter().map(|v| v.label.as_str()).collect();
        assert_eq!(labels, vec!["XS", "M", "S"]);
    }

    #[test]
    fn test_push_value_rejects_duplicate_ids() {
        let mut axis = OptionAxis::new(1, "Color", 0);
        assert!(axis.push_value(OptionValue::new(1, "Red", 0)));
        assert!(!axis.push_value(OptionValue::new(1, "Rouge", 1)));
        assert_eq!(axis.values.len(), 1);
        assert_eq!(axis.next_value_position(), 1);
    }

    #[test]
    fn test_value_slug_is_derived() {
        let value = NewOptionValue::new("Navy Blue").with_color("#000080");
        assert_eq!(value.slug, "navy-blue");
        assert_eq!(value.color_hex.as_deref(), Some("#000080"));
    }
}
