use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ValueId;

/// One Cartesian-product tuple: a value id per axis, in axis position order.
/// The empty combination represents the default variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Combination(Vec<ValueId>);

impl Combination {
    pub fn new(value_ids: Vec<ValueId>) -> Self {
        Self(value_ids)
    }

    pub fn value_ids(&self) -> &[ValueId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn signature(&self) -> Signature {
        crate::logic::signature(&self.0)
    }

    pub fn into_value_ids(self) -> Vec<ValueId> {
        self.0
    }
}

impl From<Vec<ValueId>> for Combination {
    fn from(value_ids: Vec<ValueId>) -> Self {
        Self(value_ids)
    }
}

/// Order-independent identity key of a combination
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(String);

impl Signature {
    pub(crate) fn from_key(key: String) -> Self {
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The default variant's signature is the empty key
    pub fn is_default(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "<default>")
        } else {
            write!(f, "{}", self.0)
        }
    }
}
