//! Event type to cache bucket mapping

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One cache bucket to invalidate
///
/// In YAML either a bare name (`orders`) or a map with a payload field that
/// narrows the key (`{name: order, key_field: _id}` -> `["order", <_id>]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BucketRepr")]
pub struct BucketSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_field: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BucketRepr {
    Name(String),
    Keyed {
        name: String,
        #[serde(default)]
        key_field: Option<String>,
    },
}

impl From<BucketRepr> for BucketSpec {
    fn from(repr: BucketRepr) -> Self {
        match repr {
            BucketRepr::Name(name) => Self::new(name),
            BucketRepr::Keyed { name, key_field } => Self { name, key_field },
        }
    }
}

impl BucketSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key_field: None,
        }
    }

    pub fn keyed(name: impl Into<String>, key_field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key_field: Some(key_field.into()),
        }
    }
}

impl fmt::Display for BucketSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key_field {
            Some(field) => write!(f, "{}[{}]", self.name, field),
            None => f.write_str(&self.name),
        }
    }
}

/// Buckets the admin dashboard refetches per event type
pub fn default_buckets() -> BTreeMap<String, Vec<BucketSpec>> {
    BTreeMap::from([
        (
            "new_order".to_string(),
            vec![BucketSpec::new("orders"), BucketSpec::new("orderStats")],
        ),
        (
            "order_updated".to_string(),
            vec![BucketSpec::keyed("order", "_id"), BucketSpec::new("orders")],
        ),
        (
            "new_booking".to_string(),
            vec![
                BucketSpec::new("tableBookings"),
                BucketSpec::new("eventBookings"),
                BucketSpec::new("bookingStats"),
            ],
        ),
        ("new_review".to_string(), vec![BucketSpec::new("reviews")]),
    ])
}
