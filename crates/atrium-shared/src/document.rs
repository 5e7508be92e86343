//! The generic document envelope and the declarative query description.
//!
//! Every record in the portal backend carries the same three envelope
//! fields (`id`, `createdAt`, `updatedAt`); everything else is a schemaless
//! payload. [`Document<T>`] fixes the envelope as a wrapper struct and keeps
//! the payload generic, with [`RawDocument`] (a JSON object payload) as the
//! shape the backend traffics in.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{PortalError, Result};

/// A schemaless JSON object payload.
pub type JsonMap = Map<String, Value>;

/// A stored document: fixed envelope plus generic payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document<T> {
    /// Unique id within the collection. Immutable after creation.
    pub id: String,
    /// Set exactly once, when the document is first written.
    pub created_at: DateTime<Utc>,
    /// Refreshed on every write, including the first.
    pub updated_at: DateTime<Utc>,
    /// The collection-specific payload.
    pub data: T,
}

/// The untyped wire shape stored by backends.
pub type RawDocument = Document<JsonMap>;

/// Generate a fresh server-assigned document id.
pub fn new_document_id() -> String {
    Uuid::new_v4().to_string()
}

/// Serialize a payload into the JSON object a document stores.
///
/// Payloads must serialize to JSON objects; anything else (a bare string,
/// an array) cannot carry the envelope fields next to it.
pub fn to_json_map<T: Serialize>(data: &T) -> Result<JsonMap> {
    match serde_json::to_value(data)? {
        Value::Object(map) => Ok(map),
        other => Err(PortalError::Serialization(serde::ser::Error::custom(
            format!("document payload must be a JSON object, got {other}"),
        ))),
    }
}

impl RawDocument {
    /// Resolve a query field against this document.
    ///
    /// `id`, `createdAt` and `updatedAt` resolve against the envelope
    /// (timestamps as microsecond integers so they order numerically);
    /// every other name resolves against the payload.
    pub fn field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::String(self.id.clone())),
            "createdAt" => Some(Value::from(self.created_at.timestamp_micros())),
            "updatedAt" => Some(Value::from(self.updated_at.timestamp_micros())),
            _ => self.data.get(name).cloned(),
        }
    }

    /// Deserialize the payload into a typed document.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<Document<T>> {
        let data = serde_json::from_value(Value::Object(self.data))?;
        Ok(Document {
            id: self.id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            data,
        })
    }
}

// ---------------------------------------------------------------------------
// Query description
// ---------------------------------------------------------------------------

/// Comparison operator of a single `where` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WhereOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    /// Array membership: the field is an array containing the given value.
    Contains,
}

/// One `where` clause. Clauses combine with AND semantics only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhereFilter {
    pub field: String,
    pub op: WhereOp,
    pub value: Value,
}

/// Sort direction for [`OrderBy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    Ascending,
    Descending,
}

/// Single-field, single-direction ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Declarative filter / sort / cap description for a collection read.
///
/// The same options value always translates to the same backend query
/// shape: backends apply `filters`, then `order_by`, then `limit`, and the
/// service layer never re-filters the result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    pub filters: Vec<WhereFilter>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `where` clause (AND-combined with existing ones).
    pub fn filter(mut self, field: &str, op: WhereOp, value: impl Into<Value>) -> Self {
        self.filters.push(WhereFilter {
            field: field.to_string(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.to_string(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a document satisfies every `where` clause.
    ///
    /// A clause on a field the document does not carry never matches.
    pub fn matches(&self, doc: &RawDocument) -> bool {
        self.filters.iter().all(|clause| {
            let Some(actual) = doc.field(&clause.field) else {
                return false;
            };
            match clause.op {
                WhereOp::Eq => actual == clause.value,
                WhereOp::Ne => actual != clause.value,
                WhereOp::Lt => compare_values(&actual, &clause.value) == Some(Ordering::Less),
                WhereOp::Lte => matches!(
                    compare_values(&actual, &clause.value),
                    Some(Ordering::Less | Ordering::Equal)
                ),
                WhereOp::Gt => compare_values(&actual, &clause.value) == Some(Ordering::Greater),
                WhereOp::Gte => matches!(
                    compare_values(&actual, &clause.value),
                    Some(Ordering::Greater | Ordering::Equal)
                ),
                WhereOp::Contains => match actual {
                    Value::Array(items) => items.contains(&clause.value),
                    _ => false,
                },
            }
        })
    }

    /// Apply the full description to a snapshot: filter, then sort, then cap.
    pub fn apply(&self, docs: Vec<RawDocument>) -> Vec<RawDocument> {
        let mut result: Vec<RawDocument> =
            docs.into_iter().filter(|d| self.matches(d)).collect();

        if let Some(order) = &self.order_by {
            result.sort_by(|a, b| {
                let ord = match (a.field(&order.field), b.field(&order.field)) {
                    (Some(va), Some(vb)) => {
                        compare_values(&va, &vb).unwrap_or(Ordering::Equal)
                    }
                    // Documents missing the sort field go last.
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                match order.direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            });
        }

        if let Some(limit) = self.limit {
            result.truncate(limit);
        }
        result
    }
}

/// Order two JSON values of the same kind. Mixed kinds do not order.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, fields: Value) -> RawDocument {
        let Value::Object(data) = fields else {
            panic!("test payload must be an object")
        };
        let now = Utc::now();
        Document {
            id: id.to_string(),
            created_at: now,
            updated_at: now,
            data,
        }
    }

    #[test]
    fn filter_sort_cap_order() {
        let docs = vec![
            doc("1", json!({"a": 1})),
            doc("2", json!({"a": 2})),
            doc("3", json!({"a": 3})),
        ];
        let options = QueryOptions::new()
            .filter("a", WhereOp::Gt, 1)
            .order_by("a", Direction::Descending)
            .limit(1);

        let result = options.apply(docs);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].data["a"], json!(3));
    }

    #[test]
    fn clauses_combine_with_and() {
        let docs = vec![
            doc("1", json!({"a": 1, "b": "x"})),
            doc("2", json!({"a": 2, "b": "x"})),
            doc("3", json!({"a": 2, "b": "y"})),
        ];
        let options = QueryOptions::new()
            .filter("a", WhereOp::Eq, 2)
            .filter("b", WhereOp::Eq, "x");

        let result = options.apply(docs);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "2");
    }

    #[test]
    fn contains_matches_array_membership() {
        let d = doc("c1", json!({"participants": ["u1", "u2"]}));
        let yes = QueryOptions::new().filter("participants", WhereOp::Contains, "u1");
        let no = QueryOptions::new().filter("participants", WhereOp::Contains, "u3");
        assert!(yes.matches(&d));
        assert!(!no.matches(&d));
    }

    #[test]
    fn missing_field_never_matches() {
        let d = doc("1", json!({"a": 1}));
        let options = QueryOptions::new().filter("b", WhereOp::Ne, 5);
        assert!(!options.matches(&d));
    }

    #[test]
    fn envelope_fields_resolve() {
        let d = doc("abc", json!({}));
        assert_eq!(d.field("id"), Some(json!("abc")));
        assert_eq!(
            d.field("createdAt"),
            Some(json!(d.created_at.timestamp_micros()))
        );
    }

    #[test]
    fn typed_round_trip() {
        #[derive(Debug, Serialize, Deserialize, PartialEq)]
        struct Payload {
            name: String,
            count: u32,
        }

        let payload = Payload {
            name: "x".into(),
            count: 7,
        };
        let map = to_json_map(&payload).unwrap();
        let raw = doc("1", Value::Object(map));
        let typed: Document<Payload> = raw.into_typed().unwrap();
        assert_eq!(typed.data, payload);
    }

    #[test]
    fn non_object_payload_rejected() {
        assert!(to_json_map(&"just a string").is_err());
    }
}
