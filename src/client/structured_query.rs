//! Builder for Firestore `structuredQuery` bodies.

use super::codec::encode_value;
use serde_json::{json, Value};

/// Comparison operators used by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOp {
    Equal,
    GreaterThan,
    ArrayContains,
}

impl FieldOp {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "EQUAL",
            Self::GreaterThan => "GREATER_THAN",
            Self::ArrayContains => "ARRAY_CONTAINS",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Condition {
    field: String,
    op: FieldOp,
    value: Value,
}

/// A query over one collection. Conditions are combined with `AND`.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredQuery {
    collection: String,
    conditions: Vec<Condition>,
    order_by: Option<(String, bool)>,
    offset: Option<usize>,
    limit: Option<usize>,
}

impl StructuredQuery {
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            conditions: Vec::new(),
            order_by: None,
            offset: None,
            limit: None,
        }
    }

    pub fn filter(mut self, field: impl Into<String>, op: FieldOp, value: Value) -> Self {
        self.conditions.push(Condition {
            field: field.into(),
            op,
            value,
        });
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, descending: bool) -> Self {
        self.order_by = Some((field.into(), descending));
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn collection_id(&self) -> &str {
        &self.collection
    }

    /// The same query without ordering or pagination, for counting.
    pub fn without_paging(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            conditions: self.conditions.clone(),
            order_by: None,
            offset: None,
            limit: None,
        }
    }

    /// Render the `structuredQuery` JSON object.
    pub fn to_json(&self) -> Value {
        let mut query = json!({
            "from": [{ "collectionId": self.collection }]
        });

        let filters: Vec<Value> = self
            .conditions
            .iter()
            .map(|c| {
                json!({
                    "fieldFilter": {
                        "field": { "fieldPath": c.field },
                        "op": c.op.as_str(),
                        "value": encode_value(&c.value),
                    }
                })
            })
            .collect();

        match filters.len() {
            0 => {}
            1 => query["where"] = filters.into_iter().next().unwrap_or(Value::Null),
            _ => {
                query["where"] = json!({
                    "compositeFilter": { "op": "AND", "filters": filters }
                })
            }
        }

        if let Some((field, descending)) = &self.order_by {
            let direction = if *descending { "DESCENDING" } else { "ASCENDING" };
            query["orderBy"] = json!([{
                "field": { "fieldPath": field },
                "direction": direction,
            }]);
        }
        if let Some(offset) = self.offset.filter(|o| *o > 0) {
            query["offset"] = json!(offset);
        }
        if let Some(limit) = self.limit {
            query["limit"] = json!(limit);
        }

        query
    }
}
