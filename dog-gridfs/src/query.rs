use serde_json::{json, Value};

use crate::{Document, GridFsError, GridFsResult, CONTENT_TYPE_FIELD};

/// Sort direction for a single field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    /// Engine-native sort value (`1` / `-1`)
    pub fn as_native(self) -> i32 {
        match self {
            Self::Ascending => 1,
            Self::Descending => -1,
        }
    }
}

/// One field of a sort directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder {
    pub field: String,
    pub direction: Direction,
}

impl SortOrder {
    pub fn asc<S: Into<String>>(field: S) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Ascending,
        }
    }

    pub fn desc<S: Into<String>>(field: S) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Descending,
        }
    }
}

/// A condition on one field
#[derive(Debug, Clone, PartialEq)]
pub struct Criteria {
    key: String,
    condition: Option<Value>,
}

impl Criteria {
    /// Start a condition on a logical field name
    pub fn where_field<S: Into<String>>(key: S) -> Self {
        Self {
            key: key.into(),
            condition: None,
        }
    }

    pub fn is<V: Into<Value>>(self, value: V) -> Self {
        self.with_condition(value.into())
    }

    pub fn ne<V: Into<Value>>(self, value: V) -> Self {
        self.with_operator("$ne", value.into())
    }

    pub fn gt<V: Into<Value>>(self, value: V) -> Self {
        self.with_operator("$gt", value.into())
    }

    pub fn gte<V: Into<Value>>(self, value: V) -> Self {
        self.with_operator("$gte", value.into())
    }

    pub fn lt<V: Into<Value>>(self, value: V) -> Self {
        self.with_operator("$lt", value.into())
    }

    pub fn lte<V: Into<Value>>(self, value: V) -> Self {
        self.with_operator("$lte", value.into())
    }

    pub fn in_values<I, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.with_operator("$in", Value::Array(values))
    }

    pub fn exists(self, present: bool) -> Self {
        self.with_operator("$exists", Value::Bool(present))
    }

    /// Regular expression match, evaluated by the storage engine
    pub fn regex<S: Into<String>>(self, expression: S) -> Self {
        self.with_operator("$regex", Value::String(expression.into()))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Condition as a `{key: condition}` pair; no condition matches presence
    pub fn to_document(&self) -> Document {
        let condition = self
            .condition
            .clone()
            .unwrap_or_else(|| json!({ "$exists": true }));
        let mut doc = Document::new();
        doc.insert(self.key.clone(), condition);
        doc
    }

    fn with_condition(mut self, value: Value) -> Self {
        self.condition = Some(value);
        self
    }

    fn with_operator(mut self, operator: &str, value: Value) -> Self {
        match self.condition {
            Some(Value::Object(ref mut ops)) if ops.keys().all(|k| k.starts_with('$')) => {
                ops.insert(operator.to_string(), value);
            }
            _ => {
                let mut ops = Document::new();
                ops.insert(operator.to_string(), value);
                self.condition = Some(Value::Object(ops));
            }
        }
        self
    }
}

/// Criteria on the stored filename
pub fn where_filename() -> Criteria {
    Criteria::where_field("filename")
}

/// Criteria on the content type recorded in metadata
pub fn where_content_type() -> Criteria {
    Criteria::where_field(format!("metadata.{}", CONTENT_TYPE_FIELD))
}

/// Criteria on a single metadata key
pub fn where_metadata<S: AsRef<str>>(key: S) -> Criteria {
    Criteria::where_field(format!("metadata.{}", key.as_ref()))
}

/// Criteria on the metadata document as a whole
pub fn where_metadata_root() -> Criteria {
    Criteria::where_field("metadata")
}

/// Logical query: filter plus optional sort and paging
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    raw: Option<Value>,
    criteria: Vec<Criteria>,
    sort: Vec<SortOrder>,
    skip: Option<u64>,
    limit: Option<u64>,
}

impl Query {
    /// Empty query matching every file
    pub fn new() -> Self {
        Self::default()
    }

    /// Query with a single criteria
    pub fn query(criteria: Criteria) -> Self {
        Self::new().add_criteria(criteria)
    }

    /// Query from a raw filter document. Anything but a JSON object is
    /// rejected when the query is translated.
    pub fn from_document(raw: Value) -> Self {
        Self {
            raw: Some(raw),
            ..Self::default()
        }
    }

    pub fn add_criteria(mut self, criteria: Criteria) -> Self {
        self.criteria.push(criteria);
        self
    }

    pub fn with_sort(mut self, order: SortOrder) -> Self {
        self.sort.push(order);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn sort_orders(&self) -> &[SortOrder] {
        &self.sort
    }

    pub fn skip_value(&self) -> Option<u64> {
        self.skip
    }

    pub fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    /// Logical filter document, before field-name mapping
    pub fn filter_document(&self) -> GridFsResult<Document> {
        let mut filter = match &self.raw {
            None => Document::new(),
            Some(Value::Object(doc)) => doc.clone(),
            Some(Value::Null) => return Err(GridFsError::invalid("Query must not be null")),
            Some(other) => {
                return Err(GridFsError::invalid(format!(
                    "Query filter must be a document, got {}",
                    other
                )))
            }
        };

        for criteria in &self.criteria {
            if criteria.key.trim().is_empty() {
                return Err(GridFsError::invalid("Criteria key must not be empty"));
            }
            if filter.contains_key(&criteria.key) {
                return Err(GridFsError::invalid(format!(
                    "Query already contains criteria for key `{}`",
                    criteria.key
                )));
            }
            filter.extend(criteria.to_document());
        }

        Ok(filter)
    }

    /// Logical sort document, before field-name mapping
    pub fn sort_document(&self) -> GridFsResult<Document> {
        let mut sort = Document::new();
        for order in &self.sort {
            if order.field.trim().is_empty() {
                return Err(GridFsError::invalid("Sort field must not be empty"));
            }
            sort.insert(order.field.clone(), json!(order.direction.as_native()));
        }
        Ok(sort)
    }
}
