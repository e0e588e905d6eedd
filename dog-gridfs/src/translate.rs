use std::sync::Arc;

use serde_json::Value;

use crate::{Document, DocumentConverter, FindRequest, GridFsResult, Query};

const LOGICAL_OPERATORS: [&str; 3] = ["$and", "$or", "$nor"];

/// Engine-native form of a [`Query`]
#[derive(Debug, Clone, PartialEq)]
pub struct NativeQuery {
    pub filter: Document,
    /// `None` leaves the engine's natural order in place
    pub sort: Option<Document>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

impl NativeQuery {
    /// Build the engine find request for this query
    pub fn into_request(self) -> FindRequest {
        let mut request = FindRequest::new(self.filter);
        if let Some(sort) = self.sort {
            request = request.sort(sort);
        }
        if let Some(skip) = self.skip {
            request = request.skip(skip);
        }
        if let Some(limit) = self.limit {
            request = request.limit(limit);
        }
        request
    }
}

/// Maps logical queries onto the storage engine's query documents
#[derive(Clone)]
pub struct QueryTranslator {
    converter: Arc<dyn DocumentConverter>,
}

impl QueryTranslator {
    pub fn new(converter: Arc<dyn DocumentConverter>) -> Self {
        Self { converter }
    }

    /// Translate filter and sort. An empty filter matches everything; an
    /// empty sort yields `None`.
    pub fn translate(&self, query: &Query) -> GridFsResult<NativeQuery> {
        let filter = self.map_filter(query.filter_document()?);
        let sort = self.map_sort(query.sort_document()?);

        Ok(NativeQuery {
            filter,
            sort: (!sort.is_empty()).then_some(sort),
            skip: query.skip_value(),
            limit: query.limit_value(),
        })
    }

    /// Map field names of a filter document
    pub fn map_filter(&self, filter: Document) -> Document {
        filter
            .into_iter()
            .map(|(key, value)| {
                if LOGICAL_OPERATORS.contains(&key.as_str()) {
                    (key, self.map_clauses(value))
                } else if key.starts_with('$') {
                    (key, value)
                } else {
                    (self.converter.map_field(&key).into_owned(), value)
                }
            })
            .collect()
    }

    /// Map field names of a sort document, keeping key order
    pub fn map_sort(&self, sort: Document) -> Document {
        sort.into_iter()
            .map(|(key, value)| (self.converter.map_field(&key).into_owned(), value))
            .collect()
    }

    fn map_clauses(&self, clauses: Value) -> Value {
        match clauses {
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(doc) => Value::Object(self.map_filter(doc)),
                        other => other,
                    })
                    .collect(),
            ),
            other => other,
        }
    }
}
