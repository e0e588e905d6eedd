use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::{Document, GridFsError, GridFsResult};

/// Field-name rules shared by metadata marshalling and query translation.
///
/// Whatever names a converter writes into metadata, the same converter
/// maps query and sort keys to, so stored records stay queryable.
pub trait DocumentConverter: Send + Sync {
    /// Map a logical field path to the engine-native path
    fn map_field<'a>(&self, field: &'a str) -> Cow<'a, str>;

    /// Turn a marshalled value into a document, mapping its top-level keys
    fn write(&self, value: Value) -> GridFsResult<Document> {
        match value {
            Value::Null => Ok(Document::new()),
            Value::Object(fields) => Ok(fields
                .into_iter()
                .map(|(key, value)| (self.map_field(&key).into_owned(), value))
                .collect()),
            other => Err(GridFsError::invalid(format!(
                "Metadata must marshal to a document, got {}",
                kind_of(&other)
            ))),
        }
    }
}

/// Marshal any serializable object into a document through a converter
pub fn marshal<T>(converter: &dyn DocumentConverter, object: &T) -> GridFsResult<Document>
where
    T: Serialize + ?Sized,
{
    let value = serde_json::to_value(object)?;
    converter.write(value)
}

const METADATA_FIELD: &str = "metadata";

/// Alias-table converter: `id` → `_id`, `upload_date` → `uploadDate`,
/// `chunk_size` → `chunkSize`. The first segment of a dotted path is mapped,
/// and under `metadata.` the segment after it too, matching how [`write`]
/// maps the top-level keys of marshalled metadata. Anything not in the table
/// passes through untouched.
///
/// [`write`]: DocumentConverter::write
#[derive(Debug, Clone)]
pub struct DefaultConverter {
    aliases: BTreeMap<String, String>,
}

impl DefaultConverter {
    pub fn new() -> Self {
        let aliases = [("id", "_id"), ("upload_date", "uploadDate"), ("chunk_size", "chunkSize")]
            .into_iter()
            .map(|(logical, native)| (logical.to_string(), native.to_string()))
            .collect();
        Self { aliases }
    }

    /// Add or replace an alias
    pub fn with_alias<L: Into<String>, N: Into<String>>(mut self, logical: L, native: N) -> Self {
        self.aliases.insert(logical.into(), native.into());
        self
    }
}

impl DefaultConverter {
    fn map_head<'a>(&self, path: &'a str) -> Cow<'a, str> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };

        match (self.aliases.get(head), rest) {
            (Some(native), Some(rest)) => Cow::Owned(format!("{}.{}", native, rest)),
            (Some(native), None) => Cow::Owned(native.clone()),
            (None, _) => Cow::Borrowed(path),
        }
    }
}

impl Default for DefaultConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentConverter for DefaultConverter {
    fn map_field<'a>(&self, field: &'a str) -> Cow<'a, str> {
        match field.split_once('.') {
            Some((METADATA_FIELD, entry)) => match self.map_head(entry) {
                Cow::Owned(entry) => Cow::Owned(format!("{}.{}", METADATA_FIELD, entry)),
                Cow::Borrowed(_) => Cow::Borrowed(field),
            },
            _ => self.map_head(field),
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a document",
    }
}
