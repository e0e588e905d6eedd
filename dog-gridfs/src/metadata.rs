use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::convert::marshal;
use crate::{Document, DocumentConverter, GridFsError, GridFsResult};

/// Reserved metadata key holding the content type
pub const CONTENT_TYPE_FIELD: &str = "_contentType";

/// Assembles the metadata document attached to an upload.
///
/// The content type is written first and caller metadata is layered over
/// it, so a caller-supplied `_contentType` wins.
#[derive(Clone)]
pub struct MetadataBuilder {
    converter: Arc<dyn DocumentConverter>,
}

impl MetadataBuilder {
    pub fn new(converter: Arc<dyn DocumentConverter>) -> Self {
        Self { converter }
    }

    /// Build from a content type and at most one caller metadata source
    pub fn build<T>(
        &self,
        content_type: Option<&str>,
        document: Option<&Document>,
        object: Option<&T>,
    ) -> GridFsResult<Document>
    where
        T: Serialize + ?Sized,
    {
        let caller = match (document, object) {
            (Some(_), Some(_)) => {
                return Err(GridFsError::invalid(
                    "Supply either a metadata document or a metadata object, not both",
                ))
            }
            (Some(doc), None) => Some(doc.clone()),
            (None, Some(obj)) => Some(marshal(self.converter.as_ref(), obj)?),
            (None, None) => None,
        };

        let mut metadata = Document::new();

        if let Some(ct) = content_type.filter(|ct| !ct.trim().is_empty()) {
            metadata.insert(CONTENT_TYPE_FIELD.to_string(), Value::String(ct.to_string()));
        }

        if let Some(caller) = caller {
            metadata.extend(caller);
        }

        Ok(metadata)
    }

    /// Build without a metadata object
    pub fn build_document(
        &self,
        content_type: Option<&str>,
        document: Option<&Document>,
    ) -> GridFsResult<Document> {
        self.build::<()>(content_type, document, None)
    }
}
