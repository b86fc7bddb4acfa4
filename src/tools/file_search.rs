//! File search over service-hosted vector stores.

use crate::api::types::{FileSearchResources, ToolDefinition};

#[derive(Debug, Clone, PartialEq)]
pub struct FileSearchTool {
    vector_store_ids: Vec<String>,
}

impl FileSearchTool {
    /// Returns `None` when no vector store is configured.
    pub fn new(vector_store_ids: Vec<String>) -> Option<Self> {
        if vector_store_ids.is_empty() {
            None
        } else {
            Some(Self { vector_store_ids })
        }
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition::FileSearch
    }

    pub fn resource(&self) -> FileSearchResources {
        FileSearchResources {
            vector_store_ids: self.vector_store_ids.clone(),
        }
    }
}
