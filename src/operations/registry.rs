use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use rust_mcp_sdk::schema::{ContentBlock, Tool};

use crate::errors::{GatewayError, HandlerError};
use crate::operations::schema::{InputSchema, ValidatedInput};

#[async_trait]
pub trait OperationHandler: Send + Sync {
    async fn call(&self, input: ValidatedInput) -> Result<Vec<ContentBlock>, HandlerError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationMetadata {
    pub title: Option<String>,
    pub description: String,
}

impl OperationMetadata {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            description: description.into(),
        }
    }
}

pub struct Operation {
    name: String,
    metadata: OperationMetadata,
    schema: InputSchema,
    handler: Arc<dyn OperationHandler>,
}

impl Operation {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metadata(&self) -> &OperationMetadata {
        &self.metadata
    }

    pub fn schema(&self) -> &InputSchema {
        &self.schema
    }

    pub async fn invoke(&self, input: ValidatedInput) -> Result<Vec<ContentBlock>, HandlerError> {
        self.handler.call(input).await
    }

    /// Entry of a `tools/list` result.
    pub fn descriptor(&self) -> Tool {
        Tool {
            name: self.name().to_string(),
            title: self.metadata.title.clone(),
            description: Some(self.metadata.description.clone()),
            input_schema: self.schema.to_tool_input_schema(),
            output_schema: None,
            annotations: None,
            execution: None,
            icons: vec![],
            meta: None,
        }
    }
}

/// Operations are registered once at startup and read concurrently by every
/// session afterwards, so the registry is shared behind an `Arc` without a lock.
#[derive(Default)]
pub struct OperationRegistry {
    operations: Vec<Arc<Operation>>,
    index: HashMap<String, usize>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        metadata: OperationMetadata,
        schema: InputSchema,
        handler: Arc<dyn OperationHandler>,
    ) -> Result<(), GatewayError> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(GatewayError::DuplicateOperation(name));
        }

        self.index.insert(name.clone(), self.operations.len());
        self.operations.push(Arc::new(Operation {
            name,
            metadata,
            schema,
            handler,
        }));
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<Operation>, GatewayError> {
        self.index
            .get(name)
            .map(|position| self.operations[*position].clone())
            .ok_or_else(|| GatewayError::UnknownOperation(name.to_string()))
    }

    pub fn descriptors(&self) -> Vec<Tool> {
        self.operations.iter().map(|op| op.descriptor()).collect()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
