//! Vacancy tools exposed via Model Context Protocol
//!
//! Provides `get_vacancies` and `get_vacancies_by_search_word` by delegating
//! to a `VacancySource`. Each tool returns the backend's JSON verbatim in a
//! single text block.

use std::sync::Arc;

use async_trait::async_trait;
use rust_mcp_sdk::schema::{ContentBlock, TextContent};
use serde_json::Value;

use crate::errors::{GatewayError, HandlerError};
use crate::operations::{
    FieldType, InputSchema, OperationHandler, OperationMetadata, OperationRegistry, ValidatedInput,
};

pub const GET_VACANCIES: &str = "get_vacancies";
pub const GET_VACANCIES_BY_SEARCH_WORD: &str = "get_vacancies_by_search_word";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VacancyQuery {
    pub text: Option<String>,
    pub per_page: Option<u64>,
}

#[async_trait]
pub trait VacancySource: Send + Sync {
    async fn fetch_vacancies(&self, query: &VacancyQuery) -> Result<Value, HandlerError>;
}

pub struct GetVacanciesTool {
    source: Arc<dyn VacancySource>,
}

#[async_trait]
impl OperationHandler for GetVacanciesTool {
    async fn call(&self, _input: ValidatedInput) -> Result<Vec<ContentBlock>, HandlerError> {
        let vacancies = self.source.fetch_vacancies(&VacancyQuery::default()).await?;
        text_block(&vacancies)
    }
}

pub struct SearchVacanciesTool {
    source: Arc<dyn VacancySource>,
}

#[async_trait]
impl OperationHandler for SearchVacanciesTool {
    async fn call(&self, input: ValidatedInput) -> Result<Vec<ContentBlock>, HandlerError> {
        let Some(text) = input.str("searchText") else {
            return Err(HandlerError::InvalidInput("searchText is required".to_string()));
        };

        let query = VacancyQuery {
            text: Some(text.to_string()),
            per_page: per_page(input.number("perPage")),
        };
        let vacancies = self.source.fetch_vacancies(&query).await?;
        text_block(&vacancies)
    }
}

/// Page sizes below one are treated as absent; fractions are truncated.
fn per_page(requested: Option<f64>) -> Option<u64> {
    requested
        .filter(|value| value.is_finite() && *value >= 1.0)
        .map(|value| value.trunc() as u64)
}

fn text_block(value: &Value) -> Result<Vec<ContentBlock>, HandlerError> {
    let text = serde_json::to_string(value).map_err(|err| HandlerError::Decode(err.to_string()))?;
    Ok(vec![ContentBlock::from(TextContent::new(text, None, None))])
}

pub fn register_vacancy_tools(
    registry: &mut OperationRegistry,
    source: Arc<dyn VacancySource>,
) -> Result<(), GatewayError> {
    registry.register(
        GET_VACANCIES,
        OperationMetadata::new(
            "Получение всех вакансий",
            "Возвращает список всех вакансий.",
        ),
        InputSchema::new(),
        Arc::new(GetVacanciesTool {
            source: source.clone(),
        }),
    )?;

    registry.register(
        GET_VACANCIES_BY_SEARCH_WORD,
        OperationMetadata::new(
            "Получение всех вакансий по поисковому слову",
            "Возвращает список всех вакансий по поисковому слову. Можно передать количество элементов",
        ),
        InputSchema::new()
            .field("searchText", FieldType::String, false, Some("Search phrase"))
            .field(
                "perPage",
                FieldType::Number,
                true,
                Some("Number of vacancies per page"),
            ),
        Arc::new(SearchVacanciesTool { source }),
    )?;

    Ok(())
}

pub fn build_operation_registry(
    source: Arc<dyn VacancySource>,
) -> Result<OperationRegistry, GatewayError> {
    let mut registry = OperationRegistry::new();
    register_vacancy_tools(&mut registry, source)?;
    Ok(registry)
}
