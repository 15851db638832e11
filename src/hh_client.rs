use async_trait::async_trait;
use reqwest::{header, Client};
use serde_json::Value;

use crate::domain::vacancies::{VacancyQuery, VacancySource};
use crate::errors::HandlerError;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// `VacancySource` backed by the public hh.ru REST API.
#[derive(Debug, Clone)]
pub struct HhApiClient {
    client: Client,
    base_url: String,
    area: u32,
}

impl HhApiClient {
    pub fn new(base_url: impl Into<String>, area: u32) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            area,
        }
    }

    pub fn vacancies_url(&self) -> String {
        format!("{}/vacancies", self.base_url.trim_end_matches('/'))
    }

    pub fn query_params(&self, query: &VacancyQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![("area", self.area.to_string())];
        if let Some(text) = &query.text {
            params.push(("text", text.clone()));
        }
        if let Some(per_page) = query.per_page {
            params.push(("per_page", per_page.to_string()));
        }
        params
    }
}

#[async_trait]
impl VacancySource for HhApiClient {
    #[tracing::instrument(name = "Fetch vacancies from hh.ru", skip(self))]
    async fn fetch_vacancies(&self, query: &VacancyQuery) -> Result<Value, HandlerError> {
        let response = self
            .client
            .get(self.vacancies_url())
            .header(header::USER_AGENT, USER_AGENT)
            .query(&self.query_params(query))
            .send()
            .await
            .map_err(|err| {
                tracing::error!("Failed to reach vacancies API: {:?}", err);
                HandlerError::Backend(err.to_string())
            })?
            .error_for_status()
            .map_err(|err| {
                tracing::error!("Vacancies API returned error status: {:?}", err);
                HandlerError::Backend(err.to_string())
            })?;

        response
            .json::<Value>()
            .await
            .map_err(|err| HandlerError::Decode(err.to_string()))
    }
}
