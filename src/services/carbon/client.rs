use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::CarbonError;
use crate::http_client::HttpClient;

/// Public Data Fair datasets endpoint.
pub const DEFAULT_DATAFAIR_BASE: &str = "https://data.ademe.fr/data-fair/api/v1/datasets";

const FACTORS_DATASET: &str = "base-carboner";
const BILANS_DATASET: &str = "bilan-ges";

/// One page of dataset lines.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinesPage {
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub results: Vec<Value>,
}

/// Read-only client for the emission-factor and published-bilan datasets.
#[derive(Clone)]
pub struct DataFairClient {
    client: HttpClient,
    base: String,
}

impl DataFairClient {
    pub fn new(client: HttpClient, base: &str) -> Self {
        Self {
            client,
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// Full-text search over emission factors.
    pub async fn search_factors(
        &self,
        query: Option<&str>,
        size: u32,
        page: u32,
    ) -> Result<LinesPage, CarbonError> {
        let mut params = vec![("size", size.to_string()), ("page", page.to_string())];
        if let Some(q) = query.map(str::trim).filter(|q| !q.is_empty()) {
            params.push(("q", q.to_string()));
        }
        self.lines(FACTORS_DATASET, &params).await
    }

    /// Published greenhouse-gas reports matching a SIREN (or company name).
    pub async fn bilans_by_siren(
        &self,
        siren: &str,
        size: u32,
        page: u32,
    ) -> Result<LinesPage, CarbonError> {
        let params = [
            ("q", siren.trim().to_string()),
            ("size", size.to_string()),
            ("page", page.to_string()),
        ];
        self.lines(BILANS_DATASET, &params).await
    }

    async fn lines(
        &self,
        dataset: &str,
        params: &[(&str, String)],
    ) -> Result<LinesPage, CarbonError> {
        let url = format!("{}/{}/lines", self.base, dataset);
        debug!("Data Fair query {} {:?}", url, params);

        let body = self
            .client
            .get_json(&url, params)
            .await
            .map_err(|source| CarbonError::Request {
                url: url.clone(),
                source,
            })?;

        serde_json::from_value(body).map_err(|e| CarbonError::Response {
            url,
            message: e.to_string(),
        })
    }
}
