//! HTTP implementation of [`RecipeAi`] against the generative recipe
//! service's JSON API.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::trait_def::{
    ConsolidatedList, RecipeAi, RecipeDetails, SkeletonRequest, SynthesisRequest,
};
use super::AiError;

/// Connection settings for the generative recipe service.
#[derive(Debug, Clone)]
pub struct AiConfig {
    /// Base URL of the service, without a trailing slash.
    pub base_url: String,
    /// Bearer token, if the deployment requires one.
    pub api_key: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl AiConfig {
    /// Default per-request timeout.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key,
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Production [`RecipeAi`] backed by `reqwest`.
pub struct HttpRecipeAi {
    config: AiConfig,
    client: reqwest::Client,
}

impl HttpRecipeAi {
    pub fn new(config: AiConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    /// POST a JSON payload and return the raw response, with status codes
    /// mapped onto the [`AiError`] taxonomy.
    async fn post(&self, path: &str, payload: &Value) -> Result<reqwest::Response, AiError> {
        let url = format!("{}{path}", self.config.base_url);

        let mut request = self.client.post(&url).json(payload);
        if let Some(ref key) = self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AiError::Timeout
            } else {
                AiError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => AiError::Auth(message),
                429 => AiError::RateLimited,
                code => AiError::Status { status: code, message },
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl RecipeAi for HttpRecipeAi {
    fn name(&self) -> &str {
        "http"
    }

    async fn plan_skeleton(&self, req: &SkeletonRequest) -> Result<String, AiError> {
        let payload = serde_json::to_value(req).map_err(|e| AiError::Parse(e.to_string()))?;
        let response = self.post("/v1/plan-skeletons", &payload).await?;

        // The skeleton endpoint returns raw text; the pipeline parses it
        // tolerantly and never trusts its shape.
        response
            .text()
            .await
            .map_err(|e| AiError::Network(e.to_string()))
    }

    async fn recipe_details(&self, req: &SynthesisRequest) -> Result<RecipeDetails, AiError> {
        let payload = serde_json::to_value(req).map_err(|e| AiError::Parse(e.to_string()))?;
        let response = self.post("/v1/recipes", &payload).await?;

        response
            .json::<RecipeDetails>()
            .await
            .map_err(|e| AiError::Parse(e.to_string()))
    }

    async fn consolidate_list(&self, items: &[String]) -> Result<ConsolidatedList, AiError> {
        let payload = json!({ "ingredients": items });
        let response = self.post("/v1/shopping-lists", &payload).await?;

        let value = response
            .json::<Value>()
            .await
            .map_err(|e| AiError::Parse(e.to_string()))?;

        parse_consolidated(value)
    }
}

/// Interpret the consolidation response: a string is a flat list, an object
/// of string values is a category map. Anything else is a parse error (the
/// caller falls back to the flat rendering).
fn parse_consolidated(value: Value) -> Result<ConsolidatedList, AiError> {
    match value {
        Value::String(s) => Ok(ConsolidatedList::Flat(s)),
        Value::Object(map) => {
            let mut categories = BTreeMap::new();
            for (key, val) in map {
                match val {
                    Value::String(s) => {
                        categories.insert(key, s);
                    }
                    other => {
                        return Err(AiError::Parse(format!(
                            "category {key:?} has non-string value: {other}"
                        )));
                    }
                }
            }
            Ok(ConsolidatedList::Categorized(categories))
        }
        other => Err(AiError::Parse(format!(
            "unexpected consolidation response: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_consolidated_flat_string() {
        let parsed = parse_consolidated(json!("2 tbsp olive oil\n1 cup rice")).unwrap();
        assert_eq!(
            parsed,
            ConsolidatedList::Flat("2 tbsp olive oil\n1 cup rice".to_string())
        );
    }

    #[test]
    fn parse_consolidated_category_map() {
        let parsed = parse_consolidated(json!({
            "produce": "2 onions\n1 bunch basil",
            "pantry": "1 cup rice",
        }))
        .unwrap();
        let ConsolidatedList::Categorized(map) = parsed else {
            panic!("expected categorized list");
        };
        assert_eq!(map.len(), 2);
        assert_eq!(map["produce"], "2 onions\n1 bunch basil");
    }

    #[test]
    fn parse_consolidated_rejects_nested_values() {
        let result = parse_consolidated(json!({ "produce": ["2 onions"] }));
        assert!(matches!(result, Err(AiError::Parse(_))));
    }

    #[test]
    fn parse_consolidated_rejects_arrays() {
        let result = parse_consolidated(json!(["2 onions"]));
        assert!(matches!(result, Err(AiError::Parse(_))));
    }

    #[test]
    fn skeleton_request_serializes_camel_case() {
        let req = SkeletonRequest {
            instructions: "outline".to_string(),
            preference_context: "vegetarian".to_string(),
            ingredients_on_hand: Some("rice, lentils".to_string()),
            calorie_context: None,
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["preferenceContext"], "vegetarian");
        assert_eq!(value["ingredientsOnHand"], "rice, lentils");
        assert!(value.get("calorieContext").is_none());
    }
}
