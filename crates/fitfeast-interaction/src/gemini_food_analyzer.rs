//! GeminiFoodAnalyzer - Direct REST API implementation for Gemini.
//!
//! This analyzer calls the Gemini REST API directly without CLI dependency.
//! Configuration is loaded from secret.json

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use fitfeast_core::analysis::{AnalysisOutcome, FoodAnalyzer, RejectionReason};
use fitfeast_core::food::FoodItem;
use fitfeast_core::id::{IdGenerator, UuidIdGenerator};
use fitfeast_core::nutrition::NutrientProfile;
use fitfeast_core::secret::SecretService;
use fitfeast_infrastructure::SecretServiceImpl;

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Confidence below which a food-positive response is still rejected.
const CONFIDENCE_THRESHOLD: f64 = 0.5;
/// Portion estimate used when the model reports none, in grams.
const DEFAULT_ESTIMATED_WEIGHT_GRAMS: f64 = 100.0;

/// Instruction sent alongside every capture. The model is told to refuse
/// non-food subjects itself; the response filter re-checks the instructed
/// output.
const ANALYSIS_PROMPT: &str = "\
You are an extremely rigorous nutrition analyst.
Tasks:
1. First decide whether the central subject of the image is food.
2. If the image shows a face, a body part, an animal, clutter or background, you must force \"is_food\" to false.
3. Never attempt to compute calories for faces or non-food objects.
4. Only when you are certain it is food, identify the name, calories per 100g, macro-nutrients and estimated weight in grams.
5. The result must be accurate; when your confidence is below 0.5, set is_food to false.
Return JSON only.";

/// Analyzer implementation that talks to the Gemini HTTP API.
///
/// One attempt per capture; every failure kind is normalized to a
/// [`RejectionReason`] before it leaves this type.
#[derive(Clone)]
pub struct GeminiFoodAnalyzer {
    client: Client,
    api_key: String,
    model: String,
    id_generator: Arc<dyn IdGenerator>,
}

impl GeminiFoodAnalyzer {
    /// Creates a new analyzer with the provided API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            id_generator: Arc::new(UuidIdGenerator),
        }
    }

    /// Loads configuration from secret.json
    ///
    /// Model name defaults to `gemini-2.5-flash` if not specified.
    pub async fn try_from_secrets() -> anyhow::Result<Self> {
        let service = SecretServiceImpl::new()
            .map_err(|e| anyhow::anyhow!("Failed to initialize SecretService: {}", e))?;

        let secret_config = service
            .load_secrets()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to load secret.json: {}", e))?;

        let gemini_config = secret_config
            .gemini
            .ok_or_else(|| anyhow::anyhow!("Gemini configuration not found in secret.json"))?;

        if gemini_config.api_key.is_empty() {
            anyhow::bail!("Gemini API key in secret.json is empty");
        }

        let model = gemini_config
            .model_name
            .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());

        Ok(Self::new(gemini_config.api_key, model))
    }

    /// Overrides the model after construction.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Overrides the id source after construction (deterministic tests).
    pub fn with_id_generator(mut self, id_generator: Arc<dyn IdGenerator>) -> Self {
        self.id_generator = id_generator;
        self
    }

    async fn send_request(&self, image_base64: &str) -> Result<AnalysisResponse, CallError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineDataPayload {
                            mime_type: "image/jpeg".to_string(),
                            data: image_base64.to_string(),
                        },
                    },
                    Part::Text {
                        text: ANALYSIS_PROMPT.to_string(),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: analysis_schema(),
            },
        };

        let url = format!(
            "{}/{model}:generateContent?key={api_key}",
            BASE_URL,
            model = self.model,
            api_key = self.api_key
        );

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|err| CallError::Transport(format!("Gemini API request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| CallError::Malformed(format!("Failed to parse Gemini response: {err}")))?;

        let text = extract_text_response(parsed)?;

        serde_json::from_str(&text).map_err(|err| {
            CallError::Malformed(format!("Gemini returned non-conforming JSON: {err}"))
        })
    }

    /// Applies the rejection filter to a decoded response.
    ///
    /// The prompt already instructs the model to flag non-food subjects, but
    /// the filter re-validates: `is_food` must be true, a name must be
    /// present, and a reported confidence must clear the threshold.
    fn evaluate(&self, response: AnalysisResponse) -> AnalysisOutcome {
        if !response.is_food {
            return AnalysisOutcome::Rejected(RejectionReason::NotFood);
        }

        let name = match response.name {
            Some(name) if !name.trim().is_empty() => name,
            _ => return AnalysisOutcome::Rejected(RejectionReason::NotFood),
        };

        if let Some(confidence) = response.confidence {
            if confidence < CONFIDENCE_THRESHOLD {
                return AnalysisOutcome::Rejected(RejectionReason::LowConfidence);
            }
        }

        AnalysisOutcome::Accepted(FoodItem {
            id: self.id_generator.generate(),
            name,
            per_100g: NutrientProfile {
                calories: response.calories_per_100g.unwrap_or(0.0),
                protein: response.protein.unwrap_or(0.0),
                carbs: response.carbs.unwrap_or(0.0),
                fat: response.fat.unwrap_or(0.0),
            },
            estimated_weight_grams: response
                .estimated_weight
                .unwrap_or(DEFAULT_ESTIMATED_WEIGHT_GRAMS),
        })
    }
}

#[async_trait]
impl FoodAnalyzer for GeminiFoodAnalyzer {
    async fn analyze(&self, image_base64: &str) -> AnalysisOutcome {
        match self.send_request(image_base64).await {
            Ok(response) => {
                let outcome = self.evaluate(response);
                if let AnalysisOutcome::Rejected(reason) = &outcome {
                    tracing::debug!(?reason, "analysis response rejected by filter");
                }
                outcome
            }
            Err(CallError::Transport(message)) => {
                tracing::warn!(%message, "analysis request failed in transit");
                AnalysisOutcome::Rejected(RejectionReason::Transport)
            }
            Err(CallError::Malformed(message)) => {
                tracing::warn!(%message, "analysis response unusable");
                AnalysisOutcome::Rejected(RejectionReason::Malformed)
            }
        }
    }
}

/// Internal failure channel, collapsed to a [`RejectionReason`] at the
/// trait boundary.
enum CallError {
    /// The request never produced a usable HTTP response.
    Transport(String),
    /// The service answered, but the body was unusable.
    Malformed(String),
}

/// Structured-output schema sent with every request. `is_food` is the only
/// strictly required field.
fn analysis_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "is_food": { "type": "BOOLEAN", "description": "Whether the image contains valid food" },
            "name": { "type": "STRING", "description": "Food name" },
            "caloriesPer100g": { "type": "NUMBER", "description": "Kilocalories per 100 g" },
            "protein": { "type": "NUMBER", "description": "Protein grams per 100 g" },
            "carbs": { "type": "NUMBER", "description": "Carbohydrate grams per 100 g" },
            "fat": { "type": "NUMBER", "description": "Fat grams per 100 g" },
            "estimatedWeight": { "type": "NUMBER", "description": "Estimated portion weight in grams" },
            "confidence": { "type": "NUMBER", "description": "Confidence score 0-1" }
        },
        "required": ["is_food"]
    })
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataPayload,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataPayload {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: serde_json::Value,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

/// Decoded structured-output payload from the model.
#[derive(Debug, Clone, Deserialize)]
struct AnalysisResponse {
    is_food: bool,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "caloriesPer100g")]
    calories_per_100g: Option<f64>,
    #[serde(default)]
    protein: Option<f64>,
    #[serde(default)]
    carbs: Option<f64>,
    #[serde(default)]
    fat: Option<f64>,
    #[serde(default, rename = "estimatedWeight")]
    estimated_weight: Option<f64>,
    #[serde(default)]
    confidence: Option<f64>,
}

fn extract_text_response(response: GenerateContentResponse) -> Result<String, CallError> {
    response
        .candidates
        .and_then(|mut candidates| candidates.pop())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
        .ok_or_else(|| {
            CallError::Malformed("Gemini API returned no text in the response candidates".into())
        })
}

fn map_http_error(status: StatusCode, body: String) -> CallError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.clone());

    CallError::Transport(format!("Gemini API returned {status}: {message}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedIdGenerator;

    impl IdGenerator for FixedIdGenerator {
        fn generate(&self) -> String {
            "fixed-id".to_string()
        }
    }

    fn analyzer() -> GeminiFoodAnalyzer {
        GeminiFoodAnalyzer::new("test-key", DEFAULT_GEMINI_MODEL)
            .with_id_generator(Arc::new(FixedIdGenerator))
    }

    fn apple_response() -> AnalysisResponse {
        AnalysisResponse {
            is_food: true,
            name: Some("apple".to_string()),
            calories_per_100g: Some(52.0),
            protein: Some(0.3),
            carbs: Some(14.0),
            fat: Some(0.2),
            estimated_weight: Some(150.0),
            confidence: Some(0.9),
        }
    }

    #[test]
    fn test_not_food_is_rejected_even_with_nutrients_populated() {
        let response = AnalysisResponse {
            is_food: false,
            ..apple_response()
        };
        assert_eq!(
            analyzer().evaluate(response),
            AnalysisOutcome::Rejected(RejectionReason::NotFood)
        );
    }

    #[test]
    fn test_missing_or_empty_name_is_rejected() {
        let no_name = AnalysisResponse {
            name: None,
            ..apple_response()
        };
        let blank_name = AnalysisResponse {
            name: Some("  ".to_string()),
            ..apple_response()
        };
        assert_eq!(
            analyzer().evaluate(no_name),
            AnalysisOutcome::Rejected(RejectionReason::NotFood)
        );
        assert_eq!(
            analyzer().evaluate(blank_name),
            AnalysisOutcome::Rejected(RejectionReason::NotFood)
        );
    }

    #[test]
    fn test_low_confidence_is_rejected_even_when_food() {
        let response = AnalysisResponse {
            confidence: Some(0.4),
            ..apple_response()
        };
        assert_eq!(
            analyzer().evaluate(response),
            AnalysisOutcome::Rejected(RejectionReason::LowConfidence)
        );
    }

    #[test]
    fn test_absent_confidence_is_accepted() {
        let response = AnalysisResponse {
            confidence: None,
            ..apple_response()
        };
        assert!(matches!(
            analyzer().evaluate(response),
            AnalysisOutcome::Accepted(_)
        ));
    }

    #[test]
    fn test_accepted_item_carries_response_fields_and_fresh_id() {
        let outcome = analyzer().evaluate(apple_response());
        let item = outcome.accepted().expect("should be accepted");
        assert_eq!(item.id, "fixed-id");
        assert_eq!(item.name, "apple");
        assert_eq!(item.per_100g.calories, 52.0);
        assert_eq!(item.per_100g.protein, 0.3);
        assert_eq!(item.per_100g.carbs, 14.0);
        assert_eq!(item.per_100g.fat, 0.2);
        assert_eq!(item.estimated_weight_grams, 150.0);
    }

    #[test]
    fn test_absent_numeric_fields_default() {
        let response = AnalysisResponse {
            calories_per_100g: None,
            protein: None,
            carbs: None,
            fat: None,
            estimated_weight: None,
            ..apple_response()
        };
        let item = analyzer().evaluate(response).accepted().unwrap();
        assert_eq!(item.per_100g.calories, 0.0);
        assert_eq!(item.estimated_weight_grams, DEFAULT_ESTIMATED_WEIGHT_GRAMS);
    }

    #[test]
    fn test_response_decoding_requires_only_is_food() {
        let decoded: AnalysisResponse = serde_json::from_str(r#"{"is_food": false}"#).unwrap();
        assert!(!decoded.is_food);
        assert!(decoded.name.is_none());

        let full: AnalysisResponse = serde_json::from_str(
            r#"{"is_food": true, "name": "apple", "caloriesPer100g": 52, "protein": 0.3,
                "carbs": 14, "fat": 0.2, "estimatedWeight": 150, "confidence": 0.8}"#,
        )
        .unwrap();
        assert_eq!(full.calories_per_100g, Some(52.0));
        assert_eq!(full.estimated_weight, Some(150.0));

        assert!(serde_json::from_str::<AnalysisResponse>("not json").is_err());
    }
}
