//! HTTP model adapter for any OpenAI-compatible chat completions endpoint.
//!
//! Targets the small local/self-hosted deployment described by
//! `cp_domain::config::ModelConfig` (e.g. an Ollama or vLLM instance
//! serving a Gemma checkpoint) rather than a hosted multi-provider
//! gateway, so the wire shape is deliberately the minimal subset of the
//! OpenAI chat completions contract: a messages array, `response_format`
//! for constrained generation, and nothing else.

use crate::traits::{ModelAdapter, StructuredRequest, TextRequest};
use cp_domain::config::ModelConfig;
use cp_domain::schema::{FieldType, OutputSchema};
use cp_domain::{Error, Result};
use serde_json::Value;

pub struct HttpModelAdapter {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpModelAdapter {
    pub fn new(config: &ModelConfig, api_key: Option<String>, timeout: std::time::Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            client,
        })
    }

    fn authed_post(&self, url: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.post(url).header("Content-Type", "application/json");
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }
        builder
    }

    async fn complete(&self, body: Value) -> Result<Value> {
        let url = format!("{}/chat/completions", self.base_url);

        tracing::debug!(url = %url, "model adapter request");

        let resp = self
            .authed_post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Adapter {
                adapter: "http".into(),
                message: format!("HTTP {} - {}", status.as_u16(), text),
            });
        }

        let parsed: Value = serde_json::from_str(&text)?;
        let content = parsed
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|a| a.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| Error::Adapter {
                adapter: "http".into(),
                message: "no message content in response".into(),
            })?;

        Ok(Value::String(content.to_string()))
    }
}

#[async_trait::async_trait]
impl ModelAdapter for HttpModelAdapter {
    async fn generate_text(&self, req: TextRequest) -> Result<String> {
        let mut messages = vec![
            serde_json::json!({"role": "system", "content": req.system_prompt}),
            serde_json::json!({"role": "user", "content": req.user_prompt}),
        ];
        // An assistant-turn prefix pre-fills the response before generation
        // starts (spec.md §4.A); the OpenAI-compatible wire shape for this
        // is a trailing assistant message the backend continues from.
        if let Some(prefix) = &req.assistant_prefix {
            messages.push(serde_json::json!({"role": "assistant", "content": prefix}));
        }

        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": req.temperature,
            "max_tokens": req.max_tokens,
        });

        let content = self.complete(body).await?;
        let text = content.as_str().unwrap_or_default();
        match &req.assistant_prefix {
            Some(prefix) if !text.starts_with(prefix.as_str()) => Ok(format!("{prefix}{text}")),
            _ => Ok(text.to_string()),
        }
    }

    async fn generate_structured(&self, req: StructuredRequest) -> Result<Value> {
        let json_schema = schema_to_json_schema(&req.schema);
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": req.system_prompt},
                {"role": "user", "content": req.user_prompt},
            ],
            "temperature": req.temperature,
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": req.schema.name,
                    "schema": json_schema,
                    "strict": true,
                },
            },
        });

        let content = self.complete(body).await?;
        let text = content.as_str().unwrap_or_default();
        let value: Value = serde_json::from_str(text).map_err(|e| Error::SchemaViolation(format!(
            "model response was not valid JSON: {e}"
        )))?;

        req.schema
            .validate(&value)
            .map_err(Error::SchemaViolation)?;

        Ok(value)
    }
}

/// Translate a declared `OutputSchema` into a JSON Schema object, the shape
/// `response_format: {"type": "json_schema", ...}` expects on the wire.
fn schema_to_json_schema(schema: &OutputSchema) -> Value {
    let mut properties = serde_json::Map::new();
    for (name, field) in &schema.fields {
        let mut prop = serde_json::Map::new();
        let base_type = match field.field_type {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::StringArray => "array",
        };
        if field.nullable {
            prop.insert("type".into(), serde_json::json!([base_type, "null"]));
        } else {
            prop.insert("type".into(), serde_json::json!(base_type));
        }
        if matches!(field.field_type, FieldType::StringArray) {
            prop.insert("items".into(), serde_json::json!({"type": "string"}));
        }
        if let Some(values) = &field.enum_values {
            prop.insert("enum".into(), serde_json::json!(values));
        }
        if let Some(desc) = &field.description {
            prop.insert("description".into(), serde_json::json!(desc));
        }
        properties.insert(name.clone(), Value::Object(prop));
    }

    serde_json::json!({
        "type": "object",
        "properties": Value::Object(properties),
        "required": schema.required,
        "additionalProperties": false,
    })
}
