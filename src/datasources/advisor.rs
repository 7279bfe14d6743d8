//! Chat-completions client for the remote agronomy advisor.
//!
//! Speaks the OpenAI-compatible `POST {base_url}/chat/completions` shape, so
//! any compatible gateway can be configured.

use crate::config::AdvisorConfig;
use crate::error::{CropOpsError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SYSTEM_PROMPT: &str = "You are an agronomist advising a grower. Answer in at most \
     five short sentences, with concrete field actions for today.";

pub struct RemoteAdvisor {
    client: reqwest::Client,
    config: AdvisorConfig,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl RemoteAdvisor {
    pub fn new(config: AdvisorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    /// Send the prompt and return the advisor's reply text
    pub async fn consult(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.3,
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| CropOpsError::AdvisorUnavailable(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CropOpsError::AdvisorUnavailable(format!(
                "advisor returned {}: {}",
                status, body
            )));
        }

        let reply: ChatResponse = response.json().await.map_err(|e| {
            CropOpsError::AdvisorUnavailable(format!("Failed to parse advisor response: {}", e))
        })?;

        extract_reply(reply)
    }

    /// Probe `GET {base_url}/models`, which spends no completion tokens
    pub async fn test_connection(&self) -> Result<bool> {
        let url = format!("{}/models", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(|e| CropOpsError::AdvisorUnavailable(format!("request failed: {}", e)))?;

        Ok(response.status().is_success())
    }
}

fn extract_reply(reply: ChatResponse) -> Result<String> {
    reply
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| CropOpsError::AdvisorUnavailable("advisor returned an empty reply".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> AdvisorConfig {
        AdvisorConfig {
            api_key: "sk-test".into(),
            base_url: base_url.into(),
            model: "gpt-4o-mini".into(),
            timeout_secs: 1,
            enabled: true,
        }
    }

    #[test]
    fn url_joins_without_double_slash() {
        let advisor = RemoteAdvisor::new(config("https://llm.example.com/v1/")).unwrap();
        assert_eq!(
            advisor.completions_url(),
            "https://llm.example.com/v1/chat/completions"
        );
    }

    #[test]
    fn request_serializes_chat_shape() {
        let request = ChatRequest {
            model: "m",
            messages: vec![ChatMessage {
                role: "user",
                content: "hello",
            }],
            temperature: 0.3,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["model"], "m");
    }

    #[test]
    fn reply_text_is_trimmed() {
        let reply: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"  Irrigate at dawn.\n"}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_reply(reply).unwrap(), "Irrigate at dawn.");
    }

    #[test]
    fn empty_reply_is_an_error() {
        let reply: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(
            extract_reply(reply),
            Err(CropOpsError::AdvisorUnavailable(_))
        ));

        let blank: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"   "}}]}"#).unwrap();
        assert!(extract_reply(blank).is_err());
    }

    #[tokio::test]
    async fn unreachable_host_is_advisor_unavailable() {
        let advisor = RemoteAdvisor::new(config("http://127.0.0.1:9")).unwrap();
        let result = advisor.consult("test").await;
        assert!(matches!(result, Err(CropOpsError::AdvisorUnavailable(_))));
    }
}
