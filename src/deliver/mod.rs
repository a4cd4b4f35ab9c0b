//! Message delivery
//!
//! The [`Delivery`] trait is the single seam between rendered messages and
//! the outside world. The Telegram implementation posts to a forum topic
//! with Markdown parse mode and link previews disabled.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// A sink for rendered messages
#[async_trait]
pub trait Delivery: Send + Sync {
    /// Deliver `text` to the given topic thread; 0 means the main channel
    async fn deliver(&self, text: &str, topic_id: i64) -> anyhow::Result<()>;
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_thread_id: Option<i64>,
    text: &'a str,
    parse_mode: &'a str,
    disable_web_page_preview: bool,
}

#[derive(Debug, serde::Deserialize)]
struct SendMessageResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram Bot API delivery
pub struct TelegramDelivery {
    client: reqwest::Client,
    bot_token: String,
    chat_id: String,
}

impl TelegramDelivery {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        })
    }
}

#[async_trait]
impl Delivery for TelegramDelivery {
    async fn deliver(&self, text: &str, topic_id: i64) -> anyhow::Result<()> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);
        let request = SendMessageRequest {
            chat_id: &self.chat_id,
            message_thread_id: (topic_id != 0).then_some(topic_id),
            text,
            parse_mode: "Markdown",
            disable_web_page_preview: true,
        };

        let response = self.client.post(&url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("telegram sendMessage failed: {} {}", status, body);
        }

        let body: SendMessageResponse = response.json().await?;
        if !body.ok {
            anyhow::bail!(
                "telegram rejected message: {}",
                body.description.unwrap_or_else(|| "no description".to_string())
            );
        }

        tracing::debug!(topic_id, chars = text.chars().count(), "message delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = SendMessageRequest {
            chat_id: "-1001234",
            message_thread_id: Some(13),
            text: "hello",
            parse_mode: "Markdown",
            disable_web_page_preview: true,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["chat_id"], "-1001234");
        assert_eq!(json["message_thread_id"], 13);
        assert_eq!(json["parse_mode"], "Markdown");
        assert_eq!(json["disable_web_page_preview"], true);
    }

    #[test]
    fn test_main_channel_omits_thread_id() {
        let request = SendMessageRequest {
            chat_id: "-1001234",
            message_thread_id: None,
            text: "hello",
            parse_mode: "Markdown",
            disable_web_page_preview: true,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("message_thread_id").is_none());
    }
}
