// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! Telegram Bot API `sendMessage` client.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{Notifier, NotifyError};

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends messages through a Telegram bot.
#[derive(Clone)]
pub struct TelegramNotifier {
    send_url: String,
    client: reqwest::Client,
}

impl TelegramNotifier {
    pub fn new(bot_token: &str) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| NotifyError::Http(e.to_string()))?;
        Ok(Self {
            send_url: send_message_url(TELEGRAM_API_BASE, bot_token),
            client,
        })
    }
}

fn send_message_url(base: &str, bot_token: &str) -> String {
    format!("{}/bot{bot_token}/sendMessage", base.trim_end_matches('/'))
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, chat_id: i64, text: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.send_url)
            .json(&SendMessage {
                chat_id,
                text,
                parse_mode: "HTML",
                disable_web_page_preview: true,
            })
            .send()
            .await
            .map_err(|e| NotifyError::Http(e.without_url().to_string()))?;

        let status = response.status();
        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| NotifyError::Http(e.without_url().to_string()))?;

        if !status.is_success() || !body.ok {
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                description: body.description.unwrap_or_default(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_send_message_url() {
        assert_eq!(
            send_message_url("https://api.telegram.org/", "123:abc"),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn request_body_shape() {
        let body = serde_json::to_value(SendMessage {
            chat_id: 42,
            text: "<b>hi</b>",
            parse_mode: "HTML",
            disable_web_page_preview: true,
        })
        .unwrap();
        assert_eq!(body["chat_id"], 42);
        assert_eq!(body["parse_mode"], "HTML");
    }

    #[test]
    fn parses_error_response() {
        let body: ApiResponse =
            serde_json::from_str(r#"{"ok":false,"error_code":403,"description":"Forbidden"}"#)
                .unwrap();
        assert!(!body.ok);
        assert_eq!(body.description.as_deref(), Some("Forbidden"));
    }
}
