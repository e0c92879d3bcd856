//! Telegram summary push.
//!
//! Strictly optional: when the bot environment is not configured the send
//! is skipped with a warning, never treated as a failure of the render
//! cycle that requested it.

use anyhow::{bail, Result};
use serde::Serialize;
use std::env;
use tracing::{info, warn};

const BOT_TOKEN_ENV: &str = "TG_BOT_TOKEN";
const CHAT_ID_ENV: &str = "TG_CHAT_ID";

pub struct TelegramNotifier {
    bot_token: String,
    chat_id: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct SendMessage {
    chat_id: String,
    text: String,
    parse_mode: String,
    disable_web_page_preview: bool,
}

impl TelegramNotifier {
    /// Reads `TG_BOT_TOKEN` / `TG_CHAT_ID`; `None` when either is unset.
    pub fn from_env() -> Option<Self> {
        let bot_token = env::var(BOT_TOKEN_ENV).ok()?;
        let chat_id = env::var(CHAT_ID_ENV).ok()?;
        Some(Self {
            bot_token,
            chat_id,
            client: reqwest::Client::new(),
        })
    }

    pub async fn send_markdown(&self, text: &str) -> Result<()> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);
        let payload = SendMessage {
            chat_id: self.chat_id.clone(),
            text: text.to_string(),
            parse_mode: "Markdown".to_string(),
            disable_web_page_preview: true,
        };

        let response = self.client.post(&url).json(&payload).send().await?;
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Telegram send failed: {}", body);
        }
        info!("Telegram summary sent.");
        Ok(())
    }
}

/// Fire-and-log helper used by the commands: missing env → skip + warn.
pub async fn send_summary(markdown: &str) {
    match TelegramNotifier::from_env() {
        Some(notifier) => {
            if let Err(e) = notifier.send_markdown(markdown).await {
                warn!("{:#}", e);
            }
        }
        None => warn!("Telegram env not set ({} / {}), skip sending.", BOT_TOKEN_ENV, CHAT_ID_ENV),
    }
}
