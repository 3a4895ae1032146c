// src/notify/slack.rs

use crate::notify::{ChatPost, ChatSink, NotifyError};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

const POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

pub struct SlackClient {
    token: String,
    client: Client,
}

#[derive(Serialize)]
struct PostMessagePayload<'a> {
    channel: &'a str,
    text: &'a str,
    username: &'a str,
    icon_emoji: &'a str,
}

// Slack answers 200 even on failure; `ok` says what happened.
#[derive(Deserialize)]
struct SlackResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

impl SlackClient {
    pub fn new(token: String) -> Self {
        Self {
            token,
            client: Client::new(),
        }
    }
}

impl ChatSink for SlackClient {
    fn post_message(&self, post: &ChatPost) -> Result<(), NotifyError> {
        let payload = PostMessagePayload {
            channel: &post.channel,
            text: &post.text,
            username: &post.username,
            icon_emoji: &post.icon_emoji,
        };

        let resp = self
            .client
            .post(POST_MESSAGE_URL)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .map_err(|e| NotifyError::RequestFailed(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().unwrap_or_else(|_| "(no body)".to_string());
            return Err(NotifyError::ApiError(format!("Slack HTTP {status}: {body}")));
        }

        let body: SlackResponse = resp
            .json()
            .map_err(|e| NotifyError::RequestFailed(e.to_string()))?;
        if body.ok {
            Ok(())
        } else {
            Err(NotifyError::ApiError(format!(
                "chat.postMessage failed: {}",
                body.error.unwrap_or_else(|| "unknown error".to_string())
            )))
        }
    }
}
