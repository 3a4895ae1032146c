// src/notify/trello.rs

use crate::notify::{BoardSink, NotifyError};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;

const API_URL: &str = "https://api.trello.com/1";

/// Creates cards on the leftmost list of one board.
pub struct TrelloClient {
    key: String,
    token: String,
    board: String,
    client: Client,
    list_id: OnceCell<String>,
}

#[derive(Deserialize)]
struct TrelloList {
    id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewCard<'a> {
    id_list: &'a str,
    name: &'a str,
    desc: &'a str,
}

impl TrelloClient {
    pub fn new(key: String, token: String, board: String) -> Self {
        Self {
            key,
            token,
            board,
            client: Client::new(),
            list_id: OnceCell::new(),
        }
    }

    fn auth(&self) -> [(&str, &str); 2] {
        [("key", self.key.as_str()), ("token", self.token.as_str())]
    }

    fn first_list(&self) -> Result<String, NotifyError> {
        if let Some(id) = self.list_id.get() {
            return Ok(id.clone());
        }

        let resp = self
            .client
            .get(format!("{API_URL}/boards/{}/lists", self.board))
            .query(&self.auth())
            .send()
            .map_err(|e| NotifyError::RequestFailed(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().unwrap_or_else(|_| "(no body)".to_string());
            return Err(NotifyError::ApiError(format!("Trello HTTP {status}: {body}")));
        }

        let lists: Vec<TrelloList> = resp
            .json()
            .map_err(|e| NotifyError::RequestFailed(e.to_string()))?;
        let first = lists
            .into_iter()
            .next()
            .ok_or_else(|| NotifyError::ApiError(format!("board {} has no lists", self.board)))?;

        let _ = self.list_id.set(first.id.clone());
        Ok(first.id)
    }
}

impl BoardSink for TrelloClient {
    fn create_card(&self, title: &str, description: &str) -> Result<(), NotifyError> {
        let list_id = self.first_list()?;
        let card = NewCard {
            id_list: &list_id,
            name: title,
            desc: description,
        };

        let resp = self
            .client
            .post(format!("{API_URL}/cards"))
            .query(&self.auth())
            .json(&card)
            .send()
            .map_err(|e| NotifyError::RequestFailed(e.to_string()))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            let status = resp.status();
            let body = resp.text().unwrap_or_else(|_| "(no body)".to_string());
            Err(NotifyError::ApiError(format!("Trello HTTP {status}: {body}")))
        }
    }
}
