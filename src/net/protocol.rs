//! Wire envelope: one JSON object per frame.
//!
//! Requests look like `{"id":1,"action":"login","user":{"email":..,"password":..}}`,
//! responses like `{"msgId":1,"action":"login","items":[..],"error":".."}`.

use crate::models::item::Item;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `msgId` used for frames the server pushes on its own (broadcasts, login snapshot).
pub const PUSH_MSG_ID: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Action {
    Register,
    Login,
    Get,
    Insert,
    Update,
    Delete,
    /// Anything else, including a missing action
    #[default]
    Unknown,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Register => "register",
            Action::Login => "login",
            Action::Get => "get",
            Action::Insert => "insert",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Unknown => "",
        }
    }

    pub fn is_mutation(&self) -> bool {
        matches!(self, Action::Insert | Action::Update | Action::Delete)
    }
}

impl From<String> for Action {
    fn from(s: String) -> Self {
        match s.as_str() {
            "register" => Action::Register,
            "login" => Action::Login,
            "get" => Action::Get,
            "insert" => Action::Insert,
            "update" => Action::Update,
            "delete" => Action::Delete,
            _ => Action::Unknown,
        }
    }
}

impl From<Action> for String {
    fn from(a: Action) -> Self {
        a.as_str().to_string()
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub action: Action,
    #[serde(default)]
    pub user: Option<Credentials>,
    #[serde(default)]
    pub item: Option<Item>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    #[serde(rename = "msgId")]
    pub msg_id: i64,
    pub action: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<Item>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    /// Plain acknowledgement of a request.
    pub fn ok(req: &Request) -> Self {
        Self {
            msg_id: req.id,
            action: req.action,
            items: None,
            error: None,
        }
    }

    /// Direct reply carrying items.
    pub fn items(req: &Request, items: Vec<Item>) -> Self {
        Self {
            items: Some(items),
            ..Self::ok(req)
        }
    }

    pub fn error(msg_id: i64, action: Action, error: impl Into<String>) -> Self {
        Self {
            msg_id,
            action,
            items: None,
            error: Some(error.into()),
        }
    }

    /// Server-initiated frame, not tied to any request.
    pub fn push(action: Action, items: Vec<Item>) -> Self {
        Self {
            msg_id: PUSH_MSG_ID,
            action,
            items: Some(items),
            error: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.as_deref().is_some_and(|e| !e.is_empty())
    }
}

#[derive(Debug, Error)]
#[error("cannot decode frame: {source}")]
pub struct DecodeError {
    /// Request id, when the frame was at least an object with a numeric `id`
    pub msg_id: Option<i64>,
    #[source]
    source: serde_json::Error,
}

pub fn decode(raw: &str) -> Result<Request, DecodeError> {
    serde_json::from_str::<Request>(raw).map_err(|source| DecodeError {
        msg_id: salvage_id(raw),
        source,
    })
}

pub fn encode(resp: &Response) -> String {
    // Response holds only strings and integers, serialization cannot fail
    serde_json::to_string(resp).unwrap_or_else(|e| {
        tracing::error!(error = %e, "response serialization failed");
        String::from(r#"{"msgId":-1,"action":"","error":"internal server error"}"#)
    })
}

fn salvage_id(raw: &str) -> Option<i64> {
    serde_json::from_str::<serde_json::Value>(raw)
        .ok()?
        .get("id")?
        .as_i64()
}
