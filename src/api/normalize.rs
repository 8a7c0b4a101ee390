//! Canonical reply extraction
//!
//! The service has shipped several response shapes over time, so the text of
//! the answer is looked up through a chain of field names and anything that
//! is not declared as JSON is taken verbatim.

use serde_json::{Map, Value};

use super::client::RawResponse;
use crate::chat::{Difficulty, Message};
use crate::utils::error::ChatResult;

/// Field names tried, in order, for the answer text
const OUTPUT_FIELDS: &[&str] = &["output", "answer", "reply", "response", "message"];

/// Field names tried, in order, for the model identifier
const MODEL_FIELDS: &[&str] = &["modelo", "model"];

/// Canonical reply record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reply {
    pub output: String,
    pub modelo: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub category: Option<String>,
}

impl Reply {
    pub fn into_message(self) -> Message {
        let mut message = Message::assistant(self.output);
        if let Some(modelo) = self.modelo {
            message = message.with_modelo(modelo);
        }
        if let Some(difficulty) = self.difficulty {
            message = message.with_difficulty(difficulty);
        }
        if let Some(category) = self.category {
            message = message.with_category(category);
        }
        message
    }
}

/// Map a successful raw response to a [`Reply`].
///
/// Pure: no IO, no logging. Errors only when the body claims to be JSON and
/// does not parse. The status code is not inspected here.
pub fn normalize(response: &RawResponse) -> ChatResult<Reply> {
    if !response.is_json() {
        return Ok(Reply {
            output: response.body.clone(),
            ..Reply::default()
        });
    }

    let json: Value = serde_json::from_str(&response.body)?;
    let Some(fields) = json.as_object() else {
        return Ok(Reply::default());
    };

    Ok(Reply {
        output: first_present(fields, OUTPUT_FIELDS)
            .map(render_text)
            .unwrap_or_default(),
        modelo: first_present(fields, MODEL_FIELDS)
            .map(render_text)
            .filter(|s| !s.is_empty()),
        difficulty: fields.get("difficulty").and_then(difficulty_from),
        category: fields
            .get("category")
            .filter(|v| !v.is_null())
            .map(render_text)
            .filter(|s| !s.is_empty()),
    })
}

/// First field in `names` that exists and is not `null`
fn first_present<'a>(fields: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| fields.get(*name))
        .find(|value| !value.is_null())
}

fn render_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn difficulty_from(value: &Value) -> Option<Difficulty> {
    match value {
        Value::String(label) if !label.is_empty() => Some(Difficulty::Label(label.clone())),
        Value::Number(score) => score.as_f64().map(Difficulty::Score),
        _ => None,
    }
}
