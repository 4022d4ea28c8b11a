//! Actor input record: defaults, legacy flags, and actor list shapes.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ActorMcpError;

/// Actor identifiers as accepted on input: a list or a comma-separated string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActorsField {
    List(Vec<String>),
    Csv(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actors: Option<ActorsField>,
    #[serde(default)]
    pub enable_adding_actors: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_actor_auto_loading: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_actor_memory_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_actor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_actor_input: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Input {
    /// The one-shot target, present only when both the id and payload are set.
    pub fn debug_target(&self) -> Option<(&str, &Value)> {
        match (self.debug_actor.as_deref(), self.debug_actor_input.as_ref()) {
            (Some(actor), Some(payload)) => Some((actor, payload)),
            _ => None,
        }
    }
}

/// Applies defaults to the raw platform input.
///
/// # Errors
///
/// Returns [`ActorMcpError::InvalidInput`] when the raw value is not an object
/// or a field has the wrong type.
pub fn process_input(raw: Value) -> Result<Input, ActorMcpError> {
    let mut obj = match raw {
        Value::Null => Map::new(),
        Value::Object(obj) => obj,
        other => {
            return Err(ActorMcpError::InvalidInput(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            )));
        }
    };

    for flag in ["enableAddingActors", "enableActorAutoLoading"] {
        if let Some(value) = obj.get_mut(flag) {
            *value = Value::Bool(is_truthy(value));
        }
    }

    // enableAddingActors wins; the legacy flag only fills a gap.
    if !obj.contains_key("enableAddingActors") {
        let legacy = obj
            .get("enableActorAutoLoading")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        obj.insert("enableAddingActors".into(), Value::Bool(legacy));
    }

    let mut input: Input = serde_json::from_value(Value::Object(obj))
        .map_err(|e| ActorMcpError::InvalidInput(e.to_string()))?;

    input.actors = input.actors.map(|actors| match actors {
        ActorsField::List(list) => ActorsField::List(
            list.into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        ),
        ActorsField::Csv(s) => ActorsField::Csv(s.trim().to_string()),
    });
    input.debug_actor = input
        .debug_actor
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    Ok(input)
}

/// Loose boolean reading of a flag: `false`, `0`, `""`, and `null` are false.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Reads raw input JSON from a file given on the command line.
///
/// # Errors
///
/// Returns [`ActorMcpError::Io`] when the file cannot be read and
/// [`ActorMcpError::InvalidInput`] when it is not JSON.
pub async fn load_input_file(path: &Path) -> Result<Value, ActorMcpError> {
    let bytes = tokio::fs::read(path).await?;
    serde_json::from_slice(&bytes).map_err(|e| {
        ActorMcpError::InvalidInput(format!("{} is not valid JSON: {e}", path.display()))
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Actors to preload in standby mode: strings are split on commas.
pub fn standby_actor_list(actors: Option<&ActorsField>) -> Vec<String> {
    match actors {
        None => Vec::new(),
        Some(ActorsField::List(list)) => list.clone(),
        Some(ActorsField::Csv(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    }
}

/// Actors to preload in full server mode: a string is a single actor id.
pub fn server_actor_list(actors: Option<&ActorsField>) -> Vec<String> {
    match actors {
        None => Vec::new(),
        Some(ActorsField::List(list)) => list.clone(),
        Some(ActorsField::Csv(s)) if s.is_empty() => Vec::new(),
        Some(ActorsField::Csv(s)) => vec![s.clone()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_input_gets_defaults() {
        let input = process_input(Value::Null).unwrap();
        assert!(input.actors.is_none());
        assert!(input.enable_adding_actors);
        assert!(input.debug_target().is_none());
        assert!(input.max_actor_memory_bytes.is_none());
    }

    #[test]
    fn legacy_auto_loading_flag_fills_missing_enable_adding_actors() {
        let input = process_input(json!({"enableActorAutoLoading": false})).unwrap();
        assert!(!input.enable_adding_actors);

        let input = process_input(json!({
            "enableAddingActors": true,
            "enableActorAutoLoading": false
        }))
        .unwrap();
        assert!(input.enable_adding_actors);
    }

    #[test]
    fn flags_are_coerced_to_booleans() {
        let input = process_input(json!({"enableAddingActors": "true"})).unwrap();
        assert!(input.enable_adding_actors);

        let input = process_input(json!({"enableAddingActors": 0})).unwrap();
        assert!(!input.enable_adding_actors);

        let input = process_input(json!({"enableAddingActors": ""})).unwrap();
        assert!(!input.enable_adding_actors);

        let input = process_input(json!({"enableAddingActors": null})).unwrap();
        assert!(!input.enable_adding_actors);

        let input = process_input(json!({"enableActorAutoLoading": "no"})).unwrap();
        assert!(input.enable_adding_actors);
        assert_eq!(input.enable_actor_auto_loading, Some(true));
    }

    #[tokio::test]
    async fn load_input_file_reads_json() {
        let path = std::env::temp_dir().join(format!(
            "actors-mcp-input-file-{}.json",
            std::process::id()
        ));
        tokio::fs::write(&path, br#"{"actors": ["a/b"]}"#).await.unwrap();

        let value = load_input_file(&path).await.unwrap();
        assert_eq!(value, json!({"actors": ["a/b"]}));
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn load_input_file_rejects_invalid_json() {
        let path = std::env::temp_dir().join(format!(
            "actors-mcp-input-bad-{}.json",
            std::process::id()
        ));
        tokio::fs::write(&path, b"{nope").await.unwrap();

        let err = load_input_file(&path).await.unwrap_err();
        assert!(matches!(err, ActorMcpError::InvalidInput(_)));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn actors_keep_their_shape() {
        let input = process_input(json!({"actors": " a,b "})).unwrap();
        assert_eq!(input.actors, Some(ActorsField::Csv("a,b".into())));

        let input = process_input(json!({"actors": ["a", " ", " b"]})).unwrap();
        assert_eq!(
            input.actors,
            Some(ActorsField::List(vec!["a".into(), "b".into()]))
        );
    }

    #[test]
    fn non_object_input_is_rejected() {
        let err = process_input(json!([1, 2])).unwrap_err();
        assert!(matches!(err, ActorMcpError::InvalidInput(_)));
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn wrong_field_type_is_rejected() {
        let err = process_input(json!({"maxActorMemoryBytes": "lots"})).unwrap_err();
        assert!(matches!(err, ActorMcpError::InvalidInput(_)));
    }

    #[test]
    fn debug_target_requires_actor_and_payload() {
        let input = process_input(json!({"debugActor": "X"})).unwrap();
        assert!(input.debug_target().is_none());

        let input = process_input(json!({"debugActor": "  ", "debugActorInput": {}})).unwrap();
        assert!(input.debug_target().is_none());

        let input = process_input(json!({"debugActor": "X", "debugActorInput": {"q": 1}})).unwrap();
        let (actor, payload) = input.debug_target().unwrap();
        assert_eq!(actor, "X");
        assert_eq!(payload, &json!({"q": 1}));
    }

    #[test]
    fn unknown_fields_are_preserved() {
        let input = process_input(json!({"tools": ["docs"]})).unwrap();
        assert_eq!(input.extra.get("tools"), Some(&json!(["docs"])));
    }

    #[test]
    fn standby_list_splits_strings() {
        let csv = ActorsField::Csv("a,b,c".into());
        assert_eq!(standby_actor_list(Some(&csv)), vec!["a", "b", "c"]);

        let spaced = ActorsField::Csv("a, b,,".into());
        assert_eq!(standby_actor_list(Some(&spaced)), vec!["a", "b"]);

        let list = ActorsField::List(vec!["a".into(), "b".into()]);
        assert_eq!(standby_actor_list(Some(&list)), vec!["a", "b"]);

        assert!(standby_actor_list(None).is_empty());
    }

    #[test]
    fn server_list_wraps_strings() {
        let csv = ActorsField::Csv("a,b".into());
        assert_eq!(server_actor_list(Some(&csv)), vec!["a,b"]);

        let list = ActorsField::List(vec!["x".into()]);
        assert_eq!(server_actor_list(Some(&list)), vec!["x"]);

        assert!(server_actor_list(Some(&ActorsField::Csv(String::new()))).is_empty());
        assert!(server_actor_list(None).is_empty());
    }
}
