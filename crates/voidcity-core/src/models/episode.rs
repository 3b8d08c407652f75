use chrono::Local;
use serde::{Deserialize, Deserializer, Serialize};

use super::null_as_empty;

/// A single episode belonging to exactly one serial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(
        default,
        deserialize_with = "de_episode_no",
        skip_serializing_if = "Option::is_none"
    )]
    pub episode_no: Option<u32>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub redirect_url: String,
    /// Owning serial. Lookup only; the store keeps it equal to the owner's id.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub serial_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// The API stores `episodeNo` from a form field, so it comes back as either a
/// number or a numeric string. Anything else is dropped rather than failing
/// the whole episode list.
fn de_episode_no<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| parse_episode_no(&value)))
}

fn parse_episode_no(value: &serde_json::Value) -> Option<u32> {
    use serde_json::Value;

    let parsed = match value {
        Value::Null => return None,
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) if s.trim().is_empty() => return None,
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    if parsed.is_none() {
        tracing::warn!(%value, "Ignoring unreadable episodeNo");
    }
    parsed
}

/// Editable episode attributes.
///
/// `duration` and `date` never leave the client; they are merged into the
/// confirmed episode after a successful save.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EpisodeFields {
    pub title: String,
    pub episode_no: String,
    pub description: String,
    pub redirect_url: String,
    pub serial_id: String,
    pub duration: String,
    pub date: String,
}

impl EpisodeFields {
    /// Defaults for a new episode: first selectable serial, today's date.
    pub fn new_for(serial_id: Option<&str>) -> Self {
        Self {
            serial_id: serial_id.unwrap_or_default().to_string(),
            date: today(),
            ..Default::default()
        }
    }

    pub fn from_episode(episode: &Episode) -> Self {
        Self {
            title: episode.title.clone(),
            episode_no: episode
                .episode_no
                .map(|n| n.to_string())
                .unwrap_or_default(),
            description: episode.description.clone(),
            redirect_url: episode.redirect_url.clone(),
            serial_id: episode.serial_id.clone(),
            duration: episode.duration.clone().unwrap_or_default(),
            date: episode.date.clone().unwrap_or_else(today),
        }
    }

    /// Text parts of the multipart body, in wire field names.
    pub fn form_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("title", self.title.clone()),
            ("episodeNo", self.episode_no.trim().to_string()),
            ("description", self.description.clone()),
            ("redirectUrl", self.redirect_url.clone()),
            ("serialId", self.serial_id.clone()),
        ]
    }

    /// Fill in the client-side fields on an episode confirmed by the server.
    pub fn apply_local(&self, episode: &mut Episode) {
        episode.duration = non_empty(&self.duration);
        episode.date = non_empty(&self.date);
        if episode.serial_id.is_empty() {
            episode.serial_id = self.serial_id.clone();
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// Today's local date as `dd/mm/yyyy`.
fn today() -> String {
    Local::now().format("%d/%m/%Y").to_string()
}
