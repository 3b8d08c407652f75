use serde::{Deserialize, Serialize};

use super::{null_as_empty, Episode};

/// Publication status of a serial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerialStatus {
    #[default]
    Active,
    Inactive,
    Completed,
}

impl SerialStatus {
    pub const ALL: &[SerialStatus] = &[Self::Active, Self::Inactive, Self::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
            Self::Completed => "Completed",
        }
    }

    /// Wire representation (lowercase).
    pub fn as_api_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Completed => "completed",
        }
    }

    pub fn from_api_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for SerialStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A top-level catalog entry owning an ordered list of episodes.
///
/// `episodes` is `None` when the remote payload did not carry them (listing
/// and create/update responses); the catalog store always fills it in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Serial {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub genre: String,
    #[serde(default)]
    pub status: SerialStatus,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub blog_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episodes: Option<Vec<Episode>>,
}

impl Serial {
    pub fn episodes(&self) -> &[Episode] {
        self.episodes.as_deref().unwrap_or_default()
    }

    pub fn episode_count(&self) -> usize {
        self.episodes().len()
    }
}

/// Editable serial attributes, as sent in a create/update request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SerialFields {
    pub name: String,
    pub description: String,
    pub genre: String,
    pub status: SerialStatus,
    pub blog_url: String,
}

impl SerialFields {
    pub fn from_serial(serial: &Serial) -> Self {
        Self {
            name: serial.name.clone(),
            description: serial.description.clone(),
            genre: serial.genre.clone(),
            status: serial.status,
            blog_url: serial.blog_url.clone(),
        }
    }

    /// Text parts of the multipart body, in wire field names.
    pub fn form_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("name", self.name.clone()),
            ("description", self.description.clone()),
            ("genre", self.genre.clone()),
            ("status", self.status.as_api_str().to_string()),
            ("blogUrl", self.blog_url.clone()),
        ]
    }
}
