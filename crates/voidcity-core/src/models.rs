mod episode;
mod serial;
mod upload;

pub use episode::{Episode, EpisodeFields};
pub use serial::{Serial, SerialFields, SerialStatus};
pub use upload::ImageUpload;

use serde::{Deserialize, Deserializer};

/// Treat an explicit `null` the same as a missing string field.
pub(crate) fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}
