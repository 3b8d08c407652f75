//! In-memory `CatalogService` with call counters and injectable failures.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use voidcity_api::{CatalogError, CatalogService};
use voidcity_core::models::{
    Episode, EpisodeFields, ImageUpload, Serial, SerialFields, SerialStatus,
};

#[derive(Default)]
pub struct FakeCatalog {
    serials: Mutex<Vec<Serial>>,
    episodes: Mutex<HashMap<String, Vec<Episode>>>,
    failures: Mutex<HashMap<String, u16>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    hang: AtomicBool,
    next_id: AtomicUsize,
}

pub fn serial(id: &str) -> Serial {
    Serial {
        id: id.into(),
        name: format!("Serial {id}"),
        description: String::new(),
        genre: "drama".into(),
        status: SerialStatus::Active,
        blog_url: String::new(),
        image: None,
        episodes: None,
    }
}

pub fn episode(id: &str, serial_id: &str) -> Episode {
    Episode {
        id: id.into(),
        title: format!("Episode {id}"),
        episode_no: Some(1),
        description: String::new(),
        redirect_url: format!("https://watch.example.com/{id}"),
        serial_id: serial_id.into(),
        duration: None,
        date: None,
        created_at: None,
        image: None,
    }
}

impl FakeCatalog {
    pub fn with_serials(ids: &[&str]) -> Self {
        let fake = Self::default();
        *fake.serials.lock().unwrap() = ids.iter().map(|id| serial(id)).collect();
        fake
    }

    pub fn set_episodes(&self, serial_id: &str, ids: &[&str]) {
        let episodes = ids.iter().map(|id| episode(id, serial_id)).collect();
        self.episodes
            .lock()
            .unwrap()
            .insert(serial_id.to_string(), episodes);
    }

    /// Make every call to `op` fail with `status`.
    pub fn fail(&self, op: &str, status: u16) {
        self.failures.lock().unwrap().insert(op.to_string(), status);
    }

    pub fn fail_episodes_for(&self, serial_id: &str, status: u16) {
        self.fail(&format!("list_episodes:{serial_id}"), status);
    }

    /// Make every call after this one never complete.
    pub fn hang(&self) {
        self.hang.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self, op: &str) -> usize {
        self.calls.lock().unwrap().get(op).copied().unwrap_or(0)
    }

    pub fn mutation_calls(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(op, _)| !op.starts_with("list_"))
            .map(|(_, n)| n)
            .sum()
    }

    fn record(&self, op: &'static str, key: Option<&str>) -> Result<(), CatalogError> {
        *self.calls.lock().unwrap().entry(op).or_default() += 1;
        let failures = self.failures.lock().unwrap();
        let status = key
            .and_then(|k| failures.get(&format!("{op}:{k}")))
            .or_else(|| failures.get(op));
        match status {
            Some(&status) => Err(CatalogError::from_status(
                status,
                r#"{"msg":"rejected by fake"}"#,
            )),
            None => Ok(()),
        }
    }

    async fn maybe_hang(&self) {
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

fn with_fields(mut serial: Serial, fields: &SerialFields) -> Serial {
    serial.name = fields.name.clone();
    serial.description = fields.description.clone();
    serial.genre = fields.genre.clone();
    serial.status = fields.status;
    serial.blog_url = fields.blog_url.clone();
    serial
}

fn episode_with_fields(id: String, fields: &EpisodeFields) -> Episode {
    Episode {
        id,
        title: fields.title.clone(),
        episode_no: fields.episode_no.trim().parse().ok(),
        description: fields.description.clone(),
        redirect_url: fields.redirect_url.clone(),
        serial_id: fields.serial_id.clone(),
        duration: None,
        date: None,
        created_at: None,
        image: None,
    }
}

impl CatalogService for FakeCatalog {
    async fn list_serials(&self) -> Result<Vec<Serial>, CatalogError> {
        self.record("list_serials", None)?;
        self.maybe_hang().await;
        Ok(self.serials.lock().unwrap().clone())
    }

    async fn list_episodes(&self, serial_id: &str) -> Result<Vec<Episode>, CatalogError> {
        self.record("list_episodes", Some(serial_id))?;
        self.maybe_hang().await;
        let episodes = self.episodes.lock().unwrap();
        Ok(episodes.get(serial_id).cloned().unwrap_or_default())
    }

    async fn create_serial(
        &self,
        fields: &SerialFields,
        image: Option<&ImageUpload>,
    ) -> Result<Serial, CatalogError> {
        self.record("create_serial", None)?;
        self.maybe_hang().await;
        let mut created = with_fields(serial(&self.next_id("s")), fields);
        created.image = image.map(|i| format!("https://img.example.com/{}", i.file_name));
        self.serials.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update_serial(
        &self,
        id: &str,
        fields: &SerialFields,
        _image: Option<&ImageUpload>,
    ) -> Result<Serial, CatalogError> {
        self.record("update_serial", Some(id))?;
        self.maybe_hang().await;
        Ok(with_fields(serial(id), fields))
    }

    async fn delete_serial(&self, id: &str) -> Result<(), CatalogError> {
        self.record("delete_serial", Some(id))?;
        self.maybe_hang().await;
        self.serials.lock().unwrap().retain(|s| s.id != id);
        Ok(())
    }

    async fn create_episode(
        &self,
        serial_id: &str,
        fields: &EpisodeFields,
        _image: Option<&ImageUpload>,
    ) -> Result<Episode, CatalogError> {
        self.record("create_episode", Some(serial_id))?;
        self.maybe_hang().await;
        let mut created = episode_with_fields(self.next_id("e"), fields);
        created.serial_id = serial_id.to_string();
        Ok(created)
    }

    async fn update_episode(
        &self,
        id: &str,
        fields: &EpisodeFields,
        _image: Option<&ImageUpload>,
    ) -> Result<Episode, CatalogError> {
        self.record("update_episode", Some(id))?;
        self.maybe_hang().await;
        Ok(episode_with_fields(id.to_string(), fields))
    }

    async fn delete_episode(&self, id: &str) -> Result<(), CatalogError> {
        self.record("delete_episode", Some(id))?;
        self.maybe_hang().await;
        Ok(())
    }
}
