//! The remote catalog operations the admin workflow depends on.
//!
//! [`crate::CatalogClient`] is the HTTP implementation; tests substitute
//! in-memory fakes.

use std::future::Future;

use voidcity_core::models::{Episode, EpisodeFields, ImageUpload, Serial, SerialFields};

use crate::error::CatalogError;

/// Authenticated CRUD over serials and their episodes.
pub trait CatalogService: Send + Sync {
    /// List all serials (without episodes), in server order.
    fn list_serials(&self) -> impl Future<Output = Result<Vec<Serial>, CatalogError>> + Send;

    /// List the episodes of one serial.
    fn list_episodes(
        &self,
        serial_id: &str,
    ) -> impl Future<Output = Result<Vec<Episode>, CatalogError>> + Send;

    /// Create a serial; returns the server's copy with its assigned id.
    fn create_serial(
        &self,
        fields: &SerialFields,
        image: Option<&ImageUpload>,
    ) -> impl Future<Output = Result<Serial, CatalogError>> + Send;

    fn update_serial(
        &self,
        id: &str,
        fields: &SerialFields,
        image: Option<&ImageUpload>,
    ) -> impl Future<Output = Result<Serial, CatalogError>> + Send;

    /// Delete a serial and, remotely, all of its episodes.
    fn delete_serial(&self, id: &str) -> impl Future<Output = Result<(), CatalogError>> + Send;

    fn create_episode(
        &self,
        serial_id: &str,
        fields: &EpisodeFields,
        image: Option<&ImageUpload>,
    ) -> impl Future<Output = Result<Episode, CatalogError>> + Send;

    fn update_episode(
        &self,
        id: &str,
        fields: &EpisodeFields,
        image: Option<&ImageUpload>,
    ) -> impl Future<Output = Result<Episode, CatalogError>> + Send;

    fn delete_episode(&self, id: &str) -> impl Future<Output = Result<(), CatalogError>> + Send;
}
