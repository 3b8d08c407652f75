use std::time::Duration;

use voidcity_api::{CatalogError, CatalogService, ErrorKind};
use voidcity_core::form::{
    EpisodeForm, FormMode, Resolution, SerialForm, SubmitBlocked, SubmitTicket,
};
use voidcity_core::models::{EpisodeFields, SerialFields};
use voidcity_core::session::Session;
use voidcity_core::store::CatalogStore;

use crate::loader::{load_catalog, with_deadline, LoadReport};
use crate::notice::{Notice, Route};

const FETCH_FAILED: &str = "Failed to fetch serials";
const DELETED: &str = "Deleted successfully";
const DELETE_FAILED: &str = "Failed to delete";
const SESSION_EXPIRED: &str = "Session expired. Please log in again.";
const LOGIN_REQUIRED: &str = "Please log in to continue.";

/// How a submit attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Saved remotely and reflected in the store.
    Saved,
    /// Never sent.
    Blocked(SubmitBlocked),
    /// The server refused or could not be reached; the form is editable again.
    Rejected(String),
    /// The form was closed before the response arrived.
    Dropped,
    /// The session was missing or rejected; the user must log in again.
    SignedOut,
}

/// The authenticated admin surface: session, catalog and both modals.
///
/// Every remote call goes through here so a failed call can never leave the
/// store, the forms and the session disagreeing with each other.
pub struct AdminPanel<S> {
    service: S,
    session: Session,
    store: CatalogStore,
    serial_form: SerialForm,
    episode_form: EpisodeForm,
    notices: Vec<Notice>,
    redirect: Option<Route>,
    deadline: Duration,
}

impl<S: CatalogService> AdminPanel<S> {
    pub fn new(service: S, session: Session, deadline: Duration) -> Self {
        Self {
            service,
            session,
            store: CatalogStore::new(),
            serial_form: SerialForm::new(),
            episode_form: EpisodeForm::new(),
            notices: Vec::new(),
            redirect: None,
            deadline,
        }
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn serial_form(&self) -> &SerialForm {
        &self.serial_form
    }

    pub fn serial_form_mut(&mut self) -> &mut SerialForm {
        &mut self.serial_form
    }

    pub fn episode_form(&self) -> &EpisodeForm {
        &self.episode_form
    }

    pub fn episode_form_mut(&mut self) -> &mut EpisodeForm {
        &mut self.episode_form
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn redirect(&self) -> Option<Route> {
        self.redirect
    }

    pub fn take_redirect(&mut self) -> Option<Route> {
        self.redirect.take()
    }

    // -- Loading --

    /// Enter the admin surface: check the session, then load the catalog.
    ///
    /// Returns `None` when the user was sent to login or the listing failed.
    pub async fn mount(&mut self) -> Option<LoadReport> {
        if !self.preflight() {
            return None;
        }
        self.reload().await
    }

    /// Replace the store with a fresh copy of the remote catalog.
    pub async fn reload(&mut self) -> Option<LoadReport> {
        match load_catalog(&self.service, self.deadline).await {
            Ok(loaded) => {
                let report = loaded.report();
                self.store.replace_all(loaded.serials);
                Some(report)
            }
            Err(e) => {
                tracing::error!("Catalog load failed: {e}");
                self.notices.push(Notice::error(FETCH_FAILED));
                if e.kind() == ErrorKind::Auth {
                    self.sign_out(SESSION_EXPIRED);
                }
                None
            }
        }
    }

    pub fn logout(&mut self) {
        self.session.clear();
        self.serial_form.cancel();
        self.episode_form.cancel();
        self.route_to_login();
        tracing::info!("Logged out");
    }

    // -- Opening forms --

    pub fn open_add_serial(&mut self) {
        self.serial_form.open_add(SerialFields::default());
    }

    pub fn open_edit_serial(&mut self, id: &str) -> bool {
        match self.store.serial(id) {
            Some(serial) => {
                self.serial_form.open_edit(serial);
                true
            }
            None => false,
        }
    }

    /// Open the episode modal in add mode, preselecting `serial_id` or else
    /// the first serial in the catalog.
    pub fn open_add_episode(&mut self, serial_id: Option<&str>) {
        let owner = serial_id.or_else(|| self.store.first_serial_id());
        self.episode_form.open_add(EpisodeFields::new_for(owner));
    }

    pub fn open_edit_episode(&mut self, id: &str) -> bool {
        match self.store.episode(id) {
            Some(episode) => {
                self.episode_form.open_edit(episode);
                true
            }
            None => false,
        }
    }

    // -- Submitting --

    pub async fn submit_serial(&mut self) -> SubmitOutcome {
        let ticket = match self.serial_form.begin_submit() {
            Ok(ticket) => ticket,
            Err(blocked) => return self.blocked(blocked),
        };
        if !self.preflight() {
            self.serial_form.cancel();
            return SubmitOutcome::SignedOut;
        }

        let service = &self.service;
        let result = with_deadline(self.deadline, async {
            match (ticket.mode, ticket.target.as_deref()) {
                (FormMode::Edit, Some(id)) => {
                    service
                        .update_serial(id, &ticket.fields, ticket.file.as_ref())
                        .await
                }
                _ => {
                    service
                        .create_serial(&ticket.fields, ticket.file.as_ref())
                        .await
                }
            }
        })
        .await;

        match result {
            Ok(serial) => match self.serial_form.resolve(&ticket, Ok(serial)) {
                Resolution::Confirmed(serial) => {
                    tracing::info!(id = %serial.id, mode = ?ticket.mode, "Serial saved");
                    self.store.upsert_serial(serial);
                    self.notices
                        .push(Notice::success(SerialForm::success_message(ticket.mode)));
                    SubmitOutcome::Saved
                }
                Resolution::Rejected(message) => SubmitOutcome::Rejected(message),
                Resolution::Stale => SubmitOutcome::Dropped,
            },
            Err(e) => self.serial_failed(&ticket, e),
        }
    }

    pub async fn submit_episode(&mut self) -> SubmitOutcome {
        let ticket = match self.episode_form.begin_submit() {
            Ok(ticket) => ticket,
            Err(blocked) => return self.blocked(blocked),
        };
        if !self.preflight() {
            self.episode_form.cancel();
            return SubmitOutcome::SignedOut;
        }

        let service = &self.service;
        let result = with_deadline(self.deadline, async {
            match (ticket.mode, ticket.target.as_deref()) {
                (FormMode::Edit, Some(id)) => {
                    service
                        .update_episode(id, &ticket.fields, ticket.file.as_ref())
                        .await
                }
                _ => {
                    service
                        .create_episode(
                            &ticket.fields.serial_id,
                            &ticket.fields,
                            ticket.file.as_ref(),
                        )
                        .await
                }
            }
        })
        .await;

        match result {
            Ok(mut episode) => {
                ticket.fields.apply_local(&mut episode);
                match self.episode_form.resolve(&ticket, Ok(episode)) {
                    Resolution::Confirmed(episode) => {
                        tracing::info!(id = %episode.id, mode = ?ticket.mode, "Episode saved");
                        self.store.upsert_episode(episode);
                        self.notices
                            .push(Notice::success(EpisodeForm::success_message(ticket.mode)));
                        SubmitOutcome::Saved
                    }
                    Resolution::Rejected(message) => SubmitOutcome::Rejected(message),
                    Resolution::Stale => SubmitOutcome::Dropped,
                }
            }
            Err(e) => self.episode_failed(&ticket, e),
        }
    }

    fn serial_failed(
        &mut self,
        ticket: &SubmitTicket<SerialFields>,
        e: CatalogError,
    ) -> SubmitOutcome {
        tracing::warn!(mode = ?ticket.mode, "Serial save failed: {e}");
        match e.kind() {
            ErrorKind::Auth => {
                self.serial_form.cancel();
                self.sign_out(SESSION_EXPIRED);
                SubmitOutcome::SignedOut
            }
            ErrorKind::NotFound if ticket.mode == FormMode::Edit => {
                let message = e.user_message("Serial no longer exists");
                if let Some(id) = &ticket.target {
                    self.store.remove_serial(id);
                }
                self.serial_form.cancel();
                self.notices.push(Notice::error(message.clone()));
                SubmitOutcome::Rejected(message)
            }
            _ => {
                let message = e.user_message(&SerialForm::failure_message());
                match self.serial_form.resolve::<()>(ticket, Err(message)) {
                    Resolution::Rejected(message) => {
                        self.notices.push(Notice::error(message.clone()));
                        SubmitOutcome::Rejected(message)
                    }
                    _ => SubmitOutcome::Dropped,
                }
            }
        }
    }

    fn episode_failed(
        &mut self,
        ticket: &SubmitTicket<EpisodeFields>,
        e: CatalogError,
    ) -> SubmitOutcome {
        tracing::warn!(mode = ?ticket.mode, "Episode save failed: {e}");
        match e.kind() {
            ErrorKind::Auth => {
                self.episode_form.cancel();
                self.sign_out(SESSION_EXPIRED);
                SubmitOutcome::SignedOut
            }
            ErrorKind::NotFound => {
                let message = e.user_message("Episode or serial no longer exists");
                match (ticket.mode, &ticket.target) {
                    (FormMode::Edit, Some(id)) => {
                        self.store.remove_episode(&ticket.fields.serial_id, id);
                    }
                    _ => {
                        self.store.remove_serial(&ticket.fields.serial_id);
                    }
                }
                self.episode_form.cancel();
                self.notices.push(Notice::error(message.clone()));
                SubmitOutcome::Rejected(message)
            }
            _ => {
                let message = e.user_message(&EpisodeForm::failure_message());
                match self.episode_form.resolve::<()>(ticket, Err(message)) {
                    Resolution::Rejected(message) => {
                        self.notices.push(Notice::error(message.clone()));
                        SubmitOutcome::Rejected(message)
                    }
                    _ => SubmitOutcome::Dropped,
                }
            }
        }
    }

    fn blocked(&mut self, blocked: SubmitBlocked) -> SubmitOutcome {
        if let SubmitBlocked::Invalid(message) = blocked {
            self.notices.push(Notice::error(message));
        }
        SubmitOutcome::Blocked(blocked)
    }

    // -- Deleting --

    /// Delete a serial and its episodes. Returns whether it is gone locally.
    pub async fn delete_serial(&mut self, id: &str) -> bool {
        if !self.preflight() {
            return false;
        }
        let result = with_deadline(self.deadline, self.service.delete_serial(id)).await;
        match result {
            Ok(()) => {
                tracing::info!(id, "Serial deleted");
                self.store.remove_serial(id);
                self.notices.push(Notice::success(DELETED));
                true
            }
            Err(e) => self.delete_failed(e, |store| store.remove_serial(id)),
        }
    }

    pub async fn delete_episode(&mut self, id: &str) -> bool {
        if !self.preflight() {
            return false;
        }
        let Some(serial_id) = self.store.episode(id).map(|e| e.serial_id.clone()) else {
            tracing::warn!(id, "Delete requested for an unknown episode");
            return false;
        };
        let result = with_deadline(self.deadline, self.service.delete_episode(id)).await;
        match result {
            Ok(()) => {
                tracing::info!(id, "Episode deleted");
                self.store.remove_episode(&serial_id, id);
                self.notices.push(Notice::success(DELETED));
                true
            }
            Err(e) => self.delete_failed(e, |store| store.remove_episode(&serial_id, id)),
        }
    }

    fn delete_failed(
        &mut self,
        e: CatalogError,
        reconcile: impl FnOnce(&mut CatalogStore) -> bool,
    ) -> bool {
        tracing::warn!("Delete failed: {e}");
        match e.kind() {
            ErrorKind::Auth => {
                self.sign_out(SESSION_EXPIRED);
                false
            }
            // Already gone remotely.
            ErrorKind::NotFound => {
                reconcile(&mut self.store);
                self.notices.push(Notice::info(DELETED));
                true
            }
            _ => {
                self.notices.push(Notice::error(e.user_message(DELETE_FAILED)));
                false
            }
        }
    }

    // -- Session --

    /// Require a live token before any admin action.
    fn preflight(&mut self) -> bool {
        if self.session.valid_token().is_some() {
            return true;
        }
        if self.redirect.is_none() {
            self.notices.push(Notice::info(LOGIN_REQUIRED));
        }
        self.route_to_login();
        false
    }

    fn sign_out(&mut self, message: &str) {
        self.session.clear();
        self.serial_form.cancel();
        self.episode_form.cancel();
        if self.redirect.is_none() {
            self.notices.push(Notice::error(message));
        }
        self.route_to_login();
    }

    fn route_to_login(&mut self) {
        if self.redirect != Some(Route::Login) {
            tracing::info!("Redirecting to login");
            self.redirect = Some(Route::Login);
        }
    }
}
