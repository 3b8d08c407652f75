//! Add/edit form workflow for serials and episodes.
//!
//! A [`FormController`] is one modal's worth of transient state. It moves
//! between [`FormState::Closed`], [`FormState::Editing`] and
//! [`FormState::Submitting`]. The network call itself happens outside: the
//! caller takes a [`SubmitTicket`] from [`FormController::begin_submit`],
//! performs the request, and hands the outcome back to
//! [`FormController::resolve`]. A ticket issued before the modal was cancelled
//! or reopened resolves as [`Resolution::Stale`] and its result is dropped.

use crate::models::{Episode, EpisodeFields, ImageUpload, Serial, SerialFields, SerialStatus};

/// Whether the form creates a new entity or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Add,
    Edit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormState {
    #[default]
    Closed,
    Editing,
    Submitting,
}

/// Field set edited by a form, tied to the entity it produces.
pub trait FormFields: Clone + Default {
    type Entity;

    /// Capitalized entity name for user-facing messages.
    const NOUN: &'static str;

    fn from_entity(entity: &Self::Entity) -> Self;
    fn entity_id(entity: &Self::Entity) -> &str;
    fn entity_image(entity: &Self::Entity) -> Option<&str>;

    /// Apply one field edit. Returns `false` if the edit was not applied.
    fn set(&mut self, name: &str, value: &str, mode: FormMode) -> bool;

    /// Local required-field check, run before any network call.
    fn validate(&self) -> Result<(), &'static str>;
}

impl FormFields for SerialFields {
    type Entity = Serial;
    const NOUN: &'static str = "Serial";

    fn from_entity(entity: &Serial) -> Self {
        SerialFields::from_serial(entity)
    }

    fn entity_id(entity: &Serial) -> &str {
        &entity.id
    }

    fn entity_image(entity: &Serial) -> Option<&str> {
        entity.image.as_deref()
    }

    fn set(&mut self, name: &str, value: &str, _mode: FormMode) -> bool {
        match name {
            "name" => self.name = value.to_string(),
            "description" => self.description = value.to_string(),
            "genre" => self.genre = value.to_string(),
            "blogUrl" => self.blog_url = value.to_string(),
            "status" => match SerialStatus::from_api_str(value) {
                Some(status) => self.status = status,
                None => {
                    tracing::debug!(value, "Ignoring unknown serial status");
                    return false;
                }
            },
            _ => return false,
        }
        true
    }

    fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("Serial name is required");
        }
        Ok(())
    }
}

impl FormFields for EpisodeFields {
    type Entity = Episode;
    const NOUN: &'static str = "Episode";

    fn from_entity(entity: &Episode) -> Self {
        EpisodeFields::from_episode(entity)
    }

    fn entity_id(entity: &Episode) -> &str {
        &entity.id
    }

    fn entity_image(entity: &Episode) -> Option<&str> {
        entity.image.as_deref()
    }

    fn set(&mut self, name: &str, value: &str, mode: FormMode) -> bool {
        match name {
            "title" => self.title = value.to_string(),
            "episodeNo" => self.episode_no = value.to_string(),
            "description" => self.description = value.to_string(),
            "redirectUrl" => self.redirect_url = value.to_string(),
            "duration" => self.duration = value.to_string(),
            "date" => self.date = value.to_string(),
            // An existing episode stays with the serial that owns it.
            "serialId" if mode == FormMode::Edit => return false,
            "serialId" => self.serial_id = value.to_string(),
            _ => return false,
        }
        true
    }

    fn validate(&self) -> Result<(), &'static str> {
        if self.title.trim().is_empty() || self.serial_id.trim().is_empty() {
            return Err("Episode title and serial are required");
        }
        let episode_no = self.episode_no.trim();
        if !episode_no.is_empty() && episode_no.parse::<u32>().is_err() {
            return Err("Episode number must be a number");
        }
        Ok(())
    }
}

/// Everything a remote save needs, captured when a submit starts.
#[derive(Debug, Clone)]
pub struct SubmitTicket<F> {
    generation: u64,
    pub mode: FormMode,
    /// Id of the entity being edited; `None` in add mode.
    pub target: Option<String>,
    pub fields: F,
    pub file: Option<ImageUpload>,
}

/// What happened when a submit outcome was handed back.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<E> {
    /// Remote save confirmed; the form is closed.
    Confirmed(E),
    /// Remote save failed; the form is editable again with this message.
    Rejected(String),
    /// The modal was closed or reopened since the ticket was issued.
    Stale,
}

/// Why `begin_submit` did not start a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitBlocked {
    NotEditing,
    AlreadySubmitting,
    Invalid(&'static str),
}

/// Where a preview image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview<'a> {
    /// A file picked in this form session.
    Selected(&'a str),
    /// The image already stored on the entity.
    Stored(&'a str),
}

/// Transient state of one add/edit modal.
#[derive(Debug, Clone, Default)]
pub struct FormController<F: FormFields> {
    state: FormState,
    mode: Option<FormMode>,
    target: Option<String>,
    fields: F,
    image: Option<String>,
    selected_file: Option<ImageUpload>,
    error: Option<String>,
    generation: u64,
}

impl<F: FormFields> FormController<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open in add mode with the given defaults.
    pub fn open_add(&mut self, defaults: F) {
        self.reset();
        self.state = FormState::Editing;
        self.mode = Some(FormMode::Add);
        self.fields = defaults;
    }

    /// Open in edit mode, seeded from an existing entity.
    pub fn open_edit(&mut self, entity: &F::Entity) {
        self.reset();
        self.state = FormState::Editing;
        self.mode = Some(FormMode::Edit);
        self.target = Some(F::entity_id(entity).to_string());
        self.fields = F::from_entity(entity);
        self.image = F::entity_image(entity).map(str::to_string);
    }

    /// Edit one field. Clears any previously shown submission error.
    pub fn update_field(&mut self, name: &str, value: &str) -> bool {
        let (FormState::Editing, Some(mode)) = (self.state, self.mode) else {
            return false;
        };
        self.error = None;
        let applied = self.fields.set(name, value, mode);
        if !applied {
            tracing::debug!(form = F::NOUN, field = name, "Field edit not applied");
        }
        applied
    }

    pub fn select_file(&mut self, file: ImageUpload) {
        if self.state == FormState::Editing {
            self.error = None;
            self.selected_file = Some(file);
        }
    }

    pub fn clear_file(&mut self) {
        if self.state == FormState::Editing {
            self.selected_file = None;
        }
    }

    /// Move to `Submitting` and hand out what the remote call needs.
    pub fn begin_submit(&mut self) -> Result<SubmitTicket<F>, SubmitBlocked> {
        match self.state {
            FormState::Closed => return Err(SubmitBlocked::NotEditing),
            FormState::Submitting => return Err(SubmitBlocked::AlreadySubmitting),
            FormState::Editing => {}
        }
        let mode = self.mode.ok_or(SubmitBlocked::NotEditing)?;
        if let Err(msg) = self.fields.validate() {
            self.error = Some(msg.to_string());
            return Err(SubmitBlocked::Invalid(msg));
        }

        self.state = FormState::Submitting;
        self.error = None;
        Ok(SubmitTicket {
            generation: self.generation,
            mode,
            target: self.target.clone(),
            fields: self.fields.clone(),
            file: self.selected_file.clone(),
        })
    }

    /// Apply the outcome of the remote call started by `ticket`.
    pub fn resolve<E>(
        &mut self,
        ticket: &SubmitTicket<F>,
        outcome: Result<E, String>,
    ) -> Resolution<E> {
        if ticket.generation != self.generation || self.state != FormState::Submitting {
            tracing::debug!(form = F::NOUN, "Dropping response for a closed form");
            return Resolution::Stale;
        }
        match outcome {
            Ok(entity) => {
                self.close();
                Resolution::Confirmed(entity)
            }
            Err(message) => {
                self.state = FormState::Editing;
                self.error = Some(message.clone());
                Resolution::Rejected(message)
            }
        }
    }

    /// Close without saving. Any in-flight response will be dropped.
    pub fn cancel(&mut self) {
        if self.state != FormState::Closed {
            tracing::debug!(form = F::NOUN, "Form cancelled");
        }
        self.close();
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn mode(&self) -> Option<FormMode> {
        self.mode
    }

    pub fn is_open(&self) -> bool {
        self.state != FormState::Closed
    }

    pub fn is_submitting(&self) -> bool {
        self.state == FormState::Submitting
    }

    pub fn fields(&self) -> &F {
        &self.fields
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn selected_file(&self) -> Option<&ImageUpload> {
        self.selected_file.as_ref()
    }

    pub fn preview(&self) -> Option<Preview<'_>> {
        if let Some(file) = &self.selected_file {
            return Some(Preview::Selected(&file.file_name));
        }
        self.image
            .as_deref()
            .filter(|url| !url.is_empty())
            .map(Preview::Stored)
    }

    pub fn success_message(mode: FormMode) -> String {
        match mode {
            FormMode::Add => format!("{} added successfully", F::NOUN),
            FormMode::Edit => format!("{} updated successfully", F::NOUN),
        }
    }

    pub fn failure_message() -> String {
        format!("Failed to save {}", F::NOUN.to_lowercase())
    }

    fn close(&mut self) {
        self.reset();
        self.state = FormState::Closed;
    }

    fn reset(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.mode = None;
        self.target = None;
        self.fields = F::default();
        self.image = None;
        self.selected_file = None;
        self.error = None;
    }
}

pub type SerialForm = FormController<SerialFields>;
pub type EpisodeForm = FormController<EpisodeFields>;
