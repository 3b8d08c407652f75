use std::path::Path;
use std::process::ExitCode;

use voidcity_api::CatalogClient;
use voidcity_core::config::AppConfig;
use voidcity_core::form::{FormController, FormFields};
use voidcity_core::models::ImageUpload;
use voidcity_runtime::view::{episode_rows, filter_serials, SerialFilter};
use voidcity_runtime::{admin_panel, open_session, AdminPanel, Route, SubmitOutcome};

use super::{confirm, print_episode_rows, print_notices, print_serials};
use crate::error::CliError;
use crate::{EpisodeAction, EpisodeArgs, SerialAction, SerialArgs};

type Panel = AdminPanel<CatalogClient>;

/// Build the panel and load the catalog. `None` means the user was told why
/// and should not continue.
async fn connect(config: &AppConfig) -> Result<Option<Panel>, CliError> {
    let mut panel = admin_panel(config, open_session(config))?;
    match panel.mount().await {
        Some(report) => {
            tracing::debug!(
                serials = report.serials,
                episodes = report.episodes,
                "Admin catalog ready"
            );
            if !report.degraded.is_empty() {
                eprintln!(
                    "warning: episodes could not be loaded for {}",
                    report.degraded.join(", ")
                );
            }
            Ok(Some(panel))
        }
        None => {
            finish(&mut panel);
            Ok(None)
        }
    }
}

/// Flush notices and surface a pending login redirect.
fn finish(panel: &mut Panel) {
    print_notices(panel.take_notices());
    if panel.take_redirect() == Some(Route::Login) {
        eprintln!("Run `voidcity login` to sign in.");
    }
}

fn exit_for(outcome: &SubmitOutcome) -> ExitCode {
    match outcome {
        SubmitOutcome::Saved => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}

/// Feed command-line values through the form, as if typed into it.
fn fill<F: FormFields>(
    form: &mut FormController<F>,
    edits: &[(&str, &str)],
    image: Option<&Path>,
) -> Result<(), CliError> {
    for &(field, value) in edits {
        if !form.update_field(field, value) {
            return Err(CliError::Usage(rejected_field(field, value)));
        }
    }
    if let Some(path) = image {
        form.select_file(ImageUpload::from_path(path)?);
    }
    Ok(())
}

fn rejected_field(field: &str, value: &str) -> String {
    match field {
        "status" => format!("Unknown status '{value}' (expected active, inactive or completed)"),
        "serialId" => "An existing episode cannot be moved to another serial".into(),
        _ => format!("Cannot set {field}"),
    }
}

/// The serial an edit asks to move an episode to, if it differs from the owner.
fn owner_change<'a>(current: &str, requested: Option<&'a str>) -> Option<&'a str> {
    requested.filter(|id| *id != current)
}

impl SerialArgs {
    fn edits(&self) -> Vec<(&'static str, &str)> {
        [
            ("name", &self.name),
            ("description", &self.description),
            ("genre", &self.genre),
            ("status", &self.status),
            ("blogUrl", &self.blog_url),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.as_deref().map(|v| (field, v)))
        .collect()
    }
}

impl EpisodeArgs {
    fn edits(&self) -> Vec<(&'static str, &str)> {
        [
            ("title", &self.title),
            ("episodeNo", &self.episode_no),
            ("description", &self.description),
            ("redirectUrl", &self.redirect_url),
            ("duration", &self.duration),
            ("date", &self.date),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.as_deref().map(|v| (field, v)))
        .collect()
    }
}

pub async fn list_serials(config: &AppConfig, search: Option<&str>) -> Result<ExitCode, CliError> {
    let Some(mut panel) = connect(config).await? else {
        return Ok(ExitCode::FAILURE);
    };
    print_serials(&filter_serials(panel.store(), search.unwrap_or_default()));
    finish(&mut panel);
    Ok(ExitCode::SUCCESS)
}

pub async fn list_episodes(
    config: &AppConfig,
    search: Option<&str>,
    serial: Option<&str>,
) -> Result<ExitCode, CliError> {
    let Some(mut panel) = connect(config).await? else {
        return Ok(ExitCode::FAILURE);
    };
    let rows = episode_rows(
        panel.store(),
        search.unwrap_or_default(),
        SerialFilter::from_arg(serial),
    );
    print_episode_rows(&rows);
    finish(&mut panel);
    Ok(ExitCode::SUCCESS)
}

pub async fn serial(config: &AppConfig, action: SerialAction) -> Result<ExitCode, CliError> {
    let Some(mut panel) = connect(config).await? else {
        return Ok(ExitCode::FAILURE);
    };

    let code = match action {
        SerialAction::Add(args) => {
            panel.open_add_serial();
            fill(panel.serial_form_mut(), &args.edits(), args.image.as_deref())?;
            let outcome = panel.submit_serial().await;
            if outcome == SubmitOutcome::Saved {
                if let Some(created) = panel.store().serials().last() {
                    println!("{}", created.id);
                }
            }
            exit_for(&outcome)
        }
        SerialAction::Edit { id, fields } => {
            if !panel.open_edit_serial(&id) {
                return Err(CliError::Usage(format!("No serial with id {id}")));
            }
            fill(panel.serial_form_mut(), &fields.edits(), fields.image.as_deref())?;
            exit_for(&panel.submit_serial().await)
        }
        SerialAction::Delete { id, yes } => {
            let Some(target) = panel.store().serial(&id) else {
                return Err(CliError::Usage(format!("No serial with id {id}")));
            };
            let question = format!(
                "Delete serial '{}' and its {} episode(s)?",
                target.name,
                target.episode_count()
            );
            if !yes && !confirm(&question)? {
                println!("Cancelled.");
                return Ok(ExitCode::SUCCESS);
            }
            if panel.delete_serial(&id).await {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
    };

    finish(&mut panel);
    Ok(code)
}

pub async fn episode(config: &AppConfig, action: EpisodeAction) -> Result<ExitCode, CliError> {
    let Some(mut panel) = connect(config).await? else {
        return Ok(ExitCode::FAILURE);
    };

    let code = match action {
        EpisodeAction::Add(args) => {
            if let Some(serial_id) = &args.serial {
                if panel.store().serial(serial_id).is_none() {
                    return Err(CliError::Usage(format!("No serial with id {serial_id}")));
                }
            }
            panel.open_add_episode(args.serial.as_deref());
            fill(panel.episode_form_mut(), &args.edits(), args.image.as_deref())?;
            exit_for(&panel.submit_episode().await)
        }
        EpisodeAction::Edit { id, fields } => {
            if !panel.open_edit_episode(&id) {
                return Err(CliError::Usage(format!("No episode with id {id}")));
            }
            let mut edits = fields.edits();
            let owner = panel.store().episode(&id).map_or("", |e| e.serial_id.as_str());
            if let Some(serial_id) = owner_change(owner, fields.serial.as_deref()) {
                edits.push(("serialId", serial_id));
            }
            fill(panel.episode_form_mut(), &edits, fields.image.as_deref())?;
            exit_for(&panel.submit_episode().await)
        }
        EpisodeAction::Delete { id, yes } => {
            let Some(target) = panel.store().episode(&id) else {
                return Err(CliError::Usage(format!("No episode with id {id}")));
            };
            let question = format!("Delete episode '{}'?", target.title);
            if !yes && !confirm(&question)? {
                println!("Cancelled.");
                return Ok(ExitCode::SUCCESS);
            }
            if panel.delete_episode(&id).await {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
    };

    finish(&mut panel);
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use voidcity_core::form::SerialForm;
    use voidcity_core::models::{SerialFields, SerialStatus};

    #[test]
    fn test_serial_edits_skip_unset_fields() {
        let args = SerialArgs {
            name: Some("Foo".into()),
            blog_url: Some("https://blog.example.com".into()),
            ..Default::default()
        };
        assert_eq!(
            args.edits(),
            [("name", "Foo"), ("blogUrl", "https://blog.example.com")]
        );
    }

    #[test]
    fn test_episode_edits_use_wire_names() {
        let args = EpisodeArgs {
            title: Some("Pilot".into()),
            episode_no: Some("3".into()),
            ..Default::default()
        };
        assert_eq!(args.edits(), [("title", "Pilot"), ("episodeNo", "3")]);
    }

    #[test]
    fn test_owner_change_ignores_current_owner() {
        assert_eq!(owner_change("s1", None), None);
        assert_eq!(owner_change("s1", Some("s1")), None);
        assert_eq!(owner_change("s1", Some("s2")), Some("s2"));
    }

    #[test]
    fn test_fill_applies_status_and_rejects_unknown() {
        let mut form = SerialForm::new();
        form.open_add(SerialFields::default());
        fill(&mut form, &[("name", "Foo"), ("status", "Completed")], None).unwrap();
        assert_eq!(form.fields().status, SerialStatus::Completed);

        let err = fill(&mut form, &[("status", "paused")], None).unwrap_err();
        assert!(err.to_string().contains("Unknown status 'paused'"));
    }
}
