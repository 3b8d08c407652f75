use std::process::ExitCode;

use voidcity_core::config::AppConfig;
use voidcity_runtime::view::{episode_link, filter_serials};

use crate::error::CliError;

/// Public listing: every serial with its episodes, no login needed.
pub async fn browse(config: &AppConfig, search: Option<&str>) -> Result<ExitCode, CliError> {
    let (store, report) = voidcity_runtime::browse(config).await?;
    let serials = filter_serials(&store, search.unwrap_or_default());
    if serials.is_empty() {
        println!("No serials found.");
        return Ok(ExitCode::SUCCESS);
    }

    for serial in serials {
        println!("{} [{}] {}", serial.name, serial.status, serial.genre);
        if !serial.description.is_empty() {
            println!("  {}", serial.description);
        }
        for episode in serial.episodes() {
            let no = episode
                .episode_no
                .map(|n| format!("#{n} "))
                .unwrap_or_default();
            println!("  {no}{}  ({})", episode.title, episode.id);
        }
        println!();
    }
    if !report.degraded.is_empty() {
        eprintln!(
            "warning: episodes could not be loaded for {} serial(s)",
            report.degraded.len()
        );
    }
    Ok(ExitCode::SUCCESS)
}

pub async fn open(config: &AppConfig, episode_id: &str) -> Result<ExitCode, CliError> {
    let (store, _) = voidcity_runtime::browse(config).await?;
    if store.episode(episode_id).is_none() {
        return Err(CliError::Usage(format!("No episode with id {episode_id}")));
    }
    let Some(url) = episode_link(&store, episode_id) else {
        eprintln!("error: Episode {episode_id} has no link");
        return Ok(ExitCode::FAILURE);
    };
    tracing::info!(url, "Opening episode");
    open::that(url)?;
    println!("Opened {url}");
    Ok(ExitCode::SUCCESS)
}
