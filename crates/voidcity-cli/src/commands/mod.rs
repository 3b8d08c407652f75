pub mod admin;
pub mod auth;
pub mod browse;

use std::io::{self, BufRead, Write};

use voidcity_core::models::Serial;
use voidcity_runtime::view::EpisodeRow;
use voidcity_runtime::{Notice, NoticeKind};

/// Print with a prompt on stderr and read one trimmed line from stdin.
///
/// Input is echoed by the terminal.
pub fn prompt(label: &str) -> io::Result<String> {
    let mut stderr = io::stderr();
    write!(stderr, "{label}")?;
    stderr.flush()?;
    read_line(io::stdin().lock())
}

/// One line from `reader` without its line ending.
pub fn read_line(mut reader: impl BufRead) -> io::Result<String> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Ask a y/N question. Anything but an explicit yes declines.
pub fn confirm(question: &str) -> io::Result<bool> {
    let answer = prompt(&format!("{question} [y/N] "))?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

pub fn print_notices(notices: Vec<Notice>) {
    for notice in notices {
        match notice.kind {
            NoticeKind::Success => println!("{notice}"),
            NoticeKind::Info => eprintln!("{notice}"),
            NoticeKind::Error => eprintln!("error: {notice}"),
        }
    }
}

pub fn print_serials(serials: &[&Serial]) {
    if serials.is_empty() {
        println!("No serials found.");
        return;
    }
    println!("{:<26} {:<32} {:<10} {:<14} {:>8}", "ID", "NAME", "STATUS", "GENRE", "EPISODES");
    for serial in serials {
        println!(
            "{:<26} {:<32} {:<10} {:<14} {:>8}",
            serial.id,
            truncate(&serial.name, 32),
            serial.status,
            truncate(&serial.genre, 14),
            serial.episode_count()
        );
    }
}

pub fn print_episode_rows(rows: &[EpisodeRow<'_>]) {
    if rows.is_empty() {
        println!("No episodes found.");
        return;
    }
    println!("{:<26} {:>4} {:<32} {:<24} {:<10}", "ID", "NO", "TITLE", "SERIAL", "DATE");
    for row in rows {
        let episode = row.episode;
        println!(
            "{:<26} {:>4} {:<32} {:<24} {:<10}",
            episode.id,
            episode.episode_no.map(|n| n.to_string()).unwrap_or_default(),
            truncate(&episode.title, 32),
            truncate(row.serial_name, 24),
            episode.date.as_deref().unwrap_or("-")
        );
    }
}

/// Cut to `max` characters, marking the cut with an ellipsis.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("n"));
        assert!(!is_yes("yep"));
    }

    #[test]
    fn test_read_line_strips_line_ending_only() {
        let input = io::Cursor::new(" s3cret \r\nnext\n");
        assert_eq!(read_line(input).unwrap(), " s3cret ");
        assert_eq!(read_line(io::Cursor::new("")).unwrap(), "");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly10!", 10), "exactly10!");
        assert_eq!(truncate("much longer title", 8), "much lo…");
        assert_eq!(truncate("ぼくらの時代", 4), "ぼくら…");
    }
}
