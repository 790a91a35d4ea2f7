use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Table;

use crate::{
    cli, error,
    management::LIBRARY_INDEX_LIMIT,
    types::PlaylistTableRow,
    users::UserRegistry,
    warning,
};

pub async fn list_playlists() {
    let registry = UserRegistry::new();
    let user = cli::authorized_user(&registry).await;

    let pb = ProgressBar::new_spinner();
    pb.set_message("Fetching playlists...");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );

    let playlists = match user.library().most_recent_playlists(LIBRARY_INDEX_LIMIT).await {
        Ok(playlists) => {
            pb.finish_and_clear();
            playlists
        }
        Err(e) => {
            pb.finish_and_clear();
            error!("Cannot fetch playlists. Err: {}", e);
        }
    };

    cli::persist_credentials(&user).await;

    if playlists.is_empty() {
        warning!("No playlists found for {}", user.display_name());
        return;
    }

    let table_rows: Vec<PlaylistTableRow> = playlists
        .into_iter()
        .map(|p| PlaylistTableRow {
            name: p.name,
            tracks: p.tracks.total,
            owner: p.owner.display_name.unwrap_or(p.owner.id),
            id: p.id,
        })
        .collect();

    let table = Table::new(table_rows);
    println!("{}", table);
}
