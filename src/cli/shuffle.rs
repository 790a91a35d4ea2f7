use crate::{cli, error, info, users::UserRegistry, warning};

/// Shuffle one playlist, addressed by id or by exact name.
pub async fn shuffle(playlist_id: Option<String>, name: Option<String>) {
    let registry = UserRegistry::new();
    let user = cli::authorized_user(&registry).await;

    let playlist_id = match (playlist_id, name) {
        (Some(id), _) => id,
        (None, Some(name)) => {
            let matches = match user.library().playlists_by_name(&name, true).await {
                Ok(matches) => matches,
                Err(e) => error!("Cannot search for playlist '{}'. Err: {}", name, e),
            };
            match matches.len() {
                0 => error!("No owned playlist named '{}' was found", name),
                1 => matches[0].id().to_string(),
                n => {
                    warning!("{} playlists are named '{}', pass an id instead:", n, name);
                    for playlist in &matches {
                        info!("  {}", playlist.id());
                    }
                    return;
                }
            }
        }
        (None, None) => error!("Pass a playlist id or --name <name>"),
    };

    info!("Shuffling playlist {} for {}", playlist_id, user.display_name());

    let job = user.shuffle_playlist_job(playlist_id);
    let status = job.execute(&cli::PrintStatus::new()).await;

    cli::persist_credentials(&user).await;
    cli::report(&registry, &user, &status);
}

/// Converge the user's liked songs into their shuffle playlist and shuffle it.
pub async fn shuffle_liked() {
    let registry = UserRegistry::new();
    let user = cli::authorized_user(&registry).await;

    info!("Shuffling liked songs for {}", user.display_name());

    let job = user.shuffle_liked_job();
    let status = job.execute(&cli::PrintStatus::new()).await;

    cli::persist_credentials(&user).await;
    cli::report(&registry, &user, &status);
}
