use crate::{config, types::Credentials};

/// Stored access/refresh token pair for the CLI.
///
/// The tokens are obtained by an external authorization flow and dropped
/// into the credentials file; this store only loads and rewrites them.
pub struct CredentialsStore {
    credentials: Credentials,
}

impl CredentialsStore {
    pub fn new(credentials: Credentials) -> Self {
        CredentialsStore { credentials }
    }

    pub async fn load() -> Result<Self, String> {
        let path = config::credentials_path();
        let content = async_fs::read_to_string(&path)
            .await
            .map_err(|e| e.to_string())?;
        let credentials: Credentials = serde_json::from_str(&content).map_err(|e| e.to_string())?;
        Ok(Self { credentials })
    }

    pub async fn persist(&self) -> Result<(), String> {
        let path = config::credentials_path();
        if let Some(parent) = path.parent() {
            async_fs::create_dir_all(parent)
                .await
                .map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(&self.credentials).map_err(|e| e.to_string())?;
        async_fs::write(&path, json).await.map_err(|e| e.to_string())
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}
