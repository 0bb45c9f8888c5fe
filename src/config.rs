use anyhow::{Result, anyhow};
use std::path::PathBuf;

use crate::cli::{Backend, ConnectionArgs};

const SESSION_DIR: &str = ".filmshub";
const SESSION_FILE: &str = "session.json";

/// Connection parameters for the hosted catalog and auth services.
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: Backend,
    pub project_id: String,
    pub api_key: String,
    pub collection: String,
    pub session_file: PathBuf,
    pub firestore_url: String,
    pub identity_url: String,
    pub securetoken_url: String,
}

impl Config {
    pub fn from_args(args: ConnectionArgs) -> Result<Self> {
        let session_file = match args.session_file {
            Some(path) => path,
            None => default_session_file()?,
        };

        let config = Self {
            backend: args.backend,
            project_id: args.project_id.unwrap_or_default(),
            api_key: args.api_key.unwrap_or_default(),
            collection: args.collection,
            session_file,
            firestore_url: trim_base(args.firestore_url),
            identity_url: trim_base(args.identity_url),
            securetoken_url: trim_base(args.securetoken_url),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.collection.trim().is_empty() {
            return Err(anyhow!("Collection name must not be empty"));
        }
        if self.backend == Backend::Firebase {
            if self.project_id.trim().is_empty() {
                return Err(anyhow!(
                    "Missing Firebase project id (--project-id or FILMSHUB_PROJECT_ID)"
                ));
            }
            if self.api_key.trim().is_empty() {
                return Err(anyhow!(
                    "Missing Firebase API key (--api-key or FILMSHUB_API_KEY)"
                ));
            }
        }
        Ok(())
    }

    /// `projects/{id}/databases/(default)/documents`
    pub fn documents_path(&self) -> String {
        format!("projects/{}/databases/(default)/documents", self.project_id)
    }
}

fn default_session_file() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("Cannot determine home directory"))?;
    Ok(home.join(SESSION_DIR).join(SESSION_FILE))
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(backend: Backend) -> ConnectionArgs {
        ConnectionArgs {
            backend,
            project_id: None,
            api_key: None,
            collection: "videos".to_string(),
            session_file: Some(PathBuf::from("/tmp/filmshub-session.json")),
            firestore_url: "https://firestore.googleapis.com/v1/".to_string(),
            identity_url: "https://identitytoolkit.googleapis.com/v1".to_string(),
            securetoken_url: "https://securetoken.googleapis.com/v1".to_string(),
        }
    }

    #[test]
    fn firebase_backend_requires_credentials() {
        let err = Config::from_args(args(Backend::Firebase)).unwrap_err();
        assert!(err.to_string().contains("project id"));

        let mut with_project = args(Backend::Firebase);
        with_project.project_id = Some("films".to_string());
        let err = Config::from_args(with_project).unwrap_err();
        assert!(err.to_string().contains("API key"));
    }

    #[test]
    fn memory_backend_needs_nothing() {
        let config = Config::from_args(args(Backend::Memory)).unwrap();
        assert_eq!(config.firestore_url, "https://firestore.googleapis.com/v1");
    }

    #[test]
    fn documents_path_uses_default_database() {
        let mut a = args(Backend::Firebase);
        a.project_id = Some("films".to_string());
        a.api_key = Some("key".to_string());
        let config = Config::from_args(a).unwrap();
        assert_eq!(
            config.documents_path(),
            "projects/films/databases/(default)/documents"
        );
    }
}
