use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Locally persisted login state
#[derive(Debug, Deserialize)]
struct CredentialsFile {
    #[serde(default, alias = "token")]
    access_token: Option<String>,
}

/// `$HOME/.config/agents/credentials.json`
pub fn default_credentials_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join("agents")
            .join("credentials.json")
    })
}

/// Read the bearer token from a credentials file.
///
/// A missing, unreadable or empty file yields `None`; the caller decides how
/// to proceed without a token.
pub fn load_token(path: &Path) -> Option<String> {
    let json = match std::fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No credentials file at {}", path.display());
            return None;
        }
        Err(e) => {
            tracing::warn!("Cannot read credentials {}: {}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_str::<CredentialsFile>(&json) {
        Ok(creds) => creds.access_token.filter(|t| !t.trim().is_empty()),
        Err(e) => {
            tracing::warn!("Malformed credentials file {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_access_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, r#"{"access_token": "tok-123", "user": "sam"}"#).unwrap();

        assert_eq!(load_token(&path).as_deref(), Some("tok-123"));
    }

    #[test]
    fn test_accepts_token_alias() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, r#"{"token": "tok-456"}"#).unwrap();

        assert_eq!(load_token(&path).as_deref(), Some("tok-456"));
    }

    #[test]
    fn test_missing_empty_or_malformed() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_token(&dir.path().join("absent.json")), None);

        let empty = dir.path().join("empty.json");
        std::fs::write(&empty, r#"{"access_token": "  "}"#).unwrap();
        assert_eq!(load_token(&empty), None);

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "nope").unwrap();
        assert_eq!(load_token(&broken), None);
    }
}
