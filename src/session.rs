//! Session state and credential storage.
//!
//! The session is an explicit object handed by reference to everything that
//! needs the token or display name. Two storage tiers back it: a persistent
//! JSON credentials file under the data directory, and the in-memory fields
//! of the running process. "Remember me" decides whether a sign-in is
//! written through to the file; signing out clears both tiers together.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// On-disk credential record. The field names are the fixed storage keys
/// (`tkn`, `name`) shared with the other Todoz clients.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredCredentials {
    #[serde(rename = "tkn")]
    token: Option<String>,
    #[serde(rename = "name")]
    name: Option<String>,
}

/// Authenticated session state for the running process.
pub struct Session {
    pub token: Option<String>,
    pub user_name: Option<String>,
    pub remember: bool,
    path: PathBuf,
}

impl Session {
    /// Hydrate a session from the persistent tier, falling back to a
    /// signed-out session when the file is absent or unreadable.
    pub fn load(data_dir: &Path) -> Self {
        let path = credentials_path(data_dir);
        let stored = read_credentials(&path);
        let remember = stored.token.is_some();
        Session {
            token: stored.token,
            user_name: stored.name,
            remember,
            path,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Display name for the header bar, empty until signed in.
    pub fn display_name(&self) -> &str {
        self.user_name.as_deref().unwrap_or("")
    }

    /// Install a fresh sign-in. With `remember` set the credentials are
    /// written through to the persistent tier; otherwise they live only in
    /// this process and vanish on exit.
    pub fn sign_in(&mut self, token: String, name: String, remember: bool) -> io::Result<()> {
        self.token = Some(token);
        self.user_name = Some(name);
        self.remember = remember;
        if remember {
            self.persist()?;
        }
        Ok(())
    }

    /// Clear both tiers together and reset the in-memory fields.
    pub fn sign_out(&mut self) -> io::Result<()> {
        self.token = None;
        self.user_name = None;
        self.remember = false;
        clear_credentials(&self.path)
    }

    /// Write the credentials file using atomic write (temp file + rename).
    fn persist(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let stored = StoredCredentials {
            token: self.token.clone(),
            name: self.user_name.clone(),
        };
        let tmp = self.path.with_extension("json.tmp");
        let mut f = File::create(&tmp)?;
        let data = serde_json::to_string_pretty(&stored).map_err(io::Error::other)?;
        f.write_all(data.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, &self.path)?;
        Ok(())
    }
}

/// Location of the persistent credential tier inside the data directory.
pub fn credentials_path(data_dir: &Path) -> PathBuf {
    data_dir.join("credentials.json")
}

/// Remove the persistent tier. Used by in-app sign-out and `todoz logout`.
pub fn clear_credentials(path: &Path) -> io::Result<()> {
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}

fn read_credentials(path: &Path) -> StoredCredentials {
    if !path.exists() {
        return StoredCredentials::default();
    }
    let mut buf = String::new();
    match File::open(path).and_then(|mut f| f.read_to_string(&mut buf)) {
        Ok(_) => match serde_json::from_str(&buf) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!("credentials file unreadable, starting signed out: {e}");
                StoredCredentials::default()
            }
        },
        Err(e) => {
            tracing::warn!("credentials file unreadable, starting signed out: {e}");
            StoredCredentials::default()
        }
    }
}
