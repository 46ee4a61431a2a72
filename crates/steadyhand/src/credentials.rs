//! Login secrets.
//!
//! A provider returns the raw secret for an account as
//! `username,password`; [`Credentials::parse`] splits it.

use crate::result::{SteadyError, SteadyResult};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Prefix of the environment variables read by [`EnvCredentials`]
pub const ENV_PREFIX: &str = "STEADYHAND_SECRET_";

/// Variable naming the directory that holds the `.env` file
pub const DOTENV_DIR_ENV: &str = "DOTENV_DIR";

/// Source of account secrets
pub trait CredentialProvider: Send + Sync {
    /// Raw `username,password` secret for `account`
    fn secret(&self, account: &str) -> SteadyResult<String>;

    /// Secret for `account`, split into its parts
    fn credentials(&self, account: &str) -> SteadyResult<Credentials> {
        Credentials::parse(account, &self.secret(account)?)
    }
}

/// Username and password pair
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Login name
    pub username: String,
    /// Password
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl Credentials {
    /// Split a `username,password` secret.
    ///
    /// Only the first comma separates, so passwords may contain commas.
    pub fn parse(account: &str, raw: &str) -> SteadyResult<Self> {
        let malformed = |message: &str| SteadyError::Credentials {
            account: account.to_string(),
            message: message.to_string(),
        };
        let (username, password) = raw
            .split_once(',')
            .ok_or_else(|| malformed("expected 'username,password'"))?;
        let username = username.trim();
        let password = password.trim();
        if username.is_empty() {
            return Err(malformed("username is empty"));
        }
        if password.is_empty() {
            return Err(malformed("password is empty"));
        }
        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

/// Reads `STEADYHAND_SECRET_<ACCOUNT>` from the process environment,
/// then from a `.env` file.
///
/// Process variables win over file entries, matching `dotenvy::dotenv`.
#[derive(Debug, Clone, Default)]
pub struct EnvCredentials {
    file: HashMap<String, String>,
    source: Option<PathBuf>,
}

impl EnvCredentials {
    /// Process environment only
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Process environment plus the `.env` found by [`Self::locate`].
    ///
    /// A missing file is logged and leaves the process environment as the
    /// only source; an unreadable one is an error.
    pub fn load() -> SteadyResult<Self> {
        let dotenv_dir = std::env::var_os(DOTENV_DIR_ENV).map(PathBuf::from);
        let cwd = std::env::current_dir()?;
        match Self::locate(dotenv_dir.as_deref(), &cwd) {
            Some(path) => Self::from_dotenv(path),
            None => {
                warn!(
                    dotenv_dir = ?dotenv_dir,
                    cwd = %cwd.display(),
                    ".env not found, reading secrets from the process environment only"
                );
                Ok(Self::new())
            }
        }
    }

    /// `<dotenv_dir>/.env` if it exists, else `<cwd>/.env` if it exists
    #[must_use]
    pub fn locate(dotenv_dir: Option<&Path>, cwd: &Path) -> Option<PathBuf> {
        dotenv_dir
            .map(|dir| dir.join(".env"))
            .into_iter()
            .chain(std::iter::once(cwd.join(".env")))
            .find(|candidate| candidate.is_file())
    }

    /// Parse `path` as a dotenv file
    pub fn from_dotenv(path: impl AsRef<Path>) -> SteadyResult<Self> {
        let path = path.as_ref();
        let unreadable =
            |e: dotenvy::Error| SteadyError::config(format!("cannot read '{}': {e}", path.display()));
        let mut file = HashMap::new();
        for entry in dotenvy::from_path_iter(path).map_err(unreadable)? {
            let (key, value) = entry.map_err(unreadable)?;
            file.insert(key, value);
        }
        info!(path = %path.display(), entries = file.len(), "loaded .env");
        Ok(Self {
            file,
            source: Some(path.to_path_buf()),
        })
    }

    /// The `.env` file in use, if any
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Variable name for `account`: uppercased, non-alphanumerics as `_`
    #[must_use]
    pub fn variable_for(account: &str) -> String {
        let suffix: String = account
            .trim()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("{ENV_PREFIX}{suffix}")
    }
}

impl CredentialProvider for EnvCredentials {
    fn secret(&self, account: &str) -> SteadyResult<String> {
        let variable = Self::variable_for(account);
        std::env::var(&variable)
            .ok()
            .or_else(|| self.file.get(&variable).cloned())
            .ok_or_else(|| SteadyError::Credentials {
                account: account.to_string(),
                message: match &self.source {
                    Some(path) => format!("{variable} is not set or in {}", path.display()),
                    None => format!("{variable} is not set"),
                },
            })
    }
}
