//! Storage locations for input and output roots
//!
//! A [`Storage`] is resolved once per run from a configured root and the
//! credentials in the configuration. Plain paths and `file://` URIs are served
//! from the local filesystem. Object-store schemes are recognised so that a
//! misconfigured profile fails up front with a clear message instead of being
//! treated as a relative directory name.

use std::path::{Path, PathBuf};

use crate::config::Credentials;
use crate::error::{EtlError, Result};
use crate::utils::io::paths::expand_glob;

const OBJECT_STORE_SCHEMES: &[&str] = &["s3", "s3a", "s3n"];

/// A resolved storage root
#[derive(Debug, Clone)]
pub struct Storage {
    location: String,
    root: PathBuf,
}

impl Storage {
    /// Resolve a configured root into a storage handle
    ///
    /// # Arguments
    /// * `location` - Root as written in the profile (`data/`, `file:///data`, `s3a://bucket/`)
    /// * `credentials` - Credentials from the configuration, if any (checked for presence only)
    ///
    /// # Errors
    /// Object-store roots fail with `MissingCredentials` when no credentials
    /// were configured and `UnsupportedStorage` otherwise. Unknown schemes fail
    /// with `UnsupportedStorage`.
    pub fn connect(location: &str, credentials: Option<&Credentials>) -> Result<Self> {
        let root = match location.split_once("://") {
            None => PathBuf::from(location),
            Some(("file", path)) => PathBuf::from(path),
            Some((scheme, _)) if OBJECT_STORE_SCHEMES.contains(&scheme) => {
                if credentials.is_none() {
                    return Err(EtlError::MissingCredentials(location.to_string()));
                }
                return Err(EtlError::UnsupportedStorage(format!(
                    "{location} (no {scheme} backend is available; use a local or mounted path)"
                )));
            }
            Some(_) => return Err(EtlError::UnsupportedStorage(location.to_string())),
        };

        if credentials.is_some() {
            log::debug!("Credentials are not used for local storage at {}", root.display());
        }

        Ok(Self {
            location: location.to_string(),
            root,
        })
    }

    /// Root as configured
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Local root directory
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of an entry under the root
    #[must_use]
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Files under the root matching a relative glob
    ///
    /// # Errors
    /// `NoInputFiles` when nothing matches
    pub fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let files = expand_glob(&self.root, pattern)?;
        if files.is_empty() {
            return Err(EtlError::NoInputFiles {
                pattern: pattern.to_string(),
                root: self.root.clone(),
            });
        }
        Ok(files)
    }
}
