//! Flat, filename-addressed file stores.
//!
//! Two stores exist at runtime: one for uploaded originals and one for
//! enhanced results. Neither has an index; the directory listing *is* the
//! data. Every public method takes a client-supplied name and reduces it with
//! [`naming::bare_filename`](crate::naming::bare_filename) first, so nothing
//! outside the store root is ever addressed.
//!
//! There is no locking. Two requests renaming onto the same name race, and
//! whichever `rename(2)` lands last wins.

use crate::naming;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("'{0}' not found")]
    NotFound(String),
    #[error("'{0}' already exists")]
    Conflict(String),
}

/// One regular file in a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEntry {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
}

/// A name claimed by [`FileStore::reserve`] but not yet visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    /// Public name the file gets on publish.
    pub name: String,
    /// Where the content is written until then.
    pub staging: PathBuf,
}

/// Staging files start with this and are never listed.
const STAGING_PREFIX: &str = ".pending-";

/// Upper bound on name-collision retries in [`FileStore::reserve`].
const MAX_RESERVE_ATTEMPTS: i64 = 1000;

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a name would occupy, whether or not the file exists.
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(naming::bare_filename(name))
    }

    /// Path of an existing regular file.
    pub fn find(&self, name: &str) -> Option<PathBuf> {
        let path = self.path_of(name);
        path.is_file().then_some(path)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.path_of(name).exists()
    }

    pub fn write(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, StoreError> {
        let path = self.path_of(name);
        fs::write(&path, bytes)?;
        Ok(path)
    }

    pub fn remove(&self, name: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_of(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Claim a fresh name without making it visible yet.
    ///
    /// `make_name` is called with `seed`, `seed + 1`, ... until a name is free.
    /// The claim is a hidden staging file created with `create_new`, so two
    /// concurrent callers never receive the same name. Content is written to
    /// [`Reservation::staging`] and becomes visible on [`publish`](Self::publish).
    pub fn reserve(
        &self,
        seed: i64,
        make_name: impl Fn(i64) -> String,
    ) -> Result<Reservation, StoreError> {
        for attempt in 0..MAX_RESERVE_ATTEMPTS {
            let name = naming::bare_filename(&make_name(seed + attempt)).to_string();
            let staging = self.root.join(format!("{STAGING_PREFIX}{name}"));
            match OpenOptions::new().write(true).create_new(true).open(&staging) {
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
            // Checked after the claim: a name published in between is still seen.
            if self.path_of(&name).exists() {
                fs::remove_file(&staging)?;
                continue;
            }
            return Ok(Reservation { name, staging });
        }
        Err(StoreError::Conflict(make_name(seed)))
    }

    /// Move a reservation's staging file to its public name.
    pub fn publish(&self, reservation: &Reservation) -> Result<PathBuf, StoreError> {
        let path = self.path_of(&reservation.name);
        fs::rename(&reservation.staging, &path)?;
        Ok(path)
    }

    /// Drop a reservation that will never be published.
    pub fn discard(&self, reservation: &Reservation) -> Result<(), StoreError> {
        match fs::remove_file(&reservation.staging) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Rename `from` to `to` inside the store.
    ///
    /// The source is checked first, then the destination.
    pub fn rename(&self, from: &str, to: &str) -> Result<PathBuf, StoreError> {
        let source = self
            .find(from)
            .ok_or_else(|| StoreError::NotFound(from.to_string()))?;
        let destination = self.path_of(to);
        if destination.exists() {
            return Err(StoreError::Conflict(to.to_string()));
        }
        fs::rename(&source, &destination)?;
        Ok(destination)
    }

    /// Regular files directly under the root, sorted by name. Hidden files,
    /// staging files included, are skipped.
    pub fn entries(&self) -> Result<Vec<StoreEntry>, StoreError> {
        let mut entries = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| {
                e.into_io_error()
                    .unwrap_or_else(|| io::Error::other("directory walk failed"))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            entries.push(StoreEntry {
                name: name.to_string(),
                path: entry.path().to_path_buf(),
                size: entry.metadata().map(|m| m.len()).unwrap_or(0),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}
