//! The processing service: everything the HTTP endpoints do, minus HTTP.
//!
//! [`ProcessingService`] owns the two [`FileStore`]s and an [`ImageBackend`].
//! Handlers in [`server`](crate::server) parse requests, hop onto the blocking
//! pool, and call exactly one method here. The CLI's batch mode calls the same
//! methods from a rayon pool.
//!
//! ```text
//! upload ──► begin/commit_upload ──► enhance_upload ──► results/enhanced_<stem>_<ms><ext>
//! editor ──► reprocess(target, overlay) ──► composite in place ──► url?t=<ms>
//!            rename(old, new)            ──► results/<new><old ext>
//!            bundle_all()                ──► zip of results/ minus *.zip
//! ```
//!
//! The filesystem is the only state. Generated names are unique at creation
//! because [`FileStore::reserve`] claims them with `create_new`; everything
//! else (rename races, concurrent reprocess of one file) is last writer wins.

use crate::bundle::{self, BundleError};
use crate::config::{ServerConfig, UploadConfig};
use crate::imaging::{self, BackendError, CompositeOutcome, EnhanceConfig, ImageBackend};
use crate::naming::{self, NamingError};
use crate::overlay::{Overlay, OverlayError};
use crate::store::{FileStore, Reservation, StoreEntry, StoreError};
use crate::types::ProcessedFile;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Processing failed: {0}")]
    Processing(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Io(e) => Self::Io(e),
            StoreError::NotFound(name) => Self::NotFound(format!("File '{name}' not found")),
            StoreError::Conflict(name) => {
                Self::Conflict(format!("A file named '{name}' already exists"))
            }
        }
    }
}

impl From<BackendError> for ServiceError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::Io(e) => Self::Io(e),
            other => Self::Processing(other.to_string()),
        }
    }
}

impl From<NamingError> for ServiceError {
    fn from(e: NamingError) -> Self {
        Self::Validation(e.to_string())
    }
}

impl From<BundleError> for ServiceError {
    fn from(e: BundleError) -> Self {
        match e {
            BundleError::Io(e) => Self::Io(e),
            BundleError::Zip(e) => Self::Processing(e.to_string()),
        }
    }
}

impl From<OverlayError> for ServiceError {
    fn from(e: OverlayError) -> Self {
        match e {
            OverlayError::Empty => Self::Validation(e.to_string()),
            OverlayError::Base64(_) => Self::Processing(e.to_string()),
        }
    }
}

/// Multipart field name uploads arrive under; also the stored-name prefix.
pub const UPLOAD_FIELD: &str = "files";

/// Which uploads are accepted.
///
/// A file passes only when its MIME type is `image/<t>` and its extension is
/// `<t'>`, with both `t` and `t'` in the allowed list.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_files: usize,
    pub max_file_size: u64,
    pub allowed_types: Vec<String>,
}

impl From<&UploadConfig> for UploadPolicy {
    fn from(config: &UploadConfig) -> Self {
        Self {
            max_files: config.max_files,
            max_file_size: config.max_file_size,
            allowed_types: config
                .allowed_types
                .iter()
                .map(|t| t.to_ascii_lowercase())
                .collect(),
        }
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::from(&UploadConfig::default())
    }
}

impl UploadPolicy {
    fn allows(&self, kind: &str) -> bool {
        self.allowed_types.iter().any(|t| t == kind)
    }

    /// Check a file's declared type and name.
    pub fn check_type(&self, filename: &str, content_type: Option<&str>) -> Result<(), ServiceError> {
        let mime_ok = content_type
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase())
            .and_then(|ct| ct.strip_prefix("image/").map(|s| self.allows(s)))
            .unwrap_or(false);
        let ext_ok = self.allows(&naming::extension_lower(filename));

        if mime_ok && ext_ok {
            Ok(())
        } else {
            Err(ServiceError::Validation(format!(
                "'{}' rejected: only image files are allowed ({})",
                naming::bare_filename(filename),
                self.allowed_types.join(", ")
            )))
        }
    }

    pub fn check_size(&self, filename: &str, size: u64) -> Result<(), ServiceError> {
        if size > self.max_file_size {
            return Err(ServiceError::Validation(format!(
                "'{}' exceeds the {} byte file size limit",
                naming::bare_filename(filename),
                self.max_file_size
            )));
        }
        Ok(())
    }

    pub fn check_count(&self, count: usize) -> Result<(), ServiceError> {
        if count > self.max_files {
            return Err(ServiceError::Validation(format!(
                "Too many files: at most {} per upload",
                self.max_files
            )));
        }
        Ok(())
    }
}

/// An accepted upload, already written to the uploads store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    /// Filename the client sent.
    pub original: String,
    /// Name in the uploads store.
    pub stored: String,
}

/// An upload whose bytes are still arriving.
#[derive(Debug)]
pub struct PendingUpload {
    pub original: String,
    reservation: Reservation,
}

impl PendingUpload {
    /// Staging file the bytes are written to.
    pub fn path(&self) -> &Path {
        &self.reservation.staging
    }
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub struct ProcessingService<B: ImageBackend> {
    backend: B,
    uploads: FileStore,
    results: FileStore,
    enhance: EnhanceConfig,
    policy: UploadPolicy,
    keep_originals: bool,
    clock: fn() -> i64,
}

impl<B: ImageBackend> ProcessingService<B> {
    /// Open both stores (creating their directories) and wire up the backend.
    pub fn new(backend: B, config: &ServerConfig) -> Result<Self, ServiceError> {
        Ok(Self {
            backend,
            uploads: FileStore::open(&config.storage.uploads_dir)?,
            results: FileStore::open(&config.storage.results_dir)?,
            enhance: config.enhance.to_enhance_config(),
            policy: UploadPolicy::from(&config.upload),
            keep_originals: config.storage.keep_originals,
            clock: now_millis,
        })
    }

    /// Replace the timestamp source used for generated names and cache busters.
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    pub fn uploads(&self) -> &FileStore {
        &self.uploads
    }

    pub fn results(&self) -> &FileStore {
        &self.results
    }

    /// Claim a fresh name in the uploads store for an incoming file. The
    /// bytes go to [`PendingUpload::path`]; nothing is visible until
    /// [`commit_upload`](Self::commit_upload).
    pub fn begin_upload(&self, original: &str) -> Result<PendingUpload, ServiceError> {
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        let nonce = &nonce[..8];
        let reservation = self.uploads.reserve((self.clock)(), |ts| {
            naming::upload_filename(UPLOAD_FIELD, original, ts, nonce)
        })?;
        Ok(PendingUpload {
            original: original.to_string(),
            reservation,
        })
    }

    pub fn commit_upload(&self, pending: PendingUpload) -> Result<StoredUpload, ServiceError> {
        if let Err(e) = self.uploads.publish(&pending.reservation) {
            self.discard_upload(&pending);
            return Err(e.into());
        }
        let stored = pending.reservation.name;
        tracing::debug!(original = %pending.original, stored = %stored, "stored upload");
        Ok(StoredUpload {
            original: pending.original,
            stored,
        })
    }

    /// Throw away a partially received upload.
    pub fn discard_upload(&self, pending: &PendingUpload) {
        if let Err(e) = self.uploads.discard(&pending.reservation) {
            tracing::warn!(original = %pending.original, error = %e, "could not remove partial upload");
        }
    }

    /// Write an accepted upload to the uploads store under a fresh name.
    pub fn store_upload(&self, original: &str, bytes: &[u8]) -> Result<StoredUpload, ServiceError> {
        let pending = self.begin_upload(original)?;
        if let Err(e) = std::fs::write(pending.path(), bytes) {
            self.discard_upload(&pending);
            return Err(e.into());
        }
        self.commit_upload(pending)
    }

    /// Enhance a stored upload into the results store.
    pub fn enhance_upload(&self, upload: &StoredUpload) -> Result<ProcessedFile, ServiceError> {
        let source = self
            .uploads
            .find(&upload.stored)
            .ok_or_else(|| ServiceError::NotFound(format!("Upload '{}' not found", upload.stored)))?;

        let processed = self.enhance_into_results(&source, &upload.original, &upload.stored)?;

        if !self.keep_originals {
            if let Err(e) = self.uploads.remove(&upload.stored) {
                tracing::warn!(stored = %upload.stored, error = %e, "could not remove original");
            }
        }
        Ok(processed)
    }

    /// Enhance a batch in order. Failures are logged and skipped.
    pub fn enhance_batch(&self, uploads: &[StoredUpload]) -> Vec<ProcessedFile> {
        uploads
            .iter()
            .filter_map(|upload| match self.enhance_upload(upload) {
                Ok(processed) => Some(processed),
                Err(e) => {
                    tracing::warn!(original = %upload.original, error = %e, "enhancement failed, skipping");
                    None
                }
            })
            .collect()
    }

    /// Enhance a file that lives outside the uploads store (CLI batch mode).
    pub fn enhance_path(&self, source: &Path) -> Result<ProcessedFile, ServiceError> {
        let original = source
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                ServiceError::Validation(format!("'{}' has no usable filename", source.display()))
            })?;
        if !source.is_file() {
            return Err(ServiceError::NotFound(format!(
                "'{}' not found",
                source.display()
            )));
        }
        self.enhance_into_results(source, original, &source.to_string_lossy())
    }

    fn enhance_into_results(
        &self,
        source: &Path,
        original: &str,
        source_filename: &str,
    ) -> Result<ProcessedFile, ServiceError> {
        let reservation = self.results.reserve((self.clock)(), |ts| {
            naming::enhanced_filename(original, ts)
        })?;

        let dims = match imaging::enhance_image(
            &self.backend,
            source,
            &reservation.staging,
            &self.enhance,
        ) {
            Ok(dims) => dims,
            Err(e) => {
                self.discard_result(&reservation);
                return Err(e.into());
            }
        };
        if let Err(e) = self.results.publish(&reservation) {
            self.discard_result(&reservation);
            return Err(e.into());
        }

        let enhanced = reservation.name;
        tracing::info!(
            original,
            enhanced = %enhanced,
            width = dims.width,
            height = dims.height,
            "enhanced image"
        );
        Ok(ProcessedFile {
            original: original.to_string(),
            source_filename: source_filename.to_string(),
            url: naming::results_url(&enhanced),
            enhanced,
        })
    }

    fn discard_result(&self, reservation: &Reservation) {
        if let Err(e) = self.results.discard(reservation) {
            tracing::warn!(file = %reservation.name, error = %e, "could not remove unfinished result");
        }
    }

    /// Composite an overlay onto a result file and return its cache-busted URL.
    ///
    /// The target is checked before the overlay is decoded, so a missing
    /// target never costs a decode. A fully transparent overlay leaves the
    /// file byte-for-byte unchanged but still returns a fresh URL.
    pub fn reprocess(&self, target: &str, overlay: &str) -> Result<String, ServiceError> {
        let name = naming::sanitize(target)?;
        let path = self
            .results
            .find(name)
            .ok_or_else(|| ServiceError::NotFound(format!("File '{name}' not found")))?;

        let overlay = Overlay::from_data_url(overlay)?;
        let outcome = imaging::apply_overlay(&self.backend, &path, overlay.bytes, self.enhance.quality)?;

        match outcome {
            CompositeOutcome::Applied => tracing::info!(file = name, "overlay applied"),
            CompositeOutcome::Unchanged => {
                tracing::debug!(file = name, "blank overlay, file untouched")
            }
        }
        Ok(naming::cache_busted(&naming::results_url(name), (self.clock)()))
    }

    /// Rename a result file. Returns the final filename.
    pub fn rename(&self, old: &str, new: &str) -> Result<String, ServiceError> {
        let plan = naming::resolve_rename(old, new)?;
        self.results.rename(&plan.source, &plan.destination)?;
        tracing::info!(from = %plan.source, to = %plan.destination, "renamed result");
        Ok(plan.destination)
    }

    /// Zip every result except earlier archives.
    pub fn bundle_all(&self) -> Result<Vec<u8>, ServiceError> {
        let entries = self.results.entries()?;
        let bytes = bundle::bundle_entries(&entries)?;
        tracing::info!(files = entries.len(), bytes = bytes.len(), "bundled results");
        Ok(bytes)
    }

    /// Current result files, archives excluded.
    pub fn list_results(&self) -> Result<Vec<StoreEntry>, ServiceError> {
        Ok(self
            .results
            .entries()?
            .into_iter()
            .filter(|e| !naming::is_archive(&e.name))
            .collect())
    }
}
