//! One editing session against one enhanced image on the server.
//!
//! Opening follows a strict order: fetch the image, read its pixel size,
//! and only then build the [`Editor`]. A session therefore never exists with
//! a stroke layer of the wrong size.
//!
//! Submitting is split into [`begin_submit`](EditSession::begin_submit) and
//! [`finish_submit`](EditSession::finish_submit) so a front end can disable
//! its controls in between; [`submit`](EditSession::submit) does both around
//! the request.

use super::{Editor, EditorError};
use crate::client::{ApiClient, ClientError};
use crate::naming;
use crate::types::ReprocessResponse;
use image::ImageReader;
use std::io::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitStatus {
    Idle,
    Submitting,
}

#[derive(Debug, Clone)]
pub struct EditSession {
    target: String,
    display_url: String,
    editor: Editor,
    status: SubmitStatus,
}

impl EditSession {
    /// Session for an image whose size is already known.
    pub fn from_dimensions(target: &str, url: &str, width: u32, height: u32) -> Self {
        Self {
            target: naming::bare_filename(target).to_string(),
            display_url: url.to_string(),
            editor: Editor::new(width, height),
            status: SubmitStatus::Idle,
        }
    }

    /// Fetch `url`, read the image size from its header, and start a session.
    pub async fn open(client: &ApiClient, target: &str, url: &str) -> Result<Self, EditorError> {
        let bytes = client.fetch_bytes(url).await?;
        let (width, height) = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| EditorError::Decode(e.to_string()))?
            .into_dimensions()
            .map_err(|e| EditorError::Decode(e.to_string()))?;

        tracing::debug!(target_file = target, width, height, "edit session opened");
        Ok(Self::from_dimensions(target, url, width, height))
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// URL to show; changes after every successful submit.
    pub fn display_url(&self) -> &str {
        &self.display_url
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editor
    }

    pub fn status(&self) -> SubmitStatus {
        self.status
    }

    /// Controls (apply, clear, tools) are disabled while a submit is in flight.
    pub fn controls_enabled(&self) -> bool {
        self.status == SubmitStatus::Idle
    }

    /// Mark the session busy and encode the overlay to send.
    pub fn begin_submit(&mut self) -> Result<String, EditorError> {
        if self.status == SubmitStatus::Submitting {
            return Err(EditorError::SubmitInFlight);
        }
        let overlay = self.editor.layer().to_data_url()?;
        self.status = SubmitStatus::Submitting;
        Ok(overlay)
    }

    /// Settle a submit. On success the layer is cleared and the display URL
    /// replaced; on failure the strokes stay so the user can retry.
    pub fn finish_submit(
        &mut self,
        result: Result<ReprocessResponse, ClientError>,
    ) -> Result<&str, EditorError> {
        self.status = SubmitStatus::Idle;
        let response = result?;
        self.editor.clear();
        self.display_url = response.url;
        Ok(&self.display_url)
    }

    /// Send the overlay to `/reprocess` and apply the result.
    pub async fn submit(&mut self, client: &ApiClient) -> Result<String, EditorError> {
        let overlay = self.begin_submit()?;
        let result = client.reprocess(&self.target, &overlay).await;
        self.finish_submit(result).map(str::to_string)
    }
}
