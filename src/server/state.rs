use crate::imaging::ImageBackend;
use crate::service::ProcessingService;
use std::sync::Arc;

/// Shared handler state. Cloned per request; the service itself is shared.
pub struct AppState<B: ImageBackend> {
    pub service: Arc<ProcessingService<B>>,
}

impl<B: ImageBackend> AppState<B> {
    pub fn new(service: ProcessingService<B>) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

impl<B: ImageBackend> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}
