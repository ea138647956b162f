use crate::store::Directory;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Students, mentors, meetings and issued tokens
    pub directory: Arc<RwLock<Directory>>,
}

impl AppState {
    pub fn new(directory: Directory) -> Self {
        Self {
            directory: Arc::new(RwLock::new(directory)),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Directory::default())
    }
}
