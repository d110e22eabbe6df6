//! Atomic publication of reloaded projects.

use std::path::Path;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::{LoadOptions, ProjectView, Result, Session};

/// Outcome of [`SessionHost::load_if_stale`].
#[derive(Debug, Clone)]
pub enum Reload {
    /// The published view already matched the token.
    Current(Arc<ProjectView>),
    /// A new view was loaded and published.
    Replaced(Arc<ProjectView>),
}

impl Reload {
    pub fn view(&self) -> &Arc<ProjectView> {
        match self {
            Self::Current(view) | Self::Replaced(view) => view,
        }
    }

    pub fn is_replaced(&self) -> bool {
        matches!(self, Self::Replaced(_))
    }
}

/// Holds the currently published [`ProjectView`].
///
/// Readers clone the `Arc` and keep using it for as long as they like; a
/// reload swaps in a new view only after it has loaded completely, so a
/// failed reload leaves the previous one in place.
#[derive(Debug, Default)]
pub struct SessionHost {
    current: RwLock<Option<(u64, Arc<ProjectView>)>>,
    /// Serializes loads so one token is never loaded twice at once.
    loading: Mutex<()>,
}

impl SessionHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Arc<ProjectView>> {
        self.current.read().as_ref().map(|(_, view)| Arc::clone(view))
    }

    /// Token of the published view.
    pub fn token(&self) -> Option<u64> {
        self.current.read().as_ref().map(|(token, _)| *token)
    }

    fn published(&self, token: u64) -> Option<Arc<ProjectView>> {
        match self.current.read().as_ref() {
            Some((current, view)) if *current == token => Some(Arc::clone(view)),
            _ => None,
        }
    }

    /// Load `path` unless the published view was loaded under `token`.
    ///
    /// On error nothing is published and the previous view stays current.
    pub fn load_if_stale(&self, token: u64, path: impl AsRef<Path>, options: &LoadOptions) -> Result<Reload> {
        if let Some(view) = self.published(token) {
            return Ok(Reload::Current(view));
        }
        let _guard = self.loading.lock();
        if let Some(view) = self.published(token) {
            return Ok(Reload::Current(view));
        }

        let view = Session::load(path, options)?.into_view();
        *self.current.write() = Some((token, Arc::clone(&view)));
        tracing::debug!(token, "session_published");
        Ok(Reload::Replaced(view))
    }

    /// Drop the published view. Readers holding it are unaffected.
    pub fn clear(&self) {
        *self.current.write() = None;
    }
}
