use std::path::{Path, PathBuf};

use tracing::Dispatch;

use crate::error::EzcfgError;
use crate::store::ConfigStore;

/// Builder for a [`ConfigStore`].
///
/// ```ignore
/// let store = ConfigStore::builder()
///     .default_file("config/default.cfg")
///     .allow_vague(true)
///     .build()?;
/// ```
#[derive(Debug, Default)]
pub struct StoreBuilder {
    allow_vague: bool,
    default_file: Option<PathBuf>,
    logger: Option<Dispatch>,
}

impl StoreBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Let `set` assign a name declared in several sections to all of them.
    /// Reading such a name stays an error.
    pub fn allow_vague(mut self, allow: bool) -> Self {
        self.allow_vague = allow;
        self
    }

    /// File parsed by [`build`](Self::build). It defines the schema: every
    /// parameter it declares becomes known to the store.
    pub fn default_file(mut self, path: impl AsRef<Path>) -> Self {
        self.default_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Send the store's log events to `dispatch` instead of the global
    /// subscriber.
    pub fn logger(mut self, dispatch: Dispatch) -> Self {
        self.logger = Some(dispatch);
        self
    }

    pub fn build(self) -> Result<ConfigStore, EzcfgError> {
        let mut store = ConfigStore::with_options(self.allow_vague, self.logger);
        if let Some(path) = self.default_file {
            store.parse_with(&path, true)?;
        }
        Ok(store)
    }
}
