//! Wire types for the qBittorrent application preferences.
//!
//! Only the fields this crate manages are modeled. Decoding ignores every other preference and
//! updates serialize only the fields being changed, so unrelated server settings are never
//! overwritten.

use serde::{Deserialize, Serialize};

/// The subset of `GET /api/v2/app/preferences` that is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub(crate) struct Preferences {
    /// Port on which qBittorrent listens for incoming torrent connections.
    pub(crate) listen_port: u16,
}

/// Partial update payload for `POST /api/v2/app/setPreferences`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct PreferencesUpdate {
    pub(crate) listen_port: u16,
}
