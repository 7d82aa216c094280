//! Events from the remote-sync collaborator.

/// Connection events published by the remote-sync channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteEvent {
    /// The remote session was established.
    Connected,
    /// The remote session ended. Local trust in the password ends with it.
    Disconnected,
}
