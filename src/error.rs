//! Error types for chatrelay.

use crate::session::SessionId;

/// Top-level error type for the chat core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Enqueue error: {0}")]
    Enqueue(#[from] EnqueueError),
}

/// Channel membership and lifecycle errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Session {session} has already joined channel {channel}")]
    AlreadyJoined {
        channel: String,
        session: SessionId,
    },

    #[error("Session {session} is not a member of channel {channel}")]
    NotAMember {
        channel: String,
        session: SessionId,
    },

    #[error("Channel {channel} is closed")]
    Closed { channel: String },

    #[error("Instance channel {channel} failed to detach from its directory: {source}")]
    Teardown {
        channel: String,
        #[source]
        source: DirectoryError,
    },
}

/// Channel registry errors.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("Channel {name} not found in directory")]
    NotFound { name: String },

    #[error("Channel name {name} is already registered")]
    NameTaken { name: String },
}

/// Errors raised when enqueueing a payload into a session's outbound queue.
#[derive(Debug, thiserror::Error)]
pub enum EnqueueError {
    #[error("Session outbound queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },

    #[error("Session outbound queue is closed")]
    QueueClosed,
}

/// Result type alias for the chat core.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    // --- ChannelError ---

    #[test]
    fn test_channel_error_already_joined_display() {
        let err = ChannelError::AlreadyJoined {
            channel: "#general".to_string(),
            session: SessionId(7),
        };
        let msg = err.to_string();
        assert!(msg.contains("#general"));
        assert!(msg.contains('7'));
        assert!(msg.contains("already joined"));
    }

    #[test]
    fn test_channel_error_not_a_member_display() {
        let err = ChannelError::NotAMember {
            channel: "#lobby".to_string(),
            session: SessionId(3),
        };
        let msg = err.to_string();
        assert!(msg.contains("#lobby"));
        assert!(msg.contains("not a member"));
    }

    #[test]
    fn test_channel_error_closed_display() {
        let err = ChannelError::Closed {
            channel: "#multi_12".to_string(),
        };
        assert!(err.to_string().contains("#multi_12"));
    }

    #[test]
    fn test_channel_error_teardown_carries_source() {
        let err = ChannelError::Teardown {
            channel: "#spec_4".to_string(),
            source: DirectoryError::NotFound {
                name: "#spec_4".to_string(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("#spec_4"));
        assert!(msg.contains("not found"));
    }

    // --- DirectoryError ---

    #[test]
    fn test_directory_error_not_found_display() {
        let err = DirectoryError::NotFound {
            name: "#nowhere".to_string(),
        };
        assert!(err.to_string().contains("#nowhere"));
    }

    #[test]
    fn test_directory_error_name_taken_display() {
        let err = DirectoryError::NameTaken {
            name: "#general".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("#general"));
        assert!(msg.contains("already registered"));
    }

    // --- EnqueueError ---

    #[test]
    fn test_enqueue_error_queue_full_display() {
        let err = EnqueueError::QueueFull { capacity: 64 };
        assert!(err.to_string().contains("64"));
    }

    #[test]
    fn test_enqueue_error_queue_closed_display() {
        let err = EnqueueError::QueueClosed;
        assert!(err.to_string().contains("closed"));
    }

    // --- From conversions into top-level Error ---

    #[test]
    fn test_error_from_channel_error() {
        let inner = ChannelError::Closed {
            channel: "#x".to_string(),
        };
        let err = Error::from(inner);
        assert!(err.to_string().contains("Channel error"));
    }

    #[test]
    fn test_error_from_directory_error() {
        let inner = DirectoryError::NotFound {
            name: "#x".to_string(),
        };
        let err = Error::from(inner);
        assert!(err.to_string().contains("Directory error"));
    }

    #[test]
    fn test_error_from_enqueue_error() {
        let inner = EnqueueError::QueueClosed;
        let err = Error::from(inner);
        assert!(err.to_string().contains("Enqueue error"));
    }

    // --- Debug trait ---

    #[test]
    fn test_error_debug_is_implemented() {
        let err = Error::Channel(ChannelError::Closed {
            channel: "#x".to_string(),
        });
        let debug = format!("{:?}", err);
        assert!(!debug.is_empty());
    }
}
