use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ConnectionDone,
    ConnectionLost,
    ConnectFailed,
    NotConnected,
    Unsupported,
    Closed,
    Disconnected,
    Protocol,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The connection was closed cleanly by either side.
    #[error("Connection was closed cleanly")]
    ConnectionDone,

    /// The connection dropped with a reason.
    #[error("Connection lost: {0}")]
    ConnectionLost(#[source] io::Error),

    /// The connect attempt failed before a handle was produced.
    #[error("Connection failed: {0}")]
    ConnectFailed(#[source] io::Error),

    /// No connection handle exists yet.
    #[error("Not connected")]
    NotConnected,

    /// Neither the bridge nor its handle supports the requested capability.
    #[error("Neither {bridge} nor {handle} supports {capability}")]
    Unsupported {
        bridge: &'static str,
        handle: &'static str,
        capability: &'static str,
    },

    /// The transport is closed and can not accept commands.
    #[error("Transport is closed")]
    Closed,

    /// The exchange channel has no sender left and nothing more to deliver.
    #[error("Exchange channel disconnected")]
    Disconnected,

    #[error("Protocol violation: {0}")]
    Protocol(&'static str),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ConnectionDone => ErrorKind::ConnectionDone,
            Error::ConnectionLost(_) => ErrorKind::ConnectionLost,
            Error::ConnectFailed(_) => ErrorKind::ConnectFailed,
            Error::NotConnected => ErrorKind::NotConnected,
            Error::Unsupported { .. } => ErrorKind::Unsupported,
            Error::Closed => ErrorKind::Closed,
            Error::Disconnected => ErrorKind::Disconnected,
            Error::Protocol(_) => ErrorKind::Protocol,
        }
    }

    /// Builds an `Unsupported` error for a capability missing on the handle alone.
    pub fn unsupported<H: ?Sized>(capability: &'static str) -> Self {
        Error::Unsupported {
            bridge: "",
            handle: std::any::type_name::<H>(),
            capability,
        }
    }

    /// True for the clean-closure marker, which callers see as end of stream.
    pub fn is_clean_close(&self) -> bool {
        matches!(self, Error::ConnectionDone)
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        let kind = match err.kind() {
            ErrorKind::ConnectionDone => io::ErrorKind::UnexpectedEof,
            ErrorKind::ConnectionLost => io::ErrorKind::ConnectionReset,
            ErrorKind::ConnectFailed => io::ErrorKind::ConnectionRefused,
            ErrorKind::NotConnected => io::ErrorKind::NotConnected,
            ErrorKind::Unsupported => io::ErrorKind::Unsupported,
            ErrorKind::Closed | ErrorKind::Disconnected => io::ErrorKind::BrokenPipe,
            ErrorKind::Protocol => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(Error::NotConnected.kind(), ErrorKind::NotConnected);
        let lost = Error::ConnectionLost(io::Error::other("boom"));
        assert_eq!(lost.kind(), ErrorKind::ConnectionLost);
        assert!(!lost.is_clean_close());
        assert!(Error::ConnectionDone.is_clean_close());
    }

    #[test]
    fn test_unsupported_names_both_sides() {
        let err = Error::Unsupported {
            bridge: "Bridge",
            handle: "Handle",
            capability: "peer_addr",
        };
        assert_eq!(err.to_string(), "Neither Bridge nor Handle supports peer_addr");
    }

    #[test]
    fn test_into_io_error() {
        let err: io::Error = Error::NotConnected.into();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
        let err: io::Error = Error::ConnectFailed(io::Error::other("refused")).into();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionRefused);
    }
}
