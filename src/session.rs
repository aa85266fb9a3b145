use crate::dispatcher::{DispatchError, SessionDispatcher};
use crate::oid::ParseObjectIdentifierError;
use rand::Rng;
use rasn::{ber, Encode};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::io;
use tokio::net::{lookup_host, UdpSocket};
use tokio::time::Instant;
use tracing::debug;

/// Restricts a session to a specific version of SNMP and provides the necessary
/// message and option types supported by that version of SNMP.
pub(super) trait VersionedSession {
    /// The type of SNMP message used by this version of SNMP. An SNMPv2c session
    /// for example would use the [`rasn_snmp::v2c::Message`] type.
    type Message;

    /// The options required to use this version of SNMP. For SNMPv2c this is
    /// the community string.
    type Options;
}

/// Options required to create an SNMP session generic over the SNMP version-specific
/// options.
pub struct SessionOptions<O> {
    pub target: SocketAddr,
    pub timeout: Duration,
    pub snmp: O,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("connecting to {target}: {source}")]
    Connection { target: String, source: io::Error },

    #[error("invalid object identifier: {0}")]
    InvalidObjectIdentifier(ParseObjectIdentifierError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("encoding error: {0}")]
    EncodingError(ber::enc::EncodeError),

    #[error("message too large: {0} bytes")]
    MessageTooLarge(usize),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl From<DispatchError> for Error {
    fn from(value: DispatchError) -> Self {
        match value {
            DispatchError::Io(err) => Error::Io(err),
            DispatchError::Encoding(err) => Error::EncodingError(err),
            DispatchError::TooLarge(len) => Error::MessageTooLarge(len),
            DispatchError::Timeout(after) => Error::Timeout(after),
        }
    }
}

/// A session owns its socket exclusively. Dropping the session closes it.
pub struct Session<Version: VersionedSession> {
    pub(super) inner: SessionInner<Version>,
}

pub(super) struct SessionInner<Version: VersionedSession> {
    /// Dispatcher is responsible for encoding and sending SNMP messages.
    pub(super) dispatcher: SessionDispatcher,

    /// The next request ID to use. Each message takes one with [`AtomicI32::fetch_add`].
    /// The sequence starts at a random positive value, wrapping back to 1.
    pub(super) request_id: AtomicI32,

    /// When the session was opened. Used as the agent's `sysUpTime` origin.
    pub(super) started: Instant,

    /// SNMP options to send in each of the SNMP messages (i.e. community string).
    pub(super) options: SessionOptions<Version::Options>,
}

impl<V: VersionedSession> Session<V> {
    /// Returns the next request ID to use for an SNMP message.
    pub(super) fn next_request_id(&self) -> i32 {
        let id = self.inner.request_id.fetch_add(1, Ordering::SeqCst);
        if id <= 0 {
            self.inner.request_id.store(2, Ordering::SeqCst);
            1
        } else {
            id
        }
    }

    /// Hundredths of a second since the session was opened, as carried by
    /// `sysUpTime.0`. Wraps like the 32-bit TimeTicks counter does.
    pub(super) fn uptime_ticks(&self) -> u32 {
        (self.inner.started.elapsed().as_millis() / 10) as u32
    }

    /// The resolved address this session sends to.
    pub fn target(&self) -> SocketAddr {
        self.inner.dispatcher.target()
    }
}

impl<V: VersionedSession> Session<V>
where
    V::Message: Encode,
{
    pub(super) async fn new(options: SessionOptions<V::Options>) -> io::Result<Session<V>> {
        let local = match options.target {
            SocketAddr::V4(_) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            SocketAddr::V6(_) => SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)),
        };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(options.target).await?;
        debug!(local = %socket.local_addr()?, peer = %options.target, "opened session");
        let dispatcher = SessionDispatcher::new(socket, options.target, options.timeout);
        Ok(Self {
            inner: SessionInner {
                dispatcher,
                options,
                started: Instant::now(),
                request_id: AtomicI32::new(rand::thread_rng().gen_range(1..i32::MAX / 2)),
            },
        })
    }

    /// Sends a message that expects no response.
    pub(super) async fn send(&self, message: &V::Message) -> Result<(), Error> {
        Ok(self.inner.dispatcher.send(message).await?)
    }
}

/// Resolves `host:port` to the first address the resolver returns. IP
/// literals are used as-is.
pub(super) async fn resolve(host: &str, port: u16) -> Result<SocketAddr, Error> {
    let connection = |source: io::Error| Error::Connection {
        target: format!("{host}:{port}"),
        source,
    };
    lookup_host((host, port))
        .await
        .map_err(connection)?
        .next()
        .ok_or_else(|| {
            connection(io::Error::new(
                io::ErrorKind::NotFound,
                "no addresses resolved",
            ))
        })
}
