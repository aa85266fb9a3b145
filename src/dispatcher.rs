use rasn::ber::enc::EncoderOptions;
use rasn::error::EncodeError;
use rasn::{ber, Encode};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::io;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::{debug, trace};

/// The largest payload that fits in a single IPv4 UDP datagram.
const MAX_UDP_PACKET_SIZE: usize = 65507;

/// A dispatcher sends unacknowledged messages `M` over a connected UDP socket.
/// It is responsible for encoding the messages and bounding each write by the
/// session timeout.
pub(super) struct SessionDispatcher {
    socket: UdpSocket,
    target: SocketAddr,
    timeout: Duration,
}

/// An error that can occur when dispatching messages.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("encoding error: {0:?}")]
    Encoding(EncodeError),

    #[error("message of {0} bytes exceeds the UDP datagram limit")]
    TooLarge(usize),

    #[error("send timed out after {0:?}")]
    Timeout(Duration),
}

impl SessionDispatcher {
    pub(super) fn new(socket: UdpSocket, target: SocketAddr, timeout: Duration) -> Self {
        Self {
            socket,
            target,
            timeout,
        }
    }

    pub(super) fn target(&self) -> SocketAddr {
        self.target
    }

    /// Encodes and writes a message without waiting for any reply. The write
    /// fails with [`DispatchError::Timeout`] if it does not complete in time.
    pub(super) async fn send<M: Encode>(&self, message: &M) -> Result<(), DispatchError> {
        let bytes = encode_message(message).map_err(DispatchError::Encoding)?;
        if bytes.len() > MAX_UDP_PACKET_SIZE {
            return Err(DispatchError::TooLarge(bytes.len()));
        }
        let written = timeout(self.timeout, self.socket.send(&bytes))
            .await
            .map_err(|_| DispatchError::Timeout(self.timeout))??;
        trace!(bytes = written, peer = %self.target, "dispatched message");
        Ok(())
    }
}

impl Drop for SessionDispatcher {
    fn drop(&mut self) {
        debug!(peer = %self.target, "closing session socket");
    }
}

/// Encodes a message into a byte buffer using the BER encoding.
fn encode_message<M: Encode>(message: &M) -> Result<Vec<u8>, EncodeError> {
    let mut enc = ber::enc::Encoder::new(EncoderOptions::ber());
    message.encode(&mut enc)?;
    Ok(enc.output())
}
