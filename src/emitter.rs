//! The trap emission loop.
//!
//! An emitter owns one immutable [`EmitterConfig`], sends the same
//! [`TrapPdu`] `count` times over a [`TrapTransport`], and sleeps a fixed
//! `1000 / rate` milliseconds after every attempt, including the last one.
//! Failed sends are logged and counted but never stop the loop.

use crate::session::{Error, Session};
use crate::session_v2::{self, V2};
use crate::trap::TrapPdu;
use std::future::Future;
use std::net::Ipv4Addr;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

/// Everything needed for one run, fixed before the first send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitterConfig {
    pub target: String,
    pub port: u16,
    pub community: String,
    pub source_ip: Ipv4Addr,
    pub count: u32,
    pub rate: u32,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            target: "127.0.0.1".to_string(),
            port: 162,
            community: "public".to_string(),
            source_ip: Ipv4Addr::LOCALHOST,
            count: 1,
            rate: 1,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("rate must be at least 1 trap per second")]
    ZeroRate,
}

impl EmitterConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate == 0 {
            return Err(ConfigError::ZeroRate);
        }
        Ok(())
    }

    /// The pause after each send: `1000 / rate` whole milliseconds.
    pub fn interval(&self) -> Result<Duration, ConfigError> {
        self.validate()?;
        Ok(Duration::from_millis(u64::from(1000 / self.rate)))
    }
}

/// An error that stops a run before any trap is sent.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("connect failed: {0}")]
    Connect(#[source] Error),

    #[error("building trap: {0}")]
    Payload(#[source] Error),
}

/// The outcome of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitSummary {
    pub sent: u32,
    pub failed: u32,
    pub elapsed: Duration,
}

/// The one operation the emitter needs from a session.
pub trait TrapTransport {
    fn send_trap(&self, trap: &TrapPdu) -> impl Future<Output = Result<(), Error>> + Send;
}

impl TrapTransport for Session<V2> {
    async fn send_trap(&self, trap: &TrapPdu) -> Result<(), Error> {
        Session::<V2>::send_trap(self, trap).await
    }
}

/// Sends `config.count` copies of `trap` over `transport`.
///
/// Every iteration is attempted regardless of earlier failures. The returned
/// elapsed time includes the trailing sleep after the final send.
pub async fn emit<T: TrapTransport>(
    config: &EmitterConfig,
    transport: &T,
    trap: &TrapPdu,
) -> Result<EmitSummary, ConfigError> {
    let interval = config.interval()?;
    let started = Instant::now();
    let mut failed = 0;

    for i in 1..=config.count {
        if let Err(err) = transport.send_trap(trap).await {
            failed += 1;
            warn!(iteration = i, error = %err, "send_trap failed");
        }
        sleep(interval).await;
    }

    Ok(EmitSummary {
        sent: config.count - failed,
        failed,
        elapsed: started.elapsed(),
    })
}

/// Validates `config`, connects, sends the coldStart traps, and closes the
/// session again. `on_connected` runs once the session is open and before the
/// first send; a connect failure returns before it is called.
pub async fn run<F>(config: &EmitterConfig, on_connected: F) -> Result<EmitSummary, EmitError>
where
    F: FnOnce(&EmitterConfig),
{
    config.validate()?;
    let trap = TrapPdu::cold_start(config.source_ip).map_err(|e| EmitError::Payload(e.into()))?;
    let session = session_v2::connect(&config.target, config.port, &config.community)
        .await
        .map_err(EmitError::Connect)?;
    debug!(
        peer = %session.target(),
        timeout = ?session_v2::TIMEOUT,
        retries = session_v2::RETRIES,
        "connected"
    );
    on_connected(config);
    let summary = emit(config, &session, &trap).await?;
    drop(session);
    Ok(summary)
}
