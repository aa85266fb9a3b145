use crate::oid::ObjectIdentifierExt;
use crate::session::{self, Error, Session, SessionOptions, VersionedSession};
use crate::trap::{TrapPdu, SNMP_TRAP_ADDRESS, SYS_UP_TIME};
use rasn::prelude::{ObjectIdentifier, OctetString};
use rasn_smi::v1::{IpAddress, TimeTicks};
use rasn_smi::v2::{ApplicationSyntax, ObjectSyntax};
use rasn_snmp::v2::{Pdu, Pdus, Trap, VarBind, VarBindValue};
use rasn_snmp::v2c::Message;
use std::time::Duration;
use tokio::io;
use tracing::trace;

/// How long a single send may take before it is reported as failed.
pub const TIMEOUT: Duration = Duration::from_secs(2);

/// Failed sends are never retried.
pub const RETRIES: u32 = 0;

/// An implementation of [`VersionedSession`] for SNMPv2c.
pub struct V2;

impl VersionedSession for V2 {
    type Message = Message<Pdus>;
    type Options = V2Options;
}

pub struct V2Options {
    pub community: String,
}

/// Resolves `host` and opens an SNMPv2c session to it using the fixed
/// [`TIMEOUT`]. Any failure here is reported as [`Error::Connection`].
pub async fn connect(host: &str, port: u16, community: &str) -> Result<Session<V2>, Error> {
    let target = session::resolve(host, port).await?;
    Session::v2(SessionOptions {
        target,
        timeout: TIMEOUT,
        snmp: V2Options {
            community: community.to_string(),
        },
    })
    .await
    .map_err(|source| Error::Connection {
        target: target.to_string(),
        source,
    })
}

impl Session<V2> {
    /// Constructs a new SNMPv2c session.
    pub async fn v2(options: SessionOptions<V2Options>) -> io::Result<Session<V2>> {
        Self::new(options).await
    }

    /// Sends an SNMPv2-Trap-PDU. The wire bindings are `sysUpTime.0`, then
    /// the trap's own bindings, then `snmpTrapAddress.0` with the agent address.
    /// Nothing is awaited from the receiver.
    pub async fn send_trap(&self, trap: &TrapPdu) -> Result<(), Error> {
        let message = self.trap_message(trap)?;
        trace!(peer = %self.target(), "sending trap");
        self.send(&message).await
    }

    fn trap_message(&self, trap: &TrapPdu) -> Result<Message<Pdus>, Error> {
        let mut variable_bindings = Vec::with_capacity(trap.variables.len() + 2);
        variable_bindings.push(VarBind {
            name: ObjectIdentifier::parse(SYS_UP_TIME)?,
            value: VarBindValue::Value(ObjectSyntax::ApplicationWide(ApplicationSyntax::Ticks(
                TimeTicks(self.uptime_ticks()),
            ))),
        });
        variable_bindings.extend(trap.variables.iter().cloned());
        variable_bindings.push(VarBind {
            name: ObjectIdentifier::parse(SNMP_TRAP_ADDRESS)?,
            value: VarBindValue::Value(ObjectSyntax::ApplicationWide(
                ApplicationSyntax::Address(IpAddress(trap.agent_address.octets().into())),
            )),
        });

        Ok(Message {
            version: 1.into(),
            community: OctetString::from(self.inner.options.snmp.community.clone()),
            data: Pdus::Trap(Trap(Pdu {
                request_id: self.next_request_id(),
                error_status: Default::default(),
                error_index: Default::default(),
                variable_bindings,
            })),
        })
    }
}
