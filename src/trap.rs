use crate::oid::{ObjectIdentifierExt, ParseObjectIdentifierError};
use rasn::prelude::ObjectIdentifier;
use rasn_smi::v2::{ObjectSyntax, SimpleSyntax};
use rasn_snmp::v2::{VarBind, VarBindValue};
use std::net::Ipv4Addr;

/// `SNMPv2-MIB::sysUpTime.0`
pub const SYS_UP_TIME: &str = "1.3.6.1.2.1.1.3.0";

/// `SNMPv2-MIB::snmpTrapOID.0`
pub const SNMP_TRAP_OID: &str = "1.3.6.1.6.3.1.1.4.1.0";

/// `SNMP-COMMUNITY-MIB::snmpTrapAddress.0`, the v2c home of the v1 agent-addr.
pub const SNMP_TRAP_ADDRESS: &str = "1.3.6.1.6.3.18.1.3.0";

/// `SNMPv2-MIB::coldStart`
pub const COLD_START: &str = "1.3.6.1.6.3.1.1.5.1";

/// The caller-supplied part of a notification. The session wraps these
/// bindings with `sysUpTime.0` in front and `snmpTrapAddress.0` behind when
/// it builds the wire message, so a single [`TrapPdu`] can be sent any number
/// of times unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrapPdu {
    /// Sent as `snmpTrapAddress.0`. SNMPv2-Trap-PDU has no agent-addr field,
    /// and plain v2c senders usually drop the address altogether.
    pub agent_address: Ipv4Addr,
    pub variables: Vec<VarBind>,
}

impl TrapPdu {
    /// A notification carrying only `snmpTrapOID.0 = trap_oid`.
    pub fn new(trap_oid: &str, agent_address: Ipv4Addr) -> Result<Self, ParseObjectIdentifierError> {
        Ok(Self {
            agent_address,
            variables: vec![VarBind {
                name: ObjectIdentifier::parse(SNMP_TRAP_OID)?,
                value: VarBindValue::Value(ObjectSyntax::Simple(SimpleSyntax::ObjectId(
                    ObjectIdentifier::parse(trap_oid)?,
                ))),
            }],
        })
    }

    /// The generic coldStart notification.
    pub fn cold_start(agent_address: Ipv4Addr) -> Result<Self, ParseObjectIdentifierError> {
        Self::new(COLD_START, agent_address)
    }

    /// Returns the notification OID bound to `snmpTrapOID.0`, if present.
    pub fn trap_oid(&self) -> Option<&ObjectIdentifier> {
        trap_oid(&self.variables)
    }
}

/// Finds the `snmpTrapOID.0` value in a list of bindings.
pub fn trap_oid(bindings: &[VarBind]) -> Option<&ObjectIdentifier> {
    let name = ObjectIdentifier::parse(SNMP_TRAP_OID).ok()?;
    bindings.iter().find_map(|binding| match &binding.value {
        VarBindValue::Value(ObjectSyntax::Simple(SimpleSyntax::ObjectId(oid)))
            if binding.name == name =>
        {
            Some(oid)
        }
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cold_start_binds_trap_oid() {
        let trap = TrapPdu::cold_start(Ipv4Addr::LOCALHOST).unwrap();
        assert_eq!(trap.variables.len(), 1);
        assert_eq!(
            trap.variables[0].name,
            ObjectIdentifier::parse(SNMP_TRAP_OID).unwrap()
        );
        assert_eq!(
            trap.trap_oid(),
            Some(&ObjectIdentifier::parse(COLD_START).unwrap())
        );
    }

    #[test]
    fn invalid_trap_oid_is_rejected() {
        assert!(TrapPdu::new("1.3.x", Ipv4Addr::LOCALHOST).is_err());
    }
}
