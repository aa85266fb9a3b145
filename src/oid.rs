use crate::session;
use rasn::prelude::ObjectIdentifier;
use std::num::ParseIntError;
use thiserror::Error;

pub trait ObjectIdentifierExt {
    fn parse(oid: impl AsRef<str>) -> Result<Self, ParseObjectIdentifierError>
    where
        Self: Sized;
}

impl ObjectIdentifierExt for ObjectIdentifier {
    /// Attempts to parse an [`ObjectIdentifier`] from a dotted string. A leading
    /// dot, as written by net-snmp tools, is accepted.
    ///
    /// # Example
    /// ```
    /// use rasn::prelude::ObjectIdentifier;
    /// use snmp_trapgen::ObjectIdentifierExt;
    ///
    /// let oid = ObjectIdentifier::parse("1.3.6.1.6.3.1.1.5.1").unwrap();
    /// assert_eq!(oid, ObjectIdentifier::parse(".1.3.6.1.6.3.1.1.5.1").unwrap());
    /// ```
    fn parse(oid: impl AsRef<str>) -> Result<Self, ParseObjectIdentifierError> {
        let parts = oid
            .as_ref()
            .trim_start_matches('.')
            .split('.')
            .map(|s| s.parse())
            .collect::<Result<Vec<u32>, _>>()?;
        ObjectIdentifier::new(parts).ok_or(ParseObjectIdentifierError::InvalidObjectIdentifier)
    }
}

#[derive(Debug, Error)]
pub enum ParseObjectIdentifierError {
    #[error("parsing sub-identifier: {0}")]
    ParsingSubIdentifier(#[from] ParseIntError),
    #[error("invalid object identifier")]
    InvalidObjectIdentifier,
}

impl From<ParseObjectIdentifierError> for session::Error {
    fn from(value: ParseObjectIdentifierError) -> Self {
        session::Error::InvalidObjectIdentifier(value)
    }
}
