mod dispatcher;
pub mod emitter;
mod oid;
mod session;
mod session_v2;
pub mod trap;

pub use oid::{ObjectIdentifierExt, ParseObjectIdentifierError};
pub use session::{Error, Session, SessionOptions};
pub mod v2 {
    pub use crate::session_v2::{connect, V2Options, RETRIES, TIMEOUT, V2};
}
