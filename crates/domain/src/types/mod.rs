//! Domain types exchanged with the remote record service

pub mod record;
pub mod remote;
pub mod results;
pub mod session;

pub use record::{NullableFields, Record};
pub use remote::{FaultKind, RemoteError, RemoteFault};
pub use results::{BatchOutcome, ItemResult, OperationResult, QueryResult, UpsertResult};
pub use session::{LoginResult, Session, SessionHandle, UserIdentity};
