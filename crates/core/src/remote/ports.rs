//! Port interface for the remote record service stub
//!
//! The wire encoding lives behind this trait. Implementations report
//! call-level failures as [`RemoteFault`]; per-item failures come back inside
//! the result sequences.

use std::fmt;

use async_trait::async_trait;
use forcelink_domain::{
    LoginResult, OperationResult, QueryResult, Record, RemoteFault, Session, TransportOptions,
    UpsertResult,
};

/// Credentials and connection parameters for one login exchange.
#[derive(Clone, Copy)]
pub struct LoginRequest<'a> {
    pub endpoint: &'a str,
    pub username: &'a str,
    /// Password followed by the security token
    pub secret: &'a str,
    pub transport: TransportOptions,
}

impl fmt::Debug for LoginRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("secret", &"***")
            .field("transport", &self.transport)
            .finish()
    }
}

/// Remote record service reached over a session-based protocol.
///
/// Every call except `login` carries the session it runs under. Result
/// sequences must match the input sequence in length and order.
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Exchange credentials for a session handle.
    async fn login(&self, request: LoginRequest<'_>) -> Result<LoginResult, RemoteFault>;

    /// Invalidate the session remotely.
    async fn logout(&self, session: &Session) -> Result<(), RemoteFault>;

    async fn create(
        &self,
        session: &Session,
        records: &[Record],
    ) -> Result<Vec<OperationResult>, RemoteFault>;

    async fn update(
        &self,
        session: &Session,
        records: &[Record],
    ) -> Result<Vec<OperationResult>, RemoteFault>;

    /// Insert or update, matching existing records on `external_id_field`.
    async fn upsert(
        &self,
        session: &Session,
        external_id_field: &str,
        records: &[Record],
    ) -> Result<Vec<UpsertResult>, RemoteFault>;

    async fn delete(
        &self,
        session: &Session,
        ids: &[String],
    ) -> Result<Vec<OperationResult>, RemoteFault>;

    async fn query(&self, session: &Session, query: &str) -> Result<QueryResult, RemoteFault>;
}
