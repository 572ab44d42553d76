//! Test doubles for the remote service and the session holder
//!
//! Available to this crate's unit tests and, behind the `test-utils`
//! feature, to downstream integration tests.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use forcelink_domain::{
    ClientConfig, ForceLinkError, LoginResult, OperationResult, QueryResult, Record, RemoteFault,
    Result, Session, SessionHandle, UpsertResult, UserIdentity,
};
use parking_lot::Mutex;
use url::Url;

use crate::remote::{LoginRequest, RemoteService};
use crate::session::{SessionProvider, NO_GENERATION};

const INSTANCE_URL: &str = "https://instance.example.com/services/Soap/c/20.0";

/// Configuration pointing at a fictitious login endpoint.
pub fn test_config() -> ClientConfig {
    ClientConfig::new(
        "https://login.example.com/services/Soap/c/20.0",
        "integration@example.com",
        "secret",
    )
    .with_security_token("TOKEN")
}

/// Login result as the scripted remote would issue it for login `n`.
pub fn test_login(n: u64) -> LoginResult {
    LoginResult {
        handle: SessionHandle::new(format!("token-{n}")),
        server_url: instance_url(),
        user: UserIdentity {
            user_id: "005000000000001".to_string(),
            user_name: "integration@example.com".to_string(),
            full_name: Some("Integration User".to_string()),
            organization_id: Some("00D000000000001".to_string()),
            organization_name: Some("Example Org".to_string()),
            ..UserIdentity::default()
        },
    }
}

/// Session of the given generation, not issued by any remote.
pub fn test_session(generation: u64) -> Session {
    Session::new(test_login(generation), generation)
}

fn instance_url() -> Url {
    Url::parse(INSTANCE_URL).expect("instance URL is valid")
}

/// One call observed by [`ScriptedRemote`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCall {
    /// `login`, `logout`, `create`, `update`, `upsert:<field>`, `delete`,
    /// `query`
    pub operation: String,
    /// Raw handle of the session the call ran under
    pub handle: Option<String>,
    pub items: usize,
}

#[derive(Default)]
struct ScriptState {
    logins: u64,
    next_id: u64,
    login_replies: VecDeque<std::result::Result<(), RemoteFault>>,
    logout_replies: VecDeque<std::result::Result<(), RemoteFault>>,
    create_replies: VecDeque<std::result::Result<Vec<OperationResult>, RemoteFault>>,
    update_replies: VecDeque<std::result::Result<Vec<OperationResult>, RemoteFault>>,
    upsert_replies: VecDeque<std::result::Result<Vec<UpsertResult>, RemoteFault>>,
    delete_replies: VecDeque<std::result::Result<Vec<OperationResult>, RemoteFault>>,
    query_replies: VecDeque<std::result::Result<QueryResult, RemoteFault>>,
    issued: Vec<String>,
    expired: HashSet<String>,
    calls: Vec<RemoteCall>,
}

impl ScriptState {
    fn record(&mut self, operation: impl Into<String>, session: Option<&Session>, items: usize) {
        self.calls.push(RemoteCall {
            operation: operation.into(),
            handle: session.map(|s| s.handle().expose().to_string()),
            items,
        });
    }

    fn check_session(&self, session: &Session) -> std::result::Result<(), RemoteFault> {
        if self.expired.contains(session.handle().expose()) {
            Err(RemoteFault::invalid_session("Invalid Session ID found in SessionHeader"))
        } else {
            Ok(())
        }
    }

    fn next_ids(&mut self, count: usize) -> Vec<String> {
        (0..count)
            .map(|_| {
                self.next_id += 1;
                format!("id-{}", self.next_id)
            })
            .collect()
    }
}

/// In-memory remote service replaying canned replies.
///
/// Each operation pops its next scripted reply; with none queued, every item
/// succeeds (upserts report `created`) and queries return an empty, done
/// result set. Logins issue `token-<n>` handles; calls under an expired
/// handle fail with an invalid-session fault.
pub struct ScriptedRemote {
    state: Mutex<ScriptState>,
    login_delay: Duration,
    call_delay: Duration,
}

impl Default for ScriptedRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedRemote {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ScriptState::default()),
            login_delay: Duration::ZERO,
            call_delay: Duration::ZERO,
        }
    }

    /// Delay every login, so concurrent refreshes overlap.
    pub fn with_login_delay(mut self, delay: Duration) -> Self {
        self.login_delay = delay;
        self
    }

    /// Delay every data call.
    pub fn with_call_delay(mut self, delay: Duration) -> Self {
        self.call_delay = delay;
        self
    }

    pub fn push_login(&self, reply: std::result::Result<(), RemoteFault>) {
        self.state.lock().login_replies.push_back(reply);
    }

    pub fn push_logout(&self, reply: std::result::Result<(), RemoteFault>) {
        self.state.lock().logout_replies.push_back(reply);
    }

    pub fn push_create(&self, reply: std::result::Result<Vec<OperationResult>, RemoteFault>) {
        self.state.lock().create_replies.push_back(reply);
    }

    pub fn push_update(&self, reply: std::result::Result<Vec<OperationResult>, RemoteFault>) {
        self.state.lock().update_replies.push_back(reply);
    }

    pub fn push_upsert(&self, reply: std::result::Result<Vec<UpsertResult>, RemoteFault>) {
        self.state.lock().upsert_replies.push_back(reply);
    }

    pub fn push_delete(&self, reply: std::result::Result<Vec<OperationResult>, RemoteFault>) {
        self.state.lock().delete_replies.push_back(reply);
    }

    pub fn push_query(&self, reply: std::result::Result<QueryResult, RemoteFault>) {
        self.state.lock().query_replies.push_back(reply);
    }

    /// Invalidate every handle issued so far.
    pub fn expire_all_sessions(&self) {
        let mut state = self.state.lock();
        let issued = state.issued.clone();
        state.expired.extend(issued);
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.state.lock().calls.clone()
    }

    /// Calls of one operation, in order.
    pub fn calls_of(&self, operation: &str) -> Vec<RemoteCall> {
        self.state.lock().calls.iter().filter(|c| c.operation == operation).cloned().collect()
    }

    pub fn logins(&self) -> u64 {
        self.state.lock().logins
    }

    pub fn logouts(&self) -> usize {
        self.calls_of("logout").len()
    }

    async fn delay(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl RemoteService for ScriptedRemote {
    async fn login(
        &self,
        request: LoginRequest<'_>,
    ) -> std::result::Result<LoginResult, RemoteFault> {
        self.delay(self.login_delay).await;
        let mut state = self.state.lock();
        state.record("login", None, 0);
        if let Some(Err(fault)) = state.login_replies.pop_front() {
            return Err(fault);
        }
        state.logins += 1;
        let mut login = test_login(state.logins);
        login.user.user_name = request.username.to_string();
        state.issued.push(login.handle.expose().to_string());
        Ok(login)
    }

    async fn logout(&self, session: &Session) -> std::result::Result<(), RemoteFault> {
        let mut state = self.state.lock();
        state.record("logout", Some(session), 0);
        state.logout_replies.pop_front().unwrap_or(Ok(()))
    }

    async fn create(
        &self,
        session: &Session,
        records: &[Record],
    ) -> std::result::Result<Vec<OperationResult>, RemoteFault> {
        self.delay(self.call_delay).await;
        let mut state = self.state.lock();
        state.record("create", Some(session), records.len());
        state.check_session(session)?;
        match state.create_replies.pop_front() {
            Some(reply) => reply,
            None => {
                Ok(state.next_ids(records.len()).into_iter().map(OperationResult::succeeded).collect())
            }
        }
    }

    async fn update(
        &self,
        session: &Session,
        records: &[Record],
    ) -> std::result::Result<Vec<OperationResult>, RemoteFault> {
        self.delay(self.call_delay).await;
        let mut state = self.state.lock();
        state.record("update", Some(session), records.len());
        state.check_session(session)?;
        match state.update_replies.pop_front() {
            Some(reply) => reply,
            None => Ok(records
                .iter()
                .map(|r| OperationResult::succeeded(r.id().unwrap_or_default()))
                .collect()),
        }
    }

    async fn upsert(
        &self,
        session: &Session,
        external_id_field: &str,
        records: &[Record],
    ) -> std::result::Result<Vec<UpsertResult>, RemoteFault> {
        self.delay(self.call_delay).await;
        let mut state = self.state.lock();
        state.record(format!("upsert:{external_id_field}"), Some(session), records.len());
        state.check_session(session)?;
        match state.upsert_replies.pop_front() {
            Some(reply) => reply,
            None => {
                Ok(state.next_ids(records.len()).into_iter().map(UpsertResult::created).collect())
            }
        }
    }

    async fn delete(
        &self,
        session: &Session,
        ids: &[String],
    ) -> std::result::Result<Vec<OperationResult>, RemoteFault> {
        self.delay(self.call_delay).await;
        let mut state = self.state.lock();
        state.record("delete", Some(session), ids.len());
        state.check_session(session)?;
        match state.delete_replies.pop_front() {
            Some(reply) => reply,
            None => Ok(ids.iter().map(OperationResult::succeeded).collect()),
        }
    }

    async fn query(
        &self,
        session: &Session,
        _query: &str,
    ) -> std::result::Result<QueryResult, RemoteFault> {
        self.delay(self.call_delay).await;
        let mut state = self.state.lock();
        state.record("query", Some(session), 0);
        state.check_session(session)?;
        state
            .query_replies
            .pop_front()
            .unwrap_or_else(|| Ok(QueryResult { done: true, ..QueryResult::default() }))
    }
}

#[derive(Default)]
struct CountingState {
    current: Option<Arc<Session>>,
    generation: u64,
    stale: Vec<u64>,
    refresh_error: Option<ForceLinkError>,
}

/// Session provider that counts refreshes instead of logging in.
#[derive(Default)]
pub struct CountingSessions {
    state: Mutex<CountingState>,
}

impl CountingSessions {
    /// No session yet.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Session of generation 1 in place.
    pub fn established() -> Self {
        let sessions = Self::default();
        {
            let mut state = sessions.state.lock();
            state.generation = 1;
            state.current = Some(Arc::new(test_session(1)));
        }
        sessions
    }

    /// Every refresh fails with `error`.
    pub fn failing_refresh(self, error: ForceLinkError) -> Self {
        self.state.lock().refresh_error = Some(error);
        self
    }

    pub fn refreshes(&self) -> u32 {
        u32::try_from(self.state.lock().stale.len()).unwrap_or(u32::MAX)
    }

    /// Generations reported stale, one per refresh.
    pub fn stale_generations(&self) -> Vec<u64> {
        self.state.lock().stale.clone()
    }
}

#[async_trait]
impl SessionProvider for CountingSessions {
    async fn current_session(&self) -> Result<Arc<Session>> {
        self.state.lock().current.clone().ok_or_else(ForceLinkError::no_session)
    }

    async fn refresh_after(&self, stale_generation: u64) -> Result<Arc<Session>> {
        let mut state = self.state.lock();
        state.stale.push(stale_generation);
        if let Some(error) = state.refresh_error.clone() {
            return Err(error);
        }
        if stale_generation != NO_GENERATION && state.generation > stale_generation {
            if let Some(current) = state.current.clone() {
                return Ok(current);
            }
        }
        state.generation += 1;
        let session = Arc::new(test_session(state.generation));
        state.current = Some(session.clone());
        Ok(session)
    }
}
