use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

use shared::models::match_type::MatchType;
use shared::models::matchmaking::PlayerEntry;
use shared::models::response::{CANCEL_MATCH_MESSAGE, LOGIN_MESSAGE, MATCH_MESSAGE};
use shared::models::session::SessionId;
use shared::repositories::errors::platform_auth_errors::PlatformAuthError;
use shared::repositories::errors::server_pool_errors::ServerPoolError;
use shared::repositories::launch_service::{JoinRequest, LaunchRequest, LaunchService};
use shared::repositories::matchmaking_client::{
    CancelOutcome, InProcessMatchmaker, MatchOutcome, MatchmakingClient,
};
use shared::repositories::platform_authenticator::PlatformAuthenticator;
use shared::repositories::server_pool::ServerPool;
use shared::repositories::session_directory::{
    ChannelMessageSink, LocalSessionDirectory, OutboundMessage, SessionDirectory,
};
use shared::services::auth_service::AuthService;
use shared::services::dedicated_server_service::{default_process_args, DedicatedServerService};
use shared::services::errors::dedicated_server_service_errors::DedicatedServerServiceError;
use shared::services::matchmaking_service::MatchmakingService;
use shared::services::message_service::MessageService;
use shared::services::response_service::ResponseService;
use shared::services::session_executor::SessionExecutor;

#[derive(Default)]
struct FakeLauncher {
    failing: AtomicBool,
    spawned: Mutex<Vec<LaunchRequest>>,
    joined: Mutex<Vec<JoinRequest>>,
}

#[async_trait]
impl LaunchService for FakeLauncher {
    async fn spawn(&self, request: LaunchRequest) -> bool {
        if self.failing.load(Ordering::SeqCst) {
            return false;
        }
        self.spawned.lock().unwrap().push(request);
        true
    }

    async fn send_users(&self, request: JoinRequest) -> bool {
        if self.failing.load(Ordering::SeqCst) {
            return false;
        }
        self.joined.lock().unwrap().push(request);
        true
    }
}

struct GuestsOnly;

#[async_trait]
impl PlatformAuthenticator for GuestsOnly {
    async fn authenticate(
        &self,
        platform: &str,
        _account_id: &str,
        _access_token: &str,
    ) -> Result<(), PlatformAuthError> {
        Err(PlatformAuthError::UnsupportedPlatform(platform.to_string()))
    }
}

/// Counts cancels before handing them to the real queue.
struct CountingMatchmaker {
    inner: InProcessMatchmaker,
    cancels: AtomicUsize,
}

#[async_trait]
impl MatchmakingClient for CountingMatchmaker {
    async fn start(&self, match_type: MatchType, player: PlayerEntry) -> MatchOutcome {
        self.inner.start(match_type, player).await
    }

    async fn cancel(&self, match_type: MatchType, account_id: &str) -> CancelOutcome {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        self.inner.cancel(match_type, account_id).await
    }
}

struct Backend {
    messages: MessageService,
    dedicated_servers: Arc<DedicatedServerService>,
    sessions: Arc<LocalSessionDirectory>,
    launcher: Arc<FakeLauncher>,
    matchmaker: Arc<CountingMatchmaker>,
    outbound: mpsc::UnboundedReceiver<OutboundMessage>,
}

impl Backend {
    fn new(timeout: Option<Duration>) -> Self {
        let (sender, outbound) = mpsc::unbounded_channel();
        let sessions = Arc::new(LocalSessionDirectory::new(Arc::new(
            ChannelMessageSink::new(sender),
        )));
        let responses = ResponseService::new(sessions.clone());
        let executor = SessionExecutor::new();
        let launcher = Arc::new(FakeLauncher::default());
        let dedicated_servers = Arc::new(DedicatedServerService::new(
            launcher.clone(),
            Arc::new(ServerPool::new()),
            responses.clone(),
            default_process_args(),
        ));
        let matchmaker = Arc::new(CountingMatchmaker {
            inner: InProcessMatchmaker::new(dedicated_servers.clone(), timeout),
            cancels: AtomicUsize::new(0),
        });
        let auth = AuthService::new(sessions.clone(), Arc::new(GuestsOnly), responses.clone());
        let matchmaking = MatchmakingService::new(
            sessions.clone(),
            matchmaker.clone(),
            dedicated_servers.clone(),
            responses.clone(),
            executor.clone(),
        );
        let messages = MessageService::new(
            sessions.clone(),
            executor,
            responses,
            auth,
            matchmaking,
        );

        Backend {
            messages,
            dedicated_servers,
            sessions,
            launcher,
            matchmaker,
            outbound,
        }
    }

    async fn next_message(&mut self) -> OutboundMessage {
        tokio::time::timeout(Duration::from_secs(600), self.outbound.recv())
            .await
            .expect("no message arrived")
            .expect("sink closed")
    }

    async fn connect(&mut self, account_id: &str) -> SessionId {
        let session_id = SessionId::new();
        self.messages.session_opened(session_id);
        self.messages.handle_message(
            session_id,
            LOGIN_MESSAGE,
            json!({"account_id": account_id, "platform": "guest"}),
        );
        let reply = self.next_message().await;
        assert_eq!(reply.session_id, session_id);
        assert_eq!(reply.message_type, LOGIN_MESSAGE);
        assert_eq!(reply.envelope.error.code, 200);
        session_id
    }

    fn request_match(&self, session_id: SessionId, account_id: &str, match_type: i64) {
        self.messages.handle_message(
            session_id,
            MATCH_MESSAGE,
            json!({
                "account_id": account_id,
                "match_type": match_type,
                "user_data": {"level": 10, "mmr_score": 1000}
            }),
        );
    }
}

fn server_id_of(message: &OutboundMessage) -> Value {
    message.envelope.data["server_id"].clone()
}

#[tokio::test]
async fn test_one_vs_one_match_spawns_a_server_for_both_players() {
    let mut backend = Backend::new(None);
    let s1 = backend.connect("p1").await;
    let s2 = backend.connect("p2").await;

    backend.request_match(s1, "p1", 1);
    backend.request_match(s2, "p2", 1);

    let first = backend.next_message().await;
    let second = backend.next_message().await;
    for reply in [&first, &second] {
        assert_eq!(reply.message_type, MATCH_MESSAGE);
        assert_eq!(reply.envelope.error.code, 200);
        assert_eq!(reply.envelope.error.message, "OK");
        assert_eq!(reply.envelope.data["match_type"], json!(1));
    }
    assert_eq!(server_id_of(&first), server_id_of(&second));

    let spawned = backend.launcher.spawned.lock().unwrap().clone();
    assert_eq!(spawned.len(), 1);
    let mut accounts = spawned[0].account_ids.clone();
    accounts.sort();
    assert_eq!(accounts, vec!["p1", "p2"]);
    assert_eq!(spawned[0].user_data_list.len(), 2);
    assert_eq!(spawned[0].launch_data, json!({"match_type": 1}));
    assert_eq!(
        spawned[0].process_args,
        vec!["HighRise?game=FFA".to_string(), "-log".to_string()]
    );

    let server_id = spawned[0].group_id;
    let record = backend.dedicated_servers.pool().get(server_id).unwrap();
    assert_eq!(record.match_type, MatchType::OneVsOne);
    assert!(record.roster.is_empty());
}

#[tokio::test]
async fn test_full_server_rejects_extra_player_then_retires() {
    let mut backend = Backend::new(None);
    let s1 = backend.connect("p1").await;
    let s2 = backend.connect("p2").await;
    backend.request_match(s1, "p1", 1);
    backend.request_match(s2, "p2", 1);
    backend.next_message().await;
    backend.next_message().await;

    let server_id = backend.launcher.spawned.lock().unwrap()[0].group_id;
    let dedicated = &backend.dedicated_servers;
    dedicated.on_player_joined(server_id, "p1").unwrap();
    dedicated.on_player_joined(server_id, "p2").unwrap();

    let rejected = dedicated.on_player_joined(server_id, "p3");
    assert_eq!(
        rejected,
        Err(DedicatedServerServiceError::PoolError(
            ServerPoolError::CapacityExceeded {
                server_id,
                capacity: 2
            }
        ))
    );
    let roster = dedicated.pool().get(server_id).unwrap().roster;
    assert_eq!(roster.into_iter().collect::<Vec<_>>(), vec!["p1", "p2"]);

    dedicated.on_player_left(server_id, "p2");
    let retired = dedicated
        .on_result_posted(server_id, &json!({"winner": "blue"}), true)
        .unwrap();
    assert_eq!(retired.roster.len(), 1);
    assert!(dedicated.pool().is_empty());
}

#[tokio::test]
async fn test_no_matching_spawns_then_joins_running_server() {
    let mut backend = Backend::new(None);
    let s1 = backend.connect("p1").await;
    let s2 = backend.connect("p2").await;

    backend.request_match(s1, "p1", 0);
    let reply = backend.next_message().await;
    assert_eq!(reply.session_id, s1);
    assert_eq!(reply.envelope.error.code, 200);
    assert_eq!(reply.envelope.data["match_type"], json!(0));

    {
        let spawned = backend.launcher.spawned.lock().unwrap();
        assert_eq!(spawned.len(), 1);
        assert_eq!(spawned[0].account_ids, vec!["p1"]);
    }

    backend.request_match(s2, "p2", 0);
    for _ in 0..100 {
        if !backend.launcher.joined.lock().unwrap().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let joined = backend.launcher.joined.lock().unwrap().clone();
    assert_eq!(joined.len(), 1);
    assert_eq!(joined[0].account_ids, vec!["p2"]);
    assert_eq!(
        joined[0].server_id,
        backend.launcher.spawned.lock().unwrap()[0].group_id
    );
    assert_eq!(backend.launcher.spawned.lock().unwrap().len(), 1);
    // joining a running server sends nothing to the client
    assert!(backend.outbound.try_recv().is_err());
    assert_eq!(backend.matchmaker.cancels.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failed_spawn_reports_internal_error() {
    let mut backend = Backend::new(None);
    let s1 = backend.connect("p1").await;
    backend.launcher.failing.store(true, Ordering::SeqCst);

    backend.request_match(s1, "p1", 0);

    let reply = backend.next_message().await;
    assert_eq!(reply.envelope.error.code, 500);
    assert_eq!(reply.envelope.error.message, "Internal server error.");
    assert!(backend.dedicated_servers.pool().is_empty());
}

#[tokio::test]
async fn test_cancel_without_history_never_reaches_the_queue() {
    let mut backend = Backend::new(None);
    let s1 = backend.connect("p1").await;

    backend.messages.handle_message(
        s1,
        CANCEL_MATCH_MESSAGE,
        json!({"account_id": "p1", "match_type": 1}),
    );

    let reply = backend.next_message().await;
    assert_eq!(reply.message_type, CANCEL_MATCH_MESSAGE);
    assert_eq!(reply.envelope.error.code, 200);
    assert_eq!(reply.envelope.error.message, "OK.");
    assert_eq!(backend.matchmaker.cancels.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_cancel_removes_player_from_queue() {
    let mut backend = Backend::new(None);
    let s1 = backend.connect("p1").await;
    let s2 = backend.connect("p2").await;

    backend.request_match(s1, "p1", 1);
    backend.messages.handle_message(
        s1,
        CANCEL_MATCH_MESSAGE,
        json!({"account_id": "p1", "match_type": 1}),
    );
    let reply = backend.next_message().await;
    assert_eq!(reply.session_id, s1);
    assert_eq!(reply.envelope.error.message, "OK.");
    assert_eq!(backend.matchmaker.cancels.load(Ordering::SeqCst), 1);
    assert_eq!(backend.sessions.match_history(s1), None);

    // p2 waits alone instead of being matched with the cancelled p1
    backend.request_match(s2, "p2", 1);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(backend.launcher.spawned.lock().unwrap().is_empty());
    assert!(backend.outbound.try_recv().is_err());
}

#[tokio::test]
async fn test_closing_a_session_withdraws_its_request() {
    let mut backend = Backend::new(None);
    let s1 = backend.connect("p1").await;
    let s2 = backend.connect("p2").await;
    let s3 = backend.connect("p3").await;

    backend.request_match(s1, "p1", 1);
    backend.messages.session_closed(s1);
    for _ in 0..100 {
        if !backend.sessions.is_open(s1) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(backend.sessions.find_session("p1"), None);

    backend.request_match(s2, "p2", 1);
    backend.request_match(s3, "p3", 1);
    let first = backend.next_message().await;
    let second = backend.next_message().await;
    let mut sessions = vec![first.session_id, second.session_id];
    sessions.sort_by_key(|s| s.0);
    let mut expected = vec![s2, s3];
    expected.sort_by_key(|s| s.0);
    assert_eq!(sessions, expected);

    let spawned = backend.launcher.spawned.lock().unwrap();
    assert!(!spawned[0].account_ids.contains(&"p1".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_lonely_request_times_out() {
    let mut backend = Backend::new(Some(Duration::from_secs(60)));
    let s1 = backend.connect("p1").await;

    backend.request_match(s1, "p1", 6);

    let reply = backend.next_message().await;
    assert_eq!(reply.message_type, MATCH_MESSAGE);
    assert_eq!(reply.envelope.error.code, 400);
    assert_eq!(reply.envelope.error.message, "Timed out.");
    assert_eq!(backend.sessions.match_history(s1), None);
}

#[tokio::test]
async fn test_out_of_range_skill_values_keep_sessions_responsive() {
    let mut backend = Backend::new(None);
    let s1 = backend.connect("p1").await;
    let s2 = backend.connect("p2").await;

    backend.messages.handle_message(
        s1,
        MATCH_MESSAGE,
        json!({
            "account_id": "p1",
            "match_type": 1,
            "user_data": {"level": i64::MAX, "mmr_score": i64::MIN}
        }),
    );
    backend.request_match(s2, "p2", 1);
    backend.messages.handle_message(
        s2,
        CANCEL_MATCH_MESSAGE,
        json!({"account_id": "p2", "match_type": 1}),
    );

    let reply = backend.next_message().await;
    assert_eq!(reply.session_id, s2);
    assert_eq!(reply.message_type, CANCEL_MATCH_MESSAGE);
    assert_eq!(reply.envelope.error.code, 200);
    assert_eq!(reply.envelope.error.message, "OK.");
    assert_eq!(backend.sessions.match_history(s2), None);
    assert!(backend.launcher.spawned.lock().unwrap().is_empty());
}
