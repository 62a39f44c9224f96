use std::sync::Arc;
use std::time::Duration;

use shared::repositories::launch_service::LaunchService;
use shared::repositories::matchmaking_client::InProcessMatchmaker;
use shared::repositories::platform_authenticator::PlatformAuthenticator;
use shared::repositories::server_pool::ServerPool;
use shared::repositories::session_directory::SessionDirectory;
use shared::services::auth_service::AuthService;
use shared::services::dedicated_server_service::DedicatedServerService;
use shared::services::matchmaking_service::MatchmakingService;
use shared::services::message_service::MessageService;
use shared::services::response_service::ResponseService;
use shared::services::session_executor::SessionExecutor;

#[derive(Clone)]
pub struct AppState {
    pub message_service: MessageService,
    pub dedicated_server_service: Arc<DedicatedServerService>,
}

impl AppState {
    pub fn new(
        sessions: Arc<dyn SessionDirectory + Send + Sync>,
        launcher: Arc<dyn LaunchService + Send + Sync>,
        authenticator: Arc<dyn PlatformAuthenticator + Send + Sync>,
        process_args: Vec<String>,
        matchmaking_timeout: Option<Duration>,
    ) -> Self {
        let executor = SessionExecutor::new();
        let responses = ResponseService::new(sessions.clone());

        let dedicated_server_service = Arc::new(DedicatedServerService::new(
            launcher,
            Arc::new(ServerPool::new()),
            responses.clone(),
            process_args,
        ));
        let matchmaker = Arc::new(InProcessMatchmaker::new(
            dedicated_server_service.clone(),
            matchmaking_timeout,
        ));

        let auth_service = AuthService::new(sessions.clone(), authenticator, responses.clone());
        let matchmaking_service = MatchmakingService::new(
            sessions.clone(),
            matchmaker,
            dedicated_server_service.clone(),
            responses.clone(),
            executor.clone(),
        );
        let message_service = MessageService::new(
            sessions,
            executor,
            responses,
            auth_service,
            matchmaking_service,
        );

        AppState {
            message_service,
            dedicated_server_service,
        }
    }
}
