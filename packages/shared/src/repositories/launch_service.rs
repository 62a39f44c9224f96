use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};
use uuid::Uuid;

#[cfg(test)]
use mockall::automock;

/// Launch parameters for a new dedicated server process.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaunchRequest {
    pub group_id: Uuid,
    pub launch_data: Value,
    pub process_args: Vec<String>,
    pub account_ids: Vec<String>,
    pub user_data_list: Vec<Value>,
}

impl LaunchRequest {
    /// # Panics
    ///
    /// Panics if `account_ids` and `user_data_list` differ in length; the two
    /// lists are matched by index on the other side.
    pub fn new(
        group_id: Uuid,
        launch_data: Value,
        process_args: Vec<String>,
        account_ids: Vec<String>,
        user_data_list: Vec<Value>,
    ) -> Self {
        assert_eq!(
            account_ids.len(),
            user_data_list.len(),
            "account_ids and user_data_list must be index aligned"
        );

        LaunchRequest {
            group_id,
            launch_data,
            process_args,
            account_ids,
            user_data_list,
        }
    }
}

/// Players to inject into a server that is already running.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinRequest {
    pub server_id: Uuid,
    pub launch_data: Value,
    pub account_ids: Vec<String>,
    pub user_data_list: Vec<Value>,
}

impl JoinRequest {
    /// # Panics
    ///
    /// Same alignment requirement as [`LaunchRequest::new`].
    pub fn new(
        server_id: Uuid,
        launch_data: Value,
        account_ids: Vec<String>,
        user_data_list: Vec<Value>,
    ) -> Self {
        assert_eq!(
            account_ids.len(),
            user_data_list.len(),
            "account_ids and user_data_list must be index aligned"
        );

        JoinRequest {
            server_id,
            launch_data,
            account_ids,
            user_data_list,
        }
    }
}

/// External process-spawn service. Both calls resolve once the service has
/// reported success or failure.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LaunchService: Send + Sync {
    async fn spawn(&self, request: LaunchRequest) -> bool;
    async fn send_users(&self, request: JoinRequest) -> bool;
}

pub struct HttpLaunchService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLaunchService {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        HttpLaunchService {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn post<T: Serialize + Sync>(&self, path: &str, body: &T) -> bool {
        let url = format!("{}/{}", self.base_url, path);
        match self.client.post(&url).json(body).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                error!(
                    "Launch service rejected request: url={}, status={}",
                    url,
                    response.status()
                );
                false
            }
            Err(e) => {
                error!("Launch service unreachable: url={}, error={}", url, e);
                false
            }
        }
    }
}

#[async_trait]
impl LaunchService for HttpLaunchService {
    async fn spawn(&self, request: LaunchRequest) -> bool {
        info!(
            "Requesting dedicated server spawn: group_id={}, players={}",
            request.group_id,
            request.account_ids.len()
        );
        self.post("spawn", &request).await
    }

    async fn send_users(&self, request: JoinRequest) -> bool {
        info!(
            "Requesting player injection: server_id={}, players={}",
            request.server_id,
            request.account_ids.len()
        );
        self.post("send-users", &request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_launch_request_serializes_all_fields() {
        let group_id = Uuid::new_v4();
        let request = LaunchRequest::new(
            group_id,
            json!({"match_type": 1}),
            vec!["HighRise?game=FFA".to_string(), "-log".to_string()],
            vec!["a".to_string()],
            vec![json!({"level": 1, "mmr_score": 1000})],
        );

        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["group_id"], json!(group_id));
        assert_eq!(value["launch_data"], json!({"match_type": 1}));
        assert_eq!(value["process_args"], json!(["HighRise?game=FFA", "-log"]));
        assert_eq!(value["account_ids"], json!(["a"]));
    }

    #[test]
    #[should_panic(expected = "index aligned")]
    fn test_launch_request_rejects_misaligned_lists() {
        LaunchRequest::new(
            Uuid::new_v4(),
            json!({}),
            Vec::new(),
            vec!["a".to_string(), "b".to_string()],
            vec![json!({})],
        );
    }

    #[test]
    #[should_panic(expected = "index aligned")]
    fn test_join_request_rejects_misaligned_lists() {
        JoinRequest::new(Uuid::new_v4(), json!({}), vec!["a".to_string()], Vec::new());
    }

    #[tokio::test]
    async fn test_http_launch_service_reports_unreachable_as_failure() {
        // port 9 (discard) is not listening in the test environment
        let service = HttpLaunchService::new(reqwest::Client::new(), "http://127.0.0.1:9/");

        let request = LaunchRequest::new(Uuid::new_v4(), json!({}), Vec::new(), Vec::new(), Vec::new());

        assert!(!service.spawn(request).await);
    }
}
