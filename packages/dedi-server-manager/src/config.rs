use std::time::Duration;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_FACEBOOK_GRAPH_URL: &str = "https://graph.facebook.com";
pub const DEFAULT_DEDICATED_SERVER_ARGS: &str = "HighRise?game=FFA -log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_address: String,
    pub session_gateway_url: String,
    pub launch_service_url: String,
    pub facebook_graph_url: String,
    pub dedicated_server_args: Vec<String>,
    /// `None` lets a request wait in the queue until it is matched or
    /// cancelled.
    pub matchmaking_timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// # Panics
    ///
    /// Panics if a required variable is missing or a numeric one does not
    /// parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let session_gateway_url =
            lookup("SESSION_GATEWAY_URL").expect("SESSION_GATEWAY_URL must be set");
        let launch_service_url =
            lookup("LAUNCH_SERVICE_URL").expect("LAUNCH_SERVICE_URL must be set");

        let matchmaking_timeout = lookup("MATCHMAKING_TIMEOUT_SECS").map(|secs| {
            let secs: u64 = secs
                .parse()
                .expect("MATCHMAKING_TIMEOUT_SECS must be a whole number of seconds");
            Duration::from_secs(secs)
        });

        Config {
            bind_address: lookup("BIND_ADDRESS")
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            session_gateway_url,
            launch_service_url,
            facebook_graph_url: lookup("FACEBOOK_GRAPH_URL")
                .unwrap_or_else(|| DEFAULT_FACEBOOK_GRAPH_URL.to_string()),
            dedicated_server_args: lookup("DEDICATED_SERVER_ARGS")
                .unwrap_or_else(|| DEFAULT_DEDICATED_SERVER_ARGS.to_string())
                .split_whitespace()
                .map(str::to_string)
                .collect(),
            matchmaking_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("SESSION_GATEWAY_URL", "http://gateway"),
            ("LAUNCH_SERVICE_URL", "http://launcher"),
        ]));

        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.facebook_graph_url, "https://graph.facebook.com");
        assert_eq!(config.dedicated_server_args, vec!["HighRise?game=FFA", "-log"]);
        assert_eq!(config.matchmaking_timeout, None);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("SESSION_GATEWAY_URL", "http://gateway"),
            ("LAUNCH_SERVICE_URL", "http://launcher"),
            ("BIND_ADDRESS", "127.0.0.1:9000"),
            ("DEDICATED_SERVER_ARGS", "Arena?game=TDM  -log -nosound"),
            ("MATCHMAKING_TIMEOUT_SECS", "90"),
        ]));

        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(
            config.dedicated_server_args,
            vec!["Arena?game=TDM", "-log", "-nosound"]
        );
        assert_eq!(config.matchmaking_timeout, Some(Duration::from_secs(90)));
    }

    #[test]
    #[should_panic(expected = "LAUNCH_SERVICE_URL must be set")]
    fn test_missing_launch_service_url() {
        Config::from_lookup(lookup_from(&[("SESSION_GATEWAY_URL", "http://gateway")]));
    }

    #[test]
    #[should_panic(expected = "MATCHMAKING_TIMEOUT_SECS")]
    fn test_bad_timeout() {
        Config::from_lookup(lookup_from(&[
            ("SESSION_GATEWAY_URL", "http://gateway"),
            ("LAUNCH_SERVICE_URL", "http://launcher"),
            ("MATCHMAKING_TIMEOUT_SECS", "soon"),
        ]));
    }
}
