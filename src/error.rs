#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum ActorMcpError {
    #[error("HTTP client initialization failed: {0}")]
    HttpClientInit(reqwest::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP middleware error: {0}")]
    HttpMiddleware(#[from] reqwest_middleware::Error),

    #[error("API error from {api}: {message}")]
    Api { api: String, message: String },

    #[error("API JSON error from {api}: {source}")]
    ApiJson {
        api: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {var} {reason}")]
    InvalidConfig { var: String, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Actor '{actor}' run {run_id} finished with status {status}")]
    ActorRun {
        actor: String,
        run_id: String,
        status: String,
    },

    #[error("Server error: {0}")]
    Server(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::ActorMcpError;

    #[test]
    fn invalid_config_display_names_variable() {
        let err = ActorMcpError::InvalidConfig {
            var: "ACTOR_STANDBY_PORT".to_string(),
            reason: "is not a valid port: abc".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("ACTOR_STANDBY_PORT"));
        assert!(msg.contains("abc"));
    }

    #[test]
    fn actor_run_display_includes_status() {
        let err = ActorMcpError::ActorRun {
            actor: "apify/rag-web-browser".to_string(),
            run_id: "run123".to_string(),
            status: "FAILED".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("apify/rag-web-browser"));
        assert!(msg.contains("run123"));
        assert!(msg.contains("FAILED"));
    }

    #[test]
    fn api_error_display_includes_api_name() {
        let err = ActorMcpError::Api {
            api: "datasets".to_string(),
            message: "HTTP 500".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("datasets"));
        assert!(msg.contains("HTTP 500"));
    }
}
