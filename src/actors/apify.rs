use std::borrow::Cow;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{ActorClient, CallOptions, CallResult, actor_path_id};
use crate::error::ActorMcpError;

const ACTS_API: &str = "acts";
const RUNS_API: &str = "actor-runs";
const DATASETS_API: &str = "datasets";
const WAIT_FOR_FINISH_SECS: &str = "60";

pub struct ApifyClient {
    client: reqwest_middleware::ClientWithMiddleware,
    plain: reqwest::Client,
    base: Cow<'static, str>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActorRun {
    id: String,
    status: String,
    default_dataset_id: String,
}

impl ActorRun {
    fn is_terminal(&self) -> bool {
        matches!(
            self.status.as_str(),
            "SUCCEEDED" | "FAILED" | "TIMED-OUT" | "ABORTED"
        )
    }
}

impl ApifyClient {
    pub fn new(base: impl Into<Cow<'static, str>>) -> Result<Self, ActorMcpError> {
        Ok(Self {
            client: crate::http::shared_client()?,
            plain: crate::http::plain_client()?,
            base: base.into(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        crate::http::endpoint(&self.base, path)
    }

    async fn start_run(
        &self,
        actor_id: &str,
        input: &Value,
        token: &str,
        options: &CallOptions,
    ) -> Result<ActorRun, ActorMcpError> {
        let url = self.endpoint(&format!("v2/acts/{}/runs", actor_path_id(actor_id)));
        let mut query: Vec<(&str, String)> =
            vec![("waitForFinish", WAIT_FOR_FINISH_SECS.to_string())];
        if let Some(memory) = options.memory {
            query.push(("memory", memory.to_string()));
        }
        if let Some(timeout) = options.timeout_secs {
            query.push(("timeout", timeout.to_string()));
        }
        if let Some(build) = options.build.as_deref() {
            query.push(("build", build.to_string()));
        }

        let resp = self
            .plain
            .post(&url)
            .bearer_auth(token)
            .query(&query)
            .json(input)
            .send()
            .await?;
        let run: Envelope<ActorRun> = crate::http::decode_json(resp, ACTS_API).await?;
        Ok(run.data)
    }

    async fn wait_for_run(&self, run: ActorRun, token: &str) -> Result<ActorRun, ActorMcpError> {
        let mut run = run;
        while !run.is_terminal() {
            debug!(run_id = %run.id, status = %run.status, "Waiting for actor run");
            let url = self.endpoint(&format!("v2/actor-runs/{}", run.id));
            let resp = self
                .client
                .get(&url)
                .bearer_auth(token)
                .query(&[("waitForFinish", WAIT_FOR_FINISH_SECS)])
                .send()
                .await?;
            let next: Envelope<ActorRun> = crate::http::decode_json(resp, RUNS_API).await?;
            run = next.data;
        }
        Ok(run)
    }

    async fn dataset_items(
        &self,
        dataset_id: &str,
        token: &str,
    ) -> Result<Vec<Value>, ActorMcpError> {
        let url = self.endpoint(&format!("v2/datasets/{dataset_id}/items"));
        let resp = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(&[("clean", "true"), ("format", "json")])
            .send()
            .await?;
        crate::http::decode_json(resp, DATASETS_API).await
    }
}

#[async_trait]
impl ActorClient for ApifyClient {
    async fn call_actor_get_dataset(
        &self,
        actor_id: &str,
        input: &Value,
        token: &str,
        options: &CallOptions,
    ) -> Result<CallResult, ActorMcpError> {
        if actor_id.trim().is_empty() {
            return Err(ActorMcpError::InvalidInput("actor id is required".into()));
        }

        let run = self.start_run(actor_id, input, token, options).await?;
        let run = self.wait_for_run(run, token).await?;
        if run.status != "SUCCEEDED" {
            return Err(ActorMcpError::ActorRun {
                actor: actor_id.to_string(),
                run_id: run.id,
                status: run.status,
            });
        }

        let items = self.dataset_items(&run.default_dataset_id, token).await?;
        Ok(CallResult {
            run_id: run.id,
            dataset_id: run.default_dataset_id,
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn run_body(status: &str) -> Value {
        json!({"data": {"id": "run1", "status": status, "defaultDatasetId": "ds1"}})
    }

    #[tokio::test]
    async fn call_runs_actor_and_fetches_items() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/acts/apify~rag-web-browser/runs"))
            .and(query_param("memory", "1024"))
            .and(header("authorization", "Bearer secret"))
            .and(body_json(json!({"query": "rust"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(run_body("SUCCEEDED")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/datasets/ds1/items"))
            .and(query_param("clean", "true"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"url": "a"}, {"url": "b"}])),
            )
            .mount(&server)
            .await;

        let client = ApifyClient::new(server.uri()).unwrap();
        let options = CallOptions {
            memory: Some(1024),
            ..CallOptions::default()
        };
        let result = client
            .call_actor_get_dataset(
                "apify/rag-web-browser",
                &json!({"query": "rust"}),
                "secret",
                &options,
            )
            .await
            .unwrap();

        assert_eq!(result.run_id, "run1");
        assert_eq!(result.count(), 2);
        assert_eq!(result.items[1]["url"], "b");
    }

    #[tokio::test]
    async fn call_polls_until_run_finishes() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/acts/someone~slow/runs"))
            .respond_with(ResponseTemplate::new(201).set_body_json(run_body("RUNNING")))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/actor-runs/run1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(run_body("SUCCEEDED")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/datasets/ds1/items"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let client = ApifyClient::new(server.uri()).unwrap();
        let result = client
            .call_actor_get_dataset("someone/slow", &json!({}), "t", &CallOptions::default())
            .await
            .unwrap();
        assert_eq!(result.count(), 0);
    }

    #[tokio::test]
    async fn call_reports_failed_runs() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/acts/someone~broken/runs"))
            .respond_with(ResponseTemplate::new(201).set_body_json(run_body("FAILED")))
            .mount(&server)
            .await;

        let client = ApifyClient::new(server.uri()).unwrap();
        let err = client
            .call_actor_get_dataset("someone/broken", &json!({}), "t", &CallOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ActorMcpError::ActorRun { ref status, .. } if status == "FAILED"));
    }

    #[tokio::test]
    async fn call_surfaces_api_errors() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/acts/nobody~missing/runs"))
            .respond_with(
                ResponseTemplate::new(404).set_body_string("{\"error\":{\"type\":\"record-not-found\"}}"),
            )
            .mount(&server)
            .await;

        let client = ApifyClient::new(server.uri()).unwrap();
        let err = client
            .call_actor_get_dataset("nobody/missing", &json!({}), "t", &CallOptions::default())
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("404"));
        assert!(msg.contains("record-not-found"));
    }

    #[tokio::test]
    async fn call_rejects_blank_actor_id() {
        let client = ApifyClient::new("http://127.0.0.1").unwrap();
        let err = client
            .call_actor_get_dataset("  ", &json!({}), "t", &CallOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ActorMcpError::InvalidInput(_)));
    }
}
