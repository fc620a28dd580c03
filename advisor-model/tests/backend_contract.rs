//! One behavioural contract, run against every in-tree backend.
//!
//! A scenario is a sequence of provider replies. Each backend fixture turns
//! the same sequence into its own form (scripted replies, mounted HTTP
//! mocks), and the client must behave identically on top of both. The SDK
//! backend only accepts complete OpenAI reply objects, so it runs its own
//! scenarios over the same fixture trait.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use advisor_model::{
    ChatRequest, CompletionClient, CompletionConfig, CompletionError, Endpoint, MockBackend,
    RetryPolicy,
};
use async_trait::async_trait;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Clone)]
enum Reply {
    Ok(Value),
    Status(u16, Value),
    Plain(u16, &'static str),
}

#[async_trait]
trait Fixture: Send + Sync {
    async fn client(&self, replies: Vec<Reply>, max_attempts: u32) -> CompletionClient;
    async fn sent(&self) -> usize;
}

fn config(base_url: &str, max_attempts: u32) -> CompletionConfig {
    CompletionConfig::builder()
        .base_url(base_url)
        .model("contract-model")
        .retry(RetryPolicy::new(max_attempts, Duration::from_millis(2)))
        .build()
        .unwrap()
}

#[derive(Default)]
struct ScriptedFixture {
    backend: Mutex<Option<Arc<MockBackend>>>,
}

#[async_trait]
impl Fixture for ScriptedFixture {
    async fn client(&self, replies: Vec<Reply>, max_attempts: u32) -> CompletionClient {
        let backend = replies.into_iter().fold(MockBackend::new(), |backend, reply| match reply {
            Reply::Ok(body) => backend.then_respond(body),
            Reply::Status(status, body) => backend.then_fail(CompletionError::from_status(
                Endpoint::Chat,
                status,
                &body.to_string(),
            )),
            Reply::Plain(status, body) => {
                backend.then_fail(CompletionError::from_status(Endpoint::Chat, status, body))
            }
        });
        let backend = Arc::new(backend);
        *self.backend.lock().unwrap() = Some(backend.clone());
        CompletionClient::new(config("http://scripted.test", max_attempts), backend)
    }

    async fn sent(&self) -> usize {
        self.backend.lock().unwrap().as_ref().map_or(0, |b| b.call_count())
    }
}

struct HttpFixture {
    server: MockServer,
}

impl HttpFixture {
    async fn start() -> Self {
        Self { server: MockServer::start().await }
    }
}

#[async_trait]
impl Fixture for HttpFixture {
    async fn client(&self, replies: Vec<Reply>, max_attempts: u32) -> CompletionClient {
        mount_replies(&self.server, replies).await;
        CompletionClient::from_config(config(&self.server.uri(), max_attempts)).unwrap()
    }

    async fn sent(&self) -> usize {
        self.server.received_requests().await.map_or(0, |r| r.len())
    }
}

async fn mount_replies(server: &MockServer, replies: Vec<Reply>) {
    // Earlier mounts win while they have budget left.
    for reply in replies {
        let template = match reply {
            Reply::Ok(body) => ResponseTemplate::new(200).set_body_json(body),
            Reply::Status(status, body) => ResponseTemplate::new(status).set_body_json(body),
            Reply::Plain(status, body) => ResponseTemplate::new(status).set_body_string(body),
        };
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(template)
            .up_to_n_times(1)
            .mount(server)
            .await;
    }
}

fn overloaded() -> Reply {
    Reply::Status(503, json!({"error": {"message": "overloaded"}}))
}

async fn contract<F, Fut, X>(fixture: F)
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = X>,
    X: Fixture,
{
    let request = ChatRequest::user("Which table holds revenue?");

    // Chat-shaped answer.
    let fx = fixture().await;
    let client = fx.client(vec![Reply::Ok(json!({"choices": [{"message": {"content": "fact_sales"}}]}))], 3).await;
    let result = client.complete(&request).await.unwrap();
    assert_eq!((result.text.as_str(), result.attempts), ("fact_sales", 1));
    assert_eq!(fx.sent().await, 1);

    // Text-shaped answer on the chat endpoint.
    let fx = fixture().await;
    let client = fx.client(vec![Reply::Ok(json!({"choices": [{"text": "fact_sales"}]}))], 3).await;
    assert_eq!(client.complete(&request).await.unwrap().text, "fact_sales");

    // Chat shape wins when both are present.
    let fx = fixture().await;
    let both = json!({"choices": [{"message": {"content": "chat"}, "text": "text"}]});
    let client = fx.client(vec![Reply::Ok(both)], 3).await;
    assert_eq!(client.complete(&request).await.unwrap().text, "chat");

    // Two outages, then success.
    let fx = fixture().await;
    let client = fx
        .client(vec![overloaded(), overloaded(), Reply::Ok(json!({"choices": [{"text": "ok"}]}))], 3)
        .await;
    let result = client.complete(&request).await.unwrap();
    assert_eq!(result.attempts, 3);
    assert_eq!(fx.sent().await, 3);

    // Retries exhausted.
    let fx = fixture().await;
    let client = fx.client(vec![overloaded(), overloaded(), overloaded()], 3).await;
    let err = client.complete(&request).await.unwrap_err();
    assert_eq!(err, CompletionError::Transient { status: Some(503), message: "HTTP 503: overloaded".into() });
    assert_eq!(fx.sent().await, 3);

    // A proxy error page is transient too.
    let fx = fixture().await;
    let client = fx
        .client(vec![Reply::Plain(502, "Bad Gateway"), Reply::Ok(json!({"choices": [{"text": "ok"}]}))], 3)
        .await;
    assert_eq!(client.complete(&request).await.unwrap().attempts, 2);
    assert_eq!(fx.sent().await, 2);

    // Rate limiting is transient.
    let fx = fixture().await;
    let client = fx
        .client(vec![Reply::Status(429, json!({"message": "slow down"})), Reply::Ok(json!({"choices": [{"text": "ok"}]}))], 3)
        .await;
    assert_eq!(client.complete(&request).await.unwrap().attempts, 2);

    // Authorization failure is fatal.
    let fx = fixture().await;
    let client = fx.client(vec![Reply::Status(403, json!({"error": {"message": "forbidden"}})), overloaded()], 3).await;
    let err = client.complete(&request).await.unwrap_err();
    assert_eq!(err, CompletionError::Fatal { status: Some(403), message: "HTTP 403: forbidden".into() });
    assert_eq!(fx.sent().await, 1);

    // Neither shape present.
    let fx = fixture().await;
    let client = fx.client(vec![Reply::Ok(json!({"choices": []}))], 3).await;
    let err = client.complete(&request).await.unwrap_err();
    assert_eq!(err, CompletionError::UnexpectedResponseShape { body: r#"{"choices":[]}"#.into() });
    assert_eq!(fx.sent().await, 1);

    // Unsupported chat endpoint without fallback.
    let fx = fixture().await;
    let client = fx.client(vec![Reply::Status(404, json!({"detail": "Not Found"}))], 3).await;
    let err = client.complete(&request).await.unwrap_err();
    assert!(err.triggers_fallback(), "unexpected error: {err:?}");
    assert_eq!(fx.sent().await, 1);
}

#[tokio::test]
async fn scripted_backend_honours_contract() {
    contract(|| async { ScriptedFixture::default() }).await;
}

#[tokio::test]
async fn http_backend_honours_contract() {
    contract(HttpFixture::start).await;
}

#[cfg(feature = "openai")]
mod sdk {
    use super::*;
    use advisor_model::BackendKind;

    struct OpenAiFixture {
        server: MockServer,
    }

    impl OpenAiFixture {
        async fn start() -> Self {
            Self { server: MockServer::start().await }
        }
    }

    #[async_trait]
    impl Fixture for OpenAiFixture {
        async fn client(&self, replies: Vec<Reply>, max_attempts: u32) -> CompletionClient {
            mount_replies(&self.server, replies).await;
            let mut config = config(&self.server.uri(), max_attempts);
            config.backend = BackendKind::OpenAi;
            CompletionClient::from_config(config).unwrap()
        }

        async fn sent(&self) -> usize {
            self.server.received_requests().await.map_or(0, |r| r.len())
        }
    }

    fn chat_completion(content: Value) -> Reply {
        Reply::Ok(json!({
            "id": "chatcmpl-contract",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": "contract-model",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }]
        }))
    }

    fn engine_crashed() -> Reply {
        Reply::Status(500, json!({"error": {"message": "engine crashed", "type": null}}))
    }

    #[tokio::test]
    async fn openai_backend_honours_contract() {
        let request = ChatRequest::user("Which table holds revenue?");

        // Chat-shaped answer.
        let fx = OpenAiFixture::start().await;
        let client = fx.client(vec![chat_completion(json!("fact_sales"))], 3).await;
        let result = client.complete(&request).await.unwrap();
        assert_eq!((result.text.as_str(), result.attempts), ("fact_sales", 1));
        assert_eq!(fx.sent().await, 1);

        // Two server errors, then success.
        let fx = OpenAiFixture::start().await;
        let client = fx
            .client(vec![engine_crashed(), engine_crashed(), chat_completion(json!("ok"))], 3)
            .await;
        assert_eq!(client.complete(&request).await.unwrap().attempts, 3);
        assert_eq!(fx.sent().await, 3);

        // Retries exhausted.
        let fx = OpenAiFixture::start().await;
        let client = fx.client(vec![engine_crashed(), engine_crashed(), engine_crashed()], 3).await;
        let err = client.complete(&request).await.unwrap_err();
        assert_eq!(err, CompletionError::Transient { status: None, message: "engine crashed".into() });
        assert_eq!(fx.sent().await, 3);

        // A plain-text outage page is retried.
        let fx = OpenAiFixture::start().await;
        let client = fx
            .client(vec![Reply::Plain(503, "Service Unavailable"), chat_completion(json!("ok"))], 3)
            .await;
        assert_eq!(client.complete(&request).await.unwrap().attempts, 2);
        assert_eq!(fx.sent().await, 2);

        // Request errors are fatal.
        let fx = OpenAiFixture::start().await;
        let invalid = json!({"error": {"message": "bad model", "type": "invalid_request_error"}});
        let client = fx.client(vec![Reply::Status(400, invalid), chat_completion(json!("ok"))], 3).await;
        let err = client.complete(&request).await.unwrap_err();
        assert_eq!(err, CompletionError::Fatal { status: None, message: "bad model".into() });
        assert_eq!(fx.sent().await, 1);

        // No answer text: the shape error carries the provider reply.
        let fx = OpenAiFixture::start().await;
        let client = fx.client(vec![chat_completion(Value::Null)], 3).await;
        match client.complete(&request).await.unwrap_err() {
            CompletionError::UnexpectedResponseShape { body } => {
                let reply: Value = serde_json::from_str(&body).unwrap();
                assert_eq!(reply["id"], "chatcmpl-contract");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(fx.sent().await, 1);
    }
}
