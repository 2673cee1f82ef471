//! HTTP client for the Magazzino Creatore backend.

use futures::stream::BoxStream;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::{ClientError, ClientResult};
use crate::models::events::{PerformanceMetrics, StreamEvent};
use crate::models::turn::ConversationTurn;
use crate::sse::event_stream;

/// Backend endpoint paths, as consumed from its HTTP contract.
pub mod endpoint {
    pub const SEARCH: &str = "/api/search/";
    pub const IDEAS_GENERATE: &str = "/api/ideas/generate";
    pub const VIDEOS_CHANNEL: &str = "/api/videos/channel";
    pub const VIDEOS_PROGRESS: &str = "/api/videos/progress";
    pub const RSS_PROCESS: &str = "/api/rss/process";
    pub const RSS_PROGRESS: &str = "/api/rss/progress";
    pub const DOCUMENTS_UPLOAD: &str = "/api/documents/upload";
    pub const WORDPRESS_SYNC: &str = "/api/website/wordpress/sync";
    pub const WORDPRESS_PROGRESS: &str = "/api/website/wordpress/progress";
    pub const RESTORE_DATABASE: &str = "/api/protection/restore/database";
    pub const REINDEX_PROGRESS: &str = "/api/protection/reindex-progress";
    pub const RESTORE_FULL: &str = "/api/protection/restore/full";
    pub const WIDGET_TOKEN: &str = "/keys/api/public/generate-widget-token";
}

/// Credential attached to authenticated requests. Anonymous calls are
/// tolerated where the backend permits them.
#[derive(Debug, Clone, Default)]
pub enum Credential {
    #[default]
    Anonymous,
    /// `Authorization: Bearer <jwt>`, the full-page and widget variant.
    Bearer(String),
    /// `X-API-Key`, the server-to-server variant.
    ApiKey(String),
}

impl Credential {
    fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            Credential::Anonymous => request,
            Credential::Bearer(token) => {
                request.header("Authorization", format!("Bearer {token}"))
            }
            Credential::ApiKey(key) => request.header("X-API-Key", key),
        }
    }
}

/// Synchronous `{success, message}` envelope returned by the start and
/// upload calls.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Acknowledgement {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl Acknowledgement {
    pub fn display_message(&self) -> String {
        self.message
            .clone()
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| "Error: unknown".to_string())
    }
}

/// `GET /api/ideas/generate` response. Depending on the server's
/// renderer the batch arrives as markdown (`ideas`) or prerendered HTML
/// (`ideas_html`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdeasEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub ideas: Option<String>,
    #[serde(default)]
    pub ideas_html: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub performance_metrics: Option<PerformanceMetrics>,
}

impl IdeasEnvelope {
    pub fn body(&self) -> Option<&str> {
        self.ideas.as_deref().or(self.ideas_html.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct TokenEnvelope {
    #[serde(default)]
    token: Option<String>,
}

/// One file for `POST /api/documents/upload`.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// HTTP client for the Magazzino Creatore backend.
///
/// Requests carry no timeout: a hung server response is only ever
/// observed as a transport failure, never time-boxed by this layer.
pub struct MagazzinoClient {
    client: Client,
    base_url: String,
    credential: Credential,
}

impl MagazzinoClient {
    pub fn new(base_url: impl Into<String>, credential: Credential) -> ClientResult<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            credential,
        })
    }

    pub fn set_credential(&mut self, credential: Credential) {
        self.credential = credential;
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// POST `/api/search/` and return the decoded event stream.
    ///
    /// The endpoint must answer with `text/event-stream`; any other
    /// content type is a protocol-shape failure.
    pub async fn search(
        &self,
        query: &str,
        history: &[ConversationTurn],
    ) -> ClientResult<BoxStream<'static, ClientResult<StreamEvent>>> {
        let mut payload = json!({ "query": query });
        if !history.is_empty() {
            payload["history"] = serde_json::to_value(history)?;
        }

        let request = self
            .client
            .post(self.url(endpoint::SEARCH))
            .header("Accept", "text/event-stream")
            .json(&payload);
        let response = check_status(self.credential.apply(request).send().await?).await?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.contains("text/event-stream") {
            return Err(ClientError::UnexpectedContentType(content_type));
        }

        Ok(event_stream(response))
    }

    /// GET `/api/ideas/generate`.
    pub async fn generate_ideas(&self) -> ClientResult<IdeasEnvelope> {
        self.get_json(endpoint::IDEAS_GENERATE).await
    }

    /// Enqueue ingestion of a whole YouTube channel. The backend answers
    /// 202 Accepted when the job started; anything else is a terminal
    /// error.
    pub async fn start_channel_ingest(&self, channel_url: &str) -> ClientResult<Acknowledgement> {
        self.post_accepted(endpoint::VIDEOS_CHANNEL, &json!({ "channel_url": channel_url }))
            .await
    }

    /// Enqueue ingestion of an RSS feed. 202 Accepted on start.
    pub async fn start_feed_ingest(&self, rss_url: &str) -> ClientResult<Acknowledgement> {
        self.post_accepted(endpoint::RSS_PROCESS, &json!({ "rss_url": rss_url }))
            .await
    }

    /// Enqueue a WordPress content synchronization. 202 Accepted on start.
    pub async fn start_wordpress_sync(&self) -> ClientResult<Acknowledgement> {
        self.post_accepted(endpoint::WORDPRESS_SYNC, &json!({})).await
    }

    /// Enqueue a database restore; the rebuild is observed through the
    /// reindex progress endpoint. 202 Accepted on start.
    pub async fn start_database_restore(&self) -> ClientResult<Acknowledgement> {
        self.post_accepted(endpoint::RESTORE_DATABASE, &json!({})).await
    }

    /// Trigger a full restore. This implies an application restart, so
    /// the call is fire-and-forget and its progress is never polled.
    pub async fn start_full_restore(&self) -> ClientResult<Acknowledgement> {
        let request = self.client.post(self.url(endpoint::RESTORE_FULL));
        let response = check_status(self.credential.apply(request).send().await?).await?;
        Ok(response.json().await?)
    }

    /// Upload one or more documents as multipart form data.
    pub async fn upload_documents(
        &self,
        files: Vec<DocumentUpload>,
    ) -> ClientResult<Acknowledgement> {
        let mut form = reqwest::multipart::Form::new();
        for file in files {
            form = form.part(
                "documents",
                reqwest::multipart::Part::bytes(file.bytes).file_name(file.filename),
            );
        }

        let request = self.client.post(self.url(endpoint::DOCUMENTS_UPLOAD)).multipart(form);
        let response = check_status(self.credential.apply(request).send().await?).await?;
        let ack: Acknowledgement = response.json().await?;
        if !ack.success {
            return Err(ClientError::Api {
                message: ack.display_message(),
                error_code: None,
            });
        }
        Ok(ack)
    }

    /// Exchange a public customer id for a widget bearer token.
    pub async fn widget_token(&self, customer_id: &str) -> ClientResult<String> {
        let response = self
            .client
            .post(self.url(endpoint::WIDGET_TOKEN))
            .json(&json!({ "customerId": customer_id }))
            .send()
            .await?;
        let response = check_status(response).await?;
        let envelope: TokenEnvelope = response.json().await?;
        envelope.token.ok_or_else(|| ClientError::Api {
            message: "token missing from response".to_string(),
            error_code: None,
        })
    }

    /// GET a JSON endpoint (progress polls and the like) and decode it.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let request = self.client.get(self.url(path));
        let response = check_status(self.credential.apply(request).send().await?).await?;
        Ok(response.json().await?)
    }

    async fn post_accepted(&self, path: &str, body: &Value) -> ClientResult<Acknowledgement> {
        let request = self.client.post(self.url(path)).json(body);
        let response = self.credential.apply(request).send().await?;
        if response.status() != StatusCode::ACCEPTED {
            return Err(error_from_response(response).await);
        }
        Ok(response.json().await?)
    }
}

async fn check_status(response: Response) -> ClientResult<Response> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(error_from_response(response).await)
    }
}

/// Extract an error from a non-success response: the JSON body's message
/// when parseable, else a generic `HTTP <status>` string.
async fn error_from_response(response: Response) -> ClientError {
    let status = response.status().as_u16();
    let message = match response.json::<Value>().await {
        Ok(body) => body
            .get("message")
            .or_else(|| body.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {status}")),
        Err(_) => format!("HTTP {status}"),
    };
    ClientError::Http { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> MagazzinoClient {
        MagazzinoClient::new(server.uri(), Credential::Anonymous).unwrap()
    }

    #[tokio::test]
    async fn search_consumes_an_event_stream() {
        let server = MockServer::start().await;
        let body = concat!(
            "event: status\ndata: {\"message\": \"Searching...\"}\n\n",
            "event: result\ndata: {\"success\": true, \"answer\": \"hello\"}\n\n",
        );
        Mock::given(method("POST"))
            .and(path("/api/search/"))
            .and(header("accept", "text/event-stream"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let mut events = client.search("hello?", &[]).await.unwrap();

        let mut collected = Vec::new();
        while let Some(event) = events.next().await {
            collected.push(event.unwrap());
        }
        assert_eq!(collected.len(), 2);
        assert!(collected[1].is_terminal());
    }

    #[tokio::test]
    async fn search_rejects_a_non_stream_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/search/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let Err(err) = client.search("hello?", &[]).await else {
            panic!("expected an error");
        };
        assert!(matches!(err, ClientError::UnexpectedContentType(_)));
    }

    #[tokio::test]
    async fn search_sends_history_and_bearer_credential() {
        let server = MockServer::start().await;
        let history = vec![
            ConversationTurn::user("first"),
            ConversationTurn::assistant("answer"),
        ];
        Mock::given(method("POST"))
            .and(path("/api/search/"))
            .and(header("authorization", "Bearer sekrit"))
            .and(body_json(serde_json::json!({
                "query": "second",
                "history": [
                    {"role": "user", "content": "first"},
                    {"role": "assistant", "content": "answer"},
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "event: result\ndata: {\"success\": true, \"answer\": \"ok\"}\n\n",
                "text/event-stream",
            ))
            .mount(&server)
            .await;

        let mut client = client_for(&server).await;
        client.set_credential(Credential::Bearer("sekrit".to_string()));
        assert!(client.search("second", &history).await.is_ok());
    }

    #[tokio::test]
    async fn http_failure_message_comes_from_the_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/videos/channel"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({"success": false, "message": "bad channel url"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.start_channel_ingest("nope").await.unwrap_err();
        match err {
            ClientError::Http { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "bad channel url");
            }
            other => panic!("expected http error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn http_failure_without_json_gets_a_generic_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/rss/process"))
            .respond_with(ResponseTemplate::new(500).set_body_string("<html>boom</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.start_feed_ingest("https://example.com/feed").await.unwrap_err();
        match err {
            ClientError::Http { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "HTTP 500");
            }
            other => panic!("expected http error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn accepted_envelope_is_returned_on_202() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/videos/channel"))
            .and(body_json(serde_json::json!({"channel_url": "https://youtube.com/@c"})))
            .respond_with(
                ResponseTemplate::new(202)
                    .set_body_json(serde_json::json!({"success": true, "message": "started"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let ack = client
            .start_channel_ingest("https://youtube.com/@c")
            .await
            .unwrap();
        assert!(ack.success);
        assert_eq!(ack.message.as_deref(), Some("started"));
    }

    #[tokio::test]
    async fn a_plain_200_on_an_accept_endpoint_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/videos/channel"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"success": false, "message": "already running"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.start_channel_ingest("url").await.unwrap_err();
        match err {
            ClientError::Http { message, .. } => assert_eq!(message, "already running"),
            other => panic!("expected http error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn widget_token_exchange() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/keys/api/public/generate-widget-token"))
            .and(body_json(serde_json::json!({"customerId": "cust-1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"token": "jwt-1"})))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert_eq!(client.widget_token("cust-1").await.unwrap(), "jwt-1");
    }

    #[tokio::test]
    async fn upload_surfaces_an_unsuccessful_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/documents/upload"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"success": false, "message": "unsupported type"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .upload_documents(vec![DocumentUpload {
                filename: "notes.txt".to_string(),
                bytes: b"hello".to_vec(),
            }])
            .await
            .unwrap_err();
        match err {
            ClientError::Api { message, .. } => assert_eq!(message, "unsupported type"),
            other => panic!("expected api error, got {other:?}"),
        }
    }
}
