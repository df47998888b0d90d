use crate::config::AppConfig;
use crate::project::SelectedFile;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

#[cfg(test)]
pub mod mock;

const ERROR_BODY_LIMIT: usize = 300;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("failed to read {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatQuestion {
    pub project_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatReply {
    pub response: Option<String>,
}

impl ChatReply {
    /// Reads the `response` field from a reply body. Missing, null or
    /// non-string values leave the reply empty.
    pub fn from_json(value: &Value) -> Self {
        Self {
            response: value
                .get("response")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }

    /// Parses a raw reply body. An empty body or one that is not JSON
    /// carries no response, which the session answers with its fallback.
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(value) => Self::from_json(&value),
            Err(err) => {
                if !body.trim().is_empty() {
                    debug!(%err, "chat reply body is not JSON");
                }
                Self::default()
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProjectUpload {
    pub project_id: String,
    pub files: Vec<SelectedFile>,
}

/// The two backend operations the client depends on.
#[async_trait]
pub trait AssistantApi: Send + Sync {
    async fn create_project(&self, upload: ProjectUpload) -> Result<(), ApiError>;
    async fn ask_bot(&self, question: ChatQuestion) -> Result<ChatReply, ApiError>;
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    config: AppConfig,
}

impl ApiClient {
    pub fn new(config: &AppConfig) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    async fn build_form(upload: &ProjectUpload) -> Result<Form, ApiError> {
        let mut form = Form::new().text("project_id", upload.project_id.clone());
        for file in &upload.files {
            let bytes = tokio::fs::read(&file.path)
                .await
                .map_err(|source| ApiError::File {
                    path: file.path.clone(),
                    source,
                })?;
            let part = Part::bytes(bytes)
                .file_name(file.name.clone())
                .mime_str(file.media.mime())?;
            form = form.part("files", part);
        }
        Ok(form)
    }
}

#[async_trait]
impl AssistantApi for ApiClient {
    async fn create_project(&self, upload: ProjectUpload) -> Result<(), ApiError> {
        info!(
            project_id = %upload.project_id,
            files = upload.files.len(),
            "uploading project files"
        );
        let form = Self::build_form(&upload).await?;
        let response = self
            .http
            .post(self.config.endpoint("upload"))
            .multipart(form)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn ask_bot(&self, question: ChatQuestion) -> Result<ChatReply, ApiError> {
        info!(
            project_id = %question.project_id,
            chars = question.message.chars().count(),
            "asking assistant"
        );
        let response = self
            .http
            .post(self.config.endpoint("chat"))
            .json(&question)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let body = response.text().await?;
        Ok(ChatReply::from_body(&body))
    }
}

async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message_from_body(&body);
    warn!(status = status.as_u16(), %message, "backend rejected request");
    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

/// Pulls a readable message out of an error body. JSON bodies are searched
/// for `detail`, `message` or `error`; anything else is truncated raw text.
pub fn error_message_from_body(body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<Value>(body) {
        for key in ["detail", "message", "error"] {
            if let Some(message) = payload.get(key).and_then(Value::as_str) {
                let message = message.trim();
                if !message.is_empty() {
                    return message.to_string();
                }
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.chars().count() > ERROR_BODY_LIMIT {
        let mut cut: String = trimmed.chars().take(ERROR_BODY_LIMIT).collect();
        cut.push('…');
        cut
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{MediaKind, SelectedFile};
    use reqwest::Url;
    use serde_json::json;
    use std::fs;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    struct CapturedRequest {
        head: String,
        body: Vec<u8>,
    }

    impl CapturedRequest {
        fn request_line(&self) -> &str {
            self.head.lines().next().unwrap_or_default()
        }

        fn body_text(&self) -> String {
            String::from_utf8_lossy(&self.body).to_string()
        }
    }

    async fn read_request(socket: &mut TcpStream) -> CapturedRequest {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let header_end = loop {
            if let Some(pos) = buf.windows(4).position(|window| window == b"\r\n\r\n") {
                break pos + 4;
            }
            let read = socket.read(&mut chunk).await.expect("request should be readable");
            if read == 0 {
                break buf.len();
            }
            buf.extend_from_slice(&chunk[..read]);
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let content_length = head
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                if name.trim().eq_ignore_ascii_case("content-length") {
                    value.trim().parse::<usize>().ok()
                } else {
                    None
                }
            })
            .unwrap_or(0);
        while buf.len() < header_end + content_length {
            let read = socket.read(&mut chunk).await.expect("body should be readable");
            if read == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..read]);
        }

        CapturedRequest {
            head,
            body: buf[header_end..].to_vec(),
        }
    }

    /// Serves a single canned response on a loopback port and hands back the
    /// request it received.
    async fn serve_once(
        status: &'static str,
        content_type: &'static str,
        body: &'static str,
    ) -> (AppConfig, JoinHandle<CapturedRequest>) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("loopback port should bind");
        let addr = listener.local_addr().expect("listener has an address");
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("client should connect");
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket
                .write_all(response.as_bytes())
                .await
                .expect("response should be written");
            let _ = socket.shutdown().await;
            request
        });

        let config = AppConfig {
            api_base_url: Url::parse(&format!("http://{addr}")).expect("loopback url"),
            reveal_tick: Duration::from_millis(20),
            request_timeout: Duration::from_secs(5),
        };
        (config, server)
    }

    fn temp_file(prefix: &str, extension: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time should be monotonic")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "docchat_api_{prefix}_{}_{}.{extension}",
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn chat_question_serializes_with_backend_field_names() {
        let question = ChatQuestion {
            project_id: "Quarterly".to_string(),
            message: "What is this document about?".to_string(),
        };
        let value = serde_json::to_value(&question).expect("question should serialize");
        assert_eq!(
            value,
            json!({"project_id": "Quarterly", "message": "What is this document about?"})
        );
    }

    #[test]
    fn chat_reply_reads_response_field() {
        let reply = ChatReply::from_json(&json!({"response": "It is a summary."}));
        assert_eq!(reply.response.as_deref(), Some("It is a summary."));
    }

    #[test]
    fn chat_reply_tolerates_missing_or_null_response() {
        assert_eq!(ChatReply::from_json(&json!({})).response, None);
        assert_eq!(ChatReply::from_json(&json!({"response": null})).response, None);
        assert_eq!(ChatReply::from_json(&json!({"response": 7})).response, None);
    }

    #[test]
    fn chat_reply_body_without_json_has_no_response() {
        assert_eq!(ChatReply::from_body(""), ChatReply::default());
        assert_eq!(ChatReply::from_body("ok"), ChatReply::default());
        assert_eq!(
            ChatReply::from_body(r#"{"response":"hi"}"#).response.as_deref(),
            Some("hi")
        );
    }

    #[tokio::test]
    async fn ask_bot_posts_question_as_json_to_chat_endpoint() {
        let (config, server) =
            serve_once("200 OK", "application/json", r#"{"response":"It is a summary."}"#).await;
        let client = ApiClient::new(&config).expect("client should build");

        let reply = client
            .ask_bot(ChatQuestion {
                project_id: "Quarterly".to_string(),
                message: "What is this document about?".to_string(),
            })
            .await
            .expect("chat should succeed");
        let request = server.await.expect("server task should finish");

        assert_eq!(reply.response.as_deref(), Some("It is a summary."));
        assert_eq!(request.request_line(), "POST /chat HTTP/1.1");
        assert!(request
            .head
            .to_ascii_lowercase()
            .contains("content-type: application/json"));
        let sent: Value = serde_json::from_slice(&request.body).expect("body should be JSON");
        assert_eq!(
            sent,
            json!({"project_id": "Quarterly", "message": "What is this document about?"})
        );
    }

    #[tokio::test]
    async fn ask_bot_treats_empty_or_plain_bodies_as_missing_response() {
        for (content_type, body) in [("application/json", ""), ("text/plain", "ok")] {
            let (config, server) = serve_once("200 OK", content_type, body).await;
            let client = ApiClient::new(&config).expect("client should build");

            let reply = client
                .ask_bot(ChatQuestion {
                    project_id: "Docs".to_string(),
                    message: "hello".to_string(),
                })
                .await
                .expect("a 2xx reply is never an error");
            server.await.expect("server task should finish");

            assert_eq!(reply, ChatReply::default(), "body {body:?}");
        }
    }

    #[tokio::test]
    async fn ask_bot_maps_server_failure_to_status_with_detail() {
        let (config, server) = serve_once(
            "500 Internal Server Error",
            "application/json",
            r#"{"detail":"Vector store unavailable"}"#,
        )
        .await;
        let client = ApiClient::new(&config).expect("client should build");

        let result = client
            .ask_bot(ChatQuestion {
                project_id: "Docs".to_string(),
                message: "hello".to_string(),
            })
            .await;
        server.await.expect("server task should finish");

        match result {
            Err(ApiError::Status { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "Vector store unavailable");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_project_uploads_multipart_form_to_upload_endpoint() {
        let notes = temp_file("notes", "txt");
        let report = temp_file("report", "pdf");
        fs::write(&notes, b"meeting notes").expect("fixture should be written");
        fs::write(&report, b"%PDF-1.4 quarterly").expect("fixture should be written");

        let (config, server) = serve_once("200 OK", "application/json", "{}").await;
        let client = ApiClient::new(&config).expect("client should build");
        let result = client
            .create_project(ProjectUpload {
                project_id: "Quarterly reports".to_string(),
                files: vec![
                    SelectedFile {
                        path: notes.clone(),
                        name: "notes.txt".to_string(),
                        media: MediaKind::PlainText,
                    },
                    SelectedFile {
                        path: report.clone(),
                        name: "report.pdf".to_string(),
                        media: MediaKind::Pdf,
                    },
                ],
            })
            .await;
        let request = server.await.expect("server task should finish");
        let _ = fs::remove_file(&notes);
        let _ = fs::remove_file(&report);

        assert!(result.is_ok(), "upload failed: {result:?}");
        assert_eq!(request.request_line(), "POST /upload HTTP/1.1");
        assert!(request
            .head
            .to_ascii_lowercase()
            .contains("content-type: multipart/form-data"));

        let body = request.body_text();
        let lowered = body.to_ascii_lowercase();
        assert!(body.contains(r#"name="project_id""#));
        assert!(body.contains("\r\n\r\nQuarterly reports\r\n"));
        assert_eq!(body.matches(r#"name="files""#).count(), 2);
        assert!(body.contains(r#"filename="notes.txt""#));
        assert!(body.contains(r#"filename="report.pdf""#));
        assert!(lowered.contains("content-type: text/plain"));
        assert!(lowered.contains("content-type: application/pdf"));
        assert!(body.contains("meeting notes"));
    }

    #[test]
    fn error_message_prefers_detail_field() {
        assert_eq!(
            error_message_from_body(r#"{"detail":"Project already exists"}"#),
            "Project already exists"
        );
        assert_eq!(
            error_message_from_body(r#"{"error":"boom","message":""}"#),
            "boom"
        );
    }

    #[test]
    fn error_message_truncates_long_plain_bodies() {
        let body = "x".repeat(ERROR_BODY_LIMIT + 50);
        let message = error_message_from_body(&body);
        assert_eq!(message.chars().count(), ERROR_BODY_LIMIT + 1);
        assert!(message.ends_with('…'));
    }

    #[test]
    fn build_form_reports_unreadable_file() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime should build");
        let missing = temp_file("missing", "pdf");
        let upload = ProjectUpload {
            project_id: "p".to_string(),
            files: vec![SelectedFile {
                path: missing.clone(),
                name: "missing.pdf".to_string(),
                media: MediaKind::Pdf,
            }],
        };

        let result = runtime.block_on(ApiClient::build_form(&upload));
        match result {
            Err(ApiError::File { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected file error, got {other:?}"),
        }
    }

    #[test]
    fn build_form_accepts_readable_files() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime should build");
        let path = temp_file("notes", "txt");
        fs::write(&path, b"meeting notes").expect("fixture should be written");
        let upload = ProjectUpload {
            project_id: "p".to_string(),
            files: vec![SelectedFile {
                path: path.clone(),
                name: "notes.txt".to_string(),
                media: MediaKind::PlainText,
            }],
        };

        let result = runtime.block_on(ApiClient::build_form(&upload));
        let _ = fs::remove_file(&path);
        assert!(result.is_ok());
    }
}
