use super::{ApiError, AssistantApi, ChatQuestion, ChatReply, ProjectUpload};
use crate::event::{AppEvent, Dispatcher};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Runtime;

/// In-process backend that records every call and answers with canned
/// responses.
pub struct MockApi {
    upload_status: Option<u16>,
    chat_reply: Result<String, u16>,
    pub uploads: Mutex<Vec<ProjectUpload>>,
    pub questions: Mutex<Vec<ChatQuestion>>,
}

impl MockApi {
    pub fn replying(body: Value) -> Self {
        Self::replying_raw(&body.to_string())
    }

    /// Answers chat questions with `body` exactly as the server would send it.
    pub fn replying_raw(body: &str) -> Self {
        Self {
            upload_status: None,
            chat_reply: Ok(body.to_string()),
            uploads: Mutex::new(Vec::new()),
            questions: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            upload_status: Some(status),
            chat_reply: Err(status),
            uploads: Mutex::new(Vec::new()),
            questions: Mutex::new(Vec::new()),
        }
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().map(|uploads| uploads.len()).unwrap_or(0)
    }

    pub fn question_count(&self) -> usize {
        self.questions.lock().map(|questions| questions.len()).unwrap_or(0)
    }
}

#[async_trait]
impl AssistantApi for MockApi {
    async fn create_project(&self, upload: ProjectUpload) -> Result<(), ApiError> {
        self.uploads.lock().expect("uploads lock").push(upload);
        match self.upload_status {
            None => Ok(()),
            Some(status) => Err(ApiError::Status {
                status,
                message: String::new(),
            }),
        }
    }

    async fn ask_bot(&self, question: ChatQuestion) -> Result<ChatReply, ApiError> {
        self.questions.lock().expect("questions lock").push(question);
        match &self.chat_reply {
            Ok(body) => Ok(ChatReply::from_body(body)),
            Err(status) => Err(ApiError::Status {
                status: *status,
                message: String::new(),
            }),
        }
    }
}

pub struct Harness {
    pub _runtime: Runtime,
    pub dispatcher: Dispatcher,
    pub rx: mpsc::Receiver<AppEvent>,
}

impl Harness {
    pub fn new(api: Arc<MockApi>) -> Self {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .expect("test runtime should build");
        let (tx, rx) = mpsc::channel();
        let dispatcher = Dispatcher::new(api, runtime.handle().clone(), tx);
        Self {
            _runtime: runtime,
            dispatcher,
            rx,
        }
    }

    pub fn next_event(&self) -> AppEvent {
        self.rx
            .recv_timeout(Duration::from_secs(5))
            .expect("an event should arrive")
    }
}
