use crate::api::{ApiError, AssistantApi, ChatReply};
use std::future::Future;
use std::sync::{mpsc, Arc};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use uuid::Uuid;

#[derive(Debug)]
pub enum AppEvent {
    ProjectCreated {
        result: Result<(), ApiError>,
    },
    ChatReplied {
        session: Uuid,
        result: Result<ChatReply, ApiError>,
    },
    RevealTick {
        session: Uuid,
        stream: u64,
    },
}

/// Runs backend work on the tokio runtime and reports back to the UI thread
/// through the event channel.
#[derive(Clone)]
pub struct Dispatcher {
    api: Arc<dyn AssistantApi>,
    runtime_handle: Handle,
    tx: mpsc::Sender<AppEvent>,
}

impl Dispatcher {
    pub fn new(
        api: Arc<dyn AssistantApi>,
        runtime_handle: Handle,
        tx: mpsc::Sender<AppEvent>,
    ) -> Self {
        Self {
            api,
            runtime_handle,
            tx,
        }
    }

    pub fn spawn_request<F, Fut>(&self, request: F)
    where
        F: FnOnce(Arc<dyn AssistantApi>) -> Fut + Send + 'static,
        Fut: Future<Output = AppEvent> + Send + 'static,
    {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        self.runtime_handle.spawn(async move {
            let event = request(api).await;
            let _ = tx.send(event);
        });
    }

    /// Emits `make_event()` every `period` until the receiver goes away or
    /// the returned handle is aborted. The first event fires one full period
    /// after the call.
    pub fn spawn_ticker<F>(&self, period: Duration, make_event: F) -> JoinHandle<()>
    where
        F: Fn() -> AppEvent + Send + 'static,
    {
        let tx = self.tx.clone();
        self.runtime_handle.spawn(async move {
            let mut ticker = time::interval_at(time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tx.send(make_event()).is_err() {
                    break;
                }
            }
        })
    }
}
