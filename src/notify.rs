use crate::api::ApiError;
use crate::validation::ValidationError;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::warn;

pub const TOAST_LIFETIME: Duration = Duration::from_secs(3);
const MAX_VISIBLE_TOASTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Validation,
    Server,
}

impl ErrorCategory {
    pub fn title(self) -> &'static str {
        match self {
            Self::Network => "Network error",
            Self::Validation => "Validation error",
            Self::Server => "Server error",
        }
    }
}

/// A failure reduced to what the user gets to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub category: ErrorCategory,
    pub message: String,
}

pub fn normalize_api_error(err: &ApiError) -> Notice {
    match err {
        ApiError::Http(inner) if inner.is_decode() => Notice {
            category: ErrorCategory::Server,
            message: "The server sent a response that could not be read.".to_string(),
        },
        ApiError::Http(inner) if inner.is_timeout() => Notice {
            category: ErrorCategory::Network,
            message: "The request timed out. Please try again.".to_string(),
        },
        ApiError::Http(_) => Notice {
            category: ErrorCategory::Network,
            message: "Could not reach the server. Check your connection and try again."
                .to_string(),
        },
        ApiError::File { path, .. } => Notice {
            category: ErrorCategory::Network,
            message: format!("Could not read {}.", path.display()),
        },
        ApiError::Status { status, message } => {
            let category = match status {
                400 | 413 | 415 | 422 => ErrorCategory::Validation,
                _ => ErrorCategory::Server,
            };
            let message = if message.is_empty() {
                match category {
                    ErrorCategory::Validation => "The server rejected the request.".to_string(),
                    _ => format!("The server failed to handle the request ({status})."),
                }
            } else {
                message.clone()
            };
            Notice { category, message }
        }
    }
}

pub fn normalize_validation_error(err: &ValidationError) -> Notice {
    Notice {
        category: ErrorCategory::Validation,
        message: err.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Error(ErrorCategory),
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub id: u64,
    pub level: ToastLevel,
    pub message: String,
    pub shown_at: Instant,
}

/// Toast queue shown in the corner of the window. Newest first, each entry
/// expires after a fixed lifetime.
#[derive(Debug)]
pub struct Toasts {
    entries: VecDeque<Toast>,
    next_id: u64,
    lifetime: Duration,
}

impl Default for Toasts {
    fn default() -> Self {
        Self::new(TOAST_LIFETIME)
    }
}

impl Toasts {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            entries: VecDeque::new(),
            next_id: 0,
            lifetime,
        }
    }

    fn push(&mut self, level: ToastLevel, message: String) {
        self.next_id += 1;
        self.entries.push_front(Toast {
            id: self.next_id,
            level,
            message,
            shown_at: Instant::now(),
        });
        self.entries.truncate(MAX_VISIBLE_TOASTS);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(ToastLevel::Success, message.into());
    }

    pub fn notice(&mut self, notice: Notice) {
        self.push(ToastLevel::Error(notice.category), notice.message);
    }

    /// Reports a failed backend call. Exactly one toast per call.
    pub fn api_error(&mut self, operation: &str, err: &ApiError) {
        warn!(operation, error = %err, "operation failed");
        self.notice(normalize_api_error(err));
    }

    pub fn validation_error(&mut self, err: &ValidationError) {
        self.notice(normalize_validation_error(err));
    }

    pub fn dismiss(&mut self, id: u64) {
        self.entries.retain(|toast| toast.id != id);
    }

    pub fn expire(&mut self, now: Instant) {
        let lifetime = self.lifetime;
        self.entries
            .retain(|toast| now.saturating_duration_since(toast.shown_at) < lifetime);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.entries.iter()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub fn error_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|toast| matches!(toast.level, ToastLevel::Error(_)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn status(status: u16, message: &str) -> ApiError {
        ApiError::Status {
            status,
            message: message.to_string(),
        }
    }

    #[test]
    fn server_failures_map_to_server_category() {
        let notice = normalize_api_error(&status(500, ""));
        assert_eq!(notice.category, ErrorCategory::Server);
        assert_eq!(notice.message, "The server failed to handle the request (500).");
    }

    #[test]
    fn unprocessable_requests_map_to_validation_category() {
        let notice = normalize_api_error(&status(422, "files: field required"));
        assert_eq!(notice.category, ErrorCategory::Validation);
        assert_eq!(notice.message, "files: field required");
    }

    #[test]
    fn unreadable_files_map_to_network_category() {
        let err = ApiError::File {
            path: PathBuf::from("/tmp/gone.pdf"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        let notice = normalize_api_error(&err);
        assert_eq!(notice.category, ErrorCategory::Network);
        assert!(notice.message.contains("gone.pdf"));
    }

    #[test]
    fn other_statuses_fall_back_to_server_category() {
        let notice = normalize_api_error(&status(404, "Project not found"));
        assert_eq!(notice.category, ErrorCategory::Server);
        assert_eq!(notice.message, "Project not found");
    }

    #[test]
    fn each_report_emits_exactly_one_toast() {
        let mut toasts = Toasts::default();
        toasts.api_error("upload", &status(500, "boom"));
        assert_eq!(toasts.len(), 1);
        toasts.validation_error(&ValidationError::NoFiles);
        assert_eq!(toasts.len(), 2);
        assert_eq!(toasts.error_count(), 2);
    }

    #[test]
    fn newest_toast_is_first() {
        let mut toasts = Toasts::default();
        toasts.success("first");
        toasts.success("second");
        let messages: Vec<&str> = toasts.iter().map(|toast| toast.message.as_str()).collect();
        assert_eq!(messages, vec!["second", "first"]);
    }

    #[test]
    fn toasts_expire_after_lifetime_and_can_be_dismissed() {
        let mut toasts = Toasts::new(Duration::from_millis(50));
        toasts.success("saved");
        toasts.success("again");
        let first_id = toasts.iter().last().map(|toast| toast.id).expect("toast exists");
        toasts.dismiss(first_id);
        assert_eq!(toasts.len(), 1);

        toasts.expire(Instant::now() + Duration::from_millis(100));
        assert!(toasts.is_empty());
    }
}
