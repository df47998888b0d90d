use tokio::task::JoinHandle;

/// Progressive reveal of a fully received string, one character per step.
#[derive(Debug, Clone)]
pub struct Reveal {
    target: String,
    cursor: usize,
}

impl Reveal {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            cursor: 0,
        }
    }

    /// Extends the visible prefix by one character and returns it, or `None`
    /// once everything is visible.
    pub fn advance(&mut self) -> Option<&str> {
        let next = self.target[self.cursor..].chars().next()?;
        self.cursor += next.len_utf8();
        Some(&self.target[..self.cursor])
    }

    pub fn revealed(&self) -> &str {
        &self.target[..self.cursor]
    }

    pub fn is_complete(&self) -> bool {
        self.cursor >= self.target.len()
    }
}

/// One active reveal bound to a transcript entry. Dropping the handle stops
/// its tick task.
#[derive(Debug)]
pub struct StreamHandle {
    pub id: u64,
    pub message_index: usize,
    pub reveal: Reveal,
    ticker: JoinHandle<()>,
}

impl StreamHandle {
    pub fn new(id: u64, message_index: usize, reveal: Reveal, ticker: JoinHandle<()>) -> Self {
        Self {
            id,
            message_index,
            reveal,
            ticker,
        }
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.ticker.abort();
    }
}
