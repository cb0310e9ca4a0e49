use async_trait::async_trait;
use anyhow::Result;
use std::collections::VecDeque;
use tokio::sync::mpsc;

/// 原始消息来源：实时连接或静态回放
#[async_trait]
pub trait SampleSource: Send {
    /// `None` once the source is exhausted or closed.
    async fn next_message(&mut self) -> Result<Option<String>>;
}

pub struct ChannelSource {
    receiver: mpsc::Receiver<String>,
}

impl ChannelSource {
    pub fn new(capacity: usize) -> (mpsc::Sender<String>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self { receiver: rx })
    }
}

#[async_trait]
impl SampleSource for ChannelSource {
    async fn next_message(&mut self) -> Result<Option<String>> {
        Ok(self.receiver.recv().await)
    }
}

/// Replays recorded messages in order.
pub struct ReplaySource {
    messages: VecDeque<String>,
}

impl ReplaySource {
    pub fn new(messages: impl IntoIterator<Item = String>) -> Self {
        Self {
            messages: messages.into_iter().collect(),
        }
    }

    /// One message per non-blank line.
    pub fn from_lines(text: &str) -> Self {
        Self::new(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        )
    }
}

#[async_trait]
impl SampleSource for ReplaySource {
    async fn next_message(&mut self) -> Result<Option<String>> {
        Ok(self.messages.pop_front())
    }
}
