use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader},
    sync::{
        mpsc::{self, error::TryRecvError},
        Mutex,
    },
};
use tracing::{debug, info, warn};

use super::{ChatError, ChatInterface, ChatMessage, ChatResult, ChatSite, RoomDescriptor};
use crate::config::BotConfig;

pub const CONSOLE_ROOM_ID: u64 = 0;
pub const CONSOLE_USER_ID: u64 = 1;

/// Runs the bot against a terminal: every input line is a message in room
/// [`CONSOLE_ROOM_ID`], every outgoing message is written as one line.
///
/// Must be created inside a tokio runtime, since input is read by a
/// background task.
pub struct ConsoleChat {
    site: ChatSite,
    lines: Mutex<mpsc::UnboundedReceiver<String>>,
    output: Mutex<Box<dyn AsyncWrite + Unpin + Send>>,
    next_message_id: AtomicU64,
}

impl ConsoleChat {
    pub fn new<R, W>(site: ChatSite, input: R, output: W) -> Self
    where
        R: AsyncBufRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let mut lines = input.lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if sender.send(line).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Failed to read console input: {}", e);
                        break;
                    }
                }
            }
            debug!("console input closed");
        });

        Self {
            site,
            lines: Mutex::new(receiver),
            output: Mutex::new(Box::new(output)),
            next_message_id: AtomicU64::new(1),
        }
    }

    pub fn stdio(site: ChatSite) -> Self {
        Self::new(site, BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }

    fn message(&self, line: String) -> ChatMessage {
        ChatMessage {
            site: self.site,
            message_id: self.next_message_id.fetch_add(1, Ordering::SeqCst),
            room_id: CONSOLE_ROOM_ID,
            room_name: "console".to_string(),
            user_id: CONSOLE_USER_ID,
            username: "console".to_string(),
            message: line,
        }
    }

    async fn write_line(&self, line: &str) -> ChatResult<()> {
        let mut output = self.output.lock().await;
        output
            .write_all(format!("{}\n", line).as_bytes())
            .await
            .map_err(|e| ChatError::fatal(format!("Failed to write console output: {}", e)))?;
        output
            .flush()
            .await
            .map_err(|e| ChatError::fatal(format!("Failed to flush console output: {}", e)))
    }
}

#[async_trait]
impl ChatInterface for ConsoleChat {
    async fn login(&self, site: ChatSite, _config: &BotConfig) -> ChatResult<bool> {
        info!("console session on {}", site);
        Ok(true)
    }

    async fn join_chat(&self, room: &RoomDescriptor) -> ChatResult<()> {
        info!("joined {}", room.url());
        Ok(())
    }

    async fn leave_chat(&self, room_id: u64) -> ChatResult<()> {
        info!("left room {}", room_id);
        Ok(())
    }

    async fn query_messages(&self) -> ChatResult<Vec<ChatMessage>> {
        let mut lines = self.lines.lock().await;
        let mut messages = Vec::new();
        loop {
            match lines.try_recv() {
                Ok(line) => messages.push(self.message(line)),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if messages.is_empty() {
                        return Err(ChatError::Closed);
                    }
                    break;
                }
            }
        }
        Ok(messages)
    }

    async fn send_message(&self, room_id: u64, text: &str) -> ChatResult<()> {
        self.write_line(&format!("[room {}] {}", room_id, text))
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::AsyncReadExt;

    use super::*;

    async fn drain(chat: &ConsoleChat) -> Vec<ChatMessage> {
        let mut messages = Vec::new();
        for _ in 0..50 {
            match chat.query_messages().await {
                Ok(batch) => messages.extend(batch),
                Err(ChatError::Closed) => break,
                Err(e) => panic!("unexpected chat error: {}", e),
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        messages
    }

    #[tokio::test]
    async fn test_lines_become_messages() {
        let input: &'static [u8] = b"hello there\n!!echo hi\n";
        let chat = ConsoleChat::new(ChatSite::StackOverflow, input, tokio::io::sink());

        let messages = drain(&chat).await;

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].message, "hello there");
        assert_eq!(messages[0].room_id, CONSOLE_ROOM_ID);
        assert_eq!(messages[1].message, "!!echo hi");
        assert!(messages[1].message_id > messages[0].message_id);
    }

    #[tokio::test]
    async fn test_closed_input() {
        let input: &'static [u8] = b"";
        let chat = ConsoleChat::new(ChatSite::StackOverflow, input, tokio::io::sink());
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(chat.query_messages().await, Err(ChatError::Closed));
    }

    #[tokio::test]
    async fn test_send_message_writes_line() {
        let input: &'static [u8] = b"";
        let (writer, mut reader) = tokio::io::duplex(256);
        let chat = ConsoleChat::new(ChatSite::StackOverflow, input, writer);

        chat.send_message(0, ":1 hi").await.unwrap();
        drop(chat);

        let mut written = String::new();
        reader.read_to_string(&mut written).await.unwrap();
        assert_eq!(written, "[room 0] :1 hi\n");
    }
}
