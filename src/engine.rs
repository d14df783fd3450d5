//! Duplex protocol engine.
//!
//! [`ProtocolEngine`] owns both halves of a CLI connection. A background task
//! drains the [`MessageParser`] into a bounded queue; callers pull chat
//! messages from that queue and write user input or JSON-RPC requests to the
//! sink.
//!
//! # Two grammars, one stream
//!
//! MCP responses arrive on the same stdout as chat records. They carry no chat
//! `type` and therefore decode as [`Message::Unknown`]. The `mcp_*` calls find
//! their response by re-parsing the raw bytes of unknown messages and drop
//! every other message they read, so chat messages that arrive while a call
//! is waiting are lost to chat consumers. Run one RPC call at a time and do
//! not read chat messages concurrently with it.

use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::parser::MessageParser;
use crate::protocol::{
    InitializeParams, InitializeResult, JsonRpcRequest, JsonRpcResponse, Message, ToolsCallParams,
    ToolsCallResult, ToolsListResult, UserInput,
};
use crate::{Error, Result};

/// Capacity of the queue between the reader task and callers.
pub const READ_QUEUE_CAPACITY: usize = 128;

type Sink = Box<dyn AsyncWrite + Send + Unpin>;

struct WriterState {
    sink: Option<Sink>,
    next_id: u64,
}

struct ReaderState {
    rx: mpsc::Receiver<Result<Message>>,
    finished: bool,
}

/// Reads chat messages and speaks JSON-RPC over one duplex byte stream.
///
/// Every operation takes `&self`, so an engine can be shared behind an `Arc`.
/// Writes are serialized by one lock and reads by another. Each call takes a
/// [`CancellationToken`]; firing it makes that call return
/// [`Error::Cancelled`] without affecting the stream.
pub struct ProtocolEngine {
    writer: Mutex<WriterState>,
    reader: Mutex<ReaderState>,
    task: Mutex<Option<JoinHandle<()>>>,
    closed: CancellationToken,
}

impl std::fmt::Debug for ProtocolEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtocolEngine")
            .field("closed", &self.closed.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl ProtocolEngine {
    /// Start an engine over `reader` and `writer`.
    ///
    /// Spawns the reader task, so this must run inside a tokio runtime.
    pub fn new<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(READ_QUEUE_CAPACITY);
        let task = tokio::spawn(read_loop(MessageParser::new(reader), tx));

        Self {
            writer: Mutex::new(WriterState {
                sink: Some(Box::new(writer)),
                next_id: 1,
            }),
            reader: Mutex::new(ReaderState {
                rx,
                finished: false,
            }),
            task: Mutex::new(Some(task)),
            closed: CancellationToken::new(),
        }
    }

    /// Check whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Validate, encode and write one user input record.
    ///
    /// Validation failures return before anything is written.
    pub async fn send_user_input(&self, input: &UserInput, cancel: &CancellationToken) -> Result<()> {
        check_cancelled(cancel)?;
        let payload = input.encode()?;
        let mut writer = self.lock_writer(cancel).await?;
        self.write_payload(&mut writer, payload.as_bytes()).await
    }

    /// Wait for the next message from the CLI.
    ///
    /// Returns the terminal stream error once, then [`Error::StreamClosed`]
    /// for every later call.
    pub async fn next_message(&self, cancel: &CancellationToken) -> Result<Message> {
        check_cancelled(cancel)?;
        if self.is_closed() {
            return Err(Error::StreamClosed);
        }

        let mut reader = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            _ = self.closed.cancelled() => return Err(Error::StreamClosed),
            guard = self.reader.lock() => guard,
        };
        if reader.finished {
            return Err(Error::StreamClosed);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            _ = self.closed.cancelled() => Err(Error::StreamClosed),
            item = reader.rx.recv() => match item {
                Some(Ok(message)) => Ok(message),
                Some(Err(err)) => {
                    reader.finished = true;
                    Err(err)
                }
                None => {
                    reader.finished = true;
                    Err(Error::StreamClosed)
                }
            },
        }
    }

    /// Send `initialize` and wait for its result.
    pub async fn mcp_initialize(
        &self,
        params: &InitializeParams,
        cancel: &CancellationToken,
    ) -> Result<InitializeResult> {
        let params = to_params(params, "initialize params")?;
        self.request("initialize", params, cancel).await
    }

    /// Send the `initialized` notification.
    ///
    /// Returns as soon as the notification is written. `params` defaults to
    /// an empty object.
    pub async fn mcp_initialized(&self, params: Option<Value>, cancel: &CancellationToken) -> Result<()> {
        check_cancelled(cancel)?;
        let request = JsonRpcRequest::notification("initialized", params.unwrap_or_else(empty_params));
        let line = request_line(&request)?;
        let mut writer = self.lock_writer(cancel).await?;
        self.write_payload(&mut writer, line.as_bytes()).await?;
        trace!(method = "initialized", "jsonrpc notification written");
        Ok(())
    }

    /// Send `tools/list` and wait for its result.
    pub async fn mcp_tools_list(&self, cancel: &CancellationToken) -> Result<ToolsListResult> {
        self.request("tools/list", empty_params(), cancel).await
    }

    /// Send `tools/call` and wait for its result.
    pub async fn mcp_tools_call(
        &self,
        params: &ToolsCallParams,
        cancel: &CancellationToken,
    ) -> Result<ToolsCallResult> {
        let params = to_params(params, "tools/call params")?;
        self.request("tools/call", params, cancel).await
    }

    /// Close the engine.
    ///
    /// Shuts the sink down and stops the reader task. Calls waiting on the
    /// stream, including a write blocked on a peer that stopped reading,
    /// return [`Error::StreamClosed`]. Safe to call more than once; only the
    /// first call can fail.
    pub async fn close(&self) -> Result<()> {
        self.closed.cancel();

        let sink = self.writer.lock().await.sink.take();
        let mut first_err = None;
        if let Some(mut sink) = sink {
            if let Err(e) = sink.shutdown().await {
                warn!(error = %e, "failed to shut down protocol sink");
                first_err = Some(Error::Io(e));
            }
        }

        if let Some(task) = self.task.lock().await.take() {
            task.abort();
        }

        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn request<T>(&self, method: &'static str, params: Value, cancel: &CancellationToken) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        check_cancelled(cancel)?;
        let id = {
            let mut writer = self.lock_writer(cancel).await?;
            let id = writer.next_id;
            writer.next_id += 1;
            let line = request_line(&JsonRpcRequest::new(id, method, params))?;
            self.write_payload(&mut writer, line.as_bytes()).await?;
            id
        };
        trace!(id, method, "jsonrpc request written");

        loop {
            let message = self.next_message(cancel).await?;
            let Message::Unknown(unknown) = &message else {
                trace!(id, message_type = message.message_type(), "discarding chat message while waiting for response");
                continue;
            };
            let response = match serde_json::from_slice::<JsonRpcResponse>(unknown.raw()) {
                Ok(response) if response.answers(id) => response,
                _ => {
                    trace!(id, "discarding unrelated record while waiting for response");
                    continue;
                }
            };

            if let Some(error) = response.error {
                return Err(Error::Rpc {
                    code: error.code,
                    message: error.message,
                    data: error.data,
                });
            }
            return match response.result {
                None | Some(Value::Null) => Ok(T::default()),
                Some(result) => {
                    serde_json::from_value(result).map_err(|source| Error::RpcDecode { method, source })
                }
            };
        }
    }

    async fn lock_writer(&self, cancel: &CancellationToken) -> Result<MutexGuard<'_, WriterState>> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            _ = self.closed.cancelled() => Err(Error::StreamClosed),
            guard = self.writer.lock() => Ok(guard),
        }
    }

    /// Write and flush one payload.
    ///
    /// A write cut short by [`close`](Self::close) drops the sink, since the
    /// peer may have seen a partial record.
    async fn write_payload(&self, writer: &mut WriterState, payload: &[u8]) -> Result<()> {
        let sink = writer.sink.as_mut().ok_or(Error::StreamClosed)?;
        let written = tokio::select! {
            biased;
            _ = self.closed.cancelled() => None,
            result = async {
                sink.write_all(payload).await?;
                sink.flush().await
            } => Some(result),
        };

        match written {
            Some(result) => Ok(result?),
            None => {
                writer.sink = None;
                debug!("write interrupted by close");
                Err(Error::StreamClosed)
            }
        }
    }
}

impl Drop for ProtocolEngine {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}

async fn read_loop<R>(mut parser: MessageParser<R>, tx: mpsc::Sender<Result<Message>>)
where
    R: AsyncRead + Unpin,
{
    loop {
        let item = parser.next().await;
        let terminal = item.is_err();
        if tx.send(item).await.is_err() {
            debug!("message receiver dropped, stopping reader");
            return;
        }
        if terminal {
            debug!("reader reached end of stream");
            return;
        }
    }
}

fn check_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    Ok(())
}

fn empty_params() -> Value {
    Value::Object(serde_json::Map::new())
}

fn to_params<T: serde::Serialize>(params: &T, what: &'static str) -> Result<Value> {
    serde_json::to_value(params).map_err(|source| Error::Encode { what, source })
}

fn request_line(request: &JsonRpcRequest) -> Result<String> {
    let mut line = serde_json::to_string(request).map_err(|source| Error::Encode {
        what: "jsonrpc request",
        source,
    })?;
    line.push('\n');
    Ok(line)
}

/// Run a future with a timeout.
///
/// An elapsed deadline becomes [`Error::Timeout`].
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(duration)),
    }
}

/// A token that cancels itself after `duration`.
///
/// Spawns a timer task, so this must run inside a tokio runtime.
pub fn deadline_token(duration: Duration) -> CancellationToken {
    let token = CancellationToken::new();
    let timer = token.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(duration) => timer.cancel(),
            _ = timer.cancelled() => {}
        }
    });
    token
}
