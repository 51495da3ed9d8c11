use std::sync::Arc;

use marker_engine::{
    BackgroundError, JsonFileStore, KeyValueStore, MemoryStore, PersistError, StatusSync,
    SyncPorts,
};
use marker_logging::{marker_debug, marker_error, marker_info, marker_trace, marker_warn};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use super::config::HostConfig;
use super::frame::{read_frame, write_frame, FrameError, Inbound, Outbound};
use super::ports::{FrameCompanion, FrameTabMessenger};
use super::transport::Transport;

/// Persistent storage areas of the background.
pub struct Stores {
    pub local: Arc<dyn KeyValueStore>,
    pub sync: Arc<dyn KeyValueStore>,
}

impl Stores {
    /// JSON file areas under the configured storage directory.
    pub fn open(config: &HostConfig) -> Result<Self, PersistError> {
        Ok(Self {
            local: Arc::new(JsonFileStore::open(config.local_dir())?),
            sync: Arc::new(JsonFileStore::open(config.sync_dir())?),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            local: Arc::new(MemoryStore::new()),
            sync: Arc::new(MemoryStore::new()),
        }
    }
}

/// The background service wired to the browser through frames.
pub struct HostApp {
    sync: Arc<StatusSync>,
    transport: Arc<Transport>,
}

impl HostApp {
    pub fn new(
        config: &HostConfig,
        stores: Stores,
        outbound: mpsc::UnboundedSender<Outbound>,
    ) -> Self {
        let transport = Arc::new(Transport::new(outbound, config.reply_timeout()));
        let ports = SyncPorts {
            local: stores.local,
            // Session data is gone when the browser restarts, and so is the host.
            session: Arc::new(MemoryStore::new()),
            sync: stores.sync,
            tabs: Arc::new(FrameTabMessenger::new(transport.clone())),
            companion: Arc::new(FrameCompanion::new(
                transport.clone(),
                config.companion_id.clone(),
            )),
        };
        Self {
            sync: Arc::new(StatusSync::new(ports, config.companion_id.clone())),
            transport,
        }
    }

    pub fn sync(&self) -> &Arc<StatusSync> {
        &self.sync
    }

    pub fn transport(&self) -> &Arc<Transport> {
        &self.transport
    }

    /// Handle one frame other than a reply. Requests are always answered.
    pub async fn handle(&self, frame: Inbound) {
        match frame {
            Inbound::Request {
                id,
                sender,
                message,
            } => {
                let answer = match decode(message) {
                    Ok(message) => self
                        .sync
                        .handle_message(message, sender)
                        .await
                        .map(|answer| answer.unwrap_or(Value::Null)),
                    Err(err) => Err(err),
                };
                self.respond(id, answer);
            }
            Inbound::External {
                id,
                sender,
                message,
            } => {
                let answer = match decode(message) {
                    Ok(message) => self
                        .sync
                        .handle_external(&sender, message)
                        .await
                        .map(|_| Value::Null),
                    Err(err) => Err(err),
                };
                self.respond(id, answer);
            }
            Inbound::TabUpdated { tab, url } => {
                match self.sync.on_tab_url_changed(tab, &url).await {
                    Ok(change) => marker_trace!("tab {tab}: {change:?}"),
                    Err(err) => marker_error!("tracking tab {tab} failed: {err}"),
                }
            }
            Inbound::TabRemoved { tab } => {
                if let Err(err) = self.sync.on_tab_removed(tab).await {
                    marker_error!("forgetting tab {tab} failed: {err}");
                }
            }
            Inbound::Reply(reply) => {
                self.transport.resolve(reply);
            }
        }
    }

    fn respond(&self, id: u64, answer: Result<Value, BackgroundError>) {
        let frame = match answer {
            Ok(value) => Outbound::answer(id, value),
            Err(err) => {
                marker_debug!("request {id} failed: {err}");
                Outbound::failure(id, err.to_reply())
            }
        };
        if let Err(err) = self.transport.send(frame) {
            marker_debug!("response {id} dropped: {err}");
        }
    }
}

/// Serve frames from `reader` until the browser closes it. Replies are
/// matched inline; every other frame runs as its own task so a request
/// waiting on a tab or the companion never blocks the replies it needs.
pub async fn run<R, W>(
    config: HostConfig,
    stores: Stores,
    mut reader: R,
    writer: W,
) -> anyhow::Result<()>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let app = Arc::new(HostApp::new(&config, stores, outbound_tx));
    let writer_task = tokio::spawn(write_frames(writer, outbound_rx));
    let mut handlers = JoinSet::new();

    let outcome = loop {
        let value = match read_frame(&mut reader).await {
            Ok(Some(value)) => value,
            Ok(None) => break Ok(()),
            Err(FrameError::Json(err)) => {
                marker_warn!("dropping unreadable frame: {err}");
                continue;
            }
            Err(err) => break Err(err),
        };
        match serde_json::from_value::<Inbound>(value) {
            Ok(Inbound::Reply(reply)) => {
                app.transport.resolve(reply);
            }
            Ok(frame) => {
                let app = app.clone();
                handlers.spawn(async move { app.handle(frame).await });
            }
            Err(err) => marker_warn!("dropping unknown frame: {err}"),
        }
        while handlers.try_join_next().is_some() {}
    };

    marker_info!("browser disconnected, finishing {} handlers", handlers.len());
    app.transport.close();
    while handlers.join_next().await.is_some() {}
    drop(app);

    match writer_task.await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => marker_debug!("output closed early: {err}"),
        Err(err) => marker_error!("frame writer failed: {err}"),
    }
    outcome.map_err(anyhow::Error::from)
}

async fn write_frames<W>(
    mut writer: W,
    mut frames: mpsc::UnboundedReceiver<Outbound>,
) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(frame) = frames.recv().await {
        write_frame(&mut writer, &frame).await?;
    }
    Ok(())
}

fn decode(message: Value) -> Result<marker_core::Message, BackgroundError> {
    serde_json::from_value(message).map_err(|err| BackgroundError::BadRequest(err.to_string()))
}
