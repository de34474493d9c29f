use async_trait::async_trait;
use log::{debug, error, info, warn};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::channel::{Connector, Port, PortSender};
use super::protocol::{BridgeMessage, new_request_id};
use crate::app_config::Settings;
use crate::captions::{CaptionLine, RemoteTranslator};
use crate::errors::BridgeError;
use crate::providers::Vendor;

type Reply = Result<Vec<CaptionLine>, BridgeError>;

struct PendingRequest {
    vendor: Vendor,
    reply: oneshot::Sender<Reply>,
}

/// Outstanding requests of one connection
#[derive(Default)]
struct PendingTable {
    requests: HashMap<String, PendingRequest>,
    /// Set once the reader has stopped; no request may register after that
    closed: bool,
}

impl PendingTable {
    fn fail_all(&mut self) {
        self.closed = true;
        for (request_id, pending) in self.requests.drain() {
            debug!("Failing request {} ({}): disconnected", request_id, pending.vendor);
            let _ = pending.reply.send(Err(BridgeError::Disconnected));
        }
    }
}

/// Removes a request from the table when the caller stops waiting for it
struct PendingGuard {
    table: Arc<Mutex<PendingTable>>,
    request_id: String,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.table.lock().requests.remove(&self.request_id);
    }
}

struct Connection {
    sender: PortSender,
    table: Arc<Mutex<PendingTable>>,
    reader: JoinHandle<()>,
}

impl Connection {
    fn start(port: Port, settings: Arc<RwLock<Settings>>) -> Self {
        let (sender, receiver) = port.split();
        let table = Arc::new(Mutex::new(PendingTable::default()));
        let reader = tokio::spawn(read_frames(receiver, table.clone(), settings));
        Self {
            sender,
            table,
            reader,
        }
    }

    fn is_open(&self) -> bool {
        !self.sender.is_closed() && !self.table.lock().closed
    }
}

/// Untrusted side of the bridge.
///
/// Sends translation requests to the trusted context and routes each
/// result back to the caller that issued the matching `requestId`.
pub struct BridgeClient {
    connector: Arc<dyn Connector>,
    connection: tokio::sync::Mutex<Option<Connection>>,
    /// Last settings received from the trusted side
    settings: Arc<RwLock<Settings>>,
}

impl std::fmt::Debug for BridgeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeClient")
            .field("connector", &self.connector)
            .finish_non_exhaustive()
    }
}

impl BridgeClient {
    /// Create a client; `settings` gates vendors until the trusted side dispatches its own
    pub fn new(connector: Arc<dyn Connector>, settings: Settings) -> Self {
        Self {
            connector,
            connection: tokio::sync::Mutex::new(None),
            settings: Arc::new(RwLock::new(settings)),
        }
    }

    /// Current view of the settings
    pub fn settings(&self) -> Settings {
        self.settings.read().clone()
    }

    /// Open the channel now instead of on the first request
    pub async fn connect(&self) -> Result<(), BridgeError> {
        self.open().await.map(|_| ())
    }

    pub async fn is_connected(&self) -> bool {
        self.connection
            .lock()
            .await
            .as_ref()
            .is_some_and(Connection::is_open)
    }

    /// Close the channel; outstanding requests fail with `Disconnected`
    pub async fn disconnect(&self) {
        if let Some(connection) = self.connection.lock().await.take() {
            connection.table.lock().fail_all();
            connection.reader.abort();
            info!("Disconnected from trusted context");
        }
    }

    /// Number of requests still waiting for a result
    pub async fn pending_requests(&self) -> usize {
        match self.connection.lock().await.as_ref() {
            Some(connection) => connection.table.lock().requests.len(),
            None => 0,
        }
    }

    /// Reuse the open channel, or make one connection attempt
    async fn open(&self) -> Result<(PortSender, Arc<Mutex<PendingTable>>), BridgeError> {
        let mut slot = self.connection.lock().await;
        if let Some(connection) = slot.as_ref().filter(|c| c.is_open()) {
            return Ok((connection.sender.clone(), connection.table.clone()));
        }

        if let Some(stale) = slot.take() {
            stale.reader.abort();
        }

        info!("Connecting to trusted context");
        let port = self.connector.connect().await.map_err(|e| {
            error!("Failed to connect to trusted context: {}", e);
            match e {
                BridgeError::ConnectFailed(_) => e,
                other => BridgeError::ConnectFailed(other.to_string()),
            }
        })?;

        let connection = Connection::start(port, self.settings.clone());
        let handles = (connection.sender.clone(), connection.table.clone());
        *slot = Some(connection);
        Ok(handles)
    }

    /// Send one translation request and wait for its matching result
    pub async fn request_translation(
        &self,
        vendor: Vendor,
        from_lang: &str,
        to_lang: &str,
        lines: Vec<CaptionLine>,
    ) -> Result<Vec<CaptionLine>, BridgeError> {
        if !self.settings.read().vendor_enabled(vendor) {
            warn!("{} translation requested but not enabled", vendor);
            return Err(BridgeError::CapabilityDisabled(vendor));
        }

        let (sender, table) = self.open().await?;
        let request_id = new_request_id();
        let (reply_tx, reply_rx) = oneshot::channel();

        {
            let mut table = table.lock();
            if table.closed {
                return Err(BridgeError::Disconnected);
            }
            table.requests.insert(
                request_id.clone(),
                PendingRequest {
                    vendor,
                    reply: reply_tx,
                },
            );
        }
        let _guard = PendingGuard {
            table,
            request_id: request_id.clone(),
        };

        let frame = BridgeMessage::TranslationRequest {
            request_id: request_id.clone(),
            vendor,
            from_lang_code: from_lang.to_string(),
            to_lang_code: to_lang.to_string(),
            from_lines: lines,
        }
        .encode()?;
        sender.send(frame)?;
        info!("Translation requested {} ({}, {} -> {})", request_id, vendor, from_lang, to_lang);

        reply_rx.await.map_err(|_| BridgeError::Disconnected)?
    }
}

#[async_trait]
impl RemoteTranslator for BridgeClient {
    async fn translate(
        &self,
        vendor: Vendor,
        from_lang: &str,
        to_lang: &str,
        lines: Vec<CaptionLine>,
    ) -> Result<Vec<CaptionLine>, BridgeError> {
        self.request_translation(vendor, from_lang, to_lang, lines).await
    }
}

async fn read_frames(
    mut receiver: mpsc::UnboundedReceiver<String>,
    table: Arc<Mutex<PendingTable>>,
    settings: Arc<RwLock<Settings>>,
) {
    while let Some(frame) = receiver.recv().await {
        let message = match BridgeMessage::decode(&frame) {
            Ok(message) => message,
            Err(e) => {
                warn!("Ignoring undecodable frame: {}", e);
                continue;
            }
        };

        match message {
            BridgeMessage::TranslationResult {
                vendor,
                request_id,
                translated_lines,
                err,
            } => {
                let mut table = table.lock();
                let matches = table
                    .requests
                    .get(&request_id)
                    .is_some_and(|pending| pending.vendor == vendor);
                if !matches {
                    debug!("No listener for result {} ({})", request_id, vendor);
                    continue;
                }
                let Some(pending) = table.requests.remove(&request_id) else {
                    continue;
                };
                let reply = match (translated_lines, err) {
                    (Some(lines), _) => Ok(lines),
                    (None, Some(err)) => Err(err.into_bridge_error(vendor)),
                    (None, None) => Err(BridgeError::Protocol(format!(
                        "result {} carries neither lines nor error",
                        request_id
                    ))),
                };
                let _ = pending.reply.send(reply);
            }
            BridgeMessage::DispatchSettings { settings: dispatched } => {
                debug!("Settings dispatched by trusted context");
                *settings.write() = dispatched;
            }
            BridgeMessage::TranslationRequest { request_id, .. } => {
                warn!("Unexpected translation request {} on the untrusted side", request_id);
            }
        }
    }

    info!("Trusted context closed the channel");
    table.lock().fail_all();
}
