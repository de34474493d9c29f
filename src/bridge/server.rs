use async_trait::async_trait;
use log::{debug, error, info, warn};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::task::JoinHandle;

use super::channel::{Connector, Port, PortSender};
use super::protocol::{BridgeMessage, INVALID_CONFIG, RemoteError, TRANSLATION_FAILED};
use crate::app_config::Settings;
use crate::captions::CaptionLine;
use crate::errors::{BridgeError, ProviderError};
use crate::providers::deepl::DeepL;
use crate::providers::tencent::Tencent;
use crate::providers::{DEFAULT_VENDOR_QPS, TranslationVendor, Vendor, translate_lines};
use crate::rate_limiter::RateLimiter;

/// Builds vendor clients from the current settings
pub trait VendorFactory: Send + Sync + Debug {
    fn create(&self, vendor: Vendor, settings: &Settings) -> Result<Arc<dyn TranslationVendor>, ProviderError>;
}

/// Real HTTP vendor clients sharing one connection pool
#[derive(Debug, Clone, Default)]
pub struct HttpVendorFactory {
    client: reqwest::Client,
}

impl HttpVendorFactory {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl VendorFactory for HttpVendorFactory {
    fn create(&self, vendor: Vendor, settings: &Settings) -> Result<Arc<dyn TranslationVendor>, ProviderError> {
        let client: Arc<dyn TranslationVendor> = match vendor {
            Vendor::Tencent => Arc::new(Tencent::from_settings(self.client.clone(), settings)?),
            Vendor::DeepL => Arc::new(DeepL::from_settings(self.client.clone(), settings)?),
        };
        Ok(client)
    }
}

/// Trusted side of the bridge.
///
/// Holds the credentials, answers every translation request on every
/// connected port, and throttles each vendor through its own limiter.
#[derive(Debug)]
pub struct BridgeServer {
    settings: RwLock<Settings>,
    factory: Arc<dyn VendorFactory>,
    tencent_limiter: RateLimiter,
    deepl_limiter: RateLimiter,
    ports: Mutex<HashMap<u64, PortSender>>,
    next_port_id: AtomicU64,
}

impl BridgeServer {
    pub fn new(settings: Settings, factory: Arc<dyn VendorFactory>) -> Self {
        Self::with_qps(settings, factory, DEFAULT_VENDOR_QPS)
    }

    /// Like `new`, with a custom per-vendor rate
    pub fn with_qps(settings: Settings, factory: Arc<dyn VendorFactory>, qps: u32) -> Self {
        Self {
            settings: RwLock::new(settings),
            factory,
            tencent_limiter: RateLimiter::new(qps),
            deepl_limiter: RateLimiter::new(qps),
            ports: Mutex::new(HashMap::new()),
            next_port_id: AtomicU64::new(0),
        }
    }

    pub fn settings(&self) -> Settings {
        self.settings.read().clone()
    }

    fn limiter(&self, vendor: Vendor) -> &RateLimiter {
        match vendor {
            Vendor::Tencent => &self.tencent_limiter,
            Vendor::DeepL => &self.deepl_limiter,
        }
    }

    /// Replace the settings and push them to every connected port
    pub fn update_settings(&self, settings: Settings) {
        *self.settings.write() = settings;
        self.dispatch_settings();
    }

    /// `DISPATCH_SETTINGS` frame carrying the current settings without credentials
    fn settings_frame(&self) -> Option<String> {
        let settings = self.settings.read().redacted();
        BridgeMessage::DispatchSettings { settings }
            .encode()
            .map_err(|e| error!("Failed to encode settings: {}", e))
            .ok()
    }

    fn dispatch_settings(&self) {
        let Some(frame) = self.settings_frame() else {
            return;
        };

        self.ports.lock().retain(|port_id, sender| match sender.send(frame.clone()) {
            Ok(()) => true,
            Err(_) => {
                debug!("Dropping closed port {}", port_id);
                false
            }
        });
    }

    /// Number of ports currently served
    pub fn connected_ports(&self) -> usize {
        self.ports.lock().len()
    }

    /// Serve one port until the peer disconnects
    pub fn serve(self: &Arc<Self>, port: Port) -> JoinHandle<()> {
        let port_id = self.next_port_id.fetch_add(1, Ordering::Relaxed);
        let (sender, mut receiver) = port.split();
        self.ports.lock().insert(port_id, sender.clone());
        info!("Connected port {}", port_id);

        if let Some(frame) = self.settings_frame() {
            let _ = sender.send(frame);
        }

        let server = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(frame) = receiver.recv().await {
                match BridgeMessage::decode(&frame) {
                    Ok(BridgeMessage::TranslationRequest {
                        request_id,
                        vendor,
                        from_lang_code,
                        to_lang_code,
                        from_lines,
                    }) => {
                        info!("Receive translation request {} ({})", request_id, vendor);
                        let server = server.clone();
                        let sender = sender.clone();
                        tokio::spawn(async move {
                            let outcome = server
                                .handle_request(vendor, &from_lang_code, &to_lang_code, from_lines)
                                .await;
                            if let Err(e) = outcome.as_ref() {
                                error!("Translation {} ({}) failed: {}", request_id, vendor, e.message);
                            }
                            let reply = BridgeMessage::result(vendor, request_id, outcome).encode();
                            match reply {
                                Ok(frame) => {
                                    if sender.send(frame).is_err() {
                                        debug!("Port {} closed before the result was sent", port_id);
                                    }
                                }
                                Err(e) => error!("Failed to encode translation result: {}", e),
                            }
                        });
                    }
                    Ok(other) => warn!("Unexpected message on port {}: {:?}", port_id, other),
                    Err(e) => warn!("Ignoring undecodable frame on port {}: {}", port_id, e),
                }
            }

            server.ports.lock().remove(&port_id);
            info!("Disconnected port {}", port_id);
        })
    }

    /// Translate one request; a disabled vendor is answered with `CAPABILITY_DISABLED`
    pub async fn handle_request(
        &self,
        vendor: Vendor,
        from_lang: &str,
        to_lang: &str,
        from_lines: Vec<CaptionLine>,
    ) -> Result<Vec<CaptionLine>, RemoteError> {
        let settings = self.settings();
        if !settings.vendor_enabled(vendor) {
            error!("{} is not enabled", vendor);
            return Err(RemoteError::capability_disabled(vendor));
        }

        let client = self
            .factory
            .create(vendor, &settings)
            .map_err(|e| RemoteError::new(INVALID_CONFIG, e.to_string()))?;

        translate_lines(client, self.limiter(vendor), &from_lines, from_lang, to_lang)
            .await
            .map_err(|e| RemoteError::new(TRANSLATION_FAILED, e.to_string()))
    }
}

/// Connects to a `BridgeServer` in the same process
#[derive(Debug, Clone)]
pub struct LocalConnector {
    server: Arc<BridgeServer>,
}

impl LocalConnector {
    pub fn new(server: Arc<BridgeServer>) -> Self {
        Self { server }
    }
}

#[async_trait]
impl Connector for LocalConnector {
    async fn connect(&self) -> Result<Port, BridgeError> {
        let (client_end, server_end) = Port::pair();
        self.server.serve(server_end);
        Ok(client_end)
    }
}
