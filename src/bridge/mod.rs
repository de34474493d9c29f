/*!
 * Request/response bridge between the untrusted and the trusted context.
 *
 * The untrusted side (`BridgeClient`) holds no credentials; it sends
 * `TRANSLATION_REQUEST` frames and waits for the `TRANSLATION_RESULT` with
 * the same `requestId` and vendor. The trusted side (`BridgeServer`) owns
 * the settings and the vendor rate limiters, and answers every request,
 * including the ones for disabled vendors.
 */

pub mod channel;
pub mod client;
pub mod protocol;
pub mod server;

pub use channel::{Connector, Port, PortSender};
pub use client::BridgeClient;
pub use protocol::{BridgeMessage, RemoteError};
pub use server::{BridgeServer, HttpVendorFactory, LocalConnector, VendorFactory};
