use async_trait::async_trait;
use std::fmt::Debug;
use tokio::sync::mpsc;

use crate::errors::BridgeError;

/// Sending half of a port; cheap to clone
#[derive(Debug, Clone)]
pub struct PortSender {
    tx: mpsc::UnboundedSender<String>,
}

impl PortSender {
    pub fn send(&self, frame: String) -> Result<(), BridgeError> {
        self.tx.send(frame).map_err(|_| BridgeError::Disconnected)
    }

    /// The other end has gone away
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// One end of a bidirectional, text-framed message channel.
///
/// Either side drops its end to disconnect; the peer then sees its
/// receiver close.
#[derive(Debug)]
pub struct Port {
    sender: PortSender,
    receiver: mpsc::UnboundedReceiver<String>,
}

impl Port {
    /// Two connected ends
    pub fn pair() -> (Port, Port) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();
        (
            Port {
                sender: PortSender { tx: a_tx },
                receiver: b_rx,
            },
            Port {
                sender: PortSender { tx: b_tx },
                receiver: a_rx,
            },
        )
    }

    pub fn split(self) -> (PortSender, mpsc::UnboundedReceiver<String>) {
        (self.sender, self.receiver)
    }
}

/// Opens a port to the trusted context
#[async_trait]
pub trait Connector: Send + Sync + Debug {
    async fn connect(&self) -> Result<Port, BridgeError>;
}
