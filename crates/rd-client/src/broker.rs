//! Broker connection
//!
//! [`BrokerClient`] is used directly for request/response exchanges (login,
//! key generation). Once a call may start, [`BrokerClient::into_parts`] hands
//! out an outbound sender for the session lifecycle and an inbound stream of
//! broker messages.

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;

use rd_core::error::{AuthError, RdError};
use rd_core::types::Identity;
use rd_protocol::{ClientMessage, JsonLinesCodec, ProtocolError, ServerMessage};

/// Codec as seen from the client side
pub type ClientCodec = JsonLinesCodec<ServerMessage, ClientMessage>;

type Transport = Framed<TcpStream, ClientCodec>;

/// Connection to the broker
pub struct BrokerClient {
    framed: Transport,
}

impl BrokerClient {
    /// Connect to the broker at `address`
    pub async fn connect(address: &str) -> Result<Self, RdError> {
        let stream = TcpStream::connect(address).await?;
        tracing::debug!("Connected to broker at {}", address);
        Ok(Self {
            framed: Framed::new(stream, ClientCodec::new()),
        })
    }

    /// Send one message
    pub async fn send(&mut self, message: ClientMessage) -> Result<(), RdError> {
        self.framed.send(message).await?;
        Ok(())
    }

    /// Next message from the broker, or `None` when the connection closes.
    ///
    /// Lines that do not parse are logged and skipped.
    pub async fn recv(&mut self) -> Result<Option<ServerMessage>, RdError> {
        next_message(&mut self.framed).await
    }

    /// Log in and wait for the verdict
    pub async fn login(&mut self, identifier: &str, secret: &str) -> Result<Identity, RdError> {
        self.send(ClientMessage::Login {
            identifier: identifier.to_string(),
            secret: secret.to_string(),
        })
        .await?;

        loop {
            match self.recv().await? {
                Some(ServerMessage::LoginSuccess { identifier }) => {
                    tracing::info!("Logged in as {}", identifier);
                    return Ok(Identity::new(identifier));
                }
                Some(ServerMessage::LoginFail) => return Err(AuthError::InvalidCredentials.into()),
                Some(other) => {
                    tracing::debug!("Skipping {} while waiting for login", other.kind());
                }
                None => return Err(closed()),
            }
        }
    }

    /// Ask for a fresh access key for the logged-in identity
    pub async fn generate_access_key(&mut self) -> Result<String, RdError> {
        self.send(ClientMessage::GenerateAccessKey).await?;

        loop {
            match self.recv().await? {
                Some(ServerMessage::AccessKeyGenerated { key }) => return Ok(key),
                Some(other) => {
                    tracing::debug!("Skipping {} while waiting for access key", other.kind());
                }
                None => return Err(closed()),
            }
        }
    }

    /// Split into an outbound queue and an inbound stream.
    ///
    /// A background task drains the queue into the socket until every
    /// sender is dropped or a write fails.
    pub fn into_parts(self, capacity: usize) -> (mpsc::Sender<ClientMessage>, BrokerEvents, JoinHandle<()>) {
        let (sink, stream) = self.framed.split();
        let (tx, rx) = mpsc::channel(capacity);
        let pump = tokio::spawn(pump_outbound(sink, rx));
        (tx, BrokerEvents { stream }, pump)
    }
}

/// Inbound half of a split broker connection
pub struct BrokerEvents {
    stream: SplitStream<Transport>,
}

impl BrokerEvents {
    /// Next message from the broker, or `None` when the connection closes
    pub async fn recv(&mut self) -> Result<Option<ServerMessage>, RdError> {
        next_message(&mut self.stream).await
    }
}

async fn next_message<S>(stream: &mut S) -> Result<Option<ServerMessage>, RdError>
where
    S: futures::Stream<Item = Result<Result<ServerMessage, serde_json::Error>, ProtocolError>>
        + Unpin,
{
    while let Some(item) = stream.next().await {
        match item? {
            Ok(message) => return Ok(Some(message)),
            Err(e) => tracing::warn!("Skipping malformed broker message: {}", e),
        }
    }
    Ok(None)
}

async fn pump_outbound(
    mut sink: SplitSink<Transport, ClientMessage>,
    mut rx: mpsc::Receiver<ClientMessage>,
) {
    while let Some(message) = rx.recv().await {
        let kind = message.kind();
        if let Err(e) = sink.send(message).await {
            tracing::warn!("Failed to send {} to broker: {}", kind, e);
            break;
        }
    }
    tracing::debug!("Outbound pump stopped");
}

fn closed() -> RdError {
    RdError::Io(std::io::Error::new(
        std::io::ErrorKind::ConnectionAborted,
        "broker closed the connection",
    ))
}
