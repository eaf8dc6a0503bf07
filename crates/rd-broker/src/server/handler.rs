//! Per-connection handler
//!
//! Each client connection runs one task that reads signaling lines, answers
//! the client directly, and drains the connection's outbound queue (messages
//! relayed to it by other connections).

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;

use rd_core::types::Identity;
use rd_protocol::{ClientMessage, JsonLinesCodec, ServerMessage};

use crate::connection::ConnectionHandle;
use crate::relay::rejection_message;
use crate::state::BrokerState;

/// Codec as seen from the broker side
pub type BrokerCodec = JsonLinesCodec<ClientMessage, ServerMessage>;

/// Serve one client connection until it closes or the broker shuts down
pub async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: Arc<BrokerState>,
    cancel: CancellationToken,
) -> Result<()> {
    let codec = BrokerCodec::with_max_length(state.config.max_line_length);
    let mut framed = Framed::new(stream, codec);

    let (handle, mut outbound) =
        ConnectionHandle::channel(Some(peer_addr), state.config.outbound_queue);
    tracing::debug!("{} assigned to {}", handle.id(), peer_addr);

    let mut session = ClientSession {
        state,
        handle,
        identity: None,
    };

    let result: Result<()> = async {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("{} cancelled", session.handle.id());
                    break;
                }

                inbound = framed.next() => {
                    match inbound {
                        None => break, // EOF
                        Some(Ok(Ok(message))) => {
                            if let Some(reply) = session.dispatch(message) {
                                framed.send(reply).await.context("Failed to send reply")?;
                            }
                        }
                        Some(Ok(Err(e))) => {
                            tracing::warn!("Malformed message on {}: {}", session.handle.id(), e);
                        }
                        Some(Err(e)) => {
                            return Err(e).context("Failed to read from client");
                        }
                    }
                }

                Some(message) = outbound.recv() => {
                    framed.send(message).await.context("Failed to forward message")?;
                }
            }
        }
        Ok(())
    }
    .await;

    session.close();
    result
}

/// Protocol state of one connection
struct ClientSession {
    state: Arc<BrokerState>,
    handle: ConnectionHandle,
    /// Set once a login succeeds
    identity: Option<Identity>,
}

impl ClientSession {
    /// Handle one inbound message, returning the direct reply if any
    fn dispatch(&mut self, message: ClientMessage) -> Option<ServerMessage> {
        tracing::trace!("{} from {}", message.kind(), self.handle.id());

        match message {
            ClientMessage::Login { identifier, secret } => Some(self.login(&identifier, &secret)),
            message => match self.identity.clone() {
                Some(source) if self.owns(&source) => self.route(&source, message),
                Some(source) => {
                    // Another connection logged in as this identity
                    tracing::info!(
                        "{} lost {} to a newer login, dropping {}",
                        self.handle.id(),
                        source,
                        message.kind()
                    );
                    self.identity = None;
                    None
                }
                None => {
                    tracing::debug!(
                        "Dropping {} from unauthenticated {}",
                        message.kind(),
                        self.handle.id()
                    );
                    None
                }
            },
        }
    }

    fn login(&mut self, identifier: &str, secret: &str) -> ServerMessage {
        match self.state.gateway.login(identifier, secret, &self.handle) {
            Ok(identity) => {
                // Logging in as someone else releases the old identity
                if let Some(previous) = self.identity.replace(identity.clone()) {
                    if previous != identity {
                        self.state
                            .presence
                            .unregister_connection(&previous, self.handle.id());
                    }
                }
                ServerMessage::LoginSuccess {
                    identifier: identity.to_string(),
                }
            }
            Err(_) => ServerMessage::LoginFail,
        }
    }

    fn owns(&self, identity: &Identity) -> bool {
        self.state.presence.is_bound_to(identity, self.handle.id())
    }

    fn route(&self, source: &Identity, message: ClientMessage) -> Option<ServerMessage> {
        let relay = &self.state.relay;

        match message {
            ClientMessage::GenerateAccessKey => {
                let key = self.state.access_keys.generate(source);
                tracing::info!("Issued access key for {}", source);
                Some(ServerMessage::AccessKeyGenerated { key })
            }

            ClientMessage::Offer {
                target_identity,
                session_description,
                access_key,
            } => relay
                .offer(
                    source,
                    &Identity::new(target_identity),
                    session_description,
                    access_key.as_deref(),
                )
                .err()
                .map(rejection_message),

            ClientMessage::Answer {
                target_identity,
                session_description,
            } => {
                relay.answer(source, &Identity::new(target_identity), session_description);
                None
            }

            ClientMessage::IceCandidate {
                target_identity,
                candidate,
            } => {
                relay.ice_candidate(source, &Identity::new(target_identity), candidate);
                None
            }

            ClientMessage::DisconnectPeer { target_identity } => {
                relay.hangup(source, &Identity::new(target_identity));
                None
            }

            // Handled by dispatch
            ClientMessage::Login { .. } => None,
        }
    }

    /// Drop this connection's presence entry, if it still owns it
    fn close(&mut self) {
        if let Some(identity) = self.identity.take() {
            if self
                .state
                .presence
                .unregister_connection(&identity, self.handle.id())
            {
                tracing::info!("{} went offline", identity);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rd_core::config::BrokerConfig;
    use rd_protocol::SessionDescription;

    fn session() -> (ClientSession, tokio::sync::mpsc::Receiver<ServerMessage>) {
        let state = Arc::new(BrokerState::new(BrokerConfig::default()).unwrap());
        let (handle, rx) = ConnectionHandle::channel(None, 8);
        (
            ClientSession {
                state,
                handle,
                identity: None,
            },
            rx,
        )
    }

    fn login(identifier: &str, secret: &str) -> ClientMessage {
        ClientMessage::Login {
            identifier: identifier.to_string(),
            secret: secret.to_string(),
        }
    }

    #[test]
    fn test_unauthenticated_messages_dropped() {
        let (mut session, _rx) = session();

        assert_eq!(session.dispatch(ClientMessage::GenerateAccessKey), None);
        assert_eq!(
            session.dispatch(ClientMessage::Offer {
                target_identity: "user2@institution.com".to_string(),
                session_description: SessionDescription::offer("v=0"),
                access_key: None,
            }),
            None
        );
        assert!(session.state.access_keys.is_empty());
    }

    #[test]
    fn test_login_reply() {
        let (mut session, _rx) = session();

        assert_eq!(
            session.dispatch(login("user1@institution.com", "wrong")),
            Some(ServerMessage::LoginFail)
        );
        assert_eq!(
            session.dispatch(login("user1@institution.com", "pass1")),
            Some(ServerMessage::LoginSuccess {
                identifier: "user1@institution.com".to_string()
            })
        );
    }

    #[test]
    fn test_generate_access_key_reply() {
        let (mut session, _rx) = session();
        session.dispatch(login("user2@institution.com", "pass2"));

        let reply = session.dispatch(ClientMessage::GenerateAccessKey);
        assert!(matches!(reply, Some(ServerMessage::AccessKeyGenerated { ref key }) if key.len() == 6));
        assert!(session.state.access_keys.has_key(&"user2@institution.com".into()));
    }

    #[test]
    fn test_switching_identity_releases_old_entry() {
        let (mut session, _rx) = session();
        session.dispatch(login("user1@institution.com", "pass1"));
        session.dispatch(login("user2@institution.com", "pass2"));

        let presence = &session.state.presence;
        assert!(!presence.is_online(&"user1@institution.com".into()));
        assert!(presence.is_online(&"user2@institution.com".into()));
    }

    #[test]
    fn test_superseded_connection_loses_identity() {
        let (mut old, _old_rx) = session();
        let (handle, _new_rx) = ConnectionHandle::channel(None, 8);
        let mut new = ClientSession {
            state: Arc::clone(&old.state),
            handle,
            identity: None,
        };

        old.dispatch(login("user2@institution.com", "pass2"));
        new.dispatch(login("user2@institution.com", "pass2"));
        let Some(ServerMessage::AccessKeyGenerated { key }) =
            new.dispatch(ClientMessage::GenerateAccessKey)
        else {
            panic!("expected an access key");
        };

        assert_eq!(old.dispatch(ClientMessage::GenerateAccessKey), None);
        assert_eq!(old.identity, None);

        // The key handed to the newer connection is still the valid one
        let target = Identity::new("user2@institution.com");
        assert!(old.state.access_keys.consume(&target, &key));

        old.close();
        assert!(old.state.presence.is_bound_to(&target, new.handle.id()));
    }

    #[test]
    fn test_close_unregisters() {
        let (mut session, _rx) = session();
        session.dispatch(login("user1@institution.com", "pass1"));
        session.close();

        assert!(session.state.presence.is_empty());
        // Idempotent
        session.close();
    }
}
