//! Session lifecycle state machine
//!
//! Caller: `Idle -> Offering -> Connecting -> Active -> Closing -> Idle`
//! Callee: `Idle -> AwaitingAnswer -> Connecting -> Active -> Closing -> Idle`
//!
//! The machine is driven by discrete [`LifecycleEvent`]s (broker messages and
//! transport notifications) plus the two user actions, [`initiate`] and
//! [`disconnect`]. Teardown is idempotent: the second call finds no session
//! and does nothing.
//!
//! The lifecycle owns the inbound [`InputPipeline`]: it is enabled when the
//! call becomes Active and disabled again on teardown, so remote commands are
//! only ever executed during an active call.
//!
//! [`initiate`]: SessionLifecycle::initiate
//! [`disconnect`]: SessionLifecycle::disconnect

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;

use rd_core::error::{SessionError, TransportError};
use rd_core::traits::{InputExecutor, PeerLink, PeerLinkFactory, TransportState};
use rd_core::trust::{SameDomainPolicy, TrustPolicy};
use rd_core::types::Identity;
use rd_protocol::{ClientMessage, IceCandidate, ServerMessage, SessionDescription};

use super::plan::plan_call;
use crate::audit::AuditLog;
use crate::input::{Disposition, InputPipeline};

/// Lifecycle state of the local half of a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No call
    Idle,
    /// Offer sent, waiting for the answer
    Offering,
    /// Offer received and answered, waiting for the transport
    AwaitingAnswer,
    /// Descriptions exchanged, transport negotiating
    Connecting,
    /// Transport up, input flowing
    Active,
    /// Tearing down
    Closing,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Offering => "offering",
            SessionState::AwaitingAnswer => "awaiting-answer",
            SessionState::Connecting => "connecting",
            SessionState::Active => "active",
            SessionState::Closing => "closing",
        };
        f.write_str(name)
    }
}

/// Inputs that drive the lifecycle
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    /// Message from the broker
    Signal(ServerMessage),
    /// Transport connection state changed
    TransportState(TransportState),
    /// First remote media arrived
    MediaArrived,
    /// Transport produced a local candidate to trickle
    LocalCandidate(IceCandidate),
}

/// Which call controls the UI should offer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Affordances {
    /// Target entry and connect button
    pub connect: bool,
    /// Disconnect button
    pub disconnect: bool,
}

/// The local half of one call
struct PeerSession<L> {
    link: L,
    counterpart: Identity,
    remote_media: bool,
}

/// Drives one client's calls through their lifecycle
pub struct SessionLifecycle<F: PeerLinkFactory, E: InputExecutor> {
    local: Identity,
    factory: F,
    policy: Arc<dyn TrustPolicy>,
    signals: mpsc::Sender<ClientMessage>,
    audit: AuditLog,
    input: InputPipeline<E>,
    state: SessionState,
    session: Option<PeerSession<F::Link>>,
}

impl<F: PeerLinkFactory, E: InputExecutor> SessionLifecycle<F, E> {
    /// Create an idle lifecycle for the logged-in `local` identity.
    ///
    /// Session start and end are written to the pipeline's audit log. The
    /// pipeline is disabled until a call becomes Active.
    pub fn new(
        local: Identity,
        factory: F,
        signals: mpsc::Sender<ClientMessage>,
        mut input: InputPipeline<E>,
    ) -> Self {
        input.disable();
        Self {
            local,
            factory,
            policy: Arc::new(SameDomainPolicy),
            signals,
            audit: input.audit().clone(),
            input,
            state: SessionState::Idle,
            session: None,
        }
    }

    /// Use a different trust policy for call planning
    pub fn with_policy(mut self, policy: Arc<dyn TrustPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Identity on the other end of the current call
    pub fn counterpart(&self) -> Option<&Identity> {
        self.session.as_ref().map(|s| &s.counterpart)
    }

    /// Whether inbound input commands are being processed
    pub fn input_enabled(&self) -> bool {
        self.input.is_enabled()
    }

    /// The inbound input pipeline
    pub fn input(&self) -> &InputPipeline<E> {
        &self.input
    }

    /// Run one raw command from the input channel through the pipeline.
    ///
    /// Outside an active call this is always [`Disposition::Ignored`].
    pub fn process_input(&mut self, raw: &str) -> Disposition {
        self.input.process_raw(raw)
    }

    /// Whether remote media is attached
    pub fn has_remote_media(&self) -> bool {
        self.session.as_ref().map_or(false, |s| s.remote_media)
    }

    pub fn affordances(&self) -> Affordances {
        Affordances {
            connect: self.state == SessionState::Idle,
            disconnect: self.state == SessionState::Active,
        }
    }

    /// Start a call to `target`.
    ///
    /// Fails without side effects if a call already exists or the target is
    /// rejected by call planning.
    pub async fn initiate(
        &mut self,
        target: &str,
        access_key: Option<&str>,
    ) -> Result<(), SessionError> {
        if let Some(session) = &self.session {
            return Err(SessionError::SessionInProgress(
                session.counterpart.to_string(),
            ));
        }

        let plan = plan_call(self.policy.as_ref(), &self.local, target, access_key)?;

        let mut link = self.factory.create().await?;
        let offer = match prepare_offer(&mut link).await {
            Ok(offer) => offer,
            Err(e) => {
                link.close().await;
                return Err(e.into());
            }
        };

        let message = ClientMessage::Offer {
            target_identity: plan.target.to_string(),
            session_description: offer,
            access_key: plan.access_key,
        };
        if self.signals.send(message).await.is_err() {
            link.close().await;
            return Err(SessionError::SignalingClosed);
        }

        tracing::info!("Calling {}", plan.target);
        self.session = Some(PeerSession {
            link,
            counterpart: plan.target,
            remote_media: false,
        });
        self.state = SessionState::Offering;
        Ok(())
    }

    /// End the current call and tell the counterpart.
    ///
    /// Returns `false` if there was nothing to end.
    pub async fn disconnect(&mut self) -> bool {
        self.teardown(true, "local disconnect").await
    }

    /// Feed one event into the machine
    pub async fn handle(&mut self, event: LifecycleEvent) -> Result<(), SessionError> {
        match event {
            LifecycleEvent::Signal(message) => self.on_signal(message).await,
            LifecycleEvent::TransportState(state) => {
                self.on_transport_state(state).await;
                Ok(())
            }
            LifecycleEvent::MediaArrived => {
                self.on_media_arrived();
                Ok(())
            }
            LifecycleEvent::LocalCandidate(candidate) => {
                self.on_local_candidate(candidate).await;
                Ok(())
            }
        }
    }

    async fn on_signal(&mut self, message: ServerMessage) -> Result<(), SessionError> {
        let kind = message.kind();

        match message {
            ServerMessage::Offer {
                source_identity,
                session_description,
            } => {
                self.on_offer(Identity::new(source_identity), session_description)
                    .await
            }

            ServerMessage::Answer {
                source_identity,
                session_description,
            } => {
                self.on_answer(&Identity::new(source_identity), session_description)
                    .await;
                Ok(())
            }

            ServerMessage::IceCandidate {
                source_identity,
                candidate,
            } => {
                self.on_remote_candidate(&Identity::new(source_identity), candidate)
                    .await;
                Ok(())
            }

            ServerMessage::PeerDisconnected { source_identity } => {
                if self.is_counterpart(&Identity::new(source_identity)) {
                    self.teardown(false, "peer hung up").await;
                }
                Ok(())
            }

            ServerMessage::CrossDomainRequiresKey | ServerMessage::InvalidKey => {
                // The target never saw the offer, so there is nobody to notify
                if self.state == SessionState::Offering {
                    self.teardown(false, kind).await;
                }
                Ok(())
            }

            ServerMessage::LoginSuccess { .. }
            | ServerMessage::LoginFail
            | ServerMessage::AccessKeyGenerated { .. } => Ok(()),
        }
    }

    async fn on_offer(
        &mut self,
        source: Identity,
        description: SessionDescription,
    ) -> Result<(), SessionError> {
        if self.session.is_some() {
            tracing::debug!("Ignoring offer from {} while {}", source, self.state);
            return Ok(());
        }

        let mut link = self.factory.create().await?;
        let answer = match prepare_answer(&mut link, description).await {
            Ok(answer) => answer,
            Err(e) => {
                link.close().await;
                return Err(e.into());
            }
        };

        let message = ClientMessage::Answer {
            target_identity: source.to_string(),
            session_description: answer,
        };
        if self.signals.send(message).await.is_err() {
            link.close().await;
            return Err(SessionError::SignalingClosed);
        }

        tracing::info!("Answered call from {}", source);
        self.session = Some(PeerSession {
            link,
            counterpart: source,
            remote_media: false,
        });
        self.state = SessionState::AwaitingAnswer;
        Ok(())
    }

    async fn on_answer(&mut self, source: &Identity, description: SessionDescription) {
        if self.state != SessionState::Offering || !self.is_counterpart(source) {
            tracing::debug!("Ignoring answer from {} while {}", source, self.state);
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.link.has_remote_description() {
            tracing::debug!("Ignoring duplicate answer from {}", source);
            return;
        }

        match session.link.set_remote_description(description).await {
            Ok(()) => self.state = SessionState::Connecting,
            Err(e) => {
                tracing::warn!("Failed to apply answer from {}: {}", source, e);
                self.teardown(true, "answer rejected").await;
            }
        }
    }

    async fn on_remote_candidate(&mut self, source: &Identity, candidate: IceCandidate) {
        let Some(session) = self.session.as_mut() else {
            tracing::debug!("Dropping candidate from {}: no session", source);
            return;
        };
        if &session.counterpart != source {
            tracing::debug!("Dropping candidate from {}: not in call", source);
            return;
        }

        if let Err(e) = session.link.add_ice_candidate(candidate).await {
            tracing::debug!("Candidate from {} not applied: {}", source, e);
        }
    }

    async fn on_local_candidate(&mut self, candidate: IceCandidate) {
        let Some(session) = &self.session else {
            return;
        };

        let message = ClientMessage::IceCandidate {
            target_identity: session.counterpart.to_string(),
            candidate,
        };
        if self.signals.send(message).await.is_err() {
            tracing::warn!("Signaling closed, local candidate not sent");
        }
    }

    async fn on_transport_state(&mut self, state: TransportState) {
        if self.session.is_none() {
            return;
        }

        match state {
            TransportState::Connecting => {
                if self.state == SessionState::AwaitingAnswer {
                    self.state = SessionState::Connecting;
                }
            }
            TransportState::Connected => self.activate(),
            TransportState::New => {}
            terminal => {
                tracing::warn!("Transport reported {:?}", terminal);
                self.teardown(true, "transport lost").await;
            }
        }
    }

    fn on_media_arrived(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.remote_media = true;
            self.activate();
        }
    }

    fn activate(&mut self) {
        if !matches!(
            self.state,
            SessionState::Connecting | SessionState::AwaitingAnswer
        ) {
            return;
        }

        self.state = SessionState::Active;
        self.input.enable();
        if let Some(session) = &self.session {
            tracing::info!("Session with {} active", session.counterpart);
            self.audit
                .record(format_args!("Session started with {}", session.counterpart));
        }
    }

    /// Close the transport and return to Idle. Runs at most once per session.
    async fn teardown(&mut self, notify: bool, reason: &str) -> bool {
        let Some(mut session) = self.session.take() else {
            return false;
        };

        let was_active = self.state == SessionState::Active;
        self.state = SessionState::Closing;
        self.input.disable();

        session.link.close().await;
        session.remote_media = false;

        if notify {
            let message = ClientMessage::DisconnectPeer {
                target_identity: session.counterpart.to_string(),
            };
            if let Err(e) = self.signals.try_send(message) {
                tracing::warn!("Hangup for {} not sent: {}", session.counterpart, e);
            }
        }

        if was_active {
            self.audit
                .record(format_args!("Session ended with {}", session.counterpart));
        }
        tracing::info!("Session with {} closed ({})", session.counterpart, reason);

        self.state = SessionState::Idle;
        true
    }

    fn is_counterpart(&self, identity: &Identity) -> bool {
        self.session
            .as_ref()
            .map_or(false, |s| &s.counterpart == identity)
    }
}

async fn prepare_offer<L: PeerLink>(link: &mut L) -> Result<SessionDescription, TransportError> {
    link.open_input_channel().await?;
    link.attach_capture().await?;
    link.create_offer().await
}

async fn prepare_answer<L: PeerLink>(
    link: &mut L,
    remote: SessionDescription,
) -> Result<SessionDescription, TransportError> {
    link.set_remote_description(remote).await?;
    link.attach_capture().await?;
    link.create_answer().await
}
