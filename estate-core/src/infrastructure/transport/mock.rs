//! In-process session transport: every party registers with a shared hub, sessions are pairs of
//! bounded channels carrying encoded envelopes.

use super::encoding::{decode_envelope, encode_envelope, payload_hash};
use super::traits::{FlowSession, MessageEnvelope, SessionMessage, SessionTransport};
use crate::foundation::{EstateError, PartyId, SessionId, SESSION_CHANNEL_CAPACITY};
use async_trait::async_trait;
use log::{debug, trace};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

#[derive(Default)]
pub struct MockHub {
    inboxes: Mutex<HashMap<PartyId, mpsc::Sender<ChannelSession>>>,
}

impl MockHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Attaches `party` to the hub. Each party may be registered once.
    pub fn register(self: &Arc<Self>, party: PartyId) -> Result<MockTransport, EstateError> {
        let (inbox_tx, inbox_rx) = mpsc::channel(SESSION_CHANNEL_CAPACITY);
        let mut inboxes = self.lock_inboxes()?;
        if inboxes.contains_key(&party) {
            return Err(EstateError::transport("register", format!("party {party} already registered")));
        }
        inboxes.insert(party.clone(), inbox_tx);
        debug!("mock hub registered party={}", party);
        Ok(MockTransport { hub: Arc::clone(self), party, inbound: tokio::sync::Mutex::new(inbox_rx) })
    }

    /// Detaches `party`; later attempts to open a session with it fail.
    pub fn disconnect(&self, party: &PartyId) -> Result<(), EstateError> {
        self.lock_inboxes()?.remove(party);
        debug!("mock hub disconnected party={}", party);
        Ok(())
    }

    fn inbox(&self, party: &PartyId) -> Result<mpsc::Sender<ChannelSession>, EstateError> {
        self.lock_inboxes()?
            .get(party)
            .cloned()
            .ok_or_else(|| EstateError::transport("open_session", format!("party {party} is not reachable")))
    }

    fn lock_inboxes(&self) -> Result<std::sync::MutexGuard<'_, HashMap<PartyId, mpsc::Sender<ChannelSession>>>, EstateError> {
        self.inboxes.lock().map_err(|_| EstateError::transport("mock hub lock", "poisoned"))
    }
}

pub struct MockTransport {
    hub: Arc<MockHub>,
    party: PartyId,
    inbound: tokio::sync::Mutex<mpsc::Receiver<ChannelSession>>,
}

#[async_trait]
impl SessionTransport for MockTransport {
    fn local_party(&self) -> &PartyId {
        &self.party
    }

    async fn open_session(&self, counterparty: &PartyId, session_id: SessionId) -> Result<Box<dyn FlowSession>, EstateError> {
        let inbox = self.hub.inbox(counterparty)?;
        let (to_remote_tx, to_remote_rx) = mpsc::channel(SESSION_CHANNEL_CAPACITY);
        let (to_local_tx, to_local_rx) = mpsc::channel(SESSION_CHANNEL_CAPACITY);
        let local = ChannelSession::new(session_id, self.party.clone(), counterparty.clone(), to_remote_tx, to_local_rx);
        let remote = ChannelSession::new(session_id, counterparty.clone(), self.party.clone(), to_local_tx, to_remote_rx);
        inbox
            .send(remote)
            .await
            .map_err(|_| EstateError::transport("open_session", format!("party {counterparty} stopped accepting sessions")))?;
        trace!("session opened session_id={} from={} to={}", session_id.short(), self.party, counterparty);
        Ok(Box::new(local))
    }

    async fn accept(&self) -> Result<Box<dyn FlowSession>, EstateError> {
        let mut inbound = self.inbound.lock().await;
        let session = inbound.recv().await.ok_or_else(|| EstateError::transport("accept", "hub closed"))?;
        Ok(Box::new(session))
    }
}

/// One end of an in-process session.
pub struct ChannelSession {
    session_id: SessionId,
    local: PartyId,
    counterparty: PartyId,
    tx: mpsc::Sender<Vec<u8>>,
    rx: mpsc::Receiver<Vec<u8>>,
    sent: u64,
    received: u64,
}

impl ChannelSession {
    fn new(session_id: SessionId, local: PartyId, counterparty: PartyId, tx: mpsc::Sender<Vec<u8>>, rx: mpsc::Receiver<Vec<u8>>) -> Self {
        Self { session_id, local, counterparty, tx, rx, sent: 0, received: 0 }
    }

    fn check_envelope(&self, envelope: &MessageEnvelope) -> Result<(), EstateError> {
        if envelope.session_id != self.session_id {
            return Err(EstateError::protocol(&self.counterparty, format!("message for session {}", envelope.session_id.short())));
        }
        if envelope.sender != self.counterparty {
            return Err(EstateError::protocol(&self.counterparty, format!("message signed as {}", envelope.sender)));
        }
        let expected = self.received + 1;
        if envelope.seq_no != expected {
            return Err(EstateError::protocol(&self.counterparty, format!("seq_no {} out of order, expected {expected}", envelope.seq_no)));
        }
        if payload_hash(&envelope.payload)? != envelope.payload_hash {
            return Err(EstateError::protocol(&self.counterparty, "payload hash mismatch"));
        }
        Ok(())
    }
}

#[async_trait]
impl FlowSession for ChannelSession {
    fn session_id(&self) -> SessionId {
        self.session_id
    }

    fn counterparty(&self) -> &PartyId {
        &self.counterparty
    }

    async fn send(&mut self, message: SessionMessage) -> Result<(), EstateError> {
        let kind = message.kind();
        let envelope = MessageEnvelope {
            session_id: self.session_id,
            sender: self.local.clone(),
            seq_no: self.sent + 1,
            payload_hash: payload_hash(&message)?,
            payload: message,
        };
        let bytes = encode_envelope(&envelope)?;
        self.tx.send(bytes).await.map_err(|_| EstateError::transport("send", format!("session with {} closed", self.counterparty)))?;
        self.sent += 1;
        trace!("session send session_id={} to={} kind={} seq_no={}", self.session_id.short(), self.counterparty, kind, self.sent);
        Ok(())
    }

    async fn receive(&mut self) -> Result<SessionMessage, EstateError> {
        let bytes =
            self.rx.recv().await.ok_or_else(|| EstateError::transport("receive", format!("session with {} closed", self.counterparty)))?;
        let envelope = decode_envelope(&bytes)?;
        self.check_envelope(&envelope)?;
        self.received = envelope.seq_no;
        trace!("session receive session_id={} from={} kind={} seq_no={}", self.session_id.short(), self.counterparty, envelope.payload.kind(), envelope.seq_no);
        Ok(envelope.payload)
    }
}
