use crate::foundation::{EstateError, PartyId, SessionId};
use async_trait::async_trait;

pub use crate::infrastructure::transport::messages::{MessageEnvelope, SessionMessage};

pub type Result<T> = std::result::Result<T, EstateError>;

/// One ordered, reliable, point-to-point conversation about a single transition.
#[async_trait]
pub trait FlowSession: Send {
    fn session_id(&self) -> SessionId;

    fn counterparty(&self) -> &PartyId;

    async fn send(&mut self, message: SessionMessage) -> Result<()>;

    /// Waits for the next message; fails once the other side has gone away.
    async fn receive(&mut self) -> Result<SessionMessage>;
}

/// Opens sessions to other parties and hands out the ones they open to us.
#[async_trait]
pub trait SessionTransport: Send + Sync {
    fn local_party(&self) -> &PartyId;

    async fn open_session(&self, counterparty: &PartyId, session_id: SessionId) -> Result<Box<dyn FlowSession>>;

    /// Waits for the next session another party opened with us.
    async fn accept(&self) -> Result<Box<dyn FlowSession>>;
}
