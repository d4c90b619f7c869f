//! In-process message bus
//!
//! A directory of agents keyed by id plus a direct dispatcher. `send_and_wait`
//! is a plain awaited call into the receiver's `handle`: no queue, no timeout,
//! no retry, and the reply is returned unchanged.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::agent::{Agent, AgentReply};
use crate::error::{BusError, Result};
use crate::message::Message;

/// Agent directory and dispatcher
#[derive(Default)]
pub struct MessageBus {
    agents: RwLock<HashMap<String, Arc<dyn Agent>>>,
}

impl std::fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageBus")
            .field("agents", &self.agent_ids())
            .finish()
    }
}

impl MessageBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent under an explicit id.
    ///
    /// Fails if the id is already taken; use `replace` to hot-swap.
    pub fn register(&self, agent_id: impl Into<String>, agent: Arc<dyn Agent>) -> Result<()> {
        let agent_id = agent_id.into();
        let mut agents = self
            .agents
            .write()
            .map_err(|e| BusError::DirectoryUnavailable(e.to_string()))?;

        if agents.contains_key(&agent_id) {
            return Err(BusError::AgentAlreadyRegistered(agent_id));
        }

        tracing::debug!(agent_id = %agent_id, "Registered agent");
        agents.insert(agent_id, agent);
        Ok(())
    }

    /// Register an agent under its own id
    pub fn register_agent(&self, agent: Arc<dyn Agent>) -> Result<()> {
        let agent_id = agent.id().to_string();
        self.register(agent_id, agent)
    }

    /// Install an agent, returning whichever one it displaced
    pub fn replace(
        &self,
        agent_id: impl Into<String>,
        agent: Arc<dyn Agent>,
    ) -> Result<Option<Arc<dyn Agent>>> {
        let agent_id = agent_id.into();
        let mut agents = self
            .agents
            .write()
            .map_err(|e| BusError::DirectoryUnavailable(e.to_string()))?;

        let previous = agents.insert(agent_id.clone(), agent);
        if previous.is_some() {
            tracing::info!(agent_id = %agent_id, "Replaced registered agent");
        }
        Ok(previous)
    }

    /// Remove an agent
    pub fn unregister(&self, agent_id: &str) -> Result<Option<Arc<dyn Agent>>> {
        let mut agents = self
            .agents
            .write()
            .map_err(|e| BusError::DirectoryUnavailable(e.to_string()))?;
        Ok(agents.remove(agent_id))
    }

    /// Whether an id is registered
    pub fn contains(&self, agent_id: &str) -> bool {
        self.agents
            .read()
            .map(|agents| agents.contains_key(agent_id))
            .unwrap_or(false)
    }

    /// Registered ids, sorted
    pub fn agent_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .agents
            .read()
            .map(|agents| agents.keys().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.agents.read().map(|agents| agents.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up the receiver and await its reply.
    ///
    /// The directory lock is released before the handler runs, so a handler
    /// may dispatch through the same bus.
    pub async fn send_and_wait(&self, message: Message) -> Result<AgentReply> {
        let receiver = self.lookup(message.receiver())?;

        tracing::debug!(
            message_id = %message.message_id(),
            sender = message.sender(),
            receiver = message.receiver(),
            message_type = message.message_type(),
            "Dispatching message"
        );

        let message = message.mark_processed();
        Ok(receiver.handle(&message).await)
    }

    fn lookup(&self, agent_id: &str) -> Result<Arc<dyn Agent>> {
        let agents = self
            .agents
            .read()
            .map_err(|e| BusError::DirectoryUnavailable(e.to_string()))?;

        agents
            .get(agent_id)
            .cloned()
            .ok_or_else(|| BusError::RecipientNotFound(agent_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::ErrorReply;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingAgent {
        id: String,
        calls: AtomicUsize,
    }

    impl CountingAgent {
        fn new(id: &str) -> Arc<Self> {
            Arc::new(Self {
                id: id.to_string(),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Agent for CountingAgent {
        fn id(&self) -> &str {
            &self.id
        }

        async fn handle(&self, message: &Message) -> AgentReply {
            self.calls.fetch_add(1, Ordering::SeqCst);
            AgentReply::Error(ErrorReply::invalid_payload(format!(
                "{} seen by {}",
                message.message_type(),
                self.id
            )))
        }
    }

    #[tokio::test]
    async fn test_register_and_dispatch() {
        let bus = MessageBus::new();
        let agent = CountingAgent::new("echo");
        bus.register_agent(agent.clone()).unwrap();

        let reply = bus
            .send_and_wait(Message::new("test", "echo", "ping", Value::Null))
            .await
            .unwrap();

        assert_eq!(reply, AgentReply::invalid_payload("ping seen by echo"));
        assert_eq!(agent.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_recipient_invokes_nothing() {
        let bus = MessageBus::new();
        let agent = CountingAgent::new("echo");
        bus.register_agent(agent.clone()).unwrap();

        let err = bus
            .send_and_wait(Message::new("test", "nobody", "ping", json!({})))
            .await
            .unwrap_err();

        assert_eq!(err, BusError::RecipientNotFound("nobody".to_string()));
        assert_eq!(agent.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let bus = MessageBus::new();
        bus.register("a", CountingAgent::new("a")).unwrap();

        let err = bus.register("a", CountingAgent::new("a")).unwrap_err();
        assert_eq!(err, BusError::AgentAlreadyRegistered("a".to_string()));
        assert_eq!(bus.len(), 1);
    }

    #[tokio::test]
    async fn test_replace_hot_swaps() {
        let bus = MessageBus::new();
        let first = CountingAgent::new("first");
        let second = CountingAgent::new("second");
        bus.register("slot", first.clone()).unwrap();

        let previous = bus.replace("slot", second.clone()).unwrap();
        assert_eq!(previous.map(|a| a.id().to_string()), Some("first".to_string()));

        bus.send_and_wait(Message::new("t", "slot", "ping", Value::Null))
            .await
            .unwrap();
        assert_eq!(first.calls.load(Ordering::SeqCst), 0);
        assert_eq!(second.calls.load(Ordering::SeqCst), 1);
    }

    /// Forwards every message to `sink` through the bus it is registered on
    struct RelayAgent {
        bus: Arc<MessageBus>,
    }

    #[async_trait]
    impl Agent for RelayAgent {
        fn id(&self) -> &str {
            "relay"
        }

        async fn handle(&self, message: &Message) -> AgentReply {
            let forward = Message::new(
                "relay",
                "sink",
                message.message_type(),
                message.payload().clone(),
            );
            match self.bus.send_and_wait(forward).await {
                Ok(reply) => reply,
                Err(e) => AgentReply::invalid_payload(e.to_string()),
            }
        }
    }

    #[tokio::test]
    async fn test_handler_can_dispatch_through_same_bus() {
        let bus = Arc::new(MessageBus::new());
        let sink = CountingAgent::new("sink");
        bus.register_agent(sink.clone()).unwrap();
        bus.register_agent(Arc::new(RelayAgent { bus: Arc::clone(&bus) }))
            .unwrap();

        let reply = tokio::time::timeout(
            std::time::Duration::from_secs(2),
            bus.send_and_wait(Message::new("test", "relay", "ping", Value::Null)),
        )
        .await
        .expect("re-dispatch deadlocked")
        .unwrap();

        assert_eq!(reply, AgentReply::invalid_payload("ping seen by sink"));
        assert_eq!(sink.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_agent_ids_sorted_and_unregister() {
        let bus = MessageBus::new();
        bus.register("zeta", CountingAgent::new("zeta")).unwrap();
        bus.register("alpha", CountingAgent::new("alpha")).unwrap();

        assert_eq!(bus.agent_ids(), vec!["alpha".to_string(), "zeta".to_string()]);
        assert!(bus.unregister("zeta").unwrap().is_some());
        assert!(!bus.contains("zeta"));
        assert!(bus.unregister("zeta").unwrap().is_none());
    }
}
