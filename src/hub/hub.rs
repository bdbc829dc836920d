//! Connection tracking, fan-out broadcast, centralized heartbeat
//!
//! Connections move `Admitted → Live → Closed`; the hub owns them from
//! admission until removal. A write failure on a connection (its receiver
//! dropped) marks it for eviction; eviction happens after iteration
//! completes, never mid-iteration.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::errors::{HubError, HubResult};
use super::frame;
use crate::observability::Logger;

/// Writable half of a push connection.
pub type PushSender = mpsc::UnboundedSender<String>;

/// Readable half of a push connection (the client-facing stream).
pub type PushReceiver = mpsc::UnboundedReceiver<String>;

/// Create a connection channel pair.
pub fn push_channel() -> (PushSender, PushReceiver) {
    mpsc::unbounded_channel()
}

/// Result of one fan-out pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BroadcastOutcome {
    /// Connections the frame was delivered to
    pub delivered: usize,
    /// Connections evicted after a failed write
    pub evicted: usize,
}

/// Hub statistics, observability only.
#[derive(Debug, Clone, Serialize)]
pub struct HubStats {
    /// Currently live connections
    pub live_clients: usize,
    /// Admission ceiling
    pub capacity: usize,
    /// Broadcasts fanned out since startup
    pub broadcasts: u64,
    /// Connections evicted after write failures since startup
    pub evicted: u64,
}

/// Fan-out hub for long-lived push connections.
pub struct NotificationHub {
    clients: RwLock<HashMap<Uuid, PushSender>>,
    capacity: usize,
    broadcasts: AtomicU64,
    evicted: AtomicU64,
    heartbeat: Mutex<Option<JoinHandle<()>>>,
}

impl NotificationHub {
    /// Create a hub with the given admission ceiling.
    pub fn new(capacity: usize) -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
            capacity,
            broadcasts: AtomicU64::new(0),
            evicted: AtomicU64::new(0),
            heartbeat: Mutex::new(None),
        }
    }

    /// Admit a connection.
    ///
    /// Rejects with `AtCapacity` (no state change) when the live set is at
    /// the ceiling. Otherwise writes the handshake (an initial keepalive
    /// frame plus a `version` event carrying every known domain version) and
    /// adds the connection to the live set. The capacity check and insertion
    /// happen under one lock.
    pub fn add_client(
        &self,
        sender: PushSender,
        versions: &BTreeMap<String, u64>,
    ) -> HubResult<Uuid> {
        let version_frame = frame::named_event(super::event::VERSION_EVENT, versions)?;

        let mut clients = self
            .clients
            .write()
            .map_err(|_| HubError::Internal("client set lock poisoned".into()))?;

        if clients.len() >= self.capacity {
            Logger::warn(
                "CLIENT_REJECTED",
                &[("capacity", &self.capacity.to_string())],
            );
            return Err(HubError::AtCapacity(self.capacity));
        }

        // Handshake before the connection is considered live
        if sender.send(frame::keepalive()).is_err() || sender.send(version_frame).is_err() {
            return Err(HubError::ConnectionClosed);
        }

        let id = Uuid::new_v4();
        clients.insert(id, sender);
        Logger::info(
            "CLIENT_ADMITTED",
            &[
                ("client", &id.to_string()),
                ("live", &clients.len().to_string()),
            ],
        );
        Ok(id)
    }

    /// Remove a connection from the live set (client disconnect).
    pub fn remove_client(&self, id: Uuid) {
        if let Ok(mut clients) = self.clients.write() {
            if clients.remove(&id).is_some() {
                Logger::trace("CLIENT_REMOVED", &[("client", &id.to_string())]);
            }
        }
    }

    /// Fan a named event out to every live connection.
    ///
    /// The payload is serialized once. Failed writes are collected during
    /// iteration and the failing connections removed afterwards.
    pub fn broadcast<T: Serialize>(&self, event_name: &str, data: &T) -> HubResult<BroadcastOutcome> {
        let frame = frame::named_event(event_name, data)?;
        self.broadcasts.fetch_add(1, Ordering::SeqCst);
        Ok(self.fan_out(&frame))
    }

    /// Write a named event to a single connection; a failed write removes it.
    pub fn send_to_client<T: Serialize>(
        &self,
        id: Uuid,
        event_name: &str,
        data: &T,
    ) -> HubResult<()> {
        let frame = frame::named_event(event_name, data)?;

        let sent = self
            .clients
            .read()
            .map_err(|_| HubError::Internal("client set lock poisoned".into()))?
            .get(&id)
            .map(|sender| sender.send(frame).is_ok());

        match sent {
            Some(true) => Ok(()),
            Some(false) => {
                self.evict(&[id]);
                Err(HubError::ConnectionClosed)
            }
            None => Err(HubError::ConnectionClosed),
        }
    }

    /// Write a keepalive frame to every live connection. Returns the fan-out
    /// outcome; used by the centralized heartbeat.
    pub fn send_keepalives(&self) -> BroadcastOutcome {
        self.fan_out(&frame::keepalive())
    }

    /// Start the centralized heartbeat: exactly one timer for the whole hub,
    /// whatever the connection count.
    pub fn start_heartbeat(self: &Arc<Self>, interval: Duration) {
        let hub = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // Connect-time keepalives are part of the handshake; skip t=0
            ticker.tick().await;
            loop {
                ticker.tick().await;
                hub.send_keepalives();
            }
        });

        if let Ok(mut heartbeat) = self.heartbeat.lock() {
            if let Some(previous) = heartbeat.replace(handle) {
                previous.abort();
            }
        }
    }

    /// Number of live connections.
    pub fn client_count(&self) -> usize {
        self.clients.read().map(|c| c.len()).unwrap_or(0)
    }

    /// Whether admission would currently be rejected.
    pub fn is_at_capacity(&self) -> bool {
        self.client_count() >= self.capacity
    }

    /// Hub statistics.
    pub fn stats(&self) -> HubStats {
        HubStats {
            live_clients: self.client_count(),
            capacity: self.capacity,
            broadcasts: self.broadcasts.load(Ordering::SeqCst),
            evicted: self.evicted.load(Ordering::SeqCst),
        }
    }

    /// Stop the heartbeat and drop every live connection. Process shutdown
    /// only; closing the channels is best-effort.
    pub fn close_all(&self) {
        if let Ok(mut heartbeat) = self.heartbeat.lock() {
            if let Some(handle) = heartbeat.take() {
                handle.abort();
            }
        }
        if let Ok(mut clients) = self.clients.write() {
            let count = clients.len();
            clients.clear();
            Logger::info("HUB_CLOSED", &[("dropped", &count.to_string())]);
        }
    }

    /// Two-phase fan-out: deliver to every live connection, collect failures,
    /// then remove the failed connections after iteration completes.
    fn fan_out(&self, frame: &str) -> BroadcastOutcome {
        let mut outcome = BroadcastOutcome::default();
        let mut failed: Vec<Uuid> = Vec::new();

        {
            let clients = match self.clients.read() {
                Ok(c) => c,
                Err(_) => return outcome,
            };
            for (id, sender) in clients.iter() {
                if sender.send(frame.to_string()).is_ok() {
                    outcome.delivered += 1;
                } else {
                    failed.push(*id);
                }
            }
        }

        if !failed.is_empty() {
            outcome.evicted = self.evict(&failed);
        }

        outcome
    }

    /// Remove the given connections from the live set.
    fn evict(&self, ids: &[Uuid]) -> usize {
        let mut removed = 0;
        if let Ok(mut clients) = self.clients.write() {
            for id in ids {
                if clients.remove(id).is_some() {
                    removed += 1;
                }
            }
        }
        if removed > 0 {
            self.evicted.fetch_add(removed as u64, Ordering::SeqCst);
            Logger::warn("CLIENTS_EVICTED", &[("count", &removed.to_string())]);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::event::{UpdateEvent, UPDATE_EVENT};

    fn no_versions() -> BTreeMap<String, u64> {
        BTreeMap::new()
    }

    // ==================== Admission Tests ====================

    #[tokio::test]
    async fn test_admission_at_capacity_rejected() {
        let hub = NotificationHub::new(2);

        let (tx1, _rx1) = push_channel();
        let (tx2, _rx2) = push_channel();
        let (tx3, _rx3) = push_channel();

        assert!(hub.add_client(tx1, &no_versions()).is_ok());
        assert!(hub.add_client(tx2, &no_versions()).is_ok());

        let rejected = hub.add_client(tx3, &no_versions());
        assert!(matches!(rejected, Err(HubError::AtCapacity(2))));
        assert_eq!(hub.client_count(), 2);
        assert!(hub.is_at_capacity());
    }

    #[tokio::test]
    async fn test_handshake_frames() {
        let hub = NotificationHub::new(10);
        let mut versions = BTreeMap::new();
        versions.insert("raffles".to_string(), 3u64);
        versions.insert("rules".to_string(), 1u64);

        let (tx, mut rx) = push_channel();
        hub.add_client(tx, &versions).unwrap();

        let first = rx.recv().await.unwrap();
        assert_eq!(first, ": keepalive\n\n");

        let second = rx.recv().await.unwrap();
        assert_eq!(second, "event: version\ndata: {\"raffles\":3,\"rules\":1}\n\n");
    }

    #[tokio::test]
    async fn test_admission_of_dead_channel_fails() {
        let hub = NotificationHub::new(10);
        let (tx, rx) = push_channel();
        drop(rx);

        let result = hub.add_client(tx, &no_versions());
        assert!(matches!(result, Err(HubError::ConnectionClosed)));
        assert_eq!(hub.client_count(), 0);
    }

    // ==================== Broadcast Tests ====================

    #[tokio::test]
    async fn test_broadcast_reaches_all_live_clients() {
        let hub = NotificationHub::new(10);
        let (tx1, mut rx1) = push_channel();
        let (tx2, mut rx2) = push_channel();
        hub.add_client(tx1, &no_versions()).unwrap();
        hub.add_client(tx2, &no_versions()).unwrap();

        let outcome = hub
            .broadcast(UPDATE_EVENT, &UpdateEvent::new("raffles", 4))
            .unwrap();
        assert_eq!(outcome.delivered, 2);
        assert_eq!(outcome.evicted, 0);

        // Skip the two handshake frames on each connection
        for rx in [&mut rx1, &mut rx2] {
            rx.recv().await.unwrap();
            rx.recv().await.unwrap();
            let frame = rx.recv().await.unwrap();
            assert_eq!(frame, "event: update\ndata: {\"type\":\"raffles\",\"version\":4}\n\n");
        }
    }

    #[tokio::test]
    async fn test_broadcast_evicts_failed_and_delivers_to_rest() {
        let hub = NotificationHub::new(10);

        let (tx1, mut rx1) = push_channel();
        let (tx2, rx2) = push_channel();
        let (tx3, rx3) = push_channel();
        hub.add_client(tx1, &no_versions()).unwrap();
        hub.add_client(tx2, &no_versions()).unwrap();
        hub.add_client(tx3, &no_versions()).unwrap();
        assert_eq!(hub.client_count(), 3);

        // Two connections fail mid-write
        drop(rx2);
        drop(rx3);

        let outcome = hub
            .broadcast(UPDATE_EVENT, &UpdateEvent::new("raffles", 5))
            .unwrap();
        assert_eq!(outcome.delivered, 1);
        assert_eq!(outcome.evicted, 2);
        assert_eq!(hub.client_count(), 1);

        // The survivor received the frame
        rx1.recv().await.unwrap();
        rx1.recv().await.unwrap();
        let frame = rx1.recv().await.unwrap();
        assert!(frame.contains("event: update"));
    }

    #[tokio::test]
    async fn test_send_to_client() {
        let hub = NotificationHub::new(10);
        let (tx, mut rx) = push_channel();
        let id = hub.add_client(tx, &no_versions()).unwrap();

        hub.send_to_client(id, UPDATE_EVENT, &UpdateEvent::new("rules", 2))
            .unwrap();

        rx.recv().await.unwrap();
        rx.recv().await.unwrap();
        let frame = rx.recv().await.unwrap();
        assert!(frame.contains("\"type\":\"rules\""));
    }

    #[tokio::test]
    async fn test_send_to_dead_client_removes_it() {
        let hub = NotificationHub::new(10);
        let (tx, rx) = push_channel();
        let id = hub.add_client(tx, &no_versions()).unwrap();
        drop(rx);

        let result = hub.send_to_client(id, UPDATE_EVENT, &UpdateEvent::new("rules", 2));
        assert!(matches!(result, Err(HubError::ConnectionClosed)));
        assert_eq!(hub.client_count(), 0);
    }

    // ==================== Heartbeat Tests ====================

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_is_periodic_keepalive() {
        let hub = Arc::new(NotificationHub::new(10));
        let (tx, mut rx) = push_channel();
        hub.add_client(tx, &no_versions()).unwrap();

        hub.start_heartbeat(Duration::from_secs(30));

        // Drain handshake
        rx.recv().await.unwrap();
        rx.recv().await.unwrap();

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(rx.try_recv().unwrap(), ": keepalive\n\n");

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(rx.try_recv().unwrap(), ": keepalive\n\n");

        hub.close_all();
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_evicts_dead_connections() {
        let hub = Arc::new(NotificationHub::new(10));
        let (tx1, _rx1) = push_channel();
        let (tx2, rx2) = push_channel();
        hub.add_client(tx1, &no_versions()).unwrap();
        hub.add_client(tx2, &no_versions()).unwrap();

        hub.start_heartbeat(Duration::from_secs(30));
        drop(rx2);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(hub.client_count(), 1);

        hub.close_all();
    }

    // ==================== Shutdown Tests ====================

    #[tokio::test]
    async fn test_close_all_clears_live_set() {
        let hub = Arc::new(NotificationHub::new(10));
        let (tx1, mut rx1) = push_channel();
        let (tx2, _rx2) = push_channel();
        hub.add_client(tx1, &no_versions()).unwrap();
        hub.add_client(tx2, &no_versions()).unwrap();

        hub.close_all();
        assert_eq!(hub.client_count(), 0);

        // Dropped sender closes the client's stream
        rx1.recv().await.unwrap();
        rx1.recv().await.unwrap();
        assert!(rx1.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_stats() {
        let hub = NotificationHub::new(5);
        let (tx, _rx) = push_channel();
        hub.add_client(tx, &no_versions()).unwrap();
        hub.broadcast(UPDATE_EVENT, &UpdateEvent::new("raffles", 1))
            .unwrap();

        let stats = hub.stats();
        assert_eq!(stats.live_clients, 1);
        assert_eq!(stats.capacity, 5);
        assert_eq!(stats.broadcasts, 1);
        assert_eq!(stats.evicted, 0);
    }
}
