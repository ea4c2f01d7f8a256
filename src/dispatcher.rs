use std::sync::Arc;

use crate::events::CanonicalEvent;
use crate::executor::ExecutionContext;
use crate::session::{SessionGate, SessionId};

/// Delivers canonical events to the host listener.
///
/// Events are flattened on the calling thread and posted to the host execution
/// context, which runs them one at a time in post order. Each event belongs to the
/// session it was produced in. It is dropped if that session is not the ready one when
/// it is emitted, or is gone by the time the task runs.
pub struct EventDispatcher {
    gate: Arc<SessionGate>,
    host: Arc<dyn ExecutionContext>,
    provider: String,
}

impl EventDispatcher {
    pub fn new(gate: Arc<SessionGate>, host: Arc<dyn ExecutionContext>, provider: impl Into<String>) -> Self {
        Self {
            gate,
            host,
            provider: provider.into(),
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Queues an event for the host listener. Never blocks and never runs the listener inline.
    pub fn emit(&self, session: SessionId, event: CanonicalEvent) {
        let Some(listener) = self.gate.listener_for(session) else {
            log::debug!("session {session} is not ready, dropping '{}' event", event.phase);
            return;
        };

        let phase = event.phase;
        let host_event = event.into_host_event(&self.provider);
        let gate = Arc::clone(&self.gate);
        let context = self.host.name().to_string();

        self.host.execute(Box::new(move || {
            if !gate.is_current(session) {
                log::debug!("[{context}] session {session} closed, dropping '{phase}' event");
                return;
            }
            log::trace!("[{context}] delivering '{phase}' event");
            listener.on_event(&host_event);
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{AdKind, HostEvent, Phase};
    use crate::executor::SerialExecutor;
    use crate::host::HostListener;
    use crate::zone::ZoneRegistry;
    use std::sync::Mutex;
    use tokio::runtime::Handle;

    fn recorder() -> (Arc<Mutex<Vec<HostEvent>>>, Arc<dyn HostListener>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let listener: Arc<dyn HostListener> =
            Arc::new(move |ev: &HostEvent| sink.lock().unwrap().push(ev.clone()));
        (seen, listener)
    }

    #[tokio::test]
    async fn events_before_ready_are_dropped() {
        let gate = Arc::new(SessionGate::new());
        let host = Arc::new(SerialExecutor::new("host", &Handle::current()));
        let dispatcher = EventDispatcher::new(gate.clone(), host.clone(), "adcolony");
        let (seen, listener) = recorder();

        let id = gate.begin(listener).unwrap();
        dispatcher.emit(id, CanonicalEvent::new(Phase::Init));
        host.flush().await;

        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn events_arrive_in_emit_order() {
        let gate = Arc::new(SessionGate::new());
        let host = Arc::new(SerialExecutor::new("host", &Handle::current()));
        let dispatcher = EventDispatcher::new(gate.clone(), host.clone(), "adcolony");
        let (seen, listener) = recorder();

        let id = gate.begin(listener).unwrap();
        gate.complete(id, Arc::new(ZoneRegistry::new()));

        dispatcher.emit(id, CanonicalEvent::new(Phase::Init));
        dispatcher.emit(id, CanonicalEvent::for_zone(Phase::Loaded, AdKind::Interstitial, "zoneA"));
        dispatcher.emit(id, CanonicalEvent::for_zone(Phase::Displayed, AdKind::Interstitial, "zoneA"));
        host.flush().await;

        let seen = seen.lock().unwrap();
        let phases: Vec<_> = seen.iter().filter_map(|e| e.phase()).collect();
        assert_eq!(phases, vec!["init", "loaded", "displayed"]);
        assert!(seen.iter().all(|e| e.provider() == Some("adcolony")));
    }

    #[tokio::test]
    async fn queued_events_of_a_closed_session_are_dropped() {
        let gate = Arc::new(SessionGate::new());
        let host = Arc::new(SerialExecutor::new("host", &Handle::current()));
        let dispatcher = EventDispatcher::new(gate.clone(), host.clone(), "adcolony");
        let (seen, listener) = recorder();

        let id = gate.begin(listener).unwrap();
        gate.complete(id, Arc::new(ZoneRegistry::new()));

        // hold the host context so the event stays queued across teardown
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
        host.execute(Box::new(move || {
            let _ = release_rx.recv();
        }));
        dispatcher.emit(id, CanonicalEvent::for_zone(Phase::Closed, AdKind::Interstitial, "zoneA"));
        gate.teardown();
        release_tx.send(()).unwrap();
        host.flush().await;

        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn events_of_an_earlier_session_never_reach_the_next_listener() {
        let gate = Arc::new(SessionGate::new());
        let host = Arc::new(SerialExecutor::new("host", &Handle::current()));
        let dispatcher = EventDispatcher::new(gate.clone(), host.clone(), "adcolony");
        let (first_seen, first) = recorder();
        let (second_seen, second) = recorder();

        let old = gate.begin(first).unwrap();
        gate.complete(old, Arc::new(ZoneRegistry::new()));
        gate.teardown();
        let new = gate.begin(second).unwrap();
        gate.complete(new, Arc::new(ZoneRegistry::new()));

        dispatcher.emit(old, CanonicalEvent::for_zone(Phase::Loaded, AdKind::Interstitial, "zoneA"));
        dispatcher.emit(new, CanonicalEvent::new(Phase::Init));
        host.flush().await;

        assert!(first_seen.lock().unwrap().is_empty());
        let phases: Vec<_> = second_seen
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| e.phase().map(str::to_string))
            .collect();
        assert_eq!(phases, vec!["init"]);
    }
}
