use crate::events::HostEvent;

/// The single callback registered by the host runtime through `init()`.
///
/// Always invoked on the host execution context, one event at a time.
pub trait HostListener: Send + Sync {
    fn on_event(&self, event: &HostEvent);
}

impl<F> HostListener for F
where
    F: Fn(&HostEvent) + Send + Sync,
{
    fn on_event(&self, event: &HostEvent) {
        self(event)
    }
}
