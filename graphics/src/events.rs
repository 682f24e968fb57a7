//! Device events and synchronous observer dispatch.

use std::sync::RwLock;

/// An event emitted by the device.
///
/// `Resize` fires from within `frame()` before any draws; `Lose` and
/// `Restore` fire from the external notification path. Listeners must
/// tolerate both call sites; the only ordering guarantee is that no
/// event fires during an in-flight frame's draw traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceEvent {
    /// The backing buffer was resized to match the client size.
    Resize {
        /// New width in pixels.
        width: u32,
        /// New height in pixels.
        height: u32,
    },
    /// The context was lost.
    Lose,
    /// The context was restored.
    Restore,
}

type Listener = Box<dyn Fn(&DeviceEvent) + Send + Sync>;

/// A synchronous observer list. Dispatch is immediate and in
/// registration order; there is no event queue.
#[derive(Default)]
pub struct EventListeners {
    listeners: RwLock<Vec<Listener>>,
}

impl EventListeners {
    /// Create an empty listener list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for all device events.
    pub fn on(&self, listener: impl Fn(&DeviceEvent) + Send + Sync + 'static) {
        if let Ok(mut listeners) = self.listeners.write() {
            listeners.push(Box::new(listener));
        }
    }

    /// Dispatch an event to every listener, synchronously.
    pub fn emit(&self, event: &DeviceEvent) {
        if let Ok(listeners) = self.listeners.read() {
            for listener in listeners.iter() {
                listener(event);
            }
        }
    }
}

impl std::fmt::Debug for EventListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.listeners.read().map(|l| l.len()).unwrap_or(0);
        f.debug_struct("EventListeners").field("count", &count).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_listeners_fire_in_registration_order() {
        let events = EventListeners::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in 0..3 {
            let seen = seen.clone();
            events.on(move |event| {
                if let Ok(mut seen) = seen.lock() {
                    seen.push((tag, *event));
                }
            });
        }

        events.emit(&DeviceEvent::Lose);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0], (0, DeviceEvent::Lose));
        assert_eq!(seen[2], (2, DeviceEvent::Lose));
    }

    #[test]
    fn test_resize_event_carries_size() {
        let events = EventListeners::new();
        let seen = Arc::new(Mutex::new(None));
        let captured = seen.clone();
        events.on(move |event| {
            if let DeviceEvent::Resize { width, height } = event {
                if let Ok(mut seen) = captured.lock() {
                    *seen = Some((*width, *height));
                }
            }
        });

        events.emit(&DeviceEvent::Resize {
            width: 800,
            height: 600,
        });
        assert_eq!(*seen.lock().unwrap(), Some((800, 600)));
    }
}
