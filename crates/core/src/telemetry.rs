//! Lightweight record of store activity, mirrored to `tracing` at debug level.

#[cfg(feature = "telemetry")]
use std::collections::VecDeque;

#[cfg(feature = "telemetry")]
use parking_lot::Mutex;

/// Events kept in memory; older ones are dropped first.
pub const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    LoadRequested(String),
    LoadCompleted { filter: String, count: usize },
    LoadFailed { filter: String, error: String },
    MutationApplied(String),
    MutationFailed { action: String, error: String },
    ToggleApplied { id: String, completed: bool },
    ToggleRolledBack { id: String, error: String },
}

pub struct Handle {
    #[cfg(feature = "telemetry")]
    events: Mutex<VecDeque<Event>>,
}

impl Default for Handle {
    fn default() -> Self {
        Self::new()
    }
}

impl Handle {
    pub fn new() -> Self {
        Self {
            #[cfg(feature = "telemetry")]
            events: Mutex::new(VecDeque::with_capacity(EVENT_CAPACITY)),
        }
    }

    pub fn record(&self, event: Event) {
        #[cfg(feature = "telemetry")]
        {
            match &event {
                Event::LoadRequested(filter) => {
                    tracing::debug!(filter = filter.as_str(), "task list load requested")
                }
                Event::LoadCompleted { filter, count } => {
                    tracing::debug!(filter = filter.as_str(), count, "task list load completed");
                }
                Event::LoadFailed { filter, error } => {
                    tracing::debug!(filter = filter.as_str(), error = %error, "task list load failed");
                }
                Event::MutationApplied(action) => {
                    tracing::debug!(action = action.as_str(), "task mutation applied")
                }
                Event::MutationFailed { action, error } => tracing::debug!(
                    action = action.as_str(),
                    error = %error,
                    "task mutation failed"
                ),
                Event::ToggleApplied { id, completed } => tracing::debug!(
                    task_id = id.as_str(),
                    completed,
                    "optimistic completion applied"
                ),
                Event::ToggleRolledBack { id, error } => tracing::debug!(
                    task_id = id.as_str(),
                    error = %error,
                    "optimistic completion rolled back"
                ),
            }
            let mut events = self.events.lock();
            if events.len() == EVENT_CAPACITY {
                events.pop_front();
            }
            events.push_back(event);
        }
        #[cfg(not(feature = "telemetry"))]
        {
            let _ = event;
        }
    }

    pub fn is_enabled(&self) -> bool {
        cfg!(feature = "telemetry")
    }

    /// The most recent events, oldest first. Always empty when the feature is off.
    pub fn events(&self) -> Vec<Event> {
        #[cfg(feature = "telemetry")]
        {
            self.events.lock().iter().cloned().collect()
        }
        #[cfg(not(feature = "telemetry"))]
        {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn records_events_when_enabled() {
        let handle = Handle::new();
        handle.record(Event::LoadCompleted {
            filter: "Active".into(),
            count: 2,
        });
        if handle.is_enabled() {
            assert_eq!(
                handle.events(),
                vec![Event::LoadCompleted {
                    filter: "Active".into(),
                    count: 2
                }]
            );
        } else {
            assert!(handle.events().is_empty());
        }
    }

    #[test]
    fn buffer_keeps_only_the_newest_events() {
        let handle = Handle::new();
        for count in 0..EVENT_CAPACITY + 10 {
            handle.record(Event::LoadCompleted {
                filter: "All".into(),
                count,
            });
        }

        let events = handle.events();
        if !handle.is_enabled() {
            assert!(events.is_empty());
            return;
        }
        assert_eq!(events.len(), EVENT_CAPACITY);
        assert_eq!(
            events.first(),
            Some(&Event::LoadCompleted {
                filter: "All".into(),
                count: 10
            })
        );
        assert_eq!(
            events.last(),
            Some(&Event::LoadCompleted {
                filter: "All".into(),
                count: EVENT_CAPACITY + 9
            })
        );
    }
}
