use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::driver::{Driver, EventCallback, SampleCallback, RET_SUCCESS};
use crate::payload::{DiscreteEvent, SampleEvent};
use crate::stream::{Stream, StreamKind};
use crate::{Result, SensorBufError};

/// Driver-facing entry points bound to one registry.
#[derive(Debug, Clone, Copy)]
pub struct Trampolines {
    pub sample: SampleCallback,
    pub event: EventCallback,
}

/// Registry-side view of a buffer instance: only its stream slots.
pub(crate) struct Subscriber {
    pub(crate) id: u64,
    pub(crate) samples: Stream<SampleEvent>,
    pub(crate) events: Stream<DiscreteEvent>,
}

impl Subscriber {
    pub(crate) fn new(id: u64) -> Self {
        Subscriber {
            id,
            samples: Stream::new(StreamKind::Samples),
            events: Stream::new(StreamKind::Events),
        }
    }
}

/// Driver callback slot of one stream kind: the driver holding the
/// trampoline and how many instances are buffering through it.
struct Binding {
    driver: Option<Arc<dyn Driver>>,
    count: usize,
}

impl Binding {
    const fn new() -> Self {
        Binding {
            driver: None,
            count: 0,
        }
    }

    fn is_bound_to(&self, driver: &Arc<dyn Driver>) -> bool {
        self.driver
            .as_ref()
            .is_some_and(|bound| std::ptr::addr_eq(Arc::as_ptr(bound), Arc::as_ptr(driver)))
    }
}

struct Installed {
    samples: Binding,
    events: Binding,
}

impl Installed {
    fn binding_mut(&mut self, kind: StreamKind) -> &mut Binding {
        match kind {
            StreamKind::Samples => &mut self.samples,
            StreamKind::Events => &mut self.events,
        }
    }
}

/// Fans driver callbacks out to every registered buffer instance.
///
/// Dispatch holds the read lock for one pass over the subscribers, so
/// dispatches from several driver threads run side by side. Registration and
/// deregistration take the write lock and therefore wait for in-flight
/// dispatches to finish.
///
/// The driver has a single callback slot per stream kind. The registry counts
/// how many instances are buffering each stream, installs its trampoline when
/// the first one starts and uninstalls it when the last one stops. That
/// bookkeeping lives behind its own mutex so driver calls never happen while
/// the dispatch lock is held.
///
/// While a stream has buffering instances it is bound to the driver that
/// installed the trampoline; subscribing through a different driver fails
/// with [`SensorBufError::DriverMismatch`].
pub struct Registry {
    subscribers: RwLock<Vec<Arc<Subscriber>>>,
    installed: Mutex<Installed>,
    trampolines: Trampolines,
}

impl Registry {
    pub const fn new(trampolines: Trampolines) -> Self {
        Registry {
            subscribers: RwLock::new(Vec::new()),
            installed: Mutex::new(Installed {
                samples: Binding::new(),
                events: Binding::new(),
            }),
            trampolines,
        }
    }

    /// The process-wide registry behind [`sample_trampoline`] and
    /// [`event_trampoline`].
    pub fn global() -> &'static Registry {
        &GLOBAL
    }

    pub fn trampolines(&self) -> Trampolines {
        self.trampolines
    }

    pub fn len(&self) -> usize {
        self.subscribers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.read().is_empty()
    }

    /// Number of instances currently buffering `kind`.
    pub fn buffering(&self, kind: StreamKind) -> usize {
        self.installed.lock().binding_mut(kind).count
    }

    /// Returns `false` if the subscriber was already registered.
    pub(crate) fn register(&self, subscriber: Arc<Subscriber>) -> bool {
        let mut subscribers = self.subscribers.write();
        if subscribers.iter().any(|s| s.id == subscriber.id) {
            return false;
        }
        debug!(instance = subscriber.id, "registering buffer instance");
        subscribers.push(subscriber);
        true
    }

    /// Returns `false` if no subscriber with `id` was registered.
    pub(crate) fn deregister(&self, id: u64) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        let removed = subscribers.len() != before;
        if removed {
            debug!(instance = id, "deregistered buffer instance");
        }
        removed
    }

    pub fn dispatch_sample(&self, sample: SampleEvent) -> i32 {
        for subscriber in self.subscribers.read().iter() {
            subscriber.samples.offer(sample);
        }
        RET_SUCCESS
    }

    pub fn dispatch_event(&self, event: DiscreteEvent) -> i32 {
        for subscriber in self.subscribers.read().iter() {
            subscriber.events.offer(event);
        }
        RET_SUCCESS
    }

    /// Waits for dispatches already in flight to finish. Dispatches starting
    /// afterwards observe every store made before the call.
    pub(crate) fn quiesce(&self) {
        drop(self.subscribers.write());
    }

    pub(crate) fn subscribe(&self, kind: StreamKind, driver: &Arc<dyn Driver>) -> Result<()> {
        let mut installed = self.installed.lock();
        let binding = installed.binding_mut(kind);
        if binding.driver.is_none() {
            let status = self.install(kind, driver.as_ref(), true);
            if status != RET_SUCCESS {
                warn!(stream = %kind, status, "driver refused callback registration");
                return Err(SensorBufError::Registration { stream: kind, status });
            }
            debug!(stream = %kind, "driver callback installed");
            binding.driver = Some(driver.clone());
        } else if !binding.is_bound_to(driver) {
            warn!(stream = %kind, "stream already bound to another driver");
            return Err(SensorBufError::DriverMismatch { stream: kind });
        }
        binding.count += 1;
        Ok(())
    }

    /// Ends one subscription to `kind`. The last one removes the trampoline
    /// from the driver it was installed with.
    pub(crate) fn unsubscribe(&self, kind: StreamKind) {
        let mut installed = self.installed.lock();
        let binding = installed.binding_mut(kind);
        if binding.count == 0 {
            return;
        }
        binding.count -= 1;
        if binding.count > 0 {
            return;
        }
        if let Some(driver) = binding.driver.take() {
            let status = self.install(kind, driver.as_ref(), false);
            if status != RET_SUCCESS {
                warn!(stream = %kind, status, "driver reported failure removing callback");
            } else {
                debug!(stream = %kind, "driver callback removed");
            }
        }
    }

    fn install(&self, kind: StreamKind, driver: &dyn Driver, install: bool) -> i32 {
        match kind {
            StreamKind::Samples => {
                driver.set_sample_callback(install.then_some(self.trampolines.sample))
            }
            StreamKind::Events => {
                driver.set_event_callback(install.then_some(self.trampolines.event))
            }
        }
    }
}

static GLOBAL: Registry = Registry::new(Trampolines {
    sample: sample_trampoline,
    event: event_trampoline,
});

/// Sample callback for the process-wide registry.
pub extern "system" fn sample_trampoline(sample: SampleEvent) -> i32 {
    GLOBAL.dispatch_sample(sample)
}

/// Event callback for the process-wide registry.
pub extern "system" fn event_trampoline(event: DiscreteEvent) -> i32 {
    GLOBAL.dispatch_event(event)
}

/// Declares a `'static` [`Registry`] with its own pair of trampolines.
///
/// Instances attached to it (see `BufferInstance::with_registry`) are isolated
/// from the process-wide registry, which is mostly useful when several
/// independent drivers are loaded, and in tests.
///
/// ```rust
/// sensorbuf::registry!(static LAB_REGISTRY);
///
/// assert!(LAB_REGISTRY.is_empty());
/// ```
#[macro_export]
macro_rules! registry {
    ($(#[$attr:meta])* $vis:vis static $name:ident) => {
        $(#[$attr])*
        $vis static $name: $crate::Registry = {
            extern "system" fn on_sample(sample: $crate::SampleEvent) -> i32 {
                $name.dispatch_sample(sample)
            }
            extern "system" fn on_event(event: $crate::DiscreteEvent) -> i32 {
                $name.dispatch_event(event)
            }
            $crate::Registry::new($crate::Trampolines {
                sample: on_sample,
                event: on_event,
            })
        };
    };
}
