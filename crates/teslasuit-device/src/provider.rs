//! Device discovery poller.
//!
//! A background thread enumerates devices every poll interval while the
//! provider is running, diffs the result against the set of devices it
//! believes connected, and queues connect/disconnect events. Events are
//! handled on whichever thread calls [`DeviceProvider::dispatch_pending`]
//! (the consumer thread): that is where devices are opened and subscriber
//! callbacks run. The poller thread never runs subscriber code.
//!
//! The authoritative set only changes when the consumer handles an event:
//! an identity is a member if and only if its open succeeded and its
//! disconnect has not been handled yet.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use teslasuit_api::{DeviceDescriptor, DeviceHandle, LibraryLoader};
use teslasuit_errors::{DeviceError, TeslasuitError};
use tracing::{debug, error, info, warn};

use crate::config::DiscoveryConfig;
use crate::id::DeviceId;
use crate::registry::{CallbackRegistry, SubscriberId};

/// Callback run on the consumer thread after a device opened.
pub type ConnectCallback = dyn Fn(DeviceId, DeviceHandle) + Send + Sync;

/// Callback run on the consumer thread when a device went away.
pub type DisconnectCallback = dyn Fn(DeviceId) + Send + Sync;

/// Event queued by the poller for the consumer thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeviceEvent {
    /// Carries the descriptor by value so it cannot be overwritten by the
    /// next enumeration before it is opened.
    Connected {
        id: DeviceId,
        descriptor: DeviceDescriptor,
    },
    Disconnected {
        id: DeviceId,
    },
}

#[derive(Default)]
struct Tracked {
    handles: BTreeMap<DeviceId, DeviceHandle>,
    // Handles of devices that went away; closed in bulk at teardown.
    stale: Vec<DeviceHandle>,
    pending_connect: HashSet<DeviceId>,
    pending_disconnect: HashSet<DeviceId>,
}

/// The provider's subscriber registries, shareable with slot managers that
/// need to unsubscribe on their own teardown.
#[derive(Clone, Default)]
pub struct ProviderEvents {
    on_connect: Arc<CallbackRegistry<ConnectCallback>>,
    on_disconnect: Arc<CallbackRegistry<DisconnectCallback>>,
}

impl ProviderEvents {
    /// Register a connect callback under `key`, replacing any previous one.
    pub fn subscribe_on_connect(
        &self,
        key: SubscriberId,
        callback: impl Fn(DeviceId, DeviceHandle) + Send + Sync + 'static,
    ) {
        self.on_connect.subscribe(key, Arc::new(callback));
    }

    /// Register a disconnect callback under `key`, replacing any previous one.
    pub fn subscribe_on_disconnect(
        &self,
        key: SubscriberId,
        callback: impl Fn(DeviceId) + Send + Sync + 'static,
    ) {
        self.on_disconnect.subscribe(key, Arc::new(callback));
    }

    /// Remove the connect callback held by `key`.
    pub fn unsubscribe_on_connect(&self, key: SubscriberId) -> bool {
        self.on_connect.unsubscribe(key)
    }

    /// Remove the disconnect callback held by `key`.
    pub fn unsubscribe_on_disconnect(&self, key: SubscriberId) -> bool {
        self.on_disconnect.unsubscribe(key)
    }

    /// Number of live connect and disconnect callbacks.
    pub fn subscriber_counts(&self) -> (usize, usize) {
        (self.on_connect.len(), self.on_disconnect.len())
    }
}

impl std::fmt::Debug for ProviderEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderEvents")
            .field("on_connect", &self.on_connect)
            .field("on_disconnect", &self.on_disconnect)
            .finish()
    }
}

struct Shared {
    loader: Arc<LibraryLoader>,
    config: DiscoveryConfig,
    running: AtomicBool,
    ticks: AtomicU64,
    poll_lock: Mutex<()>,
    tracked: Mutex<Tracked>,
    events: ProviderEvents,
    queue: Sender<DeviceEvent>,
}

impl Shared {
    /// One enumeration and diff. Returns the number of events queued.
    fn poll(&self) -> usize {
        let _serial = self.poll_lock.lock();
        self.ticks.fetch_add(1, Ordering::Relaxed);

        let Some(api) = self.loader.capabilities() else {
            debug!("Skipping discovery tick: vendor library not loaded");
            return 0;
        };
        let mut buffer = vec![DeviceDescriptor::default(); self.config.device_list_capacity];
        let count = match api.enumerate_devices(&mut buffer) {
            Ok(count) => count,
            Err(err) if err.is_unavailable() => {
                warn!(error = %err, "Skipping discovery tick");
                return 0;
            }
            Err(err) => {
                error!(error = %err, "Device enumeration failed");
                return 0;
            }
        };
        let seen: BTreeMap<DeviceId, DeviceDescriptor> = buffer
            .iter()
            .take(count)
            .map(|descriptor| (DeviceId::from(descriptor), *descriptor))
            .collect();
        debug!(count = seen.len(), "Enumerated devices");

        let mut tracked = self.tracked.lock();
        let mut queued = Vec::new();

        let removed: Vec<DeviceId> = tracked
            .handles
            .keys()
            .filter(|id| !seen.contains_key(id))
            .copied()
            .collect();
        for id in removed {
            if tracked.pending_disconnect.insert(id) {
                queued.push(DeviceEvent::Disconnected { id });
            }
        }
        for (id, descriptor) in seen {
            if !tracked.handles.contains_key(&id) && tracked.pending_connect.insert(id) {
                queued.push(DeviceEvent::Connected { id, descriptor });
            }
        }
        drop(tracked);

        let total = queued.len();
        for event in queued {
            if self.queue.send(event).is_err() {
                debug!("Event queue closed; provider is shutting down");
                return 0;
            }
        }
        total
    }

    fn handle(&self, event: DeviceEvent) {
        match event {
            DeviceEvent::Connected { id, descriptor } => self.handle_connect(id, &descriptor),
            DeviceEvent::Disconnected { id } => self.handle_disconnect(id),
        }
    }

    fn handle_connect(&self, id: DeviceId, descriptor: &DeviceDescriptor) {
        self.tracked.lock().pending_connect.remove(&id);

        let Some(api) = self.loader.capabilities() else {
            error!(device_id = %id, "Cannot open device: vendor library not loaded");
            return;
        };
        let handle = match api.open_device(descriptor) {
            Ok(handle) => handle,
            Err(err) => {
                error!(device_id = %id, error = %err, "Failed to open device; retrying next poll");
                return;
            }
        };

        self.tracked.lock().handles.insert(id, handle);
        info!(device_id = %id, handle = %handle, "Device connected");
        self.events.on_connect.for_each(|callback| callback(id, handle));
    }

    fn handle_disconnect(&self, id: DeviceId) {
        let known = {
            let mut tracked = self.tracked.lock();
            tracked.pending_disconnect.remove(&id);
            tracked.handles.contains_key(&id)
        };
        if !known {
            debug!(device_id = %id, "Disconnect for untracked device ignored");
            return;
        }

        info!(device_id = %id, "Device disconnected");
        self.events.on_disconnect.for_each(|callback| callback(id));

        let mut tracked = self.tracked.lock();
        if let Some(handle) = tracked.handles.remove(&id) {
            tracked.stale.push(handle);
        }
    }
}

/// Discovers devices and republishes attach/detach on a consumer thread.
///
/// The poller thread is spawned in [`new`](Self::new) and joined on drop;
/// [`start`](Self::start) and [`stop`](Self::stop) only toggle whether its
/// ticks enumerate.
///
/// Handlers run inside [`dispatch_pending`](Self::dispatch_pending) and
/// [`dispatch_timeout`](Self::dispatch_timeout), which are serialized so
/// handlers never run concurrently. A handler must not dispatch itself.
pub struct DeviceProvider {
    shared: Arc<Shared>,
    inbox: Receiver<DeviceEvent>,
    dispatch_lock: Mutex<()>,
    shutdown: Option<Sender<()>>,
    poller: Option<JoinHandle<()>>,
}

impl DeviceProvider {
    /// Validate `config` and spawn the poller thread, initially stopped.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a bad configuration, or
    /// [`DeviceError::ThreadSpawn`] if the thread cannot be created.
    pub fn new(
        loader: Arc<LibraryLoader>,
        config: DiscoveryConfig,
    ) -> Result<Self, TeslasuitError> {
        config.validate()?;

        let (queue, inbox) = channel::unbounded();
        let (shutdown, shutdown_rx) = channel::bounded::<()>(1);
        let shared = Arc::new(Shared {
            loader,
            config,
            running: AtomicBool::new(false),
            ticks: AtomicU64::new(0),
            poll_lock: Mutex::new(()),
            tracked: Mutex::new(Tracked::default()),
            events: ProviderEvents::default(),
            queue,
        });

        let thread_shared = Arc::clone(&shared);
        let period = config.poll_interval();
        let poller = thread::Builder::new()
            .name("teslasuit-discovery".to_string())
            .spawn(move || Self::poller_main(&thread_shared, &shutdown_rx, period))
            .map_err(|e| DeviceError::ThreadSpawn(e.to_string()))?;

        info!(
            poll_interval_ms = config.poll_interval_ms,
            capacity = config.device_list_capacity,
            "Device provider created"
        );
        Ok(Self {
            shared,
            inbox,
            dispatch_lock: Mutex::new(()),
            shutdown: Some(shutdown),
            poller: Some(poller),
        })
    }

    fn poller_main(shared: &Shared, shutdown: &Receiver<()>, period: Duration) {
        debug!("Discovery thread started");
        loop {
            match shutdown.recv_timeout(period) {
                Err(RecvTimeoutError::Timeout) => {
                    if shared.running.load(Ordering::Acquire) {
                        shared.poll();
                    }
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        debug!("Discovery thread exiting");
    }

    /// Enable diffing on poll ticks.
    pub fn start(&self) {
        if !self.shared.running.swap(true, Ordering::AcqRel) {
            info!("Device discovery started");
        }
    }

    /// Disable diffing on poll ticks. The thread keeps running.
    pub fn stop(&self) {
        if self.shared.running.swap(false, Ordering::AcqRel) {
            info!("Device discovery stopped");
        }
    }

    /// Whether poll ticks currently diff.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Run one enumeration and diff on the calling thread, regardless of
    /// [`is_running`](Self::is_running). Returns the number of events queued.
    pub fn poll_now(&self) -> usize {
        self.shared.poll()
    }

    /// Number of poll ticks executed so far, including `poll_now`.
    pub fn tick_count(&self) -> u64 {
        self.shared.ticks.load(Ordering::Relaxed)
    }

    /// Handle every queued event on the calling thread. Returns how many
    /// were handled.
    pub fn dispatch_pending(&self) -> usize {
        let _consumer = self.dispatch_lock.lock();
        let mut handled = 0;
        while let Ok(event) = self.inbox.try_recv() {
            self.shared.handle(event);
            handled += 1;
        }
        handled
    }

    /// Wait up to `timeout` for an event, then handle it and everything else
    /// queued. Returns how many events were handled.
    pub fn dispatch_timeout(&self, timeout: Duration) -> usize {
        let _consumer = self.dispatch_lock.lock();
        let Ok(first) = self.inbox.recv_timeout(timeout) else {
            return 0;
        };
        self.shared.handle(first);
        let mut handled = 1;
        while let Ok(event) = self.inbox.try_recv() {
            self.shared.handle(event);
            handled += 1;
        }
        handled
    }

    /// Number of events waiting for the consumer.
    pub fn pending_events(&self) -> usize {
        self.inbox.len()
    }

    /// Subscriber registries.
    pub fn events(&self) -> &ProviderEvents {
        &self.shared.events
    }

    /// Register a connect callback under `key`, replacing any previous one.
    pub fn subscribe_on_connect(
        &self,
        key: SubscriberId,
        callback: impl Fn(DeviceId, DeviceHandle) + Send + Sync + 'static,
    ) {
        self.shared.events.subscribe_on_connect(key, callback);
    }

    /// Register a disconnect callback under `key`, replacing any previous one.
    pub fn subscribe_on_disconnect(
        &self,
        key: SubscriberId,
        callback: impl Fn(DeviceId) + Send + Sync + 'static,
    ) {
        self.shared.events.subscribe_on_disconnect(key, callback);
    }

    /// Remove the connect callback held by `key`.
    pub fn unsubscribe_on_connect(&self, key: SubscriberId) -> bool {
        self.shared.events.unsubscribe_on_connect(key)
    }

    /// Remove the disconnect callback held by `key`.
    pub fn unsubscribe_on_disconnect(&self, key: SubscriberId) -> bool {
        self.shared.events.unsubscribe_on_disconnect(key)
    }

    /// Identities currently believed connected, in byte order.
    pub fn device_ids(&self) -> Vec<DeviceId> {
        self.shared.tracked.lock().handles.keys().copied().collect()
    }

    /// Connected identities with their handles, in byte order.
    pub fn connected_devices(&self) -> Vec<(DeviceId, DeviceHandle)> {
        self.shared
            .tracked
            .lock()
            .handles
            .iter()
            .map(|(id, handle)| (*id, *handle))
            .collect()
    }

    /// Handle of a connected device.
    pub fn device_handle(&self, id: DeviceId) -> Option<DeviceHandle> {
        self.shared.tracked.lock().handles.get(&id).copied()
    }

    /// Whether `id` is in the authoritative set.
    pub fn is_connected(&self, id: DeviceId) -> bool {
        self.shared.tracked.lock().handles.contains_key(&id)
    }

    /// The shared loader.
    pub fn loader(&self) -> &Arc<LibraryLoader> {
        &self.shared.loader
    }

    /// Discovery configuration.
    pub fn config(&self) -> &DiscoveryConfig {
        &self.shared.config
    }

    fn close_all_handles(&self) {
        let handles: Vec<DeviceHandle> = {
            let mut tracked = self.shared.tracked.lock();
            let mut handles: Vec<DeviceHandle> =
                std::mem::take(&mut tracked.handles).into_values().collect();
            handles.append(&mut tracked.stale);
            handles
        };
        if handles.is_empty() {
            return;
        }
        let Some(api) = self.shared.loader.capabilities() else {
            warn!(count = handles.len(), "Cannot close device handles: vendor library not loaded");
            return;
        };
        let unique: BTreeSet<DeviceHandle> = handles.into_iter().collect();
        for handle in unique {
            if let Err(err) = api.close_device(handle) {
                error!(handle = %handle, error = %err, "Failed to close device");
            }
        }
    }
}

impl Drop for DeviceProvider {
    fn drop(&mut self) {
        self.stop();
        self.close_all_handles();

        if let Some(shutdown) = self.shutdown.take()
            && shutdown.send(()).is_err()
        {
            debug!("Discovery thread already gone");
        }
        if let Some(poller) = self.poller.take() {
            match poller.join() {
                Ok(()) => info!("Device provider shut down"),
                Err(_) => error!("Discovery thread panicked"),
            }
        }
    }
}

impl std::fmt::Debug for DeviceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceProvider")
            .field("running", &self.is_running())
            .field("devices", &self.device_ids())
            .field("pending_events", &self.pending_events())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_are_shared_between_clones() {
        let events = ProviderEvents::default();
        let clone = events.clone();
        clone.subscribe_on_connect(SubscriberId::new(1), |_, _| {});
        assert_eq!(events.subscriber_counts(), (1, 0));
        assert!(events.unsubscribe_on_connect(SubscriberId::new(1)));
        assert_eq!(clone.subscriber_counts(), (0, 0));
    }
}
