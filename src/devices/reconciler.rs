/*!
 * Device Event Reconciler
 * Merges the hub and controller notification feeds into one registry stream
 *
 * Feeds push raw events into a bounded queue; a single worker thread
 * extracts identities and applies them to the registry in arrival order.
 * Delivery threads never touch registry state themselves.
 */

use flume::{Receiver, RecvTimeoutError, Sender};
use std::panic::{self, AssertUnwindSafe};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::errors::{ExtractError, RegistryError, RegistryResult};
use super::events::{DeviceAction, DeviceEvent, EventSource};
use super::registry::DeviceRegistry;

/// How often a blocked `flush` checks that the worker is still alive
const FLUSH_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Control messages for the reconciler worker
enum Message {
    Event(DeviceEvent),
    /// Reply once everything queued before it has been applied
    Flush(Sender<()>),
    Shutdown,
}

/// Sending side of one notification feed
#[derive(Clone)]
pub struct DeviceFeed {
    source: EventSource,
    tx: Sender<Message>,
}

impl DeviceFeed {
    pub fn source(&self) -> EventSource {
        self.source
    }

    /// Queue an add notification; blocks while the queue is full
    pub fn added(&self, descriptor: impl Into<String>) -> RegistryResult<()> {
        self.send(DeviceEvent::added(self.source, descriptor))
    }

    /// Queue a remove notification; blocks while the queue is full
    pub fn removed(&self, descriptor: impl Into<String>) -> RegistryResult<()> {
        self.send(DeviceEvent::removed(self.source, descriptor))
    }

    /// Queue an event as-is; its own source decides how it is parsed
    pub fn send(&self, event: DeviceEvent) -> RegistryResult<()> {
        self.tx
            .send(Message::Event(event))
            .map_err(|_| RegistryError::ShutDown)
    }
}

/// Handle to the reconciler worker
pub struct Reconciler {
    tx: Sender<Message>,
    handle: Option<JoinHandle<()>>,
}

impl Reconciler {
    /// Spawn the worker, sized by the registry's queue capacity
    pub fn spawn(registry: DeviceRegistry) -> RegistryResult<Self> {
        let capacity = registry.config().event_queue_capacity.max(1);
        let (tx, rx) = flume::bounded(capacity);

        let handle = std::thread::Builder::new()
            .name("drivehub-reconciler".into())
            .spawn(move || run_reconciler_loop(registry, rx))
            .map_err(|e| {
                warn!(error = %e, "Failed to spawn reconciler thread");
                RegistryError::ShutDown
            })?;

        info!(capacity, "Device event reconciler started");
        Ok(Self {
            tx,
            handle: Some(handle),
        })
    }

    /// Sending handle for one feed
    pub fn feed(&self, source: EventSource) -> DeviceFeed {
        DeviceFeed {
            source,
            tx: self.tx.clone(),
        }
    }

    /// Block until every event queued so far has been applied
    ///
    /// Fails with `ShutDown` instead of waiting forever if the worker has
    /// exited with the barrier still queued.
    pub fn flush(&self) -> RegistryResult<()> {
        let (ack_tx, ack_rx) = flume::bounded(1);
        self.tx
            .send(Message::Flush(ack_tx))
            .map_err(|_| RegistryError::ShutDown)?;

        loop {
            match ack_rx.recv_timeout(FLUSH_POLL_INTERVAL) {
                Ok(()) => return Ok(()),
                Err(RecvTimeoutError::Disconnected) => return Err(RegistryError::ShutDown),
                Err(RecvTimeoutError::Timeout) if !self.is_running() => {
                    // The ack may have landed between the timeout and the check
                    return ack_rx.try_recv().map_err(|_| RegistryError::ShutDown);
                }
                Err(RecvTimeoutError::Timeout) => {}
            }
        }
    }

    /// Whether the worker thread is still alive
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map_or(false, |h| !h.is_finished())
    }

    /// Apply queued events, stop the worker and wait for it
    ///
    /// Feeds still held elsewhere start failing with `ShutDown` afterwards.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.tx.send(Message::Shutdown);
            if handle.join().is_err() {
                warn!("Reconciler thread panicked");
            }
            info!("Device event reconciler stopped");
        }
    }
}

impl Drop for Reconciler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Main worker loop
fn run_reconciler_loop(registry: DeviceRegistry, rx: Receiver<Message>) {
    while let Ok(message) = rx.recv() {
        match message {
            Message::Event(event) => {
                let applied =
                    panic::catch_unwind(AssertUnwindSafe(|| apply_event(&registry, &event)));
                if applied.is_err() {
                    error!(
                        source = %event.source,
                        descriptor = %event.descriptor,
                        "Device event handler panicked, event dropped"
                    );
                }
            }
            Message::Flush(ack) => {
                let _ = ack.send(());
            }
            Message::Shutdown => break,
        }
    }

    // Release barriers queued behind the shutdown so their waiters fail fast
    let dropped = rx.drain().count();
    if dropped > 0 {
        debug!(dropped, "Discarded messages queued after shutdown");
    }
}

/// Parse one raw event and hand it to the registry
///
/// Unparseable events are dropped; a flaky notification must never take
/// the registry down.
fn apply_event(registry: &DeviceRegistry, event: &DeviceEvent) {
    let device = match event.source.extract(&event.descriptor) {
        Ok(device) => device,
        Err(ExtractError::NoSerial(descriptor)) => {
            debug!(source = %event.source, descriptor = %descriptor, "Dropping event for device without serial");
            return;
        }
        Err(e) => {
            warn!(source = %event.source, error = %e, "Dropping unparseable device event");
            return;
        }
    };

    let result = match event.action {
        DeviceAction::Added => registry.on_new_device(&device),
        DeviceAction::Removed => registry.on_deleted_device(&device),
    };

    if let Err(e) = result {
        warn!(
            source = %event.source,
            hardware_id = %device.hardware_id,
            error = %e,
            "Device event not applied"
        );
    }
}
