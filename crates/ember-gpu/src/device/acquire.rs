use std::future::Future;
use std::pin::pin;
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};

use crate::error::{GpuError, Result};
use crate::registry::{AdapterHandle, DeviceHandle, InstanceHandle, QueueHandle, SurfaceHandle};

const PUMP_INTERVAL: Duration = Duration::from_millis(1);

/// Drives a one-shot native request to completion on the calling thread.
///
/// wgpu resolves adapter and device requests from its own event processing, so
/// `pump` runs between polls. With a `timeout` the wait is bounded and expiry
/// yields [`GpuError::RequestTimedOut`].
pub(crate) fn block_on_request<F: Future>(
    fut: F,
    timeout: Option<Duration>,
    mut pump: impl FnMut(),
    what: &'static str,
) -> Result<F::Output> {
    let Some(limit) = timeout else {
        return Ok(pollster::block_on(fut));
    };

    let deadline = Instant::now() + limit;
    let mut fut = pin!(fut);
    let mut cx = Context::from_waker(Waker::noop());

    loop {
        if let Poll::Ready(out) = fut.as_mut().poll(&mut cx) {
            return Ok(out);
        }
        if Instant::now() >= deadline {
            log::error!("{what} request timed out after {limit:?}");
            return Err(GpuError::RequestTimedOut { what, after: limit });
        }
        pump();
        std::thread::sleep(PUMP_INTERVAL);
    }
}

/// The three sequential native requests behind device acquisition.
pub trait DeviceRequests {
    fn request_adapter(
        &mut self,
        instance: InstanceHandle,
        surface: SurfaceHandle,
    ) -> Result<AdapterHandle>;

    fn request_device(&mut self, adapter: AdapterHandle) -> Result<DeviceHandle>;

    fn get_queue(&mut self, device: DeviceHandle) -> Result<QueueHandle>;
}

/// Handles produced by a successful acquisition.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Acquired {
    pub adapter: AdapterHandle,
    pub device: DeviceHandle,
    pub queue: QueueHandle,
}

/// Adapter → device → queue. A failed step ends the chain.
pub fn acquire<R: DeviceRequests + ?Sized>(
    requests: &mut R,
    instance: InstanceHandle,
    surface: SurfaceHandle,
) -> Result<Acquired> {
    let adapter = requests.request_adapter(instance, surface)?;
    let device = requests.request_device(adapter)?;
    let queue = requests.get_queue(device)?;
    Ok(Acquired {
        adapter,
        device,
        queue,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use slotmap::SlotMap;

    // ── blocking requests ─────────────────────────────────────────────────

    #[test]
    fn ready_future_resolves_without_pumping() {
        let mut pumped = 0;
        let out = block_on_request(
            std::future::ready(42),
            Some(Duration::from_secs(1)),
            || pumped += 1,
            "test",
        )
        .unwrap();
        assert_eq!(out, 42);
        assert_eq!(pumped, 0);
    }

    #[test]
    fn pending_future_pumps_until_ready() {
        let mut polls = 0;
        let fut = std::future::poll_fn(move |_| {
            polls += 1;
            if polls > 3 { Poll::Ready(polls) } else { Poll::Pending }
        });
        let mut pumped = 0;
        let out = block_on_request(fut, Some(Duration::from_secs(5)), || pumped += 1, "test")
            .unwrap();
        assert_eq!(out, 4);
        assert_eq!(pumped, 3);
    }

    #[test]
    fn stalled_request_times_out() {
        let err = block_on_request(
            std::future::pending::<()>(),
            Some(Duration::from_millis(20)),
            || {},
            "adapter",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            GpuError::RequestTimedOut { what: "adapter", .. }
        ));
    }

    #[test]
    fn no_timeout_blocks_on_the_future() {
        let out = block_on_request(async { 7 }, None, || {}, "test").unwrap();
        assert_eq!(out, 7);
    }

    // ── acquisition chain ─────────────────────────────────────────────────

    #[derive(Default)]
    struct FakeRequests {
        fail_adapter: bool,
        adapters: SlotMap<AdapterHandle, ()>,
        devices: SlotMap<DeviceHandle, ()>,
        queues: SlotMap<QueueHandle, ()>,
        device_calls: u32,
        queue_calls: u32,
    }

    impl DeviceRequests for FakeRequests {
        fn request_adapter(
            &mut self,
            _instance: InstanceHandle,
            _surface: SurfaceHandle,
        ) -> Result<AdapterHandle> {
            if self.fail_adapter {
                return Err(GpuError::AdapterUnavailable("no adapter".into()));
            }
            Ok(self.adapters.insert(()))
        }

        fn request_device(&mut self, adapter: AdapterHandle) -> Result<DeviceHandle> {
            self.device_calls += 1;
            assert!(self.adapters.contains_key(adapter));
            Ok(self.devices.insert(()))
        }

        fn get_queue(&mut self, device: DeviceHandle) -> Result<QueueHandle> {
            self.queue_calls += 1;
            assert!(self.devices.contains_key(device));
            Ok(self.queues.insert(()))
        }
    }

    #[test]
    fn chain_yields_all_three_handles() {
        let mut fake = FakeRequests::default();
        let got = acquire(&mut fake, InstanceHandle::default(), SurfaceHandle::default()).unwrap();
        assert!(fake.adapters.contains_key(got.adapter));
        assert!(fake.devices.contains_key(got.device));
        assert!(fake.queues.contains_key(got.queue));
    }

    #[test]
    fn adapter_failure_short_circuits() {
        let mut fake = FakeRequests {
            fail_adapter: true,
            ..FakeRequests::default()
        };
        let err = acquire(&mut fake, InstanceHandle::default(), SurfaceHandle::default())
            .unwrap_err();
        assert!(matches!(err, GpuError::AdapterUnavailable(_)));
        assert_eq!(fake.device_calls, 0);
        assert_eq!(fake.queue_calls, 0);
        assert!(fake.devices.is_empty());
    }
}
