//! Server lifecycle application service.
//!
//! Composes a [`PortReaperPort`] and a [`ReadinessProbePort`] into the
//! start / wait / stop protocol used by test harnesses. Every wait is a
//! fixed-interval polling loop with a wall-clock deadline measured from the
//! start of the call.

use std::future::Future;

use tokio::time::{sleep, Instant};
use tracing::{debug, error};

use crate::adapters::{spawn_detached, ProcessHandle};
use crate::domain::{PollSettings, ServerConfig};
use crate::error::{Error, Result};
use crate::ports::{PortReaperPort, ReadinessProbePort};

/// Application service for starting, stopping and polling a local server.
///
/// The reaper and probe are injected so tests can drive the polling logic
/// with in-memory doubles and a paused clock.
#[derive(Debug, Clone)]
pub struct ServerLifecycle<R: PortReaperPort, P: ReadinessProbePort> {
    reaper: R,
    probe: P,
}

impl<R: PortReaperPort, P: ReadinessProbePort> ServerLifecycle<R, P> {
    /// Create a lifecycle service from a reaper and a probe.
    pub fn new(reaper: R, probe: P) -> Self {
        Self { reaper, probe }
    }

    pub fn reaper(&self) -> &R {
        &self.reaper
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    /// Single probe, with any probe error read as "not running".
    pub async fn is_server_running(&self, port: u16, host: &str) -> bool {
        probe_ready(&self.probe, host, port).await
    }

    /// Free the configured port and wait until nothing answers on it.
    ///
    /// The reaper always runs before the first probe. Resolves `Ok(true)` as
    /// soon as a probe reports the server gone, or fails with
    /// [`Error::PortStillBound`] once the deadline has passed.
    pub async fn stop(&self, config: &ServerConfig) -> Result<bool> {
        let started = Instant::now();
        let settings = config.stop_settings();

        self.reaper.reap(settings.port).await;

        loop {
            if !probe_ready(&self.probe, &settings.host, settings.port).await {
                debug!(
                    port = settings.port,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Port is free"
                );
                return Ok(true);
            }

            if started.elapsed() >= settings.timeout {
                return Err(Error::PortStillBound {
                    port: settings.port,
                    timeout_ms: settings.timeout.as_millis() as u64,
                });
            }

            sleep(settings.poll_interval).await;
        }
    }

    /// Poll `port` until the server answers, then call `on_ready` once.
    ///
    /// Host, timeout and interval come from `config` with the readiness
    /// defaults (30s, 500ms). `on_ready` is never called when this fails
    /// with [`Error::ServerNotReady`].
    pub async fn wait_until_ready<F>(&self, port: u16, config: &ServerConfig, on_ready: F) -> Result<()>
    where
        F: FnOnce(),
    {
        let settings = PollSettings {
            port,
            ..config.ready_settings()
        };
        poll_until_ready(&self.probe, &settings, on_ready).await
    }
}

impl<R, P> ServerLifecycle<R, P>
where
    R: PortReaperPort,
    P: ReadinessProbePort + Clone + 'static,
{
    /// Spawn `command` detached and return its handle immediately.
    ///
    /// With `on_ready`, readiness polling for the configured port runs on a
    /// background task that nobody awaits. If it times out the failure is
    /// logged and `on_ready` is dropped uncalled. The only error returned
    /// here is a failure to spawn the command at all.
    pub fn start<F>(
        &self,
        command: &str,
        config: &ServerConfig,
        on_ready: Option<F>,
    ) -> Result<ProcessHandle>
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = spawn_detached(command, &config.spawn)?;

        if let Some(on_ready) = on_ready {
            let probe = self.probe.clone();
            let settings = config.ready_settings();
            let pid = handle.pid();
            let command = handle.command().to_string();

            spawn_background(async move {
                if let Err(e) = poll_until_ready(&probe, &settings, on_ready).await {
                    error!(
                        pid = pid,
                        command = %command,
                        port = settings.port,
                        error = %e,
                        "Error waiting for server to be ready"
                    );
                }
            });
        }

        Ok(handle)
    }
}

async fn probe_ready<P: ReadinessProbePort>(probe: &P, host: &str, port: u16) -> bool {
    match probe.probe(host, port).await {
        Ok(ready) => ready,
        Err(e) => {
            debug!(host = host, port = port, error = %e, "Probe error, treating as not ready");
            false
        }
    }
}

async fn poll_until_ready<P, F>(probe: &P, settings: &PollSettings, on_ready: F) -> Result<()>
where
    P: ReadinessProbePort,
    F: FnOnce(),
{
    let started = Instant::now();

    loop {
        if probe_ready(probe, &settings.host, settings.port).await {
            debug!(
                port = settings.port,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Server is ready"
            );
            on_ready();
            return Ok(());
        }

        if started.elapsed() >= settings.timeout {
            return Err(Error::ServerNotReady {
                timeout_ms: settings.timeout.as_millis() as u64,
            });
        }

        sleep(settings.poll_interval).await;
    }
}

/// Run `fut` detached from the caller.
///
/// Uses the current tokio runtime when there is one; otherwise a dedicated
/// thread drives the future on its own current-thread runtime.
fn spawn_background<Fut>(fut: Fut)
where
    Fut: Future<Output = ()> + Send + 'static,
{
    if let Ok(handle) = tokio::runtime::Handle::try_current() {
        handle.spawn(fut);
        return;
    }

    let spawned = std::thread::Builder::new()
        .name("portwarden-ready".to_string())
        .spawn(move || {
            match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime.block_on(fut),
                Err(e) => error!(error = %e, "Failed to create runtime for readiness wait"),
            }
        });

    if let Err(e) = spawned {
        error!(error = %e, "Failed to start readiness wait thread");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    type EventLog = Arc<Mutex<Vec<&'static str>>>;

    /// Mock reaper that records when it ran.
    #[derive(Clone)]
    struct MockReaper {
        log: EventLog,
        reaped: Arc<Mutex<Vec<u16>>>,
    }

    impl MockReaper {
        fn new(log: EventLog) -> Self {
            Self {
                log,
                reaped: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl PortReaperPort for MockReaper {
        async fn reap(&self, port: u16) {
            self.log.lock().push("reap");
            self.reaped.lock().push(port);
        }
    }

    #[derive(Clone, Copy)]
    enum Step {
        Ready,
        NotReady,
        Fail,
    }

    /// Mock probe that plays back a script, then repeats `fallback` forever.
    #[derive(Clone)]
    struct ScriptedProbe {
        script: Arc<Mutex<VecDeque<Step>>>,
        fallback: Step,
        calls: Arc<Mutex<Vec<(String, u16)>>>,
        log: EventLog,
    }

    impl ScriptedProbe {
        fn new(script: Vec<Step>, fallback: Step, log: EventLog) -> Self {
            Self {
                script: Arc::new(Mutex::new(script.into())),
                fallback,
                calls: Arc::new(Mutex::new(Vec::new())),
                log,
            }
        }

        fn always(step: Step, log: EventLog) -> Self {
            Self::new(Vec::new(), step, log)
        }

        fn call_count(&self) -> usize {
            self.calls.lock().len()
        }
    }

    impl ReadinessProbePort for ScriptedProbe {
        async fn probe(&self, host: &str, port: u16) -> Result<bool> {
            self.log.lock().push("probe");
            self.calls.lock().push((host.to_string(), port));
            let step = self.script.lock().pop_front().unwrap_or(self.fallback);
            match step {
                Step::Ready => Ok(true),
                Step::NotReady => Ok(false),
                Step::Fail => Err(Error::Probe("connection reset".to_string())),
            }
        }
    }

    fn lifecycle(probe: ScriptedProbe, log: &EventLog) -> ServerLifecycle<MockReaper, ScriptedProbe> {
        ServerLifecycle::new(MockReaper::new(log.clone()), probe)
    }

    fn fast_config(port: u16) -> ServerConfig {
        ServerConfig::new()
            .with_port(port)
            .with_timeout(Duration::from_millis(1000))
            .with_poll_interval(Duration::from_millis(100))
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_free_port_resolves_after_one_probe() {
        let log = EventLog::default();
        let probe = ScriptedProbe::always(Step::NotReady, log.clone());
        let service = lifecycle(probe.clone(), &log);

        let started = Instant::now();
        assert!(service.stop(&fast_config(9999)).await.unwrap());

        assert_eq!(probe.call_count(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(*log.lock(), vec!["reap", "probe"]);
        assert_eq!(*service.reaper().reaped.lock(), vec![9999]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_polls_until_port_frees() {
        let log = EventLog::default();
        let probe = ScriptedProbe::new(
            vec![Step::Ready, Step::Ready, Step::Ready],
            Step::NotReady,
            log.clone(),
        );
        let service = lifecycle(probe.clone(), &log);

        let started = Instant::now();
        assert!(service.stop(&fast_config(9999)).await.unwrap());

        assert_eq!(probe.call_count(), 4);
        assert!(started.elapsed() >= Duration::from_millis(300));
        assert!(started.elapsed() < Duration::from_millis(400));
        assert_eq!(service.reaper().reaped.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_fails_within_deadline_window() {
        let log = EventLog::default();
        let probe = ScriptedProbe::always(Step::Ready, log.clone());
        let service = lifecycle(probe, &log);

        let started = Instant::now();
        let err = service.stop(&fast_config(9999)).await.unwrap_err();
        let elapsed = started.elapsed();

        assert!(matches!(
            err,
            Error::PortStillBound {
                port: 9999,
                timeout_ms: 1000
            }
        ));
        assert_eq!(err.to_string(), "Failed to free port 9999 after 1000ms");
        assert!(elapsed >= Duration::from_millis(1000));
        assert!(elapsed <= Duration::from_millis(1100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_uses_defaults() {
        let log = EventLog::default();
        let probe = ScriptedProbe::always(Step::Ready, log.clone());
        let service = lifecycle(probe.clone(), &log);

        let started = Instant::now();
        let err = service.stop(&ServerConfig::new()).await.unwrap_err();

        assert!(err.to_string().contains("Failed to free port 6006 after 5000ms"));
        assert!(started.elapsed() >= Duration::from_millis(5000));
        assert!(started.elapsed() <= Duration::from_millis(5200));
        assert!(probe.calls.lock().iter().all(|(h, p)| h == "127.0.0.1" && *p == 6006));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_treats_probe_error_as_free() {
        let log = EventLog::default();
        let probe = ScriptedProbe::always(Step::Fail, log.clone());
        let service = lifecycle(probe, &log);

        assert!(service.stop(&fast_config(8080)).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_never_ready_rejects_without_callback() {
        let log = EventLog::default();
        let probe = ScriptedProbe::always(Step::NotReady, log.clone());
        let service = lifecycle(probe, &log);
        let called = AtomicUsize::new(0);

        let config = ServerConfig::new()
            .with_timeout(Duration::from_millis(1000))
            .with_poll_interval(Duration::from_millis(200));

        let started = Instant::now();
        let err = service
            .wait_until_ready(8080, &config, || {
                called.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap_err();

        assert!(err.to_string().contains("not responsive after 1000ms"));
        assert_eq!(called.load(Ordering::SeqCst), 0);
        assert!(started.elapsed() >= Duration::from_millis(1000));
        assert!(started.elapsed() <= Duration::from_millis(1200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_calls_back_once_after_ready_probe() {
        let log = EventLog::default();
        let probe = ScriptedProbe::new(
            vec![Step::NotReady, Step::Fail, Step::NotReady],
            Step::Ready,
            log.clone(),
        );
        let service = lifecycle(probe.clone(), &log);
        let called = AtomicUsize::new(0);

        service
            .wait_until_ready(3000, &ServerConfig::new(), || {
                called.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();

        assert_eq!(called.load(Ordering::SeqCst), 1);
        assert_eq!(probe.call_count(), 4);
        // No reaping on the readiness path.
        assert!(!log.lock().contains(&"reap"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_probes_given_port_on_configured_host() {
        let log = EventLog::default();
        let probe = ScriptedProbe::always(Step::Ready, log.clone());
        let service = lifecycle(probe.clone(), &log);

        let config = ServerConfig::new().with_port(1111).with_host("localhost");
        service.wait_until_ready(2222, &config, || {}).await.unwrap();

        assert_eq!(*probe.calls.lock(), vec![("localhost".to_string(), 2222)]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_start_returns_before_ready_then_calls_back() {
        let log = EventLog::default();
        let probe = ScriptedProbe::new(vec![Step::NotReady, Step::NotReady], Step::Ready, log.clone());
        let service = lifecycle(probe.clone(), &log);
        let (tx, rx) = tokio::sync::oneshot::channel();

        let config = ServerConfig::new()
            .with_port(7007)
            .with_poll_interval(Duration::from_millis(10));

        let mut handle = service
            .start("sleep 30", &config, Some(move || {
                let _ = tx.send(());
            }))
            .unwrap();

        // Nothing has been probed yet: the background task has not been polled.
        assert_eq!(probe.call_count(), 0);
        assert!(handle.pid() > 0);

        tokio::time::timeout(Duration::from_secs(5), rx)
            .await
            .expect("callback within deadline")
            .expect("callback sent");
        assert_eq!(probe.call_count(), 3);
        assert!(probe.calls.lock().iter().all(|(_, p)| *p == 7007));

        handle.kill().unwrap();
        let _ = handle.wait();
    }

    #[cfg(unix)]
    #[tokio::test(start_paused = true)]
    async fn test_start_swallows_readiness_timeout() {
        let log = EventLog::default();
        let probe = ScriptedProbe::always(Step::NotReady, log.clone());
        let service = lifecycle(probe.clone(), &log);
        let called = Arc::new(AtomicUsize::new(0));

        let config = fast_config(7008);
        let counter = called.clone();
        let mut handle = service
            .start("sleep 30", &config, Some(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        sleep(Duration::from_millis(2000)).await;

        assert_eq!(called.load(Ordering::SeqCst), 0);
        assert!(probe.call_count() >= 10);

        handle.kill().unwrap();
        let _ = handle.wait();
    }

    #[cfg(unix)]
    #[test]
    fn test_start_without_runtime_uses_background_thread() {
        let log = EventLog::default();
        let probe = ScriptedProbe::always(Step::Ready, log.clone());
        let service = lifecycle(probe, &log);
        let (tx, rx) = std::sync::mpsc::channel();

        let mut handle = service
            .start("sleep 30", &fast_config(7009), Some(move || {
                let _ = tx.send(());
            }))
            .unwrap();

        rx.recv_timeout(Duration::from_secs(5)).unwrap();

        handle.kill().unwrap();
        let _ = handle.wait();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_start_without_callback_never_probes() {
        let log = EventLog::default();
        let probe = ScriptedProbe::always(Step::Ready, log.clone());
        let service = lifecycle(probe.clone(), &log);

        let mut handle = service
            .start::<fn()>("sleep 30", &ServerConfig::new(), None)
            .unwrap();
        tokio::task::yield_now().await;

        assert_eq!(probe.call_count(), 0);
        handle.kill().unwrap();
        let _ = handle.wait();
    }
}
