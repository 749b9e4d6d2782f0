//! Blink engine — background on/off toggling of an indicator.
//!
//! A [`BlinkEngine`] owns at most one worker thread. The worker alternates
//! between [`Strobe::dark`] and [`Strobe::light`] every `1/frequency`
//! seconds until it is cancelled, and always finishes with `light()` so the
//! indicator never stays off after blinking stops.
//!
//! Cancellation drops the sending half of a channel the worker waits on.
//! The worker sees the disconnect immediately, restores the light and exits;
//! `stop()` joins it before returning.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Longest half-period accepted; lower frequencies are clamped to this.
const MAX_PERIOD: Duration = Duration::from_secs(3600);

/// Target toggled by the blink worker.
pub trait Strobe: Send + Sync + 'static {
    /// Force the indicator off.
    fn dark(&self);
    /// Show the indicator's current color.
    fn light(&self);
}

struct Worker {
    cancel: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

/// Blink state machine: `Idle` (no worker) or `Blinking` (one worker).
pub struct BlinkEngine<S: Strobe> {
    target: Arc<S>,
    worker: Mutex<Option<Worker>>,
}

impl<S: Strobe> BlinkEngine<S> {
    pub fn new(target: Arc<S>) -> Self {
        Self {
            target,
            worker: Mutex::new(None),
        }
    }

    /// Start blinking for a positive frequency, stop otherwise.
    pub fn set_frequency(&self, frequency_hz: f64) {
        if is_valid_frequency(frequency_hz) {
            self.start(frequency_hz);
        } else {
            self.stop();
        }
    }

    /// Start blinking at `frequency_hz`.
    ///
    /// Returns `true` if a worker was spawned. Already blinking is a no-op
    /// (the running worker keeps its phase and frequency). A non-positive or
    /// non-finite frequency stops any running worker and returns `false`.
    pub fn start(&self, frequency_hz: f64) -> bool {
        if !is_valid_frequency(frequency_hz) {
            self.stop();
            return false;
        }
        let mut slot = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return false;
        }

        let period = Duration::try_from_secs_f64(1.0 / frequency_hz)
            .unwrap_or(MAX_PERIOD)
            .min(MAX_PERIOD);
        let (cancel, cancelled) = mpsc::channel();
        let target = Arc::clone(&self.target);
        let spawned = std::thread::Builder::new()
            .name("blink".into())
            .spawn(move || run_worker(target.as_ref(), period, &cancelled));
        match spawned {
            Ok(handle) => {
                log::info!("blink started at {frequency_hz} Hz");
                *slot = Some(Worker { cancel, handle });
                true
            }
            Err(e) => {
                log::error!("unable to spawn blink worker: {e}");
                false
            }
        }
    }

    /// Stop blinking. Returns `true` if a worker was running.
    ///
    /// Blocks until the worker has restored the light and exited; a concurrent
    /// `start` waits for that too.
    pub fn stop(&self) -> bool {
        let mut slot = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(Worker { cancel, handle }) = slot.take() else {
            return false;
        };
        drop(cancel);
        if handle.join().is_err() {
            log::warn!("blink worker panicked");
            self.target.light();
        }
        log::info!("blink stopped");
        true
    }

    pub fn is_blinking(&self) -> bool {
        self.worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl<S: Strobe> Drop for BlinkEngine<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn is_valid_frequency(frequency_hz: f64) -> bool {
    frequency_hz.is_finite() && frequency_hz > 0.0
}

fn run_worker<S: Strobe + ?Sized>(target: &S, period: Duration, cancelled: &mpsc::Receiver<()>) {
    let mut deadline = Instant::now() + period;
    let mut lit = true;
    loop {
        let wait = deadline.saturating_duration_since(Instant::now());
        match cancelled.recv_timeout(wait) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
        if lit {
            log::debug!("blink: off");
            target.dark();
        } else {
            log::debug!("blink: on");
            target.light();
        }
        lit = !lit;
        deadline += period;
    }
    target.light();
}
