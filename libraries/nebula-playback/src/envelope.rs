//! Volume fade envelopes
//!
//! A fade drives repeated backend volume-set commands along an ease-out
//! curve until the target level is reached or the fade is aborted. At most
//! one fade is active at a time; starting a new one neutralizes the prior
//! one first so two envelopes never interleave their backend writes. While
//! a fade is in flight the user volume path is suppressed — the fade owns
//! the last-written backend volume.

use nebula_core::AudioBackend;
use std::f32::consts::FRAC_PI_2;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, Instant};
use tracing::warn;

/// How a fade ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeOutcome {
    /// The target level was reached
    Completed,

    /// The fade was aborted before reaching the target
    Aborted,
}

/// Sample the fade curve
///
/// Ease-out: `sin(p * pi/2)`, monotonic, exactly 1.0 at `p = 1`.
pub(crate) fn level_at(from: f32, to: f32, progress: f32) -> f32 {
    let p = progress.clamp(0.0, 1.0);
    if p >= 1.0 {
        return to;
    }
    from + (to - from) * (p * FRAC_PI_2).sin()
}

struct ActiveFade {
    id: u64,
    cancelled: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

/// Volume envelope engine
///
/// Single-owner, single-instance-at-a-time resource: the slot holds the
/// one active fade, and `fade` always clears it before starting.
pub(crate) struct Fader {
    backend: Arc<dyn AudioBackend>,
    tick: Duration,
    next_id: AtomicU64,
    active: StdMutex<Option<ActiveFade>>,
}

impl Fader {
    pub fn new(backend: Arc<dyn AudioBackend>, tick: Duration) -> Self {
        Self {
            backend,
            tick,
            next_id: AtomicU64::new(0),
            active: StdMutex::new(None),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<ActiveFade>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a fade currently owns the backend volume
    pub fn is_active(&self) -> bool {
        self.slot().is_some()
    }

    /// Cancel the in-flight fade, if any
    ///
    /// The aborted fade's awaitable resolves as [`FadeOutcome::Aborted`];
    /// it never completes with a stale target level.
    pub fn abort(&self) {
        if let Some(fade) = self.slot().take() {
            fade.cancelled.store(true, Ordering::SeqCst);
            fade.task.abort();
        }
    }

    /// Fade the backend volume from `from` to `to` over `duration`
    ///
    /// A zero duration is an immediate jump to `to`.
    pub async fn fade(&self, from: f32, to: f32, duration: Duration) -> FadeOutcome {
        self.abort();

        if duration.is_zero() {
            if let Err(e) = self.backend.set_volume(to).await {
                warn!(error = %e, "volume jump failed");
            }
            return FadeOutcome::Completed;
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cancelled = Arc::new(AtomicBool::new(false));
        let (done_tx, done_rx) = oneshot::channel();

        let backend = Arc::clone(&self.backend);
        let tick = self.tick;
        let flag = Arc::clone(&cancelled);
        let task = tokio::spawn(async move {
            run_fade(backend, from, to, duration, tick, &flag, done_tx).await;
        });

        *self.slot() = Some(ActiveFade {
            id,
            cancelled,
            task,
        });

        // A dropped sender means the fade was aborted or its task died.
        let outcome = match done_rx.await {
            Ok(()) => FadeOutcome::Completed,
            Err(_) => FadeOutcome::Aborted,
        };

        let mut active = self.slot();
        if active.as_ref().is_some_and(|f| f.id == id) {
            *active = None;
        }
        outcome
    }
}

async fn run_fade(
    backend: Arc<dyn AudioBackend>,
    from: f32,
    to: f32,
    duration: Duration,
    tick: Duration,
    cancelled: &AtomicBool,
    done_tx: oneshot::Sender<()>,
) {
    let start = Instant::now();
    let mut ticker = interval(tick);
    let mut done_tx = Some(done_tx);

    loop {
        ticker.tick().await;
        if cancelled.load(Ordering::SeqCst) {
            return;
        }

        let progress = (start.elapsed().as_secs_f32() / duration.as_secs_f32()).clamp(0.0, 1.0);
        let level = level_at(from, to, progress);

        if let Err(e) = backend.set_volume(level).await {
            warn!(error = %e, "volume set failed during fade");
        }

        // Re-check after the suspension so an abort issued mid-command
        // never lets a stale tick schedule the completion.
        if cancelled.load(Ordering::SeqCst) {
            return;
        }

        if progress >= 1.0 {
            if let Some(tx) = done_tx.take() {
                let _ = tx.send(());
            }
            return;
        }
    }
}
