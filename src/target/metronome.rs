//! Background metronome for FOLLOW sessions
//!
//! The beat thread owns no session state. It shares one atomic beat
//! counter and one atomic stop flag with the tick loop, which only reads
//! the counter. `stop` joins the thread, so no beat can fire after it
//! returns.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

pub const MIN_BPM: u32 = 20;
pub const MAX_BPM: u32 = 200;

/// Polling granularity of the beat thread
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Called on the beat thread with the new beat count
pub type BeatCallback = Arc<dyn Fn(u64) + Send + Sync>;

/// Deadline of the beat after the one due at `scheduled`
///
/// A thread that wakes late (stalled or suspended) resumes one interval
/// after `now` instead of replaying the missed beats back to back.
fn next_beat_after(scheduled: Instant, interval: Duration, now: Instant) -> Instant {
    let next = scheduled + interval;
    if next <= now {
        now + interval
    } else {
        next
    }
}

pub struct Metronome {
    bpm: u32,
    beats: Arc<AtomicU64>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    on_beat: Option<BeatCallback>,
}

impl Metronome {
    pub fn new(bpm: u32) -> Self {
        Metronome {
            bpm: bpm.clamp(MIN_BPM, MAX_BPM),
            beats: Arc::new(AtomicU64::new(0)),
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
            on_beat: None,
        }
    }

    /// Attach a callback fired on every beat (e.g. an audible click)
    pub fn with_callback(mut self, on_beat: BeatCallback) -> Self {
        self.on_beat = Some(on_beat);
        self
    }

    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    /// Change the tempo, clamped to [20, 200]; refused while ticking
    pub fn set_bpm(&mut self, bpm: u32) -> bool {
        if self.is_running() {
            return false;
        }
        self.bpm = bpm.clamp(MIN_BPM, MAX_BPM);
        true
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn beat_count(&self) -> u64 {
        self.beats.load(Ordering::Acquire)
    }

    /// Reset the counter and start beating; the first beat fires immediately
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        self.beats.store(0, Ordering::Release);
        self.running.store(true, Ordering::Release);

        let interval = Duration::from_secs_f64(60.0 / self.bpm as f64);
        let beats = Arc::clone(&self.beats);
        let running = Arc::clone(&self.running);
        let on_beat = self.on_beat.clone();

        self.handle = Some(thread::spawn(move || {
            let mut next_beat = Instant::now();
            while running.load(Ordering::Acquire) {
                let now = Instant::now();
                if now >= next_beat {
                    let count = beats.fetch_add(1, Ordering::AcqRel) + 1;
                    if let Some(callback) = &on_beat {
                        callback(count);
                    }
                    next_beat = next_beat_after(next_beat, interval, now);
                }
                thread::sleep(POLL_INTERVAL);
            }
        }));
        tracing::debug!(bpm = self.bpm, "metronome started");
    }

    /// Stop beating and wait for the beat thread to exit
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("metronome thread panicked");
            }
            tracing::debug!(beats = self.beat_count(), "metronome stopped");
        }
    }
}

impl Drop for Metronome {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Metronome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metronome")
            .field("bpm", &self.bpm)
            .field("running", &self.is_running())
            .field("beats", &self.beat_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bpm_clamped() {
        let mut metronome = Metronome::new(500);
        assert_eq!(metronome.bpm(), MAX_BPM);
        assert!(metronome.set_bpm(5));
        assert_eq!(metronome.bpm(), MIN_BPM);
    }

    #[test]
    fn test_beats_and_stop() {
        let mut metronome = Metronome::new(200);
        metronome.start();
        assert!(metronome.is_running());
        thread::sleep(Duration::from_millis(100));
        metronome.stop();

        let count = metronome.beat_count();
        assert!(count >= 1);
        assert!(!metronome.is_running());

        // Nothing ticks after stop returns
        thread::sleep(Duration::from_millis(350));
        assert_eq!(metronome.beat_count(), count);
    }

    #[test]
    fn test_bpm_locked_while_running() {
        let mut metronome = Metronome::new(60);
        metronome.start();
        assert!(!metronome.set_bpm(120));
        assert_eq!(metronome.bpm(), 60);
        metronome.stop();
        assert!(metronome.set_bpm(120));
        assert_eq!(metronome.bpm(), 120);
    }

    #[test]
    fn test_callback_fires() {
        let seen = Arc::new(AtomicU64::new(0));
        let sink = Arc::clone(&seen);
        let mut metronome = Metronome::new(120).with_callback(Arc::new(move |count| {
            sink.store(count, Ordering::Release);
        }));
        metronome.start();
        thread::sleep(Duration::from_millis(60));
        metronome.stop();
        assert_eq!(seen.load(Ordering::Acquire), metronome.beat_count());
    }

    #[test]
    fn test_next_beat_on_schedule() {
        let start = Instant::now();
        let interval = Duration::from_millis(500);
        let woke = start + Duration::from_millis(12);
        assert_eq!(next_beat_after(start, interval, woke), start + interval);
    }

    #[test]
    fn test_next_beat_after_stall_skips_missed_beats() {
        let start = Instant::now();
        let interval = Duration::from_millis(500);
        // Woke 3.2 s late: six beats were missed, only one fires now
        let woke = start + Duration::from_millis(3_200);
        let next = next_beat_after(start, interval, woke);
        assert_eq!(next, woke + interval);
        assert!(next > woke);
    }

    #[test]
    fn test_restart_resets_counter() {
        let mut metronome = Metronome::new(200);
        metronome.start();
        thread::sleep(Duration::from_millis(50));
        metronome.stop();
        assert!(metronome.beat_count() >= 1);

        metronome.start();
        metronome.stop();
        assert!(metronome.beat_count() <= 1);
    }
}
