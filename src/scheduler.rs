// Scheduler Module - Frame pacing for the LED animation loop
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::animation::{Animator, LedBuffer};

/// Source of "next frame" signals. Returning false ends the loop.
pub trait FrameScheduler {
    fn next_frame(&mut self) -> bool;
}

/// Paces frames at a fixed rate until the shutdown flag is raised
pub struct FpsScheduler {
    frame_duration: Duration,
    last_frame: Option<Instant>,
    shutdown: Arc<AtomicBool>,
    frame_limit: Option<u64>,
    frames: u64,
}

impl FpsScheduler {
    pub fn new(fps: f64, shutdown: Arc<AtomicBool>) -> Self {
        FpsScheduler {
            frame_duration: Duration::from_secs_f64(1.0 / fps.max(1.0)),
            last_frame: None,
            shutdown,
            frame_limit: None,
            frames: 0,
        }
    }

    /// Stop after `limit` frames; `None` runs until shutdown
    pub fn with_frame_limit(mut self, limit: Option<u64>) -> Self {
        self.frame_limit = limit;
        self
    }

    pub fn set_fps(&mut self, fps: f64) {
        self.frame_duration = Duration::from_secs_f64(1.0 / fps.max(1.0));
    }

    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl FrameScheduler for FpsScheduler {
    fn next_frame(&mut self) -> bool {
        if let Some(limit) = self.frame_limit {
            if self.frames >= limit {
                return false;
            }
        }

        if let Some(last) = self.last_frame {
            let due = last + self.frame_duration;
            // Short sleeps so a shutdown request is noticed quickly
            loop {
                if self.shutdown.load(Ordering::Relaxed) {
                    return false;
                }
                let now = Instant::now();
                if now >= due {
                    break;
                }
                thread::sleep((due - now).min(Duration::from_millis(5)));
            }
        }

        if self.shutdown.load(Ordering::Relaxed) {
            return false;
        }

        self.last_frame = Some(Instant::now());
        self.frames += 1;
        true
    }
}

/// Ticks exactly `n` times without waiting
#[cfg(test)]
pub struct FixedFrames(pub u64);

#[cfg(test)]
impl FrameScheduler for FixedFrames {
    fn next_frame(&mut self) -> bool {
        if self.0 == 0 {
            return false;
        }
        self.0 -= 1;
        true
    }
}

/// Advance the animation once per frame and hand each new buffer to `on_frame`.
/// Returns the number of frames run.
pub fn run_animation_loop<S, F>(
    scheduler: &mut S,
    animator: &mut Animator,
    leds: &mut LedBuffer,
    mut on_frame: F,
) -> u64
where
    S: FrameScheduler + ?Sized,
    F: FnMut(&Animator, &LedBuffer),
{
    let mut frames = 0;
    while scheduler.next_frame() {
        animator.tick(leds);
        on_frame(animator, leds);
        frames += 1;
    }
    frames
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimationState, LedAnimation, CHASE_PERIOD, WATER_NUM_LEDS};

    #[test]
    fn test_fixed_frames() {
        let mut leds = LedBuffer::new(500);
        let mut animator = Animator::new(LedAnimation::WaterFill, vec![0, 250, 499], WATER_NUM_LEDS);
        let mut seen = Vec::new();
        let frames = run_animation_loop(&mut FixedFrames(5), &mut animator, &mut leds, |a, _| {
            seen.push(a.state.cycle);
        });
        assert_eq!(frames, 5);
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_counter_wraps_over_many_frames() {
        let mut leds = LedBuffer::new(500);
        let mut animator = Animator::new(LedAnimation::CoilChase, vec![0, 136, 252, 348, 424, 480], WATER_NUM_LEDS);
        let mut max_counter = 0;
        run_animation_loop(&mut FixedFrames(CHASE_PERIOD as u64 + 3), &mut animator, &mut leds, |a, _| {
            max_counter = max_counter.max(a.state.counter);
        });
        assert_eq!(max_counter, CHASE_PERIOD - 1);
        assert_eq!(animator.state, AnimationState { counter: 3, cycle: 0 });
    }

    #[test]
    fn test_fps_scheduler_frame_limit() {
        let shutdown = Arc::new(AtomicBool::new(false));
        let mut scheduler = FpsScheduler::new(500.0, shutdown).with_frame_limit(Some(3));
        let mut leds = LedBuffer::new(10);
        let mut animator = Animator::new(LedAnimation::WaterFill, Vec::new(), 10);
        let frames = run_animation_loop(&mut scheduler, &mut animator, &mut leds, |_, _| {});
        assert_eq!(frames, 3);
        assert_eq!(scheduler.frames(), 3);
    }

    #[test]
    fn test_fps_scheduler_stops_on_shutdown() {
        let shutdown = Arc::new(AtomicBool::new(false));
        let mut scheduler = FpsScheduler::new(60.0, shutdown.clone());
        assert!(scheduler.next_frame());
        shutdown.store(true, Ordering::Relaxed);
        assert!(!scheduler.next_frame());

        let mut scheduler = FpsScheduler::new(60.0, Arc::new(AtomicBool::new(false)));
        let mut leds = LedBuffer::new(10);
        let mut animator = Animator::new(LedAnimation::WaterFill, Vec::new(), 10);
        let mut count = 0;
        let stop = scheduler.shutdown.clone();
        run_animation_loop(&mut scheduler, &mut animator, &mut leds, |_, _| {
            count += 1;
            if count == 2 {
                stop.store(true, Ordering::Relaxed);
            }
        });
        assert_eq!(count, 2);
    }
}
