//! Simulated audio backend
//!
//! Sessions advance a clock on a tokio interval instead of decoding audio.
//! Used by the demo binary and handy for exercising the engine without a
//! sound device. `speed` scales how fast the clock runs relative to wall
//! time (2.0 plays a 30s track in 15s).

use crate::error::{Error, Result};
use crate::playback::session::{
    AudioSession, SessionEvents, SessionFactory, SessionId, SessionRequest,
};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, trace};

#[derive(Debug)]
struct Clock {
    playing: bool,
    position: f64,
    volume: f32,
}

pub struct SimulatedSessionFactory {
    tick: Duration,
    speed: f64,
}

impl SimulatedSessionFactory {
    pub fn new(tick: Duration, speed: f64) -> Self {
        Self { tick, speed }
    }
}

#[async_trait]
impl SessionFactory for SimulatedSessionFactory {
    async fn create(
        &self,
        request: SessionRequest,
        events: SessionEvents,
    ) -> Result<Box<dyn AudioSession>> {
        let duration = request.track.duration_seconds;
        if !duration.is_finite() || duration <= 0.0 {
            return Err(Error::Load(format!(
                "{} has no playable duration",
                request.track.id
            )));
        }

        let clock = Arc::new(Mutex::new(Clock {
            playing: false,
            position: request.start_position.clamp(0.0, duration),
            volume: if request.start_muted { 0.0 } else { 1.0 },
        }));

        let session_id = events.session_id();
        debug!("Simulated {} opened {}", session_id, request.uri);

        let task = tokio::spawn(drive(
            Arc::clone(&clock),
            events,
            duration,
            self.tick,
            self.speed,
        ));

        Ok(Box::new(SimulatedSession {
            session_id,
            clock,
            task,
        }))
    }
}

/// Advance the clock while playing and report position/finish
async fn drive(
    clock: Arc<Mutex<Clock>>,
    events: SessionEvents,
    duration: f64,
    tick: Duration,
    speed: f64,
) {
    let mut timer = interval(tick);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let step = tick.as_secs_f64() * speed;

    loop {
        timer.tick().await;

        let (position, finished) = {
            let Ok(mut clock) = clock.lock() else {
                return;
            };
            if !clock.playing {
                continue;
            }
            clock.position = (clock.position + step).min(duration);
            let finished = clock.position >= duration;
            if finished {
                clock.playing = false;
            }
            trace!(
                "Simulated clock {:.2}/{:.2}s (volume {:.2})",
                clock.position,
                duration,
                clock.volume
            );
            (clock.position, finished)
        };

        events.position(position, duration);
        if finished {
            events.finished();
        }
    }
}

pub struct SimulatedSession {
    session_id: SessionId,
    clock: Arc<Mutex<Clock>>,
    task: JoinHandle<()>,
}

impl SimulatedSession {
    fn with_clock<T>(&self, f: impl FnOnce(&mut Clock) -> T) -> Option<T> {
        self.clock.lock().ok().map(|mut clock| f(&mut clock))
    }
}

impl AudioSession for SimulatedSession {
    fn play(&mut self) -> Result<()> {
        self.with_clock(|c| c.playing = true)
            .ok_or_else(|| Error::Load(format!("{} clock unavailable", self.session_id)))
    }

    fn pause(&mut self) {
        self.with_clock(|c| c.playing = false);
    }

    fn seek_to(&mut self, seconds: f64) {
        self.with_clock(|c| c.position = seconds.max(0.0));
    }

    fn set_volume(&mut self, volume: f32) {
        trace!("{} volume {:.2}", self.session_id, volume);
        self.with_clock(|c| c.volume = volume);
    }

    fn position(&self) -> f64 {
        self.with_clock(|c| c.position).unwrap_or(0.0)
    }

    fn release(self: Box<Self>) {
        debug!("Simulated {} released", self.session_id);
    }
}

impl Drop for SimulatedSession {
    fn drop(&mut self) {
        self.task.abort();
    }
}
