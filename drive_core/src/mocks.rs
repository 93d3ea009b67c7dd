//! Scriptable bus and IMU used by the drive tests.

use std::sync::{Arc, Mutex, PoisonError};

use drive_traits::{ActuatorBus, ActuatorState, BusGroup, Imu, Orientation};

use crate::types::ACTUATORS_PER_BUS;

#[derive(Debug, Default)]
struct Inner {
    states: [ActuatorState; ACTUATORS_PER_BUS],
    frames: Vec<([i32; 4], BusGroup)>,
    polls: usize,
    fail_poll: bool,
}

/// Bus whose cached state is scripted from the outside. Clones share state,
/// so a test can keep a handle and mutate positions between ticks while the
/// drive owns its copy. Every command frame written is recorded.
#[derive(Debug, Clone, Default)]
pub struct MockBus {
    inner: Arc<Mutex<Inner>>,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_position(&self, slot: usize, position: f32) {
        self.lock().states[slot].position = position;
    }

    pub fn set_velocity(&self, slot: usize, velocity: f32) {
        self.lock().states[slot].velocity = velocity;
    }

    pub fn set_current(&self, slot: usize, current: f32) {
        self.lock().states[slot].current = current;
    }

    pub fn set_state(&self, slot: usize, state: ActuatorState) {
        self.lock().states[slot] = state;
    }

    /// Make the next polls fail with a timeout.
    pub fn fail_polls(&self, fail: bool) {
        self.lock().fail_poll = fail;
    }

    pub fn polls(&self) -> usize {
        self.lock().polls
    }

    /// Frames recorded since the last call, oldest first.
    pub fn take_frames(&self) -> Vec<([i32; 4], BusGroup)> {
        core::mem::take(&mut self.lock().frames)
    }
}

impl ActuatorBus for MockBus {
    fn poll(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut inner = self.lock();
        if inner.fail_poll {
            return Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "poll timeout",
            )));
        }
        inner.polls += 1;
        Ok(())
    }

    fn command_torques(
        &mut self,
        milliamps: [i32; 4],
        group: BusGroup,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.lock().frames.push((milliamps, group));
        Ok(())
    }

    fn actuator(&self, slot: usize) -> ActuatorState {
        self.lock().states.get(slot).copied().unwrap_or_default()
    }
}

/// IMU returning a fixed orientation.
#[derive(Debug, Default, Clone)]
pub struct MockImu {
    pub orientation: Orientation,
}

impl Imu for MockImu {
    fn setup(&mut self, _filter_hz: u32) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }

    fn update(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }

    fn orientation(&self) -> Orientation {
        self.orientation
    }
}
