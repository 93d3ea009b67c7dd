//! Fixed actuator indexing and the bus dispatch routing table.
//!
//! Twelve actuators, three per leg, grouped as consecutive triples
//! (abduction, hip, knee). The front bus serves actuators 0–5, the rear bus
//! 6–11; within a bus the first four controllers share one command frame and
//! the last two ride in the other (the transport addresses at most four
//! controllers per frame).

use drive_traits::BusGroup;

pub const NUM_ACTUATORS: usize = 12;
pub const NUM_LEGS: usize = 4;
pub const JOINTS_PER_LEG: usize = 3;
pub const ACTUATORS_PER_BUS: usize = 6;

/// Per-actuator vector of positions, velocities, currents, offsets or signs.
pub type ActuatorVector = [f32; NUM_ACTUATORS];

/// Per-actuator enable flags.
pub type ActuatorMask = [bool; NUM_ACTUATORS];

pub const ZERO_VECTOR: ActuatorVector = [0.0; NUM_ACTUATORS];

/// Joint role within a leg. Actuator index is `3 * leg + joint as usize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Joint {
    Abduction = 0,
    Hip = 1,
    Knee = 2,
}

/// Which physical bus serves an actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusSide {
    Front,
    Rear,
}

/// Where an actuator's command lands: bus, frame group, and slot in frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusRoute {
    pub side: BusSide,
    pub group: BusGroup,
    /// Position of this actuator's setpoint inside the frame (0..4).
    pub slot: usize,
}

/// Dispatch route for actuator `i`. Panics in debug builds on out-of-range
/// indices; callers validate indices at the command surface.
pub fn route(i: usize) -> BusRoute {
    debug_assert!(i < NUM_ACTUATORS);
    let side = if i < ACTUATORS_PER_BUS {
        BusSide::Front
    } else {
        BusSide::Rear
    };
    let local = i % ACTUATORS_PER_BUS;
    let (group, slot) = if local < 4 {
        (BusGroup::LowFour, local)
    } else {
        (BusGroup::HighFour, local - 4)
    };
    BusRoute { side, group, slot }
}

/// Controller slot (0..6) for actuator `i` on its bus.
#[inline]
pub fn bus_slot(i: usize) -> usize {
    i % ACTUATORS_PER_BUS
}

/// Leg (0..4) owning actuator `i`.
#[inline]
pub fn leg_of(i: usize) -> usize {
    i / JOINTS_PER_LEG
}

/// Actuator index for `joint` of `leg`.
#[inline]
pub fn actuator_index(leg: usize, joint: Joint) -> usize {
    leg * JOINTS_PER_LEG + joint as usize
}

/// The four actuator indices filling `joint` across all legs.
pub fn joint_indices(joint: Joint) -> [usize; NUM_LEGS] {
    core::array::from_fn(|leg| actuator_index(leg, joint))
}
