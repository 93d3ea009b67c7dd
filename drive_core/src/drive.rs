//! The control-mode state machine, command surface, and bus dispatch.
//!
//! One `tick()` runs: bus polling, the fault scan, exactly one mode handler,
//! and the command write. Nothing in the tick path blocks or allocates.
//! Limit faults latch the Error mode and the tick still completes with a
//! zero command; only transport failures propagate as `Err`.
//!
//! Single-writer discipline: the embedding application must not call command
//! setters concurrently with a tick. The drive itself takes no locks.

use std::sync::Arc;

use drive_traits::clock::{Clock, MonotonicClock};
use drive_traits::{ActuatorBus, ActuatorState, BusGroup, Imu, Orientation};
use eyre::WrapErr;
use nalgebra::{Matrix3, Vector3};

use crate::config::DriveParams;
use crate::control::{self, CartesianGains, JointGains};
use crate::error::{BuildError, DriveError, Result};
use crate::homing::Transition;
use crate::hw_error::map_bus_error;
use crate::kinematics::{forward_kinematics, hip_position, leg_jacobian};
use crate::safety::{self, FaultLimits};
use crate::transform::FrameTransform;
use crate::types::{
    ACTUATORS_PER_BUS, ActuatorMask, ActuatorVector, BusSide, NUM_ACTUATORS, NUM_LEGS,
    ZERO_VECTOR, route,
};
use crate::util::amps_to_milliamps;

/// Active control mode; exactly one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    Idle,
    Homing,
    PositionControl,
    CartesianPositionControl,
    CurrentControl,
    Error,
}

/// The leg-actuation drive: two six-controller buses, an IMU, and the
/// control-mode state machine over them.
pub struct Drive<B: ActuatorBus, I: Imu> {
    front: B,
    rear: B,
    imu: I,
    clock: Arc<dyn Clock + Send + Sync>,

    mode: ControlMode,
    transform: FrameTransform,
    joint_gains: JointGains,
    cartesian_gains: CartesianGains,
    fault_limits: FaultLimits,
    max_current: f32,

    position_reference: ActuatorVector,
    velocity_reference: ActuatorVector,
    current_reference: ActuatorVector,
    cartesian_position_reference: ActuatorVector,
    cartesian_velocity_reference: ActuatorVector,
    feed_forward_force: ActuatorVector,
    active_mask: ActuatorMask,

    homing: crate::homing::HomingParams,
    homed: [bool; NUM_ACTUATORS],
    /// Hand-off session; `Some` only while interpolating after homing.
    transition: Option<Transition>,

    geometry: crate::kinematics::LegGeometry,
    layout: crate::kinematics::HipLayout,
    knee_soft_limit: f32,

    last_commanded: ActuatorVector,
    last_fault: Option<DriveError>,
}

impl<B: ActuatorBus, I: Imu> core::fmt::Debug for Drive<B, I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Drive")
            .field("mode", &self.mode)
            .field("max_current", &self.max_current)
            .field("homed", &self.homed)
            .field("in_transition", &self.transition.is_some())
            .finish()
    }
}

impl<B: ActuatorBus, I: Imu> Drive<B, I> {
    pub fn builder() -> DriveBuilder<B, I> {
        DriveBuilder::default()
    }

    // ── Tick ─────────────────────────────────────────────────────────────────

    /// Run one control tick: poll both buses, scan for faults, execute the
    /// active mode's handler, and dispatch the resulting command.
    pub fn tick(&mut self) -> Result<ControlMode> {
        self.front
            .poll()
            .map_err(|e| eyre::Report::new(map_bus_error(&*e)))
            .wrap_err("polling front bus")?;
        self.rear
            .poll()
            .map_err(|e| eyre::Report::new(map_bus_error(&*e)))
            .wrap_err("polling rear bus")?;

        if let Some(fault) =
            safety::scan(&self.positions(), &self.velocities(), &self.fault_limits)
        {
            self.latch_fault(fault);
        }

        match self.mode {
            ControlMode::Idle | ControlMode::Error => self.command_currents(ZERO_VECTOR)?,
            ControlMode::Homing => self.homing_tick()?,
            ControlMode::PositionControl => self.position_tick()?,
            ControlMode::CartesianPositionControl => {
                let torques = self.cartesian_torques();
                self.command_currents(torques)?;
            }
            ControlMode::CurrentControl => self.command_currents(self.current_reference)?,
        }
        Ok(self.mode)
    }

    /// Homing handler. On success this proceeds directly into the position
    /// handler so homing completion and the first position-control command
    /// land in the same tick.
    fn homing_tick(&mut self) -> Result<()> {
        let start = self.raw_positions();
        for i in 0..NUM_ACTUATORS {
            if start[i].abs() > self.homing.start_tolerance {
                self.latch_fault(DriveError::HomingStart {
                    actuator: i,
                    position: start[i],
                });
                return Ok(());
            }
        }

        for i in 0..NUM_ACTUATORS {
            let zero = start[i]
                - self.homing.zero_targets[i]
                    * self.transform.direction(i)
                    * self.homing.directions[i];
            self.transform.set_zero_position(i, zero);
            self.homed[i] = true;
        }

        let reference: ActuatorVector = core::array::from_fn(|i| {
            (self.homing.stance_targets[i] * self.homing.directions[i])
                .clamp(-core::f32::consts::PI, core::f32::consts::PI)
        });
        self.position_reference = reference;
        self.transition = Some(Transition::begin(
            self.clock.now(),
            self.homing.transition,
            self.positions(),
            reference,
        ));
        tracing::info!("homing complete");
        self.mode = ControlMode::PositionControl;
        self.position_tick()
    }

    /// Joint-space position handler. While a hand-off session is live the
    /// reference is the session's interpolation toward the target it
    /// captured; afterwards it is the externally set reference.
    fn position_tick(&mut self) -> Result<()> {
        let (reference, transition_done) = match &self.transition {
            Some(t) => t.reference_at(self.clock.now()),
            None => (self.position_reference, false),
        };
        if transition_done {
            self.transition = None;
        }

        let mut command = ZERO_VECTOR;
        for i in 0..NUM_ACTUATORS {
            command[i] = control::joint_pd(
                self.joint_gains,
                self.position(i),
                self.velocity(i),
                reference[i],
                self.velocity_reference[i],
            );
        }
        self.command_currents(command)
    }

    /// Cartesian handler: per leg, a tip-space PD force plus feed-forward,
    /// mapped to joint torques through the Jacobian transpose, saturated to
    /// preserve the force direction, then topped with the knee soft limit.
    fn cartesian_torques(&self) -> ActuatorVector {
        let mut torques = ZERO_VECTOR;
        for leg in 0..NUM_LEGS {
            let angles = self.leg_joint_angles(leg);
            let rates = self.leg_joint_velocities(leg);
            let jacobian = leg_jacobian(angles, &self.geometry, leg);

            let measured = forward_kinematics(angles, &self.geometry, leg);
            let measured_velocity = jacobian * rates;
            let reference =
                self.leg_vector(&self.cartesian_position_reference, leg)
                    - hip_position(&self.layout, leg);
            let reference_velocity = self.leg_vector(&self.cartesian_velocity_reference, leg);

            let force = control::cartesian_pd(
                &self.cartesian_gains,
                &measured,
                &measured_velocity,
                &reference,
                &reference_velocity,
            ) + self.leg_vector(&self.feed_forward_force, leg);

            let knee_torque =
                control::knee_limit_torque(self.joint_gains.kp, self.knee_soft_limit, angles.z);

            let joint_torques =
                control::saturate(jacobian.transpose() * force, self.max_current);

            torques[3 * leg] = joint_torques.x;
            torques[3 * leg + 1] = joint_torques.y;
            torques[3 * leg + 2] = joint_torques.z + knee_torque;
        }
        torques
    }

    /// Clamp, fault-check, mask, and dispatch one command vector.
    ///
    /// The fault check runs on the clamped command, so with the fault limit
    /// above the command ceiling it can only trip when the ceiling itself is
    /// raised past it.
    fn command_currents(&mut self, requested: ActuatorVector) -> Result<()> {
        let mut command = safety::clamp_currents(&requested, self.max_current);
        if let Some(fault) = safety::current_fault(&command, self.fault_limits.current) {
            self.latch_fault(fault);
            return Ok(());
        }
        safety::apply_mask(&mut command, &self.active_mask);
        self.last_commanded = command;

        // Hardware polarity, then the bus's milliamp fixed point.
        let milliamps: [i32; NUM_ACTUATORS] = core::array::from_fn(|i| {
            amps_to_milliamps(self.transform.to_raw_current(i, command[i]))
        });

        // Assemble the four frames from the routing table: two buses, each
        // split into a full frame and a half-empty one.
        let mut frames = [[0i32; 4]; 4];
        for (i, &ma) in milliamps.iter().enumerate() {
            let r = route(i);
            let frame = match (r.side, r.group) {
                (BusSide::Front, BusGroup::LowFour) => 0,
                (BusSide::Front, BusGroup::HighFour) => 1,
                (BusSide::Rear, BusGroup::LowFour) => 2,
                (BusSide::Rear, BusGroup::HighFour) => 3,
            };
            frames[frame][r.slot] = ma;
        }
        self.front
            .command_torques(frames[0], BusGroup::LowFour)
            .map_err(|e| eyre::Report::new(map_bus_error(&*e)))
            .wrap_err("commanding front bus")?;
        self.front
            .command_torques(frames[1], BusGroup::HighFour)
            .map_err(|e| eyre::Report::new(map_bus_error(&*e)))
            .wrap_err("commanding front bus")?;
        self.rear
            .command_torques(frames[2], BusGroup::LowFour)
            .map_err(|e| eyre::Report::new(map_bus_error(&*e)))
            .wrap_err("commanding rear bus")?;
        self.rear
            .command_torques(frames[3], BusGroup::HighFour)
            .map_err(|e| eyre::Report::new(map_bus_error(&*e)))
            .wrap_err("commanding rear bus")?;
        Ok(())
    }

    /// Record a fault and force the Error mode. Error is sticky: it persists
    /// until `set_idle` is called.
    fn latch_fault(&mut self, fault: DriveError) {
        tracing::error!(fault = %fault, "drive fault");
        self.last_fault = Some(fault);
        self.mode = ControlMode::Error;
    }

    /// Mode changes requested by the command surface. Error only ever exits
    /// through `set_idle`.
    fn request_mode(&mut self, mode: ControlMode) {
        if self.mode == ControlMode::Error {
            tracing::warn!(requested = ?mode, "mode change ignored while faulted");
            return;
        }
        self.mode = mode;
    }

    // ── Command surface ──────────────────────────────────────────────────────

    /// Return to Idle. This is the only exit from Error.
    pub fn set_idle(&mut self) {
        self.mode = ControlMode::Idle;
    }

    /// Start the homing sequence: clear homed flags, activate every
    /// actuator, and raise the current ceiling to the homing limit.
    pub fn execute_homing(&mut self) {
        if self.mode == ControlMode::Error {
            tracing::warn!("homing ignored while faulted");
            return;
        }
        self.homed = [false; NUM_ACTUATORS];
        self.active_mask = [true; NUM_ACTUATORS];
        self.max_current = self.homing.current_limit;
        self.mode = ControlMode::Homing;
    }

    /// Replace the joint position reference and enter position control. Does
    /// not restart a live homing hand-off.
    pub fn set_joint_positions(&mut self, positions: ActuatorVector) {
        self.position_reference = positions;
        self.request_mode(ControlMode::PositionControl);
    }

    pub fn set_joint_velocities(&mut self, velocities: ActuatorVector) {
        self.velocity_reference = velocities;
    }

    /// Replace the cartesian position reference (body frame, 3 per leg) and
    /// enter cartesian control.
    pub fn set_cartesian_positions(&mut self, positions: ActuatorVector) {
        self.cartesian_position_reference = positions;
        self.request_mode(ControlMode::CartesianPositionControl);
    }

    pub fn set_cartesian_velocities(&mut self, velocities: ActuatorVector) {
        self.cartesian_velocity_reference = velocities;
        self.request_mode(ControlMode::CartesianPositionControl);
    }

    /// Set one actuator's current reference and enter current control.
    pub fn set_current(&mut self, i: usize, current: f32) {
        if i >= NUM_ACTUATORS {
            self.latch_fault(DriveError::InvalidActuator(i));
            return;
        }
        self.current_reference[i] = current;
        self.request_mode(ControlMode::CurrentControl);
    }

    pub fn set_position_gains(&mut self, kp: f32, kd: f32) {
        self.joint_gains = JointGains { kp, kd };
    }

    pub fn set_cartesian_gains(&mut self, kp: Matrix3<f32>, kd: Matrix3<f32>) {
        self.cartesian_gains = CartesianGains { kp, kd };
    }

    pub fn set_feed_forward_force(&mut self, force: ActuatorVector) {
        self.feed_forward_force = force;
    }

    pub fn set_fault_current(&mut self, limit: f32) {
        self.fault_limits.current = limit;
    }

    pub fn set_fault_velocity(&mut self, limit: f32) {
        self.fault_limits.velocity = limit;
    }

    pub fn set_max_current(&mut self, max: f32) {
        self.max_current = max;
    }

    pub fn set_activations(&mut self, mask: ActuatorMask) {
        self.active_mask = mask;
    }

    /// Define "here" as zero for every actuator.
    pub fn zero_current_position(&mut self) {
        let raw = self.raw_positions();
        self.transform.set_zero_positions(raw);
    }

    pub fn set_zero_positions(&mut self, zero: ActuatorVector) {
        self.transform.set_zero_positions(zero);
    }

    // ── IMU ──────────────────────────────────────────────────────────────────

    pub fn setup_imu(&mut self, filter_hz: u32) -> Result<()> {
        self.imu
            .setup(filter_hz)
            .map_err(|e| eyre::Report::new(map_bus_error(&*e)))
            .wrap_err("imu setup")
    }

    pub fn update_imu(&mut self) -> Result<()> {
        self.imu
            .update()
            .map_err(|e| eyre::Report::new(map_bus_error(&*e)))
            .wrap_err("imu update")
    }

    pub fn orientation(&self) -> Orientation {
        self.imu.orientation()
    }

    // ── Telemetry and state queries ──────────────────────────────────────────

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    pub fn last_fault(&self) -> Option<&DriveError> {
        self.last_fault.as_ref()
    }

    /// Cached controller state for actuator `i`.
    pub fn actuator_state(&self, i: usize) -> core::result::Result<ActuatorState, DriveError> {
        if i >= NUM_ACTUATORS {
            return Err(DriveError::InvalidActuator(i));
        }
        Ok(self.bus_state(i))
    }

    /// Physical joint angle of actuator `i` (valid index required).
    pub fn position(&self, i: usize) -> f32 {
        self.transform.position(i, self.bus_state(i).position)
    }

    pub fn velocity(&self, i: usize) -> f32 {
        self.transform.velocity(i, self.bus_state(i).velocity)
    }

    pub fn current(&self, i: usize) -> f32 {
        self.transform.current(i, self.bus_state(i).current)
    }

    pub fn positions(&self) -> ActuatorVector {
        core::array::from_fn(|i| self.position(i))
    }

    pub fn velocities(&self) -> ActuatorVector {
        core::array::from_fn(|i| self.velocity(i))
    }

    pub fn currents(&self) -> ActuatorVector {
        core::array::from_fn(|i| self.current(i))
    }

    pub fn raw_positions(&self) -> ActuatorVector {
        core::array::from_fn(|i| self.bus_state(i).position)
    }

    pub fn position_reference(&self) -> &ActuatorVector {
        &self.position_reference
    }

    pub fn velocity_reference(&self) -> &ActuatorVector {
        &self.velocity_reference
    }

    pub fn current_reference(&self) -> &ActuatorVector {
        &self.current_reference
    }

    pub fn cartesian_position_reference(&self) -> &ActuatorVector {
        &self.cartesian_position_reference
    }

    pub fn last_commanded_current(&self) -> &ActuatorVector {
        &self.last_commanded
    }

    pub fn active_mask(&self) -> &ActuatorMask {
        &self.active_mask
    }

    pub fn homed(&self, i: usize) -> bool {
        self.homed.get(i).copied().unwrap_or(false)
    }

    /// True when every listed actuator has homed.
    pub fn all_homed(&self, indices: &[usize]) -> bool {
        indices.iter().all(|&i| self.homed(i))
    }

    /// True while the homing hand-off is still interpolating.
    pub fn in_transition(&self) -> bool {
        self.transition.is_some()
    }

    pub fn max_current(&self) -> f32 {
        self.max_current
    }

    pub fn total_electrical_power(&self) -> f32 {
        (0..NUM_ACTUATORS)
            .map(|i| self.bus_state(i).electrical_power)
            .sum()
    }

    pub fn total_mechanical_power(&self) -> f32 {
        (0..NUM_ACTUATORS)
            .map(|i| self.bus_state(i).mechanical_power)
            .sum()
    }

    /// Neutral stance tips in the body frame: forward kinematics at zero
    /// joint angles, offset by each hip mount.
    pub fn default_cartesian_positions(&self) -> ActuatorVector {
        default_cartesian_positions(&self.geometry, &self.layout)
    }

    // ── Internal helpers ─────────────────────────────────────────────────────

    fn bus_state(&self, i: usize) -> ActuatorState {
        if i < ACTUATORS_PER_BUS {
            self.front.actuator(i)
        } else {
            self.rear.actuator(i - ACTUATORS_PER_BUS)
        }
    }

    fn leg_joint_angles(&self, leg: usize) -> Vector3<f32> {
        Vector3::new(
            self.position(3 * leg),
            self.position(3 * leg + 1),
            self.position(3 * leg + 2),
        )
    }

    fn leg_joint_velocities(&self, leg: usize) -> Vector3<f32> {
        Vector3::new(
            self.velocity(3 * leg),
            self.velocity(3 * leg + 1),
            self.velocity(3 * leg + 2),
        )
    }

    fn leg_vector(&self, vector: &ActuatorVector, leg: usize) -> Vector3<f32> {
        Vector3::new(
            vector[3 * leg],
            vector[3 * leg + 1],
            vector[3 * leg + 2],
        )
    }
}

fn default_cartesian_positions(
    geometry: &crate::kinematics::LegGeometry,
    layout: &crate::kinematics::HipLayout,
) -> ActuatorVector {
    let mut out = ZERO_VECTOR;
    for leg in 0..NUM_LEGS {
        let tip = forward_kinematics(Vector3::zeros(), geometry, leg) + hip_position(layout, leg);
        out[3 * leg] = tip.x;
        out[3 * leg + 1] = tip.y;
        out[3 * leg + 2] = tip.z;
    }
    out
}

/// Assembles a `Drive` from its two buses, IMU, clock, and parameters.
pub struct DriveBuilder<B: ActuatorBus, I: Imu> {
    front: Option<B>,
    rear: Option<B>,
    imu: Option<I>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    params: DriveParams,
}

impl<B: ActuatorBus, I: Imu> Default for DriveBuilder<B, I> {
    fn default() -> Self {
        Self {
            front: None,
            rear: None,
            imu: None,
            clock: None,
            params: DriveParams::default(),
        }
    }
}

impl<B: ActuatorBus, I: Imu> DriveBuilder<B, I> {
    pub fn with_front_bus(mut self, bus: B) -> Self {
        self.front = Some(bus);
        self
    }

    pub fn with_rear_bus(mut self, bus: B) -> Self {
        self.rear = Some(bus);
        self
    }

    pub fn with_imu(mut self, imu: I) -> Self {
        self.imu = Some(imu);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_params(mut self, params: DriveParams) -> Self {
        self.params = params;
        self
    }

    pub fn build(self) -> Result<Drive<B, I>> {
        let front = self
            .front
            .ok_or_else(|| eyre::Report::new(BuildError::MissingFrontBus))?;
        let rear = self
            .rear
            .ok_or_else(|| eyre::Report::new(BuildError::MissingRearBus))?;
        let imu = self
            .imu
            .ok_or_else(|| eyre::Report::new(BuildError::MissingImu))?;
        let params = self.params;

        let transform = FrameTransform::new(params.directions);
        if !transform.directions_valid() {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "direction multipliers must be +1 or -1",
            )));
        }
        if params
            .homing
            .directions
            .iter()
            .any(|&d| d != 1.0 && d != -1.0)
        {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "homing directions must be +1 or -1",
            )));
        }
        if params.fault_limits.position <= 0.0
            || params.fault_limits.velocity <= 0.0
            || params.fault_limits.current <= 0.0
        {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "fault limits must be positive",
            )));
        }
        if params.max_current < 0.0 || params.homing.current_limit <= 0.0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "current limits must be non-negative",
            )));
        }
        if params.geometry.upper <= 0.0 || params.geometry.lower <= 0.0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "link lengths must be positive",
            )));
        }

        let cartesian_position_reference =
            default_cartesian_positions(&params.geometry, &params.layout);

        Ok(Drive {
            front,
            rear,
            imu,
            clock: self
                .clock
                .unwrap_or_else(|| Arc::new(MonotonicClock::new())),
            mode: ControlMode::Idle,
            transform,
            joint_gains: params.joint_gains,
            cartesian_gains: params.cartesian_gains,
            fault_limits: params.fault_limits,
            max_current: params.max_current,
            position_reference: ZERO_VECTOR,
            velocity_reference: ZERO_VECTOR,
            current_reference: ZERO_VECTOR,
            cartesian_position_reference,
            cartesian_velocity_reference: ZERO_VECTOR,
            feed_forward_force: ZERO_VECTOR,
            active_mask: [false; NUM_ACTUATORS],
            homing: params.homing,
            homed: [false; NUM_ACTUATORS],
            transition: None,
            geometry: params.geometry,
            layout: params.layout,
            knee_soft_limit: params.knee_soft_limit,
            last_commanded: ZERO_VECTOR,
            last_fault: None,
        })
    }
}
