//! Momentum command aggregator.
//!
//! Collects the whole-body commands contributed by controller sub-modules
//! during one control tick. Ordering within a tick is enforced:
//! `reset()` → `add_*` → `*_commands()` / `finish_tick()`. Lists are fully
//! overwritten every tick, and preserve submission order only.

use heapless::Vec as FixedVec;

use stride_common::consts::{
    MAX_EXTERNAL_WRENCH_COMMANDS, MAX_JOINT_ACCELERATION_COMMANDS, MAX_MOMENTUM_RATE_COMMANDS,
    MAX_POINT_ACCELERATION_COMMANDS, MAX_SPATIAL_ACCELERATION_COMMANDS,
};
use stride_common::walking::command::{
    ExternalWrenchCommand, JointAccelerationCommand, MomentumRateCommand,
    PointAccelerationCommand, SpatialAccelerationCommand,
};
use stride_common::walking::error::{CommandError, CommandKind};

/// Five fixed-capacity command lists for one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MomentumCommandBundle {
    pub momentum_rate: FixedVec<MomentumRateCommand, MAX_MOMENTUM_RATE_COMMANDS>,
    pub joint_acceleration: FixedVec<JointAccelerationCommand, MAX_JOINT_ACCELERATION_COMMANDS>,
    pub spatial_acceleration:
        FixedVec<SpatialAccelerationCommand, MAX_SPATIAL_ACCELERATION_COMMANDS>,
    pub point_acceleration: FixedVec<PointAccelerationCommand, MAX_POINT_ACCELERATION_COMMANDS>,
    pub external_wrench: FixedVec<ExternalWrenchCommand, MAX_EXTERNAL_WRENCH_COMMANDS>,
}

impl MomentumCommandBundle {
    pub fn clear(&mut self) {
        self.momentum_rate.clear();
        self.joint_acceleration.clear();
        self.spatial_acceleration.clear();
        self.point_acceleration.clear();
        self.external_wrench.clear();
    }

    /// Total commands across all lists.
    pub fn len(&self) -> usize {
        self.momentum_rate.len()
            + self.joint_acceleration.len()
            + self.spatial_acceleration.len()
            + self.point_acceleration.len()
            + self.external_wrench.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Per-tick command aggregator, owned by the controller task.
#[derive(Debug, Clone, Default)]
pub struct MomentumCommandAggregator {
    bundle: MomentumCommandBundle,
    tick_open: bool,
    ticks: u64,
}

#[inline]
fn push_copy<T: Copy, const N: usize>(
    list: &mut FixedVec<T, N>,
    command: &T,
    kind: CommandKind,
    tick_open: bool,
) -> Result<(), CommandError> {
    if !tick_open {
        return Err(CommandError::TickNotOpen(kind));
    }
    list.push(*command)
        .map_err(|_| CommandError::ListFull { kind, capacity: N })
}

impl MomentumCommandAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all five lists and open a new tick.
    pub fn reset(&mut self) {
        self.bundle.clear();
        self.tick_open = true;
        self.ticks += 1;
    }

    /// True between `reset()` and `finish_tick()`.
    #[inline]
    pub fn is_tick_open(&self) -> bool {
        self.tick_open
    }

    /// Ticks opened since construction.
    #[inline]
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    pub fn add_momentum_rate(&mut self, command: &MomentumRateCommand) -> Result<(), CommandError> {
        push_copy(
            &mut self.bundle.momentum_rate,
            command,
            CommandKind::MomentumRate,
            self.tick_open,
        )
    }

    pub fn add_joint_acceleration(
        &mut self,
        command: &JointAccelerationCommand,
    ) -> Result<(), CommandError> {
        push_copy(
            &mut self.bundle.joint_acceleration,
            command,
            CommandKind::JointAcceleration,
            self.tick_open,
        )
    }

    pub fn add_spatial_acceleration(
        &mut self,
        command: &SpatialAccelerationCommand,
    ) -> Result<(), CommandError> {
        push_copy(
            &mut self.bundle.spatial_acceleration,
            command,
            CommandKind::SpatialAcceleration,
            self.tick_open,
        )
    }

    pub fn add_point_acceleration(
        &mut self,
        command: &PointAccelerationCommand,
    ) -> Result<(), CommandError> {
        push_copy(
            &mut self.bundle.point_acceleration,
            command,
            CommandKind::PointAcceleration,
            self.tick_open,
        )
    }

    pub fn add_external_wrench(
        &mut self,
        command: &ExternalWrenchCommand,
    ) -> Result<(), CommandError> {
        push_copy(
            &mut self.bundle.external_wrench,
            command,
            CommandKind::ExternalWrench,
            self.tick_open,
        )
    }

    #[inline]
    pub fn momentum_rate_commands(&self) -> &[MomentumRateCommand] {
        &self.bundle.momentum_rate
    }

    #[inline]
    pub fn joint_acceleration_commands(&self) -> &[JointAccelerationCommand] {
        &self.bundle.joint_acceleration
    }

    #[inline]
    pub fn spatial_acceleration_commands(&self) -> &[SpatialAccelerationCommand] {
        &self.bundle.spatial_acceleration
    }

    #[inline]
    pub fn point_acceleration_commands(&self) -> &[PointAccelerationCommand] {
        &self.bundle.point_acceleration
    }

    #[inline]
    pub fn external_wrench_commands(&self) -> &[ExternalWrenchCommand] {
        &self.bundle.external_wrench
    }

    /// Read view of the whole bundle.
    #[inline]
    pub fn bundle(&self) -> &MomentumCommandBundle {
        &self.bundle
    }

    /// Close the tick and hand out the bundle. Further `add_*` calls fail
    /// with `TickNotOpen` until the next `reset()`.
    pub fn finish_tick(&mut self) -> &MomentumCommandBundle {
        self.tick_open = false;
        &self.bundle
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
