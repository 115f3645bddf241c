//! Estimator task: authoritative for the timestamp and the sensor blocks.

use stride_common::walking::context::RealTimeContextData;

use super::sensors::SensorSource;
use crate::context::{
    ContextFreshness, ContextPublisher, ContextSubscriber, RealTimeContext, TaskRole,
};
use crate::cycle::PeriodicTask;
use crate::error::ControlError;

pub struct EstimatorTask<S: SensorSource> {
    context: RealTimeContext,
    estimates: ContextPublisher<RealTimeContextData>,
    controls: ContextSubscriber<RealTimeContextData>,
    sensors: S,
    last_control: ContextFreshness,
}

impl<S: SensorSource> EstimatorTask<S> {
    pub fn new(
        initial: RealTimeContextData,
        estimates: ContextPublisher<RealTimeContextData>,
        controls: ContextSubscriber<RealTimeContextData>,
        sensors: S,
    ) -> Self {
        Self {
            context: RealTimeContext::new(TaskRole::Estimator, initial),
            estimates,
            controls,
            sensors,
            last_control: ContextFreshness::NoData,
        }
    }

    /// One estimator cycle. Returns the sequence number of the published
    /// estimate.
    ///
    /// Never waits on the controller: the latest controller output, fresh
    /// or not, is folded in and the new estimate is published regardless.
    pub fn step(&mut self, timestamp_ns: i64) -> Result<u64, ControlError> {
        self.context.begin_estimate(timestamp_ns)?;
        self.last_control = self.context.ingest_control(&mut self.controls);

        let time_s = self.context.data().time_s();
        self.sensors.sample(time_s, self.context.data_mut());

        Ok(self.context.publish_estimate(&mut self.estimates)?)
    }

    #[inline]
    pub fn context(&self) -> &RealTimeContext {
        &self.context
    }

    /// Freshness of the controller output seen by the last cycle.
    #[inline]
    pub fn last_control(&self) -> ContextFreshness {
        self.last_control
    }

    #[inline]
    pub fn sensors(&self) -> &S {
        &self.sensors
    }
}

impl<S: SensorSource> PeriodicTask for EstimatorTask<S> {
    fn name(&self) -> &'static str {
        "estimator"
    }

    fn tick(&mut self, timestamp_ns: i64) -> Result<(), ControlError> {
        self.step(timestamp_ns).map(|_| ())
    }
}
