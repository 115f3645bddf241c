//! QP command consumers.
//!
//! The QP solver is external; [`QpCommandConsumer`] is where a finished
//! bundle leaves the control core each tick.

use super::aggregator::MomentumCommandBundle;

/// Sink for the per-tick command bundle.
///
/// Called once per tick with a read-only view, after all contributions.
pub trait QpCommandConsumer {
    fn consume(&mut self, tick: u64, bundle: &MomentumCommandBundle);
}

/// Discards bundles, counting them.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullConsumer {
    pub consumed: u64,
    pub last_command_count: usize,
}

impl QpCommandConsumer for NullConsumer {
    #[inline]
    fn consume(&mut self, _tick: u64, bundle: &MomentumCommandBundle) {
        self.consumed += 1;
        self.last_command_count = bundle.len();
    }
}

/// Keeps a copy of every bundle. Allocates; not for the RT loop.
#[derive(Debug, Clone, Default)]
pub struct RecordingConsumer {
    pub bundles: Vec<(u64, MomentumCommandBundle)>,
}

impl RecordingConsumer {
    pub fn last(&self) -> Option<&MomentumCommandBundle> {
        self.bundles.last().map(|(_, b)| b)
    }
}

impl QpCommandConsumer for RecordingConsumer {
    fn consume(&mut self, tick: u64, bundle: &MomentumCommandBundle) {
        self.bundles.push((tick, bundle.clone()));
    }
}

impl<C: QpCommandConsumer + ?Sized> QpCommandConsumer for &mut C {
    #[inline]
    fn consume(&mut self, tick: u64, bundle: &MomentumCommandBundle) {
        (**self).consume(tick, bundle);
    }
}
