//! Observation sources feeding the frame driver.

use std::collections::VecDeque;

use crate::observation::FrameObservation;

/// Producer of one observation per driver tick
///
/// Returning `None` ends the stream. A frame without a detected pose is an
/// observation (`FrameObservation::no_pose()`), not the end of the stream.
pub trait ObservationSource {
    fn next_frame(&mut self) -> Option<FrameObservation>;
}

/// Replays a recorded sequence of observations
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    frames: VecDeque<FrameObservation>,
}

impl ReplaySource {
    pub fn new<I>(frames: I) -> Self
    where
        I: IntoIterator<Item = FrameObservation>,
    {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl ObservationSource for ReplaySource {
    fn next_frame(&mut self) -> Option<FrameObservation> {
        self.frames.pop_front()
    }
}

impl<S: ObservationSource + ?Sized> ObservationSource for Box<S> {
    fn next_frame(&mut self) -> Option<FrameObservation> {
        (**self).next_frame()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::Exercise;

    #[test]
    fn test_replay_in_order_then_ends() {
        let mut source = ReplaySource::new([
            FrameObservation::no_pose(),
            FrameObservation::detected(0.9, [(Exercise::Situp, 0.4)]),
        ]);
        assert_eq!(source.remaining(), 2);
        assert_eq!(source.next_frame(), Some(FrameObservation::no_pose()));
        assert!(source.next_frame().unwrap().has_pose());
        assert_eq!(source.next_frame(), None);
    }
}
