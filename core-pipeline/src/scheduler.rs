use crate::rational::Rational;

use std::time::{Duration, Instant};

/// Computes render times that hold frames to an average output rate.
///
/// `timebase` is the output frame period in seconds. The first arrival
/// becomes the epoch; frame `n` renders at `epoch + timebase * n` no matter
/// when it actually arrives.
// TODO: bursty or late producers are not compensated; a frame that arrives
// after its slot renders immediately and the schedule never re-anchors.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    timebase: Rational,
    epoch: Option<Instant>,
    frame_number: i64,
}

impl FrameScheduler {
    pub fn new(timebase: Rational) -> Self {
        Self {
            timebase,
            epoch: None,
            frame_number: 0,
        }
    }

    /// Render time for the next frame, which arrived at `arrival`.
    pub fn schedule(&mut self, arrival: Instant) -> Instant {
        let epoch = *self.epoch.get_or_insert(arrival);
        let offset = Duration::from_secs_f64((self.timebase * self.frame_number).to_f64());
        self.frame_number += 1;
        epoch + offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offsets(scheduler: &mut FrameScheduler, base: Instant, arrivals: &[u64]) -> Vec<u64> {
        arrivals
            .iter()
            .map(|&ms| {
                let render = scheduler.schedule(base + Duration::from_millis(ms));
                render.duration_since(base).as_millis() as u64
            })
            .collect()
    }

    #[test]
    fn test_frames_evenly_spaced() {
        let mut scheduler = FrameScheduler::new(Rational::new(1, 4));
        let base = Instant::now();
        assert_eq!(
            offsets(&mut scheduler, base, &[0, 0, 0, 0, 0]),
            vec![0, 250, 500, 750, 1000]
        );
    }

    #[test]
    fn test_frames_offset_by_first_arrival() {
        let mut scheduler = FrameScheduler::new(Rational::new(1, 4));
        let base = Instant::now();
        assert_eq!(
            offsets(&mut scheduler, base, &[3, 3, 3, 3, 3]),
            vec![3, 253, 503, 753, 1003]
        );
    }

    #[test]
    fn test_later_arrivals_do_not_shift_schedule() {
        let mut scheduler = FrameScheduler::new(Rational::new(1, 8));
        let base = Instant::now();
        assert_eq!(
            offsets(&mut scheduler, base, &[0, 40, 90, 500]),
            vec![0, 125, 250, 375]
        );
    }
}
