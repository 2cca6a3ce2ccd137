//! Flip timelines. A flip rotates a spread half a turn about its binding axis
//! while lifting it in depth so it clears the neighbouring sheets, then drops
//! it on the opposite side of the stack.

use std::f32::consts::PI;

use serde::Serialize;

/// Fractions of the period at which the depth lift peaks and releases.
const LIFT_START: f32 = 0.1;
const LIFT_END: f32 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlipDirection {
    /// Turns a sheet back onto the right-hand stack (towards page 0).
    Leftward,
    /// Turns a sheet over onto the left-hand stack.
    Rightward,
}

/// Pose of a spread: rotation about the binding (y) axis and translation along
/// the stacking (z) axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SpreadTransform {
    pub rotation_y: f32,
    pub depth: f32,
}

impl SpreadTransform {
    /// Unturned sheet on the right-hand stack.
    pub fn resting(resting_depth: f32) -> Self {
        Self {
            rotation_y: 0.0,
            depth: resting_depth,
        }
    }

    /// Sheet that has been turned onto the left-hand stack.
    pub fn turned(resting_depth: f32) -> Self {
        Self {
            rotation_y: -PI,
            depth: -resting_depth,
        }
    }
}

/// Eased half-turn. Samples are taken over normalised progress in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationCurve {
    from: f32,
    to: f32,
}

impl RotationCurve {
    pub fn for_direction(direction: FlipDirection) -> Self {
        match direction {
            FlipDirection::Rightward => Self { from: 0.0, to: -PI },
            FlipDirection::Leftward => Self { from: -PI, to: 0.0 },
        }
    }

    pub fn sample(&self, progress: f32) -> f32 {
        if progress <= 0.0 {
            return self.from;
        }
        if progress >= 1.0 {
            return self.to;
        }
        self.from + (self.to - self.from) * smoothstep(progress)
    }
}

/// Four-keyframe linear depth track: rest, lift, hold, land on the other side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthCurve {
    times: [f32; 4],
    values: [f32; 4],
}

impl DepthCurve {
    pub fn new(direction: FlipDirection, resting_depth: f32, period: f32) -> Self {
        let peak = resting_depth.abs().max(-resting_depth);
        let (start, end) = match direction {
            FlipDirection::Rightward => (resting_depth, -resting_depth),
            FlipDirection::Leftward => (-resting_depth, resting_depth),
        };
        Self {
            times: [0.0, period * LIFT_START, period * LIFT_END, period],
            values: [start, peak, peak, end],
        }
    }

    pub fn keyframes(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.times.iter().copied().zip(self.values.iter().copied())
    }

    pub fn peak(&self) -> f32 {
        self.values[1]
    }

    pub fn sample(&self, time: f32) -> f32 {
        if time <= self.times[0] {
            return self.values[0];
        }
        let last = self.times.len() - 1;
        if time >= self.times[last] {
            return self.values[last];
        }
        for idx in 0..last {
            let (t0, t1) = (self.times[idx], self.times[idx + 1]);
            if time < t1 {
                let local = (time - t0) / (t1 - t0);
                return self.values[idx] + (self.values[idx + 1] - self.values[idx]) * local;
            }
        }
        self.values[last]
    }
}

/// A single in-flight flip.
#[derive(Debug, Clone, PartialEq)]
pub struct FlipTimeline {
    direction: FlipDirection,
    elapsed: f32,
    period: f32,
    rotation: RotationCurve,
    depth: DepthCurve,
}

impl FlipTimeline {
    pub fn new(direction: FlipDirection, period: f32, resting_depth: f32) -> Self {
        Self {
            direction,
            elapsed: 0.0,
            period,
            rotation: RotationCurve::for_direction(direction),
            depth: DepthCurve::new(direction, resting_depth, period),
        }
    }

    pub fn direction(&self) -> FlipDirection {
        self.direction
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn period(&self) -> f32 {
        self.period
    }

    pub fn depth_curve(&self) -> &DepthCurve {
        &self.depth
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.period
    }

    /// Moves the playhead forward, never past the period.
    pub fn advance(&mut self, dt: f32) -> SpreadTransform {
        if dt.is_finite() && dt > 0.0 {
            self.elapsed = (self.elapsed + dt).min(self.period);
        }
        self.sample()
    }

    pub fn sample(&self) -> SpreadTransform {
        self.sample_at(self.elapsed)
    }

    pub fn sample_at(&self, elapsed: f32) -> SpreadTransform {
        let elapsed = elapsed.clamp(0.0, self.period);
        SpreadTransform {
            rotation_y: self.rotation.sample(elapsed / self.period),
            depth: self.depth.sample(elapsed),
        }
    }
}

/// Per-spread flip driver. Holds at most one timeline; starting a flip while
/// another is running replaces it.
#[derive(Debug, Clone, Default)]
pub struct FlipAnimator {
    timeline: Option<FlipTimeline>,
    flips_started: u64,
}

impl FlipAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a flip and returns the pose at `elapsed == 0`.
    pub fn start(
        &mut self,
        direction: FlipDirection,
        period: f32,
        resting_depth: f32,
    ) -> SpreadTransform {
        if let Some(previous) = self.timeline.as_ref() {
            log::debug!(
                "cancelling {:?} flip at {:.3}s/{:.3}s",
                previous.direction(),
                previous.elapsed(),
                previous.period()
            );
        }
        let timeline = FlipTimeline::new(direction, period, resting_depth);
        let pose = timeline.sample();
        self.timeline = Some(timeline);
        self.flips_started += 1;
        pose
    }

    /// Advances the active timeline. Returns the new pose, or `None` when idle.
    /// A timeline that reaches its period yields its terminal pose once and is
    /// then discarded.
    pub fn advance(&mut self, dt: f32) -> Option<SpreadTransform> {
        let timeline = self.timeline.as_mut()?;
        let pose = timeline.advance(dt);
        if timeline.is_finished() {
            log::debug!("{:?} flip settled", timeline.direction());
            self.timeline = None;
        }
        Some(pose)
    }

    pub fn is_animating(&self) -> bool {
        self.timeline.is_some()
    }

    pub fn timeline(&self) -> Option<&FlipTimeline> {
        self.timeline.as_ref()
    }

    pub fn flips_started(&self) -> u64 {
        self.flips_started
    }
}

fn smoothstep(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}
