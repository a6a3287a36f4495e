//! 帧计时器
//!
//! 每次 `tick` 返回距上一帧的时间间隔，并限制单帧最大步长，
//! 避免窗口拖动或断点暂停后动画一次跳得太远。

use std::time::{Duration, Instant};

/// 单帧允许的最大时间步长（秒）
pub const MAX_FRAME_DELTA: f32 = 0.25;

/// 帧计时器
#[derive(Debug)]
pub struct FrameClock {
    last: Option<Instant>,
    total: Duration,
    frames: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last: None,
            total: Duration::ZERO,
            frames: 0,
        }
    }

    /// 推进一帧，返回限制后的间隔（秒）。第一帧返回 0。
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    /// 以给定时间点推进一帧
    pub fn tick_at(&mut self, now: Instant) -> f32 {
        let delta = match self.last {
            Some(last) => now.saturating_duration_since(last),
            None => Duration::ZERO,
        };
        self.last = Some(now);
        self.total += delta;
        self.frames += 1;

        delta.as_secs_f32().min(MAX_FRAME_DELTA)
    }

    /// 已经推进的帧数
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// 累计经过的真实时间
    pub fn total(&self) -> Duration {
        self.total
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_tick_is_zero() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.tick_at(Instant::now()), 0.0);
        assert_eq!(clock.frames(), 1);
    }

    #[test]
    fn test_delta_is_clamped() {
        let mut clock = FrameClock::new();
        let start = Instant::now();
        clock.tick_at(start);

        let dt = clock.tick_at(start + Duration::from_millis(16));
        assert!((dt - 0.016).abs() < 1e-4);

        let dt = clock.tick_at(start + Duration::from_secs(5));
        assert_eq!(dt, MAX_FRAME_DELTA);
        assert_eq!(clock.frames(), 3);
        assert_eq!(clock.total(), Duration::from_secs(5));
    }
}
