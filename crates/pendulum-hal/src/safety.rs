//! 安全监视器
//!
//! [`check`] 是纯函数：单个采样越界即判定故障。
//! [`SafetyMonitor`] 在其上增加可配置的去抖（连续 N 个越界采样才判定故障），
//! 默认 N = 1，与纯函数行为一致。

use crate::config::SafetyBounds;
use crate::state::CanonicalState;

/// 判断电机角度是否越界
///
/// 闭区间：恰好等于边界值不算越界。
#[inline]
pub fn check(state: &CanonicalState, bounds: &SafetyBounds) -> bool {
    state.motor_angle < bounds.min() || state.motor_angle > bounds.max()
}

/// 带去抖的安全监视器
#[derive(Debug, Clone)]
pub struct SafetyMonitor {
    bounds: SafetyBounds,
    consecutive_violations: u32,
}

impl SafetyMonitor {
    /// 创建安全监视器
    pub fn new(bounds: SafetyBounds) -> Self {
        Self {
            bounds,
            consecutive_violations: 0,
        }
    }

    /// 安全范围
    pub fn bounds(&self) -> &SafetyBounds {
        &self.bounds
    }

    /// 当前连续越界次数
    pub fn consecutive_violations(&self) -> u32 {
        self.consecutive_violations
    }

    /// 评估一个采样，返回设置了 `out_of_range` 的状态
    ///
    /// `out_of_range` 仅在连续越界次数达到 `debounce_samples` 时为 `true`。
    pub fn evaluate(&mut self, state: CanonicalState) -> CanonicalState {
        if check(&state, &self.bounds) {
            self.consecutive_violations = self.consecutive_violations.saturating_add(1);
        } else {
            self.consecutive_violations = 0;
        }

        let fault = self.consecutive_violations >= self.bounds.debounce_samples;
        state.with_out_of_range(fault)
    }

    /// 清除去抖计数（复位后调用）
    pub fn clear(&mut self) {
        self.consecutive_violations = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{Deg, Rad};

    fn state(motor_deg: f64) -> CanonicalState {
        CanonicalState {
            bar_angle: Rad(0.0),
            bar_angular_velocity: 0.0,
            motor_angle: Deg(motor_deg),
            out_of_range: false,
        }
    }

    #[test]
    fn test_check_closed_interval() {
        let bounds = SafetyBounds::default();

        assert!(!check(&state(150.0), &bounds));
        assert!(!check(&state(-150.0), &bounds));
        assert!(!check(&state(0.0), &bounds));

        assert!(check(&state(151.0), &bounds));
        assert!(check(&state(-150.0001), &bounds));
        assert!(check(&state(150.0001), &bounds));
    }

    #[test]
    fn test_check_uses_rounded_motor_angle() {
        use crate::config::CompensationOffsets;
        use crate::state::RawJointReading;
        use crate::translator::translate;

        // 150.00004° 舍入为 150.0，不算越界
        let raw = RawJointReading {
            bar_position: 0.0,
            bar_velocity: 0.0,
            motor_position: Deg(150.00004).to_rad().0 - 0.4,
        };
        let translated = translate(&raw, &CompensationOffsets::default()).unwrap();
        assert_eq!(translated.motor_angle, Deg(150.0));
        assert!(!check(&translated, &SafetyBounds::default()));
    }

    #[test]
    fn test_monitor_single_sample_default() {
        let mut monitor = SafetyMonitor::new(SafetyBounds::default());
        assert!(!monitor.evaluate(state(10.0)).out_of_range);
        assert!(monitor.evaluate(state(151.0)).out_of_range);
    }

    #[test]
    fn test_monitor_debounce() {
        let bounds = SafetyBounds {
            debounce_samples: 3,
            ..Default::default()
        };
        let mut monitor = SafetyMonitor::new(bounds);

        assert!(!monitor.evaluate(state(160.0)).out_of_range);
        assert!(!monitor.evaluate(state(160.0)).out_of_range);
        // 中间出现一次正常采样，计数清零
        assert!(!monitor.evaluate(state(100.0)).out_of_range);
        assert_eq!(monitor.consecutive_violations(), 0);

        assert!(!monitor.evaluate(state(-160.0)).out_of_range);
        assert!(!monitor.evaluate(state(-160.0)).out_of_range);
        assert!(monitor.evaluate(state(-160.0)).out_of_range);
        assert_eq!(monitor.consecutive_violations(), 3);

        monitor.clear();
        assert_eq!(monitor.consecutive_violations(), 0);
    }
}
