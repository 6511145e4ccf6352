//! 状态转换：原始关节读数 → 规范状态
//!
//! 纯函数，无隐藏状态。同样的输入总是得到逐位相同的输出。

use crate::config::CompensationOffsets;
use crate::error::HalError;
use crate::state::{CanonicalState, RawJointReading};
use crate::units::{Deg, Rad, round_state, wrap_to_pi};
use std::f64::consts::PI;

/// 将原始读数转换为规范状态
///
/// - `bar_angle = wrap_to_pi(bar_position + bar_compensation_angle)`
/// - `bar_angular_velocity = bar_velocity`
/// - `motor_angle = (motor_position + motor_compensation_angle) · 180/π`
///
/// 三个数值均四舍五入到 4 位小数。折叠后接近 -π 的摆杆角可能被舍入为 -3.1416，
/// 此时取 +3.1416，使结果保持在半开区间内。`out_of_range` 保持为 `false`，
/// 由安全监视器设置。
///
/// # 错误
///
/// 任一输入为 NaN/Inf 时返回 [`HalError::NonFinite`]。
pub fn translate(
    raw: &RawJointReading,
    offsets: &CompensationOffsets,
) -> Result<CanonicalState, HalError> {
    ensure_finite("bar_position", raw.bar_position)?;
    ensure_finite("bar_velocity", raw.bar_velocity)?;
    ensure_finite("motor_position", raw.motor_position)?;

    let bar_angle = wrap_to_pi(raw.bar_position + offsets.bar_compensation_angle.0);
    let motor_angle = (raw.motor_position + offsets.motor_compensation_angle.0).to_degrees();

    let mut bar_angle = round_state(bar_angle);
    if bar_angle < -PI {
        bar_angle = -bar_angle;
    }

    Ok(CanonicalState {
        bar_angle: Rad(bar_angle),
        bar_angular_velocity: round_state(raw.bar_velocity),
        motor_angle: Deg(round_state(motor_angle)),
        out_of_range: false,
    })
}

fn ensure_finite(field: &'static str, value: f64) -> Result<(), HalError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(HalError::NonFinite { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offsets() -> CompensationOffsets {
        CompensationOffsets::default()
    }

    #[test]
    fn test_translate_applies_offsets() {
        let raw = RawJointReading {
            bar_position: 0.264,
            bar_velocity: 1.234_567,
            motor_position: -0.4,
        };
        let state = translate(&raw, &offsets()).unwrap();

        assert_eq!(state.bar_angle, Rad(0.0));
        assert_eq!(state.bar_angular_velocity, 1.2346);
        assert_eq!(state.motor_angle, Deg(0.0));
        assert!(!state.out_of_range);
    }

    #[test]
    fn test_translate_motor_degrees() {
        let raw = RawJointReading {
            bar_position: 0.0,
            bar_velocity: 0.0,
            motor_position: PI / 2.0 - 0.4,
        };
        let state = translate(&raw, &offsets()).unwrap();
        assert_eq!(state.motor_angle, Deg(90.0));
    }

    #[test]
    fn test_translate_wraps_bar_angle() {
        // 绕了很多圈的摆杆读数仍映射到 (-π, π]
        let raw = RawJointReading {
            bar_position: 0.264 + 1.0 + 200.0 * std::f64::consts::TAU,
            bar_velocity: 0.0,
            motor_position: 0.0,
        };
        let state = translate(&raw, &offsets()).unwrap();
        assert_eq!(state.bar_angle, Rad(1.0));

        // home 位姿：π + 0.264 - 0.264 = π
        let raw = RawJointReading {
            bar_position: PI + 0.264,
            bar_velocity: 0.0,
            motor_position: -0.4,
        };
        let state = translate(&raw, &offsets()).unwrap();
        assert_eq!(state.bar_angle, Rad(3.1416));
        assert!(state.bar_angle.0 > -PI && state.bar_angle.0 <= PI + 1e-4);
    }

    #[test]
    fn test_translate_rounding_stays_above_minus_pi() {
        // -3.14158 折叠后仍大于 -π，但舍入到 -3.1416 会越过 -π
        let raw = RawJointReading {
            bar_position: -3.14158 + 0.264,
            bar_velocity: 0.0,
            motor_position: 0.0,
        };
        let state = translate(&raw, &offsets()).unwrap();
        assert_eq!(state.bar_angle, Rad(3.1416));

        let raw = RawJointReading {
            bar_position: -3.1415 + 0.264,
            bar_velocity: 0.0,
            motor_position: 0.0,
        };
        let state = translate(&raw, &offsets()).unwrap();
        assert_eq!(state.bar_angle, Rad(-3.1415));
    }

    #[test]
    fn test_translate_is_idempotent() {
        let raw = RawJointReading {
            bar_position: -2.718_281_828,
            bar_velocity: 7.777_777,
            motor_position: 1.414_213_56,
        };
        let a = translate(&raw, &offsets()).unwrap();
        let b = translate(&raw, &offsets()).unwrap();
        assert_eq!(a.bar_angle.0.to_bits(), b.bar_angle.0.to_bits());
        assert_eq!(
            a.bar_angular_velocity.to_bits(),
            b.bar_angular_velocity.to_bits()
        );
        assert_eq!(a.motor_angle.0.to_bits(), b.motor_angle.0.to_bits());
    }

    #[test]
    fn test_translate_rejects_non_finite() {
        let raw = RawJointReading {
            bar_position: f64::NAN,
            ..Default::default()
        };
        match translate(&raw, &offsets()) {
            Err(HalError::NonFinite { field, .. }) => assert_eq!(field, "bar_position"),
            other => panic!("Expected NonFinite, got {:?}", other),
        }

        let raw = RawJointReading {
            motor_position: f64::NEG_INFINITY,
            ..Default::default()
        };
        assert!(matches!(
            translate(&raw, &offsets()),
            Err(HalError::NonFinite {
                field: "motor_position",
                ..
            })
        ));
    }
}
