//! 强类型单位系统
//!
//! 使用 NewType 模式区分弧度与角度：后端与复位位姿使用弧度，
//! 电机安全范围与硬件协议使用角度。
//!
//! # 示例
//!
//! ```rust
//! use pendulum_hal::units::{Deg, Rad, wrap_to_pi};
//!
//! let angle = Rad(std::f64::consts::PI).to_deg();
//! assert!((angle.0 - 180.0).abs() < 1e-9);
//!
//! // 任意圈数的角度都会被映射到 (-π, π]
//! let wrapped = wrap_to_pi(7.0 * std::f64::consts::PI);
//! assert!((wrapped - std::f64::consts::PI).abs() < 1e-9);
//! # let _ = Deg(0.0);
//! ```

use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// 状态快照保留的小数位数
pub const STATE_DECIMALS: i32 = 4;

/// 将任意实数角度映射到 (-π, π]
///
/// 先做向下取整的模 2π 运算（结果落在 [0, 2π]），
/// 再对大于 π 的结果减去 2π。
///
/// `rem_euclid` 在输入为极小负数时可能返回恰好 2π，
/// 此时减去 2π 得到 0，仍在区间内。
#[inline]
pub fn wrap_to_pi(angle: f64) -> f64 {
    let reduced = angle.rem_euclid(TAU);
    if reduced > PI {
        reduced - TAU
    } else {
        reduced
    }
}

/// 四舍五入到 `STATE_DECIMALS` 位小数（ties-to-even）
#[inline]
pub fn round_state(value: f64) -> f64 {
    let scale = 10f64.powi(STATE_DECIMALS);
    (value * scale).round_ties_even() / scale
}

/// 弧度（NewType）
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Rad(pub f64);

impl Rad {
    /// 零弧度常量
    pub const ZERO: Self = Rad(0.0);

    /// π 弧度（180度）
    pub const PI: Self = Rad(PI);

    /// 转换为角度
    #[inline]
    pub fn to_deg(self) -> Deg {
        Deg(self.0.to_degrees())
    }

    /// 获取原始值
    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }

    /// 归一化到 (-π, π]
    #[inline]
    pub fn wrap(self) -> Self {
        Rad(wrap_to_pi(self.0))
    }

    /// 是否为有限值
    #[inline]
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }
}

impl fmt::Display for Rad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4} rad", self.0)
    }
}

impl Add for Rad {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Rad(self.0 + rhs.0)
    }
}

impl Sub for Rad {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Rad(self.0 - rhs.0)
    }
}

impl Neg for Rad {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Rad(-self.0)
    }
}

impl Mul<f64> for Rad {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: f64) -> Self {
        Rad(self.0 * rhs)
    }
}

/// 角度（NewType）
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Deg(pub f64);

impl Deg {
    /// 零角度常量
    pub const ZERO: Self = Deg(0.0);

    /// 转换为弧度
    #[inline]
    pub fn to_rad(self) -> Rad {
        Rad(self.0.to_radians())
    }

    /// 获取原始值
    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }

    /// 是否为有限值
    #[inline]
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }
}

impl fmt::Display for Deg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}°", self.0)
    }
}

impl Add for Deg {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Deg(self.0 + rhs.0)
    }
}

impl Sub for Deg {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Deg(self.0 - rhs.0)
    }
}

impl Neg for Deg {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Deg(-self.0)
    }
}
