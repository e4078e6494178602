use std::fmt;

use serde::Serialize;

/// 達成率 0 側の薄いオレンジ
const LOW: Rgb = Rgb {
    r: 255,
    g: 242,
    b: 204,
};

/// 達成率 1 側の濃いオレンジ
const HIGH: Rgb = Rgb { r: 255, g: 106, b: 0 };

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl fmt::Display for Rgb {
    /// CSS の `rgb(r, g, b)` 形式（描画層へそのまま渡せる）
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// 達成率 [0,1] をオレンジ系グラデーションの 1 色へ写す。
/// 範囲外は端へ飽和させるだけでエラーにしない。チャンネルごとに
/// 線形補間して独立に四捨五入する。純粋関数。
pub fn color_for(ratio: f64) -> Rgb {
    let t = if ratio.is_nan() {
        0.0
    } else {
        ratio.clamp(0.0, 1.0)
    };

    let channel = |low: u8, high: u8| lerp(f64::from(low), f64::from(high), t).round() as u8;

    Rgb {
        r: channel(LOW.r, HIGH.r),
        g: channel(LOW.g, HIGH.g),
        b: channel(LOW.b, HIGH.b),
    }
}
