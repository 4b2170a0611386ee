use ratatui::style::Color;

/// Diverging palette for percent access
pub const COLOR_SCALE: [&str; 11] = [
    "#9e0142", "#d53e4f", "#f46d43", "#fdae61", "#fee08b", "#ffffbf", "#e6f598", "#abdda4",
    "#66c2a5", "#3288bd", "#5e4fa2",
];

pub const PCT_RANGE: [f64; 10] = [10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 99.0];

pub const POP_RANGE: [f64; 6] = [100.0, 1_000.0, 10_000.0, 100_000.0, 500_000.0, 1_000_000.0];

/// Sequential palette for people without access
pub const LINEAR_SCALE: [&str; 7] = [
    "#ffffcc", "#c7e9b4", "#7fcdbb", "#41b6c4", "#1d91c0", "#225ea8", "#0c2c84",
];

/// Fill used for features with no matching data
pub const UNKNOWN: Rgb = Rgb(0xFA, 0xFA, 0xFA);
pub const WHITE: Rgb = Rgb(0xFF, 0xFF, 0xFF);
pub const BLACK: Rgb = Rgb(0x00, 0x00, 0x00);

/// 24-bit color
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parse `#rrggbb` (case-insensitive)
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Composite `other` over `self` with the given opacity (0..=1)
    pub fn blend(self, other: Rgb, opacity: f64) -> Rgb {
        let t = opacity.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }

    /// Perceived brightness, used to pick readable outline colors
    pub fn luminance(self) -> f64 {
        0.299 * self.0 as f64 + 0.587 * self.1 as f64 + 0.114 * self.2 as f64
    }
}

impl From<Rgb> for Color {
    fn from(c: Rgb) -> Self {
        Color::Rgb(c.0, c.1, c.2)
    }
}

/// Threshold scale: `n` thresholds split the line into `n + 1` bins.
/// A value lands in the bin given by the count of thresholds `<= value`.
#[derive(Clone, Debug)]
pub struct ThresholdScale {
    domain: Vec<f64>,
    range: Vec<Rgb>,
    unknown: Rgb,
}

impl ThresholdScale {
    pub fn new(domain: &[f64], range: &[&str]) -> Self {
        Self {
            domain: domain.to_vec(),
            range: range.iter().filter_map(|h| Rgb::from_hex(h)).collect(),
            unknown: UNKNOWN,
        }
    }

    /// Map a value to its color; `None` and NaN give the unknown color
    pub fn color(&self, value: Option<f64>) -> Rgb {
        let Some(v) = value.filter(|v| !v.is_nan()) else {
            return self.unknown;
        };
        if self.range.is_empty() {
            return self.unknown;
        }
        let n = self.domain.len().min(self.range.len() - 1);
        let idx = self.domain[..n].partition_point(|&t| t <= v);
        self.range[idx]
    }

    /// (label, color) rows for a legend, lowest bin first
    pub fn legend(&self, fmt: impl Fn(f64) -> String) -> Vec<(String, Rgb)> {
        let n = self.domain.len().min(self.range.len().saturating_sub(1));
        let mut rows = Vec::with_capacity(n + 1);
        for (i, color) in self.range.iter().take(n + 1).enumerate() {
            let label = if i == 0 {
                format!("< {}", fmt(self.domain[0]))
            } else if i == n {
                format!(">= {}", fmt(self.domain[n - 1]))
            } else {
                format!("{} - {}", fmt(self.domain[i - 1]), fmt(self.domain[i]))
            };
            rows.push((label, *color));
        }
        rows
    }
}

/// Percent-access scale (diverging, 11 bins)
pub fn pct_scale() -> ThresholdScale {
    ThresholdScale::new(&PCT_RANGE, &COLOR_SCALE)
}

/// People-without-access scale (sequential, 7 bins)
pub fn no_access_scale() -> ThresholdScale {
    ThresholdScale::new(&POP_RANGE, &LINEAR_SCALE)
}
