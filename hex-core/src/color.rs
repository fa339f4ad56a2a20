use serde::{Deserialize, Serialize};

/// A color in hue/saturation/lightness space.
///
/// Hue is in degrees (`0..360`), saturation and lightness are percentages
/// (`0..=100`). Tiles animate in HSL because most effects only nudge one
/// channel at a time.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

impl Hsl {
    pub const fn new(h: f32, s: f32, l: f32) -> Self {
        Self { h, s, l }
    }

    /// Returns this color with every channel offset, wrapping hue and
    /// clamping saturation/lightness.
    pub fn shifted(self, dh: f32, ds: f32, dl: f32) -> Self {
        Self {
            h: (self.h + dh).rem_euclid(360.0),
            s: (self.s + ds).clamp(0.0, 100.0),
            l: (self.l + dl).clamp(0.0, 100.0),
        }
    }

    /// Interpolates towards `other`, taking the short way around the hue circle.
    pub fn lerp(self, other: Hsl, t: f32) -> Self {
        let mut dh = other.h - self.h;
        if dh > 180.0 {
            dh -= 360.0;
        } else if dh < -180.0 {
            dh += 360.0;
        }
        Self {
            h: (self.h + dh * t).rem_euclid(360.0),
            s: self.s + (other.s - self.s) * t,
            l: self.l + (other.l - self.l) * t,
        }
    }

    /// Converts to 8-bit sRGB.
    pub fn to_rgb(self) -> [u8; 3] {
        let s = (self.s / 100.0).clamp(0.0, 1.0);
        let l = (self.l / 100.0).clamp(0.0, 1.0);
        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let hp = self.h.rem_euclid(360.0) / 60.0;
        let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
        let (r, g, b) = match hp as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = l - c / 2.0;
        let to_u8 = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        [to_u8(r), to_u8(g), to_u8(b)]
    }
}

impl Default for Hsl {
    fn default() -> Self {
        Self::new(0.0, 0.0, 50.0)
    }
}
