//! Mutable options for every component of the grid.
//!
//! All structs deserialize from RON with per-field defaults, so an options
//! file only needs to name what it changes. Fields marked `#[serde(skip)]`
//! are derived; call [`Options::recompute_derived`] (or the component's own
//! `recompute`) after editing anything they depend on.

use std::path::Path;

use glam::Vec2;
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};

use crate::color::Hsl;
use crate::error::ConfigError;
use crate::geometry::Orientation;
use crate::math::Easing;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub grid: GridOptions,
    pub tile: TileOptions,
    pub animator: AnimatorOptions,
    pub jobs: JobOptions,
}

impl Options {
    pub fn from_ron_str(src: &str) -> Result<Self, ConfigError> {
        let mut options: Options = ron::de::from_str(src)?;
        options.recompute_derived();
        Ok(options)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let src = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron_str(&src)
    }

    pub fn to_ron_string(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, PrettyConfig::default())
    }

    /// Recomputes every derived value from the fields it depends on.
    pub fn recompute_derived(&mut self) {
        self.jobs.color_wave.recompute();
        self.jobs.displacement_wave.recompute();
    }
}

/// Layout and content placement of the grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridOptions {
    pub tile_outer_radius: f32,
    pub tile_gap: f32,
    /// `None` picks [`Orientation::for_viewport`].
    pub orientation: Option<Orientation>,
    /// Width of the content column as a fraction of the viewport width.
    pub content_column_fraction: f32,
    pub base_color: Hsl,
    pub content_color: Hsl,
    pub content_image_opacity: f32,
    /// How many tiles each sector slides outwards when a post opens.
    pub expanded_displacement_tile_count: usize,
    /// Extra space around the viewport in which sectors synthesize tiles.
    pub sector_bounds_margin: f32,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            tile_outer_radius: 42.0,
            tile_gap: 4.0,
            orientation: None,
            content_column_fraction: 0.6,
            base_color: Hsl::new(210.0, 20.0, 14.0),
            content_color: Hsl::new(200.0, 35.0, 30.0),
            content_image_opacity: 0.35,
            expanded_displacement_tile_count: 3,
            sector_bounds_margin: 60.0,
        }
    }
}

/// Coefficients of the per-tile spring-damper simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileOptions {
    pub mass: f32,
    pub drag: f32,
    pub neighbor_spring: f32,
    pub neighbor_damping: f32,
    pub anchor_spring: f32,
    pub anchor_damping: f32,
    pub border_anchor_spring: f32,
    pub border_anchor_damping: f32,
    pub force_suppression_threshold: f32,
    pub velocity_suppression_threshold: f32,
}

impl Default for TileOptions {
    fn default() -> Self {
        Self {
            mass: 1.0,
            drag: 2.0,
            neighbor_spring: 60.0,
            neighbor_damping: 4.0,
            anchor_spring: 40.0,
            anchor_damping: 6.0,
            border_anchor_spring: 120.0,
            border_anchor_damping: 14.0,
            force_suppression_threshold: 1e-3,
            velocity_suppression_threshold: 1e-3,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimatorOptions {
    /// Upper bound on a frame's delta time, in seconds.
    pub max_delta_time: f32,
}

impl Default for AnimatorOptions {
    fn default() -> Self {
        Self {
            max_delta_time: 1.0 / 30.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobOptions {
    pub color_wave: ColorWaveOptions,
    pub displacement_wave: DisplacementWaveOptions,
    pub hover: HighlightHoverOptions,
    pub radiate: HighlightRadiateOptions,
    pub line: LineOptions,
    pub lines_radiate: LineOptions,
    pub pan: TweenOptions,
    pub spread: SpreadOptions,
    pub dilate: TweenOptions,
    pub reveal: TweenOptions,
    pub open_post: PostTransitionOptions,
    pub close_post: PostTransitionOptions,
    pub carousel: TweenOptions,
    pub recurring: RecurringOptions,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            color_wave: ColorWaveOptions::default(),
            displacement_wave: DisplacementWaveOptions::default(),
            hover: HighlightHoverOptions::default(),
            radiate: HighlightRadiateOptions::default(),
            line: LineOptions::default(),
            lines_radiate: LineOptions {
                duration: 1.2,
                tail_length: 5,
                ..LineOptions::default()
            },
            pan: TweenOptions::default(),
            spread: SpreadOptions::default(),
            dilate: TweenOptions {
                duration: 0.6,
                easing: Easing::EaseOutCubic,
            },
            reveal: TweenOptions {
                duration: 0.35,
                easing: Easing::EaseInOutCubic,
            },
            open_post: PostTransitionOptions::default(),
            close_post: PostTransitionOptions {
                spread_offset: 0.15,
                pan_offset: 0.15,
                dilate_offset: 0.15,
                reveal_offset: 0.0,
                pan_to_focus: true,
            },
            carousel: TweenOptions {
                duration: 0.3,
                easing: Easing::EaseOutCubic,
            },
            recurring: RecurringOptions::default(),
        }
    }
}

/// Values derived from a wave's period, wavelength and direction.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WaveDerived {
    pub angular_frequency: f32,
    pub wave_number: f32,
    pub direction: Vec2,
}

impl WaveDerived {
    fn compute(period: f32, wavelength: f32, direction_deg: f32) -> Self {
        let tau = std::f32::consts::TAU;
        Self {
            angular_frequency: if period > 0.0 { tau / period } else { 0.0 },
            wave_number: if wavelength > 0.0 { tau / wavelength } else { 0.0 },
            direction: Vec2::from_angle(direction_deg.to_radians()),
        }
    }

    /// Phase of the wave at `pos` and time `t`.
    pub fn phase(&self, pos: Vec2, t: f64) -> f32 {
        self.wave_number * self.direction.dot(pos) - self.angular_frequency * t as f32
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorWaveOptions {
    pub enabled: bool,
    pub period: f32,
    pub wavelength: f32,
    pub direction_deg: f32,
    pub hue_amplitude: f32,
    pub lightness_amplitude: f32,
    #[serde(skip)]
    pub derived: WaveDerived,
}

impl ColorWaveOptions {
    pub fn recompute(&mut self) {
        self.derived = WaveDerived::compute(self.period, self.wavelength, self.direction_deg);
    }
}

impl Default for ColorWaveOptions {
    fn default() -> Self {
        let mut options = Self {
            enabled: true,
            period: 6.0,
            wavelength: 900.0,
            direction_deg: 30.0,
            hue_amplitude: 8.0,
            lightness_amplitude: 3.0,
            derived: WaveDerived::default(),
        };
        options.recompute();
        options
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplacementWaveOptions {
    pub enabled: bool,
    pub period: f32,
    pub wavelength: f32,
    pub direction_deg: f32,
    /// Peak displacement of a tile's anchor, in pixels.
    pub amplitude: f32,
    #[serde(skip)]
    pub derived: WaveDerived,
}

impl DisplacementWaveOptions {
    pub fn recompute(&mut self) {
        self.derived = WaveDerived::compute(self.period, self.wavelength, self.direction_deg);
    }
}

impl Default for DisplacementWaveOptions {
    fn default() -> Self {
        let mut options = Self {
            enabled: true,
            period: 4.0,
            wavelength: 700.0,
            direction_deg: -60.0,
            amplitude: 3.0,
            derived: WaveDerived::default(),
        };
        options.recompute();
        options
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightHoverOptions {
    pub duration: f32,
    pub lightness_boost: f32,
    pub opacity_boost: f32,
}

impl Default for HighlightHoverOptions {
    fn default() -> Self {
        Self {
            duration: 0.6,
            lightness_boost: 18.0,
            opacity_boost: 0.5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightRadiateOptions {
    pub duration: f32,
    /// Speed of the ring front, in pixels per second.
    pub speed: f32,
    /// Width of the lit band behind the ring front, in pixels.
    pub band_width: f32,
    pub lightness_boost: f32,
    pub hue_shift: f32,
    pub opacity_boost: f32,
}

impl Default for HighlightRadiateOptions {
    fn default() -> Self {
        Self {
            duration: 1.6,
            speed: 700.0,
            band_width: 160.0,
            lightness_boost: 14.0,
            hue_shift: 20.0,
            opacity_boost: 0.3,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineOptions {
    pub duration: f32,
    /// Time the head needs to travel one tile edge.
    pub segment_duration: f32,
    /// Number of vertices drawn behind the head.
    pub tail_length: usize,
    pub width: f32,
    pub color: Hsl,
    pub opacity: f32,
}

impl Default for LineOptions {
    fn default() -> Self {
        Self {
            duration: 2.4,
            segment_duration: 0.08,
            tail_length: 8,
            width: 3.0,
            color: Hsl::new(190.0, 80.0, 65.0),
            opacity: 0.9,
        }
    }
}

/// Duration and easing of a simple interpolating job.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TweenOptions {
    pub duration: f32,
    pub easing: Easing,
}

impl Default for TweenOptions {
    fn default() -> Self {
        Self {
            duration: 0.5,
            easing: Easing::EaseInOutCubic,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpreadOptions {
    pub duration: f32,
    /// Peak outward push of a tile right next to the focus, in pixels.
    pub displacement: f32,
    /// Distance over which the push fades to zero, in pixels.
    pub falloff_distance: f32,
}

impl Default for SpreadOptions {
    fn default() -> Self {
        Self {
            duration: 0.45,
            displacement: 24.0,
            falloff_distance: 500.0,
        }
    }
}

/// Start offsets (seconds after the composite starts) of the four parts of
/// opening or closing a post.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostTransitionOptions {
    pub spread_offset: f32,
    pub pan_offset: f32,
    pub dilate_offset: f32,
    pub reveal_offset: f32,
    /// Whether to pan: the focus tile to the viewport center when opening,
    /// back to no pan when closing.
    pub pan_to_focus: bool,
}

impl Default for PostTransitionOptions {
    fn default() -> Self {
        Self {
            spread_offset: 0.0,
            pan_offset: 0.0,
            dilate_offset: 0.0,
            reveal_offset: 0.2,
            pan_to_focus: true,
        }
    }
}

/// Random delay between occurrences of a recurring job.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecurrenceOptions {
    pub enabled: bool,
    pub avg_delay_ms: f64,
    pub delay_deviation_range_ms: f64,
}

impl Default for RecurrenceOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            avg_delay_ms: 2500.0,
            delay_deviation_range_ms: 2000.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecurringOptions {
    pub random_line: RecurrenceOptions,
    pub random_radiate: RecurrenceOptions,
}

impl Default for RecurringOptions {
    fn default() -> Self {
        Self {
            random_line: RecurrenceOptions::default(),
            random_radiate: RecurrenceOptions {
                enabled: true,
                avg_delay_ms: 9000.0,
                delay_deviation_range_ms: 6000.0,
            },
        }
    }
}
