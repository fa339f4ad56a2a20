//! Config panel controls.
//!
//! Every editable option is described by a [`Control`] borrowing the field
//! it edits. The panel is a plain list of them, grouped into sections.

use std::ops::RangeInclusive;

use hex_core::color::Hsl;
use hex_core::config::{Options, RecurrenceOptions, TweenOptions};
use hex_core::geometry::Orientation;
use hex_core::math::Easing;

pub const EASINGS: [(Easing, &str); 4] = [
    (Easing::Linear, "linear"),
    (Easing::EaseInQuad, "ease-in quad"),
    (Easing::EaseOutCubic, "ease-out cubic"),
    (Easing::EaseInOutCubic, "ease-in-out cubic"),
];

pub const ORIENTATIONS: [(Option<Orientation>, &str); 3] = [
    (None, "auto"),
    (Some(Orientation::Horizontal), "horizontal"),
    (Some(Orientation::Vertical), "vertical"),
];

const EASING_NAMES: [&str; 4] = [EASINGS[0].1, EASINGS[1].1, EASINGS[2].1, EASINGS[3].1];
const ORIENTATION_NAMES: [&str; 3] = [ORIENTATIONS[0].1, ORIENTATIONS[1].1, ORIENTATIONS[2].1];

/// A numeric field of either precision.
pub enum NumberRef<'a> {
    F32(&'a mut f32),
    F64(&'a mut f64),
}

impl<'a> From<&'a mut f32> for NumberRef<'a> {
    fn from(value: &'a mut f32) -> Self {
        NumberRef::F32(value)
    }
}

impl<'a> From<&'a mut f64> for NumberRef<'a> {
    fn from(value: &'a mut f64) -> Self {
        NumberRef::F64(value)
    }
}

/// One editable value in the config panel.
pub enum Control<'a> {
    Number {
        label: &'static str,
        value: NumberRef<'a>,
        range: RangeInclusive<f64>,
        speed: f64,
    },
    Boolean {
        label: &'static str,
        value: &'a mut bool,
    },
    /// Index into `choices`.
    Enum {
        label: &'static str,
        selected: &'a mut usize,
        choices: &'static [&'static str],
    },
    Color {
        label: &'static str,
        value: &'a mut Hsl,
    },
    /// Sets `pressed` when clicked.
    Action {
        label: &'static str,
        pressed: &'a mut bool,
    },
}

impl Control<'_> {
    pub fn label(&self) -> &'static str {
        match self {
            Control::Number { label, .. }
            | Control::Boolean { label, .. }
            | Control::Enum { label, .. }
            | Control::Color { label, .. }
            | Control::Action { label, .. } => *label,
        }
    }

    /// Draws the control and reports whether it changed its value.
    pub fn show(self, ui: &mut egui::Ui) -> bool {
        match self {
            Control::Number {
                label,
                value,
                range,
                speed,
            } => {
                ui.horizontal(|ui| {
                    ui.label(label);
                    let drag = match value {
                        NumberRef::F32(v) => egui::DragValue::new(v),
                        NumberRef::F64(v) => egui::DragValue::new(v),
                    };
                    ui.add(drag.range(range).speed(speed)).changed()
                })
                .inner
            }
            Control::Boolean { label, value } => ui.checkbox(value, label).changed(),
            Control::Enum {
                label,
                selected,
                choices,
            } => {
                let before = *selected;
                let current = choices.get(before).copied().unwrap_or("?");
                egui::ComboBox::from_label(label)
                    .selected_text(current)
                    .show_ui(ui, |ui| {
                        for (i, choice) in choices.iter().enumerate() {
                            ui.selectable_value(selected, i, *choice);
                        }
                    });
                *selected != before
            }
            Control::Color { label, value } => {
                ui.horizontal(|ui| {
                    ui.label(label);
                    let channels = [
                        (&mut value.h, 360.0, "h "),
                        (&mut value.s, 100.0, "s "),
                        (&mut value.l, 100.0, "l "),
                    ];
                    let mut changed = false;
                    for (channel, max, prefix) in channels {
                        changed |= ui
                            .add(egui::DragValue::new(channel).range(0.0..=max).prefix(prefix))
                            .changed();
                    }
                    changed
                })
                .inner
            }
            Control::Action { label, pressed } => {
                if ui.button(label).clicked() {
                    *pressed = true;
                }
                false
            }
        }
    }
}

fn number<'a>(
    label: &'static str,
    value: impl Into<NumberRef<'a>>,
    range: RangeInclusive<f64>,
    speed: f64,
) -> Control<'a> {
    Control::Number {
        label,
        value: value.into(),
        range,
        speed,
    }
}

fn duration<'a>(label: &'static str, tween: &'a mut TweenOptions) -> Control<'a> {
    number(label, &mut tween.duration, 0.0..=5.0, 0.01)
}

fn recurrence<'a>(
    controls: &mut Vec<Control<'a>>,
    labels: [&'static str; 3],
    options: &'a mut RecurrenceOptions,
) {
    let [enabled, avg, range] = labels;
    controls.push(Control::Boolean {
        label: enabled,
        value: &mut options.enabled,
    });
    controls.push(number(avg, &mut options.avg_delay_ms, 1.0..=60_000.0, 10.0));
    controls.push(number(
        range,
        &mut options.delay_deviation_range_ms,
        0.0..=60_000.0,
        10.0,
    ));
}

/// A titled group of controls.
pub struct Section<'a> {
    pub title: &'static str,
    pub controls: Vec<Control<'a>>,
}

/// Selector state for the enum-valued options, which cannot be borrowed as
/// indices directly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Selectors {
    pub orientation: usize,
    pub dilate_easing: usize,
    pub reveal_easing: usize,
}

impl Selectors {
    pub fn read(options: &Options) -> Self {
        Self {
            orientation: orientation_index(options.grid.orientation),
            dilate_easing: easing_index(options.jobs.dilate.easing),
            reveal_easing: easing_index(options.jobs.reveal.easing),
        }
    }

    pub fn write(&self, options: &mut Options) {
        if let Some(&(orientation, _)) = ORIENTATIONS.get(self.orientation) {
            options.grid.orientation = orientation;
        }
        if let Some(&(easing, _)) = EASINGS.get(self.dilate_easing) {
            options.jobs.dilate.easing = easing;
        }
        if let Some(&(easing, _)) = EASINGS.get(self.reveal_easing) {
            options.jobs.reveal.easing = easing;
        }
    }
}

pub fn easing_index(easing: Easing) -> usize {
    EASINGS.iter().position(|&(e, _)| e == easing).unwrap_or(0)
}

pub fn orientation_index(orientation: Option<Orientation>) -> usize {
    ORIENTATIONS
        .iter()
        .position(|&(o, _)| o == orientation)
        .unwrap_or(0)
}

/// Builds the config panel for `options`.
pub fn sections<'a>(options: &'a mut Options, selectors: &'a mut Selectors) -> Vec<Section<'a>> {
    let Options {
        grid,
        tile,
        animator,
        jobs,
    } = options;

    let layout = Section {
        title: "Layout",
        controls: vec![
            number("tile radius", &mut grid.tile_outer_radius, 6.0..=120.0, 0.5),
            number("tile gap", &mut grid.tile_gap, 0.0..=30.0, 0.1),
            Control::Enum {
                label: "orientation",
                selected: &mut selectors.orientation,
                choices: &ORIENTATION_NAMES,
            },
            number(
                "content column",
                &mut grid.content_column_fraction,
                0.0..=1.0,
                0.01,
            ),
            Control::Color {
                label: "base color",
                value: &mut grid.base_color,
            },
            Control::Color {
                label: "content color",
                value: &mut grid.content_color,
            },
            number(
                "sector margin",
                &mut grid.sector_bounds_margin,
                0.0..=400.0,
                1.0,
            ),
        ],
    };

    let physics = Section {
        title: "Physics",
        controls: vec![
            number("mass", &mut tile.mass, 0.01..=10.0, 0.01),
            number("drag", &mut tile.drag, 0.0..=50.0, 0.05),
            number("neighbor spring", &mut tile.neighbor_spring, 0.0..=500.0, 0.5),
            number("neighbor damping", &mut tile.neighbor_damping, 0.0..=50.0, 0.05),
            number("anchor spring", &mut tile.anchor_spring, 0.0..=500.0, 0.5),
            number("anchor damping", &mut tile.anchor_damping, 0.0..=50.0, 0.05),
            number("border spring", &mut tile.border_anchor_spring, 0.0..=500.0, 0.5),
            number("border damping", &mut tile.border_anchor_damping, 0.0..=50.0, 0.05),
            number("max frame dt", &mut animator.max_delta_time, 0.001..=0.5, 0.001),
        ],
    };

    let waves = Section {
        title: "Waves",
        controls: vec![
            Control::Boolean {
                label: "color wave",
                value: &mut jobs.color_wave.enabled,
            },
            number("color period", &mut jobs.color_wave.period, 0.1..=60.0, 0.1),
            number(
                "color wavelength",
                &mut jobs.color_wave.wavelength,
                10.0..=5000.0,
                5.0,
            ),
            number(
                "color direction",
                &mut jobs.color_wave.direction_deg,
                -180.0..=180.0,
                1.0,
            ),
            Control::Boolean {
                label: "displacement wave",
                value: &mut jobs.displacement_wave.enabled,
            },
            number(
                "displacement period",
                &mut jobs.displacement_wave.period,
                0.1..=60.0,
                0.1,
            ),
            number(
                "displacement amplitude",
                &mut jobs.displacement_wave.amplitude,
                0.0..=40.0,
                0.1,
            ),
        ],
    };

    let effects = Section {
        title: "Effects",
        controls: vec![
            number("line duration", &mut jobs.line.duration, 0.1..=20.0, 0.05),
            number("line segment", &mut jobs.line.segment_duration, 0.01..=1.0, 0.005),
            number("radiate speed", &mut jobs.radiate.speed, 10.0..=3000.0, 5.0),
            duration("pan", &mut jobs.pan),
            duration("dilate", &mut jobs.dilate),
            Control::Enum {
                label: "dilate easing",
                selected: &mut selectors.dilate_easing,
                choices: &EASING_NAMES,
            },
            duration("reveal", &mut jobs.reveal),
            Control::Enum {
                label: "reveal easing",
                selected: &mut selectors.reveal_easing,
                choices: &EASING_NAMES,
            },
            Control::Boolean {
                label: "pan to focus",
                value: &mut jobs.open_post.pan_to_focus,
            },
        ],
    };

    let mut recurring = Vec::new();
    recurrence(
        &mut recurring,
        ["random lines", "line delay ms", "line deviation ms"],
        &mut jobs.recurring.random_line,
    );
    recurrence(
        &mut recurring,
        ["random radiates", "radiate delay ms", "radiate deviation ms"],
        &mut jobs.recurring.random_radiate,
    );

    vec![
        layout,
        physics,
        waves,
        effects,
        Section {
            title: "Recurring",
            controls: recurring,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn enum_indices_round_trip_through_the_tables() {
        for (easing, _) in EASINGS {
            assert_eq!(EASINGS[easing_index(easing)].0, easing);
        }
        for (orientation, _) in ORIENTATIONS {
            assert_eq!(ORIENTATIONS[orientation_index(orientation)].0, orientation);
        }
    }

    #[test]
    fn selectors_write_back_into_options() {
        let mut options = Options::default();
        let mut selectors = Selectors::read(&options);
        selectors.orientation = orientation_index(Some(Orientation::Vertical));
        selectors.dilate_easing = easing_index(Easing::Linear);
        selectors.write(&mut options);
        assert_eq!(options.grid.orientation, Some(Orientation::Vertical));
        assert_eq!(options.jobs.dilate.easing, Easing::Linear);
    }

    #[test]
    fn control_labels_are_unique() {
        let mut options = Options::default();
        let mut selectors = Selectors::read(&options);
        let mut seen = HashSet::new();
        for section in sections(&mut options, &mut selectors) {
            for control in &section.controls {
                assert!(seen.insert(control.label()), "duplicate {}", control.label());
            }
        }
    }

    #[test]
    fn controls_edit_the_borrowed_fields() {
        let mut options = Options::default();
        let mut selectors = Selectors::read(&options);
        for control in sections(&mut options, &mut selectors)
            .into_iter()
            .flat_map(|s| s.controls)
        {
            match control {
                Control::Number {
                    label: "tile gap",
                    value: NumberRef::F32(value),
                    ..
                } => *value = 7.5,
                Control::Number {
                    label: "line delay ms",
                    value: NumberRef::F64(value),
                    ..
                } => *value = 42.0,
                _ => {}
            }
        }
        assert_eq!(options.grid.tile_gap, 7.5);
        assert_eq!(options.jobs.recurring.random_line.avg_delay_ms, 42.0);
    }
}
