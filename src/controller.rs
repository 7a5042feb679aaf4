// Intensity controllers: turn what the user does each frame into one RGB
// intensity per light vector. The set is closed; which one runs is picked
// once when the session starts.

use std::f64::consts::PI;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::Rgb;

/// What the window saw since the previous frame.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Vertical wheel movement, positive = away from the user.
    pub scroll: f32,
    /// Channel-select keys pressed this frame (`1`..`9` → 0..8, `0` → 9).
    pub channel_keys: Vec<usize>,
    /// Time since the previous frame.
    pub dt: Duration,
}

pub trait IntensityController {
    /// Called once before the first frame.
    fn begin(&mut self, channels: usize) -> Result<()>;
    /// Write the intensities for this frame into `intensity`.
    fn update(&mut self, input: &InputState, intensity: &mut [Rgb]) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ControllerKind {
    /// Number keys pick a light, the wheel dims or brightens it.
    #[default]
    Scroll,
    /// Number keys switch lights on and off.
    Keyboard,
    /// Lights fade in and out on their own; the wheel sets the speed.
    Oscillator,
}

pub enum Controller {
    Scroll(ScrollController),
    Keyboard(KeyboardController),
    Oscillator(OscillatorController),
}

impl Controller {
    pub fn new(kind: ControllerKind) -> Self {
        match kind {
            ControllerKind::Scroll => Controller::Scroll(ScrollController::default()),
            ControllerKind::Keyboard => Controller::Keyboard(KeyboardController::default()),
            ControllerKind::Oscillator => Controller::Oscillator(OscillatorController::default()),
        }
    }
}

impl IntensityController for Controller {
    fn begin(&mut self, channels: usize) -> Result<()> {
        if channels == 0 {
            return Err(Error::Controller("no channels to control".into()));
        }
        match self {
            Controller::Scroll(c) => c.begin(channels),
            Controller::Keyboard(c) => c.begin(channels),
            Controller::Oscillator(c) => c.begin(channels),
        }
    }

    fn update(&mut self, input: &InputState, intensity: &mut [Rgb]) -> Result<()> {
        match self {
            Controller::Scroll(c) => c.update(input, intensity),
            Controller::Keyboard(c) => c.update(input, intensity),
            Controller::Oscillator(c) => c.update(input, intensity),
        }
    }
}

fn check_len(expected: usize, intensity: &[Rgb]) -> Result<()> {
    if intensity.len() != expected {
        return Err(Error::Controller(format!(
            "intensity buffer holds {} channels, controller started with {expected}",
            intensity.len()
        )));
    }
    Ok(())
}

/* ------------------------------ scroll ------------------------------ */

/// Intensity change per wheel notch.
pub const SCROLL_STEP: f32 = 0.05;
/// Upper bound so a runaway wheel can't blow the exposure up forever.
pub const SCROLL_MAX: f32 = 4.0;

#[derive(Debug, Default)]
pub struct ScrollController {
    levels: Vec<f32>,
    selected: usize,
}

impl IntensityController for ScrollController {
    fn begin(&mut self, channels: usize) -> Result<()> {
        self.levels = vec![1.0; channels];
        self.selected = 0;
        Ok(())
    }

    fn update(&mut self, input: &InputState, intensity: &mut [Rgb]) -> Result<()> {
        check_len(self.levels.len(), intensity)?;
        if let Some(&k) = input.channel_keys.iter().rev().find(|&&k| k < self.levels.len()) {
            self.selected = k;
        }
        if let Some(level) = self.levels.get_mut(self.selected) {
            *level = (*level + input.scroll * SCROLL_STEP).clamp(0.0, SCROLL_MAX);
        }

        for (out, &l) in intensity.iter_mut().zip(&self.levels) {
            *out = Rgb::splat(l);
        }
        Ok(())
    }
}

/* ----------------------------- keyboard ----------------------------- */

#[derive(Debug, Default)]
pub struct KeyboardController {
    on: Vec<bool>,
}

impl IntensityController for KeyboardController {
    fn begin(&mut self, channels: usize) -> Result<()> {
        self.on = vec![false; channels];
        if let Some(first) = self.on.first_mut() {
            *first = true;
        }
        Ok(())
    }

    fn update(&mut self, input: &InputState, intensity: &mut [Rgb]) -> Result<()> {
        check_len(self.on.len(), intensity)?;
        for &k in &input.channel_keys {
            if let Some(state) = self.on.get_mut(k) {
                *state = !*state;
            }
        }
        for (out, &on) in intensity.iter_mut().zip(&self.on) {
            *out = Rgb::splat(if on { 1.0 } else { 0.0 });
        }
        Ok(())
    }
}

/* ---------------------------- oscillator ---------------------------- */

/// Slowest allowed phase speed (rad/s).
pub const MIN_SPEED: f64 = 0.01;

#[derive(Debug, Default)]
pub struct OscillatorController {
    phase: Vec<f64>,
    speed: f64, // rad/s
}

impl IntensityController for OscillatorController {
    fn begin(&mut self, channels: usize) -> Result<()> {
        self.phase = vec![0.0; channels];
        // last light starts half a cycle out so something is always lit
        if let Some(last) = self.phase.last_mut() {
            *last = PI;
        }
        self.speed = 1.0;
        Ok(())
    }

    fn update(&mut self, input: &InputState, intensity: &mut [Rgb]) -> Result<()> {
        check_len(self.phase.len(), intensity)?;
        self.speed = (self.speed * 1.01f64.powf(input.scroll as f64)).max(MIN_SPEED);

        let advance = input.dt.as_secs_f64() * self.speed;
        for (out, phase) in intensity.iter_mut().zip(self.phase.iter_mut()) {
            *phase = (*phase + advance) % (2.0 * PI);
            *out = Rgb::splat(((phase.sin() + 1.0) / 2.0) as f32);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn keys(k: &[usize]) -> InputState {
        InputState { channel_keys: k.to_vec(), ..Default::default() }
    }

    #[test]
    fn scroll_adjusts_selected_channel() {
        let mut c = Controller::new(ControllerKind::Scroll);
        c.begin(3).unwrap();
        let mut k = vec![Rgb::ZERO; 3];

        c.update(&InputState::default(), &mut k).unwrap();
        assert!(k.iter().all(|v| *v == Rgb::splat(1.0)));

        c.update(&InputState { scroll: -4.0, ..keys(&[2]) }, &mut k).unwrap();
        assert_abs_diff_eq!(k[2].r, 0.8, epsilon = 1e-6);
        assert_eq!(k[0], Rgb::splat(1.0));

        // out-of-range keys are ignored; the wheel never goes below zero
        c.update(&InputState { scroll: -100.0, ..keys(&[7]) }, &mut k).unwrap();
        assert_eq!(k[2], Rgb::ZERO);
    }

    #[test]
    fn keyboard_toggles() {
        let mut c = Controller::new(ControllerKind::Keyboard);
        c.begin(2).unwrap();
        let mut k = vec![Rgb::ZERO; 2];

        c.update(&InputState::default(), &mut k).unwrap();
        assert_eq!(k, vec![Rgb::splat(1.0), Rgb::ZERO]);

        c.update(&keys(&[0, 1]), &mut k).unwrap();
        assert_eq!(k, vec![Rgb::ZERO, Rgb::splat(1.0)]);
    }

    #[test]
    fn oscillator_starts_in_antiphase() {
        let mut c = Controller::new(ControllerKind::Oscillator);
        c.begin(2).unwrap();
        let mut k = vec![Rgb::ZERO; 2];

        let quarter = InputState {
            dt: Duration::from_secs_f64(PI / 2.0),
            ..Default::default()
        };
        c.update(&quarter, &mut k).unwrap();
        assert_abs_diff_eq!(k[0].g, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(k[1].g, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn oscillator_speed_has_a_floor() {
        let mut c = OscillatorController::default();
        c.begin(1).unwrap();
        let mut k = vec![Rgb::ZERO; 1];
        c.update(&InputState { scroll: -10_000.0, ..Default::default() }, &mut k).unwrap();
        assert_eq!(c.speed, MIN_SPEED);
    }

    #[test]
    fn rejects_bad_setup() {
        let mut c = Controller::new(ControllerKind::Keyboard);
        assert!(matches!(c.begin(0), Err(Error::Controller(_))));

        c.begin(2).unwrap();
        let mut k = vec![Rgb::ZERO; 3];
        assert!(matches!(
            c.update(&InputState::default(), &mut k),
            Err(Error::Controller(_))
        ));
    }
}
