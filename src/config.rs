// Command-line configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::controller::ControllerKind;
use crate::curve::{DEFAULT_CURVE_SIZE, InversionTarget};
use crate::error::{Error, Result};

/// Fewest/most photographs accepted unless `--unbounded` is given.
pub const MIN_IMAGES: usize = 2;
pub const MAX_IMAGES: usize = 10;

#[derive(Debug, Parser)]
#[command(name = "cement")]
#[command(
    author,
    version,
    about = "Relight a scene live from photographs taken under different lights"
)]
pub struct Cli {
    /// Photographs of the same scene; the first is the background.
    #[arg(required = true)]
    pub images: Vec<PathBuf>,

    /// How intensities are driven.
    #[arg(short, long, value_enum, default_value_t = ControllerKind::Scroll)]
    pub controller: ControllerKind,

    /// Treat the first photograph as a light of its own instead of subtracting it.
    #[arg(long)]
    pub keep_background: bool,

    /// Finverse samples (whitespace separated, non-decreasing, in [0,1]).
    #[arg(long)]
    pub curve: Option<PathBuf>,

    /// Size of the default squared curve when `--curve` is absent.
    #[arg(long, default_value_t = DEFAULT_CURVE_SIZE)]
    pub curve_size: usize,

    /// Value each entry of the forward curve is solved for.
    #[arg(long, value_enum, default_value_t = InversionTarget::Linear)]
    pub inversion_target: InversionTarget,

    /// Where the periodic full-resolution save goes.
    #[arg(short, long, default_value = "output.jpg")]
    pub output: PathBuf,

    /// Seconds between saves (and FPS reports); 0 disables saving.
    #[arg(long, default_value_t = 10)]
    pub save_interval: u64,

    /// Window height in pixels; width follows the photographs' aspect ratio.
    #[arg(long, default_value_t = 720)]
    pub window_height: usize,

    /// Accept any number of photographs.
    #[arg(long)]
    pub unbounded: bool,
}

impl Cli {
    /// Checks that need more than one argument at a time.
    pub fn validate(&self) -> Result<()> {
        let n = self.images.len();
        if !self.unbounded && !(MIN_IMAGES..=MAX_IMAGES).contains(&n) {
            return Err(Error::InvalidArgs(format!(
                "expected between {MIN_IMAGES} and {MAX_IMAGES} images, got {n} \
                 (use --unbounded to lift this)"
            )));
        }
        if self.curve.is_none() && self.curve_size < 2 {
            return Err(Error::InvalidArgs("--curve-size must be at least 2".into()));
        }
        if self.window_height == 0 {
            return Err(Error::InvalidArgs("--window-height must be positive".into()));
        }
        Ok(())
    }

    pub fn remove_background(&self) -> bool {
        !self.keep_background
    }

    /// `None` when periodic saving is off.
    pub fn save_every(&self) -> Option<Duration> {
        (self.save_interval > 0).then(|| Duration::from_secs(self.save_interval))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("cement").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let cli = parse(&["bg.jpg", "lamp.jpg"]);
        cli.validate().unwrap();
        assert_eq!(cli.controller, ControllerKind::Scroll);
        assert_eq!(cli.inversion_target, InversionTarget::Linear);
        assert_eq!(cli.curve_size, DEFAULT_CURVE_SIZE);
        assert_eq!(cli.output, PathBuf::from("output.jpg"));
        assert_eq!(cli.save_every(), Some(Duration::from_secs(10)));
        assert!(cli.remove_background());
    }

    #[test]
    fn options() {
        let cli = parse(&[
            "--controller",
            "oscillator",
            "--inversion-target",
            "squared",
            "--keep-background",
            "--save-interval",
            "0",
            "a.png",
            "b.png",
            "c.png",
        ]);
        cli.validate().unwrap();
        assert_eq!(cli.controller, ControllerKind::Oscillator);
        assert_eq!(cli.inversion_target, InversionTarget::Squared);
        assert!(!cli.remove_background());
        assert_eq!(cli.save_every(), None);
        assert_eq!(cli.images.len(), 3);
    }

    #[test]
    fn image_count_is_bounded() {
        assert!(matches!(parse(&["only.png"]).validate(), Err(Error::InvalidArgs(_))));

        let many: Vec<String> = (0..11).map(|i| format!("{i}.png")).collect();
        let many: Vec<&str> = many.iter().map(String::as_str).collect();
        assert!(parse(&many).validate().is_err());

        let mut unbounded = many.clone();
        unbounded.insert(0, "--unbounded");
        parse(&unbounded).validate().unwrap();
        parse(&["--unbounded", "only.png"]).validate().unwrap();
    }

    #[test]
    fn missing_images_fail_to_parse() {
        assert!(Cli::try_parse_from(["cement"]).is_err());
    }
}
