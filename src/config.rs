use clap::Parser;
use thiserror::Error;

use crate::scene::Scene;

/// Lines the GPU buffers can hold before the first reallocation.
pub const INITIAL_LINE_CAPACITY: usize = 128;

#[derive(Parser, Debug)]
#[command(author, version, about = "Glowing outline renderer", long_about = None)]
pub struct Args {
    /// MSAA sample count for the outline pass (1 or 4)
    #[arg(long, default_value_t = 4)]
    pub msaa: u32,

    /// Start with the frame cap disabled (toggle at runtime with F)
    #[arg(long)]
    pub uncapped: bool,

    /// Frame cap target
    #[arg(long, default_value_t = 60)]
    pub target_fps: u32,

    /// Geometry to draw
    #[arg(long, value_enum, default_value_t = Scene::Ring)]
    pub scene: Scene,

    /// Line thickness in normalized device units
    #[arg(long, default_value_t = 0.02)]
    pub thickness: f32,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("unsupported MSAA sample count {0}, expected 1 or 4")]
    SampleCount(u32),
    #[error("target FPS must be positive")]
    TargetFps,
    #[error("line thickness must be a positive number, got {0}")]
    Thickness(f32),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub sample_count: u32,
    pub fps_cap_enabled: bool,
    pub target_fps: u32,
    pub scene: Scene,
    pub thickness: f32,
    pub initial_line_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_count: 4,
            fps_cap_enabled: true,
            target_fps: 60,
            scene: Scene::Ring,
            thickness: 0.02,
            initial_line_capacity: INITIAL_LINE_CAPACITY,
        }
    }
}

impl Config {
    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        if !matches!(args.msaa, 1 | 4) {
            return Err(ConfigError::SampleCount(args.msaa));
        }
        if args.target_fps == 0 {
            return Err(ConfigError::TargetFps);
        }
        if !(args.thickness.is_finite() && args.thickness > 0.0) {
            return Err(ConfigError::Thickness(args.thickness));
        }

        Ok(Self {
            sample_count: args.msaa,
            fps_cap_enabled: !args.uncapped,
            target_fps: args.target_fps,
            scene: args.scene,
            thickness: args.thickness,
            ..Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Config, ConfigError> {
        let args = Args::try_parse_from(std::iter::once("outline_glow").chain(args.iter().copied()))
            .expect("arguments should parse");
        Config::from_args(args)
    }

    #[test]
    fn defaults_match_cli_defaults() {
        assert_eq!(parse(&[]), Ok(Config::default()));
    }

    #[test]
    fn flags_override_defaults() {
        let config = parse(&["--msaa", "1", "--uncapped", "--scene", "rounded", "--target-fps", "144"])
            .unwrap();
        assert_eq!(config.sample_count, 1);
        assert!(!config.fps_cap_enabled);
        assert_eq!(config.scene, Scene::Rounded);
        assert_eq!(config.target_fps, 144);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert_eq!(parse(&["--msaa", "2"]), Err(ConfigError::SampleCount(2)));
        assert_eq!(parse(&["--target-fps", "0"]), Err(ConfigError::TargetFps));
        assert_eq!(parse(&["--thickness=-1"]), Err(ConfigError::Thickness(-1.0)));
    }

    #[test]
    fn unknown_scene_fails_to_parse() {
        let result = Args::try_parse_from(["outline_glow", "--scene", "teapot"]);
        assert!(result.is_err());
    }
}
