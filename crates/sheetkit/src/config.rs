#![forbid(unsafe_code)]

//! Sheet configuration.
//!
//! [`SheetConfig`] bundles the gesture thresholds from `sheetkit-core` with
//! the engine's own policy: snap points, entrance style, transition timings,
//! and which dismissal paths are enabled.
//!
//! # Environment Variables
//!
//! | Variable | Type | Default | Description |
//! |----------|------|---------|-------------|
//! | `SHEETKIT_SNAP_POINTS` | list | `0,1` | Comma-separated snap progress values |
//! | `SHEETKIT_INITIAL_INDEX` | usize | 0 | Snap index shown after opening |
//! | `SHEETKIT_OPEN_ANIMATION` | str | `slide_up` | `instant`, `snap_to_remembered`, `slide_up` |
//! | `SHEETKIT_ENTER_MS` | u64 | 300 | Entrance transition duration |
//! | `SHEETKIT_EXIT_MS` | u64 | 250 | Exit transition duration |
//! | `SHEETKIT_SNAP_MS` | u64 | 250 | Snap transition duration |
//! | `SHEETKIT_REDUCED_MOTION` | bool | false | Make every transition instantaneous |
//! | `SHEETKIT_CLOSE_ON_ESCAPE` | bool | true | Escape requests a close |
//! | `SHEETKIT_CLOSE_ON_BACKDROP` | bool | true | Backdrop click requests a close |
//! | `SHEETKIT_BASE_Z` | i32 | 1000 | z-index of stack slot 0 |
//!
//! Gesture thresholds are read by [`GestureConfig::from_env`].

use sheetkit_core::gesture::GestureConfig;
use sheetkit_core::geometry::finite_or;
use sheetkit_core::snap::SnapPointSet;
use web_time::Duration;

use crate::error::ConfigError;

/// Default entrance transition.
pub const DEFAULT_ENTER_DURATION: Duration = Duration::from_millis(300);
/// Default exit transition.
pub const DEFAULT_EXIT_DURATION: Duration = Duration::from_millis(250);
/// Default snap transition.
pub const DEFAULT_SNAP_DURATION: Duration = Duration::from_millis(250);

const MAX_DURATION: Duration = Duration::from_secs(5);

/// How the sheet arrives when opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OpenAnimation {
    /// Appear at the initial snap index with no transition.
    Instant,
    /// Appear at the initial index, then animate to the index the sheet last
    /// rested on before it was closed.
    SnapToRemembered,
    /// Start off-screen, then slide up to the initial index.
    #[default]
    SlideUp,
}

impl OpenAnimation {
    /// Parse `instant` / `snap_to_remembered` / `slide_up` (case-insensitive,
    /// `-` accepted for `_`).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "instant" | "none" => Some(Self::Instant),
            "snap_to_remembered" | "remembered" => Some(Self::SnapToRemembered),
            "slide_up" | "slide" => Some(Self::SlideUp),
            _ => None,
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SheetConfig {
    /// Gesture thresholds and physics.
    pub gesture: GestureConfig,
    /// Rest positions.
    pub snap_points: SnapPointSet,
    /// Snap index shown after opening.
    pub initial_index: usize,
    /// Entrance style.
    pub open_animation: OpenAnimation,
    /// Entrance transition length.
    pub enter_duration: Duration,
    /// Exit transition length.
    pub exit_duration: Duration,
    /// Snap transition length.
    pub snap_duration: Duration,
    /// Skip every visual transition.
    pub reduced_motion: bool,
    /// Escape requests a close.
    pub close_on_escape: bool,
    /// Backdrop click requests a close.
    pub close_on_backdrop: bool,
    /// Push a navigation-history entry while open.
    pub use_history: bool,
    /// z-index of stack slot 0.
    pub base_z_index: i32,
    /// Scale reduction at full upward overdrag.
    pub max_compression: f64,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            gesture: GestureConfig::default(),
            snap_points: SnapPointSet::default(),
            initial_index: 0,
            open_animation: OpenAnimation::default(),
            enter_duration: DEFAULT_ENTER_DURATION,
            exit_duration: DEFAULT_EXIT_DURATION,
            snap_duration: DEFAULT_SNAP_DURATION,
            reduced_motion: false,
            close_on_escape: true,
            close_on_backdrop: true,
            use_history: true,
            base_z_index: 1000,
            max_compression: 0.04,
        }
    }
}

impl SheetConfig {
    /// Replace the gesture config.
    #[must_use]
    pub fn with_gesture(mut self, gesture: GestureConfig) -> Self {
        self.gesture = gesture;
        self
    }

    /// Set the snap points (normalized).
    #[must_use]
    pub fn with_snap_points(mut self, points: &[f64]) -> Self {
        self.snap_points = SnapPointSet::new(points);
        self
    }

    /// Set the index shown after opening.
    #[must_use]
    pub fn with_initial_index(mut self, index: usize) -> Self {
        self.initial_index = index;
        self
    }

    /// Set the entrance style.
    #[must_use]
    pub fn with_open_animation(mut self, animation: OpenAnimation) -> Self {
        self.open_animation = animation;
        self
    }

    /// Set entrance and exit durations.
    #[must_use]
    pub fn with_durations(mut self, enter: Duration, exit: Duration) -> Self {
        self.enter_duration = enter;
        self.exit_duration = exit;
        self
    }

    /// Enable or disable reduced motion.
    #[must_use]
    pub fn with_reduced_motion(mut self, reduced: bool) -> Self {
        self.reduced_motion = reduced;
        self
    }

    /// Enable or disable the Escape and backdrop dismissal paths.
    #[must_use]
    pub fn with_dismissal(mut self, on_escape: bool, on_backdrop: bool) -> Self {
        self.close_on_escape = on_escape;
        self.close_on_backdrop = on_backdrop;
        self
    }

    /// Enable or disable the navigation-history entry.
    #[must_use]
    pub fn with_history(mut self, enabled: bool) -> Self {
        self.use_history = enabled;
        self
    }

    /// Whether transitions should be animated at all.
    #[inline]
    #[must_use]
    pub fn motion_enabled(&self) -> bool {
        !self.reduced_motion
    }

    /// Load from `SHEETKIT_*` environment variables on top of defaults.
    ///
    /// Unparseable values are logged and ignored.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self {
            gesture: GestureConfig::from_env(),
            ..Self::default()
        };

        if let Ok(val) = std::env::var("SHEETKIT_SNAP_POINTS") {
            match parse_snap_points(&val) {
                Ok(points) => config.snap_points = points,
                Err(err) => tracing::warn!(target: crate::LOG_TARGET, error = %err, "ignoring SHEETKIT_SNAP_POINTS"),
            }
        }
        if let Ok(val) = std::env::var("SHEETKIT_INITIAL_INDEX")
            && let Ok(index) = val.trim().parse::<usize>()
        {
            config.initial_index = index;
        }
        if let Ok(val) = std::env::var("SHEETKIT_OPEN_ANIMATION")
            && let Some(animation) = OpenAnimation::parse(&val)
        {
            config.open_animation = animation;
        }
        if let Some(d) = env_millis("SHEETKIT_ENTER_MS") {
            config.enter_duration = d;
        }
        if let Some(d) = env_millis("SHEETKIT_EXIT_MS") {
            config.exit_duration = d;
        }
        if let Some(d) = env_millis("SHEETKIT_SNAP_MS") {
            config.snap_duration = d;
        }
        if let Some(b) = env_bool("SHEETKIT_REDUCED_MOTION") {
            config.reduced_motion = b;
        }
        if let Some(b) = env_bool("SHEETKIT_CLOSE_ON_ESCAPE") {
            config.close_on_escape = b;
        }
        if let Some(b) = env_bool("SHEETKIT_CLOSE_ON_BACKDROP") {
            config.close_on_backdrop = b;
        }
        if let Ok(val) = std::env::var("SHEETKIT_BASE_Z")
            && let Ok(z) = val.trim().parse::<i32>()
        {
            config.base_z_index = z;
        }

        config.validated()
    }

    /// Parse a JSON policy document; missing fields take defaults.
    #[cfg(feature = "policy-config")]
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.validated())
    }

    /// Parse a TOML policy document; missing fields take defaults.
    #[cfg(feature = "policy-config")]
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        Ok(config.validated())
    }

    /// Clamp every field to a usable range.
    #[must_use]
    pub fn validated(mut self) -> Self {
        self.gesture = self.gesture.validated();
        self.initial_index = self.snap_points.clamp_index(self.initial_index);
        self.enter_duration = self.enter_duration.min(MAX_DURATION);
        self.exit_duration = self.exit_duration.min(MAX_DURATION);
        self.snap_duration = self.snap_duration.min(MAX_DURATION);
        self.max_compression = finite_or(self.max_compression, 0.04).clamp(0.0, 0.5);
        self
    }
}

/// Parse a comma- or whitespace-separated list of snap values.
pub fn parse_snap_points(text: &str) -> Result<SnapPointSet, ConfigError> {
    let values = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|tok| !tok.is_empty())
        .map(|tok| {
            tok.parse::<f64>().map_err(|_| ConfigError::InvalidSnapPoint {
                token: tok.to_owned(),
            })
        })
        .collect::<Result<Vec<f64>, _>>()?;
    Ok(SnapPointSet::new(&values))
}

fn env_millis(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
}

fn env_bool(name: &str) -> Option<bool> {
    let val = std::env::var(name).ok()?;
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SheetConfig::default();
        assert_eq!(config.snap_points.points(), &[0.0, 1.0]);
        assert_eq!(config.open_animation, OpenAnimation::SlideUp);
        assert!(config.close_on_escape && config.close_on_backdrop);
        assert!(config.motion_enabled());
    }

    #[test]
    fn validated_clamps_index_and_timings() {
        let config = SheetConfig {
            max_compression: f64::NAN,
            exit_duration: Duration::from_secs(60),
            ..SheetConfig::default()
        }
        .with_snap_points(&[0.0, 0.5])
        .with_initial_index(7)
        .validated();
        assert_eq!(config.initial_index, 1);
        assert_eq!(config.exit_duration, MAX_DURATION);
        assert_eq!(config.max_compression, 0.04);
    }

    #[test]
    fn snap_point_list_parsing() {
        let set = parse_snap_points("1, 0.5 0").unwrap();
        assert_eq!(set.points(), &[0.0, 0.5, 1.0]);
        assert!(matches!(
            parse_snap_points("0, half"),
            Err(ConfigError::InvalidSnapPoint { token }) if token == "half"
        ));
        assert_eq!(parse_snap_points("").unwrap().points(), &[0.0, 1.0]);
    }

    #[test]
    fn open_animation_names() {
        assert_eq!(OpenAnimation::parse("Slide-Up"), Some(OpenAnimation::SlideUp));
        assert_eq!(
            OpenAnimation::parse("snap_to_remembered"),
            Some(OpenAnimation::SnapToRemembered)
        );
        assert_eq!(OpenAnimation::parse("instant"), Some(OpenAnimation::Instant));
        assert_eq!(OpenAnimation::parse("bounce"), None);
    }

    #[cfg(feature = "policy-config")]
    #[test]
    fn json_policy_fills_defaults() {
        let config = SheetConfig::from_json(
            r#"{ "snap_points": [1.0, 0.4, 0.0], "reduced_motion": true, "open_animation": "instant" }"#,
        )
        .unwrap();
        assert_eq!(config.snap_points.points(), &[0.0, 0.4, 1.0]);
        assert!(config.reduced_motion);
        assert_eq!(config.open_animation, OpenAnimation::Instant);
        assert_eq!(config.base_z_index, 1000);
        assert!(SheetConfig::from_json("{ nope").is_err());
    }

    #[cfg(feature = "policy-config")]
    #[test]
    fn toml_policy() {
        let config = SheetConfig::from_toml("initial_index = 1\nsnap_points = [0.0, 0.5, 1.0]\n").unwrap();
        assert_eq!(config.initial_index, 1);
    }
}
