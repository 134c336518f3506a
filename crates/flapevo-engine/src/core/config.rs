use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Course dimensions and physics constants.
///
/// All distances are in course units (one unit per pixel of the reference
/// 800x600 canvas). Velocities are per frame, not per second.
///
/// # Example
///
/// ```
/// use flapevo_engine::CourseConfig;
///
/// let config = CourseConfig::default();
/// assert_eq!(config.frame_rate, 60.0);
/// assert_eq!(config.gap_height, 180.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseConfig {
    /// Course width.
    pub width: f32,
    /// Course height.
    pub height: f32,
    /// Target simulation steps per second.
    pub frame_rate: f64,
    /// Horizontal distance obstacles move per frame.
    pub course_speed: f32,
    /// Vertical size of the opening in each obstacle.
    pub gap_height: f32,
    /// Horizontal size of each obstacle.
    pub obstacle_width: f32,
    /// Minimum height of the solid segments above and below the gap.
    pub min_segment_height: f32,
    /// Fixed horizontal position of every agent.
    pub agent_x: f32,
    /// Agent side length (agents are square).
    pub agent_size: f32,
    /// Downward acceleration applied each frame.
    pub gravity: f32,
    /// Velocity set by a flap (negative is upward).
    pub flap_impulse: f32,
    /// Divisor used to normalize velocity into a policy input.
    pub velocity_scale: f32,
}

impl Default for CourseConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            frame_rate: 60.0,
            course_speed: 4.0,
            gap_height: 180.0,
            obstacle_width: 60.0,
            min_segment_height: 20.0,
            agent_x: 100.0,
            agent_size: 20.0,
            gravity: 0.25,
            flap_impulse: -5.0,
            velocity_scale: 10.0,
        }
    }
}

impl CourseConfig {
    /// Returns the fixed frame interval derived from [`frame_rate`](Self::frame_rate).
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frame_rate)
    }

    /// Returns the vertical position new agents start at.
    #[must_use]
    pub fn agent_start_y(&self) -> f32 {
        self.height / 2.0
    }

    /// Checks that the course can be simulated.
    ///
    /// Values loaded from a file go through this before an engine is built;
    /// [`frame_interval`](Self::frame_interval) and obstacle generation
    /// assume it passed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("width", f64::from(self.width)),
            ("height", f64::from(self.height)),
            ("frame_rate", self.frame_rate),
            ("course_speed", f64::from(self.course_speed)),
            ("gap_height", f64::from(self.gap_height)),
            ("obstacle_width", f64::from(self.obstacle_width)),
            ("min_segment_height", f64::from(self.min_segment_height)),
            ("agent_x", f64::from(self.agent_x)),
            ("agent_size", f64::from(self.agent_size)),
            ("gravity", f64::from(self.gravity)),
            ("flap_impulse", f64::from(self.flap_impulse)),
            ("velocity_scale", f64::from(self.velocity_scale)),
        ];
        if let Some((field, value)) = fields.iter().find(|(_, value)| !value.is_finite()) {
            return Err(ConfigError::NotFinite {
                field: *field,
                value: *value,
            });
        }

        let positive = [
            ("width", f64::from(self.width)),
            ("height", f64::from(self.height)),
            ("frame_rate", self.frame_rate),
            ("gap_height", f64::from(self.gap_height)),
            ("obstacle_width", f64::from(self.obstacle_width)),
            ("agent_size", f64::from(self.agent_size)),
            ("velocity_scale", f64::from(self.velocity_scale)),
        ];
        if let Some((field, value)) = positive.iter().find(|(_, value)| *value <= 0.0) {
            return Err(ConfigError::NotPositive {
                field: *field,
                value: *value,
            });
        }
        if self.min_segment_height < 0.0 {
            return Err(ConfigError::NotPositive {
                field: "min_segment_height",
                value: f64::from(self.min_segment_height),
            });
        }

        if !Duration::try_from_secs_f64(1.0 / self.frame_rate)
            .is_ok_and(|interval| !interval.is_zero())
        {
            return Err(ConfigError::FrameRate {
                frame_rate: self.frame_rate,
            });
        }

        if self.gap_height + 2.0 * self.min_segment_height > self.height {
            return Err(ConfigError::GapTooLarge {
                gap_height: self.gap_height,
                min_segment_height: self.min_segment_height,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// A [`CourseConfig`] that cannot be simulated.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("{field} must be a finite number, got {value}")]
    NotFinite { field: &'static str, value: f64 },
    #[display("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[display("frame_rate {frame_rate} does not give a usable frame interval")]
    FrameRate { frame_rate: f64 },
    #[display(
        "gap_height {gap_height} with {min_segment_height} above and below does not fit in height {height}"
    )]
    GapTooLarge {
        gap_height: f32,
        min_segment_height: f32,
        height: f32,
    },
}
