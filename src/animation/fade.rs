use crate::foundation::error::{ReelError, ReelResult};

/// Shape of an opacity ramp.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeCurve {
    /// Opacity grows proportionally with time.
    #[default]
    Linear,
    /// Smoothstep (`3u² - 2u³`).
    Smooth,
}

impl FadeCurve {
    fn apply(self, u: f64) -> f64 {
        let u = u.clamp(0.0, 1.0);
        match self {
            Self::Linear => u,
            Self::Smooth => u * u * (3.0 - 2.0 * u),
        }
    }
}

/// Opacity ramp from fully transparent at `t = 0` to opaque at `t = duration_sec`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FadeIn {
    /// Ramp length in seconds. `0` disables the fade.
    pub duration_sec: f64,
    /// Ramp shape.
    #[serde(default)]
    pub curve: FadeCurve,
}

impl FadeIn {
    /// Linear fade of `duration_sec`.
    pub fn linear(duration_sec: f64) -> Self {
        Self {
            duration_sec,
            curve: FadeCurve::Linear,
        }
    }

    /// Opacity multiplier at clip-local time `t_secs`, in `[0, 1]`.
    pub fn opacity_at(self, t_secs: f64) -> f32 {
        if self.duration_sec <= 0.0 {
            return 1.0;
        }
        self.curve.apply(t_secs / self.duration_sec) as f32
    }

    /// Check the ramp fits inside a clip of `clip_duration_sec`.
    pub fn validate(self, clip_duration_sec: f64) -> ReelResult<()> {
        if !self.duration_sec.is_finite() || self.duration_sec < 0.0 {
            return Err(ReelError::validation(
                "fade-in duration must be finite and >= 0",
            ));
        }
        if self.duration_sec > clip_duration_sec {
            return Err(ReelError::validation(format!(
                "fade-in duration {}s exceeds clip duration {}s",
                self.duration_sec, clip_duration_sec
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/fade.rs"]
mod tests;
