use crate::foundation::error::{ReelError, ReelResult};

/// A scalar function of clip-local time in seconds.
///
/// Motions drive per-frame layer properties (overlay top edge, overlay rotation). They are plain
/// values so they can be serialized in the reel config and sampled without any rendering.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum Motion {
    /// Time-invariant value.
    Constant {
        /// Value returned for every `t`.
        value: f64,
    },
    /// `offset + amp * sin(2π * freq_hz * t + phase)`.
    Sine {
        /// Peak deviation from `offset`.
        amp: f64,
        /// Oscillation frequency in Hz.
        freq_hz: f64,
        /// Phase in radians.
        #[serde(default)]
        phase: f64,
        /// Baseline value.
        offset: f64,
    },
}

impl Motion {
    /// Constant motion.
    pub fn constant(value: f64) -> Self {
        Self::Constant { value }
    }

    /// Zero-phase sine oscillating around `offset`.
    pub fn sine(offset: f64, amp: f64, freq_hz: f64) -> Self {
        Self::Sine {
            amp,
            freq_hz,
            phase: 0.0,
            offset,
        }
    }

    /// Evaluate at clip-local time `t_secs`.
    pub fn sample(self, t_secs: f64) -> f64 {
        match self {
            Self::Constant { value } => value,
            Self::Sine {
                amp,
                freq_hz,
                phase,
                offset,
            } => offset + amp * (std::f64::consts::TAU * freq_hz * t_secs + phase).sin(),
        }
    }

    /// Closed interval `[min, max]` containing every value this motion can produce.
    pub fn bounds(self) -> (f64, f64) {
        match self {
            Self::Constant { value } => (value, value),
            Self::Sine { amp, offset, .. } => (offset - amp.abs(), offset + amp.abs()),
        }
    }

    /// Reject non-finite coefficients.
    pub fn validate(self, name: &str) -> ReelResult<()> {
        let finite = match self {
            Self::Constant { value } => value.is_finite(),
            Self::Sine {
                amp,
                freq_hz,
                phase,
                offset,
            } => amp.is_finite() && freq_hz.is_finite() && phase.is_finite() && offset.is_finite(),
        };
        if !finite {
            return Err(ReelError::validation(format!(
                "{name} motion coefficients must be finite"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/motion.rs"]
mod tests;
