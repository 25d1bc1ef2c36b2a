use std::time::Duration;

use exam_core::scoring::MarkingScheme;

use crate::error::ConfigError;

pub const ENV_MARK_PER_CORRECT: &str = "EXAM_MARK_PER_CORRECT";
pub const ENV_WRONG_PENALTY: &str = "EXAM_WRONG_PENALTY";
pub const ENV_PASS_PERCENT: &str = "EXAM_PASS_PERCENT";
pub const ENV_TICK_MILLIS: &str = "EXAM_TICK_MILLIS";
pub const ENV_MAX_IMAGES: &str = "EXAM_MAX_IMAGES_PER_QUESTION";

/// Tunables for exam sessions and result display.
#[derive(Debug, Clone, PartialEq)]
pub struct ExamSettings {
    marking: MarkingScheme,
    pass_percent: f64,
    tick: Duration,
    max_images_per_question: Option<usize>,
}

impl Default for ExamSettings {
    fn default() -> Self {
        Self {
            marking: MarkingScheme::default(),
            pass_percent: Self::DEFAULT_PASS_PERCENT,
            tick: Duration::from_secs(1),
            max_images_per_question: None,
        }
    }
}

impl ExamSettings {
    pub const DEFAULT_PASS_PERCENT: f64 = 40.0;

    /// Load settings from the process environment, after reading `.env` if present.
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a set variable cannot be parsed or is out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build settings from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a present value cannot be parsed or is out of range.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut settings = Self::default();

        if let Some(raw) = lookup(ENV_MARK_PER_CORRECT) {
            settings.marking.mark_per_correct = parse_non_negative(ENV_MARK_PER_CORRECT, &raw)?;
        }
        if let Some(raw) = lookup(ENV_WRONG_PENALTY) {
            settings.marking.wrong_penalty = parse_non_negative(ENV_WRONG_PENALTY, &raw)?;
        }
        if let Some(raw) = lookup(ENV_PASS_PERCENT) {
            let pct = parse_non_negative(ENV_PASS_PERCENT, &raw)?;
            if pct > 100.0 {
                return Err(invalid(ENV_PASS_PERCENT, &raw, "must be at most 100"));
            }
            settings.pass_percent = pct;
        }
        if let Some(raw) = lookup(ENV_TICK_MILLIS) {
            let millis: u64 = raw
                .trim()
                .parse()
                .map_err(|_| invalid(ENV_TICK_MILLIS, &raw, "expected whole milliseconds"))?;
            if millis == 0 {
                return Err(invalid(ENV_TICK_MILLIS, &raw, "must be positive"));
            }
            settings.tick = Duration::from_millis(millis);
        }
        if let Some(raw) = lookup(ENV_MAX_IMAGES) {
            let max: usize = raw
                .trim()
                .parse()
                .map_err(|_| invalid(ENV_MAX_IMAGES, &raw, "expected a whole number"))?;
            if max == 0 {
                return Err(invalid(ENV_MAX_IMAGES, &raw, "must be positive"));
            }
            settings.max_images_per_question = Some(max);
        }

        Ok(settings)
    }

    #[must_use]
    pub fn with_marking(mut self, marking: MarkingScheme) -> Self {
        self.marking = marking;
        self
    }

    #[must_use]
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    #[must_use]
    pub fn with_max_images_per_question(mut self, max: Option<usize>) -> Self {
        self.max_images_per_question = max;
        self
    }

    #[must_use]
    pub fn marking(&self) -> &MarkingScheme {
        &self.marking
    }

    #[must_use]
    pub fn pass_percent(&self) -> f64 {
        self.pass_percent
    }

    /// Interval between countdown ticks; each tick removes one second.
    #[must_use]
    pub fn tick(&self) -> Duration {
        self.tick
    }

    #[must_use]
    pub fn max_images_per_question(&self) -> Option<usize> {
        self.max_images_per_question
    }
}

fn parse_non_negative(var: &'static str, raw: &str) -> Result<f64, ConfigError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| invalid(var, raw, "expected a number"))?;
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(var, raw, "must be a finite non-negative number"));
    }
    Ok(value)
}

fn invalid(var: &'static str, raw: &str, reason: &'static str) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: raw.to_owned(),
        reason,
    }
}
