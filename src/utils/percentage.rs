use std::{fmt::Display, ops::Deref};

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Percentage(f64);

impl Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl Percentage {
    pub fn new_opt(value: f64) -> Option<Percentage> {
        if value < 0. || value.is_nan() {
            None
        } else {
            Some(Percentage(value))
        }
    }

    /// Rounds the percentage down to the closest multiple of `step`. 86.67 with a step of 5
    /// becomes 85.
    pub fn stepped(self, step: f64) -> Percentage {
        Percentage(self.0 - self.0 % step)
    }

    /// Whole part of the percentage, the way it's shown to the user.
    pub fn truncated(self) -> u64 {
        self.0.trunc() as u64
    }
}

impl Deref for Percentage {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Share of `whole` taken by `value`, both in seconds. An empty whole means nothing was taken.
pub fn seconds_percentage(value: f64, whole: f64) -> Percentage {
    if whole <= 0. {
        return Percentage(0.);
    }
    Percentage::new_opt(value / whole * 100.).unwrap_or(Percentage(0.))
}
