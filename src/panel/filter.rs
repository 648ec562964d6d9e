//! Kind filter selecting which timers get mounted

use std::{fmt, str::FromStr};
use serde::{Deserialize, Serialize};

use crate::state::{Timer, TimerKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindFilter {
    #[default]
    Stopwatch,
    Countdown,
}

impl KindFilter {
    pub fn admits(self, timer: &Timer) -> bool {
        match self {
            KindFilter::Stopwatch => timer.kind == TimerKind::Stopwatch,
            KindFilter::Countdown => timer.kind == TimerKind::Countdown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            KindFilter::Stopwatch => "stopwatch",
            KindFilter::Countdown => "countdown",
        }
    }
}

impl fmt::Display for KindFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KindFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stopwatch" => Ok(KindFilter::Stopwatch),
            "countdown" => Ok(KindFilter::Countdown),
            other => Err(format!("Unknown timer filter: {}", other)),
        }
    }
}
