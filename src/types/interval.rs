// Copyright 2026 ColData Project Authors. Licensed under Apache-2.0.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Interval type: a calendar-aware duration stored as three components.
///
/// Occupies a 16-byte slot (`months: i32 | days: i32 | micros: i64`).
#[derive(
    PartialOrd, Ord, PartialEq, Eq, Debug, Copy, Clone, Default, Hash, Serialize, Deserialize,
)]
pub struct Interval {
    months: i32,
    days: i32,
    micros: i64,
}

impl Interval {
    pub const fn new(months: i32, days: i32, micros: i64) -> Self {
        Interval {
            months,
            days,
            micros,
        }
    }

    pub fn months(&self) -> i32 {
        self.months
    }

    pub fn days(&self) -> i32 {
        self.days
    }

    pub fn micros(&self) -> i64 {
        self.micros
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} months {} days {} microseconds",
            self.months, self.days, self.micros
        )
    }
}
