use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::signal::Side;

/// The single open position a pattern's tracker may hold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub side: Side,
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,
    /// Bars at or after this time no longer see the position as open.
    pub exit_deadline: NaiveDateTime,
}

impl Position {
    pub fn is_open_at(&self, time: NaiveDateTime) -> bool {
        time < self.exit_deadline
    }

    pub fn is_long(&self) -> bool {
        self.side == Side::Long
    }

    pub fn is_short(&self) -> bool {
        self.side == Side::Short
    }
}
