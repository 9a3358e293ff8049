//! Break windows.
//!
//! A break blocks one slot either on a single day or on every day.
//! Break cells never hold sessions and reset the consecutive-slot count
//! used by break detection.

use serde::{Deserialize, Serialize};

use super::{Cell, Day};

/// A blocked slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakTime {
    /// Day of the break. `None` = every day.
    #[serde(default)]
    pub day: Option<Day>,
    /// Zero-based slot.
    pub slot: usize,
    /// Display label (e.g., "Lunch").
    #[serde(default)]
    pub label: String,
}

impl BreakTime {
    /// Creates a break on every day at `slot`.
    pub fn daily(slot: usize) -> Self {
        Self {
            day: None,
            slot,
            label: String::new(),
        }
    }

    /// Creates a break on a single day.
    pub fn on(day: Day, slot: usize) -> Self {
        Self {
            day: Some(day),
            slot,
            label: String::new(),
        }
    }

    /// Sets the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Cells covered by this break.
    pub fn cells(&self) -> Vec<Cell> {
        match self.day {
            Some(day) => vec![Cell::new(day, self.slot)],
            None => Day::ALL.iter().map(|&d| Cell::new(d, self.slot)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_break_covers_week() {
        let b = BreakTime::daily(3).with_label("Lunch");
        let cells = b.cells();
        assert_eq!(cells.len(), Day::COUNT);
        assert!(cells.iter().all(|c| c.slot == 3));
        assert_eq!(b.label, "Lunch");
    }

    #[test]
    fn test_single_day_break() {
        let b = BreakTime::on(Day::Saturday, 2);
        assert_eq!(b.cells(), vec![Cell::new(Day::Saturday, 2)]);
    }
}
