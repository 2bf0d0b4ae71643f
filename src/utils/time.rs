//! Time parsing and formatting utilities

use crate::domain::errors::DomainError;

/// Time parser for timeline positions given on the command line
pub struct TimeParser;

impl TimeParser {
    /// Parse `SS.ms`, `MM:SS.ms` or `HH:MM:SS.ms` into seconds
    pub fn parse(time_str: &str) -> Result<f64, DomainError> {
        let time_str = time_str.trim();
        let invalid = || {
            DomainError::InvalidActionParams(format!(
                "Invalid time format: {}. Expected HH:MM:SS.ms, MM:SS.ms, or seconds",
                time_str
            ))
        };

        let parts: Vec<&str> = time_str.split(':').collect();
        if parts.len() > 3 || parts.iter().any(|p| p.trim().is_empty()) {
            return Err(invalid());
        }

        let mut seconds = 0.0;
        for (i, part) in parts.iter().enumerate() {
            let value: f64 = part.trim().parse().map_err(|_| invalid())?;
            if !value.is_finite() || value < 0.0 {
                return Err(invalid());
            }
            // Only the last component may carry a fraction or exceed 59
            let is_last = i == parts.len() - 1;
            if !is_last && (value.fract() != 0.0 || (i > 0 && value >= 60.0)) {
                return Err(invalid());
            }
            if is_last && parts.len() > 1 && value >= 60.0 {
                return Err(invalid());
            }
            seconds = seconds * 60.0 + value;
        }
        Ok(seconds)
    }

    /// Format seconds as `MM:SS.ms`, or `HH:MM:SS.ms` past the hour
    pub fn format(seconds: f64) -> String {
        let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
        let hours = total_ms / 3_600_000;
        let minutes = (total_ms % 3_600_000) / 60_000;
        let secs = (total_ms % 60_000) / 1000;
        let milliseconds = total_ms % 1000;

        if hours > 0 {
            format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, secs, milliseconds)
        } else {
            format!("{:02}:{:02}.{:03}", minutes, secs, milliseconds)
        }
    }
}
