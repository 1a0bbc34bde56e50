//! Derived statistics: what a number of cigarettes cost in money and time.
//!
//! Everything here is a pure function of the count and the pricing
//! configuration; nothing is stored.

use serde::{Deserialize, Serialize};

use crate::storage::PricingConfig;

const MINUTES_PER_HOUR: u64 = 60;
const MINUTES_PER_DAY: u64 = 24 * MINUTES_PER_HOUR;

pub fn money_spent(count: u64, unit_price: u64) -> u64 {
    count.saturating_mul(unit_price)
}

pub fn minutes_lost(count: u64, unit_minutes: u64) -> u64 {
    count.saturating_mul(unit_minutes)
}

/// Render a minute total at the coarsest sensible unit.
///
/// Below an hour: minutes. Below a day: hours and remaining minutes.
/// Otherwise: days and remaining hours. Each unit truncates.
pub fn format_time(minutes: u64) -> String {
    if minutes < MINUTES_PER_HOUR {
        return unit(minutes, "minute");
    }
    if minutes < MINUTES_PER_DAY {
        return format!(
            "{} {}",
            unit(minutes / MINUTES_PER_HOUR, "hour"),
            unit(minutes % MINUTES_PER_HOUR, "minute")
        );
    }
    format!(
        "{} {}",
        unit(minutes / MINUTES_PER_DAY, "day"),
        unit((minutes % MINUTES_PER_DAY) / MINUTES_PER_HOUR, "hour")
    )
}

/// `1234567` with symbol `₩` becomes `₩1,234,567`.
pub fn format_money(amount: u64, symbol: &str) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{symbol}{grouped}")
}

fn unit(n: u64, name: &str) -> String {
    if n == 1 {
        format!("1 {name}")
    } else {
        format!("{n} {name}s")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedStats {
    pub count: u64,
    pub money_spent: u64,
    pub minutes_lost: u64,
}

impl DerivedStats {
    pub fn for_count(count: u64, pricing: &PricingConfig) -> Self {
        Self {
            count,
            money_spent: money_spent(count, pricing.unit_price),
            minutes_lost: minutes_lost(count, pricing.unit_minutes),
        }
    }

    pub fn money_label(&self, symbol: &str) -> String {
        format_money(self.money_spent, symbol)
    }

    pub fn time_lost_label(&self) -> String {
        format_time(self.minutes_lost)
    }
}
