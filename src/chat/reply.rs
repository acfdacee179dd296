//! Chat status replies.
//!
//! Answers the "current status" command sent to the LINE account. The chat
//! rule is a plain count of flooded reports, independent of the page
//! consensus: chat users get an answer as soon as three people report water.

use crate::storage::models::{ImpactCategory, Report};

/// "Current status" command.
pub const STATUS_COMMAND: &str = "สถานะปัจจุบัน";

/// Flooded reports needed before chat says "flooded". The named level is the
/// most reported category, ties going to the one reported first. This differs
/// from the page, which needs a strict majority.
pub const CHAT_FLOOD_THRESHOLD: usize = 3;

const FLOODED_PREFIX: &str = "นํ้าท่วม 🌊 ";
const FLOODED_NO_LEVEL: &str = "นํ้าท่วม 🌊 ไม่มีข้อมูลระดับนํ้า";
const NOT_FLOODED: &str = "น้ำไม่ท่วม";

/// Reply text for an incoming chat message, or `None` to stay silent.
pub fn reply_for_message(text: &str, reports: &[Report]) -> Option<String> {
    if text.trim() != STATUS_COMMAND {
        return None;
    }

    let flooded: Vec<&Report> = reports.iter().filter(|r| r.is_flooded).collect();
    if flooded.len() < CHAT_FLOOD_THRESHOLD {
        return Some(NOT_FLOODED.to_string());
    }

    let categories: Vec<ImpactCategory> = flooded
        .iter()
        .filter_map(|r| r.reading.impact_category())
        .collect();

    match most_reported(&categories) {
        Some(category) => Some(format!("{}{}", FLOODED_PREFIX, category.thai_phrase())),
        None => Some(FLOODED_NO_LEVEL.to_string()),
    }
}

/// Most frequent category; on a tie, the one that appears first.
fn most_reported(categories: &[ImpactCategory]) -> Option<ImpactCategory> {
    let mut best: Option<(ImpactCategory, usize)> = None;
    for (i, category) in categories.iter().enumerate() {
        if categories[..i].contains(category) {
            continue;
        }
        let count = categories.iter().filter(|c| *c == category).count();
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((*category, count));
        }
    }
    best.map(|(category, _)| category)
}
