//! Presentation helpers for log lines and webhook text.
//!
//! Display glyphs live here, not in the core types: detectors and the
//! history deal only in the `Category` enum.

use crate::types::{Category, Event, Tier};

pub fn category_glyph(category: Category) -> &'static str {
    match category {
        Category::Saturation => "🔥",
        Category::Stagnation => "🪨",
        Category::Drift => "🌀",
        Category::Connectivity => "📡",
        Category::Orchestration => "⚙️",
    }
}

fn tier_glyph(tier: Tier) -> &'static str {
    match tier {
        Tier::Critical => "🚨",
        Tier::Elevated => "⚠️",
    }
}

/// One-line rendering for the process log.
pub fn log_line(event: &Event) -> String {
    format!(
        "{} {} [{}] intensity={:.2} pattern={} — {}",
        event.tier.as_str(),
        event.category,
        category_glyph(event.category),
        event.intensity,
        event.pattern,
        event.message
    )
}

/// Final message sent when the daemon dies on an unrecoverable error.
pub fn farewell_text(reason: &str) -> String {
    format!("🚨 vigild daemon terminating: {reason}")
}

/// Multi-line text body sent to the webhook.
pub fn webhook_text(event: &Event) -> String {
    format!(
        "{} {} {} alert ({})\n{}\nintensity: {:.2}\naction: {}",
        tier_glyph(event.tier),
        category_glyph(event.category),
        event.category,
        event.tier.as_str(),
        event.message,
        event.intensity,
        event.recommended_action
    )
}
