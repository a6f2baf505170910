//! Credit pricing and the placeholder cover-art palette.

use crate::types::DbId;

/// Cost of one music generation.
pub const MUSIC_COST: i32 = 1;

/// Cost of one video generation without narration.
pub const VIDEO_COST: i32 = 2;

/// Cost of one video generation with a narrated voiceover.
pub const VIDEO_WITH_NARRATION_COST: i32 = 3;

/// Ledger reason tag for generation debits.
pub const REASON_USAGE: &str = "usage";

/// Fixed gradient palette for placeholder cover art, chosen by
/// `job id mod palette size` so the fallback is deterministic per job.
const ART_PALETTE: [&str; 10] = [
    "6366f1", "8b5cf6", "ec4899", "f43f5e", "f97316", "eab308", "22c55e", "14b8a6", "06b6d4",
    "3b82f6",
];

/// Credit cost of a video generation.
pub fn video_cost(has_narration: bool) -> i32 {
    if has_narration {
        VIDEO_WITH_NARRATION_COST
    } else {
        VIDEO_COST
    }
}

/// Deterministic placeholder cover-art URL used when image generation
/// fails. Not a pipeline failure; the job still completes.
pub fn placeholder_art_url(job_id: DbId) -> String {
    let color = ART_PALETTE[(job_id.unsigned_abs() as usize) % ART_PALETTE.len()];
    format!("https://placehold.co/400x400/{color}/white?text=%E2%99%AA")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_cost_depends_on_narration() {
        assert_eq!(video_cost(false), 2);
        assert_eq!(video_cost(true), 3);
    }

    #[test]
    fn placeholder_art_is_deterministic_per_job() {
        assert_eq!(placeholder_art_url(3), placeholder_art_url(3));
        // Palette wraps modulo its length.
        assert_eq!(placeholder_art_url(0), placeholder_art_url(10));
        assert!(placeholder_art_url(2).contains("ec4899"));
    }
}
