//! Narration speed estimation for text-to-speech voiceovers.
//!
//! The provider's TTS engine speaks roughly 2.5 words per second at 1.0x.
//! To fit a narration into a video we leave a half-second tail, then speed
//! the voice up as needed. Speech faster than 1.5x is unintelligible, so
//! anything that would require it is rejected before a job is created.

use crate::error::CoreError;

/// Average TTS speaking rate in words per second at 1.0x speed.
const WORDS_PER_SECOND: f64 = 2.5;

/// Seconds of silence left at the end of the video.
const TAIL_SECS: f64 = 0.5;

/// Maximum playback speed before rejecting the narration outright.
const MAX_SPEED: f64 = 1.5;

/// Speeds above this are clamped down to it (1.31..=1.5 all play at 1.3x).
const CLAMP_SPEED: f64 = 1.3;

/// Estimate how many seconds a narration takes to speak at 1.0x.
pub fn estimate_tts_duration(text: &str) -> f64 {
    word_count(text) as f64 / WORDS_PER_SECOND
}

/// Number of whitespace-separated words in a narration.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Maximum narration length (in words) that fits a video of the given
/// duration, used in the rejection message shown to the user.
pub fn max_narration_words(video_duration_secs: i32) -> usize {
    (video_duration_secs as f64 * WORDS_PER_SECOND * CLAMP_SPEED) as usize
}

/// Compute the TTS playback speed that fits `text` into a video of
/// `video_duration_secs` seconds.
///
/// Returns `1.0` when the narration already fits. Otherwise the required
/// speed is clamped to at most 1.3x and truncated (not rounded) to one
/// decimal place. Narrations that would need more than 1.5x fail with
/// [`CoreError::NarrationTooLong`].
pub fn calculate_optimal_speed(text: &str, video_duration_secs: i32) -> Result<f64, CoreError> {
    let estimated = estimate_tts_duration(text);

    let mut target = video_duration_secs as f64 - TAIL_SECS;
    if target <= 0.0 {
        target = video_duration_secs as f64;
    }

    if estimated <= target {
        return Ok(1.0);
    }

    let required = estimated / target;

    if required > CLAMP_SPEED {
        if required > MAX_SPEED {
            return Err(CoreError::NarrationTooLong {
                words: word_count(text),
                max_words: max_narration_words(video_duration_secs),
                duration_secs: video_duration_secs,
            });
        }
        return Ok(CLAMP_SPEED);
    }

    // Truncate to one decimal place: 1.24 -> 1.2, never rounds up.
    Ok((required * 10.0).floor() / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[test]
    fn short_narration_plays_at_normal_speed() {
        // 100 words -> 40s estimated, target 59.5s.
        let speed = calculate_optimal_speed(&words(100), 60).expect("should fit");
        assert_eq!(speed, 1.0);
    }

    #[test]
    fn overlong_narration_is_rejected() {
        // 300 words -> 120s estimated, required ~2.02x > 1.5x.
        let err = calculate_optimal_speed(&words(300), 60).unwrap_err();
        assert_matches!(
            err,
            CoreError::NarrationTooLong {
                words: 300,
                duration_secs: 60,
                ..
            }
        );
    }

    #[test]
    fn speed_above_clamp_is_capped_at_1_3() {
        // 201 words over 60s -> 80.4s estimated, required ~1.351x.
        let speed = calculate_optimal_speed(&words(201), 60).expect("should clamp");
        assert_eq!(speed, 1.3);
    }

    #[test]
    fn required_speed_is_floored_to_one_decimal() {
        // 185 words over 60s -> 74s estimated, required ~1.2437x -> 1.2.
        let speed = calculate_optimal_speed(&words(185), 60).expect("should floor");
        assert_eq!(speed, 1.2);
    }

    #[test]
    fn zero_duration_falls_back_to_full_duration_target() {
        // target = 0 - 0.5 <= 0, so target becomes 0; estimated 0.4 > 0
        // would divide by zero -- but word-free text fits trivially.
        let speed = calculate_optimal_speed("", 0).expect("empty narration fits");
        assert_eq!(speed, 1.0);
    }

    #[test]
    fn word_count_ignores_extra_whitespace() {
        assert_eq!(word_count("  hello   world \n foo "), 3);
    }

    #[test]
    fn max_words_for_sixty_seconds() {
        assert_eq!(max_narration_words(60), 195);
    }
}
