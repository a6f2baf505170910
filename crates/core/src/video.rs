//! Video generation parameter rules.
//!
//! The provider enforces per-model limits on duration and resolution; we
//! clamp requests up front so a job is never submitted with parameters the
//! provider would reject. The Hailuo-02 family supports longer clips (10s)
//! but only below 1080P, and anything over 6 seconds must render at 768P.

use std::time::Duration;

/// Default video model when the request does not specify one.
pub const DEFAULT_MODEL: &str = "video-01";

/// Default clip duration in seconds.
pub const DEFAULT_DURATION_SECS: i32 = 6;

/// Default output resolution.
pub const DEFAULT_RESOLUTION: &str = "768P";

/// Duration cap for standard models, and for Hailuo-02 at 1080P.
const BASE_MAX_DURATION_SECS: i32 = 6;

/// Extended duration cap for the Hailuo-02 family below 1080P.
const HAILUO_MAX_DURATION_SECS: i32 = 10;

/// Poll deadline for standard video models.
const BASE_POLL_TIMEOUT: Duration = Duration::from_secs(300);

/// Poll deadline for the Hailuo-02 family (longer renders).
const HAILUO_POLL_TIMEOUT: Duration = Duration::from_secs(600);

/// Whether a model id belongs to the Hailuo-02 family.
pub fn is_hailuo_family(model: &str) -> bool {
    model == "MiniMax-Hailuo-02" || model == "hailuo-02"
}

/// How long to poll the provider before giving up on a video task.
pub fn poll_timeout(model: &str) -> Duration {
    if is_hailuo_family(model) {
        HAILUO_POLL_TIMEOUT
    } else {
        BASE_POLL_TIMEOUT
    }
}

/// Effective parameters after clamping, ready for the provider request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoParams {
    pub duration_secs: i32,
    /// Resolution to send on the wire. `None` for models that do not
    /// accept a resolution field (everything outside the Hailuo family).
    pub resolution: Option<String>,
}

/// Clamp requested duration/resolution to what the model supports.
///
/// Rules, in order:
/// - non-positive duration becomes [`DEFAULT_DURATION_SECS`];
/// - the cap is 6s, or 10s for Hailuo-02 when the requested resolution is
///   not 1080P;
/// - any effective duration above 6s forces 768P regardless of the request;
/// - only Hailuo-02 models carry a resolution on the wire, defaulting to
///   768P when the request left it empty.
pub fn clamp_video_params(model: &str, duration_secs: i32, resolution: &str) -> VideoParams {
    let hailuo = is_hailuo_family(model);

    let max_duration = if hailuo && resolution != "1080P" {
        HAILUO_MAX_DURATION_SECS
    } else {
        BASE_MAX_DURATION_SECS
    };

    let mut duration = duration_secs;
    if duration <= 0 {
        duration = DEFAULT_DURATION_SECS;
    }
    if duration > max_duration {
        duration = max_duration;
    }

    let mut resolution = resolution.to_string();
    if duration > BASE_MAX_DURATION_SECS {
        resolution = DEFAULT_RESOLUTION.to_string();
    }

    let resolution = if hailuo {
        if resolution.is_empty() {
            Some(DEFAULT_RESOLUTION.to_string())
        } else {
            Some(resolution)
        }
    } else {
        None
    };

    VideoParams {
        duration_secs: duration,
        resolution,
    }
}
