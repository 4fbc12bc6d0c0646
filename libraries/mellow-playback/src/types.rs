//! Engine configuration

use std::time::Duration;

/// Tunable playback-engine parameters
///
/// The defaults match the behavior users of the hosted player expect:
/// fifty remembered tracks, ten seconds per resolution attempt, three
/// attempts spaced one second apart.
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    /// Most-recent entries kept in the listening history
    pub history_size: usize,

    /// Per-attempt resolution deadline
    pub resolve_timeout: Duration,

    /// Resolution attempts before a failure is surfaced
    pub max_attempts: u32,

    /// Pause between consecutive attempts
    pub retry_delay: Duration,

    /// Quality tier used for `qq` resolutions when none is chosen
    pub default_quality: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            history_size: 50,
            resolve_timeout: Duration::from_secs(10),
            max_attempts: 3,
            retry_delay: Duration::from_secs(1),
            default_quality: 5,
        }
    }
}
