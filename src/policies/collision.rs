//! # Collision policy for overlapping cron runs.
//!
//! [`CollisionPolicy`] is the configured behavior for the moment a cron
//! trigger fires while a previous run of the same job still has active
//! (non-terminal) tasks.
//!
//! - [`CollisionPolicy::KillExisting`] — kill the prior run, then launch.
//! - [`CollisionPolicy::CancelNew`] — skip this firing; the prior run
//!   continues untouched.
//! - [`CollisionPolicy::RunOverlap`] — deprecated; a second overlapping run
//!   is never started, the firing is skipped.
//! - [`CollisionPolicy::Unknown`] — defensive catch-all for raw values the
//!   engine does not recognize; treated as skip.
//!
//! Stored configurations carry the policy as a raw integer, so the enum
//! round-trips through [`CollisionPolicy::from_raw`] / [`CollisionPolicy::raw`]
//! without losing unrecognized values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Behavior when a trigger fires over an unterminated prior run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum CollisionPolicy {
    /// Kill the active tasks of the prior run, wait for them to terminate,
    /// then launch the new run.
    KillExisting,

    /// Skip this firing; the active run keeps going untouched.
    CancelNew,

    /// Deprecated: once meant "launch a second overlapping run". Overlap was
    /// deliberately disabled; the firing is skipped and the suppression is
    /// logged at error level.
    RunOverlap,

    /// A raw policy value the engine does not recognize. Skipped, logged at
    /// error level.
    Unknown(u32),
}

impl CollisionPolicy {
    /// Maps a stored raw value onto a policy, preserving unrecognized values.
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0 => CollisionPolicy::KillExisting,
            1 => CollisionPolicy::CancelNew,
            2 => CollisionPolicy::RunOverlap,
            other => CollisionPolicy::Unknown(other),
        }
    }

    /// The raw stored representation of this policy.
    pub fn raw(&self) -> u32 {
        match self {
            CollisionPolicy::KillExisting => 0,
            CollisionPolicy::CancelNew => 1,
            CollisionPolicy::RunOverlap => 2,
            CollisionPolicy::Unknown(raw) => *raw,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            CollisionPolicy::KillExisting => "kill_existing",
            CollisionPolicy::CancelNew => "cancel_new",
            CollisionPolicy::RunOverlap => "run_overlap",
            CollisionPolicy::Unknown(_) => "unknown",
        }
    }
}

impl Default for CollisionPolicy {
    /// Returns [`CollisionPolicy::KillExisting`].
    fn default() -> Self {
        CollisionPolicy::KillExisting
    }
}

impl fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollisionPolicy::Unknown(raw) => write!(f, "unknown({raw})"),
            other => f.write_str(other.as_label()),
        }
    }
}

impl From<u32> for CollisionPolicy {
    fn from(raw: u32) -> Self {
        Self::from_raw(raw)
    }
}

impl From<CollisionPolicy> for u32 {
    fn from(policy: CollisionPolicy) -> u32 {
        policy.raw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_values_round_trip() {
        for raw in [0, 1, 2, 3, 99] {
            assert_eq!(CollisionPolicy::from_raw(raw).raw(), raw);
        }
    }

    #[test]
    fn known_raw_values_map_to_named_variants() {
        assert_eq!(CollisionPolicy::from_raw(0), CollisionPolicy::KillExisting);
        assert_eq!(CollisionPolicy::from_raw(1), CollisionPolicy::CancelNew);
        assert_eq!(CollisionPolicy::from_raw(2), CollisionPolicy::RunOverlap);
        assert_eq!(CollisionPolicy::from_raw(7), CollisionPolicy::Unknown(7));
    }

    #[test]
    fn serde_preserves_unknown_values() {
        let json = serde_json::to_string(&CollisionPolicy::Unknown(42)).unwrap();
        assert_eq!(json, "42");
        let back: CollisionPolicy = serde_json::from_str("42").unwrap();
        assert_eq!(back, CollisionPolicy::Unknown(42));
    }
}
