/// Session gate: per-block cooldown and the session-wide detail quota,
/// checked before any variant operation runs.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::core::policy::DetailPolicy;

/// Millisecond wall clock.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Reads the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// A clock that only moves when told to. Used by tests and by hosts that
/// supply their own time (e.g. a browser).
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: AtomicU64::new(start_ms),
        }
    }

    pub fn set(&self, now_ms: u64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: u64) {
        self.now.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

/// The four gated operations on a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    RegenerateOverview,
    ExpandOverview,
    GenerateDetail,
    ExpandDetail,
}

impl ActionKind {
    /// Detail-producing actions count against the session quota.
    pub fn produces_detail(&self) -> bool {
        matches!(self, Self::GenerateDetail | Self::ExpandDetail)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RegenerateOverview => "regenerate_overview",
            Self::ExpandOverview => "expand_overview",
            Self::GenerateDetail => "generate_detail",
            Self::ExpandDetail => "expand_detail",
        }
    }
}

/// Why the gate turned a request away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateRejection {
    CoolingDown { index: u8, remaining_ms: u64 },
    QuotaExhausted { used: u32, limit: u32 },
}

/// Per-session bookkeeping for the gate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionGate {
    detail_gen_count: u32,
    last_action_at_by_index: FxHashMap<u8, u64>,
}

impl SessionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn detail_gen_count(&self) -> u32 {
        self.detail_gen_count
    }

    pub fn last_action_at(&self, index: u8) -> Option<u64> {
        self.last_action_at_by_index.get(&index).copied()
    }

    pub fn can_generate_detail(&self, policy: &DetailPolicy) -> bool {
        self.detail_gen_count < policy.max_detail_generations_per_session
    }

    pub fn is_cooling_down(&self, index: u8, now_ms: u64, policy: &DetailPolicy) -> bool {
        self.cooldown_remaining(index, now_ms, policy).is_some()
    }

    fn cooldown_remaining(&self, index: u8, now_ms: u64, policy: &DetailPolicy) -> Option<u64> {
        let last = self.last_action_at(index)?;
        let elapsed = now_ms.saturating_sub(last);
        (elapsed < policy.action_cooldown_ms).then(|| policy.action_cooldown_ms - elapsed)
    }

    /// Check and record an action.
    ///
    /// On admission the block's last-action time is set to `now_ms` and,
    /// for detail actions, the quota is consumed. Neither is rolled back
    /// if the generation that follows fails. A rejection changes nothing.
    pub fn admit(
        &mut self,
        index: u8,
        kind: ActionKind,
        now_ms: u64,
        policy: &DetailPolicy,
    ) -> Result<(), GateRejection> {
        if let Some(remaining_ms) = self.cooldown_remaining(index, now_ms, policy) {
            tracing::info!(index, action = kind.as_str(), remaining_ms, "action rejected: cooling down");
            return Err(GateRejection::CoolingDown { index, remaining_ms });
        }
        if kind.produces_detail() && !self.can_generate_detail(policy) {
            tracing::info!(
                index,
                action = kind.as_str(),
                used = self.detail_gen_count,
                "action rejected: detail quota exhausted"
            );
            return Err(GateRejection::QuotaExhausted {
                used: self.detail_gen_count,
                limit: policy.max_detail_generations_per_session,
            });
        }

        self.last_action_at_by_index.insert(index, now_ms);
        if kind.produces_detail() {
            self.detail_gen_count += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn cooldown_window() {
        let policy = DetailPolicy::default();
        let mut gate = SessionGate::new();
        assert!(!gate.is_cooling_down(5, 0, &policy));
        gate.admit(5, ActionKind::RegenerateOverview, 1_000, &policy).unwrap();

        assert!(gate.is_cooling_down(5, 1_100, &policy));
        assert_eq!(
            gate.admit(5, ActionKind::ExpandOverview, 1_100, &policy),
            Err(GateRejection::CoolingDown { index: 5, remaining_ms: 2_900 })
        );
        assert_eq!(gate.last_action_at(5), Some(1_000));

        assert!(!gate.is_cooling_down(5, 4_100, &policy));
        gate.admit(5, ActionKind::ExpandOverview, 4_100, &policy).unwrap();
        assert_eq!(gate.last_action_at(5), Some(4_100));
    }

    #[test]
    fn cooldown_is_per_block() {
        let policy = DetailPolicy::default();
        let mut gate = SessionGate::new();
        gate.admit(1, ActionKind::GenerateDetail, 0, &policy).unwrap();
        gate.admit(2, ActionKind::GenerateDetail, 10, &policy).unwrap();
        assert!(gate.is_cooling_down(1, 10, &policy));
        assert!(!gate.is_cooling_down(3, 10, &policy));
    }

    #[test]
    fn quota_only_counts_detail_actions() {
        let policy = DetailPolicy {
            max_detail_generations_per_session: 10,
            ..DetailPolicy::default()
        };
        let mut gate = SessionGate::new();
        for index in 1..=10u8 {
            gate.admit(index, ActionKind::GenerateDetail, 0, &policy).unwrap();
        }
        assert_eq!(gate.detail_gen_count(), 10);
        assert!(!gate.can_generate_detail(&policy));

        assert_eq!(
            gate.admit(11, ActionKind::ExpandDetail, 0, &policy),
            Err(GateRejection::QuotaExhausted { used: 10, limit: 10 })
        );
        assert_eq!(gate.last_action_at(11), None);

        gate.admit(11, ActionKind::RegenerateOverview, 0, &policy).unwrap();
        assert_eq!(gate.detail_gen_count(), 10);
    }

    #[test]
    fn cooldown_wins_over_quota() {
        let policy = DetailPolicy {
            max_detail_generations_per_session: 1,
            ..DetailPolicy::default()
        };
        let mut gate = SessionGate::new();
        gate.admit(1, ActionKind::GenerateDetail, 0, &policy).unwrap();
        assert!(matches!(
            gate.admit(1, ActionKind::GenerateDetail, 10, &policy),
            Err(GateRejection::CoolingDown { .. })
        ));
    }

    #[test]
    fn manual_clock() {
        let clock = ManualClock::new(10);
        clock.advance(5);
        assert_eq!(clock.now_ms(), 15);
        clock.set(3);
        assert_eq!(clock.now_ms(), 3);
        assert!(SystemClock.now_ms() > 0);
    }

    proptest! {
        #[test]
        fn count_never_exceeds_limit(
            limit in 0u32..8,
            actions in proptest::collection::vec((1u8..=24, 0u8..4, 0u64..20_000), 0..60),
        ) {
            let policy = DetailPolicy {
                max_detail_generations_per_session: limit,
                ..DetailPolicy::default()
            };
            let kinds = [
                ActionKind::RegenerateOverview,
                ActionKind::ExpandOverview,
                ActionKind::GenerateDetail,
                ActionKind::ExpandDetail,
            ];
            let mut gate = SessionGate::new();
            let mut now = 0u64;
            for (index, kind, step) in actions {
                now += step;
                let before = gate.detail_gen_count();
                let admitted = gate.admit(index, kinds[kind as usize], now, &policy).is_ok();
                prop_assert!(gate.detail_gen_count() <= limit);
                if !admitted {
                    prop_assert_eq!(gate.detail_gen_count(), before);
                }
            }
        }
    }
}
