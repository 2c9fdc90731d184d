//! XP ledger: converts XP deltas into level / xp-in-level / total triples.
//!
//! Levels follow a flat curve. Every level spans [`XP_PER_LEVEL`] points, so
//! a user leaves level `n` once their cumulative total reaches
//! `level_threshold(n) = n * 100`.

use crate::error::CoreError;
use crate::events::UnlockEvent;
use crate::progress::UserProgressState;
use crate::types::Xp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// XP spanned by a single level.
pub const XP_PER_LEVEL: Xp = 100;

// ---------------------------------------------------------------------------
// Level arithmetic
// ---------------------------------------------------------------------------

/// Cumulative total XP at which a user advances out of `level`.
pub fn level_threshold(level: i32) -> Xp {
    Xp::from(level) * XP_PER_LEVEL
}

/// Level reached with `total_xp` accumulated points.
pub fn level_for_total(total_xp: Xp) -> i32 {
    let level = total_xp / XP_PER_LEVEL + 1;
    i32::try_from(level).unwrap_or(i32::MAX)
}

/// Points earned inside the current level.
pub fn xp_in_level_for_total(total_xp: Xp) -> Xp {
    total_xp % XP_PER_LEVEL
}

/// Points still needed to reach the next level.
pub fn xp_to_next_level(state: &UserProgressState) -> Xp {
    level_threshold(state.level) - state.total_xp
}

/// Percentage (0-100) of the current level already earned.
pub fn level_progress_pct(state: &UserProgressState) -> u8 {
    (state.xp_in_level * 100 / XP_PER_LEVEL).clamp(0, 100) as u8
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Grant `delta` XP to a user.
///
/// Emits one `XpGranted` event followed by one `LevelUp` per level crossed,
/// in ascending order. Negative deltas, and deltas that would overflow the
/// total, are rejected with [`CoreError::InvalidDelta`].
pub fn apply_xp(
    state: &UserProgressState,
    delta: Xp,
) -> Result<(UserProgressState, Vec<UnlockEvent>), CoreError> {
    if delta < 0 {
        return Err(CoreError::InvalidDelta(delta));
    }
    let total_xp = state
        .total_xp
        .checked_add(delta)
        .ok_or(CoreError::InvalidDelta(delta))?;

    let mut next = state.clone();
    next.total_xp = total_xp;
    next.level = level_for_total(total_xp);
    next.xp_in_level = xp_in_level_for_total(total_xp);

    let mut events = vec![UnlockEvent::XpGranted {
        delta,
        total_xp,
        level: next.level,
        xp_in_level: next.xp_in_level,
    }];
    if next.level > state.level {
        events.extend((state.level + 1..=next.level).map(|level| UnlockEvent::LevelUp { level }));
    }

    Ok((next, events))
}
