//! Admission and completion rules for groups in formation.

use crate::models::matchmaking::{FormingGroup, PlayerEntry, Team};

/// Seconds after which a queued player lets anyone into their group.
pub const STARVATION_SECS: i64 = 30;
pub const LEVEL_TOLERANCE: i64 = 10;
pub const MMR_TOLERANCE: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accept(Team),
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchState {
    NeedsMorePlayers,
    Complete,
}

/// Whether `candidate` may join `group`. Rules in order, first match wins:
/// empty group, someone waited [`STARVATION_SECS`], then a similarity gate on
/// the integer mean level and mmr of the players already in the group.
pub fn is_admissible(candidate: &PlayerEntry, group: &FormingGroup) -> bool {
    let others: Vec<&PlayerEntry> = group
        .players
        .iter()
        .filter(|p| p.account_id != candidate.account_id)
        .collect();

    if others.is_empty() {
        return true;
    }

    if others.iter().any(|p| p.elapsed_time >= STARVATION_SECS) {
        return true;
    }

    // level and mmr come from the client; widen so any i64 sums without overflow
    let count = others.len() as i128;
    let avg_level = others
        .iter()
        .map(|p| i128::from(p.user_data.level))
        .sum::<i128>()
        / count;
    let avg_mmr = others
        .iter()
        .map(|p| i128::from(p.user_data.mmr_score))
        .sum::<i128>()
        / count;

    within(candidate.user_data.level, avg_level, LEVEL_TOLERANCE)
        && within(candidate.user_data.mmr_score, avg_mmr, MMR_TOLERANCE)
}

fn within(value: i64, average: i128, tolerance: i64) -> bool {
    (i128::from(value) - average).abs() < i128::from(tolerance)
}

/// Runs the admission rules and, on acceptance, places the candidate on a
/// team. The caller appends the candidate to `group.players`.
pub fn admit(candidate: &PlayerEntry, group: &mut FormingGroup) -> Admission {
    if !is_admissible(candidate, group) {
        return Admission::Reject;
    }
    Admission::Accept(group.team_context.assign(&candidate.account_id))
}

pub fn check_complete(group: &FormingGroup) -> MatchState {
    if group.players.len() == group.match_type.capacity() {
        MatchState::Complete
    } else {
        MatchState::NeedsMorePlayers
    }
}
