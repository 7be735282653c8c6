//! Initiative clock.
//!
//! A pure function of `(snapshot, now, offset)`: no background ticking, no
//! stored timers. Clients and servers evaluate the same formula against the
//! same snapshot and agree on who may act.
//!
//! Usable action points at instant `t`:
//!
//! ```text
//! usable = action_points - stun_reduction - floor(elapsed_secs * depletion_rate)
//! ```
//!
//! where `elapsed_secs` is measured from `round_start_at`. The round advances
//! when its time ceiling elapses or no standing participant can afford the
//! cheapest action. A round change refills every standing participant to the
//! maximum.
//!
//! Initiative sticks with the stored `active_user_id` while it can afford the
//! cheapest action, then passes to the next able participant in cyclic index
//! order. A round that times out is forfeited by whoever held it at its last
//! instant, so an idle participant never keeps the others waiting for more
//! than one round. A round opened because everyone is spent starts at index 0.

use crate::config::ClockConfig;
use crate::effect::stun_reduction;
use crate::state::{Battle, ParticipantId, Timestamp};

/// Usable action points of one participant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UsableActionPoints {
    pub participant: ParticipantId,
    pub action_points: u32,
}

/// Clock evaluation result.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Initiative {
    /// Skew-corrected instant the evaluation refers to.
    pub evaluated_at: Timestamp,
    pub round: u32,
    pub round_start_at: Timestamp,
    /// True when the stored round is over and a round change is due.
    pub advanced: bool,
    /// Participant holding initiative. See [`evaluate`] for how it passes.
    pub active: Option<ParticipantId>,
    /// Per participant, in snapshot order. Participants out of the fight hold 0.
    pub usable: Vec<UsableActionPoints>,
    pub round_ends_at: Timestamp,
}

impl Initiative {
    pub fn usable_for(&self, id: ParticipantId) -> u32 {
        self.usable
            .iter()
            .find(|u| u.participant == id)
            .map(|u| u.action_points)
            .unwrap_or(0)
    }

    pub fn is_active(&self, id: ParticipantId) -> bool {
        self.active == Some(id)
    }

    /// Milliseconds until the round ceiling, never negative.
    pub fn remaining_ms(&self) -> i64 {
        self.round_ends_at.millis_since(self.evaluated_at).max(0)
    }
}

/// Evaluates the clock at `now`, corrected by `offset_ms` (the caller's
/// measured skew: a client running ahead passes a positive offset).
pub fn evaluate(battle: &Battle, now: Timestamp, offset_ms: i64, config: &ClockConfig) -> Initiative {
    let synced = now.offset_by(-offset_ms);
    let elapsed = synced.millis_since(battle.round_start_at).max(0);
    let current = usable_at(battle, elapsed, config);

    let anyone_standing = battle.users_state.iter().any(|p| p.is_standing());
    let anyone_can_act = current
        .iter()
        .any(|u| u.action_points >= config.min_action_cost);
    let timed_out = config.round_duration_ms > 0 && elapsed >= config.round_duration_ms;
    let advanced = anyone_standing && (timed_out || !anyone_can_act);

    if !advanced {
        let active = select(&current, battle.active_user_id, config.min_action_cost);
        return Initiative {
            evaluated_at: synced,
            round: battle.round,
            round_start_at: battle.round_start_at,
            advanced,
            active,
            round_ends_at: battle.round_start_at.offset_by(config.round_duration_ms),
            usable: current,
        };
    }

    let refilled: Vec<UsableActionPoints> = battle
        .users_state
        .iter()
        .map(|p| UsableActionPoints {
            participant: p.id,
            action_points: if p.is_standing() {
                config
                    .max_action_points
                    .saturating_sub(stun_reduction(battle, p.id, true))
            } else {
                0
            },
        })
        .collect();

    let (round_start_at, active) = if timed_out {
        // The holder at the round's last instant forfeits, and so does the
        // holder of every further round that elapsed without a commit.
        let last_instant = usable_at(battle, config.round_duration_ms - 1, config);
        let holder = select(&last_instant, battle.active_user_id, config.min_action_cost);
        let elapsed_rounds = elapsed / config.round_duration_ms;
        (
            battle
                .round_start_at
                .offset_by(elapsed_rounds.saturating_mul(config.round_duration_ms)),
            rotate(&refilled, holder, elapsed_rounds, config.min_action_cost),
        )
    } else {
        // everyone is spent: a fresh round opens in index order
        (synced, select(&refilled, None, config.min_action_cost))
    };

    Initiative {
        evaluated_at: synced,
        round: battle.round + 1,
        round_start_at,
        advanced,
        active,
        usable: refilled,
        round_ends_at: round_start_at.offset_by(config.round_duration_ms),
    }
}

/// Usable points of every participant `elapsed_ms` into the stored round.
fn usable_at(battle: &Battle, elapsed_ms: i64, config: &ClockConfig) -> Vec<UsableActionPoints> {
    let depletion = depletion(elapsed_ms, config);
    battle
        .users_state
        .iter()
        .map(|p| {
            let action_points = if p.is_standing() {
                p.action_points
                    .saturating_sub(stun_reduction(battle, p.id, false))
                    .saturating_sub(depletion)
            } else {
                0
            };
            UsableActionPoints {
                participant: p.id,
                action_points,
            }
        })
        .collect()
}

/// The holder keeps initiative while it can afford the cheapest action.
/// Otherwise the next able participant after it, in cyclic index order,
/// takes over. Without a holder the search starts at index 0.
fn select(
    usable: &[UsableActionPoints],
    holder: Option<ParticipantId>,
    min_cost: u32,
) -> Option<ParticipantId> {
    let able = |u: &&UsableActionPoints| u.action_points >= min_cost;
    let Some(index) = holder.and_then(|id| usable.iter().position(|u| u.participant == id)) else {
        return usable.iter().find(able).map(|u| u.participant);
    };
    if usable[index].action_points >= min_cost {
        return Some(usable[index].participant);
    }
    usable[index + 1..]
        .iter()
        .chain(&usable[..index])
        .find(able)
        .map(|u| u.participant)
}

/// Passes initiative `steps` times along the able participants, starting
/// after `holder`.
fn rotate(
    usable: &[UsableActionPoints],
    holder: Option<ParticipantId>,
    steps: i64,
    min_cost: u32,
) -> Option<ParticipantId> {
    let able: Vec<usize> = usable
        .iter()
        .enumerate()
        .filter(|(_, u)| u.action_points >= min_cost)
        .map(|(index, _)| index)
        .collect();
    if able.is_empty() {
        return None;
    }
    let Some(holder_index) = holder.and_then(|id| usable.iter().position(|u| u.participant == id))
    else {
        return Some(usable[able[0]].participant);
    };
    // first able slot strictly after the holder, wrapping around
    let next = able
        .iter()
        .position(|&index| index > holder_index)
        .unwrap_or(0);
    let steps = usize::try_from((steps - 1).max(0)).unwrap_or(usize::MAX) % able.len();
    Some(usable[able[(next + steps) % able.len()]].participant)
}

fn depletion(elapsed_ms: i64, config: &ClockConfig) -> u32 {
    let drained = (elapsed_ms as f64 / 1_000.0 * config.ap_depletion_per_second).floor();
    if drained <= 0.0 {
        0
    } else if drained >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        drained as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ContentRef;
    use crate::effect::EffectKind;
    use crate::state::{BattleId, BattleType, Battlefield, Participant, Position, Team, UserEffect};

    fn battle() -> Battle {
        let participants = vec![
            Participant::new(ParticipantId(1), "A", Team(1), Position::new(0, 0)),
            Participant::new(ParticipantId(2), "B", Team(2), Position::new(1, 0)),
            Participant::new(ParticipantId(3), "C", Team(2), Position::new(2, 0)),
        ];
        Battle::new(BattleId(1), BattleType::Arena, Battlefield::default(), participants, Timestamp(0))
            .expect("valid battle")
    }

    fn config() -> ClockConfig {
        ClockConfig::new()
            .with_round_duration_ms(40_000)
            .with_ap_depletion_per_second(1.0)
            .with_min_action_cost(30)
    }

    fn stun(target: u32, power: u32, rounds: u32) -> UserEffect {
        UserEffect {
            source: ParticipantId(2),
            target: ParticipantId(target),
            origin: ContentRef::basic("stun"),
            kind: EffectKind::Stun { power },
            magnitude: f64::from(power),
            rounds,
            created_round: 1,
        }
    }

    #[test]
    fn first_participant_in_index_order_acts_first() {
        let initiative = evaluate(&battle(), Timestamp(0), 0, &config());
        assert_eq!(initiative.active, Some(ParticipantId(1)));
        assert!(!initiative.advanced);
        assert_eq!(initiative.usable_for(ParticipantId(2)), 100);
    }

    #[test]
    fn exhausted_participant_hands_over_initiative() {
        let mut battle = battle();
        battle.users_state[0].action_points = 20;
        let initiative = evaluate(&battle, Timestamp(0), 0, &config());
        assert_eq!(initiative.active, Some(ParticipantId(2)));
    }

    #[test]
    fn action_points_deplete_with_elapsed_time() {
        let initiative = evaluate(&battle(), Timestamp(12_500), 0, &config());
        assert_eq!(initiative.usable_for(ParticipantId(1)), 88);
        assert_eq!(initiative.remaining_ms(), 27_500);
    }

    #[test]
    fn round_advances_after_time_ceiling() {
        let initiative = evaluate(&battle(), Timestamp(40_000), 0, &config());
        assert!(initiative.advanced);
        assert_eq!(initiative.round, 2);
        assert_eq!(initiative.round_start_at, Timestamp(40_000));
        assert_eq!(initiative.usable_for(ParticipantId(1)), 100);
    }

    #[test]
    fn round_advances_when_everyone_is_exhausted() {
        let mut battle = battle();
        for p in &mut battle.users_state {
            p.action_points = 10;
        }
        let initiative = evaluate(&battle, Timestamp(1_000), 0, &config());
        assert!(initiative.advanced);
        assert_eq!(initiative.active, Some(ParticipantId(1)));
    }

    #[test]
    fn stun_lowers_usable_points() {
        let mut battle = battle();
        battle.users_effects.push(stun(1, 80, 2));
        let initiative = evaluate(&battle, Timestamp(0), 0, &config());
        assert_eq!(initiative.usable_for(ParticipantId(1)), 20);
        assert_eq!(initiative.active, Some(ParticipantId(2)));
    }

    #[test]
    fn expiring_stun_does_not_survive_round_change() {
        let mut battle = battle();
        battle.users_effects.push(stun(1, 80, 1));
        let initiative = evaluate(&battle, Timestamp(40_000), 0, &config());
        assert!(initiative.advanced);
        assert_eq!(initiative.usable_for(ParticipantId(1)), 100);
    }

    #[test]
    fn offset_corrects_client_skew() {
        let battle = battle();
        // client clock 5s ahead of the server
        let client = evaluate(&battle, Timestamp(15_000), 5_000, &config());
        let server = evaluate(&battle, Timestamp(10_000), 0, &config());
        assert_eq!(client, server);
    }

    #[test]
    fn instants_before_round_start_do_not_regenerate() {
        let mut battle = battle();
        battle.round_start_at = Timestamp(50_000);
        let initiative = evaluate(&battle, Timestamp(10_000), 0, &config());
        assert_eq!(initiative.usable_for(ParticipantId(1)), 100);
        assert!(!initiative.advanced);
    }

    #[test]
    fn knocked_out_participants_are_skipped() {
        let mut battle = battle();
        battle.users_state[0].pools.health.drain(1_000);
        let initiative = evaluate(&battle, Timestamp(0), 0, &config());
        assert_eq!(initiative.active, Some(ParticipantId(2)));
        assert_eq!(initiative.usable_for(ParticipantId(1)), 0);
    }

    #[test]
    fn idle_holder_forfeits_a_timed_out_round() {
        let mut battle = battle();
        battle.users_state.truncate(2);
        // A never acts; B gets the round after each one A lets run out
        let second = evaluate(&battle, Timestamp(40_000), 0, &config());
        assert!(second.advanced);
        assert_eq!(second.active, Some(ParticipantId(2)));
        assert_eq!(second.round_start_at, Timestamp(40_000));

        let third = evaluate(&battle, Timestamp(85_000), 0, &config());
        assert_eq!(third.active, Some(ParticipantId(1)));
        assert_eq!(third.round_start_at, Timestamp(80_000));
        assert_eq!(third.remaining_ms(), 35_000);

        let fourth = evaluate(&battle, Timestamp(120_500), 0, &config());
        assert_eq!(fourth.active, Some(ParticipantId(2)));
        // idle rounds collapse into a single round change
        assert_eq!(fourth.round, 2);
    }

    #[test]
    fn idle_participants_cannot_starve_the_last_one() {
        let battle = battle();
        let actives: Vec<_> = [40_000, 80_000, 120_000, 160_000]
            .into_iter()
            .map(|t| evaluate(&battle, Timestamp(t), 0, &config()).active)
            .collect();
        assert_eq!(
            actives,
            vec![
                Some(ParticipantId(2)),
                Some(ParticipantId(3)),
                Some(ParticipantId(1)),
                Some(ParticipantId(2)),
            ]
        );
    }

    #[test]
    fn holder_keeps_initiative_while_it_can_act() {
        let mut battle = battle();
        battle.active_user_id = Some(ParticipantId(3));
        let initiative = evaluate(&battle, Timestamp(0), 0, &config());
        assert_eq!(initiative.active, Some(ParticipantId(3)));

        battle.users_state[2].action_points = 10;
        let initiative = evaluate(&battle, Timestamp(0), 0, &config());
        // wraps around to index 0
        assert_eq!(initiative.active, Some(ParticipantId(1)));
    }

    #[test]
    fn spent_holder_still_forfeits_to_the_next_in_line() {
        let mut battle = battle();
        battle.users_state[0].action_points = 30;
        // A is spent by the end of the round, so B held it last
        let initiative = evaluate(&battle, Timestamp(40_000), 0, &config());
        assert_eq!(initiative.active, Some(ParticipantId(3)));
    }

    #[test]
    fn evaluation_is_pure() {
        let battle = battle();
        let before = battle.clone();
        let first = evaluate(&battle, Timestamp(22_222), 123, &config());
        let second = evaluate(&battle, Timestamp(22_222), 123, &config());
        assert_eq!(first, second);
        assert_eq!(battle, before);
    }
}
