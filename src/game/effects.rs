//! Item resolution engine
//!
//! [`resolve_effect`] is a pure function from (effect, user, roster
//! snapshot, rng) to an [`EffectResolution`]: the star deltas and flag
//! changes the effect wants, plus what happened for display. Nothing is
//! mutated until [`apply_resolution`] pushes the batch through
//! [`Roster::apply_delta`], one call per touched student.

use crate::core::{EffectKind, StudentId};
use crate::game::{FlagChange, ImmunityChange, Roster, RosterChange};
use crate::Result;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Chance that Chain Lightning strikes the node it is on
pub const CHAIN_HIT_CHANCE: f64 = 0.5;
/// Jumps after the origin; at most `MAX_CHAIN_JUMPS + 1` nodes are visited
pub const MAX_CHAIN_JUMPS: usize = 3;
pub const CHAIN_LIGHTNING_PENALTY: i32 = 2;

/// Mana Drain steals this much when the target can afford it
pub const MANA_DRAIN_AMOUNT: i32 = 2;
pub const MANA_DRAIN_BACKLASH: i32 = 1;

pub const STEALTH_CLOAK_TURNS: u32 = 3;
pub const SANCTUARY_TURNS: u32 = 1;

pub const ABYSSAL_GAZE_CHANCE: f64 = 0.3;
pub const ABYSSAL_GAZE_REWARD: i32 = 3;

pub const ANGEL_CHANCE: f64 = 0.1;
pub const ANGEL_REWARD: i32 = 10;
pub const DEVIL_PENALTY: i32 = 1;

/// Who is using the card, and who (if anyone) is currently drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectContext {
    pub user: StudentId,
    pub active_draw: Option<StudentId>,
}

impl EffectContext {
    pub fn new(user: StudentId) -> Self {
        EffectContext {
            user,
            active_draw: None,
        }
    }

    pub fn with_active_draw(mut self, drawn: Option<StudentId>) -> Self {
        self.active_draw = drawn;
        self
    }
}

/// One stop of a Chain Lightning walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainNode {
    pub student: StudentId,
    pub hit: bool,
}

/// The full walk, computed once per trigger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainPath {
    nodes: SmallVec<[ChainNode; 4]>,
}

impl ChainPath {
    pub fn nodes(&self) -> &[ChainNode] {
        &self.nodes
    }

    /// The student the bolt landed on, if any node hit
    pub fn struck(&self) -> Option<StudentId> {
        self.nodes.iter().find(|n| n.hit).map(|n| n.student)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// What an effect did, for logs and display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectOutcome {
    /// Deterministic changes only; see the delta batch
    Applied,
    /// Cosmetic protection, nothing changes
    Shielded,
    /// The active draw moves to another student
    Retargeted { from: Option<StudentId>, to: StudentId },
    /// The effect needed another student and there was none
    NoTarget,
    ShadowRaid { victim: StudentId },
    BerserkerTrial { winner: StudentId },
    ManaDrain { target: StudentId, drained: bool },
    RoyalPk {
        opponent: StudentId,
        user_stars: i32,
        opponent_stars: i32,
        won: bool,
    },
    AbyssalGaze { success: bool },
    DestinyRoulette { angel: bool },
    ChainLightning(ChainPath),
    /// Unrecognized card, consumed with no effect
    Inert,
}

/// Star change for one student inside a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarDelta {
    pub student: StudentId,
    pub delta: i32,
}

/// Everything one effect wants to change, not yet applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectResolution {
    pub effect: EffectKind,
    pub context: EffectContext,
    pub star_deltas: SmallVec<[StarDelta; 4]>,
    pub flag_changes: SmallVec<[(StudentId, FlagChange); 4]>,
    /// New target for the active draw (Mark Target)
    pub retarget: Option<StudentId>,
    pub outcome: EffectOutcome,
    /// Whether the triggering inventory record is used up
    pub consumed: bool,
}

impl EffectResolution {
    fn new(effect: EffectKind, context: EffectContext) -> Self {
        EffectResolution {
            effect,
            context,
            star_deltas: SmallVec::new(),
            flag_changes: SmallVec::new(),
            retarget: None,
            outcome: EffectOutcome::Applied,
            consumed: true,
        }
    }

    /// Accumulate a star delta; repeated students are merged
    fn add_stars(&mut self, student: StudentId, delta: i32) {
        match self.star_deltas.iter_mut().find(|d| d.student == student) {
            Some(existing) => existing.delta = existing.delta.saturating_add(delta),
            None => self.star_deltas.push(StarDelta { student, delta }),
        }
    }

    fn set_flags(&mut self, student: StudentId, change: FlagChange) {
        match self.flag_changes.iter_mut().find(|(id, _)| *id == student) {
            Some((_, existing)) => {
                if change.is_cursed.is_some() {
                    existing.is_cursed = change.is_cursed;
                }
                if change.immunity.is_some() {
                    existing.immunity = change.immunity;
                }
            }
            None => self.flag_changes.push((student, change)),
        }
    }

    fn with_outcome(mut self, outcome: EffectOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    /// Net star delta requested for a student (0 if untouched)
    pub fn delta_for(&self, student: StudentId) -> i32 {
        self.star_deltas
            .iter()
            .filter(|d| d.student == student)
            .map(|d| d.delta)
            .sum()
    }

    pub fn flags_for(&self, student: StudentId) -> Option<FlagChange> {
        self.flag_changes
            .iter()
            .find(|(id, _)| *id == student)
            .map(|(_, change)| *change)
    }

    /// Every student the batch touches, stars first, without duplicates
    pub fn touched(&self) -> Vec<StudentId> {
        let mut ids: Vec<StudentId> = Vec::new();
        let all = self
            .star_deltas
            .iter()
            .map(|d| d.student)
            .chain(self.flag_changes.iter().map(|(id, _)| *id));
        for id in all {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }

    pub fn is_noop(&self) -> bool {
        self.retarget.is_none()
            && self.star_deltas.iter().all(|d| d.delta == 0)
            && self.flag_changes.iter().all(|(_, f)| f.is_empty())
    }

    /// One-line description for logs and the CLI
    pub fn summary(&self, roster: &Roster) -> String {
        let user = roster.name_of(self.context.user);
        let detail = match &self.outcome {
            EffectOutcome::Applied => {
                let stars = self
                    .star_deltas
                    .iter()
                    .filter(|d| d.delta != 0)
                    .map(|d| format!("{} {:+}", roster.name_of(d.student), d.delta));
                let flags = self.flag_changes.iter().flat_map(|(id, change)| {
                    let name = roster.name_of(*id);
                    let curse = change.is_cursed.map(|cursed| {
                        if cursed {
                            format!("{name} cursed")
                        } else {
                            format!("{name} purified")
                        }
                    });
                    let immunity = change.immunity.map(|imm| match imm {
                        ImmunityChange::Set(n) => format!("{name} immune for {n}"),
                        ImmunityChange::AtLeast(n) => format!("{name} immune for at least {n}"),
                    });
                    curse.into_iter().chain(immunity)
                });
                let parts: Vec<String> = stars.chain(flags).collect();
                if parts.is_empty() {
                    "no star changes".to_string()
                } else {
                    parts.join(", ")
                }
            }
            EffectOutcome::Shielded => "shield raised".to_string(),
            EffectOutcome::Retargeted { to, .. } => format!("target moved to {}", roster.name_of(*to)),
            EffectOutcome::NoTarget => "no one to target".to_string(),
            EffectOutcome::ShadowRaid { victim } => format!("{} loses 1", roster.name_of(*victim)),
            EffectOutcome::BerserkerTrial { winner } => format!("{} gains 1", roster.name_of(*winner)),
            EffectOutcome::ManaDrain { target, drained: true } => {
                format!("drained {MANA_DRAIN_AMOUNT} from {}", roster.name_of(*target))
            }
            EffectOutcome::ManaDrain { target, drained: false } => {
                format!("{} was too poor, backlash -{MANA_DRAIN_BACKLASH}", roster.name_of(*target))
            }
            EffectOutcome::RoyalPk {
                opponent,
                user_stars,
                opponent_stars,
                won,
            } => format!(
                "{user_stars} vs {opponent_stars} against {}: {}",
                roster.name_of(*opponent),
                if *won { "won +1" } else { "no gain" }
            ),
            EffectOutcome::AbyssalGaze { success: true } => format!("gaze returned +{ABYSSAL_GAZE_REWARD}"),
            EffectOutcome::AbyssalGaze { success: false } => "stars reset to 0".to_string(),
            EffectOutcome::DestinyRoulette { angel: true } => format!("angel +{ANGEL_REWARD}"),
            EffectOutcome::DestinyRoulette { angel: false } => format!("devil -{DEVIL_PENALTY}"),
            EffectOutcome::ChainLightning(path) => {
                let hops: Vec<String> = path
                    .nodes()
                    .iter()
                    .map(|n| {
                        let mark = if n.hit { "HIT" } else { "miss" };
                        format!("{} ({mark})", roster.name_of(n.student))
                    })
                    .collect();
                hops.join(" -> ")
            }
            EffectOutcome::Inert => "nothing happens".to_string(),
        };
        format!("{user} used {}: {detail}", self.effect)
    }
}

/// Result of pushing a batch into the roster
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppliedEffect {
    pub changes: Vec<RosterChange>,
    /// Students that vanished between resolution and application
    pub skipped: Vec<StudentId>,
}

/// Work out what `effect` does when `context.user` plays it
///
/// Reads the roster only. Fails if the user is not on the roster.
pub fn resolve_effect<R: Rng + ?Sized>(
    effect: EffectKind,
    context: EffectContext,
    roster: &Roster,
    rng: &mut R,
) -> Result<EffectResolution> {
    let user = roster.get(context.user)?;
    let user_id = user.id;
    let user_stars = user.stars();
    let mut res = EffectResolution::new(effect, context);

    let res = match effect {
        EffectKind::Shield => res.with_outcome(EffectOutcome::Shielded),

        EffectKind::MarkTarget => {
            let current = context.active_draw.unwrap_or(user_id);
            match pick(&roster.others(&[current]), rng) {
                Some(to) => {
                    res.retarget = Some(to);
                    res.with_outcome(EffectOutcome::Retargeted {
                        from: context.active_draw,
                        to,
                    })
                }
                None => res.with_outcome(EffectOutcome::NoTarget),
            }
        }

        EffectKind::ExpPotion => {
            res.add_stars(user_id, 1);
            res
        }

        EffectKind::OneManGuard => {
            res.add_stars(user_id, -1);
            res
        }

        EffectKind::MassSilence => {
            for id in roster.dormmates(user_id)? {
                res.add_stars(id, -1);
            }
            res
        }

        EffectKind::LegionGlory => {
            for id in roster.dormmates(user_id)? {
                res.add_stars(id, 1);
            }
            res
        }

        EffectKind::Doomsday => {
            for id in roster.ids() {
                res.add_stars(*id, -1);
            }
            res
        }

        EffectKind::UniversalSalvation => {
            for id in roster.ids() {
                res.add_stars(*id, 1);
            }
            res
        }

        EffectKind::ShadowRaid => match pick(roster.ids(), rng) {
            Some(victim) => {
                res.add_stars(victim, -1);
                res.with_outcome(EffectOutcome::ShadowRaid { victim })
            }
            None => res.with_outcome(EffectOutcome::NoTarget),
        },

        EffectKind::BerserkerTrial => match pick(roster.ids(), rng) {
            Some(winner) => {
                res.add_stars(winner, 1);
                res.with_outcome(EffectOutcome::BerserkerTrial { winner })
            }
            None => res.with_outcome(EffectOutcome::NoTarget),
        },

        EffectKind::ManaDrain => match pick(&roster.others(&[user_id]), rng) {
            Some(target) => {
                let drained = roster.get(target)?.stars() >= MANA_DRAIN_AMOUNT;
                if drained {
                    res.add_stars(target, -MANA_DRAIN_AMOUNT);
                    res.add_stars(user_id, MANA_DRAIN_AMOUNT);
                } else {
                    res.add_stars(user_id, -MANA_DRAIN_BACKLASH);
                }
                res.with_outcome(EffectOutcome::ManaDrain { target, drained })
            }
            None => res.with_outcome(EffectOutcome::NoTarget),
        },

        EffectKind::StealthCloak => {
            res.set_flags(
                user_id,
                FlagChange::immunity(ImmunityChange::Set(STEALTH_CLOAK_TURNS)),
            );
            res
        }

        EffectKind::Sanctuary => {
            for id in roster.dormmates(user_id)? {
                res.set_flags(id, FlagChange::immunity(ImmunityChange::AtLeast(SANCTUARY_TURNS)));
            }
            res
        }

        EffectKind::DarkCurse => {
            res.set_flags(user_id, FlagChange::curse(true));
            res
        }

        EffectKind::Purification => {
            res.set_flags(user_id, FlagChange::curse(false));
            if user_stars < 0 {
                res.add_stars(user_id, user_stars.saturating_neg());
            }
            res
        }

        EffectKind::AbyssalGaze => {
            let success = rng.gen_bool(ABYSSAL_GAZE_CHANCE);
            if success {
                res.add_stars(user_id, ABYSSAL_GAZE_REWARD);
            } else {
                res.add_stars(user_id, user_stars.saturating_neg());
            }
            res.with_outcome(EffectOutcome::AbyssalGaze { success })
        }

        EffectKind::RoyalPk => match pick(&roster.others(&[user_id]), rng) {
            Some(opponent) => {
                let opponent_stars = roster.get(opponent)?.stars();
                let won = user_stars > opponent_stars;
                if won {
                    res.add_stars(user_id, 1);
                }
                res.with_outcome(EffectOutcome::RoyalPk {
                    opponent,
                    user_stars,
                    opponent_stars,
                    won,
                })
            }
            None => res.with_outcome(EffectOutcome::NoTarget),
        },

        EffectKind::DestinyRoulette => {
            let angel = rng.gen_bool(ANGEL_CHANCE);
            if angel {
                res.add_stars(user_id, ANGEL_REWARD);
            } else {
                res.add_stars(user_id, -DEVIL_PENALTY);
            }
            res.with_outcome(EffectOutcome::DestinyRoulette { angel })
        }

        EffectKind::ChainLightning => {
            let origin = context.active_draw.unwrap_or(user_id);
            let path = walk_chain(origin, roster, rng);
            if let Some(struck) = path.struck() {
                res.add_stars(struck, -CHAIN_LIGHTNING_PENALTY);
            }
            res.with_outcome(EffectOutcome::ChainLightning(path))
        }

        EffectKind::Inert => res.with_outcome(EffectOutcome::Inert),
    };

    Ok(res)
}

/// Walk Chain Lightning from `origin`
///
/// Each node flips a coin; a hit ends the walk. A miss jumps to a random
/// unvisited student, at most [`MAX_CHAIN_JUMPS`] times. The walk also ends
/// when nobody is left to jump to.
pub fn walk_chain<R: Rng + ?Sized>(origin: StudentId, roster: &Roster, rng: &mut R) -> ChainPath {
    let mut path = ChainPath::default();
    let mut current = origin;

    loop {
        let hit = rng.gen_bool(CHAIN_HIT_CHANCE);
        path.nodes.push(ChainNode {
            student: current,
            hit,
        });
        if hit || path.nodes.len() > MAX_CHAIN_JUMPS {
            break;
        }

        let visited: SmallVec<[StudentId; 4]> = path.nodes.iter().map(|n| n.student).collect();
        match pick(&roster.others(&visited), rng) {
            Some(next) => current = next,
            None => break,
        }
    }

    path
}

/// Push a resolved batch through the roster store
///
/// Best-effort: a student missing from the roster is skipped and the rest
/// of the batch still lands. Nothing already applied is rolled back.
pub fn apply_resolution(roster: &mut Roster, resolution: &EffectResolution) -> AppliedEffect {
    let mut applied = AppliedEffect::default();
    for student in resolution.touched() {
        let delta = resolution.delta_for(student);
        let flags = resolution.flags_for(student).unwrap_or_default();
        match roster.apply_delta(student, delta, flags) {
            Ok(change) => applied.changes.push(change),
            Err(_) => applied.skipped.push(student),
        }
    }
    applied
}

fn pick<R: Rng + ?Sized>(ids: &[StudentId], rng: &mut R) -> Option<StudentId> {
    ids.choose(rng).copied()
}
