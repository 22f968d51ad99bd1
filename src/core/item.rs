//! Item cards, inventory records and effect kinds

use crate::core::{CardName, Entity, EntityId, StudentId};
use crate::{GachaError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type ItemCardId = EntityId<ItemCard>;
pub type StudentItemId = EntityId<StudentItem>;

/// Which draw pool a card belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolType {
    /// Drawn after a correct answer
    #[default]
    Normal,
    /// Drawn after an incorrect answer
    Negative,
}

impl fmt::Display for PoolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolType::Normal => write!(f, "normal"),
            PoolType::Negative => write!(f, "negative"),
        }
    }
}

impl FromStr for PoolType {
    type Err = GachaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "normal" | "1" => Ok(PoolType::Normal),
            "negative" | "0" => Ok(PoolType::Negative),
            other => Err(GachaError::ParseError(format!(
                "unknown pool type '{other}' (expected normal or negative)"
            ))),
        }
    }
}

/// Stable tag naming what a card does when used
///
/// Effects are dispatched on this tag, never on the card's display name.
/// Unknown tags in data files deserialize as [`EffectKind::Inert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Shield,
    MarkTarget,
    ExpPotion,
    MassSilence,
    Doomsday,
    LegionGlory,
    ShadowRaid,
    BerserkerTrial,
    ManaDrain,
    StealthCloak,
    Sanctuary,
    UniversalSalvation,
    DarkCurse,
    Purification,
    AbyssalGaze,
    OneManGuard,
    RoyalPk,
    DestinyRoulette,
    ChainLightning,
    /// No effect; the card is simply consumed
    #[serde(other)]
    Inert,
}

impl EffectKind {
    /// Every effect with a real policy (excludes `Inert`)
    pub const ALL: [EffectKind; 19] = [
        EffectKind::Shield,
        EffectKind::MarkTarget,
        EffectKind::ExpPotion,
        EffectKind::MassSilence,
        EffectKind::Doomsday,
        EffectKind::LegionGlory,
        EffectKind::ShadowRaid,
        EffectKind::BerserkerTrial,
        EffectKind::ManaDrain,
        EffectKind::StealthCloak,
        EffectKind::Sanctuary,
        EffectKind::UniversalSalvation,
        EffectKind::DarkCurse,
        EffectKind::Purification,
        EffectKind::AbyssalGaze,
        EffectKind::OneManGuard,
        EffectKind::RoyalPk,
        EffectKind::DestinyRoulette,
        EffectKind::ChainLightning,
    ];

    /// Pool the card is seeded into by default
    pub fn default_pool(&self) -> PoolType {
        match self {
            EffectKind::MassSilence
            | EffectKind::Doomsday
            | EffectKind::DarkCurse
            | EffectKind::OneManGuard
            | EffectKind::ChainLightning => PoolType::Negative,
            _ => PoolType::Normal,
        }
    }

    /// English name, used in logs and the CLI
    pub fn english_name(&self) -> &'static str {
        match self {
            EffectKind::Shield => "Shield",
            EffectKind::MarkTarget => "Mark Target",
            EffectKind::ExpPotion => "Exp Potion",
            EffectKind::MassSilence => "Mass Silence",
            EffectKind::Doomsday => "Doomsday",
            EffectKind::LegionGlory => "Legion Glory",
            EffectKind::ShadowRaid => "Shadow Raid",
            EffectKind::BerserkerTrial => "Berserker Trial",
            EffectKind::ManaDrain => "Mana Drain",
            EffectKind::StealthCloak => "Stealth Cloak",
            EffectKind::Sanctuary => "Sanctuary",
            EffectKind::UniversalSalvation => "Universal Salvation",
            EffectKind::DarkCurse => "Dark Curse",
            EffectKind::Purification => "Purification",
            EffectKind::AbyssalGaze => "Abyssal Gaze",
            EffectKind::OneManGuard => "One Man Guard",
            EffectKind::RoyalPk => "Royal PK",
            EffectKind::DestinyRoulette => "Destiny Roulette",
            EffectKind::ChainLightning => "Chain Lightning",
            EffectKind::Inert => "Inert",
        }
    }

    /// Classroom display name the catalog historically used as the key
    pub fn legacy_name(&self) -> &'static str {
        match self {
            EffectKind::Shield => "绝对防御",
            EffectKind::MarkTarget => "目标锁定",
            EffectKind::ExpPotion => "经验药水",
            EffectKind::MassSilence => "群体沉默",
            EffectKind::Doomsday => "末日审判",
            EffectKind::LegionGlory => "军团荣耀",
            EffectKind::ShadowRaid => "暗影突袭",
            EffectKind::BerserkerTrial => "狂战士试炼",
            EffectKind::ManaDrain => "法力汲取",
            EffectKind::StealthCloak => "潜行斗篷",
            EffectKind::Sanctuary => "结界：庇护所",
            EffectKind::UniversalSalvation => "普渡众生",
            EffectKind::DarkCurse => "黑暗诅咒",
            EffectKind::Purification => "净化术",
            EffectKind::AbyssalGaze => "深渊凝视",
            EffectKind::OneManGuard => "一夫当关",
            EffectKind::RoyalPk => "皇城PK",
            EffectKind::DestinyRoulette => "命运轮盘",
            EffectKind::ChainLightning => "连锁闪电",
            EffectKind::Inert => "",
        }
    }

    /// Map a legacy display name (Chinese or English) to its effect
    ///
    /// Matching is exact after trimming; anything unrecognized is `Inert`.
    pub fn from_legacy_name(name: &str) -> EffectKind {
        let name = name.trim();
        EffectKind::ALL
            .iter()
            .copied()
            .find(|kind| {
                kind.legacy_name() == name || kind.english_name().eq_ignore_ascii_case(name)
            })
            .unwrap_or(EffectKind::Inert)
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.english_name())
    }
}

/// Catalog entry: immutable reference data for one kind of card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemCard {
    pub id: ItemCardId,

    /// What the card does; decoupled from the display text below
    #[serde(default = "inert")]
    pub effect: EffectKind,

    pub name: CardName,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub function_desc: String,

    #[serde(default)]
    pub image_path: String,

    #[serde(default)]
    pub pool: PoolType,

    /// Relative draw weight inside its pool
    #[serde(default = "default_probability")]
    pub probability: f64,
}

fn inert() -> EffectKind {
    EffectKind::Inert
}

fn default_probability() -> f64 {
    1.0
}

impl ItemCard {
    pub fn new(id: ItemCardId, effect: EffectKind, name: impl Into<CardName>) -> Self {
        ItemCard {
            id,
            effect,
            name: name.into(),
            description: String::new(),
            function_desc: String::new(),
            image_path: String::new(),
            pool: effect.default_pool(),
            probability: 1.0,
        }
    }

    pub fn with_pool(mut self, pool: PoolType) -> Self {
        self.pool = pool;
        self
    }

    pub fn with_probability(mut self, probability: f64) -> Self {
        self.probability = probability;
        self
    }

    /// Draw weight with unusable values treated as 1.0
    pub fn draw_weight(&self) -> f64 {
        if self.probability.is_finite() && self.probability > 0.0 {
            self.probability
        } else {
            1.0
        }
    }
}

impl Entity for ItemCard {
    fn id(&self) -> ItemCardId {
        self.id
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }
}

/// Ownership record: one single-use card in one student's inventory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentItem {
    pub id: StudentItemId,
    pub student_id: StudentId,
    pub item_card: ItemCard,
}

impl StudentItem {
    pub fn effect(&self) -> EffectKind {
        self.item_card.effect
    }
}

impl Entity for StudentItem {
    fn id(&self) -> StudentItemId {
        self.id
    }

    fn name(&self) -> &str {
        self.item_card.name.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_names_round_trip_through_lookup() {
        for kind in EffectKind::ALL {
            assert_eq!(EffectKind::from_legacy_name(kind.legacy_name()), kind);
            assert_eq!(EffectKind::from_legacy_name(kind.english_name()), kind);
        }
        assert_eq!(EffectKind::from_legacy_name("结界：庇护所 "), EffectKind::Sanctuary);
        assert_eq!(EffectKind::from_legacy_name("royal pk"), EffectKind::RoyalPk);
        assert_eq!(EffectKind::from_legacy_name("神秘卡片"), EffectKind::Inert);
        assert_eq!(EffectKind::from_legacy_name(""), EffectKind::Inert);
    }

    #[test]
    fn test_unknown_effect_tag_is_inert() {
        let kind: EffectKind = serde_json::from_str("\"time_warp\"").unwrap();
        assert_eq!(kind, EffectKind::Inert);
        let kind: EffectKind = serde_json::from_str("\"chain_lightning\"").unwrap();
        assert_eq!(kind, EffectKind::ChainLightning);
    }

    #[test]
    fn test_negative_pool_members() {
        let negative: Vec<_> = EffectKind::ALL
            .iter()
            .filter(|k| k.default_pool() == PoolType::Negative)
            .collect();
        assert_eq!(negative.len(), 5);
        assert!(negative.contains(&&EffectKind::ChainLightning));
    }

    #[test]
    fn test_pool_type_parse() {
        assert_eq!("negative".parse::<PoolType>().unwrap(), PoolType::Negative);
        assert_eq!("1".parse::<PoolType>().unwrap(), PoolType::Normal);
        assert!("cursed".parse::<PoolType>().is_err());
    }

    #[test]
    fn test_card_defaults_and_weight() {
        let card: ItemCard = serde_json::from_str(r#"{"id": 3, "name": "Mystery"}"#).unwrap();
        assert_eq!(card.effect, EffectKind::Inert);
        assert_eq!(card.pool, PoolType::Normal);
        assert_eq!(card.draw_weight(), 1.0);

        let zero = ItemCard::new(ItemCardId::new(1), EffectKind::Shield, "Shield").with_probability(0.0);
        assert_eq!(zero.draw_weight(), 1.0);
        let heavy = zero.with_probability(2.5);
        assert_eq!(heavy.draw_weight(), 2.5);
    }
}
