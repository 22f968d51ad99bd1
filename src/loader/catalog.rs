//! Built-in item catalog and legacy catalog migration

use crate::core::{EffectKind, ItemCard, ItemCardId};

/// Display data for the stock card of each effect
struct StockCard {
    effect: EffectKind,
    description: &'static str,
    function_desc: &'static str,
    image_path: &'static str,
}

const STOCK_CARDS: [StockCard; 19] = [
    StockCard {
        effect: EffectKind::Shield,
        description: "抵挡一次点名带来的惩罚。",
        function_desc: "Shield: Block one penalty.",
        image_path: "",
    },
    StockCard {
        effect: EffectKind::MarkTarget,
        description: "将本次点名转移给随机的另一名同学。",
        function_desc: "Mark Target: Pass the current draw to another random student.",
        image_path: "",
    },
    StockCard {
        effect: EffectKind::ExpPotion,
        description: "自身星级 +1。",
        function_desc: "Exp Potion: Gain 1 star.",
        image_path: "",
    },
    StockCard {
        effect: EffectKind::MassSilence,
        description: "同宿舍所有学生星级 -1。",
        function_desc: "Mass Silence: Dormmates lose 1 star.",
        image_path: "23.jpg",
    },
    StockCard {
        effect: EffectKind::Doomsday,
        description: "全班所有学生星级 -1。",
        function_desc: "Doomsday Judgment: All students lose 1 star.",
        image_path: "25.jpg",
    },
    StockCard {
        effect: EffectKind::LegionGlory,
        description: "同宿舍所有学生星级 +1。",
        function_desc: "Legion Glory: Dormmates gain 1 star.",
        image_path: "22.jpg",
    },
    StockCard {
        effect: EffectKind::ShadowRaid,
        description: "随机扣除一人1星。",
        function_desc: "Shadow Raid: Randomly deduct 1 star from one person.",
        image_path: "21.jpg",
    },
    StockCard {
        effect: EffectKind::BerserkerTrial,
        description: "随机挑选一名勇士，完成20个俯卧撑后得1星。",
        function_desc: "Berserker Trial: Random person does 20 pushups for 1 star.",
        image_path: "20.jpg",
    },
    StockCard {
        effect: EffectKind::ManaDrain,
        description: "随机汲取一人2星，若不足2星则反噬扣1星。",
        function_desc: "Mana Drain: Steal 2 stars, or lose 1 if target has < 2.",
        image_path: "19.jpg",
    },
    StockCard {
        effect: EffectKind::StealthCloak,
        description: "接下来3次抽取，不在名单中。",
        function_desc: "Stealth Cloak: Immune for next 3 draws.",
        image_path: "18.jpg",
    },
    StockCard {
        effect: EffectKind::Sanctuary,
        description: "宿舍全员下一次抽取将不在名单中。",
        function_desc: "Barrier Sanctuary: Dormmates immune for next 1 draw.",
        image_path: "17.jpg",
    },
    StockCard {
        effect: EffectKind::UniversalSalvation,
        description: "全班所有学生星级 +1。",
        function_desc: "Universal Salvation: All students gain 1 star.",
        image_path: "24.jpg",
    },
    StockCard {
        effect: EffectKind::DarkCurse,
        description: "自身陷入可以负分状态，突破下限。",
        function_desc: "Dark Curse: Allows negative stars.",
        image_path: "16.jpg",
    },
    StockCard {
        effect: EffectKind::Purification,
        description: "解除负分状态，分数重置为0分。",
        function_desc: "Purification: Clears curse and resets negative stars to 0.",
        image_path: "15.jpg",
    },
    StockCard {
        effect: EffectKind::AbyssalGaze,
        description: "进行判定，具有30%概率加3星，70%概率清零。",
        function_desc: "Abyssal Gaze: 30% chance +3 stars, 70% reset to 0.",
        image_path: "14.jpg",
    },
    StockCard {
        effect: EffectKind::OneManGuard,
        description: "仅自身扣分，不会波及其他人。",
        function_desc: "One Man Guard: Only user loses stars.",
        image_path: "11.jpg",
    },
    StockCard {
        effect: EffectKind::RoyalPk,
        description: "随机抽取一个人进行星星数量的比较，如果比对方多，则多增加一星",
        function_desc: "Royal PK: Compare stars with random student. If higher, gain +1 star.",
        image_path: "13.jpg",
    },
    StockCard {
        effect: EffectKind::DestinyRoulette,
        description: "10%概率天使降临 +10星，90%概率恶魔低语 -1星。",
        function_desc: "Destiny Roulette: 10% chance +10 stars, otherwise -1 star.",
        image_path: "",
    },
    StockCard {
        effect: EffectKind::ChainLightning,
        description: "概率性扣自己2个星，如果没中，继承到下一个人，最多继承3次",
        function_desc: "Chain Lightning: 50% chance -2 stars. On miss, jumps to next student (max 3 jumps).",
        image_path: "12.jpg",
    },
];

/// One card per effect, ids starting at 1, each in its default pool
pub fn default_catalog() -> Vec<ItemCard> {
    STOCK_CARDS
        .iter()
        .enumerate()
        .map(|(index, stock)| {
            let mut card = ItemCard::new(
                ItemCardId::new(index as u32 + 1),
                stock.effect,
                stock.effect.legacy_name(),
            );
            card.description = stock.description.to_string();
            card.function_desc = stock.function_desc.to_string();
            card.image_path = stock.image_path.to_string();
            card
        })
        .collect()
}

/// Give untagged cards an effect derived from their display name
///
/// Returns how many cards were retagged. Cards whose name matches nothing
/// stay `Inert`.
pub fn migrate_legacy_cards(cards: &mut [ItemCard]) -> usize {
    let mut migrated = 0;
    for card in cards.iter_mut().filter(|c| c.effect == EffectKind::Inert) {
        let effect = EffectKind::from_legacy_name(card.name.as_str());
        if effect != EffectKind::Inert {
            card.effect = effect;
            migrated += 1;
        }
    }
    migrated
}
