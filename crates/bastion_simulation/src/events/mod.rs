//! События на границе хост ↔ симуляция
//!
//! # Архитектура
//!
//! **Входящие (хост → ядро):** дискретные уведомления движка — кнопка блока,
//! попадание, анимационный тег, вход/выход из боя, сброс сессии. Строковые
//! анимационные теги маппятся в enum РОВНО один раз на границе
//! ([`AnimTag::from_tag`]); ядро цепочек строковых сравнений не видит.
//!
//! **Исходящие (ядро → хост):** запросы эффектов, которые bridge обязан
//! дренировать каждый кадр — stagger, звук/спарк, глобальный time-scale,
//! counter-триггер, принудительная остановка анимации.

use bevy::prelude::*;

use crate::combat::timed_block::BlockType;
use crate::components::BlockEquipmentClass;

// ============================================================================
// Входящие события
// ============================================================================

/// Кнопка блока нажата/отпущена (нормализованный input хоста)
#[derive(Event, Debug, Clone, Copy)]
pub struct BlockButtonInput {
    pub actor: Entity,
    pub pressed: bool,
}

/// Источник попадания. Спеллы игнорируются боевым конвейером.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitSource {
    Weapon,
    Projectile,
    Spell,
}

/// Актор получил удар
#[derive(Event, Debug, Clone, Copy)]
pub struct HitLanded {
    pub victim: Entity,
    /// Нападающий может отсутствовать (ловушки, скриптовые удары)
    pub aggressor: Option<Entity>,
    pub raw_damage: f32,
    /// Движок пометил удар заблокированным
    pub was_blocked: bool,
    pub source: HitSource,
}

/// Рука каста
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastHand {
    Left,
    Right,
}

/// Закрытый набор анимационных тегов, которые ядро умеет обрабатывать
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimTag {
    BowDrawn,
    BowRelease,
    RapidCombo,
    JumpUp,
    CastBegin(CastHand),
    CastEnd(CastHand),
    AttackStop,
}

impl AnimTag {
    /// Единственная точка маппинга строковых тегов движка в enum.
    ///
    /// Неизвестный тег → None (игнорируется на границе, в ядро не попадает).
    pub fn from_tag(tag: &str) -> Option<AnimTag> {
        match tag {
            "BowDrawn" => Some(AnimTag::BowDrawn),
            "BowRelease" | "bowRelease" => Some(AnimTag::BowRelease),
            "HKS_TriggerA" => Some(AnimTag::RapidCombo),
            "JumpUp" => Some(AnimTag::JumpUp),
            "BeginCastLeft" => Some(AnimTag::CastBegin(CastHand::Left)),
            "BeginCastRight" => Some(AnimTag::CastBegin(CastHand::Right)),
            "EndCastLeft" => Some(AnimTag::CastEnd(CastHand::Left)),
            "EndCastRight" => Some(AnimTag::CastEnd(CastHand::Right)),
            "attackStop" => Some(AnimTag::AttackStop),
            _ => None,
        }
    }
}

/// Анимационный тег, уже смапленный bridge'ем
#[derive(Event, Debug, Clone, Copy)]
pub struct AnimEvent {
    pub actor: Entity,
    pub tag: AnimTag,
}

/// Актор вошёл/вышел из боя (выход = очистка его трекинга)
#[derive(Event, Debug, Clone, Copy)]
pub struct CombatStateChanged {
    pub actor: Entity,
    pub in_combat: bool,
}

/// Полный сброс сессии (new game / load game): всё боевое состояние
/// снимается, все снапшоты атрибутов восстанавливаются.
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct SessionResetEvent;

// ============================================================================
// Исходящие события
// ============================================================================

/// Запрос процедурного stagger на акторе
#[derive(Event, Debug, Clone, Copy)]
pub struct StaggerRequest {
    pub target: Entity,
    /// Направление для анимационного графа, нормализовано в [0, 1)
    pub direction: f32,
    pub magnitude: f32,
}

/// Запрос звука+спарка успешного timed block
///
/// Звук ключуется парой (экипировка, уровень parry); уровень 5 выбирает
/// отдельный perfect-звук на стороне хоста.
#[derive(Event, Debug, Clone, Copy)]
pub struct BlockEffectRequest {
    pub actor: Entity,
    pub equipment: BlockEquipmentClass,
    pub tier: u8,
    pub spark: bool,
    pub volume: f32,
}

/// Запрос глобального time-scale (slow motion и его отложенный сброс)
#[derive(Event, Debug, Clone, Copy)]
pub struct TimeScaleRequest {
    pub scale: f32,
}

/// Hand-off риспоста стороннему counter-плагину
#[derive(Event, Debug, Clone, Copy)]
pub struct CounterTrigger {
    pub actor: Entity,
    pub perfect: bool,
}

/// Действие принудительной остановки анимации
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceAnimAction {
    StopAttack,
    StopBlock,
}

/// Принудительная остановка анимации (stamina исчерпана при draw/блоке)
#[derive(Event, Debug, Clone, Copy)]
pub struct ForceAnimRequest {
    pub actor: Entity,
    pub action: ForceAnimAction,
}

/// Итог обработки удара (feedback для UI/bridge)
#[derive(Event, Debug, Clone, Copy)]
pub struct DamageDealt {
    pub attacker: Option<Entity>,
    pub target: Entity,
    /// Урон, фактически снятый с Health (после heal-back)
    pub damage: f32,
    pub block: BlockType,
    /// Сколько вернул heal-back timed block'а
    pub healed_back: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anim_tag_lookup() {
        assert_eq!(AnimTag::from_tag("BowDrawn"), Some(AnimTag::BowDrawn));
        // Оба варианта регистра, как шлёт движок
        assert_eq!(AnimTag::from_tag("BowRelease"), Some(AnimTag::BowRelease));
        assert_eq!(AnimTag::from_tag("bowRelease"), Some(AnimTag::BowRelease));
        assert_eq!(AnimTag::from_tag("HKS_TriggerA"), Some(AnimTag::RapidCombo));
        assert_eq!(AnimTag::from_tag("JumpUp"), Some(AnimTag::JumpUp));
        assert_eq!(AnimTag::from_tag("attackStop"), Some(AnimTag::AttackStop));
    }

    #[test]
    fn test_unknown_tag_ignored() {
        assert_eq!(AnimTag::from_tag("FootstepLeft"), None);
        assert_eq!(AnimTag::from_tag(""), None);
    }
}
