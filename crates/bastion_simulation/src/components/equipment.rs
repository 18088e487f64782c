//! Экипировка рук и разрешение блокирующего предмета
//!
//! Хост сообщает что в руках; боевой слой решает чем актор блокирует
//! (щит слева, иначе любое оружие в любой руке) и является ли оружие
//! дальнобойным для draw-механики.

use bevy::prelude::*;

/// Класс оружия (зеркало weapon-type хоста)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum WeaponClass {
    OneHandSword,
    OneHandDagger,
    OneHandAxe,
    OneHandMace,
    TwoHandMelee,
    Bow,
    Crossbow,
}

impl WeaponClass {
    pub fn is_ranged(&self) -> bool {
        matches!(self, WeaponClass::Bow | WeaponClass::Crossbow)
    }
}

/// Предмет в руке
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum EquippedItem {
    /// Щит (только левая рука)
    Shield,
    Weapon(WeaponClass),
}

/// Чем актор выполняет блок — ключ выбора звука/спарка
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockEquipmentClass {
    Shield,
    Weapon,
    None,
}

/// Руки актора (зеркало equipped objects хоста)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Hands {
    pub left: Option<EquippedItem>,
    pub right: Option<EquippedItem>,
}

impl Hands {
    /// Разрешение блокирующего предмета.
    ///
    /// Левая рука приоритетна: щит → Shield, оружие → Weapon.
    /// Иначе оружие в правой → Weapon. Ничего подходящего → None
    /// (эффекты пропускаются, сам блок не инвалидируется).
    pub fn block_equipment(&self) -> BlockEquipmentClass {
        match self.left {
            Some(EquippedItem::Shield) => return BlockEquipmentClass::Shield,
            Some(EquippedItem::Weapon(_)) => return BlockEquipmentClass::Weapon,
            None => {}
        }
        if matches!(self.right, Some(EquippedItem::Weapon(_))) {
            return BlockEquipmentClass::Weapon;
        }
        BlockEquipmentClass::None
    }

    /// Класс дальнобойного оружия в правой руке (если есть)
    pub fn ranged_class(&self) -> Option<WeaponClass> {
        match self.right {
            Some(EquippedItem::Weapon(class)) if class.is_ranged() => Some(class),
            _ => None,
        }
    }

    pub fn has_ranged_equipped(&self) -> bool {
        self.ranged_class().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shield_in_left_hand_wins() {
        let hands = Hands {
            left: Some(EquippedItem::Shield),
            right: Some(EquippedItem::Weapon(WeaponClass::OneHandSword)),
        };
        assert_eq!(hands.block_equipment(), BlockEquipmentClass::Shield);
    }

    #[test]
    fn test_weapon_in_either_hand_blocks_as_weapon() {
        let left_weapon = Hands {
            left: Some(EquippedItem::Weapon(WeaponClass::OneHandDagger)),
            right: None,
        };
        assert_eq!(left_weapon.block_equipment(), BlockEquipmentClass::Weapon);

        let right_weapon = Hands {
            left: None,
            right: Some(EquippedItem::Weapon(WeaponClass::TwoHandMelee)),
        };
        assert_eq!(right_weapon.block_equipment(), BlockEquipmentClass::Weapon);
    }

    #[test]
    fn test_empty_hands_resolve_to_none() {
        let hands = Hands::default();
        assert_eq!(hands.block_equipment(), BlockEquipmentClass::None);
    }

    #[test]
    fn test_ranged_detection() {
        let bow = Hands {
            left: None,
            right: Some(EquippedItem::Weapon(WeaponClass::Bow)),
        };
        assert!(bow.has_ranged_equipped());
        assert_eq!(bow.ranged_class(), Some(WeaponClass::Bow));

        let sword = Hands {
            left: None,
            right: Some(EquippedItem::Weapon(WeaponClass::OneHandSword)),
        };
        assert!(!sword.has_ranged_equipped());
    }
}
