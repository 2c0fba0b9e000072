//! 袋数の計算

use crate::allocator::FixedOrder;
use crate::rules::{bag_capacity, PackagingRole};
use crate::types::Unit;
use serde::Serialize;

/// 混ぜご飯の具1袋あたりの上限(g)
pub const MIX_RICE_GRAM_PER_BAG: f64 = 1000.0;

/// 袋詰めの結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackagingDecision {
    pub bag_size: u32,
    pub bag_count: u32,
    pub single_serving_bag_count: u32,
    /// 保存用50gの袋数
    pub fifty_gram_bag_count: u32,
    pub role: PackagingRole,
}

/// 食数から袋数を求める
///
/// 0食なら0袋、1〜2食は入り数に関係なく1袋、それ以外は切り上げ。
pub fn bag_count(total: u32, capacity: u32) -> u32 {
    match total {
        0 => 0,
        1..=2 => 1,
        _ => total.div_ceil(capacity.max(1)),
    }
}

/// 施設ごとの注文数から袋数を求める
///
/// 袋は施設ごとに分けるので、2食以上の施設それぞれの袋数を合計する。
/// 注文数がちょうど1の施設は1人袋として別に数え、0の施設は数えない。
pub fn compute_bags(
    role: PackagingRole,
    unit: &Unit,
    quantity: f64,
    facility_orders: &[u32],
) -> PackagingDecision {
    let bag_size = bag_capacity(role, unit, quantity);
    let bags: u32 = facility_orders
        .iter()
        .filter(|&&n| n > 1)
        .map(|&n| bag_count(n, bag_size))
        .sum();
    let single_serving_bag_count = facility_orders.iter().filter(|&&n| n == 1).count() as u32;

    PackagingDecision {
        bag_size,
        bag_count: bags,
        single_serving_bag_count,
        fifty_gram_bag_count: 0,
        role,
    }
}

/// 固定分を加えた袋数
pub fn compute_bags_with_fixed(
    role: PackagingRole,
    unit: &Unit,
    quantity: f64,
    facility_orders: &[u32],
    fixed: &FixedOrder,
    fixed_single_serving: u32,
    fifty_gram: u32,
) -> PackagingDecision {
    let mut decision = compute_bags(role, unit, quantity, facility_orders);
    decision.bag_count += fixed.baseline_bags();
    decision.single_serving_bag_count += fixed_single_serving;
    decision.fifty_gram_bag_count = fifty_gram;
    decision
}

/// 混ぜご飯の具の袋分け
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MixRiceNeedle {
    pub bag_count: u32,
    /// 1袋あたりの具の重量(g)
    pub average_gram: f64,
}

/// 具と液の合計重量から混ぜご飯の具の袋数を求める（最低1袋）
pub fn mix_rice_needle(total_part_gram: f64, total_liquid_gram: f64) -> MixRiceNeedle {
    let bags = ((total_part_gram + total_liquid_gram) / MIX_RICE_GRAM_PER_BAG).ceil();
    let bag_count = if bags.is_finite() && bags >= 1.0 {
        bags as u32
    } else {
        1
    };
    MixRiceNeedle {
        bag_count,
        average_gram: total_part_gram / bag_count as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::{DishPortion, FixedOrderPolicy};

    #[test]
    fn test_bag_count_override() {
        assert_eq!(bag_count(0, 30), 0);
        assert_eq!(bag_count(2, 30), 1);
        // 入り数1でも2食以下は1袋
        assert_eq!(bag_count(2, 1), 1);
        assert_eq!(bag_count(1, 1), 1);
        assert_eq!(bag_count(3, 1), 3);
        assert_eq!(bag_count(15, 14), 2);
        assert_eq!(bag_count(28, 14), 2);
    }

    #[test]
    fn test_bag_count_monotonic() {
        for capacity in [1, 7, 14, 20, 30] {
            let mut previous = 0;
            for total in 0..200 {
                let count = bag_count(total, capacity);
                assert!(count >= previous, "袋数が減った: total={} capacity={}", total, capacity);
                previous = count;
            }
        }
    }

    #[test]
    fn test_compute_bags_single_serving() {
        let decision = compute_bags(PackagingRole::Sub, &Unit::Gram, 50.0, &[10, 1, 0, 5, 1]);
        assert_eq!(decision.bag_size, 14);
        assert_eq!(decision.bag_count, 2);
        assert_eq!(decision.single_serving_bag_count, 2);
        assert_eq!(decision.role, PackagingRole::Sub);
    }

    #[test]
    fn test_compute_bags_per_facility() {
        // 施設ごとに袋を分けるため、3食×3施設は3袋
        let decision = compute_bags(PackagingRole::Sub, &Unit::Gram, 50.0, &[3, 3, 3]);
        assert_eq!(decision.bag_size, 14);
        assert_eq!(decision.bag_count, 3);

        // 2食の施設も1袋
        let decision = compute_bags(PackagingRole::Main, &Unit::Gram, 80.0, &[2, 2, 15]);
        assert_eq!(decision.bag_count, 1 + 1 + 3);
    }

    #[test]
    fn test_compute_bags_main() {
        let decision = compute_bags(PackagingRole::Main, &Unit::Gram, 19.0, &[2]);
        assert_eq!(decision.bag_size, 7);
        assert_eq!(decision.bag_count, 1);
        assert_eq!(decision.single_serving_bag_count, 0);
    }

    #[test]
    fn test_compute_bags_no_orders() {
        let decision = compute_bags(PackagingRole::Soup, &Unit::Piece, 1.0, &[0, 0]);
        assert_eq!(decision.bag_count, 0);
        assert_eq!(decision.single_serving_bag_count, 0);
    }

    #[test]
    fn test_compute_bags_with_fixed() {
        let fixed = FixedOrderPolicy::Legacy.decide(&DishPortion {
            name: "和え物".into(),
            quantity: 15.0,
            unit: Unit::Gram,
            is_reduced: false,
            inner_gram: None,
            density: 0.0,
        });
        let decision = compute_bags_with_fixed(
            PackagingRole::Sub,
            &Unit::Gram,
            15.0,
            &[40, 1],
            &fixed,
            1,
            2,
        );
        // 40食/20 = 2袋 + 針刺し2 + 保存3
        assert_eq!(decision.bag_count, 7);
        assert_eq!(decision.single_serving_bag_count, 2);
        assert_eq!(decision.fifty_gram_bag_count, 2);
    }

    #[test]
    fn test_mix_rice_needle() {
        let needle = mix_rice_needle(1500.0, 600.0);
        assert_eq!(needle.bag_count, 3);
        assert_eq!(needle.average_gram, 500.0);

        let needle = mix_rice_needle(0.0, 0.0);
        assert_eq!(needle.bag_count, 1);
        assert_eq!(needle.average_gram, 0.0);
    }
}
