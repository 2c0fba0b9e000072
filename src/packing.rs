//! 分類から袋数までの一連の処理

use crate::config::Config;
use crate::error::Result;
use crate::orders::FacilityOrders;
use chrono::NaiveDate;
use plate_pack_common::bags::MixRiceNeedle;
use plate_pack_common::{
    compute_bags_with_fixed, fifty_gram_split, mix_rice_needle, DescriptorClassifier, DishPortion,
    FixedOrder, Masters, Meal, PackagingDecision, PackagingRole, PlateSheet, RawPlateLine,
    RecordKind,
};
use serde::Serialize;
use tracing::{debug, warn};

/// 分類して相互参照を張る
pub fn classify_sheet(lines: &[RawPlateLine], masters: Masters) -> Result<PlateSheet> {
    let classifier = DescriptorClassifier::new(masters)?;
    Ok(PlateSheet::linked(classifier.classify_all(lines)))
}

/// 種別の表示名
pub fn kind_label(kind: &RecordKind) -> &'static str {
    match kind {
        RecordKind::Plain { .. } => "通常",
        RecordKind::WithDensity { .. } => "液あり",
        RecordKind::WithAnotherUnit { .. } => "別単位",
        RecordKind::KoGramDensity { .. } => "個＋g＋液",
        RecordKind::KoGramPercent { .. } => "個＋g＋％",
        RecordKind::GramGram { .. } => "g＋g",
        RecordKind::LiquidSeasoning { .. } => "調味液",
        RecordKind::MixRiceHeader { .. } => "混ぜご飯",
        RecordKind::MixRicePart { .. } => "混ぜご飯の具",
        RecordKind::MisoFilling { .. } | RecordKind::MisoFillingSplit { .. } => "味噌汁の具",
        RecordKind::SoupFilling { .. } | RecordKind::SoupFillingSplit { .. } => "汁の具",
        RecordKind::SoupLiquid { .. } => "汁・スープ",
        RecordKind::MisoNone { .. } | RecordKind::SoupNone { .. } => "具なし",
        RecordKind::Unclassified { .. } => "未分類",
    }
}

/// 袋数を出さない行
fn is_skipped(kind: &RecordKind) -> bool {
    matches!(
        kind,
        RecordKind::Unclassified { .. }
            | RecordKind::MisoNone { .. }
            | RecordKind::SoupNone { .. }
            | RecordKind::MixRiceHeader { disabled: true, .. }
    )
}

/// 1料理分の袋詰め計画
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackingRow {
    pub eating_day: NaiveDate,
    pub meal: Meal,
    pub index: i32,
    /// 調理指示書の記載
    pub descriptor: String,
    pub name: String,
    pub kind: &'static str,
    pub role: PackagingRole,
    /// 1人前の量（液込みの場合はg換算）
    pub quantity: f64,
    pub unit: String,
    /// 施設ごとの食数（注文ファイルの並び順）
    pub facility_orders: Vec<u32>,
    /// 2食以上の施設の食数合計
    pub served: u32,
    pub fixed: FixedOrder,
    pub decision: PackagingDecision,
    /// 保存用50gの(具材g, 液g)
    pub preserve_split: Option<(f64, f64)>,
    /// 混ぜご飯の具の袋分け
    pub needle: Option<MixRiceNeedle>,
    /// 個・g・液に分けて計量する名前
    pub split_names: Option<[String; 3]>,
    /// ◎ 麺類のスープ
    pub noodle_soup: bool,
}

impl PackingRow {
    /// 注文分と固定分の合計袋数
    pub fn total_bags(&self) -> u32 {
        self.decision.bag_count
    }
}

/// 袋詰め計画を作る
///
/// `preserve_50g`は保存用50gの袋数（0なら内訳を出さない）。
pub fn plan(
    sheet: &PlateSheet,
    orders: &FacilityOrders,
    config: &Config,
    preserve_50g: u32,
) -> Vec<PackingRow> {
    let mut rows = Vec::new();

    for (i, record) in sheet.records.iter().enumerate() {
        if is_skipped(&record.kind) {
            if matches!(record.kind, RecordKind::Unclassified { .. }) {
                warn!(name = %record.before_name, "分類できない料理は袋数を計算しません");
            }
            continue;
        }

        let role = sheet.role_of(i);
        let portion = DishPortion::from_record(record);
        let policy = config.policy_for(record.eating_day);
        let fixed = policy.decide(&portion);
        let facility_orders = orders.for_descriptor(&record.before_name);
        let served: u32 = facility_orders.iter().filter(|&&n| n > 1).sum();

        let decision = compute_bags_with_fixed(
            role,
            &portion.unit,
            portion.quantity,
            facility_orders,
            &fixed,
            0,
            preserve_50g,
        );

        let preserve_split = (preserve_50g > 0 && portion.density > 0.0)
            .then(|| fifty_gram_split(portion.inner_gram, portion.density));

        let needle = match &record.kind {
            // 具を別袋にする混ぜご飯だけ
            RecordKind::MixRiceHeader { base_soup_gram, master, .. } if master.is_mix_package => {
                let eaten: u32 = facility_orders.iter().sum();
                let part_gram: f64 = sheet
                    .linkage
                    .parts_for(i)
                    .iter()
                    .map(|&p| &sheet.records[p].kind)
                    .filter(|kind| kind.unit().map_or(false, |u| u.is_gram()))
                    .map(|kind| kind.quantity())
                    .sum();
                let liquid = base_soup_gram.unwrap_or(0.0);
                Some(mix_rice_needle(part_gram * eaten as f64, liquid * eaten as f64))
            }
            _ => None,
        };

        debug!(
            name = %record.before_name,
            role = %role,
            bags = decision.bag_count,
            "袋数"
        );

        rows.push(PackingRow {
            eating_day: record.eating_day,
            meal: record.meal,
            index: record.index,
            descriptor: record.before_name.clone(),
            name: record.name().to_string(),
            kind: kind_label(&record.kind),
            role,
            quantity: portion.quantity,
            unit: portion.unit.to_string(),
            facility_orders: facility_orders.to_vec(),
            served,
            fixed,
            decision,
            preserve_split,
            needle,
            split_names: record.kind.split_part_names(),
            noodle_soup: record.marks.is_noodle_soup,
        });
    }

    rows
}
