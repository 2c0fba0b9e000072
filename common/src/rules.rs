//! 袋の入り数ルール
//!
//! 料理の扱い（主菜・副菜・少量副菜・汁）と単位・数量から、1袋に入れる食数を決める。

use crate::linker::PlateSheet;
use crate::types::{ParsedPlateRecord, RecordKind, Unit};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 主菜は常にこの入り数
pub const MAIN_CAPACITY: u32 = 7;
/// 少量の袋の入り数
pub const SMALL_CAPACITY: u32 = 20;
/// 通常の袋の入り数
pub const DEFAULT_CAPACITY: u32 = 14;
/// この重量(g)未満は少量
pub const SMALL_GRAM_THRESHOLD: f64 = 20.0;

/// 主菜の名前でも30g未満なら副菜として袋詰めする料理
const SMALL_MAIN_WORDS: [&str; 5] = ["赤飯", "ひじきご", "ピラフ", "チャーハン", "炒飯"];

/// 袋詰め上の扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PackagingRole {
    Main,
    Sub,
    SubLess,
    Soup,
}

impl PackagingRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackagingRole::Main => "main",
            PackagingRole::Sub => "sub",
            PackagingRole::SubLess => "sub-less",
            PackagingRole::Soup => "soup",
        }
    }
}

impl fmt::Display for PackagingRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackagingRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "main" => Ok(PackagingRole::Main),
            "sub" => Ok(PackagingRole::Sub),
            "sub-less" => Ok(PackagingRole::SubLess),
            "soup" | "miso" => Ok(PackagingRole::Soup),
            other => Err(format!("不明な扱い: {}", other)),
        }
    }
}

/// g指定の料理の入り数（20g未満は20、それ以外は14）
pub fn gram_capacity(quantity: f64) -> u32 {
    if quantity < SMALL_GRAM_THRESHOLD {
        SMALL_CAPACITY
    } else {
        DEFAULT_CAPACITY
    }
}

/// 味噌汁・汁の具の入り数
///
/// 個数系は整数部が1なら20（1.5個も1個扱い）
pub fn soup_capacity(unit: &Unit, quantity: f64) -> u32 {
    if unit.is_gram() {
        gram_capacity(quantity)
    } else if quantity.trunc() == 1.0 {
        SMALL_CAPACITY
    } else {
        DEFAULT_CAPACITY
    }
}

/// 1袋に入れる食数
pub fn bag_capacity(role: PackagingRole, unit: &Unit, quantity: f64) -> u32 {
    match role {
        PackagingRole::Main => MAIN_CAPACITY,
        PackagingRole::Soup => soup_capacity(unit, quantity),
        PackagingRole::Sub | PackagingRole::SubLess if unit.is_gram() => gram_capacity(quantity),
        PackagingRole::SubLess => SMALL_CAPACITY,
        PackagingRole::Sub => DEFAULT_CAPACITY,
    }
}

/// 袋数を求めるExcelの数式
///
/// 食数0なら0袋、2食以下なら1袋、それ以外は入り数で切り上げ
pub fn bag_count_formula(total_cell: &str, capacity_cell: &str) -> String {
    format!(
        "IF({t}=0,0,IF({t}<=2,1,ROUNDUP({t}/{c},0)))",
        t = total_cell,
        c = capacity_cell
    )
}

/// 皿に盛る料理の扱い
fn plate_role(record: &ParsedPlateRecord, quantity: f64) -> PackagingRole {
    if record.marks.is_upper {
        return PackagingRole::Main;
    }

    let name = record.name();
    if record.glyph.map_or(false, |g| g.is_main_plate()) {
        if name.contains("三色丼") {
            return PackagingRole::Sub;
        }
        if quantity < 30.0 && SMALL_MAIN_WORDS.iter().any(|w| name.contains(w)) {
            return PackagingRole::Sub;
        }
        return PackagingRole::Main;
    }

    let is_accessory = record.glyph == Some(crate::types::RoleGlyph::Accessory);
    if record.is_reduced_portion() || is_accessory {
        PackagingRole::SubLess
    } else {
        PackagingRole::Sub
    }
}

/// 分類結果から袋詰め上の扱いを決める
///
/// 混ぜご飯本体は最初の具の数量を参照する（栗ご飯で具が30g未満なら副菜扱い）。
pub fn packaging_role(record: &ParsedPlateRecord, first_part_quantity: Option<f64>) -> PackagingRole {
    match &record.kind {
        kind if kind.is_soup_like() => PackagingRole::Soup,
        RecordKind::MixRiceHeader { name, .. } => {
            let small_chestnut = name.contains("栗【くり】ご")
                && first_part_quantity.map_or(false, |q| q < 30.0);
            if small_chestnut {
                PackagingRole::Sub
            } else {
                PackagingRole::Main
            }
        }
        kind => plate_role(record, kind.quantity()),
    }
}

impl PlateSheet {
    /// 添字の行の扱い
    pub fn role_of(&self, index: usize) -> PackagingRole {
        packaging_role(&self.records[index], self.first_part_quantity(index))
    }
}
