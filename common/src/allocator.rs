//! 食数固定分（針刺し用・保存用）
//!
//! 注文数とは別に必ず作る検食・保存用の袋数を決める。
//! 基本食の対応日を境に、旧ルールと基本食ルールを切り替える。

use crate::types::{ParsedPlateRecord, Unit};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 小袋にする判定の重量(g)
const UNIT_PACKAGE_THRESHOLD: f64 = 20.0;

/// 固定分ルール
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FixedOrderPolicy {
    Legacy,
    BasicPlate,
}

impl FixedOrderPolicy {
    /// 喫食日が切替日以降なら基本食ルール
    pub fn for_eating_day(eating_day: NaiveDate, basic_plate_enable_date: NaiveDate) -> Self {
        if eating_day >= basic_plate_enable_date {
            FixedOrderPolicy::BasicPlate
        } else {
            FixedOrderPolicy::Legacy
        }
    }

    /// 小袋にするか
    fn is_unit_packaging(&self, portion: &DishPortion) -> bool {
        match self {
            FixedOrderPolicy::Legacy => {
                (portion.unit.is_gram() && portion.total_quantity() < UNIT_PACKAGE_THRESHOLD)
                    || portion.is_reduced
            }
            FixedOrderPolicy::BasicPlate => {
                if !portion.unit.is_gram() && !portion.has_inner_gram() {
                    return portion.is_reduced;
                }
                portion.total_quantity() < UNIT_PACKAGE_THRESHOLD || portion.is_reduced
            }
        }
    }

    /// 固定分を決める
    pub fn decide(&self, portion: &DishPortion) -> FixedOrder {
        let is_unit_packaging = self.is_unit_packaging(portion);
        let needle = if is_unit_packaging {
            PackCount::new(30, 2)
        } else {
            PackCount::new(10, 2)
        };

        let order = match self {
            FixedOrderPolicy::Legacy => FixedOrder {
                is_unit_packaging,
                needle,
                preserve: PackCount::new(10, 3),
                light_needle: PackCount::new(0, 0),
                light_preserve: PackCount::new(10, 2),
                preserve_10: 3,
                preserve_5: 8,
                needle_10: 2,
                needle_5: 2,
            },
            FixedOrderPolicy::BasicPlate => FixedOrder {
                is_unit_packaging,
                needle,
                preserve: PackCount::new(10, 5),
                light_needle: PackCount::new(0, 0),
                light_preserve: PackCount::new(0, 0),
                preserve_10: 5,
                preserve_5: 12,
                needle_10: 2,
                needle_5: 2,
            },
        };

        debug!(
            name = %portion.name,
            policy = ?self,
            total = portion.total_quantity(),
            is_unit_packaging,
            "固定分"
        );
        order
    }
}

/// 袋の大きさと袋数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackCount {
    pub pack_size: u32,
    pub count: u32,
}

impl PackCount {
    pub const fn new(pack_size: u32, count: u32) -> Self {
        Self { pack_size, count }
    }
}

/// 固定分の決定結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedOrder {
    pub is_unit_packaging: bool,
    /// 針刺し用（常食）
    pub needle: PackCount,
    /// 保存用（常食）
    pub preserve: PackCount,
    /// 針刺し用（薄味）
    pub light_needle: PackCount,
    /// 保存用（薄味）
    pub light_preserve: PackCount,
    /// 10人袋の保存用
    pub preserve_10: u32,
    /// 5人袋の保存用
    pub preserve_5: u32,
    pub needle_10: u32,
    pub needle_5: u32,
}

impl FixedOrder {
    /// 注文とは別に加える袋数（常食）
    pub fn baseline_bags(&self) -> u32 {
        self.needle.count + self.preserve.count
    }
}

/// 固定分の判定に使う1人前の情報
#[derive(Debug, Clone, PartialEq)]
pub struct DishPortion {
    pub name: String,
    pub quantity: f64,
    pub unit: Unit,
    pub is_reduced: bool,
    pub inner_gram: Option<f64>,
    /// 液の割合(%)
    pub density: f64,
}

impl DishPortion {
    pub fn from_record(record: &ParsedPlateRecord) -> Self {
        let kind = &record.kind;
        let (quantity, unit) = match kind.total_gram() {
            Some(total) => (total, Unit::Gram),
            None => (kind.quantity(), kind.unit().unwrap_or(Unit::Gram)),
        };
        Self {
            name: kind.name().to_string(),
            quantity,
            unit,
            is_reduced: record.is_reduced_portion(),
            inner_gram: kind.inner_gram(),
            density: kind.density(),
        }
    }

    fn has_inner_gram(&self) -> bool {
        self.inner_gram.map_or(false, |g| g > 0.0)
    }

    /// 液を含めた1人前の量
    pub fn total_quantity(&self) -> f64 {
        match self.inner_gram {
            // 具材1個あたりの重量がある場合、液は呼出元で1個あたりのg換算済み
            Some(inner) if !self.unit.is_gram() && inner > 0.0 => inner + self.density / 100.0,
            _ => self.quantity + self.quantity * self.density / 100.0,
        }
    }
}

/// 保存用50gの具材と液の内訳 (具材g, 液g)
pub fn fifty_gram_split(inner_gram: Option<f64>, density: f64) -> (f64, f64) {
    match inner_gram {
        Some(inner) if inner > 0.0 => {
            let solid = 50.0 / (inner + density / 100.0) * inner;
            (solid, 50.0 - solid)
        }
        _ => {
            let solid = 50.0 / (1.0 + density / 100.0);
            (solid, solid * (density / 100.0))
        }
    }
}
