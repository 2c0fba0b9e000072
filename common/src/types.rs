//! 献立解析の型定義
//!
//! - RawPlateLine: 調理指示書の1行（入力）
//! - ParsedPlateRecord: 1行を分類した結果
//! - RecordKind: 分類結果の種別ごとのデータ

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 食事区分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Meal {
    Breakfast,
    Lunch,
    Dinner,
}

impl Meal {
    /// 帳票で使う表記
    pub fn label(&self) -> &'static str {
        match self {
            Meal::Breakfast => "朝",
            Meal::Lunch => "昼",
            Meal::Dinner => "夕",
        }
    }
}

impl FromStr for Meal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "朝" | "朝食" | "breakfast" => Ok(Meal::Breakfast),
            "昼" | "昼食" | "lunch" => Ok(Meal::Lunch),
            "夕" | "夕食" | "dinner" => Ok(Meal::Dinner),
            other => Err(format!("不明な食事区分: {}", other)),
        }
    }
}

impl fmt::Display for Meal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 料理名先頭の丸数字（盛り付け位置）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoleGlyph {
    /// ① 主菜
    Main,
    /// ② 副菜A
    SideA,
    /// ③ 副菜B
    SideB,
    /// ④ 添え物
    Accessory,
    /// ⑤ 汁・スープ
    Soup,
    /// ⑩ 基本食
    BasicBulk,
}

impl RoleGlyph {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '①' => Some(RoleGlyph::Main),
            '②' => Some(RoleGlyph::SideA),
            '③' => Some(RoleGlyph::SideB),
            '④' => Some(RoleGlyph::Accessory),
            '⑤' => Some(RoleGlyph::Soup),
            '⑩' => Some(RoleGlyph::BasicBulk),
            _ => None,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            RoleGlyph::Main => '①',
            RoleGlyph::SideA => '②',
            RoleGlyph::SideB => '③',
            RoleGlyph::Accessory => '④',
            RoleGlyph::Soup => '⑤',
            RoleGlyph::BasicBulk => '⑩',
        }
    }

    /// 主菜扱いの丸数字か
    pub fn is_main_plate(&self) -> bool {
        matches!(self, RoleGlyph::Main | RoleGlyph::BasicBulk)
    }
}

/// 丸数字(①〜⑳)か
pub fn is_circled_number(c: char) -> bool {
    ('\u{2460}'..='\u{2473}').contains(&c)
}

/// 数量の単位
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Unit {
    /// g
    Gram,
    /// 個
    Piece,
    /// 丁
    Block,
    /// 本・尾・切など単位表の助数詞
    Counter(String),
}

impl Unit {
    pub fn as_str(&self) -> &str {
        match self {
            Unit::Gram => "g",
            Unit::Piece => "個",
            Unit::Block => "丁",
            Unit::Counter(label) => label,
        }
    }

    pub fn is_gram(&self) -> bool {
        matches!(self, Unit::Gram)
    }
}

impl TryFrom<String> for Unit {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim() {
            "" => Err("単位が空です".to_string()),
            "g" | "ｇ" => Ok(Unit::Gram),
            "個" => Ok(Unit::Piece),
            "丁" => Ok(Unit::Block),
            other => Ok(Unit::Counter(other.to_string())),
        }
    }
}

impl From<Unit> for String {
    fn from(unit: Unit) -> Self {
        unit.as_str().to_string()
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 調理指示書の1行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPlateLine {
    /// 食事内での位置（-1は派生行）
    pub index: i32,
    pub cooking_day: NaiveDate,
    pub eating_day: NaiveDate,
    pub meal: Meal,
    pub raw_name: String,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
}

/// 料理名に付く記号
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DishMarks {
    /// ▼ 少量
    pub is_less: bool,
    /// △ 主菜ルール適用
    pub is_upper: bool,
    /// ◎ 麺類のスープ（希釈）
    pub is_noodle_soup: bool,
}

/// 混ぜご飯マスタ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixRiceMaster {
    pub name: String,
    pub search_word: String,
    #[serde(default)]
    pub is_mix_package: bool,
}

/// 汁・スープの区分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoupGroup {
    /// スープ
    Soup,
    /// 汁（名前に「スープ」「汁」を含まないもの）
    Liquid,
}

/// 汁・スープマスタ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoupMaster {
    pub name: String,
    pub search_word: String,
    pub group: SoupGroup,
}

/// 分類結果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RecordKind {
    Plain {
        name: String,
        quantity: f64,
        unit: Unit,
    },
    WithDensity {
        name: String,
        quantity: f64,
        unit: Unit,
        /// 出汁・液の割合(%)
        density: f64,
        is_same_thickness: bool,
        is_density_fixed: bool,
        inner_gram: Option<f64>,
    },
    /// 「76g+48g」のように重量を2つ持つ
    WithAnotherUnit {
        name: String,
        quantity: f64,
        unit: Unit,
        density: f64,
        quantity2: Option<f64>,
        unit2: Option<Unit>,
    },
    /// 「煮物 肉団子3個＋小松菜36g ＋液60g」
    KoGramDensity {
        names: [String; 3],
        count_quantity: f64,
        gram_quantity: f64,
        /// 液量(g)
        density: f64,
        original_name: String,
        inner_gram: Option<f64>,
    },
    /// 「れんこん煮物 れんこん1個＋いんげん4g ＋9％」(1個あたりの重量不明)
    KoGramPercent {
        names: [String; 3],
        count_quantity: f64,
        gram_quantity: f64,
        percent: f64,
        original_name: String,
    },
    GramGram {
        names: [String; 3],
        gram1: f64,
        gram2: f64,
        density: f64,
        original_name: String,
    },
    LiquidSeasoning {
        name: String,
        quantity: f64,
        has_filling: bool,
    },
    MixRiceHeader {
        name: String,
        quantity: f64,
        unit: Unit,
        master: MixRiceMaster,
        base_soup_gram: Option<f64>,
        base_percent: Option<f64>,
        disabled: bool,
    },
    MixRicePart {
        name: String,
        quantity: f64,
        unit: Unit,
        /// 検出中だった混ぜご飯の名前
        mix_rice: String,
    },
    MisoFilling {
        name: String,
        quantity: f64,
        unit: Unit,
        is_first_of_day: bool,
    },
    MisoFillingSplit {
        ko_name: String,
        ko_quantity: f64,
        gram_name: String,
        gram_quantity: f64,
        is_first_of_day: bool,
    },
    SoupFilling {
        name: String,
        quantity: f64,
        unit: Unit,
    },
    SoupFillingSplit {
        ko_name: String,
        ko_quantity: f64,
        gram_name: String,
        gram_quantity: f64,
    },
    SoupLiquid {
        name: String,
        quantity: f64,
        unit: Unit,
        master: SoupMaster,
    },
    MisoNone {
        name: String,
    },
    SoupNone {
        name: String,
    },
    Unclassified {
        name: String,
    },
}

impl RecordKind {
    /// 表示名
    pub fn name(&self) -> &str {
        match self {
            RecordKind::Plain { name, .. }
            | RecordKind::WithDensity { name, .. }
            | RecordKind::WithAnotherUnit { name, .. }
            | RecordKind::LiquidSeasoning { name, .. }
            | RecordKind::MixRiceHeader { name, .. }
            | RecordKind::MixRicePart { name, .. }
            | RecordKind::MisoFilling { name, .. }
            | RecordKind::SoupFilling { name, .. }
            | RecordKind::SoupLiquid { name, .. }
            | RecordKind::MisoNone { name }
            | RecordKind::SoupNone { name }
            | RecordKind::Unclassified { name } => name,
            RecordKind::KoGramDensity { original_name, .. }
            | RecordKind::KoGramPercent { original_name, .. }
            | RecordKind::GramGram { original_name, .. } => original_name,
            RecordKind::MisoFillingSplit { ko_name, .. }
            | RecordKind::SoupFillingSplit { ko_name, .. } => ko_name,
        }
    }

    /// 1人前の主たる数量
    pub fn quantity(&self) -> f64 {
        match self {
            RecordKind::Plain { quantity, .. }
            | RecordKind::WithDensity { quantity, .. }
            | RecordKind::WithAnotherUnit { quantity, .. }
            | RecordKind::LiquidSeasoning { quantity, .. }
            | RecordKind::MixRiceHeader { quantity, .. }
            | RecordKind::MixRicePart { quantity, .. }
            | RecordKind::MisoFilling { quantity, .. }
            | RecordKind::SoupFilling { quantity, .. }
            | RecordKind::SoupLiquid { quantity, .. } => *quantity,
            RecordKind::KoGramDensity { count_quantity, .. }
            | RecordKind::KoGramPercent { count_quantity, .. } => *count_quantity,
            RecordKind::GramGram { gram1, .. } => *gram1,
            RecordKind::MisoFillingSplit { ko_quantity, .. }
            | RecordKind::SoupFillingSplit { ko_quantity, .. } => *ko_quantity,
            RecordKind::MisoNone { .. }
            | RecordKind::SoupNone { .. }
            | RecordKind::Unclassified { .. } => 0.0,
        }
    }

    /// 主たる数量の単位（数値を持たない種別はNone）
    pub fn unit(&self) -> Option<Unit> {
        match self {
            RecordKind::Plain { unit, .. }
            | RecordKind::WithDensity { unit, .. }
            | RecordKind::WithAnotherUnit { unit, .. }
            | RecordKind::MixRiceHeader { unit, .. }
            | RecordKind::MixRicePart { unit, .. }
            | RecordKind::MisoFilling { unit, .. }
            | RecordKind::SoupFilling { unit, .. }
            | RecordKind::SoupLiquid { unit, .. } => Some(unit.clone()),
            RecordKind::KoGramDensity { .. }
            | RecordKind::KoGramPercent { .. }
            | RecordKind::MisoFillingSplit { .. }
            | RecordKind::SoupFillingSplit { .. } => Some(Unit::Piece),
            RecordKind::GramGram { .. } | RecordKind::LiquidSeasoning { .. } => Some(Unit::Gram),
            RecordKind::MisoNone { .. }
            | RecordKind::SoupNone { .. }
            | RecordKind::Unclassified { .. } => None,
        }
    }

    /// 液の割合(%)。液を持たない種別は0
    pub fn density(&self) -> f64 {
        match self {
            RecordKind::WithDensity { density, .. }
            | RecordKind::WithAnotherUnit { density, .. } => *density,
            _ => 0.0,
        }
    }

    /// 具材1個あたりの重量
    pub fn inner_gram(&self) -> Option<f64> {
        match self {
            RecordKind::WithDensity { inner_gram, .. }
            | RecordKind::KoGramDensity { inner_gram, .. } => *inner_gram,
            _ => None,
        }
    }

    /// 個・g・液に分けて計量するときの名前
    ///
    /// `[個の部分, gの部分, 液の部分]`。KoGramDensity以外はNone
    pub fn split_part_names(&self) -> Option<[String; 3]> {
        match self {
            RecordKind::KoGramDensity {
                names,
                count_quantity,
                gram_quantity,
                density,
                ..
            } => Some([
                format!("{}_{}{}個", names[0], names[1], count_quantity),
                format!("{}_{}{}g", names[0], names[2], gram_quantity),
                format!("{}_液{}g", names[0], density),
            ]),
            _ => None,
        }
    }

    /// 具材と液を合わせた1人前の重量
    pub fn total_gram(&self) -> Option<f64> {
        match self {
            RecordKind::KoGramDensity {
                gram_quantity,
                density,
                inner_gram,
                ..
            } => Some(gram_quantity + inner_gram.unwrap_or(0.0) + density),
            RecordKind::GramGram {
                gram1,
                gram2,
                density,
                ..
            } => Some(gram1 + gram2 + density),
            _ => None,
        }
    }

    pub fn is_soup_liquid(&self) -> bool {
        matches!(self, RecordKind::SoupLiquid { .. })
    }

    pub fn is_soup_filling(&self) -> bool {
        matches!(
            self,
            RecordKind::SoupFilling { .. } | RecordKind::SoupFillingSplit { .. }
        )
    }

    /// 汁・スープ系の種別か
    pub fn is_soup_like(&self) -> bool {
        matches!(
            self,
            RecordKind::MisoFilling { .. }
                | RecordKind::MisoFillingSplit { .. }
                | RecordKind::SoupFilling { .. }
                | RecordKind::SoupFillingSplit { .. }
                | RecordKind::SoupLiquid { .. }
                | RecordKind::MisoNone { .. }
                | RecordKind::SoupNone { .. }
        )
    }
}

/// 分類済みの1行
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedPlateRecord {
    pub index: i32,
    pub eating_day: NaiveDate,
    pub meal: Meal,
    pub glyph: Option<RoleGlyph>,
    pub marks: DishMarks,
    /// 調理指示書に記載されていた元の文字列
    pub before_name: String,
    pub kind: RecordKind,
}

impl ParsedPlateRecord {
    pub fn name(&self) -> &str {
        self.kind.name()
    }

    /// 食事グループのキー
    pub fn group_key(&self) -> (NaiveDate, Meal) {
        (self.eating_day, self.meal)
    }

    /// 少量扱いか（▼、または花形にんじん・コインキャロット1個）
    pub fn is_reduced_portion(&self) -> bool {
        if self.marks.is_less {
            return true;
        }
        let name = self.name();
        (name.contains("花形にんじん") || name.contains("コインキャロット"))
            && self.kind.quantity() == 1.0
            && self.kind.unit() == Some(Unit::Piece)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meal_from_str() {
        assert_eq!("朝食".parse::<Meal>().unwrap(), Meal::Breakfast);
        assert_eq!("昼".parse::<Meal>().unwrap(), Meal::Lunch);
        assert_eq!(" 夕食 ".parse::<Meal>().unwrap(), Meal::Dinner);
        assert!("間食".parse::<Meal>().is_err());
    }

    #[test]
    fn test_role_glyph_round_trip() {
        for c in ['①', '②', '③', '④', '⑤', '⑩'] {
            let glyph = RoleGlyph::from_char(c).expect("既知の丸数字");
            assert_eq!(glyph.symbol(), c);
        }
        assert_eq!(RoleGlyph::from_char('⑥'), None);
        assert!(is_circled_number('⑥'));
        assert!(!is_circled_number('■'));
    }

    #[test]
    fn test_unit_serde_as_string() {
        let json = serde_json::to_string(&Unit::Counter("尾".into())).unwrap();
        assert_eq!(json, "\"尾\"");
        let unit: Unit = serde_json::from_str("\"g\"").unwrap();
        assert_eq!(unit, Unit::Gram);
        let unit: Unit = serde_json::from_str("\"丁\"").unwrap();
        assert_eq!(unit, Unit::Block);
        assert!(serde_json::from_str::<Unit>("\"\"").is_err());
    }

    #[test]
    fn test_raw_plate_line_deserialize() {
        let json = r#"{
            "index": 0,
            "cookingDay": "2022-09-01",
            "eatingDay": "2022-09-03",
            "meal": "lunch",
            "rawName": "①鮭の塩焼き60ｇ1尾"
        }"#;
        let line: RawPlateLine = serde_json::from_str(json).unwrap();
        assert_eq!(line.meal, Meal::Lunch);
        assert_eq!(line.quantity, 0.0);
        assert_eq!(line.eating_day, NaiveDate::from_ymd_opt(2022, 9, 3).unwrap());
    }

    #[test]
    fn test_record_kind_accessors() {
        let kind = RecordKind::KoGramDensity {
            names: ["煮物".into(), "肉団子".into(), "小松菜".into()],
            count_quantity: 3.0,
            gram_quantity: 36.0,
            density: 60.0,
            original_name: "煮物（肉団子3個＋小松菜36g）＋液60g".into(),
            inner_gram: None,
        };
        assert_eq!(kind.quantity(), 3.0);
        assert_eq!(kind.unit(), Some(Unit::Piece));
        assert_eq!(kind.name(), "煮物（肉団子3個＋小松菜36g）＋液60g");

        let names = kind.split_part_names().unwrap();
        assert_eq!(names[0], "煮物_肉団子3個");
        assert_eq!(names[1], "煮物_小松菜36g");
        assert_eq!(names[2], "煮物_液60g");
        assert_eq!(kind.total_gram(), Some(96.0));

        let none = RecordKind::Unclassified { name: "すきやき76りっとる".into() };
        assert_eq!(none.quantity(), 0.0);
        assert_eq!(none.unit(), None);
    }

    #[test]
    fn test_record_kind_serialize_tag() {
        let kind = RecordKind::MisoNone { name: "味噌汁30cc".into() };
        let value = serde_json::to_value(&kind).unwrap();
        assert_eq!(value["type"], "misoNone");
        assert_eq!(value["name"], "味噌汁30cc");
    }
}
