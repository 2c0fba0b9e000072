//! 料理名の分類
//!
//! 調理指示書1行分の料理名を、数量・単位・液の割合を持つ`RecordKind`に分類する。
//! 判定は`RULES`の順に評価し、最初に一致したものを採用する。
//!
//! 行をまたいで持ち越す状態は`ClassifyState`として引数と戻り値で受け渡す。

use crate::error::{parse_number, Error, Result};
use crate::master::{Masters, UnitEntry};
use crate::normalize::{normalize_descriptor, split_glyph, take_marks, trim_part_name, GlyphHead};
use crate::types::{
    DishMarks, ParsedPlateRecord, RawPlateLine, RecordKind, RoleGlyph, SoupGroup, SoupMaster, Unit,
};
use regex::Regex;
use tracing::{debug, info, warn};

/// 行をまたいで持ち越す分類状態
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifyState {
    /// 検出中の混ぜご飯（マスタ名）
    pub tracking_mix_rice: Option<String>,
    /// 味噌汁を既に分類したか
    pub miso_seen: bool,
}

/// `＋液20g`・`＋10％`の指定
#[derive(Debug, Clone, Copy, PartialEq)]
struct Stock {
    value: f64,
    /// 「液同」（基本食と同じ濃さ）
    same_thickness: bool,
}

/// 分類対象の料理名
#[derive(Debug, Clone)]
struct Descriptor {
    glyph: Option<RoleGlyph>,
    /// 記録用の名前（丸数字・記号を除いた元の表記）
    name: String,
    /// 照合用の正規形
    norm: String,
    stock_gram: Option<Stock>,
    stock_percent: Option<Stock>,
}

impl Descriptor {
    fn new(glyph: Option<RoleGlyph>, name: &str) -> Result<Self> {
        lazy_static::lazy_static! {
            static ref DENSITY_G_RE: Regex =
                Regex::new(r"＋\s*(液同|液|汁【しる】|汁|)(\d+(?:\.\d+)?)g").unwrap();
            static ref DENSITY_P_RE: Regex =
                Regex::new(r"＋\s*(液同|液|)(\d+(?:\.\d+)?)％").unwrap();
        }

        let name = name.trim().to_string();
        let norm = normalize_descriptor(&name);

        let stock = |re: &Regex| -> Result<Option<Stock>> {
            match re.captures(&norm) {
                Some(cap) => Ok(Some(Stock {
                    value: parse_number(&cap[2])?,
                    same_thickness: &cap[1] == "液同",
                })),
                None => Ok(None),
            }
        };
        let stock_gram = stock(&DENSITY_G_RE)?;
        let stock_percent = stock(&DENSITY_P_RE)?;

        Ok(Self {
            glyph,
            name,
            norm,
            stock_gram,
            stock_percent,
        })
    }

    fn is_miso_soup(&self) -> bool {
        ["みそ汁", "味噌汁", "みそしる"]
            .iter()
            .any(|word| self.norm.contains(word))
    }

    fn is_same_thickness(&self) -> bool {
        self.norm.contains("液同")
    }
}

/// 一致したルールの結果
#[derive(Debug)]
struct Matched {
    kind: RecordKind,
    /// 次の行に持ち越す混ぜご飯名
    tracking: Option<String>,
}

impl From<RecordKind> for Matched {
    fn from(kind: RecordKind) -> Self {
        Self {
            kind,
            tracking: None,
        }
    }
}

/// 助数詞ごとの正規表現
#[derive(Debug)]
struct UnitRule {
    entry: UnitEntry,
    count_re: Regex,
    inner_re: Regex,
}

type RuleFn = fn(&DescriptorClassifier, &Descriptor, &ClassifyState) -> Result<Option<Matched>>;

/// 判定順
const RULES: &[(&str, RuleFn)] = &[
    ("soup", DescriptorClassifier::soup),
    ("mix_rice_header", DescriptorClassifier::mix_rice_header),
    ("mix_rice_part", DescriptorClassifier::mix_rice_part),
    ("seasoning", DescriptorClassifier::seasoning),
    ("sauce", DescriptorClassifier::sauce),
    ("unit_table", DescriptorClassifier::unit_table),
    ("count_with_liquid", DescriptorClassifier::count_with_liquid),
    ("ko_gram_density", DescriptorClassifier::ko_gram_density),
    ("gram_gram", DescriptorClassifier::gram_gram),
    ("bare_count", DescriptorClassifier::bare_count),
    ("bare_grams", DescriptorClassifier::bare_grams),
];

/// 料理名分類器
#[derive(Debug)]
pub struct DescriptorClassifier {
    masters: Masters,
    unit_rules: Vec<UnitRule>,
}

impl DescriptorClassifier {
    pub fn new(masters: Masters) -> Result<Self> {
        let unit_rules = masters
            .units
            .iter()
            .map(|entry| {
                let token = regex::escape(&entry.token);
                let count_re = Regex::new(&format!(r"(\d+){}", token))
                    .map_err(|e| Error::Config(e.to_string()))?;
                let inner_re = Regex::new(&format!(r"{}\s*(\d+(?:\.\d+)?)g\s*＋", token))
                    .map_err(|e| Error::Config(e.to_string()))?;
                Ok(UnitRule {
                    entry: entry.clone(),
                    count_re,
                    inner_re,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            masters,
            unit_rules,
        })
    }

    pub fn masters(&self) -> &Masters {
        &self.masters
    }

    /// 1行を分類し、次の行に渡す状態を返す
    ///
    /// 数値として読めないトークンを含む行は`Unclassified`になり、後続の行は通常どおり分類される。
    pub fn classify(
        &self,
        state: &ClassifyState,
        line: &RawPlateLine,
    ) -> (ParsedPlateRecord, ClassifyState) {
        let before_name = line.raw_name.trim();
        let (head, rest) = split_glyph(before_name);
        let mut next = ClassifyState {
            tracking_mix_rice: None,
            miso_seen: state.miso_seen,
        };

        let (glyph, marks, kind) = match head {
            GlyphHead::Unknown(c) => {
                debug!(index = line.index, glyph = %c, "対象外の丸数字");
                (
                    None,
                    DishMarks::default(),
                    RecordKind::Unclassified {
                        name: before_name.to_string(),
                    },
                )
            }
            GlyphHead::Known(RoleGlyph::Soup) => {
                let kind = self.run_rules(Some(RoleGlyph::Soup), rest, state, &mut next);
                (Some(RoleGlyph::Soup), DishMarks::default(), kind)
            }
            GlyphHead::Known(glyph) => {
                let (name, marks) = take_marks(rest);
                let kind = self.run_rules(Some(glyph), &name, state, &mut next);
                (Some(glyph), marks, kind)
            }
            GlyphHead::None => {
                let (name, marks) = take_marks(rest);
                let kind = self.run_rules(None, &name, state, &mut next);
                (None, marks, kind)
            }
        };

        if matches!(
            kind,
            RecordKind::MisoFilling { .. } | RecordKind::MisoFillingSplit { .. }
        ) {
            next.miso_seen = true;
        }

        debug!(index = line.index, name = before_name, kind = ?kind, "分類");

        let record = ParsedPlateRecord {
            index: line.index,
            eating_day: line.eating_day,
            meal: line.meal,
            glyph,
            marks,
            before_name: before_name.to_string(),
            kind,
        };
        (record, next)
    }

    /// 調理指示書の行を順に分類する
    pub fn classify_all(&self, lines: &[RawPlateLine]) -> Vec<ParsedPlateRecord> {
        let mut state = ClassifyState::default();
        lines
            .iter()
            .map(|line| {
                let (record, next) = self.classify(&state, line);
                state = next;
                record
            })
            .collect()
    }

    fn run_rules(
        &self,
        glyph: Option<RoleGlyph>,
        name: &str,
        state: &ClassifyState,
        next: &mut ClassifyState,
    ) -> RecordKind {
        let result = Descriptor::new(glyph, name).and_then(|d| {
            for (rule, apply) in RULES {
                if let Some(matched) = apply(self, &d, state)? {
                    debug!(rule, "ルール一致");
                    return Ok(matched);
                }
            }
            Ok(Matched::from(RecordKind::Unclassified { name: d.name }))
        });

        match result {
            Ok(matched) => {
                next.tracking_mix_rice = matched.tracking;
                matched.kind
            }
            Err(e) => {
                warn!(name, error = %e, "数値を解釈できないため未分類として扱います");
                RecordKind::Unclassified {
                    name: name.trim().to_string(),
                }
            }
        }
    }

    /// ⑤ 味噌汁・汁・スープ
    fn soup(&self, d: &Descriptor, state: &ClassifyState) -> Result<Option<Matched>> {
        lazy_static::lazy_static! {
            static ref KO_GRAM_RE: Regex =
                Regex::new(r"(\D*)(\d+)個(\D*)(\d+(?:\.\d+)?)g").unwrap();
            static ref GRAM_RE: Regex = Regex::new(r"(\d+(?:\.\d+)?)g").unwrap();
            static ref KO_RE: Regex = Regex::new(r"(\d+(?:\.\d+)?)個").unwrap();
        }

        if d.glyph != Some(RoleGlyph::Soup) {
            return Ok(None);
        }

        let is_first_of_day = !state.miso_seen;

        // ⑤味噌汁 里芋2個・さつま揚げ5g
        if let Some(cap) = KO_GRAM_RE.captures(&d.norm) {
            let ko_name = trim_part_name(&cap[1]);
            let ko_quantity = parse_number(&cap[2])?;
            let gram_name = trim_part_name(&cap[3]);
            let gram_quantity = parse_number(&cap[4])?;
            let kind = if d.is_miso_soup() {
                RecordKind::MisoFillingSplit {
                    ko_name,
                    ko_quantity,
                    gram_name,
                    gram_quantity,
                    is_first_of_day,
                }
            } else {
                RecordKind::SoupFillingSplit {
                    ko_name,
                    ko_quantity,
                    gram_name,
                    gram_quantity,
                }
            };
            return Ok(Some(kind.into()));
        }

        let single = if let Some(cap) = GRAM_RE.captures(&d.norm) {
            Some((parse_number(&cap[1])?, Unit::Gram))
        } else if let Some(cap) = KO_RE.captures(&d.norm) {
            Some((parse_number(&cap[1])?, Unit::Piece))
        } else {
            None
        };

        let name = d.name.clone();
        let kind = match single {
            Some((quantity, unit)) if d.is_miso_soup() => RecordKind::MisoFilling {
                name,
                quantity,
                unit,
                is_first_of_day,
            },
            Some((quantity, unit)) => match self.soup_master(d) {
                Some(master) => RecordKind::SoupLiquid {
                    name,
                    quantity,
                    unit,
                    master,
                },
                None => RecordKind::SoupFilling {
                    name,
                    quantity,
                    unit,
                },
            },
            // ⑤味噌汁30cc 希釈140
            None if d.is_miso_soup() => RecordKind::MisoNone { name },
            // ⑤スープの具（コーン）
            None => RecordKind::SoupNone { name },
        };
        Ok(Some(kind.into()))
    }

    /// 汁・スープ本体ならマスタを返す。具ならNone
    fn soup_master(&self, d: &Descriptor) -> Option<SoupMaster> {
        if d.norm.contains('具') {
            return None;
        }

        if d.norm.contains("スープ") || d.norm.contains('汁') {
            let master = self
                .masters
                .find_soup(&d.norm, None)
                .cloned()
                .unwrap_or_else(|| SoupMaster {
                    name: d.name.clone(),
                    search_word: String::new(),
                    group: SoupGroup::Soup,
                });
            return Some(master);
        }

        // 「スープ」「汁」が付かないが汁として扱うもの（お吸い物など）
        self.masters
            .find_soup(&d.norm, Some(SoupGroup::Liquid))
            .cloned()
    }

    /// ① 混ぜご飯本体
    ///
    /// 検出中に別の本体行が来ても本体として扱い、検出対象を切り替える。
    /// 同じ名前が続いた場合は相互参照の段階で後の行を無効にする。
    fn mix_rice_header(&self, d: &Descriptor, state: &ClassifyState) -> Result<Option<Matched>> {
        lazy_static::lazy_static! {
            static ref KO_RE: Regex = Regex::new(r"(\d+)個").unwrap();
            static ref GRAM_RE: Regex = Regex::new(r"(\d+(?:\.\d+)?)g").unwrap();
        }

        if d.glyph != Some(RoleGlyph::Main) {
            return Ok(None);
        }
        let master = match self.masters.find_mix_rice(&d.norm) {
            Some(master) => master,
            None => return Ok(None),
        };

        let by_unit = self
            .unit_rules
            .iter()
            .find_map(|rule| rule.count_re.captures(&d.norm).map(|cap| (rule, cap)));

        let (quantity, unit) = if let Some((rule, cap)) = by_unit {
            (parse_number(&cap[1])?, Unit::Counter(rule.entry.token.clone()))
        } else if let Some(cap) = KO_RE.captures(&d.norm) {
            (parse_number(&cap[1])?, Unit::Piece)
        } else if let Some(cap) = GRAM_RE.captures(&d.norm) {
            (parse_number(&cap[1])?, Unit::Gram)
        } else {
            info!(name = %d.name, "混ぜご飯の数量が不明です");
            (0.0, Unit::Gram)
        };

        if let Some(previous) = &state.tracking_mix_rice {
            info!(previous = %previous, current = %master.name, "混ぜご飯の検出中に別の本体行があります");
        }

        Ok(Some(Matched {
            kind: RecordKind::MixRiceHeader {
                name: d.name.clone(),
                quantity,
                unit,
                master: master.clone(),
                base_soup_gram: d.stock_gram.map(|s| s.value),
                base_percent: d.stock_percent.map(|s| s.value),
                disabled: false,
            },
            tracking: Some(master.name.clone()),
        }))
    }

    /// ④ 混ぜご飯の具・酢など（混ぜご飯の検出中は無条件）
    fn mix_rice_part(&self, d: &Descriptor, state: &ClassifyState) -> Result<Option<Matched>> {
        lazy_static::lazy_static! {
            static ref GRAM_RE: Regex = Regex::new(r"(\d+(?:\.\d+)?)g").unwrap();
            static ref KO_RE: Regex = Regex::new(r"(\d+(?:\.\d+)?)個").unwrap();
        }

        let mix_rice = match (&state.tracking_mix_rice, d.glyph) {
            (Some(mix_rice), Some(RoleGlyph::Accessory)) => mix_rice,
            _ => return Ok(None),
        };

        let (quantity, unit) = if let Some(cap) = GRAM_RE.captures(&d.norm) {
            (parse_number(&cap[1])?, Unit::Gram)
        } else if let Some(cap) = KO_RE.captures(&d.norm) {
            (parse_number(&cap[1])?, Unit::Piece)
        } else {
            info!(name = %d.name, "混ぜご飯の具の数量が不明です");
            (0.0, Unit::Gram)
        };

        Ok(Some(Matched {
            kind: RecordKind::MixRicePart {
                name: d.name.clone(),
                quantity,
                unit,
                mix_rice: mix_rice.clone(),
            },
            tracking: Some(mix_rice.clone()),
        }))
    }

    /// ④■ポン酢7g
    fn seasoning(&self, d: &Descriptor, _state: &ClassifyState) -> Result<Option<Matched>> {
        lazy_static::lazy_static! {
            static ref SMALL_RE: Regex = Regex::new(r"■\D*(\d+(?:\.\d+)?)g").unwrap();
            static ref FILLING_RE: Regex = Regex::new(r"\[(.*)\]").unwrap();
        }

        let cap = match SMALL_RE.captures(&d.norm) {
            Some(cap) => cap,
            None => return Ok(None),
        };

        Ok(Some(
            RecordKind::LiquidSeasoning {
                name: d.name.replace('■', "").trim().to_string(),
                quantity: parse_number(&cap[1])?,
                has_filling: FILLING_RE.is_match(&d.norm),
            }
            .into(),
        ))
    }

    /// ④タルタルソース7g
    fn sauce(&self, d: &Descriptor, _state: &ClassifyState) -> Result<Option<Matched>> {
        lazy_static::lazy_static! {
            static ref LIQUID_RE: Regex = Regex::new(r"\D*(\d+(?:\.\d+)?)g").unwrap();
            static ref FILLING_RE: Regex = Regex::new(r"\[(.*)\]").unwrap();
            static ref BRACKET_RE: Regex = Regex::new(r"\[.*\]").unwrap();
            static ref GRAM_TOKEN_RE: Regex = Regex::new(r"\d*(?:\.\d*)?g").unwrap();
        }

        let cap = match LIQUID_RE.captures(&d.norm) {
            Some(cap) => cap,
            None => return Ok(None),
        };

        let without_filling = BRACKET_RE.replace_all(&d.norm, "");
        let stripped = GRAM_TOKEN_RE.replace_all(&without_filling, "");
        if !stripped.trim_end().ends_with("ソース") {
            return Ok(None);
        }

        Ok(Some(
            RecordKind::LiquidSeasoning {
                name: d.name.clone(),
                quantity: parse_number(&cap[1])?,
                has_filling: FILLING_RE.is_match(&d.norm),
            }
            .into(),
        ))
    }

    /// 助数詞の表と「丁」（①鮭の塩焼き60ｇ1尾、④いんげん2本、③サラダ1/2丁）
    fn unit_table(&self, d: &Descriptor, _state: &ClassifyState) -> Result<Option<Matched>> {
        lazy_static::lazy_static! {
            static ref CHO_RE: Regex = Regex::new(r"(\d+(?:÷\d+)?)丁").unwrap();
            static ref CHO_INNER_RE: Regex = Regex::new(r"丁\s*(\d+(?:\.\d+)?)g\s*＋").unwrap();
        }

        for rule in &self.unit_rules {
            if let Some(cap) = rule.count_re.captures(&d.norm) {
                let quantity = parse_number(&cap[1])?;
                let unit = Unit::Counter(rule.entry.token.clone());
                let kind = self.density_branch(d, quantity, unit, &rule.inner_re, rule.entry.portion)?;
                return Ok(Some(kind.into()));
            }
        }

        if let Some(cap) = CHO_RE.captures(&d.norm) {
            let quantity = parse_fraction(&cap[1])?;
            let kind = self.density_branch(d, quantity, Unit::Block, &CHO_INNER_RE, false)?;
            return Ok(Some(kind.into()));
        }

        Ok(None)
    }

    /// ①ハンバーグ1個 ＋ 液20g（％の指定がないもの）
    fn count_with_liquid(&self, d: &Descriptor, _state: &ClassifyState) -> Result<Option<Matched>> {
        lazy_static::lazy_static! {
            static ref KO_LIQUID_RE: Regex =
                Regex::new(r"(\d+)個\D*液(\d+(?:\.\d+)?)g").unwrap();
        }

        let cap = match KO_LIQUID_RE.captures(&d.norm) {
            Some(cap) => cap,
            None => return Ok(None),
        };
        if generic_percent(&d.norm)? != 0.0 {
            return Ok(None);
        }

        let count = parse_number(&cap[1])?;
        let gram = parse_number(&cap[2])?;
        if count == 0.0 {
            return Err(Error::ZeroQuantity {
                token: cap[0].to_string(),
            });
        }

        Ok(Some(
            RecordKind::WithDensity {
                name: d.name.clone(),
                quantity: count,
                unit: Unit::Piece,
                density: gram / count * 100.0,
                is_same_thickness: d.is_same_thickness(),
                is_density_fixed: true,
                inner_gram: None,
            }
            .into(),
        ))
    }

    /// 個＋g＋液の複合形
    fn ko_gram_density(&self, d: &Descriptor, _state: &ClassifyState) -> Result<Option<Matched>> {
        lazy_static::lazy_static! {
            // 煮物 肉団子3個＋小松菜36g ＋液60g
            static ref KO_G_DEN_G_RE: Regex = Regex::new(
                r"(\D+)\s(\D+)(\d+)個＋(\D+)(\d+(?:\.\d+)?)g\s＋\D*(\d+(?:\.\d+)?)g"
            ).unwrap();
            // 煮物 肉団子3個 10g ＋小松菜36g ＋10％
            static ref KO_INNER_G_DEN_P_RE: Regex = Regex::new(
                r"(\D+)\s(\D+)(\d+)個\s(\d+(?:\.\d+)?)g\s＋(\D+)(\d+(?:\.\d+)?)g\s＋\D*(\d+(?:\.\d+)?)％"
            ).unwrap();
            // れんこん煮物 れんこん1個＋いんげん4g ＋9％
            static ref KO_G_P_RE: Regex = Regex::new(
                r"(\D+)\s(\D+)(\d+)個\s*＋(\D+)(\d+(?:\.\d+)?)g\s＋\D*(\d+(?:\.\d+)?)％"
            ).unwrap();
            // 煮物 肉団子3個 10g ＋小松菜36g ＋10g
            static ref KO_INNER_G_DEN_G_RE: Regex = Regex::new(
                r"(\D+)\s(\D+)(\d+)個\s(\d+(?:\.\d+)?)g\s＋(\D+)(\d+(?:\.\d+)?)g\s＋\D*(\d+(?:\.\d+)?)g"
            ).unwrap();
            // 食べるスープの具 団子4個＋具60g
            static ref KO_G_RE: Regex = Regex::new(
                r"(\D+)\s(\D+)(\d+)個＋(\D+)(\d+(?:\.\d+)?)g"
            ).unwrap();
        }

        let original_name = d.name.clone();

        if let Some(cap) = KO_G_DEN_G_RE.captures(&d.norm) {
            return Ok(Some(
                RecordKind::KoGramDensity {
                    names: part_names(&cap, 1, 2, 4),
                    count_quantity: parse_number(&cap[3])?,
                    gram_quantity: parse_number(&cap[5])?,
                    density: parse_number(&cap[6])?,
                    original_name,
                    inner_gram: None,
                }
                .into(),
            ));
        }

        if let Some(cap) = KO_INNER_G_DEN_P_RE.captures(&d.norm) {
            let inner = parse_number(&cap[4])?;
            let gram = parse_number(&cap[6])?;
            let percent = parse_number(&cap[7])?;
            return Ok(Some(
                RecordKind::KoGramDensity {
                    names: part_names(&cap, 1, 2, 5),
                    count_quantity: parse_number(&cap[3])?,
                    gram_quantity: gram,
                    density: round2((inner + gram) / 100.0 * percent),
                    original_name,
                    inner_gram: Some(inner),
                }
                .into(),
            ));
        }

        if let Some(cap) = KO_G_P_RE.captures(&d.norm) {
            return Ok(Some(
                RecordKind::KoGramPercent {
                    names: part_names(&cap, 1, 2, 4),
                    count_quantity: parse_number(&cap[3])?,
                    gram_quantity: parse_number(&cap[5])?,
                    percent: parse_number(&cap[6])?,
                    original_name,
                }
                .into(),
            ));
        }

        if let Some(cap) = KO_INNER_G_DEN_G_RE.captures(&d.norm) {
            return Ok(Some(
                RecordKind::KoGramDensity {
                    names: part_names(&cap, 1, 2, 5),
                    count_quantity: parse_number(&cap[3])?,
                    gram_quantity: parse_number(&cap[6])?,
                    density: parse_number(&cap[7])?,
                    original_name,
                    inner_gram: Some(parse_number(&cap[4])?),
                }
                .into(),
            ));
        }

        if let Some(cap) = KO_G_RE.captures(&d.norm) {
            return Ok(Some(
                RecordKind::KoGramDensity {
                    names: part_names(&cap, 1, 2, 4),
                    count_quantity: parse_number(&cap[3])?,
                    gram_quantity: parse_number(&cap[5])?,
                    density: 0.0,
                    original_name,
                    inner_gram: None,
                }
                .into(),
            ));
        }

        Ok(None)
    }

    /// g＋g＋液（麻婆豆腐 豆腐90g＋ミンチ22g ＋25％）
    fn gram_gram(&self, d: &Descriptor, _state: &ClassifyState) -> Result<Option<Matched>> {
        lazy_static::lazy_static! {
            static ref G_G_P_RE: Regex = Regex::new(
                r"(\D+)\s(\D+)(\d+(?:\.\d+)?)g＋(\D+)(\d+(?:\.\d+)?)g\s＋\D*(\d+(?:\.\d+)?)％"
            ).unwrap();
            static ref G_G_G_RE: Regex = Regex::new(
                r"(\D+)\s(\D+)(\d+(?:\.\d+)?)g＋(\D+)(\d+(?:\.\d+)?)g\s＋\D*(\d+(?:\.\d+)?)g"
            ).unwrap();
        }

        let (cap, is_percent) = if let Some(cap) = G_G_P_RE.captures(&d.norm) {
            (cap, true)
        } else if let Some(cap) = G_G_G_RE.captures(&d.norm) {
            (cap, false)
        } else {
            return Ok(None);
        };

        let gram1 = parse_number(&cap[3])?;
        let gram2 = parse_number(&cap[5])?;
        let value = parse_number(&cap[6])?;
        let density = if is_percent {
            round2((gram1 + gram2) / 100.0 * value)
        } else {
            round2(value)
        };

        Ok(Some(
            RecordKind::GramGram {
                names: part_names(&cap, 1, 2, 4),
                gram1,
                gram2,
                density,
                original_name: d.name.clone(),
            }
            .into(),
        ))
    }

    /// ①白身フライ60g1個
    fn bare_count(&self, d: &Descriptor, _state: &ClassifyState) -> Result<Option<Matched>> {
        lazy_static::lazy_static! {
            static ref KO_RE: Regex = Regex::new(r"(\d+)個").unwrap();
            static ref KO_INNER_RE: Regex = Regex::new(r"個\s*(\d+(?:\.\d+)?)g\s*＋").unwrap();
        }

        match KO_RE.captures(&d.norm) {
            Some(cap) => {
                let quantity = parse_number(&cap[1])?;
                let kind = self.density_branch(d, quantity, Unit::Piece, &KO_INNER_RE, false)?;
                Ok(Some(kind.into()))
            }
            None => Ok(None),
        }
    }

    /// ①すきやき76g+48g
    fn bare_grams(&self, d: &Descriptor, _state: &ClassifyState) -> Result<Option<Matched>> {
        lazy_static::lazy_static! {
            static ref GRAM_RE: Regex = Regex::new(r"(\d+(?:\.\d+)?)g").unwrap();
        }

        let mut grams = GRAM_RE.captures_iter(&d.norm);
        let quantity = match grams.next() {
            Some(cap) => parse_number(&cap[1])?,
            None => return Ok(None),
        };
        let quantity2 = match grams.next() {
            Some(cap) => Some(parse_number(&cap[1])?),
            None => None,
        };

        Ok(Some(
            RecordKind::WithAnotherUnit {
                name: d.name.clone(),
                quantity,
                unit: Unit::Gram,
                density: generic_percent(&d.norm)?,
                quantity2,
                unit2: quantity2.map(|_| Unit::Gram),
            }
            .into(),
        ))
    }

    /// 数量が取れた行の液の扱いを決める
    ///
    /// `＋液Dg`があれば1単位あたりの割合に換算、`＋D％`があれば具材重量に対する割合、
    /// どちらもなければ名前中の％をそのまま使う。
    fn density_branch(
        &self,
        d: &Descriptor,
        quantity: f64,
        unit: Unit,
        inner_re: &Regex,
        portion: bool,
    ) -> Result<RecordKind> {
        let name = d.name.clone();

        if let Some(stock) = d.stock_gram {
            ensure_non_zero(quantity, &d.norm)?;
            return Ok(RecordKind::WithDensity {
                name,
                quantity,
                unit,
                density: stock.value / quantity * 100.0,
                is_same_thickness: stock.same_thickness,
                is_density_fixed: true,
                inner_gram: None,
            });
        }

        if let Some(stock) = d.stock_percent {
            if let Some(cap) = inner_re.captures(&d.norm) {
                let inner = parse_number(&cap[1])?;
                ensure_non_zero(quantity, &d.norm)?;
                return Ok(RecordKind::WithDensity {
                    name,
                    quantity,
                    unit,
                    density: inner_density(stock.value, inner, quantity),
                    is_same_thickness: stock.same_thickness,
                    is_density_fixed: true,
                    inner_gram: Some(inner),
                });
            }
            return Ok(RecordKind::WithDensity {
                name,
                quantity,
                unit,
                density: generic_percent(&d.norm)?,
                is_same_thickness: stock.same_thickness,
                is_density_fixed: false,
                inner_gram: None,
            });
        }

        let density = generic_percent(&d.norm)?;
        let is_same_thickness = d.is_same_thickness();
        if portion && density == 0.0 && !is_same_thickness {
            return Ok(RecordKind::Plain {
                name,
                quantity,
                unit,
            });
        }

        Ok(RecordKind::WithDensity {
            name,
            quantity,
            unit,
            density,
            is_same_thickness,
            is_density_fixed: false,
            inner_gram: None,
        })
    }
}

/// 名前中の％の値（3つ以上あれば最後、それ以外は最初。なければ0）
///
/// 例: かぼちゃの煮物2個＋ 赤キャップ4.5％＋水10.5％ で15％
pub fn generic_percent(name: &str) -> Result<f64> {
    lazy_static::lazy_static! {
        static ref PERCENT_RE: Regex = Regex::new(r"(\d+(?:\.\d+)?)％").unwrap();
    }

    let values: Vec<&str> = PERCENT_RE
        .captures_iter(name)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str()))
        .collect();

    let picked = if values.len() >= 3 {
        values.last()
    } else {
        values.first()
    };
    match picked {
        Some(token) => parse_number(token),
        None => Ok(0.0),
    }
}

/// 具材重量に対する液の割合を、1単位あたりの割合に換算
fn inner_density(percent: f64, inner_gram: f64, quantity: f64) -> f64 {
    inner_gram * (percent / 100.0) / quantity * 100.0
}

/// 「1÷2」のような分数表記
fn parse_fraction(token: &str) -> Result<f64> {
    match token.split_once('÷') {
        Some((numerator, denominator)) => {
            let numerator = parse_number(numerator)?;
            let denominator = parse_number(denominator)?;
            if denominator == 0.0 {
                return Err(Error::ZeroQuantity {
                    token: token.to_string(),
                });
            }
            Ok(numerator / denominator)
        }
        None => parse_number(token),
    }
}

fn part_names(cap: &regex::Captures<'_>, a: usize, b: usize, c: usize) -> [String; 3] {
    [
        trim_part_name(&cap[a]),
        trim_part_name(&cap[b]),
        trim_part_name(&cap[c]),
    ]
}

fn ensure_non_zero(quantity: f64, token: &str) -> Result<()> {
    if quantity == 0.0 {
        return Err(Error::ZeroQuantity {
            token: token.to_string(),
        });
    }
    Ok(())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Meal;
    use chrono::NaiveDate;

    fn line(index: i32, name: &str) -> RawPlateLine {
        RawPlateLine {
            index,
            cooking_day: NaiveDate::from_ymd_opt(2022, 9, 1).unwrap(),
            eating_day: NaiveDate::from_ymd_opt(2022, 9, 3).unwrap(),
            meal: Meal::Lunch,
            raw_name: name.to_string(),
            quantity: 0.0,
            unit: String::new(),
        }
    }

    fn classifier() -> DescriptorClassifier {
        DescriptorClassifier::new(Masters::builtin()).unwrap()
    }

    fn classify_one(name: &str) -> ParsedPlateRecord {
        classifier().classify(&ClassifyState::default(), &line(0, name)).0
    }

    #[test]
    fn test_miso_split_scenario() {
        let record = classify_one("⑤味噌汁 里芋2個・さつま揚げ5g ");
        assert_eq!(
            record.kind,
            RecordKind::MisoFillingSplit {
                ko_name: "味噌汁 里芋".into(),
                ko_quantity: 2.0,
                gram_name: "さつま揚げ".into(),
                gram_quantity: 5.0,
                is_first_of_day: true,
            }
        );
        assert_eq!(record.glyph, Some(RoleGlyph::Soup));
    }

    #[test]
    fn test_soup_split_without_miso() {
        let record = classify_one("⑤すまし汁 里芋2個・さつま揚げ5g");
        assert!(matches!(record.kind, RecordKind::SoupFillingSplit { .. }), "{:?}", record.kind);
    }

    #[test]
    fn test_miso_filling_gram() {
        let record = classify_one("⑤味噌汁具（玉葱・しめじ）16g");
        match record.kind {
            RecordKind::MisoFilling { name, quantity, unit, is_first_of_day } => {
                assert_eq!(name, "味噌汁具（玉葱・しめじ）16g");
                assert_eq!(quantity, 16.0);
                assert_eq!(unit, Unit::Gram);
                assert!(is_first_of_day);
            }
            other => panic!("味噌汁具として判定されるべき: {:?}", other),
        }
    }

    #[test]
    fn test_soup_filling_and_liquid() {
        assert!(matches!(
            classify_one("⑤コンソメ（玉葱・人参）16g").kind,
            RecordKind::SoupFilling { .. }
        ));
        assert!(matches!(
            classify_one("⑤すまし具（菜の花・大根）16g").kind,
            RecordKind::SoupFilling { .. }
        ));
        assert!(matches!(
            classify_one("⑤すまし汁具 菜の花・大根 16g").kind,
            RecordKind::SoupFilling { .. }
        ));

        match classify_one("⑤スープ希釈 コンソメ 29.45g 150g水入れる").kind {
            RecordKind::SoupLiquid { quantity, master, .. } => {
                assert_eq!(quantity, 29.45);
                assert_eq!(master.name, "コンソメスープ");
            }
            other => panic!("スープとして判定されるべき: {:?}", other),
        }

        match classify_one("⑤お吸い物希釈 10g").kind {
            RecordKind::SoupLiquid { master, .. } => assert_eq!(master.name, "お吸い物"),
            other => panic!("お吸い物として判定されるべき: {:?}", other),
        }

        match classify_one("⑤ポタージュスープ　16g　水150g").kind {
            RecordKind::SoupLiquid { master, .. } => assert_eq!(master.name, "ポタージュスープ"),
            other => panic!("ポタージュとして判定されるべき: {:?}", other),
        }
    }

    #[test]
    fn test_soup_liquid_without_master() {
        match classify_one("⑤豚汁希釈 20g").kind {
            RecordKind::SoupLiquid { master, .. } => assert_eq!(master.name, "豚汁希釈 20g"),
            other => panic!("マスタ外の汁も汁として扱う: {:?}", other),
        }
    }

    #[test]
    fn test_soup_none() {
        assert!(matches!(classify_one("⑤味噌汁30cc 希釈140").kind, RecordKind::MisoNone { .. }));
        assert!(matches!(classify_one("⑤スープの具（コーン）").kind, RecordKind::SoupNone { .. }));
    }

    #[test]
    fn test_miso_first_of_day_only_once() {
        let c = classifier();
        let records = c.classify_all(&[
            line(0, "⑤味噌汁具（わかめ0.9g）"),
            line(1, "⑤みそ汁（人参5g）"),
        ]);
        assert!(matches!(records[0].kind, RecordKind::MisoFilling { is_first_of_day: true, .. }));
        assert!(matches!(records[1].kind, RecordKind::MisoFilling { is_first_of_day: false, .. }));
    }

    #[test]
    fn test_plain_portion_scenario() {
        let record = classify_one("①鮭の塩焼き60ｇ1尾");
        assert_eq!(
            record.kind,
            RecordKind::Plain {
                name: "鮭の塩焼き60ｇ1尾".into(),
                quantity: 1.0,
                unit: Unit::Counter("尾".into()),
            }
        );

        let record = classify_one("①鰆照り焼き1切れ");
        assert!(matches!(
            record.kind,
            RecordKind::Plain { quantity, ref unit, .. } if quantity == 1.0 && unit.as_str() == "切"
        ));
    }

    #[test]
    fn test_counter_with_zero_density_scenario() {
        let record = classify_one("④いんげん2本");
        match record.kind {
            RecordKind::WithDensity { quantity, unit, density, is_density_fixed, .. } => {
                assert_eq!(quantity, 2.0);
                assert_eq!(unit, Unit::Counter("本".into()));
                assert_eq!(density, 0.0);
                assert!(!is_density_fixed);
            }
            other => panic!("WithDensityになるべき: {:?}", other),
        }
    }

    #[test]
    fn test_unit_with_stock_gram() {
        match classify_one("②ちくわ磯辺揚げ2本＋液同10g").kind {
            RecordKind::WithDensity { density, is_same_thickness, is_density_fixed, .. } => {
                assert_eq!(density, 500.0);
                assert!(is_same_thickness);
                assert!(is_density_fixed);
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn test_count_with_inner_percent() {
        // 2個(1個30g) 液は具材の10％ → 1個あたり 30*0.1/2*100
        match classify_one("②里芋煮2個 30g ＋10％").kind {
            RecordKind::WithDensity { quantity, unit, density, inner_gram, is_density_fixed, .. } => {
                assert_eq!(quantity, 2.0);
                assert_eq!(unit, Unit::Piece);
                assert!((density - 150.0).abs() < 1e-9);
                assert_eq!(inner_gram, Some(30.0));
                assert!(is_density_fixed);
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn test_block_fraction() {
        match classify_one("③サラダ（枝豆・豆腐）1/2丁").kind {
            RecordKind::WithDensity { quantity, unit, .. } => {
                assert_eq!(quantity, 0.5);
                assert_eq!(unit, Unit::Block);
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn test_block_zero_denominator_is_unclassified() {
        let record = classify_one("③冷奴1/0丁");
        assert!(matches!(record.kind, RecordKind::Unclassified { .. }));
    }

    #[test]
    fn test_piece_scenario() {
        match classify_one("①白身フライ60g1個").kind {
            RecordKind::WithDensity { quantity, unit, density, .. } => {
                assert_eq!(quantity, 1.0);
                assert_eq!(unit, Unit::Piece);
                assert_eq!(density, 0.0);
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn test_count_with_liquid() {
        match classify_one("①トマトソース煮込みハンバーグ1個 + 液20g").kind {
            RecordKind::WithDensity { quantity, density, is_density_fixed, .. } => {
                assert_eq!(quantity, 1.0);
                assert_eq!(density, 2000.0);
                assert!(is_density_fixed);
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn test_ko_gram_density_shapes() {
        match classify_one("②煮物（肉団子3個＋小松菜36g）＋液60g").kind {
            RecordKind::KoGramDensity { names, count_quantity, gram_quantity, density, inner_gram, .. } => {
                assert_eq!(names, ["煮物".to_string(), "肉団子".into(), "小松菜".into()]);
                assert_eq!(count_quantity, 3.0);
                assert_eq!(gram_quantity, 36.0);
                assert_eq!(density, 60.0);
                assert_eq!(inner_gram, None);
            }
            other => panic!("{:?}", other),
        }

        match classify_one("②煮物（肉団子3個(10g)＋小松菜36g）+10％").kind {
            RecordKind::KoGramDensity { density, inner_gram, gram_quantity, .. } => {
                assert_eq!(density, 4.6);
                assert_eq!(inner_gram, Some(10.0));
                assert_eq!(gram_quantity, 36.0);
            }
            other => panic!("{:?}", other),
        }

        match classify_one("②煮物（肉団子3個(10g)＋小松菜36g）+10g").kind {
            RecordKind::KoGramDensity { density, inner_gram, .. } => {
                assert_eq!(density, 10.0);
                assert_eq!(inner_gram, Some(10.0));
            }
            other => panic!("{:?}", other),
        }

        match classify_one("①食【た】べるスープの具【ぐ】（団子4個+具60ｇ）").kind {
            RecordKind::KoGramDensity { count_quantity, gram_quantity, density, .. } => {
                assert_eq!(count_quantity, 4.0);
                assert_eq!(gram_quantity, 60.0);
                assert_eq!(density, 0.0);
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn test_ko_gram_percent() {
        match classify_one("②れんこん煮物（れんこん1個+いんげん4ｇ）+9%").kind {
            RecordKind::KoGramPercent { names, count_quantity, gram_quantity, percent, .. } => {
                assert_eq!(names[1], "れんこん");
                assert_eq!(names[2], "いんげん");
                assert_eq!(count_quantity, 1.0);
                assert_eq!(gram_quantity, 4.0);
                assert_eq!(percent, 9.0);
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn test_gram_gram() {
        match classify_one("②麻婆豆腐（豆腐90g+ミンチ22g）+25％").kind {
            RecordKind::GramGram { names, gram1, gram2, density, .. } => {
                assert_eq!(names[0], "麻婆豆腐");
                assert_eq!(gram1, 90.0);
                assert_eq!(gram2, 22.0);
                assert_eq!(density, 28.0);
            }
            other => panic!("{:?}", other),
        }

        match classify_one("②麻婆豆腐（豆腐90g+ミンチ22g）+液25g").kind {
            RecordKind::GramGram { density, .. } => assert_eq!(density, 25.0),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn test_bare_grams() {
        match classify_one("①すきやき76g+48g").kind {
            RecordKind::WithAnotherUnit { quantity, unit, quantity2, unit2, .. } => {
                assert_eq!(quantity, 76.0);
                assert_eq!(unit, Unit::Gram);
                assert_eq!(quantity2, Some(48.0));
                assert_eq!(unit2, Some(Unit::Gram));
            }
            other => panic!("{:?}", other),
        }

        match classify_one("②ほうれん草山葵和え42.75g+10％").kind {
            RecordKind::WithAnotherUnit { quantity, density, .. } => {
                assert_eq!(quantity, 42.75);
                assert_eq!(density, 10.0);
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn test_unclassified() {
        let record = classify_one("①すきやき76りっとる");
        assert_eq!(
            record.kind,
            RecordKind::Unclassified {
                name: "すきやき76りっとる".into()
            }
        );
        assert_eq!(record.kind.quantity(), 0.0);

        let record = classify_one("⑥デザート1個");
        assert!(matches!(record.kind, RecordKind::Unclassified { .. }));
        assert_eq!(record.glyph, None);
    }

    #[test]
    fn test_malformed_number_is_unclassified() {
        // アラビア数字以外の数字は数値として読めない
        let record = classify_one("①すきやき٧٦g");
        assert!(matches!(record.kind, RecordKind::Unclassified { .. }));
    }

    #[test]
    fn test_seasoning_and_sauce() {
        assert_eq!(
            classify_one("④■ポン酢7g").kind,
            RecordKind::LiquidSeasoning {
                name: "ポン酢7g".into(),
                quantity: 7.0,
                has_filling: false,
            }
        );
        assert_eq!(
            classify_one("①■しかく1g").kind,
            RecordKind::LiquidSeasoning {
                name: "しかく1g".into(),
                quantity: 1.0,
                has_filling: false,
            }
        );

        match classify_one("④タルタルソース[玉葱]7g").kind {
            RecordKind::LiquidSeasoning { quantity, has_filling, .. } => {
                assert_eq!(quantity, 7.0);
                assert!(has_filling);
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn test_marks_are_stripped() {
        let record = classify_one("③▼副菜1個");
        assert_eq!(record.name(), "副菜1個");
        assert!(record.marks.is_less);
        assert_eq!(record.before_name, "③▼副菜1個");
    }

    #[test]
    fn test_mix_rice_tracking() {
        let c = classifier();
        let records = c.classify_all(&[
            line(0, "①栗【くり】ご飯200g"),
            line(1, "④栗20g"),
            line(2, "④酢1個"),
            line(3, "②煮物 人参30g"),
            line(4, "④漬物10g"),
        ]);

        match &records[0].kind {
            RecordKind::MixRiceHeader { quantity, unit, master, disabled, .. } => {
                assert_eq!(*quantity, 200.0);
                assert_eq!(*unit, Unit::Gram);
                assert_eq!(master.name, "栗ご飯");
                assert!(!disabled);
            }
            other => panic!("{:?}", other),
        }
        assert!(matches!(
            &records[1].kind,
            RecordKind::MixRicePart { quantity, mix_rice, .. } if *quantity == 20.0 && mix_rice == "栗ご飯"
        ));
        assert!(matches!(
            &records[2].kind,
            RecordKind::MixRicePart { unit: Unit::Piece, .. }
        ));
        // ②で検出が終わるため、以降の④は具にならない
        assert!(matches!(records[4].kind, RecordKind::WithAnotherUnit { .. }));
    }

    #[test]
    fn test_mix_rice_header_while_tracking() {
        let c = classifier();
        let records = c.classify_all(&[
            line(0, "①五目ご飯150g"),
            line(1, "①栗【くり】ご飯200g"),
            line(2, "④栗20g"),
        ]);

        assert!(matches!(
            &records[1].kind,
            RecordKind::MixRiceHeader { master, disabled: false, .. } if master.name == "栗ご飯"
        ));
        // 具は後から来た本体に付く
        assert!(matches!(
            &records[2].kind,
            RecordKind::MixRicePart { mix_rice, .. } if mix_rice == "栗ご飯"
        ));
    }

    #[test]
    fn test_mix_rice_header_stock() {
        let record = classify_one("①五目ご飯150g ＋液30g ＋10％");
        match record.kind {
            RecordKind::MixRiceHeader { quantity, base_soup_gram, base_percent, .. } => {
                assert_eq!(quantity, 150.0);
                assert_eq!(base_soup_gram, Some(30.0));
                assert_eq!(base_percent, Some(10.0));
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn test_generic_percent() {
        assert_eq!(generic_percent("和え物＋10％").unwrap(), 10.0);
        assert_eq!(
            generic_percent("かぼちゃの煮物2個＋ 赤キャップ4.5％＋水10.5％ で15％").unwrap(),
            15.0
        );
        assert_eq!(generic_percent("煮物5％ 7％").unwrap(), 5.0);
        assert_eq!(generic_percent("煮物").unwrap(), 0.0);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let c = classifier();
        let names = [
            "①鮭の塩焼き60ｇ1尾",
            "②煮物（肉団子3個＋小松菜36g）＋液60g",
            "⑤味噌汁 里芋2個・さつま揚げ5g",
            "①すきやき76g+48g",
        ];
        for name in names {
            let first = c.classify(&ClassifyState::default(), &line(0, name));
            let second = c.classify(&ClassifyState::default(), &line(0, name));
            assert_eq!(first, second, "同じ入力で結果が変わった: {}", name);
        }
    }

    #[test]
    fn test_quantity_matches_captured_digits() {
        let c = classifier();
        for (name, expected) in [("④いんげん12本", 12.0), ("③焼き海苔3枚", 3.0), ("①コロッケ2個", 2.0)] {
            let (record, _) = c.classify(&ClassifyState::default(), &line(0, name));
            assert!(matches!(record.kind, RecordKind::WithDensity { .. }), "{}", name);
            assert_eq!(record.kind.quantity(), expected, "{}", name);
        }
    }
}
