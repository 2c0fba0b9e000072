//! 分類結果の相互参照
//!
//! 同じ喫食日・食事の行どうしを結び付ける。
//! - 汁の具 → 以降で最初に現れる汁・スープ
//! - 混ぜご飯の具 → 直前の混ぜご飯本体
//! - 同名の混ぜご飯本体が2つ以上あれば後のものを無効化
//!
//! 参照は`PlateSheet::records`の添字で持つ。

use crate::types::{Meal, ParsedPlateRecord, RecordKind};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

/// 行どうしの参照（添字）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Linkage {
    /// (汁の具, 汁・スープ)
    pub liquid_of: Vec<(usize, usize)>,
    /// (混ぜご飯本体, 具の一覧)
    pub parts_of: Vec<(usize, Vec<usize>)>,
}

impl Linkage {
    /// 汁の具が結び付いた汁・スープ
    pub fn liquid_for(&self, filling: usize) -> Option<usize> {
        self.liquid_of
            .iter()
            .find(|(f, _)| *f == filling)
            .map(|(_, liquid)| *liquid)
    }

    /// 汁・スープに結び付いた具
    pub fn fillings_of(&self, liquid: usize) -> Vec<usize> {
        self.liquid_of
            .iter()
            .filter(|(_, l)| *l == liquid)
            .map(|(filling, _)| *filling)
            .collect()
    }

    /// 混ぜご飯本体の具
    pub fn parts_for(&self, header: usize) -> &[usize] {
        self.parts_of
            .iter()
            .find(|(h, _)| *h == header)
            .map(|(_, parts)| parts.as_slice())
            .unwrap_or(&[])
    }

    /// 具が属する混ぜご飯本体
    pub fn header_for(&self, part: usize) -> Option<usize> {
        self.parts_of
            .iter()
            .find(|(_, parts)| parts.contains(&part))
            .map(|(header, _)| *header)
    }

    fn attach_filling(&mut self, filling: usize, liquid: usize) {
        if self.liquid_for(filling).is_none() {
            self.liquid_of.push((filling, liquid));
        }
    }

    fn attach_part(&mut self, header: usize, part: usize) {
        if self.header_for(part).is_some() {
            return;
        }
        match self.parts_of.iter_mut().find(|(h, _)| *h == header) {
            Some((_, parts)) => parts.push(part),
            None => self.parts_of.push((header, vec![part])),
        }
    }
}

/// 1回分の調理指示書の分類結果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlateSheet {
    pub records: Vec<ParsedPlateRecord>,
    pub linkage: Linkage,
}

impl PlateSheet {
    pub fn new(records: Vec<ParsedPlateRecord>) -> Self {
        Self {
            records,
            linkage: Linkage::default(),
        }
    }

    /// 分類して相互参照を張った状態で作る
    pub fn linked(records: Vec<ParsedPlateRecord>) -> Self {
        let mut sheet = Self::new(records);
        sheet.link();
        sheet
    }

    /// 喫食日・食事ごとの添字（出現順）
    pub fn groups(&self) -> Vec<((NaiveDate, Meal), Vec<usize>)> {
        let mut groups: Vec<((NaiveDate, Meal), Vec<usize>)> = Vec::new();
        for (i, record) in self.records.iter().enumerate() {
            let key = record.group_key();
            match groups.iter_mut().find(|(k, _)| *k == key) {
                Some((_, members)) => members.push(i),
                None => groups.push((key, vec![i])),
            }
        }
        groups
    }

    /// 相互参照を張る。既に張られた参照は重複させない
    pub fn link(&mut self) {
        for (key, members) in self.groups() {
            for (pos, &i) in members.iter().enumerate() {
                match &self.records[i].kind {
                    RecordKind::SoupFilling { .. } | RecordKind::SoupFillingSplit { .. } => {
                        let liquid = members[pos..]
                            .iter()
                            .copied()
                            .find(|&j| self.records[j].kind.is_soup_liquid());
                        if let Some(liquid) = liquid {
                            self.linkage.attach_filling(i, liquid);
                        }
                    }
                    RecordKind::MixRicePart { name, .. } => {
                        let header = members[..pos]
                            .iter()
                            .rev()
                            .copied()
                            .find(|&j| matches!(self.records[j].kind, RecordKind::MixRiceHeader { .. }));
                        match header {
                            Some(header) => self.linkage.attach_part(header, i),
                            None => warn!(
                                eating_day = %key.0,
                                meal = %key.1,
                                name = %name,
                                "混ぜご飯の本体が見つからない具があります"
                            ),
                        }
                    }
                    RecordKind::MixRiceHeader { master, .. } => {
                        let mix_rice = master.name.clone();
                        let duplicated = members[..pos].iter().rev().any(|&j| {
                            matches!(
                                &self.records[j].kind,
                                RecordKind::MixRiceHeader { master: earlier, .. } if earlier.name == mix_rice
                            )
                        });
                        if duplicated {
                            info!(eating_day = %key.0, meal = %key.1, mix_rice = %mix_rice, "重複した混ぜご飯を無効化");
                            if let RecordKind::MixRiceHeader { disabled, .. } = &mut self.records[i].kind {
                                *disabled = true;
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    /// 混ぜご飯本体の最初の具の数量
    pub fn first_part_quantity(&self, header: usize) -> Option<f64> {
        self.linkage
            .parts_for(header)
            .first()
            .map(|&part| self.records[part].kind.quantity())
    }
}
