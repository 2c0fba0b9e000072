//! 調理指示書の読み込み
//!
//! xlsx（A列: 喫食日・食事の見出し、B列: 料理名）またはJSON（RawPlateLineの配列）を読む。

use crate::error::{PlatePackError, Result};
use calamine::{open_workbook, Reader, Xlsx};
use chrono::{Datelike, NaiveDate};
use plate_pack_common::{Meal, RawPlateLine};
use regex::Regex;
use std::path::Path;
use tracing::{debug, info};

/// 年をまたぐと判定する調理日（12月20日以降）
const YEAR_ROLLOVER_DAY: u32 = 20;

/// 全角数字・スラッシュを半角に
fn to_ascii_digits(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '０'..='９' => char::from_u32(c as u32 - '０' as u32 + '0' as u32).unwrap_or(c),
            '／' => '/',
            _ => c,
        })
        .collect()
}

/// 見出し「■M/D朝食」を喫食日と食事区分にする
///
/// 12月20日以降の調理日で1月の見出しが来たら翌年とみなす。
pub fn parse_meal_header(header: &str, cooking_day: NaiveDate) -> Result<(NaiveDate, Meal)> {
    lazy_static::lazy_static! {
        static ref HEADER_RE: Regex =
            Regex::new(r"■\s*(\d{1,2})\s*/\s*(\d{1,2})\s*(朝食|昼食|夕食|朝|昼|夕)").unwrap();
    }

    let ascii = to_ascii_digits(header);
    let cap = HEADER_RE
        .captures(&ascii)
        .ok_or_else(|| PlatePackError::InvalidSheet(format!("見出しの形式が不正: {}", header)))?;

    let month: u32 = cap[1]
        .parse()
        .map_err(|_| PlatePackError::InvalidSheet(format!("月が読めません: {}", header)))?;
    let day: u32 = cap[2]
        .parse()
        .map_err(|_| PlatePackError::InvalidSheet(format!("日が読めません: {}", header)))?;
    let meal: Meal = cap[3].parse().map_err(PlatePackError::InvalidSheet)?;

    let mut year = cooking_day.year();
    if month == 1 && cooking_day.month() == 12 && cooking_day.day() >= YEAR_ROLLOVER_DAY {
        year += 1;
    }

    let eating_day = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| PlatePackError::InvalidSheet(format!("存在しない日付: {}", header)))?;
    Ok((eating_day, meal))
}

/// 読み飛ばす行（白飯）
fn is_skipped(name: &str) -> bool {
    name.is_empty() || name.contains("ごはん")
}

/// (見出し, 料理名)の行から調理指示書の行を作る
///
/// 見出しが空の行は直前の見出しを引き継ぐ。indexは食事ごとの出現順。
pub fn lines_from_rows<I>(rows: I, cooking_day: NaiveDate) -> Result<Vec<RawPlateLine>>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut current: Option<(NaiveDate, Meal)> = None;
    let mut lines: Vec<RawPlateLine> = Vec::new();
    let mut counters: Vec<((NaiveDate, Meal), i32)> = Vec::new();

    for (row_no, (header, name)) in rows.into_iter().enumerate() {
        let header = header.trim();
        if !header.is_empty() {
            current = Some(parse_meal_header(header, cooking_day)?);
        }

        let name = name.trim();
        if is_skipped(name) {
            continue;
        }

        let key = current.ok_or_else(|| {
            PlatePackError::InvalidSheet(format!("{}行目: 見出しより前に料理名があります", row_no + 1))
        })?;

        let index = match counters.iter_mut().find(|(k, _)| *k == key) {
            Some((_, n)) => {
                *n += 1;
                *n
            }
            None => {
                counters.push((key, 0));
                0
            }
        };

        lines.push(RawPlateLine {
            index,
            cooking_day,
            eating_day: key.0,
            meal: key.1,
            raw_name: name.to_string(),
            quantity: 0.0,
            unit: String::new(),
        });
    }

    debug!(lines = lines.len(), "調理指示書の行");
    Ok(lines)
}

/// xlsxの最初のシートを読む
pub fn read_xlsx(path: &Path, cooking_day: NaiveDate) -> Result<Vec<RawPlateLine>> {
    let mut workbook: Xlsx<_> = open_workbook(path)
        .map_err(|e: calamine::XlsxError| PlatePackError::SheetRead(e.to_string()))?;

    let sheet_names = workbook.sheet_names();
    let sheet_name = sheet_names
        .first()
        .cloned()
        .ok_or_else(|| PlatePackError::SheetRead("シートがありません".into()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| PlatePackError::SheetRead(e.to_string()))?;

    let rows: Vec<(String, String)> = range
        .rows()
        .map(|row| {
            let cell = |i: usize| {
                row.get(i)
                    .map(|c| c.to_string().trim().to_string())
                    .unwrap_or_default()
            };
            (cell(0), cell(1))
        })
        .collect();

    info!(sheet = %sheet_name, rows = rows.len(), "xlsxを読み込み");
    lines_from_rows(rows, cooking_day)
}

/// RawPlateLineの配列のJSONを読む
pub fn read_json(path: &Path) -> Result<Vec<RawPlateLine>> {
    let content = std::fs::read_to_string(path)?;
    let lines: Vec<RawPlateLine> = serde_json::from_str(&content)?;
    Ok(lines)
}

/// 拡張子で読み分ける（xlsxは調理日が必要）
pub fn read_sheet(path: &Path, cooking_day: Option<NaiveDate>) -> Result<Vec<RawPlateLine>> {
    if !path.exists() {
        return Err(PlatePackError::FileNotFound(path.display().to_string()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "json" => read_json(path),
        "xlsx" => {
            let cooking_day = cooking_day.ok_or_else(|| {
                PlatePackError::Config("xlsxの読み込みには--cooking-dayが必要です".into())
            })?;
            read_xlsx(path, cooking_day)
        }
        other => Err(PlatePackError::InvalidSheet(format!("未対応の形式: {}", other))),
    }
}
