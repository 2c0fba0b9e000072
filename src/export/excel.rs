//! 袋数集計のExcel出力

use crate::error::{PlatePackError, Result};
use crate::packing::PackingRow;
use plate_pack_common::bag_count_formula;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::ops::Range;
use std::path::Path;

const HEADERS: [&str; 14] = [
    "喫食日",
    "食事",
    "料理名",
    "扱い",
    "1人前",
    "単位",
    "食数",
    "入り数",
    "袋数",
    "1人袋",
    "固定分",
    "合計袋数",
    "保存50g",
    "備考",
];

const FACILITY_SHEET: &str = "施設別";

const FACILITY_HEADERS: [&str; 5] = ["料理名", "施設", "食数", "入り数", "袋数"];

fn excel_err(e: rust_xlsxwriter::XlsxError) -> PlatePackError {
    PlatePackError::ExcelGeneration(e.to_string())
}

/// 袋数集計をxlsxに書き出す
///
/// 袋数は施設ごとに数式で出し、集計シートではその合計を参照する。
pub fn export_packing(rows: &[PackingRow], output_path: &Path, title: &str) -> Result<()> {
    let mut workbook = Workbook::new();
    let ranges = facility_ranges(rows);

    let sheet = workbook.add_worksheet();
    write_packing_sheet(sheet, rows, &ranges, title)?;

    let sheet = workbook.add_worksheet();
    write_facility_sheet(sheet, rows)?;

    workbook.save(output_path).map_err(excel_err)?;
    Ok(())
}

/// 2食以上の施設だけ袋を作る
fn bagged_facilities(row: &PackingRow) -> impl Iterator<Item = (usize, u32)> + '_ {
    row.facility_orders
        .iter()
        .copied()
        .enumerate()
        .filter(|&(_, n)| n > 1)
}

/// 料理ごとの施設別シートの行範囲（0始まり、見出しの次から）
fn facility_ranges(rows: &[PackingRow]) -> Vec<Range<u32>> {
    let mut next = 1;
    rows.iter()
        .map(|row| {
            let start = next;
            next += bagged_facilities(row).count() as u32;
            start..next
        })
        .collect()
}

fn note(row: &PackingRow) -> String {
    let mut parts = Vec::new();
    if row.noodle_soup {
        parts.push("◎麺類のスープ".to_string());
    }
    if let Some(names) = &row.split_names {
        parts.push(names.join(" / "));
    }
    parts.join(" ")
}

fn write_packing_sheet(
    sheet: &mut Worksheet,
    rows: &[PackingRow],
    ranges: &[Range<u32>],
    title: &str,
) -> Result<()> {
    sheet.set_name("袋数").map_err(excel_err)?;

    let header_format = Format::new().set_bold();

    sheet
        .write_string_with_format(0, 0, title, &header_format)
        .map_err(excel_err)?;

    for (col, header) in HEADERS.iter().enumerate() {
        sheet
            .write_string_with_format(2, col as u16, *header, &header_format)
            .map_err(excel_err)?;
    }
    sheet.set_column_width(2, 40).map_err(excel_err)?;

    for ((i, row), range) in rows.iter().enumerate().zip(ranges) {
        let r = 3 + i as u32;
        // 数式のセル参照は1始まり
        let excel_row = r + 1;
        let fixed_bags = row.fixed.baseline_bags();

        sheet
            .write_string(r, 0, row.eating_day.format("%Y/%m/%d").to_string())
            .map_err(excel_err)?;
        sheet.write_string(r, 1, row.meal.label()).map_err(excel_err)?;
        sheet.write_string(r, 2, &row.descriptor).map_err(excel_err)?;
        sheet.write_string(r, 3, row.role.as_str()).map_err(excel_err)?;
        sheet.write_number(r, 4, row.quantity).map_err(excel_err)?;
        sheet.write_string(r, 5, &row.unit).map_err(excel_err)?;
        sheet.write_number(r, 6, row.served as f64).map_err(excel_err)?;
        sheet
            .write_number(r, 7, row.decision.bag_size as f64)
            .map_err(excel_err)?;
        if range.is_empty() {
            sheet.write_number(r, 8, 0.0).map_err(excel_err)?;
        } else {
            let formula = format!(
                "=SUM('{}'!E{}:E{})",
                FACILITY_SHEET,
                range.start + 1,
                range.end
            );
            sheet.write_formula(r, 8, formula.as_str()).map_err(excel_err)?;
        }
        sheet
            .write_number(r, 9, row.decision.single_serving_bag_count as f64)
            .map_err(excel_err)?;
        sheet.write_number(r, 10, fixed_bags as f64).map_err(excel_err)?;
        sheet
            .write_formula(r, 11, format!("=I{}+K{}", excel_row, excel_row).as_str())
            .map_err(excel_err)?;
        sheet
            .write_number(r, 12, row.decision.fifty_gram_bag_count as f64)
            .map_err(excel_err)?;

        let note = note(row);
        if !note.is_empty() {
            sheet.write_string(r, 13, &note).map_err(excel_err)?;
        }
    }

    Ok(())
}

fn write_facility_sheet(sheet: &mut Worksheet, rows: &[PackingRow]) -> Result<()> {
    sheet.set_name(FACILITY_SHEET).map_err(excel_err)?;

    let header_format = Format::new().set_bold();
    for (col, header) in FACILITY_HEADERS.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *header, &header_format)
            .map_err(excel_err)?;
    }
    sheet.set_column_width(0, 40).map_err(excel_err)?;

    let mut r = 1;
    for row in rows {
        for (facility, orders) in bagged_facilities(row) {
            let excel_row = r + 1;
            sheet.write_string(r, 0, &row.descriptor).map_err(excel_err)?;
            sheet
                .write_number(r, 1, (facility + 1) as f64)
                .map_err(excel_err)?;
            sheet.write_number(r, 2, orders as f64).map_err(excel_err)?;
            sheet
                .write_number(r, 3, row.decision.bag_size as f64)
                .map_err(excel_err)?;
            sheet
                .write_formula(
                    r,
                    4,
                    format!(
                        "={}",
                        bag_count_formula(&format!("C{}", excel_row), &format!("D{}", excel_row))
                    )
                    .as_str(),
                )
                .map_err(excel_err)?;
            r += 1;
        }
    }

    Ok(())
}
