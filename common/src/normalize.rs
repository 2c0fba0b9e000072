//! 料理名の正規化
//!
//! 調理指示書の料理名は全角・半角が混在するため、照合用の正規形に揃える。
//! 正規形は照合にだけ使い、記録する名前は元の表記を残す。

use crate::types::{is_circled_number, DishMarks, RoleGlyph};

/// 先頭の丸数字の判定結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphHead {
    Known(RoleGlyph),
    /// 対象外の丸数字（⑥など）
    Unknown(char),
    None,
}

/// 照合用の正規形に変換
///
/// `+`→`＋`、`%`→`％`、`ｇ`→`g`、全角数字→半角、括弧→空白、`/`→`÷`
pub fn normalize_descriptor(name: &str) -> String {
    let converted: String = name
        .chars()
        .map(|c| match c {
            '０'..='９' => ((c as u32) - '０' as u32 + '0' as u32) as u8 as char,
            '．' => '.',
            '+' => '＋',
            '%' => '％',
            'ｇ' => 'g',
            '(' | ')' | '（' | '）' => ' ',
            '/' | '／' => '÷',
            _ => c,
        })
        .collect();

    converted.trim().to_string()
}

/// 先頭の丸数字を取り出す
pub fn split_glyph(name: &str) -> (GlyphHead, &str) {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) => match RoleGlyph::from_char(c) {
            Some(glyph) => (GlyphHead::Known(glyph), chars.as_str()),
            None if is_circled_number(c) => (GlyphHead::Unknown(c), chars.as_str()),
            None => (GlyphHead::None, name),
        },
        None => (GlyphHead::None, name),
    }
}

/// ▼△◎を名前から除き、フラグとして返す
///
/// 記号は1種類だけ解釈する（▼、△、◎の順）
pub fn take_marks(name: &str) -> (String, DishMarks) {
    let mut marks = DishMarks::default();
    let mark = if name.contains('▼') {
        marks.is_less = true;
        '▼'
    } else if name.contains('△') {
        marks.is_upper = true;
        '△'
    } else if name.contains('◎') {
        marks.is_noodle_soup = true;
        '◎'
    } else {
        return (name.to_string(), marks);
    };

    (name.replace(mark, ""), marks)
}

/// 分割パターンで取り出した名前の前後の空白と「・」を除く
pub fn trim_part_name(name: &str) -> String {
    name.trim_matches(|c: char| c.is_whitespace() || c == '・')
        .to_string()
}
