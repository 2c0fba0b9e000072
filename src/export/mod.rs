pub mod excel;

use crate::error::Result;
use crate::packing::PackingRow;
use std::path::{Path, PathBuf};

/// 出力先がフォルダならタイトルからファイル名を作る
pub fn output_path_for(output: &Path, title: &str) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(format!("{}.xlsx", title))
    } else {
        output.to_path_buf()
    }
}

pub fn export_rows(rows: &[PackingRow], output: &Path, title: &str) -> Result<PathBuf> {
    let output_path = output_path_for(output, title);
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    println!("- Excelを生成中...");
    excel::export_packing(rows, &output_path, title)?;
    println!("✔ Excel出力: {}", output_path.display());
    Ok(output_path)
}
