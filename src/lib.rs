//! plate-pack: 調理指示書の献立解析・袋数計算ツール

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod orders;
pub mod packing;
pub mod sheet;
