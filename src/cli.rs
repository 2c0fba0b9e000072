use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use plate_pack_common::PackagingRole;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "plate-pack")]
#[command(about = "調理指示書の献立解析・袋数計算ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// マスタJSONファイル（設定より優先）
    #[arg(short, long, global = true)]
    pub master: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 調理指示書を分類してJSONを出力
    Classify {
        /// 調理指示書（.xlsx / .json）
        #[arg(required = true)]
        input: PathBuf,

        /// 調理日（xlsxの場合に必須、例: 2022-09-01）
        #[arg(short, long)]
        cooking_day: Option<NaiveDate>,

        /// 出力JSONファイル（省略時は標準出力）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 注文数から袋数を計算
    Bags {
        /// 調理指示書（.xlsx / .json）
        #[arg(required = true)]
        input: PathBuf,

        /// 施設ごとの注文数JSON
        #[arg(long, required = true)]
        orders: PathBuf,

        /// 調理日（xlsxの場合に必須）
        #[arg(short, long)]
        cooking_day: Option<NaiveDate>,

        /// 集計Excelの出力先（ファイルまたはフォルダ）
        #[arg(short, long)]
        export: Option<PathBuf>,

        /// 保存用50gの袋数
        #[arg(long, default_value = "0")]
        preserve_50g: u32,

        /// 集計表のタイトル
        #[arg(short, long, default_value = "袋数集計")]
        title: String,
    },

    /// 入り数を表示
    Capacity {
        /// 扱い (main/sub/sub-less/soup)
        #[arg(short, long)]
        role: PackagingRole,

        /// 単位 (g/個/本 など)
        #[arg(short, long, default_value = "g")]
        unit: String,

        /// 1人前の量
        #[arg(short, long)]
        quantity: f64,
    },

    /// 設定を表示/編集
    Config {
        /// マスタJSONのパスを設定
        #[arg(long)]
        set_master: Option<PathBuf>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
