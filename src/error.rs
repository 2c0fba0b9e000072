use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlatePackError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("調理指示書の読み込みエラー: {0}")]
    SheetRead(String),

    #[error("調理指示書の形式が不正: {0}")]
    InvalidSheet(String),

    #[error("Excel生成エラー: {0}")]
    ExcelGeneration(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] plate_pack_common::Error),
}

pub type Result<T> = std::result::Result<T, PlatePackError>;
