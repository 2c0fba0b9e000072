//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    /// 数値の形をしているが数値として解釈できないトークン
    #[error("Malformed number: {token}")]
    MalformedNumber { token: String },

    /// 除数として使う数量が0
    #[error("Zero quantity: {token}")]
    ZeroQuantity { token: String },
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

/// 捕捉した数字列をf64として読む
pub(crate) fn parse_number(token: &str) -> Result<f64> {
    token.parse::<f64>().map_err(|_| Error::MalformedNumber {
        token: token.to_string(),
    })
}
