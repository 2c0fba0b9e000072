use crate::error::{PlatePackError, Result};
use chrono::NaiveDate;
use plate_pack_common::{FixedOrderPolicy, Masters};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// この喫食日から基本食の固定分ルールを使う
    pub basic_plate_enable_date: NaiveDate,
    /// マスタJSON（省略時は組み込みマスタ）
    pub master_path: Option<PathBuf>,
    /// 集計Excelの出力先
    pub output_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// 指定パスから読み込み（存在しなければ既定値）
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default_config())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| PlatePackError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("plate-pack").join("config.json"))
    }

    fn default_config() -> Self {
        Self {
            // 2023年1月31日喫食分から基本食対応
            basic_plate_enable_date: NaiveDate::from_ymd_opt(2023, 1, 31).unwrap_or_default(),
            master_path: None,
            output_dir: None,
        }
    }

    /// 使用するマスタ
    pub fn masters(&self) -> Result<Masters> {
        match &self.master_path {
            Some(path) => {
                if !path.exists() {
                    return Err(PlatePackError::FileNotFound(path.display().to_string()));
                }
                Ok(Masters::from_file(path)?)
            }
            None => Ok(Masters::builtin()),
        }
    }

    /// 喫食日に適用する固定分ルール
    pub fn policy_for(&self, eating_day: NaiveDate) -> FixedOrderPolicy {
        FixedOrderPolicy::for_eating_day(eating_day, self.basic_plate_enable_date)
    }

    pub fn set_master_path(&mut self, path: PathBuf) -> Result<()> {
        self.master_path = Some(path);
        self.save()
    }
}
