//! 計量用マスタ
//!
//! 混ぜご飯・汁スープの判定に使う検索文言と、数量に使う助数詞の表。
//! JSONファイルで差し替えでき、指定がなければ組み込みの値を使う。

use crate::error::{Error, Result};
use crate::types::{MixRiceMaster, SoupGroup, SoupMaster};
use serde::{Deserialize, Serialize};

/// 助数詞の定義
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitEntry {
    /// 数字の直後に来る文字列（例: "本", "尾"）
    pub token: String,
    /// 1人前単位で数える料理（尾・切）。液の指定がなければPlainとして扱う
    #[serde(default)]
    pub portion: bool,
}

impl UnitEntry {
    fn new(token: &str, portion: bool) -> Self {
        Self {
            token: token.to_string(),
            portion,
        }
    }
}

/// マスタ一式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Masters {
    #[serde(default)]
    pub mix_rice: Vec<MixRiceMaster>,
    #[serde(default)]
    pub soup: Vec<SoupMaster>,
    #[serde(default)]
    pub units: Vec<UnitEntry>,
}

impl Default for Masters {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Masters {
    /// JSONファイルから読み込み
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// JSON文字列から読み込み
    pub fn from_json(json: &str) -> Result<Self> {
        let masters: Self = serde_json::from_str(json)?;
        masters.validate()?;
        Ok(masters)
    }

    fn validate(&self) -> Result<()> {
        if let Some(entry) = self.units.iter().find(|u| u.token.trim().is_empty()) {
            return Err(Error::Config(format!("助数詞が空です: {:?}", entry)));
        }
        if let Some(m) = self.mix_rice.iter().find(|m| m.search_word.is_empty()) {
            return Err(Error::Config(format!("混ぜご飯の検索文言が空です: {}", m.name)));
        }
        if let Some(m) = self.soup.iter().find(|m| m.search_word.is_empty()) {
            return Err(Error::Config(format!("汁・スープの検索文言が空です: {}", m.name)));
        }
        Ok(())
    }

    /// 組み込みマスタ
    pub fn builtin() -> Self {
        let mix_rice = [
            ("五目ご飯", "五目ご", true),
            ("栗ご飯", "栗【くり】ご", true),
            ("炊き込みご飯", "炊き込みご", true),
            ("わかめご飯", "わかめご", false),
            ("ちらし寿司", "ちらし寿司", true),
            ("菜飯", "菜飯", false),
        ]
        .into_iter()
        .map(|(name, word, mix)| MixRiceMaster {
            name: name.into(),
            search_word: word.into(),
            is_mix_package: mix,
        })
        .collect();

        let soup = [
            ("お吸い物", "吸い物", SoupGroup::Liquid),
            ("すまし汁", "すまし", SoupGroup::Liquid),
            ("コンソメスープ", "コンソメ", SoupGroup::Soup),
            ("ポタージュスープ", "ポタージュ", SoupGroup::Soup),
            ("コーンスープ", "コーン", SoupGroup::Soup),
            ("パンプキンスープ", "パンプキン", SoupGroup::Soup),
        ]
        .into_iter()
        .map(|(name, word, group)| SoupMaster {
            name: name.into(),
            search_word: word.into(),
            group,
        })
        .collect();

        let units = vec![
            UnitEntry::new("尾", true),
            UnitEntry::new("切", true),
            UnitEntry::new("本", false),
            UnitEntry::new("枚", false),
            UnitEntry::new("袋", false),
            UnitEntry::new("串", false),
            UnitEntry::new("粒", false),
            UnitEntry::new("房", false),
            UnitEntry::new("パック", false),
        ];

        Self {
            mix_rice,
            soup,
            units,
        }
    }

    /// 検索文言が名前に含まれる最初の混ぜご飯
    pub fn find_mix_rice(&self, name: &str) -> Option<&MixRiceMaster> {
        self.mix_rice.iter().find(|m| name.contains(&m.search_word))
    }

    /// 検索文言が名前に含まれる最初の汁・スープ
    pub fn find_soup(&self, name: &str, group: Option<SoupGroup>) -> Option<&SoupMaster> {
        self.soup
            .iter()
            .filter(|m| group.map_or(true, |g| m.group == g))
            .find(|m| name.contains(&m.search_word))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_masters() {
        let masters = Masters::builtin();
        assert!(masters.find_mix_rice("栗【くり】ご飯200g").is_some());
        assert!(masters.find_mix_rice("白ご飯").is_none());
        assert_eq!(masters.units[0].token, "尾");
    }

    #[test]
    fn test_find_soup_by_group() {
        let masters = Masters::builtin();
        let liquid = masters.find_soup("お吸い物希釈", Some(SoupGroup::Liquid));
        assert_eq!(liquid.map(|m| m.name.as_str()), Some("お吸い物"));

        // 汁グループ限定ではスープは見つからない
        assert!(masters.find_soup("コンソメ 玉葱", Some(SoupGroup::Liquid)).is_none());
        assert!(masters.find_soup("コンソメ 玉葱", None).is_some());
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "mixRice": [{"name": "豆ご飯", "searchWord": "豆ご"}],
            "soup": [{"name": "豚汁", "searchWord": "豚汁", "group": "soup"}],
            "units": [{"token": "本"}]
        }"#;
        let masters = Masters::from_json(json).unwrap();
        assert_eq!(masters.mix_rice.len(), 1);
        assert!(!masters.mix_rice[0].is_mix_package);
        assert!(!masters.units[0].portion);
    }

    #[test]
    fn test_from_json_empty_search_word() {
        let json = r#"{"mixRice": [{"name": "豆ご飯", "searchWord": ""}]}"#;
        let result = Masters::from_json(json);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_from_file() {
        let dir = std::env::temp_dir().join(format!("plate-pack-master-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("masters.json");
        std::fs::write(&path, serde_json::to_string(&Masters::builtin()).unwrap()).unwrap();

        let loaded = Masters::from_file(&path).unwrap();
        assert_eq!(loaded, Masters::builtin());
        std::fs::remove_dir_all(&dir).ok();
    }
}
