//! エラーケーステスト
//!
//! 各種エラー条件でのエラーハンドリングを検証

use plate_pack::config::Config;
use plate_pack::error::PlatePackError;
use plate_pack::orders::FacilityOrders;
use plate_pack::sheet;
use plate_pack_common::Masters;
use std::path::Path;
use tempfile::tempdir;

/// 存在しない調理指示書
#[test]
fn test_read_nonexistent_sheet() {
    let result = sheet::read_sheet(Path::new("/nonexistent/path/direction.json"), None);
    assert!(matches!(result, Err(PlatePackError::FileNotFound(_))));
}

/// 未対応の拡張子
#[test]
fn test_read_unsupported_extension() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("direction.csv");
    std::fs::write(&path, "■9/3昼食,①すきやき76g").unwrap();

    let result = sheet::read_sheet(&path, None);
    assert!(matches!(result, Err(PlatePackError::InvalidSheet(_))));
}

/// 壊れたJSON
#[test]
fn test_read_invalid_json_sheet() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("direction.json");
    std::fs::write(&path, "{ invalid json }").unwrap();

    let result = sheet::read_sheet(&path, None);
    assert!(matches!(result, Err(PlatePackError::JsonParse(_))));
}

/// xlsxではないファイルをxlsxとして開く
#[test]
fn test_read_corrupted_xlsx() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("direction.xlsx");
    std::fs::write(&path, "not a zip").unwrap();

    let cooking_day = chrono::NaiveDate::from_ymd_opt(2022, 9, 1).unwrap();
    let result = sheet::read_sheet(&path, Some(cooking_day));
    assert!(matches!(result, Err(PlatePackError::SheetRead(_))));
}

/// 注文数ファイルが存在しない
#[test]
fn test_orders_file_not_found() {
    let result = FacilityOrders::from_file(Path::new("/nonexistent/orders.json"));
    assert!(matches!(result, Err(PlatePackError::FileNotFound(_))));
}

/// 不正なマスタ（検索文言が空）
#[test]
fn test_invalid_master_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("master.json");
    std::fs::write(
        &path,
        r#"{"mixRice": [{"name": "五目ご飯", "searchWord": "", "isMixPackage": true}]}"#,
    )
    .unwrap();

    let config = Config {
        master_path: Some(path),
        ..Config::default()
    };
    let result = config.masters();
    assert!(matches!(result, Err(PlatePackError::Common(_))));
}

/// 設定ファイルの保存と読み込み
#[test]
fn test_config_roundtrip() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("nested").join("config.json");

    let config = Config {
        output_dir: Some(dir.path().to_path_buf()),
        ..Config::default()
    };
    config.save_to(&path).expect("設定の保存に失敗");

    let loaded = Config::load_from(&path).expect("設定の読み込みに失敗");
    assert_eq!(loaded, config);

    // 存在しなければ既定値
    let missing = Config::load_from(&dir.path().join("none.json")).unwrap();
    assert_eq!(missing, Config::default());
}

/// マスタJSONの部分指定（省略した項目は空）
#[test]
fn test_partial_master_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("master.json");
    std::fs::write(&path, r#"{"units": [{"token": "尾", "portion": true}]}"#).unwrap();

    let masters = Masters::from_file(&path).expect("マスタの読み込みに失敗");
    assert_eq!(masters.units.len(), 1);
    assert!(masters.mix_rice.is_empty());
}
