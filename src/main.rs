use anyhow::{Context, Result};
use clap::Parser;
use plate_pack::{cli, config, export, logging, orders, packing, sheet};
use plate_pack_common::{bag_capacity, Unit};
use cli::{Cli, Commands};
use config::Config;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut config = Config::load().context("設定の読み込みに失敗")?;
    if let Some(master) = cli.master.clone() {
        config.master_path = Some(master);
    }

    match cli.command {
        Commands::Classify { input, cooking_day, output } => {
            eprintln!("🍱 plate-pack - 料理名の分類\n");

            let lines = sheet::read_sheet(&input, cooking_day)
                .with_context(|| format!("調理指示書を読めません: {}", input.display()))?;
            eprintln!("✔ {}行を読み込み", lines.len());

            let sheet = packing::classify_sheet(&lines, config.masters()?)?;
            let json = serde_json::to_string_pretty(&sheet)?;

            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    eprintln!("✔ 結果を保存: {}", path.display());
                }
                None => println!("{}", json),
            }
        }

        Commands::Bags { input, orders: orders_path, cooking_day, export: export_path, preserve_50g, title } => {
            eprintln!("🍱 plate-pack - 袋数計算\n");

            let lines = sheet::read_sheet(&input, cooking_day)
                .with_context(|| format!("調理指示書を読めません: {}", input.display()))?;
            let facility_orders = orders::FacilityOrders::from_file(&orders_path)
                .with_context(|| format!("注文数を読めません: {}", orders_path.display()))?;
            eprintln!("✔ {}行 / 注文{}件を読み込み\n", lines.len(), facility_orders.len());

            let sheet = packing::classify_sheet(&lines, config.masters()?)?;
            let rows = packing::plan(&sheet, &facility_orders, &config, preserve_50g);

            println!("喫食日\t食事\t扱い\t入り数\t食数\t袋数\t1人袋\t料理名");
            for row in &rows {
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                    row.eating_day,
                    row.meal,
                    row.role,
                    row.decision.bag_size,
                    row.served,
                    row.total_bags(),
                    row.decision.single_serving_bag_count,
                    row.descriptor
                );
                if let Some(needle) = &row.needle {
                    println!("\t└ 具 {}袋 (平均{:.1}g)", needle.bag_count, needle.average_gram);
                }
                if let Some((solid, liquid)) = row.preserve_split {
                    println!("\t└ 保存50g 具材{:.1}g / 液{:.1}g", solid, liquid);
                }
                if let Some(names) = &row.split_names {
                    println!("\t└ 計量 {}", names.join(" / "));
                }
                if row.noodle_soup {
                    println!("\t└ ◎麺類のスープ");
                }
            }

            let target = export_path.or_else(|| config.output_dir.clone());
            if let Some(target) = target {
                export::export_rows(&rows, &target, &title)?;
            }

            eprintln!("\n✅ 計算完了");
        }

        Commands::Capacity { role, unit, quantity } => {
            let unit = Unit::try_from(unit).map_err(anyhow::Error::msg)?;
            let capacity = bag_capacity(role, &unit, quantity);
            println!("{} {}{} → 1袋{}食", role, quantity, unit, capacity);
        }

        Commands::Config { set_master, show } => {
            if let Some(path) = set_master {
                config.set_master_path(path)?;
                println!("✔ マスタを設定しました");
            }

            if show {
                println!("設定:");
                println!("  基本食の対応日: {}", config.basic_plate_enable_date);
                println!(
                    "  マスタ: {}",
                    config
                        .master_path
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "組み込み".into())
                );
                println!(
                    "  出力先: {}",
                    config
                        .output_dir
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "未設定".into())
                );
                println!("  設定ファイル: {}", Config::config_path()?.display());
            }
        }
    }

    Ok(())
}
