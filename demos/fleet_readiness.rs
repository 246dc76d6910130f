//! # 營級戰備計算範例
//!
//! 展示從 CSV 匯入到短缺彙總、耗盡預測的完整流程：
//! - 車輛表與彈藥表（使用原始報表欄位名稱）
//! - 營級預設標準
//! - 依連隊、駐地與全營彙總

use readiness::readiness_calc::{GroupDimension, Urgency};
use readiness::readiness_core::{ingest, AmmoType, FilterOptions, VehicleId};
use readiness::{AmmoScope, FilterSpec, FleetSnapshot, ReadinessEngine, SnapshotStore, StandardsTable};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

const VEHICLES_CSV: &str = "\
Type,Pluga,Z,Location,Status
Merkava,A,101.0,North,Working
Merkava,A,102,North,Working
Merkava,B,201,South,Not Working
Namer,B,202,South,In Repair
";

const AMMO_CSV: &str = "\
Pluga,Z,Hetz,Calanit,Halul,Hatzav,Barzel,5.56,Mag,Nafitiz60,Teura60,Meducut,Comments
A,101,3,10,10,7,10,990,30,21,9,12,
A,102.0,1,5,5,0,10,500,30,21,9,12,
B,201,,12,12,3,4,990,10,21,9,,
B,202,2,0,0,0,10,abc,30,21,9,12,
,303,3,9,9,9,10,990,30,21,9,12,removed vehicle
";

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("===== 營級戰備計算範例 =====\n");

    // 步驟 1: 匯入資料
    println!("[1] 匯入車輛表與彈藥表");
    let vehicles = ingest::load_vehicles(VEHICLES_CSV.as_bytes())?;
    let ammo = ingest::load_ammo(AMMO_CSV.as_bytes())?;
    println!("    車輛 {} 輛，略過 {} 列", vehicles.rows.len(), vehicles.skipped.len());
    println!("    彈藥列 {} 筆，略過 {} 列\n", ammo.rows.len(), ammo.skipped.len());

    // 步驟 2: 存檔
    println!("[2] 存檔");
    let mut store = SnapshotStore::new();
    let saved_at = store.save_fleet(FleetSnapshot::new(vehicles.rows, ammo.rows));
    println!("    存檔時間: {}\n", saved_at);

    let snapshot = store.current();
    let options = FilterOptions::from_registry(&snapshot.vehicles);
    println!("    連隊: {:?}", options.units);
    println!("    駐地: {:?}\n", options.locations);

    // 步驟 3: 全營計算
    println!("[3] 全營短缺計算");
    let standards = StandardsTable::battalion_default();
    let engine = ReadinessEngine::new(standards);
    let report = engine.evaluate(&snapshot, &FilterSpec::all(), &AmmoScope::All);

    for record in report.shortages.iter().filter(|r| r.has_shortage()) {
        let missing: Vec<String> = record
            .lines
            .iter()
            .filter(|l| !l.shortage.is_zero())
            .map(|l| format!("{}={}", l.ammo_type, l.shortage))
            .collect();
        println!(
            "    {} / {} / {}: {}",
            record.unit,
            record.location,
            record.vehicle_id,
            missing.join(", ")
        );
    }
    println!();

    for group in report.by_unit.iter().chain(std::iter::once(&report.fleet)) {
        let label = match group.dimension {
            GroupDimension::Fleet => "全營".to_string(),
            _ => format!("{} 連", group.key),
        };
        println!("    {}（{} 輛）", label, group.vehicle_count);
        for line in &group.lines {
            println!(
                "      {:<24} 存量 {:>8} 標準 {:>8} 短缺 {:>8} ({}%)",
                line.item.label(),
                line.total_current,
                line.total_standard,
                line.total_shortage,
                line.shortage_pct.round_dp(1)
            );
        }
    }
    println!();

    println!("    圖表資料（全營）:");
    for point in report.fleet.chart_points(engine.standards()) {
        println!("      {:<24} {} / {}", point.label, point.current, point.standard);
    }
    println!();

    println!(
        "    妥善: {}/{}，警告 {} 筆\n",
        report.status.working,
        report.status.total,
        report.diagnostics.warnings.len()
    );

    // 步驟 4: 單一連隊
    println!("[4] A 連組合彈藥");
    let company = engine.evaluate(&snapshot, &FilterSpec::all().with_unit("A"), &AmmoScope::Bundle);
    for line in &company.fleet.lines {
        println!(
            "    {}: 存量 {}，標準 {}，短缺 {}\n",
            line.item.label(),
            line.total_current,
            line.total_standard,
            line.total_shortage
        );
    }

    // 步驟 5: 耗盡與保養預測
    println!("[5] 耗盡預測");
    let mut usage = BTreeMap::new();
    usage.insert(AmmoType::new("hetz"), Decimal::from(1));
    usage.insert(AmmoType::new("regular_556"), Decimal::from(120));

    for projection in engine.project_depletion(&snapshot, &FilterSpec::all(), &usage) {
        let marker = match projection.urgency() {
            Urgency::Critical => "!!",
            Urgency::Warning => "! ",
            Urgency::Stable => "  ",
        };
        let days = projection
            .days_to_depletion
            .days()
            .map(|d| d.to_string())
            .unwrap_or_else(|| "無消耗".to_string());
        println!("    {} {:<12} {:>8} 天", marker, projection.ammo_type, days);
    }
    println!();

    println!("[6] 保養預測");
    let mut daily_hours = BTreeMap::new();
    daily_hours.insert(VehicleId::new("101"), Decimal::from(8));
    daily_hours.insert(VehicleId::new("201"), Decimal::from(30));

    for forecast in engine.forecast_maintenance(&snapshot, &FilterSpec::all(), &BTreeMap::new(), &daily_hours) {
        println!(
            "    {}: {:?} ({:?})",
            forecast.vehicle_id, forecast.days_to_maintenance, forecast.urgency
        );
    }

    Ok(())
}
