//! CSV 資料匯入
//!
//! 將原始車輛表與彈藥表轉為型別化記錄。欄位名稱可使用來源報表的標題
//! （`Z`、`Pluga`、`5.56`、`Nafitiz60` 等）或正式欄位名稱，大小寫不拘。
//! 缺少車號的列會被略過並記錄行號，不會中斷整批匯入。

use serde::Serialize;
use std::io::Read;

use crate::ammo::{AmmoHolding, AmmoType, Quantity};
use crate::vehicle::{OperationalStatus, Vehicle, VehicleId};
use crate::Result;

/// 被略過的資料列
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    /// CSV 行號（標題為第 1 行）
    pub line: u64,
    pub reason: String,
}

/// 匯入結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ingested<T> {
    pub rows: Vec<T>,
    pub skipped: Vec<SkippedRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VehicleColumn {
    Id,
    Unit,
    Location,
    VehicleType,
    Status,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AmmoColumn {
    VehicleId,
    Unit,
    Location,
    Quantity(AmmoType),
    Ignored,
}

fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase()
}

fn vehicle_column(header: &str) -> Option<VehicleColumn> {
    match normalize_header(header).as_str() {
        "z" | "simon" | "vehicle_id" => Some(VehicleColumn::Id),
        "pluga" | "unit" => Some(VehicleColumn::Unit),
        "location" => Some(VehicleColumn::Location),
        "type" | "vehicle_type" => Some(VehicleColumn::VehicleType),
        "status" => Some(VehicleColumn::Status),
        _ => None,
    }
}

fn ammo_column(header: &str) -> AmmoColumn {
    let normalized = normalize_header(header);
    match normalized.as_str() {
        "z" | "vehicle_id" => AmmoColumn::VehicleId,
        "pluga" | "unit" => AmmoColumn::Unit,
        "location" => AmmoColumn::Location,
        "" | "id" | "comments" | "notes" => AmmoColumn::Ignored,
        "5.56" => AmmoColumn::Quantity(AmmoType::new("regular_556")),
        "nafitiz60" => AmmoColumn::Quantity(AmmoType::new("nafetiz60")),
        other => AmmoColumn::Quantity(AmmoType::new(&other.replace(' ', "_"))),
    }
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn line_of(record: &csv::StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

/// 匯入車輛表
pub fn load_vehicles<R: Read>(reader: R) -> Result<Ingested<Vehicle>> {
    let mut csv_reader = csv_reader(reader);
    let columns: Vec<Option<VehicleColumn>> =
        csv_reader.headers()?.iter().map(vehicle_column).collect();

    let mut rows = Vec::new();
    let mut skipped = Vec::new();

    for result in csv_reader.records() {
        let record = result?;
        let mut vehicle = Vehicle::new("", "", "").with_status(OperationalStatus::default());

        for (column, cell) in columns.iter().zip(record.iter()) {
            match column {
                Some(VehicleColumn::Id) => vehicle.id = VehicleId::new(cell),
                Some(VehicleColumn::Unit) => vehicle.unit = cell.to_string(),
                Some(VehicleColumn::Location) => vehicle.location = cell.to_string(),
                Some(VehicleColumn::VehicleType) => vehicle.vehicle_type = cell.to_string(),
                Some(VehicleColumn::Status) => vehicle.status = OperationalStatus::parse(cell),
                None => {}
            }
        }

        if vehicle.id.is_empty() {
            skipped.push(SkippedRow {
                line: line_of(&record),
                reason: "缺少車號".to_string(),
            });
            continue;
        }

        rows.push(vehicle);
    }

    Ok(Ingested { rows, skipped })
}

/// 匯入彈藥表
pub fn load_ammo<R: Read>(reader: R) -> Result<Ingested<AmmoHolding>> {
    let mut csv_reader = csv_reader(reader);
    let columns: Vec<AmmoColumn> = csv_reader.headers()?.iter().map(ammo_column).collect();

    let mut rows = Vec::new();
    let mut skipped = Vec::new();

    for result in csv_reader.records() {
        let record = result?;
        let mut holding = AmmoHolding::new("");

        for (column, cell) in columns.iter().zip(record.iter()) {
            match column {
                AmmoColumn::VehicleId => holding.vehicle_id = VehicleId::new(cell),
                AmmoColumn::Unit if !cell.is_empty() => holding.unit = Some(cell.to_string()),
                AmmoColumn::Location if !cell.is_empty() => {
                    holding.location = Some(cell.to_string())
                }
                AmmoColumn::Quantity(ammo_type) => {
                    holding
                        .quantities
                        .insert(ammo_type.clone(), Quantity::parse(cell));
                }
                _ => {}
            }
        }

        if holding.vehicle_id.is_empty() {
            skipped.push(SkippedRow {
                line: line_of(&record),
                reason: "缺少車號".to_string(),
            });
            continue;
        }

        rows.push(holding);
    }

    Ok(Ingested { rows, skipped })
}
