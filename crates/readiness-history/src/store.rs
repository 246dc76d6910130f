//! 記憶體內存檔庫
//!
//! 存檔會取代現行資料表，並附加一份帶時間戳的完整複本到歷史紀錄。
//! 計算引擎只透過 [`SnapshotStore::current`] 或 [`SnapshotStore::snapshot_at`] 讀取一致的快照。

use chrono::{NaiveDateTime, Utc};
use readiness_core::{AmmoHolding, FleetSnapshot, Vehicle};
use std::collections::BTreeSet;

use crate::entry::{truncate_to_seconds, HistoryEntry, HistoryTable};

/// 車輛表與彈藥表的存檔庫
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    vehicles: Vec<Vehicle>,
    ammo: Vec<AmmoHolding>,
    vehicle_log: Vec<HistoryEntry<Vehicle>>,
    ammo_log: Vec<HistoryEntry<AmmoHolding>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以既有資料作為現行資料表（不寫入歷史）
    pub fn from_snapshot(snapshot: FleetSnapshot) -> Self {
        Self {
            vehicles: snapshot.vehicles,
            ammo: snapshot.ammo,
            ..Default::default()
        }
    }

    /// 現行資料表的快照
    pub fn current(&self) -> FleetSnapshot {
        FleetSnapshot::new(self.vehicles.clone(), self.ammo.clone())
    }

    /// 存檔車輛表，回傳紀錄時間
    pub fn save_vehicles(&mut self, rows: Vec<Vehicle>) -> NaiveDateTime {
        self.save_vehicles_at(rows, Utc::now().naive_utc())
    }

    pub fn save_vehicles_at(&mut self, rows: Vec<Vehicle>, at: NaiveDateTime) -> NaiveDateTime {
        let entry = HistoryEntry::new(HistoryTable::Vehicles, at, rows.clone());
        let recorded_at = entry.recorded_at;

        tracing::info!("存檔車輛表：{} 輛，時間 {}", rows.len(), recorded_at);

        self.vehicles = rows;
        self.vehicle_log.push(entry);
        recorded_at
    }

    /// 存檔彈藥表，回傳紀錄時間
    pub fn save_ammo(&mut self, rows: Vec<AmmoHolding>) -> NaiveDateTime {
        self.save_ammo_at(rows, Utc::now().naive_utc())
    }

    pub fn save_ammo_at(&mut self, rows: Vec<AmmoHolding>, at: NaiveDateTime) -> NaiveDateTime {
        let entry = HistoryEntry::new(HistoryTable::Ammo, at, rows.clone());
        let recorded_at = entry.recorded_at;

        tracing::info!("存檔彈藥表：{} 筆，時間 {}", rows.len(), recorded_at);

        self.ammo = rows;
        self.ammo_log.push(entry);
        recorded_at
    }

    /// 以同一時間戳存檔兩張資料表
    pub fn save_fleet(&mut self, snapshot: FleetSnapshot) -> NaiveDateTime {
        self.save_fleet_at(snapshot, Utc::now().naive_utc())
    }

    pub fn save_fleet_at(&mut self, snapshot: FleetSnapshot, at: NaiveDateTime) -> NaiveDateTime {
        let at = truncate_to_seconds(at);
        self.save_vehicles_at(snapshot.vehicles, at);
        self.save_ammo_at(snapshot.ammo, at)
    }

    /// 資料表的存檔時間（去重，新到舊）
    pub fn history(&self, table: HistoryTable) -> Vec<NaiveDateTime> {
        let timestamps: BTreeSet<NaiveDateTime> = match table {
            HistoryTable::Vehicles => self.vehicle_log.iter().map(|e| e.recorded_at).collect(),
            HistoryTable::Ammo => self.ammo_log.iter().map(|e| e.recorded_at).collect(),
        };
        timestamps.into_iter().rev().collect()
    }

    /// 兩張資料表都有存檔的時間（新到舊）
    pub fn common_timestamps(&self) -> Vec<NaiveDateTime> {
        let ammo: BTreeSet<NaiveDateTime> = self.ammo_log.iter().map(|e| e.recorded_at).collect();
        self.history(HistoryTable::Vehicles)
            .into_iter()
            .filter(|at| ammo.contains(at))
            .collect()
    }

    /// 指定時間的車輛表（同一秒多次存檔時取最後一次）
    pub fn vehicles_at(&self, at: NaiveDateTime) -> Option<&[Vehicle]> {
        let at = truncate_to_seconds(at);
        self.vehicle_log
            .iter()
            .rev()
            .find(|e| e.recorded_at == at)
            .map(|e| e.rows.as_slice())
    }

    /// 指定時間的彈藥表（同一秒多次存檔時取最後一次）
    pub fn ammo_at(&self, at: NaiveDateTime) -> Option<&[AmmoHolding]> {
        let at = truncate_to_seconds(at);
        self.ammo_log
            .iter()
            .rev()
            .find(|e| e.recorded_at == at)
            .map(|e| e.rows.as_slice())
    }

    /// 指定時間的完整快照，任一資料表在該時間沒有存檔時回傳 `None`
    pub fn snapshot_at(&self, at: NaiveDateTime) -> Option<FleetSnapshot> {
        let vehicles = self.vehicles_at(at)?;
        let ammo = self.ammo_at(at)?;
        Some(FleetSnapshot::new(vehicles.to_vec(), ammo.to_vec()))
    }

    /// 歷史紀錄筆數
    pub fn log_len(&self, table: HistoryTable) -> usize {
        match table {
            HistoryTable::Vehicles => self.vehicle_log.len(),
            HistoryTable::Ammo => self.ammo_log.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;

    fn at(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    #[test]
    fn test_save_replaces_live_table() {
        let mut store = SnapshotStore::new();
        store.save_vehicles_at(vec![Vehicle::new("1", "A", "North")], at(8, 0, 0));
        store.save_vehicles_at(
            vec![Vehicle::new("1", "A", "North"), Vehicle::new("2", "B", "South")],
            at(9, 0, 0),
        );

        assert_eq!(store.current().vehicles.len(), 2);
        assert_eq!(store.log_len(HistoryTable::Vehicles), 2);
        assert_eq!(store.vehicles_at(at(8, 0, 0)).unwrap().len(), 1);
    }

    #[test]
    fn test_history_newest_first() {
        let mut store = SnapshotStore::new();
        store.save_ammo_at(vec![AmmoHolding::new("1")], at(8, 0, 0));
        store.save_ammo_at(vec![AmmoHolding::new("1")], at(10, 0, 0));
        store.save_ammo_at(vec![AmmoHolding::new("2")], at(10, 0, 0));
        store.save_ammo_at(vec![AmmoHolding::new("1")], at(9, 0, 0));

        assert_eq!(
            store.history(HistoryTable::Ammo),
            vec![at(10, 0, 0), at(9, 0, 0), at(8, 0, 0)]
        );
        // 同一秒取最後一次存檔
        assert_eq!(
            store.ammo_at(at(10, 0, 0)).unwrap()[0].vehicle_id.as_str(),
            "2"
        );
    }

    #[rstest]
    #[case(at(8, 0, 0), true)]
    #[case(at(9, 0, 0), false)]
    #[case(at(10, 0, 0), true)]
    fn test_snapshot_at(#[case] when: NaiveDateTime, #[case] available: bool) {
        let mut store = SnapshotStore::new();
        store.save_fleet_at(
            FleetSnapshot::new(vec![Vehicle::new("1", "A", "North")], vec![AmmoHolding::new("1")]),
            at(8, 0, 0),
        );
        store.save_vehicles_at(vec![Vehicle::new("2", "A", "North")], at(9, 0, 0));
        store.save_fleet_at(
            FleetSnapshot::new(vec![Vehicle::new("3", "B", "South")], vec![]),
            at(10, 0, 0),
        );

        assert_eq!(store.snapshot_at(when).is_some(), available);
        assert_eq!(store.common_timestamps(), vec![at(10, 0, 0), at(8, 0, 0)]);
    }

    #[test]
    fn test_save_fleet_uses_one_timestamp() {
        let mut store = SnapshotStore::new();
        let when = at(12, 0, 0) + chrono::Duration::milliseconds(400);

        let recorded = store.save_fleet_at(
            FleetSnapshot::new(vec![Vehicle::new("1", "A", "North")], vec![AmmoHolding::new("1")]),
            when,
        );

        assert_eq!(recorded, at(12, 0, 0));
        assert_eq!(store.history(HistoryTable::Vehicles), vec![recorded]);
        assert_eq!(store.history(HistoryTable::Ammo), vec![recorded]);
        assert_eq!(store.snapshot_at(when).unwrap(), store.current());
    }
}
