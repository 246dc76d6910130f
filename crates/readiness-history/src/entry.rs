//! 歷史紀錄

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 可存檔的資料表
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryTable {
    Vehicles,
    Ammo,
}

impl HistoryTable {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryTable::Vehicles => "vehicles",
            HistoryTable::Ammo => "ammo",
        }
    }
}

impl fmt::Display for HistoryTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 單次存檔的完整資料表複本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry<T> {
    pub id: Uuid,
    pub table: HistoryTable,
    /// 存檔時間（UTC，精確到秒）
    pub recorded_at: NaiveDateTime,
    pub rows: Vec<T>,
}

impl<T> HistoryEntry<T> {
    pub fn new(table: HistoryTable, recorded_at: NaiveDateTime, rows: Vec<T>) -> Self {
        Self {
            id: Uuid::new_v4(),
            table,
            recorded_at: truncate_to_seconds(recorded_at),
            rows,
        }
    }
}

/// 去除秒以下的部分
pub fn truncate_to_seconds(at: NaiveDateTime) -> NaiveDateTime {
    at.with_nanosecond(0).unwrap_or(at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_entry_truncates_timestamp() {
        let at = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_milli_opt(8, 30, 15, 750)
            .unwrap();

        let entry: HistoryEntry<u32> = HistoryEntry::new(HistoryTable::Ammo, at, vec![1, 2]);

        assert_eq!(
            entry.recorded_at,
            NaiveDate::from_ymd_opt(2025, 3, 1)
                .unwrap()
                .and_hms_opt(8, 30, 15)
                .unwrap()
        );
        assert_eq!(entry.table.to_string(), "ammo");
    }
}
