//! 車輛妥善狀態統計

use readiness_core::{label_or_unknown, OperationalStatus, Vehicle};
use serde::Serialize;
use std::collections::BTreeMap;

/// 單一車型的妥善統計
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub vehicle_type: String,
    pub working: usize,
    pub not_working: usize,
    pub other: usize,
    pub total: usize,
}

impl StatusCount {
    fn record(&mut self, status: &OperationalStatus) {
        match status {
            OperationalStatus::Working => self.working += 1,
            OperationalStatus::NotWorking => self.not_working += 1,
            OperationalStatus::Other(_) => self.other += 1,
        }
        self.total += 1;
    }
}

/// 全營妥善摘要
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub total: usize,
    pub working: usize,
    pub not_working: usize,
    pub other: usize,
    /// 依車型（名稱排序）
    pub by_type: Vec<StatusCount>,
}

/// 妥善狀態計算器
pub struct StatusCalculator;

impl StatusCalculator {
    pub fn summarize<'a, I>(vehicles: I) -> StatusSummary
    where
        I: IntoIterator<Item = &'a Vehicle>,
    {
        let mut overall = StatusCount::default();
        let mut by_type: BTreeMap<String, StatusCount> = BTreeMap::new();

        for vehicle in vehicles {
            overall.record(&vehicle.status);

            let vehicle_type = label_or_unknown(&vehicle.vehicle_type);
            by_type
                .entry(vehicle_type.to_string())
                .or_insert_with(|| StatusCount {
                    vehicle_type: vehicle_type.to_string(),
                    ..Default::default()
                })
                .record(&vehicle.status);
        }

        StatusSummary {
            total: overall.total,
            working: overall.working,
            not_working: overall.not_working,
            other: overall.other,
            by_type: by_type.into_values().collect(),
        }
    }
}
