//! # Readiness Calculation Engine
//!
//! 彈藥短缺與戰備計算引擎

pub mod aggregation;
pub mod depletion;
pub mod engine;
pub mod filter_resolver;
pub mod shortage;
pub mod status;

use serde::Serialize;

// Re-export 主要類型
pub use aggregation::{
    AggregateLine, AggregateRecord, AggregationMode, AggregationOptions, Aggregator, ChartPoint,
    CountBasis, GroupDimension, StockItem, FLEET_KEY,
};
pub use depletion::{
    DaysRemaining, DepletionCalculator, DepletionProjection, MaintenanceCalculator,
    MaintenanceForecast, Urgency, UrgencyThresholds,
};
pub use engine::ReadinessEngine;
pub use filter_resolver::{FilterResolver, FilteredFleet};
pub use shortage::{BundleShortage, ScopeColumns, ShortageCalculator, ShortageLine, ShortageRecord, ShortageTable};
pub use status::{StatusCalculator, StatusCount, StatusSummary};

/// 單次戰備計算結果
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessReport {
    /// 使用的篩選條件
    pub filter: readiness_core::FilterSpec,

    /// 顯示的彈藥範圍
    pub scope: readiness_core::AmmoScope,

    /// 逐車短缺表
    pub shortages: Vec<ShortageRecord>,

    /// 依連隊彙總
    pub by_unit: Vec<AggregateRecord>,

    /// 依駐地彙總
    pub by_location: Vec<AggregateRecord>,

    /// 全營彙總
    pub fleet: AggregateRecord,

    /// 車輛妥善狀態
    pub status: StatusSummary,

    /// 診斷資訊
    pub diagnostics: Diagnostics,
}

/// 警告種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WarningKind {
    /// 彈藥列引用的車號不在車輛表中
    MissingReference,
    /// 數量欄位無法解析（以 0 計算）
    MalformedValue,
    /// 資料列缺少必要欄位（已略過）
    MalformedRow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WarningSeverity {
    Info,
    Warning,
    Error,
}

/// 戰備計算警告
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadinessWarning {
    pub vehicle_id: String,
    pub kind: WarningKind,
    pub message: String,
    pub severity: WarningSeverity,
}

impl ReadinessWarning {
    pub fn new(
        vehicle_id: String,
        kind: WarningKind,
        message: String,
        severity: WarningSeverity,
    ) -> Self {
        Self {
            vehicle_id,
            kind,
            message,
            severity,
        }
    }

    pub fn missing_reference(vehicle_id: &str) -> Self {
        Self::new(
            vehicle_id.to_string(),
            WarningKind::MissingReference,
            format!("車號 {} 不在車輛表中，連隊與駐地標示為未知", vehicle_id),
            WarningSeverity::Warning,
        )
    }

    pub fn malformed_value(vehicle_id: &str, ammo_type: &str, raw: &str) -> Self {
        Self::new(
            vehicle_id.to_string(),
            WarningKind::MalformedValue,
            format!("車號 {} 的 {} 數量無法解析: {:?}，以 0 計算", vehicle_id, ammo_type, raw),
            WarningSeverity::Warning,
        )
    }

    pub fn malformed_row(row_index: usize, reason: &str) -> Self {
        Self::new(
            String::new(),
            WarningKind::MalformedRow,
            format!("第 {} 列已略過: {}", row_index + 1, reason),
            WarningSeverity::Error,
        )
    }
}

/// 診斷摘要（逐列異常只記錄，不中斷計算）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub warnings: Vec<ReadinessWarning>,
    pub missing_references: usize,
    pub malformed_values: usize,
    pub skipped_rows: usize,
}

impl Diagnostics {
    pub fn empty() -> Self {
        Self::default()
    }

    /// 添加警告並更新計數
    pub fn add_warning(&mut self, warning: ReadinessWarning) {
        match warning.kind {
            WarningKind::MissingReference => self.missing_references += 1,
            WarningKind::MalformedValue => self.malformed_values += 1,
            WarningKind::MalformedRow => self.skipped_rows += 1,
        }
        self.warnings.push(warning);
    }

    /// 合併另一份診斷
    pub fn merge(&mut self, other: Diagnostics) {
        for warning in other.warnings {
            self.add_warning(warning);
        }
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}
