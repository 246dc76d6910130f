//! 戰備計算主流程

use readiness_core::{
    AmmoScope, AmmoType, FilterOptions, FilterSpec, FleetSnapshot, StandardsTable, VehicleId,
};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::aggregation::{
    AggregationMode, AggregationOptions, Aggregator, CountBasis, GroupDimension, FLEET_KEY,
};
use crate::depletion::{DepletionCalculator, DepletionProjection, MaintenanceCalculator, MaintenanceForecast};
use crate::filter_resolver::FilterResolver;
use crate::shortage::ShortageCalculator;
use crate::status::StatusCalculator;
use crate::ReadinessReport;

/// 戰備計算引擎
///
/// 每次計算都是快照、篩選條件與標準的純函數，引擎本身不保存任何狀態。
pub struct ReadinessEngine {
    /// 彈藥標準
    standards: StandardsTable,

    /// 彙總選項
    options: AggregationOptions,
}

impl ReadinessEngine {
    pub fn new(standards: StandardsTable) -> Self {
        Self {
            standards,
            options: AggregationOptions::default(),
        }
    }

    /// 建構器模式：設置總短缺計算方式
    pub fn with_aggregation_mode(mut self, mode: AggregationMode) -> Self {
        self.options.mode = mode;
        self
    }

    /// 建構器模式：設置群組車數來源
    pub fn with_count_basis(mut self, count_basis: CountBasis) -> Self {
        self.options.count_basis = count_basis;
        self
    }

    pub fn standards(&self) -> &StandardsTable {
        &self.standards
    }

    pub fn options(&self) -> AggregationOptions {
        self.options
    }

    /// 篩選選項清單
    pub fn filter_options(&self, snapshot: &FleetSnapshot) -> FilterOptions {
        FilterOptions::from_registry(&snapshot.vehicles)
    }

    /// 主計算入口
    pub fn evaluate(
        &self,
        snapshot: &FleetSnapshot,
        filter: &FilterSpec,
        scope: &AmmoScope,
    ) -> ReadinessReport {
        tracing::info!(
            "開始戰備計算：車輛 {} 輛，彈藥列 {} 筆",
            snapshot.vehicles.len(),
            snapshot.ammo.len()
        );

        let start_time = std::time::Instant::now();

        // Step 1: 篩選
        tracing::debug!("Step 1: 篩選車輛與彈藥列");
        let filtered = FilterResolver::resolve(snapshot, filter);

        // Step 2: 逐車短缺
        tracing::debug!("Step 2: 逐車短缺計算");
        let mut table = ShortageCalculator::calculate(
            filtered.ammo.iter().copied(),
            &snapshot.vehicles,
            &self.standards,
            scope,
        );
        // 引用不存在車輛的彈藥列只記入診斷，不參與彙總
        table.diagnostics.merge(ShortageCalculator::check_references(
            &snapshot.ammo,
            &snapshot.vehicles,
        ));

        // Step 3: 彙總
        tracing::debug!("Step 3: 依連隊、駐地與全營彙總");
        let aggregate = |dimension: GroupDimension| {
            Aggregator::aggregate(
                &table.records,
                dimension,
                filtered.vehicles.iter().copied(),
                &self.standards,
                scope,
                self.options,
            )
        };
        let by_unit = aggregate(GroupDimension::Unit);
        let by_location = aggregate(GroupDimension::Location);
        let fleet = aggregate(GroupDimension::Fleet)
            .into_iter()
            .next()
            .unwrap_or_else(|| {
                Aggregator::aggregate_group(
                    FLEET_KEY.to_string(),
                    GroupDimension::Fleet,
                    &[],
                    0,
                    &self.standards,
                    scope,
                    self.options.mode,
                )
            });

        // Step 4: 妥善狀態
        tracing::debug!("Step 4: 妥善狀態統計");
        let status = StatusCalculator::summarize(filtered.vehicles.iter().copied());

        if !table.diagnostics.is_clean() {
            tracing::warn!(
                "計算過程出現 {} 筆警告（缺少車輛 {}，數值錯誤 {}，略過列 {}）",
                table.diagnostics.warnings.len(),
                table.diagnostics.missing_references,
                table.diagnostics.malformed_values,
                table.diagnostics.skipped_rows
            );
        }

        tracing::info!(
            "戰備計算完成：{} 筆短缺記錄，耗時 {} ms",
            table.records.len(),
            start_time.elapsed().as_millis()
        );

        ReadinessReport {
            filter: filter.clone(),
            scope: scope.clone(),
            shortages: table.records,
            by_unit,
            by_location,
            fleet,
            status,
            diagnostics: table.diagnostics,
        }
    }

    /// 彈藥耗盡預測（範圍與 `evaluate` 相同的篩選結果）
    pub fn project_depletion(
        &self,
        snapshot: &FleetSnapshot,
        filter: &FilterSpec,
        daily_usage: &BTreeMap<AmmoType, Decimal>,
    ) -> Vec<DepletionProjection> {
        let filtered = FilterResolver::resolve(snapshot, filter);

        DepletionCalculator::project_ledger(filtered.ammo, &self.standards, daily_usage)
    }

    /// 篩選後車輛的保養預測（依車號排序）
    pub fn forecast_maintenance(
        &self,
        snapshot: &FleetSnapshot,
        filter: &FilterSpec,
        hours_to_maintenance: &BTreeMap<VehicleId, Decimal>,
        daily_usage_hours: &BTreeMap<VehicleId, Decimal>,
    ) -> Vec<MaintenanceForecast> {
        let filtered = FilterResolver::resolve(snapshot, filter);

        let mut forecasts: Vec<MaintenanceForecast> = filtered
            .vehicles
            .iter()
            .map(|vehicle| {
                MaintenanceCalculator::forecast(
                    vehicle.id.clone(),
                    hours_to_maintenance.get(&vehicle.id).copied(),
                    daily_usage_hours.get(&vehicle.id).copied(),
                )
            })
            .collect();
        forecasts.sort_by(|a, b| a.vehicle_id.cmp(&b.vehicle_id));
        forecasts.dedup_by(|a, b| a.vehicle_id == b.vehicle_id);

        forecasts
    }
}
