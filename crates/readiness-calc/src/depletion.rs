//! 耗盡與保養預測
//!
//! 剩餘天數 = 存量 / 每日用量。用量為 0（或負值）時結果為 [`DaysRemaining::Unbounded`]，
//! 不會產生無限大或除以零的錯誤。

use readiness_core::{AmmoHolding, AmmoType, StandardsTable, VehicleId};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// 預測天數的小數位數
const DAYS_DP: u32 = 1;

/// 預設保養間隔（小時）
pub const DEFAULT_MAINTENANCE_HOURS: u32 = 100;

/// 剩餘天數
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaysRemaining {
    Days(Decimal),
    /// 沒有消耗，不會耗盡
    Unbounded,
}

impl DaysRemaining {
    pub fn compute(stock: Decimal, daily_rate: Decimal) -> Self {
        if daily_rate <= Decimal::ZERO {
            return DaysRemaining::Unbounded;
        }
        match stock.checked_div(daily_rate) {
            Some(days) => DaysRemaining::Days(days.round_dp(DAYS_DP)),
            None => DaysRemaining::Unbounded,
        }
    }

    pub fn days(&self) -> Option<Decimal> {
        match self {
            DaysRemaining::Days(days) => Some(*days),
            DaysRemaining::Unbounded => None,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, DaysRemaining::Unbounded)
    }
}

impl Serialize for DaysRemaining {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DaysRemaining::Days(days) => Serialize::serialize(days, serializer),
            DaysRemaining::Unbounded => serializer.serialize_str("unbounded"),
        }
    }
}

/// 緊急程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Urgency {
    Critical,
    Warning,
    Stable,
}

/// 緊急程度門檻（天數小於 `critical` 為危急，小於 `warning` 為警告）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UrgencyThresholds {
    pub critical: Decimal,
    pub warning: Decimal,
}

impl UrgencyThresholds {
    pub fn new(critical: u32, warning: u32) -> Self {
        Self {
            critical: Decimal::from(critical),
            warning: Decimal::from(warning),
        }
    }

    /// 彈藥：30 天內危急，90 天內警告
    pub fn ammo() -> Self {
        Self::new(30, 90)
    }

    /// 保養：5 天內危急，15 天內警告
    pub fn maintenance() -> Self {
        Self::new(5, 15)
    }

    pub fn classify(&self, remaining: DaysRemaining) -> Urgency {
        match remaining {
            DaysRemaining::Days(days) if days < self.critical => Urgency::Critical,
            DaysRemaining::Days(days) if days < self.warning => Urgency::Warning,
            _ => Urgency::Stable,
        }
    }
}

/// 彈藥耗盡預測
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepletionProjection {
    pub ammo_type: AmmoType,
    pub current_total: Decimal,
    pub daily_usage: Decimal,
    pub days_to_depletion: DaysRemaining,
}

impl DepletionProjection {
    pub fn urgency(&self) -> Urgency {
        UrgencyThresholds::ammo().classify(self.days_to_depletion)
    }
}

/// 耗盡預測計算器
pub struct DepletionCalculator;

impl DepletionCalculator {
    pub fn project(
        ammo_type: AmmoType,
        current_total: Decimal,
        daily_usage: Decimal,
    ) -> DepletionProjection {
        DepletionProjection {
            days_to_depletion: DaysRemaining::compute(current_total, daily_usage),
            ammo_type,
            current_total,
            daily_usage,
        }
    }

    /// 全部彈藥列的各類存量合計（組合成員各自計算，依名稱排序）
    pub fn ledger_totals<'a, I>(ammo: I, standards: &StandardsTable) -> BTreeMap<AmmoType, Decimal>
    where
        I: IntoIterator<Item = &'a AmmoHolding>,
    {
        let mut totals: BTreeMap<AmmoType, Decimal> = standards
            .all_types()
            .into_iter()
            .map(|ammo_type| (ammo_type.clone(), Decimal::ZERO))
            .collect();

        for holding in ammo {
            for (ammo_type, total) in totals.iter_mut() {
                *total += holding.current(ammo_type);
            }
        }

        totals
    }

    /// 依每日用量預測各類彈藥耗盡天數（未提供用量者視為 0）
    pub fn project_ledger<'a, I>(
        ammo: I,
        standards: &StandardsTable,
        daily_usage: &BTreeMap<AmmoType, Decimal>,
    ) -> Vec<DepletionProjection>
    where
        I: IntoIterator<Item = &'a AmmoHolding>,
    {
        let projections: Vec<DepletionProjection> = Self::ledger_totals(ammo, standards)
            .into_iter()
            .map(|(ammo_type, total)| {
                let usage = daily_usage.get(&ammo_type).copied().unwrap_or(Decimal::ZERO);
                Self::project(ammo_type, total, usage)
            })
            .collect();

        let critical = projections
            .iter()
            .filter(|p| p.urgency() == Urgency::Critical)
            .count();
        if critical > 0 {
            tracing::warn!("{} 種彈藥將在 30 天內耗盡", critical);
        }

        projections
    }
}

/// 車輛保養預測
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaintenanceForecast {
    pub vehicle_id: VehicleId,
    pub hours_to_maintenance: Decimal,
    pub daily_usage_hours: Decimal,
    pub days_to_maintenance: DaysRemaining,
    pub urgency: Urgency,
}

/// 保養預測計算器
pub struct MaintenanceCalculator;

impl MaintenanceCalculator {
    /// * `hours_to_maintenance` - 距下次保養的時數，未提供時為 100
    /// * `daily_usage_hours` - 每日使用時數，未提供時為 0
    pub fn forecast(
        vehicle_id: VehicleId,
        hours_to_maintenance: Option<Decimal>,
        daily_usage_hours: Option<Decimal>,
    ) -> MaintenanceForecast {
        let hours = hours_to_maintenance.unwrap_or(Decimal::from(DEFAULT_MAINTENANCE_HOURS));
        let usage = daily_usage_hours.unwrap_or(Decimal::ZERO);
        let days = DaysRemaining::compute(hours, usage);

        MaintenanceForecast {
            vehicle_id,
            hours_to_maintenance: hours,
            daily_usage_hours: usage,
            days_to_maintenance: days,
            urgency: UrgencyThresholds::maintenance().classify(days),
        }
    }
}
