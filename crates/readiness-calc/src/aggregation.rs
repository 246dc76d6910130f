//! 短缺彙總
//!
//! 依連隊、駐地或全營彙總逐車短缺。預設採「合併計算」：
//! 總短缺 = max(每車標準 × 車數 - 總存量, 0)，而不是逐車短缺的加總，
//! 因此同一群組中超額與不足的車輛會互相抵銷。

use readiness_core::{label_or_unknown, AmmoScope, AmmoType, StandardsTable, Vehicle};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::shortage::{ScopeColumns, ShortageCalculator, ShortageRecord};

/// 全營彙總的群組鍵
pub const FLEET_KEY: &str = "fleet";

/// 彙總維度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GroupDimension {
    /// 依連隊
    Unit,
    /// 依駐地
    Location,
    /// 全營
    Fleet,
}

/// 總短缺計算方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum AggregationMode {
    /// 合併計算：max(總標準 - 總存量, 0)
    #[default]
    Pooled,
    /// 逐車短缺加總
    SumOfVehicleShortages,
}

/// 群組車數來源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CountBasis {
    /// 篩選後車輛表中的車數
    #[default]
    Registry,
    /// 彈藥表列數
    Ledger,
}

/// 彙總選項
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AggregationOptions {
    pub mode: AggregationMode,
    pub count_basis: CountBasis,
}

/// 彙總項目（獨立彈藥或組合彈藥）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StockItem {
    Ammo(AmmoType),
    Bundle(String),
}

impl StockItem {
    pub fn label(&self) -> &str {
        match self {
            StockItem::Ammo(ammo_type) => ammo_type.as_str(),
            StockItem::Bundle(name) => name,
        }
    }
}

/// 單一項目的彙總結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateLine {
    pub item: StockItem,
    pub total_current: Decimal,
    pub total_standard: Decimal,
    pub total_shortage: Decimal,
    /// 短缺百分比（總標準為 0 時為 0）
    pub shortage_pct: Decimal,
}

/// 圖表資料點（已套用顯示縮放）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub current: Decimal,
    pub standard: Decimal,
}

/// 群組彙總記錄
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateRecord {
    pub dimension: GroupDimension,
    pub key: String,
    pub vehicle_count: usize,
    pub lines: Vec<AggregateLine>,
}

impl AggregateRecord {
    pub fn line(&self, label: &str) -> Option<&AggregateLine> {
        self.lines.iter().find(|l| l.item.label() == label)
    }

    /// 圖表用數值：設定縮放倍數的彈藥除以倍數，標籤加註 `(x倍數)`
    pub fn chart_points(&self, standards: &StandardsTable) -> Vec<ChartPoint> {
        self.lines
            .iter()
            .map(|line| {
                let divisor = match &line.item {
                    StockItem::Ammo(ammo_type) => standards.display_scale(ammo_type),
                    StockItem::Bundle(_) => 1,
                };

                if divisor > 1 {
                    let scale = Decimal::from(divisor);
                    ChartPoint {
                        label: format!("{} (x{})", line.item.label(), divisor),
                        current: line.total_current / scale,
                        standard: line.total_standard / scale,
                    }
                } else {
                    ChartPoint {
                        label: line.item.label().to_string(),
                        current: line.total_current,
                        standard: line.total_standard,
                    }
                }
            })
            .collect()
    }
}

/// 彙總計算器
pub struct Aggregator;

impl Aggregator {
    /// 依維度彙總
    ///
    /// * `vehicles` - 篩選後的車輛（`CountBasis::Registry` 時用於計算車數）
    pub fn aggregate<'a, I>(
        records: &[ShortageRecord],
        dimension: GroupDimension,
        vehicles: I,
        standards: &StandardsTable,
        scope: &AmmoScope,
        options: AggregationOptions,
    ) -> Vec<AggregateRecord>
    where
        I: IntoIterator<Item = &'a Vehicle>,
    {
        let mut groups: BTreeMap<String, (Vec<&ShortageRecord>, usize)> = BTreeMap::new();

        if dimension == GroupDimension::Fleet {
            groups.insert(FLEET_KEY.to_string(), (Vec::new(), 0));
        }

        for record in records {
            let entry = groups
                .entry(Self::record_key(record, dimension))
                .or_default();
            entry.0.push(record);
            if options.count_basis == CountBasis::Ledger {
                entry.1 += 1;
            }
        }

        if options.count_basis == CountBasis::Registry {
            for vehicle in vehicles {
                groups
                    .entry(Self::vehicle_key(vehicle, dimension))
                    .or_default()
                    .1 += 1;
            }
        }

        let summary: Vec<AggregateRecord> = groups
            .into_iter()
            .map(|(key, (members, vehicle_count))| {
                Self::aggregate_group(
                    key,
                    dimension,
                    &members,
                    vehicle_count,
                    standards,
                    scope,
                    options.mode,
                )
            })
            .collect();

        tracing::debug!("{:?} 彙總: {} 個群組", dimension, summary.len());

        summary
    }

    /// 彙總單一群組
    pub fn aggregate_group(
        key: String,
        dimension: GroupDimension,
        records: &[&ShortageRecord],
        vehicle_count: usize,
        standards: &StandardsTable,
        scope: &AmmoScope,
        mode: AggregationMode,
    ) -> AggregateRecord {
        let columns = ScopeColumns::resolve(standards, scope);
        let count = Decimal::from(vehicle_count as u64);
        let mut lines = Vec::with_capacity(columns.independent.len() + 1);

        for ammo_type in &columns.independent {
            let (total_current, vehicle_shortage) = records
                .iter()
                .filter_map(|r| r.line(ammo_type))
                .fold((Decimal::ZERO, Decimal::ZERO), |(current, shortage), line| {
                    (current + line.current, shortage + line.shortage)
                });
            let per_vehicle = Decimal::from(standards.standard_for(ammo_type).unwrap_or(0));

            lines.push(Self::build_line(
                StockItem::Ammo(ammo_type.clone()),
                total_current,
                per_vehicle * count,
                vehicle_shortage,
                mode,
            ));
        }

        if columns.include_bundle {
            let (total_current, vehicle_shortage) = records
                .iter()
                .filter_map(|r| r.bundle.as_ref())
                .fold((Decimal::ZERO, Decimal::ZERO), |(current, shortage), bundle| {
                    (current + bundle.current, shortage + bundle.shortage)
                });
            let per_vehicle = Decimal::from(standards.bundle_standard());

            lines.push(Self::build_line(
                StockItem::Bundle(standards.bundle_name().to_string()),
                total_current,
                per_vehicle * count,
                vehicle_shortage,
                mode,
            ));
        }

        AggregateRecord {
            dimension,
            key,
            vehicle_count,
            lines,
        }
    }

    /// 短缺百分比 = 總短缺 / 總標準 × 100（總標準為 0 時為 0）
    pub fn shortage_percentage(total_shortage: Decimal, total_standard: Decimal) -> Decimal {
        if total_standard.is_zero() {
            return Decimal::ZERO;
        }
        (total_shortage * Decimal::ONE_HUNDRED)
            .checked_div(total_standard)
            .unwrap_or(Decimal::ZERO)
    }

    fn build_line(
        item: StockItem,
        total_current: Decimal,
        total_standard: Decimal,
        vehicle_shortage: Decimal,
        mode: AggregationMode,
    ) -> AggregateLine {
        let total_shortage = match mode {
            AggregationMode::Pooled => ShortageCalculator::shortage(total_standard, total_current),
            AggregationMode::SumOfVehicleShortages => vehicle_shortage,
        };

        AggregateLine {
            item,
            total_current,
            total_standard,
            total_shortage,
            shortage_pct: Self::shortage_percentage(total_shortage, total_standard),
        }
    }

    fn record_key(record: &ShortageRecord, dimension: GroupDimension) -> String {
        match dimension {
            GroupDimension::Unit => label_or_unknown(&record.unit).to_string(),
            GroupDimension::Location => label_or_unknown(&record.location).to_string(),
            GroupDimension::Fleet => FLEET_KEY.to_string(),
        }
    }

    fn vehicle_key(vehicle: &Vehicle, dimension: GroupDimension) -> String {
        match dimension {
            GroupDimension::Unit => label_or_unknown(&vehicle.unit).to_string(),
            GroupDimension::Location => label_or_unknown(&vehicle.location).to_string(),
            GroupDimension::Fleet => FLEET_KEY.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use readiness_core::{AmmoHolding, StandardsConfig};

    fn standards() -> StandardsTable {
        StandardsTable::new(
            StandardsConfig::new()
                .with_standard("hetz", 3)
                .with_standard("regular_556", 990)
                .with_bundle("Calanit+Halul+Hatzav", &["calanit", "halul", "hatzav"], 27)
                .with_display_scale("regular_556", 1000),
        )
        .unwrap()
    }

    fn records(
        holdings: &[AmmoHolding],
        registry: &[Vehicle],
        standards: &StandardsTable,
    ) -> Vec<ShortageRecord> {
        ShortageCalculator::calculate(holdings, registry, standards, &AmmoScope::All).records
    }

    #[test]
    fn test_pooling_differs_from_vehicle_sum() {
        let standards = standards();
        let registry = vec![Vehicle::new("1", "A", "North"), Vehicle::new("2", "A", "North")];
        // 車 1 超額 2，車 2 不足 2
        let holdings = vec![
            AmmoHolding::new("1").with_quantity("hetz", 5),
            AmmoHolding::new("2").with_quantity("hetz", 1),
        ];
        let records = records(&holdings, &registry, &standards);

        let pooled = Aggregator::aggregate(
            &records,
            GroupDimension::Unit,
            &registry,
            &standards,
            &AmmoScope::All,
            AggregationOptions::default(),
        );
        let summed = Aggregator::aggregate(
            &records,
            GroupDimension::Unit,
            &registry,
            &standards,
            &AmmoScope::All,
            AggregationOptions {
                mode: AggregationMode::SumOfVehicleShortages,
                ..Default::default()
            },
        );

        let pooled_hetz = pooled[0].line("hetz").unwrap();
        let summed_hetz = summed[0].line("hetz").unwrap();

        assert_eq!(pooled_hetz.total_standard, Decimal::from(6));
        assert_eq!(pooled_hetz.total_current, Decimal::from(6));
        assert_eq!(pooled_hetz.total_shortage, Decimal::ZERO);
        assert_eq!(summed_hetz.total_shortage, Decimal::from(2));
        assert_ne!(pooled_hetz.total_shortage, summed_hetz.total_shortage);
    }

    #[test]
    fn test_group_by_unit_and_location() {
        let standards = standards();
        let registry = vec![
            Vehicle::new("1", "A", "North"),
            Vehicle::new("2", "B", "North"),
            Vehicle::new("3", "B", "South"),
        ];
        let holdings = vec![
            AmmoHolding::new("1").with_quantity("hetz", 3),
            AmmoHolding::new("2").with_quantity("hetz", 0),
        ];
        let records = records(&holdings, &registry, &standards);

        let by_unit = Aggregator::aggregate(
            &records,
            GroupDimension::Unit,
            &registry,
            &standards,
            &AmmoScope::All,
            AggregationOptions::default(),
        );
        assert_eq!(by_unit.len(), 2);
        assert_eq!(by_unit[0].key, "A");
        assert_eq!(by_unit[1].key, "B");
        assert_eq!(by_unit[1].vehicle_count, 2);

        // B 連：標準 3 × 2 = 6，存量 0，短缺 100%
        let hetz_b = by_unit[1].line("hetz").unwrap();
        assert_eq!(hetz_b.total_standard, Decimal::from(6));
        assert_eq!(hetz_b.total_shortage, Decimal::from(6));
        assert_eq!(hetz_b.shortage_pct, Decimal::from(100));

        let by_location = Aggregator::aggregate(
            &records,
            GroupDimension::Location,
            &registry,
            &standards,
            &AmmoScope::All,
            AggregationOptions::default(),
        );
        let keys: Vec<&str> = by_location.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["North", "South"]);
        assert_eq!(by_location[1].line("hetz").unwrap().total_current, Decimal::ZERO);
    }

    #[test]
    fn test_ledger_count_basis() {
        let standards = standards();
        let registry = vec![Vehicle::new("1", "A", "North"), Vehicle::new("2", "A", "North")];
        let holdings = vec![AmmoHolding::new("1").with_quantity("hetz", 3)];
        let records = records(&holdings, &registry, &standards);

        let fleet = Aggregator::aggregate(
            &records,
            GroupDimension::Fleet,
            &registry,
            &standards,
            &AmmoScope::All,
            AggregationOptions {
                count_basis: CountBasis::Ledger,
                ..Default::default()
            },
        );

        assert_eq!(fleet[0].vehicle_count, 1);
        assert_eq!(fleet[0].line("hetz").unwrap().total_standard, Decimal::from(3));
    }

    #[test]
    fn test_empty_fleet_is_well_formed() {
        let standards = standards();
        let registry: Vec<Vehicle> = Vec::new();

        let fleet = Aggregator::aggregate(
            &[],
            GroupDimension::Fleet,
            &registry,
            &standards,
            &AmmoScope::All,
            AggregationOptions::default(),
        );

        assert_eq!(fleet.len(), 1);
        assert_eq!(fleet[0].key, FLEET_KEY);
        for line in &fleet[0].lines {
            assert_eq!(line.total_standard, Decimal::ZERO);
            assert_eq!(line.shortage_pct, Decimal::ZERO);
        }
    }

    #[test]
    fn test_bundle_line() {
        let standards = standards();
        let registry = vec![Vehicle::new("1", "A", "North"), Vehicle::new("2", "A", "North")];
        let holdings = vec![
            AmmoHolding::new("1")
                .with_quantity("calanit", 20)
                .with_quantity("halul", 20),
            AmmoHolding::new("2").with_quantity("hatzav", 5),
        ];
        let records = records(&holdings, &registry, &standards);

        let fleet = Aggregator::aggregate(
            &records,
            GroupDimension::Fleet,
            &registry,
            &standards,
            &AmmoScope::Bundle,
            AggregationOptions::default(),
        );

        let line = fleet[0].line("Calanit+Halul+Hatzav").unwrap();
        assert_eq!(fleet[0].lines.len(), 1);
        assert_eq!(line.total_current, Decimal::from(45));
        assert_eq!(line.total_standard, Decimal::from(54));
        assert_eq!(line.total_shortage, Decimal::from(9));
    }

    #[test]
    fn test_shortage_percentage() {
        assert_eq!(
            Aggregator::shortage_percentage(Decimal::from(1), Decimal::from(4)),
            Decimal::from(25)
        );
        assert_eq!(
            Aggregator::shortage_percentage(Decimal::from(5), Decimal::ZERO),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_chart_points_scaling() {
        let standards = standards();
        let registry = vec![Vehicle::new("1", "A", "North")];
        let holdings = vec![AmmoHolding::new("1").with_quantity("regular_556", 495)];
        let records = records(&holdings, &registry, &standards);

        let fleet = Aggregator::aggregate(
            &records,
            GroupDimension::Fleet,
            &registry,
            &standards,
            &AmmoScope::All,
            AggregationOptions::default(),
        );
        let points = fleet[0].chart_points(&standards);

        let rifle = points
            .iter()
            .find(|p| p.label == "regular_556 (x1000)")
            .unwrap();
        assert_eq!(rifle.current, Decimal::new(495, 3));
        assert_eq!(rifle.standard, Decimal::new(990, 3));

        let hetz = points.iter().find(|p| p.label == "hetz").unwrap();
        assert_eq!(hetz.standard, Decimal::from(3));
    }
}
