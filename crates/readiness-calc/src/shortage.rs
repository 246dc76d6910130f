//! 逐車短缺計算

use readiness_core::{
    label_or_unknown, AmmoHolding, AmmoScope, AmmoType, StandardsTable, Vehicle, VehicleId,
    UNKNOWN,
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

use crate::{Diagnostics, ReadinessWarning};

/// 單一彈藥種類的存量與短缺
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortageLine {
    pub ammo_type: AmmoType,
    /// 現有數量
    pub current: Decimal,
    /// 短缺數量（組合成員為整組短缺）
    pub shortage: Decimal,
    /// 是否為組合彈藥成員
    pub bundled: bool,
}

/// 組合彈藥的合併存量與短缺
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleShortage {
    pub name: String,
    pub current: Decimal,
    pub standard: Decimal,
    pub shortage: Decimal,
}

/// 單車短缺記錄
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortageRecord {
    pub unit: String,
    pub location: String,
    pub vehicle_id: VehicleId,
    pub lines: Vec<ShortageLine>,
    pub bundle: Option<BundleShortage>,
}

impl ShortageRecord {
    pub fn line(&self, ammo_type: &AmmoType) -> Option<&ShortageLine> {
        self.lines.iter().find(|l| &l.ammo_type == ammo_type)
    }

    /// 任何一項低於標準
    pub fn has_shortage(&self) -> bool {
        self.lines.iter().any(|l| l.shortage > Decimal::ZERO)
            || self
                .bundle
                .as_ref()
                .is_some_and(|b| b.shortage > Decimal::ZERO)
    }
}

/// 短缺表（含診斷資訊）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShortageTable {
    pub records: Vec<ShortageRecord>,
    pub diagnostics: Diagnostics,
}

/// 依彈藥範圍決定要輸出的欄位
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeColumns {
    /// 獨立彈藥
    pub independent: Vec<AmmoType>,
    /// 組合彈藥成員
    pub members: Vec<AmmoType>,
    /// 是否輸出組合合併值
    pub include_bundle: bool,
}

impl ScopeColumns {
    pub fn resolve(standards: &StandardsTable, scope: &AmmoScope) -> Self {
        match scope {
            AmmoScope::All => Self {
                independent: standards.independent_types().cloned().collect(),
                members: standards.bundle_members().to_vec(),
                include_bundle: true,
            },
            AmmoScope::Bundle => Self {
                independent: Vec::new(),
                members: standards.bundle_members().to_vec(),
                include_bundle: true,
            },
            AmmoScope::Single(ammo_type) if standards.is_bundled(ammo_type) => Self {
                independent: Vec::new(),
                members: vec![ammo_type.clone()],
                include_bundle: true,
            },
            AmmoScope::Single(ammo_type) => Self {
                independent: standards
                    .standard_for(ammo_type)
                    .map(|_| vec![ammo_type.clone()])
                    .unwrap_or_default(),
                members: Vec::new(),
                include_bundle: false,
            },
        }
    }
}

/// 短缺計算器
pub struct ShortageCalculator;

impl ShortageCalculator {
    /// 逐列計算短缺（每一筆彈藥列輸出一筆記錄）
    ///
    /// * `ammo` - 篩選後的彈藥列
    /// * `registry` - 完整車輛表（用於查詢連隊／駐地）
    pub fn calculate<'a, I>(
        ammo: I,
        registry: &[Vehicle],
        standards: &StandardsTable,
        scope: &AmmoScope,
    ) -> ShortageTable
    where
        I: IntoIterator<Item = &'a AmmoHolding>,
    {
        let columns = ScopeColumns::resolve(standards, scope);
        let index = Self::index_registry(registry);
        let mut table = ShortageTable::default();

        for (row_index, holding) in ammo.into_iter().enumerate() {
            if holding.vehicle_id.is_empty() {
                tracing::warn!("彈藥表第 {} 列缺少車號，已略過", row_index + 1);
                table
                    .diagnostics
                    .add_warning(ReadinessWarning::malformed_row(row_index, "缺少車號"));
                continue;
            }

            let vehicle = index.get(&holding.vehicle_id).copied();
            if vehicle.is_none() {
                tracing::warn!("車號 {} 不在車輛表中", holding.vehicle_id);
                table
                    .diagnostics
                    .add_warning(ReadinessWarning::missing_reference(holding.vehicle_id.as_str()));
            }

            Self::record_malformed_values(holding, standards, &mut table.diagnostics);

            table
                .records
                .push(Self::calculate_row(holding, vehicle, standards, &columns));
        }

        tracing::debug!(
            "短缺計算完成: {} 筆記錄，{} 筆警告",
            table.records.len(),
            table.diagnostics.warnings.len()
        );

        table
    }

    /// 檢查彈藥列的車號引用（不產生短缺記錄）
    ///
    /// 車號不在車輛表中的列記為 `MissingReference`，缺少車號的列記為 `MalformedRow`。
    pub fn check_references<'a, I>(ammo: I, registry: &[Vehicle]) -> Diagnostics
    where
        I: IntoIterator<Item = &'a AmmoHolding>,
    {
        let index = Self::index_registry(registry);
        let mut diagnostics = Diagnostics::empty();

        for (row_index, holding) in ammo.into_iter().enumerate() {
            if holding.vehicle_id.is_empty() {
                tracing::warn!("彈藥表第 {} 列缺少車號，已略過", row_index + 1);
                diagnostics.add_warning(ReadinessWarning::malformed_row(row_index, "缺少車號"));
            } else if !index.contains_key(&holding.vehicle_id) {
                tracing::warn!("車號 {} 不在車輛表中，已排除於計算之外", holding.vehicle_id);
                diagnostics.add_warning(ReadinessWarning::missing_reference(
                    holding.vehicle_id.as_str(),
                ));
            }
        }

        diagnostics
    }

    /// 短缺 = max(標準 - 現有, 0)
    pub fn shortage(standard: Decimal, current: Decimal) -> Decimal {
        (standard - current).max(Decimal::ZERO)
    }

    /// 組合彈藥合併存量（缺少欄位視為 0）
    pub fn bundle_current(holding: &AmmoHolding, standards: &StandardsTable) -> Decimal {
        standards
            .bundle_members()
            .iter()
            .map(|member| holding.current(member))
            .sum()
    }

    fn calculate_row(
        holding: &AmmoHolding,
        vehicle: Option<&Vehicle>,
        standards: &StandardsTable,
        columns: &ScopeColumns,
    ) -> ShortageRecord {
        let mut lines = Vec::with_capacity(columns.independent.len() + columns.members.len());

        for ammo_type in &columns.independent {
            let standard = Decimal::from(standards.standard_for(ammo_type).unwrap_or(0));
            let current = holding.current(ammo_type);
            lines.push(ShortageLine {
                ammo_type: ammo_type.clone(),
                current,
                shortage: Self::shortage(standard, current),
                bundled: false,
            });
        }

        // 組合成員共用整組短缺，不個別計算
        let bundle_standard = Decimal::from(standards.bundle_standard());
        let bundle_current = Self::bundle_current(holding, standards);
        let bundle_shortage = Self::shortage(bundle_standard, bundle_current);

        for member in &columns.members {
            lines.push(ShortageLine {
                ammo_type: member.clone(),
                current: holding.current(member),
                shortage: bundle_shortage,
                bundled: true,
            });
        }

        let bundle = columns.include_bundle.then(|| BundleShortage {
            name: standards.bundle_name().to_string(),
            current: bundle_current,
            standard: bundle_standard,
            shortage: bundle_shortage,
        });

        ShortageRecord {
            unit: Self::resolve_label(holding.unit.as_deref(), vehicle.map(|v| v.unit.as_str())),
            location: Self::resolve_label(
                holding.location.as_deref(),
                vehicle.map(|v| v.location.as_str()),
            ),
            vehicle_id: holding.vehicle_id.clone(),
            lines,
            bundle,
        }
    }

    /// 車號索引（重複車號以第一筆為準）
    fn index_registry(registry: &[Vehicle]) -> HashMap<&VehicleId, &Vehicle> {
        let mut index = HashMap::with_capacity(registry.len());
        for vehicle in registry {
            index.entry(&vehicle.id).or_insert(vehicle);
        }
        index
    }

    /// 優先使用彈藥列本身的值，其次車輛表，都沒有時為未知
    fn resolve_label(row_value: Option<&str>, registry_value: Option<&str>) -> String {
        row_value
            .filter(|v| !v.trim().is_empty())
            .or(registry_value)
            .map(label_or_unknown)
            .unwrap_or(UNKNOWN)
            .to_string()
    }

    fn record_malformed_values(
        holding: &AmmoHolding,
        standards: &StandardsTable,
        diagnostics: &mut Diagnostics,
    ) {
        for ammo_type in standards.all_types() {
            if let Some(readiness_core::Quantity::Malformed(raw)) = holding.quantity(ammo_type) {
                tracing::warn!(
                    "車號 {} 的 {} 數量無法解析: {:?}",
                    holding.vehicle_id,
                    ammo_type,
                    raw
                );
                diagnostics.add_warning(ReadinessWarning::malformed_value(
                    holding.vehicle_id.as_str(),
                    ammo_type.as_str(),
                    raw,
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WarningKind;
    use proptest::prelude::*;
    use readiness_core::StandardsConfig;

    fn small_standards() -> StandardsTable {
        StandardsTable::new(
            StandardsConfig::new()
                .with_standard("hetz", 3)
                .with_standard("barzel", 10)
                .with_bundle("Calanit+Halul+Hatzav", &["calanit", "halul", "hatzav"], 27),
        )
        .unwrap()
    }

    fn ammo(name: &str) -> AmmoType {
        AmmoType::new(name)
    }

    #[test]
    fn test_vehicle_seven_scenario() {
        let standards = small_standards();
        let registry = vec![Vehicle::new("7", "A", "North")];
        let holdings = vec![AmmoHolding::new("7")
            .with_quantity("hetz", 1)
            .with_quantity("barzel", 10)
            .with_quantity("calanit", 10)
            .with_quantity("halul", 5)
            .with_quantity("hatzav", 0)];

        let table =
            ShortageCalculator::calculate(&holdings, &registry, &standards, &AmmoScope::All);

        assert_eq!(table.records.len(), 1);
        let record = &table.records[0];
        assert_eq!(record.unit, "A");
        assert_eq!(record.location, "North");
        assert_eq!(record.line(&ammo("hetz")).unwrap().shortage, Decimal::from(2));
        assert_eq!(record.line(&ammo("barzel")).unwrap().shortage, Decimal::ZERO);

        let bundle = record.bundle.as_ref().unwrap();
        assert_eq!(bundle.current, Decimal::from(15));
        assert_eq!(bundle.shortage, Decimal::from(12));
        for member in ["calanit", "halul", "hatzav"] {
            assert_eq!(record.line(&ammo(member)).unwrap().shortage, Decimal::from(12));
        }
        assert!(record.has_shortage());
        assert!(table.diagnostics.is_clean());
    }

    #[test]
    fn test_missing_reference_is_unknown() {
        let standards = small_standards();
        let holdings = vec![AmmoHolding::new("55").with_quantity("hetz", 3)];

        let table = ShortageCalculator::calculate(&holdings, &[], &standards, &AmmoScope::All);

        assert_eq!(table.records[0].unit, UNKNOWN);
        assert_eq!(table.records[0].location, UNKNOWN);
        assert_eq!(table.diagnostics.missing_references, 1);
        assert_eq!(table.diagnostics.warnings[0].kind, WarningKind::MissingReference);
    }

    #[test]
    fn test_row_unit_takes_precedence() {
        let standards = small_standards();
        let registry = vec![Vehicle::new("1", "A", "North")];
        let holdings = vec![
            AmmoHolding::new("1").with_unit("B"),
            AmmoHolding::new("1").with_unit("  "),
        ];

        let table = ShortageCalculator::calculate(&holdings, &registry, &standards, &AmmoScope::All);

        assert_eq!(table.records[0].unit, "B");
        assert_eq!(table.records[1].unit, "A");
        assert_eq!(table.records[1].location, "North");
    }

    #[test]
    fn test_malformed_value_counts_as_zero() {
        let standards = small_standards();
        let registry = vec![Vehicle::new("1", "A", "North")];
        let holdings = vec![AmmoHolding::new("1")
            .with_raw_quantity("hetz", "three")
            .with_raw_quantity("barzel", "")
            .with_raw_quantity("halul", "??")];

        let table = ShortageCalculator::calculate(&holdings, &registry, &standards, &AmmoScope::All);

        let record = &table.records[0];
        assert_eq!(record.line(&ammo("hetz")).unwrap().current, Decimal::ZERO);
        assert_eq!(record.line(&ammo("hetz")).unwrap().shortage, Decimal::from(3));
        assert_eq!(record.line(&ammo("barzel")).unwrap().shortage, Decimal::from(10));
        assert_eq!(table.diagnostics.malformed_values, 2);
    }

    #[test]
    fn test_row_without_id_is_skipped() {
        let standards = small_standards();
        let holdings = vec![
            AmmoHolding::new("").with_quantity("hetz", 1),
            AmmoHolding::new("2").with_quantity("hetz", 1),
        ];
        let registry = vec![Vehicle::new("2", "A", "North")];

        let table = ShortageCalculator::calculate(&holdings, &registry, &standards, &AmmoScope::All);

        assert_eq!(table.records.len(), 1);
        assert_eq!(table.diagnostics.skipped_rows, 1);
    }

    #[test]
    fn test_check_references() {
        let registry = vec![Vehicle::new("1", "A", "North")];
        let holdings = vec![
            AmmoHolding::new("1.0").with_quantity("hetz", 3),
            AmmoHolding::new("99").with_quantity("hetz", 3),
            AmmoHolding::new(" "),
        ];

        let diagnostics = ShortageCalculator::check_references(&holdings, &registry);

        assert_eq!(diagnostics.missing_references, 1);
        assert_eq!(diagnostics.skipped_rows, 1);
        assert_eq!(diagnostics.warnings[0].vehicle_id, "99");
    }

    #[test]
    fn test_scope_columns() {
        let standards = small_standards();
        let registry = vec![Vehicle::new("1", "A", "North")];
        let holdings = vec![AmmoHolding::new("1").with_quantity("halul", 30)];

        let single = ShortageCalculator::calculate(
            &holdings,
            &registry,
            &standards,
            &AmmoScope::single("hetz"),
        );
        assert_eq!(single.records[0].lines.len(), 1);
        assert!(single.records[0].bundle.is_none());

        let member = ShortageCalculator::calculate(
            &holdings,
            &registry,
            &standards,
            &AmmoScope::single("halul"),
        );
        assert_eq!(member.records[0].lines.len(), 1);
        assert_eq!(member.records[0].lines[0].shortage, Decimal::ZERO);
        assert!(member.records[0].bundle.is_some());

        let bundle =
            ShortageCalculator::calculate(&holdings, &registry, &standards, &AmmoScope::Bundle);
        assert_eq!(bundle.records[0].lines.len(), 3);
        assert!(bundle.records[0].lines.iter().all(|l| l.bundled));
    }

    #[test]
    fn test_ammo_keyed_output() {
        let standards = small_standards();
        let registry = vec![Vehicle::new("1", "A", "North"), Vehicle::new("2", "A", "North")];
        let holdings = vec![AmmoHolding::new("1")];

        let table = ShortageCalculator::calculate(&holdings, &registry, &standards, &AmmoScope::All);

        assert_eq!(table.records.len(), 1);
        assert!(table.records.iter().all(|r| r.vehicle_id.as_str() != "2"));
    }

    proptest! {
        #[test]
        fn prop_shortage_never_negative(
            hetz in 0u32..20,
            barzel in 0u32..20,
            calanit in 0u32..30,
            halul in 0u32..30,
            hatzav in 0u32..30,
        ) {
            let standards = small_standards();
            let holdings = vec![AmmoHolding::new("1")
                .with_quantity("hetz", hetz)
                .with_quantity("barzel", barzel)
                .with_quantity("calanit", calanit)
                .with_quantity("halul", halul)
                .with_quantity("hatzav", hatzav)];

            let table = ShortageCalculator::calculate(&holdings, &[], &standards, &AmmoScope::All);
            let record = &table.records[0];

            for line in record.lines.iter().filter(|l| !l.bundled) {
                let standard = Decimal::from(standards.standard_for(&line.ammo_type).unwrap());
                prop_assert_eq!(line.shortage, (standard - line.current).max(Decimal::ZERO));
                prop_assert!(line.shortage >= Decimal::ZERO);
            }

            let expected_bundle = (Decimal::from(27u32)
                - Decimal::from(calanit + halul + hatzav))
                .max(Decimal::ZERO);
            for line in record.lines.iter().filter(|l| l.bundled) {
                prop_assert_eq!(line.shortage, expected_bundle);
            }
            prop_assert_eq!(record.bundle.as_ref().unwrap().shortage, expected_bundle);
        }

        #[test]
        fn prop_calculation_is_idempotent(hetz in 0u32..10, halul in 0u32..40) {
            let standards = small_standards();
            let registry = vec![Vehicle::new("1", "A", "North")];
            let holdings = vec![
                AmmoHolding::new("1").with_quantity("hetz", hetz).with_quantity("halul", halul),
                AmmoHolding::new("2").with_raw_quantity("hetz", "bad"),
            ];

            let first = ShortageCalculator::calculate(&holdings, &registry, &standards, &AmmoScope::All);
            let second = ShortageCalculator::calculate(&holdings, &registry, &standards, &AmmoScope::All);

            prop_assert_eq!(
                serde_json::to_string(&first).unwrap(),
                serde_json::to_string(&second).unwrap()
            );
        }
    }
}
