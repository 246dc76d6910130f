//! # Readiness
//!
//! 營級彈藥短缺與戰備計算
//!
//! - [`readiness_core`]：車輛、彈藥、標準、篩選條件與 CSV 匯入
//! - [`readiness_calc`]：短缺計算、彙總、耗盡預測與計算引擎
//! - [`readiness_history`]：存檔與歷史紀錄

pub use readiness_calc;
pub use readiness_core;
pub use readiness_history;

pub use readiness_calc::{ReadinessEngine, ReadinessReport};
pub use readiness_core::{
    AmmoScope, FilterSpec, FleetSnapshot, ReadinessError, Result, StandardsConfig, StandardsTable,
};
pub use readiness_history::SnapshotStore;
