//! # Readiness History
//!
//! 車輛表與彈藥表的存檔與歷史紀錄

pub mod entry;
pub mod store;

// Re-export 主要類型
pub use entry::{HistoryEntry, HistoryTable};
pub use store::SnapshotStore;
