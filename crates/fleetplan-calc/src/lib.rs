//! # Fleetplan Calculation Engine
//!
//! 層級基準解析、逐月里程推算、車隊網格與緊急度排名

pub mod grid;
pub mod hierarchy;
pub mod outlook;
pub mod projector;
pub mod ranking;

use chrono::NaiveDate;
use fleetplan_core::{CycleProjection, FleetError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// Re-export 主要類型
pub use grid::{GridCalculator, ProjectionRequest};
pub use hierarchy::HierarchyResolver;
pub use outlook::{next_intervention, NextIntervention};
pub use projector::MonthProjector;
pub use ranking::{RankingEntry, UrgencyRanker, UrgencyRanking};

/// 車隊推算網格
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetGrid {
    /// 車隊類型
    pub fleet_type: String,

    /// 推算月數
    pub horizon: u32,

    /// 本次使用的月平均里程
    pub rate: Decimal,

    /// 錨點日期（第 0 個月所在）
    pub today: NaiveDate,

    /// 欄位標題，例如 `Jun-26`
    pub month_headers: Vec<String>,

    /// 可解析的車組（依車組ID遞增）
    pub units: Vec<UnitGrid>,

    /// 無法推算的車組
    pub failures: Vec<UnitFailure>,

    /// 警告信息
    pub warnings: Vec<GridWarning>,
}

impl FleetGrid {
    /// 創建空的網格
    pub fn empty(fleet_type: String, horizon: u32, rate: Decimal, today: NaiveDate) -> Self {
        Self {
            fleet_type,
            horizon,
            rate,
            today,
            month_headers: Vec::new(),
            units: Vec::new(),
            failures: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// 添加警告
    pub fn add_warning(&mut self, warning: GridWarning) {
        self.warnings.push(warning);
    }

    /// 查詢車組
    pub fn unit(&self, unit_id: &str) -> Option<&UnitGrid> {
        self.units.iter().find(|u| u.unit_id == unit_id)
    }
}

/// 單一車組的推算列（每個重度週期一列，層級由高到低）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitGrid {
    pub unit_id: String,
    pub current_distance: Decimal,
    pub rows: Vec<CycleProjection>,
}

impl UnitGrid {
    /// 查詢週期列
    pub fn row(&self, cycle_code: &str) -> Option<&CycleProjection> {
        self.rows.iter().find(|r| r.cycle_code == cycle_code)
    }
}

/// 車組層級的失敗（不影響其他車組）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitFailure {
    pub unit_id: String,
    pub error: FleetError,
}

impl UnitFailure {
    pub fn new(unit_id: String, error: FleetError) -> Self {
        Self { unit_id, error }
    }
}

/// 推算警告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridWarning {
    pub unit_id: String,
    pub cycle_code: Option<String>,
    pub message: String,
    pub severity: WarningSeverity,
}

impl GridWarning {
    pub fn new(
        unit_id: String,
        cycle_code: Option<String>,
        message: String,
        severity: WarningSeverity,
    ) -> Self {
        Self {
            unit_id,
            cycle_code,
            message,
            severity,
        }
    }

    pub fn info(unit_id: String, cycle_code: Option<String>, message: String) -> Self {
        Self::new(unit_id, cycle_code, message, WarningSeverity::Info)
    }

    pub fn warning(unit_id: String, cycle_code: Option<String>, message: String) -> Self {
        Self::new(unit_id, cycle_code, message, WarningSeverity::Warning)
    }

    pub fn error(unit_id: String, cycle_code: Option<String>, message: String) -> Self {
        Self::new(unit_id, cycle_code, message, WarningSeverity::Error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningSeverity {
    Info,
    Warning,
    Error,
}
