//! # Fleetplan Core
//!
//! 維修週期層級與里程推算的核心資料模型與類型定義

pub mod calendar;
pub mod catalog;
pub mod config;
pub mod history;
pub mod projection;
pub mod reference;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// Re-export 主要類型
pub use calendar::CalendarInterval;
pub use catalog::{Cycle, CycleCatalog};
pub use config::{FleetSettings, ProjectionConfig, ProjectionParams};
pub use history::{MaintenanceEvent, TaskCodeMap};
pub use projection::{
    CycleProjection, DataQuality, EffectiveReference, MonthProjection, ProjectionSource,
    ReferenceOrigin,
};
pub use reference::{
    CycleReference, InMemoryReferenceProvider, UnitReference, UnitReferenceProvider,
};

/// 車隊維修推算錯誤類型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum FleetError {
    #[error("未知的車隊類型: {0}")]
    UnknownFleetType(String),

    #[error("車組 {unit_id} 缺少基準參考（無任何週期紀錄且無投入運營日期）")]
    MissingBaseline { unit_id: String },

    #[error("車組 {unit_id} 週期 {cycle_code} 里程小於參考里程: 目前 {current}, 參考 {reference}")]
    NegativeAccumulation {
        unit_id: String,
        cycle_code: String,
        current: Decimal,
        reference: Decimal,
    },

    #[error("車組 {unit_id} 週期 {cycle_code} 里程計算溢出")]
    DistanceOverflow { unit_id: String, cycle_code: String },

    #[error("無效的推算月數: {0}")]
    InvalidHorizon(u32),

    #[error("無效的月平均里程: {0}")]
    InvalidRate(Decimal),

    #[error("車隊 {fleet_type} 沒有週期 {cycle_code}，無法模擬")]
    ToggleOnUnknownCycle {
        fleet_type: String,
        cycle_code: String,
    },

    #[error("找不到車組: {0}")]
    UnitNotFound(String),

    #[error("無效的日期: {0}")]
    InvalidDate(String),

    #[error("週期目錄無效: {0}")]
    InvalidCatalog(String),

    #[error("配置錯誤: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, FleetError>;
