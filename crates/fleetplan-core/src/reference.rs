//! 車組參考狀態

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{FleetError, Result};

/// 單一週期的最後一次介入紀錄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReference {
    /// 介入日期
    pub event_date: NaiveDate,

    /// 介入當時的累計里程
    pub distance: Decimal,
}

impl CycleReference {
    pub fn new(event_date: NaiveDate, distance: Decimal) -> Self {
        Self {
            event_date,
            distance,
        }
    }
}

/// 車組的最新已知狀態（唯讀快照）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitReference {
    /// 車組ID（同一車隊內唯一）
    pub unit_id: String,

    /// 車隊類型
    pub fleet_type: String,

    /// 目前累計里程
    pub current_distance: Decimal,

    /// 投入運營日期（無任何紀錄時的隱含基準，里程為零）
    pub commissioning_date: Option<NaiveDate>,

    /// 週期代碼 → 最後一次介入紀錄
    pub per_cycle_reference: HashMap<String, CycleReference>,
}

impl UnitReference {
    /// 創建新的車組狀態
    pub fn new(unit_id: String, fleet_type: String, current_distance: Decimal) -> Self {
        Self {
            unit_id,
            fleet_type,
            current_distance,
            commissioning_date: None,
            per_cycle_reference: HashMap::new(),
        }
    }

    /// 建構器模式：設置投入運營日期
    pub fn with_commissioning_date(mut self, date: NaiveDate) -> Self {
        self.commissioning_date = Some(date);
        self
    }

    /// 建構器模式：設置週期紀錄
    pub fn with_reference(mut self, cycle_code: String, reference: CycleReference) -> Self {
        self.per_cycle_reference.insert(cycle_code, reference);
        self
    }

    /// 查詢週期紀錄
    pub fn reference_for(&self, cycle_code: &str) -> Option<&CycleReference> {
        self.per_cycle_reference.get(cycle_code)
    }

    /// 投入運營的隱含基準（日期, 0）
    pub fn commissioning_reference(&self) -> Option<CycleReference> {
        self.commissioning_date.map(|date| CycleReference::new(date, Decimal::ZERO))
    }
}

/// 車組參考狀態來源（資料存取層）
///
/// 推算引擎只讀取，不修改。錯誤屬於呼叫方錯誤，直接回傳。
pub trait UnitReferenceProvider {
    /// 取得車隊所有車組的最新狀態
    fn units_for(&self, fleet_type: &str) -> Result<Vec<UnitReference>>;

    /// 取得單一車組的最新狀態
    fn unit(&self, fleet_type: &str, unit_id: &str) -> Result<UnitReference>;
}

/// 記憶體內的參考狀態來源
#[derive(Debug, Clone, Default)]
pub struct InMemoryReferenceProvider {
    units: BTreeMap<String, BTreeMap<String, UnitReference>>,
}

impl InMemoryReferenceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// 加入或取代車組狀態
    pub fn insert(&mut self, unit: UnitReference) {
        self.units
            .entry(unit.fleet_type.clone())
            .or_default()
            .insert(unit.unit_id.clone(), unit);
    }

    /// 建構器模式：加入車組狀態
    pub fn with_unit(mut self, unit: UnitReference) -> Self {
        self.insert(unit);
        self
    }
}

impl UnitReferenceProvider for InMemoryReferenceProvider {
    fn units_for(&self, fleet_type: &str) -> Result<Vec<UnitReference>> {
        Ok(self
            .units
            .get(fleet_type)
            .map(|units| units.values().cloned().collect())
            .unwrap_or_default())
    }

    fn unit(&self, fleet_type: &str, unit_id: &str) -> Result<UnitReference> {
        self.units
            .get(fleet_type)
            .and_then(|units| units.get(unit_id))
            .cloned()
            .ok_or_else(|| FleetError::UnitNotFound(unit_id.to_string()))
    }
}
