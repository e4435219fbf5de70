//! 維修歷史紀錄
//!
//! 舊系統以任務代碼記錄每次介入（例如 AN1..AN6 都屬於年檢）。
//! 這裡把事件紀錄歸納成每個週期最後一次的介入紀錄。

use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::Cycle;
use crate::reference::CycleReference;

/// 維修事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceEvent {
    /// 原始任務代碼
    pub task_code: String,

    /// 完成日期
    pub event_date: NaiveDate,

    /// 事件當時的累計里程
    pub distance_at_event: Decimal,
}

impl MaintenanceEvent {
    pub fn new(task_code: String, event_date: NaiveDate, distance_at_event: Decimal) -> Self {
        Self {
            task_code,
            event_date,
            distance_at_event,
        }
    }
}

/// 任務代碼 → 週期代碼
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCodeMap {
    mapping: HashMap<String, String>,
}

impl TaskCodeMap {
    /// 創建空對照表
    pub fn new() -> Self {
        Self {
            mapping: HashMap::new(),
        }
    }

    /// 標準對照表（CSR 與 Toshiba 的任務代碼）
    pub fn standard() -> Self {
        let pairs = [
            ("AN", "AN"),
            ("AN1", "AN"),
            ("AN2", "AN"),
            ("AN3", "AN"),
            ("AN4", "AN"),
            ("AN5", "AN"),
            ("AN6", "AN"),
            ("BA", "BA"),
            ("BA1", "BA"),
            ("BA2", "BA"),
            ("BA3", "BA"),
            ("PE", "PE"),
            ("RS", "PE"),
            ("DA", "DA"),
            ("RE", "DA"),
            ("IQ", "IQ"),
            ("IQ1", "IQ"),
            ("IQ2", "IQ"),
            ("IQ3", "IQ"),
            ("IB", "IB"),
            ("MEN", "MEN"),
            ("RB", "RB"),
            ("RG", "RG"),
        ];

        pairs
            .into_iter()
            .fold(Self::new(), |map, (task, cycle)| {
                map.with_task(task.to_string(), cycle.to_string())
            })
    }

    /// 建構器模式：加入對照
    pub fn with_task(mut self, task_code: String, cycle_code: String) -> Self {
        self.mapping.insert(task_code, cycle_code);
        self
    }

    /// 查詢任務代碼所屬週期
    pub fn cycle_for(&self, task_code: &str) -> Option<&str> {
        self.mapping.get(task_code).map(String::as_str)
    }
}

impl Default for TaskCodeMap {
    fn default() -> Self {
        Self::standard()
    }
}

/// 歸納每個週期最後一次的介入紀錄
///
/// 無法對應的任務代碼、或不屬於該車隊目錄的週期會被忽略。
/// 同一天有多筆事件時保留先出現的那筆。
pub fn latest_references(
    cycles: &[Cycle],
    events: &[MaintenanceEvent],
    task_map: &TaskCodeMap,
) -> HashMap<String, CycleReference> {
    let mut latest: HashMap<String, CycleReference> = HashMap::new();

    for event in events {
        let Some(cycle_code) = task_map.cycle_for(&event.task_code) else {
            continue;
        };
        if !cycles.iter().any(|c| c.code == cycle_code) {
            continue;
        }

        let candidate = CycleReference::new(event.event_date, event.distance_at_event);
        match latest.get(cycle_code) {
            Some(existing) if existing.event_date >= candidate.event_date => {}
            _ => {
                latest.insert(cycle_code.to_string(), candidate);
            }
        }
    }

    latest
}

/// 最近一年（365 天內）的事件，最新的在前
pub fn events_in_last_year(
    events: &[MaintenanceEvent],
    today: NaiveDate,
) -> Vec<MaintenanceEvent> {
    let cutoff = today.checked_sub_days(Days::new(365)).unwrap_or(NaiveDate::MIN);

    let mut recent: Vec<MaintenanceEvent> = events
        .iter()
        .filter(|e| e.event_date >= cutoff)
        .cloned()
        .collect();
    recent.sort_by(|a, b| b.event_date.cmp(&a.event_date));
    recent
}
