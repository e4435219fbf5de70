//! 模擬介入標記集合

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// 模擬介入標記：「假如這個週期在這個推算月份執行」
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SimulatedIntervention {
    /// 車組ID
    pub unit_id: String,

    /// 週期代碼
    pub cycle_code: String,

    /// 推算月份索引
    pub month_index: u32,
}

impl SimulatedIntervention {
    pub fn new(unit_id: String, cycle_code: String, month_index: u32) -> Self {
        Self {
            unit_id,
            cycle_code,
            month_index,
        }
    }
}

/// 模擬介入集合（依車組分組）
///
/// 由呼叫方持有（例如網頁 session），每次呼叫明確傳入與傳回，
/// 引擎本身不保存。同一 `(車組, 週期)` 最多一個標記。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationSet {
    units: BTreeMap<String, BTreeSet<SimulatedIntervention>>,
}

impl SimulationSet {
    /// 創建空集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 車組的所有標記
    pub fn markers_for(&self, unit_id: &str) -> Vec<&SimulatedIntervention> {
        self.units
            .get(unit_id)
            .map(|markers| markers.iter().collect())
            .unwrap_or_default()
    }

    /// 車組某週期目前的標記月份
    pub fn marker_month(&self, unit_id: &str, cycle_code: &str) -> Option<u32> {
        self.units.get(unit_id).and_then(|markers| {
            markers
                .iter()
                .find(|m| m.cycle_code == cycle_code)
                .map(|m| m.month_index)
        })
    }

    /// 是否包含完全相同的標記
    pub fn contains(&self, marker: &SimulatedIntervention) -> bool {
        self.units
            .get(&marker.unit_id)
            .is_some_and(|markers| markers.contains(marker))
    }

    /// 有標記的車組
    pub fn units(&self) -> impl Iterator<Item = &str> {
        self.units.keys().map(String::as_str)
    }

    /// 標記總數
    pub fn len(&self) -> usize {
        self.units.values().map(BTreeSet::len).sum()
    }

    /// 是否沒有任何標記
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 放入標記，取代同一 `(車組, 週期)` 的舊標記
    pub(crate) fn replace(&mut self, marker: SimulatedIntervention) {
        let markers = self.units.entry(marker.unit_id.clone()).or_default();
        markers.retain(|m| m.cycle_code != marker.cycle_code);
        markers.insert(marker);
    }

    /// 移除標記；車組沒有任何標記時一併移除
    pub(crate) fn remove(&mut self, marker: &SimulatedIntervention) {
        if let Some(markers) = self.units.get_mut(&marker.unit_id) {
            markers.remove(marker);
            if markers.is_empty() {
                self.units.remove(&marker.unit_id);
            }
        }
    }
}
