//! 維修週期目錄
//!
//! 每個車隊類型有一組依層級排序的週期。層級越高代表介入越重，
//! 執行時會重置所有較低層級週期的基準。

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calendar::CalendarInterval;
use crate::{FleetError, Result};

/// CSR 車隊類型標籤
pub const CSR: &str = "CSR";

/// Toshiba 車隊類型標籤
pub const TOSHIBA: &str = "Toshiba";

/// 維修週期
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cycle {
    /// 週期代碼（同一車隊內唯一）
    pub code: String,

    /// 顯示名稱
    pub label: String,

    /// 里程門檻
    pub distance_threshold: Decimal,

    /// 時間門檻（部分車隊未定義）
    pub time_threshold: Option<CalendarInterval>,

    /// 層級（越高越重要，同一車隊內唯一）
    pub rank: u32,

    /// 是否為重保養週期（出現在推算網格中）
    pub is_heavy: bool,
}

impl Cycle {
    /// 創建新的週期（預設為輕保養、無時間門檻）
    pub fn new(code: String, distance_threshold: Decimal, rank: u32) -> Self {
        Self {
            label: code.clone(),
            code,
            distance_threshold,
            time_threshold: None,
            rank,
            is_heavy: false,
        }
    }

    /// 建構器模式：設置顯示名稱
    pub fn with_label(mut self, label: String) -> Self {
        self.label = label;
        self
    }

    /// 建構器模式：設置時間門檻
    pub fn with_time_threshold(mut self, interval: CalendarInterval) -> Self {
        self.time_threshold = Some(interval);
        self
    }

    /// 建構器模式：標記為重保養週期
    pub fn heavy(mut self) -> Self {
        self.is_heavy = true;
        self
    }

    /// 累計里程是否已達門檻
    pub fn is_distance_due(&self, accumulated: Decimal) -> bool {
        accumulated >= self.distance_threshold
    }

    /// 依時間門檻推算的到期日（無時間門檻時為 None）
    pub fn calendar_due_date(&self, reference_date: NaiveDate) -> Option<NaiveDate> {
        self.time_threshold.and_then(|interval| interval.add_to(reference_date))
    }

    /// 在指定日期是否已達時間門檻（無時間門檻時為 None）
    pub fn is_calendar_due(&self, reference_date: NaiveDate, on: NaiveDate) -> Option<bool> {
        self.calendar_due_date(reference_date).map(|due| on >= due)
    }
}

/// 週期目錄：車隊類型 → 週期（最高層級在前）
///
/// 建立後不可變，可在多個請求之間共享唯讀。
/// 反序列化同樣經過驗證與排序。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "CatalogDocument")]
pub struct CycleCatalog {
    fleets: BTreeMap<String, Vec<Cycle>>,
}

/// 目錄的序列化格式（未驗證）
#[derive(Deserialize)]
struct CatalogDocument {
    fleets: BTreeMap<String, Vec<Cycle>>,
}

impl TryFrom<CatalogDocument> for CycleCatalog {
    type Error = FleetError;

    fn try_from(document: CatalogDocument) -> Result<Self> {
        document
            .fleets
            .into_iter()
            .try_fold(Self::new(), |catalog, (fleet_type, cycles)| {
                catalog.with_fleet(fleet_type, cycles)
            })
    }
}

impl CycleCatalog {
    /// 創建空目錄
    pub fn new() -> Self {
        Self::default()
    }

    /// 從 JSON 文件載入目錄
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| FleetError::InvalidCatalog(e.to_string()))
    }

    /// 建構器模式：加入一個車隊的週期定義（驗證後依層級降序儲存）
    pub fn with_fleet(mut self, fleet_type: String, mut cycles: Vec<Cycle>) -> Result<Self> {
        Self::validate(&fleet_type, &cycles)?;
        cycles.sort_by(|a, b| b.rank.cmp(&a.rank));
        self.fleets.insert(fleet_type, cycles);
        Ok(self)
    }

    /// 標準目錄：CSR 與 Toshiba 兩個車隊
    pub fn standard() -> Self {
        let mut fleets = BTreeMap::new();

        let mut csr = csr_cycles();
        csr.sort_by(|a, b| b.rank.cmp(&a.rank));
        fleets.insert(CSR.to_string(), csr);

        let mut toshiba = toshiba_cycles();
        toshiba.sort_by(|a, b| b.rank.cmp(&a.rank));
        fleets.insert(TOSHIBA.to_string(), toshiba);

        Self { fleets }
    }

    /// 驗證週期定義：非空、代碼與層級唯一、重保養週期門檻大於零
    pub fn validate(fleet_type: &str, cycles: &[Cycle]) -> Result<()> {
        if cycles.is_empty() {
            return Err(FleetError::InvalidCatalog(format!(
                "車隊 {fleet_type} 沒有任何週期"
            )));
        }

        let mut codes = HashSet::new();
        let mut ranks = HashSet::new();
        for cycle in cycles {
            if !codes.insert(cycle.code.as_str()) {
                return Err(FleetError::InvalidCatalog(format!(
                    "車隊 {fleet_type} 週期代碼重複: {}",
                    cycle.code
                )));
            }
            if !ranks.insert(cycle.rank) {
                return Err(FleetError::InvalidCatalog(format!(
                    "車隊 {fleet_type} 層級重複: {}",
                    cycle.rank
                )));
            }
            if cycle.is_heavy && cycle.distance_threshold <= Decimal::ZERO {
                return Err(FleetError::InvalidCatalog(format!(
                    "車隊 {fleet_type} 重保養週期 {} 的里程門檻必須大於零",
                    cycle.code
                )));
            }
        }

        Ok(())
    }

    /// 查詢車隊的週期（最高層級在前）
    pub fn cycles_for(&self, fleet_type: &str) -> Result<&[Cycle]> {
        self.fleets
            .get(fleet_type)
            .map(Vec::as_slice)
            .ok_or_else(|| FleetError::UnknownFleetType(fleet_type.to_string()))
    }

    /// 查詢車隊的重保養週期（最高層級在前）
    pub fn heavy_cycles_for(&self, fleet_type: &str) -> Result<Vec<&Cycle>> {
        Ok(self
            .cycles_for(fleet_type)?
            .iter()
            .filter(|c| c.is_heavy)
            .collect())
    }

    /// 排名錨點：層級最高的重保養週期
    pub fn anchor_cycle_for(&self, fleet_type: &str) -> Result<&Cycle> {
        self.cycles_for(fleet_type)?
            .iter()
            .find(|c| c.is_heavy)
            .ok_or_else(|| {
                FleetError::InvalidCatalog(format!("車隊 {fleet_type} 沒有重保養週期"))
            })
    }

    /// 以代碼查詢單一週期
    pub fn cycle(&self, fleet_type: &str, code: &str) -> Result<Option<&Cycle>> {
        Ok(self.cycles_for(fleet_type)?.iter().find(|c| c.code == code))
    }

    /// 所有已登錄的車隊類型
    pub fn fleet_types(&self) -> impl Iterator<Item = &str> {
        self.fleets.keys().map(String::as_str)
    }
}

fn csr_cycles() -> Vec<Cycle> {
    vec![
        Cycle::new("IQ".to_string(), Decimal::from(6_250), 1)
            .with_label("Quincenal (IQ)".to_string())
            .with_time_threshold(CalendarInterval::Days(15)),
        Cycle::new("IB".to_string(), Decimal::from(25_000), 2)
            .with_label("Bimestral (IB)".to_string())
            .with_time_threshold(CalendarInterval::Months(2)),
        Cycle::new("AN".to_string(), Decimal::from(187_500), 3)
            .with_label("Anual (AN)".to_string())
            .with_time_threshold(CalendarInterval::Months(12))
            .heavy(),
        Cycle::new("BA".to_string(), Decimal::from(375_000), 4)
            .with_label("Bianual (BA)".to_string())
            .with_time_threshold(CalendarInterval::Months(24))
            .heavy(),
        Cycle::new("PE".to_string(), Decimal::from(750_000), 5)
            .with_label("Pentanual (PE)".to_string())
            .with_time_threshold(CalendarInterval::Months(60))
            .heavy(),
        Cycle::new("DA".to_string(), Decimal::from(1_500_000), 6)
            .with_label("Decanual (DA)".to_string())
            .with_time_threshold(CalendarInterval::Months(120))
            .heavy(),
    ]
}

fn toshiba_cycles() -> Vec<Cycle> {
    vec![
        Cycle::new("MEN".to_string(), Decimal::from(30_000), 1)
            .with_label("Mensual (MEN)".to_string()),
        Cycle::new("RB".to_string(), Decimal::from(300_000), 2)
            .with_label("Bienal (RB)".to_string())
            .heavy(),
        Cycle::new("RG".to_string(), Decimal::from(600_000), 3)
            .with_label("Reparación General (RG)".to_string())
            .heavy(),
    ]
}
