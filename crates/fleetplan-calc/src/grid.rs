//! 車隊推算網格主計算器

use chrono::NaiveDate;
use fleetplan_core::calendar::month_headers;
use fleetplan_core::{
    Cycle, CycleCatalog, CycleProjection, DataQuality, FleetError, ProjectionConfig,
    ProjectionParams, ReferenceOrigin, Result, UnitReference, UnitReferenceProvider,
};
use fleetplan_sim::{InterventionSimulator, SimulationSet};
use rust_decimal::Decimal;

use crate::hierarchy::HierarchyResolver;
use crate::projector::MonthProjector;
use crate::ranking::UrgencyRanker;
use crate::{FleetGrid, GridWarning, UnitFailure, UnitGrid};

/// 單次推算請求
#[derive(Debug, Clone)]
pub struct ProjectionRequest {
    /// 車隊類型
    pub fleet_type: String,

    /// 推算月數（None 使用配置預設值）
    pub horizon: Option<u32>,

    /// 月平均里程（None 使用車隊配置）
    pub rate: Option<Decimal>,

    /// 錨點日期（由呼叫方注入）
    pub today: NaiveDate,

    /// 呼叫方持有的模擬介入集合
    pub simulations: SimulationSet,
}

impl ProjectionRequest {
    /// 創建新的推算請求
    pub fn new(fleet_type: String, today: NaiveDate) -> Self {
        Self {
            fleet_type,
            horizon: None,
            rate: None,
            today,
            simulations: SimulationSet::new(),
        }
    }

    /// 建構器模式：設置推算月數
    pub fn with_horizon(mut self, horizon: u32) -> Self {
        self.horizon = Some(horizon);
        self
    }

    /// 建構器模式：設置月平均里程
    pub fn with_rate(mut self, rate: Decimal) -> Self {
        self.rate = Some(rate);
        self
    }

    /// 建構器模式：設置模擬介入集合
    pub fn with_simulations(mut self, simulations: SimulationSet) -> Self {
        self.simulations = simulations;
        self
    }
}

/// 車隊網格計算器
///
/// 週期目錄與配置在建立後不再變動，可在多個請求間共用。
pub struct GridCalculator {
    /// 週期目錄
    catalog: CycleCatalog,

    /// 推算配置
    config: ProjectionConfig,
}

impl GridCalculator {
    /// 創建新的網格計算器
    pub fn new(catalog: CycleCatalog, config: ProjectionConfig) -> Self {
        Self { catalog, config }
    }

    /// 標準目錄與配置
    pub fn standard() -> Self {
        Self::new(CycleCatalog::standard(), ProjectionConfig::standard())
    }

    pub fn catalog(&self) -> &CycleCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// 車隊的介入模擬器（切換標記用）
    pub fn simulator(&self, fleet_type: &str) -> Result<InterventionSimulator<'_>> {
        InterventionSimulator::new(&self.catalog, fleet_type)
    }

    /// 車隊的緊急度排名器
    pub fn ranker(&self) -> UrgencyRanker<'_> {
        UrgencyRanker::new(&self.catalog, &self.config)
    }

    /// 從參考狀態來源讀取車組後推算
    ///
    /// 請求參數先驗證，不合法時不讀取來源。
    pub fn project_from_provider(
        &self,
        request: &ProjectionRequest,
        provider: &dyn UnitReferenceProvider,
    ) -> Result<FleetGrid> {
        self.validate(request)?;
        let units = provider.units_for(&request.fleet_type)?;
        self.project_fleet(request, &units)
    }

    /// 主推算入口
    ///
    /// 請求層級的錯誤（未知車隊、月數或里程不合法）直接回傳；
    /// 單一車組的問題記錄在 `failures` / `warnings`，不影響其他車組。
    pub fn project_fleet(
        &self,
        request: &ProjectionRequest,
        units: &[UnitReference],
    ) -> Result<FleetGrid> {
        tracing::info!(
            "開始推算車隊 {}：車組 {} 個，模擬標記 {} 個",
            request.fleet_type,
            units.len(),
            request.simulations.len()
        );

        let start_time = std::time::Instant::now();

        let params = self.validate(request)?;
        let cycles = self.catalog.cycles_for(&params.fleet_type)?;
        let simulator = self.simulator(&params.fleet_type)?;

        let mut grid = FleetGrid::empty(
            params.fleet_type.clone(),
            params.horizon,
            params.average_monthly_distance,
            request.today,
        );
        grid.month_headers = month_headers(request.today, params.horizon)?;

        let mut ordered: Vec<&UnitReference> = units.iter().collect();
        ordered.sort_by(|a, b| a.unit_id.cmp(&b.unit_id));

        for unit in ordered {
            if unit.fleet_type != params.fleet_type {
                tracing::warn!(
                    "車組 {} 屬於車隊 {}，不在本次推算範圍",
                    unit.unit_id,
                    unit.fleet_type
                );
                grid.failures.push(UnitFailure::new(
                    unit.unit_id.clone(),
                    FleetError::UnknownFleetType(unit.fleet_type.clone()),
                ));
                continue;
            }

            match self.project_rows(unit, cycles, &params, request.today) {
                Ok(rows) => {
                    for row in &rows {
                        for warning in Self::row_warnings(unit, row) {
                            grid.add_warning(warning);
                        }
                    }

                    let rows = simulator.apply(
                        &unit.unit_id,
                        &rows,
                        &request.simulations,
                        params.average_monthly_distance,
                    );

                    grid.units.push(UnitGrid {
                        unit_id: unit.unit_id.clone(),
                        current_distance: unit.current_distance,
                        rows,
                    });
                }
                Err(error) => {
                    tracing::warn!("車組 {} 無法推算: {}", unit.unit_id, error);
                    grid.failures.push(UnitFailure::new(unit.unit_id.clone(), error));
                }
            }
        }

        for unit_id in request.simulations.units() {
            if grid.unit(unit_id).is_none() {
                grid.add_warning(GridWarning::info(
                    unit_id.to_string(),
                    None,
                    "模擬標記的車組不在本次推算結果中".to_string(),
                ));
            }
        }

        tracing::info!(
            "車隊 {} 推算完成，耗時 {:?}：成功 {}，失敗 {}，警告 {}",
            grid.fleet_type,
            start_time.elapsed(),
            grid.units.len(),
            grid.failures.len(),
            grid.warnings.len()
        );

        Ok(grid)
    }

    /// 單一車組的推算（明細檢視）
    pub fn project_unit(
        &self,
        request: &ProjectionRequest,
        unit: &UnitReference,
    ) -> Result<UnitGrid> {
        let params = self.validate(request)?;
        let cycles = self.catalog.cycles_for(&params.fleet_type)?;
        let simulator = self.simulator(&params.fleet_type)?;

        let rows = self.project_rows(unit, cycles, &params, request.today)?;
        let rows = simulator.apply(
            &unit.unit_id,
            &rows,
            &request.simulations,
            params.average_monthly_distance,
        );

        Ok(UnitGrid {
            unit_id: unit.unit_id.clone(),
            current_distance: unit.current_distance,
            rows,
        })
    }

    /// 單列推算的資料品質警告
    fn row_warnings(unit: &UnitReference, row: &CycleProjection) -> Vec<GridWarning> {
        let mut warnings = Vec::new();

        if let Some(DataQuality::NegativeAccumulation { .. }) = &row.data_quality {
            let error = FleetError::NegativeAccumulation {
                unit_id: unit.unit_id.clone(),
                cycle_code: row.cycle_code.clone(),
                current: unit.current_distance,
                reference: row.effective_reference.distance,
            };
            warnings.push(GridWarning::warning(
                unit.unit_id.clone(),
                Some(row.cycle_code.clone()),
                format!("{error}，已歸零"),
            ));
        }

        if row.effective_reference.origin == ReferenceOrigin::Untracked {
            warnings.push(GridWarning::info(
                unit.unit_id.clone(),
                Some(row.cycle_code.clone()),
                format!(
                    "無投入運營日期，基準取最早紀錄 {}",
                    row.effective_reference.event_date
                ),
            ));
        }

        warnings
    }

    fn validate(&self, request: &ProjectionRequest) -> Result<ProjectionParams> {
        // 車隊須同時存在於目錄與配置
        self.catalog.cycles_for(&request.fleet_type)?;
        self.config
            .resolve(&request.fleet_type, request.horizon, request.rate)
    }

    /// 解析層級基準後逐一推算重保養週期（未套用模擬）
    fn project_rows(
        &self,
        unit: &UnitReference,
        cycles: &[Cycle],
        params: &ProjectionParams,
        today: NaiveDate,
    ) -> Result<Vec<CycleProjection>> {
        tracing::debug!("推算車組 {}", unit.unit_id);

        // 層級解析需要全部週期，輸出只保留重保養週期
        let mut resolved = HierarchyResolver::resolve(unit, cycles)?;

        let mut rows = Vec::new();
        for cycle in cycles.iter().filter(|c| c.is_heavy) {
            let position = resolved
                .iter()
                .position(|r| r.cycle_code == cycle.code)
                .ok_or_else(|| {
                    FleetError::InvalidCatalog(format!("週期 {} 沒有解析出基準", cycle.code))
                })?;
            let effective = resolved.swap_remove(position);
            rows.push(MonthProjector::project(
                &unit.unit_id,
                unit.current_distance,
                cycle,
                effective,
                params.average_monthly_distance,
                params.horizon,
                today,
            )?);
        }

        Ok(rows)
    }
}
