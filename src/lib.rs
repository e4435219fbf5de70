//! # Fleetplan
//!
//! 車隊維修週期推算引擎：層級基準解析、逐月里程推算、模擬介入與緊急度排名

pub use fleetplan_calc as calc;
pub use fleetplan_core as core;
pub use fleetplan_sim as sim;

// Re-export 主要類型
pub use fleetplan_calc::{
    next_intervention, FleetGrid, GridCalculator, GridWarning, HierarchyResolver,
    MonthProjector, NextIntervention, ProjectionRequest, RankingEntry, UnitFailure, UnitGrid,
    UrgencyRanker, UrgencyRanking, WarningSeverity,
};
pub use fleetplan_core::{
    CalendarInterval, Cycle, CycleCatalog, CycleProjection, CycleReference, DataQuality,
    EffectiveReference, FleetError, FleetSettings, InMemoryReferenceProvider, MaintenanceEvent,
    MonthProjection, ProjectionConfig, ProjectionSource, ReferenceOrigin, Result, TaskCodeMap,
    UnitReference, UnitReferenceProvider,
};
pub use fleetplan_sim::{InterventionSimulator, SimulatedIntervention, SimulationSet};
