//! 車隊推算網格示例

use chrono::NaiveDate;
use fleetplan::core::history::latest_references;
use fleetplan::{
    next_intervention, GridCalculator, InMemoryReferenceProvider, MaintenanceEvent,
    ProjectionRequest, SimulationSet, TaskCodeMap, UnitReference,
};
use rust_decimal::Decimal;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("=== 車隊推算網格示例 ===\n");

    let calculator = GridCalculator::standard();
    let today = NaiveDate::from_ymd_opt(2026, 6, 16).ok_or("無效的日期")?;

    // 從維修紀錄歸納各週期最後一次介入
    let events = vec![
        MaintenanceEvent::new(
            "RE".to_string(),
            NaiveDate::from_ymd_opt(2021, 3, 1).ok_or("無效的日期")?,
            Decimal::from(1_200_000),
        ),
        MaintenanceEvent::new(
            "AN3".to_string(),
            NaiveDate::from_ymd_opt(2025, 9, 14).ok_or("無效的日期")?,
            Decimal::from(1_430_000),
        ),
    ];
    let cycles = calculator.catalog().cycles_for("CSR")?;
    let mut m01 =
        UnitReference::new("M01".to_string(), "CSR".to_string(), Decimal::from(1_490_000));
    m01.per_cycle_reference = latest_references(cycles, &events, &TaskCodeMap::standard());

    let m02 = UnitReference::new("M02".to_string(), "CSR".to_string(), Decimal::from(640_000))
        .with_commissioning_date(NaiveDate::from_ymd_opt(2021, 7, 1).ok_or("無效的日期")?);

    let provider = InMemoryReferenceProvider::new()
        .with_unit(m01.clone())
        .with_unit(m02.clone());

    // 模擬：M01 在第 3 個月執行 PE
    let simulations = calculator
        .simulator("CSR")?
        .toggle(&SimulationSet::new(), "M01", "PE", 3)?;

    let request = ProjectionRequest::new("CSR".to_string(), today)
        .with_horizon(6)
        .with_simulations(simulations);
    let grid = calculator.project_from_provider(&request, &provider)?;

    println!("月份: {}", grid.month_headers.join(" | "));
    for unit in &grid.units {
        println!("\n車組 {}（目前 {} km）", unit.unit_id, unit.current_distance);
        for row in &unit.rows {
            let cells: Vec<String> = row
                .months
                .iter()
                .map(|m| {
                    let flag = if m.is_due { "*" } else { "" };
                    format!("{}{}", m.accumulated_since_reference.round(), flag)
                })
                .collect();
            println!(
                "  {:<3} 門檻 {:>9} 基準 {} → {}",
                row.cycle_code,
                row.distance_threshold,
                row.effective_reference.event_date,
                cells.join(" ")
            );
        }
    }

    let ranking = calculator.ranker().rank("CSR", &[m01.clone(), m02], None)?;
    println!("\n緊急度排名（錨點 {}）:", ranking.anchor_cycle_code);
    for entry in &ranking.entries {
        println!(
            "  {}. {} 自 {} 起 {} km",
            entry.rank_position, entry.unit_id, entry.reference_date, entry.distance_since_reference
        );
    }

    let daily = calculator.config().fleet("CSR")?.average_daily_distance;
    if let Some(next) = next_intervention(&m01, cycles, daily, today)? {
        println!(
            "\nM01 下次介入: {} 剩餘 {} km，預估 {}",
            next.cycle_code, next.remaining_distance, next.estimated_date
        );
    }

    Ok(())
}
