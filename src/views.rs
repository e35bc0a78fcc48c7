//! Dashboard views. Each view is one parameterized pass over the pipeline:
//! select, aggregate, rank, and describe the result for the presenter.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tabled::Tabled;

use crate::aggregate::{aggregate, GroupSpec, SummaryTable};
use crate::error::Result;
use crate::normalize::mission_type_lookup;
use crate::rank::{rank, RankSpec};
use crate::select::{domain, with_valid_response_time, Selection};
use crate::types::{ChartKind, Field, Measure, MetricCard, NormalizedMission, Record, RegionalRecord, Value};
use crate::util::{format_int, format_number, format_pct, mean, share_pct};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum View {
    Overview,
    MissionMix,
    TimePatterns,
    MissionTypes,
    LocationTrends,
    LocationIncidents,
    RegionalCapacity,
    RegionalTimeGoals,
    DemandLandscape,
}

/// Which export a view reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Missions,
    Regional,
}

impl Dataset {
    pub fn name(self) -> &'static str {
        match self {
            Dataset::Missions => "missions",
            Dataset::Regional => "regional",
        }
    }
}

impl FromStr for Dataset {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "missions" | "mission" => Ok(Dataset::Missions),
            "regional" | "region" => Ok(Dataset::Regional),
            other => Err(format!("unknown dataset '{other}' (expected missions or regional)")),
        }
    }
}

impl View {
    pub const ALL: [View; 9] = [
        View::Overview,
        View::MissionMix,
        View::TimePatterns,
        View::MissionTypes,
        View::LocationTrends,
        View::LocationIncidents,
        View::RegionalCapacity,
        View::RegionalTimeGoals,
        View::DemandLandscape,
    ];

    pub fn name(self) -> &'static str {
        match self {
            View::Overview => "overview",
            View::MissionMix => "mission-mix",
            View::TimePatterns => "time-patterns",
            View::MissionTypes => "mission-types",
            View::LocationTrends => "location-trends",
            View::LocationIncidents => "location-incidents",
            View::RegionalCapacity => "regional-capacity",
            View::RegionalTimeGoals => "regional-time-goals",
            View::DemandLandscape => "demand-landscape",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            View::Overview => "Emergency Incident Trend Over Time",
            View::MissionMix => "Distribution of Emergency Incident Types",
            View::TimePatterns => "Yearly Incident Volume by District",
            View::MissionTypes => "Mission Complexity vs Response Load",
            View::LocationTrends => "Average Response Time by Hour, Weekday vs Weekend",
            View::LocationIncidents => "Incident Types by District and Year",
            View::RegionalCapacity => "Regional Emergency Workload",
            View::RegionalTimeGoals => "Neighborhood Emergency Load",
            View::DemandLandscape => "Emergency Demand Landscape",
        }
    }

    pub fn dataset(self) -> Dataset {
        match self {
            View::RegionalCapacity | View::RegionalTimeGoals | View::DemandLandscape => Dataset::Regional,
            _ => Dataset::Missions,
        }
    }

    pub fn needs_district(self) -> bool {
        matches!(
            self,
            View::TimePatterns | View::LocationIncidents | View::RegionalCapacity
        )
    }

    pub fn needs_year(self) -> bool {
        matches!(
            self,
            View::LocationIncidents | View::RegionalTimeGoals | View::DemandLandscape
        )
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        View::ALL
            .iter()
            .copied()
            .find(|v| v.name() == wanted)
            .ok_or_else(|| format!("unknown view '{s}'"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewParams {
    pub district: Option<String>,
    pub year: Option<i32>,
    pub top_n: usize,
}

impl Default for ViewParams {
    fn default() -> Self {
        ViewParams {
            district: None,
            year: None,
            top_n: crate::config::DEFAULT_TOP_N,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct TranslationRow {
    #[serde(rename = "Original")]
    #[tabled(rename = "Original")]
    pub original: String,
    #[serde(rename = "English")]
    #[tabled(rename = "English")]
    pub english: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewOutput {
    pub view: View,
    pub title: String,
    pub subtitle: Option<String>,
    pub chart: ChartKind,
    pub cards: Vec<MetricCard>,
    pub table: SummaryTable,
    pub translations: Vec<TranslationRow>,
    pub insight: &'static str,
}

impl ViewOutput {
    fn new(view: View, chart: ChartKind, table: SummaryTable, insight: &'static str) -> Self {
        if table.is_empty() {
            log::warn!("{view}: the current selection produced no rows");
        }
        ViewOutput {
            view,
            title: view.title().to_string(),
            subtitle: None,
            chart,
            cards: Vec::new(),
            table,
            translations: Vec::new(),
            insight,
        }
    }

    fn subtitle(mut self, s: String) -> Self {
        self.subtitle = Some(s);
        self
    }

    fn cards(mut self, cards: Vec<MetricCard>) -> Self {
        self.cards = cards;
        self
    }

    /// True when the selection left nothing to show.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Use the requested value, or fall back to the first selectable one the way
/// a select box opens on its first option. `None` means the domain is empty.
fn pick<R: Record>(rows: &[R], field: Field, wanted: Option<Value>) -> Result<Option<Value>> {
    if wanted.is_some() {
        return Ok(wanted);
    }
    let first = domain(rows, field)?.into_iter().next();
    if let Some(v) = &first {
        log::info!("No {field} selected, defaulting to {v}");
    }
    Ok(first)
}

fn select_by<R: Record + Clone>(rows: &[R], picks: &[(Field, Option<Value>)]) -> Result<Vec<R>> {
    let mut selection = Selection::new();
    for (field, value) in picks {
        match value {
            Some(v) => selection = selection.with(*field, v.clone()),
            None => return Ok(Vec::new()),
        }
    }
    selection.apply(rows)
}

fn avg_response_time(rows: &[NormalizedMission]) -> f64 {
    let times: Vec<f64> = with_valid_response_time(rows)
        .iter()
        .filter_map(|r| r.record.response_time)
        .collect();
    mean(&times)
}

pub fn overview(rows: &[NormalizedMission]) -> Result<ViewOutput> {
    let districts = domain(rows, Field::District)?;
    let years = domain(rows, Field::Year)?;
    let year_range = match (years.first(), years.last()) {
        (Some(lo), Some(hi)) => format!("{lo} – {hi}"),
        _ => "undefined".to_string(),
    };

    let table = aggregate(rows, &GroupSpec::by(&[Field::Year]).count("incident_count"))?;
    Ok(ViewOutput::new(
        View::Overview,
        ChartKind::Line,
        table,
        "The trend shows long-term growth and fluctuation in emergency demand, \
         supporting strategic planning and resource allocation.",
    )
    .cards(vec![
        MetricCard::new("Total Incidents", format_int(rows.len())),
        MetricCard::new("Districts Covered", format_int(districts.len())),
        MetricCard::new("Years Covered", year_range),
        MetricCard::new("Avg Response Time (sec)", format_number(avg_response_time(rows), 1)),
    ]))
}

pub fn mission_mix(rows: &[NormalizedMission]) -> Result<ViewOutput> {
    let counts = aggregate(rows, &GroupSpec::by(&[Field::MissionType]).count("incident_count"))?;
    let table = rank(&counts, &RankSpec::descending("incident_count"))?;
    Ok(ViewOutput::new(
        View::MissionMix,
        ChartKind::Pie,
        table,
        "Medical incidents dominate emergency operations, underlining the weight \
         of ambulance services and paramedic availability.",
    ))
}

pub fn time_patterns(rows: &[NormalizedMission], params: &ViewParams) -> Result<ViewOutput> {
    let district = pick(rows, Field::District, params.district.as_deref().map(Value::from))?;
    let picked = select_by(rows, &[(Field::District, district.clone())])?;
    let table = aggregate(&picked, &GroupSpec::by(&[Field::Year]).count("incidents"))?;
    Ok(ViewOutput::new(
        View::TimePatterns,
        ChartKind::Area,
        table,
        "Year-over-year volume for a single district shows whether local demand \
         is growing faster than the city as a whole.",
    )
    .subtitle(format!("District: {}", describe(&district))))
}

pub fn mission_types(rows: &[NormalizedMission]) -> Result<ViewOutput> {
    let valid = with_valid_response_time(rows);
    let table = aggregate(
        &valid,
        &GroupSpec::by(&[Field::MissionType])
            .mean(Measure::ResponseTime, "avg_response_time")
            .count("total_incidents"),
    )?;
    Ok(ViewOutput::new(
        View::MissionTypes,
        ChartKind::Bubble,
        table,
        "High-complexity missions show longer response durations, while the most \
         frequent mission types dominate resource consumption.",
    ))
}

pub fn location_trends(rows: &[NormalizedMission]) -> Result<ViewOutput> {
    let valid = with_valid_response_time(rows);
    let table = aggregate(
        &valid,
        &GroupSpec::by(&[Field::DayType, Field::Hour]).mean(Measure::ResponseTime, "avg_response_time"),
    )?;
    Ok(ViewOutput::new(
        View::LocationTrends,
        ChartKind::Heatmap,
        table,
        "Response times shift with the hour of day and between weekdays and \
         weekends, pointing at when additional units are most needed.",
    ))
}

pub fn location_incidents(rows: &[NormalizedMission], params: &ViewParams) -> Result<ViewOutput> {
    let district = pick(rows, Field::District, params.district.as_deref().map(Value::from))?;
    let year = pick(rows, Field::Year, params.year.map(Value::from))?;
    let picked = select_by(rows, &[(Field::District, district.clone()), (Field::Year, year.clone())])?;
    let counts = aggregate(&picked, &GroupSpec::by(&[Field::MissionType]).count("incidents"))?;
    let table = rank(&counts, &RankSpec::ascending("incidents"))?;

    let mut out = ViewOutput::new(
        View::LocationIncidents,
        ChartKind::HorizontalBar,
        table,
        "The incident mix differs between districts; comparing years shows which \
         mission types drive local changes.",
    )
    .subtitle(format!("District: {} | Year: {}", describe(&district), describe(&year)));
    out.translations = mission_type_lookup(rows)
        .into_iter()
        .map(|(original, category)| TranslationRow {
            original,
            english: category.label().to_string(),
        })
        .collect();
    Ok(out)
}

pub fn regional_capacity(rows: &[RegionalRecord], params: &ViewParams) -> Result<ViewOutput> {
    let district = pick(rows, Field::District, params.district.as_deref().map(Value::from))?;
    let picked = select_by(rows, &[(Field::District, district.clone())])?;
    let table = aggregate(
        &picked,
        &GroupSpec::by(&[Field::Year]).sum(Measure::MissionCountAll, "mission_count_all"),
    )?;
    Ok(ViewOutput::new(
        View::RegionalCapacity,
        ChartKind::Area,
        table,
        "Rising curves indicate increasing regional workload; sustained growth \
         suggests capacity saturation risk.",
    )
    .subtitle(format!("District area: {}", describe(&district))))
}

pub fn regional_time_goals(rows: &[RegionalRecord], params: &ViewParams) -> Result<ViewOutput> {
    let year = pick(rows, Field::Year, params.year.map(Value::from))?;
    let picked = select_by(rows, &[(Field::Year, year.clone())])?;
    let sums = aggregate(
        &picked,
        &GroupSpec::by(&[Field::District])
            .sum(Measure::MissionCountAll, "total_incidents")
            .sum(Measure::MissionCountEms, "ems_incidents")
            .sum(Measure::MissionCountFire, "fire_incidents"),
    )?;
    let table = rank(&sums, &RankSpec::descending("total_incidents").top(params.top_n))?;

    let total = table.total("total_incidents")?;
    let ems = table.total("ems_incidents")?;
    let fire = table.total("fire_incidents")?;
    Ok(ViewOutput::new(
        View::RegionalTimeGoals,
        ChartKind::HorizontalBar,
        table,
        "A small number of neighborhoods carry a disproportionate share of the \
         load; EMS demand outweighs fire demand nearly everywhere.",
    )
    .subtitle(format!("Year: {} | Top {} by total incidents", describe(&year), params.top_n))
    .cards(vec![
        MetricCard::new("Total Incidents (Top Areas)", format_number(total, 0)),
        MetricCard::new("EMS Share", format_pct(share_pct(ems, total))),
        MetricCard::new("Fire Share", format_pct(share_pct(fire, total))),
    ]))
}

pub fn demand_landscape(rows: &[RegionalRecord], params: &ViewParams) -> Result<ViewOutput> {
    let year = pick(rows, Field::Year, params.year.map(Value::from))?;
    let picked = select_by(rows, &[(Field::Year, year.clone())])?;
    let sums = aggregate(
        &picked,
        &GroupSpec::by(&[Field::District]).sum(Measure::MissionCountAll, "total_incidents"),
    )?;
    let table = rank(&sums, &RankSpec::descending("total_incidents"))?;
    Ok(ViewOutput::new(
        View::DemandLandscape,
        ChartKind::Treemap,
        table,
        "Area size shows where operational load is concentrated without the \
         complexity of map geometry.",
    )
    .subtitle(format!("Year: {}", describe(&year))))
}

fn describe(value: &Option<Value>) -> String {
    value
        .as_ref()
        .map(Value::to_string)
        .unwrap_or_else(|| "none available".to_string())
}
