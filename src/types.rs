use chrono::{NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tabled::Tabled;

/// One row of the mission export, exactly as it appears in the file.
#[derive(Debug, Deserialize)]
pub struct RawMissionRow {
    #[serde(rename = "mission_created_date")]
    pub mission_created_date: Option<String>,
    #[serde(rename = "mission_type")]
    pub mission_type: Option<String>,
    #[serde(rename = "mission_location_district")]
    pub mission_location_district: Option<String>,
    #[serde(rename = "response_time")]
    pub response_time: Option<String>,
}

/// One row of the regional export, exactly as it appears in the file.
#[derive(Debug, Deserialize)]
pub struct RawRegionalRow {
    #[serde(rename = "district_area_name")]
    pub district_area_name: Option<String>,
    #[serde(rename = "source_year")]
    pub source_year: Option<String>,
    #[serde(rename = "mission_count_all")]
    pub mission_count_all: Option<String>,
    #[serde(rename = "mission_count_ems")]
    pub mission_count_ems: Option<String>,
    #[serde(rename = "mission_count_fire")]
    pub mission_count_fire: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MissionRecord {
    pub timestamp: Option<NaiveDateTime>,
    pub mission_type_raw: Option<String>,
    pub district: Option<String>,
    /// Seconds. Zero and negative values are kept here and filtered before
    /// any mean is taken.
    pub response_time: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionalRecord {
    pub district: Option<String>,
    pub year: Option<i32>,
    pub mission_count_all: Option<u64>,
    pub mission_count_ems: Option<u64>,
    pub mission_count_fire: Option<u64>,
}

/// Display category of a mission. Every raw label outside the known
/// vocabulary, and a missing label, is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MissionType {
    EmergencyMedicalService,
    EmergencyRescue,
    FireIncident,
    TechnicalRescue,
    PatientTransport,
    Other,
}

impl MissionType {
    pub fn label(self) -> &'static str {
        match self {
            MissionType::EmergencyMedicalService => "Emergency Medical Service",
            MissionType::EmergencyRescue => "Emergency Rescue",
            MissionType::FireIncident => "Fire Incident",
            MissionType::TechnicalRescue => "Technical Rescue",
            MissionType::PatientTransport => "Patient Transport",
            MissionType::Other => "Other",
        }
    }
}

impl fmt::Display for MissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DayType {
    Weekday,
    Weekend,
}

impl DayType {
    pub fn label(self) -> &'static str {
        match self {
            DayType::Weekday => "Weekday",
            DayType::Weekend => "Weekend",
        }
    }
}

/// A mission record with its calendar fields and display category derived.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedMission {
    pub record: MissionRecord,
    pub mission_type: MissionType,
    pub year: Option<i32>,
    pub hour: Option<u32>,
    pub weekday: Option<Weekday>,
    pub is_weekend: Option<bool>,
    pub day_type: Option<DayType>,
}

/// Categorical columns that can be filtered on or grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    District,
    Year,
    Hour,
    Weekday,
    DayType,
    MissionType,
    MissionTypeRaw,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::District => "district",
            Field::Year => "year",
            Field::Hour => "hour",
            Field::Weekday => "weekday",
            Field::DayType => "day_type",
            Field::MissionType => "mission_type",
            Field::MissionTypeRaw => "mission_type_raw",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "district" => Ok(Field::District),
            "year" => Ok(Field::Year),
            "hour" => Ok(Field::Hour),
            "weekday" => Ok(Field::Weekday),
            "day_type" => Ok(Field::DayType),
            "mission_type" => Ok(Field::MissionType),
            "mission_type_raw" => Ok(Field::MissionTypeRaw),
            other => Err(format!("unknown field '{other}'")),
        }
    }
}

/// Numeric columns that reductions operate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Measure {
    ResponseTime,
    MissionCountAll,
    MissionCountEms,
    MissionCountFire,
}

impl Measure {
    pub fn name(self) -> &'static str {
        match self {
            Measure::ResponseTime => "response_time",
            Measure::MissionCountAll => "mission_count_all",
            Measure::MissionCountEms => "mission_count_ems",
            Measure::MissionCountFire => "mission_count_fire",
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A grouping key value. Integers order numerically, text lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Text(String),
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Text(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

/// Row-level access used by the selector and the aggregator, so both work
/// over mission and regional data alike.
pub trait Record {
    /// Categorical columns this record type carries.
    const FIELDS: &'static [Field];
    /// Numeric columns this record type carries.
    const MEASURES: &'static [Measure];

    fn key(&self, field: Field) -> Option<Value>;
    fn measure(&self, measure: Measure) -> Option<f64>;
}

impl Record for NormalizedMission {
    const FIELDS: &'static [Field] = &[
        Field::District,
        Field::Year,
        Field::Hour,
        Field::Weekday,
        Field::DayType,
        Field::MissionType,
        Field::MissionTypeRaw,
    ];
    const MEASURES: &'static [Measure] = &[Measure::ResponseTime];

    fn key(&self, field: Field) -> Option<Value> {
        match field {
            Field::District => self.record.district.as_deref().map(Value::from),
            Field::Year => self.year.map(Value::from),
            Field::Hour => self.hour.map(|h| Value::Int(h as i64)),
            Field::Weekday => self.weekday.map(|w| Value::from(crate::normalize::weekday_name(w))),
            Field::DayType => self.day_type.map(|d| Value::from(d.label())),
            Field::MissionType => Some(Value::from(self.mission_type.label())),
            Field::MissionTypeRaw => self.record.mission_type_raw.as_deref().map(Value::from),
        }
    }

    fn measure(&self, measure: Measure) -> Option<f64> {
        match measure {
            Measure::ResponseTime => self.record.response_time,
            _ => None,
        }
    }
}

impl Record for RegionalRecord {
    const FIELDS: &'static [Field] = &[Field::District, Field::Year];
    const MEASURES: &'static [Measure] = &[
        Measure::MissionCountAll,
        Measure::MissionCountEms,
        Measure::MissionCountFire,
    ];

    fn key(&self, field: Field) -> Option<Value> {
        match field {
            Field::District => self.district.as_deref().map(Value::from),
            Field::Year => self.year.map(Value::from),
            _ => None,
        }
    }

    fn measure(&self, measure: Measure) -> Option<f64> {
        let count = match measure {
            Measure::MissionCountAll => self.mission_count_all,
            Measure::MissionCountEms => self.mission_count_ems,
            Measure::MissionCountFire => self.mission_count_fire,
            Measure::ResponseTime => None,
        };
        count.map(|c| c as f64)
    }
}

/// A headline number shown above a view's table.
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct MetricCard {
    #[tabled(rename = "Metric")]
    pub title: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

impl MetricCard {
    pub fn new(title: impl Into<String>, value: impl Into<String>) -> Self {
        MetricCard {
            title: title.into(),
            value: value.into(),
        }
    }
}

/// The chart a graphical host would draw for a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Area,
    Pie,
    Bubble,
    Heatmap,
    HorizontalBar,
    Treemap,
}
