//! Calendar derivation and mission-type translation.

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use std::collections::BTreeSet;

use crate::types::{DayType, MissionRecord, MissionType, NormalizedMission};

impl MissionType {
    /// Translate a raw (German) mission label. Total: anything outside the
    /// five known labels, including a missing label, is `Other`.
    pub fn from_raw(raw: Option<&str>) -> MissionType {
        match raw.map(str::trim) {
            Some("Rettungsdienst") => MissionType::EmergencyMedicalService,
            Some("Notfallrettung") => MissionType::EmergencyRescue,
            Some("Brand") => MissionType::FireIncident,
            Some("Technische Hilfeleistung") => MissionType::TechnicalRescue,
            Some("Krankentransport") => MissionType::PatientTransport,
            _ => MissionType::Other,
        }
    }
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Monday is 0, so Saturday (5) and Sunday (6) are the weekend.
pub fn is_weekend(day: Weekday) -> bool {
    day.num_days_from_monday() >= 5
}

fn derive(ts: NaiveDateTime) -> (i32, u32, Weekday, bool) {
    let day = ts.weekday();
    (ts.year(), ts.hour(), day, is_weekend(day))
}

pub fn normalize_mission(record: MissionRecord) -> NormalizedMission {
    let mission_type = MissionType::from_raw(record.mission_type_raw.as_deref());
    let derived = record.timestamp.map(derive);
    NormalizedMission {
        mission_type,
        year: derived.map(|d| d.0),
        hour: derived.map(|d| d.1),
        weekday: derived.map(|d| d.2),
        is_weekend: derived.map(|d| d.3),
        day_type: derived.map(|d| if d.3 { DayType::Weekend } else { DayType::Weekday }),
        record,
    }
}

/// One output row per input row; rows with no timestamp keep null calendar
/// fields.
pub fn normalize_missions(records: Vec<MissionRecord>) -> Vec<NormalizedMission> {
    records.into_iter().map(normalize_mission).collect()
}

/// Distinct (raw label, display category) pairs seen in the data, sorted by
/// raw label. Missions without a raw label are left out.
pub fn mission_type_lookup(rows: &[NormalizedMission]) -> Vec<(String, MissionType)> {
    let pairs: BTreeSet<(String, MissionType)> = rows
        .iter()
        .filter_map(|r| {
            r.record
                .mission_type_raw
                .as_ref()
                .map(|raw| (raw.clone(), r.mission_type))
        })
        .collect();
    pairs.into_iter().collect()
}
