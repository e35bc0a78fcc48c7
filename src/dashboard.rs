//! A dashboard session: configuration plus the per-session load caches.

use std::sync::Arc;

use crate::cache::LoadCache;
use crate::config::Config;
use crate::error::Result;
use crate::loader::{load_missions, load_regional, LoadReport};
use crate::normalize::normalize_missions;
use crate::select::domain;
use crate::types::{Field, NormalizedMission, RegionalRecord, Value};
use crate::views::{self, Dataset, View, ViewOutput, ViewParams};

pub struct Dashboard {
    config: Config,
    missions: LoadCache<Vec<NormalizedMission>>,
    regional: LoadCache<Vec<RegionalRecord>>,
    missions_report: Option<LoadReport>,
    regional_report: Option<LoadReport>,
}

impl Dashboard {
    pub fn new(config: Config) -> Self {
        Dashboard {
            config,
            missions: LoadCache::new(),
            regional: LoadCache::new(),
            missions_report: None,
            regional_report: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Report of the most recent successful read of `dataset`, if any.
    pub fn load_report(&self, dataset: Dataset) -> Option<&LoadReport> {
        match dataset {
            Dataset::Missions => self.missions_report.as_ref(),
            Dataset::Regional => self.regional_report.as_ref(),
        }
    }

    /// Loaded and normalized missions, reread only when the file changed.
    pub fn missions(&mut self) -> Result<Arc<Vec<NormalizedMission>>> {
        let policy = self.config.parse_policy;
        let mut fresh = None;
        let data = self.missions.get_or_load(&self.config.missions_path, |path| {
            let (records, report) = load_missions(path, policy)?;
            fresh = Some(report);
            Ok(normalize_missions(records))
        })?;
        if fresh.is_some() {
            self.missions_report = fresh;
        }
        Ok(data)
    }

    pub fn regional(&mut self) -> Result<Arc<Vec<RegionalRecord>>> {
        let policy = self.config.parse_policy;
        let mut fresh = None;
        let data = self.regional.get_or_load(&self.config.regional_path, |path| {
            let (records, report) = load_regional(path, policy)?;
            fresh = Some(report);
            Ok(records)
        })?;
        if fresh.is_some() {
            self.regional_report = fresh;
        }
        Ok(data)
    }

    /// Selectable values of `field` in the currently loaded `dataset`.
    pub fn domain(&mut self, dataset: Dataset, field: Field) -> Result<Vec<Value>> {
        match dataset {
            Dataset::Missions => domain(self.missions()?.as_slice(), field),
            Dataset::Regional => domain(self.regional()?.as_slice(), field),
        }
    }

    pub fn run(&mut self, view: View, params: &ViewParams) -> Result<ViewOutput> {
        log::info!("Running view {view}");
        match view {
            View::Overview => views::overview(&self.missions()?),
            View::MissionMix => views::mission_mix(&self.missions()?),
            View::TimePatterns => views::time_patterns(&self.missions()?, params),
            View::MissionTypes => views::mission_types(&self.missions()?),
            View::LocationTrends => views::location_trends(&self.missions()?),
            View::LocationIncidents => views::location_incidents(&self.missions()?, params),
            View::RegionalCapacity => views::regional_capacity(&self.regional()?, params),
            View::RegionalTimeGoals => views::regional_time_goals(&self.regional()?, params),
            View::DemandLandscape => views::demand_landscape(&self.regional()?, params),
        }
    }
}
