//! Single entry point over all repositories.

use crate::data::{
    DeviceStatusRepository, GlucoseReadingsRepository, MongoConnection, ProfileRepository,
    Record, Result, TreatmentsRepository,
};

/// Unified access to glucose, device status, profile and treatment data.
///
/// All methods take optional ISO 8601 `start`/`end` bounds. With no bounds
/// the last two weeks up to now are returned.
#[derive(Debug, Clone, Copy)]
pub struct DataService<'a> {
    glucose: GlucoseReadingsRepository<'a>,
    device_status: DeviceStatusRepository<'a>,
    profiles: ProfileRepository<'a>,
    treatments: TreatmentsRepository<'a>,
}

impl<'a> DataService<'a> {
    pub fn new(conn: &'a MongoConnection) -> Self {
        DataService {
            glucose: GlucoseReadingsRepository::new(conn),
            device_status: DeviceStatusRepository::new(conn),
            profiles: ProfileRepository::new(conn),
            treatments: TreatmentsRepository::new(conn),
        }
    }

    pub fn get_glucose_readings(
        &self,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Vec<Record>> {
        self.glucose.get_glucose_readings(start, end)
    }

    pub fn get_device_status(&self, start: Option<&str>, end: Option<&str>) -> Result<Vec<Record>> {
        self.device_status.get_device_status(start, end)
    }

    /// Profiles in range, preceded by the one in effect at `start` if any
    pub fn get_profiles(&self, start: Option<&str>, end: Option<&str>) -> Result<Vec<Record>> {
        self.profiles.get_profiles(start, end)
    }

    pub fn get_treatments(&self, start: Option<&str>, end: Option<&str>) -> Result<Vec<Record>> {
        self.treatments.get_treatments(start, end)
    }
}
