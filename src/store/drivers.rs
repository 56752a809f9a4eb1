use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::AppError;
use crate::models::driver::{
    ApprovalStatus, DriverRegistration, GeoPoint, LocationAck, LocationReport, NewRegistration,
};

struct StoredDriver {
    seq: u64,
    registration: DriverRegistration,
}

/// Driver registrations keyed by the driver's own identity.
pub struct DriverRegistry {
    drivers: DashMap<String, StoredDriver>,
    next_seq: AtomicU64,
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self {
            drivers: DashMap::new(),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Files a PENDING application. A rejected driver may apply again; a
    /// pending or approved one may not.
    pub fn register(&self, application: NewRegistration) -> Result<DriverRegistration, AppError> {
        validate_application(&application)?;

        let id = application.id.trim().to_string();
        let registration = DriverRegistration {
            id: id.clone(),
            driver_name: application.driver_name.trim().to_string(),
            car_number: application.car_number.trim().to_string(),
            vehicle_type: application.vehicle_type,
            phone_number: application.phone_number.trim().to_string(),
            status: ApprovalStatus::Pending,
            applied_at: Utc::now(),
            is_tracking: None,
            latitude: None,
            longitude: None,
            last_location_update: None,
            last_report_at: None,
        };
        let stored = StoredDriver {
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            registration: registration.clone(),
        };

        match self.drivers.entry(id) {
            Entry::Occupied(mut existing) => {
                if existing.get().registration.status != ApprovalStatus::Rejected {
                    return Err(AppError::DuplicateRegistration(existing.key().clone()));
                }
                existing.insert(stored);
            }
            Entry::Vacant(slot) => {
                slot.insert(stored);
            }
        }

        Ok(registration)
    }

    pub fn approve(&self, driver_id: &str) -> Result<DriverRegistration, AppError> {
        self.review(driver_id, ApprovalStatus::Approved)
    }

    pub fn reject(&self, driver_id: &str) -> Result<DriverRegistration, AppError> {
        self.review(driver_id, ApprovalStatus::Rejected)
    }

    fn review(
        &self,
        driver_id: &str,
        decision: ApprovalStatus,
    ) -> Result<DriverRegistration, AppError> {
        let mut entry = self
            .drivers
            .get_mut(driver_id)
            .ok_or_else(|| AppError::NotFound(format!("driver {driver_id} not found")))?;
        let registration = &mut entry.registration;

        if registration.status != ApprovalStatus::Pending {
            return Err(AppError::InvalidTransition {
                from: registration.status.as_str().to_string(),
                to: decision.as_str().to_string(),
            });
        }

        registration.status = decision;
        Ok(registration.clone())
    }

    /// Applies a position report unless a newer one was already accepted.
    ///
    /// Client timestamps are capped at the server clock, so a skewed device
    /// cannot lock out later reports. A report without a timestamp is
    /// ordered by arrival and always applies. Switching tracking off clears
    /// the stored position at once so the driver drops out of proximity
    /// queries.
    pub fn update_location(
        &self,
        driver_id: &str,
        report: LocationReport,
    ) -> Result<LocationAck, AppError> {
        let point = GeoPoint {
            lat: report.lat,
            lng: report.lng,
        };
        if report.tracking && !point.is_valid() {
            return Err(AppError::Validation(format!(
                "coordinates out of range: {}, {}",
                report.lat, report.lng
            )));
        }

        let now = Utc::now();
        let reported_at = report.reported_at.map_or(now, |at| at.min(now));

        let mut entry = self
            .drivers
            .get_mut(driver_id)
            .ok_or_else(|| AppError::NotFound(format!("driver {driver_id} not found")))?;
        let registration = &mut entry.registration;

        let newest = registration.last_report_at;
        if report.reported_at.is_some() && newest.is_some_and(|newest| reported_at < newest) {
            return Ok(LocationAck {
                applied: false,
                driver: registration.clone(),
            });
        }

        registration.last_report_at = Some(newest.map_or(reported_at, |n| n.max(reported_at)));
        registration.is_tracking = Some(report.tracking);
        if report.tracking {
            registration.latitude = Some(point.lat);
            registration.longitude = Some(point.lng);
            registration.last_location_update = Some(reported_at);
        } else {
            registration.latitude = None;
            registration.longitude = None;
            registration.last_location_update = None;
        }

        Ok(LocationAck {
            applied: true,
            driver: registration.clone(),
        })
    }

    pub fn get(&self, driver_id: &str) -> Result<DriverRegistration, AppError> {
        self.drivers
            .get(driver_id)
            .map(|entry| entry.registration.clone())
            .ok_or_else(|| AppError::NotFound(format!("driver {driver_id} not found")))
    }

    /// Registrations matching `predicate`, most recent application first.
    pub fn list_where<F>(&self, predicate: F) -> Vec<DriverRegistration>
    where
        F: Fn(&DriverRegistration) -> bool,
    {
        let mut matching: Vec<(u64, DriverRegistration)> = self
            .drivers
            .iter()
            .filter(|entry| predicate(&entry.registration))
            .map(|entry| (entry.seq, entry.registration.clone()))
            .collect();

        matching.sort_by(|a, b| b.0.cmp(&a.0));
        matching.into_iter().map(|(_, reg)| reg).collect()
    }

    pub fn list(&self, status: Option<ApprovalStatus>) -> Vec<DriverRegistration> {
        self.list_where(|reg| status.is_none_or(|wanted| reg.status == wanted))
    }

    pub fn list_approved(&self) -> Vec<DriverRegistration> {
        self.list(Some(ApprovalStatus::Approved))
    }

    pub fn list_tracking(&self) -> Vec<DriverRegistration> {
        self.list_where(|reg| reg.position().is_some())
    }

    /// Drivers currently reporting a position, counted without cloning.
    pub fn count_tracking(&self) -> usize {
        self.drivers
            .iter()
            .filter(|entry| entry.registration.position().is_some())
            .count()
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}

fn validate_application(application: &NewRegistration) -> Result<(), AppError> {
    let required = [
        ("id", &application.id),
        ("driver name", &application.driver_name),
        ("car number", &application.car_number),
        ("phone number", &application.phone_number),
    ];

    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{field} cannot be empty")));
        }
    }

    Ok(())
}
