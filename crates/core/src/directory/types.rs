//! Reference data the queue engine reads but never writes.

use serde::{Deserialize, Serialize};

/// Parent of offices; supplies the fallback schedule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Organization {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_schedule: Option<String>,
}

/// A physical service location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Office {
    pub id: String,
    pub name: String,
    /// Short code used inside ticket ids; the id is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abbreviation: Option<String>,
    /// IANA zone name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
}

impl Office {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            abbreviation: None,
            timezone: None,
            schedule_id: None,
            organization_id: None,
        }
    }

    pub fn with_abbreviation(mut self, abbreviation: impl Into<String>) -> Self {
        self.abbreviation = Some(abbreviation.into());
        self
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    pub fn with_schedule(mut self, schedule_id: impl Into<String>) -> Self {
        self.schedule_id = Some(schedule_id.into());
        self
    }

    pub fn with_organization(mut self, organization_id: impl Into<String>) -> Self {
        self.organization_id = Some(organization_id.into());
        self
    }

    /// Segment identifying the office inside ticket ids.
    pub fn identifier(&self) -> &str {
        self.abbreviation
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(&self.id)
    }
}

/// Something a visitor can queue for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    /// Eligible for walk-in tickets from the kiosk.
    pub live_queue_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl Service {
    /// An enabled walk-in service.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            enabled: true,
            live_queue_enabled: true,
            category_id: None,
            icon: None,
        }
    }

    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }
}

/// A service offered at an office. Listing order is assignment order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OfficeService {
    pub office_id: String,
    pub service_id: String,
    pub is_active: bool,
}

impl OfficeService {
    pub fn active(office_id: impl Into<String>, service_id: impl Into<String>) -> Self {
        Self {
            office_id: office_id.into(),
            service_id: service_id.into(),
            is_active: true,
        }
    }
}

/// Kiosk grouping of services.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceCategory {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub display_order: i32,
}

/// A counter or window visitors are called to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServicePoint {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub office_id: Option<String>,
}

/// Staff member who calls and serves tickets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Operator {
    pub id: String,
    /// Identity supplied by the auth layer.
    pub user_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_office: Option<String>,
    pub is_active: bool,
    /// Service ids the operator may serve, in configured order.
    #[serde(default)]
    pub skills: Vec<String>,
}

impl Operator {
    pub fn new(id: impl Into<String>, user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            name: name.into(),
            default_office: None,
            is_active: true,
            skills: Vec::new(),
        }
    }

    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skills = skills.into_iter().map(Into::into).collect();
        self
    }
}
