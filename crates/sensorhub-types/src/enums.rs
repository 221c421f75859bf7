//! Enumeration types for the Sensorhub service.
//!
//! [`Domain`] is the closed set of sensor categories the service knows
//! about. Every per-domain behavior (API path segment, live event name,
//! history projection) hangs off this enum as plain data or a function
//! value, so adding a domain is a compile-checked change in one place.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::history::{self, HistoryRecord};
use crate::reading::Reading;

/// Pure projection from a full reading to its history sample.
pub type Projector = fn(&Reading) -> HistoryRecord;

/// A sensor category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Domain {
    /// Parking lot occupancy.
    Parking,
    /// Building and room occupancy.
    Building,
    /// Wi-Fi access point state.
    Wifi,
    /// Weather station conditions.
    Weather,
    /// Bus position and load.
    TransportBus,
    /// Taxi position and availability.
    TransportTaxi,
}

impl Domain {
    /// Every domain, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Parking,
        Self::Building,
        Self::Wifi,
        Self::Weather,
        Self::TransportBus,
        Self::TransportTaxi,
    ];

    /// Path segment used by the query API (`/api/<segment>`).
    pub const fn api_segment(self) -> &'static str {
        match self {
            Self::Parking => "parking",
            Self::Building => "batiments",
            Self::Wifi => "wifi",
            Self::Weather => "meteo",
            Self::TransportBus => "transport/bus",
            Self::TransportTaxi => "transport/taxi",
        }
    }

    /// Resolve an API path segment back to its domain.
    pub fn from_api_segment(segment: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|domain| domain.api_segment() == segment)
    }

    /// Name of the live event emitted for each stored reading.
    ///
    /// These match the event names dashboards already subscribe to.
    pub const fn live_event_name(self) -> &'static str {
        match self {
            Self::Parking => "update_parking",
            Self::Building => "update_batiment",
            Self::Wifi => "update_wifi",
            Self::Weather => "update_meteo",
            Self::TransportBus => "update_transport_bus",
            Self::TransportTaxi => "update_transport_taxi",
        }
    }

    /// The history projection for this domain.
    pub const fn projector(self) -> Projector {
        match self {
            Self::Parking => history::project_parking,
            Self::Building => history::project_building,
            Self::Wifi => history::project_wifi,
            Self::Weather => history::project_weather,
            Self::TransportBus => history::project_bus,
            Self::TransportTaxi => history::project_taxi,
        }
    }

    /// Apply this domain's projection to a reading.
    pub fn project(self, reading: &Reading) -> HistoryRecord {
        (self.projector())(reading)
    }
}

impl core::fmt::Display for Domain {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.api_segment())
    }
}
