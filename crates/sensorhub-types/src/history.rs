//! History samples and the per-domain projections that produce them.
//!
//! History keeps only what trend queries need. Each projection is a pure,
//! total function of a [`Reading`]: fields the producer left out fall back
//! to zero (or `false` for flags), matching what the simulators' consumers
//! have always assumed.
//!
//! Payload keys follow the producers' vocabulary (`places_disponibles`,
//! `humidite`, ...) with English aliases accepted as well. Counts keep the
//! number the producer sent; zero stands in only for a missing value.
//!
//! [`LegacyRecord`] writes a sample back out under the producers' keys for
//! dashboards built against them.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Number, Value};
use ts_rs::TS;

use crate::enums::Domain;
use crate::reading::{as_number, Reading, Timestamp};

// ---------------------------------------------------------------------------
// Payload keys
// ---------------------------------------------------------------------------

const AVAILABLE_SPACES: &[&str] = &["places_disponibles", "available_spaces", "available"];
const ROOMS: &[&str] = &["salles", "rooms"];
const ROOM_OCCUPANCY: &[&str] = &["occupation_actuelle", "occupancy"];
const SIGNAL_STRENGTH: &[&str] = &["puissance_signal", "signal_strength"];
const CONNECTED_USERS: &[&str] = &["utilisateurs_connectes", "connected_users"];
const TEMPERATURE: &[&str] = &["temperature"];
const HUMIDITY: &[&str] = &["humidite", "humidity"];
const LATITUDE: &[&str] = &["latitude"];
const LONGITUDE: &[&str] = &["longitude"];
const PASSENGERS: &[&str] = &["passagers", "passengers"];
const TAXI_AVAILABLE: &[&str] = &["disponible", "available"];

// ---------------------------------------------------------------------------
// Samples
// ---------------------------------------------------------------------------

/// Parking trend sample.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ParkingSample {
    /// When the reading was taken.
    pub timestamp: Timestamp,
    /// Free spaces at that time.
    #[ts(type = "number")]
    pub available_spaces: Number,
}

/// Building trend sample.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BuildingSample {
    /// When the reading was taken.
    pub timestamp: Timestamp,
    /// Occupancy summed over every room of the building.
    #[ts(type = "number")]
    pub total_occupancy: Number,
}

/// Wi-Fi access point trend sample.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WifiSample {
    /// When the reading was taken.
    pub timestamp: Timestamp,
    /// Reported signal strength.
    pub signal_strength: f64,
    /// Number of connected clients.
    #[ts(type = "number")]
    pub connected_users: Number,
}

/// Weather station trend sample.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WeatherSample {
    /// When the reading was taken.
    pub timestamp: Timestamp,
    /// Air temperature.
    pub temperature: f64,
    /// Relative humidity.
    pub humidity: f64,
}

/// Bus position sample.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BusSample {
    /// When the reading was taken.
    pub timestamp: Timestamp,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Passengers on board.
    #[ts(type = "number")]
    pub passengers: Number,
}

/// Taxi position sample.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TaxiSample {
    /// When the reading was taken.
    pub timestamp: Timestamp,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Whether the taxi is free for hire.
    pub available: bool,
}

/// A reduced, domain-specific projection of a [`Reading`].
///
/// Serialized without a tag: a parking sample is just
/// `{"timestamp": .., "available_spaces": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(untagged)]
#[ts(export, export_to = "bindings/")]
pub enum HistoryRecord {
    /// See [`ParkingSample`].
    Parking(ParkingSample),
    /// See [`BuildingSample`].
    Building(BuildingSample),
    /// See [`WifiSample`].
    Wifi(WifiSample),
    /// See [`WeatherSample`].
    Weather(WeatherSample),
    /// See [`BusSample`].
    Bus(BusSample),
    /// See [`TaxiSample`].
    Taxi(TaxiSample),
}

impl HistoryRecord {
    /// Timestamp of the reading this sample was projected from.
    pub const fn timestamp(&self) -> Timestamp {
        match self {
            Self::Parking(s) => s.timestamp,
            Self::Building(s) => s.timestamp,
            Self::Wifi(s) => s.timestamp,
            Self::Weather(s) => s.timestamp,
            Self::Bus(s) => s.timestamp,
            Self::Taxi(s) => s.timestamp,
        }
    }

    /// The domain whose projection produced this sample.
    pub const fn domain(&self) -> Domain {
        match self {
            Self::Parking(_) => Domain::Parking,
            Self::Building(_) => Domain::Building,
            Self::Wifi(_) => Domain::Wifi,
            Self::Weather(_) => Domain::Weather,
            Self::Bus(_) => Domain::TransportBus,
            Self::Taxi(_) => Domain::TransportTaxi,
        }
    }
}

/// A [`HistoryRecord`] serialized under the producers' own keys.
///
/// `{"timestamp": .., "places_disponibles": ..}` for parking,
/// `occupation_totale` for buildings, and so on.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyRecord(pub HistoryRecord);

impl Serialize for LegacyRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("timestamp", &self.0.timestamp())?;
        match &self.0 {
            HistoryRecord::Parking(s) => {
                map.serialize_entry("places_disponibles", &s.available_spaces)?;
            }
            HistoryRecord::Building(s) => {
                map.serialize_entry("occupation_totale", &s.total_occupancy)?;
            }
            HistoryRecord::Wifi(s) => {
                map.serialize_entry("puissance_signal", &s.signal_strength)?;
                map.serialize_entry("utilisateurs_connectes", &s.connected_users)?;
            }
            HistoryRecord::Weather(s) => {
                map.serialize_entry("temperature", &s.temperature)?;
                map.serialize_entry("humidite", &s.humidity)?;
            }
            HistoryRecord::Bus(s) => {
                map.serialize_entry("latitude", &s.latitude)?;
                map.serialize_entry("longitude", &s.longitude)?;
                map.serialize_entry("passagers", &s.passengers)?;
            }
            HistoryRecord::Taxi(s) => {
                map.serialize_entry("latitude", &s.latitude)?;
                map.serialize_entry("longitude", &s.longitude)?;
                map.serialize_entry("disponible", &s.available)?;
            }
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Projections
// ---------------------------------------------------------------------------

/// Parking: free spaces.
pub fn project_parking(reading: &Reading) -> HistoryRecord {
    HistoryRecord::Parking(ParkingSample {
        timestamp: reading.timestamp(),
        available_spaces: count_or_zero(reading.count(AVAILABLE_SPACES)),
    })
}

/// Building: total occupancy across all rooms.
pub fn project_building(reading: &Reading) -> HistoryRecord {
    let total_occupancy = reading
        .array(ROOMS)
        .map(|rooms| {
            rooms
                .iter()
                .map(room_occupancy)
                .fold(Number::from(0), |acc, room| add_counts(&acc, &room))
        })
        .unwrap_or_else(|| Number::from(0));
    HistoryRecord::Building(BuildingSample {
        timestamp: reading.timestamp(),
        total_occupancy,
    })
}

fn room_occupancy(room: &Value) -> Number {
    count_or_zero(ROOM_OCCUPANCY.iter().find_map(|key| room.get(*key)).and_then(as_number))
}

fn count_or_zero(count: Option<Number>) -> Number {
    count.unwrap_or_else(|| Number::from(0))
}

/// Integer sums stay exact; anything else is summed as a float.
fn add_counts(acc: &Number, next: &Number) -> Number {
    acc.as_i64()
        .zip(next.as_i64())
        .and_then(|(a, b)| a.checked_add(b))
        .map_or_else(
            || {
                let sum = acc.as_f64().unwrap_or_default() + next.as_f64().unwrap_or_default();
                Number::from_f64(sum.clamp(f64::MIN, f64::MAX)).unwrap_or_else(|| Number::from(0))
            },
            Number::from,
        )
}

/// Wi-Fi: signal strength and connected users.
pub fn project_wifi(reading: &Reading) -> HistoryRecord {
    HistoryRecord::Wifi(WifiSample {
        timestamp: reading.timestamp(),
        signal_strength: reading.number(SIGNAL_STRENGTH).unwrap_or_default(),
        connected_users: count_or_zero(reading.count(CONNECTED_USERS)),
    })
}

/// Weather: temperature and humidity.
pub fn project_weather(reading: &Reading) -> HistoryRecord {
    HistoryRecord::Weather(WeatherSample {
        timestamp: reading.timestamp(),
        temperature: reading.number(TEMPERATURE).unwrap_or_default(),
        humidity: reading.number(HUMIDITY).unwrap_or_default(),
    })
}

/// Bus: position and passenger count.
pub fn project_bus(reading: &Reading) -> HistoryRecord {
    HistoryRecord::Bus(BusSample {
        timestamp: reading.timestamp(),
        latitude: reading.number(LATITUDE).unwrap_or_default(),
        longitude: reading.number(LONGITUDE).unwrap_or_default(),
        passengers: count_or_zero(reading.count(PASSENGERS)),
    })
}

/// Taxi: position and availability.
pub fn project_taxi(reading: &Reading) -> HistoryRecord {
    HistoryRecord::Taxi(TaxiSample {
        timestamp: reading.timestamp(),
        latitude: reading.number(LATITUDE).unwrap_or_default(),
        longitude: reading.number(LONGITUDE).unwrap_or_default(),
        available: reading.flag(TAXI_AVAILABLE).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp, clippy::unwrap_used)]

    use super::*;

    fn reading(json: &str) -> Reading {
        Reading::from_json(json.as_bytes(), 0.0).unwrap()
    }

    #[test]
    fn parking_keeps_available_spaces() {
        let r = reading(r#"{"nom":"Parking Gare","capacite_totale":200,"places_disponibles":42,"timestamp":1000}"#);
        assert_eq!(
            Domain::Parking.project(&r),
            HistoryRecord::Parking(ParkingSample {
                timestamp: 1000.0,
                available_spaces: Number::from(42),
            })
        );
    }

    #[test]
    fn parking_accepts_short_alias() {
        let r = reading(r#"{"name":"P1","available":30,"timestamp":1010}"#);
        assert_eq!(
            project_parking(&r),
            HistoryRecord::Parking(ParkingSample {
                timestamp: 1010.0,
                available_spaces: Number::from(30),
            })
        );
    }

    #[test]
    fn building_sums_room_occupancy() {
        let r = reading(
            r#"{"nom":"Sciences","timestamp":5,"salles":[
                {"nom":"S101","occupation_actuelle":12},
                {"nom":"S102","occupation_actuelle":0},
                {"nom":"S201"},
                {"nom":"S202","occupation_actuelle":7}
            ]}"#,
        );
        let record = Domain::Building.project(&r);
        assert_eq!(
            record,
            HistoryRecord::Building(BuildingSample {
                timestamp: 5.0,
                total_occupancy: Number::from(19),
            })
        );
    }

    #[test]
    fn building_without_rooms_is_empty() {
        let record = project_building(&reading(r#"{"timestamp":5}"#));
        assert_eq!(
            record,
            HistoryRecord::Building(BuildingSample {
                timestamp: 5.0,
                total_occupancy: Number::from(0),
            })
        );
    }

    #[test]
    fn wifi_defaults_missing_fields_to_zero() {
        let record = project_wifi(&reading(r#"{"id":"AP001","puissance_signal":80,"timestamp":3}"#));
        assert_eq!(
            record,
            HistoryRecord::Wifi(WifiSample {
                timestamp: 3.0,
                signal_strength: 80.0,
                connected_users: Number::from(0),
            })
        );
    }

    #[test]
    fn weather_reads_humidite() {
        let record = project_weather(&reading(r#"{"temperature":21.5,"humidite":64,"timestamp":9}"#));
        assert_eq!(
            record,
            HistoryRecord::Weather(WeatherSample {
                timestamp: 9.0,
                temperature: 21.5,
                humidity: 64.0,
            })
        );
    }

    #[test]
    fn transport_projections_keep_position() {
        let bus = project_bus(&reading(
            r#"{"id":"BUS_L1_1","latitude":48.8566,"longitude":2.3522,"passagers":17,"timestamp":1}"#,
        ));
        assert_eq!(bus.domain(), Domain::TransportBus);
        assert_eq!(
            bus,
            HistoryRecord::Bus(BusSample {
                timestamp: 1.0,
                latitude: 48.8566,
                longitude: 2.3522,
                passengers: Number::from(17),
            })
        );

        let taxi = project_taxi(&reading(
            r#"{"id":"TAXI_Z1_1","latitude":48.86,"longitude":2.34,"disponible":true,"timestamp":2}"#,
        ));
        assert_eq!(taxi.timestamp(), 2.0);
        assert_eq!(
            taxi,
            HistoryRecord::Taxi(TaxiSample {
                timestamp: 2.0,
                latitude: 48.86,
                longitude: 2.34,
                available: true,
            })
        );
    }

    #[test]
    fn samples_serialize_untagged() {
        let record = HistoryRecord::Parking(ParkingSample {
            timestamp: 1000.0,
            available_spaces: Number::from(42),
        });
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json, serde_json::json!({"timestamp": 1000.0, "available_spaces": 42}));
    }

    #[test]
    fn counts_keep_fractional_and_large_values() {
        let parking = project_parking(&reading(r#"{"places_disponibles":42.5,"timestamp":1}"#));
        let json = serde_json::to_value(&parking).unwrap();
        assert_eq!(json["available_spaces"].as_f64(), Some(42.5));

        let wifi = project_wifi(&reading(r#"{"utilisateurs_connectes":1e20,"timestamp":1}"#));
        let json = serde_json::to_value(&wifi).unwrap();
        assert_eq!(json["connected_users"].as_f64(), Some(1e20));

        let bus = project_bus(&reading(r#"{"passagers":"12","timestamp":1}"#));
        let json = serde_json::to_value(&bus).unwrap();
        assert_eq!(json["passengers"], serde_json::json!(12));
    }

    #[test]
    fn building_sum_mixes_fractional_rooms() {
        let record = project_building(&reading(
            r#"{"timestamp":1,"salles":[{"occupation_actuelle":2.5},{"occupation_actuelle":3}]}"#,
        ));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["total_occupancy"].as_f64(), Some(5.5));
    }

    #[test]
    fn legacy_record_uses_producer_keys() {
        let parking = LegacyRecord(HistoryRecord::Parking(ParkingSample {
            timestamp: 1000.0,
            available_spaces: Number::from(42),
        }));
        assert_eq!(
            serde_json::to_value(&parking).unwrap(),
            serde_json::json!({"timestamp": 1000.0, "places_disponibles": 42})
        );

        let taxi = LegacyRecord(HistoryRecord::Taxi(TaxiSample {
            timestamp: 2.0,
            latitude: 48.86,
            longitude: 2.34,
            available: false,
        }));
        assert_eq!(
            serde_json::to_value(&taxi).unwrap(),
            serde_json::json!({
                "timestamp": 2.0,
                "latitude": 48.86,
                "longitude": 2.34,
                "disponible": false
            })
        );
    }
}
