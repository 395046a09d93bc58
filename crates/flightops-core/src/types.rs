//! Records stored in the flight-operations tables.
//!
//! Attribute names follow the table layout (PascalCase). Records are read
//! tolerantly: missing attributes fall back to defaults so a partially
//! populated item still yields a usable record.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::store::Item;

/// Flight statuses that indicate a disruption, lowercase.
pub const DELAY_STATUSES: [&str; 3] = ["delayed", "cancelled", "diverted"];

/// Flight statuses of flights that can take rebooked passengers, lowercase.
pub const BOOKABLE_STATUSES: [&str; 2] = ["on_time", "scheduled"];

/// Whole delay minutes from an integer, a float or a numeric string.
///
/// Fractions round up, so any positive stored value stays positive. Null and
/// blank values read as zero.
fn lenient_minutes<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error as _;

    let invalid = |raw: &dyn std::fmt::Display| {
        D::Error::custom(format!("invalid delay minutes: {}", raw))
    };
    let minutes = match Value::deserialize(deserializer)? {
        Value::Null => return Ok(0),
        Value::Number(n) => match n.as_i64() {
            Some(whole) => return Ok(whole),
            None => n.as_f64().ok_or_else(|| invalid(&n))?,
        },
        Value::String(s) if s.trim().is_empty() => return Ok(0),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| invalid(&s))?,
        other => return Err(invalid(&other)),
    };
    if !minutes.is_finite() {
        return Err(invalid(&minutes));
    }
    Ok(minutes.ceil() as i64)
}

// =============================================================================
// Loyalty tier
// =============================================================================

/// Passenger loyalty classification.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Tier {
    Senator,
    FrequentTraveler,
    #[default]
    Regular,
    Unknown(String),
}

impl Tier {
    /// Sort rank: senator highest, unknown lowest.
    pub fn rank(&self) -> u8 {
        match self {
            Tier::Senator => 3,
            Tier::FrequentTraveler => 2,
            Tier::Regular => 1,
            Tier::Unknown(_) => 0,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Tier::Senator => "senator",
            Tier::FrequentTraveler => "frequent_traveler",
            Tier::Regular => "regular",
            Tier::Unknown(raw) => raw,
        }
    }
}

impl From<&str> for Tier {
    fn from(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "senator" => Tier::Senator,
            "frequent_traveler" => Tier::FrequentTraveler,
            "regular" => Tier::Regular,
            _ => Tier::Unknown(raw.to_string()),
        }
    }
}

impl From<String> for Tier {
    fn from(raw: String) -> Self {
        Tier::from(raw.as_str())
    }
}

impl From<Tier> for String {
    fn from(tier: Tier) -> Self {
        tier.as_str().to_string()
    }
}

// =============================================================================
// Flights
// =============================================================================

/// A row of the `Flights` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Flight {
    pub flight_number: String,
    pub departure_date: String,
    pub origin: String,
    pub destination: String,
    pub status: String,
    #[serde(deserialize_with = "lenient_minutes")]
    pub delay_minutes: i64,
    pub delay_reason: Option<String>,
    pub scheduled_departure: Option<String>,
    pub estimated_departure: Option<String>,
    pub aircraft_type: Option<String>,
    pub available_seats: Option<i64>,
}

impl Flight {
    fn status_is(&self, statuses: &[&str]) -> bool {
        let status = self.status.to_ascii_lowercase();
        statuses.contains(&status.as_str())
    }

    /// Status is delayed, cancelled or diverted (any case).
    pub fn has_delay_status(&self) -> bool {
        self.status_is(&DELAY_STATUSES)
    }

    /// Status is cancelled or diverted (any case).
    pub fn is_cancelled_or_diverted(&self) -> bool {
        self.status_is(&["cancelled", "diverted"])
    }

    /// Status is on time or scheduled (any case).
    pub fn is_bookable(&self) -> bool {
        self.status_is(&BOOKABLE_STATUSES)
    }

    /// Positive delay minutes or a delay-indicating status.
    pub fn is_delayed(&self) -> bool {
        self.delay_minutes > 0 || self.has_delay_status()
    }
}

// =============================================================================
// Passengers and bookings
// =============================================================================

/// A row of the `Passengers` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Passenger {
    pub passenger_id: String,
    pub booking_reference: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub frequent_flyer_tier: Option<String>,
    pub preferred_language: Option<String>,
}

impl Passenger {
    pub fn tier(&self) -> Tier {
        self.frequent_flyer_tier
            .as_deref()
            .map(Tier::from)
            .unwrap_or_else(|| Tier::Unknown(String::new()))
    }

    pub fn full_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A row of the `Bookings` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Booking {
    pub booking_reference: String,
    pub passenger_id: String,
    pub flight_number: String,
    pub departure_date: Option<String>,
    pub seat_number: Option<String>,
    pub class: Option<String>,
    pub booking_status: Option<String>,
}

// =============================================================================
// Records written by the customer-service server
// =============================================================================

/// A row of the `DelayNotifications` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DelayNotification {
    pub notification_id: String,
    pub passenger_id: String,
    pub flight_number: String,
    pub delay_minutes: i64,
    pub notification_type: String,
    pub content: String,
    pub status: String,
    pub created_at: String,
    pub sent_at: String,
}

/// A row of the `CustomerSupportSessions` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SupportSession {
    pub session_id: String,
    pub passenger_id: String,
    pub agent_id: String,
    pub issue_type: String,
    pub context: Value,
    pub status: String,
    pub messages: Vec<Value>,
    pub resolution: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

// =============================================================================
// Item conversion
// =============================================================================

/// Deserialize a stored item into a record.
pub fn from_item<T: DeserializeOwned>(item: Item) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(item))?)
}

/// Serialize a record into a storable item.
pub fn to_item<T: Serialize>(record: &T) -> Result<Item> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::InvalidData(format!(
            "Record did not serialize to an object: {}",
            other
        ))),
    }
}
