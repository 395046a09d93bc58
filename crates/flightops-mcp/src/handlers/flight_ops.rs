//! Flight-operations tools: delay lookup, alternative flights, affected
//! passengers and the connectivity check.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use flightops_core::types::from_item;
use flightops_core::{
    Booking, Filter, Flight, Item, Passenger, QueryRequest, ScanRequest, Store, TableNames, Tier,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{check_connection, parse_args, pretty, render, require, ToolError, ToolHandler, ToolOutcome};
use crate::protocol::{ToolCallResult, ToolDefinition};
use crate::tools::flight_ops_tools;

/// Placeholder passengers-per-flight figure for the affected estimate.
const PASSENGERS_PER_FLIGHT: usize = 150;

const MAX_ALTERNATIVES: usize = 5;

const FLIGHT_INDEX: &str = "FlightIndex";

fn default_airport() -> String {
    "FRA".to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Severity {
    Minor,
    Major,
    Severe,
    #[default]
    All,
}

impl Severity {
    fn as_str(self) -> &'static str {
        match self {
            Severity::Minor => "minor",
            Severity::Major => "major",
            Severity::Severe => "severe",
            Severity::All => "all",
        }
    }

    /// Whether a genuinely delayed flight falls in this bucket.
    fn includes(self, flight: &Flight) -> bool {
        let minutes = flight.delay_minutes;
        let grounded = flight.is_cancelled_or_diverted();
        match self {
            Severity::Minor => !grounded && (30..=60).contains(&minutes),
            Severity::Major => !grounded && minutes > 60 && minutes <= 120,
            Severity::Severe => grounded || minutes > 120,
            Severity::All => flight.is_delayed(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct FlightDelaysArgs {
    #[serde(default = "default_airport")]
    airport: String,
    #[serde(default)]
    severity: Severity,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AlternativeFlightsArgs {
    #[serde(default)]
    origin: String,
    #[serde(default)]
    destination: String,
    #[serde(default)]
    passenger_tier: Tier,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AffectedPassengersArgs {
    #[serde(default)]
    flight_number: String,
    departure_date: Option<String>,
}

/// A flight-operations tool call with its typed arguments.
#[derive(Debug)]
pub(crate) enum FlightOpsTool {
    GetFlightDelays(FlightDelaysArgs),
    FindAlternativeFlights(AlternativeFlightsArgs),
    GetAffectedPassengers(AffectedPassengersArgs),
    TestConnection,
}

impl FlightOpsTool {
    pub(crate) fn parse(name: &str, arguments: Option<Value>) -> Result<Self, ToolError> {
        match name {
            "get_flight_delays" => Ok(Self::GetFlightDelays(parse_args(name, arguments)?)),
            "find_alternative_flights" => {
                Ok(Self::FindAlternativeFlights(parse_args(name, arguments)?))
            }
            "get_affected_passengers" => {
                Ok(Self::GetAffectedPassengers(parse_args(name, arguments)?))
            }
            "test_connection" => Ok(Self::TestConnection),
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }
}

#[derive(Debug, Serialize)]
struct DelayedFlight {
    flight_number: String,
    departure_date: String,
    origin: String,
    destination: String,
    status: String,
    delay_minutes: i64,
    delay_reason: Option<String>,
    scheduled_departure: Option<String>,
    estimated_departure: Option<String>,
    aircraft_type: Option<String>,
}

impl From<Flight> for DelayedFlight {
    fn from(flight: Flight) -> Self {
        Self {
            flight_number: flight.flight_number,
            departure_date: flight.departure_date,
            origin: flight.origin,
            destination: flight.destination,
            status: flight.status,
            delay_minutes: flight.delay_minutes,
            delay_reason: flight.delay_reason,
            scheduled_departure: flight.scheduled_departure,
            estimated_departure: flight.estimated_departure,
            aircraft_type: flight.aircraft_type,
        }
    }
}

#[derive(Debug, Serialize)]
struct DelayReport {
    airport: String,
    severity: &'static str,
    delayed_flights_count: usize,
    estimated_affected_passengers: usize,
    flights: Vec<DelayedFlight>,
}

#[derive(Debug, Serialize)]
struct AlternativeFlight {
    flight_number: String,
    departure_date: String,
    scheduled_departure: Option<String>,
    status: String,
    available_seats: Option<i64>,
    aircraft_type: Option<String>,
    recommendation: &'static str,
}

#[derive(Debug, Serialize)]
struct AlternativesReport {
    origin: String,
    destination: String,
    passenger_tier: String,
    alternatives_count: usize,
    alternatives: Vec<AlternativeFlight>,
}

#[derive(Debug, Serialize)]
struct AffectedPassenger {
    passenger_id: String,
    name: String,
    tier: String,
    booking_reference: String,
    seat_number: Option<String>,
    class: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Serialize)]
struct AffectedReport {
    flight_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    departure_date: Option<String>,
    affected_passengers_count: usize,
    passengers: Vec<AffectedPassenger>,
}

fn recommendation(tier: &Tier) -> &'static str {
    match tier {
        Tier::Senator => "Priority rebooking with complimentary upgrade and lounge access",
        Tier::FrequentTraveler => "Preferred seating and priority boarding on the new flight",
        Tier::Regular | Tier::Unknown(_) => "Standard rebooking at no additional cost",
    }
}

/// Earliest scheduled departure first; flights without one go last.
fn by_departure(a: &Flight, b: &Flight) -> Ordering {
    match (&a.scheduled_departure, &b.scheduled_departure) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn flights_from(items: Vec<Item>) -> Vec<Flight> {
    items
        .into_iter()
        .filter_map(|item| match from_item::<Flight>(item) {
            Ok(flight) => Some(flight),
            Err(e) => {
                warn!(error = %e, "Skipping malformed flight record");
                None
            }
        })
        .collect()
}

/// Handler for the flight-operations server.
pub struct FlightOpsHandler {
    store: Arc<dyn Store>,
    tables: TableNames,
}

impl FlightOpsHandler {
    pub fn new(store: Arc<dyn Store>, tables: TableNames) -> Self {
        Self { store, tables }
    }

    async fn run(&self, tool: FlightOpsTool) -> ToolOutcome {
        match tool {
            FlightOpsTool::GetFlightDelays(args) => self.flight_delays(args).await,
            FlightOpsTool::FindAlternativeFlights(args) => self.alternative_flights(args).await,
            FlightOpsTool::GetAffectedPassengers(args) => self.affected_passengers(args).await,
            FlightOpsTool::TestConnection => {
                let tables = [
                    self.tables.flights.clone(),
                    self.tables.passengers.clone(),
                    self.tables.bookings.clone(),
                ];
                check_connection(&self.store, &tables).await
            }
        }
    }

    async fn flight_delays(&self, args: FlightDelaysArgs) -> ToolOutcome {
        let airport = args.airport.trim().to_string();

        // Status casing varies between rows, so the delay test runs here
        // rather than as a store filter.
        let output = self
            .store
            .scan(ScanRequest::new(self.tables.flights.as_str()))
            .await
            .map_err(|e| ToolError::store("retrieving flight delays", self.store.as_ref(), e))?;
        debug!(count = output.count, scanned = output.scanned_count, "Delay scan complete");

        let flights: Vec<DelayedFlight> = flights_from(output.items)
            .into_iter()
            .filter(Flight::is_delayed)
            .filter(|f| airport.is_empty() || f.origin.eq_ignore_ascii_case(&airport))
            .filter(|f| args.severity.includes(f))
            .map(DelayedFlight::from)
            .collect();

        let location = if airport.is_empty() {
            "any airport".to_string()
        } else {
            airport.to_ascii_uppercase()
        };

        if flights.is_empty() {
            return Err(ToolError::NotFound(format!(
                "No delayed flights found at {} for severity '{}'.",
                location,
                args.severity.as_str()
            )));
        }

        let report = DelayReport {
            airport: location.clone(),
            severity: args.severity.as_str(),
            delayed_flights_count: flights.len(),
            estimated_affected_passengers: flights.len() * PASSENGERS_PER_FLIGHT,
            flights,
        };
        Ok(format!(
            "Found {} delayed flight(s) at {} (severity: {})\n\n{}",
            report.delayed_flights_count,
            location,
            report.severity,
            pretty(&report)?
        ))
    }

    async fn alternative_flights(&self, args: AlternativeFlightsArgs) -> ToolOutcome {
        const TOOL: &str = "find_alternative_flights";
        require(TOOL, "origin", &args.origin)?;
        require(TOOL, "destination", &args.destination)?;

        let origin = args.origin.trim().to_ascii_uppercase();
        let destination = args.destination.trim().to_ascii_uppercase();
        let filter = Filter::And(vec![
            Filter::eq("Origin", origin.as_str()),
            Filter::eq("Destination", destination.as_str()),
        ]);

        let output = self
            .store
            .scan(ScanRequest::new(self.tables.flights.as_str()).with_filter(filter))
            .await
            .map_err(|e| {
                ToolError::store("searching alternative flights", self.store.as_ref(), e)
            })?;

        let mut flights: Vec<Flight> = flights_from(output.items)
            .into_iter()
            .filter(Flight::is_bookable)
            .collect();
        flights.sort_by(by_departure);
        flights.truncate(MAX_ALTERNATIVES);

        if flights.is_empty() {
            return Err(ToolError::NotFound(format!(
                "No alternative flights found from {} to {}.",
                origin, destination
            )));
        }

        let advice = recommendation(&args.passenger_tier);
        let alternatives: Vec<AlternativeFlight> = flights
            .into_iter()
            .map(|f| AlternativeFlight {
                flight_number: f.flight_number,
                departure_date: f.departure_date,
                scheduled_departure: f.scheduled_departure,
                status: f.status,
                available_seats: f.available_seats,
                aircraft_type: f.aircraft_type,
                recommendation: advice,
            })
            .collect();

        let report = AlternativesReport {
            origin: origin.clone(),
            destination: destination.clone(),
            passenger_tier: args.passenger_tier.as_str().to_string(),
            alternatives_count: alternatives.len(),
            alternatives,
        };
        Ok(format!(
            "Found {} alternative flight(s) from {} to {}\n\n{}",
            report.alternatives_count,
            origin,
            destination,
            pretty(&report)?
        ))
    }

    /// Fetch the passenger behind a booking. Failures are logged and dropped.
    async fn passenger_for(&self, booking: &Booking) -> Option<Passenger> {
        let mut key = Item::new();
        key.insert("PassengerId".into(), booking.passenger_id.clone().into());
        key.insert("BookingReference".into(), booking.booking_reference.clone().into());

        match self.store.get_item(&self.tables.passengers, key).await {
            Ok(Some(item)) => match from_item::<Passenger>(item) {
                Ok(passenger) => Some(passenger),
                Err(e) => {
                    warn!(passenger = booking.passenger_id.as_str(), error = %e, "Malformed passenger record");
                    None
                }
            },
            Ok(None) => {
                warn!(
                    passenger = booking.passenger_id.as_str(),
                    booking = booking.booking_reference.as_str(),
                    "Passenger for booking not found"
                );
                None
            }
            Err(e) => {
                warn!(passenger = booking.passenger_id.as_str(), error = %e, "Passenger lookup failed");
                None
            }
        }
    }

    async fn affected_passengers(&self, args: AffectedPassengersArgs) -> ToolOutcome {
        require("get_affected_passengers", "flight_number", &args.flight_number)?;
        let flight_number = args.flight_number.trim().to_string();
        let departure_date = args
            .departure_date
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let mut query = QueryRequest::new(self.tables.bookings.as_str())
            .on_index(FLIGHT_INDEX)
            .key_eq("FlightNumber", flight_number.as_str());
        if let Some(date) = &departure_date {
            query = query.key_eq("DepartureDate", date.as_str());
        }

        let items = self
            .store
            .query(query)
            .await
            .map_err(|e| ToolError::store("retrieving affected passengers", self.store.as_ref(), e))?;

        if items.is_empty() {
            return Err(ToolError::NotFound(format!(
                "No bookings found for flight {}.",
                flight_number
            )));
        }

        let mut affected = Vec::with_capacity(items.len());
        for item in items {
            let booking = match from_item::<Booking>(item) {
                Ok(booking) => booking,
                Err(e) => {
                    warn!(error = %e, "Skipping malformed booking record");
                    continue;
                }
            };
            if let Some(passenger) = self.passenger_for(&booking).await {
                affected.push((passenger, booking));
            }
        }

        // sort_by is stable: equal tiers keep booking order
        affected.sort_by(|(a, _), (b, _)| b.tier().rank().cmp(&a.tier().rank()));

        let passengers: Vec<AffectedPassenger> = affected
            .into_iter()
            .map(|(passenger, booking)| {
                let tier = match passenger.tier() {
                    Tier::Unknown(raw) if raw.is_empty() => "unknown".to_string(),
                    tier => tier.as_str().to_string(),
                };
                AffectedPassenger {
                    name: passenger.full_name(),
                    passenger_id: passenger.passenger_id,
                    tier,
                    booking_reference: booking.booking_reference,
                    seat_number: booking.seat_number,
                    class: booking.class,
                    email: passenger.email,
                }
            })
            .collect();

        let report = AffectedReport {
            flight_number: flight_number.clone(),
            departure_date,
            affected_passengers_count: passengers.len(),
            passengers,
        };
        Ok(format!(
            "Found {} affected passenger(s) on flight {}\n\n{}",
            report.affected_passengers_count,
            flight_number,
            pretty(&report)?
        ))
    }
}

#[async_trait]
impl ToolHandler for FlightOpsHandler {
    fn server_name(&self) -> &'static str {
        "flight-ops"
    }

    fn available_tools(&self) -> Vec<ToolDefinition> {
        flight_ops_tools()
    }

    async fn execute(&self, name: &str, arguments: Option<Value>) -> ToolCallResult {
        info!(tool = name, "Executing flight-ops tool");
        let outcome = match FlightOpsTool::parse(name, arguments) {
            Ok(tool) => self.run(tool).await,
            Err(e) => Err(e),
        };
        render(outcome)
    }
}
