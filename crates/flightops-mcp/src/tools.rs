//! MCP tool catalogs, returned verbatim on `tools/list`.

use serde_json::json;

use crate::protocol::ToolDefinition;

fn tool(name: &str, description: &str, input_schema: serde_json::Value) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        input_schema,
    }
}

fn test_connection_tool() -> ToolDefinition {
    tool(
        "test_connection",
        "Check that every table this server uses is reachable and report sample counts",
        json!({
            "type": "object",
            "properties": {}
        }),
    )
}

/// Tools exposed by the flight-operations server.
pub fn flight_ops_tools() -> Vec<ToolDefinition> {
    vec![
        tool(
            "get_flight_delays",
            "List delayed, cancelled or diverted flights departing an airport, bucketed by delay severity",
            json!({
                "type": "object",
                "properties": {
                    "airport": {
                        "type": "string",
                        "description": "Origin airport code (default: FRA, empty string for all airports)"
                    },
                    "severity": {
                        "type": "string",
                        "enum": ["minor", "major", "severe", "all"],
                        "description": "minor: 30-60 min, major: 61-120 min, severe: >120 min or cancelled/diverted (default: all)"
                    }
                }
            }),
        ),
        tool(
            "find_alternative_flights",
            "Find up to 5 on-time or scheduled flights on a route, earliest first, with tier-specific rebooking recommendations",
            json!({
                "type": "object",
                "properties": {
                    "origin": {
                        "type": "string",
                        "description": "Origin airport code"
                    },
                    "destination": {
                        "type": "string",
                        "description": "Destination airport code"
                    },
                    "passenger_tier": {
                        "type": "string",
                        "enum": ["senator", "frequent_traveler", "regular"],
                        "description": "Passenger loyalty tier (default: regular)"
                    }
                },
                "required": ["origin", "destination"]
            }),
        ),
        tool(
            "get_affected_passengers",
            "List passengers booked on a flight, highest loyalty tier first",
            json!({
                "type": "object",
                "properties": {
                    "flight_number": {
                        "type": "string",
                        "description": "Flight number (e.g. LH400)"
                    },
                    "departure_date": {
                        "type": "string",
                        "description": "Departure date (YYYY-MM-DD) to narrow the lookup"
                    }
                },
                "required": ["flight_number"]
            }),
        ),
        test_connection_tool(),
    ]
}

/// Tools exposed by the customer-service server.
pub fn customer_service_tools() -> Vec<ToolDefinition> {
    vec![
        tool(
            "generate_proactive_message",
            "Compose a delay message for a passenger, personalised by loyalty tier",
            json!({
                "type": "object",
                "properties": {
                    "passenger_id": {
                        "type": "string",
                        "description": "Passenger identifier"
                    },
                    "delay_info": {
                        "type": "object",
                        "properties": {
                            "flight_number": { "type": "string" },
                            "delay_reason": { "type": "string" },
                            "delay_minutes": { "type": "integer" }
                        },
                        "required": ["flight_number"]
                    },
                    "tone": {
                        "type": "string",
                        "enum": ["empathetic", "professional", "apologetic"],
                        "description": "Requested tone (default: empathetic); other values are accepted and echoed"
                    },
                    "alternatives": {
                        "type": "array",
                        "items": { "type": "object" },
                        "description": "Alternative flights to mention"
                    }
                },
                "required": ["passenger_id", "delay_info"]
            }),
        ),
        tool(
            "create_rebooking_workflow",
            "Describe the steps to rebook a passenger onto an alternative flight (nothing is executed)",
            json!({
                "type": "object",
                "properties": {
                    "passenger_id": {
                        "type": "string",
                        "description": "Passenger identifier"
                    },
                    "selected_alternative": {
                        "type": "object",
                        "properties": {
                            "flight_number": { "type": "string" },
                            "departure_time": { "type": "string" },
                            "fare_difference": { "type": "number" }
                        },
                        "required": ["flight_number"]
                    },
                    "additional_services": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Services to add (meal voucher, lounge access, hotel...)"
                    }
                },
                "required": ["passenger_id", "selected_alternative"]
            }),
        ),
        tool(
            "escalation_handoff",
            "Prepare a handoff to a human agent with priority and recommended agent type",
            json!({
                "type": "object",
                "properties": {
                    "passenger_id": {
                        "type": "string",
                        "description": "Passenger identifier"
                    },
                    "issue_complexity": {
                        "type": "string",
                        "enum": ["simple_rebooking", "complex_itinerary", "compensation_required", "vip_handling"],
                        "description": "Kind of issue being escalated"
                    },
                    "conversation_history": {
                        "type": "array",
                        "items": {},
                        "description": "Messages exchanged so far"
                    }
                },
                "required": ["passenger_id", "issue_complexity"]
            }),
        ),
        tool(
            "create_delay_notification",
            "Record a delay notification sent to a passenger",
            json!({
                "type": "object",
                "properties": {
                    "passenger_id": { "type": "string" },
                    "flight_number": { "type": "string" },
                    "delay_minutes": { "type": "integer" },
                    "notification_type": {
                        "type": "string",
                        "enum": ["email", "sms", "push"],
                        "description": "Delivery channel (default: email)"
                    },
                    "content": {
                        "type": "string",
                        "description": "Message body (default: generated from flight and delay)"
                    }
                },
                "required": ["passenger_id", "flight_number", "delay_minutes"]
            }),
        ),
        tool(
            "start_support_session",
            "Open a customer support session record for a passenger",
            json!({
                "type": "object",
                "properties": {
                    "passenger_id": { "type": "string" },
                    "agent_id": {
                        "type": "string",
                        "description": "Handling agent (default: AI_ASSISTANT)"
                    },
                    "issue_type": {
                        "type": "string",
                        "description": "Issue category (default: flight_disruption)"
                    },
                    "context": {
                        "type": "object",
                        "description": "Free-form context for the session"
                    }
                },
                "required": ["passenger_id"]
            }),
        ),
        test_connection_tool(),
    ]
}
