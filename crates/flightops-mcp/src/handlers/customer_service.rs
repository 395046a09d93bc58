//! Customer-service tools: passenger messaging, rebooking and escalation
//! plans, and the notification/session records they leave behind.

use std::sync::Arc;

use async_trait::async_trait;
use flightops_core::types::{from_item, to_item};
use flightops_core::{
    DelayNotification, Passenger, QueryRequest, Store, SupportSession, TableNames, Tier,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::{
    check_connection, generate_id, parse_args, pretty, render, require, timestamp, ToolError,
    ToolHandler, ToolOutcome,
};
use crate::protocol::{ToolCallResult, ToolDefinition};
use crate::tools::customer_service_tools;

/// Fare difference above which a rebooking needs an agent's sign-off.
const APPROVAL_THRESHOLD: f64 = 500.0;

const DEFAULT_AGENT: &str = "AI_ASSISTANT";
const DEFAULT_ISSUE: &str = "flight_disruption";

const RECOMMENDED_ACTIONS: [&str; 4] = [
    "Send the message through the passenger's preferred channel",
    "Offer the listed alternative flights for rebooking",
    "Keep monitoring the flight status for further changes",
    "Follow up if the passenger has not responded within 30 minutes",
];

/// Requested message tone. Echoed back; wording depends only on the tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub(crate) enum Tone {
    #[default]
    Empathetic,
    Professional,
    Apologetic,
    Other(String),
}

impl From<String> for Tone {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "empathetic" => Tone::Empathetic,
            "professional" => Tone::Professional,
            "apologetic" => Tone::Apologetic,
            _ => Tone::Other(raw),
        }
    }
}

impl From<Tone> for String {
    fn from(tone: Tone) -> Self {
        match tone {
            Tone::Empathetic => "empathetic".to_string(),
            Tone::Professional => "professional".to_string(),
            Tone::Apologetic => "apologetic".to_string(),
            Tone::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DelayInfo {
    #[serde(default)]
    flight_number: String,
    delay_reason: Option<String>,
    delay_minutes: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProactiveMessageArgs {
    #[serde(default)]
    passenger_id: String,
    delay_info: DelayInfo,
    #[serde(default)]
    tone: Tone,
    #[serde(default)]
    alternatives: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SelectedAlternative {
    flight_number: String,
    departure_time: Option<String>,
    #[serde(default)]
    fare_difference: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RebookingArgs {
    #[serde(default)]
    passenger_id: String,
    selected_alternative: SelectedAlternative,
    #[serde(default)]
    additional_services: Vec<String>,
}

/// Kind of issue handed to a human agent. Unrecognized values are kept.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub(crate) enum IssueComplexity {
    SimpleRebooking,
    ComplexItinerary,
    CompensationRequired,
    VipHandling,
    Other(String),
}

impl From<String> for IssueComplexity {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "simple_rebooking" => Self::SimpleRebooking,
            "complex_itinerary" => Self::ComplexItinerary,
            "compensation_required" => Self::CompensationRequired,
            "vip_handling" => Self::VipHandling,
            _ => Self::Other(raw),
        }
    }
}

impl IssueComplexity {
    fn as_str(&self) -> &str {
        match self {
            Self::SimpleRebooking => "simple_rebooking",
            Self::ComplexItinerary => "complex_itinerary",
            Self::CompensationRequired => "compensation_required",
            Self::VipHandling => "vip_handling",
            Self::Other(raw) => raw,
        }
    }

    fn priority(&self) -> &'static str {
        match self {
            Self::VipHandling => "HIGH",
            Self::CompensationRequired => "MEDIUM",
            _ => "NORMAL",
        }
    }

    fn agent_type(&self) -> &'static str {
        match self {
            Self::SimpleRebooking => "Rebooking Agent",
            Self::ComplexItinerary => "Senior Travel Agent",
            Self::CompensationRequired => "Compensation Specialist",
            Self::VipHandling => "Senior VIP Agent",
            Self::Other(_) => "General Support Agent",
        }
    }

    fn handoff_reason(&self) -> &'static str {
        match self {
            Self::SimpleRebooking => "Passenger needs rebooking help beyond the automated options",
            Self::ComplexItinerary => "Multi-segment itinerary requires manual rebooking",
            Self::CompensationRequired => "Passenger may be entitled to delay compensation",
            Self::VipHandling => "VIP passenger requires personal handling",
            Self::Other(_) => "Issue requires review by a human agent",
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct EscalationArgs {
    #[serde(default)]
    passenger_id: String,
    issue_complexity: IssueComplexity,
    #[serde(default)]
    conversation_history: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NotificationArgs {
    #[serde(default)]
    passenger_id: String,
    #[serde(default)]
    flight_number: String,
    delay_minutes: i64,
    notification_type: Option<String>,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SupportSessionArgs {
    #[serde(default)]
    passenger_id: String,
    agent_id: Option<String>,
    issue_type: Option<String>,
    #[serde(default)]
    context: Option<Value>,
}

/// A customer-service tool call with its typed arguments.
#[derive(Debug)]
pub(crate) enum CustomerServiceTool {
    GenerateProactiveMessage(ProactiveMessageArgs),
    CreateRebookingWorkflow(RebookingArgs),
    EscalationHandoff(EscalationArgs),
    CreateDelayNotification(NotificationArgs),
    StartSupportSession(SupportSessionArgs),
    TestConnection,
}

impl CustomerServiceTool {
    pub(crate) fn parse(name: &str, arguments: Option<Value>) -> Result<Self, ToolError> {
        let tool = match name {
            "generate_proactive_message" => {
                Self::GenerateProactiveMessage(parse_args(name, arguments)?)
            }
            "create_rebooking_workflow" => Self::CreateRebookingWorkflow(parse_args(name, arguments)?),
            "escalation_handoff" => Self::EscalationHandoff(parse_args(name, arguments)?),
            "create_delay_notification" => {
                Self::CreateDelayNotification(parse_args(name, arguments)?)
            }
            "start_support_session" => Self::StartSupportSession(parse_args(name, arguments)?),
            "test_connection" => Self::TestConnection,
            other => return Err(ToolError::UnknownTool(other.to_string())),
        };
        Ok(tool)
    }
}

#[derive(Debug, Serialize)]
struct ProactiveMessage {
    passenger_id: String,
    passenger_name: String,
    tier: String,
    template: &'static str,
    tone: Tone,
    preferred_language: Option<String>,
    message: String,
    alternatives_offered: usize,
    recommended_actions: [&'static str; 4],
}

#[derive(Debug, Serialize)]
struct WorkflowStep {
    step: u8,
    action: &'static str,
    description: String,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct RebookingWorkflow {
    workflow_id: String,
    passenger_id: String,
    selected_flight: String,
    departure_time: Option<String>,
    fare_difference: f64,
    requires_agent_approval: bool,
    steps: Vec<WorkflowStep>,
    created_at: String,
}

#[derive(Debug, Serialize)]
struct EscalationHandoff {
    escalation_id: String,
    passenger_id: String,
    issue_complexity: String,
    priority: &'static str,
    recommended_agent_type: &'static str,
    handoff_reason: &'static str,
    conversation_length: usize,
    conversation_history: Vec<Value>,
    created_at: String,
}

fn delay_message(passenger: &Passenger, info: &DelayInfo, alternatives: usize) -> (&'static str, String) {
    let name = match passenger.full_name() {
        name if name.is_empty() => "Valued Customer".to_string(),
        name => name,
    };
    let delay = info
        .delay_minutes
        .map(|m| format!("{} minutes", m))
        .unwrap_or_else(|| "an undetermined time".to_string());
    let reason = info.delay_reason.as_deref().unwrap_or("operational reasons");
    let options = match alternatives {
        0 => String::new(),
        n => format!(" We have already identified {} alternative flight(s) for you.", n),
    };

    if passenger.tier() == Tier::Senator {
        let message = format!(
            "Dear {}, as one of our most valued Senator members we want to inform you personally \
             that flight {} is delayed by {} due to {}. Your dedicated Senator service team has \
             reserved priority rebooking and complimentary lounge access for you.{} Please let us \
             know how you would like to proceed.",
            name, info.flight_number, delay, reason, options
        );
        ("senator", message)
    } else {
        let message = format!(
            "Dear {}, we regret to inform you that flight {} is delayed by {} due to {}. We are \
             working to minimize the disruption and will keep you updated.{} We apologize for the \
             inconvenience.",
            name, info.flight_number, delay, reason, options
        );
        ("standard", message)
    }
}

fn rebooking_steps(args: &RebookingArgs) -> Vec<WorkflowStep> {
    let flight = &args.selected_alternative.flight_number;
    let services = if args.additional_services.is_empty() {
        "No additional services requested".to_string()
    } else {
        format!("Add services: {}", args.additional_services.join(", "))
    };

    [
        ("cancel_original_booking", "Cancel the disrupted booking".to_string()),
        ("book_alternative_flight", format!("Book passenger on flight {}", flight)),
        ("assign_seat", format!("Assign a seat on flight {}", flight)),
        ("add_services", services),
        ("send_confirmation", "Send the updated itinerary to the passenger".to_string()),
    ]
    .into_iter()
    .zip(1u8..)
    .map(|((action, description), step)| WorkflowStep {
        step,
        action,
        description,
        status: "pending",
    })
    .collect()
}

/// Handler for the customer-service server.
pub struct CustomerServiceHandler {
    store: Arc<dyn Store>,
    tables: TableNames,
}

impl CustomerServiceHandler {
    pub fn new(store: Arc<dyn Store>, tables: TableNames) -> Self {
        Self { store, tables }
    }

    async fn run(&self, tool: CustomerServiceTool) -> ToolOutcome {
        match tool {
            CustomerServiceTool::GenerateProactiveMessage(args) => {
                self.proactive_message(args).await
            }
            CustomerServiceTool::CreateRebookingWorkflow(args) => rebooking_workflow(args),
            CustomerServiceTool::EscalationHandoff(args) => escalation_handoff(args),
            CustomerServiceTool::CreateDelayNotification(args) => {
                self.delay_notification(args).await
            }
            CustomerServiceTool::StartSupportSession(args) => self.support_session(args).await,
            CustomerServiceTool::TestConnection => {
                let tables = [
                    self.tables.passengers.clone(),
                    self.tables.delay_notifications.clone(),
                    self.tables.support_sessions.clone(),
                    self.tables.rebooking_options.clone(),
                    self.tables.passenger_preferences.clone(),
                ];
                check_connection(&self.store, &tables).await
            }
        }
    }

    async fn proactive_message(&self, args: ProactiveMessageArgs) -> ToolOutcome {
        require("generate_proactive_message", "passenger_id", &args.passenger_id)?;
        let passenger_id = args.passenger_id.trim();

        let items = self
            .store
            .query(QueryRequest::new(self.tables.passengers.as_str()).key_eq("PassengerId", passenger_id))
            .await
            .map_err(|e| ToolError::store("generating proactive message", self.store.as_ref(), e))?;

        let Some(item) = items.into_iter().next() else {
            return Err(ToolError::NotFound(format!("Passenger {} not found", passenger_id)));
        };
        let passenger: Passenger = from_item(item)
            .map_err(|e| ToolError::store("generating proactive message", self.store.as_ref(), e))?;

        let (template, message) = delay_message(&passenger, &args.delay_info, args.alternatives.len());
        let result = ProactiveMessage {
            passenger_id: passenger_id.to_string(),
            passenger_name: passenger.full_name(),
            tier: passenger.tier().as_str().to_string(),
            template,
            tone: args.tone,
            preferred_language: passenger.preferred_language.clone(),
            message,
            alternatives_offered: args.alternatives.len(),
            recommended_actions: RECOMMENDED_ACTIONS,
        };
        Ok(format!("Proactive message for passenger {}\n\n{}", passenger_id, pretty(&result)?))
    }

    async fn delay_notification(&self, args: NotificationArgs) -> ToolOutcome {
        const TOOL: &str = "create_delay_notification";
        require(TOOL, "passenger_id", &args.passenger_id)?;
        require(TOOL, "flight_number", &args.flight_number)?;

        let now = timestamp();
        let content = args.content.unwrap_or_else(|| {
            format!(
                "Your flight {} is delayed by {} minutes. We apologize for the inconvenience.",
                args.flight_number, args.delay_minutes
            )
        });
        let notification = DelayNotification {
            notification_id: generate_id("NOTIFY"),
            passenger_id: args.passenger_id,
            flight_number: args.flight_number,
            delay_minutes: args.delay_minutes,
            notification_type: args.notification_type.unwrap_or_else(|| "email".to_string()),
            content,
            status: "sent".to_string(),
            created_at: now.clone(),
            sent_at: now,
        };

        let item = to_item(&notification).map_err(|e| ToolError::Internal(e.to_string()))?;
        self.store
            .put_item(&self.tables.delay_notifications, item)
            .await
            .map_err(|e| ToolError::store("creating delay notification", self.store.as_ref(), e))?;
        info!(id = notification.notification_id.as_str(), "Delay notification recorded");

        Ok(format!("Delay notification created\n\n{}", pretty(&notification)?))
    }

    async fn support_session(&self, args: SupportSessionArgs) -> ToolOutcome {
        require("start_support_session", "passenger_id", &args.passenger_id)?;

        let now = timestamp();
        let session = SupportSession {
            session_id: generate_id("SESSION"),
            passenger_id: args.passenger_id,
            agent_id: args.agent_id.unwrap_or_else(|| DEFAULT_AGENT.to_string()),
            issue_type: args.issue_type.unwrap_or_else(|| DEFAULT_ISSUE.to_string()),
            context: args.context.unwrap_or_else(|| Value::Object(Default::default())),
            status: "active".to_string(),
            messages: Vec::new(),
            resolution: None,
            created_at: now.clone(),
            updated_at: now,
        };

        let item = to_item(&session).map_err(|e| ToolError::Internal(e.to_string()))?;
        self.store
            .put_item(&self.tables.support_sessions, item)
            .await
            .map_err(|e| ToolError::store("starting support session", self.store.as_ref(), e))?;
        info!(id = session.session_id.as_str(), "Support session started");

        Ok(format!("Support session started\n\n{}", pretty(&session)?))
    }
}

fn rebooking_workflow(args: RebookingArgs) -> ToolOutcome {
    const TOOL: &str = "create_rebooking_workflow";
    require(TOOL, "passenger_id", &args.passenger_id)?;
    require(TOOL, "selected_alternative.flight_number", &args.selected_alternative.flight_number)?;

    let fare_difference = args.selected_alternative.fare_difference;
    let workflow = RebookingWorkflow {
        workflow_id: generate_id("WORKFLOW"),
        steps: rebooking_steps(&args),
        passenger_id: args.passenger_id,
        selected_flight: args.selected_alternative.flight_number,
        departure_time: args.selected_alternative.departure_time,
        fare_difference,
        requires_agent_approval: fare_difference > APPROVAL_THRESHOLD,
        created_at: timestamp(),
    };
    Ok(format!("Rebooking workflow created\n\n{}", pretty(&workflow)?))
}

fn escalation_handoff(args: EscalationArgs) -> ToolOutcome {
    require("escalation_handoff", "passenger_id", &args.passenger_id)?;

    let complexity = &args.issue_complexity;
    let handoff = EscalationHandoff {
        escalation_id: generate_id("ESCALATION"),
        issue_complexity: complexity.as_str().to_string(),
        priority: complexity.priority(),
        recommended_agent_type: complexity.agent_type(),
        handoff_reason: complexity.handoff_reason(),
        conversation_length: args.conversation_history.len(),
        passenger_id: args.passenger_id,
        conversation_history: args.conversation_history,
        created_at: timestamp(),
    };
    Ok(format!("Escalation prepared\n\n{}", pretty(&handoff)?))
}

#[async_trait]
impl ToolHandler for CustomerServiceHandler {
    fn server_name(&self) -> &'static str {
        "customer-service"
    }

    fn available_tools(&self) -> Vec<ToolDefinition> {
        customer_service_tools()
    }

    async fn execute(&self, name: &str, arguments: Option<Value>) -> ToolCallResult {
        info!(tool = name, "Executing customer-service tool");
        let outcome = match CustomerServiceTool::parse(name, arguments) {
            Ok(tool) => self.run(tool).await,
            Err(e) => Err(e),
        };
        render(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::{item, payload, unreachable_store, MockStore};
    use flightops_storage::MemoryStore;
    use serde_json::json;

    fn seeded_store() -> Arc<MemoryStore> {
        let store = MemoryStore::for_tables(&TableNames::default());
        store
            .insert_items(
                "Passengers",
                [
                    item(json!({
                        "PassengerId": "P1",
                        "BookingReference": "ABC123",
                        "FirstName": "Anna",
                        "LastName": "Schmidt",
                        "FrequentFlyerTier": "senator",
                        "PreferredLanguage": "de"
                    })),
                    item(json!({
                        "PassengerId": "P2",
                        "BookingReference": "DEF456",
                        "FirstName": "Ben",
                        "LastName": "Meyer",
                        "FrequentFlyerTier": "frequent_traveler"
                    })),
                    item(json!({
                        "PassengerId": "P3",
                        "BookingReference": "GHI789",
                        "FirstName": "Cara"
                    })),
                ],
            )
            .unwrap();
        Arc::new(store)
    }

    fn handler(store: Arc<dyn Store>) -> CustomerServiceHandler {
        CustomerServiceHandler::new(store, TableNames::default())
    }

    async fn proactive(handler: &CustomerServiceHandler, passenger: &str, tone: &str) -> Value {
        let result = handler
            .execute(
                "generate_proactive_message",
                Some(json!({
                    "passenger_id": passenger,
                    "delay_info": {"flight_number": "LH400", "delay_reason": "weather", "delay_minutes": 95},
                    "tone": tone
                })),
            )
            .await;
        assert!(result.is_error.is_none(), "{}", result.first_text());
        payload(result.first_text())
    }

    #[tokio::test]
    async fn test_senator_template_regardless_of_tone() {
        let handler = handler(seeded_store());

        for tone in ["empathetic", "professional", "apologetic"] {
            let message = proactive(&handler, "P1", tone).await;
            assert_eq!(message["template"], "senator");
            assert_eq!(message["tone"], tone);
            assert!(message["message"].as_str().unwrap().contains("Senator"));
            assert!(message["message"].as_str().unwrap().contains("Anna Schmidt"));
        }
    }

    #[tokio::test]
    async fn test_unlisted_tone_is_echoed() {
        let handler = handler(seeded_store());

        let senator = proactive(&handler, "P1", "friendly").await;
        let frequent = proactive(&handler, "P2", "Professional").await;

        assert_eq!(senator["template"], "senator");
        assert_eq!(senator["tone"], "friendly");
        assert_eq!(frequent["template"], "standard");
        assert_eq!(frequent["tone"], "professional");
    }

    #[tokio::test]
    async fn test_other_tiers_get_standard_template() {
        let handler = handler(seeded_store());

        let frequent = proactive(&handler, "P2", "apologetic").await;
        let missing_tier = proactive(&handler, "P3", "empathetic").await;

        assert_eq!(frequent["template"], "standard");
        assert_eq!(missing_tier["template"], "standard");
        let text = missing_tier["message"].as_str().unwrap();
        assert!(text.contains("LH400"));
        assert!(text.contains("95 minutes"));
        assert!(text.contains("weather"));
        assert!(!text.contains("Senator"));
        assert_eq!(missing_tier["recommended_actions"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_proactive_message_mentions_alternatives() {
        let handler = handler(seeded_store());

        let result = handler
            .execute(
                "generate_proactive_message",
                Some(json!({
                    "passenger_id": "P2",
                    "delay_info": {"flight_number": "LH400"},
                    "alternatives": [{"flight_number": "LH410"}, {"flight_number": "LH412"}]
                })),
            )
            .await;
        let message = payload(result.first_text());

        assert_eq!(message["alternatives_offered"], 2);
        assert!(message["message"].as_str().unwrap().contains("2 alternative flight(s)"));
    }

    #[tokio::test]
    async fn test_unknown_passenger_not_found_without_write() {
        let mut store = MockStore::new();
        store.expect_query().returning(|_| Ok(Vec::new()));
        store.expect_put_item().never();
        let handler = handler(Arc::new(store));

        let result = handler
            .execute(
                "generate_proactive_message",
                Some(json!({"passenger_id": "P404", "delay_info": {"flight_number": "LH1"}})),
            )
            .await;

        assert!(result.is_error.is_none());
        assert_eq!(result.first_text(), "Passenger P404 not found");
    }

    #[tokio::test]
    async fn test_proactive_message_requires_delay_info() {
        let handler = handler(Arc::new(MockStore::new()));

        let result = handler
            .execute("generate_proactive_message", Some(json!({"passenger_id": "P1"})))
            .await;

        assert_eq!(result.is_error, Some(true));
        assert!(result.first_text().contains("delay_info"));
    }

    #[tokio::test]
    async fn test_rebooking_workflow_steps_and_approval() {
        let handler = handler(Arc::new(MockStore::new()));

        let result = handler
            .execute(
                "create_rebooking_workflow",
                Some(json!({
                    "passenger_id": "P1",
                    "selected_alternative": {"flight_number": "LH410", "fare_difference": 650.0},
                    "additional_services": ["meal_voucher", "lounge_access"]
                })),
            )
            .await;
        let workflow = payload(result.first_text());

        assert!(workflow["workflow_id"].as_str().unwrap().starts_with("WORKFLOW_"));
        assert_eq!(workflow["requires_agent_approval"], true);
        let actions: Vec<&str> = workflow["steps"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["action"].as_str().unwrap())
            .collect();
        assert_eq!(
            actions,
            vec![
                "cancel_original_booking",
                "book_alternative_flight",
                "assign_seat",
                "add_services",
                "send_confirmation"
            ]
        );
        assert_eq!(workflow["steps"][4]["step"], 5);
        assert!(workflow["steps"][3]["description"]
            .as_str()
            .unwrap()
            .contains("meal_voucher, lounge_access"));
    }

    #[tokio::test]
    async fn test_rebooking_approval_threshold() {
        let handler = handler(Arc::new(MockStore::new()));

        for (fare, approval) in [(0.0, false), (500.0, false), (500.01, true)] {
            let result = handler
                .execute(
                    "create_rebooking_workflow",
                    Some(json!({
                        "passenger_id": "P1",
                        "selected_alternative": {"flight_number": "LH410", "fare_difference": fare}
                    })),
                )
                .await;
            let workflow = payload(result.first_text());
            assert_eq!(workflow["requires_agent_approval"], approval, "fare {}", fare);
        }

        let result = handler
            .execute(
                "create_rebooking_workflow",
                Some(json!({"passenger_id": "P1", "selected_alternative": {"flight_number": "LH410"}})),
            )
            .await;
        let workflow = payload(result.first_text());
        assert_eq!(workflow["fare_difference"], 0.0);
        assert_eq!(
            workflow["steps"][3]["description"],
            "No additional services requested"
        );
    }

    async fn escalate(handler: &CustomerServiceHandler, complexity: &str) -> Value {
        let result = handler
            .execute(
                "escalation_handoff",
                Some(json!({
                    "passenger_id": "P1",
                    "issue_complexity": complexity,
                    "conversation_history": ["Where is my flight?", "It is delayed."]
                })),
            )
            .await;
        payload(result.first_text())
    }

    #[tokio::test]
    async fn test_escalation_priority_and_agent() {
        let handler = handler(Arc::new(MockStore::new()));

        let vip = escalate(&handler, "vip_handling").await;
        assert_eq!(vip["priority"], "HIGH");
        assert_eq!(vip["recommended_agent_type"], "Senior VIP Agent");
        assert_eq!(vip["conversation_length"], 2);
        assert!(vip["escalation_id"].as_str().unwrap().starts_with("ESCALATION_"));

        let compensation = escalate(&handler, "compensation_required").await;
        assert_eq!(compensation["priority"], "MEDIUM");
        assert_eq!(compensation["recommended_agent_type"], "Compensation Specialist");

        let simple = escalate(&handler, "simple_rebooking").await;
        assert_eq!(simple["priority"], "NORMAL");
        assert_eq!(simple["recommended_agent_type"], "Rebooking Agent");

        let complex = escalate(&handler, "complex_itinerary").await;
        assert_eq!(complex["priority"], "NORMAL");
        assert_eq!(complex["recommended_agent_type"], "Senior Travel Agent");

        let other = escalate(&handler, "lost_baggage").await;
        assert_eq!(other["priority"], "NORMAL");
        assert_eq!(other["recommended_agent_type"], "General Support Agent");
        assert_eq!(other["issue_complexity"], "lost_baggage");
    }

    #[tokio::test]
    async fn test_delay_notification_written_and_echoed() {
        let store = seeded_store();
        let handler = handler(store.clone());

        let result = handler
            .execute(
                "create_delay_notification",
                Some(json!({"passenger_id": "P1", "flight_number": "LH1", "delay_minutes": 45})),
            )
            .await;

        assert!(result.is_error.is_none(), "{}", result.first_text());
        let echoed = payload(result.first_text());
        assert_eq!(echoed["NotificationType"], "email");
        assert_eq!(echoed["Status"], "sent");

        let written = store.items("DelayNotifications");
        assert_eq!(written.len(), 1);
        let record = &written[0];
        assert!(record["NotificationId"].as_str().unwrap().starts_with("NOTIFY_"));
        assert_eq!(record["NotificationId"], echoed["NotificationId"]);
        assert_eq!(record["Status"], "sent");
        assert_eq!(record["DelayMinutes"], 45);
        assert_eq!(
            record["Content"],
            "Your flight LH1 is delayed by 45 minutes. We apologize for the inconvenience."
        );
    }

    #[tokio::test]
    async fn test_delay_notification_ids_are_unique() {
        let store = seeded_store();
        let handler = handler(store.clone());
        let args = json!({
            "passenger_id": "P1",
            "flight_number": "LH1",
            "delay_minutes": 45,
            "notification_type": "sms",
            "content": "Running late"
        });

        handler.execute("create_delay_notification", Some(args.clone())).await;
        handler.execute("create_delay_notification", Some(args)).await;

        let written = store.items("DelayNotifications");
        assert_eq!(written.len(), 2);
        assert_ne!(written[0]["NotificationId"], written[1]["NotificationId"]);
        assert_eq!(written[0]["NotificationType"], "sms");
        assert_eq!(written[0]["Content"], "Running late");
    }

    #[tokio::test]
    async fn test_delay_notification_requires_minutes() {
        let handler = handler(Arc::new(MockStore::new()));

        let result = handler
            .execute(
                "create_delay_notification",
                Some(json!({"passenger_id": "P1", "flight_number": "LH1"})),
            )
            .await;

        assert_eq!(result.is_error, Some(true));
        assert!(result.first_text().contains("delay_minutes"));
    }

    #[tokio::test]
    async fn test_support_session_defaults() {
        let store = seeded_store();
        let handler = handler(store.clone());

        let result = handler
            .execute("start_support_session", Some(json!({"passenger_id": "P2"})))
            .await;
        let echoed = payload(result.first_text());

        assert!(echoed["SessionId"].as_str().unwrap().starts_with("SESSION_"));
        assert_eq!(echoed["AgentId"], "AI_ASSISTANT");
        assert_eq!(echoed["IssueType"], "flight_disruption");
        assert_eq!(echoed["Status"], "active");
        assert_eq!(echoed["Messages"], json!([]));
        assert_eq!(echoed["Resolution"], Value::Null);

        let written = store.items("CustomerSupportSessions");
        assert_eq!(written.len(), 1);
        assert_eq!(written[0]["SessionId"], echoed["SessionId"]);
    }

    #[tokio::test]
    async fn test_support_session_with_context() {
        let store = seeded_store();
        let handler = handler(store.clone());

        handler
            .execute(
                "start_support_session",
                Some(json!({
                    "passenger_id": "P2",
                    "agent_id": "AGENT_7",
                    "issue_type": "compensation",
                    "context": {"flight_number": "LH400"}
                })),
            )
            .await;

        let written = store.items("CustomerSupportSessions");
        assert_eq!(written[0]["AgentId"], "AGENT_7");
        assert_eq!(written[0]["Context"]["flight_number"], "LH400");
    }

    #[tokio::test]
    async fn test_write_failure_is_store_error() {
        let handler = handler(Arc::new(unreachable_store()));

        let result = handler
            .execute("start_support_session", Some(json!({"passenger_id": "P2"})))
            .await;

        assert_eq!(result.is_error, Some(true));
        assert!(result.first_text().starts_with("Error starting support session"));
        assert!(result.first_text().contains("Troubleshooting:"));
    }

    #[tokio::test]
    async fn test_connection_unreachable_reports_tables_and_region() {
        let handler = handler(Arc::new(unreachable_store()));

        let result = handler.execute("test_connection", None).await;

        assert_eq!(result.is_error, Some(true));
        let text = result.first_text();
        assert!(text.contains(
            "Passengers, DelayNotifications, CustomerSupportSessions, RebookingOptions, PassengerPreferences"
        ));
        assert!(text.contains("Region: eu-central-1"));
    }

    #[tokio::test]
    async fn test_connection_against_memory_store() {
        let handler = handler(seeded_store());

        let result = handler.execute("test_connection", None).await;

        assert!(result.is_error.is_none());
        let report = payload(result.first_text());
        assert_eq!(report["tables"].as_array().unwrap().len(), 5);
        assert_eq!(report["tables"][0]["sample_count"], 1);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let handler = handler(Arc::new(MockStore::new()));

        let result = handler.execute("get_flight_delays", None).await;

        assert_eq!(result.first_text(), "Unknown tool: get_flight_delays");
        assert_eq!(result.is_error, Some(true));
    }
}
