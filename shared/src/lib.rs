use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One connected operator, as reported by the controller process.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
}

/// Client -> server frames. One JSON object per text frame, tagged by the
/// `action` field: `{ ...payload, "action": "<name>" }`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "action")]
pub enum Command {
    #[serde(rename = "vehicle_steer")]
    Steer { value: f64 },
    #[serde(rename = "vehicle_throttle")]
    Throttle { value: f64 },
    #[serde(rename = "training_record_start")]
    StartTrainingRecord,
    #[serde(rename = "training_record_end")]
    EndTrainingRecord,
    #[serde(rename = "pilot_engage_start")]
    EngagePilot,
    #[serde(rename = "pilot_engage_end")]
    DisengagePilot,
    #[serde(rename = "send_message_request")]
    SendMessage { message: String },
    #[serde(rename = "rename_request")]
    Rename { value: String },
    #[serde(rename = "user_list_request")]
    RequestUserList,
    #[serde(rename = "vehicle_stats_request")]
    RequestVehicleStats,
}

/// Server -> client frames, tagged the same way. Metrics the vehicle has not
/// reported yet arrive as JSON `null`, hence the `Option` values. Actions
/// outside this vocabulary deserialize to `Unknown` and fall through every
/// reducer rather than being treated as malformed frames.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "action")]
pub enum ServerEvent {
    #[serde(rename = "send_message_response")]
    ChatMessage { user: User, message: String },
    #[serde(rename = "vehicle_stats_response")]
    VehicleStats {
        vehicle_stats: HashMap<String, Option<f64>>,
    },
    #[serde(rename = "user_connect")]
    UserConnected { user: User, users: Vec<User> },
    #[serde(rename = "user_disconnect")]
    UserDisconnected { user: User, users: Vec<User> },
    #[serde(rename = "rename_response")]
    UserRenamed { user: User, users: Vec<User> },
    #[serde(rename = "user_list_response")]
    UserList { users: Vec<User> },
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_carry_the_action_tag() {
        let frame = serde_json::to_string(&Command::Steer { value: -0.25 }).unwrap();
        assert_eq!(frame, r#"{"action":"vehicle_steer","value":-0.25}"#);

        let frame = serde_json::to_string(&Command::StartTrainingRecord).unwrap();
        assert_eq!(frame, r#"{"action":"training_record_start"}"#);

        let frame = serde_json::to_string(&Command::SendMessage {
            message: "hello".to_string(),
        })
        .unwrap();
        assert_eq!(
            frame,
            r#"{"action":"send_message_request","message":"hello"}"#
        );
    }

    #[test]
    fn chat_echo_parses() {
        let event: ServerEvent = serde_json::from_str(
            r#"{"action":"send_message_response","user":{"id":"u1","name":"User 1"},"message":"hi"}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            ServerEvent::ChatMessage {
                user: User {
                    id: "u1".to_string(),
                    name: "User 1".to_string(),
                },
                message: "hi".to_string(),
            }
        );
    }

    #[test]
    fn null_metrics_parse_as_unreported() {
        let event: ServerEvent = serde_json::from_str(
            r#"{"action":"vehicle_stats_response","vehicle_stats":{"pilot/throttle":0.4,"pilot/steering":null}}"#,
        )
        .unwrap();
        let ServerEvent::VehicleStats { vehicle_stats } = event else {
            panic!("expected vehicle stats");
        };
        assert_eq!(vehicle_stats["pilot/throttle"], Some(0.4));
        assert_eq!(vehicle_stats["pilot/steering"], None);
    }

    #[test]
    fn unknown_actions_fall_through() {
        let event: ServerEvent =
            serde_json::from_str(r#"{"action":"camera_ready","frame":12}"#).unwrap();
        assert_eq!(event, ServerEvent::Unknown);
    }

    #[test]
    fn malformed_frames_do_not_parse() {
        assert!(serde_json::from_str::<ServerEvent>("not valid json").is_err());
        assert!(serde_json::from_str::<ServerEvent>(r#"{"value":1}"#).is_err());
    }
}
