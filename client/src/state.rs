use std::collections::HashMap;

use serde::Serialize;

use roverpad_shared::{ServerEvent, User};

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Warning,
    Danger,
}

impl Level {
    pub fn parse(value: &str) -> Option<Level> {
        match value {
            "info" => Some(Level::Info),
            "warning" => Some(Level::Warning),
            "danger" => Some(Level::Danger),
            _ => None,
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Notification {
    pub level: Level,
    pub content: String,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Connection {
    pub status: Status,
    pub reconnect_attempts: u32,
    pub server_shutdown: bool,
}

impl Default for Connection {
    fn default() -> Self {
        Self {
            status: Status::Disconnected,
            reconnect_attempts: 0,
            server_shutdown: false,
        }
    }
}

/// Process-wide state. Mutated only through `reduce`; everything else reads
/// via projection.
#[derive(Serialize, Clone, Debug, Default)]
pub struct State {
    pub connection: Connection,
    pub notifications: Vec<Notification>,
    pub chat: Vec<String>,
    pub telemetry: HashMap<String, f64>,
    pub users: Vec<User>,
}

/// Everything that can change the state: channel lifecycle transitions,
/// local notification actions, and server-originated messages.
#[derive(Debug)]
pub enum Event {
    ConnectRequested,
    ReconnectRequested,
    Connected,
    Disconnected,
    ServerShutdown,
    NotificationAdded(Notification),
    NotificationsCleared,
    Server(ServerEvent),
}

pub fn reduce(state: &mut State, event: Event) {
    match event {
        Event::ConnectRequested => {
            state.connection.status = Status::Connecting;
            state.connection.reconnect_attempts = 0;
            state.connection.server_shutdown = false;
        }
        Event::ReconnectRequested => {
            state.connection.status = Status::Connecting;
            state.connection.reconnect_attempts += 1;
        }
        Event::Connected => {
            state.connection.status = Status::Connected;
            state.connection.reconnect_attempts = 0;
        }
        Event::Disconnected => {
            state.connection.status = Status::Disconnected;
        }
        Event::ServerShutdown => {
            state.connection.server_shutdown = true;
        }
        Event::NotificationAdded(notification) => {
            state.notifications.push(notification);
        }
        Event::NotificationsCleared => {
            state.notifications.clear();
        }
        Event::Server(event) => reduce_server(state, event),
    }
}

fn reduce_server(state: &mut State, event: ServerEvent) {
    match event {
        ServerEvent::ChatMessage { user, message } => {
            state.chat.push(format!("{}: {}", user.name, message));
        }
        ServerEvent::VehicleStats { vehicle_stats } => {
            // Key-wise upsert. Metrics reported as null are not yet measured
            // and leave any previous reading in place.
            for (metric, value) in vehicle_stats {
                if let Some(value) = value {
                    state.telemetry.insert(metric, value);
                }
            }
        }
        ServerEvent::UserConnected { users, .. }
        | ServerEvent::UserDisconnected { users, .. }
        | ServerEvent::UserRenamed { users, .. }
        | ServerEvent::UserList { users } => {
            state.users = users;
        }
        ServerEvent::Unknown => {}
    }
}

#[derive(Default)]
pub struct Store {
    state: State,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch(&mut self, event: Event) {
        reduce(&mut self.state, event);
    }

    pub fn state(&self) -> &State {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use roverpad_shared::{ServerEvent, User};

    use super::{reduce, Event, Level, Notification, State, Status};

    fn user(id: &str, name: &str) -> User {
        User {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn notifications_append_and_bulk_clear() {
        let mut state = State::default();
        reduce(
            &mut state,
            Event::NotificationAdded(Notification {
                level: Level::Info,
                content: "recording".to_string(),
            }),
        );
        reduce(
            &mut state,
            Event::NotificationAdded(Notification {
                level: Level::Danger,
                content: "server is shutting down".to_string(),
            }),
        );
        assert_eq!(state.notifications.len(), 2);
        assert_eq!(state.notifications[0].content, "recording");

        reduce(&mut state, Event::NotificationsCleared);
        assert!(state.notifications.is_empty());
    }

    #[test]
    fn chat_appends_formatted_server_echo() {
        let mut state = State::default();
        reduce(
            &mut state,
            Event::Server(ServerEvent::ChatMessage {
                user: user("u1", "User 1"),
                message: "turn left ahead".to_string(),
            }),
        );
        assert_eq!(state.chat, vec!["User 1: turn left ahead".to_string()]);
    }

    #[test]
    fn telemetry_merges_instead_of_replacing() {
        let mut state = State::default();
        let mut stats = HashMap::new();
        stats.insert("pilot/throttle".to_string(), Some(0.4));
        stats.insert("pilot/steering".to_string(), Some(-0.1));
        reduce(
            &mut state,
            Event::Server(ServerEvent::VehicleStats {
                vehicle_stats: stats,
            }),
        );

        let mut update = HashMap::new();
        update.insert("pilot/throttle".to_string(), Some(0.5));
        update.insert("pilot/steering".to_string(), None);
        reduce(
            &mut state,
            Event::Server(ServerEvent::VehicleStats {
                vehicle_stats: update,
            }),
        );

        assert_eq!(state.telemetry["pilot/throttle"], 0.5);
        // The null update left the previous reading alone.
        assert_eq!(state.telemetry["pilot/steering"], -0.1);
    }

    #[test]
    fn roster_tracks_the_latest_server_snapshot() {
        let mut state = State::default();
        reduce(
            &mut state,
            Event::Server(ServerEvent::UserConnected {
                user: user("u2", "User 2"),
                users: vec![user("u1", "User 1"), user("u2", "User 2")],
            }),
        );
        assert_eq!(state.users.len(), 2);

        reduce(
            &mut state,
            Event::Server(ServerEvent::UserDisconnected {
                user: user("u1", "User 1"),
                users: vec![user("u2", "User 2")],
            }),
        );
        assert_eq!(state.users, vec![user("u2", "User 2")]);
    }

    #[test]
    fn connect_request_resets_the_reconnect_cycle() {
        let mut state = State::default();
        reduce(&mut state, Event::ReconnectRequested);
        reduce(&mut state, Event::ReconnectRequested);
        reduce(&mut state, Event::ServerShutdown);
        assert_eq!(state.connection.reconnect_attempts, 2);
        assert!(state.connection.server_shutdown);

        reduce(&mut state, Event::ConnectRequested);
        assert_eq!(state.connection.status, Status::Connecting);
        assert_eq!(state.connection.reconnect_attempts, 0);
        assert!(!state.connection.server_shutdown);
    }

    #[test]
    fn successful_open_resets_the_attempt_counter() {
        let mut state = State::default();
        reduce(&mut state, Event::ConnectRequested);
        reduce(&mut state, Event::ReconnectRequested);
        reduce(&mut state, Event::Connected);
        assert_eq!(state.connection.status, Status::Connected);
        assert_eq!(state.connection.reconnect_attempts, 0);
    }

    #[test]
    fn unknown_server_actions_change_nothing() {
        let mut state = State::default();
        reduce(&mut state, Event::Server(ServerEvent::Unknown));
        assert!(state.notifications.is_empty());
        assert!(state.chat.is_empty());
        assert!(state.telemetry.is_empty());
        assert_eq!(state.connection.status, Status::Disconnected);
    }
}
