use std::cell::RefCell;
use std::rc::Rc;

use web_sys::console;

use roverpad_shared::Command;

use crate::state::{Connection, Event, Level, Notification, Store};
use crate::ws::{open_socket, SocketHandle, WsEvent};

/// Completed reconnect cycles allowed after the initial attempt; continuous
/// failure therefore makes 1 + MAX_RECONNECT_ATTEMPTS socket attempts.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 10;

/// Close code the server sends for an orderly shutdown.
pub const CLOSE_NORMAL: u16 = 1000;

const SHUTDOWN_NOTICE: &str = "Server is shutting down";
const INVALID_FRAME_NOTICE: &str = "Invalid or broken data";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseOutcome {
    Reconnect,
    Shutdown,
    Drop,
}

/// Policy for a socket that has just closed with `code`.
pub fn close_outcome(connection: &Connection, code: u16, max_attempts: u32) -> CloseOutcome {
    if code == CLOSE_NORMAL {
        CloseOutcome::Shutdown
    } else if !connection.server_shutdown && connection.reconnect_attempts < max_attempts {
        CloseOutcome::Reconnect
    } else {
        CloseOutcome::Drop
    }
}

/// The one duplex connection to the control server. Owns at most one live
/// socket; every inbound frame and lifecycle transition is dispatched into
/// the store as a typed event.
#[derive(Clone)]
pub struct Channel {
    inner: Rc<ChannelInner>,
}

struct ChannelInner {
    url: String,
    store: Rc<RefCell<Store>>,
    socket: RefCell<Option<SocketHandle>>,
    debug: bool,
}

impl Channel {
    pub fn new(url: String, store: Rc<RefCell<Store>>, debug: bool) -> Self {
        Self {
            inner: Rc::new(ChannelInner {
                url,
                store,
                socket: RefCell::new(None),
                debug,
            }),
        }
    }

    /// Manual connect. Any prior socket is fully torn down first, so two
    /// live handler sets can never race.
    pub fn connect(&self) {
        self.disconnect();
        self.inner
            .store
            .borrow_mut()
            .dispatch(Event::ConnectRequested);
        ChannelInner::open(&self.inner);
    }

    /// Closes and detaches the live socket, if any. A second call with no
    /// socket left dispatches nothing.
    pub fn disconnect(&self) {
        ChannelInner::teardown(&self.inner);
    }

    /// Sends one command frame if the socket is open; otherwise a silent
    /// no-op (no queueing).
    pub fn send(&self, command: &Command) {
        if let Some(handle) = self.inner.socket.borrow().as_ref() {
            handle.send(command);
        }
    }
}

impl ChannelInner {
    fn open(inner: &Rc<ChannelInner>) {
        let events = inner.clone();
        match open_socket(&inner.url, move |event| ChannelInner::handle(&events, event)) {
            Ok(handle) => *inner.socket.borrow_mut() = Some(handle),
            Err(err) => {
                console::error_1(&err);
                inner.store.borrow_mut().dispatch(Event::Disconnected);
            }
        }
    }

    /// Full teardown: detach, close, report. Dispatches `Disconnected` only
    /// when a socket actually existed.
    fn teardown(inner: &Rc<ChannelInner>) {
        let Some(handle) = inner.socket.borrow_mut().take() else {
            return;
        };
        handle.detach();
        handle.close();
        inner.store.borrow_mut().dispatch(Event::Disconnected);
    }

    /// Silent replacement of a dead socket within one reconnect cycle.
    fn reconnect(inner: &Rc<ChannelInner>) {
        if let Some(stale) = inner.socket.borrow_mut().take() {
            stale.detach();
        }
        inner
            .store
            .borrow_mut()
            .dispatch(Event::ReconnectRequested);
        ChannelInner::open(inner);
    }

    fn handle(inner: &Rc<ChannelInner>, event: WsEvent) {
        match event {
            WsEvent::Open => {
                if inner.debug {
                    console::log_1(&format!("WS open {}", inner.url).into());
                }
                inner.store.borrow_mut().dispatch(Event::Connected);
            }
            WsEvent::Message(message) => {
                if inner.debug {
                    console::log_1(&format!("WS message {message:?}").into());
                }
                inner.store.borrow_mut().dispatch(Event::Server(message));
            }
            WsEvent::Invalid(error) => {
                // Already logged at the socket layer; surface it locally and
                // keep the connection open.
                let _ = error;
                inner
                    .store
                    .borrow_mut()
                    .dispatch(Event::NotificationAdded(Notification {
                        level: Level::Warning,
                        content: INVALID_FRAME_NOTICE.to_string(),
                    }));
            }
            WsEvent::Errored => {
                // The browser always follows a failed connection with a
                // close event; that close drives the retry policy.
                console::warn_1(&format!("WS error {}", inner.url).into());
            }
            WsEvent::Closed { code } => {
                if inner.debug {
                    console::log_1(&format!("WS close code={code}").into());
                }
                let outcome = {
                    let store = inner.store.borrow();
                    close_outcome(&store.state().connection, code, MAX_RECONNECT_ATTEMPTS)
                };
                match outcome {
                    CloseOutcome::Reconnect => ChannelInner::reconnect(inner),
                    CloseOutcome::Shutdown => {
                        {
                            let mut store = inner.store.borrow_mut();
                            store.dispatch(Event::NotificationAdded(Notification {
                                level: Level::Danger,
                                content: SHUTDOWN_NOTICE.to_string(),
                            }));
                            store.dispatch(Event::ServerShutdown);
                        }
                        ChannelInner::teardown(inner);
                    }
                    CloseOutcome::Drop => ChannelInner::teardown(inner),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::state::{reduce, Event, State, Status};

    use super::{close_outcome, CloseOutcome};

    #[test]
    fn abnormal_close_retries_and_counts() {
        let mut state = State::default();
        reduce(&mut state, Event::ConnectRequested);

        assert_eq!(
            close_outcome(&state.connection, 1006, 3),
            CloseOutcome::Reconnect
        );
        reduce(&mut state, Event::ReconnectRequested);
        assert_eq!(state.connection.reconnect_attempts, 1);
        assert_eq!(state.connection.status, Status::Connecting);
    }

    #[test]
    fn continuous_failures_make_exactly_one_plus_n_attempts() {
        let max = 3;
        let mut state = State::default();
        let mut attempts = 0u32;

        reduce(&mut state, Event::ConnectRequested);
        attempts += 1;
        loop {
            match close_outcome(&state.connection, 1006, max) {
                CloseOutcome::Reconnect => {
                    reduce(&mut state, Event::ReconnectRequested);
                    attempts += 1;
                }
                outcome => {
                    assert_eq!(outcome, CloseOutcome::Drop);
                    reduce(&mut state, Event::Disconnected);
                    break;
                }
            }
        }

        assert_eq!(attempts, max + 1);
        assert_eq!(state.connection.status, Status::Disconnected);
    }

    #[test]
    fn normal_close_is_terminal() {
        let mut state = State::default();
        reduce(&mut state, Event::ConnectRequested);
        reduce(&mut state, Event::Connected);

        assert_eq!(
            close_outcome(&state.connection, 1000, 3),
            CloseOutcome::Shutdown
        );
        reduce(&mut state, Event::ServerShutdown);

        // Even with retry budget left, a shut-down server is not retried.
        assert_eq!(close_outcome(&state.connection, 1006, 3), CloseOutcome::Drop);
    }

    #[test]
    fn successful_open_restores_the_retry_budget() {
        let mut state = State::default();
        reduce(&mut state, Event::ConnectRequested);
        for _ in 0..3 {
            assert_eq!(
                close_outcome(&state.connection, 1006, 3),
                CloseOutcome::Reconnect
            );
            reduce(&mut state, Event::ReconnectRequested);
        }
        assert_eq!(close_outcome(&state.connection, 1006, 3), CloseOutcome::Drop);

        reduce(&mut state, Event::Connected);
        assert_eq!(
            close_outcome(&state.connection, 1006, 3),
            CloseOutcome::Reconnect
        );
    }

    #[test]
    fn manual_connect_leaves_the_shutdown_state() {
        let mut state = State::default();
        reduce(&mut state, Event::ServerShutdown);
        assert_eq!(close_outcome(&state.connection, 1006, 3), CloseOutcome::Drop);

        reduce(&mut state, Event::ConnectRequested);
        assert!(!state.connection.server_shutdown);
        assert_eq!(
            close_outcome(&state.connection, 1006, 3),
            CloseOutcome::Reconnect
        );
    }
}
