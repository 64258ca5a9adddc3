use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, Event, MessageEvent, WebSocket};

use roverpad_shared::{Command, ServerEvent};

/// One socket event, already lifted out of the browser callback world.
#[derive(Debug)]
pub enum WsEvent {
    Open,
    Message(ServerEvent),
    Invalid(String),
    Closed { code: u16 },
    Errored,
}

/// Owns one live websocket. The attached closures are leaked (`forget`), so
/// tearing the socket down means clearing its handler slots; after `detach`
/// nothing can call back into the process through this socket.
pub struct SocketHandle {
    socket: WebSocket,
}

impl SocketHandle {
    pub fn is_open(&self) -> bool {
        self.socket.ready_state() == WebSocket::OPEN
    }

    pub fn send(&self, command: &Command) {
        if !self.is_open() {
            return;
        }
        if let Ok(frame) = serde_json::to_string(command) {
            let _ = self.socket.send_with_str(&frame);
        }
    }

    pub fn detach(&self) {
        self.socket.set_onopen(None);
        self.socket.set_onmessage(None);
        self.socket.set_onclose(None);
        self.socket.set_onerror(None);
    }

    /// Close failures (e.g. an already-closed socket) are logged and
    /// swallowed.
    pub fn close(&self) {
        if let Err(err) = self.socket.close() {
            web_sys::console::log_1(&format!("Error when disconnect {err:?}").into());
        }
    }
}

pub fn open_socket(
    url: &str,
    on_event: impl 'static + FnMut(WsEvent),
) -> Result<SocketHandle, JsValue> {
    let socket = WebSocket::new(url)?;
    let on_event = Rc::new(RefCell::new(on_event));

    {
        let on_event = on_event.clone();
        let onopen = Closure::<dyn FnMut(Event)>::new(move |_| {
            on_event.borrow_mut()(WsEvent::Open);
        });
        socket.set_onopen(Some(onopen.as_ref().unchecked_ref()));
        onopen.forget();
    }

    {
        let on_event = on_event.clone();
        let onmessage = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
            let Some(text) = event.data().as_string() else {
                web_sys::console::error_1(&"WS frame is not text".into());
                on_event.borrow_mut()(WsEvent::Invalid("non-text frame".to_string()));
                return;
            };
            match serde_json::from_str::<ServerEvent>(&text) {
                Ok(message) => on_event.borrow_mut()(WsEvent::Message(message)),
                Err(error) => {
                    let snippet = if text.len() <= 200 {
                        text
                    } else {
                        format!("{}...", &text[..200])
                    };
                    web_sys::console::error_1(
                        &format!("WS frame parse error: {error} payload={snippet:?}").into(),
                    );
                    on_event.borrow_mut()(WsEvent::Invalid(error.to_string()));
                }
            }
        });
        socket.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
        onmessage.forget();
    }

    {
        let on_event = on_event.clone();
        let onclose = Closure::<dyn FnMut(CloseEvent)>::new(move |event: CloseEvent| {
            on_event.borrow_mut()(WsEvent::Closed { code: event.code() });
        });
        socket.set_onclose(Some(onclose.as_ref().unchecked_ref()));
        onclose.forget();
    }

    {
        let on_event = on_event.clone();
        let onerror = Closure::<dyn FnMut(Event)>::new(move |_| {
            on_event.borrow_mut()(WsEvent::Errored);
        });
        socket.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        onerror.forget();
    }

    Ok(SocketHandle { socket })
}
