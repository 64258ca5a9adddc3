use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::Window;

use crate::channel::Channel;
use crate::commands::Commands;
use crate::controller::JoystickController;
use crate::joystick::{Axis, DragVector, Heading};
use crate::net::websocket_url;
use crate::state::{Event, Level, Notification, Store};

fn debug_enabled(window: &Window) -> bool {
    let search = window.location().search().ok().unwrap_or_default();
    search.contains("debug=1")
        || search.contains("debug=true")
        || search.contains("log=1")
        || search.contains("log=true")
}

fn drag_vector(force: f64, heading_x: Option<String>, heading_y: Option<String>) -> DragVector {
    DragVector {
        force,
        heading_x: heading_x.as_deref().and_then(Heading::parse),
        heading_y: heading_y.as_deref().and_then(Heading::parse),
    }
}

#[wasm_bindgen(start)]
pub fn run() {
    console_error_panic_hook::set_once();
}

/// The control core as seen by the rendering layer: command surface,
/// joystick surface, notification surface, and a JSON projection of the
/// store. Construction wires everything and performs the initial connect.
#[wasm_bindgen]
pub struct App {
    window: Window,
    store: Rc<RefCell<Store>>,
    channel: Channel,
    commands: Commands,
    controller: JoystickController,
    auto_hide_closure: RefCell<Option<Closure<dyn FnMut()>>>,
    auto_hide_handle: Cell<Option<i32>>,
}

#[wasm_bindgen]
impl App {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<App, JsValue> {
        console_error_panic_hook::set_once();
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
        let debug = debug_enabled(&window);
        let url = websocket_url(&window)?;

        let store = Rc::new(RefCell::new(Store::new()));
        let channel = Channel::new(url, store.clone(), debug);
        let commands = Commands::new(channel.clone(), debug);
        let controller = JoystickController::new(window.clone(), commands.clone());
        channel.connect();

        Ok(App {
            window,
            store,
            channel,
            commands,
            controller,
            auto_hide_closure: RefCell::new(None),
            auto_hide_handle: Cell::new(None),
        })
    }

    pub fn connect(&self) {
        self.channel.connect();
    }

    pub fn disconnect(&self) {
        self.channel.disconnect();
    }

    pub fn steer(&self, value: f64) {
        self.commands.steering(value);
    }

    pub fn throttle(&self, value: f64) {
        self.commands.throttle(value);
    }

    pub fn start_training_record(&self) {
        self.commands.start_training_record();
    }

    pub fn end_training_record(&self) {
        self.commands.end_training_record();
    }

    pub fn engage_pilot(&self) {
        self.commands.engage_pilot();
    }

    pub fn disengage_pilot(&self) {
        self.commands.disengage_pilot();
    }

    pub fn send_chat_message(&self, message: String) {
        self.commands.send_chat_message(message);
    }

    pub fn rename(&self, name: String) {
        self.commands.rename(name);
    }

    pub fn request_user_list(&self) {
        self.commands.request_user_list();
    }

    pub fn request_vehicle_stats(&self) {
        self.commands.request_vehicle_stats();
    }

    pub fn throttle_press(&self) {
        self.controller.press(Axis::Throttle);
    }

    pub fn throttle_drag(&self, force: f64, heading_x: Option<String>, heading_y: Option<String>) {
        self.controller
            .drag(Axis::Throttle, &drag_vector(force, heading_x, heading_y));
    }

    pub fn throttle_release(&self) {
        self.controller.release(Axis::Throttle);
    }

    pub fn steering_press(&self) {
        self.controller.press(Axis::Steering);
    }

    pub fn steering_drag(&self, force: f64, heading_x: Option<String>, heading_y: Option<String>) {
        self.controller
            .drag(Axis::Steering, &drag_vector(force, heading_x, heading_y));
    }

    pub fn steering_release(&self) {
        self.controller.release(Axis::Steering);
    }

    pub fn show_notification(
        &self,
        content: String,
        level: Option<String>,
        auto_hide_ms: Option<i32>,
    ) {
        let level = level
            .as_deref()
            .and_then(Level::parse)
            .unwrap_or(Level::Danger);
        self.store
            .borrow_mut()
            .dispatch(Event::NotificationAdded(Notification { level, content }));
        if let Some(delay) = auto_hide_ms {
            self.schedule_auto_hide(delay);
        }
    }

    pub fn clear_notifications(&self) {
        self.store.borrow_mut().dispatch(Event::NotificationsCleared);
    }

    /// Full store state as JSON, for the rendering layer to project.
    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.store.borrow().state())
            .map_err(|error| JsValue::from_str(&error.to_string()))
    }

    /// Tears down timers and the connection; nothing fires afterwards.
    pub fn dispose(&self) {
        self.controller.dispose();
        self.channel.disconnect();
        if let Some(handle) = self.auto_hide_handle.take() {
            self.window.clear_timeout_with_handle(handle);
        }
        *self.auto_hide_closure.borrow_mut() = None;
    }
}

impl App {
    /// One pending auto-hide at a time; scheduling replaces the previous.
    fn schedule_auto_hide(&self, delay: i32) {
        if let Some(handle) = self.auto_hide_handle.take() {
            self.window.clear_timeout_with_handle(handle);
        }
        let store = self.store.clone();
        let hide = Closure::<dyn FnMut()>::new(move || {
            store.borrow_mut().dispatch(Event::NotificationsCleared);
        });
        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                hide.as_ref().unchecked_ref(),
                delay,
            ) {
            Ok(handle) => {
                self.auto_hide_handle.set(Some(handle));
                *self.auto_hide_closure.borrow_mut() = Some(hide);
            }
            Err(err) => web_sys::console::error_1(&err),
        }
    }
}
