use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{console, Window};

use crate::commands::Commands;
use crate::joystick::{
    Axis, DragVector, JoystickPad, TimerOp, Transition, STEERING_DECEL_DELAY_MS, UPDATE_DELAY_MS,
};

/// Binds the joystick state machine to the browser: forwards its emissions
/// to the command facade and runs its two timers. Each timer is a singleton
/// interval handle; starting one cancels its predecessor, and `dispose`
/// cancels both.
pub struct JoystickController {
    inner: Rc<ControllerInner>,
}

struct ControllerInner {
    window: Window,
    commands: Commands,
    pad: RefCell<JoystickPad>,
    update_closure: RefCell<Option<Closure<dyn FnMut()>>>,
    update_handle: Cell<Option<i32>>,
    decel_closure: RefCell<Option<Closure<dyn FnMut()>>>,
    decel_handle: Cell<Option<i32>>,
}

impl JoystickController {
    pub fn new(window: Window, commands: Commands) -> Self {
        Self {
            inner: Rc::new(ControllerInner {
                window,
                commands,
                pad: RefCell::new(JoystickPad::new()),
                update_closure: RefCell::new(None),
                update_handle: Cell::new(None),
                decel_closure: RefCell::new(None),
                decel_handle: Cell::new(None),
            }),
        }
    }

    pub fn press(&self, axis: Axis) {
        let transition = self.inner.pad.borrow_mut().press(axis);
        ControllerInner::apply(&self.inner, transition);
    }

    pub fn drag(&self, axis: Axis, drag: &DragVector) {
        let transition = self.inner.pad.borrow_mut().drag(axis, drag);
        ControllerInner::apply(&self.inner, transition);
    }

    pub fn release(&self, axis: Axis) {
        let transition = self.inner.pad.borrow_mut().release(axis);
        ControllerInner::apply(&self.inner, transition);
    }

    /// Cancels both timers. After this no tick can mutate state or emit.
    pub fn dispose(&self) {
        ControllerInner::stop_update(&self.inner);
        ControllerInner::stop_decel(&self.inner);
        *self.inner.update_closure.borrow_mut() = None;
        *self.inner.decel_closure.borrow_mut() = None;
    }
}

impl ControllerInner {
    fn apply(inner: &Rc<ControllerInner>, transition: Transition) {
        for (axis, value) in transition.emit {
            match axis {
                Axis::Throttle => inner.commands.throttle(value),
                Axis::Steering => inner.commands.steering(value),
            }
        }
        for op in transition.timers {
            match op {
                TimerOp::StartUpdate => ControllerInner::start_update(inner),
                TimerOp::StopUpdate => ControllerInner::stop_update(inner),
                TimerOp::StartDecelerate => ControllerInner::start_decel(inner),
                TimerOp::StopDecelerate => ControllerInner::stop_decel(inner),
            }
        }
    }

    fn start_update(inner: &Rc<ControllerInner>) {
        ControllerInner::stop_update(inner);
        let tick_inner = inner.clone();
        let tick = Closure::<dyn FnMut()>::new(move || {
            let transition = tick_inner.pad.borrow().update_tick();
            ControllerInner::apply(&tick_inner, transition);
        });
        match inner
            .window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                tick.as_ref().unchecked_ref(),
                UPDATE_DELAY_MS,
            ) {
            Ok(handle) => {
                inner.update_handle.set(Some(handle));
                *inner.update_closure.borrow_mut() = Some(tick);
            }
            Err(err) => console::error_1(&err),
        }
    }

    fn stop_update(inner: &Rc<ControllerInner>) {
        if let Some(handle) = inner.update_handle.take() {
            inner.window.clear_interval_with_handle(handle);
        }
    }

    fn start_decel(inner: &Rc<ControllerInner>) {
        ControllerInner::stop_decel(inner);
        let tick_inner = inner.clone();
        let tick = Closure::<dyn FnMut()>::new(move || {
            let transition = tick_inner.pad.borrow_mut().decel_tick();
            ControllerInner::apply(&tick_inner, transition);
        });
        match inner
            .window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                tick.as_ref().unchecked_ref(),
                STEERING_DECEL_DELAY_MS,
            ) {
            Ok(handle) => {
                inner.decel_handle.set(Some(handle));
                *inner.decel_closure.borrow_mut() = Some(tick);
            }
            Err(err) => console::error_1(&err),
        }
    }

    // Clears the interval only; the closure stays allocated until the next
    // start or dispose, so a tick that stops its own loop never frees the
    // closure it is running in.
    fn stop_decel(inner: &Rc<ControllerInner>) {
        if let Some(handle) = inner.decel_handle.take() {
            inner.window.clear_interval_with_handle(handle);
        }
    }
}
