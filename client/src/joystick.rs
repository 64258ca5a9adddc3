//! Dual-axis joystick state machine: drag vectors in, bounded control
//! values and timer directives out. Scheduling lives in `controller`.

pub const UPDATE_DELAY_MS: i32 = 100;
pub const STEERING_DECEL_DELAY_MS: i32 = 50;
/// Drag force at or below this reads as a neutral stick.
pub const STEERING_ZERO_THRESHOLD: f64 = 0.05;
pub const STEERING_DECEL_STEP: f64 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Throttle,
    Steering,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Heading {
    Up,
    Down,
    Left,
    Right,
}

impl Heading {
    pub fn parse(value: &str) -> Option<Heading> {
        match value {
            "up" => Some(Heading::Up),
            "down" => Some(Heading::Down),
            "left" => Some(Heading::Left),
            "right" => Some(Heading::Right),
            _ => None,
        }
    }
}

/// Raw drag sample from a virtual joystick widget: force magnitude plus the
/// dominant heading per dimension (absent while the stick is centered).
#[derive(Clone, Copy, Debug, Default)]
pub struct DragVector {
    pub force: f64,
    pub heading_x: Option<Heading>,
    pub heading_y: Option<Heading>,
}

/// Converts one drag sample to a control value in [-1, 1]. Forces at or
/// below the threshold, or samples with no heading at all, read as 0.
pub fn convert(drag: &DragVector, positive: Heading, zero_threshold: f64) -> f64 {
    if drag.force <= zero_threshold || (drag.heading_x.is_none() && drag.heading_y.is_none()) {
        return 0.0;
    }
    let sign = if drag.heading_x == Some(positive) || drag.heading_y == Some(positive) {
        1.0
    } else {
        -1.0
    };
    sign * drag.force.min(1.0)
}

fn positive_heading(axis: Axis) -> Heading {
    match axis {
        Axis::Throttle => Heading::Up,
        Axis::Steering => Heading::Right,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerOp {
    StartUpdate,
    StopUpdate,
    StartDecelerate,
    StopDecelerate,
}

/// What one input event asks of the outside world: values to emit, timers
/// to start or stop.
#[derive(Debug, Default, PartialEq)]
pub struct Transition {
    pub emit: Vec<(Axis, f64)>,
    pub timers: Vec<TimerOp>,
}

#[derive(Debug, Default)]
pub struct JoystickPad {
    throttle: f64,
    steering: f64,
    throttle_held: bool,
    steering_held: bool,
    decelerating: bool,
}

impl JoystickPad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn throttle(&self) -> f64 {
        self.throttle
    }

    pub fn steering(&self) -> f64 {
        self.steering
    }

    pub fn decelerating(&self) -> bool {
        self.decelerating
    }

    fn any_held(&self) -> bool {
        self.throttle_held || self.steering_held
    }

    fn value(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Throttle => self.throttle,
            Axis::Steering => self.steering,
        }
    }

    /// Stick pressed. Starts the re-emission interval with the first held
    /// axis and cancels a running steering deceleration.
    pub fn press(&mut self, axis: Axis) -> Transition {
        let mut transition = Transition::default();
        let first = !self.any_held();
        match axis {
            Axis::Throttle => self.throttle_held = true,
            Axis::Steering => {
                self.steering_held = true;
                if self.decelerating {
                    self.decelerating = false;
                    transition.timers.push(TimerOp::StopDecelerate);
                }
            }
        }
        if first {
            transition.timers.push(TimerOp::StartUpdate);
        }
        transition.emit.push((axis, self.value(axis)));
        transition
    }

    /// Drag sample while pressed: convert, track, emit immediately.
    pub fn drag(&mut self, axis: Axis, drag: &DragVector) -> Transition {
        let value = convert(drag, positive_heading(axis), STEERING_ZERO_THRESHOLD);
        match axis {
            Axis::Throttle => self.throttle = value,
            Axis::Steering => self.steering = value,
        }
        Transition {
            emit: vec![(axis, value)],
            timers: Vec::new(),
        }
    }

    /// Stick released. Throttle snaps to 0; steering keeps its value and
    /// ramps down through the deceleration loop. The re-emission interval
    /// stops once no stick is held (a decelerating stick counts as
    /// released).
    pub fn release(&mut self, axis: Axis) -> Transition {
        let mut transition = Transition::default();
        match axis {
            Axis::Throttle => {
                self.throttle_held = false;
                self.throttle = 0.0;
                transition.emit.push((Axis::Throttle, 0.0));
            }
            Axis::Steering => {
                self.steering_held = false;
                self.decelerating = true;
                transition.emit.push((Axis::Steering, self.steering));
                transition.timers.push(TimerOp::StartDecelerate);
            }
        }
        if !self.any_held() {
            transition.timers.push(TimerOp::StopUpdate);
        }
        transition
    }

    /// One deceleration tick: step the steering magnitude toward zero,
    /// never overshooting. The final tick forces exactly 0 and stops the
    /// loop.
    pub fn decel_tick(&mut self) -> Transition {
        let mut transition = Transition::default();
        if !self.decelerating {
            return transition;
        }
        if self.steering.abs() - STEERING_DECEL_STEP > 0.0 {
            self.steering = if self.steering > 0.0 {
                self.steering - STEERING_DECEL_STEP
            } else {
                self.steering + STEERING_DECEL_STEP
            };
            transition.emit.push((Axis::Steering, self.steering));
        } else {
            self.steering = 0.0;
            self.decelerating = false;
            transition.emit.push((Axis::Steering, 0.0));
            transition.timers.push(TimerOp::StopDecelerate);
        }
        transition
    }

    /// One re-emission tick: repeat the current value of every held axis so
    /// the receiving side never starves while a stick is parked.
    pub fn update_tick(&self) -> Transition {
        let mut transition = Transition::default();
        if self.throttle_held {
            transition.emit.push((Axis::Throttle, self.throttle));
        }
        if self.steering_held {
            transition.emit.push((Axis::Steering, self.steering));
        }
        transition
    }
}
