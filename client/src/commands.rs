use web_sys::console;

use roverpad_shared::Command;

use crate::channel::Channel;

/// Typed facade the input components push commands through. Every call is
/// one frame on the channel; nothing here waits for an answer.
#[derive(Clone)]
pub struct Commands {
    channel: Channel,
    debug: bool,
}

impl Commands {
    pub fn new(channel: Channel, debug: bool) -> Self {
        Self { channel, debug }
    }

    fn log(&self, message: &str) {
        if self.debug {
            console::log_1(&message.into());
        }
    }

    pub fn steering(&self, value: f64) {
        self.log(&format!("steer {value}"));
        self.channel.send(&Command::Steer { value });
    }

    pub fn throttle(&self, value: f64) {
        self.log(&format!("throttle {value}"));
        self.channel.send(&Command::Throttle { value });
    }

    pub fn start_training_record(&self) {
        self.log("start record");
        self.channel.send(&Command::StartTrainingRecord);
    }

    pub fn end_training_record(&self) {
        self.log("end record");
        self.channel.send(&Command::EndTrainingRecord);
    }

    pub fn engage_pilot(&self) {
        self.log("engage pilot");
        self.channel.send(&Command::EngagePilot);
    }

    pub fn disengage_pilot(&self) {
        self.log("disengage pilot");
        self.channel.send(&Command::DisengagePilot);
    }

    pub fn send_chat_message(&self, message: String) {
        self.log(&format!("chat {message:?}"));
        self.channel.send(&Command::SendMessage { message });
    }

    pub fn rename(&self, name: String) {
        self.channel.send(&Command::Rename { value: name });
    }

    pub fn request_user_list(&self) {
        self.channel.send(&Command::RequestUserList);
    }

    pub fn request_vehicle_stats(&self) {
        self.channel.send(&Command::RequestVehicleStats);
    }
}
