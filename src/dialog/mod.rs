//! Spoken-dialogue building blocks: canned phrases, answer intents, the
//! speaker and the bounded retry loop.

pub mod intent;
pub mod retry;
pub mod speaker;

pub use intent::Intent;
pub use retry::retry;
pub use speaker::Speaker;

/// Everything the kiosk ever says. The wording is the kiosk's established
/// voice, grammar quirks included; do not polish it.
pub mod phrases {
    use chrono::{DateTime, Local};

    /// Spoken once at startup, before the first visit.
    pub const STARTUP: &str = "Hello, please come in front of the camera.";

    /// Openers picked at random when someone steps in front of the camera.
    pub const INTROS: &[&str] = &[
        "Excuse-me ?",
        "Com'on",
        "Hello !",
        "I don't see you very well",
    ];

    pub const REPROMPT: &str = "Sorry, could you repeat please ?";

    pub fn hello(name: &str) -> String {
        format!("Hello {name} !")
    }

    pub const NO_MESSAGES: &str = "You have no new message.";

    pub fn inbox_question(pending: usize) -> String {
        format!("You have {pending} new messages, do you want listen them ?")
    }

    /// Announced before each playback, replays included.
    pub fn message_header(sender: &str, deposited_at: &DateTime<Local>) -> String {
        format!(
            "This is a message record a {sender} at {}",
            deposited_at.format("%H:%M")
        )
    }

    pub const REPLAY_QUESTION: &str = "Do you want play it again ?";
    pub const INBOX_DONE: &str = "End of the new message, thank you.";

    pub const LEAVE_QUESTION: &str = "Do you want record a new message ?";
    pub const DECLINE_FAREWELL: &str = "Alright, have a good day, see you soon.";
    pub const RECIPIENT_QUESTION: &str = "Who is the recipient ?";
    pub const RECORD_PROMPT: &str =
        "You can start to leave your message and finalize it by stop.";
    pub const RECORD_ABANDONED: &str = "I did not hear anything, please come back later.";
    pub const RECORD_REPLAY: &str = "Now, I play the recorded message:";
    pub const KEEP_QUESTION: &str = "Is the message correct ?";

    pub fn saved_to(recipient: &str) -> String {
        format!("The new message is now saved to {recipient}.")
    }

    pub const RECORD_FAREWELL: &str = "Alright, thank you and see you soon.";
}
