//! In-memory mailbox: recorded messages keyed by recipient.
//!
//! Messages live only as long as the process; the audio sits in scratch
//! WAV files that vanish when the message is dropped.

use crate::artifact::AudioArtifact;
use chrono::{DateTime, Local};
use std::collections::HashMap;

/// One recorded message. Dropping it deletes the backing WAV.
#[derive(Debug)]
pub struct Message {
    pub sender: Option<String>,
    pub recipient: String,
    pub audio: AudioArtifact,
    pub deposited_at: DateTime<Local>,
}

impl Message {
    pub fn new(sender: Option<String>, recipient: &str, audio: AudioArtifact) -> Self {
        Self {
            sender,
            recipient: recipient.to_string(),
            audio,
            deposited_at: Local::now(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Mailbox {
    messages: HashMap<String, Vec<Message>>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deposit(&mut self, message: Message) {
        self.messages
            .entry(message.recipient.clone())
            .or_default()
            .push(message);
    }

    /// Pending messages for one recipient.
    pub fn count(&self, recipient: &str) -> usize {
        self.messages.get(recipient).map_or(0, Vec::len)
    }

    pub fn total(&self) -> usize {
        self.messages.values().map(Vec::len).sum()
    }

    /// Take the most recently deposited message for this recipient.
    pub fn pop(&mut self, recipient: &str) -> Option<Message> {
        let queue = self.messages.get_mut(recipient)?;
        let message = queue.pop();
        if queue.is_empty() {
            self.messages.remove(recipient);
        }
        message
    }

    /// Drain every pending message for this recipient, newest first.
    pub fn take_all(&mut self, recipient: &str) -> Vec<Message> {
        let mut queue = self.messages.remove(recipient).unwrap_or_default();
        queue.reverse();
        queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message_for(recipient: &str) -> Message {
        let audio = AudioArtifact::create("answerbox-mailbox-test").unwrap();
        std::fs::write(audio.path(), b"RIFFstub").unwrap();
        Message::new(None, recipient, audio)
    }

    #[test]
    fn deposit_then_count() {
        let mut mailbox = Mailbox::new();
        assert_eq!(mailbox.count("Sylvain"), 0);

        mailbox.deposit(message_for("Sylvain"));
        mailbox.deposit(message_for("Sylvain"));
        mailbox.deposit(message_for("Gwennael"));

        assert_eq!(mailbox.count("Sylvain"), 2);
        assert_eq!(mailbox.count("Gwennael"), 1);
        assert_eq!(mailbox.total(), 3);
    }

    #[test]
    fn pop_returns_newest_first() {
        let mut mailbox = Mailbox::new();
        let first = message_for("Sylvain");
        let first_path = first.audio.path().to_path_buf();
        mailbox.deposit(first);
        let second = message_for("Sylvain");
        let second_path = second.audio.path().to_path_buf();
        mailbox.deposit(second);

        assert_eq!(mailbox.pop("Sylvain").unwrap().audio.path(), second_path);
        assert_eq!(mailbox.pop("Sylvain").unwrap().audio.path(), first_path);
        assert!(mailbox.pop("Sylvain").is_none());
        assert_eq!(mailbox.count("Sylvain"), 0);
    }

    #[test]
    fn pop_unknown_recipient_is_none() {
        let mut mailbox = Mailbox::new();
        assert!(mailbox.pop("nobody").is_none());
    }

    #[test]
    fn take_all_drains_newest_first() {
        let mut mailbox = Mailbox::new();
        for _ in 0..3 {
            mailbox.deposit(message_for("Gwennael"));
        }
        let drained = mailbox.take_all("Gwennael");
        assert_eq!(drained.len(), 3);
        assert_eq!(mailbox.count("Gwennael"), 0);

        let stamps: Vec<_> = drained.iter().map(|m| m.deposited_at).collect();
        assert!(stamps.windows(2).all(|pair| pair[0] >= pair[1]));
    }

    #[test]
    fn dropping_a_message_removes_its_audio_file() {
        let mut mailbox = Mailbox::new();
        mailbox.deposit(message_for("Sylvain"));

        let message = mailbox.pop("Sylvain").unwrap();
        let path = message.audio.path().to_path_buf();
        assert!(path.exists());
        drop(message);
        assert!(!path.exists());
    }
}
