//! The conversation loop: watch for a visitor, deliver their messages, take
//! a new one.
//!
//! One cycle is one visit: speak an opener, watch the camera for a known
//! face, then offer the visitor their pending messages (newest first) and a
//! chance to leave one. Every spoken question is asked through the bounded
//! retry loop, and a visitor who stops answering simply ends the flow they
//! were in.

use crate::audio::input::AudioInput;
use crate::dialog::{Intent, Speaker, phrases, retry};
use crate::error::Result;
use crate::face::{FaceIdentifier, FrameSource};
use crate::mailbox::{Mailbox, Message};
use crate::session::WordSession;
use crate::defaults;
use std::thread;
use std::time::Duration;

const IDLE_BACKOFF: Duration = Duration::from_millis(500);

/// Per-question timeouts and attempt budgets.
#[derive(Debug, Clone)]
pub struct DialogTimeouts {
    pub identify: Duration,
    pub confirm: Duration,
    pub confirm_attempts: u32,
    pub recipient: Duration,
    pub recipient_attempts: u32,
    pub message: Duration,
}

impl Default for DialogTimeouts {
    fn default() -> Self {
        Self {
            identify: defaults::IDENTIFY_TIMEOUT,
            confirm: defaults::CONFIRM_TIMEOUT,
            confirm_attempts: defaults::CONFIRM_ATTEMPTS,
            recipient: defaults::RECIPIENT_TIMEOUT,
            recipient_attempts: defaults::RECIPIENT_ATTEMPTS,
            message: defaults::MESSAGE_TIMEOUT,
        }
    }
}

pub struct ConversationController {
    speaker: Speaker,
    /// Yes/no questions.
    confirm: WordSession,
    /// Recipient names.
    names: WordSession,
    /// Message recording, stop-word vocabulary.
    recorder: WordSession,
    identifier: FaceIdentifier,
    input: Box<dyn AudioInput>,
    frames: Box<dyn FrameSource>,
    mailbox: Mailbox,
    timeouts: DialogTimeouts,
}

impl ConversationController {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        speaker: Speaker,
        confirm: WordSession,
        names: WordSession,
        recorder: WordSession,
        identifier: FaceIdentifier,
        input: Box<dyn AudioInput>,
        frames: Box<dyn FrameSource>,
    ) -> Self {
        Self {
            speaker,
            confirm,
            names,
            recorder,
            identifier,
            input,
            frames,
            mailbox: Mailbox::new(),
            timeouts: DialogTimeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: DialogTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    pub fn mailbox_mut(&mut self) -> &mut Mailbox {
        &mut self.mailbox
    }

    /// Run visits forever. A failed cycle is logged, never fatal: the kiosk
    /// must survive a flaky service or camera.
    pub fn run(&mut self) {
        if let Err(e) = self.speaker.say(phrases::STARTUP) {
            eprintln!("answerbox: startup greeting failed: {e}");
        }
        loop {
            match self.run_cycle() {
                Ok(true) => {}
                Ok(false) => thread::sleep(IDLE_BACKOFF),
                Err(e) => {
                    eprintln!("answerbox: conversation cycle failed: {e}");
                    thread::sleep(IDLE_BACKOFF);
                }
            }
        }
    }

    /// One visit: greet, then try to recognize whoever showed up. Returns
    /// false when nobody was recognized within the identification window.
    pub fn run_cycle(&mut self) -> Result<bool> {
        self.speaker.greet()?;

        let visitor = self
            .identifier
            .identify(self.frames.as_mut(), self.timeouts.identify)?;
        let Some(visitor) = visitor else {
            return Ok(false);
        };

        self.speaker.say(&phrases::hello(&visitor))?;
        self.inbox_flow(&visitor)?;
        self.record_flow(&visitor)?;
        Ok(true)
    }

    /// Ask a yes/no question, reprompting between empty attempts.
    fn ask_yes_no(&mut self, question: &str) -> Result<Option<Intent>> {
        self.speaker.say(question)?;
        let Self {
            speaker,
            confirm,
            input,
            timeouts,
            ..
        } = self;
        let answer = retry(
            timeouts.confirm_attempts,
            || confirm.ask(input.as_mut(), timeouts.confirm),
            || speaker.reprompt(),
        )?;
        Ok(answer.map(|label| Intent::from_label(&label)))
    }

    /// Deliver pending messages, newest first. Entering the flow commits the
    /// visitor to hearing every pending message once; only the replay of an
    /// individual message is optional.
    fn inbox_flow(&mut self, visitor: &str) -> Result<()> {
        let pending = self.mailbox.count(visitor);
        if pending == 0 {
            return self.speaker.say(phrases::NO_MESSAGES);
        }

        match self.ask_yes_no(&phrases::inbox_question(pending))? {
            Some(Intent::Affirmative) => {}
            _ => return Ok(()),
        }

        while let Some(message) = self.mailbox.pop(visitor) {
            let sender = message.sender.as_deref().unwrap_or("someone");
            let header = phrases::message_header(sender, &message.deposited_at);
            loop {
                self.speaker.say(&header)?;
                self.speaker.play_artifact(&message.audio)?;
                match self.ask_yes_no(phrases::REPLAY_QUESTION)? {
                    Some(Intent::Affirmative) => {}
                    _ => break,
                }
            }
            // The message and its WAV die here.
        }
        self.speaker.say(phrases::INBOX_DONE)
    }

    /// Offer to record a message for someone else.
    fn record_flow(&mut self, visitor: &str) -> Result<()> {
        match self.ask_yes_no(phrases::LEAVE_QUESTION)? {
            Some(Intent::Affirmative) => {}
            _ => return self.speaker.say(phrases::DECLINE_FAREWELL),
        }

        self.speaker.say(phrases::RECIPIENT_QUESTION)?;
        let recipient = {
            let Self {
                speaker,
                names,
                input,
                timeouts,
                ..
            } = self;
            retry(
                timeouts.recipient_attempts,
                || names.ask(input.as_mut(), timeouts.recipient),
                || speaker.reprompt(),
            )?
        };
        let Some(recipient) = recipient else {
            return self.speaker.say(phrases::RECORD_ABANDONED);
        };

        self.speaker.say(phrases::RECORD_PROMPT)?;
        let recording = self
            .recorder
            .record_until_stop(self.input.as_mut(), self.timeouts.message)?;
        let Some(audio) = recording else {
            return self.speaker.say(phrases::RECORD_ABANDONED);
        };

        self.speaker.say(phrases::RECORD_REPLAY)?;
        self.speaker.play_artifact(&audio)?;

        match self.ask_yes_no(phrases::KEEP_QUESTION)? {
            Some(Intent::Affirmative) => {
                self.speaker.say(&phrases::saved_to(&recipient))?;
                self.mailbox
                    .deposit(Message::new(Some(visitor.to_string()), &recipient, audio));
            }
            // Dropping the recording deletes its WAV.
            _ => drop(audio),
        }
        self.speaker.say(phrases::RECORD_FAREWELL)
    }
}
