//! Chat messages emitted by the tracker.
//!
//! Messages are plain data. Delivering them is the host's job, see
//! [`Notifier`](crate::host::Notifier).

use crate::config::TrackerConfig;
use crate::inventory::{Actor, ActorId, UserId};
use crate::record::{RecoveredAmmo, SpentAmmo};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Notice whispered when a recovery finds nothing left to recover.
pub const ALREADY_RECOVERED_NOTICE: &str = "You already recovered this ammo.";

/// Notice whispered when ammo was spent but too little to get any back.
pub const NOTHING_RECOVERABLE_NOTICE: &str = "Too little ammo was spent to recover any.";

/// Who a message appears to come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker {
    /// A fixed alias, e.g. "Ammo Tracker".
    Alias(String),
    /// An actor speaking in character.
    Actor { id: ActorId, name: String },
}

/// Who can see a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Audience {
    Public,
    /// Visible only to the listed users.
    Whisper(Vec<UserId>),
}

/// An interactive action attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatAction {
    /// Button that recovers spent ammo for one actor.
    RecoverAmmo { actor: ActorId, label: String },
}

impl ChatAction {
    pub fn label(&self) -> &str {
        match self {
            ChatAction::RecoverAmmo { label, .. } => label,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub speaker: Speaker,
    pub audience: Audience,
    pub lines: Vec<String>,
    #[serde(default)]
    pub actions: Vec<ChatAction>,
}

impl ChatMessage {
    /// Message text without actions.
    pub fn content(&self) -> String {
        self.lines.join("\n")
    }

    pub fn is_whisper(&self) -> bool {
        matches!(self.audience, Audience::Whisper(_))
    }
}

impl fmt::Display for ChatMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let speaker = match &self.speaker {
            Speaker::Alias(alias) => alias.as_str(),
            Speaker::Actor { name, .. } => name.as_str(),
        };
        let audience = match self.audience {
            Audience::Public => "",
            Audience::Whisper(_) => " (whisper)",
        };
        writeln!(f, "[{speaker}{audience}]")?;
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        for action in &self.actions {
            writeln!(f, "<{}>", action.label())?;
        }
        Ok(())
    }
}

/// End-of-combat summary whispered to the actor's owners.
pub fn spent_ammo_message(actor: &Actor, spent: &[SpentAmmo], config: &TrackerConfig) -> ChatMessage {
    let mut lines = Vec::with_capacity(spent.len() * 4);
    for (i, ammo) in spent.iter().enumerate() {
        if i > 0 {
            lines.push(config.divider.clone());
        }
        lines.push(format!(
            "{}: {} -> {}",
            ammo.name, ammo.start_quantity, ammo.end_quantity
        ));
        lines.push(format!("Spent: {}", ammo.spent));
        lines.push(format!("Recoverable: {}", ammo.recoverable));
    }

    ChatMessage {
        speaker: Speaker::Alias(config.speaker_alias.clone()),
        audience: Audience::Whisper(actor.owners.clone()),
        lines,
        actions: vec![ChatAction::RecoverAmmo {
            actor: actor.id,
            label: config.recover_label.clone(),
        }],
    }
}

/// Public announcement of a successful recovery, spoken by the actor.
pub fn recovery_message(actor: &Actor, recovered: &[RecoveredAmmo]) -> ChatMessage {
    let mut lines = vec![format!("{} spends a minute recovering ammo", actor.name)];
    lines.extend(
        recovered
            .iter()
            .map(|r| format!("{}x {} recovered", r.amount, r.name)),
    );

    ChatMessage {
        speaker: Speaker::Actor {
            id: actor.id,
            name: actor.name.clone(),
        },
        audience: Audience::Public,
        lines,
        actions: Vec::new(),
    }
}

/// Whisper sent when there is nothing left to recover.
pub fn already_recovered_message(actor: &Actor, config: &TrackerConfig) -> ChatMessage {
    notice(actor, config, ALREADY_RECOVERED_NOTICE)
}

/// Whisper sent when every spent stack rounds down to nothing.
pub fn nothing_recoverable_message(actor: &Actor, config: &TrackerConfig) -> ChatMessage {
    notice(actor, config, NOTHING_RECOVERABLE_NOTICE)
}

fn notice(actor: &Actor, config: &TrackerConfig, text: &str) -> ChatMessage {
    ChatMessage {
        speaker: Speaker::Alias(config.speaker_alias.clone()),
        audience: Audience::Whisper(actor.owners.clone()),
        lines: vec![text.to_string()],
        actions: Vec::new(),
    }
}
