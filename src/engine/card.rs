//! Cards: quests, effects, traits and tasks attached to the player.
//!
//! A [`CardDef`] is the registered template; a [`Card`] is the held
//! instance, carrying only its id, kind and mutable fields. Templates
//! drive the whole lifecycle: duplicate policy, replacement and
//! subsumption lists, and the hooks that fire as cards come and go.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::engine::errors::EngineError;
use crate::engine::script::{HookFn, Params, ReminderFn, TimeHookFn};
use crate::engine::state::Game;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    Quest,
    Effect,
    Trait,
    Task,
}

impl CardKind {
    pub fn label(self) -> &'static str {
        match self {
            CardKind::Quest => "quest",
            CardKind::Effect => "effect",
            CardKind::Trait => "trait",
            CardKind::Task => "task",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CardDef {
    pub id: String,
    pub kind: CardKind,
    pub name: String,
    pub description: String,
    /// Whether several instances may be held at once.
    pub allow_multiple: bool,
    /// Card ids removed silently when this card is added.
    pub replaces: Vec<String>,
    /// Card ids whose presence blocks this card, and whose presence at
    /// removal time suppresses the removal notice.
    pub subsumed_by: Vec<String>,
    pub on_added: Option<HookFn>,
    pub on_removed: Option<HookFn>,
    /// Fires when game time advances while the card is held.
    pub on_time: Option<TimeHookFn>,
    /// Fires at the end of every action while the card is held.
    pub after_update: Option<HookFn>,
    /// Contributes to derived stats on every recompute.
    pub calc_stats: Option<HookFn>,
    /// Journal reminder lines.
    pub reminders: Option<ReminderFn>,
}

impl CardDef {
    pub fn new(id: impl Into<String>, kind: CardKind, name: impl Into<String>) -> Self {
        CardDef {
            id: id.into(),
            kind,
            name: name.into(),
            description: String::new(),
            allow_multiple: false,
            replaces: Vec::new(),
            subsumed_by: Vec::new(),
            on_added: None,
            on_removed: None,
            on_time: None,
            after_update: None,
            calc_stats: None,
            reminders: None,
        }
    }

    pub fn with_description(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }

    pub fn with_multiple(mut self) -> Self {
        self.allow_multiple = true;
        self
    }

    pub fn with_replaces<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.replaces = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_subsumed_by<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subsumed_by = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_added(mut self, f: HookFn) -> Self {
        self.on_added = Some(f);
        self
    }

    pub fn with_removed(mut self, f: HookFn) -> Self {
        self.on_removed = Some(f);
        self
    }

    pub fn with_time(mut self, f: TimeHookFn) -> Self {
        self.on_time = Some(f);
        self
    }

    pub fn with_update(mut self, f: HookFn) -> Self {
        self.after_update = Some(f);
        self
    }

    pub fn with_stats(mut self, f: HookFn) -> Self {
        self.calc_stats = Some(f);
        self
    }

    pub fn with_reminders(mut self, f: ReminderFn) -> Self {
        self.reminders = Some(f);
        self
    }
}

/// A held card instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub kind: CardKind,
    #[serde(default, skip_serializing_if = "Params::is_empty")]
    pub fields: Params,
}

impl Card {
    pub fn new(id: impl Into<String>, kind: CardKind) -> Self {
        Card {
            id: id.into(),
            kind,
            fields: Params::new(),
        }
    }

    pub fn field(&self, key: &str) -> Option<&JsonValue> {
        self.fields.get(key)
    }

    pub fn set_field(&mut self, key: impl Into<String>, value: impl Into<JsonValue>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn completed(&self) -> bool {
        self.field("completed").and_then(JsonValue::as_bool) == Some(true)
    }
}

fn added_notice(def: &CardDef) -> String {
    match def.kind {
        CardKind::Quest => format!("New quest: {}", def.name),
        CardKind::Task => format!("New task: {}", def.name),
        CardKind::Effect => format!("You are now {}", def.name),
        CardKind::Trait => format!("Trait gained: {}", def.name),
    }
}

fn removed_notice(def: &CardDef) -> String {
    match def.kind {
        CardKind::Quest => format!("Quest over: {}", def.name),
        CardKind::Task => format!("Task closed: {}", def.name),
        CardKind::Effect => format!("No longer {}", def.name),
        CardKind::Trait => format!("Trait lost: {}", def.name),
    }
}

fn completed_notice(def: &CardDef) -> String {
    match def.kind {
        CardKind::Quest => format!("Quest complete: {}", def.name),
        _ => format!("Completed: {}", def.name),
    }
}

impl Game {
    /// Adds a card by template id. Returns whether an instance was
    /// actually appended.
    ///
    /// Duplicates (without `allow_multiple`) and cards whose subsuming
    /// card is already held report `false` without side effects. Cards
    /// named in the template's `replaces` list are removed silently
    /// first. Unless `silent`, the template's `on_added` hook runs, or
    /// a default notice is posted when it has none.
    pub fn add_card(&mut self, id: &str, extra: Params, silent: bool) -> Result<bool, EngineError> {
        let def = self.content().card_def(id)?.clone();

        if !def.allow_multiple && self.player.has_card(id) {
            return Ok(false);
        }
        if def.subsumed_by.iter().any(|s| self.player.has_card(s)) {
            log::debug!("card '{}' subsumed, not added", id);
            return Ok(false);
        }
        for replaced in &def.replaces {
            self.remove_card(replaced, true)?;
        }

        let mut card = Card::new(id, def.kind);
        for (key, value) in extra {
            card.fields.insert(key, value);
        }
        self.player.cards.push(card);
        log::debug!("card '{}' added", id);

        if !silent {
            if let Some(f) = def.on_added {
                f(self, id)?;
            } else {
                self.notice(def.kind, added_notice(&def));
            }
        }
        Ok(true)
    }

    /// Short form of [`add_card`](Game::add_card) with no extra fields.
    pub fn gain_card(&mut self, id: &str) -> Result<bool, EngineError> {
        self.add_card(id, Params::new(), false)
    }

    /// Removes the first held instance of `id`. Returns whether one was
    /// found.
    ///
    /// The notice (custom `on_removed` hook or default) is suppressed
    /// when `silent` or when a subsuming card is still held, since the
    /// stronger card already tells the story. Derived stats are
    /// recomputed either way.
    pub fn remove_card(&mut self, id: &str, silent: bool) -> Result<bool, EngineError> {
        let Some(pos) = self.player.cards.iter().position(|c| c.id == id) else {
            return Ok(false);
        };
        let def = self.content().card_def(id)?.clone();
        self.player.cards.remove(pos);
        log::debug!("card '{}' removed", id);

        let subsumed = def.subsumed_by.iter().any(|s| self.player.has_card(s));
        if !silent && !subsumed {
            if let Some(f) = def.on_removed {
                f(self, id)?;
            } else {
                self.notice(def.kind, removed_notice(&def));
            }
        }
        self.recompute_stats()?;
        Ok(true)
    }

    /// Marks a held quest card completed, exactly once. The card stays
    /// in hand as a record; reminders and hooks can check
    /// [`Card::completed`].
    pub fn complete_quest(&mut self, id: &str) -> Result<bool, EngineError> {
        let def = self.content().card_def(id)?.clone();
        let Some(card) = self.player.card_mut(id) else {
            return Ok(false);
        };
        if card.completed() {
            return Ok(false);
        }
        card.set_field("completed", true);
        log::debug!("quest '{}' completed", id);
        self.notice(def.kind, completed_notice(&def));
        Ok(true)
    }

    /// Rebuilds derived stats from base values plus every held card's
    /// `calc_stats` contribution. Hooks observe the order cards were
    /// gained in; a hook that removes cards only affects contributions
    /// not yet applied.
    pub fn recompute_stats(&mut self) -> Result<(), EngineError> {
        self.player.derived = self.player.base.clone();
        let held: Vec<String> = self.player.cards.iter().map(|c| c.id.clone()).collect();
        for id in held {
            if !self.player.has_card(&id) {
                continue;
            }
            let hook = self.content().card_def(&id)?.calc_stats;
            if let Some(f) = hook {
                f(self, &id)?;
            }
        }
        Ok(())
    }

    /// Adds `delta` to a derived stat, creating it at the base value
    /// (or zero) first. The usual body of a `calc_stats` hook.
    pub fn adjust_stat(&mut self, name: &str, delta: f64) {
        let base = self.player.base.get(name).copied().unwrap_or(0.0);
        let entry = self.player.derived.entry(name.to_string()).or_insert(base);
        *entry += delta;
    }

    /// Journal reminder lines across all held cards, in hand order.
    pub fn reminders(&self) -> Result<Vec<String>, EngineError> {
        let mut lines = Vec::new();
        for card in &self.player.cards {
            let hook = self.content().card_def(&card.id)?.reminders;
            if let Some(f) = hook {
                lines.extend(f(self, card));
            }
        }
        Ok(lines)
    }
}
