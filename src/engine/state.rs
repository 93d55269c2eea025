//! Live game state and the action loop.
//!
//! [`Game`] owns everything that changes at runtime: the clock, the
//! player, lazily created location and NPC instances, the scene, and
//! the RNG. Content is referenced through a shared [`Content`] registry
//! and never copied into state, so definitions are re-resolved by id on
//! every lookup.
//!
//! The host drives one player input through three phases:
//!
//! 1. [`before_action`](Game::before_action) - refresh presence and
//!    derived stats so scripts observe current values
//! 2. [`take_action`](Game::take_action) - clear the per-action scene
//!    surface, run the action, drain pending pages; resolution errors
//!    are caught here and surfaced as a diagnostic block
//! 3. [`after_action`](Game::after_action) - card update hooks, scene
//!    close check, final stat recompute

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::engine::card::{Card, CardKind};
use crate::engine::errors::EngineError;
use crate::engine::scene::{Block, Choice, Scene, SceneItem};
use crate::engine::script::{Action, Content, Params, Script};
use crate::engine::world::{LocationState, Npc};
use crate::logutil::escape_log;

/// Pages one action may drain before the engine assumes a runaway
/// frame.
const MAX_PAGES_PER_ACTION: u32 = 64;

/// The player: base stats, derived stats, held cards and story flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Player {
    #[serde(default)]
    pub name: String,
    /// Author-set stat baseline.
    #[serde(default)]
    pub base: BTreeMap<String, f64>,
    /// Base plus card contributions; rebuilt, never saved.
    #[serde(skip)]
    pub derived: BTreeMap<String, f64>,
    #[serde(default)]
    pub cards: Vec<Card>,
    /// Free-form story flags.
    #[serde(default, skip_serializing_if = "Params::is_empty")]
    pub flags: Params,
}

impl Player {
    pub fn has_card(&self, id: &str) -> bool {
        self.cards.iter().any(|c| c.id == id)
    }

    pub fn card(&self, id: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == id)
    }

    pub fn card_mut(&mut self, id: &str) -> Option<&mut Card> {
        self.cards.iter_mut().find(|c| c.id == id)
    }

    pub fn cards_of_kind(&self, kind: CardKind) -> impl Iterator<Item = &Card> {
        self.cards.iter().filter(move |c| c.kind == kind)
    }

    /// Current derived stat, falling back to base, then zero.
    pub fn stat(&self, name: &str) -> f64 {
        self.derived
            .get(name)
            .or_else(|| self.base.get(name))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn flag(&self, key: &str) -> Option<&JsonValue> {
        self.flags.get(key)
    }

    pub fn set_flag(&mut self, key: impl Into<String>, value: impl Into<JsonValue>) {
        self.flags.insert(key.into(), value.into());
    }

    pub fn num_flag(&self, key: &str) -> f64 {
        self.flags.get(key).and_then(JsonValue::as_f64).unwrap_or(0.0)
    }

    pub fn bool_flag(&self, key: &str) -> bool {
        self.flags.get(key).and_then(JsonValue::as_bool) == Some(true)
    }

    pub fn bump_flag(&mut self, key: &str, delta: f64) {
        let next = self.num_flag(key) + delta;
        self.flags.insert(key.to_string(), JsonValue::from(next));
    }
}

#[derive(Debug)]
pub struct Game {
    pub(crate) content: Arc<Content>,
    /// Game clock in seconds since the story epoch.
    pub clock: i64,
    /// Current location id.
    pub location: String,
    pub locations: BTreeMap<String, LocationState>,
    pub npcs: BTreeMap<String, Npc>,
    /// Ids of NPC instances at the player's location, sorted. Derived;
    /// refreshed on travel, generation and before each action.
    pub present: Vec<String>,
    pub player: Player,
    pub scene: Scene,
    /// Player preference toggles, persisted with the save.
    pub settings: BTreeMap<String, bool>,
    pub score: i64,
    pub(crate) depth: u32,
    rng: StdRng,
    last_action: Option<DateTime<Utc>>,
}

impl Game {
    pub fn new(content: Arc<Content>, start_location: impl Into<String>) -> Self {
        Game {
            content,
            clock: 0,
            location: start_location.into(),
            locations: BTreeMap::new(),
            npcs: BTreeMap::new(),
            present: Vec::new(),
            player: Player::default(),
            scene: Scene::default(),
            settings: BTreeMap::new(),
            score: 0,
            depth: 0,
            rng: StdRng::from_entropy(),
            last_action: None,
        }
    }

    /// Fixed RNG seed, for reproducible runs.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn last_action(&self) -> Option<DateTime<Utc>> {
        self.last_action
    }

    // ------------------------------------------------------------------
    // Scene feeding
    // ------------------------------------------------------------------

    /// Feeds one item to the scene. Text is interpolated into a
    /// paragraph; blocks, choices and nested groups pass through.
    pub fn add(&mut self, item: impl Into<SceneItem>) {
        match item.into() {
            SceneItem::Text(template) => {
                let text = self.interpolate(&template);
                self.scene.content.push(Block::Paragraph { text });
            }
            SceneItem::Block(block) => self.scene.content.push(block),
            SceneItem::Choice(choice) => self.scene.options.push(choice),
            SceneItem::Group(items) => {
                for item in items {
                    self.add(item);
                }
            }
        }
    }

    pub fn add_choice(&mut self, action: impl Into<Action>, label: impl Into<String>) {
        self.scene.options.push(Choice::new(action, label));
    }

    /// Dialogue line; the text is interpolated.
    pub fn speech(&mut self, who: impl Into<String>, text: &str) {
        let text = self.interpolate(text);
        self.scene.content.push(Block::Speech {
            who: who.into(),
            text,
        });
    }

    /// Emphasized narration; interpolated.
    pub fn highlight(&mut self, text: &str) {
        let text = self.interpolate(text);
        self.scene.content.push(Block::Highlight { text });
    }

    /// Card lifecycle notice. Not interpolated.
    pub fn notice(&mut self, category: CardKind, text: impl Into<String>) {
        self.scene.content.push(Block::Notice {
            category,
            text: text.into(),
        });
    }

    // ------------------------------------------------------------------
    // Template interpolation
    // ------------------------------------------------------------------

    /// Replaces `{expr}` spans with evaluated expression text. `{{` and
    /// `}}` escape literal braces. A failing or unterminated expression
    /// renders as a visible error token instead of aborting the
    /// narration.
    pub fn interpolate(&mut self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut i = 0;
        while i < template.len() {
            let Some(off) = template[i..].find(|c| c == '{' || c == '}') else {
                out.push_str(&template[i..]);
                break;
            };
            let at = i + off;
            out.push_str(&template[i..at]);
            if template[at..].starts_with("{{") {
                out.push('{');
                i = at + 2;
            } else if template[at..].starts_with("}}") {
                out.push('}');
                i = at + 2;
            } else if template[at..].starts_with('}') {
                // Lone closer, render literally.
                out.push('}');
                i = at + 1;
            } else {
                match template[at + 1..].find('}') {
                    None => {
                        log::debug!(
                            "unterminated expression in template '{}'",
                            escape_log(template)
                        );
                        out.push_str("[error: unterminated expression]");
                        break;
                    }
                    Some(close) => {
                        let expr = template[at + 1..at + 1 + close].trim();
                        match self.eval(expr) {
                            Ok(value) => out.push_str(&value.render()),
                            Err(err) => {
                                log::debug!(
                                    "expression '{}' failed: {}",
                                    escape_log(expr),
                                    err
                                );
                                out.push_str(&format!("[error: {expr}]"));
                            }
                        }
                        i = at + 1 + close + 1;
                    }
                }
            }
        }
        out
    }

    // ------------------------------------------------------------------
    // World access
    // ------------------------------------------------------------------

    /// Live state for a location, created on first access.
    pub fn location_state(&mut self, id: &str) -> &mut LocationState {
        self.locations.entry(id.to_string()).or_default()
    }

    /// Live NPC instance, generated from its definition on first
    /// access. Generation inserts the instance before running the
    /// schedule hook, so the hook can already address it.
    pub fn npc_mut(&mut self, id: &str) -> Result<&mut Npc, EngineError> {
        if !self.npcs.contains_key(id) {
            let def = self.content.npc_def(id)?;
            let start = def.start_location.clone();
            let on_move = def.on_move;
            self.npcs.insert(id.to_string(), Npc::new(id, start));
            log::debug!("npc '{}' generated", id);
            if let Some(f) = on_move {
                f(self, id)?;
            }
            self.refresh_presence();
        }
        self.npcs
            .get_mut(id)
            .ok_or_else(|| EngineError::Internal(format!("npc '{id}' vanished during generation")))
    }

    /// Moves the player. Bumps the visit counter, fires first-arrival
    /// and arrival hooks, then refreshes presence.
    pub fn travel(&mut self, id: &str) -> Result<(), EngineError> {
        let def = self.content.location_def(id)?;
        let on_first = def.on_first_arrive;
        let on_arrive = def.on_arrive;

        self.location = id.to_string();
        let state = self.location_state(id);
        state.visits += 1;
        state.discovered = true;
        let first = state.visits == 1;
        log::debug!("travel to '{}' (visit {})", id, state.visits);

        if first {
            if let Some(f) = on_first {
                f(self, id)?;
            }
        }
        if let Some(f) = on_arrive {
            f(self, id)?;
        }
        self.refresh_presence();
        Ok(())
    }

    /// Rebuilds the sorted list of NPC ids sharing the player's
    /// location. Only generated instances count.
    pub fn refresh_presence(&mut self) {
        self.present = self
            .npcs
            .iter()
            .filter(|(_, npc)| npc.location == self.location)
            .map(|(id, _)| id.clone())
            .collect();
    }

    pub fn npc_present(&self, id: &str) -> bool {
        self.present.iter().any(|p| p == id)
    }

    // ------------------------------------------------------------------
    // Settings, score, randomness
    // ------------------------------------------------------------------

    pub fn setting(&self, key: &str) -> bool {
        self.settings.get(key).copied().unwrap_or(false)
    }

    pub fn set_setting(&mut self, key: impl Into<String>, on: bool) {
        self.settings.insert(key.into(), on);
    }

    pub fn add_score(&mut self, delta: i64) {
        self.score += delta;
        log::debug!("score {:+} -> {}", delta, self.score);
    }

    /// True with probability `p`. Out-of-range probabilities are an
    /// authoring error and rejected.
    pub fn chance(&mut self, p: f64) -> Result<bool, EngineError> {
        if !(0.0..=1.0).contains(&p) {
            return Err(EngineError::invalid(format!(
                "chance probability {p} outside 0..=1"
            )));
        }
        Ok(self.rng.gen_bool(p))
    }

    /// Uniform pick from a slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.rng)
    }

    /// Uniform integer in `0..bound`.
    pub fn roll(&mut self, bound: i64) -> Result<i64, EngineError> {
        if bound <= 0 {
            return Err(EngineError::invalid(format!("roll bound {bound} not positive")));
        }
        Ok(self.rng.gen_range(0..bound))
    }

    // ------------------------------------------------------------------
    // Action loop
    // ------------------------------------------------------------------

    /// Phase one: bring derived state current before scripts observe
    /// it. Safe to call any number of times.
    pub fn before_action(&mut self) -> Result<(), EngineError> {
        self.refresh_presence();
        self.recompute_stats()
    }

    /// Phase two: run one player action. Clears the per-action scene
    /// surface (keeping the frame stack), resolves the action, then
    /// drains pending pages until something demands input.
    ///
    /// This is the one place resolution errors are recovered: the
    /// failure is logged and posted as a diagnostic block, keeping any
    /// content produced before the failure.
    pub fn take_action(&mut self, action: &Action) {
        self.last_action = Some(Utc::now());
        self.scene.clear();
        let result = self
            .run_action(action, &Params::new())
            .and_then(|_| self.drain_pages());
        if let Err(err) = result {
            log::warn!("action failed: {}", err);
            self.scene.content.push(Block::Error {
                text: err.to_string(),
            });
        }
    }

    /// Runs queued pages from the innermost frame outward until
    /// options or a shop demand input, or the stack empties. Exhausted
    /// frames are discarded as they are reached.
    fn drain_pages(&mut self) -> Result<(), EngineError> {
        let mut ran: u32 = 0;
        loop {
            if !self.scene.options.is_empty() || self.scene.shop.is_some() {
                return Ok(());
            }
            while let Some(frame) = self.scene.stack.first() {
                if frame.pages.is_empty() {
                    self.scene.stack.remove(0);
                } else {
                    break;
                }
            }
            let Some(frame) = self.scene.stack.first_mut() else {
                return Ok(());
            };
            let Some(page) = frame.pages.pop_front() else {
                return Ok(());
            };
            if ran >= MAX_PAGES_PER_ACTION {
                return Err(EngineError::PageLimit(MAX_PAGES_PER_ACTION));
            }
            ran += 1;
            self.run(&Script::Call(page), &Params::new())?;
        }
    }

    /// Phase three: card `after_update` hooks over the cards held at
    /// phase entry, then the close check. A scene that ends with no
    /// options and no shop is considered disengaged: the frame stack,
    /// fronting NPC and portrait flag are dropped while the content
    /// blocks stay for rendering. Finishes by recomputing stats.
    pub fn after_action(&mut self) -> Result<(), EngineError> {
        let held: Vec<String> = self.player.cards.iter().map(|c| c.id.clone()).collect();
        for id in held {
            if !self.player.has_card(&id) {
                continue;
            }
            let hook = self.content.card_def(&id)?.after_update;
            if let Some(f) = hook {
                f(self, &id)?;
            }
        }
        if self.scene.options.is_empty() && self.scene.shop.is_none() {
            self.scene.stack.clear();
            self.scene.npc = None;
            self.scene.hide_portrait = false;
        }
        self.recompute_stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::script::ContentBuilder;

    fn empty_game() -> Game {
        Game::new(ContentBuilder::new().build(), "nowhere").with_rng_seed(7)
    }

    #[test]
    fn interpolate_escapes_braces() {
        let mut game = empty_game();
        assert_eq!(game.interpolate("a {{literal}} brace"), "a {literal} brace");
        assert_eq!(game.interpolate("plain text"), "plain text");
        assert_eq!(game.interpolate("lone } closer"), "lone } closer");
    }

    #[test]
    fn interpolate_flags_unknown_scripts() {
        let mut game = empty_game();
        assert_eq!(game.interpolate("see {nothing} here"), "see [error: nothing] here");
    }

    #[test]
    fn interpolate_flags_unterminated_expressions() {
        let mut game = empty_game();
        assert_eq!(
            game.interpolate("broken {expr"),
            "broken [error: unterminated expression]"
        );
    }

    #[test]
    fn chance_rejects_bad_probability() {
        let mut game = empty_game();
        assert!(game.chance(1.5).is_err());
        assert!(game.chance(-0.1).is_err());
        assert!(matches!(game.chance(0.0), Ok(false)));
        assert!(matches!(game.chance(1.0), Ok(true)));
    }

    #[test]
    fn stats_fall_back_to_base() {
        let mut player = Player::default();
        player.base.insert("poise".into(), 40.0);
        assert_eq!(player.stat("poise"), 40.0);
        player.derived.insert("poise".into(), 25.0);
        assert_eq!(player.stat("poise"), 25.0);
        assert_eq!(player.stat("missing"), 0.0);
    }
}
