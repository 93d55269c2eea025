//! Core script vocabulary and the content registry.
//!
//! Everything the interpreter runs is one of a small set of shapes:
//!
//! - [`Instruction`] - a named call with a JSON parameter map
//! - [`Action`] - the serializable subset stored in scene options and
//!   pending pages (expression string or instruction)
//! - [`Script`] - the full runtime set, adding native function pointers
//!   and pre-bound native calls that never touch a save file
//! - [`Value`] - what a script evaluates to: plain data, another
//!   runnable script, or an accessor open to further chaining
//!
//! [`Content`] is the immutable registry of scripts and definitions the
//! game was built with. It is assembled once through [`ContentBuilder`]
//! and shared behind an `Arc`; live state only ever refers to content
//! by id, so definitions are re-resolved on every lookup and a save
//! file never embeds them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

use crate::engine::accessor::Accessor;
use crate::engine::card::{Card, CardDef};
use crate::engine::errors::EngineError;
use crate::engine::state::Game;
use crate::engine::world::{LocationDef, NpcDef};

/// Parameter map attached to instructions and passed to every script.
///
/// Backed by `serde_json`'s ordered map so iteration and serialization
/// are deterministic.
pub type Params = serde_json::Map<String, JsonValue>;

/// Native script entry point.
pub type NativeFn = fn(&mut Game, &Params) -> Result<Value, EngineError>;

/// Lifecycle hook attached to a definition; receives the owning id.
pub type HookFn = fn(&mut Game, &str) -> Result<(), EngineError>;

/// Time hook; receives the owning id and the elapsed seconds.
pub type TimeHookFn = fn(&mut Game, &str, i64) -> Result<(), EngineError>;

/// World-level time hook; receives the elapsed seconds.
pub type TickFn = fn(&mut Game, i64) -> Result<(), EngineError>;

/// Journal reminder lines for one held card.
pub type ReminderFn = fn(&Game, &Card) -> Vec<String>;

/// Typed read helpers over a [`Params`] map.
pub trait ParamsExt {
    fn text(&self, key: &str) -> Option<&str>;
    fn integer(&self, key: &str) -> Option<i64>;
    fn number(&self, key: &str) -> Option<f64>;
    fn truthy(&self, key: &str) -> bool;
    /// Reads a nested action, accepting either an expression string or
    /// an embedded instruction.
    fn action(&self, key: &str) -> Option<Action>;
}

impl ParamsExt for Params {
    fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(JsonValue::as_str)
    }

    fn integer(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(JsonValue::as_i64)
    }

    fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(JsonValue::as_f64)
    }

    fn truthy(&self, key: &str) -> bool {
        match self.get(key) {
            Some(JsonValue::Bool(b)) => *b,
            Some(JsonValue::Null) | None => false,
            Some(JsonValue::String(s)) => !s.is_empty(),
            Some(JsonValue::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Some(JsonValue::Array(a)) => !a.is_empty(),
            Some(JsonValue::Object(o)) => !o.is_empty(),
        }
    }

    fn action(&self, key: &str) -> Option<Action> {
        self.get(key).and_then(Action::from_json)
    }
}

/// Merges an inner parameter map with the caller's, caller winning on
/// key collision.
pub fn merge_params(inner: &Params, outer: &Params) -> Params {
    let mut merged = inner.clone();
    for (key, value) in outer {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// A named call with parameters. The unit of deferred work: scene
/// option actions and queued pages are stored in this shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instruction {
    pub name: String,
    #[serde(default, skip_serializing_if = "Params::is_empty")]
    pub params: Params,
}

impl Instruction {
    pub fn new(name: impl Into<String>) -> Self {
        Instruction {
            name: name.into(),
            params: Params::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

// Older snapshots carried instructions as a bare name string or as a
// two element [name, params] array. All three shapes deserialize; only
// the map shape is ever written back.
impl<'de> Deserialize<'de> for Instruction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct InstructionVisitor;

        impl<'de> Visitor<'de> for InstructionVisitor {
            type Value = Instruction;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an instruction name, [name, params] pair, or {name, params} map")
            }

            fn visit_str<E>(self, v: &str) -> Result<Instruction, E>
            where
                E: serde::de::Error,
            {
                Ok(Instruction::new(v))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Instruction, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let name: String = seq
                    .next_element()?
                    .ok_or_else(|| serde::de::Error::invalid_length(0, &self))?;
                let params: Option<Params> = seq.next_element()?;
                Ok(Instruction {
                    name,
                    params: params.unwrap_or_default(),
                })
            }

            fn visit_map<A>(self, mut map: A) -> Result<Instruction, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut name: Option<String> = None;
                let mut params: Option<Params> = None;
                while let Some(key) = map.next_key::<String>()? {
                    match key.as_str() {
                        "name" => name = Some(map.next_value()?),
                        "params" => params = Some(map.next_value()?),
                        _ => {
                            let _: serde::de::IgnoredAny = map.next_value()?;
                        }
                    }
                }
                Ok(Instruction {
                    name: name.ok_or_else(|| serde::de::Error::missing_field("name"))?,
                    params: params.unwrap_or_default(),
                })
            }
        }

        deserializer.deserialize_any(InstructionVisitor)
    }
}

/// The serializable subset of [`Script`]: what scene options and queued
/// pages may carry. Native function pointers are excluded by
/// construction, which is what keeps snapshots portable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Action {
    /// An expression string, resolved through the script registry.
    Expr(String),
    /// A direct instruction call.
    Call(Instruction),
}

impl Action {
    pub fn expr(text: impl Into<String>) -> Self {
        Action::Expr(text.into())
    }

    pub fn call(instruction: Instruction) -> Self {
        Action::Call(instruction)
    }

    /// Reads an action out of loose JSON (a string, an instruction map,
    /// or a legacy [name, params] pair).
    pub fn from_json(value: &JsonValue) -> Option<Action> {
        match value {
            JsonValue::String(s) => Some(Action::Expr(s.clone())),
            other => serde_json::from_value::<Instruction>(other.clone())
                .ok()
                .map(Action::Call),
        }
    }
}

impl From<&str> for Action {
    fn from(text: &str) -> Self {
        Action::Expr(text.to_string())
    }
}

impl From<String> for Action {
    fn from(text: String) -> Self {
        Action::Expr(text)
    }
}

impl From<Instruction> for Action {
    fn from(instruction: Instruction) -> Self {
        Action::Call(instruction)
    }
}

/// Everything the interpreter can run.
#[derive(Clone)]
pub enum Script {
    /// An expression string, resolved through the registry.
    Expr(String),
    /// A named call with its own parameters.
    Call(Instruction),
    /// A native function.
    Native(NativeFn),
    /// A native function with parameters bound ahead of invocation,
    /// used by accessors to hand back sub-scripts that already know
    /// their owner.
    Bound(NativeFn, Params),
}

impl Script {
    pub fn bound(f: NativeFn, params: Params) -> Self {
        Script::Bound(f, params)
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Script::Expr(text) => f.debug_tuple("Expr").field(text).finish(),
            Script::Call(inst) => f.debug_tuple("Call").field(inst).finish(),
            Script::Native(_) => f.write_str("Native(..)"),
            Script::Bound(_, params) => f.debug_tuple("Bound").field(&"..").field(params).finish(),
        }
    }
}

impl From<&Action> for Script {
    fn from(action: &Action) -> Self {
        match action {
            Action::Expr(text) => Script::Expr(text.clone()),
            Action::Call(inst) => Script::Call(inst.clone()),
        }
    }
}

impl From<Action> for Script {
    fn from(action: Action) -> Self {
        match action {
            Action::Expr(text) => Script::Expr(text),
            Action::Call(inst) => Script::Call(inst),
        }
    }
}

impl From<&str> for Script {
    fn from(text: &str) -> Self {
        Script::Expr(text.to_string())
    }
}

impl From<Instruction> for Script {
    fn from(instruction: Instruction) -> Self {
        Script::Call(instruction)
    }
}

/// What a script evaluates to.
pub enum Value {
    /// Plain JSON data.
    Data(JsonValue),
    /// A runnable script; the resolver executes these transparently.
    Script(Script),
    /// An object open to further expression chaining.
    Accessor(Box<dyn Accessor>),
}

impl Value {
    pub fn null() -> Self {
        Value::Data(JsonValue::Null)
    }

    pub fn accessor(a: impl Accessor + 'static) -> Self {
        Value::Accessor(Box::new(a))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Data(JsonValue::Null))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Data(JsonValue::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Data(v) => v.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Data(v) => v.as_f64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Data(v) => v.as_bool(),
            _ => None,
        }
    }

    /// Text form used by template interpolation.
    pub fn render(&self) -> String {
        match self {
            Value::Data(JsonValue::Null) => String::new(),
            Value::Data(JsonValue::String(s)) => s.clone(),
            Value::Data(other) => other.to_string(),
            Value::Script(_) | Value::Accessor(_) => String::new(),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Data(v) => f.debug_tuple("Data").field(v).finish(),
            Value::Script(s) => f.debug_tuple("Script").field(s).finish(),
            Value::Accessor(_) => f.write_str("Accessor(..)"),
        }
    }
}

impl From<JsonValue> for Value {
    fn from(v: JsonValue) -> Self {
        Value::Data(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Data(JsonValue::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Data(JsonValue::from(s))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Data(JsonValue::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Data(JsonValue::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Data(JsonValue::from(b))
    }
}

impl From<Script> for Value {
    fn from(s: Script) -> Self {
        Value::Script(s)
    }
}

/// Immutable registry of scripts and definitions, shared behind an
/// `Arc` by the game state and anything that inspects content.
#[derive(Debug)]
pub struct Content {
    scripts: HashMap<String, NativeFn>,
    cards: HashMap<String, CardDef>,
    locations: HashMap<String, LocationDef>,
    npcs: HashMap<String, NpcDef>,
    on_tick: Option<TickFn>,
}

impl Content {
    pub fn builder() -> ContentBuilder {
        ContentBuilder::new()
    }

    pub fn script(&self, name: &str) -> Option<NativeFn> {
        self.scripts.get(name).copied()
    }

    pub fn card_def(&self, id: &str) -> Result<&CardDef, EngineError> {
        self.cards
            .get(id)
            .ok_or_else(|| EngineError::definition("card", id))
    }

    pub fn location_def(&self, id: &str) -> Result<&LocationDef, EngineError> {
        self.locations
            .get(id)
            .ok_or_else(|| EngineError::definition("location", id))
    }

    pub fn npc_def(&self, id: &str) -> Result<&NpcDef, EngineError> {
        self.npcs
            .get(id)
            .ok_or_else(|| EngineError::definition("npc", id))
    }

    pub fn card_ids(&self) -> impl Iterator<Item = &str> {
        self.cards.keys().map(String::as_str)
    }

    pub fn location_ids(&self) -> impl Iterator<Item = &str> {
        self.locations.keys().map(String::as_str)
    }

    pub fn npc_ids(&self) -> impl Iterator<Item = &str> {
        self.npcs.keys().map(String::as_str)
    }

    pub fn script_names(&self) -> impl Iterator<Item = &str> {
        self.scripts.keys().map(String::as_str)
    }

    pub fn on_tick(&self) -> Option<TickFn> {
        self.on_tick
    }
}

/// Assembles a [`Content`] registry. Registration rejects duplicate
/// names so content modules cannot silently shadow one another.
pub struct ContentBuilder {
    scripts: HashMap<String, NativeFn>,
    cards: HashMap<String, CardDef>,
    locations: HashMap<String, LocationDef>,
    npcs: HashMap<String, NpcDef>,
    on_tick: Option<TickFn>,
}

impl ContentBuilder {
    /// Starts a registry pre-loaded with the built-in scripts.
    pub fn new() -> Self {
        let mut builder = ContentBuilder {
            scripts: HashMap::new(),
            cards: HashMap::new(),
            locations: HashMap::new(),
            npcs: HashMap::new(),
            on_tick: None,
        };
        crate::engine::scripts::install(&mut builder.scripts);
        builder
    }

    pub fn script(&mut self, name: &str, f: NativeFn) -> Result<&mut Self, EngineError> {
        if self.scripts.contains_key(name) {
            return Err(EngineError::DuplicateScript(name.to_string()));
        }
        self.scripts.insert(name.to_string(), f);
        Ok(self)
    }

    pub fn card(&mut self, def: CardDef) -> Result<&mut Self, EngineError> {
        if self.cards.contains_key(&def.id) {
            return Err(EngineError::DuplicateDefinition {
                kind: "card",
                id: def.id,
            });
        }
        self.cards.insert(def.id.clone(), def);
        Ok(self)
    }

    pub fn location(&mut self, def: LocationDef) -> Result<&mut Self, EngineError> {
        if self.locations.contains_key(&def.id) {
            return Err(EngineError::DuplicateDefinition {
                kind: "location",
                id: def.id,
            });
        }
        self.locations.insert(def.id.clone(), def);
        Ok(self)
    }

    pub fn npc(&mut self, def: NpcDef) -> Result<&mut Self, EngineError> {
        if self.npcs.contains_key(&def.id) {
            return Err(EngineError::DuplicateDefinition {
                kind: "npc",
                id: def.id,
            });
        }
        self.npcs.insert(def.id.clone(), def);
        Ok(self)
    }

    /// World-level hook fired once per time advance.
    pub fn on_tick(&mut self, f: TickFn) -> &mut Self {
        self.on_tick = Some(f);
        self
    }

    pub fn build(self) -> Arc<Content> {
        Arc::new(Content {
            scripts: self.scripts,
            cards: self.cards,
            locations: self.locations,
            npcs: self.npcs,
            on_tick: self.on_tick,
        })
    }
}

impl Default for ContentBuilder {
    fn default() -> Self {
        Self::new()
    }
}
