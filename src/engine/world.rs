//! World definitions and their live counterparts.
//!
//! Definitions ([`LocationDef`], [`NpcDef`]) are immutable content,
//! registered once and addressed by id. Live state ([`LocationState`],
//! [`Npc`]) is created lazily the first time something touches the id,
//! so content can define a large world without bloating fresh saves.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

use crate::engine::script::{Action, HookFn, NativeFn, Params};

/// A travel connection offered from a location.
#[derive(Debug, Clone)]
pub struct Link {
    pub label: String,
    pub to: String,
}

/// A non-travel option offered from a location.
#[derive(Debug, Clone)]
pub struct Activity {
    pub label: String,
    pub action: Action,
}

#[derive(Debug, Clone)]
pub struct LocationDef {
    pub id: String,
    pub name: String,
    /// Template paragraph shown by `look`; interpolated on render.
    pub description: String,
    pub links: Vec<Link>,
    pub activities: Vec<Activity>,
    /// Runs on every arrival, after the visit counter updates.
    pub on_arrive: Option<HookFn>,
    /// Runs once, on the first arrival ever, before `on_arrive`.
    pub on_first_arrive: Option<HookFn>,
    /// Runs when a wait completes here without interruption.
    pub on_wait: Option<HookFn>,
    /// Runs when time advances while waiting here.
    pub on_tick: Option<HookFn>,
}

impl LocationDef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        LocationDef {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            links: Vec::new(),
            activities: Vec::new(),
            on_arrive: None,
            on_first_arrive: None,
            on_wait: None,
            on_tick: None,
        }
    }

    pub fn with_description(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }

    pub fn with_link(mut self, label: impl Into<String>, to: impl Into<String>) -> Self {
        self.links.push(Link {
            label: label.into(),
            to: to.into(),
        });
        self
    }

    pub fn with_activity(mut self, label: impl Into<String>, action: impl Into<Action>) -> Self {
        self.activities.push(Activity {
            label: label.into(),
            action: action.into(),
        });
        self
    }

    pub fn with_arrive(mut self, f: HookFn) -> Self {
        self.on_arrive = Some(f);
        self
    }

    pub fn with_first_arrive(mut self, f: HookFn) -> Self {
        self.on_first_arrive = Some(f);
        self
    }

    pub fn with_wait(mut self, f: HookFn) -> Self {
        self.on_wait = Some(f);
        self
    }

    pub fn with_tick(mut self, f: HookFn) -> Self {
        self.on_tick = Some(f);
        self
    }
}

#[derive(Debug, Clone)]
pub struct NpcDef {
    pub id: String,
    pub name: String,
    pub title: String,
    /// Location id the live instance starts at. Need not be a defined
    /// location; an undefined id simply keeps the NPC off-stage.
    pub start_location: String,
    /// Named sub-scripts addressable through `npc(<id>):<name>`.
    pub scripts: HashMap<String, NativeFn>,
    /// Schedule hook; runs on generation and when the clock crosses an
    /// hour boundary outside a scene.
    pub on_move: Option<HookFn>,
    /// While the player waits with this NPC present: runs each chunk,
    /// before the ambient hook.
    pub approach: Option<HookFn>,
    /// While the player waits with this NPC present: runs each chunk,
    /// after the contact hook.
    pub ambient: Option<HookFn>,
    /// While the player waits with this NPC elsewhere: runs every
    /// chunk, letting an absent NPC seek the player out.
    pub visit: Option<HookFn>,
}

impl NpcDef {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        start_location: impl Into<String>,
    ) -> Self {
        NpcDef {
            id: id.into(),
            name: name.into(),
            title: String::new(),
            start_location: start_location.into(),
            scripts: HashMap::new(),
            on_move: None,
            approach: None,
            ambient: None,
            visit: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_script(mut self, name: impl Into<String>, f: NativeFn) -> Self {
        self.scripts.insert(name.into(), f);
        self
    }

    pub fn with_move(mut self, f: HookFn) -> Self {
        self.on_move = Some(f);
        self
    }

    pub fn with_approach(mut self, f: HookFn) -> Self {
        self.approach = Some(f);
        self
    }

    pub fn with_ambient(mut self, f: HookFn) -> Self {
        self.ambient = Some(f);
        self
    }

    pub fn with_visit(mut self, f: HookFn) -> Self {
        self.visit = Some(f);
        self
    }
}

/// Per-location live state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationState {
    #[serde(default)]
    pub visits: u32,
    #[serde(default)]
    pub discovered: bool,
}

/// A live NPC instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Npc {
    pub id: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Params::is_empty")]
    pub fields: Params,
}

impl Npc {
    pub fn new(id: impl Into<String>, location: impl Into<String>) -> Self {
        Npc {
            id: id.into(),
            location: location.into(),
            fields: Params::new(),
        }
    }

    pub fn field(&self, key: &str) -> Option<&JsonValue> {
        self.fields.get(key)
    }

    pub fn set_field(&mut self, key: impl Into<String>, value: impl Into<JsonValue>) {
        self.fields.insert(key.into(), value.into());
    }
}
