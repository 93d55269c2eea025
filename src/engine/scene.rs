//! Scene model: the transcript of the current beat plus the stack of
//! resumable frames behind it.
//!
//! Content blocks and options are rebuilt by every action; the frame
//! stack survives between actions and is what lets a menu re-present
//! itself after each selection. Index 0 is the innermost frame.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::engine::card::CardKind;
use crate::engine::script::{Action, Instruction};

/// One unit of presented narration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    /// Plain narration.
    Paragraph { text: String },
    /// A line of dialogue attributed to a speaker.
    Speech { who: String, text: String },
    /// Emphasized narration.
    Highlight { text: String },
    /// A card lifecycle notice, categorized by the card kind so the
    /// presentation layer can style it.
    Notice { category: CardKind, text: String },
    /// A diagnostic surfaced in place of a failed action's output.
    Error { text: String },
}

/// One selectable option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub action: Action,
    // Older snapshots named this field "text".
    #[serde(alias = "text")]
    pub label: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
}

impl Choice {
    pub fn new(action: impl Into<Action>, label: impl Into<String>) -> Self {
        Choice {
            action: action.into(),
            label: label.into(),
            disabled: false,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}

/// A resumable frame: instructions still waiting to run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Frame {
    #[serde(default)]
    pub pages: VecDeque<Instruction>,
}

impl Frame {
    pub fn new(pages: impl IntoIterator<Item = Instruction>) -> Self {
        Frame {
            pages: pages.into_iter().collect(),
        }
    }
}

/// Reference to an open trade screen. Presence of a shop keeps the
/// scene engaged exactly like pending options do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub npc: Option<String>,
}

/// Anything scripts can feed to the scene in one call.
pub enum SceneItem {
    /// Interpolated into a paragraph.
    Text(String),
    Block(Block),
    Choice(Choice),
    Group(Vec<SceneItem>),
}

impl From<&str> for SceneItem {
    fn from(text: &str) -> Self {
        SceneItem::Text(text.to_string())
    }
}

impl From<String> for SceneItem {
    fn from(text: String) -> Self {
        SceneItem::Text(text)
    }
}

impl From<Block> for SceneItem {
    fn from(block: Block) -> Self {
        SceneItem::Block(block)
    }
}

impl From<Choice> for SceneItem {
    fn from(choice: Choice) -> Self {
        SceneItem::Choice(choice)
    }
}

impl From<Vec<SceneItem>> for SceneItem {
    fn from(items: Vec<SceneItem>) -> Self {
        SceneItem::Group(items)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub content: Vec<Block>,
    #[serde(default)]
    pub options: Vec<Choice>,
    #[serde(default)]
    pub stack: Vec<Frame>,
    /// NPC currently fronting the scene, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub npc: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hide_portrait: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop: Option<ShopRef>,
}

impl Scene {
    /// Whether the player is engaged in a scene: options pending, a
    /// shop open, or any frame with work left.
    pub fn in_scene(&self) -> bool {
        !self.options.is_empty()
            || self.shop.is_some()
            || self.stack.iter().any(|frame| !frame.pages.is_empty())
    }

    /// Innermost frame, created on demand.
    pub fn top_frame(&mut self) -> &mut Frame {
        if self.stack.is_empty() {
            self.stack.push(Frame::default());
        }
        &mut self.stack[0]
    }

    /// Pushes a new innermost frame.
    pub fn push_frame(&mut self, pages: impl IntoIterator<Item = Instruction>) {
        self.stack.insert(0, Frame::new(pages));
    }

    /// Removes and returns the innermost frame.
    pub fn pop_frame(&mut self) -> Option<Frame> {
        if self.stack.is_empty() {
            None
        } else {
            Some(self.stack.remove(0))
        }
    }

    /// Resets the per-action surface while keeping the frame stack, the
    /// fronting NPC and the portrait preference, so a resumed frame
    /// continues in the same framing.
    pub fn clear(&mut self) {
        self.content.clear();
        self.options.clear();
        self.shop = None;
    }

    /// Full teardown once the player disengages.
    pub fn dismiss(&mut self) {
        *self = Scene::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_scene_is_not_engaged() {
        assert!(!Scene::default().in_scene());
    }

    #[test]
    fn pending_pages_engage_the_scene() {
        let mut scene = Scene::default();
        scene.top_frame().pages.push_back(Instruction::new("menu"));
        assert!(scene.in_scene());

        scene.top_frame().pages.clear();
        assert!(!scene.in_scene());
    }

    #[test]
    fn shop_engages_the_scene() {
        let mut scene = Scene::default();
        scene.shop = Some(ShopRef {
            id: "stalls".into(),
            npc: None,
        });
        assert!(scene.in_scene());
    }

    #[test]
    fn clear_keeps_stack_and_npc() {
        let mut scene = Scene::default();
        scene.npc = Some("mara".into());
        scene.hide_portrait = true;
        scene.content.push(Block::Paragraph { text: "x".into() });
        scene.options.push(Choice::new("look", "Look"));
        scene.push_frame([Instruction::new("menu")]);

        scene.clear();
        assert!(scene.content.is_empty());
        assert!(scene.options.is_empty());
        assert_eq!(scene.npc.as_deref(), Some("mara"));
        assert!(scene.hide_portrait);
        assert_eq!(scene.stack.len(), 1);

        scene.dismiss();
        assert_eq!(scene, Scene::default());
    }

    #[test]
    fn frames_stack_innermost_first() {
        let mut scene = Scene::default();
        scene.push_frame([Instruction::new("outer")]);
        scene.push_frame([Instruction::new("inner")]);
        assert_eq!(scene.stack[0].pages[0].name, "inner");

        let popped = scene.pop_frame().expect("frame");
        assert_eq!(popped.pages[0].name, "inner");
        assert_eq!(scene.stack[0].pages[0].name, "outer");
    }

    #[test]
    fn choice_label_accepts_legacy_field_name() {
        let legacy: Choice =
            serde_json::from_str(r#"{"action": "look", "text": "Look around"}"#).expect("choice");
        assert_eq!(legacy.label, "Look around");
        assert!(!legacy.disabled);
    }
}
