//! # Taleloom - Scripted Narrative Engine
//!
//! Taleloom is an interpreter and world runtime for scripted interactive stories.
//! Story content is plain data plus small native functions; the engine supplies
//! the scene machinery, the clock, and the card-based state model around them.
//!
//! ## Features
//!
//! - **Instruction Interpreter**: Named instructions with JSON parameter maps, resolved
//!   against a script registry with parameter layering and a recursion guard.
//! - **Accessor Expressions**: Chained expressions like `npc(mara):talk` that walk
//!   domain objects segment by segment before running what they find.
//! - **Scene Stack**: Resumable frames of queued pages so nested sequences pick up
//!   exactly where they paused once the player has answered a choice.
//! - **Card State**: Statuses, quests, tasks, and traits as cards with lifecycle
//!   hooks, replacement, subsumption, and stat modifiers.
//! - **World Clock**: Minute-level time with hour and day boundaries, scheduled NPC
//!   movement, and interruptible waiting.
//! - **Versioned Saves**: JSON snapshots with forward migration from older layouts.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use taleloom::story;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut game = story::new_game()?;
//!
//!     game.before_action()?;
//!     game.take_action(&"look".into());
//!     game.after_action()?;
//!
//!     for block in &game.scene.content {
//!         println!("{:?}", block);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`engine`] - Interpreter, scene stack, cards, clock, and save handling
//! - [`story`] - Ferrytown, the bundled story content
//! - [`config`] - Configuration management
//! - [`logutil`] - Log sanitization helpers

pub mod config;
pub mod engine;
pub mod logutil;
pub mod story;
