//! Script engine and game state machine.
//!
//! Content registers scripts and definitions through [`ContentBuilder`]
//! at startup; a [`Game`] then interprets player actions against the
//! frozen registry. The interesting parts are the resolver (expression
//! chaining over accessors), the scene frame stack (resumable menus),
//! the card lifecycle (subsumption and replacement), and chunked
//! waiting that the world can interrupt.

pub mod accessor;
pub mod card;
pub mod clock;
pub mod errors;
pub mod resolver;
pub mod save;
pub mod scene;
pub mod script;
pub mod scripts;
pub mod state;
pub mod world;

pub use accessor::{split_args, split_expr, split_fragment, Accessor, ExprShape};
pub use card::{Card, CardDef, CardKind};
pub use clock::{
    day_of, format_clock, hour_of, minute_of, seconds_until_hour, ticks_between, DAY, HOUR,
    MINUTE, WAIT_CHUNK_MINUTES,
};
pub use errors::EngineError;
pub use save::{load_from_path, migrate_snapshot, save_to_path, SaveFile, Snapshot, SAVE_VERSION};
pub use scene::{Block, Choice, Frame, Scene, SceneItem, ShopRef};
pub use script::{
    merge_params, Action, Content, ContentBuilder, HookFn, Instruction, NativeFn, Params,
    ParamsExt, ReminderFn, Script, TickFn, TimeHookFn, Value,
};
pub use state::{Game, Player};
pub use world::{Activity, Link, LocationDef, LocationState, Npc, NpcDef};
