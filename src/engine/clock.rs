//! Game time: the clock, tick arithmetic, and the two advancement
//! paths.
//!
//! [`Game::time_lapse`] is the raw advance: cards hear about elapsed
//! time, the world accumulation hook runs, and NPCs get a movement pass
//! when an hour boundary was crossed outside a scene.
//!
//! [`Game::wait`] layers chunked waiting on top: the duration advances
//! in fixed increments and NPC hooks run between chunks so the world
//! can interrupt. Location hooks and the follow-up only run when the
//! whole wait goes undisturbed.

use crate::engine::errors::EngineError;
use crate::engine::script::{Action, Params};
use crate::engine::state::Game;

pub const MINUTE: i64 = 60;
pub const HOUR: i64 = 60 * MINUTE;
pub const DAY: i64 = 24 * HOUR;

/// Wait durations advance in increments of this many minutes.
pub const WAIT_CHUNK_MINUTES: i64 = 10;

/// Count of interval boundaries crossed between two clock readings,
/// boundary-exact: a window ending exactly on a boundary counts it.
pub fn ticks_between(start: i64, end: i64, interval: i64) -> Result<i64, EngineError> {
    if interval <= 0 {
        return Err(EngineError::invalid(format!(
            "tick interval {interval} not positive"
        )));
    }
    if end < start {
        return Err(EngineError::invalid("tick window runs backwards"));
    }
    Ok(end.div_euclid(interval) - start.div_euclid(interval))
}

pub fn day_of(clock: i64) -> i64 {
    clock.div_euclid(DAY) + 1
}

pub fn hour_of(clock: i64) -> i64 {
    clock.rem_euclid(DAY) / HOUR
}

pub fn minute_of(clock: i64) -> i64 {
    (clock.rem_euclid(DAY) % HOUR) / MINUTE
}

/// "Day 2, 08:30" style clock text.
pub fn format_clock(clock: i64) -> String {
    format!(
        "Day {}, {:02}:{:02}",
        day_of(clock),
        hour_of(clock),
        minute_of(clock)
    )
}

/// Seconds until the next occurrence of `hour:00`, always in the
/// future: asking at 08:00 for hour 8 yields a full day.
pub fn seconds_until_hour(clock: i64, hour: i64) -> Result<i64, EngineError> {
    if !(0..24).contains(&hour) {
        return Err(EngineError::invalid(format!("hour {hour} outside 0..24")));
    }
    let of_day = clock.rem_euclid(DAY);
    let mut delta = hour * HOUR - of_day;
    if delta <= 0 {
        delta += DAY;
    }
    Ok(delta)
}

impl Game {
    /// Advances the clock. With non-zero elapsed time: every held
    /// card's time hook fires (list snapshotted first), then the world
    /// accumulation hook, then, when an hour boundary was crossed and
    /// no scene is engaged, every generated NPC's movement hook.
    pub fn time_lapse(&mut self, seconds: i64) -> Result<(), EngineError> {
        if seconds < 0 {
            return Err(EngineError::invalid(format!(
                "time cannot run backwards ({seconds}s)"
            )));
        }
        let start = self.clock;
        self.clock += seconds;
        if seconds == 0 {
            return Ok(());
        }
        log::trace!("clock {} -> {}", start, self.clock);

        let held: Vec<String> = self.player.cards.iter().map(|c| c.id.clone()).collect();
        for id in held {
            if !self.player.has_card(&id) {
                continue;
            }
            let hook = self.content.card_def(&id)?.on_time;
            if let Some(f) = hook {
                f(self, &id, seconds)?;
            }
        }

        if let Some(tick) = self.content.on_tick() {
            tick(self, seconds)?;
        }

        if !self.scene.in_scene() && ticks_between(start, self.clock, HOUR)? > 0 {
            let ids: Vec<String> = self.npcs.keys().cloned().collect();
            for id in ids {
                let hook = self.content.npc_def(&id)?.on_move;
                if let Some(f) = hook {
                    f(self, &id)?;
                }
            }
            self.refresh_presence();
        }
        Ok(())
    }

    /// Minute-denominated [`time_lapse`](Game::time_lapse).
    pub fn time_lapse_minutes(&mut self, minutes: i64) -> Result<(), EngineError> {
        if minutes < 0 {
            return Err(EngineError::invalid(format!(
                "time cannot run backwards ({minutes}m)"
            )));
        }
        self.time_lapse(minutes * MINUTE)
    }

    /// Waits out a duration in chunks, giving the world windows to
    /// interrupt.
    ///
    /// After each chunk, co-located NPCs run their contact hook then
    /// their ambient hook, and absent NPCs run their visit hook; the
    /// wait stops as soon as any hook engages the scene, leaving the
    /// clock at the whole chunks already waited. Only an undisturbed
    /// full duration reaches the location's tick and ambient hooks,
    /// and only if those do not engage the scene either does the
    /// follow-up run. Returns whether the follow-up stage was reached.
    pub fn wait(
        &mut self,
        minutes: i64,
        followup: Option<&Action>,
    ) -> Result<bool, EngineError> {
        if minutes < 0 {
            return Err(EngineError::invalid(format!(
                "cannot wait a negative duration ({minutes}m)"
            )));
        }
        let mut remaining = minutes;
        while remaining > 0 {
            let step = remaining.min(WAIT_CHUNK_MINUTES);
            self.time_lapse(step * MINUTE)?;
            remaining -= step;

            let ids: Vec<String> = self.npcs.keys().cloned().collect();
            for id in &ids {
                // Location read fresh per NPC; an earlier hook may have
                // moved someone.
                let here = self
                    .npcs
                    .get(id)
                    .map(|npc| npc.location == self.location)
                    .unwrap_or(false);
                if !here {
                    continue;
                }
                let def = self.content.npc_def(id)?;
                let (approach, ambient) = (def.approach, def.ambient);
                if let Some(f) = approach {
                    f(self, id)?;
                    if self.scene.in_scene() {
                        self.refresh_presence();
                        return Ok(false);
                    }
                }
                if let Some(f) = ambient {
                    f(self, id)?;
                    if self.scene.in_scene() {
                        self.refresh_presence();
                        return Ok(false);
                    }
                }
            }
            for id in &ids {
                let here = self
                    .npcs
                    .get(id)
                    .map(|npc| npc.location == self.location)
                    .unwrap_or(false);
                if here {
                    continue;
                }
                let visit = self.content.npc_def(id)?.visit;
                if let Some(f) = visit {
                    f(self, id)?;
                    if self.scene.in_scene() {
                        self.refresh_presence();
                        return Ok(false);
                    }
                }
            }
        }
        self.refresh_presence();

        let here = self.location.clone();
        let def = self.content.location_def(&here)?;
        let (on_tick, on_wait) = (def.on_tick, def.on_wait);
        if let Some(f) = on_tick {
            f(self, &here)?;
            if self.scene.in_scene() {
                return Ok(false);
            }
        }
        if let Some(f) = on_wait {
            f(self, &here)?;
            if self.scene.in_scene() {
                return Ok(false);
            }
        }

        self.run_opt(followup, &Params::new())?;
        Ok(true)
    }

    /// Interval boundaries crossed over the last `elapsed` seconds,
    /// the usual body of a card time hook.
    pub fn calc_ticks(&self, elapsed: i64, interval: i64) -> Result<i64, EngineError> {
        if elapsed < 0 {
            return Err(EngineError::invalid(format!(
                "elapsed time {elapsed}s is negative"
            )));
        }
        ticks_between(self.clock - elapsed, self.clock, interval)
    }
}
