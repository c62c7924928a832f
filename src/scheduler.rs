//! Timer/scheduler engine.
//!
//! The main loop runs cooperatively: it asks the scheduler what is due on
//! every pass, and the scheduler notifies a [`SchedulerDelegate`] for each
//! entry whose time has come.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │  ┌───────────┐   ┌─────────────┐   ┌───────────────┐   │
//! │  │ Report    │   │ Housekeeping│   │ Restart       │   │
//! │  │ (periodic)│   │ (periodic)  │   │ (one-shot)    │   │
//! │  └─────┬─────┘   └──────┬──────┘   └───────┬───────┘   │
//! │        ▼                ▼                  ▼           │
//! │  ┌──────────────────────────────────────────────────┐  │
//! │  │              SchedulerDelegate                   │  │
//! │  └──────────────────────────────────────────────────┘  │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! Time is a monotonic millisecond counter truncated to `u32`; all
//! comparisons use wrapping arithmetic, so the ~49-day rollover is
//! harmless.

use crate::app::ports::{ScheduleFiredKind, SchedulerDelegate};
use log::info;

// ═══════════════════════════════════════════════════════════════
//  Schedule types
// ═══════════════════════════════════════════════════════════════

/// What the main loop should do when an entry fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskId {
    /// Scan, poll every node, publish.
    ReportCycle,
    /// LED, button and link upkeep.
    Housekeeping,
    /// Reboot after a factory reset or on operator request.
    Restart,
}

/// A single schedule entry.
#[derive(Debug, Clone)]
pub struct Schedule {
    pub label: &'static str,
    pub task: TaskId,
    pub kind: ScheduleKind,
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleKind {
    /// Fire every `interval_ms`.  With `immediate`, the first fire happens
    /// on the first tick instead of one interval later.
    Periodic { interval_ms: u32, immediate: bool },
    /// Fire once after `delay_ms`, then release the slot.
    OneShot { delay_ms: u32 },
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// Maximum number of concurrent schedules (stack-allocated).
const MAX_SCHEDULES: usize = 4;

pub struct Scheduler {
    schedules: [Option<ScheduleEntry>; MAX_SCHEDULES],
}

/// Internal bookkeeping for a live schedule.
#[derive(Debug, Clone)]
struct ScheduleEntry {
    schedule: Schedule,
    /// When the entry was armed or last fired.
    since_ms: u32,
    /// Fire on the next tick regardless of elapsed time.
    due_now: bool,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            schedules: [None, None, None, None],
        }
    }

    /// Add a schedule armed at `now_ms`.  Returns the slot index, or
    /// `None` if full.
    pub fn add(&mut self, schedule: Schedule, now_ms: u32) -> Option<usize> {
        let (i, slot) = self
            .schedules
            .iter_mut()
            .enumerate()
            .find(|(_, slot)| slot.is_none())?;
        info!("Scheduler: added '{}' at slot {}", schedule.label, i);
        let due_now = matches!(schedule.kind, ScheduleKind::Periodic { immediate: true, .. });
        *slot = Some(ScheduleEntry {
            schedule,
            since_ms: now_ms,
            due_now,
        });
        Some(i)
    }

    /// Change a periodic entry's interval and restart its timer from `now_ms`.
    pub fn set_interval(&mut self, slot: usize, interval_ms: u32, now_ms: u32) {
        let Some(Some(entry)) = self.schedules.get_mut(slot) else {
            return;
        };
        if let ScheduleKind::Periodic { interval_ms: current, .. } = &mut entry.schedule.kind {
            info!(
                "Scheduler: '{}' interval {} ms -> {} ms",
                entry.schedule.label, current, interval_ms
            );
            *current = interval_ms;
            entry.since_ms = now_ms;
            entry.due_now = false;
        }
    }

    /// Fire everything that is due at `now_ms`.
    pub fn tick(&mut self, now_ms: u32, delegate: &mut dyn SchedulerDelegate) {
        for slot in self.schedules.iter_mut() {
            let entry = match slot {
                Some(e) if e.schedule.enabled => e,
                _ => continue,
            };
            let elapsed = now_ms.wrapping_sub(entry.since_ms);

            match entry.schedule.kind {
                ScheduleKind::Periodic { interval_ms, .. } => {
                    if entry.due_now || elapsed >= interval_ms {
                        delegate.on_schedule_fired(entry.schedule.task, ScheduleFiredKind::Periodic);
                        entry.since_ms = now_ms;
                        entry.due_now = false;
                    }
                }
                ScheduleKind::OneShot { delay_ms } => {
                    if elapsed >= delay_ms {
                        info!(
                            "Scheduler: '{}' one-shot fired (after {} ms)",
                            entry.schedule.label, delay_ms
                        );
                        delegate.on_schedule_fired(entry.schedule.task, ScheduleFiredKind::OneShot);
                        // Spent one-shots free their slot.
                        *slot = None;
                    }
                }
            }
        }
    }

    /// Number of active (enabled) schedules.
    pub fn active_count(&self) -> usize {
        self.schedules
            .iter()
            .filter(|s| s.as_ref().is_some_and(|e| e.schedule.enabled))
            .count()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
