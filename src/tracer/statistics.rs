use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::Position;
use crate::tracer::{EventType, TraceEvent};

/// Aggregate view of one execution's trace events.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub started_at: DateTime<Utc>,
    pub num_requested: u32,
    pub num_empty: u32,
    pub num_errors: u32,
    pub num_non_empty: u32,
    pub num_fallbacks_requested: u32,
    pub num_non_empty_fallbacks: u32,
    pub avg_non_empty_millis: i64,
    pub slowest_non_empty_millis: i64,
    pub slowest_fragment: Option<Position>,
    pub runtime_millis: i64,
}

impl Statistics {
    pub fn from_events(started_at: DateTime<Utc>, events: &[TraceEvent], now: DateTime<Utc>) -> Self {
        let mut stats = Statistics {
            started_at,
            num_requested: 0,
            num_empty: 0,
            num_errors: 0,
            num_non_empty: 0,
            num_fallbacks_requested: 0,
            num_non_empty_fallbacks: 0,
            avg_non_empty_millis: 0,
            slowest_non_empty_millis: 0,
            slowest_fragment: None,
            runtime_millis: (now - started_at).num_milliseconds(),
        };

        let mut total_millis: i64 = 0;
        let mut timed: i64 = 0;

        for event in events {
            match event.event_type {
                EventType::FragmentStarted => stats.num_requested += 1,
                EventType::FallbackStarted => stats.num_fallbacks_requested += 1,
                EventType::Error => stats.num_errors += 1,
                EventType::FragmentCompleted | EventType::FallbackCompleted => {
                    if !event.non_empty {
                        if event.event_type == EventType::FragmentCompleted {
                            stats.num_empty += 1;
                        }
                        continue;
                    }

                    if event.event_type == EventType::FragmentCompleted {
                        stats.num_non_empty += 1;
                    } else {
                        stats.num_non_empty_fallbacks += 1;
                    }

                    let millis = (event.timestamp - started_at).num_milliseconds();
                    total_millis += millis;
                    timed += 1;

                    // strict comparison: the first of equally slow events stays
                    if stats.slowest_fragment.is_none() || millis > stats.slowest_non_empty_millis {
                        stats.slowest_non_empty_millis = millis;
                        stats.slowest_fragment = Some(event.position.clone());
                    }
                }
            }
        }

        if timed > 0 {
            stats.avg_non_empty_millis = total_millis / timed;
        }

        stats
    }
}
