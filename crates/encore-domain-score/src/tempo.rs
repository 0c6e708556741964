use crate::model::TempoPoint;
use encore_ports::types::{Seconds, Tick};
use midly::Fps;
use std::collections::BTreeMap;

pub const DEFAULT_US_PER_QUARTER: u32 = 500_000;

#[derive(Clone, Copy, Debug)]
struct Segment {
    tick: Tick,
    us_per_quarter: u32,
    seconds: Seconds,
}

/// Piecewise-constant tempo map used to turn ticks into seconds.
#[derive(Clone, Debug)]
pub struct TempoMap {
    ppq: u16,
    segments: Vec<Segment>,
}

impl TempoMap {
    pub fn new(ppq: u16, points: &[TempoPoint]) -> Self {
        let ppq = ppq.max(1);
        let mut segments: Vec<Segment> = Vec::with_capacity(points.len().max(1));
        for point in points {
            let seconds = match segments.last() {
                Some(prev) => prev.seconds + span_seconds(ppq, prev.us_per_quarter, point.tick - prev.tick),
                None => span_seconds(ppq, DEFAULT_US_PER_QUARTER, point.tick),
            };
            segments.push(Segment {
                tick: point.tick,
                us_per_quarter: point.us_per_quarter,
                seconds,
            });
        }
        if segments.is_empty() {
            segments.push(Segment {
                tick: 0,
                us_per_quarter: DEFAULT_US_PER_QUARTER,
                seconds: 0.0,
            });
        }
        Self { ppq, segments }
    }

    pub fn seconds_at(&self, tick: Tick) -> Seconds {
        let idx = self
            .segments
            .partition_point(|segment| segment.tick <= tick)
            .saturating_sub(1);
        let segment = self.segments[idx];
        segment.seconds + span_seconds(self.ppq, segment.us_per_quarter, tick - segment.tick)
    }
}

fn span_seconds(ppq: u16, us_per_quarter: u32, ticks: Tick) -> Seconds {
    ticks as f64 * us_per_quarter as f64 / 1_000_000.0 / ppq as f64
}

pub fn bpm_from_us_per_quarter(us_per_quarter: u32) -> f64 {
    if us_per_quarter == 0 {
        return 0.0;
    }
    60_000_000.0 / us_per_quarter as f64
}

/// Sorted tempo points starting at tick 0. The flag is set whenever the default
/// tempo had to be inserted, including before a first tempo event after tick 0.
pub fn build_tempo_map(
    tempo_points: BTreeMap<Tick, u32>,
    override_us_per_quarter: Option<u32>,
) -> (Vec<TempoPoint>, bool) {
    if let Some(us_per_quarter) = override_us_per_quarter {
        return (
            vec![TempoPoint {
                tick: 0,
                us_per_quarter,
            }],
            false,
        );
    }

    let mut map: Vec<TempoPoint> = tempo_points
        .into_iter()
        .map(|(tick, us_per_quarter)| TempoPoint {
            tick,
            us_per_quarter,
        })
        .collect();

    let defaulted = map.first().map_or(true, |first| first.tick != 0);
    if defaulted {
        map.insert(
            0,
            TempoPoint {
                tick: 0,
                us_per_quarter: DEFAULT_US_PER_QUARTER,
            },
        );
    }

    (map, defaulted)
}

pub fn timecode_ppq_and_tempo(fps: Fps, ticks_per_frame: u8) -> (u16, u32) {
    let ticks_per_frame = ticks_per_frame.max(1) as u16;
    match fps {
        Fps::Fps24 => (24 * ticks_per_frame, 1_000_000),
        Fps::Fps25 => (25 * ticks_per_frame, 1_000_000),
        Fps::Fps30 => (30 * ticks_per_frame, 1_000_000),
        Fps::Fps29 => (30 * ticks_per_frame, 1_001_000),
    }
}
