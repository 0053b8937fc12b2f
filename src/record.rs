//! Counter record parsing
//!
//! A run is a stream of `timestamp count event` lines, one line per counter
//! read-out. An `instructions` line opens a new row, L3 events that follow it
//! are folded into that row.
use crate::{PhaseError, Result};
use std::io::BufRead;

/// Hardware event carried by one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterEvent {
    /// retired instructions, opens a new row
    Instructions,
    /// LLC-loads
    L3Loads,
    /// LLC-stores, added to L3 requests
    L3Stores,
    /// LLC-loads-misses
    L3LoadMisses,
    /// anything we do not track
    Other,
}

impl CounterEvent {
    pub fn classify(name: &str) -> Self {
        if name.contains("instructions") {
            CounterEvent::Instructions
        } else if name.contains("LLC-loads") && !name.contains("misses") {
            CounterEvent::L3Loads
        } else if name.contains("LLC-stores") {
            CounterEvent::L3Stores
        } else if name.contains("LLC-loads-misses") {
            CounterEvent::L3LoadMisses
        } else {
            CounterEvent::Other
        }
    }
}

/// One parsed `{timestamp, event_type, count}` triple
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawRecord {
    pub timestamp: f64,
    pub count: u64,
    pub event: CounterEvent,
}

impl RawRecord {
    /// Parse a single line. Comments, blank lines and lines with fewer than
    /// three fields yield `Ok(None)`.
    pub fn parse_line(line: &str) -> std::result::Result<Option<RawRecord>, String> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 3 {
            return Ok(None);
        }

        let timestamp: f64 = parts[0]
            .parse()
            .map_err(|_| format!("invalid timestamp {:?}", parts[0]))?;
        if !timestamp.is_finite() || timestamp < 0.0 {
            return Err(format!("timestamp out of range: {}", timestamp));
        }

        // "<not counted>" and "<not supported>" span two tokens
        let (count, event) = if parts[1].starts_with("<not") {
            let close = parts[1..]
                .iter()
                .position(|part| part.ends_with('>'))
                .map(|offset| offset + 1)
                .ok_or_else(|| format!("unterminated counter marker {:?}", parts[1]))?;
            match parts.get(close + 1) {
                Some(event) => (0, *event),
                None => return Ok(None),
            }
        } else {
            let count: u64 = parts[1]
                .replace(',', "")
                .parse()
                .map_err(|_| format!("invalid count {:?}", parts[1]))?;
            (count, parts[2])
        };

        Ok(Some(RawRecord {
            timestamp,
            count,
            event: CounterEvent::classify(event),
        }))
    }
}

/// Counters read out at one sampling instant
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CounterRow {
    pub time: f64,
    pub instructions: u64,
    pub l3_requests: u64,
    pub l3_misses: u64,
}

/// Rows of one run plus the lines that had to be skipped
#[derive(Debug)]
pub struct RunRecords {
    pub name: String,
    pub rows: Vec<CounterRow>,
    /// per-line `MalformedRecord` errors that were tolerated
    pub diagnostics: Vec<PhaseError>,
}

impl RunRecords {
    pub fn from_rows(name: &str, rows: Vec<CounterRow>) -> Self {
        RunRecords {
            name: name.to_string(),
            rows,
            diagnostics: vec![],
        }
    }
}

/// Parse a whole run. Bad lines are skipped and kept as diagnostics, a run
/// without any instruction counter is rejected.
pub fn parse_run<R: BufRead>(name: &str, reader: R) -> Result<RunRecords> {
    let mut rows: Vec<CounterRow> = vec![];
    let mut diagnostics = vec![];

    let malformed = |line: usize, reason: String| PhaseError::MalformedRecord {
        source_name: name.to_string(),
        line,
        reason,
    };

    for (index, line) in reader.lines().enumerate() {
        let line_number = index + 1;
        let line = line.map_err(|err| malformed(line_number, err.to_string()))?;

        let record = match RawRecord::parse_line(&line) {
            Ok(Some(record)) => record,
            Ok(None) => continue,
            Err(reason) => {
                let err = malformed(line_number, reason);
                log::warn!("{}", err);
                diagnostics.push(err);
                continue;
            }
        };

        if record.event == CounterEvent::Instructions {
            rows.push(CounterRow {
                time: record.timestamp,
                instructions: record.count,
                l3_requests: 0,
                l3_misses: 0,
            });
            continue;
        }

        let Some(row) = rows.last_mut() else {
            if record.event != CounterEvent::Other {
                let err = malformed(line_number, "L3 counter before any instructions".into());
                log::warn!("{}", err);
                diagnostics.push(err);
            }
            continue;
        };
        match record.event {
            CounterEvent::L3Loads => row.l3_requests = record.count,
            CounterEvent::L3Stores => row.l3_requests += record.count,
            CounterEvent::L3LoadMisses => row.l3_misses = record.count,
            CounterEvent::Instructions | CounterEvent::Other => {}
        }
    }

    if rows.is_empty() {
        return Err(malformed(0, "no instructions counter in run".into()));
    }

    Ok(RunRecords {
        name: name.to_string(),
        rows,
        diagnostics,
    })
}
