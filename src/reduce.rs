//! Reductions from trace events to scenario-comparable summaries.
//!
//! Two modes: the ordered signal sequence a subject delivered, and the total
//! payload bytes a subject received net of per-chunk framing. Either output
//! is the comparand for a scenario's expected summary.
use crate::signal::SignalId;
use crate::trace::TraceEvent;
use tracing::debug;

/// Fixed per-chunk byte cost of the treasure protocol's framing header.
pub const CHUNK_FRAMING_OVERHEAD: i64 = 8;

/// Raw-line marker for DNS resolver traffic, which must never count as
/// treasure payload even though it arrives through the same receive calls.
const RESOLVER_PORT_MARKER: &str = "htons(53)";

const RECEIVE_CALLS: &[&str] = &["recv", "recvfrom", "recvmsg"];

/// Ordered signal operands across every `kill` event. Duplicates are
/// preserved: order and multiplicity both distinguish subjects.
pub fn signal_sequence(events: &[TraceEvent]) -> Vec<SignalId> {
    let sequence: Vec<SignalId> = kill_operands(events)
        .map(|operand| SignalId::parse(operand))
        .collect();
    debug!(delivered = sequence.len(), "signal-sequence reduction");
    sequence
}

/// Signal operand tokens of every `kill` event, in encounter order.
pub fn kill_operands(events: &[TraceEvent]) -> impl Iterator<Item = &str> + '_ {
    events
        .iter()
        .filter(|event| event.name == "kill")
        .filter_map(|event| event.args.get(1).map(String::as_str))
}

/// Total payload bytes over qualifying receive events, net of framing.
///
/// A return of 0 or 1 marks a non-data or error condition and is excluded;
/// resolver-port lines are excluded outright. The sum is signed, so a
/// qualifying return smaller than the framing overhead contributes a
/// negative term.
pub fn payload_bytes(events: &[TraceEvent]) -> i64 {
    let mut total = 0i64;
    let mut chunks = 0usize;
    for event in events {
        if !RECEIVE_CALLS.contains(&event.name.as_str()) {
            continue;
        }
        if event.raw.contains(RESOLVER_PORT_MARKER) {
            continue;
        }
        let Some(received) = event.retval else {
            continue;
        };
        if received > 1 {
            total += received - CHUNK_FRAMING_OVERHEAD;
            chunks += 1;
        }
    }
    debug!(chunks, total, "payload-byte reduction");
    total
}
