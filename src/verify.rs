//! Multi-criterion verdict for one scenario run.
//!
//! Every configured criterion evaluates independently against the same
//! capture; nothing short-circuits, so a single run surfaces every violated
//! criterion in its diagnostic rather than only the first.
use crate::reduce;
use crate::runner::RunCapture;
use crate::scenario::ScenarioSpec;
use crate::signal::SignalId;
use crate::trace::{self, TraceEvent};
use crate::util::sha1_hex;

/// Pass/fail plus the diagnostic lines behind a failure.
#[derive(Debug, Clone)]
pub struct Verdict {
    pub pass: bool,
    pub failures: Vec<String>,
}

/// Evaluate every configured criterion of `spec` against `capture`.
/// Pure over its inputs: verifying the same capture twice yields the same
/// verdict.
pub fn verify(spec: &ScenarioSpec, capture: &RunCapture) -> Verdict {
    let events: Vec<TraceEvent> = trace::events(&capture.trace_lines).collect();
    let mut failures = Vec::new();

    if capture.timed_out {
        failures.push("killed by the hard deadline before completing".to_string());
    }

    check_signal_sequence(spec, &events, &mut failures);
    check_stdout_digest(spec, capture, &mut failures);
    check_payload_bytes(spec, capture, &events, &mut failures);
    check_time_budget(spec, capture, &mut failures);
    check_forbidden_signals(spec, &events, &mut failures);

    Verdict {
        pass: failures.is_empty(),
        failures,
    }
}

fn check_signal_sequence(spec: &ScenarioSpec, events: &[TraceEvent], failures: &mut Vec<String>) {
    let Some(expected) = &spec.signal_sequence else {
        return;
    };
    let expected: Vec<SignalId> = expected.iter().map(|code| SignalId::from(*code)).collect();
    let actual = reduce::signal_sequence(events);
    if actual != expected {
        failures.push(format!(
            "expected signal sequence [{}], observed [{}]",
            render_sequence(&expected),
            render_sequence(&actual)
        ));
    }
}

fn check_stdout_digest(spec: &ScenarioSpec, capture: &RunCapture, failures: &mut Vec<String>) {
    let Some(accepted) = &spec.stdout_digest_any else {
        return;
    };
    let digest = sha1_hex(&capture.stdout);
    if !accepted.contains(&digest.as_str()) {
        failures.push(format!("stdout digest {digest} not in the accepted set"));
    }
}

fn check_payload_bytes(
    spec: &ScenarioSpec,
    capture: &RunCapture,
    events: &[TraceEvent],
    failures: &mut Vec<String>,
) {
    if !spec.payload_bytes_match {
        return;
    }
    let received = reduce::payload_bytes(events);
    let stdout_len = capture.stdout.len() as i64;
    // A single trailing newline on stdout is tolerated as the one allowed
    // alternate length; everything else must match exactly.
    let newline_tolerated =
        stdout_len == received + 1 && capture.stdout.last() == Some(&b'\n');
    if stdout_len != received && !newline_tolerated {
        failures.push(format!(
            "received {received} payload bytes over the wire, output {stdout_len} bytes"
        ));
    }
}

fn check_time_budget(spec: &ScenarioSpec, capture: &RunCapture, failures: &mut Vec<String>) {
    let Some(budget) = spec.time_budget_secs else {
        return;
    };
    // Truncated, not rounded: 3.9s against a budget of 3 passes.
    let elapsed = capture.elapsed.as_secs();
    if elapsed > budget {
        failures.push(format!(
            "elapsed {elapsed}s exceeds the {budget}s budget"
        ));
    }
}

fn check_forbidden_signals(spec: &ScenarioSpec, events: &[TraceEvent], failures: &mut Vec<String>) {
    let Some(forbidden) = &spec.forbidden_signals else {
        return;
    };
    let forbidden: Vec<SignalId> = forbidden.iter().map(|token| SignalId::parse(token)).collect();
    let delivered: Vec<&str> = reduce::kill_operands(events)
        .filter(|operand| forbidden.contains(&SignalId::parse(operand)))
        .collect();
    if !delivered.is_empty() {
        failures.push(format!(
            "forbidden signal(s) delivered: {}",
            delivered.join(", ")
        ));
    }
}

fn render_sequence(sequence: &[SignalId]) -> String {
    sequence
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::verify;
    use crate::runner::RunCapture;
    use crate::scenario::{ScenarioSpec, TraceClass};
    use crate::util::sha1_hex;
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn spec() -> ScenarioSpec {
        ScenarioSpec {
            id: 0,
            args: Vec::new(),
            env: BTreeMap::new(),
            clear_env: false,
            trace_class: TraceClass::Signal,
            signal_sequence: None,
            stdout_digest_any: None,
            payload_bytes_match: false,
            time_budget_secs: None,
            forbidden_signals: None,
            weight: 1,
        }
    }

    fn capture(stdout: &[u8], trace: &[&str]) -> RunCapture {
        RunCapture {
            stdout: stdout.to_vec(),
            trace_lines: trace.iter().map(|line| line.to_string()).collect(),
            elapsed: Duration::from_millis(100),
            timed_out: false,
        }
    }

    #[test]
    fn no_criteria_other_than_registry_guard_means_pass() {
        // The registry rejects criterion-free specs, but the verifier itself
        // must not fail a spec whose only unset criteria are unset.
        let verdict = verify(&spec(), &capture(b"anything", &["kill(1, SIGKILL) = 0"]));
        assert!(verdict.pass, "failures: {:?}", verdict.failures);
    }

    #[test]
    fn signal_sequence_requires_exact_order() {
        let mut s = spec();
        s.signal_sequence = Some(vec![1, 2, 25]);
        let ok = capture(
            b"",
            &[
                "kill(123, SIGHUP) = 0",
                "kill(123, SIGINT) = 0",
                "kill(123, 25) = 0",
            ],
        );
        assert!(verify(&s, &ok).pass);

        let reordered = capture(
            b"",
            &[
                "kill(123, SIGINT) = 0",
                "kill(123, SIGHUP) = 0",
                "kill(123, 25) = 0",
            ],
        );
        assert!(!verify(&s, &reordered).pass);
    }

    #[test]
    fn signal_sequence_multiplicity_matters() {
        let mut s = spec();
        s.signal_sequence = Some(vec![1, 2, 1, 2]);
        let interleaved = capture(
            b"",
            &[
                "kill(9, SIGHUP) = 0",
                "kill(9, SIGINT) = 0",
                "kill(9, SIGHUP) = 0",
                "kill(9, SIGINT) = 0",
            ],
        );
        assert!(verify(&s, &interleaved).pass);

        let paired = capture(
            b"",
            &[
                "kill(9, SIGHUP) = 0",
                "kill(9, SIGHUP) = 0",
                "kill(9, SIGINT) = 0",
                "kill(9, SIGINT) = 0",
            ],
        );
        assert!(!verify(&s, &paired).pass);
    }

    #[test]
    fn payload_length_accepts_n_and_newline_terminated_n_plus_one() {
        let mut s = spec();
        s.payload_bytes_match = true;
        let trace = [
            "recvfrom(3, \"...\", 512, 0, NULL, NULL) = 108",
            "recvfrom(3, \"...\", 512, 0, NULL, NULL) = 108",
            "recvfrom(3, \"...\", 512, 0, NULL, NULL) = 60",
        ];

        let exact = vec![b'x'; 252];
        assert!(verify(&s, &capture(&exact, &trace)).pass);

        let mut with_newline = vec![b'x'; 252];
        with_newline.push(b'\n');
        assert!(verify(&s, &capture(&with_newline, &trace)).pass);

        let plus_one_no_newline = vec![b'x'; 253];
        assert!(!verify(&s, &capture(&plus_one_no_newline, &trace)).pass);

        let short = vec![b'x'; 251];
        assert!(!verify(&s, &capture(&short, &trace)).pass);

        let mut plus_two = vec![b'x'; 253];
        plus_two.push(b'\n');
        assert!(!verify(&s, &capture(&plus_two, &trace)).pass);
    }

    #[test]
    fn forbidden_matching_is_symmetric_across_forms() {
        let mut s = spec();
        s.forbidden_signals = Some(vec!["SIGKILL"]);
        let numeric = capture(b"", &["kill(55, 9) = 0"]);
        assert!(!verify(&s, &numeric).pass);

        s.forbidden_signals = Some(vec!["9"]);
        let symbolic = capture(b"", &["kill(55, SIGKILL) = 0"]);
        assert!(!verify(&s, &symbolic).pass);

        s.forbidden_signals = Some(vec!["SIGKILL", "9"]);
        let clean = capture(b"", &["kill(55, SIGTERM) = 0"]);
        assert!(verify(&s, &clean).pass);
    }

    #[test]
    fn forbidden_check_sees_errno_annotated_kills() {
        let mut s = spec();
        s.forbidden_signals = Some(vec!["SIGKILL"]);
        let denied = capture(b"", &["kill(1, SIGKILL) = -1 EPERM (Operation not permitted)"]);
        assert!(!verify(&s, &denied).pass);
    }

    #[test]
    fn time_budget_truncates_elapsed_seconds() {
        let mut s = spec();
        s.time_budget_secs = Some(3);

        let mut under = capture(b"", &[]);
        under.elapsed = Duration::from_millis(3900);
        assert!(verify(&s, &under).pass);

        let mut over = capture(b"", &[]);
        over.elapsed = Duration::from_millis(4200);
        assert!(!verify(&s, &over).pass);
    }

    #[test]
    fn stdout_digest_allow_list_accepts_any_member() {
        let mut s = spec();
        let digest = sha1_hex(b"treasure");
        let leaked: &'static str = Box::leak(digest.into_boxed_str());
        s.stdout_digest_any = Some(vec!["0000000000000000000000000000000000000000", leaked]);
        assert!(verify(&s, &capture(b"treasure", &[])).pass);
        assert!(!verify(&s, &capture(b"fools-gold", &[])).pass);
    }

    #[test]
    fn diagnostic_names_every_violated_criterion() {
        let mut s = spec();
        s.signal_sequence = Some(vec![1]);
        s.forbidden_signals = Some(vec!["SIGKILL"]);
        s.time_budget_secs = Some(1);

        let mut c = capture(b"", &["kill(7, SIGKILL) = 0"]);
        c.elapsed = Duration::from_secs(5);
        let verdict = verify(&s, &c);
        assert!(!verdict.pass);
        assert_eq!(verdict.failures.len(), 3, "{:?}", verdict.failures);
    }

    #[test]
    fn verification_is_idempotent_over_a_capture() {
        let mut s = spec();
        s.signal_sequence = Some(vec![1, 2]);
        let c = capture(b"", &["kill(3, SIGHUP) = 0", "kill(3, SIGINT) = 0"]);
        let first = verify(&s, &c);
        let second = verify(&s, &c);
        assert_eq!(first.pass, second.pass);
        assert_eq!(first.failures, second.failures);
    }
}
