//! Sequential grading session over a scenario registry.
//!
//! One subject process at a time: wall-clock timing and exclusive capture of
//! the tracing channel both require an uncontended run, so there is no
//! parallelism here by design. The session owns the tally; per-scenario
//! failures (including launch errors) score zero and never halt iteration.
use crate::report::{ScenarioResult, SessionReport, SESSION_REPORT_SCHEMA_VERSION};
use crate::runner::SubjectRunner;
use crate::scenario::ScenarioSpec;
use crate::verify;
use std::io::Write;
use tracing::{debug, warn};

/// Weighted points accumulated across completed scenarios.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScoreTally {
    pub passed_points: u32,
    pub total_points: u32,
}

impl ScoreTally {
    fn record(&mut self, weight: u32, pass: bool) {
        self.total_points += weight;
        if pass {
            self.passed_points += weight;
        }
    }
}

/// Run every scenario in ascending identifier order, printing the
/// per-scenario PASS/FAIL contract and the final tally to stdout.
pub fn run(family: &str, specs: &[ScenarioSpec], runner: &SubjectRunner) -> SessionReport {
    let mut ordered: Vec<&ScenarioSpec> = specs.iter().collect();
    ordered.sort_by_key(|spec| spec.id);

    let mut tally = ScoreTally::default();
    let mut results = Vec::with_capacity(ordered.len());
    for spec in ordered {
        print!("Testing scenario {}:", spec.id);
        let _ = std::io::stdout().flush();
        let result = grade_one(spec, runner);
        tally.record(spec.weight, result.pass);
        if result.pass {
            println!("   PASSED");
        } else {
            println!("   FAILED");
            for line in &result.failures {
                println!("    {line}");
            }
            if let Some(error) = &result.error {
                println!("    {error}");
            }
        }
        results.push(result);
    }
    println!("Score: {}/{}", tally.passed_points, tally.total_points);

    SessionReport {
        schema_version: SESSION_REPORT_SCHEMA_VERSION,
        family: family.to_string(),
        scenarios: results,
        passed_points: tally.passed_points,
        total_points: tally.total_points,
    }
}

fn grade_one(spec: &ScenarioSpec, runner: &SubjectRunner) -> ScenarioResult {
    match runner.run(spec) {
        Ok(capture) => {
            let verdict = verify::verify(spec, &capture);
            debug!(
                scenario = spec.id,
                pass = verdict.pass,
                failures = verdict.failures.len(),
                "scenario graded"
            );
            ScenarioResult {
                id: spec.id,
                pass: verdict.pass,
                graded: true,
                failures: verdict.failures,
                error: None,
                elapsed_secs: Some(capture.elapsed.as_secs_f64()),
                weight: spec.weight,
            }
        }
        // An unlaunchable subject is a hard failure for this scenario only;
        // the session keeps going.
        Err(err) => {
            warn!(scenario = spec.id, error = %err, "subject did not run");
            ScenarioResult {
                id: spec.id,
                pass: false,
                graded: false,
                failures: Vec::new(),
                error: Some(format!("{err:#}")),
                elapsed_secs: None,
                weight: spec.weight,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ScoreTally;

    #[test]
    fn tally_accumulates_weighted_points() {
        let mut tally = ScoreTally::default();
        for pass in [true, true, false, true, false, true, true, true, true, false] {
            tally.record(1, pass);
        }
        assert_eq!(tally.passed_points, 7);
        assert_eq!(tally.total_points, 10);

        let mut weighted = ScoreTally::default();
        weighted.record(4, true);
        weighted.record(4, false);
        assert_eq!(weighted.passed_points, 4);
        assert_eq!(weighted.total_points, 8);
        assert!(weighted.passed_points <= weighted.total_points);
    }
}
