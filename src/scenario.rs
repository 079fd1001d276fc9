//! Declarative scenario specifications and the per-family registries.
//!
//! A scenario is pure data: the subject invocation plus the criteria that
//! decide pass/fail. The three families are built explicitly at startup from
//! fixed tables; lookup by identifier is a table scan, and an out-of-range
//! identifier is a configuration error, not a reflection failure.
use anyhow::{bail, Result};
use std::collections::BTreeMap;

/// Syscall class the tracer captures for a scenario family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceClass {
    Signal,
    Network,
    Untraced,
}

impl TraceClass {
    /// Tracer expression selecting this class, `None` for untraced runs.
    pub fn trace_filter(self) -> Option<&'static str> {
        match self {
            TraceClass::Signal => Some("%signal"),
            TraceClass::Network => Some("%network"),
            TraceClass::Untraced => None,
        }
    }
}

/// One independently scored test case.
#[derive(Debug, Clone)]
pub struct ScenarioSpec {
    /// Unique identifier within the family registry.
    pub id: u32,
    /// Argument vector appended after the subject path.
    pub args: Vec<String>,
    /// Environment variables set for the subject.
    pub env: BTreeMap<String, String>,
    /// Replace the inherited environment entirely instead of overlaying.
    pub clear_env: bool,
    pub trace_class: TraceClass,
    /// Exact ordered signal codes the trace must show.
    pub signal_sequence: Option<Vec<i32>>,
    /// SHA-1 hex digests accepted for the subject's stdout bytes.
    pub stdout_digest_any: Option<Vec<&'static str>>,
    /// Require stdout length to match the payload-byte reduction.
    pub payload_bytes_match: bool,
    /// Upper bound on truncated wall-clock seconds.
    pub time_budget_secs: Option<u64>,
    /// Signal identifiers (names or numeric strings) that must never be
    /// delivered.
    pub forbidden_signals: Option<Vec<&'static str>>,
    /// Points this scenario contributes on pass.
    pub weight: u32,
}

impl ScenarioSpec {
    fn base(id: u32, trace_class: TraceClass, weight: u32) -> ScenarioSpec {
        ScenarioSpec {
            id,
            args: Vec::new(),
            env: BTreeMap::new(),
            clear_env: false,
            trace_class,
            signal_sequence: None,
            stdout_digest_any: None,
            payload_bytes_match: false,
            time_budget_secs: None,
            forbidden_signals: None,
            weight,
        }
    }

    /// A spec with no criterion at all would pass vacuously; that is a
    /// registry bug, not a gradable scenario.
    pub fn has_criterion(&self) -> bool {
        self.signal_sequence.is_some()
            || self.stdout_digest_any.is_some()
            || self.payload_bytes_match
            || self.time_budget_secs.is_some()
            || self.forbidden_signals.is_some()
    }
}

/// Expected signal sequences for scenarios 0..=9 of the signal family.
const SIGNAL_SOLUTIONS: &[&[i32]] = &[
    &[1, 2, 25],
    &[],
    &[1, 2],
    &[1, 2, 1, 2],
    &[1, 1, 2, 2],
    &[1],
    &[1, 2, 7, 10],
    &[1, 2, 7],
    &[1, 2, 6],
    &[8, 9, 1, 2],
];

const DEFAULT_FORBIDDEN: &[&str] = &["SIGKILL", "9"];
/// Scenario 9 inverts the policy: the usual polite signals are the ones
/// banned there.
const SCENARIO_9_FORBIDDEN: &[&str] = &["SIGHUP", "SIGINT", "1", "2"];

/// Server seeds exercised per treasure-hunt level.
pub const HUNT_SEEDS: &[u32] = &[7719, 33833, 20468, 19789, 59455];

pub const HUNT_LEVELS: u32 = 5;

/// Accepted stdout digests for the treasure payload, one per known treasure.
const HUNT_DIGESTS: &[&str] = &[
    "127624217659f4ba97d5457391edc8f60758714b",
    "2483b89fefaee5a83c25ba92dda9bd004357d6b1",
    "285e8e43bf9d8b7204f6972a3be88b8a599b068d",
    "3334488d5b819492e13335105df59164acbf98a0",
    "384835f2469dbb37a6eb0bbf6f66e45677f61423",
    "3f362e32653be4ab829fd7b9838fdfe71c01385d",
    "5bc7244d527b79d2625d51ab514f0412d22acc2c",
    "7514a7a267acdfed8de2bcf0729a2037035c3acd",
    "b156795f7b657f2fe33639b4f0bb3f6193960f79",
    "c2f7e1078c91ab8ce0674680e7d2e7ab9a335a06",
    "c41d89fe9ebac2cf06fc8e3f0f0f8335ec9dce8f",
    "c657aeed6d2c2eeb40382898cdd4f3d25182c719",
    "d29e5524dda590d2eaf097e9e32b53cb9770e965",
    "dec427a457cc1cba9533630a2c511cd5f21aa1f0",
    "fee33676b4c20e5b267ba40b2eba3c2c7ee3d260",
    "ffb54044122cb1883513849d396cf144af3e0ed4",
];

/// Query strings and accepted stdout digests for the CGI family.
const CGI_QUERY_STRINGS: &[&str] = &["foo=bar", "abc=123&def=456"];

const CGI_DIGESTS: &[&str] = &[
    "990fa95231a668077ead7d8c4d507ec68025195f",
    "aebcb07b31ab0de071b43097fddc108b4567a9bf",
    "74fecf3429321d8e3f034c5684d7948d78b37f94",
    "19fa1bc24ef9d9d0ddda9ee6a6168c393fae5e27",
];

/// Signal family: ten killer scenarios graded by delivered-signal order.
pub fn signal_registry(killer: &str) -> Vec<ScenarioSpec> {
    SIGNAL_SOLUTIONS
        .iter()
        .enumerate()
        .map(|(idx, solution)| {
            let id = idx as u32;
            let mut spec = ScenarioSpec::base(id, TraceClass::Signal, 1);
            spec.args = vec![killer.to_string(), id.to_string()];
            spec.signal_sequence = Some(solution.to_vec());
            spec.forbidden_signals = Some(if id == 9 {
                SCENARIO_9_FORBIDDEN.to_vec()
            } else {
                DEFAULT_FORBIDDEN.to_vec()
            });
            spec
        })
        .collect()
}

/// Network family: every level/seed pairing, graded by treasure digest and
/// received-byte consistency. `level` restricts to one level.
pub fn hunt_registry(server: &str, port: u16, level: Option<u32>) -> Result<Vec<ScenarioSpec>> {
    if let Some(level) = level {
        if level >= HUNT_LEVELS {
            bail!("unknown level {level} (levels run 0..={})", HUNT_LEVELS - 1);
        }
    }
    let levels = match level {
        Some(level) => level..level + 1,
        None => 0..HUNT_LEVELS,
    };
    let mut specs = Vec::new();
    for level in levels {
        for (seed_idx, seed) in HUNT_SEEDS.iter().enumerate() {
            let id = level * HUNT_SEEDS.len() as u32 + seed_idx as u32;
            let mut spec = ScenarioSpec::base(id, TraceClass::Network, 4);
            spec.args = vec![
                server.to_string(),
                port.to_string(),
                level.to_string(),
                seed.to_string(),
            ];
            spec.stdout_digest_any = Some(HUNT_DIGESTS.to_vec());
            spec.payload_bytes_match = true;
            specs.push(spec);
        }
    }
    Ok(specs)
}

/// CGI family: untraced runs with a fully replaced environment carrying the
/// literal `QUERY_STRING` variable.
pub fn cgi_registry() -> Vec<ScenarioSpec> {
    CGI_QUERY_STRINGS
        .iter()
        .enumerate()
        .map(|(idx, query)| {
            let mut spec = ScenarioSpec::base(idx as u32, TraceClass::Untraced, 1);
            spec.env
                .insert("QUERY_STRING".to_string(), (*query).to_string());
            spec.clear_env = true;
            spec.stdout_digest_any = Some(CGI_DIGESTS.to_vec());
            spec
        })
        .collect()
}

/// Reject malformed registries before any subject launches.
pub fn validate_registry(specs: &[ScenarioSpec]) -> Result<()> {
    let mut seen = std::collections::BTreeSet::new();
    for spec in specs {
        if !seen.insert(spec.id) {
            bail!("duplicate scenario id {}", spec.id);
        }
        if !spec.has_criterion() {
            bail!(
                "scenario {} has no criterion and would pass vacuously",
                spec.id
            );
        }
    }
    Ok(())
}

/// Narrow a registry to one scenario, or keep it whole. Unknown identifiers
/// fail before any subject launches.
pub fn select(specs: Vec<ScenarioSpec>, id: Option<u32>) -> Result<Vec<ScenarioSpec>> {
    let Some(id) = id else {
        return Ok(specs);
    };
    let selected: Vec<ScenarioSpec> = specs.into_iter().filter(|spec| spec.id == id).collect();
    if selected.is_empty() {
        bail!("unknown scenario {id}");
    }
    Ok(selected)
}
