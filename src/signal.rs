//! Signal identifiers as they appear in trace operands and policy sets.
//!
//! Trace operands arrive as either symbolic names (`SIGHUP`) or numeric codes
//! (`1`), and scenario policies may mix both forms. Both canonicalize to the
//! numeric code through a table built on the `libc` constants; names the
//! table does not know stay symbolic and compare by string.
use std::fmt;

const SIGNAL_TABLE: &[(&str, i32)] = &[
    ("SIGHUP", libc::SIGHUP),
    ("SIGINT", libc::SIGINT),
    ("SIGQUIT", libc::SIGQUIT),
    ("SIGILL", libc::SIGILL),
    ("SIGTRAP", libc::SIGTRAP),
    ("SIGABRT", libc::SIGABRT),
    ("SIGBUS", libc::SIGBUS),
    ("SIGFPE", libc::SIGFPE),
    ("SIGKILL", libc::SIGKILL),
    ("SIGUSR1", libc::SIGUSR1),
    ("SIGSEGV", libc::SIGSEGV),
    ("SIGUSR2", libc::SIGUSR2),
    ("SIGPIPE", libc::SIGPIPE),
    ("SIGALRM", libc::SIGALRM),
    ("SIGTERM", libc::SIGTERM),
    ("SIGCHLD", libc::SIGCHLD),
    ("SIGCONT", libc::SIGCONT),
    ("SIGSTOP", libc::SIGSTOP),
    ("SIGTSTP", libc::SIGTSTP),
    ("SIGTTIN", libc::SIGTTIN),
    ("SIGTTOU", libc::SIGTTOU),
    ("SIGURG", libc::SIGURG),
    ("SIGXCPU", libc::SIGXCPU),
    ("SIGXFSZ", libc::SIGXFSZ),
    ("SIGVTALRM", libc::SIGVTALRM),
    ("SIGPROF", libc::SIGPROF),
    ("SIGWINCH", libc::SIGWINCH),
    ("SIGIO", libc::SIGIO),
    ("SIGSYS", libc::SIGSYS),
];

/// A signal operand in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SignalId {
    Code(i32),
    Name(String),
}

impl SignalId {
    /// Canonicalize a trace operand or policy token.
    pub fn parse(token: &str) -> SignalId {
        let token = token.trim();
        if let Ok(code) = token.parse::<i32>() {
            return SignalId::Code(code);
        }
        match SIGNAL_TABLE.iter().find(|(name, _)| *name == token) {
            Some((_, code)) => SignalId::Code(*code),
            None => SignalId::Name(token.to_string()),
        }
    }
}

impl From<i32> for SignalId {
    fn from(code: i32) -> SignalId {
        SignalId::Code(code)
    }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalId::Code(code) => write!(f, "{code}"),
            SignalId::Name(name) => f.write_str(name),
        }
    }
}
