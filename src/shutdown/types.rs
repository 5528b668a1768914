use std::fmt;

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Ok,
    Interrupted,
    UncaughtFault,
    UncleanShutdown,
}

impl ExitStatus {
    pub fn code(&self) -> i32 {
        match self {
            ExitStatus::Ok => 0,
            ExitStatus::Interrupted => 2,
            ExitStatus::UncaughtFault => 99,
            ExitStatus::UncleanShutdown => 98,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownPhase {
    Running,
    Draining,
    Stopped,
}

/// What started the shutdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownTrigger {
    /// SIGTERM
    Terminate,
    /// SIGINT / Ctrl+C
    Interrupt,
    /// A panic or a failed listener.
    Fault(String),
}

impl ShutdownTrigger {
    /// Exit status of a drain that completed.
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            ShutdownTrigger::Terminate => ExitStatus::Ok,
            ShutdownTrigger::Interrupt => ExitStatus::Interrupted,
            ShutdownTrigger::Fault(_) => ExitStatus::UncaughtFault,
        }
    }
}

impl fmt::Display for ShutdownTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownTrigger::Terminate => write!(f, "SIGTERM"),
            ShutdownTrigger::Interrupt => write!(f, "SIGINT"),
            ShutdownTrigger::Fault(reason) => write!(f, "fault: {}", reason),
        }
    }
}
