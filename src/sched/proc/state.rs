//! Estados do ciclo de vida de um processo

/// Estado de um processo na tabela.
///
/// Transições válidas:
/// - Unused -> Embryo (alocação de slot)
/// - Embryo -> Runnable (fork concluído) | Unused (rollback de OOM)
/// - Runnable -> Running (dispatch)
/// - Running -> Runnable (yield/preempção) | Sleeping (sleep) | Zombie (exit)
/// - Sleeping -> Runnable (wakeup/kill)
/// - Zombie -> Unused (reap no wait do pai)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcState {
    Unused,
    Embryo,
    Runnable,
    Running,
    Sleeping,
    Zombie,
}

impl ProcState {
    /// Nome curto para o dump de diagnóstico
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unused => "unused",
            Self::Embryo => "embryo",
            Self::Runnable => "runnable",
            Self::Running => "running",
            Self::Sleeping => "sleeping",
            Self::Zombie => "zombie",
        }
    }
}
