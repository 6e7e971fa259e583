//! Subsistema de escalonamento
//!
//! Tabela fixa de processos mais uma árvore rubro-negra de prontos ordenada
//! por vruntime: o dispatcher sempre extrai o processo que menos tempo
//! virtual acumulou, e a fatia concedida é proporcional ao peso derivado do
//! nice. Um único spinlock protege tabela e árvore; por convenção ele
//! atravessa a troca de contexto.

pub mod config;
pub mod core;
pub mod error;
pub mod proc;
pub mod table;
pub mod tree;

#[cfg(any(test, feature = "self_test"))]
pub mod test;

use ::core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::hal::Platform;
use crate::sync::Spinlock;

pub use self::core::{CpuLocal, ProcInfo, TreeInfo};
pub use error::{SchedError, SchedResult};
pub use proc::{Pid, ProcState, WaitChannel};
pub use table::ProcTable;

/// O escalonador: estado compartilhado sob um único lock, mais os serviços
/// da plataforma. Uma instância por kernel (ver [`init`]).
pub struct Scheduler {
    platform: &'static dyn Platform,
    table: Spinlock<ProcTable>,
    /// Próximo pid a conceder; pids nunca são reciclados
    next_pid: AtomicU32,
    /// A inicialização tardia do FS já aconteceu?
    pub(crate) fs_ready: AtomicBool,
}

impl Scheduler {
    pub fn new(platform: &'static dyn Platform) -> Self {
        Self {
            platform,
            table: Spinlock::new(ProcTable::new()),
            next_pid: AtomicU32::new(1),
            fs_ready: AtomicBool::new(false),
        }
    }

    pub(crate) fn platform(&self) -> &'static dyn Platform {
        self.platform
    }

    pub(crate) fn table(&self) -> &Spinlock<ProcTable> {
        &self.table
    }

    pub(crate) fn fresh_pid(&self) -> Pid {
        Pid(self.next_pid.fetch_add(1, Ordering::Relaxed))
    }

    /// Ajusta o nice de um processo vivo (grampeado em [-20, 19])
    pub fn set_nice(&self, pid: Pid, nice: i32) -> SchedResult<()> {
        self.table.lock().set_nice(pid, nice)
    }
}

static SCHED: spin::Once<Scheduler> = spin::Once::new();

/// Instala o escalonador global. Chamadas repetidas devolvem a primeira
/// instância.
pub fn init(platform: &'static dyn Platform) -> &'static Scheduler {
    SCHED.call_once(|| {
        crate::kinfo!("Inicializando o escalonador");
        Scheduler::new(platform)
    })
}

/// Escalonador global, se já instalado
pub fn get() -> Option<&'static Scheduler> {
    SCHED.get()
}
