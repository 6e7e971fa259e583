//! Estado por CPU do escalonador

use crate::hal::CpuContext;
use crate::sched::proc::SlotId;

/// Estado privado de uma CPU: o processo corrente, o contexto do dispatcher
/// e o pedido pendente de reescalonamento.
///
/// Cada CPU é dona exclusiva do seu `CpuLocal` (passado por `&mut`), então
/// nada aqui precisa de lock.
pub struct CpuLocal {
    pub id: u32,
    /// Slot em execução nesta CPU, se houver
    pub(crate) running: Option<SlotId>,
    /// Contexto do loop do dispatcher, alvo do sched()
    pub(crate) sched_ctx: CpuContext,
    /// Um tick decidiu preemptar; o retorno de trap consome
    need_resched: bool,
}

impl CpuLocal {
    pub const fn new(id: u32) -> Self {
        Self {
            id,
            running: None,
            sched_ctx: CpuContext::zeroed(),
            need_resched: false,
        }
    }

    /// Slot do processo em execução nesta CPU
    pub fn current(&self) -> Option<SlotId> {
        self.running
    }

    /// Como `current`, mas operações que exigem contexto de processo
    /// (fork, sleep, exit) tratam a ausência como violação de contrato.
    pub(crate) fn current_slot(&self) -> SlotId {
        match self.running {
            Some(s) => s,
            None => panic!("cpu {}: nenhum processo em contexto", self.id),
        }
    }

    pub fn need_resched(&self) -> bool {
        self.need_resched
    }

    pub(crate) fn set_need_resched(&mut self) {
        self.need_resched = true;
    }

    pub(crate) fn clear_need_resched(&mut self) {
        self.need_resched = false;
    }
}
