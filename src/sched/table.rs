//! Tabela de processos
//!
//! Arena fixa de slots mais a árvore de execução, protegidas por um único
//! spinlock (em [`crate::Scheduler`]). Por convenção o lock atravessa a
//! troca de contexto: quem retoma a execução do outro lado o libera.

use crate::sched::config::{NICE_MAX, NICE_MIN, NPROC};
use crate::sched::error::{SchedError, SchedResult};
use crate::sched::proc::accounting::compute_weight;
use crate::sched::proc::{Pcb, Pid, ProcFlags, ProcState, SlotId, WaitChannel};
use crate::sched::tree::RunTree;

/// Estado compartilhado do escalonador: arena de PCBs, árvore de prontos e
/// o slot do init (destino de reparentamento)
pub struct ProcTable {
    pub procs: [Pcb; NPROC],
    pub tree: RunTree,
    pub init_slot: Option<SlotId>,
}

impl ProcTable {
    pub const fn new() -> Self {
        const UNUSED: Pcb = Pcb::unused();
        Self {
            procs: [UNUSED; NPROC],
            tree: RunTree::new(),
            init_slot: None,
        }
    }

    /// Localiza um processo vivo pelo pid. `Pid::NONE` nunca casa.
    pub fn find(&self, pid: Pid) -> Option<SlotId> {
        if pid == Pid::NONE {
            return None;
        }
        (0..NPROC)
            .map(SlotId)
            .find(|&s| self.procs[s].pid == pid && self.procs[s].state != ProcState::Unused)
    }

    /// Torna um processo pronto e o insere na árvore de execução.
    ///
    /// Único ponto de entrada para o estado Runnable; a inserção na árvore
    /// acompanha a transição para que um processo esteja na árvore se e
    /// somente se estiver Runnable.
    pub(crate) fn make_runnable(&mut self, slot: SlotId) {
        match self.procs[slot].state {
            ProcState::Embryo | ProcState::Running | ProcState::Sleeping => {}
            s => panic!("make_runnable: transição ilegal a partir de {:?}", s),
        }
        self.procs[slot].state = ProcState::Runnable;
        self.tree.insert(&mut self.procs, slot);
    }

    /// Acorda todos os processos dormindo no canal (broadcast).
    ///
    /// O canal não é limpo aqui: o dorminhoco o limpa ao retomar, e o estado
    /// Sleeping é a condição de corte (um processo já acordado não re-entra).
    pub(crate) fn wakeup_locked(&mut self, chan: WaitChannel) {
        for i in 0..NPROC {
            let s = SlotId(i);
            if self.procs[s].state == ProcState::Sleeping && self.procs[s].chan == Some(chan) {
                self.make_runnable(s);
            }
        }
    }

    /// Ajusta o nice de um processo e rederiva seu peso.
    ///
    /// Se o processo estiver na árvore, o peso agregado é corrigido na hora;
    /// a posição não muda (vruntime é a chave, não o peso).
    pub fn set_nice(&mut self, pid: Pid, nice: i32) -> SchedResult<()> {
        let slot = self.find(pid).ok_or(SchedError::NotFound)?;
        let nice = nice.clamp(NICE_MIN, NICE_MAX);
        let new_weight = compute_weight(nice);
        let old_weight = self.procs[slot].weight;
        self.procs[slot].nice = nice;
        self.procs[slot].weight = new_weight;
        if self.procs[slot].flags.contains(ProcFlags::ON_TREE) {
            self.tree.total_weight = self.tree.total_weight - old_weight + new_weight;
        }
        Ok(())
    }
}

impl Default for ProcTable {
    fn default() -> Self {
        Self::new()
    }
}
