//! Introspecção e dump de diagnóstico

use crate::sched::config::{BACKTRACE_DEPTH, NPROC};
use crate::sched::error::{SchedError, SchedResult};
use crate::sched::proc::{Pid, ProcState, SlotId};
use crate::sched::Scheduler;

/// Retrato de um processo num instante
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcInfo {
    pub pid: Pid,
    pub state: ProcState,
    pub nice: i32,
    pub weight: u64,
    pub vruntime: u64,
    pub curr_runtime: u64,
    pub time_slice: u64,
}

/// Retrato da árvore de execução num instante
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeInfo {
    pub count: usize,
    pub total_weight: u64,
    pub period: u64,
}

impl Scheduler {
    /// Campos de escalonamento de um processo vivo
    pub fn proc_info(&self, pid: Pid) -> SchedResult<ProcInfo> {
        let table = self.table().lock();
        let slot = table.find(pid).ok_or(SchedError::NotFound)?;
        let p = &table.procs[slot];
        Ok(ProcInfo {
            pid: p.pid,
            state: p.state,
            nice: p.nice,
            weight: p.weight,
            vruntime: p.vruntime,
            curr_runtime: p.curr_runtime,
            time_slice: p.time_slice,
        })
    }

    /// Agregados da árvore de execução
    pub fn tree_info(&self) -> TreeInfo {
        let table = self.table().lock();
        TreeInfo {
            count: table.tree.len(),
            total_weight: table.tree.total_weight,
            period: table.tree.period,
        }
    }

    /// A tabela não comporta mais processos prontos?
    pub fn tree_full(&self) -> bool {
        self.table().lock().tree.is_full()
    }

    /// Percorre a árvore inteira verificando as propriedades rubro-negras e
    /// a ordenação por vruntime. Para suites de teste e diagnóstico.
    pub fn tree_balanced(&self) -> bool {
        let table = self.table().lock();
        table.tree.check_invariants(&table.procs)
    }

    /// Despeja os processos vivos no log de diagnóstico.
    ///
    /// Pensado para o teclado de emergência: usa try_lock e desiste se a
    /// tabela estiver tomada, em vez de travar junto com a máquina.
    pub fn dump(&self) {
        let table = match self.table().try_lock() {
            Some(t) => t,
            None => {
                crate::kwarn!("dump: tabela ocupada, tente de novo");
                return;
            }
        };
        for i in 0..NPROC {
            let s = SlotId(i);
            let p = &table.procs[s];
            if p.state == ProcState::Unused {
                continue;
            }
            crate::kinfo!("--- processo ---");
            crate::kinfo!("pid:", p.pid.as_u32() as u64);
            crate::core::debug::klog::log_str(
                crate::core::debug::klog::LogLevel::Info,
                "estado:",
                p.state.as_str(),
            );
            crate::core::debug::klog::log_str(
                crate::core::debug::klog::LogLevel::Info,
                "nome:",
                p.name_str(),
            );
            crate::kinfo!("vruntime:", p.vruntime);
            if p.state == ProcState::Sleeping {
                // dorminhocos ganham o call-stack salvo no contexto
                let mut frames = [0u64; BACKTRACE_DEPTH];
                let n = self.platform().capture_backtrace(&p.context, &mut frames);
                for frame in &frames[..n] {
                    crate::kinfo!("  frame:", *frame);
                }
            }
        }
    }
}
