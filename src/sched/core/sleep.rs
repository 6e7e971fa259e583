//! Sleep e wakeup sobre canais opacos
//!
//! O protocolo anti-perda de wakeup: o lock da tabela é tomado ANTES de
//! soltar o lock externo que protege a condição. Como todo wakeup também
//! passa pelo lock da tabela, nenhum wakeup cabe na janela entre soltar o
//! lock externo e marcar o processo como Sleeping.

use crate::sched::core::cpu::CpuLocal;
use crate::sched::proc::{ProcState, WaitChannel};
use crate::sched::table::ProcTable;
use crate::sched::Scheduler;
use crate::sync::SpinlockGuard;

impl Scheduler {
    /// Dorme no canal até um wakeup, soltando o lock externo durante o sono
    /// e devolvendo-o retomado.
    ///
    /// O lock externo é obrigatório por tipo: é ele que protege a condição
    /// que o chamador vai reavaliar, e sem ele o protocolo anti-perda de
    /// wakeup não existe. O chamador deve reavaliar a condição em loop: o
    /// wakeup é broadcast e a condição pode já ter sido consumida.
    pub fn sleep<'a, T>(
        &self,
        cpu: &mut CpuLocal,
        chan: WaitChannel,
        external: SpinlockGuard<'a, T>,
    ) -> SpinlockGuard<'a, T> {
        let external_lock = external.source();

        let mut table = self.table().lock();
        drop(external);

        self.sleep_locked(cpu, &mut table, chan);

        drop(table);
        external_lock.lock()
    }

    /// Variante para quem já segura o lock da tabela (wait dorme assim: o
    /// lock da condição E o da tabela são o mesmo, então não há janela).
    pub(crate) fn sleep_locked(
        &self,
        cpu: &mut CpuLocal,
        table: &mut SpinlockGuard<'_, ProcTable>,
        chan: WaitChannel,
    ) {
        let slot = cpu.current_slot();
        table.procs[slot].chan = Some(chan);
        table.procs[slot].state = ProcState::Sleeping;

        self.sched(cpu, table);

        // acordamos: o canal já cumpriu seu papel
        table.procs[slot].chan = None;
    }

    /// Acorda todos os processos dormindo no canal (broadcast)
    pub fn wakeup(&self, chan: WaitChannel) {
        self.table().lock().wakeup_locked(chan);
    }
}
