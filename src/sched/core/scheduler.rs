//! Dispatcher e pontos de reescalonamento
//!
//! O loop de dispatch extrai o menor vruntime da árvore, concede uma fatia
//! proporcional ao peso e troca o contexto. O lock da tabela atravessa a
//! troca: o lado que retoma a execução é quem libera (ou o epílogo de
//! primeira execução, no caso de um processo recém-criado).

use core::sync::atomic::Ordering;

use crate::hal::CpuContext;
use crate::sched::core::cpu::CpuLocal;
use crate::sched::proc::accounting::{tick, time_slice_for};
use crate::sched::proc::{Pcb, ProcState, SlotId};
use crate::sched::table::ProcTable;
use crate::sched::Scheduler;
use crate::sync::SpinlockGuard;

/// Escolhe o próximo processo: extrai o menor vruntime e calcula sua fatia
/// sobre o peso agregado lido antes da extração.
pub(crate) fn pick_next(table: &mut ProcTable) -> Option<SlotId> {
    let total = table.tree.total_weight;
    let period = table.tree.period;
    let slot = table.tree.extract_min(&mut table.procs)?;
    let p = &mut table.procs[slot];
    p.time_slice = time_slice_for(p.weight, total, period);
    p.curr_runtime = 0;
    Some(slot)
}

/// O corrente deve ceder a CPU?
///
/// Nunca preempta com a árvore vazia (não há para quem); caso contrário,
/// quando a fatia se esgota ou quando alguém espera com vruntime menor.
pub(crate) fn should_preempt(procs: &[Pcb], current: SlotId, min: Option<SlotId>) -> bool {
    match min {
        None => false,
        Some(m) => {
            procs[current].curr_runtime >= procs[current].time_slice
                || procs[current].vruntime > procs[m].vruntime
        }
    }
}

impl Scheduler {
    /// Loop do dispatcher de uma CPU. Nunca retorna.
    ///
    /// Com a árvore vazia a CPU para até a próxima interrupção; com alguém
    /// pronto, ativa o espaço de endereçamento e troca o contexto. Quando o
    /// processo devolve a CPU (via sched), o loop continua daqui, ainda com
    /// o lock da tabela tomado.
    pub fn run(&self, cpu: &mut CpuLocal) -> ! {
        crate::kinfo!("Dispatcher ativo na cpu", cpu.id as u64);
        loop {
            // janela para interrupções pendentes entre dispatches
            crate::arch::enable_interrupts();

            let mut table = self.table().lock();
            match pick_next(&mut table) {
                Some(slot) => {
                    table.procs[slot].state = ProcState::Running;
                    cpu.running = Some(slot);
                    if let Some(asp) = table.procs[slot].aspace {
                        self.platform().activate_address_space(&asp);
                    }

                    let proc_ctx = &table.procs[slot].context as *const CpuContext;
                    let sched_ctx = &mut cpu.sched_ctx as *mut CpuContext;
                    // o lock atravessa a troca; quem retomar do outro lado
                    // libera (sched ao voltar, ou o epílogo de primeira
                    // execução num processo novo)
                    unsafe {
                        self.platform().swap_context(sched_ctx, proc_ctx);
                    }

                    // o processo devolveu a CPU e já mudou o próprio estado
                    self.platform().activate_kernel_space();
                    cpu.running = None;
                    drop(table);
                }
                None => {
                    drop(table);
                    crate::arch::halt();
                }
            }
        }
    }

    /// Devolve a CPU ao dispatcher. Interno: os chamadores (yield, sleep,
    /// exit) já mudaram o estado do corrente e seguram o lock da tabela.
    ///
    /// Os checkpoints de entrada são violações de contrato, não erros
    /// recuperáveis: continuar daqui corromperia a tabela.
    pub(crate) fn sched(&self, cpu: &mut CpuLocal, table: &mut SpinlockGuard<'_, ProcTable>) {
        let slot = cpu.current_slot();
        if !self.table().is_locked() {
            panic!("sched: lock da tabela não está tomado");
        }
        if crate::arch::interrupts_depth() != 1 {
            panic!("sched: seções sem interrupção aninhadas");
        }
        if table.procs[slot].state == ProcState::Running {
            panic!("sched: processo corrente ainda Running");
        }
        if crate::arch::interrupts_enabled() {
            panic!("sched: interrupções habilitadas");
        }

        // a flag de interrupção salva pertence a este contexto, não à CPU
        let saved_if = crate::arch::saved_interrupts();
        let proc_ctx = &mut table.procs[slot].context as *mut CpuContext;
        let sched_ctx = &cpu.sched_ctx as *const CpuContext;
        unsafe {
            self.platform().swap_context(proc_ctx, sched_ctx);
        }
        // de volta: o dispatcher nos escolheu de novo, lock ainda tomado
        crate::arch::set_saved_interrupts(saved_if);
    }

    /// Cede a CPU voluntariamente: volta para a árvore e chama o dispatcher
    pub fn yield_now(&self, cpu: &mut CpuLocal) {
        let mut table = self.table().lock();
        let slot = cpu.current_slot();
        table.make_runnable(slot);
        cpu.clear_need_resched();
        self.sched(cpu, &mut table);
    }

    /// Tick do relógio sobre esta CPU.
    ///
    /// Avança a contabilidade do corrente e decide preempção; o retorno de
    /// trap consome o pedido via [`CpuLocal::need_resched`] chamando
    /// [`Scheduler::yield_now`]. Em contexto de interrupção o lock nunca é
    /// esperado: se a tabela estiver ocupada, o tick é perdido.
    pub fn on_timer_tick(&self, cpu: &mut CpuLocal) -> bool {
        let mut table = match self.table().try_lock() {
            Some(t) => t,
            None => return false,
        };
        let slot = match cpu.current() {
            Some(s) => s,
            None => return false,
        };
        if table.procs[slot].state != ProcState::Running {
            return false;
        }

        tick(&mut table.procs[slot]);

        let min = table.tree.peek_min(&table.procs);
        let preempt = should_preempt(&table.procs, slot, min);
        if preempt {
            cpu.set_need_resched();
        }
        preempt
    }

    /// Epílogo da primeira execução de um processo novo.
    ///
    /// Todo processo criado por fork começa a executar por aqui, por
    /// convenção do contexto inicial: o dispatcher transferiu o controle
    /// segurando o lock da tabela, e este caminho o libera. O primeiro
    /// processo do sistema também dispara a inicialização do FS, que
    /// precisa de contexto de processo para poder dormir.
    ///
    /// # Safety
    /// Chamar exatamente uma vez, no início da primeira execução de um
    /// processo novo, com o lock da tabela herdado do dispatcher.
    pub unsafe fn first_run_epilogue(&self) {
        // o force_unlock fecha a seção sem interrupções do dispatcher e
        // restaura a flag, como o drop do guard faria
        unsafe {
            self.table().force_unlock();
        }

        if !self.fs_ready.swap(true, Ordering::AcqRel) {
            self.platform().init_filesystem();
        }
    }
}
