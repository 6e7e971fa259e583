//! Testes do subsistema de escalonamento
//!
//! A suite `self_test` roda em bare-metal pelo framework do kernel e só
//! exercita o que não depende de plataforma (pesos, árvore, tabela). Os
//! testes hospedados cobrem o ciclo de vida completo com uma plataforma
//! simulada.

#[cfg(feature = "self_test")]
pub mod selftest {
    use crate::klib::test_framework::{run_test_suite, TestCase, TestResult};
    use crate::sched::config::{NICE_MAX, NICE_MIN, NPROC, SCHED_PERIOD};
    use crate::sched::proc::accounting::{compute_weight, time_slice_for, vruntime_delta};
    use crate::sched::proc::{Pcb, SlotId};
    use crate::sched::table::ProcTable;

    fn test_curva_de_pesos() -> TestResult {
        if compute_weight(0) != 1024 || compute_weight(-20) != 88817 || compute_weight(19) != 14 {
            return TestResult::Failed;
        }
        let mut anterior = u64::MAX;
        for nice in NICE_MIN..=NICE_MAX {
            let w = compute_weight(nice);
            if w == 0 || w >= anterior {
                return TestResult::Failed;
            }
            anterior = w;
        }
        TestResult::Passed
    }

    fn test_delta_de_vruntime() -> TestResult {
        for nice in NICE_MIN..=NICE_MAX {
            if vruntime_delta(compute_weight(nice)) == 0 {
                return TestResult::Failed;
            }
        }
        TestResult::Passed
    }

    fn test_fatia_minima() -> TestResult {
        let fatia = time_slice_for(compute_weight(19), 64 * compute_weight(-20), SCHED_PERIOD);
        if fatia == 0 {
            return TestResult::Failed;
        }
        TestResult::Passed
    }

    fn test_arvore_ordena_e_agrega() -> TestResult {
        let mut table = ProcTable::new();
        // enche metade da arena com vruntimes decrescentes
        for i in 0..NPROC / 2 {
            let s = SlotId(i);
            table.procs[s] = Pcb::unused();
            table.procs[s].vruntime = (NPROC - i) as u64;
            table.procs[s].weight = compute_weight(0);
            table.tree.insert(&mut table.procs, s);
        }
        if !table.tree.check_invariants(&table.procs) {
            return TestResult::Failed;
        }
        if table.tree.total_weight != (NPROC / 2) as u64 * compute_weight(0) {
            return TestResult::Failed;
        }
        let mut anterior = 0;
        while let Some(s) = table.tree.extract_min(&mut table.procs) {
            if table.procs[s].vruntime < anterior {
                return TestResult::Failed;
            }
            anterior = table.procs[s].vruntime;
        }
        if !table.tree.is_empty() || table.tree.total_weight != 0 {
            return TestResult::Failed;
        }
        TestResult::Passed
    }

    static TESTS: &[TestCase] = &[
        TestCase::new("sched::curva_de_pesos", test_curva_de_pesos),
        TestCase::new("sched::delta_de_vruntime", test_delta_de_vruntime),
        TestCase::new("sched::fatia_minima", test_fatia_minima),
        TestCase::new("sched::arvore_ordena_e_agrega", test_arvore_ordena_e_agrega),
    ];

    /// Roda a suite de self-test do escalonador. Retorna (pass, fail, skip).
    pub fn run_sched_tests() -> (usize, usize, usize) {
        run_test_suite("sched", TESTS)
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    use crate::hal::{
        AddrSpace, CpuContext, DirEntryRef, FileHandle, KernelStack, Platform, TrapFrame,
    };
    use crate::sched::config::{NPROC, SCHED_PERIOD};
    use crate::sched::core::cpu::CpuLocal;
    use crate::sched::core::scheduler::{pick_next, should_preempt};
    use crate::sched::error::SchedError;
    use crate::sched::proc::accounting::compute_weight;
    use crate::sched::proc::{Pid, ProcState, SlotId, WaitChannel};
    use crate::sched::Scheduler;
    use crate::sync::Spinlock;

    /// Plataforma simulada: handles são contadores, a troca de contexto é
    /// imediata e as liberações ficam registradas para inspeção.
    #[derive(Default)]
    struct MockPlatform {
        next_handle: AtomicU64,
        fail_stack_alloc: std::sync::atomic::AtomicBool,
        fail_aspace_dup: std::sync::atomic::AtomicBool,
        freed_stacks: Mutex<Vec<u64>>,
        freed_aspaces: Mutex<Vec<u64>>,
        closed_files: Mutex<Vec<u64>>,
        dup_files: AtomicU64,
        fs_inits: AtomicU64,
        swaps: AtomicU64,
    }

    impl MockPlatform {
        fn fresh(&self) -> u64 {
            self.next_handle.fetch_add(1, Ordering::Relaxed) + 1
        }
    }

    impl Platform for MockPlatform {
        fn alloc_kernel_stack(&self) -> Option<KernelStack> {
            if self.fail_stack_alloc.load(Ordering::Relaxed) {
                return None;
            }
            Some(KernelStack(self.fresh()))
        }

        fn free_kernel_stack(&self, stack: KernelStack) {
            self.freed_stacks.lock().unwrap().push(stack.0);
        }

        fn build_init_address_space(&self) -> Option<AddrSpace> {
            Some(AddrSpace(self.fresh()))
        }

        fn dup_address_space(&self, _src: &AddrSpace) -> Option<AddrSpace> {
            if self.fail_aspace_dup.load(Ordering::Relaxed) {
                return None;
            }
            Some(AddrSpace(self.fresh()))
        }

        fn free_address_space(&self, aspace: AddrSpace) {
            self.freed_aspaces.lock().unwrap().push(aspace.0);
        }

        fn activate_address_space(&self, _aspace: &AddrSpace) {}

        fn activate_kernel_space(&self) {}

        fn prepare_initial_context(&self, _stack: &KernelStack) -> CpuContext {
            CpuContext::zeroed()
        }

        unsafe fn swap_context(&self, _save: *mut CpuContext, _load: *const CpuContext) {
            // retorno imediato: o "processo" continua no mesmo fluxo
            self.swaps.fetch_add(1, Ordering::Relaxed);
        }

        fn dup_file(&self, file: &FileHandle) -> FileHandle {
            self.dup_files.fetch_add(1, Ordering::Relaxed);
            FileHandle(file.0 + 1000)
        }

        fn close_file(&self, file: FileHandle) {
            self.closed_files.lock().unwrap().push(file.0);
        }

        fn resolve_root(&self) -> DirEntryRef {
            DirEntryRef(1)
        }

        fn dup_dir(&self, dir: &DirEntryRef) -> DirEntryRef {
            DirEntryRef(dir.0)
        }

        fn put_dir(&self, _dir: DirEntryRef) {}

        fn log_begin(&self) {}

        fn log_end(&self) {}

        fn init_filesystem(&self) {
            self.fs_inits.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn mk() -> (&'static Scheduler, &'static MockPlatform) {
        let platform: &'static MockPlatform = Box::leak(Box::new(MockPlatform::default()));
        let sched: &'static Scheduler = Box::leak(Box::new(Scheduler::new(platform)));
        (sched, platform)
    }

    /// Simula um dispatch: extrai o próximo da árvore e o põe em execução
    /// na CPU dada, como o loop do dispatcher faria.
    fn dispatch(sched: &Scheduler, cpu: &mut CpuLocal) -> SlotId {
        let mut table = sched.table().lock();
        let slot = pick_next(&mut table).expect("árvore vazia no dispatch");
        table.procs[slot].state = ProcState::Running;
        cpu.running = Some(slot);
        slot
    }

    fn slot_of(sched: &Scheduler, pid: Pid) -> SlotId {
        sched.table().lock().find(pid).expect("pid sumiu")
    }

    #[test]
    fn init_nasce_pronto_e_na_arvore() {
        let (sched, _) = mk();
        let pid = sched.spawn_init("init").unwrap();
        assert_eq!(pid, Pid(1));

        let info = sched.proc_info(pid).unwrap();
        assert_eq!(info.state, ProcState::Runnable);
        assert_eq!(info.nice, 0);
        assert_eq!(info.weight, compute_weight(0));
        assert_eq!(info.vruntime, 0);

        let tree = sched.tree_info();
        assert_eq!(tree.count, 1);
        assert_eq!(tree.total_weight, compute_weight(0));
        assert_eq!(tree.period, SCHED_PERIOD);
        assert!(sched.tree_balanced());

        let table = sched.table().lock();
        assert!(table.init_slot.is_some());
        let s = table.init_slot.unwrap();
        assert_eq!(table.procs[s].name_str(), "init");
        assert!(table.procs[s].cwd.is_some());
    }

    #[test]
    fn tabela_esgota_e_devolve_erro() {
        let (sched, _) = mk();
        for _ in 0..NPROC {
            sched.spawn_init("enche").unwrap();
        }
        assert!(sched.tree_full());
        assert_eq!(sched.spawn_init("sobra"), Err(SchedError::OutOfSlots));
    }

    #[test]
    fn falha_de_pilha_devolve_o_slot() {
        let (sched, plat) = mk();
        plat.fail_stack_alloc.store(true, Ordering::Relaxed);
        assert_eq!(sched.spawn_init("init"), Err(SchedError::OutOfMemory));

        // o slot reservado voltou: com memória, a criação funciona
        plat.fail_stack_alloc.store(false, Ordering::Relaxed);
        sched.spawn_init("init").unwrap();
        assert_eq!(sched.tree_info().count, 1);
    }

    #[test]
    fn fork_duplica_e_zera_o_retorno_do_filho() {
        let (sched, plat) = mk();
        let init_pid = sched.spawn_init("init").unwrap();
        let mut cpu = CpuLocal::new(0);
        let init_slot = dispatch(sched, &mut cpu);

        // dá ao pai um quadro de trap e arquivos reconhecíveis
        {
            let mut table = sched.table().lock();
            table.procs[init_slot].trapframe = TrapFrame {
                retval: 77,
                sp: 0x1000,
                pc: 0x2000,
                flags: 0x200,
            };
            table.procs[init_slot].ofile[0] = Some(FileHandle(5));
            table.procs[init_slot].ofile[3] = Some(FileHandle(9));
        }

        let child_pid = sched.fork(&mut cpu).unwrap();
        assert!(child_pid > init_pid);

        let info = sched.proc_info(child_pid).unwrap();
        assert_eq!(info.state, ProcState::Runnable);

        let table = sched.table().lock();
        let c = table.find(child_pid).unwrap();
        let child = &table.procs[c];
        assert_eq!(child.trapframe.retval, 0);
        assert_eq!(child.trapframe.pc, 0x2000);
        assert_eq!(child.parent, Some(init_slot));
        assert_eq!(child.name_str(), "init");
        assert!(child.ofile[0].is_some() && child.ofile[3].is_some());
        assert!(child.ofile[1].is_none());
        assert!(child.on_tree());
        assert_eq!(plat.dup_files.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn fork_sem_memoria_desfaz_a_reserva() {
        let (sched, plat) = mk();
        sched.spawn_init("init").unwrap();
        let mut cpu = CpuLocal::new(0);
        dispatch(sched, &mut cpu);

        plat.fail_aspace_dup.store(true, Ordering::Relaxed);
        assert_eq!(sched.fork(&mut cpu), Err(SchedError::OutOfMemory));

        // a pilha do embrião foi devolvida e o slot reciclado
        assert_eq!(plat.freed_stacks.lock().unwrap().len(), 1);
        let table = sched.table().lock();
        let vivos = (0..NPROC)
            .map(SlotId)
            .filter(|&s| table.procs[s].state != ProcState::Unused)
            .count();
        assert_eq!(vivos, 1);
    }

    #[test]
    fn exit_vira_zumbi_acorda_o_pai_e_reparenta() {
        let (sched, plat) = mk();
        sched.spawn_init("init").unwrap();
        let mut cpu = CpuLocal::new(0);
        let init_slot = dispatch(sched, &mut cpu);

        let c1 = sched.fork(&mut cpu).unwrap();
        let _c2 = sched.fork(&mut cpu).unwrap();

        // o filho c1 assume a CPU e gera dois netos
        let c1_slot = slot_of(sched, c1);
        {
            let mut table = sched.table().lock();
            let table = &mut *table;
            table.tree.remove(&mut table.procs, c1_slot);
            table.procs[c1_slot].state = ProcState::Running;
        }
        cpu.running = Some(c1_slot);
        let g1 = sched.fork(&mut cpu).unwrap();
        let _g2 = sched.fork(&mut cpu).unwrap();

        // o neto g1 já terminou antes do pai (zumbi fora da árvore)
        let g1_slot = slot_of(sched, g1);
        {
            let mut table = sched.table().lock();
            let table = &mut *table;
            table.tree.remove(&mut table.procs, g1_slot);
            table.procs[g1_slot].state = ProcState::Zombie;
        }

        // o init está dormindo em wait (no próprio canal)
        {
            let mut table = sched.table().lock();
            let table = &mut *table;
            table.tree.remove(&mut table.procs, init_slot);
            table.procs[init_slot].state = ProcState::Sleeping;
            table.procs[init_slot].chan = Some(WaitChannel::Proc(init_slot));
        }

        // fecha arquivos no exit
        {
            let mut table = sched.table().lock();
            table.procs[c1_slot].ofile[0] = Some(FileHandle(5));
        }

        let resultado = catch_unwind(AssertUnwindSafe(|| sched.exit(&mut cpu)));
        let msg = *resultado.unwrap_err().downcast::<&str>().unwrap();
        assert!(msg.contains("zumbi"));

        assert_eq!(plat.closed_files.lock().unwrap().as_slice(), &[5]);

        let table = sched.table().lock();
        assert_eq!(table.procs[c1_slot].state, ProcState::Zombie);
        assert!(!table.procs[c1_slot].on_tree());
        // netos entregues ao init, inclusive o zumbi
        assert_eq!(table.procs[g1_slot].parent, Some(init_slot));
        // o pai (init) acordou para colher
        assert_eq!(table.procs[init_slot].state, ProcState::Runnable);
        assert!(table.procs[init_slot].on_tree());
    }

    #[test]
    fn exit_do_init_e_violacao_de_contrato() {
        let (sched, _) = mk();
        sched.spawn_init("init").unwrap();
        let mut cpu = CpuLocal::new(0);
        dispatch(sched, &mut cpu);

        let resultado = catch_unwind(AssertUnwindSafe(|| sched.exit(&mut cpu)));
        let msg = *resultado.unwrap_err().downcast::<&str>().unwrap();
        assert!(msg.contains("init"));
    }

    #[test]
    fn wait_colhe_zumbi_e_recicla_o_slot() {
        let (sched, plat) = mk();
        sched.spawn_init("init").unwrap();
        let mut cpu = CpuLocal::new(0);
        dispatch(sched, &mut cpu);

        let c = sched.fork(&mut cpu).unwrap();
        let c_slot = slot_of(sched, c);
        {
            let mut table = sched.table().lock();
            let table = &mut *table;
            table.tree.remove(&mut table.procs, c_slot);
            table.procs[c_slot].state = ProcState::Zombie;
        }

        assert_eq!(sched.wait(&mut cpu), Ok(c));

        // pilha e espaço devolvidos, slot limpo
        assert_eq!(plat.freed_stacks.lock().unwrap().len(), 1);
        assert_eq!(plat.freed_aspaces.lock().unwrap().len(), 1);
        let table = sched.table().lock();
        assert_eq!(table.procs[c_slot].state, ProcState::Unused);
        assert_eq!(table.procs[c_slot].pid, Pid::NONE);
        assert!(table.procs[c_slot].parent.is_none());
        assert!(!table.procs[c_slot].killed());
        drop(table);
        // o pid nunca é reciclado
        assert!(sched.fork(&mut cpu).unwrap() > c);
    }

    #[test]
    fn wait_sem_filhos_retorna_na_hora() {
        let (sched, _) = mk();
        sched.spawn_init("init").unwrap();
        let mut cpu = CpuLocal::new(0);
        dispatch(sched, &mut cpu);
        assert_eq!(sched.wait(&mut cpu), Err(SchedError::NoChildren));
    }

    #[test]
    fn wait_com_morte_pendente_nao_dorme() {
        let (sched, _) = mk();
        let init_pid = sched.spawn_init("init").unwrap();
        let mut cpu = CpuLocal::new(0);
        dispatch(sched, &mut cpu);
        sched.fork(&mut cpu).unwrap();

        sched.kill(init_pid).unwrap();
        // tem um filho vivo, mas a sentença vale mais que a espera
        assert_eq!(sched.wait(&mut cpu), Err(SchedError::NoChildren));
    }

    #[test]
    fn kill_marca_e_acorda_dorminhoco() {
        let (sched, _) = mk();
        sched.spawn_init("init").unwrap();
        let mut cpu = CpuLocal::new(0);
        dispatch(sched, &mut cpu);
        let c = sched.fork(&mut cpu).unwrap();
        let c_slot = slot_of(sched, c);

        // o filho está dormindo num canal qualquer
        {
            let mut table = sched.table().lock();
            let table = &mut *table;
            table.tree.remove(&mut table.procs, c_slot);
            table.procs[c_slot].state = ProcState::Sleeping;
            table.procs[c_slot].chan = Some(WaitChannel::Addr(0x42));
        }

        sched.kill(c).unwrap();
        {
            let table = sched.table().lock();
            assert!(table.procs[c_slot].killed());
            assert_eq!(table.procs[c_slot].state, ProcState::Runnable);
            assert!(table.procs[c_slot].on_tree());
        }

        // matar de novo é idempotente; pid inexistente é erro
        sched.kill(c).unwrap();
        assert_eq!(sched.kill(Pid(9999)), Err(SchedError::NotFound));

        // o retorno de trap da vítima veria a sentença
        cpu.running = Some(c_slot);
        assert!(sched.current_killed(&cpu));
    }

    #[test]
    fn cpu_ociosa_nao_tem_morte_pendente() {
        let (sched, _) = mk();
        let cpu = CpuLocal::new(0);
        assert!(!sched.current_killed(&cpu));
    }

    #[test]
    fn kill_em_pronto_nao_mexe_no_estado() {
        let (sched, _) = mk();
        let pid = sched.spawn_init("init").unwrap();
        sched.kill(pid).unwrap();
        let info = sched.proc_info(pid).unwrap();
        assert_eq!(info.state, ProcState::Runnable);
        let table = sched.table().lock();
        let s = table.find(pid).unwrap();
        assert!(table.procs[s].killed());
        assert_eq!(table.tree.len(), 1);
    }

    #[test]
    fn sleep_solta_o_lock_externo_e_o_retoma() {
        let (sched, _) = mk();
        sched.spawn_init("init").unwrap();
        let mut cpu = CpuLocal::new(0);
        let slot = dispatch(sched, &mut cpu);

        let externo = Spinlock::new(7u32);
        let guard = externo.lock();
        let chan = WaitChannel::Addr(0x100);

        // a troca simulada retorna na hora: voltamos "acordados", com o
        // lock externo retomado e o canal limpo
        let guard = sched.sleep(&mut cpu, chan, guard);
        assert_eq!(*guard, 7);
        assert!(externo.is_locked());

        let table = sched.table().lock();
        assert_eq!(table.procs[slot].state, ProcState::Sleeping);
        assert!(table.procs[slot].chan.is_none());
        drop(table);
        drop(guard);
        assert!(crate::arch::interrupts_enabled());
    }

    #[test]
    fn wakeup_e_broadcast_por_canal() {
        let (sched, _) = mk();
        sched.spawn_init("init").unwrap();
        let mut cpu = CpuLocal::new(0);
        dispatch(sched, &mut cpu);
        let a = sched.fork(&mut cpu).unwrap();
        let b = sched.fork(&mut cpu).unwrap();
        let c = sched.fork(&mut cpu).unwrap();

        let chan = WaitChannel::Addr(0x300);
        for pid in [a, b] {
            let s = slot_of(sched, pid);
            let mut table = sched.table().lock();
            let table = &mut *table;
            table.tree.remove(&mut table.procs, s);
            table.procs[s].state = ProcState::Sleeping;
            table.procs[s].chan = Some(WaitChannel::Addr(0x300));
        }
        {
            let s = slot_of(sched, c);
            let mut table = sched.table().lock();
            let table = &mut *table;
            table.tree.remove(&mut table.procs, s);
            table.procs[s].state = ProcState::Sleeping;
            table.procs[s].chan = Some(WaitChannel::Addr(0x999));
        }

        sched.wakeup(chan);

        assert_eq!(sched.proc_info(a).unwrap().state, ProcState::Runnable);
        assert_eq!(sched.proc_info(b).unwrap().state, ProcState::Runnable);
        assert_eq!(sched.proc_info(c).unwrap().state, ProcState::Sleeping);
        assert!(sched.tree_balanced());

        // wakeup num canal sem dorminhocos é inofensivo
        sched.wakeup(WaitChannel::Addr(0xdead));
    }

    #[test]
    fn yield_devolve_para_a_arvore() {
        let (sched, _) = mk();
        let pid = sched.spawn_init("init").unwrap();
        let mut cpu = CpuLocal::new(0);
        let slot = dispatch(sched, &mut cpu);
        assert_eq!(sched.tree_info().count, 0);

        let vruntime_antes = sched.proc_info(pid).unwrap().vruntime;
        sched.yield_now(&mut cpu);

        let info = sched.proc_info(pid).unwrap();
        assert_eq!(info.state, ProcState::Runnable);
        assert_eq!(info.vruntime, vruntime_antes);
        let table = sched.table().lock();
        assert!(table.procs[slot].on_tree());
        assert!(!cpu.need_resched());
    }

    #[test]
    fn dispatch_escolhe_o_menor_vruntime_e_da_fatia_justa() {
        let (sched, _) = mk();
        sched.spawn_init("init").unwrap();
        let mut cpu = CpuLocal::new(0);
        dispatch(sched, &mut cpu);
        let a = sched.fork(&mut cpu).unwrap();
        let b = sched.fork(&mut cpu).unwrap();

        // b correu menos tempo virtual que a
        {
            let a_slot = slot_of(sched, a);
            let b_slot = slot_of(sched, b);
            let mut table = sched.table().lock();
            let table = &mut *table;
            table.tree.remove(&mut table.procs, a_slot);
            table.procs[a_slot].vruntime = 500;
            table.tree.insert(&mut table.procs, a_slot);
            table.tree.remove(&mut table.procs, b_slot);
            table.procs[b_slot].vruntime = 100;
            table.tree.insert(&mut table.procs, b_slot);
        }

        sched.yield_now(&mut cpu); // o init volta para a árvore (vruntime 0)

        // ordem de extração: init (0), b (100), a (500)
        let mut cpu2 = CpuLocal::new(1);
        let primeiro = dispatch(sched, &mut cpu2);
        {
            let table = sched.table().lock();
            assert_eq!(table.procs[primeiro].vruntime, 0);
            // três pesos iguais na árvore no momento do dispatch: um terço
            // do período, e o contador da fatia zerado
            assert_eq!(table.procs[primeiro].time_slice, SCHED_PERIOD / 3);
            assert_eq!(table.procs[primeiro].curr_runtime, 0);
        }
        let segundo = dispatch(sched, &mut cpu2);
        assert_eq!(sched.table().lock().procs[segundo].vruntime, 100);
        let terceiro = dispatch(sched, &mut cpu2);
        assert_eq!(sched.table().lock().procs[terceiro].vruntime, 500);
    }

    #[test]
    fn tick_avanca_vruntime_e_decide_preempcao() {
        let (sched, _) = mk();
        let pid = sched.spawn_init("init").unwrap();
        let mut cpu = CpuLocal::new(0);
        dispatch(sched, &mut cpu);

        // árvore vazia: nunca preempta, mas a contabilidade anda
        assert!(!sched.on_timer_tick(&mut cpu));
        assert!(!cpu.need_resched());
        let info = sched.proc_info(pid).unwrap();
        assert_eq!(info.curr_runtime, 1);
        assert!(info.vruntime > 0);

        // com um concorrente de vruntime menor na árvore, o tick preempta
        let c = sched.fork(&mut cpu).unwrap();
        let _ = c;
        assert!(sched.on_timer_tick(&mut cpu));
        assert!(cpu.need_resched());
    }

    #[test]
    fn tick_respeita_a_fatia() {
        let (sched, _) = mk();
        sched.spawn_init("init").unwrap();
        let mut cpu = CpuLocal::new(0);
        dispatch(sched, &mut cpu);
        let c = sched.fork(&mut cpu).unwrap();

        // o corrente está atrás do concorrente: roda até a fatia acabar
        {
            let c_slot = slot_of(sched, c);
            let cur = cpu.current().unwrap();
            let mut table = sched.table().lock();
            let table = &mut *table;
            table.tree.remove(&mut table.procs, c_slot);
            table.procs[c_slot].vruntime = u64::MAX / 2;
            table.tree.insert(&mut table.procs, c_slot);
            table.procs[cur].time_slice = 3;
            table.procs[cur].curr_runtime = 0;
            table.procs[cur].vruntime = 0;
        }

        assert!(!sched.on_timer_tick(&mut cpu));
        assert!(!sched.on_timer_tick(&mut cpu));
        // terceiro tick: fatia de 3 esgotada
        assert!(sched.on_timer_tick(&mut cpu));
    }

    #[test]
    fn tick_sem_processo_corrente_nao_faz_nada() {
        let (sched, _) = mk();
        sched.spawn_init("init").unwrap();
        let mut cpu = CpuLocal::new(0);
        assert!(!sched.on_timer_tick(&mut cpu));
    }

    #[test]
    fn tick_com_tabela_ocupada_e_perdido() {
        let (sched, _) = mk();
        sched.spawn_init("init").unwrap();
        let mut cpu = CpuLocal::new(0);
        dispatch(sched, &mut cpu);

        let _guard = sched.table().lock();
        assert!(!sched.on_timer_tick(&mut cpu));
    }

    #[test]
    fn preempcao_por_vruntime_menor() {
        let (sched, _) = mk();
        sched.spawn_init("init").unwrap();
        let mut cpu = CpuLocal::new(0);
        let cur = dispatch(sched, &mut cpu);
        sched.fork(&mut cpu).unwrap();

        let mut table = sched.table().lock();
        table.procs[cur].time_slice = 1000;
        table.procs[cur].curr_runtime = 0;
        table.procs[cur].vruntime = 10_000;
        // o concorrente tem vruntime 0: deve preemptar já
        let min = table.tree.peek_min(&table.procs);
        assert!(should_preempt(&table.procs, cur, min));

        // sem ninguém esperando, nunca preempta
        assert!(!should_preempt(&table.procs, cur, None));
    }

    #[test]
    fn set_nice_reflete_no_proximo_dispatch() {
        let (sched, _) = mk();
        let pid = sched.spawn_init("init").unwrap();
        sched.set_nice(pid, -20).unwrap();

        let info = sched.proc_info(pid).unwrap();
        assert_eq!(info.nice, -20);
        assert_eq!(info.weight, compute_weight(-20));
        assert_eq!(sched.tree_info().total_weight, compute_weight(-20));

        let mut cpu = CpuLocal::new(0);
        let slot = dispatch(sched, &mut cpu);
        // sozinho na árvore: o período inteiro, com o novo peso já valendo
        assert_eq!(sched.table().lock().procs[slot].time_slice, SCHED_PERIOD);

        assert_eq!(sched.set_nice(Pid(404), 0), Err(SchedError::NotFound));
    }

    #[test]
    fn primeira_execucao_libera_o_lock_e_inicializa_o_fs_uma_vez() {
        let (sched, plat) = mk();

        // o dispatcher teria tomado o lock antes da troca; o guard "viaja"
        // com a troca de contexto e o epílogo o libera
        let guard = sched.table().lock();
        std::mem::forget(guard);
        unsafe { sched.first_run_epilogue() };
        assert!(!sched.table().is_locked());
        assert!(crate::arch::interrupts_enabled());
        assert_eq!(plat.fs_inits.load(Ordering::Relaxed), 1);

        // o segundo processo não reinicializa o FS
        let guard = sched.table().lock();
        std::mem::forget(guard);
        unsafe { sched.first_run_epilogue() };
        assert_eq!(plat.fs_inits.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn dump_nao_trava_com_a_tabela_ocupada() {
        let (sched, _) = mk();
        sched.spawn_init("init").unwrap();
        let _guard = sched.table().lock();
        // não deve deadlockar nem entrar em pânico
        sched.dump();
    }

    #[test]
    fn dump_percorre_processos_vivos() {
        let (sched, _) = mk();
        sched.spawn_init("init").unwrap();
        sched.dump();
    }

    #[test]
    fn instancia_global_e_unica() {
        let platform: &'static MockPlatform = Box::leak(Box::new(MockPlatform::default()));
        let a = crate::sched::init(platform) as *const Scheduler;
        let b = crate::sched::init(platform) as *const Scheduler;
        assert_eq!(a, b);
        assert!(crate::sched::get().is_some());
    }
}
