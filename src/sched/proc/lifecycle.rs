//! Ciclo de vida: criação, término e colheita de processos
//!
//! As alocações que podem dormir (pilha, espaço de endereçamento) acontecem
//! fora do lock da tabela; o slot fica reservado em Embryo nesse meio tempo
//! e é devolvido em caso de falha. Toda transição de estado acontece com o
//! lock tomado.

use crate::sched::config::{NOFILE, NPROC, PROC_NAME_LEN};
use crate::sched::core::cpu::CpuLocal;
use crate::sched::error::{SchedError, SchedResult};
use crate::sched::proc::accounting::compute_weight;
use crate::sched::proc::{Pid, ProcFlags, ProcState, SlotId, WaitChannel};
use crate::sched::Scheduler;

impl Scheduler {
    /// Reserva um slot Unused e o prepara como Embryo: pid novo, pilha de
    /// kernel e contexto inicial apontando para o epílogo de primeira
    /// execução.
    fn alloc_proc(&self) -> SchedResult<SlotId> {
        let slot = {
            let mut table = self.table().lock();
            let slot = (0..NPROC)
                .map(SlotId)
                .find(|&s| table.procs[s].state == ProcState::Unused)
                .ok_or(SchedError::OutOfSlots)?;
            let pid = self.fresh_pid();
            let p = &mut table.procs[slot];
            p.state = ProcState::Embryo;
            p.pid = pid;
            slot
        };

        // o slot Embryo é nosso por protocolo; a pilha vem sem o lock
        let kstack = match self.platform().alloc_kernel_stack() {
            Some(ks) => ks,
            None => {
                let mut table = self.table().lock();
                let p = &mut table.procs[slot];
                p.pid = Pid::NONE;
                p.state = ProcState::Unused;
                crate::kwarn!("alloc_proc: sem memória para pilha de kernel");
                return Err(SchedError::OutOfMemory);
            }
        };
        let context = self.platform().prepare_initial_context(&kstack);

        let mut table = self.table().lock();
        let p = &mut table.procs[slot];
        p.kstack = Some(kstack);
        p.context = context;
        p.trapframe = crate::hal::TrapFrame::zeroed();
        p.nice = 0;
        p.weight = compute_weight(0);
        p.vruntime = 0;
        p.curr_runtime = 0;
        p.time_slice = 0;
        p.flags = ProcFlags::empty();
        p.chan = None;
        p.parent = None;
        p.left = None;
        p.right = None;
        p.tree_parent = None;
        Ok(slot)
    }

    /// Desfaz uma reserva de Embryo após falha de alocação tardia
    fn rollback_embryo(&self, slot: SlotId) {
        let kstack = {
            let mut table = self.table().lock();
            let p = &mut table.procs[slot];
            p.pid = Pid::NONE;
            p.state = ProcState::Unused;
            p.kstack.take()
        };
        if let Some(ks) = kstack {
            self.platform().free_kernel_stack(ks);
        }
    }

    /// Cria o primeiro processo do sistema.
    ///
    /// Fica registrado como destino de reparentamento: todo órfão passa a
    /// ser filho dele.
    pub fn spawn_init(&self, name: &str) -> SchedResult<Pid> {
        let slot = self.alloc_proc()?;
        let aspace = match self.platform().build_init_address_space() {
            Some(a) => a,
            None => {
                self.rollback_embryo(slot);
                return Err(SchedError::OutOfMemory);
            }
        };
        let root = self.platform().resolve_root();

        let mut table = self.table().lock();
        let p = &mut table.procs[slot];
        p.aspace = Some(aspace);
        p.cwd = Some(root);
        p.set_name(name);
        let pid = p.pid;
        table.init_slot = Some(slot);
        table.make_runnable(slot);
        crate::kinfo!("init criado, pid", pid.as_u32() as u64);
        Ok(pid)
    }

    /// Duplica o processo corrente. Retorna o pid do filho; no filho, o
    /// registrador de retorno do quadro de trap vai zerado.
    pub fn fork(&self, cpu: &mut CpuLocal) -> SchedResult<Pid> {
        let cur = cpu.current_slot();
        let child = self.alloc_proc()?;

        // retrato do pai sob o lock; os handles são tokens copiáveis
        let (parent_aspace, parent_tf, parent_name, parent_ofile, parent_cwd) = {
            let table = self.table().lock();
            let p = &table.procs[cur];
            (p.aspace, p.trapframe, p.name, p.ofile, p.cwd)
        };
        let parent_aspace = match parent_aspace {
            Some(a) => a,
            None => panic!("fork: processo corrente sem espaço de endereçamento"),
        };

        // a cópia do espaço pode dormir e pode falhar
        let child_aspace = match self.platform().dup_address_space(&parent_aspace) {
            Some(a) => a,
            None => {
                self.rollback_embryo(child);
                crate::kwarn!("fork: sem memória para duplicar o espaço");
                return Err(SchedError::OutOfMemory);
            }
        };

        // referências de arquivos e cwd do filho
        let mut child_ofile: [Option<crate::hal::FileHandle>; NOFILE] = [None; NOFILE];
        for (i, f) in parent_ofile.iter().enumerate() {
            if let Some(f) = f {
                child_ofile[i] = Some(self.platform().dup_file(f));
            }
        }
        let child_cwd = parent_cwd.map(|d| self.platform().dup_dir(&d));

        let mut table = self.table().lock();
        let p = &mut table.procs[child];
        p.aspace = Some(child_aspace);
        p.trapframe = parent_tf;
        p.trapframe.retval = 0; // fork retorna 0 no filho
        p.ofile = child_ofile;
        p.cwd = child_cwd;
        p.name = parent_name;
        p.parent = Some(cur);
        let pid = p.pid;
        table.make_runnable(child);
        Ok(pid)
    }

    /// Termina o processo corrente. Nunca retorna.
    ///
    /// Fecha os recursos que podem dormir fora do lock, acorda o pai,
    /// entrega os filhos ao init e entra em Zombie até o reap. O init
    /// terminar é violação de contrato.
    pub fn exit(&self, cpu: &mut CpuLocal) -> ! {
        let cur = cpu.current_slot();

        let (ofile, cwd) = {
            let mut table = self.table().lock();
            if table.init_slot == Some(cur) {
                panic!("exit: init terminando");
            }
            let p = &mut table.procs[cur];
            let ofile = core::mem::replace(&mut p.ofile, [None; NOFILE]);
            (ofile, p.cwd.take())
        };

        for f in ofile.into_iter().flatten() {
            self.platform().close_file(f);
        }
        if let Some(cwd) = cwd {
            self.platform().log_begin();
            self.platform().put_dir(cwd);
            self.platform().log_end();
        }

        let mut table = self.table().lock();

        // o pai pode estar dormindo em wait()
        if let Some(parent) = table.procs[cur].parent {
            table.wakeup_locked(WaitChannel::Proc(parent));
        }

        // órfãos vão para o init; zumbis órfãos precisam acordá-lo também
        let init = table.init_slot;
        for i in 0..NPROC {
            let s = SlotId(i);
            if s == cur || table.procs[s].parent != Some(cur) {
                continue;
            }
            table.procs[s].parent = init;
            if table.procs[s].state == ProcState::Zombie {
                if let Some(init) = init {
                    table.wakeup_locked(WaitChannel::Proc(init));
                }
            }
        }

        table.procs[cur].state = ProcState::Zombie;
        self.sched(cpu, &mut table);
        panic!("exit: zumbi executou");
    }

    /// Espera um filho terminar e o recolhe, devolvendo seu pid.
    ///
    /// Sem filho zumbi, dorme no próprio slot (o canal que exit acorda).
    /// Sem filhos, ou com morte pendente, retorna na hora.
    pub fn wait(&self, cpu: &mut CpuLocal) -> SchedResult<Pid> {
        let cur = cpu.current_slot();
        let mut table = self.table().lock();
        loop {
            let mut have_kids = false;
            for i in 0..NPROC {
                let s = SlotId(i);
                if table.procs[s].parent != Some(cur) {
                    continue;
                }
                have_kids = true;
                if table.procs[s].state != ProcState::Zombie {
                    continue;
                }

                // recolhe: devolve pilha e espaço, recicla o slot
                let pid = table.procs[s].pid;
                let kstack = table.procs[s].kstack.take();
                let aspace = table.procs[s].aspace.take();
                let p = &mut table.procs[s];
                p.pid = Pid::NONE;
                p.parent = None;
                p.name = [0; PROC_NAME_LEN];
                p.flags = ProcFlags::empty();
                p.state = ProcState::Unused;

                if let Some(ks) = kstack {
                    self.platform().free_kernel_stack(ks);
                }
                if let Some(asp) = aspace {
                    self.platform().free_address_space(asp);
                }
                return Ok(pid);
            }

            if !have_kids || table.procs[cur].killed() {
                return Err(SchedError::NoChildren);
            }

            // dorme no próprio slot; exit() de um filho acorda este canal
            self.sleep_locked(cpu, &mut table, WaitChannel::Proc(cur));
        }
    }

    /// O processo corrente tem morte pendente?
    ///
    /// O retorno de trap consulta isto para finalizar a vítima via exit.
    pub fn current_killed(&self, cpu: &CpuLocal) -> bool {
        match cpu.current() {
            Some(s) => self.table().lock().procs[s].killed(),
            None => false,
        }
    }

    /// Marca a morte de um processo.
    ///
    /// A flag é pegajosa: o alvo finaliza via exit no próximo retorno ao
    /// userspace. Um alvo dormindo volta para a árvore imediatamente para
    /// poder perceber a sentença.
    pub fn kill(&self, pid: Pid) -> SchedResult<()> {
        let mut table = self.table().lock();
        let slot = table.find(pid).ok_or(SchedError::NotFound)?;
        table.procs[slot].flags.insert(ProcFlags::KILLED);
        if table.procs[slot].state == ProcState::Sleeping {
            table.make_runnable(slot);
        }
        Ok(())
    }
}
