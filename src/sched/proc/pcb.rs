//! Bloco de controle de processo (PCB)
//!
//! Cada processo vive num slot fixo da arena da tabela; os elos da árvore de
//! execução são índices de slot, então nenhum nó é alocado fora da arena.

use bitflags::bitflags;

use super::state::ProcState;
use crate::hal::{AddrSpace, CpuContext, DirEntryRef, FileHandle, KernelStack, TrapFrame};
use crate::sched::config::{NOFILE, PROC_NAME_LEN};

/// Índice de um slot na arena da tabela de processos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotId(pub(crate) usize);

impl SlotId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl core::ops::Index<SlotId> for [Pcb] {
    type Output = Pcb;

    fn index(&self, slot: SlotId) -> &Pcb {
        &self[slot.0]
    }
}

impl core::ops::IndexMut<SlotId> for [Pcb] {
    fn index_mut(&mut self, slot: SlotId) -> &mut Pcb {
        &mut self[slot.0]
    }
}

/// Identificador de processo. `Pid(0)` significa "nenhum" (slot reciclado).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Pid(pub u32);

impl Pid {
    pub const NONE: Pid = Pid(0);

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for Pid {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canal de espera de sleep/wakeup.
///
/// O valor é um token opaco: só identidade importa. `Proc` é o canal
/// canônico de wait/exit (o pai dorme no próprio slot); `Addr` cobre
/// qualquer outro objeto do kernel (endereço estável).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitChannel {
    Proc(SlotId),
    Addr(usize),
}

bitflags! {
    /// Flags de condição de um processo
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ProcFlags: u8 {
        /// Morte pendente: o processo finaliza via exit no próximo retorno
        /// ao userspace. Persiste até o reap (sticky).
        const KILLED = 1 << 0;
        /// O slot está inserido na árvore de execução
        const ON_TREE = 1 << 1;
    }
}

/// Cor de um nó da árvore rubro-negra
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
}

/// Bloco de controle de processo.
///
/// Os campos de escalonamento (vruntime, weight, elos da árvore) são
/// protegidos pelo lock da tabela; os handles opacos pertencem à plataforma.
pub struct Pcb {
    pub pid: Pid,
    pub state: ProcState,
    /// Slot do pai (None para o init e slots reciclados)
    pub parent: Option<SlotId>,
    pub flags: ProcFlags,

    // --- Escalonamento ---
    pub nice: i32,
    /// Peso derivado do nice; redundante mas consultado a cada tick
    pub weight: u64,
    /// Tempo virtual acumulado, escalado por `VRUNTIME_SHIFT`. Só cresce.
    pub vruntime: u64,
    /// Ticks consumidos na fatia corrente (zerado a cada dispatch)
    pub curr_runtime: u64,
    /// Fatia concedida no último dispatch, em ticks
    pub time_slice: u64,

    // --- Elos da árvore de execução (índices na arena) ---
    pub left: Option<SlotId>,
    pub right: Option<SlotId>,
    pub tree_parent: Option<SlotId>,
    pub color: Color,

    // --- Sleep ---
    pub chan: Option<WaitChannel>,

    // --- Recursos opacos ---
    pub kstack: Option<KernelStack>,
    pub aspace: Option<AddrSpace>,
    pub context: CpuContext,
    pub trapframe: TrapFrame,
    pub ofile: [Option<FileHandle>; NOFILE],
    pub cwd: Option<DirEntryRef>,

    /// Nome para diagnóstico (NUL-terminado se menor que o buffer)
    pub name: [u8; PROC_NAME_LEN],
}

impl Pcb {
    const NO_FILE: Option<FileHandle> = None;

    /// Slot vazio, como a tabela nasce
    pub const fn unused() -> Self {
        Self {
            pid: Pid::NONE,
            state: ProcState::Unused,
            parent: None,
            flags: ProcFlags::empty(),
            nice: 0,
            weight: 0,
            vruntime: 0,
            curr_runtime: 0,
            time_slice: 0,
            left: None,
            right: None,
            tree_parent: None,
            color: Color::Black,
            chan: None,
            kstack: None,
            aspace: None,
            context: CpuContext::zeroed(),
            trapframe: TrapFrame::zeroed(),
            ofile: [Self::NO_FILE; NOFILE],
            cwd: None,
            name: [0; PROC_NAME_LEN],
        }
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = [0; PROC_NAME_LEN];
        let bytes = name.as_bytes();
        let len = bytes.len().min(PROC_NAME_LEN - 1);
        self.name[..len].copy_from_slice(&bytes[..len]);
    }

    pub fn name_str(&self) -> &str {
        let len = self
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(PROC_NAME_LEN);
        core::str::from_utf8(&self.name[..len]).unwrap_or("???")
    }

    pub fn killed(&self) -> bool {
        self.flags.contains(ProcFlags::KILLED)
    }

    pub fn on_tree(&self) -> bool {
        self.flags.contains(ProcFlags::ON_TREE)
    }
}
