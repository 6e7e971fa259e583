//! Processos: PCB, estados e contabilidade de tempo

pub mod accounting;
pub mod lifecycle;
pub mod pcb;
pub mod state;

pub use pcb::{Color, Pcb, Pid, ProcFlags, SlotId, WaitChannel};
pub use state::ProcState;
