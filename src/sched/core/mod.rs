//! Núcleo do escalonador: dispatcher, sleep/wakeup e diagnóstico

pub mod cpu;
pub mod debug;
pub mod scheduler;
pub mod sleep;

pub use cpu::CpuLocal;
pub use debug::{ProcInfo, TreeInfo};
