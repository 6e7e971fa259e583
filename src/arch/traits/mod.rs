//! Traits do HAL de CPU

pub mod cpu;

pub use cpu::CpuOps;
