//! # Synchronization Primitives
//!
//! Primitivas de sincronização do núcleo de escalonamento.
//!
//! ## Regras
//!
//! - **Spinlock**: Usar apenas quando NÃO pode dormir (IRQ handlers, lock da
//!   tabela de processos)
//! - **Ordem de Lock**: Sempre adquirir na mesma ordem para evitar deadlock
//! - O lock da tabela é o único ponto de serialização de `state`, `vruntime`,
//!   `weight` e dos links da árvore; ele atravessa a troca de contexto por
//!   convenção (ver `sched::core`)

/// Spinlock (busy-wait, não dorme)
pub mod spinlock;

pub use spinlock::{Spinlock, SpinlockGuard};
