//! Brasa - Núcleo de Escalonamento Justo.
//!
//! Ponto central de exportação dos módulos do núcleo de escalonamento.
//! Este crate implementa a parte "quente" de um kernel didático: tabela de
//! processos de capacidade fixa, árvore rubro-negra ordenada por vruntime e o
//! ciclo de vida completo dos processos (fork, exit, wait, kill, sleep/wakeup,
//! yield, dispatch).
//!
//! O hardware (troca de contexto, espaços de endereçamento, arquivos) entra
//! apenas pela trait [`hal::Platform`]; o controle de interrupções entra pelo
//! HAL de CPU em [`arch`]. Com isso o núcleo compila e testa em ambiente
//! hospedado sem perder o contrato bare-metal.

#![cfg_attr(not(test), no_std)]

// --- Módulos de Baixo Nível (Hardware) ---
pub mod arch; // HAL de CPU (interrupções, halt)
pub mod hal; // Serviços opacos da plataforma (contexto, VM, arquivos)

// --- Módulos Centrais ---
pub mod core; // Logging do kernel (klog)
pub mod klib; // Utilitários internos (framework de self-test)
pub mod sync; // Primitivas de Sincronização (Spinlock)

// --- Subsistema Principal ---
pub mod sched; // Tabela de processos, árvore CFS, dispatcher

pub use crate::sched::error::{SchedError, SchedResult};
pub use crate::sched::Scheduler;
