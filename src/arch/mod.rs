//! HAL de CPU do núcleo de escalonamento.
//!
//! O kernel hospedeiro registra uma implementação de [`CpuOps`] (CLI/STI/HLT
//! reais) via [`register`]. Sem registro, vale a implementação em software:
//! uma flag de interrupção emulada, suficiente para builds hospedados e para
//! manter válidos os checkpoints do dispatcher (que exigem interrupções
//! desabilitadas dentro do lock da tabela).

pub mod traits;

pub use traits::CpuOps;

use spin::Once;

static CPU_OPS: Once<&'static dyn CpuOps> = Once::new();

/// Registra a implementação de CPU da plataforma.
///
/// Init-once: a primeira chamada vence, as demais são ignoradas.
pub fn register(ops: &'static dyn CpuOps) {
    CPU_OPS.call_once(|| ops);
}

fn ops() -> Option<&'static dyn CpuOps> {
    CPU_OPS.get().copied()
}

/// Desabilita interrupções na CPU atual.
pub fn disable_interrupts() {
    match ops() {
        Some(cpu) => cpu.disable_interrupts(),
        None => soft::set(false),
    }
}

/// Habilita interrupções na CPU atual.
pub fn enable_interrupts() {
    match ops() {
        Some(cpu) => cpu.enable_interrupts(),
        None => soft::set(true),
    }
}

/// Verifica se as interrupções estão habilitadas na CPU atual.
pub fn interrupts_enabled() -> bool {
    match ops() {
        Some(cpu) => cpu.interrupts_enabled(),
        None => soft::get(),
    }
}

/// Espera pela próxima interrupção (HLT). Na implementação em software,
/// apenas um hint de spin.
pub fn halt() {
    match ops() {
        Some(cpu) => cpu.halt(),
        None => core::hint::spin_loop(),
    }
}

/// Entra numa seção sem interrupções, com aninhamento.
///
/// O estado da flag no primeiro nível fica guardado e só volta no
/// [`pop_interrupts_off`] correspondente ao nível zero. Isso permite soltar
/// locks fora da ordem de aquisição (sleep solta o lock externo segurando o
/// da tabela) sem reabilitar interrupções no meio de uma seção crítica.
pub fn push_interrupts_off() {
    let was_enabled = interrupts_enabled();
    disable_interrupts();
    if nesting::depth() == 0 {
        nesting::set_saved(was_enabled);
    }
    nesting::set_depth(nesting::depth() + 1);
}

/// Sai de uma seção sem interrupções; no nível zero restaura a flag salva.
pub fn pop_interrupts_off() {
    if interrupts_enabled() {
        panic!("pop_interrupts_off: interrupções habilitadas dentro da seção");
    }
    let depth = nesting::depth();
    if depth == 0 {
        panic!("pop_interrupts_off: sem push correspondente");
    }
    nesting::set_depth(depth - 1);
    if depth == 1 && nesting::saved() {
        enable_interrupts();
    }
}

/// Profundidade corrente de seções sem interrupção (checkpoint do sched)
pub fn interrupts_depth() -> u32 {
    nesting::depth()
}

/// Flag de interrupção salva no primeiro nível da seção corrente.
///
/// O sched a preserva por processo ao atravessar a troca de contexto.
pub fn saved_interrupts() -> bool {
    nesting::saved()
}

pub fn set_saved_interrupts(enabled: bool) {
    nesting::set_saved(enabled);
}

// Flag de interrupção emulada (fallback sem registro de CpuOps).
#[cfg(not(test))]
mod soft {
    use core::sync::atomic::{AtomicBool, Ordering};

    static IF: AtomicBool = AtomicBool::new(true);

    pub fn set(enabled: bool) {
        IF.store(enabled, Ordering::Release);
    }

    pub fn get() -> bool {
        IF.load(Ordering::Acquire)
    }
}

// Aninhamento de seções sem interrupção. Estado da CPU corrente: a variante
// bare-metal cobre uma CPU; com mais CPUs o kernel hospedeiro mantém o
// equivalente por CPU junto do seu CpuOps.
#[cfg(not(test))]
mod nesting {
    use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    static DEPTH: AtomicU32 = AtomicU32::new(0);
    static SAVED: AtomicBool = AtomicBool::new(false);

    pub fn depth() -> u32 {
        DEPTH.load(Ordering::Acquire)
    }

    pub fn set_depth(d: u32) {
        DEPTH.store(d, Ordering::Release);
    }

    pub fn saved() -> bool {
        SAVED.load(Ordering::Acquire)
    }

    pub fn set_saved(enabled: bool) {
        SAVED.store(enabled, Ordering::Release);
    }
}
