//! Interface Abstrata de CPU (HAL).
//! Define as operações que qualquer arquitetura (x86, ARM, RISC-V) deve implementar.

pub trait CpuOps: Send + Sync {
    /// Para a execução da CPU até a próxima interrupção (instrução HLT).
    /// Economiza energia em loops ociosos.
    fn halt(&self);

    /// Desabilita interrupções globalmente (CLI).
    /// Crítico para seções atômicas no kernel.
    fn disable_interrupts(&self);

    /// Habilita interrupções globalmente (STI).
    fn enable_interrupts(&self);

    /// Verifica se as interrupções estão habilitadas.
    fn interrupts_enabled(&self) -> bool;

    /// Entra em loop infinito de halt com interrupções desabilitadas.
    /// Usado em pânicos irrecuperáveis.
    fn hang(&self) -> ! {
        self.disable_interrupts();
        loop {
            self.halt();
        }
    }
}
