//! Spinlock - bloqueio com busy-wait

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicBool, Ordering};

/// Spinlock - usa busy-wait, NÃO pode dormir
///
/// # Quando usar
///
/// - Seções críticas MUITO curtas
/// - Dentro de handlers de interrupção
/// - Quando não pode chamar scheduler
///
/// # Quando NÃO usar
///
/// - Seções que podem demorar
/// - Para proteger I/O lento
pub struct Spinlock<T> {
    locked: AtomicBool,
    data: UnsafeCell<T>,
}

// SAFETY: Spinlock protege acesso com lock atômico
unsafe impl<T: Send> Send for Spinlock<T> {}
unsafe impl<T: Send> Sync for Spinlock<T> {}

impl<T> Spinlock<T> {
    /// Cria novo spinlock
    pub const fn new(data: T) -> Self {
        Self {
            locked: AtomicBool::new(false),
            data: UnsafeCell::new(data),
        }
    }

    /// Adquire o lock
    pub fn lock(&self) -> SpinlockGuard<'_, T> {
        // Seção sem interrupções, com aninhamento: guards podem ser soltos
        // fora da ordem de aquisição (o sleep do scheduler depende disso)
        crate::arch::push_interrupts_off();

        // Spin até conseguir o lock
        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            // Hint para CPU que estamos em spin loop
            core::hint::spin_loop();
        }

        SpinlockGuard { lock: self }
    }

    /// Tenta adquirir sem bloquear
    pub fn try_lock(&self) -> Option<SpinlockGuard<'_, T>> {
        crate::arch::push_interrupts_off();

        if self
            .locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            Some(SpinlockGuard { lock: self })
        } else {
            crate::arch::pop_interrupts_off();
            None
        }
    }

    /// Verifica se o lock está tomado neste instante.
    ///
    /// Só tem valor como asserção de contrato (ex: checkpoints de entrada do
    /// dispatcher); o resultado fica obsoleto imediatamente.
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }

    /// Força o desbloqueio do spinlock (USO INTERNO DO SCHEDULER)
    ///
    /// Também fecha a seção sem interrupções que a aquisição abriu.
    ///
    /// # Safety
    ///
    /// Extremamente inseguro. Só deve ser usado pelo caminho de primeira
    /// execução de um processo novo, que "herdou" o lock da tabela do
    /// dispatcher mas não tem o Guard.
    pub unsafe fn force_unlock(&self) {
        self.locked.store(false, Ordering::Release);
        crate::arch::pop_interrupts_off();
    }
}

/// Guard do spinlock - libera ao sair do escopo
pub struct SpinlockGuard<'a, T> {
    lock: &'a Spinlock<T>,
}

impl<'a, T> SpinlockGuard<'a, T> {
    /// Referência ao spinlock de origem.
    ///
    /// Usado por `sleep` para readquirir o lock externo depois de acordar.
    pub fn source(&self) -> &'a Spinlock<T> {
        self.lock
    }
}

impl<T> Deref for SpinlockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: Lock está adquirido
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for SpinlockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: Lock está adquirido
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for SpinlockGuard<'_, T> {
    fn drop(&mut self) {
        // Liberar lock
        self.lock.locked.store(false, Ordering::Release);

        // Fecha a seção sem interrupções aberta na aquisição
        crate::arch::pop_interrupts_off();
    }
}
