//! Serviços opacos da plataforma.
//!
//! Tudo que o núcleo de escalonamento consome do resto do kernel entra por
//! aqui: quadros físicos e pilhas, espaços de endereçamento, troca de
//! contexto, arquivos abertos e o log transacional de metadados. O núcleo
//! nunca olha dentro dos handles; só os guarda, duplica e devolve.

/// Pilha de kernel de um processo (handle opaco).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelStack(pub u64);

/// Espaço de endereçamento de um processo (handle opaco).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddrSpace(pub u64);

/// Arquivo aberto (handle opaco).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHandle(pub u64);

/// Entrada de diretório referenciada (cwd) (handle opaco).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntryRef(pub u64);

/// Contexto de execução salvo.
///
/// O layout interno pertence à plataforma (callee-saved regs, sp, pc); o
/// núcleo apenas guarda o blob e pede a troca via [`Platform::swap_context`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuContext {
    pub words: [u64; 8],
}

impl CpuContext {
    pub const fn zeroed() -> Self {
        Self { words: [0; 8] }
    }
}

/// Quadro de trap preparado na entrada do kernel.
///
/// Só os campos que o núcleo precisa tocar (fork zera o registrador de
/// retorno na cópia do filho); o resto pertence à plataforma.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrapFrame {
    /// Registrador de valor de retorno visível ao userspace.
    pub retval: u64,
    pub sp: u64,
    pub pc: u64,
    pub flags: u64,
}

impl TrapFrame {
    pub const fn zeroed() -> Self {
        Self {
            retval: 0,
            sp: 0,
            pc: 0,
            flags: 0,
        }
    }
}

/// Contrato do núcleo com o resto do kernel.
///
/// Implementado uma vez pelo kernel hospedeiro e passado a
/// [`crate::Scheduler::new`]. Em testes, um mock registra as chamadas.
pub trait Platform: Send + Sync {
    // --- Pilhas de kernel ---
    fn alloc_kernel_stack(&self) -> Option<KernelStack>;
    fn free_kernel_stack(&self, stack: KernelStack);

    // --- Espaços de endereçamento ---
    /// Constrói o espaço inicial do processo init (initcode embutido).
    fn build_init_address_space(&self) -> Option<AddrSpace>;
    /// Duplica o espaço do pai para o filho (fork). `None` em falta de memória.
    fn dup_address_space(&self, src: &AddrSpace) -> Option<AddrSpace>;
    fn free_address_space(&self, aspace: AddrSpace);
    fn activate_address_space(&self, aspace: &AddrSpace);
    /// Volta para o espaço de endereçamento do kernel (dispatcher).
    fn activate_kernel_space(&self);

    // --- Contexto de execução ---
    /// Prepara o contexto inicial de um processo novo sobre a pilha dada.
    /// Por convenção a primeira execução entra pelo epílogo de primeira
    /// execução do dispatcher (que libera o lock da tabela herdado).
    fn prepare_initial_context(&self, stack: &KernelStack) -> CpuContext;

    /// Salva o contexto corrente em `save` e retoma o de `load`.
    ///
    /// # Safety
    /// Ambos os ponteiros devem apontar para `CpuContext` válidos e estáveis
    /// durante a troca. O chamador deve seguir a convenção de lock do
    /// dispatcher: exatamente um guard do lock da tabela tomado, liberado
    /// pelo caminho que retomar a execução do outro lado.
    unsafe fn swap_context(&self, save: *mut CpuContext, load: *const CpuContext);

    // --- Arquivos e diretórios ---
    fn dup_file(&self, file: &FileHandle) -> FileHandle;
    fn close_file(&self, file: FileHandle);
    /// Resolve a raiz do sistema de arquivos (cwd inicial do init).
    fn resolve_root(&self) -> DirEntryRef;
    fn dup_dir(&self, dir: &DirEntryRef) -> DirEntryRef;
    /// Solta uma referência de diretório. Chamar dentro de log_begin/log_end.
    fn put_dir(&self, dir: DirEntryRef);
    /// Abre uma transação do log de metadados.
    fn log_begin(&self);
    fn log_end(&self);
    /// Inicialização do FS que precisa de contexto de processo (pode dormir).
    /// Chamada uma única vez, no primeiro processo a executar.
    fn init_filesystem(&self);

    // --- Diagnóstico ---
    /// Captura o call-stack de um contexto salvo (dump de processos dormindo).
    /// Retorna quantos frames escreveu.
    fn capture_backtrace(&self, context: &CpuContext, frames: &mut [u64]) -> usize {
        let _ = (context, frames);
        0
    }
}
