//! Constantes de configuração do Scheduler

/// Capacidade da tabela de processos (slots da arena)
pub const NPROC: usize = 64;

/// Arquivos abertos por processo
pub const NOFILE: usize = 16;

/// Nice mínimo (maior prioridade)
pub const NICE_MIN: i32 = -20;

/// Nice máximo (menor prioridade)
pub const NICE_MAX: i32 = 19;

/// Peso de um processo com nice 0
pub const NICE0_WEIGHT: u64 = 1024;

/// Escala fixa do acréscimo de vruntime por tick.
/// Com shift 20, um processo nice 0 acumula 1<<20 por tick e pesos grandes
/// (nice negativo) ainda acumulam um delta inteiro não-nulo.
pub const VRUNTIME_SHIFT: u32 = 20;

/// Período do escalonador em ticks (capacidade da árvore / 2)
pub const SCHED_PERIOD: u64 = (NPROC / 2) as u64;

/// Tamanho do buffer de nome no PCB (em bytes)
pub const PROC_NAME_LEN: usize = 32;

/// Profundidade do call-stack capturado no dump de processos dormindo
pub const BACKTRACE_DEPTH: usize = 10;
