//! Tipos de Erro do Subsistema de Escalonamento
//!
//! Define erros estruturados para as falhas recuperáveis do núcleo.
//! Violações de contrato (exit do init, sleep fora de contexto de processo,
//! checkpoints de entrada do dispatcher) não passam por aqui: são `panic!`.

/// Erros do subsistema de escalonamento
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedError {
    /// Tabela de processos cheia (nenhum slot Unused)
    OutOfSlots,
    /// Sem memória para pilha de kernel ou espaço de endereçamento
    OutOfMemory,
    /// Pid não encontrado na tabela
    NotFound,
    /// wait() sem filhos vivos ou zumbis
    NoChildren,
}

impl SchedError {
    /// Retorna descrição legível do erro
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OutOfSlots => "Tabela de processos cheia",
            Self::OutOfMemory => "OOM: sem memória para pilha ou espaço de endereçamento",
            Self::NotFound => "Pid não encontrado",
            Self::NoChildren => "Processo sem filhos para esperar",
        }
    }
}

impl core::fmt::Display for SchedError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tipo Result específico para operações de escalonamento
pub type SchedResult<T> = Result<T, SchedError>;
