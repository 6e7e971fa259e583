//! Sistema de logging do kernel
//!
//! Emite pela fachada `log`: o kernel hospedeiro (ou o harness de teste)
//! instala o logger e escolhe o sink (serial, framebuffer, stdout).
//! A filtragem por nível é em tempo de compilação via features
//! (`no_logs`, `log_error`, `log_info`, `log_debug`, `log_trace`),
//! custo zero para níveis desligados.

/// Nível de log
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

/// Nível mínimo compilado, derivado das features.
const fn level_enabled(level: LogLevel) -> bool {
    if cfg!(feature = "no_logs") {
        return false;
    }
    let min = if cfg!(feature = "log_trace") {
        LogLevel::Trace
    } else if cfg!(feature = "log_debug") {
        LogLevel::Debug
    } else if cfg!(feature = "log_info") {
        LogLevel::Info
    } else if cfg!(feature = "log_error") {
        LogLevel::Error
    } else {
        LogLevel::Trace
    };
    level as u8 >= min as u8
}

/// Emite uma linha de log
pub fn log(level: LogLevel, message: &str) {
    if !level_enabled(level) {
        return;
    }
    match level {
        LogLevel::Trace => log::trace!("{}", message),
        LogLevel::Debug => log::debug!("{}", message),
        LogLevel::Info => log::info!("{}", message),
        LogLevel::Warn => log::warn!("{}", message),
        LogLevel::Error => log::error!("{}", message),
    }
}

/// Emite log com valor hexadecimal
pub fn log_hex(level: LogLevel, message: &str, value: u64) {
    if !level_enabled(level) {
        return;
    }
    match level {
        LogLevel::Trace => log::trace!("{} {:#x}", message, value),
        LogLevel::Debug => log::debug!("{} {:#x}", message, value),
        LogLevel::Info => log::info!("{} {:#x}", message, value),
        LogLevel::Warn => log::warn!("{} {:#x}", message, value),
        LogLevel::Error => log::error!("{} {:#x}", message, value),
    }
}

/// Emite log com um rótulo e uma string (nomes de teste, nomes de processo)
pub fn log_str(level: LogLevel, message: &str, value: &str) {
    if !level_enabled(level) {
        return;
    }
    match level {
        LogLevel::Trace => log::trace!("{} {}", message, value),
        LogLevel::Debug => log::debug!("{} {}", message, value),
        LogLevel::Info => log::info!("{} {}", message, value),
        LogLevel::Warn => log::warn!("{} {}", message, value),
        LogLevel::Error => log::error!("{} {}", message, value),
    }
}

// Macros de conveniência
#[macro_export]
macro_rules! kinfo {
    ($msg:expr) => {
        $crate::core::debug::klog::log($crate::core::debug::klog::LogLevel::Info, $msg)
    };
    ($msg:expr, $val:expr) => {
        $crate::core::debug::klog::log_hex(
            $crate::core::debug::klog::LogLevel::Info,
            $msg,
            $val as u64,
        )
    };
}

#[macro_export]
macro_rules! kwarn {
    ($msg:expr) => {
        $crate::core::debug::klog::log($crate::core::debug::klog::LogLevel::Warn, $msg)
    };
    ($msg:expr, $val:expr) => {
        $crate::core::debug::klog::log_hex(
            $crate::core::debug::klog::LogLevel::Warn,
            $msg,
            $val as u64,
        )
    };
}

#[macro_export]
macro_rules! kerror {
    ($msg:expr) => {
        $crate::core::debug::klog::log($crate::core::debug::klog::LogLevel::Error, $msg)
    };
    ($msg:expr, $val:expr) => {
        $crate::core::debug::klog::log_hex(
            $crate::core::debug::klog::LogLevel::Error,
            $msg,
            $val as u64,
        )
    };
}

#[macro_export]
macro_rules! kdebug {
    ($msg:expr) => {
        $crate::core::debug::klog::log($crate::core::debug::klog::LogLevel::Debug, $msg)
    };
    ($msg:expr, $val:expr) => {
        $crate::core::debug::klog::log_hex(
            $crate::core::debug::klog::LogLevel::Debug,
            $msg,
            $val as u64,
        )
    };
}

#[macro_export]
macro_rules! ktrace {
    ($msg:expr) => {
        $crate::core::debug::klog::log($crate::core::debug::klog::LogLevel::Trace, $msg)
    };
    ($msg:expr, $val:expr) => {
        $crate::core::debug::klog::log_hex(
            $crate::core::debug::klog::LogLevel::Trace,
            $msg,
            $val as u64,
        )
    };
}
