//! Framework de testes do kernel
//!
//! Suites executáveis em bare-metal, sem o harness do cargo. Usado pelas
//! suites habilitadas com a feature `self_test`.

use crate::core::debug::klog::{self, LogLevel};

/// Resultado de teste
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TestResult {
    Passed,
    Failed,
    Skipped,
}

/// Um caso de teste
pub struct TestCase {
    pub name: &'static str,
    pub func: fn() -> TestResult,
}

impl TestCase {
    pub const fn new(name: &'static str, func: fn() -> TestResult) -> Self {
        Self { name, func }
    }
}

/// Executa suite de testes
pub fn run_test_suite(name: &str, tests: &[TestCase]) -> (usize, usize, usize) {
    klog::log_str(LogLevel::Info, "=== Executando suite:", name);

    let mut passed = 0;
    let mut failed = 0;
    let mut skipped = 0;

    for test in tests {
        let result = (test.func)();
        match result {
            TestResult::Passed => {
                klog::log_str(LogLevel::Info, "[PASS]", test.name);
                passed += 1;
            }
            TestResult::Failed => {
                klog::log_str(LogLevel::Error, "[FAIL]", test.name);
                failed += 1;
            }
            TestResult::Skipped => {
                klog::log_str(LogLevel::Warn, "[SKIP]", test.name);
                skipped += 1;
            }
        }
    }

    crate::kinfo!("Resultados: passed=", passed as u64);
    (passed, failed, skipped)
}
