//! Contabilidade de tempo e pesos
//!
//! Implementa a curva de pesos por nice (fator 1.25 por nível) e o avanço do
//! tempo virtual. Tudo em aritmética inteira: 1.25^k vira 5^k/4^k em u128.

use super::pcb::Pcb;
use crate::sched::config::{NICE0_WEIGHT, NICE_MAX, NICE_MIN, VRUNTIME_SHIFT};

/// Peso de um processo dado seu nice: floor(1024 / 1.25^nice).
///
/// Valores fora de [-20, 19] são grampeados. A curva é estritamente
/// decrescente: weight(-20) = 88817, weight(0) = 1024, weight(19) = 14.
pub fn compute_weight(nice_value: i32) -> u64 {
    let nice = nice_value.clamp(NICE_MIN, NICE_MAX);
    if nice < 0 {
        let k = (-nice) as u32;
        ((NICE0_WEIGHT as u128 * 5u128.pow(k)) / 4u128.pow(k)) as u64
    } else {
        let k = nice as u32;
        ((NICE0_WEIGHT as u128 * 4u128.pow(k)) / 5u128.pow(k)) as u64
    }
}

/// Acréscimo de vruntime por tick para um processo com o peso dado.
///
/// Escalado por `VRUNTIME_SHIFT` para que pesos grandes ainda avancem um
/// delta inteiro não-nulo. Um processo nice 0 acumula exatamente 1<<20.
pub fn vruntime_delta(weight: u64) -> u64 {
    debug_assert!(weight > 0);
    (NICE0_WEIGHT << VRUNTIME_SHIFT) / weight
}

/// Fatia de tempo em ticks: a fração do período proporcional ao peso do
/// processo dentro do peso agregado da árvore no momento do dispatch.
pub fn time_slice_for(weight: u64, total_weight: u64, period: u64) -> u64 {
    if total_weight == 0 {
        return period;
    }
    ((period * weight) / total_weight).max(1)
}

/// Um tick de relógio caiu sobre o processo em execução
pub fn tick(p: &mut Pcb) {
    p.curr_runtime += 1;
    p.vruntime += vruntime_delta(p.weight);
}
