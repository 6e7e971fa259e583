//! Diagnóstico do kernel

pub mod klog;
