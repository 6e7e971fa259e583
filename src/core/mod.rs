//! Módulos centrais: diagnóstico e logging

pub mod debug;
