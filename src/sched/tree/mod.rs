//! Árvore de execução dos processos prontos

pub mod rbtree;

pub use rbtree::RunTree;
