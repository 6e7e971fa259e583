//! Árvore rubro-negra intrusiva ordenada por vruntime
//!
//! Os nós são os próprios slots da arena de processos: os elos (`left`,
//! `right`, `tree_parent`) são índices, nunca ponteiros, e a árvore em si só
//! guarda a raiz e os agregados. Todas as operações recebem a arena
//! emprestada, o que mantém a estrutura testável contra um array puro.
//!
//! Agregados mantidos incrementalmente a cada inserção/remoção:
//! - `length` e `total_weight` (base da fatia de tempo justa);
//! - `min_entry`, cache do nó mais à esquerda. A remoção do mínimo invalida
//!   a cache; a extração seguinte desce pela esquerda e a inserção seguinte
//!   a repovoa.
//!
//! Empates de vruntime descem para a direita: entre chaves iguais, o
//! inserido primeiro fica mais à esquerda e sai primeiro.

use crate::sched::config::{NPROC, SCHED_PERIOD};
use crate::sched::proc::{Color, Pcb, ProcFlags, SlotId};

/// Árvore de processos prontos, ordenada por vruntime
pub struct RunTree {
    root: Option<SlotId>,
    /// Nós presentes na árvore
    pub length: usize,
    /// Soma dos pesos dos nós presentes
    pub total_weight: u64,
    /// Cache do menor vruntime; `None` quando invalidada
    min_entry: Option<SlotId>,
    /// Período alvo de escalonamento, em ticks
    pub period: u64,
}

impl RunTree {
    pub const fn new() -> Self {
        Self {
            root: None,
            length: 0,
            total_weight: 0,
            min_entry: None,
            period: SCHED_PERIOD,
        }
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// A árvore comporta no máximo a capacidade da arena
    pub fn is_full(&self) -> bool {
        self.length >= NPROC
    }

    fn color_of(procs: &[Pcb], node: Option<SlotId>) -> Color {
        match node {
            Some(s) => procs[s].color,
            None => Color::Black,
        }
    }

    /// Nó mais à esquerda da subárvore enraizada em `from`
    fn minimum(procs: &[Pcb], from: SlotId) -> SlotId {
        let mut cur = from;
        while let Some(l) = procs[cur].left {
            cur = l;
        }
        cur
    }

    /// Menor vruntime presente, sem remover. Usa a cache quando válida.
    pub fn peek_min(&self, procs: &[Pcb]) -> Option<SlotId> {
        self.min_entry
            .or_else(|| self.root.map(|r| Self::minimum(procs, r)))
    }

    /// Insere um slot pronto, reequilibra e atualiza os agregados.
    ///
    /// O chamador garante que o slot não está na árvore e que `vruntime` e
    /// `weight` já refletem o valor final.
    pub fn insert(&mut self, procs: &mut [Pcb], slot: SlotId) {
        debug_assert!(!procs[slot].on_tree());
        let key = procs[slot].vruntime;

        // descida binária; empates vão para a direita
        let mut parent = None;
        let mut cur = self.root;
        while let Some(c) = cur {
            parent = Some(c);
            cur = if key < procs[c].vruntime {
                procs[c].left
            } else {
                procs[c].right
            };
        }

        procs[slot].tree_parent = parent;
        procs[slot].left = None;
        procs[slot].right = None;
        procs[slot].color = Color::Red;
        match parent {
            None => self.root = Some(slot),
            Some(p) => {
                if key < procs[p].vruntime {
                    procs[p].left = Some(slot);
                } else {
                    procs[p].right = Some(slot);
                }
            }
        }

        self.fix_insert(procs, slot);

        self.length += 1;
        self.total_weight += procs[slot].weight;
        // cache: substitui se vazia ou se a chave nova é estritamente menor
        // (em empate o titular fica, preservando a ordem de chegada)
        match self.min_entry {
            Some(m) if procs[m].vruntime <= key => {}
            _ => self.min_entry = Some(slot),
        }
        procs[slot].flags.insert(ProcFlags::ON_TREE);
    }

    /// Remove o menor vruntime e devolve seu slot.
    ///
    /// Com a cache válida a escolha é O(1); invalidada, desce pela esquerda.
    pub fn extract_min(&mut self, procs: &mut [Pcb]) -> Option<SlotId> {
        let min = match self.min_entry {
            Some(m) => m,
            None => Self::minimum(procs, self.root?),
        };
        self.remove(procs, min);
        Some(min)
    }

    /// Remove um slot arbitrário, reequilibra e atualiza os agregados
    pub fn remove(&mut self, procs: &mut [Pcb], z: SlotId) {
        debug_assert!(procs[z].on_tree());
        let mut y_color = procs[z].color;
        let x: Option<SlotId>;
        let x_parent: Option<SlotId>;

        if procs[z].left.is_none() {
            x = procs[z].right;
            x_parent = procs[z].tree_parent;
            self.transplant(procs, z, x);
        } else if procs[z].right.is_none() {
            x = procs[z].left;
            x_parent = procs[z].tree_parent;
            self.transplant(procs, z, x);
        } else {
            // dois filhos: o sucessor em ordem assume o lugar de z
            let zr = procs[z].right.unwrap(); // o ramo garante filho direito
            let y = Self::minimum(procs, zr);
            y_color = procs[y].color;
            x = procs[y].right;
            if procs[y].tree_parent == Some(z) {
                x_parent = Some(y);
            } else {
                x_parent = procs[y].tree_parent;
                let yr = procs[y].right;
                self.transplant(procs, y, yr);
                let zr = procs[z].right;
                procs[y].right = zr;
                if let Some(zr) = zr {
                    procs[zr].tree_parent = Some(y);
                }
            }
            self.transplant(procs, z, Some(y));
            let zl = procs[z].left;
            procs[y].left = zl;
            if let Some(zl) = zl {
                procs[zl].tree_parent = Some(y);
            }
            procs[y].color = procs[z].color;
        }

        if y_color == Color::Black {
            self.fix_delete(procs, x_parent, x);
        }

        self.length -= 1;
        self.total_weight = self.total_weight.saturating_sub(procs[z].weight);
        if self.min_entry == Some(z) {
            self.min_entry = None;
        }
        procs[z].left = None;
        procs[z].right = None;
        procs[z].tree_parent = None;
        procs[z].color = Color::Black;
        procs[z].flags.remove(ProcFlags::ON_TREE);
    }

    /// Rotação à esquerda em torno de `x`. Sem filho direito, não faz nada.
    pub(crate) fn left_rotate(&mut self, procs: &mut [Pcb], x: SlotId) {
        let r = match procs[x].right {
            Some(r) => r,
            None => return,
        };
        let rl = procs[r].left;
        procs[x].right = rl;
        if let Some(rl) = rl {
            procs[rl].tree_parent = Some(x);
        }
        let xp = procs[x].tree_parent;
        procs[r].tree_parent = xp;
        match xp {
            None => self.root = Some(r),
            Some(p) => {
                if procs[p].left == Some(x) {
                    procs[p].left = Some(r);
                } else {
                    procs[p].right = Some(r);
                }
            }
        }
        procs[r].left = Some(x);
        procs[x].tree_parent = Some(r);
    }

    /// Rotação à direita em torno de `x`. Sem filho esquerdo, não faz nada.
    pub(crate) fn right_rotate(&mut self, procs: &mut [Pcb], x: SlotId) {
        let l = match procs[x].left {
            Some(l) => l,
            None => return,
        };
        let lr = procs[l].right;
        procs[x].left = lr;
        if let Some(lr) = lr {
            procs[lr].tree_parent = Some(x);
        }
        let xp = procs[x].tree_parent;
        procs[l].tree_parent = xp;
        match xp {
            None => self.root = Some(l),
            Some(p) => {
                if procs[p].left == Some(x) {
                    procs[p].left = Some(l);
                } else {
                    procs[p].right = Some(l);
                }
            }
        }
        procs[l].right = Some(x);
        procs[x].tree_parent = Some(l);
    }

    /// Substitui a subárvore de `u` pela de `v` no pai de `u`
    fn transplant(&mut self, procs: &mut [Pcb], u: SlotId, v: Option<SlotId>) {
        let up = procs[u].tree_parent;
        match up {
            None => self.root = v,
            Some(p) => {
                if procs[p].left == Some(u) {
                    procs[p].left = v;
                } else {
                    procs[p].right = v;
                }
            }
        }
        if let Some(v) = v {
            procs[v].tree_parent = up;
        }
    }

    /// Restaura as propriedades rubro-negras após inserir `node` (vermelho)
    fn fix_insert(&mut self, procs: &mut [Pcb], mut node: SlotId) {
        loop {
            let parent = match procs[node].tree_parent {
                Some(p) if procs[p].color == Color::Red => p,
                _ => break,
            };
            // pai vermelho implica que o pai não é a raiz
            let grand = match procs[parent].tree_parent {
                Some(g) => g,
                None => break,
            };
            if procs[grand].left == Some(parent) {
                let uncle = procs[grand].right;
                if Self::color_of(procs, uncle) == Color::Red {
                    let u = uncle.unwrap();
                    procs[parent].color = Color::Black;
                    procs[u].color = Color::Black;
                    procs[grand].color = Color::Red;
                    node = grand;
                } else {
                    let mut n = node;
                    if procs[parent].right == Some(n) {
                        n = parent;
                        self.left_rotate(procs, n);
                    }
                    // a rotação pode ter trocado pai e avô; recarrega de n
                    let p2 = procs[n].tree_parent.unwrap();
                    let g2 = procs[p2].tree_parent.unwrap();
                    procs[p2].color = Color::Black;
                    procs[g2].color = Color::Red;
                    self.right_rotate(procs, g2);
                    node = n;
                }
            } else {
                let uncle = procs[grand].left;
                if Self::color_of(procs, uncle) == Color::Red {
                    let u = uncle.unwrap();
                    procs[parent].color = Color::Black;
                    procs[u].color = Color::Black;
                    procs[grand].color = Color::Red;
                    node = grand;
                } else {
                    let mut n = node;
                    if procs[parent].left == Some(n) {
                        n = parent;
                        self.right_rotate(procs, n);
                    }
                    let p2 = procs[n].tree_parent.unwrap();
                    let g2 = procs[p2].tree_parent.unwrap();
                    procs[p2].color = Color::Black;
                    procs[g2].color = Color::Red;
                    self.left_rotate(procs, g2);
                    node = n;
                }
            }
        }
        if let Some(r) = self.root {
            procs[r].color = Color::Black;
        }
    }

    /// Restaura as propriedades rubro-negras após remover um nó preto.
    ///
    /// `node` carrega o preto extra (pode ser nil, daí o pai explícito).
    /// Numa árvore válida o irmão de um nó duplamente preto sempre existe;
    /// os `break` defensivos cobrem arenas corrompidas sem derrubar o kernel.
    fn fix_delete(
        &mut self,
        procs: &mut [Pcb],
        mut parent: Option<SlotId>,
        mut node: Option<SlotId>,
    ) {
        while node != self.root && Self::color_of(procs, node) == Color::Black {
            let p = match parent {
                Some(p) => p,
                None => break,
            };
            if procs[p].left == node {
                let mut sib = match procs[p].right {
                    Some(s) => s,
                    None => break,
                };
                if procs[sib].color == Color::Red {
                    procs[sib].color = Color::Black;
                    procs[p].color = Color::Red;
                    self.left_rotate(procs, p);
                    sib = match procs[p].right {
                        Some(s) => s,
                        None => break,
                    };
                }
                if Self::color_of(procs, procs[sib].left) == Color::Black
                    && Self::color_of(procs, procs[sib].right) == Color::Black
                {
                    procs[sib].color = Color::Red;
                    node = Some(p);
                    parent = procs[p].tree_parent;
                } else {
                    if Self::color_of(procs, procs[sib].right) == Color::Black {
                        if let Some(sl) = procs[sib].left {
                            procs[sl].color = Color::Black;
                        }
                        procs[sib].color = Color::Red;
                        self.right_rotate(procs, sib);
                        sib = match procs[p].right {
                            Some(s) => s,
                            None => break,
                        };
                    }
                    procs[sib].color = procs[p].color;
                    procs[p].color = Color::Black;
                    if let Some(sr) = procs[sib].right {
                        procs[sr].color = Color::Black;
                    }
                    self.left_rotate(procs, p);
                    node = self.root;
                }
            } else {
                let mut sib = match procs[p].left {
                    Some(s) => s,
                    None => break,
                };
                if procs[sib].color == Color::Red {
                    procs[sib].color = Color::Black;
                    procs[p].color = Color::Red;
                    self.right_rotate(procs, p);
                    sib = match procs[p].left {
                        Some(s) => s,
                        None => break,
                    };
                }
                if Self::color_of(procs, procs[sib].left) == Color::Black
                    && Self::color_of(procs, procs[sib].right) == Color::Black
                {
                    procs[sib].color = Color::Red;
                    node = Some(p);
                    parent = procs[p].tree_parent;
                } else {
                    if Self::color_of(procs, procs[sib].left) == Color::Black {
                        if let Some(sr) = procs[sib].right {
                            procs[sr].color = Color::Black;
                        }
                        procs[sib].color = Color::Red;
                        self.left_rotate(procs, sib);
                        sib = match procs[p].left {
                            Some(s) => s,
                            None => break,
                        };
                    }
                    procs[sib].color = procs[p].color;
                    procs[p].color = Color::Black;
                    if let Some(sl) = procs[sib].left {
                        procs[sl].color = Color::Black;
                    }
                    self.right_rotate(procs, p);
                    node = self.root;
                }
            }
        }
        if let Some(n) = node {
            procs[n].color = Color::Black;
        }
    }

    /// Percorre a árvore inteira e verifica as propriedades rubro-negras e a
    /// ordenação por vruntime. Para diagnóstico; O(n).
    pub fn check_invariants(&self, procs: &[Pcb]) -> bool {
        if Self::color_of(procs, self.root) != Color::Black {
            return false;
        }
        if Self::black_height(procs, self.root).is_none() {
            return false;
        }
        let mut prev = None;
        Self::in_order_sorted(procs, self.root, &mut prev)
    }

    /// Altura preta da subárvore; `None` sinaliza violação (vermelho com
    /// filho vermelho ou alturas pretas divergentes)
    fn black_height(procs: &[Pcb], node: Option<SlotId>) -> Option<u32> {
        let Some(s) = node else {
            return Some(1);
        };
        let n = &procs[s];
        if n.color == Color::Red
            && (Self::color_of(procs, n.left) == Color::Red
                || Self::color_of(procs, n.right) == Color::Red)
        {
            return None;
        }
        let lh = Self::black_height(procs, n.left)?;
        let rh = Self::black_height(procs, n.right)?;
        if lh != rh {
            return None;
        }
        Some(lh + if n.color == Color::Black { 1 } else { 0 })
    }

    fn in_order_sorted(procs: &[Pcb], node: Option<SlotId>, prev: &mut Option<u64>) -> bool {
        let Some(s) = node else {
            return true;
        };
        if !Self::in_order_sorted(procs, procs[s].left, prev) {
            return false;
        }
        if let Some(p) = *prev {
            if procs[s].vruntime < p {
                return false;
            }
        }
        *prev = Some(procs[s].vruntime);
        Self::in_order_sorted(procs, procs[s].right, prev)
    }
}

impl Default for RunTree {
    fn default() -> Self {
        Self::new()
    }
}
