//! Ordered instruction lists with stable handles.
//!
//! Instructions refer to each other through [`InstrId`] handles rather than
//! pointers. An id stays valid for as long as its instruction is in the list;
//! removing the instruction leaves any reference to it dangling, which the
//! encoder reports as [`IrError::UnresolvedTarget`](crate::IrError).

use alloc::vec::Vec;
use core::fmt;

use crate::instr::Instruction;

/// Stable handle of an instruction inside an [`InstrList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstrId(pub(crate) u32);

impl InstrId {
    /// Raw handle value.
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for InstrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// An ordered sequence of instructions.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstrList {
    instrs: Vec<Instruction>,
    next_id: u32,
}

impl InstrList {
    /// An empty list.
    pub fn new() -> Self {
        Self::default()
    }

    fn adopt(&mut self, mut instr: Instruction) -> (InstrId, Instruction) {
        let id = InstrId(self.next_id);
        self.next_id += 1;
        instr.set_id(id);
        (id, instr)
    }

    /// Append `instr` and return its handle.
    pub fn append(&mut self, instr: Instruction) -> InstrId {
        let (id, instr) = self.adopt(instr);
        self.instrs.push(instr);
        id
    }

    /// Insert `instr` at the front and return its handle.
    pub fn prepend(&mut self, instr: Instruction) -> InstrId {
        let (id, instr) = self.adopt(instr);
        self.instrs.insert(0, instr);
        id
    }

    /// Insert `instr` before `anchor`. Returns `None` if `anchor` is not in the list.
    pub fn insert_before(&mut self, anchor: InstrId, instr: Instruction) -> Option<InstrId> {
        let pos = self.position(anchor)?;
        let (id, instr) = self.adopt(instr);
        self.instrs.insert(pos, instr);
        Some(id)
    }

    /// Insert `instr` after `anchor`. Returns `None` if `anchor` is not in the list.
    pub fn insert_after(&mut self, anchor: InstrId, instr: Instruction) -> Option<InstrId> {
        let pos = self.position(anchor)?;
        let (id, instr) = self.adopt(instr);
        self.instrs.insert(pos + 1, instr);
        Some(id)
    }

    /// Remove and return the instruction with handle `id`.
    pub fn remove(&mut self, id: InstrId) -> Option<Instruction> {
        let pos = self.position(id)?;
        Some(self.instrs.remove(pos))
    }

    /// Swap the instruction with handle `id` for `instr`, which takes over
    /// the handle. Returns the old instruction.
    pub fn replace(&mut self, id: InstrId, mut instr: Instruction) -> Option<Instruction> {
        let pos = self.position(id)?;
        instr.set_id(id);
        Some(core::mem::replace(&mut self.instrs[pos], instr))
    }

    /// Position of `id` in list order.
    pub fn position(&self, id: InstrId) -> Option<usize> {
        self.instrs.iter().position(|i| i.id() == Some(id))
    }

    pub fn get(&self, id: InstrId) -> Option<&Instruction> {
        self.instrs.iter().find(|i| i.id() == Some(id))
    }

    pub fn get_mut(&mut self, id: InstrId) -> Option<&mut Instruction> {
        self.instrs.iter_mut().find(|i| i.id() == Some(id))
    }

    /// Instruction at list position `pos`.
    pub fn at(&self, pos: usize) -> Option<&Instruction> {
        self.instrs.get(pos)
    }

    /// Handles in list order.
    pub fn ids(&self) -> Vec<InstrId> {
        self.instrs.iter().filter_map(Instruction::id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instruction> {
        self.instrs.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Instruction> {
        self.instrs.iter_mut()
    }

    pub fn first(&self) -> Option<&Instruction> {
        self.instrs.first()
    }

    pub fn last(&self) -> Option<&Instruction> {
        self.instrs.last()
    }

    pub fn len(&self) -> usize {
        self.instrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instrs.is_empty()
    }

    /// Total encoded size in bytes.
    pub fn length(&self) -> usize {
        self.instrs.iter().map(Instruction::length).sum()
    }

    /// Set every instruction's note to its byte offset from the start of the
    /// list and return the total size.
    pub fn assign_notes(&mut self) -> usize {
        let mut offset = 0usize;
        for instr in &mut self.instrs {
            instr.set_note(offset as i64);
            offset += instr.length();
        }
        offset
    }
}

impl<'a> IntoIterator for &'a InstrList {
    type Item = &'a Instruction;
    type IntoIter = core::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instrs.iter()
    }
}

impl FromIterator<Instruction> for InstrList {
    fn from_iter<T: IntoIterator<Item = Instruction>>(iter: T) -> Self {
        let mut list = InstrList::new();
        for instr in iter {
            list.append(instr);
        }
        list
    }
}

impl fmt::Display for InstrList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instr in &self.instrs {
            match instr.id() {
                Some(id) => writeln!(f, "{:>5}  {}", id, instr)?,
                None => writeln!(f, "       {}", instr)?,
            }
        }
        Ok(())
    }
}
