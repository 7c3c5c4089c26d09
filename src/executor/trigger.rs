//! Per-name handles over the shared execution path.

use super::{InvokeError, Machine};
use crate::core::{BoxError, Entity};
use crate::registry::TransitionDef;

/// A declared transition bound to a machine.
///
/// Hosts can hand these out instead of raw names; every call forwards to
/// [`Machine::invoke`] or [`Machine::can_transition`].
pub struct Trigger<'m, E> {
    machine: &'m Machine<E>,
    def: &'m TransitionDef<E>,
}

impl<'m, E: Entity + 'static> Trigger<'m, E> {
    pub(crate) fn new(machine: &'m Machine<E>, def: &'m TransitionDef<E>) -> Self {
        Self { machine, def }
    }

    pub fn name(&self) -> &str {
        self.def.name()
    }

    pub fn definition(&self) -> &TransitionDef<E> {
        self.def
    }

    pub fn invoke(&self, entity: &mut E) -> Result<(), InvokeError> {
        self.machine.invoke(entity, self.def.name())
    }

    pub fn can_invoke(&self, entity: &E) -> Result<bool, BoxError> {
        self.machine.can_transition(entity, self.def.name())
    }
}
