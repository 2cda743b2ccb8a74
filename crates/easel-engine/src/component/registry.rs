use std::collections::HashSet;

use slotmap::SlotMap;

use crate::error::{EngineError, EngineResult};

use super::Component;

slotmap::new_key_type! {
    /// Stable handle to a registered component.
    ///
    /// Handles are never reused for a different component: a removed handle
    /// stays stale forever.
    pub struct ComponentId;
}

/// Ordered collection of registered components plus hover membership.
///
/// Components are owned by the arena; iteration follows registration order.
#[derive(Default)]
pub struct ComponentRegistry {
    pub(super) arena: SlotMap<ComponentId, Box<dyn Component>>,
    pub(super) order: Vec<ComponentId>,
    pub(super) hovered: HashSet<ComponentId>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a component and returns its handle.
    pub fn add<C: Component>(&mut self, component: C) -> ComponentId {
        self.add_boxed(Box::new(component))
    }

    pub fn add_boxed(&mut self, component: Box<dyn Component>) -> ComponentId {
        let id = self.arena.insert(component);
        self.order.push(id);
        log::debug!("component registered: {id:?}");
        id
    }

    /// Unregisters `id` and hands the component back.
    ///
    /// Unknown or stale handles fail with [`EngineError::Configuration`] and
    /// leave the registry untouched.
    pub fn remove(&mut self, id: ComponentId) -> EngineResult<Box<dyn Component>> {
        let component = self
            .arena
            .remove(id)
            .ok_or_else(|| EngineError::Configuration(format!("component {id:?} is not registered")))?;
        self.order.retain(|&k| k != id);
        self.hovered.remove(&id);
        log::debug!("component removed: {id:?}");
        Ok(component)
    }

    #[inline]
    pub fn contains(&self, id: ComponentId) -> bool {
        self.arena.contains_key(id)
    }

    pub fn get_mut(&mut self, id: ComponentId) -> Option<&mut dyn Component> {
        self.arena.get_mut(id).map(|c| c.as_mut())
    }

    /// Whether `id` currently contains the mouse, as of the last dispatch.
    #[inline]
    pub fn is_hovered(&self, id: ComponentId) -> bool {
        self.hovered.contains(&id)
    }

    /// Handles in registration order.
    pub fn ids(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.order.iter().copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("order", &self.order)
            .field("hovered", &self.hovered)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Inert;
    impl Component for Inert {}

    #[test]
    fn registration_order_is_preserved() {
        let mut reg = ComponentRegistry::new();
        let a = reg.add(Inert);
        let b = reg.add(Inert);
        let c = reg.add(Inert);
        reg.remove(b).unwrap();
        assert_eq!(reg.ids().collect::<Vec<_>>(), vec![a, c]);
    }

    #[test]
    fn removing_unknown_handle_is_a_configuration_error() {
        let mut reg = ComponentRegistry::new();
        let a = reg.add(Inert);
        reg.add(Inert);
        reg.remove(a).unwrap();

        let err = reg.remove(a).err().unwrap();
        assert!(matches!(err, EngineError::Configuration(_)));
        assert_eq!(reg.len(), 1, "failed removal must not mutate");
    }

    #[test]
    fn removal_drops_hover_membership() {
        let mut reg = ComponentRegistry::new();
        let a = reg.add(Inert);
        reg.hovered.insert(a);
        reg.remove(a).unwrap();
        assert!(!reg.is_hovered(a));
        assert!(reg.hovered.is_empty());
    }

    #[test]
    fn stale_handles_are_not_reused() {
        let mut reg = ComponentRegistry::new();
        let a = reg.add(Inert);
        reg.remove(a).unwrap();
        let b = reg.add(Inert);
        assert_ne!(a, b);
        assert!(!reg.contains(a));
        assert!(reg.contains(b));
    }
}
