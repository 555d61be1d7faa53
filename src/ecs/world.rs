//! World wrapper around hecs

use hecs::Entity;

use super::hierarchy::{FragmentOf, Fragments};

/// Entity storage for bodies and the fragment templates attached to them
pub struct World {
    /// The underlying hecs world
    pub inner: hecs::World,
}

impl World {
    /// Create a new empty world
    pub fn new() -> Self {
        Self {
            inner: hecs::World::new(),
        }
    }

    /// Spawn an entity with the given components
    pub fn spawn(&mut self, components: impl hecs::DynamicBundle) -> Entity {
        self.inner.spawn(components)
    }

    /// Despawn an entity
    pub fn despawn(&mut self, entity: Entity) -> Result<(), hecs::NoSuchEntity> {
        self.inner.despawn(entity)
    }

    /// Add components to an existing entity
    pub fn insert(
        &mut self,
        entity: Entity,
        components: impl hecs::DynamicBundle,
    ) -> Result<(), hecs::NoSuchEntity> {
        self.inner.insert(entity, components)
    }

    /// Remove a single component from an entity, returning it
    pub fn remove_one<T: hecs::Component>(
        &mut self,
        entity: Entity,
    ) -> Result<T, hecs::ComponentError> {
        self.inner.remove_one::<T>(entity)
    }

    /// Get a reference to a component
    pub fn get<T: hecs::Component>(
        &self,
        entity: Entity,
    ) -> Result<hecs::Ref<'_, T>, hecs::ComponentError> {
        self.inner.get::<&T>(entity)
    }

    /// Get a mutable reference to a component
    pub fn get_mut<T: hecs::Component>(
        &mut self,
        entity: Entity,
    ) -> Result<hecs::RefMut<'_, T>, hecs::ComponentError> {
        self.inner.get::<&mut T>(entity)
    }

    /// Check if an entity has a component
    pub fn has<T: hecs::Component>(&self, entity: Entity) -> bool {
        self.inner.get::<&T>(entity).is_ok()
    }

    /// Check if an entity exists
    pub fn contains(&self, entity: Entity) -> bool {
        self.inner.contains(entity)
    }

    /// Get the number of entities
    pub fn len(&self) -> u32 {
        self.inner.len()
    }

    /// Check if the world is empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Query for entities with specific components
    pub fn query<Q: hecs::Query>(&self) -> hecs::QueryBorrow<'_, Q> {
        self.inner.query::<Q>()
    }

    /// Query for entities with specific components (mutable)
    pub fn query_mut<Q: hecs::Query>(&mut self) -> hecs::QueryMut<'_, Q> {
        self.inner.query_mut::<Q>()
    }

    /// Attach `fragment` to `owner`, creating the owner's `Fragments` list if needed
    pub fn attach(&mut self, owner: Entity, fragment: Entity) -> Result<(), hecs::NoSuchEntity> {
        if !self.contains(owner) {
            return Err(hecs::NoSuchEntity);
        }
        self.inner.insert_one(fragment, FragmentOf(owner))?;
        if let Ok(mut list) = self.inner.get::<&mut Fragments>(owner) {
            list.push(fragment);
            return Ok(());
        }
        self.inner.insert_one(owner, Fragments::single(fragment))
    }

    /// Sever `fragment` from its owner. Returns the former owner, if any.
    pub fn detach(&mut self, fragment: Entity) -> Option<Entity> {
        let owner = self.inner.remove_one::<FragmentOf>(fragment).ok()?.owner();
        if let Ok(mut list) = self.inner.get::<&mut Fragments>(owner) {
            list.remove(fragment);
        }
        Some(owner)
    }

    /// Snapshot of the entities attached to `owner` (empty if none)
    pub fn fragments_of(&self, owner: Entity) -> Vec<Entity> {
        self.inner
            .get::<&Fragments>(owner)
            .map(|list| list.as_slice().to_vec())
            .unwrap_or_default()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
