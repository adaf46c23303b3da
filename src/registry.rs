//! The per-type-name creation function table. An explicit registry instance
//! is handed to the manager at construction, so tests can run against a
//! fake table and custom kinds never have to touch process-wide state.

use std::sync::Arc;

use crate::errors::*;
use crate::manifest::ResourceDef;
use crate::resource::{self, Resource};
use crate::utils::{FastHashMap, HashValue};

pub type Factory = Box<dyn Fn(&ResourceDef) -> Result<Arc<dyn Resource>> + Send + Sync>;

pub struct ResourceRegistry {
    factories: FastHashMap<HashValue<str>, Factory>,
}

impl ResourceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        ResourceRegistry {
            factories: FastHashMap::default(),
        }
    }

    /// Creates a registry with all the built-in resource kinds registered.
    pub fn with_builtins() -> Self {
        let mut registry = ResourceRegistry::new();

        registry.register(resource::data::KIND, |def| {
            Ok(Arc::new(resource::Data::from_def(def)?))
        });
        registry.register(resource::text::KIND, |def| {
            Ok(Arc::new(resource::Text::from_def(def)?))
        });
        registry.register(resource::texture::KIND, |def| {
            Ok(Arc::new(resource::Texture::from_def(def)?))
        });
        registry.register(resource::sound::KIND, |def| {
            Ok(Arc::new(resource::Sound::from_def(def)?))
        });
        registry.register(resource::shader::KIND, |def| {
            Ok(Arc::new(resource::Shader::from_def(def)?))
        });
        registry.register(resource::curve::KIND, |def| {
            Ok(Arc::new(resource::Curve::from_def(def)?))
        });
        registry.register(resource::sequencer::KIND, |def| {
            Ok(Arc::new(resource::Sequencer::from_def(def)?))
        });
        registry.register(resource::spritesheet::KIND, |def| {
            Ok(Arc::new(resource::Spritesheet::from_def(def)?))
        });
        registry.register(resource::animation::KIND, |def| {
            Ok(Arc::new(resource::SpriteAnimation::from_def(def)?))
        });

        registry
    }

    /// Registers a creation function under a type discriminator, replacing
    /// any previous registration of that name.
    pub fn register<T, F>(&mut self, kind: T, factory: F)
    where
        T: AsRef<str>,
        F: Fn(&ResourceDef) -> Result<Arc<dyn Resource>> + Send + Sync + 'static,
    {
        self.factories
            .insert(kind.as_ref().into(), Box::new(factory));
    }

    /// Creates a resource instance from its definition element.
    pub fn create(&self, def: &ResourceDef) -> Result<Arc<dyn Resource>> {
        let factory = self.factories.get(&HashValue::from(&*def.kind)).ok_or_else(|| {
            Error::BadParam(format!(
                "Resource '{}' has unknown type '{}'.",
                def.name, def.kind
            ))
        })?;

        factory(def)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unknown_kind() {
        let registry = ResourceRegistry::with_builtins();
        let def = ResourceDef::new("prefab", "tree");
        match registry.create(&def) {
            Err(Error::BadParam(_)) => {}
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn builtins() {
        let registry = ResourceRegistry::with_builtins();
        let def = ResourceDef::new("text", "credits").with("path", "res:credits.txt");
        let res = registry.create(&def).unwrap();
        assert_eq!(res.kind(), "text");
        assert_eq!(res.name(), "credits");
        assert!(!res.is_loaded());
    }
}
