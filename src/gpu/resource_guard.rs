//! Validity-flagged GPU resources
//!
//! Every texture and buffer the GPU pipeline owns sits behind a
//! `GuardedResource`. Teardown invalidates the guard and drops the wgpu
//! object, so a render call that outlives its scene gets
//! `LightingError::StaleResource` instead of touching a destroyed texture.

use crate::error::{LightingError, LightingResult};

/// A resource plus the flag that says whether it may still be used
#[derive(Debug)]
pub struct GuardedResource<T> {
    name: &'static str,
    resource: Option<T>,
    /// Resource is a stand-in created after an allocation failure
    placeholder: bool,
}

impl<T> GuardedResource<T> {
    pub fn new(name: &'static str, resource: T) -> Self {
        Self {
            name,
            resource: Some(resource),
            placeholder: false,
        }
    }

    /// Wrap a neutral stand-in for a resource that failed to allocate
    pub fn placeholder(name: &'static str, resource: T) -> Self {
        Self {
            name,
            resource: Some(resource),
            placeholder: true,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_valid(&self) -> bool {
        self.resource.is_some()
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    pub fn get(&self) -> LightingResult<&T> {
        self.resource
            .as_ref()
            .ok_or_else(|| LightingError::StaleResource {
                resource: self.name.to_string(),
            })
    }

    pub fn get_mut(&mut self) -> LightingResult<&mut T> {
        let name = self.name;
        self.resource
            .as_mut()
            .ok_or_else(|| LightingError::StaleResource {
                resource: name.to_string(),
            })
    }

    /// Swap in a new resource, e.g. after a resize
    pub fn replace(&mut self, resource: T, placeholder: bool) -> Option<T> {
        self.placeholder = placeholder;
        self.resource.replace(resource)
    }

    /// Mark stale and release the resource
    pub fn invalidate(&mut self) -> Option<T> {
        self.placeholder = false;
        self.resource.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_after_invalidate_is_stale() {
        let mut guard = GuardedResource::new("sun_shadow", 7u32);
        assert!(guard.is_valid());
        assert_eq!(*guard.get().unwrap(), 7);

        assert_eq!(guard.invalidate(), Some(7));
        assert!(!guard.is_valid());
        match guard.get() {
            Err(LightingError::StaleResource { resource }) => assert_eq!(resource, "sun_shadow"),
            other => panic!("expected stale resource, got {:?}", other),
        }
        assert!(guard.get_mut().is_err());
    }

    #[test]
    fn test_replace_tracks_placeholder() {
        let mut guard = GuardedResource::placeholder("atlas", 1u32);
        assert!(guard.is_placeholder());

        assert_eq!(guard.replace(2, false), Some(1));
        assert!(!guard.is_placeholder());
        *guard.get_mut().unwrap() += 1;
        assert_eq!(*guard.get().unwrap(), 3);
    }
}
