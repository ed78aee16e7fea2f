//! Reflector - entry point
//!
//! A `Reflector` pairs a host [`MetadataProvider`] with a
//! [`ReflectionCache`] and an [`EngineConfig`]. It is cheap to clone; every
//! wrapper carries one so it can resolve related tokens on demand.

use std::fmt;
use std::sync::Arc;

use refract_sdk::{MemberKind, MemberToken, MetadataProvider, TypeToken, Value};

use super::cache::{CacheStats, ReflectionCache};
use super::members::{FieldWrapper, MemberData, MemberWrapper, MethodWrapper, PropertyWrapper};
use super::types::{TypeData, TypeWrapper};
use crate::config::EngineConfig;
use crate::error::ReflectResult;

struct ReflectorShared {
    provider: Arc<dyn MetadataProvider>,
    cache: Arc<ReflectionCache>,
    config: EngineConfig,
}

/// Reflection entry point over a host runtime
#[derive(Clone)]
pub struct Reflector {
    shared: Arc<ReflectorShared>,
}

impl Reflector {
    /// Create a reflector with a fresh cache and default configuration
    pub fn new(provider: Arc<dyn MetadataProvider>) -> Self {
        Self::with_cache(provider, Arc::new(ReflectionCache::new()), EngineConfig::default())
    }

    /// Create a reflector with a fresh cache and the given configuration
    pub fn with_config(provider: Arc<dyn MetadataProvider>, config: EngineConfig) -> Self {
        Self::with_cache(provider, Arc::new(ReflectionCache::new()), config)
    }

    /// Create a reflector over an existing cache.
    ///
    /// The cache is keyed by host tokens, so it must only be shared between
    /// reflectors over the same host.
    pub fn with_cache(
        provider: Arc<dyn MetadataProvider>,
        cache: Arc<ReflectionCache>,
        config: EngineConfig,
    ) -> Self {
        Self {
            shared: Arc::new(ReflectorShared {
                provider,
                cache,
                config,
            }),
        }
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    /// The wrapper cache
    pub fn cache(&self) -> &Arc<ReflectionCache> {
        &self.shared.cache
    }

    /// Cache counters
    pub fn cache_stats(&self) -> CacheStats {
        self.shared.cache.stats()
    }

    pub(crate) fn provider(&self) -> &dyn MetadataProvider {
        self.shared.provider.as_ref()
    }

    // ========================================================================
    // Wrapping
    // ========================================================================

    /// Wrap a host type
    pub fn wrap_type(&self, token: TypeToken) -> ReflectResult<TypeWrapper> {
        Ok(TypeWrapper::new(self.type_data(token)?, self.clone()))
    }

    /// Wrap a host member as the wrapper matching its kind
    pub fn wrap_member(&self, token: MemberToken) -> ReflectResult<MemberWrapper> {
        let data = self.member_data(token)?;
        Ok(match data.descriptor.kind {
            MemberKind::Method => MemberWrapper::Method(MethodWrapper::new(data, self.clone())),
            MemberKind::Constructor => {
                MemberWrapper::Constructor(MethodWrapper::new(data, self.clone()))
            }
            MemberKind::Field => MemberWrapper::Field(FieldWrapper::new(data, self.clone())),
            MemberKind::Property => {
                MemberWrapper::Property(PropertyWrapper::new(data, self.clone()))
            }
        })
    }

    /// Runtime type of a value; `None` for null
    pub fn type_of(&self, value: &Value) -> ReflectResult<Option<TypeWrapper>> {
        match self.provider().type_of(value)? {
            Some(token) => Ok(Some(self.wrap_type(token)?)),
            None => Ok(None),
        }
    }

    /// The universal root type
    pub fn root_type(&self) -> ReflectResult<TypeWrapper> {
        self.wrap_type(self.provider().root_type())
    }

    pub(crate) fn method(&self, token: MemberToken) -> ReflectResult<MethodWrapper> {
        Ok(MethodWrapper::new(self.member_data(token)?, self.clone()))
    }

    // ========================================================================
    // Cached data
    // ========================================================================

    pub(crate) fn type_data(&self, token: TypeToken) -> ReflectResult<Arc<TypeData>> {
        let cache = &self.shared.cache;
        if let Some(data) = cache.types.get(&token) {
            cache.record_hit();
            if self.shared.config.trace_cache {
                tracing::trace!(token = token.0, "type cache hit");
            }
            return Ok(data);
        }

        cache.record_miss();
        let descriptor = self.provider().describe_type(token)?;
        let base_name = match descriptor.base {
            Some(base) => Some(self.type_data(base)?.identity.full_name.clone()),
            None => None,
        };
        let data = Arc::new(TypeData::new(token, descriptor, base_name));
        Ok(cache.types.get_or_insert(token, data))
    }

    pub(crate) fn member_data(&self, token: MemberToken) -> ReflectResult<Arc<MemberData>> {
        let cache = &self.shared.cache;
        let cached = cache
            .methods
            .get(&token)
            .or_else(|| cache.fields.get(&token))
            .or_else(|| cache.properties.get(&token));
        if let Some(data) = cached {
            cache.record_hit();
            if self.shared.config.trace_cache {
                tracing::trace!(token = token.0, "member cache hit");
            }
            return Ok(data);
        }

        cache.record_miss();
        let descriptor = self.provider().describe_member(token)?;
        let declaring = self.type_data(descriptor.declaring_type)?;
        let member_type = self.type_data(descriptor.member_type)?;
        let mut parameter_types = Vec::with_capacity(descriptor.parameters.len());
        for p in &descriptor.parameters {
            parameter_types.push(self.type_data(p.param_type)?.identity.full_name.clone());
        }
        let mut type_arguments = Vec::with_capacity(descriptor.type_arguments.len());
        for t in &descriptor.type_arguments {
            type_arguments.push(self.type_data(*t)?.identity.full_name.clone());
        }

        let kind = descriptor.kind;
        let data = Arc::new(MemberData::new(
            token,
            descriptor,
            declaring.identity.full_name.clone(),
            member_type.identity.full_name.clone(),
            parameter_types,
            type_arguments,
        ));
        let store = match kind {
            MemberKind::Method | MemberKind::Constructor => &cache.methods,
            MemberKind::Field => &cache.fields,
            MemberKind::Property => &cache.properties,
        };
        Ok(store.get_or_insert(token, data))
    }
}

impl fmt::Debug for Reflector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reflector")
            .field("config", &self.shared.config)
            .field("cache", &self.shared.cache.stats())
            .finish()
    }
}
