// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present facemgr Contributors

//! Face system
//!
//! Owns one factory per registered protocol and routes the `face_system`
//! configuration table and outbound face requests to them.

use crate::channel::{Channel, FaceCreatedCallback, FaceCreationFailedCallback};
use crate::error::{ConfigError, FaceError};
use crate::factory::{ConfigContext, ConfigMode, FaceRequest, FactoryRegistry, ProtocolFactory};
use crate::interfaces::{NetworkInterfaces, SystemInterfaces};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use toml::{Table, Value};
use tracing::{debug, info};

const SECTION: &str = "face_system";

#[derive(Debug)]
pub struct FaceSystem {
    factories: BTreeMap<String, Box<dyn ProtocolFactory>>,
}

impl FaceSystem {
    pub fn new(registry: &FactoryRegistry, interfaces: Arc<dyn NetworkInterfaces>) -> Self {
        Self {
            factories: registry.build(interfaces),
        }
    }

    /// Built-in protocols over the host's interfaces
    pub fn with_builtin() -> Self {
        Self::new(&FactoryRegistry::with_builtin(), Arc::new(SystemInterfaces))
    }

    /// Applies the `face_system` table to every factory
    ///
    /// Every factory sees its own section, or `None` when the section is
    /// missing. In [`ConfigMode::Apply`] the whole table is validated first,
    /// so a rejected table leaves every factory untouched.
    pub fn process_config(
        &mut self,
        section: Option<&Table>,
        context: &ConfigContext,
    ) -> Result<(), ConfigError> {
        if let Some(section) = section {
            for (key, value) in section {
                if !self.factories.contains_key(key) {
                    return Err(ConfigError::UnknownProtocol(key.clone()));
                }
                if !value.is_table() {
                    return Err(ConfigError::InvalidValue {
                        section: SECTION.to_string(),
                        key: key.clone(),
                        reason: format!("expected a table, got {}", value.type_str()),
                    });
                }
            }
        }

        if !context.is_dry_run() {
            let validate = ConfigContext::new(ConfigMode::ValidateOnly, context.add_face.clone());
            self.process_each(section, &validate)?;
        }
        self.process_each(section, context)?;

        if !context.is_dry_run() {
            info!(schemes = ?self.provided_schemes(), "face system configured");
        }
        Ok(())
    }

    fn process_each(
        &mut self,
        section: Option<&Table>,
        context: &ConfigContext,
    ) -> Result<(), ConfigError> {
        for (id, factory) in self.factories.iter_mut() {
            let protocol_section = section
                .and_then(|s| s.get(id.as_str()))
                .and_then(Value::as_table);
            debug!(protocol = %id, mode = ?context.mode, "processing config");
            factory.process_config(protocol_section, context)?;
        }
        Ok(())
    }

    pub fn factory(&self, id: &str) -> Option<&dyn ProtocolFactory> {
        self.factories.get(id).map(|factory| factory.as_ref())
    }

    /// The factory currently providing `scheme`
    pub fn factory_for_scheme(&self, scheme: &str) -> Option<&dyn ProtocolFactory> {
        self.factories
            .values()
            .find(|factory| factory.provided_schemes().contains(scheme))
            .map(|factory| factory.as_ref())
    }

    /// Creates an outbound face with the factory providing the remote scheme
    pub fn create_face(
        &self,
        request: FaceRequest,
        on_created: FaceCreatedCallback,
        on_failure: FaceCreationFailedCallback,
    ) -> Result<(), FaceError> {
        let scheme = request.remote_uri.scheme().to_string();
        let factory = self
            .factory_for_scheme(&scheme)
            .ok_or(FaceError::UnsupportedScheme(scheme))?;
        factory.create_face(request, on_created, on_failure)
    }

    pub fn provided_schemes(&self) -> BTreeSet<String> {
        self.factories
            .values()
            .flat_map(|factory| factory.provided_schemes().iter().cloned())
            .collect()
    }

    pub fn channels(&self) -> Vec<Arc<dyn Channel>> {
        self.factories
            .values()
            .flat_map(|factory| factory.channels())
            .collect()
    }

    /// Closes every channel of every factory
    pub fn shutdown(&self) {
        for channel in self.channels() {
            channel.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::AddFaceSink;
    use crate::face::FacePersistency;
    use crate::interfaces::StaticInterfaces;

    fn face_system() -> FaceSystem {
        FaceSystem::new(
            &FactoryRegistry::with_builtin(),
            Arc::new(StaticInterfaces::new(vec!["127.0.0.1".parse().unwrap()])),
        )
    }

    fn context(mode: ConfigMode) -> ConfigContext {
        let sink: AddFaceSink = Arc::new(|_| {});
        ConfigContext::new(mode, sink)
    }

    fn table(toml: &str) -> Table {
        toml::from_str(toml).unwrap()
    }

    #[test]
    fn test_unknown_protocol_is_fatal() {
        let mut fs = face_system();
        let err = fs
            .process_config(Some(&table("[udp]\nport = 6363")), &context(ConfigMode::Apply))
            .unwrap_err();
        assert_eq!(err, ConfigError::UnknownProtocol("udp".to_string()));
    }

    #[test]
    fn test_protocol_section_must_be_table() {
        let mut fs = face_system();
        let err = fs
            .process_config(Some(&table("tcp = 1")), &context(ConfigMode::ValidateOnly))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_dry_run_creates_nothing() {
        let mut fs = face_system();
        fs.process_config(
            Some(&table("[tcp]\nlisten = \"no\"\nport = 7001")),
            &context(ConfigMode::ValidateOnly),
        )
        .unwrap();
        assert!(fs.channels().is_empty());
        assert!(fs.provided_schemes().is_empty());
    }

    #[test]
    fn test_apply_without_listen() {
        let mut fs = face_system();
        fs.process_config(
            Some(&table("[tcp]\nlisten = \"no\"\nport = 7002\nenable_v6 = \"no\"")),
            &context(ConfigMode::Apply),
        )
        .unwrap();

        let channels = fs.channels();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].uri().to_string(), "tcp4://0.0.0.0:7002");
        assert!(!channels[0].is_listening());
        let schemes: Vec<String> = fs.provided_schemes().into_iter().collect();
        assert_eq!(schemes, vec!["tcp", "tcp4"]);
        assert_eq!(fs.factory_for_scheme("tcp4").map(|f| f.id()), Some("tcp"));
    }

    #[test]
    fn test_rejected_config_leaves_factories_untouched() {
        let mut fs = face_system();
        let err = fs.process_config(
            Some(&table("[tcp]\nlisten = \"no\"\nport = 7003\nbogus = 1")),
            &context(ConfigMode::Apply),
        );
        assert!(err.is_err());
        assert!(fs.channels().is_empty());
    }

    #[test]
    fn test_create_face_unsupported_scheme() {
        let fs = face_system();
        let request = FaceRequest::new(
            "tcp4://192.0.2.1:6363".parse().unwrap(),
            FacePersistency::Persistent,
        );
        let result = fs.create_face(
            request,
            Box::new(|_| panic!("no face expected")),
            Box::new(|_| panic!("no failure expected")),
        );
        assert!(matches!(result, Err(FaceError::UnsupportedScheme(s)) if s == "tcp4"));
    }
}
