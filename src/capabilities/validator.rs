//! CapabilityValidator: decides what may be registered.
//!
//! Trait conformance itself is checked by the compiler: an `Arc<dyn CpuContext>`
//! can only be built from a type implementing `CpuContext`. What remains for
//! runtime is the part decided at registration time: whether the declared
//! type is a registrable contract at all, and whether the object has picked a
//! single capability identity.

use crate::context::{CapabilityType, Context, ContractKind};
use crate::utilities::errors::InvalidCapability;

/// Stateless validation rules for capability types and instances.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapabilityValidator;

impl CapabilityValidator {
    /// True iff `capability` is a pure, tagged contract other than the root marker.
    pub fn is_registrable_capability(capability: &CapabilityType) -> bool {
        Self::check_capability(capability).is_ok()
    }

    pub fn check_capability(capability: &CapabilityType) -> Result<(), InvalidCapability> {
        let descriptor = capability.descriptor();
        match descriptor.kind {
            ContractKind::Root => Err(InvalidCapability::RootMarker),
            ContractKind::Concrete => Err(InvalidCapability::NotACapabilityType {
                contract: descriptor.name,
            }),
            ContractKind::Contract if !descriptor.capability => {
                Err(InvalidCapability::NotACapabilityType {
                    contract: descriptor.name,
                })
            }
            ContractKind::Contract => Ok(()),
        }
    }

    /// True iff `instance` implements `capability` directly and has a single
    /// capability identity.
    pub fn implements_capability(instance: &dyn Context, capability: &CapabilityType) -> bool {
        Self::check_instance(instance, capability).is_ok()
    }

    /// Check the instance's declared direct contracts.
    ///
    /// Listing the root marker is ignored. Listing a contract together with
    /// one of its ancestors counts as one identity; listing two contracts
    /// that are unrelated through `extends` is rejected.
    pub fn check_instance(
        instance: &dyn Context,
        capability: &CapabilityType,
    ) -> Result<(), InvalidCapability> {
        let mut direct: Vec<CapabilityType> = Vec::new();
        for contract in instance.direct_contracts() {
            if !contract.is_root() && !direct.contains(&contract) {
                direct.push(contract);
            }
        }

        if !direct.contains(capability) {
            return Err(InvalidCapability::NotImplemented {
                contract: capability.name(),
            });
        }

        // Identities are the leaves: contracts no other listed contract extends.
        let identities: Vec<&CapabilityType> = direct
            .iter()
            .filter(|candidate| !direct.iter().any(|other| other.extends(candidate)))
            .collect();

        if identities.len() > 1 {
            return Err(InvalidCapability::MultipleCapabilities {
                contract: capability.name(),
                found: identities.iter().map(|c| c.name()).collect(),
            });
        }

        Ok(())
    }

    /// Full acceptance check used by the registry.
    pub fn validate(
        instance: &dyn Context,
        capability: &CapabilityType,
    ) -> Result<(), InvalidCapability> {
        Self::check_capability(capability)?;
        Self::check_instance(instance, capability)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::context::{
        ContextContract, ContextFamily, ContractDescriptor, CpuContext, DeviceContext,
    };
    use crate::impl_context;

    trait Z80Context: CpuContext {}

    impl ContextContract for dyn Z80Context {
        const DESCRIPTOR: ContractDescriptor = ContractDescriptor::contract("z80", ContextFamily::Cpu)
            .extending(CapabilityType::of::<dyn CpuContext>);

        fn upcast(this: Arc<Self>) -> Arc<dyn Context> {
            this
        }
    }

    trait UntaggedContext: Context {}

    impl ContextContract for dyn UntaggedContext {
        const DESCRIPTOR: ContractDescriptor =
            ContractDescriptor::contract("untagged", ContextFamily::Custom("test")).untagged();

        fn upcast(this: Arc<Self>) -> Arc<dyn Context> {
            this
        }
    }

    struct PlainCpu;
    impl_context!(PlainCpu => dyn CpuContext);
    impl CpuContext for PlainCpu {}

    struct Z80;
    impl_context!(Z80 => dyn Z80Context, dyn CpuContext, dyn Context);
    impl CpuContext for Z80 {}
    impl Z80Context for Z80 {}

    struct Terminal;
    impl_context!(Terminal => dyn CpuContext, dyn DeviceContext<u8>);
    impl CpuContext for Terminal {}
    impl DeviceContext<u8> for Terminal {
        fn read_data(&self) -> u8 {
            0
        }
        fn write_data(&self, _data: u8) {}
    }

    impl ContextContract for PlainCpu {
        const DESCRIPTOR: ContractDescriptor =
            ContractDescriptor::concrete("plain-cpu", ContextFamily::Cpu);

        fn upcast(this: Arc<Self>) -> Arc<dyn Context> {
            this
        }
    }

    #[test]
    fn test_registrable_capability() {
        assert!(CapabilityValidator::is_registrable_capability(
            &CapabilityType::of::<dyn CpuContext>()
        ));
        assert!(CapabilityValidator::is_registrable_capability(
            &CapabilityType::of::<dyn Z80Context>()
        ));
    }

    #[test]
    fn test_root_marker_rejected() {
        assert_eq!(
            CapabilityValidator::check_capability(&CapabilityType::of::<dyn Context>()),
            Err(InvalidCapability::RootMarker)
        );
    }

    #[test]
    fn test_untagged_and_concrete_rejected() {
        assert_eq!(
            CapabilityValidator::check_capability(&CapabilityType::of::<dyn UntaggedContext>()),
            Err(InvalidCapability::NotACapabilityType {
                contract: "untagged"
            })
        );
        assert_eq!(
            CapabilityValidator::check_capability(&CapabilityType::of::<PlainCpu>()),
            Err(InvalidCapability::NotACapabilityType {
                contract: "plain-cpu"
            })
        );
    }

    #[test]
    fn test_instance_implements_directly() {
        let cpu = CapabilityType::of::<dyn CpuContext>();
        assert!(CapabilityValidator::implements_capability(&PlainCpu, &cpu));
        assert_eq!(
            CapabilityValidator::check_instance(&PlainCpu, &CapabilityType::of::<dyn Z80Context>()),
            Err(InvalidCapability::NotImplemented { contract: "z80" })
        );
    }

    #[test]
    fn test_extended_contract_is_one_identity() {
        assert!(CapabilityValidator::implements_capability(
            &Z80,
            &CapabilityType::of::<dyn Z80Context>()
        ));
        assert!(CapabilityValidator::implements_capability(
            &Z80,
            &CapabilityType::of::<dyn CpuContext>()
        ));
    }

    #[test]
    fn test_unrelated_contracts_rejected() {
        let err = CapabilityValidator::check_instance(&Terminal, &CapabilityType::of::<dyn CpuContext>())
            .unwrap_err();
        assert_eq!(err.code(), "multiple_capabilities");
        match err {
            InvalidCapability::MultipleCapabilities { found, .. } => {
                assert_eq!(found, vec!["cpu", "device"]);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
