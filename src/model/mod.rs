//! Domain model: safety devices, diagnostic methods, fault types and
//! compliance profiles, held in a [`Registry`].

pub mod category;
pub mod device;
pub mod fault;
pub mod method;
pub mod profile;
pub mod registry;
pub mod types;

pub use category::{CategoryUpdate, DeviceCategory, NewCategory};
pub use device::{Device, DeviceUpdate, NewDevice};
pub use fault::{
    DiagnosticMethodFault, FaultType, FaultTypeUpdate, MethodFaultKey, NewFaultType,
};
pub use method::{DiagnosticMethod, MethodUpdate, NewMethod};
pub use profile::{
    NewProfile, Profile, ProfileDiagnosticMethod, ProfileFault, ProfileFaultKey, ProfileMethodKey,
    ProfileUpdate,
};
pub use registry::{DeviceFaultStatus, Registry};
pub use types::{
    ArchitectureType, CategoryId, DeviceId, FaultTypeId, Level, MethodId, ProfileId,
};
