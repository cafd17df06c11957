//! Storage facility definitions: ratchets, the specification, and the
//! constraint queries the valuation engine asks of it.
//!
//! A facility is described by a [`StorageSpecification`], built either with
//! its builder or from a serialisable [`StorageParams`] via [`build_storage`].

mod constraints;
mod inventory_space;
mod ratchet;
mod specification;

pub use constraints::PeriodConstraints;
pub use inventory_space::InventorySpace;
pub use ratchet::{
    ConstraintSchedule, ConstraintScheduleBuilder, InjectWithdrawRange, Ratchet, RatchetInterp,
    RatchetPoint,
};
pub use specification::{
    build_storage, MaintenanceOutage, RatchetEntry, StorageConstraints, StorageParams,
    StorageSpecification, StorageSpecificationBuilder, TerminalCondition, TerminalValueFn,
};
