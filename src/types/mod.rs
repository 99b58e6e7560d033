pub mod bundle;
pub mod datatypes;
pub mod resource;
pub mod source;

pub use bundle::{Bundle, BundleEntry};
pub use datatypes::{
    Attachment, CodeableConcept, Coding, HumanName, Identifier, Period, Quantity,
};
pub use resource::{
    Composition, CompositionSection, Condition, Effective, Observation, ObservationValue,
    Occurrence, Onset, Performed, ResourceType, TargetResource,
};
pub use source::{
    CodedValue, DateOrPeriod, EffectiveTime, InstanceIdentifier, Participant, ParticipantKind,
    Section, SourceDocument, SourceEntry, SourceValue, StatementCommon,
};
