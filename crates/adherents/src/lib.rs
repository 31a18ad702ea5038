//! Adherents domain: association members and their membership periods.
//!
//! Pure domain logic (no IO). Member export renders into an in-memory buffer;
//! writing it anywhere is the caller's business.

pub mod adherent;
pub mod adhesion;
pub mod export;

pub use adherent::{Adherent, AdherentInput, Coordonnees, Gender};
pub use adhesion::{Adhesion, AdhesionStatus, AdhesionType, NewAdhesion};
pub use export::{ExportError, ExportFormat, ExportProperty, ExportRequest, Exported, render};
