// ============================================================================
// Interfaces Module
// Contains all trait definitions and contracts
// ============================================================================

pub mod emitter;
pub mod event_handler;

pub use emitter::{FormatDescriptor, TypeEmitter};
pub use event_handler::{DiagnosticsHandler, FamilyEvent, LoggingDiagnostics, NoOpDiagnostics};
