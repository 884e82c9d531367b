// Path: crates/types/src/error.rs
//! Typed error taxonomy for the state transition function.
//!
//! Every subsystem returns one of the enums below rather than a generic
//! string error: the orchestrator needs to distinguish `PvmError` (sometimes
//! recoverable, trapped inside accumulation) from every other subsystem error
//! (always fatal to the block).

use crate::hash::Hash32;
use crate::keys::Ed25519Public;
use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// Errors from header validation (orchestrator step 1).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    /// The block's slot did not strictly increase over the parent's.
    #[error("slot {got} is not strictly greater than parent slot {parent}")]
    SlotNotMonotonic {
        /// The parent block's slot.
        parent: u32,
        /// The slot declared by this block.
        got: u32,
    },
    /// `author_index` was not a valid index into the active validator set.
    #[error("author index {index} out of range for {validator_count} validators")]
    InvalidAuthorIndex {
        /// The author index from the header.
        index: u16,
        /// The active validator set size V.
        validator_count: u16,
    },
    /// The block seal did not verify against the author's bandersnatch key.
    #[error("block seal signature invalid")]
    BadSealSignature,
    /// The entropy-source signature did not verify against the author's key.
    #[error("entropy source signature invalid")]
    BadEntropySourceSignature,
}

impl ErrorCode for HeaderError {
    fn code(&self) -> &'static str {
        match self {
            Self::SlotNotMonotonic { .. } => "HEADER_SLOT_NOT_MONOTONIC",
            Self::InvalidAuthorIndex { .. } => "HEADER_INVALID_AUTHOR_INDEX",
            Self::BadSealSignature => "HEADER_BAD_SEAL_SIGNATURE",
            Self::BadEntropySourceSignature => "HEADER_BAD_ENTROPY_SOURCE_SIGNATURE",
        }
    }
}

/// Errors from the Safrole ticket/epoch subsystem.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SafroleError {
    /// A ticket referenced a slot outside of the current epoch.
    #[error("ticket submitted for an invalid slot")]
    BadSlot,
    /// Tickets in the extrinsic were not strictly ordered by id.
    #[error("tickets are not strictly ordered by id")]
    BadTicketOrder,
    /// A ticket's ring-VRF proof failed to verify.
    #[error("ticket ring-VRF proof invalid")]
    BadTicketProof,
    /// A ticket's `attempt` field was not below the configured maximum.
    #[error("ticket attempt {attempt} exceeds maximum {max}")]
    BadTicketAttempt {
        /// The attempt value on the ticket.
        attempt: u8,
        /// The configured maximum attempt count.
        max: u8,
    },
    /// Two tickets in the extrinsic shared the same id.
    #[error("duplicate ticket id")]
    DuplicateTicket,
    /// More tickets were submitted than the epoch length allows.
    #[error("too many tickets in extrinsic: {got} > {max}")]
    TooManyTickets {
        /// Number of tickets submitted.
        got: usize,
        /// Configured epoch length E.
        max: usize,
    },
    /// A ticket was submitted outside of the ticket submission window.
    #[error("ticket submitted outside the submission window")]
    UnexpectedTicket,
}

impl ErrorCode for SafroleError {
    fn code(&self) -> &'static str {
        match self {
            Self::BadSlot => "SAFROLE_BAD_SLOT",
            Self::BadTicketOrder => "SAFROLE_BAD_TICKET_ORDER",
            Self::BadTicketProof => "SAFROLE_BAD_TICKET_PROOF",
            Self::BadTicketAttempt { .. } => "SAFROLE_BAD_TICKET_ATTEMPT",
            Self::DuplicateTicket => "SAFROLE_DUPLICATE_TICKET",
            Self::TooManyTickets { .. } => "SAFROLE_TOO_MANY_TICKETS",
            Self::UnexpectedTicket => "SAFROLE_UNEXPECTED_TICKET",
        }
    }
}

/// Errors from the disputes subsystem.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DisputeError {
    /// A verdict referenced a work-report hash not known to this block.
    #[error("verdict references unknown report {0:?}")]
    UnknownReport(Hash32),
    /// The same report received two verdicts in one disputes extrinsic.
    #[error("duplicate verdict for report {0:?}")]
    DuplicateVerdict(Hash32),
    /// A judgment's signature did not verify against the claimed validator key.
    #[error("invalid judgment signature from validator {0}")]
    InvalidJudgmentSignature(u16),
    /// A verdict did not reach the required judgment quorum.
    #[error("verdict for report {0:?} did not reach quorum")]
    InsufficientJudgments(Hash32),
    /// An offender key was already recorded as punished.
    #[error("offender key already recorded")]
    OffenderAlreadyRecorded,
    /// A culprit's or fault's self-signed acknowledgement did not verify
    /// against the embedded offender key.
    #[error("invalid offender signature from {0:?}")]
    InvalidOffenderSignature(Ed25519Public),
}

impl ErrorCode for DisputeError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnknownReport(_) => "DISPUTE_UNKNOWN_REPORT",
            Self::DuplicateVerdict(_) => "DISPUTE_DUPLICATE_VERDICT",
            Self::InvalidJudgmentSignature(_) => "DISPUTE_INVALID_JUDGMENT_SIGNATURE",
            Self::InsufficientJudgments(_) => "DISPUTE_INSUFFICIENT_JUDGMENTS",
            Self::OffenderAlreadyRecorded => "DISPUTE_OFFENDER_ALREADY_RECORDED",
            Self::InvalidOffenderSignature(_) => "DISPUTE_INVALID_OFFENDER_SIGNATURE",
        }
    }
}

/// Errors from preimage integration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreimageError {
    /// The same `(requester, blob)` pair appeared twice.
    #[error("duplicate preimage for requester {requester}")]
    DuplicatePreimage {
        /// The service id that requested the preimage.
        requester: u32,
    },
    /// Preimages in the extrinsic were not ordered by `(requester, blob_hash)`.
    #[error("preimages extrinsic is not ordered")]
    PreimagesNotOrdered,
    /// The requesting service account does not exist in δ.
    #[error("unknown service account {0}")]
    UnknownServiceAccount(u32),
    /// The service never solicited this preimage.
    #[error("preimage was not requested by service {0}")]
    PreimageUnneeded(u32),
    /// The solicitation exists but its window has lapsed.
    #[error("preimage solicitation for requester {requester} expired ({age} slots old)")]
    SolicitationExpired {
        /// The service id that requested the preimage.
        requester: u32,
        /// How many slots old the solicitation was.
        age: u32,
    },
}

impl ErrorCode for PreimageError {
    fn code(&self) -> &'static str {
        match self {
            Self::DuplicatePreimage { .. } => "PREIMAGE_DUPLICATE",
            Self::PreimagesNotOrdered => "PREIMAGE_NOT_ORDERED",
            Self::UnknownServiceAccount(_) => "PREIMAGE_UNKNOWN_SERVICE_ACCOUNT",
            Self::PreimageUnneeded(_) => "PREIMAGE_UNNEEDED",
            Self::SolicitationExpired { .. } => "PREIMAGE_SOLICITATION_EXPIRED",
        }
    }
}

/// Errors from the authorization pool/queue subsystem.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    /// `core_index` referenced a core outside of `0..C`.
    #[error("invalid core index {core}")]
    InvalidCore {
        /// The offending core index.
        core: u16,
    },
}

impl ErrorCode for AuthorizationError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidCore { .. } => "AUTHORIZATION_INVALID_CORE",
        }
    }
}

/// Errors from guarantee / work-report validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    /// `core_index` referenced a core outside of `0..C`.
    #[error("invalid core index {core}")]
    BadCoreIndex {
        /// The offending core index.
        core: u16,
    },
    /// A report had an empty result list.
    #[error("work report for core {core} has no results")]
    MissingWorkResults {
        /// The core the empty report targeted.
        core: u16,
    },
    /// Guarantees in the batch were not strictly ordered by `core_index`.
    #[error("guarantees extrinsic is not ordered by core index")]
    OutOfOrderGuarantee,
    /// Two guarantees in this block share a `package_spec.hash`, or one
    /// already exists in recent history.
    #[error("duplicate work package {0:?}")]
    DuplicatePackage(Hash32),
    /// Sum of `accumulate_gas` across results exceeded `gas_alloc_accumulation`.
    #[error("work report gas {got} exceeds allocation {max}")]
    WorkReportGasTooHigh {
        /// The requested total gas.
        got: u64,
        /// The configured per-report gas allocation.
        max: u64,
    },
    /// A result's output payload exceeded the per-core size limit.
    #[error("work result output exceeds per-core limit")]
    OutputTooLarge,
    /// The context's anchor was not found in recent history β.
    #[error("context anchor {0:?} not found in recent history")]
    UnknownContextAnchor(Hash32),
    /// The context's `lookup_anchor` fell outside the permitted lookup window.
    #[error("lookup anchor is not within the recent lookup window")]
    LookupAnchorNotRecent,
    /// The report's slot fell outside the permitted guarantor rotation window.
    #[error("report slot outside permitted rotation window")]
    SlotOutOfRange,
    /// A result referenced a service id absent from δ.
    #[error("unknown service {0}")]
    UnknownService(u32),
    /// A result's `code_hash` did not match the service's advertised code hash.
    #[error("code hash mismatch for service {service}")]
    CodeHashMismatch {
        /// The service whose code hash did not match.
        service: u32,
    },
    /// A prerequisite or segment-root-lookup entry could not be resolved
    /// against this block's batch or ξ.
    #[error("unresolved prerequisite {0:?}")]
    UnresolvedPrerequisite(Hash32),
    /// Fewer guarantor signatures were present than the assignment requires.
    #[error("insufficient guarantor signatures for core {core}: got {got}, need {need}")]
    InsufficientGuarantees {
        /// The core the report targeted.
        core: u16,
        /// Number of valid signatures found.
        got: usize,
        /// Number of signatures required.
        need: usize,
    },
    /// A signer was not part of the Fisher-Yates guarantor assignment for
    /// this core and slot.
    #[error("guarantor {validator} not assigned to core {core}")]
    BadGuarantorAssignment {
        /// The offending validator index.
        validator: u16,
        /// The core the guarantee targeted.
        core: u16,
    },
    /// A guarantor signature was produced by a currently-punished validator.
    #[error("guarantor {0} is an offender")]
    OffenderGuarantor(u16),
    /// A guarantor signature failed cryptographic verification.
    #[error("invalid guarantor signature from validator {0}")]
    InvalidGuarantorSignature(u16),
}

impl ErrorCode for ReportError {
    fn code(&self) -> &'static str {
        match self {
            Self::BadCoreIndex { .. } => "REPORT_BAD_CORE_INDEX",
            Self::MissingWorkResults { .. } => "REPORT_MISSING_WORK_RESULTS",
            Self::OutOfOrderGuarantee => "REPORT_OUT_OF_ORDER_GUARANTEE",
            Self::DuplicatePackage(_) => "REPORT_DUPLICATE_PACKAGE",
            Self::WorkReportGasTooHigh { .. } => "REPORT_GAS_TOO_HIGH",
            Self::OutputTooLarge => "REPORT_OUTPUT_TOO_LARGE",
            Self::UnknownContextAnchor(_) => "REPORT_UNKNOWN_CONTEXT_ANCHOR",
            Self::LookupAnchorNotRecent => "REPORT_LOOKUP_ANCHOR_NOT_RECENT",
            Self::SlotOutOfRange => "REPORT_SLOT_OUT_OF_RANGE",
            Self::UnknownService(_) => "REPORT_UNKNOWN_SERVICE",
            Self::CodeHashMismatch { .. } => "REPORT_CODE_HASH_MISMATCH",
            Self::UnresolvedPrerequisite(_) => "REPORT_UNRESOLVED_PREREQUISITE",
            Self::InsufficientGuarantees { .. } => "REPORT_INSUFFICIENT_GUARANTEES",
            Self::BadGuarantorAssignment { .. } => "REPORT_BAD_GUARANTOR_ASSIGNMENT",
            Self::OffenderGuarantor(_) => "REPORT_OFFENDER_GUARANTOR",
            Self::InvalidGuarantorSignature(_) => "REPORT_INVALID_GUARANTOR_SIGNATURE",
        }
    }
}

/// Errors from the availability / assurances subsystem.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssuranceError {
    /// An assurance's Ed25519 signature did not verify.
    #[error("invalid assurance signature from validator {0}")]
    InvalidSignature(u16),
    /// The assurance bitfield length did not match `avail_bitfield_bytes`.
    #[error("assurance bitfield length {got} does not match expected {expected}")]
    InvalidBitfieldLength {
        /// The bitfield length supplied.
        got: usize,
        /// The configured expected length.
        expected: usize,
    },
    /// A bit was set for a core with no pending ρ entry.
    #[error("assurance references core {0} with no pending report")]
    NoPendingReport(u16),
    /// The same validator assured twice in one block.
    #[error("duplicate assurance from validator {0}")]
    DuplicateAssurance(u16),
}

impl ErrorCode for AssuranceError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidSignature(_) => "ASSURANCE_INVALID_SIGNATURE",
            Self::InvalidBitfieldLength { .. } => "ASSURANCE_INVALID_BITFIELD_LENGTH",
            Self::NoPendingReport(_) => "ASSURANCE_NO_PENDING_REPORT",
            Self::DuplicateAssurance(_) => "ASSURANCE_DUPLICATE",
        }
    }
}

/// Errors from the accumulation pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccumulationError {
    /// The dependency queue could not reach a fixpoint (a genuine cycle).
    #[error("dependency cycle detected among queued reports")]
    DependencyCycle,
    /// A result targeted a service id absent from δ and not being created.
    #[error("unknown service {0} in accumulation result")]
    UnknownService(u32),
    /// Total requested gas for a round overflowed `u64`.
    #[error("accumulation gas overflow")]
    GasOverflow,
}

impl ErrorCode for AccumulationError {
    fn code(&self) -> &'static str {
        match self {
            Self::DependencyCycle => "ACCUMULATION_DEPENDENCY_CYCLE",
            Self::UnknownService(_) => "ACCUMULATION_UNKNOWN_SERVICE",
            Self::GasOverflow => "ACCUMULATION_GAS_OVERFLOW",
        }
    }
}

/// Details retained on a PVM page fault so the host can report it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViolationInfo {
    /// Whether the fault was a read or a write.
    pub access: PageAccessKind,
    /// The faulting address.
    pub address: u32,
    /// The size in bytes of the attempted access.
    pub size: u32,
    /// The page number the address falls within.
    pub page: u32,
}

/// Whether a page access fault was a read or write attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAccessKind {
    /// A read access.
    Read,
    /// A write access.
    Write,
}

/// PVM termination / error variants. `Halt` is a normal, successful
/// termination; it is carried in this enum because the host-call dispatch
/// surface treats all four termination kinds uniformly, per the `terminal`
/// status family in the host-call contract.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PvmError {
    /// The program halted normally (the `trap`/`fallthrough`-free exit path).
    #[error("PVM halted")]
    Halt,
    /// An instruction or host call executed with `gas < 0`.
    #[error("PVM ran out of gas")]
    OutOfGas,
    /// The program trapped (`trap` instruction, or a decode-time invariant
    /// violated at run time).
    #[error("PVM panicked")]
    Panic,
    /// A memory access violated the page's access control.
    #[error("PVM page fault at {0:?}")]
    PageFault(ViolationInfo),
}

impl ErrorCode for PvmError {
    fn code(&self) -> &'static str {
        match self {
            Self::Halt => "PVM_HALT",
            Self::OutOfGas => "PVM_OUT_OF_GAS",
            Self::Panic => "PVM_PANIC",
            Self::PageFault(_) => "PVM_PAGE_FAULT",
        }
    }
}

/// Errors decoding a PVM program (§4.6 program format).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PvmDecodeError {
    /// The program byte sequence was too short to contain its header.
    #[error("program too short")]
    ProgramTooShort,
    /// `jump_table_len` could not be parsed as a varint.
    #[error("invalid jump table length")]
    InvalidJumpTableLength,
    /// `item_len` was outside `1..=4`.
    #[error("invalid jump table item length")]
    InvalidItemLength,
    /// `code_len` could not be parsed as a varint, or overran the buffer.
    #[error("invalid code length")]
    InvalidCodeLength,
    /// A jump table entry did not point to a basic-block start.
    #[error("invalid jump destination")]
    InvalidJumpDestination,
}

impl ErrorCode for PvmDecodeError {
    fn code(&self) -> &'static str {
        match self {
            Self::ProgramTooShort => "PVM_PROGRAM_TOO_SHORT",
            Self::InvalidJumpTableLength => "PVM_INVALID_JUMP_TABLE_LENGTH",
            Self::InvalidItemLength => "PVM_INVALID_ITEM_LENGTH",
            Self::InvalidCodeLength => "PVM_INVALID_CODE_LENGTH",
            Self::InvalidJumpDestination => "PVM_INVALID_JUMP_DESTINATION",
        }
    }
}

/// Errors from cryptographic operations (`jam_crypto`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// The signature failed cryptographic verification.
    #[error("signature verification failed")]
    VerificationFailed,
    /// The provided key material is malformed or invalid for the algorithm.
    #[error("invalid cryptographic key: {0}")]
    InvalidKey(String),
    /// The provided signature material is malformed.
    #[error("invalid signature format: {0}")]
    InvalidSignature(String),
    /// A hash or key had an unexpected byte length.
    #[error("invalid length: expected {expected}, got {got}")]
    InvalidHashLength {
        /// The expected length in bytes.
        expected: usize,
        /// The actual length in bytes.
        got: usize,
    },
    /// An error occurred during deserialization of a cryptographic object.
    #[error("deserialization error: {0}")]
    Deserialization(String),
    /// A generic failure surfaced by the underlying cryptographic library.
    #[error("cryptographic operation failed: {0}")]
    OperationFailed(String),
    /// The requested operation or parameter is not supported in this build.
    #[error("unsupported cryptographic operation: {0}")]
    Unsupported(String),
}

impl ErrorCode for CryptoError {
    fn code(&self) -> &'static str {
        match self {
            Self::VerificationFailed => "CRYPTO_VERIFICATION_FAILED",
            Self::InvalidKey(_) => "CRYPTO_INVALID_KEY",
            Self::InvalidSignature(_) => "CRYPTO_INVALID_SIGNATURE",
            Self::InvalidHashLength { .. } => "CRYPTO_INVALID_HASH_LENGTH",
            Self::Deserialization(_) => "CRYPTO_DESERIALIZATION_ERROR",
            Self::OperationFailed(_) => "CRYPTO_OPERATION_FAILED",
            Self::Unsupported(_) => "CRYPTO_UNSUPPORTED",
        }
    }
}

impl From<dcrypt::Error> for CryptoError {
    fn from(e: dcrypt::Error) -> Self {
        CryptoError::OperationFailed(e.to_string())
    }
}

/// Errors from the merklized state dictionary (§4.7).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// A non-prime `ensure()` was called on a σ component never initialized.
    #[error("state component {0} accessed before initialization")]
    ComponentUninitialized(&'static str),
    /// A dictionary key did not match any of the three known key schemas.
    #[error("key does not match any known state key schema")]
    UnknownKeyType,
    /// Reconstructing a storage key from its compressed dictionary fragment
    /// was ambiguous (fewer than 3 leading zero bytes).
    #[error("storage key reconstruction is ambiguous for this entry")]
    InvalidStorageKeyReconstruction,
    /// Encoding a σ component to its canonical dictionary value failed.
    #[error("state encode error: {0}")]
    Encode(String),
    /// Decoding a σ component from a dictionary value failed.
    #[error("state decode error: {0}")]
    Decode(String),
}

impl ErrorCode for StateError {
    fn code(&self) -> &'static str {
        match self {
            Self::ComponentUninitialized(_) => "STATE_COMPONENT_UNINITIALIZED",
            Self::UnknownKeyType => "STATE_UNKNOWN_KEY_TYPE",
            Self::InvalidStorageKeyReconstruction => "STATE_INVALID_STORAGE_KEY_RECONSTRUCTION",
            Self::Encode(_) => "STATE_ENCODE_ERROR",
            Self::Decode(_) => "STATE_DECODE_ERROR",
        }
    }
}

/// The top-level error returned by `apply(sigma, B)`.
///
/// Every variant other than `PvmError` (trapped inside accumulation, see
/// `jam_execution::accumulation`) is fatal: the orchestrator discards the
/// prime overlay and the block is rejected in full.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StfError {
    /// Header validation failed.
    #[error(transparent)]
    Header(#[from] HeaderError),
    /// Safrole ticket/epoch processing failed.
    #[error(transparent)]
    Safrole(#[from] SafroleError),
    /// Dispute processing failed.
    #[error(transparent)]
    Dispute(#[from] DisputeError),
    /// Preimage integration failed.
    #[error(transparent)]
    Preimage(#[from] PreimageError),
    /// Authorization pool/queue processing failed.
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),
    /// Guarantee/report validation failed.
    #[error(transparent)]
    Report(#[from] ReportError),
    /// Assurance processing failed.
    #[error(transparent)]
    Assurance(#[from] AssuranceError),
    /// Accumulation processing failed.
    #[error(transparent)]
    Accumulation(#[from] AccumulationError),
    /// State dictionary / merklization failed.
    #[error(transparent)]
    State(#[from] StateError),
    /// The computed state root did not match the block's declared commitment.
    #[error("state root mismatch: expected {expected:?}, got {got:?}")]
    StateRootMismatch {
        /// The root declared by the block.
        expected: Hash32,
        /// The root actually computed from σ′.
        got: Hash32,
    },
}

impl ErrorCode for StfError {
    fn code(&self) -> &'static str {
        match self {
            Self::Header(e) => e.code(),
            Self::Safrole(e) => e.code(),
            Self::Dispute(e) => e.code(),
            Self::Preimage(e) => e.code(),
            Self::Authorization(e) => e.code(),
            Self::Report(e) => e.code(),
            Self::Assurance(e) => e.code(),
            Self::Accumulation(e) => e.code(),
            Self::State(e) => e.code(),
            Self::StateRootMismatch { .. } => "STF_STATE_ROOT_MISMATCH",
        }
    }
}
