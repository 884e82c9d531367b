// Path: crates/types/src/block.rs
//! Block wire format (§6): header, extrinsic bundle, and the extrinsic
//! substructures the orchestrator consumes at each of its twelve steps.

use crate::hash::Hash32;
use crate::keys::{
    BandersnatchPublic, BandersnatchSeal, CoreIndex, Ed25519Public, Ed25519SignatureBytes,
    ServiceId, TimeSlot, ValidatorIndex,
};
use crate::report::WorkReport;
use crate::ticket::{Ticket, TicketEnvelope};
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Published once per epoch transition: the new epoch's entropy and the
/// bandersnatch keys of its active validator set, enough for a light client
/// to verify future seals without replaying Safrole.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct EpochMark {
    /// η₁ at the point the mark was published (the entropy fixed for the
    /// new epoch's ring root derivation).
    pub entropy: Hash32,
    /// η₂ at the same point (used to validate the *next* epoch's fallback).
    pub tickets_entropy: Hash32,
    /// The incoming epoch's bandersnatch keys, in validator-index order.
    pub validators: Vec<BandersnatchPublic>,
}

/// Published when the ticket submission window closes with a full
/// accumulator: the outside-in-ordered ticket sequence for the next epoch,
/// length exactly `epoch_length`.
pub type TicketsMark = Vec<Ticket>;

/// Newly-punished validator keys recorded by this block's disputes.
pub type OffendersMark = Vec<Ed25519Public>;

/// The block header (§6 wire format).
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Header {
    /// Hash of the parent block's header.
    pub parent_hash: Hash32,
    /// The parent block's declared posterior state root.
    pub parent_state_root: Hash32,
    /// Hash of this block's encoded extrinsic bundle.
    pub extrinsic_hash: Hash32,
    /// This block's timeslot, τ.
    pub slot: TimeSlot,
    /// Present iff this block crosses an epoch boundary.
    pub epoch_mark: Option<EpochMark>,
    /// Present iff this block closes the ticket submission window with a
    /// full accumulator.
    pub tickets_mark: Option<TicketsMark>,
    /// Present iff this block's disputes extrinsic recorded new offenders.
    pub offenders_mark: Option<OffendersMark>,
    /// Index of the validator that authored this block.
    pub author_index: ValidatorIndex,
    /// The author's entropy-source signature, seeding η₀'s update.
    pub entropy_source: BandersnatchSeal,
    /// The author's seal over the rest of the header.
    pub seal: BandersnatchSeal,
}

/// One entry of the preimages extrinsic: a service's solicited preimage
/// blob, to be integrated into δ ordered and deduplicated by
/// `(requester, blob)`.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct PreimageExtrinsicEntry {
    /// The service that solicited this preimage.
    pub requester: ServiceId,
    /// The preimage bytes.
    pub blob: Vec<u8>,
}

/// One Ed25519 signature from a guarantor over a work report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct GuarantorSignature {
    /// The signing validator's index in the assigned guarantor set.
    pub validator_index: ValidatorIndex,
    /// The signature itself.
    pub signature: Ed25519SignatureBytes,
}

/// One entry of the guarantees extrinsic (§4.3): a report plus the slot it
/// was guaranteed at and the guarantor signatures over it.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct ReportGuarantee {
    /// The guaranteed work report.
    pub report: WorkReport,
    /// The slot the guarantee was produced at (determines the permutation
    /// and rotation window used to validate guarantor assignment).
    pub slot: TimeSlot,
    /// Guarantor signatures, ordered by ascending `validator_index`.
    pub signatures: Vec<GuarantorSignature>,
}

/// One entry of the assurances extrinsic (§4.4).
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct AssuranceExtrinsicEntry {
    /// The asserting validator's index.
    pub validator_index: ValidatorIndex,
    /// Hash of the block this assurance anchors to (must be the parent).
    pub anchor: Hash32,
    /// Bitfield, one bit per core, indicating attested availability.
    pub bitfield: Vec<u8>,
    /// The validator's Ed25519 signature over `(anchor, bitfield)`.
    pub signature: Ed25519SignatureBytes,
}

/// A single validator's vote within a dispute verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Judgment {
    /// The voting validator's index (in κ or λ, per the verdict's epoch).
    pub validator_index: ValidatorIndex,
    /// `true` votes the report valid, `false` votes it invalid.
    pub vote: bool,
    /// The validator's Ed25519 signature over `(report_hash, epoch, vote)`.
    pub signature: Ed25519SignatureBytes,
}

/// A verdict: the aggregated judgments the validator set reached for one
/// disputed report hash.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Verdict {
    /// The disputed work report's hash.
    pub report_hash: Hash32,
    /// The epoch whose validator set the judgments are drawn from.
    pub epoch: u32,
    /// Individual validator judgments, ordered by `validator_index`.
    pub judgments: Vec<Judgment>,
}

/// A culprit report: a guarantor who signed a report that the verdict found
/// bad, naming them for the offender set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Culprit {
    /// The report that was judged bad.
    pub report_hash: Hash32,
    /// The offending guarantor's Ed25519 key.
    pub validator_ed25519: Ed25519Public,
    /// Self-signed acknowledgement of the culprit's role.
    pub signature: Ed25519SignatureBytes,
}

/// A fault report: a validator whose judgment disagreed with the final
/// verdict, naming them as an offender for voting against consensus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Fault {
    /// The disputed report this fault pertains to.
    pub report_hash: Hash32,
    /// The vote the faulting validator cast (and which lost).
    pub vote: bool,
    /// The faulting validator's Ed25519 key.
    pub validator_ed25519: Ed25519Public,
    /// Self-signed acknowledgement of the fault.
    pub signature: Ed25519SignatureBytes,
}

/// The disputes extrinsic (§4.1 step 4, supplemented per `SPEC_FULL.md`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct DisputesExtrinsic {
    /// New verdicts reached this block.
    pub verdicts: Vec<Verdict>,
    /// Guarantors implicated by a bad verdict.
    pub culprits: Vec<Culprit>,
    /// Validators implicated by voting against a verdict.
    pub faults: Vec<Fault>,
}

/// The full extrinsic bundle carried by a block (§6).
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct ExtrinsicBundle {
    /// Safrole ticket submissions.
    pub tickets: Vec<TicketEnvelope>,
    /// Preimage integrations.
    pub preimages: Vec<PreimageExtrinsicEntry>,
    /// Newly guaranteed work reports.
    pub guarantees: Vec<ReportGuarantee>,
    /// Availability assurances.
    pub assurances: Vec<AssuranceExtrinsicEntry>,
    /// Dispute verdicts, culprits and faults.
    pub disputes: DisputesExtrinsic,
}

/// A complete block: header plus extrinsic bundle.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Block {
    /// The block header.
    pub header: Header,
    /// The block's extrinsic bundle.
    pub extrinsic: ExtrinsicBundle,
}

/// Which core an authorization pool rotation or report pertains to, named
/// explicitly where a bare `u16` would be ambiguous with other indices.
pub type Core = CoreIndex;
