use std::fmt;

use serde::{Deserialize, Serialize};

/// The twelve lifecycle stages a job passes through.
///
/// Each job flows strictly forward:
/// REQUEST_POSTED → OFFERS_RECEIVED → … → WORKFLOW_FINALIZED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStep {
    RequestPosted,
    OffersReceived,
    ContractSelected,
    ExecutionStarted,
    ExecutionInProgress,
    EvidenceUploaded,
    CompletionSubmitted,
    ClientConfirmed,
    PaymentProcessing,
    PaymentProofUploaded,
    ContractorReceiptConfirmed,
    WorkflowFinalized,
}

/// Where a step sits relative to a job's current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepPosition {
    Completed,
    Current,
    Upcoming,
}

impl WorkflowStep {
    /// Canonical ordering. Every index, predicate and percentage is derived
    /// from this table.
    pub const ORDER: [WorkflowStep; 12] = [
        WorkflowStep::RequestPosted,
        WorkflowStep::OffersReceived,
        WorkflowStep::ContractSelected,
        WorkflowStep::ExecutionStarted,
        WorkflowStep::ExecutionInProgress,
        WorkflowStep::EvidenceUploaded,
        WorkflowStep::CompletionSubmitted,
        WorkflowStep::ClientConfirmed,
        WorkflowStep::PaymentProcessing,
        WorkflowStep::PaymentProofUploaded,
        WorkflowStep::ContractorReceiptConfirmed,
        WorkflowStep::WorkflowFinalized,
    ];

    pub const COUNT: usize = Self::ORDER.len();

    pub const FIRST: WorkflowStep = Self::ORDER[0];
    pub const LAST: WorkflowStep = Self::ORDER[Self::COUNT - 1];

    /// Position of this step in [`WorkflowStep::ORDER`].
    pub fn index(self) -> usize {
        // The discriminants follow declaration order, which matches ORDER.
        self as usize
    }

    pub fn from_index(index: usize) -> Option<WorkflowStep> {
        Self::ORDER.get(index).copied()
    }

    /// The step that follows this one, or `None` for the final step.
    pub fn next(self) -> Option<WorkflowStep> {
        Self::from_index(self.index() + 1)
    }

    pub fn is_terminal(self) -> bool {
        self == Self::LAST
    }

    /// Workflow completion as a whole percentage:
    /// `round(100 * index / (COUNT - 1))`.
    pub fn progress(self) -> u8 {
        let last = (Self::COUNT - 1) as u32;
        let scaled = 100 * self.index() as u32;
        // Integer round-half-up of scaled / last.
        ((scaled * 2 + last) / (last * 2)) as u8
    }

    /// Where `self` sits relative to `current`.
    pub fn position_relative_to(self, current: WorkflowStep) -> StepPosition {
        match self.index().cmp(&current.index()) {
            std::cmp::Ordering::Less => StepPosition::Completed,
            std::cmp::Ordering::Equal => StepPosition::Current,
            std::cmp::Ordering::Greater => StepPosition::Upcoming,
        }
    }

    pub fn is_completed_at(self, current: WorkflowStep) -> bool {
        self.position_relative_to(current) == StepPosition::Completed
    }

    pub fn is_current_at(self, current: WorkflowStep) -> bool {
        self == current
    }

    pub fn is_upcoming_at(self, current: WorkflowStep) -> bool {
        self.position_relative_to(current) == StepPosition::Upcoming
    }

    /// Human-readable label for timelines.
    pub fn display_name(self) -> &'static str {
        match self {
            WorkflowStep::RequestPosted => "Request Posted",
            WorkflowStep::OffersReceived => "Offers Received",
            WorkflowStep::ContractSelected => "Contract Selected",
            WorkflowStep::ExecutionStarted => "Execution Started",
            WorkflowStep::ExecutionInProgress => "Execution In Progress",
            WorkflowStep::EvidenceUploaded => "Evidence Uploaded",
            WorkflowStep::CompletionSubmitted => "Completion Submitted",
            WorkflowStep::ClientConfirmed => "Client Confirmed",
            WorkflowStep::PaymentProcessing => "Payment Processing",
            WorkflowStep::PaymentProofUploaded => "Payment Proof Uploaded",
            WorkflowStep::ContractorReceiptConfirmed => "Receipt Confirmed",
            WorkflowStep::WorkflowFinalized => "Workflow Finalized",
        }
    }
}

impl PartialOrd for WorkflowStep {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WorkflowStep {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.index().cmp(&other.index())
    }
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowStep::RequestPosted => "REQUEST_POSTED",
            WorkflowStep::OffersReceived => "OFFERS_RECEIVED",
            WorkflowStep::ContractSelected => "CONTRACT_SELECTED",
            WorkflowStep::ExecutionStarted => "EXECUTION_STARTED",
            WorkflowStep::ExecutionInProgress => "EXECUTION_IN_PROGRESS",
            WorkflowStep::EvidenceUploaded => "EVIDENCE_UPLOADED",
            WorkflowStep::CompletionSubmitted => "COMPLETION_SUBMITTED",
            WorkflowStep::ClientConfirmed => "CLIENT_CONFIRMED",
            WorkflowStep::PaymentProcessing => "PAYMENT_PROCESSING",
            WorkflowStep::PaymentProofUploaded => "PAYMENT_PROOF_UPLOADED",
            WorkflowStep::ContractorReceiptConfirmed => "CONTRACTOR_RECEIPT_CONFIRMED",
            WorkflowStep::WorkflowFinalized => "WORKFLOW_FINALIZED",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_table_matches_indices() {
        for (i, step) in WorkflowStep::ORDER.iter().enumerate() {
            assert_eq!(step.index(), i);
            assert_eq!(WorkflowStep::from_index(i), Some(*step));
        }
        assert_eq!(WorkflowStep::from_index(WorkflowStep::COUNT), None);
    }

    #[test]
    fn progress_endpoints() {
        assert_eq!(WorkflowStep::RequestPosted.progress(), 0);
        assert_eq!(WorkflowStep::WorkflowFinalized.progress(), 100);
    }

    #[test]
    fn progress_rounds_to_nearest() {
        // 100/11 = 9.09, 500/11 = 45.45, 600/11 = 54.54
        assert_eq!(WorkflowStep::OffersReceived.progress(), 9);
        assert_eq!(WorkflowStep::EvidenceUploaded.progress(), 45);
        assert_eq!(WorkflowStep::CompletionSubmitted.progress(), 55);
        assert_eq!(WorkflowStep::ContractorReceiptConfirmed.progress(), 91);
    }

    #[test]
    fn progress_is_monotonic() {
        let values: Vec<u8> = WorkflowStep::ORDER.iter().map(|s| s.progress()).collect();
        assert!(values.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn next_walks_the_table() {
        let mut step = WorkflowStep::FIRST;
        let mut visited = vec![step];
        while let Some(n) = step.next() {
            visited.push(n);
            step = n;
        }
        assert_eq!(visited, WorkflowStep::ORDER.to_vec());
        assert!(step.is_terminal());
    }

    #[test]
    fn position_predicates() {
        let current = WorkflowStep::CompletionSubmitted;
        assert!(WorkflowStep::EvidenceUploaded.is_completed_at(current));
        assert!(WorkflowStep::CompletionSubmitted.is_current_at(current));
        assert!(WorkflowStep::ClientConfirmed.is_upcoming_at(current));

        let completed = WorkflowStep::ORDER
            .iter()
            .filter(|s| s.position_relative_to(current) == StepPosition::Completed)
            .count();
        assert_eq!(completed, current.index());
    }

    #[test]
    fn ordering_follows_table() {
        assert!(WorkflowStep::RequestPosted < WorkflowStep::OffersReceived);
        assert!(WorkflowStep::PaymentProcessing > WorkflowStep::ClientConfirmed);
    }

    #[test]
    fn step_display() {
        assert_eq!(WorkflowStep::RequestPosted.to_string(), "REQUEST_POSTED");
        assert_eq!(
            WorkflowStep::ContractorReceiptConfirmed.to_string(),
            "CONTRACTOR_RECEIPT_CONFIRMED"
        );
        assert_eq!(WorkflowStep::WorkflowFinalized.display_name(), "Workflow Finalized");
    }

    #[test]
    fn serde_uses_screaming_snake() {
        let json = serde_json::to_string(&WorkflowStep::PaymentProofUploaded).unwrap();
        assert_eq!(json, "\"PAYMENT_PROOF_UPLOADED\"");
    }
}
